//! `sq orphans`: runs the Orphan Classifier (C10) standalone.

use std::collections::HashSet;

use anyhow::Context;
use side_quest::orphans::{self, DEFAULT_PROTECTED};
use side_quest::styling::{eprintln, println};
use side_quest::worktree;
use side_quest::{discover, env_config, health};

pub fn run(json: bool, extra_protected: Vec<String>) -> anyhow::Result<()> {
    let root = discover::current_worktree_root().context("sq orphans")?;
    let env = env_config::load()?;

    let infos = worktree::list_worktrees(&root, &env)?;
    let worktree_branches: HashSet<String> = infos.iter().map(|i| i.branch.clone()).collect();

    let mut protected: Vec<String> = DEFAULT_PROTECTED.iter().map(|s| s.to_string()).collect();
    protected.extend(extra_protected);

    let branches = orphans::list_orphan_branches(&root, &worktree_branches, &protected, &env)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&branches)?);
    } else {
        let branch_width = branches.iter().map(|b| b.branch.len()).max().unwrap_or(6).max(6);
        println!("{:<branch_width$}  STATUS  AHEAD", "BRANCH");
        for branch in &branches {
            println!("{:<branch_width$}  {:<6}  {}", branch.branch, branch.status, branch.commits_ahead);
        }
    }

    let health = health::aggregate(&branches);
    if health.all_failed {
        eprintln!("all {} orphan branch(es) failed enrichment", health.total);
        std::process::exit(1);
    }
    Ok(())
}
