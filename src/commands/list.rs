//! `sq list`: runs the Worktree Enumerator (C9), and optionally the Orphan
//! Classifier (C10) as a second section, rendering a table or `--json`
//! array. Grounded in the teacher's `commands/list/render.rs` column layout,
//! trimmed to the fields this crate's model carries.

use std::collections::HashSet;

use anyhow::Context;
use side_quest::health;
use side_quest::orphans::{self, DEFAULT_PROTECTED};
use side_quest::styling::{eprintln, println};
use side_quest::worktree;
use side_quest::{discover, env_config};

pub fn run(json: bool, branches: bool) -> anyhow::Result<()> {
    let root = discover::current_worktree_root().context("sq list")?;
    let env = env_config::load()?;
    let infos = worktree::list_worktrees(&root, &env)?;

    let orphan_branches = if branches {
        let worktree_branches: HashSet<String> = infos.iter().map(|i| i.branch.clone()).collect();
        let protected: Vec<String> = DEFAULT_PROTECTED.iter().map(|s| s.to_string()).collect();
        orphans::list_orphan_branches(&root, &worktree_branches, &protected, &env)?
    } else {
        Vec::new()
    };

    if json {
        let payload = serde_json::json!({
            "worktrees": infos,
            "orphan_branches": orphan_branches,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_worktree_table(&infos);
        if branches {
            println!();
            print_orphan_table(&orphan_branches);
        }
    }

    let worktree_health = health::aggregate(&infos);
    if worktree_health.all_failed {
        eprintln!("all {} worktree(s) failed enrichment", worktree_health.total);
        std::process::exit(1);
    }
    Ok(())
}

fn print_worktree_table(infos: &[worktree::WorktreeInfo]) {
    let branch_width = infos.iter().map(|i| i.branch.len()).max().unwrap_or(6).max(6);
    println!("{:<branch_width$}  {:<7}  STATUS", "BRANCH", "HEAD");
    for info in infos {
        let status = if info.is_main {
            "main".to_string()
        } else {
            info.status.clone().unwrap_or_else(|| "unknown".to_string())
        };
        println!("{:<branch_width$}  {:<7}  {status}", info.branch, info.head);
    }
}

fn print_orphan_table(branches: &[orphans::OrphanBranch]) {
    let branch_width = branches.iter().map(|b| b.branch.len()).max().unwrap_or(6).max(6);
    println!("{:<branch_width$}  STATUS", "ORPHAN BRANCH");
    for branch in branches {
        println!("{:<branch_width$}  {}", branch.branch, branch.status);
    }
}
