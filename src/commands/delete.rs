//! `sq delete <branch> [--force]`: safety-railed branch deletion. Refuses
//! unmerged or checked-out/dirty branches unless `--force`, mirroring the
//! teacher's `wt remove`/`-D` force-delete semantics (`src/cli.rs`,
//! `commands/repository_ext.rs::remove_current_worktree`) adapted to a
//! standalone branch (no attached worktree to remove first).

use anyhow::{bail, Context};
use side_quest::detect::{self, DetectOptions};
use side_quest::shallow;
use side_quest::styling::println;
use side_quest::subprocess::run_git;
use side_quest::worktree;
use side_quest::{discover, env_config};

pub fn run(branch: &str, force: bool) -> anyhow::Result<()> {
    let root = discover::current_worktree_root().context("sq delete")?;
    let env = env_config::load()?;

    let infos = worktree::list_worktrees(&root, &env)?;
    if let Some(checked_out) = infos.iter().find(|i| i.branch == branch) {
        if !force {
            bail!(
                "branch '{branch}' is checked out at {}; use --force to delete anyway",
                checked_out.path.display()
            );
        }
    }

    if !force {
        let options = DetectOptions {
            timeout: std::time::Duration::from_millis(env.detection_timeout_ms),
            is_shallow: shallow::is_shallow(&root),
            ..Default::default()
        };
        let result = detect::detect(&root, branch, None, &options, None);
        if !result.merged {
            bail!(
                "branch '{branch}' is not merged (ahead by {} commit(s)); use --force to delete anyway",
                result.commits_ahead
            );
        }
    }

    let delete_flag = if force { "-D" } else { "-d" };
    let out = run_git(&["branch", delete_flag, branch], &root, &[], None, None, "delete-branch");
    if !out.success() {
        bail!("failed to delete branch '{branch}': {}", out.stderr.trim());
    }

    println!("Deleted branch '{branch}'.");
    Ok(())
}
