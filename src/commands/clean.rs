//! `sq clean`: filters the Worktree Enumerator's (C9) output down to
//! candidates safe to remove, then calls `git worktree remove` on each.
//! Candidate filtering is grounded in
//! `other_examples/38cffc45_W1Real-workty__src-commands-clean.rs.rs`'s
//! `CleanOptions`/filter-chain shape; the non-interactive `--yes` gate below
//! mirrors that file's `bail!("... requires --yes ...")` behavior, without
//! the `dialoguer` prompt (not part of this crate's dependency stack).

use std::io::IsTerminal;

use anyhow::{bail, Context};
use side_quest::styling::{eprintln, println};
use side_quest::subprocess::run_git;
use side_quest::upstream;
use side_quest::worktree::WorktreeInfo;
use side_quest::{discover, env_config, worktree};

pub struct CleanOptions {
    pub merged: bool,
    pub gone: bool,
    pub stale_days: Option<u64>,
    pub dry_run: bool,
    pub yes: bool,
}

pub fn run(options: CleanOptions) -> anyhow::Result<()> {
    let root = discover::current_worktree_root().context("sq clean")?;
    let env = env_config::load()?;

    if !options.merged && !options.gone && options.stale_days.is_none() {
        println!("No filter specified. Use one of:");
        println!("  --merged      Remove worktrees whose branches are merged");
        println!("  --gone        Remove worktrees whose upstream branch was deleted");
        println!("  --stale-days N  Remove worktrees not touched in N days");
        println!("\nAdd --dry-run to preview what would be removed.");
        return Ok(());
    }

    let infos = worktree::list_worktrees(&root, &env)?;
    let current_dir = std::env::current_dir().unwrap_or_default();

    let candidates: Vec<&WorktreeInfo> = infos
        .iter()
        .filter(|wt| is_candidate(wt, &root, &options, &current_dir))
        .collect();

    if candidates.is_empty() {
        println!("No worktrees to clean up.");
        return Ok(());
    }

    println!("Worktrees to remove:");
    for wt in &candidates {
        let dirty_str = if wt.dirty { " (dirty)" } else { "" };
        println!("  - {}{}", wt.branch, dirty_str);
    }

    if options.dry_run {
        println!("Dry run - no worktrees removed.");
        return Ok(());
    }

    let dirty_count = candidates.iter().filter(|wt| wt.dirty).count();
    if dirty_count > 0 {
        eprintln!("{dirty_count} worktree(s) have uncommitted changes and will be skipped.");
    }
    let clean_candidates: Vec<&WorktreeInfo> = candidates.into_iter().filter(|wt| !wt.dirty).collect();
    if clean_candidates.is_empty() {
        println!("All candidate worktrees have uncommitted changes. Nothing to remove.");
        return Ok(());
    }

    if !options.yes {
        if std::io::stdin().is_terminal() {
            println!("Remove {} worktree(s)? [y/N]", clean_candidates.len());
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer)?;
            if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                eprintln!("Aborted.");
                return Ok(());
            }
        } else {
            bail!("non-interactive mode requires --yes for destructive operations");
        }
    }

    let mut removed = 0;
    for wt in clean_candidates {
        let out = run_git(
            &["worktree", "remove", &wt.path.to_string_lossy()],
            &root,
            &[],
            None,
            None,
            "clean-remove",
        );
        if out.success() {
            println!("Removed worktree '{}'", wt.branch);
            removed += 1;
        } else {
            eprintln!("Failed to remove '{}': {}", wt.branch, out.stderr.trim());
        }
    }

    println!("Cleaned up {removed} worktree(s).");
    Ok(())
}

fn is_candidate(
    wt: &WorktreeInfo,
    root: &std::path::Path,
    options: &CleanOptions,
    current_dir: &std::path::Path,
) -> bool {
    if wt.path == current_dir || wt.is_main {
        return false;
    }
    if wt.branch == "(detached)" {
        return false;
    }

    if options.merged && wt.merged {
        return true;
    }
    if options.gone && upstream::is_upstream_gone(root, &wt.branch) {
        return true;
    }
    if let Some(days) = options.stale_days
        && let Some(seconds_ago) = last_commit_age_seconds(&wt.path)
    {
        let stale_seconds = days * 24 * 60 * 60;
        if seconds_ago > stale_seconds {
            return true;
        }
    }

    false
}

fn last_commit_age_seconds(worktree_path: &std::path::Path) -> Option<u64> {
    let out = run_git(
        &["log", "-1", "--format=%ct"],
        worktree_path,
        &[],
        None,
        None,
        "clean-last-commit",
    );
    if !out.success() {
        return None;
    }
    let committed_at: i64 = out.stdout.trim().parse().ok()?;
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_secs() as i64;
    Some((now - committed_at).max(0) as u64)
}
