//! Command-line surface: five subcommands over the core detection engine
//! and enumeration pipeline. Stands in for "the command dispatcher" only to
//! the extent SPEC_FULL.md's §6.1 pins — not the teacher's full flag
//! grammar, picker, or shell integration.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sq", version, about = "Git worktree manager with squash-aware merge detection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List worktrees with enriched merge/dirty/ahead-behind status.
    List {
        #[arg(long)]
        json: bool,
        /// Also list local branches with no worktree as a second section.
        #[arg(long)]
        branches: bool,
    },
    /// List local branches with no worktree, classified by merge status.
    Orphans {
        #[arg(long)]
        json: bool,
        /// Additional protected branch name (repeatable). `main`, `master`,
        /// and `develop` are always protected.
        #[arg(long = "protect")]
        protect: Vec<String>,
    },
    /// Remove worktrees matching the given filters.
    Clean {
        /// Only remove worktrees whose branch is merged (ancestor or squash).
        #[arg(long)]
        merged: bool,
        /// Only remove worktrees whose upstream has been pruned on the remote.
        #[arg(long)]
        gone: bool,
        /// Only remove worktrees whose head commit is at least this many days old.
        #[arg(long)]
        stale_days: Option<u64>,
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Run merge-status detection once against a branch and print the result.
    Check {
        branch: String,
        /// Target branch to detect against (defaults to the resolved main branch).
        #[arg(long)]
        target: Option<String>,
    },
    /// Delete a local branch, refusing unless it's proven merged and clean.
    Delete {
        branch: String,
        #[arg(long)]
        force: bool,
    },
}
