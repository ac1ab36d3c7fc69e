//! Ahead/Behind Counter (C4). Grounded in the teacher's
//! `Repository::ahead_behind` (`git/repository/diff.rs`), simplified: no
//! merge-base caching layer (that lived on `Repository`'s `RepoCache`; here
//! merge-base lookups belong to C7's Layer 3, not this counter), fails safe
//! to `(0, 0)` on any parse or exit failure including cancellation.

use std::path::Path;
use std::time::Duration;

use crate::subprocess::{CancelToken, run_git};

/// `git rev-list --count --left-right <branch>...<base>`, parsed as
/// `(ahead, behind)`. Never errors: any failure (bad ref, cancellation,
/// malformed output) yields `(0, 0)`.
pub fn counts(
    git_root: &Path,
    branch_ref: &str,
    base_ref: &str,
    timeout: Option<Duration>,
    cancel: Option<&CancelToken>,
) -> (usize, usize) {
    let range = format!("{branch_ref}...{base_ref}");
    let out = run_git(
        &["rev-list", "--count", "--left-right", &range],
        git_root,
        &[],
        timeout,
        cancel,
        "ahead-behind",
    );

    if !out.success() {
        return (0, 0);
    }

    parse_left_right_counts(&out.stdout).unwrap_or((0, 0))
}

fn parse_left_right_counts(stdout: &str) -> Option<(usize, usize)> {
    let mut parts = stdout.trim().split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((ahead, behind))
}
