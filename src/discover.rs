//! Locate the git worktree root for the current working directory. This
//! stands in for the teacher's heavier `Repository::current()` (which also
//! builds a per-repo cache) — the core components here take a bare
//! `&Path` and need nothing more.

use std::path::{Path, PathBuf};

use crate::error::GitError;
use crate::subprocess::run_git;

pub fn current_worktree_root() -> Result<PathBuf, GitError> {
    let cwd = std::env::current_dir().map_err(|e| GitError::parse(e.to_string()))?;
    worktree_root_of(&cwd)
}

pub fn worktree_root_of(dir: &Path) -> Result<PathBuf, GitError> {
    let out = run_git(
        &["rev-parse", "--show-toplevel"],
        dir,
        &[],
        None,
        None,
        "discover-root",
    );
    if !out.success() {
        return Err(GitError::NotAGitRepository);
    }
    let raw = PathBuf::from(out.stdout.trim());
    Ok(dunce::canonicalize(&raw).unwrap_or(raw))
}
