//! Shallow Guard (C5): tri-state detection of whether the repository is a
//! shallow clone, where squash detection cannot work reliably against the
//! target.

use std::path::Path;

use crate::subprocess::run_git;

/// `Some(true)` — confirmed shallow. `Some(false)` — confirmed complete.
/// `None` — the probe itself failed; callers attach `SHALLOW_CHECK_FAILED`
/// and proceed rather than treating this as shallow.
pub fn is_shallow(git_root: &Path) -> Option<bool> {
    let out = run_git(
        &["rev-parse", "--is-shallow-repository"],
        git_root,
        &[],
        None,
        None,
        "shallow-guard",
    );

    if !out.success() {
        return None;
    }

    match out.stdout.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
