//! Upstream-Gone Probe (C13): a single git call checking whether a branch's
//! tracked upstream has been pruned on the remote. Grounded in the teacher's
//! `for-each-ref --format=%(upstream:track)` usage pattern (referenced from
//! `git/repository/diff.rs`'s upstream helpers).

use std::path::Path;

use crate::subprocess::run_git;

/// `true` when the branch has an upstream configured but the upstream ref no
/// longer exists (git reports `[gone]` in the track status). `false` when
/// there's no upstream, or the upstream is present, or the probe fails.
pub fn is_upstream_gone(git_root: &Path, branch: &str) -> bool {
    let out = run_git(
        &["for-each-ref", "--format=%(upstream:track)", &format!("refs/heads/{branch}")],
        git_root,
        &[],
        None,
        None,
        "upstream-gone-probe",
    );
    out.success() && out.stdout.trim() == "[gone]"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_false_for_nonexistent_branch() {
        let dir = tempfile::tempdir().unwrap();
        std::process::Command::new("git")
            .args(["init", "-q", "-b", "main"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        assert!(!is_upstream_gone(dir.path(), "no-such-branch"));
    }
}
