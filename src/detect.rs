//! Merge Detector (C7): the three-layer cascade (ancestor → counts →
//! synthetic-squash cherry). Owns the invariant `merged ⇔ mergeMethod !=
//! none` on every return path. Grounded in the teacher's `is_ancestor()`
//! (`src/git.rs` in the retrieval pack) for Layer 1 and in
//! `other_examples/43f21cc7_kioku-wt-core__src-git.rs.rs`'s `cherry()` for
//! the shape of Layer 3's cherry check, extended with the spec's stricter
//! per-line regex validation that example lacked.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use strum::Display;

use crate::ahead_behind;
use crate::env_config;
use crate::issue::{DetectionIssue, IssueCode, Severity};
use crate::object_store::IsolatedObjectEnv;
use crate::subprocess::{CancelToken, run_git};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    Ancestor,
    Squash,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeDetectionResult {
    pub merged: bool,
    pub merge_method: Option<MergeMethod>,
    pub commits_ahead: i64,
    pub commits_behind: i64,
    pub detection_error: Option<String>,
    pub issues: Vec<DetectionIssue>,
}

impl MergeDetectionResult {
    fn merged(method: MergeMethod, ahead: usize, behind: usize, issues: Vec<DetectionIssue>) -> Self {
        Self {
            merged: true,
            merge_method: Some(method),
            commits_ahead: ahead as i64,
            commits_behind: behind as i64,
            detection_error: None,
            issues,
        }
    }

    fn unmerged(ahead: usize, behind: usize, issues: Vec<DetectionIssue>) -> Self {
        Self {
            merged: false,
            merge_method: None,
            commits_ahead: ahead as i64,
            commits_behind: behind as i64,
            detection_error: None,
            issues,
        }
    }

    fn fatal(message: impl Into<String>, issue: DetectionIssue) -> Self {
        Self {
            merged: false,
            merge_method: None,
            commits_ahead: 0,
            commits_behind: 0,
            detection_error: Some(message.into()),
            issues: vec![issue],
        }
    }

    #[cfg(test)]
    pub fn invariant_holds(&self) -> bool {
        self.merged == self.merge_method.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub timeout: Duration,
    pub max_commits_for_squash_detection: usize,
    pub is_shallow: Option<bool>,
    pub disable_squash_detection: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            max_commits_for_squash_detection: 50,
            is_shallow: None,
            disable_squash_detection: false,
        }
    }
}

/// Expand a plain branch or target name to a fully qualified ref, per
/// spec.md §4.3's normalization rule: `HEAD` and anything already starting
/// with `refs/` is left alone; everything else becomes `refs/heads/<name>`.
fn normalize_ref(name: &str) -> String {
    if name == "HEAD" || name.starts_with("refs/") {
        name.to_string()
    } else {
        format!("refs/heads/{name}")
    }
}

/// Resolve the main-branch target when the caller didn't supply one: try
/// `refs/heads/main`, then `refs/heads/master`, else fall back to whatever
/// symbolic HEAD points to.
pub fn resolve_default_target(git_root: &Path) -> String {
    for candidate in ["refs/heads/main", "refs/heads/master"] {
        let out = run_git(
            &["rev-parse", "--verify", "--quiet", candidate],
            git_root,
            &[],
            None,
            None,
            "resolve-target",
        );
        if out.success() {
            return candidate.to_string();
        }
    }
    "HEAD".to_string()
}

pub fn detect(
    git_root: &Path,
    branch: &str,
    target: Option<&str>,
    options: &DetectOptions,
    cancel: Option<&CancelToken>,
) -> MergeDetectionResult {
    if env_config::detection_disabled() {
        return MergeDetectionResult {
            merged: false,
            merge_method: None,
            commits_ahead: 0,
            commits_behind: 0,
            detection_error: None,
            issues: vec![DetectionIssue::new(
                IssueCode::DetectionDisabled,
                Severity::Warning,
                "kill-switch",
                "detection disabled via SIDE_QUEST_NO_DETECTION=1",
                false,
            )],
        };
    }

    let branch_ref = normalize_ref(branch);
    let target_ref = match target {
        Some(t) => normalize_ref(t),
        None => resolve_default_target(git_root),
    };

    let squash_disabled = options.disable_squash_detection || env_config::squash_detection_disabled();

    // Shallow guard, consulted before any layer.
    if options.is_shallow == Some(true) && !squash_disabled {
        return MergeDetectionResult::fatal(
            "repository is a shallow clone; detection skipped",
            DetectionIssue::new(
                IssueCode::ShallowClone,
                Severity::Error,
                "shallow-guard",
                "repository is a shallow clone; squash detection cannot be proven against a partial history",
                false,
            ),
        );
    }
    let mut carried_issues = Vec::new();
    if options.is_shallow.is_none() {
        carried_issues.push(DetectionIssue::new(
            IssueCode::ShallowCheckFailed,
            Severity::Warning,
            "shallow-guard",
            "could not determine whether the repository is a shallow clone; proceeding",
            true,
        ));
    }

    // Layer 1 — ancestor.
    let ancestor_out = run_git(
        &["merge-base", "--is-ancestor", &branch_ref, &target_ref],
        git_root,
        &[],
        None,
        cancel,
        "layer1-is-ancestor",
    );

    match ancestor_out.exit_code {
        Some(0) => {
            let (ahead, behind) = ahead_behind::counts(
                git_root,
                &branch_ref,
                &target_ref,
                Some(options.timeout),
                cancel,
            );
            return MergeDetectionResult::merged(MergeMethod::Ancestor, ahead, behind, carried_issues);
        }
        Some(1) => { /* not an ancestor; fall through to layer 2/3 */ }
        Some(code) if code >= 128 => {
            return MergeDetectionResult::fatal(
                ancestor_out.stderr.trim(),
                DetectionIssue::new(
                    IssueCode::MergeBaseFailed,
                    Severity::Error,
                    "layer1",
                    ancestor_out.stderr.trim().to_string(),
                    false,
                ),
            );
        }
        _ => {
            // Cancellation or spawn failure: neither is "proven not an
            // ancestor", so the cascade still falls through to layer 2/3
            // (counts fail-safe to zero), but a cancellation is recorded so
            // the caller can't mistake an aborted detection for a clean
            // unmerged result.
            if ancestor_out.cancelled {
                carried_issues.push(DetectionIssue::new(
                    IssueCode::DetectionAborted,
                    Severity::Warning,
                    "cancellation",
                    "detection was cancelled mid-subprocess",
                    false,
                ));
            }
        }
    }

    if let Some(token) = cancel
        && token.is_cancelled()
    {
        return MergeDetectionResult::unmerged(0, 0, carried_issues);
    }

    // Layer 2 — counts, attached regardless of downstream outcome.
    let (ahead, behind) = ahead_behind::counts(
        git_root,
        &branch_ref,
        &target_ref,
        Some(options.timeout),
        cancel,
    );

    // Layer 3 — synthetic squash probe, gated by three conditions.
    let gate_ok = !squash_disabled && ahead <= options.max_commits_for_squash_detection && options.is_shallow != Some(true);
    if !gate_ok {
        return MergeDetectionResult::unmerged(ahead, behind, carried_issues);
    }

    match layer3_squash_probe(git_root, &branch_ref, &target_ref, options, cancel) {
        Ok(()) => MergeDetectionResult::merged(MergeMethod::Squash, ahead, behind, carried_issues),
        Err(issue) => {
            carried_issues.push(issue);
            MergeDetectionResult::unmerged(ahead, behind, carried_issues)
        }
    }
}

/// Runs the synthetic-squash probe. `Ok(())` means the cascade may conclude
/// `squash`-merged; `Err(issue)` means "not proven" and the branch stays
/// unmerged in the caller's result.
fn layer3_squash_probe(
    git_root: &Path,
    branch_ref: &str,
    target_ref: &str,
    options: &DetectOptions,
    cancel: Option<&CancelToken>,
) -> Result<(), DetectionIssue> {
    // Step 1: merge-base.
    let merge_base_out = run_git(
        &["merge-base", branch_ref, target_ref],
        git_root,
        &[],
        None,
        cancel,
        "layer3-merge-base",
    );
    if !merge_base_out.success() {
        return Err(DetectionIssue::new(
            IssueCode::MergeBaseLookupFailed,
            Severity::Error,
            "layer3",
            merge_base_out.stderr.trim().to_string(),
            true,
        ));
    }
    let merge_base = merge_base_out.stdout.trim().to_string();

    // Step 2: isolated object store.
    let git_path_out = run_git(
        &["rev-parse", "--git-path", "objects"],
        git_root,
        &[],
        None,
        cancel,
        "layer3-git-path",
    );
    if !git_path_out.success() {
        return Err(DetectionIssue::new(
            IssueCode::GitPathFailed,
            Severity::Error,
            "layer3",
            git_path_out.stderr.trim().to_string(),
            true,
        ));
    }
    let host_objects_dir = git_root.join(git_path_out.stdout.trim());
    let existing_alternates = std::env::var_os("GIT_ALTERNATE_OBJECT_DIRECTORIES");
    let isolated = match IsolatedObjectEnv::new(&host_objects_dir, existing_alternates.as_deref()) {
        Ok(env) => env,
        Err(e) => {
            return Err(DetectionIssue::new(
                IssueCode::GitPathFailed,
                Severity::Error,
                "layer3",
                format!("failed to create scratch object store: {e}"),
                true,
            ));
        }
    };
    let env_pairs: Vec<(&str, &str)> = isolated
        .env_pairs()
        .iter()
        .map(|(k, v)| (*k, v.as_ref()))
        .collect();

    // Step 3: synthetic commit.
    let commit_tree_out = run_git(
        &[
            "commit-tree",
            &format!("{branch_ref}^{{tree}}"),
            "-p",
            &merge_base,
            "-m",
            "squash detect",
        ],
        git_root,
        &env_pairs,
        None,
        cancel,
        "layer3-commit-tree",
    );
    if !commit_tree_out.success() {
        return Err(DetectionIssue::new(
            IssueCode::CommitTreeFailed,
            Severity::Error,
            "layer3",
            commit_tree_out.stderr.trim().to_string(),
            true,
        ));
    }
    let synthetic_sha = commit_tree_out.stdout.trim().to_string();

    // Step 4: cherry.
    let cherry_out = run_git(
        &["cherry", target_ref, &synthetic_sha],
        git_root,
        &env_pairs,
        Some(options.timeout),
        cancel,
        "layer3-cherry",
    );

    if cherry_out.timed_out {
        return Err(DetectionIssue::new(
            IssueCode::CherryTimeout,
            Severity::Warning,
            "layer3-cherry",
            "git cherry exceeded the layer-3 timeout",
            true,
        ));
    }
    if !cherry_out.success() {
        return Err(DetectionIssue::new(
            IssueCode::CherryFailed,
            Severity::Warning,
            "layer3-cherry",
            cherry_out.stderr.trim().to_string(),
            true,
        ));
    }

    validate_cherry_output(&cherry_out.stdout)
}

static CHERRY_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-] [0-9a-f]{40}$").unwrap());

/// Accept the squash-merged conclusion only if every non-empty line is
/// present (`cherry` produced output at all) and every line matches the
/// strict `±<40-hex>` shape with a leading `-` (already present by patch
/// identity in the target).
fn validate_cherry_output(stdout: &str) -> Result<(), DetectionIssue> {
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Err(DetectionIssue::new(
            IssueCode::CherryEmpty,
            Severity::Warning,
            "layer3-cherry",
            "git cherry produced no output",
            true,
        ));
    }
    for line in &lines {
        if !CHERRY_LINE_RE.is_match(line) {
            return Err(DetectionIssue::new(
                IssueCode::CherryInvalid,
                Severity::Warning,
                "layer3-cherry",
                format!("unexpected cherry output line: {line:?}"),
                true,
            ));
        }
        if !line.starts_with('-') {
            return Err(DetectionIssue::new(
                IssueCode::CherryInvalid,
                Severity::Warning,
                "layer3-cherry",
                "git cherry reported at least one commit not present in target (+)".to_string(),
                true,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::CancelToken;

    #[test]
    fn merge_detection_result_json_uses_camel_case_field_names() {
        let result = MergeDetectionResult::merged(MergeMethod::Squash, 3, 1, vec![]);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"mergeMethod\":\"squash\""));
        assert!(json.contains("\"commitsAhead\":3"));
        assert!(json.contains("\"commitsBehind\":1"));
        assert!(json.contains("\"detectionError\":null"));
        assert!(!json.contains("merge_method"));
    }

    // Bug hypothesis: a cancellation firing mid-Layer-1 must not be silently
    // absorbed into a clean `{merged:false, issues:[]}` result — that would
    // be indistinguishable from a genuinely unmerged branch.
    #[test]
    fn pre_cancelled_token_yields_detection_aborted_issue() {
        let dir = tempfile::tempdir().unwrap();
        std::process::Command::new("git")
            .args(["init", "-q", "-b", "main"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        std::process::Command::new("git")
            .args(["commit", "--allow-empty", "-q", "-m", "root"])
            .current_dir(dir.path())
            .env("GIT_AUTHOR_NAME", "t")
            .env("GIT_AUTHOR_EMAIL", "t@t")
            .env("GIT_COMMITTER_NAME", "t")
            .env("GIT_COMMITTER_EMAIL", "t@t")
            .status()
            .unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = detect(dir.path(), "main", Some("HEAD"), &DetectOptions::default(), Some(&cancel));

        assert!(!result.merged);
        assert!(result.issues.iter().any(|i| i.code == IssueCode::DetectionAborted));
    }

    #[test]
    fn normalize_ref_leaves_head_alone() {
        assert_eq!(normalize_ref("HEAD"), "HEAD");
    }

    #[test]
    fn normalize_ref_leaves_fully_qualified_refs_alone() {
        assert_eq!(normalize_ref("refs/tags/v1"), "refs/tags/v1");
    }

    #[test]
    fn normalize_ref_qualifies_plain_branch_names() {
        assert_eq!(normalize_ref("feature"), "refs/heads/feature");
    }

    // Bug hypothesis: a plain branch name identical to an existing tag name
    // must resolve to the branch, not the tag — normalization must run
    // before any git call, not be left to git's own ref disambiguation.
    #[test]
    fn normalize_ref_prevents_tag_branch_collision() {
        assert_eq!(normalize_ref("v1"), "refs/heads/v1");
    }

    #[test]
    fn validate_cherry_output_accepts_all_minus_lines() {
        let stdout = "- 0123456789abcdef0123456789abcdef01234567\n- fedcba9876543210fedcba9876543210fedcba98\n";
        assert!(validate_cherry_output(stdout).is_ok());
    }

    #[test]
    fn validate_cherry_output_rejects_plus_line() {
        let stdout = "+ 0123456789abcdef0123456789abcdef01234567\n";
        assert!(validate_cherry_output(stdout).is_err());
    }

    #[test]
    fn validate_cherry_output_rejects_empty_output() {
        assert!(validate_cherry_output("").is_err());
    }

    #[test]
    fn validate_cherry_output_rejects_empty_after_whitespace_only() {
        assert!(validate_cherry_output("\n  \n").is_err());
    }

    // Bug hypothesis: a naive "starts with +/-" check would accept a
    // malformed short hash or trailing garbage; the spec requires the full
    // strict regex including exactly 40 hex characters.
    #[test]
    fn validate_cherry_output_rejects_short_hash() {
        assert!(validate_cherry_output("- abc123\n").is_err());
    }

    #[test]
    fn validate_cherry_output_rejects_trailing_garbage_on_line() {
        let stdout = "- 0123456789abcdef0123456789abcdef01234567 extra\n";
        assert!(validate_cherry_output(stdout).is_err());
    }

    #[test]
    fn merged_and_unmerged_constructors_uphold_invariant() {
        assert!(
            MergeDetectionResult::merged(MergeMethod::Ancestor, 1, 0, vec![]).invariant_holds()
        );
        assert!(MergeDetectionResult::unmerged(2, 1, vec![]).invariant_holds());
    }

    #[test]
    fn merge_method_json_matches_lowercase_wire_format() {
        let json = serde_json::to_string(&MergeMethod::Squash).unwrap();
        assert_eq!(json, "\"squash\"");
    }
}
