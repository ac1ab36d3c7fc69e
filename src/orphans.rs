//! Orphan Classifier (C10): local branches with no worktree, classified via
//! the Merge Detector (C7) into `pristine`/`merged`/`ahead`/`unknown`.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use strum::Display;

use crate::detect::{self, DetectOptions, MergeMethod};
use crate::env_config::EnvConfig;
use crate::error::GitError;
use crate::executor::{self, ExecutorOptions};
use crate::health::HasIssues;
use crate::issue::{DetectionIssue, IssueCode, Severity};
use crate::shallow;
use crate::subprocess::{CancelToken, run_git};

pub const DEFAULT_PROTECTED: &[&str] = &["main", "master", "develop"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrphanStatus {
    Pristine,
    Merged,
    Ahead,
    Unknown,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanBranch {
    pub branch: String,
    pub status: OrphanStatus,
    pub commits_ahead: i64,
    pub merged: bool,
    pub merge_method: Option<MergeMethod>,
    pub detection_error: Option<String>,
    pub issues: Option<Vec<DetectionIssue>>,
}

impl HasIssues for OrphanBranch {
    fn issues(&self) -> &[DetectionIssue] {
        self.issues.as_deref().unwrap_or(&[])
    }
}

fn list_local_branches(git_root: &Path) -> Result<Vec<String>, GitError> {
    let out = run_git(
        &["branch", "--format=%(refname:short)"],
        git_root,
        &[],
        None,
        None,
        "list-branches",
    );
    if !out.success() {
        return Err(GitError::command_failed("git branch --format=%(refname:short)", out.stderr));
    }
    Ok(out.stdout.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect())
}

/// Map a `MergeDetectionResult` to `OrphanStatus`, per spec.md §4.6's
/// ordered classification (`detectionError` checked first to prevent
/// masking failures as `pristine`).
fn classify(result: &detect::MergeDetectionResult) -> (OrphanStatus, i64) {
    if result.detection_error.is_some() {
        (OrphanStatus::Unknown, result.commits_ahead)
    } else if result.merged {
        (OrphanStatus::Merged, 0)
    } else if result.commits_ahead > 0 {
        (OrphanStatus::Ahead, result.commits_ahead)
    } else if result.commits_ahead == 0 {
        (OrphanStatus::Pristine, result.commits_ahead)
    } else {
        (OrphanStatus::Unknown, -1)
    }
}

fn enrichment_failed_fallback(branch: &String) -> OrphanBranch {
    let issue = DetectionIssue::new(
        IssueCode::EnrichmentFailed,
        Severity::Error,
        "enrichment",
        "classification exceeded the per-item timeout",
        false,
    );
    OrphanBranch {
        branch: branch.clone(),
        status: OrphanStatus::Unknown,
        commits_ahead: -1,
        merged: false,
        merge_method: None,
        detection_error: Some(issue.message.clone()),
        issues: Some(vec![issue]),
    }
}

/// List local branches held by no worktree and not in `protected`,
/// classified via C7.
pub fn list_orphan_branches(
    git_root: &Path,
    worktree_branches: &HashSet<String>,
    protected: &[String],
    env: &EnvConfig,
) -> Result<Vec<OrphanBranch>, GitError> {
    let all_branches = list_local_branches(git_root)?;
    let protected: HashSet<&str> = protected.iter().map(String::as_str).collect();

    let candidates: Vec<String> = all_branches
        .into_iter()
        .filter(|b| !worktree_branches.contains(b) && !protected.contains(b.as_str()))
        .collect();

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let resolved_target = detect::resolve_default_target(git_root);
    let is_shallow = shallow::is_shallow(git_root);
    let git_root_owned = git_root.to_path_buf();
    let env = *env;

    let options = ExecutorOptions {
        concurrency: env.concurrency,
        per_item_timeout: Duration::from_millis(env.item_timeout_ms),
    };

    let branches = executor::run(
        candidates,
        &options,
        move |branch: &String, cancel: &CancelToken| {
            let detect_options = DetectOptions {
                timeout: Duration::from_millis(env.detection_timeout_ms),
                is_shallow,
                ..Default::default()
            };
            let result = detect::detect(&git_root_owned, branch, Some(&resolved_target), &detect_options, Some(cancel));
            let (status, commits_ahead) = classify(&result);
            OrphanBranch {
                branch: branch.clone(),
                status,
                commits_ahead,
                merged: result.merged,
                merge_method: result.merge_method,
                detection_error: result.detection_error,
                issues: if result.issues.is_empty() { None } else { Some(result.issues) },
            }
        },
        enrichment_failed_fallback,
    );

    Ok(branches)
}
