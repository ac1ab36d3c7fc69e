//! Worktree Enumerator (C9): parses porcelain `git worktree list`, resolves
//! the main branch and shallow status once per enumeration, then enriches
//! each entry in parallel via the Merge Detector (C7) plus a dirty check.
//! Porcelain parsing is grounded in the teacher's `Worktree`/`WorktreeList`
//! types (`git/mod.rs`) and `list_worktrees()` (`git/repository/worktrees.rs`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{self, DetectOptions, MergeMethod};
use crate::env_config::EnvConfig;
use crate::error::GitError;
use crate::executor::{self, ExecutorOptions};
use crate::health::HasIssues;
use crate::issue::{DetectionIssue, IssueCode, Severity};
use crate::shallow;
use crate::status;
use crate::subprocess::{CancelToken, run_git};

/// One parsed porcelain row. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWorktreeEntry {
    pub path: PathBuf,
    pub head: String,
    pub branch: Option<String>,
    pub is_bare: bool,
}

impl RawWorktreeEntry {
    /// The display name for this entry's branch: the plain name, or the
    /// `(detached)` sentinel when there is none.
    pub fn branch_display(&self) -> &str {
        self.branch.as_deref().unwrap_or("(detached)")
    }
}

/// Parse `git worktree list --porcelain` output into raw entries, splitting
/// on blank-line record boundaries.
pub fn parse_porcelain(stdout: &str) -> Vec<RawWorktreeEntry> {
    let mut entries = Vec::new();
    let mut path: Option<PathBuf> = None;
    let mut head = String::new();
    let mut branch: Option<String> = None;
    let mut is_bare = false;

    let flush = |entries: &mut Vec<RawWorktreeEntry>,
                 path: &mut Option<PathBuf>,
                 head: &mut String,
                 branch: &mut Option<String>,
                 is_bare: &mut bool| {
        if let Some(p) = path.take() {
            entries.push(RawWorktreeEntry {
                path: p,
                head: std::mem::take(head),
                branch: branch.take(),
                is_bare: *is_bare,
            });
        }
        *is_bare = false;
    };

    for line in stdout.lines() {
        if line.is_empty() {
            flush(&mut entries, &mut path, &mut head, &mut branch, &mut is_bare);
            continue;
        }
        if let Some(rest) = line.strip_prefix("worktree ") {
            path = Some(PathBuf::from(rest));
        } else if let Some(rest) = line.strip_prefix("HEAD ") {
            head = rest.chars().take(7).collect();
        } else if let Some(rest) = line.strip_prefix("branch ") {
            branch = Some(
                rest.strip_prefix("refs/heads/")
                    .unwrap_or(rest)
                    .to_string(),
            );
        } else if line == "bare" {
            is_bare = true;
        }
        // "detached" and other tokens (locked, prunable) carry no further
        // information this enumerator's model needs beyond absence of `branch`.
    }
    flush(&mut entries, &mut path, &mut head, &mut branch, &mut is_bare);

    entries
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorktreeInfo {
    pub branch: String,
    pub path: PathBuf,
    pub head: String,
    pub dirty: bool,
    pub merged: bool,
    pub is_main: bool,
    pub commits_ahead: Option<i64>,
    pub commits_behind: Option<i64>,
    pub merge_method: Option<MergeMethod>,
    pub status: Option<String>,
    pub detection_error: Option<String>,
    pub issues: Option<Vec<DetectionIssue>>,
}

impl HasIssues for WorktreeInfo {
    fn issues(&self) -> &[DetectionIssue] {
        self.issues.as_deref().unwrap_or(&[])
    }
}

fn is_dirty(worktree_path: &Path) -> bool {
    let out = run_git(
        &["status", "--porcelain"],
        worktree_path,
        &[],
        None,
        None,
        "dirty-check",
    );
    out.success() && !out.stdout.trim().is_empty()
}

fn resolve_main_branch_name(entry_branch: &str, resolved_main: &str) -> bool {
    let stripped_main = resolved_main.strip_prefix("refs/heads/").unwrap_or(resolved_main);
    entry_branch == stripped_main || entry_branch == "main" || entry_branch == "master"
}

/// Enrich one raw porcelain entry into a `WorktreeInfo`, per spec.md §4.5
/// step 4.
fn enrich(
    entry: &RawWorktreeEntry,
    resolved_target: &str,
    is_shallow: Option<bool>,
    env: &EnvConfig,
    cancel: &CancelToken,
) -> WorktreeInfo {
    let is_main = entry.is_bare || resolve_main_branch_name(entry.branch_display(), resolved_target);
    let dirty = if entry.path.exists() { is_dirty(&entry.path) } else { false };

    if is_main {
        return WorktreeInfo {
            branch: entry.branch_display().to_string(),
            path: entry.path.clone(),
            head: entry.head.clone(),
            dirty,
            merged: true,
            is_main: true,
            commits_ahead: None,
            commits_behind: None,
            merge_method: None,
            status: None,
            detection_error: None,
            issues: None,
        };
    }

    if entry.branch.is_none() {
        // Detached HEAD: never passed to the detector.
        return WorktreeInfo {
            branch: "(detached)".to_string(),
            path: entry.path.clone(),
            head: entry.head.clone(),
            dirty,
            merged: false,
            is_main: false,
            commits_ahead: None,
            commits_behind: None,
            merge_method: None,
            status: None,
            detection_error: None,
            issues: None,
        };
    }

    let options = DetectOptions {
        timeout: Duration::from_millis(env.detection_timeout_ms),
        is_shallow,
        ..Default::default()
    };
    let result = detect::detect(
        &entry.path,
        entry.branch.as_deref().unwrap(),
        Some(resolved_target),
        &options,
        Some(cancel),
    );

    let status_str = status::format(status::StatusInput {
        merged: result.merged,
        dirty,
        ahead: result.commits_ahead.max(0) as usize,
        behind: result.commits_behind.max(0) as usize,
        method: result.merge_method,
    });

    WorktreeInfo {
        branch: entry.branch_display().to_string(),
        path: entry.path.clone(),
        head: entry.head.clone(),
        dirty,
        merged: result.merged,
        is_main: false,
        commits_ahead: Some(result.commits_ahead),
        commits_behind: Some(result.commits_behind),
        merge_method: result.merge_method,
        status: Some(status_str),
        detection_error: result.detection_error,
        issues: if result.issues.is_empty() { None } else { Some(result.issues) },
    }
}

fn enrichment_failed_fallback(entry: &RawWorktreeEntry) -> WorktreeInfo {
    let issue = DetectionIssue::new(
        IssueCode::EnrichmentFailed,
        Severity::Error,
        "enrichment",
        "enrichment exceeded the per-item timeout",
        false,
    );
    WorktreeInfo {
        branch: entry.branch_display().to_string(),
        path: entry.path.clone(),
        head: entry.head.clone(),
        dirty: false,
        merged: false,
        is_main: false,
        commits_ahead: None,
        commits_behind: None,
        merge_method: None,
        status: None,
        detection_error: Some(issue.message.clone()),
        issues: Some(vec![issue]),
    }
}

/// List every worktree of the repository containing `git_root`, enriched
/// with merge-status, dirty, and classification information, in bounded
/// parallelism. Output order matches `git worktree list --porcelain` order.
pub fn list_worktrees(git_root: &Path, env: &EnvConfig) -> Result<Vec<WorktreeInfo>, GitError> {
    let out = run_git(
        &["worktree", "list", "--porcelain"],
        git_root,
        &[],
        None,
        None,
        "worktree-list",
    );
    if !out.success() {
        return Err(GitError::command_failed("git worktree list --porcelain", out.stderr));
    }

    let entries = parse_porcelain(&out.stdout);
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let resolved_target = detect::resolve_default_target(git_root);
    let is_shallow = shallow::is_shallow(git_root);

    let options = ExecutorOptions {
        concurrency: env.concurrency,
        per_item_timeout: Duration::from_millis(env.item_timeout_ms),
    };

    let resolved_target_owned = resolved_target;
    let env = *env;
    let infos = executor::run(
        entries,
        &options,
        move |entry: &RawWorktreeEntry, cancel: &CancelToken| {
            enrich(entry, &resolved_target_owned, is_shallow, &env, cancel)
        },
        enrichment_failed_fallback,
    );

    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "worktree /repo\nHEAD abcdef1234567890\nbranch refs/heads/main\n\nworktree /repo/feature\nHEAD 1234567abcdef90\nbranch refs/heads/feature\n\nworktree /repo/detached\nHEAD deadbeef1234567\ndetached\n\nworktree /repo/.bare\nbare\n\n";

    #[test]
    fn parses_multiple_records_in_order() {
        let entries = parse_porcelain(SAMPLE);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].path, PathBuf::from("/repo"));
        assert_eq!(entries[1].branch.as_deref(), Some("feature"));
        assert_eq!(entries[2].branch, None);
        assert!(entries[3].is_bare);
    }

    #[test]
    fn strips_refs_heads_prefix_from_branch() {
        let entries = parse_porcelain(SAMPLE);
        assert_eq!(entries[0].branch.as_deref(), Some("main"));
    }

    // Bug hypothesis: without `#[serde(rename_all = "camelCase")]` serde
    // would emit Rust's snake_case field names, diverging from the
    // documented JSON field names (e.g. `isMain`, `commitsAhead`).
    #[test]
    fn worktree_info_json_uses_camel_case_field_names() {
        let info = WorktreeInfo {
            branch: "feature".to_string(),
            path: PathBuf::from("/repo/feature"),
            head: "abcdef1".to_string(),
            dirty: false,
            merged: true,
            is_main: false,
            commits_ahead: Some(2),
            commits_behind: Some(0),
            merge_method: None,
            status: Some("merged".to_string()),
            detection_error: None,
            issues: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"isMain\":false"));
        assert!(json.contains("\"commitsAhead\":2"));
        assert!(json.contains("\"commitsBehind\":0"));
        assert!(!json.contains("is_main"));
        assert!(!json.contains("commits_ahead"));
    }

    #[test]
    fn head_is_truncated_to_seven_hex_chars() {
        let entries = parse_porcelain(SAMPLE);
        assert_eq!(entries[0].head, "abcdef1");
    }

    #[test]
    fn branch_display_falls_back_to_detached_sentinel() {
        let entries = parse_porcelain(SAMPLE);
        assert_eq!(entries[2].branch_display(), "(detached)");
    }

    // Bug hypothesis: a porcelain stream with no trailing blank line after
    // the last record must still flush that record.
    #[test]
    fn parses_record_with_no_trailing_blank_line() {
        let stdout = "worktree /repo\nHEAD abcdef1234567890\nbranch refs/heads/main";
        let entries = parse_porcelain(stdout);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].branch.as_deref(), Some("main"));
    }

    #[test]
    fn bare_worktrees_are_still_parsed_with_flag_set() {
        let entries = parse_porcelain(SAMPLE);
        let bare = entries.iter().find(|e| e.is_bare).unwrap();
        assert_eq!(bare.path, PathBuf::from("/repo/.bare"));
    }

    #[test]
    fn resolve_main_branch_name_matches_conventional_names() {
        assert!(resolve_main_branch_name("main", "refs/heads/trunk"));
        assert!(resolve_main_branch_name("master", "refs/heads/trunk"));
        assert!(resolve_main_branch_name("trunk", "refs/heads/trunk"));
        assert!(!resolve_main_branch_name("feature", "refs/heads/trunk"));
    }
}
