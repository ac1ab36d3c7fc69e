//! The structured issue vocabulary the detection cascade reports instead of
//! raising exceptions (C3).

use strum::Display;

/// Closed vocabulary of things that can go wrong during merge-status
/// detection or enrichment. Never raised as an error — always attached to a
/// result as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    ShallowClone,
    ShallowCheckFailed,
    MergeBaseFailed,
    MergeBaseLookupFailed,
    CommitTreeFailed,
    GitPathFailed,
    CherryTimeout,
    CherryFailed,
    CherryEmpty,
    CherryInvalid,
    DetectionDisabled,
    DetectionAborted,
    EnrichmentFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One structured thing that went wrong, attached to a `MergeDetectionResult`
/// or a `WorktreeInfo`/`OrphanBranch`. `countsReliable` records whether the
/// ahead/behind counts carried alongside this issue can be trusted.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionIssue {
    pub code: IssueCode,
    pub severity: Severity,
    pub source: &'static str,
    pub message: String,
    pub counts_reliable: bool,
}

impl DetectionIssue {
    pub fn new(
        code: IssueCode,
        severity: Severity,
        source: &'static str,
        message: impl Into<String>,
        counts_reliable: bool,
    ) -> Self {
        Self {
            code,
            severity,
            source,
            message: message.into(),
            counts_reliable,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_code_renders_screaming_snake_case() {
        assert_eq!(IssueCode::ShallowClone.to_string(), "SHALLOW_CLONE");
        assert_eq!(
            IssueCode::MergeBaseLookupFailed.to_string(),
            "MERGE_BASE_LOOKUP_FAILED"
        );
    }

    #[test]
    fn severity_renders_lowercase() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.to_string(), "error");
    }

    // Bug hypothesis: without an explicit `#[serde(rename_all = ...)]` to
    // match the `strum` `Display` casing, `serde_json` would fall back to
    // the enum's Rust-identifier casing ("ShallowClone") instead of the
    // spec's documented wire format ("SHALLOW_CLONE"), silently diverging
    // the JSON surface from the human-readable one.
    #[test]
    fn issue_code_json_matches_screaming_snake_case() {
        let json = serde_json::to_string(&IssueCode::ShallowClone).unwrap();
        assert_eq!(json, "\"SHALLOW_CLONE\"");
    }

    #[test]
    fn severity_json_matches_lowercase() {
        let json = serde_json::to_string(&Severity::Error).unwrap();
        assert_eq!(json, "\"error\"");
    }

    #[test]
    fn detection_issue_json_uses_camel_case_field_names() {
        let issue = DetectionIssue::new(IssueCode::CherryTimeout, Severity::Warning, "layer3-cherry", "timed out", true);
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"countsReliable\":true"));
        assert!(!json.contains("counts_reliable"));
    }
}
