//! Health Aggregator (C12): reduces a list of entries to a summary used by
//! the CLI dispatcher to decide the process exit code.

use crate::issue::DetectionIssue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListHealth {
    pub total: usize,
    pub degraded_count: usize,
    pub fatal_count: usize,
    pub all_failed: bool,
}

/// Anything the aggregator can read issues off of.
pub trait HasIssues {
    fn issues(&self) -> &[DetectionIssue];
}

pub fn aggregate<T: HasIssues>(entries: &[T]) -> ListHealth {
    let total = entries.len();
    let degraded_count = entries.iter().filter(|e| !e.issues().is_empty()).count();
    let fatal_count = entries
        .iter()
        .filter(|e| e.issues().iter().any(DetectionIssue::is_error))
        .count();
    let all_failed = total > 0 && fatal_count == total;

    ListHealth {
        total,
        degraded_count,
        fatal_count,
        all_failed,
    }
}
