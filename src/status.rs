//! Status String Formatter (C11): a pure function mapping
//! `{merged, dirty, ahead, behind, mergeMethod}` to the display string, per
//! the fixed precedence table in spec.md §4.7.

use crate::detect::MergeMethod;

pub struct StatusInput {
    pub merged: bool,
    pub dirty: bool,
    pub ahead: usize,
    pub behind: usize,
    pub method: Option<MergeMethod>,
}

pub fn format(input: StatusInput) -> String {
    let StatusInput {
        merged,
        dirty,
        ahead,
        behind,
        method,
    } = input;

    if merged {
        let suffix = match method {
            Some(MergeMethod::Squash) => " (squash)",
            _ => "",
        };
        return match (ahead == 0 && behind == 0, dirty) {
            (true, false) => "pristine".to_string(),
            (true, true) => "dirty".to_string(),
            (false, true) => format!("merged{suffix}, dirty"),
            (false, false) => format!("merged{suffix}"),
        };
    }

    match (ahead > 0, behind > 0, dirty) {
        (true, true, true) => format!("{ahead} ahead, {behind} behind, dirty"),
        (true, true, false) => format!("{ahead} ahead, {behind} behind"),
        (true, false, true) => format!("{ahead} ahead, dirty"),
        (true, false, false) => format!("{ahead} ahead"),
        (false, true, true) => format!("{behind} behind, dirty"),
        (false, true, false) => format!("{behind} behind"),
        (false, false, true) => "dirty".to_string(),
        (false, false, false) => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn input(merged: bool, dirty: bool, ahead: usize, behind: usize, method: Option<MergeMethod>) -> StatusInput {
        StatusInput { merged, dirty, ahead, behind, method }
    }

    // Table-driven cover of every row in spec.md §4.7's precedence table.
    #[rstest]
    #[case::pristine(true, false, 0, 0, Some(MergeMethod::Ancestor), "pristine")]
    #[case::merged_clean_dirty_collapses(true, true, 0, 0, Some(MergeMethod::Ancestor), "dirty")]
    #[case::merged_dirty_squash(true, true, 2, 0, Some(MergeMethod::Squash), "merged (squash), dirty")]
    #[case::merged_dirty_ancestor(true, true, 2, 0, Some(MergeMethod::Ancestor), "merged, dirty")]
    #[case::merged_clean_squash_drifted(true, false, 0, 5, Some(MergeMethod::Squash), "merged (squash)")]
    #[case::merged_clean_ancestor_drifted(true, false, 1, 0, Some(MergeMethod::Ancestor), "merged")]
    #[case::unmerged_ahead_behind_dirty(false, true, 3, 2, None, "3 ahead, 2 behind, dirty")]
    #[case::unmerged_ahead_behind_clean(false, false, 3, 2, None, "3 ahead, 2 behind")]
    #[case::unmerged_ahead_only_dirty(false, true, 3, 0, None, "3 ahead, dirty")]
    #[case::unmerged_ahead_only_clean(false, false, 3, 0, None, "3 ahead")]
    #[case::unmerged_behind_only_dirty(false, true, 0, 4, None, "4 behind, dirty")]
    #[case::unmerged_behind_only_clean(false, false, 0, 4, None, "4 behind")]
    #[case::unmerged_dirty_only(false, true, 0, 0, None, "dirty")]
    #[case::unmerged_no_drift_no_dirty(false, false, 0, 0, None, "unknown")]
    fn matches_precedence_table(
        #[case] merged: bool,
        #[case] dirty: bool,
        #[case] ahead: usize,
        #[case] behind: usize,
        #[case] method: Option<MergeMethod>,
        #[case] expected: &str,
    ) {
        assert_eq!(format(input(merged, dirty, ahead, behind, method)), expected);
    }
}
