//! Integration coverage for the Orphan Classifier (C10) against a real
//! repository: worktree-held and protected branches are excluded, and the
//! remaining branches classify per spec.md §4.6's ordered rules.

mod common;

use std::collections::HashSet;

use common::TestRepo;
use side_quest::env_config::EnvConfig;
use side_quest::orphans::{self, OrphanStatus};

fn env() -> EnvConfig {
    EnvConfig {
        concurrency: 4,
        item_timeout_ms: 10_000,
        detection_timeout_ms: 5_000,
    }
}

#[test]
fn classifies_merged_and_ahead_orphans() {
    let repo = TestRepo::init();

    // merged: ancestor-merged then its worktree removed, branch left behind.
    repo.checkout_new_branch("merged-branch");
    repo.commit_file("m.txt", "m", "merged commit");
    repo.checkout("main");
    repo.git(&["merge", "--no-ff", "-q", "-m", "merge merged-branch", "merged-branch"]);

    // ahead: has commits, never merged.
    repo.checkout_new_branch("ahead-branch");
    repo.commit_file("ah.txt", "ah", "ahead commit");
    repo.checkout("main");

    // Note: a branch pointing at the exact same commit as `main` (e.g. `git
    // branch pristine-branch` with no further commits) is NOT a fixture for
    // `OrphanStatus::Pristine`. Layer 1's `merge-base --is-ancestor` exits 0
    // for a commit compared against itself, so such a branch classifies as
    // `Merged` (ancestor), same as `merged-branch` above. Under this
    // cascade, `Pristine` (unmerged with zero commits ahead) is reachable
    // only through transient failure paths (e.g. a cancelled Layer 1 call
    // that still resolves zero ahead commits), not through any ordinary
    // branch-state fixture, so it has no coverage here.
    let worktree_branches: HashSet<String> = ["main".to_string()].into_iter().collect();
    let protected = vec!["main".to_string(), "master".to_string(), "develop".to_string()];

    let branches = orphans::list_orphan_branches(&repo.root, &worktree_branches, &protected, &env()).unwrap();
    let by_name = |name: &str| branches.iter().find(|b| b.branch == name).unwrap();

    assert_eq!(by_name("merged-branch").status, OrphanStatus::Merged);
    assert_eq!(by_name("ahead-branch").status, OrphanStatus::Ahead);
}

#[test]
fn protected_and_worktree_held_branches_are_excluded() {
    let repo = TestRepo::init();
    repo.git(&["branch", "develop"]);
    repo.checkout_new_branch("checked-out");
    repo.checkout("main");

    let worktree_branches: HashSet<String> = ["main".to_string(), "checked-out".to_string()].into_iter().collect();
    let protected = vec!["main".to_string(), "master".to_string(), "develop".to_string()];

    let branches = orphans::list_orphan_branches(&repo.root, &worktree_branches, &protected, &env()).unwrap();
    assert!(branches.iter().all(|b| b.branch != "develop"));
    assert!(branches.iter().all(|b| b.branch != "checked-out"));
    assert!(branches.iter().all(|b| b.branch != "main"));
}
