//! Scratch git repository fixture for integration tests. Much lighter than
//! the teacher's template-repo/PTY harness: this crate's test surface is a
//! handful of git plumbing calls, not a full interactive CLI.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

pub struct TestRepo {
    _dir: TempDir,
    pub root: PathBuf,
}

fn git(root: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(root)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("git invocation failed to spawn");
    assert!(status.success(), "git {args:?} failed in {root:?}");
}

impl TestRepo {
    pub fn init() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        git(&root, &["init", "-q", "-b", "main"]);
        git(&root, &["commit", "--allow-empty", "-q", "-m", "root"]);
        Self { _dir: dir, root }
    }

    pub fn git(&self, args: &[&str]) {
        git(&self.root, args);
    }

    pub fn checkout_new_branch(&self, name: &str) {
        self.git(&["checkout", "-q", "-b", name]);
    }

    pub fn commit_file(&self, name: &str, content: &str, message: &str) {
        std::fs::write(self.root.join(name), content).unwrap();
        self.git(&["add", name]);
        self.git(&["commit", "-q", "-m", message]);
    }

    pub fn checkout(&self, name: &str) {
        self.git(&["checkout", "-q", name]);
    }

    /// Squash `branch`'s commits since `base` onto `base` with a single
    /// commit, mimicking a GitHub "squash and merge".
    pub fn squash_merge(&self, base: &str, branch: &str) {
        self.git(&["checkout", "-q", base]);
        self.git(&["merge", "--squash", "-q", branch]);
        self.git(&["commit", "-q", "-m", &format!("squash merge {branch}")]);
    }
}
