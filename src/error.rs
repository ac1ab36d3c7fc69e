//! Fatal, caller-facing errors. Reserved for hard pre-conditions the
//! detection cascade has no per-entry slot to attach an issue to (`git
//! worktree list` or `git branch` failing outright) — never for
//! detection-cascade failures, which always surface as [`crate::issue::DetectionIssue`]
//! values on the result instead of unwinding.

use crate::styling::{ERROR_EMOJI, error_message};

#[derive(Debug)]
pub enum GitError {
    /// A git subprocess exited non-zero (or ≥128) where there was nowhere to
    /// attach a `DetectionIssue`.
    CommandFailed { context: String, stderr: String },
    /// Output from git could not be parsed into the expected shape.
    ParseError(String),
    /// The current directory is not inside a git working tree.
    NotAGitRepository,
}

impl GitError {
    pub fn command_failed(context: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            context: context.into(),
            stderr: stderr.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError(message.into())
    }
}

impl std::fmt::Display for GitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitError::CommandFailed { context, stderr } => {
                let detail = stderr.trim();
                if detail.is_empty() {
                    write!(f, "{}", error_message(format!("{context} failed")))
                } else {
                    write!(f, "{}", error_message(format!("{context} failed: {detail}")))
                }
            }
            GitError::ParseError(msg) => write!(f, "{}", error_message(msg)),
            GitError::NotAGitRepository => write!(
                f,
                "{ERROR_EMOJI} not a git repository (or any parent up to the filesystem root)"
            ),
        }
    }
}

impl std::error::Error for GitError {}
