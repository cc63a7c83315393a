//! The result of a reduction.

use std::path::PathBuf;

use serde::Serialize;

use super::attachment::AttachmentSet;

/// How a reduction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceStatus {
    /// The input was already under the limit and returned unchanged.
    AlreadyFits,
    /// At least one resize round ran and the total is now under the limit.
    Fits,
    /// The attempt budget ran out. The result is best-effort and may still
    /// be over the limit; callers needing strict compliance must check
    /// `total_size`.
    AttemptsExhausted,
}

/// Attachments after reduction, plus what it took to get there.
#[derive(Debug, Clone, Serialize)]
pub struct ReduceOutcome {
    /// Output paths, positionally matching the input.
    pub attachments: AttachmentSet,
    /// Total on-disk size of `attachments`. `None` when the attempt budget
    /// was already spent on entry and nothing was measured.
    pub total_size: Option<u64>,
    /// Number of resize rounds performed.
    pub rounds: u32,
    /// Terminal state.
    pub status: ReduceStatus,
}

impl ReduceOutcome {
    /// `true` unless the attempt budget ran out.
    pub fn fits(&self) -> bool {
        self.status != ReduceStatus::AttemptsExhausted
    }

    /// Consume the outcome, returning the output paths.
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.attachments.into_paths()
    }
}
