use crate::{DownloadMode, Phase, SessionStatus, StopReason};

/// Read-only snapshot of a traversal for display and reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub mode: DownloadMode,
    pub status: SessionStatus,
    pub phase: Phase,
    pub current_index: i64,
    pub pages_appended: usize,
    pub batches_appended: usize,
    pub stop_reason: Option<StopReason>,
}
