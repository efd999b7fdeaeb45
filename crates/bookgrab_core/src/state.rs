use crate::view_model::SessionView;

/// Index the whole-book traversal starts at. One provider reloads spuriously
/// when asked for page 0, so the walk begins one step before it and skips 0.
pub const SENTINEL_INDEX: i64 = -1;

/// Most documents carry content from page 1 on. Empty or repeated batches at
/// or before this index do not end the traversal.
pub const FIRST_CONTENT_INDEX: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadMode {
    /// Extract exactly the page that is already open.
    #[default]
    CurrentPage,
    /// Walk the whole document page by page.
    WholeBook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Aborted,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Init,
    Navigate(i64),
    AwaitReady,
    Extract,
    Decide,
    Terminate,
    Completed,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Aborted)
    }
}

/// Why a traversal stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Current-page mode finished its single batch.
    SinglePage,
    /// An empty batch past the first content page.
    EndOfDocument,
    /// The batch repeated the previous batch.
    RepeatedPage,
    /// The batch repeated the very first batch.
    WrappedAround,
}

/// Process-local state of one book traversal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraversalState {
    mode: DownloadMode,
    status: SessionStatus,
    phase: Phase,
    current_index: i64,
    first_fingerprint: Option<String>,
    previous_fingerprint: Option<String>,
    pending_fingerprint: Option<String>,
    pending_pages: usize,
    pages_appended: usize,
    batches_appended: usize,
    stop_reason: Option<StopReason>,
}

impl TraversalState {
    pub fn new(mode: DownloadMode) -> Self {
        Self {
            mode,
            current_index: SENTINEL_INDEX,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> DownloadMode {
        self.mode
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> i64 {
        self.current_index
    }

    pub fn first_fingerprint(&self) -> Option<&str> {
        self.first_fingerprint.as_deref()
    }

    pub fn previous_fingerprint(&self) -> Option<&str> {
        self.previous_fingerprint.as_deref()
    }

    pub fn pages_appended(&self) -> usize {
        self.pages_appended
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            mode: self.mode,
            status: self.status,
            phase: self.phase,
            current_index: self.current_index,
            pages_appended: self.pages_appended,
            batches_appended: self.batches_appended,
            stop_reason: self.stop_reason,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = SessionStatus::Running;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        if let Phase::Navigate(index) = phase {
            self.current_index = index;
        }
    }

    pub(crate) fn is_repeat(&self, fingerprint: &str) -> bool {
        self.previous_fingerprint.as_deref() == Some(fingerprint)
            || self.first_fingerprint.as_deref() == Some(fingerprint)
    }

    pub(crate) fn hold_batch(&mut self, fingerprint: String, pages: usize) {
        self.pending_fingerprint = Some(fingerprint);
        self.pending_pages = pages;
    }

    /// Commits the held batch: records its fingerprint and returns the page
    /// count it covered.
    pub(crate) fn commit_batch(&mut self) -> usize {
        let pages = std::mem::take(&mut self.pending_pages);
        if let Some(fingerprint) = self.pending_fingerprint.take() {
            if self.first_fingerprint.is_none() {
                self.first_fingerprint = Some(fingerprint.clone());
            }
            self.previous_fingerprint = Some(fingerprint);
        }
        self.pages_appended += pages;
        self.batches_appended += 1;
        pages
    }

    pub(crate) fn terminate(&mut self, reason: StopReason) {
        self.stop_reason = Some(reason);
        self.pending_fingerprint = None;
        self.pending_pages = 0;
        self.phase = Phase::Terminate;
    }

    pub(crate) fn complete(&mut self) {
        self.phase = Phase::Completed;
        self.status = SessionStatus::Completed;
    }

    pub(crate) fn abort(&mut self) {
        self.phase = Phase::Aborted;
        self.status = SessionStatus::Aborted;
    }
}

/// Next traversal index after a step that covered `pages` pages. Index 0 is
/// never visited.
pub fn next_index(current: i64, pages: usize) -> i64 {
    let step = i64::try_from(pages.max(1)).unwrap_or(i64::MAX);
    let next = current.saturating_add(step);
    if next == 0 {
        1
    } else {
        next
    }
}
