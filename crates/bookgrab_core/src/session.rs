use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("a download is already running in this window")]
pub struct SessionBusy;

/// Per-window "is a download running" flag.
///
/// Cloning shares the flag. At most one [`SessionGuard`] exists at a time;
/// dropping it clears the flag, so every exit path releases the slot.
#[derive(Debug, Clone, Default)]
pub struct SessionSlot {
    busy: Arc<AtomicBool>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claims the slot. A second claim while one is held is rejected, not queued.
    pub fn try_acquire(&self) -> Result<SessionGuard, SessionBusy> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionBusy)?;
        Ok(SessionGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

#[derive(Debug)]
pub struct SessionGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
