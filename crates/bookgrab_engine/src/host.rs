use std::path::{Path, PathBuf};
use std::sync::mpsc;

use bookgrab_core::ProgressMessage;
use grab_logging::grab_info;

use crate::{DomSnapshot, HostError};

/// The single browsing surface a host window renders provider pages in.
/// There is exactly one current page at a time.
#[async_trait::async_trait]
pub trait BrowsingSurface: Send + Sync {
    /// Address of the page currently shown.
    async fn current_url(&self) -> Result<String, HostError>;

    /// Loads `url` and resolves once the host reports loading stopped.
    async fn navigate(&self, url: &str) -> Result<(), HostError>;

    /// The current document followed by its same-origin frames.
    async fn snapshots(&self) -> Result<Vec<DomSnapshot>, HostError>;

    /// Reloads the current page to a clean state.
    async fn reload(&self) -> Result<(), HostError>;
}

/// Asks where the output document goes. `None` means the user declined.
pub trait OutputPrompt: Send + Sync {
    fn choose_output_path(&self, suggested: &Path) -> Option<PathBuf>;
}

pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &ProgressMessage);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<ProgressMessage>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<ProgressMessage>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn report(&self, message: &ProgressMessage) {
        let _ = self.tx.send(message.clone());
    }
}

/// Writes progress to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn report(&self, message: &ProgressMessage) {
        grab_info!("{}", message);
    }
}
