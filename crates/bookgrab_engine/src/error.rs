use bookgrab_core::{AddressError, SessionBusy};

use crate::assemble::AssembleError;
use crate::types::FailureKind;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HostError {
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("page snapshot unavailable: {0}")]
    Snapshot(String),
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),
}

/// Terminal failure of one acquisition session.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("a download is already running")]
    Busy(#[from] SessionBusy),
    #[error("no supported provider for {origin}")]
    UnsupportedProvider { origin: String },
    #[error("no book content found on the current page")]
    NoContentFound,
    #[error("failed to fetch {uri}: {kind}")]
    AssetFetch { uri: String, kind: FailureKind },
    #[error("page {source_uri} has no usable size and no previous page to inherit one from")]
    Geometry { source_uri: String },
    #[error("failed to parse page {uri}: {message}")]
    Parse { uri: String, message: String },
    #[error("output document error: {0}")]
    Assemble(#[from] AssembleError),
    #[error("host error: {0}")]
    Host(#[from] HostError),
    #[error("download cancelled")]
    Cancelled,
}

impl AcquireError {
    /// HTTP status behind an [`AcquireError::AssetFetch`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AcquireError::AssetFetch { kind, .. } => kind.status(),
            _ => None,
        }
    }

    /// Errors raised before any output file exists.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            AcquireError::Busy(_) | AcquireError::UnsupportedProvider { .. } | AcquireError::NoContentFound
        )
    }
}
