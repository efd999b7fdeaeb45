use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub status: u16,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl FailureKind {
    /// HTTP status of the failed request, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FailureKind::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Vector markup (SVG) that may reference raster images.
    Vector,
    /// A standalone raster image.
    Raster,
}

/// One page as an adapter found it, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAsset {
    pub source_uri: String,
    pub kind: AssetKind,
    pub raw_bytes: Vec<u8>,
    pub declared_width: Option<f64>,
    pub declared_height: Option<f64>,
}

impl RawAsset {
    pub fn vector(source_uri: impl Into<String>, markup: impl Into<Vec<u8>>) -> Self {
        Self {
            source_uri: source_uri.into(),
            kind: AssetKind::Vector,
            raw_bytes: markup.into(),
            declared_width: None,
            declared_height: None,
        }
    }

    pub fn raster(source_uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source_uri: source_uri.into(),
            kind: AssetKind::Raster,
            raw_bytes: bytes.into(),
            declared_width: None,
            declared_height: None,
        }
    }

    pub fn with_declared_size(mut self, width: Option<f64>, height: Option<f64>) -> Self {
        self.declared_width = width;
        self.declared_height = height;
        self
    }
}

/// Normalized, render-ready page. `width`/`height` are PDF points and
/// always positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDescriptor {
    pub page_number: Option<i64>,
    pub source_uri: String,
    pub width: f64,
    pub height: f64,
    pub kind: AssetKind,
    pub renderable_content: Vec<u8>,
    /// Embedded raster bytes keyed by the reference as written in the markup.
    pub embedded_images: BTreeMap<String, Vec<u8>>,
}
