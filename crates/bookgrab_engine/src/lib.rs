//! Bookgrab engine: adapters, fetching, normalization, PDF assembly and the
//! runner that executes traversal effects against a browsing surface.
pub mod adapter;
mod assemble;
mod decode;
mod downloader;
mod error;
mod fetch;
mod filename;
mod host;
mod http_host;
mod normalize;
mod persist;
mod snapshot;
pub mod svg;
mod traverse;
mod types;

pub use adapter::{AdapterRegistry, ProviderKind, SiteAdapter};
pub use assemble::{AssembleError, AssemblySummary, DocumentWriter, PdfAssembler};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use downloader::{AcquireOutcome, BookDownloader};
pub use error::{AcquireError, HostError};
pub use fetch::{AssetFetcher, FetchSettings, ReqwestFetcher};
pub use filename::{default_output_filename, default_output_path, sanitize_title};
pub use host::{BrowsingSurface, ChannelProgressSink, LogProgressSink, OutputPrompt, ProgressSink};
pub use http_host::HttpSurface;
pub use normalize::Normalizer;
pub use persist::{ensure_output_dir, write_atomic, PersistError};
pub use snapshot::{collapse, first_text, DomSnapshot};
pub use traverse::AcquireSettings;
pub use types::{
    AssetKind, FailureKind, FetchError, FetchMetadata, FetchOutput, PageDescriptor, RawAsset,
};
