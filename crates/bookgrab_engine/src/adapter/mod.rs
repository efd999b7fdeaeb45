//! Provider adapters. Each adapter turns the DOM of one publishing platform
//! into readiness, label, title and an ordered list of raw page assets.
use std::io::Cursor;
use std::sync::Arc;

use bookgrab_core::normalize_page_label;
use grab_logging::{grab_debug, grab_warn};
use url::Url;

use crate::{AcquireError, AssetFetcher, DomSnapshot, FetchOutput, RawAsset};

mod oebv;
mod scook;
mod svg_objects;

pub use oebv::OebvLayers;
pub use scook::ScookImages;
pub use svg_objects::{direct_svg_page_address, probe_direct_svg_page, SvgObjects};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Pages are SVG documents embedded through `<object>` elements.
    SvgObjects,
    /// Pages are plain `<img>` elements.
    ScookImages,
    /// Pages are stacks of CSS background layers in several resolutions.
    OebvLayers,
}

#[async_trait::async_trait]
pub trait SiteAdapter: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn matches_host(&self, origin: &str) -> bool;

    /// Pure; polled repeatedly while a page settles.
    fn is_page_ready(&self, snapshot: &DomSnapshot) -> bool;

    /// Raw label of the visible page as the provider displays it.
    fn page_label(&self, snapshot: &DomSnapshot) -> Option<String>;

    fn book_title(&self, snapshot: &DomSnapshot) -> Option<String>;

    /// Fetches the assets of every page visible in `snapshot`, in display order.
    async fn page_assets(
        &self,
        snapshot: &DomSnapshot,
        fetcher: &dyn AssetFetcher,
    ) -> Result<Vec<RawAsset>, AcquireError>;
}

/// Ordered adapter list. The first adapter matching an origin wins.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SiteAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::new()
            .register(SvgObjects)
            .register(ScookImages)
            .register(OebvLayers)
    }

    pub fn register(mut self, adapter: impl SiteAdapter + 'static) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    pub fn select(&self, origin: &str) -> Option<Arc<dyn SiteAdapter>> {
        let origin = origin.to_ascii_lowercase();
        let selected = self
            .adapters
            .iter()
            .find(|adapter| adapter.matches_host(&origin))
            .cloned();
        match &selected {
            Some(adapter) => grab_debug!("{:?} adapter selected for {}", adapter.provider(), origin),
            None => grab_debug!("no adapter for {}", origin),
        }
        selected
    }

    pub fn providers(&self) -> Vec<ProviderKind> {
        self.adapters.iter().map(|adapter| adapter.provider()).collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

/// True when the domain label in front of the origin host's top-level
/// domain is one of `keys`. Subdomain labels never select a provider, so
/// `scook.digi4school.at` belongs to `digi4school` only.
pub(crate) fn domain_is_any(origin: &str, keys: &[&str]) -> bool {
    let Some(host) = Url::parse(origin)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
    else {
        return false;
    };
    let mut labels = host.trim_end_matches('.').rsplit('.');
    match (labels.next(), labels.next()) {
        (Some(_), Some(domain)) => keys.iter().any(|key| domain == *key),
        _ => false,
    }
}

/// True when any snapshot (document or frame) reports a ready page.
pub fn any_ready(adapter: &dyn SiteAdapter, snapshots: &[DomSnapshot]) -> bool {
    snapshots.iter().any(|snapshot| adapter.is_page_ready(snapshot))
}

/// First normalized page label across snapshots.
pub fn collapsed_label(adapter: &dyn SiteAdapter, snapshots: &[DomSnapshot]) -> Option<String> {
    crate::collapse(snapshots, |snapshot| {
        adapter
            .page_label(snapshot)
            .and_then(|raw| normalize_page_label(&raw))
    })
    .into_iter()
    .next()
}

pub fn collapsed_title(adapter: &dyn SiteAdapter, snapshots: &[DomSnapshot]) -> Option<String> {
    crate::first_text(snapshots, |snapshot| adapter.book_title(snapshot))
}

/// Asset list of the first snapshot that yields any.
pub async fn collapsed_assets(
    adapter: &dyn SiteAdapter,
    snapshots: &[DomSnapshot],
    fetcher: &dyn AssetFetcher,
) -> Result<Vec<RawAsset>, AcquireError> {
    for snapshot in snapshots {
        let assets = adapter.page_assets(snapshot, fetcher).await?;
        if !assets.is_empty() {
            return Ok(assets);
        }
    }
    Ok(Vec::new())
}

pub(crate) async fn fetch_asset(
    fetcher: &dyn AssetFetcher,
    uri: &str,
) -> Result<FetchOutput, AcquireError> {
    fetcher.fetch(uri).await.map_err(|err| {
        grab_warn!("fetch of {} failed: {}", uri, err);
        AcquireError::AssetFetch {
            uri: uri.to_string(),
            kind: err.kind,
        }
    })
}

/// Fetches a standalone raster page; its intrinsic pixel size is the declared size.
pub(crate) async fn fetch_raster(
    fetcher: &dyn AssetFetcher,
    uri: &str,
) -> Result<RawAsset, AcquireError> {
    let output = fetch_asset(fetcher, uri).await?;
    let (width, height) = match raster_dimensions(&output.bytes) {
        Some((width, height)) => (Some(width), Some(height)),
        None => {
            grab_debug!("could not read dimensions of {}", uri);
            (None, None)
        }
    };
    Ok(RawAsset::raster(uri, output.bytes).with_declared_size(width, height))
}

pub(crate) fn raster_dimensions(bytes: &[u8]) -> Option<(f64, f64)> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    Some((f64::from(width), f64::from(height)))
}

/// Parses a plain number from an HTML size attribute, ignoring a `px` unit.
pub(crate) fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value.strip_suffix("px").unwrap_or(value);
    value.trim().parse().ok()
}
