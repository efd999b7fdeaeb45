use std::sync::LazyLock;

use bookgrab_core::page_param;
use regex::Regex;

use super::{domain_is_any, fetch_raster, ProviderKind, SiteAdapter};
use crate::snapshot::{element_text, non_empty, select_all, select_first};
use crate::{AcquireError, AssetFetcher, DomSnapshot, RawAsset};

static BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"background-image\s*:\s*url\(\s*["']?([^"')]*)["']?\s*\)"#)
        .expect("valid background url pattern")
});

/// Books whose pages are stacks of background-image layers, one layer per
/// resolution, lowest first.
#[derive(Debug, Default, Clone, Copy)]
pub struct OebvLayers;

fn layer_sources(snapshot: &DomSnapshot) -> Vec<String> {
    let doc = snapshot.document();
    select_all(&doc, ".image-layers")
        .into_iter()
        .filter_map(|layers| {
            let highest = layers.child_elements().last()?;
            let tile = highest.child_elements().next()?;
            let style = tile.value().attr("style")?;
            let reference = BACKGROUND_URL.captures(style)?.get(1)?.as_str();
            snapshot.resolve(reference)
        })
        .collect()
}

#[async_trait::async_trait]
impl SiteAdapter for OebvLayers {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OebvLayers
    }

    fn matches_host(&self, origin: &str) -> bool {
        domain_is_any(origin, &["oebv"])
    }

    /// Past page 1 the reader briefly shows placeholder pages; real pages
    /// carry an `_hx_` id.
    fn is_page_ready(&self, snapshot: &DomSnapshot) -> bool {
        let doc = snapshot.document();
        let page = page_param(&snapshot.url).unwrap_or(0);
        let expected_selector = if page > 1 { r#".page[id^="_hx_"]"# } else { ".page" };
        let expected = select_all(&doc, expected_selector).len();
        let all = select_all(&doc, ".page").len();
        expected == all && (1..=2).contains(&expected)
    }

    fn page_label(&self, snapshot: &DomSnapshot) -> Option<String> {
        let doc = snapshot.document();
        select_first(&doc, ".gauge")
            .map(element_text)
            .filter(|label| !label.is_empty())
    }

    fn book_title(&self, snapshot: &DomSnapshot) -> Option<String> {
        let doc = snapshot.document();
        select_first(&doc, "title").and_then(|title| non_empty(title.value().attr("data-original")))
    }

    async fn page_assets(
        &self,
        snapshot: &DomSnapshot,
        fetcher: &dyn AssetFetcher,
    ) -> Result<Vec<RawAsset>, AcquireError> {
        let mut assets = Vec::new();
        for uri in layer_sources(snapshot) {
            assets.push(fetch_raster(fetcher, &uri).await?);
        }
        Ok(assets)
    }
}
