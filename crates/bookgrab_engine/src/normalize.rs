//! Turns raw adapter assets into render-ready page descriptors.
use std::collections::BTreeMap;

use bookgrab_core::{PageSize, SizeCarry};
use grab_logging::grab_debug;
use url::Url;

use crate::adapter::fetch_asset;
use crate::svg::{fix_zero_dash_lengths, rewrite_root};
use crate::{AcquireError, AssetFetcher, AssetKind, PageDescriptor, RawAsset};

/// Per-session normalizer. Carries the last resolved page size so pages
/// without usable geometry inherit it.
#[derive(Debug, Default)]
pub struct Normalizer {
    carry: SizeCarry,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_size(&self) -> Option<PageSize> {
        self.carry.previous()
    }

    pub async fn normalize(
        &mut self,
        asset: RawAsset,
        page_number: Option<i64>,
        fetcher: &dyn AssetFetcher,
    ) -> Result<PageDescriptor, AcquireError> {
        let size = self
            .carry
            .resolve(asset.declared_width, asset.declared_height)
            .map_err(|_| AcquireError::Geometry {
                source_uri: asset.source_uri.clone(),
            })?;

        match asset.kind {
            AssetKind::Raster => Ok(PageDescriptor {
                page_number,
                source_uri: asset.source_uri,
                width: size.width,
                height: size.height,
                kind: AssetKind::Raster,
                renderable_content: asset.raw_bytes,
                embedded_images: BTreeMap::new(),
            }),
            AssetKind::Vector => normalize_vector(asset, size, page_number, fetcher).await,
        }
    }
}

async fn normalize_vector(
    asset: RawAsset,
    size: PageSize,
    page_number: Option<i64>,
    fetcher: &dyn AssetFetcher,
) -> Result<PageDescriptor, AcquireError> {
    let parse_error = |message: String| AcquireError::Parse {
        uri: asset.source_uri.clone(),
        message,
    };
    let markup = std::str::from_utf8(&asset.raw_bytes).map_err(|err| parse_error(err.to_string()))?;
    let rewritten =
        rewrite_root(markup, size.width, size.height).map_err(|err| parse_error(err.to_string()))?;

    let mut embedded_images = BTreeMap::new();
    for reference in &rewritten.image_refs {
        if is_inline_reference(reference) {
            continue;
        }
        let uri = resolve_reference(&asset.source_uri, reference)
            .ok_or_else(|| parse_error(format!("unresolvable image reference {reference}")))?;
        let output = fetch_asset(fetcher, &uri).await?;
        embedded_images.insert(reference.clone(), output.bytes);
    }
    grab_debug!(
        "normalized {} at {}x{} with {} embedded images",
        asset.source_uri,
        size.width,
        size.height,
        embedded_images.len()
    );

    let content = fix_zero_dash_lengths(&rewritten.markup).into_owned();
    Ok(PageDescriptor {
        page_number,
        source_uri: asset.source_uri,
        width: size.width,
        height: size.height,
        kind: AssetKind::Vector,
        renderable_content: content.into_bytes(),
        embedded_images,
    })
}

fn is_inline_reference(reference: &str) -> bool {
    let reference = reference.trim_start();
    reference.starts_with('#') || reference.get(..5).is_some_and(|s| s.eq_ignore_ascii_case("data:"))
}

fn resolve_reference(page_uri: &str, reference: &str) -> Option<String> {
    let base = Url::parse(page_uri).ok()?;
    base.join(reference.trim()).ok().map(Into::into)
}
