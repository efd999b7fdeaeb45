//! Static browsing surface over plain HTTP. Pages are fetched and decoded
//! but no script runs, so readiness reflects the served markup only.
use std::sync::{Arc, Mutex};

use bookgrab_core::origin_of;
use grab_logging::{grab_debug, grab_warn};

use crate::snapshot::select_all;
use crate::{decode_text, AssetFetcher, BrowsingSurface, DomSnapshot, HostError};

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    snapshots: Vec<DomSnapshot>,
}

pub struct HttpSurface {
    fetcher: Arc<dyn AssetFetcher>,
    page: Mutex<Option<LoadedPage>>,
}

impl HttpSurface {
    pub fn new(fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            fetcher,
            page: Mutex::new(None),
        }
    }

    /// Creates a surface showing `url`.
    pub async fn open(fetcher: Arc<dyn AssetFetcher>, url: &str) -> Result<Self, HostError> {
        let surface = Self::new(fetcher);
        surface.navigate(url).await?;
        Ok(surface)
    }

    async fn load_document(&self, url: &str) -> Result<DomSnapshot, HostError> {
        let output = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|err| HostError::Navigation {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        let decoded = decode_text(&output.bytes, output.metadata.content_type.as_deref()).map_err(
            |err| HostError::Navigation {
                url: url.to_string(),
                message: err.to_string(),
            },
        )?;
        grab_debug!("loaded {} ({})", url, decoded.encoding_label);
        Ok(DomSnapshot::new(url, decoded.text))
    }

    fn store(&self, page: LoadedPage) -> Result<(), HostError> {
        let mut slot = self
            .page
            .lock()
            .map_err(|_| HostError::Snapshot("surface state poisoned".into()))?;
        *slot = Some(page);
        Ok(())
    }

    fn loaded(&self) -> Result<LoadedPage, HostError> {
        let slot = self
            .page
            .lock()
            .map_err(|_| HostError::Snapshot("surface state poisoned".into()))?;
        slot.clone()
            .ok_or_else(|| HostError::Snapshot("no page loaded".into()))
    }
}

/// Same-origin `iframe` sources of a document, resolved and de-duplicated.
fn frame_sources(document: &DomSnapshot) -> Vec<String> {
    let origin = origin_of(&document.url);
    let doc = document.document();
    let mut sources: Vec<String> = Vec::new();
    for frame in select_all(&doc, "iframe[src]") {
        let Some(src) = frame.value().attr("src").and_then(|src| document.resolve(src)) else {
            continue;
        };
        if origin.is_some() && origin_of(&src) == origin && !sources.contains(&src) {
            sources.push(src);
        }
    }
    sources
}

#[async_trait::async_trait]
impl BrowsingSurface for HttpSurface {
    async fn current_url(&self) -> Result<String, HostError> {
        Ok(self.loaded()?.url)
    }

    async fn navigate(&self, url: &str) -> Result<(), HostError> {
        let document = self.load_document(url).await?;
        let mut snapshots = vec![document];
        for src in frame_sources(&snapshots[0]) {
            match self.load_document(&src).await {
                Ok(frame) => snapshots.push(frame),
                Err(err) => grab_warn!("skipping frame {}: {}", src, err),
            }
        }
        self.store(LoadedPage {
            url: url.to_string(),
            snapshots,
        })
    }

    async fn snapshots(&self) -> Result<Vec<DomSnapshot>, HostError> {
        Ok(self.loaded()?.snapshots)
    }

    async fn reload(&self) -> Result<(), HostError> {
        let url = self.loaded()?.url;
        self.navigate(&url).await
    }
}
