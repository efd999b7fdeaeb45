use super::{domain_is_any, fetch_raster, ProviderKind, SiteAdapter};
use crate::snapshot::{element_text, non_empty, select_all, select_first};
use crate::{AcquireError, AssetFetcher, DomSnapshot, RawAsset};

const PAGE_IMAGES: &str = ".pages-wrapper img";

/// Books rendered as one `<img>` per visible page.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScookImages;

fn image_sources(snapshot: &DomSnapshot) -> Vec<String> {
    let doc = snapshot.document();
    select_all(&doc, PAGE_IMAGES)
        .into_iter()
        .filter_map(|img| snapshot.resolve(img.value().attr("src")?))
        .collect()
}

#[async_trait::async_trait]
impl SiteAdapter for ScookImages {
    fn provider(&self) -> ProviderKind {
        ProviderKind::ScookImages
    }

    fn matches_host(&self, origin: &str) -> bool {
        domain_is_any(origin, &["scook"])
    }

    fn is_page_ready(&self, snapshot: &DomSnapshot) -> bool {
        let doc = snapshot.document();
        (1..=2).contains(&select_all(&doc, PAGE_IMAGES).len())
    }

    fn page_label(&self, snapshot: &DomSnapshot) -> Option<String> {
        let doc = snapshot.document();
        select_first(&doc, "input.current-page")
            .and_then(|input| non_empty(input.value().attr("placeholder")))
    }

    fn book_title(&self, snapshot: &DomSnapshot) -> Option<String> {
        let doc = snapshot.document();
        select_first(&doc, "title")
            .map(element_text)
            .filter(|title| !title.is_empty())
    }

    async fn page_assets(
        &self,
        snapshot: &DomSnapshot,
        fetcher: &dyn AssetFetcher,
    ) -> Result<Vec<RawAsset>, AcquireError> {
        let mut assets = Vec::new();
        for uri in image_sources(snapshot) {
            assets.push(fetch_raster(fetcher, &uri).await?);
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::ScookImages;
    use crate::adapter::SiteAdapter;
    use crate::DomSnapshot;

    #[test]
    fn ready_with_one_or_two_page_images() {
        let adapter = ScookImages;
        let page = |imgs: &str| {
            DomSnapshot::new(
                "https://bridge.scook.de/book/9",
                format!("<div class='pages-wrapper'>{imgs}</div>"),
            )
        };
        assert!(!adapter.is_page_ready(&page("")));
        assert!(adapter.is_page_ready(&page("<img src='p1.jpg'>")));
        assert!(adapter.is_page_ready(&page("<img src='p1.jpg'><img src='p2.jpg'>")));
        assert!(!adapter.is_page_ready(&page("<img><img><img>")));
    }

    #[test]
    fn label_comes_from_placeholder() {
        let snap = DomSnapshot::new(
            "https://bridge.scook.de/book/9",
            "<input class='current-page' placeholder='14-15'>",
        );
        assert_eq!(ScookImages.page_label(&snap).as_deref(), Some("14-15"));
    }
}
