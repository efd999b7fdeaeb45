mod common;

use bookgrab_engine::adapter::{
    any_ready, collapsed_assets, collapsed_label, collapsed_title, probe_direct_svg_page,
    OebvLayers, ScookImages, SvgObjects,
};
use bookgrab_engine::{
    AcquireError, AdapterRegistry, AssetKind, DomSnapshot, FailureKind, ProviderKind, SiteAdapter,
};
use common::{png, StaticFetcher};
use pretty_assertions::assert_eq;

const BOOK: &str = "https://a.digi4school.at/ebook/5501/index.html?page=3";

#[test]
fn at_most_one_adapter_matches_each_host() {
    let registry = AdapterRegistry::builtin();
    let adapters: Vec<Box<dyn SiteAdapter>> =
        vec![Box::new(SvgObjects), Box::new(ScookImages), Box::new(OebvLayers)];
    let hosts = [
        "https://a.digi4school.at",
        "https://www.trauner-digibox.com",
        "https://hpthek.at",
        "https://www.helbling-ezone.com",
        "https://bridge.scook.de",
        "https://reader.oebv.at",
        "https://example.com",
        "https://scook.digi4school.at",
        "https://oebv.scook.de",
        "https://digi4school.oebv.at",
        "https://hpthek.scook.de.example.com",
        "https://example.com/digi4school/scook",
    ];
    for host in hosts {
        let matching = adapters.iter().filter(|a| a.matches_host(host)).count();
        assert!(matching <= 1, "{host} matched {matching} adapters");
    }

    assert_eq!(
        registry.select("https://A.Digi4School.at").map(|a| a.provider()),
        Some(ProviderKind::SvgObjects)
    );
    assert_eq!(
        registry.select("https://bridge.scook.de").map(|a| a.provider()),
        Some(ProviderKind::ScookImages)
    );
    assert_eq!(
        registry.select("https://reader.oebv.at").map(|a| a.provider()),
        Some(ProviderKind::OebvLayers)
    );
    assert_eq!(
        registry.select("https://scook.digi4school.at").map(|a| a.provider()),
        Some(ProviderKind::SvgObjects)
    );
    assert_eq!(
        registry.select("https://oebv.scook.de").map(|a| a.provider()),
        Some(ProviderKind::ScookImages)
    );
    assert!(registry.select("https://hpthek.scook.de.example.com").is_none());
    assert!(registry.select("https://example.com").is_none());
    assert_eq!(
        registry.providers(),
        vec![ProviderKind::SvgObjects, ProviderKind::ScookImages, ProviderKind::OebvLayers]
    );
}

#[test]
fn snapshot_queries_collapse_across_frames() {
    let snapshots = vec![
        DomSnapshot::new(BOOK, "<html><head><title></title></head><body></body></html>"),
        DomSnapshot::new(
            "https://a.digi4school.at/ebook/5501/frame.html",
            "<html><head><title>Biologie 3</title></head><body><input id='txtPage' value='3 / 180'><object data='3/3.svg'></object></body></html>",
        ),
    ];
    assert!(any_ready(&SvgObjects, &snapshots));
    assert_eq!(collapsed_label(&SvgObjects, &snapshots).as_deref(), Some("3"));
    assert_eq!(collapsed_title(&SvgObjects, &snapshots).as_deref(), Some("Biologie 3"));
}

#[tokio::test]
async fn svg_pages_take_their_size_from_the_view_box() {
    let fetcher = StaticFetcher::new()
        .with(
            "https://a.digi4school.at/ebook/5501/3/3.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 595 842"></svg>"#,
        )
        .with(
            "https://a.digi4school.at/ebook/5501/4/4.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#,
        );
    let snapshot = DomSnapshot::new(
        BOOK,
        "<object data='3/3.svg'></object><object data='4/4.svg' width='600' height='800'></object>",
    );

    let assets = SvgObjects.page_assets(&snapshot, &fetcher).await.unwrap();
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].kind, AssetKind::Vector);
    assert_eq!(assets[0].source_uri, "https://a.digi4school.at/ebook/5501/3/3.svg");
    assert_eq!((assets[0].declared_width, assets[0].declared_height), (Some(595.0), Some(842.0)));
    // No viewBox: the object element's own size is used.
    assert_eq!((assets[1].declared_width, assets[1].declared_height), (Some(600.0), Some(800.0)));
}

#[tokio::test]
async fn raster_pages_take_their_intrinsic_size() {
    let fetcher = StaticFetcher::new().with("https://bridge.scook.de/pages/12.png", png(40, 60));
    let snapshot = DomSnapshot::new(
        "https://bridge.scook.de/book/9",
        "<div class='pages-wrapper'><img src='/pages/12.png'></div>",
    );

    let assets = ScookImages.page_assets(&snapshot, &fetcher).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].kind, AssetKind::Raster);
    assert_eq!((assets[0].declared_width, assets[0].declared_height), (Some(40.0), Some(60.0)));
}

#[tokio::test]
async fn failed_page_fetch_is_reported_with_its_status() {
    let fetcher = StaticFetcher::new().failing(
        "https://bridge.scook.de/pages/12.png",
        FailureKind::HttpStatus(503),
    );
    let snapshot = DomSnapshot::new(
        "https://bridge.scook.de/book/9",
        "<div class='pages-wrapper'><img src='/pages/12.png'></div>",
    );

    let err = ScookImages.page_assets(&snapshot, &fetcher).await.unwrap_err();
    assert!(matches!(err, AcquireError::AssetFetch { ref uri, .. } if uri == "https://bridge.scook.de/pages/12.png"));
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn first_snapshot_with_assets_wins() {
    let fetcher = StaticFetcher::new().with("https://bridge.scook.de/frame/p1.png", png(4, 4));
    let snapshots = vec![
        DomSnapshot::new("https://bridge.scook.de/book/9", "<p>loading</p>"),
        DomSnapshot::new(
            "https://bridge.scook.de/frame/index.html",
            "<div class='pages-wrapper'><img src='p1.png'></div>",
        ),
    ];
    let assets = collapsed_assets(&ScookImages, &snapshots, &fetcher).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].source_uri, "https://bridge.scook.de/frame/p1.png");
}

#[tokio::test]
async fn direct_svg_probe_follows_fetch_result() {
    let fetcher = StaticFetcher::new().with("https://a.digi4school.at/ebook/5501/2/2.svg", "<svg/>");
    assert!(probe_direct_svg_page(&fetcher, BOOK, 2).await);
    assert!(!probe_direct_svg_page(&fetcher, BOOK, 9).await);
}
