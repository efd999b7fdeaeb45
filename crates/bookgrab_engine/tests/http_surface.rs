use std::sync::Arc;

use bookgrab_engine::{BrowsingSurface, FetchSettings, HostError, HttpSurface, ReqwestFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn document_and_same_origin_frames_are_snapshotted() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/book/index.html",
        r#"<html><body><iframe src="reader.html"></iframe><iframe src="https://other.invalid/x"></iframe></body></html>"#,
    )
    .await;
    serve(&server, "/book/reader.html", "<html><body><object data='1/1.svg'></object></body></html>").await;

    let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default()));
    let url = format!("{}/book/index.html?page=1", server.uri());
    let surface = HttpSurface::open(fetcher, &url).await.unwrap();

    assert_eq!(surface.current_url().await.unwrap(), url);
    let snapshots = surface.snapshots().await.unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[1].url, format!("{}/book/reader.html", server.uri()));
    assert!(snapshots[1].markup.contains("1/1.svg"));
}

#[tokio::test]
async fn navigation_failure_keeps_the_previous_page() {
    let server = MockServer::start().await;
    serve(&server, "/book", "<html><body>cover</body></html>").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default()));
    let start = format!("{}/book", server.uri());
    let surface = HttpSurface::open(fetcher, &start).await.unwrap();

    let err = surface.navigate(&format!("{}/gone", server.uri())).await.unwrap_err();
    assert!(matches!(err, HostError::Navigation { .. }));
    assert_eq!(surface.current_url().await.unwrap(), start);
    surface.reload().await.unwrap();
}

#[tokio::test]
async fn empty_surface_has_no_current_page() {
    let surface = HttpSurface::new(Arc::new(ReqwestFetcher::new(FetchSettings::default())));
    assert!(matches!(surface.current_url().await, Err(HostError::Snapshot(_))));
}
