use grab_logging::grab_debug;
use url::Url;

use super::{domain_is_any, fetch_asset, parse_length, ProviderKind, SiteAdapter};
use crate::snapshot::{non_empty, select_all, select_first};
use crate::svg::read_view_box;
use crate::{decode_text, AcquireError, AssetFetcher, DomSnapshot, RawAsset};

const HOST_KEYS: &[&str] = &["digi4school", "trauner-digibox", "hpthek", "helbling-ezone"];

/// Books whose pages are SVG documents embedded with `<object data=...>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgObjects;

struct ObjectRef {
    uri: String,
    width: Option<f64>,
    height: Option<f64>,
}

fn object_refs(snapshot: &DomSnapshot) -> Vec<ObjectRef> {
    let doc = snapshot.document();
    select_all(&doc, "object")
        .into_iter()
        .filter_map(|object| {
            let element = object.value();
            let uri = snapshot.resolve(element.attr("data")?)?;
            Some(ObjectRef {
                uri,
                width: element.attr("width").and_then(parse_length),
                height: element.attr("height").and_then(parse_length),
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl SiteAdapter for SvgObjects {
    fn provider(&self) -> ProviderKind {
        ProviderKind::SvgObjects
    }

    fn matches_host(&self, origin: &str) -> bool {
        domain_is_any(origin, HOST_KEYS)
    }

    fn is_page_ready(&self, snapshot: &DomSnapshot) -> bool {
        let doc = snapshot.document();
        let empty_container = select_first(&doc, "#contentContainer")
            .map(|container| !container.children().any(|node| node.value().is_element()))
            .unwrap_or(false);
        if empty_container {
            return true;
        }
        let objects = select_all(&doc, "object").len();
        (1..=2).contains(&objects)
    }

    fn page_label(&self, snapshot: &DomSnapshot) -> Option<String> {
        let doc = snapshot.document();
        select_first(&doc, "#txtPage")
            .and_then(|input| non_empty(input.value().attr("value")))
            .or_else(|| {
                select_first(&doc, "input").and_then(|input| non_empty(input.value().attr("value")))
            })
    }

    fn book_title(&self, snapshot: &DomSnapshot) -> Option<String> {
        let doc = snapshot.document();
        select_first(&doc, r#"meta[name="title"]"#)
            .and_then(|meta| non_empty(meta.value().attr("content")))
            .or_else(|| {
                select_first(&doc, "title")
                    .map(crate::snapshot::element_text)
                    .filter(|title| !title.is_empty())
            })
    }

    async fn page_assets(
        &self,
        snapshot: &DomSnapshot,
        fetcher: &dyn AssetFetcher,
    ) -> Result<Vec<RawAsset>, AcquireError> {
        let mut assets = Vec::new();
        for object in object_refs(snapshot) {
            let output = fetch_asset(fetcher, &object.uri).await?;
            let decoded = decode_text(&output.bytes, output.metadata.content_type.as_deref())
                .map_err(|err| AcquireError::Parse {
                    uri: object.uri.clone(),
                    message: err.to_string(),
                })?;

            let (view_width, view_height) = read_view_box(&decoded.text).unwrap_or((0.0, 0.0));
            let width = Some(view_width).filter(|w| *w != 0.0).or(object.width);
            let height = Some(view_height).filter(|h| *h != 0.0).or(object.height);
            grab_debug!("svg page {} declared {:?}x{:?}", object.uri, width, height);

            assets.push(RawAsset::vector(object.uri, decoded.text).with_declared_size(width, height));
        }
        Ok(assets)
    }
}

/// Address under which SVG-object books publish the markup of page `page`:
/// `{scheme}://{host}{path without index.html}{page}/{page}.svg`.
pub fn direct_svg_page_address(book_url: &str, page: i64) -> Option<String> {
    let url = Url::parse(book_url).ok()?;
    let host = url.host_str()?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let path = url.path().replacen("index.html", "", 1);
    let separator = if path.ends_with('/') { "" } else { "/" };
    Some(format!(
        "{}://{}{}{}{page}/{page}.svg",
        url.scheme(),
        host,
        path,
        separator
    ))
}

/// Whether page `page` of the book at `book_url` can be fetched directly.
pub async fn probe_direct_svg_page(fetcher: &dyn AssetFetcher, book_url: &str, page: i64) -> bool {
    let Some(address) = direct_svg_page_address(book_url, page) else {
        return false;
    };
    match fetcher.fetch(&address).await {
        Ok(_) => true,
        Err(err) => {
            grab_debug!("direct page probe {} failed: {}", address, err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{direct_svg_page_address, SvgObjects};
    use crate::adapter::SiteAdapter;
    use crate::DomSnapshot;

    fn snapshot(body: &str) -> DomSnapshot {
        DomSnapshot::new(
            "https://a.digi4school.at/ebook/1234/index.html?page=3",
            format!("<html><head><title>Physik 2</title></head><body>{body}</body></html>"),
        )
    }

    #[test]
    fn readiness_requires_one_or_two_objects() {
        let adapter = SvgObjects;
        assert!(!adapter.is_page_ready(&snapshot("<div id='contentContainer'><div></div></div>")));
        assert!(adapter.is_page_ready(&snapshot(
            "<div id='contentContainer'><object data='3/3.svg'></object></div>"
        )));
        assert!(!adapter.is_page_ready(&snapshot(
            "<object data='1.svg'></object><object data='2.svg'></object><object data='3.svg'></object>"
        )));
        // An empty container means there is no page to wait for.
        assert!(adapter.is_page_ready(&snapshot("<div id='contentContainer'></div>")));
    }

    #[test]
    fn label_prefers_page_box_over_first_input() {
        let adapter = SvgObjects;
        let snap = snapshot("<input value='search'><input id='txtPage' value='3 / 120'>");
        assert_eq!(adapter.page_label(&snap).as_deref(), Some("3 / 120"));
        let snap = snapshot("<input value='7'>");
        assert_eq!(adapter.page_label(&snap).as_deref(), Some("7"));
    }

    #[test]
    fn title_prefers_meta_title() {
        let adapter = SvgObjects;
        let snap = DomSnapshot::new(
            "https://a.digi4school.at/ebook/1/",
            "<html><head><meta name='title' content='Mathe 1'><title>digi4school</title></head></html>",
        );
        assert_eq!(adapter.book_title(&snap).as_deref(), Some("Mathe 1"));
        assert_eq!(adapter.book_title(&snapshot("")).as_deref(), Some("Physik 2"));
    }

    #[test]
    fn direct_page_address_drops_index_html() {
        assert_eq!(
            direct_svg_page_address("https://a.digi4school.at/ebook/1234/index.html?page=3", 7)
                .as_deref(),
            Some("https://a.digi4school.at/ebook/1234/7/7.svg")
        );
        assert_eq!(
            direct_svg_page_address("http://localhost:8080/book", 2).as_deref(),
            Some("http://localhost:8080/book/2/2.svg")
        );
        assert_eq!(direct_svg_page_address("not a url", 1), None);
    }
}
