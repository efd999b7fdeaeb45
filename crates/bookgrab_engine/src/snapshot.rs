use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Serialized DOM of one document in the host view: the top-level page or
/// one of its same-origin frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomSnapshot {
    pub url: String,
    pub markup: String,
}

impl DomSnapshot {
    pub fn new(url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markup: markup.into(),
        }
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.markup)
    }

    /// Resolves a reference found in this document against its address.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(url) = Url::parse(trimmed) {
            return Some(url.into());
        }
        Url::parse(&self.url)
            .ok()
            .and_then(|base| base.join(trimmed).ok())
            .map(Into::into)
    }
}

pub(crate) fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    Selector::parse(css)
        .map(|sel| doc.select(&sel).collect())
        .unwrap_or_default()
}

pub(crate) fn select_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(css).ok()?;
    let found = doc.select(&sel).next();
    found
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Runs `query` on every snapshot (document first, then frames), drops
/// absent and exact-duplicate results, and keeps the rest in order.
pub fn collapse<T, F>(snapshots: &[DomSnapshot], mut query: F) -> Vec<T>
where
    T: PartialEq,
    F: FnMut(&DomSnapshot) -> Option<T>,
{
    let mut results: Vec<T> = Vec::new();
    for snapshot in snapshots {
        if let Some(result) = query(snapshot) {
            if !results.contains(&result) {
                results.push(result);
            }
        }
    }
    results
}

/// First non-empty text answer across snapshots.
pub fn first_text<F>(snapshots: &[DomSnapshot], mut query: F) -> Option<String>
where
    F: FnMut(&DomSnapshot) -> Option<String>,
{
    collapse(snapshots, |snapshot| {
        query(snapshot).filter(|text| !text.trim().is_empty())
    })
    .into_iter()
    .next()
}
