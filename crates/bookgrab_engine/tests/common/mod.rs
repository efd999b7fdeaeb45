#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use bookgrab_core::{page_param, ProgressMessage};
use bookgrab_engine::{
    AssembleError, AssemblySummary, AssetFetcher, BrowsingSurface, DocumentWriter, DomSnapshot,
    FailureKind, FetchError, FetchMetadata, FetchOutput, HostError, OutputPrompt, PageDescriptor,
    ProgressSink,
};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(grab_logging::initialize_for_tests);
}

/// Fetcher answering from a fixed table; unknown addresses are 404s.
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Result<Vec<u8>, FailureKind>>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(uri.to_string(), Ok(bytes.into()));
        self
    }

    pub fn failing(mut self, uri: &str, kind: FailureKind) -> Self {
        self.responses.insert(uri.to_string(), Err(kind));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AssetFetcher for StaticFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchOutput, FetchError> {
        self.calls.lock().unwrap().push(uri.to_string());
        let result = self
            .responses
            .get(uri)
            .cloned()
            .unwrap_or(Err(FailureKind::HttpStatus(404)));
        let bytes = result.map_err(|kind| FetchError::new(kind, "scripted failure"))?;
        let content_type = uri
            .ends_with(".svg")
            .then(|| "image/svg+xml; charset=utf-8".to_string());
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: uri.to_string(),
                final_url: uri.to_string(),
                status: 200,
                redirect_count: 0,
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

type PageMarkup = Box<dyn Fn(Option<i64>) -> String + Send + Sync>;

/// Browsing surface whose document depends only on the `page` parameter.
pub struct FakeSurface {
    current: Mutex<String>,
    markup: PageMarkup,
    visited: Mutex<Vec<Option<i64>>>,
    reloads: AtomicUsize,
}

impl FakeSurface {
    pub fn new(start: &str, markup: impl Fn(Option<i64>) -> String + Send + Sync + 'static) -> Self {
        Self {
            current: Mutex::new(start.to_string()),
            markup: Box::new(markup),
            visited: Mutex::new(Vec::new()),
            reloads: AtomicUsize::new(0),
        }
    }

    /// `page` values of every navigation, in order; `None` for a reset.
    pub fn visited(&self) -> Vec<Option<i64>> {
        self.visited.lock().unwrap().clone()
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BrowsingSurface for FakeSurface {
    async fn current_url(&self) -> Result<String, HostError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn navigate(&self, url: &str) -> Result<(), HostError> {
        self.visited.lock().unwrap().push(page_param(url));
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn snapshots(&self) -> Result<Vec<DomSnapshot>, HostError> {
        let url = self.current.lock().unwrap().clone();
        let markup = (self.markup)(page_param(&url));
        Ok(vec![DomSnapshot::new(url, markup)])
    }

    async fn reload(&self) -> Result<(), HostError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FixedPrompt {
    answer: Option<PathBuf>,
    pub asked: Mutex<Vec<PathBuf>>,
}

impl FixedPrompt {
    pub fn answering(path: Option<PathBuf>) -> Self {
        Self {
            answer: path,
            asked: Mutex::new(Vec::new()),
        }
    }
}

impl OutputPrompt for FixedPrompt {
    fn choose_output_path(&self, suggested: &Path) -> Option<PathBuf> {
        self.asked.lock().unwrap().push(suggested.to_path_buf());
        self.answer.clone()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<ProgressMessage>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<ProgressMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, message: &ProgressMessage) {
        self.messages.lock().unwrap().push(message.clone());
    }
}

/// Writer that records page boxes as text lines instead of rendering them:
/// `{width}x{height} {source_uri}`.
pub struct RecordingWriter {
    path: PathBuf,
    lines: Vec<String>,
}

impl DocumentWriter for RecordingWriter {
    fn begin(path: &Path, _title: &str) -> Result<Self, AssembleError> {
        Ok(Self {
            path: path.to_path_buf(),
            lines: Vec::new(),
        })
    }

    fn append_page(&mut self, page: &PageDescriptor) -> Result<(), AssembleError> {
        self.lines
            .push(format!("{}x{} {}", page.width, page.height, page.source_uri));
        Ok(())
    }

    fn pages(&self) -> usize {
        self.lines.len()
    }

    fn finalize(self) -> Result<AssemblySummary, AssembleError> {
        let content = self.lines.join("\n");
        std::fs::write(&self.path, &content).unwrap();
        Ok(AssemblySummary {
            path: self.path,
            pages: self.lines.len(),
            bytes: content.len() as u64,
        })
    }
}

pub fn recorded_pages(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([30, 90, 200]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Jpeg)
        .unwrap();
    bytes.into_inner()
}

/// MediaBox width and height of every page of a PDF, in page order.
pub fn pdf_page_sizes(path: &Path) -> Vec<(f32, f32)> {
    let doc = lopdf::Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            let media_box = match page.get(b"MediaBox") {
                Ok(object) => object.as_array().unwrap().clone(),
                Err(_) => {
                    let parent = page.get(b"Parent").unwrap().as_reference().unwrap();
                    doc.get_dictionary(parent)
                        .unwrap()
                        .get(b"MediaBox")
                        .unwrap()
                        .as_array()
                        .unwrap()
                        .clone()
                }
            };
            let number = |index: usize| media_box[index].as_float().unwrap();
            (number(2) - number(0), number(3) - number(1))
        })
        .collect()
}

pub fn assert_close(actual: (f32, f32), expected: (f32, f32)) {
    assert!(
        (actual.0 - expected.0).abs() < 0.5 && (actual.1 - expected.1).abs() < 0.5,
        "expected {expected:?}, got {actual:?}"
    );
}
