//! Output document assembly: one PDF page per page descriptor, sized exactly
//! to the descriptor's box.
//!
//! Every appended page is rendered to a one-page PDF and written to a spill
//! directory next to the target before the next page is produced. `finalize`
//! merges the spilled pages into the target file atomically.
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use grab_logging::{grab_debug, grab_info, grab_warn};
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use printpdf::{Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, Svg, XObjectTransform};
use tempfile::TempDir;
use thiserror::Error;

use crate::persist::{ensure_output_dir, parent_dir, write_atomic, PersistError};
use crate::svg::inline_images;
use crate::{AssetKind, PageDescriptor};

const PDF_VERSION: &str = "1.7";
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("cannot write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
    #[error("page {source_uri} could not be rendered: {message}")]
    Render { source_uri: String, message: String },
    #[error("page {source_uri} arrived after the document was finalized")]
    Closed { source_uri: String },
    #[error("cannot merge pages into {path}: {message}")]
    Merge { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblySummary {
    pub path: PathBuf,
    pub pages: usize,
    pub bytes: u64,
}

/// Append-only output document. `finalize` consumes the writer, so a
/// finished document cannot take more pages.
pub trait DocumentWriter: Send + Sized {
    /// Opens a document for `path`. Output problems surface here, before any
    /// page is produced.
    fn begin(path: &Path, title: &str) -> Result<Self, AssembleError>;

    fn append_page(&mut self, page: &PageDescriptor) -> Result<(), AssembleError>;

    fn pages(&self) -> usize;

    fn finalize(self) -> Result<AssemblySummary, AssembleError>;
}

/// PDF writer that keeps only encoded pages, on disk.
#[derive(Debug)]
pub struct PdfAssembler {
    path: PathBuf,
    title: String,
    spill: TempDir,
    pages: Vec<PathBuf>,
}

impl PdfAssembler {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the pages appended so far, one PDF file each.
    /// Removed once the writer is finalized or dropped.
    pub fn spill_dir(&self) -> &Path {
        self.spill.path()
    }

    fn spill_page(&self, bytes: &[u8]) -> Result<PathBuf, AssembleError> {
        let target = self
            .spill
            .path()
            .join(format!("{:05}.pdf", self.pages.len() + 1));
        fs::write(&target, bytes).map_err(|err| output_error(&self.path, err.into()))?;
        Ok(target)
    }
}

fn render_error(page: &PageDescriptor, message: impl Into<String>) -> AssembleError {
    AssembleError::Render {
        source_uri: page.source_uri.clone(),
        message: message.into(),
    }
}

fn output_error(path: &Path, source: PersistError) -> AssembleError {
    AssembleError::Output {
        path: path.to_path_buf(),
        source,
    }
}

/// Raster bytes as a PDF image stream. JPEG data is embedded as is; other
/// formats are decoded to RGB and deflated.
fn image_stream(page: &PageDescriptor) -> Result<Stream, AssembleError> {
    let bytes = page.renderable_content.as_slice();
    let format = image::guess_format(bytes).map_err(|err| render_error(page, err.to_string()))?;

    if format == ImageFormat::Jpeg {
        let decoder =
            JpegDecoder::new(Cursor::new(bytes)).map_err(|err| render_error(page, err.to_string()))?;
        let (width, height) = decoder.dimensions();
        let color_space = match decoder.color_type() {
            ColorType::L8 => Some("DeviceGray"),
            ColorType::Rgb8 => Some("DeviceRGB"),
            _ => None,
        };
        if let Some(color_space) = color_space {
            let dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            };
            return Ok(Stream::new(dict, bytes.to_vec()).with_compression(false));
        }
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|err| render_error(page, err.to_string()))?
        .to_rgb8();
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(render_error(page, "image has no pixels"));
    }
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8_i64,
    };
    let mut stream = Stream::new(dict, decoded.into_raw());
    stream
        .compress()
        .map_err(|err| render_error(page, err.to_string()))?;
    Ok(stream)
}

/// One-page PDF showing the raster image full-bleed.
fn raster_page(page: &PageDescriptor) -> Result<Vec<u8>, AssembleError> {
    let image = image_stream(page)?;
    let width = page.width as f32;
    let height = page.height as f32;

    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(image);
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|err| render_error(page, err.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(width), Object::Real(height)],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1_i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|err| render_error(page, err.to_string()))?;
    Ok(bytes)
}

/// One-page PDF with the self-contained SVG placed as a form XObject.
fn vector_page(page: &PageDescriptor) -> Result<Vec<u8>, AssembleError> {
    let markup = std::str::from_utf8(&page.renderable_content)
        .map_err(|err| render_error(page, err.to_string()))?;
    let markup = inline_images(markup, &page.embedded_images)
        .map_err(|err| render_error(page, err.to_string()))?;

    let mut warnings = Vec::new();
    let xobject = Svg::parse(&markup, &mut warnings).map_err(|message| render_error(page, message))?;
    let mut doc = PdfDocument::new(&page.source_uri);
    let id = doc.add_xobject(&xobject);
    let ops = vec![Op::UseXobject {
        id,
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Pt(0.0)),
            dpi: Some(72.0),
            ..Default::default()
        },
    }];
    let width = Mm::from(Pt(page.width as f32));
    let height = Mm::from(Pt(page.height as f32));
    let bytes = doc
        .with_pages(vec![PdfPage::new(width, height, ops)])
        .save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        grab_debug!("{} warnings while rendering {}", warnings.len(), page.source_uri);
    }
    Ok(bytes)
}

/// Attributes a page inherits from its page tree ancestors.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut parent = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Parent"))
        .and_then(Object::as_reference)
        .ok();
    while let Some(id) = parent {
        let Ok(node) = doc.get_dictionary(id) else {
            break;
        };
        for key in INHERITABLE {
            if found.iter().any(|(known, _)| known.as_slice() == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    found
}

/// Concatenates one-page documents, in order, under a single page tree.
fn merge_pages(parts: Vec<Document>, title: &str) -> Result<Document, lopdf::Error> {
    let mut merged = Document::with_version(PDF_VERSION);
    let pages_id = merged.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for mut part in parts {
        part.renumber_objects_with(merged.max_id + 1);
        merged.max_id = part.max_id;
        let page_ids: Vec<ObjectId> = part.get_pages().into_values().collect();
        for page_id in page_ids {
            let inherited = inherited_attributes(&part, page_id);
            let page = part.get_object_mut(page_id)?.as_dict_mut()?;
            for (key, value) in inherited {
                if !page.has(&key) {
                    page.set(key, value);
                }
            }
            page.set("Parent", pages_id);
            kids.push(Object::Reference(page_id));
        }
        for (id, object) in part.objects {
            if matches!(object.type_name(), Ok(b"Catalog") | Ok(b"Pages")) {
                continue;
            }
            merged.objects.insert(id, object);
        }
    }

    let count = kids.len() as i64;
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = merged.add_object(dictionary! {
        "Title" => Object::string_literal(title),
    });
    merged.trailer.set("Root", catalog_id);
    merged.trailer.set("Info", info_id);
    merged.prune_objects();
    Ok(merged)
}

impl DocumentWriter for PdfAssembler {
    fn begin(path: &Path, title: &str) -> Result<Self, AssembleError> {
        let dir = parent_dir(path);
        ensure_output_dir(&dir).map_err(|source| output_error(path, source))?;
        let spill = tempfile::Builder::new()
            .prefix(".bookgrab-pages-")
            .tempdir_in(&dir)
            .map_err(|err| output_error(path, err.into()))?;
        grab_info!("writing {} to {}", title, path.display());
        Ok(Self {
            path: path.to_path_buf(),
            title: title.to_string(),
            spill,
            pages: Vec::new(),
        })
    }

    fn append_page(&mut self, page: &PageDescriptor) -> Result<(), AssembleError> {
        if !(page.width > 0.0 && page.height > 0.0) {
            return Err(render_error(page, "page box must be positive"));
        }
        let bytes = match page.kind {
            AssetKind::Raster => raster_page(page)?,
            AssetKind::Vector => vector_page(page)?,
        };
        let spilled = self.spill_page(&bytes)?;
        self.pages.push(spilled);
        grab_debug!(
            "page {} appended ({}x{} pt, {} bytes)",
            self.pages.len(),
            page.width,
            page.height,
            bytes.len()
        );
        Ok(())
    }

    fn pages(&self) -> usize {
        self.pages.len()
    }

    fn finalize(self) -> Result<AssemblySummary, AssembleError> {
        let merge_error = |message: String| AssembleError::Merge {
            path: self.path.clone(),
            message,
        };
        let pages = self.pages.len();
        if pages == 0 {
            grab_warn!("finalizing {} without pages", self.path.display());
        }

        let mut parts = Vec::with_capacity(pages);
        for spilled in &self.pages {
            parts.push(Document::load(spilled).map_err(|err| merge_error(err.to_string()))?);
        }
        let mut merged = merge_pages(parts, &self.title).map_err(|err| merge_error(err.to_string()))?;
        let mut bytes = Vec::new();
        merged
            .save_to(&mut bytes)
            .map_err(|err| merge_error(err.to_string()))?;

        write_atomic(&self.path, &bytes).map_err(|source| output_error(&self.path, source))?;
        grab_info!("saved {} pages to {}", pages, self.path.display());
        Ok(AssemblySummary {
            path: self.path,
            pages,
            bytes: bytes.len() as u64,
        })
    }
}
