//! SVG page markup handling: intrinsic geometry, root rewriting, embedded
//! image references and the zero-dash renderer workaround.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use base64::Engine;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::{Captures, Regex};

/// Value written in place of a zero dash length. The PDF vector renderer
/// fails on zero-length dash segments.
pub const DASH_EPSILON: &str = "0.001";

static DASH_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(stroke-dasharray\s*(?::|=\s*["']))([^;"'}<>]*)"#)
        .expect("valid dash declaration pattern")
});

static DASH_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?")
        .expect("valid dash number pattern")
});

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SvgError {
    #[error("malformed markup: {0}")]
    Malformed(String),
    #[error("no <svg> root element")]
    MissingRoot,
    #[error("failed to serialize markup: {0}")]
    Write(String),
}

/// Root element rewritten to a target box, plus the `<image>` references it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenSvg {
    pub markup: String,
    /// Unescaped `href`/`xlink:href` values of `<image>` elements, in
    /// document order, without duplicates.
    pub image_refs: Vec<String>,
}

/// Width and height of the root element's `viewBox`.
pub fn read_view_box(markup: &str) -> Option<(f64, f64)> {
    let mut reader = Reader::from_str(markup);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if is_named(&e, b"svg") => {
                let value = attribute_value(&e, |key| key == b"viewBox")?;
                return parse_view_box(&value);
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn parse_view_box(value: &str) -> Option<(f64, f64)> {
    let numbers: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [_, _, width, height] => Some((*width, *height)),
        _ => None,
    }
}

/// Keeps only the first `<svg>` element, sets its `viewBox` to
/// `0 0 width height` and drops its explicit `width`/`height`, so a renderer
/// scales the drawing to exactly the target box.
pub fn rewrite_root(markup: &str, width: f64, height: f64) -> Result<RewrittenSvg, SvgError> {
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::new());
    let mut image_refs: Vec<String> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| SvgError::Malformed(err.to_string()))?;
        if depth == 0 {
            match event {
                Event::Start(e) if is_named(&e, b"svg") => {
                    let root = sized_root(&e, width, height)?;
                    write(&mut writer, Event::Start(root))?;
                    depth = 1;
                }
                Event::Empty(e) if is_named(&e, b"svg") => {
                    let root = sized_root(&e, width, height)?;
                    write(&mut writer, Event::Empty(root))?;
                    break;
                }
                Event::Eof => return Err(SvgError::MissingRoot),
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => {
                collect_image_ref(&e, &mut image_refs);
                depth += 1;
                write(&mut writer, Event::Start(e))?;
            }
            Event::Empty(e) => {
                collect_image_ref(&e, &mut image_refs);
                write(&mut writer, Event::Empty(e))?;
            }
            Event::End(e) => {
                depth -= 1;
                write(&mut writer, Event::End(e))?;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => {
                return Err(SvgError::Malformed("unexpected end of markup".into()));
            }
            Event::DocType(_) | Event::Decl(_) => {}
            other => write(&mut writer, other)?,
        }
    }

    let markup =
        String::from_utf8(writer.into_inner()).map_err(|err| SvgError::Write(err.to_string()))?;
    Ok(RewrittenSvg { markup, image_refs })
}

fn sized_root(start: &BytesStart<'_>, width: f64, height: f64) -> Result<BytesStart<'static>, SvgError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut root = BytesStart::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|err| SvgError::Malformed(err.to_string()))?;
        match attr.key.as_ref() {
            b"width" | b"height" | b"viewBox" => {}
            _ => root.push_attribute(attr),
        }
    }
    let view_box = format!("0 0 {width} {height}");
    root.push_attribute(("viewBox", view_box.as_str()));
    Ok(root)
}

fn collect_image_ref(element: &BytesStart<'_>, refs: &mut Vec<String>) {
    if !is_named(element, b"image") {
        return;
    }
    if let Some(reference) = attribute_value(element, is_href) {
        if !reference.is_empty() && !refs.contains(&reference) {
            refs.push(reference);
        }
    }
}

/// Perturbs zero entries of `stroke-dasharray` declarations to [`DASH_EPSILON`].
/// Numbers anywhere else in the markup are left untouched.
pub fn fix_zero_dash_lengths(markup: &str) -> Cow<'_, str> {
    DASH_DECLARATION.replace_all(markup, |caps: &Captures<'_>| {
        let values = DASH_NUMBER.replace_all(&caps[2], |number: &Captures<'_>| {
            match number[0].parse::<f64>() {
                Ok(value) if value == 0.0 => DASH_EPSILON.to_string(),
                _ => number[0].to_string(),
            }
        });
        format!("{}{}", &caps[1], values)
    })
}

/// Replaces `<image>` references found in `images` with `data:` URIs so the
/// markup is self-contained.
pub fn inline_images(markup: &str, images: &BTreeMap<String, Vec<u8>>) -> Result<String, SvgError> {
    if images.is_empty() {
        return Ok(markup.to_string());
    }

    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::new());
    loop {
        let event = reader
            .read_event()
            .map_err(|err| SvgError::Malformed(err.to_string()))?;
        match event {
            Event::Eof => break,
            Event::Start(e) if is_named(&e, b"image") => {
                let inlined = inline_element(&e, images)?;
                write(&mut writer, Event::Start(inlined))?;
            }
            Event::Empty(e) if is_named(&e, b"image") => {
                let inlined = inline_element(&e, images)?;
                write(&mut writer, Event::Empty(inlined))?;
            }
            other => write(&mut writer, other)?,
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|err| SvgError::Write(err.to_string()))
}

fn inline_element(
    element: &BytesStart<'_>,
    images: &BTreeMap<String, Vec<u8>>,
) -> Result<BytesStart<'static>, SvgError> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut rebuilt = BytesStart::new(name);
    for attr in element.attributes() {
        let attr = attr.map_err(|err| SvgError::Malformed(err.to_string()))?;
        let replacement = if is_href(attr.key.as_ref()) {
            attr.unescape_value()
                .ok()
                .and_then(|value| images.get(value.as_ref()))
                .map(|bytes| data_uri(bytes))
        } else {
            None
        };
        match replacement {
            Some(uri) => {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                rebuilt.push_attribute((key.as_str(), uri.as_str()));
            }
            None => rebuilt.push_attribute(attr),
        }
    }
    Ok(rebuilt)
}

/// `data:` URI for raster bytes, typed by sniffing the image format.
pub fn data_uri(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

fn is_named(element: &BytesStart<'_>, local: &[u8]) -> bool {
    element.local_name().as_ref() == local
}

fn is_href(key: &[u8]) -> bool {
    key == b"href" || key == b"xlink:href"
}

fn attribute_value(element: &BytesStart<'_>, mut matches: impl FnMut(&[u8]) -> bool) -> Option<String> {
    element
        .attributes()
        .filter_map(Result::ok)
        .find(|attr: &Attribute<'_>| matches(attr.key.as_ref()))
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), SvgError> {
    writer
        .write_event(event)
        .map_err(|err| SvgError::Write(err.to_string()))
}
