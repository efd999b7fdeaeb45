use std::path::{Path, PathBuf};

const FALLBACK_STEM: &str = "eBook";
const MAX_STEM_CHARS: usize = 80;

/// Default output file name for a book: `{sanitized title}.pdf`, or
/// `eBook.pdf` when the title is missing or sanitizes to nothing.
pub fn default_output_filename(title: Option<&str>) -> String {
    let stem = title
        .map(sanitize_title)
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());
    format!("{stem}.pdf")
}

/// Default output path inside `dir`.
pub fn default_output_path(dir: &Path, title: Option<&str>) -> PathBuf {
    dir.join(default_output_filename(title))
}

/// Replaces characters no common file system accepts, trims separators and
/// keeps the stem short and off the reserved Windows device names.
pub fn sanitize_title(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let mut stem: String = compacted.chars().take(MAX_STEM_CHARS).collect();
    let trimmed_len = stem.trim_end().len();
    stem.truncate(trimmed_len);
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
