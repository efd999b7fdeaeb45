/// Normalizes a provider page label: spaces removed, then the part before the
/// first `/` and before the first `-` kept (`"12 / 300"` becomes `"12"`).
pub fn normalize_page_label(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| *c != ' ').collect();
    let head = compact.split('/').next().unwrap_or_default();
    let head = head.split('-').next().unwrap_or_default().trim();
    if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    }
}

/// Numeric value of a normalized label, if it has one.
pub fn page_number(label: &str) -> Option<i64> {
    label.trim().parse().ok()
}

/// Labels for the pages of one batch: numeric labels count up per page,
/// non-numeric labels repeat unchanged, absent labels stay absent.
pub fn batch_labels(label: Option<&str>, pages: usize) -> Vec<Option<String>> {
    match label {
        Some(label) => match page_number(label) {
            Some(first) => (0..pages)
                .map(|offset| Some((first + offset as i64).to_string()))
                .collect(),
            None => vec![Some(label.to_string()); pages],
        },
        None => vec![None; pages],
    }
}
