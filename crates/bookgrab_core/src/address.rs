use url::Url;

pub const PAGE_PARAM: &str = "page";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid page address {address}: {message}")]
    Invalid { address: String, message: String },
}

/// Rewrites (or appends) the `page` query parameter of `current` to `page`.
/// `None` removes the parameter so the provider shows its default page.
///
/// Every other query item is kept byte-for-byte, in its original position.
pub fn page_address(current: &str, page: Option<i64>) -> Result<String, AddressError> {
    let mut url = Url::parse(current).map_err(|err| AddressError::Invalid {
        address: current.to_string(),
        message: err.to_string(),
    })?;

    let replacement = page.map(|p| format!("{PAGE_PARAM}={p}"));
    let mut replaced = false;
    let mut items: Vec<String> = Vec::new();
    for item in url.query().unwrap_or_default().split('&') {
        if item.is_empty() {
            continue;
        }
        if item.split('=').next() == Some(PAGE_PARAM) {
            if !replaced {
                if let Some(value) = &replacement {
                    items.push(value.clone());
                }
                replaced = true;
            }
            continue;
        }
        items.push(item.to_string());
    }
    if !replaced {
        if let Some(value) = replacement {
            items.push(value);
        }
    }

    if items.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&items.join("&")));
    }
    Ok(url.into())
}

/// Reads the `page` query parameter, if present and numeric.
pub fn page_param(address: &str) -> Option<i64> {
    let url = Url::parse(address).ok()?;
    let query = url.query()?;
    query
        .split('&')
        .filter_map(|item| item.split_once('='))
        .find(|(key, _)| *key == PAGE_PARAM)
        .and_then(|(_, value)| value.parse().ok())
}

/// `scheme://host[:port]` of an address, the key adapters match against.
pub fn origin_of(address: &str) -> Option<String> {
    let url = Url::parse(address).ok()?;
    match url.origin() {
        origin @ url::Origin::Tuple(..) => Some(origin.ascii_serialization()),
        url::Origin::Opaque(_) => None,
    }
}
