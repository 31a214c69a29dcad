use std::{borrow::Cow, fmt};

/// The browser's current address. Only the pathname matters for media
/// resolution; the search string shows up in diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLocation {
    pub pathname: String,
    pub search: String,
}

impl PageLocation {
    pub fn new(pathname: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: search.into(),
        }
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pathname, self.search)
    }
}

/// Returns the decoded part of `pathname` that follows the first occurrence
/// of `serving_root`, or an empty string if the marker is absent.
pub fn extract_media_path(pathname: &str, serving_root: &str) -> String {
    let Some(idx) = pathname.find(serving_root) else {
        return String::new();
    };
    let encoded = &pathname[idx + serving_root.len()..];
    match urlencoding::decode(encoded) {
        Ok(Cow::Borrowed(decoded)) => decoded.to_string(),
        Ok(Cow::Owned(decoded)) => decoded,
        Err(err) => {
            log::warn!("Media path {encoded:?} is not valid percent-encoded UTF-8: {err}");
            encoded.to_string()
        }
    }
}

pub fn page_title<'a>(media_path: &'a str, fallback: &'a str) -> &'a str {
    if media_path.is_empty() {
        fallback
    } else {
        media_path
    }
}
