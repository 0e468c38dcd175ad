//! Thumbnail derivation from the first image of a post body

use lazy_static::lazy_static;
use regex::Regex;

use crate::storage::AssetStore;

/// Find the first markdown image and resolve it to a usable thumbnail.
///
/// External `http(s)` URLs are returned as-is. Anything else is made
/// site-absolute and only returned when the asset actually exists, so a
/// listing never links a missing image.
pub fn extract_thumbnail(body: &str, assets: &dyn AssetStore) -> Option<String> {
    lazy_static! {
        static ref IMAGE_REGEX: Regex = Regex::new(r"!\[.*?\]\(([^)\s]*)").unwrap();
    }

    let target = IMAGE_REGEX
        .captures(body)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())?;

    if target.is_empty() {
        return None;
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        return Some(target.to_string());
    }

    let site_path = if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{}", target)
    };

    if assets.exists(&site_path) {
        Some(site_path)
    } else {
        tracing::debug!("Thumbnail image not found: {}", site_path);
        None
    }
}
