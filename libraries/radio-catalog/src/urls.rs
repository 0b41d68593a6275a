//! URL construction for the music server layout.

use crate::error::{CatalogError, Result};
use url::Url;

/// Parse and check a base URL.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::NotConfigured("URL cannot be empty".into()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| CatalogError::NotConfigured(format!("invalid URL {trimmed:?}: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CatalogError::NotConfigured(
            "URL must start with http:// or https://".into(),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(CatalogError::NotConfigured(format!(
            "URL {trimmed:?} cannot be used as a base"
        )));
    }

    Ok(url)
}

fn with_segments<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| CatalogError::NotConfigured(format!("{base} cannot be used as a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `{base}/manifest.json`
pub fn manifest_url(base: &Url) -> Result<Url> {
    with_segments(base, ["manifest.json"])
}

/// `{base}/audio/{language}/{title}.{extension}`, each segment percent-encoded.
pub fn audio_url(base: &Url, language: &str, title: &str, extension: &str) -> Result<Url> {
    let file_name = format!("{title}.{extension}");
    with_segments(base, ["audio", language, file_name.as_str()])
}
