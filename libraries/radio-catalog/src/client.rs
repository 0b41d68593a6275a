//! HTTP client for the music server manifest.

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::manifest::{LanguageEntries, RemoteManifest};
use crate::urls::{audio_url, manifest_url, parse_base_url};
use async_trait::async_trait;
use radio_core::{CatalogSource, LanguageOption, RadioError, Track};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// Client for the static music server.
///
/// The manifest is fetched fresh on every call; it is small and changes
/// rarely, so there is no cache.
///
/// A missing or malformed base URL does not fail construction. Every call
/// reports it as [`CatalogError::NotConfigured`] instead, so the player can
/// still start and tell the listener what is wrong.
pub struct CatalogClient {
    http: Client,
    base_url: std::result::Result<Url, String>,
    audio_extension: String,
}

impl CatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let base_url = match config.base_url.as_deref() {
            None => Err("set RADIO_MUSIC_SERVER_URL to the music server base URL".to_string()),
            Some(raw) => parse_base_url(raw).map_err(|e| e.to_string()),
        };

        if let Err(reason) = &base_url {
            warn!(reason = %reason, "Music server URL not configured");
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("RadioPlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            audio_extension: config.audio_extension,
        })
    }

    /// The configured base URL, if usable.
    pub fn base_url(&self) -> Result<&Url> {
        self.base_url
            .as_ref()
            .map_err(|reason| CatalogError::NotConfigured(reason.clone()))
    }

    /// Check that the music server answers at all.
    ///
    /// Any HTTP response counts as reachable; only transport failures fail.
    pub async fn check_reachable(&self) -> Result<()> {
        let url = manifest_url(self.base_url()?)?;
        debug!(url = %url, "Checking music server");

        self.http
            .head(url.as_str())
            .send()
            .await
            .map_err(|e| CatalogError::Unreachable(e.to_string()))?;

        Ok(())
    }

    async fn fetch_manifest(&self) -> Result<RemoteManifest> {
        let url = manifest_url(self.base_url()?)?;
        debug!(url = %url, "Fetching manifest");

        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| CatalogError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = response.json().await.map_err(|e| {
            CatalogError::InvalidManifest(format!("manifest is not valid JSON: {e}"))
        })?;

        RemoteManifest::parse(value)
    }

    /// List every language in the manifest.
    pub async fn list_languages(&self) -> Result<Vec<LanguageOption>> {
        self.check_reachable().await?;
        let manifest = self.fetch_manifest().await?;

        let languages: Vec<LanguageOption> = manifest
            .language_keys()
            .map(|key| LanguageOption::from_manifest_key(key.as_str()))
            .collect();

        info!(count = languages.len(), "Fetched languages");
        Ok(languages)
    }

    /// Expand a language selection into playable tracks.
    ///
    /// Languages missing from the manifest, or whose song list is malformed,
    /// are skipped with a warning. An empty selection returns immediately
    /// without a request.
    pub async fn list_tracks(&self, languages: &[String]) -> Result<Vec<Track>> {
        if languages.is_empty() {
            return Ok(Vec::new());
        }

        let base = self.base_url()?.clone();
        let manifest = self.fetch_manifest().await?;

        let mut seen_languages = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut tracks = Vec::new();

        for language in languages {
            if !seen_languages.insert(language.as_str()) {
                continue;
            }

            let entries = match manifest.entries(language) {
                LanguageEntries::Entries(entries) => entries,
                LanguageEntries::Missing => {
                    warn!(language = %language, "Language not in manifest, skipping");
                    continue;
                }
                LanguageEntries::Malformed(reason) => {
                    warn!(language = %language, reason = %reason, "Malformed song list, skipping");
                    continue;
                }
            };

            for entry in entries {
                let title = entry.title();
                if title.is_empty() {
                    continue;
                }

                let url = audio_url(&base, language, title, entry.extension(&self.audio_extension))?;
                let mut track = Track::new(language.as_str(), title, url.as_str());
                if let Some(fallback) = entry.fallback() {
                    track = track.with_alternate_url(audio_url(&base, language, title, fallback)?);
                }

                if seen_ids.insert(track.id.clone()) {
                    tracks.push(track);
                }
            }
        }

        if tracks.is_empty() {
            return Err(CatalogError::NoTracks(languages.to_vec()));
        }

        info!(
            tracks = tracks.len(),
            languages = seen_languages.len(),
            "Resolved catalog"
        );
        Ok(tracks)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn list_languages(&self) -> radio_core::Result<Vec<LanguageOption>> {
        CatalogClient::list_languages(self)
            .await
            .map_err(RadioError::from)
    }

    async fn list_tracks(&self, languages: &[String]) -> radio_core::Result<Vec<Track>> {
        CatalogClient::list_tracks(self, languages)
            .await
            .map_err(RadioError::from)
    }
}
