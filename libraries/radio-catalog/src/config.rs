//! Catalog client configuration.

use std::time::Duration;

/// Environment variable holding the music server base URL.
pub const MUSIC_SERVER_URL_ENV: &str = "RADIO_MUSIC_SERVER_URL";

/// Configuration for reaching the music server.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the music server (e.g. "https://music.example.com")
    pub base_url: Option<String>,
    /// Extension used when a manifest entry does not name one
    pub audio_extension: String,
    /// Total request timeout
    pub request_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl CatalogConfig {
    /// Create a config pointing at a base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Create a config with no base URL; every call fails as not configured.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Read the base URL from `RADIO_MUSIC_SERVER_URL`.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(MUSIC_SERVER_URL_ENV)
                .ok()
                .filter(|url| !url.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Override the default audio extension.
    #[must_use]
    pub fn with_audio_extension(mut self, extension: impl Into<String>) -> Self {
        self.audio_extension = extension.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            audio_extension: "mp3".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unconfigured_mp3() {
        let config = CatalogConfig::default();
        assert!(config.base_url.is_none());
        assert_eq!(config.audio_extension, "mp3");
    }

    #[test]
    fn builder_overrides() {
        let config = CatalogConfig::new("https://music.example.com")
            .with_audio_extension("ogg")
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url.as_deref(), Some("https://music.example.com"));
        assert_eq!(config.audio_extension, "ogg");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
