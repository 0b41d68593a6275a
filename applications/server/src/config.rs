/// Server configuration
use crate::error::{Result, ServerError};
use radio_catalog::CatalogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    /// Music server base URL; falls back to `RADIO_MUSIC_SERVER_URL`
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// Reads `path` (or `config.toml` when present), then environment
    /// variables such as `RADIO_SERVER__PORT` or `RADIO_CATALOG__BASE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from("config.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("RADIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServerError::Config(
                "server port must be non-zero (set RADIO_SERVER__PORT)".to_string(),
            ));
        }

        if self.catalog.audio_extension.trim().is_empty() {
            return Err(ServerError::Config(
                "catalog audio extension must not be empty".to_string(),
            ));
        }

        if self.catalog.timeout_secs == 0 {
            return Err(ServerError::Config(
                "catalog timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    /// Catalog client settings; an unset base URL defers to the environment
    pub fn catalog_config(&self) -> CatalogConfig {
        let base = match self.catalog.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => CatalogConfig::new(url),
            _ => CatalogConfig::from_env(),
        };

        base.with_audio_extension(self.catalog.audio_extension.clone())
            .with_request_timeout(Duration::from_secs(self.catalog.timeout_secs))
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        base_url: None,
        audio_extension: default_audio_extension(),
        timeout_secs: default_timeout_secs(),
    }
}

fn default_audio_extension() -> String {
    "mp3".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            catalog: default_catalog(),
        }
    }
}
