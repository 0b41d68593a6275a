//! Error types for the catalog client.

use radio_core::RadioError;
use thiserror::Error;

/// Errors that can occur while talking to the music server.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No usable base URL was configured
    #[error("Music server URL not configured: {0}")]
    NotConfigured(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// Server returned a non-success status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Manifest is not shaped like `{"languages": {...}}`
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// The selection resolved to zero tracks
    #[error("No tracks for languages: {0:?}")]
    NoTracks(Vec<String>),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// IO error while generating or reading a manifest file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<CatalogError> for RadioError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotConfigured(msg) => RadioError::Config(msg),
            CatalogError::Unreachable(msg) => RadioError::Unreachable(msg),
            CatalogError::ServerError { status, message } => {
                RadioError::Server { status, message }
            }
            CatalogError::InvalidManifest(msg) => RadioError::Format(msg),
            CatalogError::Json(e) => RadioError::Format(e.to_string()),
            CatalogError::NoTracks(_) => RadioError::EmptyResult,
            CatalogError::Client(e) => RadioError::Internal(e.to_string()),
            CatalogError::Io(e) => RadioError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_core_taxonomy() {
        assert!(matches!(
            RadioError::from(CatalogError::NotConfigured("unset".into())),
            RadioError::Config(_)
        ));
        assert!(matches!(
            RadioError::from(CatalogError::ServerError {
                status: 404,
                message: "gone".into()
            }),
            RadioError::Server { status: 404, .. }
        ));
        assert!(matches!(
            RadioError::from(CatalogError::NoTracks(vec!["English".into()])),
            RadioError::EmptyResult
        ));
        assert!(matches!(
            RadioError::from(CatalogError::InvalidManifest("no languages".into())),
            RadioError::Format(_)
        ));
    }
}
