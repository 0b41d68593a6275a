//! Error types for playback orchestration

use radio_core::RadioError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The audio engine could not create or drive a handle
    #[error("Audio engine error: {0}")]
    Engine(String),

    /// The player runtime has shut down
    #[error("Player runtime is not running")]
    RuntimeClosed,
}

impl PlaybackError {
    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

impl From<PlaybackError> for RadioError {
    fn from(err: PlaybackError) -> Self {
        RadioError::Internal(err.to_string())
    }
}
