/// Core error types for the radio player
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `RadioError`
pub type Result<T> = std::result::Result<T, RadioError>;

/// How a failure should be presented to the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Neutral notice (e.g. nothing to play for this selection)
    Info,
    /// Short-lived, recoverable condition
    Warning,
    /// Persistent condition that blocks playback
    Error,
}

/// Core error type for the radio player
#[derive(Error, Debug)]
pub enum RadioError {
    /// Music server base URL is missing or malformed
    #[error("Music server is not configured: {0}")]
    Config(String),

    /// Music server could not be reached at all
    #[error("Music server unreachable: {0}")]
    Unreachable(String),

    /// Music server answered with a non-success status
    #[error("Music server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Manifest does not have the expected shape
    #[error("Invalid manifest: {0}")]
    Format(String),

    /// No tracks exist for the requested language selection
    #[error("No songs found for the selected languages")]
    EmptyResult,

    /// A single track failed to load or play
    #[error("Could not load track {track_id}: {reason}")]
    TrackLoad { track_id: TrackId, reason: String },

    /// Persisted session was corrupt or stale
    #[error("Could not restore session: {0}")]
    Restoration(String),

    /// Durable storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl RadioError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a track load error
    pub fn track_load(track_id: TrackId, reason: impl Into<String>) -> Self {
        Self::TrackLoad {
            track_id,
            reason: reason.into(),
        }
    }

    /// Message that is safe to show to a listener.
    ///
    /// Never contains raw protocol details; those stay in the `Display` output
    /// for logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => {
                "Music server is not configured. Set the music server URL and reload.".to_string()
            }
            Self::Unreachable(_) => {
                "Cannot reach the music server. Check your connection and try again.".to_string()
            }
            Self::Server { status, .. } => {
                format!("The music server returned an error ({status}). Please try again later.")
            }
            Self::Format(_) => "The music server's song list is invalid.".to_string(),
            Self::EmptyResult => "No songs available for the selected languages.".to_string(),
            Self::TrackLoad { .. } => "Could not load this song, trying the next one.".to_string(),
            Self::Restoration(_) => "Previous session could not be restored.".to_string(),
            Self::Storage(_) | Self::Internal(_) => "Something went wrong.".to_string(),
        }
    }

    /// Presentation level for this error
    pub fn notice_level(&self) -> NoticeLevel {
        match self {
            Self::EmptyResult | Self::Restoration(_) => NoticeLevel::Info,
            Self::TrackLoad { .. } | Self::Unreachable(_) | Self::Server { .. } => {
                NoticeLevel::Warning
            }
            Self::Config(_) | Self::Format(_) | Self::Storage(_) | Self::Internal(_) => {
                NoticeLevel::Error
            }
        }
    }

    /// Whether a manual retry (e.g. reselecting languages) may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Server { .. })
    }
}

impl From<serde_json::Error> for RadioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_hide_protocol_details() {
        let err = RadioError::Server {
            status: 500,
            message: "<html>stack trace</html>".to_string(),
        };
        assert!(!err.user_message().contains("stack trace"));
        assert!(err.to_string().contains("stack trace"));
    }

    #[test]
    fn notice_levels_follow_taxonomy() {
        assert_eq!(RadioError::EmptyResult.notice_level(), NoticeLevel::Info);
        assert_eq!(
            RadioError::config("missing").notice_level(),
            NoticeLevel::Error
        );
        assert_eq!(
            RadioError::Unreachable("timeout".into()).notice_level(),
            NoticeLevel::Warning
        );
        assert_eq!(
            RadioError::track_load(TrackId::new("English/a"), "404").notice_level(),
            NoticeLevel::Warning
        );
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(RadioError::Unreachable("refused".into()).is_retryable());
        assert!(RadioError::Server {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!RadioError::format("no languages").is_retryable());
        assert!(!RadioError::config("unset").is_retryable());
        assert!(!RadioError::EmptyResult.is_retryable());
    }
}
