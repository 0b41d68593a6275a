//! Playback Events
//!
//! Event-based communication for UI synchronization. Events are queued by the
//! orchestrator and drained by whoever drives it.

use crate::types::PlaybackState;
use radio_core::{NoticeLevel, RadioError, Track, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed
    StateChanged { state: PlaybackState },

    /// A new track became current (emitted when its load starts)
    TrackChanged { track: Track },

    /// Periodic position sample while playing
    PositionUpdate { position_ms: u64, duration_ms: u64 },

    /// Next track is decoded and ready
    NextTrackPrepared { track_id: TrackId },

    /// Volume changed
    VolumeChanged { level: u8 },

    /// Something the listener should be told about
    Notice(Notice),
}

/// What a notice is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    NotConfigured,
    Unreachable,
    ServerError,
    InvalidCatalog,
    NoResults,
    NoSongs,
    NoPlayableSongs,
    NoPrevious,
    TrackLoadFailed,
    Restored,
    RotationReset,
    Failure,
}

/// User-facing notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            level,
            kind,
            message: message.into(),
        }
    }

    /// Notice for a catalog or playback failure, with its user-safe message
    pub fn from_error(error: &RadioError) -> Self {
        let kind = match error {
            RadioError::Config(_) => NoticeKind::NotConfigured,
            RadioError::Unreachable(_) => NoticeKind::Unreachable,
            RadioError::Server { .. } => NoticeKind::ServerError,
            RadioError::Format(_) => NoticeKind::InvalidCatalog,
            RadioError::EmptyResult => NoticeKind::NoResults,
            RadioError::TrackLoad { .. } => NoticeKind::TrackLoadFailed,
            RadioError::Restoration(_) | RadioError::Storage(_) | RadioError::Internal(_) => {
                NoticeKind::Failure
            }
        };
        Self::new(error.notice_level(), kind, error.user_message())
    }

    pub fn no_songs() -> Self {
        Self::new(
            NoticeLevel::Info,
            NoticeKind::NoSongs,
            "No songs available. Select a language to start listening.",
        )
    }

    pub fn no_playable_songs() -> Self {
        Self::new(
            NoticeLevel::Error,
            NoticeKind::NoPlayableSongs,
            "None of the songs for this selection could be played.",
        )
    }

    pub fn no_previous() -> Self {
        Self::new(NoticeLevel::Info, NoticeKind::NoPrevious, "No previous track.")
    }

    pub fn track_load_failed(track: &Track) -> Self {
        Self::new(
            NoticeLevel::Warning,
            NoticeKind::TrackLoadFailed,
            format!("Could not load \"{}\", trying the next song.", track.title),
        )
    }

    pub fn restored(track: &Track) -> Self {
        Self::new(
            NoticeLevel::Info,
            NoticeKind::Restored,
            format!("Restored \"{}\" from your last session.", track.title),
        )
    }

    pub fn rotation_reset() -> Self {
        Self::new(
            NoticeLevel::Info,
            NoticeKind::RotationReset,
            "Starting the rotation over.",
        )
    }
}
