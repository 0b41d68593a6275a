//! Core types for playback orchestration

use radio_core::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No engine handle
    Idle,

    /// Handle created, waiting for ready or failure (also covers the retry
    /// delay after a failed load)
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Shadow state of the next-track slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadState {
    /// Nothing preloaded
    Empty,

    /// Next track is loading
    Pending,

    /// Next track is decoded and can start immediately
    Ready,

    /// Last preload failed; a retry is scheduled
    Failed,
}

/// State published to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub current_track: Option<Track>,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub current_time: Duration,
    pub duration: Option<Duration>,
    /// Volume level (0-100)
    pub volume: u8,
    pub has_previous: bool,
    pub preload: PreloadState,
}

/// Configuration for the playback orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Maximum history size (default: 10)
    pub history_size: usize,

    /// Cooldown after a play/pause toggle (default: 500ms)
    pub toggle_debounce: Duration,

    /// Position polling cadence while playing (default: 1s)
    pub position_poll_interval: Duration,

    /// Delay between a track starting and preloading the next (default: 750ms)
    pub preload_delay: Duration,

    /// Delay before retrying a failed preload (default: 1s)
    pub preload_retry_delay: Duration,

    /// Delay before picking another track after a load failure (default: 300ms)
    pub load_retry_delay: Duration,

    /// How often the playback position is persisted while playing (default: 5s)
    pub position_persist_interval: Duration,

    /// Initial volume (0-100, default: 80)
    pub volume: u8,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: 10,
            toggle_debounce: Duration::from_millis(500),
            position_poll_interval: Duration::from_secs(1),
            preload_delay: Duration::from_millis(750),
            preload_retry_delay: Duration::from_secs(1),
            load_retry_delay: Duration::from_millis(300),
            position_persist_interval: Duration::from_secs(5),
            volume: 80,
        }
    }
}
