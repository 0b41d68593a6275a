//! Radio Player - Playback Orchestration
//!
//! Platform-agnostic playback orchestration for the radio player.
//!
//! This crate provides:
//! - No-repeat random rotation over the catalog, with bounded history
//! - A single-owner state machine over engine handles (load, play, pause, seek)
//! - Preloading of the next track for gapless advance
//! - Load-failure recovery (alternate source, eviction, retry, give-up)
//! - Logarithmic volume (0-100)
//! - Session snapshots for resume-on-reload
//!
//! # Architecture
//!
//! `radio-playback` knows nothing about audio decoding or storage:
//! - Audio output is an [`AudioEngine`] that creates [`EngineHandle`]s
//! - The catalog and session store come in through `radio-core` traits
//! - [`Orchestrator`] is synchronous and takes an explicit `now`
//! - [`PlayerRuntime`] drives it on tokio and publishes state
//!
//! # Example: Driving the orchestrator
//!
//! ```rust
//! use radio_core::Track;
//! use radio_playback::{
//!     AudioEngine, EngineHandle, HandleId, Orchestrator, PlaybackConfig, PlaybackState, Result,
//! };
//! use std::time::{Duration, Instant};
//!
//! struct SilentHandle;
//!
//! impl EngineHandle for SilentHandle {
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) -> Result<()> { Ok(()) }
//!     fn seek(&mut self, _position: Duration) -> Result<()> { Ok(()) }
//!     fn set_volume(&mut self, _gain: f32) {}
//!     fn position(&self) -> Duration { Duration::ZERO }
//!     fn release(&mut self) {}
//! }
//!
//! struct SilentEngine;
//!
//! impl AudioEngine for SilentEngine {
//!     type Handle = SilentHandle;
//!
//!     fn load(&mut self, _id: HandleId, _url: &str, _gain: f32) -> Result<SilentHandle> {
//!         Ok(SilentHandle)
//!     }
//! }
//!
//! let mut player = Orchestrator::new(PlaybackConfig::default(), SilentEngine);
//! let now = Instant::now();
//!
//! player.set_catalog(
//!     vec![Track::new("English", "Morning Light", "https://music.example.com/a.mp3")],
//!     vec!["English".to_string()],
//!     now,
//! );
//! player.start(now);
//!
//! // Waiting for the engine to report the handle ready
//! assert_eq!(player.state(), PlaybackState::Loading);
//! ```

mod engine;
mod error;
mod events;
mod handle;
mod history;
mod orchestrator;
mod runtime;
mod timers;
mod tracker;
pub mod types;
mod volume;

// Public exports
pub use engine::{AudioEngine, EngineEvent, EngineEventKind, EngineHandle, HandleId};
pub use error::{PlaybackError, Result};
pub use events::{Notice, NoticeKind, PlaybackEvent};
pub use history::History;
pub use orchestrator::{Input, Orchestrator};
pub use runtime::{EngineEventSink, PlayerHandle, PlayerRuntime, RuntimeCommand};
pub use tracker::Tracker;
pub use types::{NowPlaying, PlaybackConfig, PlaybackState, PreloadState};
pub use volume::Volume;
