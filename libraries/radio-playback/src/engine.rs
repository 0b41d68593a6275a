//! Platform-agnostic audio engine contract
//!
//! Abstracts network-streamed audio decoding for different hosts (browser
//! audio elements, native decoders, test doubles).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identity of one engine handle
///
/// Allocated by the orchestrator and never reused, so events can be matched
/// to the handle that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle events an engine reports for a handle
///
/// Per handle they arrive in the order
/// load → (ready | load failed) → started ⇄ paused → ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEventKind {
    /// Metadata decoded, duration known
    Ready { duration: Duration },

    /// Terminal for the handle
    LoadFailed { reason: String },

    /// Audio became audible
    Started,

    /// Audio stopped without ending (user or host pause)
    Paused,

    /// Reached the end of the track
    Ended,
}

/// An engine event tagged with its handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub handle: HandleId,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn new(handle: HandleId, kind: EngineEventKind) -> Self {
        Self { handle, kind }
    }
}

/// Audio engine that creates per-track handles
///
/// `load` only starts loading; the outcome is reported later as
/// [`EngineEventKind::Ready`] or [`EngineEventKind::LoadFailed`] for `id`.
/// An `Err` from `load` is treated exactly like a load failure.
pub trait AudioEngine: Send {
    /// Handle type produced by this engine
    type Handle: EngineHandle;

    /// Begin loading `url` at the given linear gain
    fn load(&mut self, id: HandleId, url: &str, gain: f32) -> Result<Self::Handle>;
}

/// One live, decodable audio resource
///
/// Implementors hold no retry logic; all recovery belongs to the
/// orchestrator.
pub trait EngineHandle: Send {
    /// Start or resume output
    fn play(&mut self) -> Result<()>;

    /// Pause output, keeping the position
    fn pause(&mut self) -> Result<()>;

    /// Seek to a position from the start of the track
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Set linear gain (0.0 - 1.0)
    fn set_volume(&mut self, gain: f32);

    /// Current playback position
    fn position(&self) -> Duration;

    /// Stop, detach listeners and free the resource
    ///
    /// Must be idempotent and safe on a handle that never finished loading.
    fn release(&mut self);
}
