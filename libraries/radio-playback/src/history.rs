//! Playback history tracking
//!
//! Maintains a bounded history of played tracks for "previous" navigation

use radio_core::{Track, TrackId};
use std::collections::VecDeque;

/// Playback history with bounded size
///
/// Most recent entry at the back; the oldest entry is discarded when full.
/// A track appears at most once.
#[derive(Debug, Clone)]
pub struct History {
    tracks: VecDeque<Track>,
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Add track to history
    ///
    /// An earlier entry for the same track is dropped first; if history is
    /// full the oldest track is discarded.
    pub fn push(&mut self, track: Track) {
        if self.max_size == 0 {
            return;
        }
        self.remove(&track.id);
        if self.tracks.len() >= self.max_size {
            self.tracks.pop_front();
        }
        self.tracks.push_back(track);
    }

    /// Pop most recent track
    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop_back()
    }

    /// Drop any entry for `id`
    pub fn remove(&mut self, id: &TrackId) {
        self.tracks.retain(|track| &track.id != id);
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.tracks.iter().any(|track| &track.id == id)
    }

    /// Tracks, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(10)
    }
}
