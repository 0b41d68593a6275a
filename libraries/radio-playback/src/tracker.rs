//! No-repeat rotation over the catalog
//!
//! Tracks which songs are still available this cycle, which have played, and
//! a bounded history for "previous". Selection is uniformly random.

use crate::history::History;
use radio_core::{Track, TrackId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::mem;
use tracing::debug;

/// Playlist/history tracker
///
/// Invariants kept by every method:
/// - `available ∩ played = ∅`
/// - `failed ⊆ played`
/// - the history never contains the current track
#[derive(Debug, Clone)]
pub struct Tracker {
    catalog: Vec<Track>,
    played: HashSet<TrackId>,
    available: HashSet<TrackId>,
    /// Tracks evicted after a load failure during this cycle
    failed: HashSet<TrackId>,
    current: Option<Track>,
    history: History,
    rng: StdRng,
}

impl Tracker {
    /// Create a tracker seeded from entropy
    pub fn new(history_size: usize) -> Self {
        Self::with_rng(history_size, StdRng::from_entropy())
    }

    /// Create a tracker with a fixed seed (reproducible picks)
    pub fn with_seed(history_size: usize, seed: u64) -> Self {
        Self::with_rng(history_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(history_size: usize, rng: StdRng) -> Self {
        Self {
            catalog: Vec::new(),
            played: HashSet::new(),
            available: HashSet::new(),
            failed: HashSet::new(),
            current: None,
            history: History::new(history_size),
            rng,
        }
    }

    /// Replace the catalog
    ///
    /// Played ids are kept, so re-selecting a language later does not repeat
    /// songs from the same cycle.
    pub fn set_catalog(&mut self, tracks: Vec<Track>) {
        let mut seen = HashSet::new();
        self.catalog = tracks
            .into_iter()
            .filter(|track| seen.insert(track.id.clone()))
            .collect();
        self.rebuild_available();
    }

    /// Replace the played set (session restore)
    pub fn restore_played(&mut self, ids: impl IntoIterator<Item = TrackId>) {
        self.played = ids.into_iter().collect();
        self.played.extend(self.failed.iter().cloned());
        if let Some(current) = &self.current {
            self.played.insert(current.id.clone());
        }
        self.rebuild_available();
    }

    /// Choose the next track
    ///
    /// 1. random unplayed catalog track other than the current one
    /// 2. start a new cycle and retry 1
    ///
    /// Tracks re-queued by [`pop_history`](Self::pop_history) leave the
    /// played set, so the first rule already draws from them.
    ///
    /// Tracks that failed during the ending cycle sit out the new one, unless
    /// nothing else is left. Returns `None` only for an empty catalog. When
    /// the current track is the only one left it is returned again.
    pub fn pick_next(&mut self) -> Option<Track> {
        if self.catalog.is_empty() {
            return None;
        }

        if let Some(track) = self.pick_unplayed() {
            return Some(track);
        }

        debug!(
            catalog = self.catalog.len(),
            held_out = self.failed.len(),
            "Rotation exhausted, starting new cycle"
        );
        self.start_cycle(true);
        if let Some(track) = self.pick_unplayed() {
            return Some(track);
        }

        self.start_cycle(false);
        self.pick_unplayed().or_else(|| {
            self.current
                .as_ref()
                .filter(|current| self.contains(&current.id))
                .cloned()
        })
    }

    fn pick_unplayed(&mut self) -> Option<Track> {
        let current = self.current.as_ref().map(|t| &t.id);
        let candidates: Vec<&Track> = self
            .catalog
            .iter()
            .filter(|t| !self.played.contains(&t.id) && Some(&t.id) != current)
            .collect();
        candidates.choose(&mut self.rng).map(|t| (*t).clone())
    }

    /// Record `track` as now playing
    ///
    /// The previous current track (if different) goes onto the history.
    pub fn mark_playing(&mut self, track: &Track) {
        self.played.insert(track.id.clone());
        self.available.remove(&track.id);
        self.history.remove(&track.id);

        if let Some(previous) = self.current.replace(track.clone()) {
            if previous.id != track.id {
                self.history.push(previous);
            }
        }
    }

    /// Step back to the most recent history entry
    ///
    /// The track that was playing is re-admitted to the rotation.
    pub fn pop_history(&mut self) -> Option<Track> {
        let track = self.history.pop()?;

        if let Some(previous) = self.current.take() {
            self.played.remove(&previous.id);
            self.failed.remove(&previous.id);
            if self.contains(&previous.id) {
                self.available.insert(previous.id);
            }
        }

        self.played.insert(track.id.clone());
        self.available.remove(&track.id);
        self.failed.remove(&track.id);
        self.current = Some(track.clone());
        Some(track)
    }

    /// Take a track that failed out of this cycle and the next one
    ///
    /// If it is the current track the current slot is cleared without
    /// touching the history.
    pub fn evict(&mut self, id: &TrackId) {
        self.played.insert(id.clone());
        self.available.remove(id);
        self.failed.insert(id.clone());
        if self.current.as_ref().is_some_and(|t| &t.id == id) {
            self.current = None;
        }
    }

    /// Start the rotation over, giving failed tracks another chance
    pub fn reset(&mut self) {
        self.start_cycle(false);
    }

    /// New cycle; `hold_failed` keeps this cycle's failures out of it
    fn start_cycle(&mut self, hold_failed: bool) {
        let held = mem::take(&mut self.failed);
        self.played = if hold_failed { held } else { HashSet::new() };
        if let Some(current) = &self.current {
            self.played.insert(current.id.clone());
        }
        self.rebuild_available();
    }

    fn rebuild_available(&mut self) {
        let current = self.current.as_ref().map(|t| &t.id);
        self.available = self
            .catalog
            .iter()
            .filter(|t| !self.played.contains(&t.id) && Some(&t.id) != current)
            .map(|t| t.id.clone())
            .collect();
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.catalog.iter().any(|t| &t.id == id)
    }

    pub fn find(&self, id: &TrackId) -> Option<&Track> {
        self.catalog.iter().find(|t| &t.id == id)
    }

    /// Played ids, sorted
    pub fn played_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = self.played.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Ids that failed this cycle, sorted
    pub fn failed_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = self.failed.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Available ids, sorted
    pub fn available_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = self.available.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn has_previous(&self) -> bool {
        !self.history.is_empty()
    }
}
