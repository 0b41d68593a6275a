//! Playback orchestrator - core state machine
//!
//! Owns the current and preloaded engine handles, drives them through
//! `Idle → Loading → Playing ⇄ Paused`, and recovers from load failures.
//! Every transition goes through [`Orchestrator::dispatch`] with an explicit
//! `now`; timers are deadlines the driver fires by dispatching
//! [`Input::Tick`] once [`Orchestrator::next_deadline`] has passed.

use crate::{
    engine::{AudioEngine, EngineEvent, EngineEventKind, EngineHandle, HandleId},
    events::{Notice, PlaybackEvent},
    handle::LiveHandle,
    timers::{TimerKind, Timers},
    tracker::Tracker,
    types::{NowPlaying, PlaybackConfig, PlaybackState, PreloadState},
    volume::Volume,
};
use radio_core::{
    PlaybackSnapshot, RadioError, SessionPersistence, SessionSnapshot, Track, TrackId,
};
use std::collections::HashSet;
use std::mem;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Everything that can drive a transition
#[derive(Debug)]
pub enum Input {
    /// Start playing from `Idle`
    Start,
    /// Play/pause (debounced)
    Toggle,
    /// Advance to the next track
    Skip,
    /// Go back to the most recent history entry
    Previous,
    /// Start the no-repeat rotation over
    ResetRotation,
    /// Seek within the current track
    Seek(Duration),
    /// Set volume (0-100)
    SetVolume(u8),
    /// Replace the catalog after a language selection
    SetCatalog {
        tracks: Vec<Track>,
        languages: Vec<String>,
    },
    /// Catalog fetch for the selection failed
    CatalogFailed(RadioError),
    /// Restore a persisted session (cold boot)
    Restore(SessionSnapshot),
    /// Lifecycle event from the engine
    Engine(EngineEvent),
    /// Fire timers that are due
    Tick,
}

/// Why the current handle is loading
#[derive(Debug, Clone, Copy, PartialEq)]
enum LoadIntent {
    /// Play as soon as it is ready
    Play,
    /// Seek to `position`, then play only if `resume`
    Restore { position: Duration, resume: bool },
}

/// Main slot. Handles live inside the state that needs them, so `Idle`
/// cannot hold one.
enum Slot<H: EngineHandle> {
    Idle,
    /// Waiting out the delay after a failed load
    Retrying,
    Loading {
        handle: LiveHandle<H>,
        intent: LoadIntent,
    },
    Playing(LiveHandle<H>),
    Paused(LiveHandle<H>),
}

impl<H: EngineHandle> Slot<H> {
    fn handle(&self) -> Option<&LiveHandle<H>> {
        match self {
            Slot::Loading { handle, .. } | Slot::Playing(handle) | Slot::Paused(handle) => {
                Some(handle)
            }
            Slot::Idle | Slot::Retrying => None,
        }
    }

    fn handle_mut(&mut self) -> Option<&mut LiveHandle<H>> {
        match self {
            Slot::Loading { handle, .. } | Slot::Playing(handle) | Slot::Paused(handle) => {
                Some(handle)
            }
            Slot::Idle | Slot::Retrying => None,
        }
    }

    fn handle_id(&self) -> Option<HandleId> {
        self.handle().map(LiveHandle::id)
    }

    fn state(&self) -> PlaybackState {
        match self {
            Slot::Idle => PlaybackState::Idle,
            Slot::Retrying | Slot::Loading { .. } => PlaybackState::Loading,
            Slot::Playing(_) => PlaybackState::Playing,
            Slot::Paused(_) => PlaybackState::Paused,
        }
    }
}

/// Next-track slot
enum Preload<H: EngineHandle> {
    Empty,
    Pending(LiveHandle<H>),
    Ready(LiveHandle<H>),
    Failed,
}

impl<H: EngineHandle> Preload<H> {
    fn handle(&self) -> Option<&LiveHandle<H>> {
        match self {
            Preload::Pending(handle) | Preload::Ready(handle) => Some(handle),
            Preload::Empty | Preload::Failed => None,
        }
    }

    fn handle_mut(&mut self) -> Option<&mut LiveHandle<H>> {
        match self {
            Preload::Pending(handle) | Preload::Ready(handle) => Some(handle),
            Preload::Empty | Preload::Failed => None,
        }
    }

    fn state(&self) -> PreloadState {
        match self {
            Preload::Empty => PreloadState::Empty,
            Preload::Pending(_) => PreloadState::Pending,
            Preload::Ready(_) => PreloadState::Ready,
            Preload::Failed => PreloadState::Failed,
        }
    }
}

/// Playback orchestrator
///
/// Single owner of the engine handles and the tracker. One task drives it;
/// there is no internal locking.
pub struct Orchestrator<E: AudioEngine> {
    config: PlaybackConfig,
    engine: E,
    tracker: Tracker,
    volume: Volume,
    slot: Slot<E::Handle>,
    preload: Preload<E::Handle>,
    timers: Timers,
    next_handle: u64,
    last_toggle: Option<Instant>,
    /// Distinct tracks that failed since the last one became ready
    failing: HashSet<TrackId>,
    selected_languages: Vec<String>,
    persistence: Option<Box<dyn SessionPersistence>>,
    last_position_persist: Option<Instant>,
    pending_events: Vec<PlaybackEvent>,
}

impl<E: AudioEngine> Orchestrator<E> {
    /// Create a new orchestrator around an engine
    pub fn new(config: PlaybackConfig, engine: E) -> Self {
        Self {
            tracker: Tracker::new(config.history_size),
            volume: Volume::new(config.volume),
            config,
            engine,
            slot: Slot::Idle,
            preload: Preload::Empty,
            timers: Timers::default(),
            next_handle: 0,
            last_toggle: None,
            failing: HashSet::new(),
            selected_languages: Vec::new(),
            persistence: None,
            last_position_persist: None,
            pending_events: Vec::new(),
        }
    }

    /// Use a specific tracker (e.g. a seeded one)
    #[must_use]
    pub fn with_tracker(mut self, tracker: Tracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Mirror session state through `persistence`
    #[must_use]
    pub fn with_persistence(mut self, persistence: Box<dyn SessionPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Read the persisted session, falling back to defaults
    ///
    /// A corrupt or unreadable store is discarded silently.
    pub fn load_session(&self) -> SessionSnapshot {
        let Some(persistence) = &self.persistence else {
            return SessionSnapshot::default();
        };
        match persistence.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(error = %e, "Discarding unreadable session");
                SessionSnapshot::default()
            }
        }
    }

    // ===== Transitions =====

    /// Apply one input
    pub fn dispatch(&mut self, input: Input, now: Instant) {
        match input {
            Input::Start => self.on_start(now),
            Input::Toggle => self.on_toggle(now),
            Input::Skip => self.on_skip(now),
            Input::Previous => self.on_previous(now),
            Input::ResetRotation => self.on_reset_rotation(now),
            Input::Seek(position) => self.on_seek(position, now),
            Input::SetVolume(level) => self.on_set_volume(level, now),
            Input::SetCatalog { tracks, languages } => self.on_set_catalog(tracks, languages, now),
            Input::CatalogFailed(error) => self.on_catalog_failed(&error),
            Input::Restore(snapshot) => self.on_restore(&snapshot, now),
            Input::Engine(event) => self.on_engine_event(event, now),
            Input::Tick => self.on_tick(now),
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.dispatch(Input::Start, now);
    }

    pub fn toggle(&mut self, now: Instant) {
        self.dispatch(Input::Toggle, now);
    }

    pub fn skip(&mut self, now: Instant) {
        self.dispatch(Input::Skip, now);
    }

    pub fn previous(&mut self, now: Instant) {
        self.dispatch(Input::Previous, now);
    }

    pub fn reset_rotation(&mut self, now: Instant) {
        self.dispatch(Input::ResetRotation, now);
    }

    pub fn seek(&mut self, position: Duration, now: Instant) {
        self.dispatch(Input::Seek(position), now);
    }

    pub fn set_volume(&mut self, level: u8, now: Instant) {
        self.dispatch(Input::SetVolume(level), now);
    }

    pub fn set_catalog(&mut self, tracks: Vec<Track>, languages: Vec<String>, now: Instant) {
        self.dispatch(Input::SetCatalog { tracks, languages }, now);
    }

    pub fn restore(&mut self, snapshot: SessionSnapshot, now: Instant) {
        self.dispatch(Input::Restore(snapshot), now);
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent, now: Instant) {
        self.dispatch(Input::Engine(event), now);
    }

    pub fn fire_due_timers(&mut self, now: Instant) {
        self.dispatch(Input::Tick, now);
    }

    /// Persist the final state and release every handle
    pub fn shutdown(&mut self, now: Instant) {
        self.persist(now);
        self.release_current();
        self.drop_preload();
        self.timers.clear();
        info!("Playback stopped");
    }

    fn on_start(&mut self, now: Instant) {
        if !matches!(self.slot, Slot::Idle) {
            debug!(state = ?self.slot.state(), "Start ignored");
            return;
        }
        if self.tracker.catalog_len() == 0 {
            self.notify(Notice::no_songs());
            return;
        }

        self.failing.clear();
        self.play_fresh(now);
    }

    fn on_toggle(&mut self, now: Instant) {
        if let Some(last) = self.last_toggle {
            if now.saturating_duration_since(last) < self.config.toggle_debounce {
                debug!("Toggle debounced");
                return;
            }
        }
        self.last_toggle = Some(now);

        match mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Idle => self.on_start(now),
            Slot::Playing(mut handle) => match handle.pause() {
                Ok(()) => {
                    self.slot = Slot::Paused(handle);
                    self.emit_state_changed();
                    self.persist(now);
                }
                Err(e) => self.fail_handle(handle, LoadIntent::Play, e.to_string(), now),
            },
            Slot::Paused(mut handle) => match handle.play() {
                Ok(()) => {
                    self.slot = Slot::Playing(handle);
                    self.emit_state_changed();
                    self.persist(now);
                }
                Err(e) => self.fail_handle(handle, LoadIntent::Play, e.to_string(), now),
            },
            other => {
                debug!(state = ?other.state(), "Toggle ignored while loading");
                self.slot = other;
            }
        }
    }

    fn on_skip(&mut self, now: Instant) {
        match self.slot {
            Slot::Idle => self.on_start(now),
            Slot::Loading { .. } | Slot::Retrying => debug!("Skip ignored while loading"),
            Slot::Playing(_) | Slot::Paused(_) => {
                self.failing.clear();
                self.advance(now);
            }
        }
    }

    fn on_previous(&mut self, now: Instant) {
        if matches!(self.slot, Slot::Loading { .. } | Slot::Retrying) {
            debug!("Previous ignored while loading");
            return;
        }

        match self.tracker.pop_history() {
            Some(track) => {
                info!(track_id = %track.id, "Going back");
                self.drop_preload();
                self.failing.clear();
                self.load_current(track, LoadIntent::Play, false, now);
            }
            None => self.notify(Notice::no_previous()),
        }
    }

    fn on_reset_rotation(&mut self, now: Instant) {
        self.tracker.reset();
        info!(catalog = self.tracker.catalog_len(), "Rotation reset");
        self.notify(Notice::rotation_reset());
        self.persist(now);
    }

    fn on_seek(&mut self, position: Duration, now: Instant) {
        let Some(handle) = (match &mut self.slot {
            Slot::Playing(handle) | Slot::Paused(handle) => Some(handle),
            _ => None,
        }) else {
            debug!("Seek ignored without a ready track");
            return;
        };

        let target = handle.duration().map_or(position, |d| position.min(d));
        let duration = handle.duration().unwrap_or_default();

        match handle.seek(target) {
            Ok(()) => {
                self.emit(PlaybackEvent::PositionUpdate {
                    position_ms: target.as_millis() as u64,
                    duration_ms: duration.as_millis() as u64,
                });
                self.persist(now);
            }
            Err(e) => {
                if let Some(handle) = self.take_current_handle() {
                    self.fail_handle(handle, LoadIntent::Play, e.to_string(), now);
                }
            }
        }
    }

    fn on_set_volume(&mut self, level: u8, now: Instant) {
        self.volume.set_level(level);
        let gain = self.volume.gain();

        if let Some(handle) = self.slot.handle_mut() {
            handle.set_volume(gain);
        }
        if let Some(handle) = self.preload.handle_mut() {
            handle.set_volume(gain);
        }

        self.emit(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
        });
        self.persist(now);
    }

    fn on_set_catalog(&mut self, tracks: Vec<Track>, languages: Vec<String>, now: Instant) {
        self.tracker.set_catalog(tracks);
        self.selected_languages = languages;
        info!(
            tracks = self.tracker.catalog_len(),
            languages = ?self.selected_languages,
            "Catalog updated"
        );

        let stale_preload = self
            .preload
            .handle()
            .is_some_and(|handle| !self.tracker.contains(&handle.track().id));
        if stale_preload {
            debug!("Dropping preload outside the new catalog");
            self.drop_preload();
            self.schedule_preload(self.config.preload_delay, now);
        }

        self.persist(now);
    }

    fn on_catalog_failed(&mut self, error: &RadioError) {
        if error.is_retryable() {
            warn!(error = %error, "Catalog fetch failed");
        } else {
            debug!(error = %error, "Catalog fetch failed");
        }
        self.notify(Notice::from_error(error));
    }

    fn on_restore(&mut self, snapshot: &SessionSnapshot, now: Instant) {
        self.volume.set_level(snapshot.volume);
        self.tracker.restore_played(snapshot.played_ids.iter().cloned());
        if self.selected_languages.is_empty() {
            self.selected_languages.clone_from(&snapshot.selected_languages);
        }

        let Some(playback) = &snapshot.playback else {
            return;
        };
        if !matches!(self.slot, Slot::Idle) {
            debug!("Restore ignored: playback already active");
            return;
        }
        let Some(track) = self.tracker.find(&playback.track_id).cloned() else {
            debug!(track_id = %playback.track_id, "Restored track not in catalog, staying idle");
            return;
        };

        let position = Duration::try_from_secs_f64(playback.position_seconds).unwrap_or_default();
        info!(track_id = %track.id, position_secs = position.as_secs(), "Restoring playback");
        self.load_current(
            track,
            LoadIntent::Restore {
                position,
                resume: playback.was_playing,
            },
            false,
            now,
        );
    }

    fn on_engine_event(&mut self, event: EngineEvent, now: Instant) {
        if self.slot.handle_id() == Some(event.handle) {
            self.on_current_event(event.kind, now);
        } else if self.preload.handle().map(LiveHandle::id) == Some(event.handle) {
            self.on_preload_event(event.kind, now);
        } else {
            debug!(handle = event.handle.0, kind = ?event.kind, "Ignoring event from released handle");
        }
    }

    fn on_current_event(&mut self, kind: EngineEventKind, now: Instant) {
        let accepted = self
            .slot
            .handle_mut()
            .is_some_and(|handle| handle.accept(&kind));
        if !accepted {
            debug!(kind = ?kind, "Ignoring out-of-order engine event");
            return;
        }

        match kind {
            EngineEventKind::Ready { .. } => self.on_current_ready(now),
            EngineEventKind::LoadFailed { reason } => {
                let intent = match &self.slot {
                    Slot::Loading { intent, .. } => *intent,
                    _ => LoadIntent::Play,
                };
                if let Some(handle) = self.take_current_handle() {
                    self.fail_handle(handle, intent, reason, now);
                }
            }
            EngineEventKind::Started => {
                if self.swap_play_state(true) {
                    self.emit_state_changed();
                }
                self.schedule_poll(now);
                if matches!(self.preload, Preload::Empty) && !self.timers.is_scheduled(TimerKind::Preload) {
                    self.schedule_preload(self.config.preload_delay, now);
                }
            }
            EngineEventKind::Paused => {
                if self.swap_play_state(false) {
                    self.emit_state_changed();
                    self.persist(now);
                }
            }
            EngineEventKind::Ended => {
                if let Some(handle) = self.slot.handle() {
                    info!(track_id = %handle.track().id, "Track ended");
                }
                self.advance(now);
            }
        }
    }

    fn on_current_ready(&mut self, now: Instant) {
        let Slot::Loading { mut handle, intent } = mem::replace(&mut self.slot, Slot::Idle) else {
            return;
        };

        match intent {
            LoadIntent::Play => {
                if let Err(e) = handle.play() {
                    self.fail_handle(handle, intent, e.to_string(), now);
                    return;
                }
                info!(track_id = %handle.track().id, handle = handle.id().0, "Playing");
                self.failing.clear();
                self.slot = Slot::Playing(handle);
            }
            LoadIntent::Restore { position, resume } => {
                let target = handle.duration().map_or(position, |d| position.min(d));
                let started = handle
                    .seek(target)
                    .and_then(|()| if resume { handle.play() } else { Ok(()) });
                if let Err(e) = started {
                    self.fail_handle(handle, intent, e.to_string(), now);
                    return;
                }

                self.tracker.mark_playing(handle.track());
                self.notify(Notice::restored(handle.track()));
                info!(track_id = %handle.track().id, position_secs = target.as_secs(), resume, "Restored");
                self.slot = if resume {
                    Slot::Playing(handle)
                } else {
                    Slot::Paused(handle)
                };
            }
        }

        self.emit_state_changed();
        self.persist(now);
    }

    fn on_preload_event(&mut self, kind: EngineEventKind, now: Instant) {
        let accepted = self
            .preload
            .handle_mut()
            .is_some_and(|handle| handle.accept(&kind));
        if !accepted {
            return;
        }

        match kind {
            EngineEventKind::Ready { .. } => {
                if let Preload::Pending(handle) = mem::replace(&mut self.preload, Preload::Empty) {
                    debug!(track_id = %handle.track().id, handle = handle.id().0, "Next track ready");
                    self.emit(PlaybackEvent::NextTrackPrepared {
                        track_id: handle.track().id.clone(),
                    });
                    self.preload = Preload::Ready(handle);
                }
            }
            EngineEventKind::LoadFailed { reason } => {
                if let Some(handle) = self.take_preload_handle() {
                    let track = handle.track().clone();
                    let alternate = handle.is_alternate();
                    drop(handle);
                    self.on_preload_failed(track, alternate, reason, now);
                }
            }
            // A preloaded handle is never playing
            EngineEventKind::Started | EngineEventKind::Paused | EngineEventKind::Ended => {}
        }
    }

    fn on_tick(&mut self, now: Instant) {
        while let Some((kind, tag)) = self.timers.pop_due(now) {
            if tag.is_some() && tag != self.slot.handle_id() {
                debug!(?kind, "Skipping stale timer");
                continue;
            }

            match kind {
                TimerKind::Preload => self.start_preload(now),
                TimerKind::LoadRetry => {
                    if matches!(self.slot, Slot::Retrying) {
                        self.advance(now);
                    }
                }
                TimerKind::PositionPoll => self.poll_position(now),
            }
        }
    }

    // ===== Helpers =====

    /// Move to the next track, preferring a ready preload
    fn advance(&mut self, now: Instant) {
        self.timers.cancel(TimerKind::Preload);

        match mem::replace(&mut self.preload, Preload::Empty) {
            Preload::Ready(mut handle) => {
                self.release_current();
                self.tracker.mark_playing(handle.track());

                if let Err(e) = handle.play() {
                    self.fail_handle(handle, LoadIntent::Play, e.to_string(), now);
                    return;
                }

                info!(track_id = %handle.track().id, handle = handle.id().0, "Playing preloaded track");
                self.emit(PlaybackEvent::TrackChanged {
                    track: handle.track().clone(),
                });
                self.slot = Slot::Playing(handle);
                self.emit_state_changed();
                self.persist(now);
            }
            other => {
                drop(other);
                self.play_fresh(now);
            }
        }
    }

    /// Pick a track and load it as current
    fn play_fresh(&mut self, now: Instant) {
        self.drop_preload();
        match self.tracker.pick_next() {
            Some(track) => {
                self.tracker.mark_playing(&track);
                self.load_current(track, LoadIntent::Play, false, now);
            }
            None => self.stop_with_notice(Notice::no_songs(), now),
        }
    }

    fn load_current(&mut self, track: Track, intent: LoadIntent, alternate: bool, now: Instant) {
        self.release_current();

        let url = if alternate {
            track.alternate_url.clone().unwrap_or_else(|| track.url.clone())
        } else {
            track.url.clone()
        };
        let id = self.allocate_handle();

        match self.engine.load(id, &url, self.volume.gain()) {
            Ok(inner) => {
                debug!(track_id = %track.id, handle = id.0, url = %url, "Loading track");
                self.emit(PlaybackEvent::TrackChanged {
                    track: track.clone(),
                });
                self.slot = Slot::Loading {
                    handle: LiveHandle::new(id, track, inner, alternate),
                    intent,
                };
                self.emit_state_changed();
            }
            Err(e) => self.on_current_failed(track, intent, alternate, e.to_string(), now),
        }
    }

    /// Release `handle` and run failure recovery for its track
    fn fail_handle(
        &mut self,
        mut handle: LiveHandle<E::Handle>,
        intent: LoadIntent,
        reason: String,
        now: Instant,
    ) {
        let track = handle.track().clone();
        let alternate = handle.is_alternate();
        self.timers.cancel_handle(handle.id());
        handle.release();
        drop(handle);
        self.on_current_failed(track, intent, alternate, reason, now);
    }

    fn on_current_failed(
        &mut self,
        track: Track,
        intent: LoadIntent,
        tried_alternate: bool,
        reason: String,
        now: Instant,
    ) {
        self.slot = Slot::Idle;

        if !tried_alternate && track.alternate_url.is_some() {
            warn!(track_id = %track.id, reason = %reason, "Primary source failed, trying alternate");
            self.load_current(track, intent, true, now);
            return;
        }

        if let LoadIntent::Restore { .. } = intent {
            let error = RadioError::Restoration(reason);
            debug!(track_id = %track.id, error = %error, "Discarding restoration");
            self.emit_state_changed();
            self.persist(now);
            return;
        }

        let error = RadioError::track_load(track.id.clone(), reason);
        warn!(error = %error, "Track failed to load");
        self.notify(Notice::track_load_failed(&track));
        self.tracker.evict(&track.id);

        self.failing.insert(track.id.clone());
        let failing = self
            .failing
            .iter()
            .filter(|id| self.tracker.contains(id))
            .count();
        if failing >= self.tracker.catalog_len().max(1) {
            self.failing.clear();
            self.stop_with_notice(Notice::no_playable_songs(), now);
            return;
        }

        self.slot = Slot::Retrying;
        self.timers
            .schedule(TimerKind::LoadRetry, now + self.config.load_retry_delay, None);
        self.emit_state_changed();
    }

    fn schedule_preload(&mut self, delay: Duration, now: Instant) {
        if let Some(current) = self.slot.handle_id() {
            self.timers
                .schedule(TimerKind::Preload, now + delay, Some(current));
        }
    }

    fn start_preload(&mut self, now: Instant) {
        if !matches!(self.preload, Preload::Empty | Preload::Failed) {
            return;
        }
        let Some(current) = self.slot.handle().map(|handle| handle.track().id.clone()) else {
            return;
        };

        match self.tracker.pick_next() {
            Some(track) if track.id != current => self.load_preload(track, false, now),
            _ => {
                debug!("Nothing to preload");
                self.preload = Preload::Empty;
            }
        }
    }

    fn load_preload(&mut self, track: Track, alternate: bool, now: Instant) {
        let url = if alternate {
            track.alternate_url.clone().unwrap_or_else(|| track.url.clone())
        } else {
            track.url.clone()
        };
        let id = self.allocate_handle();

        match self.engine.load(id, &url, self.volume.gain()) {
            Ok(inner) => {
                debug!(track_id = %track.id, handle = id.0, "Preloading next track");
                self.preload = Preload::Pending(LiveHandle::new(id, track, inner, alternate));
            }
            Err(e) => self.on_preload_failed(track, alternate, e.to_string(), now),
        }
    }

    fn on_preload_failed(&mut self, track: Track, tried_alternate: bool, reason: String, now: Instant) {
        if !tried_alternate && track.alternate_url.is_some() {
            debug!(track_id = %track.id, "Preload failed, trying alternate");
            self.load_preload(track, true, now);
            return;
        }

        warn!(track_id = %track.id, reason = %reason, "Preload failed");
        self.tracker.evict(&track.id);
        self.preload = Preload::Failed;
        self.schedule_preload(self.config.preload_retry_delay, now);
    }

    fn poll_position(&mut self, now: Instant) {
        let Slot::Playing(handle) = &self.slot else {
            return;
        };
        let position = handle.position();
        let duration = handle.duration().unwrap_or_default();

        self.emit(PlaybackEvent::PositionUpdate {
            position_ms: position.as_millis() as u64,
            duration_ms: duration.as_millis() as u64,
        });

        let persist_due = self.last_position_persist.map_or(true, |last| {
            now.saturating_duration_since(last) >= self.config.position_persist_interval
        });
        if persist_due {
            self.persist(now);
        }

        self.schedule_poll(now);
    }

    fn schedule_poll(&mut self, now: Instant) {
        if let Some(current) = self.slot.handle_id() {
            self.timers.schedule(
                TimerKind::PositionPoll,
                now + self.config.position_poll_interval,
                Some(current),
            );
        }
    }

    /// Flip between `Playing` and `Paused` after the engine reported it
    fn swap_play_state(&mut self, playing: bool) -> bool {
        let next = match mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Paused(handle) if playing => Slot::Playing(handle),
            Slot::Playing(handle) if !playing => Slot::Paused(handle),
            other => {
                self.slot = other;
                return false;
            }
        };
        self.slot = next;
        true
    }

    fn take_current_handle(&mut self) -> Option<LiveHandle<E::Handle>> {
        match mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Loading { handle, .. } | Slot::Playing(handle) | Slot::Paused(handle) => {
                Some(handle)
            }
            Slot::Idle | Slot::Retrying => None,
        }
    }

    fn take_preload_handle(&mut self) -> Option<LiveHandle<E::Handle>> {
        match mem::replace(&mut self.preload, Preload::Empty) {
            Preload::Pending(handle) | Preload::Ready(handle) => Some(handle),
            Preload::Empty | Preload::Failed => None,
        }
    }

    /// Release the current handle and forget its timers
    fn release_current(&mut self) {
        if let Some(id) = self.slot.handle_id() {
            self.timers.cancel_handle(id);
        }
        self.timers.cancel(TimerKind::LoadRetry);
        if let Some(mut handle) = self.take_current_handle() {
            handle.release();
        }
    }

    fn drop_preload(&mut self) {
        self.timers.cancel(TimerKind::Preload);
        if let Some(mut handle) = self.take_preload_handle() {
            handle.release();
        }
    }

    fn stop_with_notice(&mut self, notice: Notice, now: Instant) {
        self.release_current();
        self.drop_preload();
        self.notify(notice);
        self.emit_state_changed();
        self.persist(now);
    }

    fn allocate_handle(&mut self) -> HandleId {
        self.next_handle += 1;
        HandleId(self.next_handle)
    }

    // ===== Persistence =====

    /// Snapshot of everything that should survive a reload
    pub fn snapshot(&self) -> SessionSnapshot {
        let saved_at_epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        let playback = match &self.slot {
            Slot::Loading {
                handle,
                intent: LoadIntent::Restore { position, resume },
            } => Some(PlaybackSnapshot {
                track_id: handle.track().id.clone(),
                was_playing: *resume,
                position_seconds: position.as_secs_f64(),
                saved_at_epoch_ms,
            }),
            Slot::Loading { handle, .. } => Some(PlaybackSnapshot {
                track_id: handle.track().id.clone(),
                was_playing: true,
                position_seconds: 0.0,
                saved_at_epoch_ms,
            }),
            Slot::Playing(handle) | Slot::Paused(handle) => Some(PlaybackSnapshot {
                track_id: handle.track().id.clone(),
                was_playing: matches!(self.slot, Slot::Playing(_)),
                position_seconds: handle.position().as_secs_f64(),
                saved_at_epoch_ms,
            }),
            Slot::Idle | Slot::Retrying => None,
        };

        SessionSnapshot {
            selected_languages: self.selected_languages.clone(),
            volume: self.volume.level(),
            played_ids: self.tracker.played_ids(),
            playback,
        }
    }

    fn persist(&mut self, now: Instant) {
        if self.persistence.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(persistence) = self.persistence.as_mut() {
            if let Err(e) = persistence.save(&snapshot) {
                warn!(error = %e, "Failed to persist session");
            }
        }
        self.last_position_persist = Some(now);
    }

    // ===== Queries =====

    /// State for the presentation layer
    pub fn now_playing(&self) -> NowPlaying {
        let handle = self.slot.handle();
        NowPlaying {
            current_track: handle.map(|h| h.track().clone()),
            state: self.slot.state(),
            is_playing: matches!(self.slot, Slot::Playing(_)),
            current_time: match &self.slot {
                Slot::Playing(h) | Slot::Paused(h) => h.position(),
                _ => Duration::ZERO,
            },
            duration: handle.and_then(LiveHandle::duration),
            volume: self.volume.level(),
            has_previous: self.tracker.has_previous(),
            preload: self.preload.state(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.slot.state()
    }

    pub fn preload_state(&self) -> PreloadState {
        self.preload.state()
    }

    /// Id of the current handle, if any
    pub fn current_handle(&self) -> Option<HandleId> {
        self.slot.handle_id()
    }

    /// Id of the preloaded handle, if any
    pub fn preload_handle(&self) -> Option<HandleId> {
        self.preload.handle().map(LiveHandle::id)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.slot.handle().map(LiveHandle::track)
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn volume(&self) -> u8 {
        self.volume.level()
    }

    pub fn selected_languages(&self) -> &[String] {
        &self.selected_languages
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // ===== Events =====

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        mem::take(&mut self.pending_events)
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    fn emit_state_changed(&mut self) {
        self.emit(PlaybackEvent::StateChanged {
            state: self.slot.state(),
        });
    }

    fn notify(&mut self, notice: Notice) {
        self.emit(PlaybackEvent::Notice(notice));
    }
}
