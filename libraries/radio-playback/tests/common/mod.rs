//! Shared test doubles for playback tests

#![allow(dead_code)]

use async_trait::async_trait;
use radio_core::{
    CatalogSource, LanguageOption, RadioError, SessionPersistence, SessionSnapshot, Track,
};
use radio_playback::{
    AudioEngine, EngineEvent, EngineEventKind, EngineEventSink, EngineHandle, HandleId, Input,
    Orchestrator, PlaybackConfig, PlaybackError, Tracker,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const TRACK_LENGTH: Duration = Duration::from_secs(180);

// ===== Engine =====

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load { handle: HandleId, url: String, gain: f32 },
    Play(HandleId),
    Pause(HandleId),
    Seek(HandleId, Duration),
    Volume(HandleId, f32),
    Release(HandleId),
}

/// Everything the fake engine was asked to do
#[derive(Debug, Default)]
pub struct EngineLog {
    pub calls: Vec<Call>,
    pub playing: HashSet<HandleId>,
    pub released: HashSet<HandleId>,
    pub positions: HashMap<HandleId, Duration>,
    pub max_playing: usize,
}

impl EngineLog {
    pub fn loads(&self) -> Vec<(HandleId, String)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Load { handle, url, .. } => Some((*handle, url.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_load(&self) -> Option<(HandleId, String)> {
        self.loads().pop()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| matches(call)).count()
    }
}

pub type SharedLog = Arc<Mutex<EngineLog>>;

/// Engine double
///
/// Loads of a URL in `refused` fail synchronously. In auto mode the engine
/// also reports events through the sink: ready (or load failure for
/// `failing` URLs) on load, started on play, paused on pause.
pub struct FakeEngine {
    log: SharedLog,
    refused: HashSet<String>,
    failing: HashSet<String>,
    sink: Option<EngineEventSink>,
}

impl FakeEngine {
    pub fn new(log: SharedLog) -> Self {
        Self {
            log,
            refused: HashSet::new(),
            failing: HashSet::new(),
            sink: None,
        }
    }

    pub fn auto(log: SharedLog, sink: EngineEventSink) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new(log)
        }
    }

    #[must_use]
    pub fn refusing(mut self, url: &str) -> Self {
        self.refused.insert(url.to_string());
        self
    }

    #[must_use]
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }
}

impl AudioEngine for FakeEngine {
    type Handle = FakeHandle;

    fn load(&mut self, id: HandleId, url: &str, gain: f32) -> radio_playback::Result<FakeHandle> {
        self.log.lock().unwrap().calls.push(Call::Load {
            handle: id,
            url: url.to_string(),
            gain,
        });

        if self.refused.contains(url) {
            return Err(PlaybackError::engine(format!("refused {url}")));
        }

        if let Some(sink) = &self.sink {
            if self.failing.contains(url) {
                sink.emit(
                    id,
                    EngineEventKind::LoadFailed {
                        reason: "404".to_string(),
                    },
                );
            } else {
                sink.emit(
                    id,
                    EngineEventKind::Ready {
                        duration: TRACK_LENGTH,
                    },
                );
            }
        }

        Ok(FakeHandle {
            id,
            log: Arc::clone(&self.log),
            sink: self.sink.clone(),
        })
    }
}

pub struct FakeHandle {
    id: HandleId,
    log: SharedLog,
    sink: Option<EngineEventSink>,
}

impl EngineHandle for FakeHandle {
    fn play(&mut self) -> radio_playback::Result<()> {
        {
            let mut log = self.log.lock().unwrap();
            log.calls.push(Call::Play(self.id));
            log.playing.insert(self.id);
            log.max_playing = log.max_playing.max(log.playing.len());
        }
        if let Some(sink) = &self.sink {
            sink.emit(self.id, EngineEventKind::Started);
        }
        Ok(())
    }

    fn pause(&mut self) -> radio_playback::Result<()> {
        {
            let mut log = self.log.lock().unwrap();
            log.calls.push(Call::Pause(self.id));
            log.playing.remove(&self.id);
        }
        if let Some(sink) = &self.sink {
            sink.emit(self.id, EngineEventKind::Paused);
        }
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> radio_playback::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.calls.push(Call::Seek(self.id, position));
        log.positions.insert(self.id, position);
        Ok(())
    }

    fn set_volume(&mut self, gain: f32) {
        self.log.lock().unwrap().calls.push(Call::Volume(self.id, gain));
    }

    fn position(&self) -> Duration {
        self.log
            .lock()
            .unwrap()
            .positions
            .get(&self.id)
            .copied()
            .unwrap_or_default()
    }

    fn release(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(Call::Release(self.id));
        log.playing.remove(&self.id);
        log.released.insert(self.id);
    }
}

// ===== Persistence =====

/// In-memory session store; clones share the saved snapshot
#[derive(Clone, Default)]
pub struct MemorySession {
    pub saved: Arc<Mutex<Option<SessionSnapshot>>>,
    pub saves: Arc<Mutex<usize>>,
    pub corrupt: bool,
}

impl MemorySession {
    pub fn with(snapshot: SessionSnapshot) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Some(snapshot))),
            ..Self::default()
        }
    }

    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    pub fn last(&self) -> Option<SessionSnapshot> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl SessionPersistence for MemorySession {
    fn load(&self) -> radio_core::Result<SessionSnapshot> {
        if self.corrupt {
            return Err(RadioError::storage("corrupt entry"));
        }
        Ok(self.last().unwrap_or_default())
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> radio_core::Result<()> {
        *self.saved.lock().unwrap() = Some(snapshot.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

// ===== Catalog =====

/// In-memory catalog filtered by language
#[derive(Default)]
pub struct FakeCatalog {
    pub tracks: Vec<Track>,
    pub fail_next: Mutex<Option<RadioError>>,
    pub delays: HashMap<String, Duration>,
    pub requests: Mutex<Vec<Vec<String>>>,
}

impl FakeCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            ..Self::default()
        }
    }

    pub fn failing_once(self, error: RadioError) -> Self {
        *self.fail_next.lock().unwrap() = Some(error);
        self
    }

    #[must_use]
    pub fn delayed(mut self, language: &str, delay: Duration) -> Self {
        self.delays.insert(language.to_string(), delay);
        self
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_languages(&self) -> radio_core::Result<Vec<LanguageOption>> {
        let mut languages: Vec<String> = self.tracks.iter().map(|t| t.language.clone()).collect();
        languages.sort();
        languages.dedup();
        Ok(languages.into_iter().map(LanguageOption::from_manifest_key).collect())
    }

    async fn list_tracks(&self, languages: &[String]) -> radio_core::Result<Vec<Track>> {
        self.requests.lock().unwrap().push(languages.to_vec());

        let delay = languages
            .iter()
            .filter_map(|language| self.delays.get(language))
            .max()
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.fail_next.lock().unwrap().take();
        if let Some(error) = failure {
            return Err(error);
        }
        if languages.is_empty() {
            return Ok(Vec::new());
        }

        let tracks: Vec<Track> = self
            .tracks
            .iter()
            .filter(|t| languages.contains(&t.language))
            .cloned()
            .collect();
        if tracks.is_empty() {
            return Err(RadioError::EmptyResult);
        }
        Ok(tracks)
    }
}

// ===== Fixtures =====

pub fn track(language: &str, title: &str) -> Track {
    Track::new(
        language,
        title,
        format!("https://music.example.com/audio/{language}/{title}.mp3"),
    )
}

pub fn tracks(language: &str, titles: &[&str]) -> Vec<Track> {
    titles.iter().map(|title| track(language, title)).collect()
}

pub fn languages(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// Orchestrator over a fresh log with a seeded tracker
pub fn orchestrator(engine: FakeEngine) -> Orchestrator<FakeEngine> {
    Orchestrator::new(PlaybackConfig::default(), engine).with_tracker(Tracker::with_seed(10, 42))
}

pub fn with_catalog(engine: FakeEngine, catalog: Vec<Track>, now: Instant) -> Orchestrator<FakeEngine> {
    let mut player = orchestrator(engine);
    player.set_catalog(catalog, languages(&["English"]), now);
    player.drain_events();
    player
}

pub fn new_log() -> SharedLog {
    Arc::new(Mutex::new(EngineLog::default()))
}

// ===== Engine event helpers =====

pub fn ready(player: &mut Orchestrator<FakeEngine>, handle: HandleId, now: Instant) {
    player.dispatch(
        Input::Engine(EngineEvent::new(
            handle,
            EngineEventKind::Ready {
                duration: TRACK_LENGTH,
            },
        )),
        now,
    );
}

pub fn started(player: &mut Orchestrator<FakeEngine>, handle: HandleId, now: Instant) {
    player.dispatch(
        Input::Engine(EngineEvent::new(handle, EngineEventKind::Started)),
        now,
    );
}

pub fn ended(player: &mut Orchestrator<FakeEngine>, handle: HandleId, now: Instant) {
    player.dispatch(
        Input::Engine(EngineEvent::new(handle, EngineEventKind::Ended)),
        now,
    );
}

pub fn load_failed(player: &mut Orchestrator<FakeEngine>, handle: HandleId, now: Instant) {
    player.dispatch(
        Input::Engine(EngineEvent::new(
            handle,
            EngineEventKind::LoadFailed {
                reason: "404 Not Found".to_string(),
            },
        )),
        now,
    );
}

/// Ready + started for the current handle
pub fn bring_up(player: &mut Orchestrator<FakeEngine>, now: Instant) -> HandleId {
    let handle = player.current_handle().expect("a current handle");
    ready(player, handle, now);
    started(player, handle, now);
    handle
}
