//! Event loop driving the orchestrator
//!
//! One task owns the [`Orchestrator`]. Commands, engine events and catalog
//! responses arrive on a single channel; timers are a `sleep_until` on the
//! orchestrator's next deadline. State is published through a `watch`
//! channel and events through a `broadcast` channel.

use crate::{
    engine::{AudioEngine, EngineEvent, EngineEventKind, HandleId},
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    orchestrator::{Input, Orchestrator},
    tracker::Tracker,
    types::{NowPlaying, PlaybackConfig},
};
use radio_core::{CatalogSource, RadioError, SessionPersistence, Track};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 64;

/// Commands accepted by a running player
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCommand {
    Start,
    Toggle,
    Skip,
    Previous,
    ResetRotation,
    Seek(Duration),
    SetVolume(u8),
    /// Fetch the catalog for a new language selection
    SelectLanguages(Vec<String>),
    Shutdown,
}

enum Message {
    Command(RuntimeCommand),
    Engine(EngineEvent),
    Catalog {
        generation: u64,
        languages: Vec<String>,
        result: radio_core::Result<Vec<Track>>,
    },
}

/// Where an engine reports handle events
#[derive(Clone)]
pub struct EngineEventSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl EngineEventSink {
    pub fn emit(&self, handle: HandleId, kind: EngineEventKind) {
        if self
            .tx
            .send(Message::Engine(EngineEvent::new(handle, kind)))
            .is_err()
        {
            debug!(handle = handle.0, "Player stopped, dropping engine event");
        }
    }
}

/// Cloneable control surface for a running player
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<Message>,
    now_playing: watch::Receiver<NowPlaying>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlayerHandle {
    pub fn send(&self, command: RuntimeCommand) -> Result<()> {
        self.commands
            .send(Message::Command(command))
            .map_err(|_| PlaybackError::RuntimeClosed)
    }

    pub fn start(&self) -> Result<()> {
        self.send(RuntimeCommand::Start)
    }

    pub fn toggle(&self) -> Result<()> {
        self.send(RuntimeCommand::Toggle)
    }

    pub fn skip(&self) -> Result<()> {
        self.send(RuntimeCommand::Skip)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(RuntimeCommand::Previous)
    }

    pub fn reset_rotation(&self) -> Result<()> {
        self.send(RuntimeCommand::ResetRotation)
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        self.send(RuntimeCommand::Seek(position))
    }

    pub fn set_volume(&self, level: u8) -> Result<()> {
        self.send(RuntimeCommand::SetVolume(level))
    }

    pub fn select_languages(&self, languages: Vec<String>) -> Result<()> {
        self.send(RuntimeCommand::SelectLanguages(languages))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(RuntimeCommand::Shutdown)
    }

    /// Latest published state
    pub fn current(&self) -> NowPlaying {
        self.now_playing.borrow().clone()
    }

    /// Watch published state
    pub fn now_playing(&self) -> watch::Receiver<NowPlaying> {
        self.now_playing.clone()
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

/// Player runtime
pub struct PlayerRuntime<E: AudioEngine> {
    orchestrator: Orchestrator<E>,
    catalog: Arc<dyn CatalogSource>,
    inbox: mpsc::UnboundedReceiver<Message>,
    outbox: mpsc::UnboundedSender<Message>,
    now_playing: watch::Sender<NowPlaying>,
    events: broadcast::Sender<PlaybackEvent>,
    catalog_generation: u64,
}

impl<E: AudioEngine + 'static> PlayerRuntime<E> {
    /// Build a runtime; `make_engine` receives the sink its handles report to.
    pub fn new<F>(
        config: PlaybackConfig,
        catalog: Arc<dyn CatalogSource>,
        persistence: Box<dyn SessionPersistence>,
        make_engine: F,
    ) -> (Self, PlayerHandle)
    where
        F: FnOnce(EngineEventSink) -> E,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = make_engine(EngineEventSink { tx: tx.clone() });
        let orchestrator = Orchestrator::new(config, engine).with_persistence(persistence);

        let (now_tx, now_rx) = watch::channel(orchestrator.now_playing());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let handle = PlayerHandle {
            commands: tx.clone(),
            now_playing: now_rx,
            events: events_tx.clone(),
        };

        let runtime = Self {
            orchestrator,
            catalog,
            inbox: rx,
            outbox: tx,
            now_playing: now_tx,
            events: events_tx,
            catalog_generation: 0,
        };
        (runtime, handle)
    }

    /// Use a specific tracker (e.g. a seeded one)
    #[must_use]
    pub fn with_tracker(mut self, tracker: Tracker) -> Self {
        self.orchestrator = self.orchestrator.with_tracker(tracker);
        self
    }

    /// Cold boot: restore the persisted session
    ///
    /// Fetches the catalog for the persisted languages, then hands the
    /// snapshot to the orchestrator, which resumes the saved track only if it
    /// is still in that catalog.
    pub async fn boot(&mut self) {
        let snapshot = self.orchestrator.load_session();
        let languages = snapshot.selected_languages.clone();

        if !languages.is_empty() {
            info!(languages = ?languages, "Restoring language selection");
            match self.catalog.list_tracks(&languages).await {
                Ok(tracks) => self.orchestrator.dispatch(
                    Input::SetCatalog { tracks, languages },
                    clock_now(),
                ),
                Err(err) => {
                    self.orchestrator.dispatch(
                        Input::SetCatalog {
                            tracks: Vec::new(),
                            languages,
                        },
                        clock_now(),
                    );
                    self.orchestrator
                        .dispatch(Input::CatalogFailed(err), clock_now());
                }
            }
        }

        self.orchestrator
            .dispatch(Input::Restore(snapshot), clock_now());
        self.publish();
    }

    /// Run until shut down
    pub async fn run(mut self) {
        info!("Player runtime started");

        loop {
            self.publish();
            let deadline = self.orchestrator.next_deadline();

            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(Message::Command(RuntimeCommand::Shutdown)) | None => break,
                    Some(message) => self.handle(message),
                },
                () = sleep_until(deadline) => {
                    self.orchestrator.dispatch(Input::Tick, clock_now());
                }
            }
        }

        self.orchestrator.shutdown(clock_now());
        self.publish();
        info!("Player runtime stopped");
    }

    fn handle(&mut self, message: Message) {
        let now = clock_now();
        match message {
            Message::Command(command) => self.handle_command(command, now),
            Message::Engine(event) => self.orchestrator.dispatch(Input::Engine(event), now),
            Message::Catalog {
                generation,
                languages,
                result,
            } => {
                if generation != self.catalog_generation {
                    debug!(generation, "Discarding stale catalog response");
                    return;
                }
                match result {
                    Ok(tracks) => self
                        .orchestrator
                        .dispatch(Input::SetCatalog { tracks, languages }, now),
                    Err(err) => {
                        if matches!(err, RadioError::EmptyResult) {
                            self.orchestrator.dispatch(
                                Input::SetCatalog {
                                    tracks: Vec::new(),
                                    languages,
                                },
                                now,
                            );
                        }
                        self.orchestrator.dispatch(Input::CatalogFailed(err), now);
                    }
                }
            }
        }
    }

    fn handle_command(&mut self, command: RuntimeCommand, now: Instant) {
        let input = match command {
            RuntimeCommand::Start => Input::Start,
            RuntimeCommand::Toggle => Input::Toggle,
            RuntimeCommand::Skip => Input::Skip,
            RuntimeCommand::Previous => Input::Previous,
            RuntimeCommand::ResetRotation => Input::ResetRotation,
            RuntimeCommand::Seek(position) => Input::Seek(position),
            RuntimeCommand::SetVolume(level) => Input::SetVolume(level),
            RuntimeCommand::SelectLanguages(languages) => {
                self.request_catalog(languages);
                return;
            }
            RuntimeCommand::Shutdown => return,
        };
        self.orchestrator.dispatch(input, now);
    }

    /// Fetch tracks off the loop; only the newest request is applied
    fn request_catalog(&mut self, languages: Vec<String>) {
        self.catalog_generation += 1;
        let generation = self.catalog_generation;
        let catalog = Arc::clone(&self.catalog);
        let tx = self.outbox.clone();

        debug!(generation, languages = ?languages, "Fetching catalog");
        tokio::spawn(async move {
            let result = catalog.list_tracks(&languages).await;
            let message = Message::Catalog {
                generation,
                languages,
                result,
            };
            if tx.send(message).is_err() {
                debug!(generation, "Player stopped before catalog arrived");
            }
        });
    }

    fn publish(&mut self) {
        for event in self.orchestrator.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }

        let next = self.orchestrator.now_playing();
        self.now_playing.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
