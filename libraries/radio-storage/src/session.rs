//! Session persistence bridge
//!
//! Mirrors a [`SessionSnapshot`] into namespaced string keys:
//!
//! | Key | Value |
//! | --- | --- |
//! | `radio:selected-languages` | JSON array of language keys |
//! | `radio:volume` | 0-100 |
//! | `radio:played-ids` | JSON array of track ids |
//! | `radio:current-track` | track id |
//! | `radio:was-playing` | `true` / `false` |
//! | `radio:position` | seconds |
//! | `radio:position-saved-at` | Unix epoch milliseconds |
//!
//! Every key is optional on read. A value that does not parse is treated as
//! absent. The last four keys form the playback entry, which expires after
//! the staleness window.

use crate::error::Result;
use crate::store::KeyValueStore;
use chrono::{DateTime, Duration, Utc};
use radio_core::{PlaybackSnapshot, SessionPersistence, SessionSnapshot, TrackId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_NAMESPACE: &str = "radio";

const SELECTED_LANGUAGES: &str = "selected-languages";
const VOLUME: &str = "volume";
const PLAYED_IDS: &str = "played-ids";
const CURRENT_TRACK: &str = "current-track";
const WAS_PLAYING: &str = "was-playing";
const POSITION: &str = "position";
const POSITION_SAVED_AT: &str = "position-saved-at";

const PLAYBACK_KEYS: [&str; 4] = [CURRENT_TRACK, WAS_PLAYING, POSITION, POSITION_SAVED_AT];

/// Session persistence over a key-value store
#[derive(Debug)]
pub struct SessionBridge<S: KeyValueStore> {
    store: S,
    namespace: String,
    staleness: Duration,
}

impl<S: KeyValueStore> SessionBridge<S> {
    /// Bridge with the `radio` namespace and a 24h staleness window
    pub fn new(store: S) -> Self {
        Self {
            store,
            namespace: DEFAULT_NAMESPACE.to_string(),
            staleness: Duration::hours(24),
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.namespace, name)
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let key = self.key(name);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(key = %key, error = %e, "Ignoring unreadable session entry");
                Ok(None)
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let key = self.key(name);
        let raw = serde_json::to_string(value)?;
        self.store.set(&key, raw)
    }

    /// Read the session as of `now`
    pub fn load_at(&self, now: DateTime<Utc>) -> Result<SessionSnapshot> {
        let defaults = SessionSnapshot::default();

        Ok(SessionSnapshot {
            selected_languages: self.read(SELECTED_LANGUAGES)?.unwrap_or_default(),
            volume: self
                .read::<u8>(VOLUME)?
                .map_or(defaults.volume, |volume| volume.min(100)),
            played_ids: self.read::<Vec<TrackId>>(PLAYED_IDS)?.unwrap_or_default(),
            playback: self.load_playback(now)?,
        })
    }

    fn load_playback(&self, now: DateTime<Utc>) -> Result<Option<PlaybackSnapshot>> {
        let Some(track_id) = self.read::<TrackId>(CURRENT_TRACK)? else {
            return Ok(None);
        };
        let Some(saved_at_epoch_ms) = self.read::<i64>(POSITION_SAVED_AT)? else {
            debug!(track_id = %track_id, "Playback entry has no timestamp, discarding");
            return Ok(None);
        };

        let saved_at = DateTime::<Utc>::from_timestamp_millis(saved_at_epoch_ms);
        let fresh = saved_at.is_some_and(|saved_at| now - saved_at <= self.staleness);
        if !fresh {
            debug!(track_id = %track_id, saved_at_epoch_ms, "Playback entry is stale, discarding");
            return Ok(None);
        }

        let position_seconds = self
            .read::<f64>(POSITION)?
            .filter(|p| p.is_finite())
            .map_or(0.0, |p| p.max(0.0));

        Ok(Some(PlaybackSnapshot {
            track_id,
            was_playing: self.read(WAS_PLAYING)?.unwrap_or(false),
            position_seconds,
            saved_at_epoch_ms,
        }))
    }

    /// Overwrite every key from `snapshot`
    ///
    /// A snapshot without playback removes the playback entry.
    pub fn store_snapshot(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        self.write(SELECTED_LANGUAGES, &snapshot.selected_languages)?;
        self.write(VOLUME, &snapshot.volume.min(100))?;
        self.write(PLAYED_IDS, &snapshot.played_ids)?;

        match &snapshot.playback {
            Some(playback) => {
                self.write(CURRENT_TRACK, &playback.track_id)?;
                self.write(WAS_PLAYING, &playback.was_playing)?;
                self.write(POSITION, &playback.position_seconds)?;
                self.write(POSITION_SAVED_AT, &playback.saved_at_epoch_ms)?;
            }
            None => {
                for name in PLAYBACK_KEYS {
                    let key = self.key(name);
                    self.store.remove(&key)?;
                }
            }
        }

        self.store.flush()
    }

    /// Remove every key this bridge owns
    pub fn clear(&mut self) -> Result<()> {
        for name in [SELECTED_LANGUAGES, VOLUME, PLAYED_IDS]
            .into_iter()
            .chain(PLAYBACK_KEYS)
        {
            let key = self.key(name);
            self.store.remove(&key)?;
        }
        self.store.flush()
    }
}

impl<S: KeyValueStore> SessionPersistence for SessionBridge<S> {
    fn load(&self) -> radio_core::Result<SessionSnapshot> {
        Ok(self.load_at(Utc::now())?)
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> radio_core::Result<()> {
        Ok(self.store_snapshot(snapshot)?)
    }
}
