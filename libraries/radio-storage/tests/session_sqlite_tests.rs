//! Session bridge over the SQLite store
//!
//! Exercises the full save → reopen → load path the way a host restarts.

use chrono::{Duration, Utc};
use radio_core::{PlaybackSnapshot, SessionPersistence, SessionSnapshot, TrackId};
use radio_storage::{KeyValueStore, SessionBridge, SqliteStore};
use std::path::Path;
use tempfile::TempDir;

fn playing_snapshot(saved_at_epoch_ms: i64) -> SessionSnapshot {
    SessionSnapshot {
        selected_languages: vec!["French".to_string()],
        volume: 30,
        played_ids: vec![
            TrackId::from_parts("French", "Le Vent"),
            TrackId::from_parts("French", "La Mer"),
        ],
        playback: Some(PlaybackSnapshot {
            track_id: TrackId::from_parts("French", "Sous le Ciel"),
            was_playing: false,
            position_seconds: 73.25,
            saved_at_epoch_ms,
        }),
    }
}

/// Save through a fresh bridge and wait for the commit
async fn save_and_sync(path: &Path, snapshot: &SessionSnapshot) -> SessionBridge<SqliteStore> {
    let store = SqliteStore::open(path).await.unwrap();
    let writer = store.writer();
    let mut bridge = SessionBridge::new(store);
    bridge.save(snapshot).unwrap();
    writer.sync().await.unwrap();
    bridge
}

#[tokio::test]
async fn snapshot_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");
    let saved = playing_snapshot(Utc::now().timestamp_millis());

    drop(save_and_sync(&path, &saved).await);

    let bridge = SessionBridge::new(SqliteStore::open(&path).await.unwrap());
    assert_eq!(bridge.load().unwrap(), saved);
}

#[tokio::test]
async fn stale_playback_expires_across_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");
    let two_days_ago = Utc::now() - Duration::hours(48);

    drop(save_and_sync(&path, &playing_snapshot(two_days_ago.timestamp_millis())).await);

    let loaded = SessionBridge::new(SqliteStore::open(&path).await.unwrap())
        .load()
        .unwrap();
    assert!(loaded.playback.is_none());
    assert_eq!(loaded.volume, 30);
    assert_eq!(loaded.selected_languages, vec!["French".to_string()]);
}

#[tokio::test]
async fn namespaces_do_not_collide() {
    let store = SqliteStore::in_memory().await.unwrap();
    let saved = playing_snapshot(Utc::now().timestamp_millis());

    let mut bridge = SessionBridge::new(store);
    bridge.save(&saved).unwrap();

    let other = SessionBridge::new(bridge.into_store()).with_namespace("kiosk");
    assert_eq!(other.load().unwrap(), SessionSnapshot::default());
}

#[tokio::test]
async fn clear_removes_everything() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");

    let mut bridge = save_and_sync(&path, &playing_snapshot(Utc::now().timestamp_millis())).await;
    let writer = bridge.store().writer();
    bridge.clear().unwrap();
    writer.sync().await.unwrap();
    drop(bridge);

    let store = SqliteStore::open(&path).await.unwrap();
    assert!(store.get("radio:volume").unwrap().is_none());
    assert!(store.get("radio:current-track").unwrap().is_none());
}

#[tokio::test]
async fn later_saves_overwrite_earlier_ones() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");

    let mut bridge = save_and_sync(&path, &playing_snapshot(Utc::now().timestamp_millis())).await;
    let writer = bridge.store().writer();
    let mut next = playing_snapshot(Utc::now().timestamp_millis());
    next.volume = 85;
    next.playback = None;
    bridge.save(&next).unwrap();
    writer.sync().await.unwrap();
    drop(bridge);

    let loaded = SessionBridge::new(SqliteStore::open(&path).await.unwrap())
        .load()
        .unwrap();
    assert_eq!(loaded, next);
}
