//! Live engine handle paired with the track it plays

use crate::engine::{EngineEventKind, EngineHandle, HandleId};
use crate::error::Result;
use radio_core::Track;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loading,
    Ready,
    Failed,
    Ended,
}

/// Engine handle owned by the orchestrator.
///
/// Carries its [`Track`] so a promoted preload never has to be looked up by
/// URL. Filters engine events that arrive out of order, and releases the
/// inner handle exactly once, on drop at the latest.
pub(crate) struct LiveHandle<H: EngineHandle> {
    id: HandleId,
    track: Track,
    inner: H,
    alternate: bool,
    phase: Phase,
    started: bool,
    duration: Option<Duration>,
    released: bool,
}

impl<H: EngineHandle> LiveHandle<H> {
    pub(crate) fn new(id: HandleId, track: Track, inner: H, alternate: bool) -> Self {
        Self {
            id,
            track,
            inner,
            alternate,
            phase: Phase::Loading,
            started: false,
            duration: None,
            released: false,
        }
    }

    pub(crate) fn id(&self) -> HandleId {
        self.id
    }

    pub(crate) fn track(&self) -> &Track {
        &self.track
    }

    /// Whether this handle was loaded from the track's alternate URL
    pub(crate) fn is_alternate(&self) -> bool {
        self.alternate
    }

    pub(crate) fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub(crate) fn position(&self) -> Duration {
        if self.released {
            return Duration::ZERO;
        }
        let position = self.inner.position();
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Apply an engine event; `false` means the event must be ignored.
    pub(crate) fn accept(&mut self, kind: &EngineEventKind) -> bool {
        if self.released {
            return false;
        }

        match kind {
            EngineEventKind::Ready { duration } if self.phase == Phase::Loading => {
                self.phase = Phase::Ready;
                self.duration = Some(*duration);
                true
            }
            EngineEventKind::LoadFailed { .. }
                if matches!(self.phase, Phase::Loading | Phase::Ready) =>
            {
                self.phase = Phase::Failed;
                true
            }
            EngineEventKind::Started if self.phase == Phase::Ready => {
                self.started = true;
                true
            }
            EngineEventKind::Paused => self.phase == Phase::Ready && self.started,
            EngineEventKind::Ended if self.phase == Phase::Ready && self.started => {
                self.phase = Phase::Ended;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn play(&mut self) -> Result<()> {
        self.inner.play()
    }

    pub(crate) fn pause(&mut self) -> Result<()> {
        self.inner.pause()
    }

    pub(crate) fn seek(&mut self, position: Duration) -> Result<()> {
        self.inner.seek(position)
    }

    pub(crate) fn set_volume(&mut self, gain: f32) {
        if !self.released {
            self.inner.set_volume(gain);
        }
    }

    pub(crate) fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.inner.release();
            debug!(handle = self.id.0, track_id = %self.track.id, "Released handle");
        }
    }
}

impl<H: EngineHandle> Drop for LiveHandle<H> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandle {
        releases: Arc<AtomicUsize>,
    }

    impl EngineHandle for CountingHandle {
        fn play(&mut self) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self) -> Result<()> {
            Ok(())
        }
        fn seek(&mut self, _position: Duration) -> Result<()> {
            Ok(())
        }
        fn set_volume(&mut self, _gain: f32) {}
        fn position(&self) -> Duration {
            Duration::from_secs(500)
        }
        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn live(releases: &Arc<AtomicUsize>) -> LiveHandle<CountingHandle> {
        LiveHandle::new(
            HandleId(1),
            Track::new("English", "a", "https://music.example.com/audio/English/a.mp3"),
            CountingHandle {
                releases: Arc::clone(releases),
            },
            false,
        )
    }

    #[test]
    fn release_runs_once_including_drop() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut handle = live(&releases);
        handle.release();
        handle.release();
        drop(handle);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases() {
        let releases = Arc::new(AtomicUsize::new(0));
        drop(live(&releases));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ended_requires_start_and_fires_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut handle = live(&releases);

        assert!(!handle.accept(&EngineEventKind::Ended));
        assert!(!handle.accept(&EngineEventKind::Started));
        assert!(handle.accept(&EngineEventKind::Ready {
            duration: Duration::from_secs(180)
        }));
        assert!(!handle.accept(&EngineEventKind::Ended));
        assert!(handle.accept(&EngineEventKind::Started));
        assert!(handle.accept(&EngineEventKind::Paused));
        assert!(handle.accept(&EngineEventKind::Ended));
        assert!(!handle.accept(&EngineEventKind::Ended));
    }

    #[test]
    fn nothing_accepted_after_release() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut handle = live(&releases);
        handle.release();
        assert!(!handle.accept(&EngineEventKind::Ready {
            duration: Duration::from_secs(1)
        }));
        assert!(!handle.accept(&EngineEventKind::LoadFailed {
            reason: "late".into()
        }));
    }

    #[test]
    fn position_clamped_to_duration() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut handle = live(&releases);
        handle.accept(&EngineEventKind::Ready {
            duration: Duration::from_secs(180),
        });
        assert_eq!(handle.position(), Duration::from_secs(180));
    }
}
