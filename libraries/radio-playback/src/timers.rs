//! Deadline queue for the orchestrator's fixed timers

use crate::engine::HandleId;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    /// Preload the next track (first attempt or retry)
    Preload,
    /// Pick another track after the current one failed to load
    LoadRetry,
    /// Sample the playback position
    PositionPoll,
}

#[derive(Debug)]
struct Timer {
    kind: TimerKind,
    due: Instant,
    /// Handle the timer was scheduled for; the timer is stale once that
    /// handle is no longer current
    handle: Option<HandleId>,
}

/// At most one pending timer per kind.
#[derive(Debug, Default)]
pub(crate) struct Timers {
    pending: Vec<Timer>,
}

impl Timers {
    /// Schedule `kind`, replacing any pending timer of the same kind
    pub(crate) fn schedule(&mut self, kind: TimerKind, due: Instant, handle: Option<HandleId>) {
        self.cancel(kind);
        self.pending.push(Timer { kind, due, handle });
    }

    pub(crate) fn cancel(&mut self, kind: TimerKind) {
        self.pending.retain(|timer| timer.kind != kind);
    }

    /// Drop every timer tied to `handle`
    pub(crate) fn cancel_handle(&mut self, handle: HandleId) {
        self.pending.retain(|timer| timer.handle != Some(handle));
    }

    pub(crate) fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|timer| timer.kind == kind)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|timer| timer.due).min()
    }

    /// Remove and return the earliest timer due at `now`
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<(TimerKind, Option<HandleId>)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= now)
            .min_by_key(|(_, timer)| timer.due)
            .map(|(index, _)| index)?;

        let timer = self.pending.swap_remove(index);
        Some((timer.kind, timer.handle))
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pops_in_deadline_order() {
        let start = Instant::now();
        let mut timers = Timers::default();
        timers.schedule(TimerKind::PositionPoll, start + Duration::from_secs(1), Some(HandleId(1)));
        timers.schedule(TimerKind::Preload, start + Duration::from_millis(750), Some(HandleId(1)));

        assert_eq!(timers.next_deadline(), Some(start + Duration::from_millis(750)));
        assert!(timers.pop_due(start).is_none());

        let later = start + Duration::from_secs(2);
        assert_eq!(timers.pop_due(later), Some((TimerKind::Preload, Some(HandleId(1)))));
        assert_eq!(timers.pop_due(later), Some((TimerKind::PositionPoll, Some(HandleId(1)))));
        assert!(timers.pop_due(later).is_none());
    }

    #[test]
    fn schedule_replaces_same_kind() {
        let start = Instant::now();
        let mut timers = Timers::default();
        timers.schedule(TimerKind::Preload, start, None);
        timers.schedule(TimerKind::Preload, start + Duration::from_secs(1), None);

        assert_eq!(timers.next_deadline(), Some(start + Duration::from_secs(1)));
    }

    #[test]
    fn cancel_by_handle() {
        let start = Instant::now();
        let mut timers = Timers::default();
        timers.schedule(TimerKind::Preload, start, Some(HandleId(1)));
        timers.schedule(TimerKind::LoadRetry, start, None);
        timers.cancel_handle(HandleId(1));

        assert!(!timers.is_scheduled(TimerKind::Preload));
        assert!(timers.is_scheduled(TimerKind::LoadRetry));
    }
}
