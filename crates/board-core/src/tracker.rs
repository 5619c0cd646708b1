use std::time::{Duration, SystemTime};

use crate::config::AutoSaveConfig;
use crate::scheduler::{Scheduler, TimerId};

/// Issued when a flush starts; remembers which edits the flushed snapshot contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct FlushTicket {
    revision: u64,
}

impl FlushTicket {
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing changed and nothing has been saved yet.
    Clean,
    /// Dirty with a flush scheduled.
    Pending,
    /// Dirty with nothing scheduled (auto-save off, or re-enabled since the last edit).
    Unsaved,
    /// The last flush failed and the changes are still not persisted.
    Failed { message: String },
    Saved { at: SystemTime },
}

/// Dirty flag plus a single-slot debounce timer.
///
/// Every [`ChangeTracker::mark_changed`] disarms the pending timer and arms a new one, so a
/// burst of edits within the quiet interval produces exactly one flush, timed from the last
/// edit.
#[derive(Debug)]
pub struct ChangeTracker {
    quiet_interval: Duration,
    auto_save: bool,
    dirty: bool,
    revision: u64,
    next_timer: u64,
    pending: Option<TimerId>,
    last_saved_at: Option<SystemTime>,
    last_error: Option<String>,
}

impl ChangeTracker {
    pub fn new(config: AutoSaveConfig) -> Self {
        let config = config.with_defaults();
        Self {
            quiet_interval: config.quiet_interval,
            auto_save: config.enabled,
            dirty: false,
            revision: 0,
            next_timer: 0,
            pending: None,
            last_saved_at: None,
            last_error: None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_auto_save_enabled(&self) -> bool {
        self.auto_save
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet_interval
    }

    pub fn last_saved_at(&self) -> Option<SystemTime> {
        self.last_saved_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    /// Number of changes recorded so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_changed(&mut self, scheduler: &mut impl Scheduler) {
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
        if !self.auto_save {
            return;
        }

        self.cancel_pending(scheduler);
        self.next_timer = self.next_timer.wrapping_add(1);
        let timer = TimerId(self.next_timer);
        tracing::trace!(timer = timer.get(), delay = ?self.quiet_interval, "arm autosave");
        scheduler.arm(timer, self.quiet_interval);
        self.pending = Some(timer);
    }

    /// Turning auto-save off disarms the pending timer without flushing. Turning it back on
    /// schedules nothing; the next change does.
    pub fn set_auto_save_enabled(&mut self, enabled: bool, scheduler: &mut impl Scheduler) {
        self.auto_save = enabled;
        if !enabled {
            self.cancel_pending(scheduler);
        }
    }

    /// Consume a timer firing. Returns `true` when `timer` is the one currently armed.
    pub fn take_due(&mut self, timer: TimerId) -> bool {
        if self.pending == Some(timer) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn begin_flush(&mut self, scheduler: &mut impl Scheduler) -> FlushTicket {
        self.cancel_pending(scheduler);
        FlushTicket {
            revision: self.revision,
        }
    }

    /// Record a successful flush. Returns whether the tracker is clean afterwards, which is
    /// only the case when no change happened after `ticket` was issued.
    pub fn record_success(&mut self, ticket: FlushTicket, at: SystemTime) -> bool {
        self.last_saved_at = Some(at);
        self.last_error = None;
        if ticket.revision == self.revision {
            self.dirty = false;
        }
        !self.dirty
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn status(&self) -> SaveStatus {
        if self.dirty {
            if let Some(message) = self.last_error.as_ref() {
                SaveStatus::Failed {
                    message: message.clone(),
                }
            } else if self.pending.is_some() {
                SaveStatus::Pending
            } else {
                SaveStatus::Unsaved
            }
        } else if let Some(at) = self.last_saved_at {
            SaveStatus::Saved { at }
        } else {
            SaveStatus::Clean
        }
    }

    fn cancel_pending(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(timer) = self.pending.take() {
            tracing::trace!(timer = timer.get(), "disarm autosave");
            scheduler.disarm(timer);
        }
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new(AutoSaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualClock;

    const QUIET: Duration = Duration::from_millis(2000);

    fn tracker() -> (ChangeTracker, ManualClock) {
        let config = AutoSaveConfig::default().quiet_interval(QUIET);
        (ChangeTracker::new(config), ManualClock::new())
    }

    #[test]
    fn burst_of_changes_arms_one_timer_from_the_last_change() {
        let (mut tracker, mut clock) = tracker();

        for _ in 0..5 {
            tracker.mark_changed(&mut clock);
            assert_eq!(clock.advance(Duration::from_millis(100)), None);
        }

        // Last change at 400ms; deadline is 2400ms.
        assert_eq!(clock.deadline(), Some(Duration::from_millis(2400)));
        assert_eq!(clock.advance(Duration::from_millis(1899)), None);
        let fired = clock.advance(Duration::from_millis(1));
        assert_eq!(fired, tracker.pending_timer());
        assert!(tracker.take_due(fired.unwrap()));
        assert_eq!(tracker.pending_timer(), None);
    }

    #[test]
    fn stale_timer_is_not_due() {
        let (mut tracker, mut clock) = tracker();
        tracker.mark_changed(&mut clock);
        let first = tracker.pending_timer().unwrap();
        tracker.mark_changed(&mut clock);

        assert!(!tracker.take_due(first));
        assert!(tracker.pending_timer().is_some());
    }

    #[test]
    fn success_clears_dirty_only_for_latest_revision() {
        let (mut tracker, mut clock) = tracker();
        tracker.mark_changed(&mut clock);
        let ticket = tracker.begin_flush(&mut clock);
        tracker.mark_changed(&mut clock);

        assert!(!tracker.record_success(ticket, SystemTime::now()));
        assert!(tracker.is_dirty());
        assert!(tracker.last_saved_at().is_some());

        let ticket = tracker.begin_flush(&mut clock);
        assert!(tracker.record_success(ticket, SystemTime::now()));
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn failure_keeps_dirty_and_reports_failed() {
        let (mut tracker, mut clock) = tracker();
        tracker.mark_changed(&mut clock);
        let _ticket = tracker.begin_flush(&mut clock);
        tracker.record_failure("disk full");

        assert!(tracker.is_dirty());
        assert_eq!(
            tracker.status(),
            SaveStatus::Failed {
                message: "disk full".to_string()
            }
        );
    }

    #[test]
    fn disabling_auto_save_disarms_without_flushing() {
        let (mut tracker, mut clock) = tracker();
        tracker.mark_changed(&mut clock);
        tracker.set_auto_save_enabled(false, &mut clock);

        assert_eq!(clock.pending(), None);
        assert_eq!(tracker.status(), SaveStatus::Unsaved);

        tracker.mark_changed(&mut clock);
        assert_eq!(clock.pending(), None);
    }

    #[test]
    fn re_enabling_auto_save_while_dirty_schedules_nothing() {
        let (mut tracker, mut clock) = tracker();
        tracker.set_auto_save_enabled(false, &mut clock);
        tracker.mark_changed(&mut clock);
        tracker.set_auto_save_enabled(true, &mut clock);

        assert!(tracker.is_dirty());
        assert_eq!(clock.pending(), None);

        tracker.mark_changed(&mut clock);
        assert!(clock.pending().is_some());
    }

    #[test]
    fn status_progression() {
        let (mut tracker, mut clock) = tracker();
        assert_eq!(tracker.status(), SaveStatus::Clean);

        tracker.mark_changed(&mut clock);
        assert_eq!(tracker.status(), SaveStatus::Pending);

        let ticket = tracker.begin_flush(&mut clock);
        let at = SystemTime::now();
        tracker.record_success(ticket, at);
        assert_eq!(tracker.status(), SaveStatus::Saved { at });
    }
}
