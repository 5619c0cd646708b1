use std::time::Duration;

/// Identifies one armed quiet-period timer. Later timers compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub(crate) u64);

impl TimerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A single-slot timer backend.
///
/// `arm` always refers to a fresh [`TimerId`]; a backend that cannot truly cancel may let
/// old timers fire, since the change tracker ignores any id it did not arm last.
pub trait Scheduler {
    fn arm(&mut self, timer: TimerId, delay: Duration);
    fn disarm(&mut self, timer: TimerId);
}

/// A virtual clock for tests and poll-driven hosts.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Duration,
    armed: Option<(TimerId, Duration)>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on this clock since it was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.armed.map(|(timer, _)| timer)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.armed.map(|(_, deadline)| deadline)
    }

    /// Move the clock forward, returning the timer that came due, if any.
    pub fn advance(&mut self, by: Duration) -> Option<TimerId> {
        self.now += by;
        match self.armed {
            Some((timer, deadline)) if deadline <= self.now => {
                self.armed = None;
                Some(timer)
            }
            _ => None,
        }
    }
}

impl Scheduler for ManualClock {
    fn arm(&mut self, timer: TimerId, delay: Duration) {
        self.armed = Some((timer, self.now + delay));
    }

    fn disarm(&mut self, timer: TimerId) {
        if self.pending() == Some(timer) {
            self.armed = None;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerRequest {
    Arm { timer: TimerId, delay: Duration },
    Disarm { timer: TimerId },
}

/// Records the latest request for an event-loop host to turn into a real timer.
#[derive(Clone, Debug, Default)]
pub struct QueuedScheduler {
    request: Option<TimerRequest>,
}

impl QueuedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Option<TimerRequest> {
        self.request.take()
    }

    pub fn peek(&self) -> Option<&TimerRequest> {
        self.request.as_ref()
    }
}

impl Scheduler for QueuedScheduler {
    fn arm(&mut self, timer: TimerId, delay: Duration) {
        self.request = Some(TimerRequest::Arm { timer, delay });
    }

    fn disarm(&mut self, timer: TimerId) {
        self.request = Some(TimerRequest::Disarm { timer });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_fires_once_at_deadline() {
        let mut clock = ManualClock::new();
        clock.arm(TimerId(1), Duration::from_millis(2000));

        assert_eq!(clock.advance(Duration::from_millis(1999)), None);
        assert_eq!(clock.advance(Duration::from_millis(1)), Some(TimerId(1)));
        assert_eq!(clock.advance(Duration::from_millis(5000)), None);
    }

    #[test]
    fn manual_clock_rearm_replaces_pending_timer() {
        let mut clock = ManualClock::new();
        clock.arm(TimerId(1), Duration::from_millis(100));
        clock.advance(Duration::from_millis(50));
        clock.arm(TimerId(2), Duration::from_millis(100));

        assert_eq!(clock.advance(Duration::from_millis(60)), None);
        assert_eq!(clock.advance(Duration::from_millis(40)), Some(TimerId(2)));
    }

    #[test]
    fn manual_clock_ignores_disarm_of_stale_timer() {
        let mut clock = ManualClock::new();
        clock.arm(TimerId(2), Duration::from_millis(10));
        clock.disarm(TimerId(1));
        assert_eq!(clock.pending(), Some(TimerId(2)));

        clock.disarm(TimerId(2));
        assert_eq!(clock.pending(), None);
    }

    #[test]
    fn queued_scheduler_keeps_latest_request() {
        let mut queue = QueuedScheduler::new();
        queue.arm(TimerId(1), Duration::from_millis(10));
        queue.disarm(TimerId(1));
        queue.arm(TimerId(2), Duration::from_millis(10));

        assert_eq!(
            queue.take(),
            Some(TimerRequest::Arm {
                timer: TimerId(2),
                delay: Duration::from_millis(10),
            })
        );
        assert_eq!(queue.take(), None);
    }
}
