use std::time::{Duration, Instant};

/// A restartable one-shot deadline, polled from the host loop.
///
/// Restarting replaces the pending deadline, so a burst of triggers fires once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    due: Option<Instant>,
}

impl Timer {
    pub fn restart(&mut self, now: Instant, delay: Duration) {
        self.due = Some(now + delay);
    }

    pub fn due(&self) -> Option<Instant> {
        self.due
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of several optional deadlines, for hosts that sleep until the next one.
pub fn next_deadline(timers: &[&Timer]) -> Option<Instant> {
    timers.iter().filter_map(|t| t.due()).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let start = Instant::now();
        let mut timer = Timer::default();
        timer.restart(start, Duration::from_millis(100));
        assert!(!timer.fire(start + Duration::from_millis(50)));
        assert!(timer.fire(start + Duration::from_millis(100)));
        assert!(!timer.fire(start + Duration::from_millis(200)));
    }

    #[test]
    fn test_restart_pushes_deadline_back() {
        let start = Instant::now();
        let mut timer = Timer::default();
        timer.restart(start, Duration::from_secs(3));
        timer.restart(start + Duration::from_secs(2), Duration::from_secs(3));
        assert!(!timer.fire(start + Duration::from_secs(4)));
        assert!(timer.fire(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_next_deadline_picks_earliest() {
        let start = Instant::now();
        let mut a = Timer::default();
        let mut b = Timer::default();
        let idle = Timer::default();
        a.restart(start, Duration::from_secs(5));
        b.restart(start, Duration::from_secs(1));
        assert_eq!(
            next_deadline(&[&a, &b, &idle]),
            Some(start + Duration::from_secs(1))
        );
        assert_eq!(next_deadline(&[&idle]), None);
    }
}
