use std::time::Duration;

use tokio::time::Instant;

use crate::probe::Classification;

/// One confirmed move between states, ready to be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: Classification,
    /// Time spent in `from` before the change was confirmed.
    pub held: Duration,
    pub to: Classification,
}

/// Debounces a per-second stream of classifications into confirmed
/// transitions.
///
/// A classification that differs from the confirmed state becomes a pending
/// candidate. It is confirmed once it has persisted for the debounce window;
/// returning to the confirmed state before then cancels it, and switching to
/// a different candidate restarts the clock. The tracker never looks at a
/// wall clock itself; callers pass `now` in, which keeps every decision
/// testable.
#[derive(Debug)]
pub struct Tracker {
    confirmed: Classification,
    pending: Option<(Classification, Instant)>,
    state_start: Instant,
    window: Duration,
}

impl Tracker {
    /// Starts tracking with the first observed classification already
    /// confirmed.
    #[must_use]
    pub fn new(initial: Classification, now: Instant, window: Duration) -> Self {
        Self {
            confirmed: initial,
            pending: None,
            state_start: now,
            window,
        }
    }

    /// Feeds one tick's classification. Returns the transition when a
    /// candidate crosses the debounce window, `None` otherwise.
    pub fn observe(&mut self, seen: Classification, now: Instant) -> Option<Transition> {
        if seen == self.confirmed {
            // Back to the confirmed state: the flap never happened.
            self.pending = None;
            return None;
        }

        match &self.pending {
            Some((candidate, since)) if *candidate == seen => {
                if now.duration_since(*since) >= self.window {
                    let held = now.duration_since(self.state_start);
                    let from = std::mem::replace(&mut self.confirmed, seen);
                    self.state_start = now;
                    self.pending = None;
                    return Some(Transition {
                        from,
                        held,
                        to: self.confirmed.clone(),
                    });
                }
                None
            }
            // New candidate, or a switch between candidates: the
            // confirmation clock starts over.
            _ => {
                self.pending = Some((seen, now));
                None
            }
        }
    }

    /// Final transition at shutdown. Bypasses the debounce window; a pending
    /// candidate is discarded, not confirmed.
    #[must_use]
    pub fn finish(self, now: Instant) -> Transition {
        Transition {
            from: self.confirmed,
            held: now.duration_since(self.state_start),
            to: Classification::Stopped,
        }
    }

    #[must_use]
    pub fn confirmed(&self) -> &Classification {
        &self.confirmed
    }

    /// When the confirmed state was entered. Display code derives elapsed
    /// time from this; it never sees a pending candidate.
    #[must_use]
    pub fn state_start(&self) -> Instant {
        self.state_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Classification::{Online, Refused, Timeout};

    const SEC: Duration = Duration::from_secs(1);

    /// Runs one classification per second through a fresh tracker, returning
    /// every confirmed transition.
    fn drive(initial: Classification, window: u64, ticks: &[Classification]) -> Vec<Transition> {
        let start = Instant::now();
        let mut tracker = Tracker::new(initial, start, Duration::from_secs(window));
        ticks
            .iter()
            .enumerate()
            .filter_map(|(i, c)| tracker.observe(c.clone(), start + SEC * (i as u32 + 1)))
            .collect()
    }

    #[test]
    fn steady_state_emits_nothing() {
        let steady = vec![Online; 30];
        assert!(drive(Online, 2, &steady).is_empty());
    }

    #[test]
    fn change_confirms_after_window() {
        // Timeout appears at tick 3 and persists; window of 2 s means the
        // confirmation lands two ticks later.
        let transitions = drive(
            Online,
            2,
            &[Online, Online, Timeout, Timeout, Timeout, Timeout],
        );
        assert_eq!(
            transitions,
            vec![Transition {
                from: Online,
                held: 5 * SEC,
                to: Timeout,
            }]
        );
    }

    #[test]
    fn recovery_needs_its_own_window() {
        // The trailing Online does not persist, so only the outage is
        // confirmed.
        let transitions = drive(
            Online,
            2,
            &[Online, Online, Timeout, Timeout, Timeout, Online],
        );
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to, Timeout);
    }

    #[test]
    fn short_flap_is_suppressed() {
        let transitions = drive(Online, 2, &[Timeout, Timeout, Online, Online, Online]);
        assert!(transitions.is_empty());
    }

    #[test]
    fn return_to_confirmed_resets_the_candidate_clock() {
        // The second Timeout burst must survive the full window on its own;
        // no credit carries over from the first.
        let transitions = drive(
            Online,
            2,
            &[Timeout, Timeout, Online, Timeout, Timeout, Timeout],
        );
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to, Timeout);
    }

    #[test]
    fn candidate_switch_restarts_the_clock() {
        // Timeout nearly confirms, then Refused takes over as the candidate
        // and must wait out its own window.
        let transitions = drive(
            Online,
            2,
            &[Timeout, Timeout, Refused, Refused, Refused, Refused],
        );
        assert_eq!(
            transitions,
            vec![Transition {
                from: Online,
                held: 5 * SEC,
                to: Refused,
            }]
        );
    }

    #[test]
    fn zero_window_confirms_on_the_next_tick() {
        let transitions = drive(Online, 0, &[Timeout, Timeout, Online, Online]);
        assert_eq!(transitions.len(), 2);
        assert_eq!(
            transitions[0],
            Transition {
                from: Online,
                held: 2 * SEC,
                to: Timeout,
            }
        );
        assert_eq!(
            transitions[1],
            Transition {
                from: Timeout,
                held: 2 * SEC,
                to: Online,
            }
        );
    }

    #[test]
    fn window_boundary_is_closed() {
        let start = Instant::now();
        let mut tracker = Tracker::new(Online, start, Duration::from_secs(2));
        assert_eq!(tracker.observe(Timeout, start + SEC), None);
        // Exactly window seconds after the candidate appeared.
        let confirmed = tracker.observe(Timeout, start + 3 * SEC);
        assert_eq!(confirmed.map(|t| t.to), Some(Timeout));
    }

    #[test]
    fn finish_discards_a_pending_candidate() {
        let start = Instant::now();
        let mut tracker = Tracker::new(Online, start, Duration::from_secs(5));
        assert_eq!(tracker.observe(Timeout, start + SEC), None);
        assert_eq!(tracker.observe(Timeout, start + 2 * SEC), None);

        let last = tracker.finish(start + 3 * SEC);
        assert_eq!(
            last,
            Transition {
                from: Online,
                held: 3 * SEC,
                to: Classification::Stopped,
            }
        );
    }

    #[test]
    fn display_state_ignores_pending_candidates() {
        let start = Instant::now();
        let mut tracker = Tracker::new(Online, start, Duration::from_secs(10));
        tracker.observe(Timeout, start + SEC);
        assert_eq!(*tracker.confirmed(), Online);
        assert_eq!(tracker.state_start(), start);
    }

    #[test]
    fn duration_spans_the_whole_confirmed_state() {
        // Held time runs from confirmation to confirmation, not from when
        // the candidate first appeared.
        let start = Instant::now();
        let mut tracker = Tracker::new(Online, start, Duration::from_secs(1));
        for i in 1..=9 {
            assert_eq!(tracker.observe(Online, start + SEC * i), None);
        }
        assert_eq!(tracker.observe(Timeout, start + 10 * SEC), None);
        let t = tracker.observe(Timeout, start + 11 * SEC).unwrap();
        assert_eq!(t.held, 11 * SEC);
    }
}
