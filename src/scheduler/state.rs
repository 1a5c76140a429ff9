//! Throttle and mutual-exclusion state of the scheduler.

use std::time::Duration;
use tokio::time::Instant;

/// Identifies one dispatched validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptId(u64);

/// Why a tick did or did not go ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Capture and dispatch.
    Proceed,
    /// A request is already outstanding.
    InFlight,
    /// The previous attempt is closer than the minimum gap.
    Throttled,
    /// The camera is off.
    Inactive,
}

/// Scheduler state. Only the scheduler mutates it.
///
/// `in_flight` is the mutual-exclusion flag: it is set when a frame is
/// dispatched and cleared when that attempt completes. Deactivation
/// clears both `in_flight` and `last_attempt_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerState {
    active: bool,
    in_flight: bool,
    last_attempt_at: Option<Instant>,
    attempts: u64,
    current: Option<AttemptId>,
}

impl SchedulerState {
    /// Inactive, idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the camera is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a request is outstanding.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Tick time of the last dispatched attempt; `None` after deactivation.
    pub fn last_attempt_at(&self) -> Option<Instant> {
        self.last_attempt_at
    }

    /// Total attempts dispatched since creation.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Decides whether a tick at `now` may capture and dispatch.
    pub fn admit(&self, now: Instant, min_gap: Duration) -> Admission {
        if !self.active {
            return Admission::Inactive;
        }
        if self.in_flight {
            return Admission::InFlight;
        }
        match self.last_attempt_at {
            Some(last) if now.saturating_duration_since(last) < min_gap => Admission::Throttled,
            _ => Admission::Proceed,
        }
    }

    /// Marks the camera active.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Marks the camera inactive and clears the in-flight slot and the throttle.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.in_flight = false;
        self.last_attempt_at = None;
        self.current = None;
    }

    /// Marks a request as dispatched for the tick at `tick_at`.
    ///
    /// The throttle is measured from the tick that admitted the attempt,
    /// not from the end of the capture delay.
    pub fn begin_attempt(&mut self, tick_at: Instant) -> AttemptId {
        self.attempts += 1;
        let id = AttemptId(self.attempts);
        self.in_flight = true;
        self.last_attempt_at = Some(tick_at);
        self.current = Some(id);
        id
    }

    /// Releases the in-flight slot held by `id`.
    ///
    /// A completion from an attempt dispatched before the last
    /// deactivation does not release a newer attempt's slot. Returns
    /// whether the slot was released.
    pub fn complete(&mut self, id: AttemptId) -> bool {
        if self.current != Some(id) {
            return false;
        }
        self.current = None;
        self.in_flight = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GAP: Duration = Duration::from_millis(3000);

    fn active() -> SchedulerState {
        let mut state = SchedulerState::new();
        state.activate();
        state
    }

    #[test]
    fn test_inactive_never_admits() {
        let state = SchedulerState::new();
        assert_eq!(state.admit(Instant::now(), GAP), Admission::Inactive);
    }

    #[test]
    fn test_first_tick_proceeds() {
        let state = active();
        assert_eq!(state.admit(Instant::now(), GAP), Admission::Proceed);
    }

    #[test]
    fn test_in_flight_blocks() {
        let mut state = active();
        let t0 = Instant::now();
        state.begin_attempt(t0);

        // Even long after the gap, an outstanding request blocks the tick
        assert_eq!(
            state.admit(t0 + Duration::from_secs(60), GAP),
            Admission::InFlight
        );
    }

    #[test]
    fn test_throttle_gap() {
        let mut state = active();
        let t0 = Instant::now();
        let id = state.begin_attempt(t0);
        assert!(state.complete(id));

        assert_eq!(
            state.admit(t0 + Duration::from_millis(2999), GAP),
            Admission::Throttled
        );
        assert_eq!(
            state.admit(t0 + Duration::from_millis(3000), GAP),
            Admission::Proceed
        );
    }

    #[test]
    fn test_deactivate_resets_throttle() {
        let mut state = active();
        let t0 = Instant::now();
        state.begin_attempt(t0);

        state.deactivate();
        assert!(!state.in_flight());
        assert!(state.last_attempt_at().is_none());

        state.activate();
        assert_eq!(state.admit(t0, GAP), Admission::Proceed);
    }

    #[test]
    fn test_stale_completion_keeps_newer_slot() {
        let mut state = active();
        let t0 = Instant::now();
        let stale = state.begin_attempt(t0);

        state.deactivate();
        state.activate();
        let fresh = state.begin_attempt(t0 + Duration::from_secs(5));

        assert!(!state.complete(stale));
        assert!(state.in_flight());
        assert!(state.complete(fresh));
        assert!(!state.in_flight());
    }

    proptest! {
        /// Steps are (ms since previous tick, whether the outstanding request finishes first).
        #[test]
        fn admitted_attempts_never_overlap_or_crowd(
            steps in proptest::collection::vec((0u64..8000, any::<bool>()), 1..64)
        ) {
            let mut state = active();
            let mut now = Instant::now();
            let mut outstanding: Option<AttemptId> = None;
            let mut dispatched: Vec<Instant> = Vec::new();

            for (advance, finishes) in steps {
                now += Duration::from_millis(advance);
                if finishes {
                    if let Some(id) = outstanding.take() {
                        prop_assert!(state.complete(id));
                    }
                }
                if state.admit(now, GAP) == Admission::Proceed {
                    prop_assert!(outstanding.is_none());
                    outstanding = Some(state.begin_attempt(now));
                    dispatched.push(now);
                }
            }

            for pair in dispatched.windows(2) {
                prop_assert!(pair[1] - pair[0] >= GAP);
            }
        }
    }
}
