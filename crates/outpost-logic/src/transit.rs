//! Transit lifecycle — planned, in transit, arrived, canceled.
//!
//! The macro-state of a transport or mission. Transitions are monotonic
//! (`Planned → InTransit → Arrived`) except for cancellation, which is
//! reachable from either non-terminal state and is itself terminal.
//! Classification from a schedule never yields `Arrived`: arrival is
//! always the result of an explicit timer callback, so a process loaded
//! with a past-arrival schedule shows `InTransit` until its callback
//! fires.

use serde::{Deserialize, Serialize};

/// Macro lifecycle of a staged process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitState {
    Planned,
    InTransit,
    Arrived,
    Canceled,
}

impl TransitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransitState::Arrived | TransitState::Canceled)
    }

    /// Whether a transition from `self` to `to` respects the lifecycle.
    pub fn can_transition(&self, to: TransitState) -> bool {
        use TransitState::*;
        matches!(
            (self, to),
            (Planned, InTransit) | (InTransit, Arrived) | (Planned, Canceled) | (InTransit, Canceled)
        )
    }
}

/// Launch and arrival timestamps, in pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitSchedule {
    pub launch_pulse: u64,
    pub arrival_pulse: u64,
}

impl TransitSchedule {
    /// Derive a schedule from a target arrival time: launch is arrival
    /// minus the average transit duration (saturating at zero).
    pub fn from_arrival(arrival_pulse: u64, transit_pulses: u64) -> Self {
        Self {
            launch_pulse: arrival_pulse.saturating_sub(transit_pulses),
            arrival_pulse,
        }
    }

    /// Classify the macro-state at `now`. Supports retroactive
    /// initialization: a schedule whose launch has already passed
    /// classifies as in transit, never as arrived.
    pub fn classify(&self, now: u64) -> TransitState {
        if now < self.launch_pulse {
            TransitState::Planned
        } else {
            TransitState::InTransit
        }
    }

    /// The next timestamp a timer should fire at for the given state:
    /// launch while planned, arrival while in transit, nothing afterward.
    pub fn next_event(&self, state: TransitState) -> Option<u64> {
        match state {
            TransitState::Planned => Some(self.launch_pulse),
            TransitState::InTransit => Some(self.arrival_pulse),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_derived_from_arrival() {
        // Arrival 500 pulses out, average transit 250: launch at 250.
        let sched = TransitSchedule::from_arrival(500, 250);
        assert_eq!(sched.launch_pulse, 250);
        assert_eq!(sched.classify(0), TransitState::Planned);
    }

    #[test]
    fn launch_saturates_at_zero() {
        let sched = TransitSchedule::from_arrival(100, 250);
        assert_eq!(sched.launch_pulse, 0);
    }

    #[test]
    fn classification_windows() {
        let sched = TransitSchedule::from_arrival(500, 250);
        assert_eq!(sched.classify(249), TransitState::Planned);
        assert_eq!(sched.classify(250), TransitState::InTransit);
        assert_eq!(sched.classify(499), TransitState::InTransit);
        // Past-arrival never auto-arrives; that takes the timer callback.
        assert_eq!(sched.classify(10_000), TransitState::InTransit);
    }

    #[test]
    fn next_event_per_state() {
        let sched = TransitSchedule::from_arrival(500, 250);
        assert_eq!(sched.next_event(TransitState::Planned), Some(250));
        assert_eq!(sched.next_event(TransitState::InTransit), Some(500));
        assert_eq!(sched.next_event(TransitState::Arrived), None);
        assert_eq!(sched.next_event(TransitState::Canceled), None);
    }

    #[test]
    fn transitions_monotonic_except_cancel() {
        use TransitState::*;
        assert!(Planned.can_transition(InTransit));
        assert!(InTransit.can_transition(Arrived));
        assert!(Planned.can_transition(Canceled));
        assert!(InTransit.can_transition(Canceled));

        assert!(!InTransit.can_transition(Planned));
        assert!(!Arrived.can_transition(Canceled));
        assert!(!Canceled.can_transition(InTransit));
        assert!(!Planned.can_transition(Arrived));
    }

    #[test]
    fn terminal_states() {
        assert!(TransitState::Arrived.is_terminal());
        assert!(TransitState::Canceled.is_terminal());
        assert!(!TransitState::Planned.is_terminal());
        assert!(!TransitState::InTransit.is_terminal());
    }
}
