//! Staged processes — missions and transports advancing through ordered
//! work phases, wrapped in the transit macro state machine.
//!
//! The transit state (`Planned → InTransit → Arrived`, `Canceled` from
//! either non-terminal state) is driven entirely by timer callbacks: the
//! process never re-registers itself, it returns a [`TimerOutcome`] and
//! the owner's [`TimerQueue`](crate::events::TimerQueue) does the
//! bookkeeping. Stage work is separate from the macro state and is fed
//! by per-pulse [`WorkerContribution`]s; a stage that cannot progress
//! reports blocked, and the owner retries next pulse until the retry
//! policy declares the process stalled.

use serde::{Deserialize, Serialize};

use outpost_logic::manifest::{estimate_trip_sols, travel_manifest, TripManifest};
use outpost_logic::transit::{TransitSchedule, TransitState};

use crate::events::TimerQueue;

pub type ProcessId = u32;

/// What a timer callback wants done next. The timer queue owns all
/// registration; the process only reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Fire again at the given pulse.
    Reschedule(u64),
    /// No further callbacks wanted.
    Done,
}

/// How long the owner keeps retrying a blocked stage before giving up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_consecutive_blocked: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_blocked: 100,
        }
    }
}

/// Owner-facing verdict on a process's progress. The process itself
/// never aborts; the owner decides what to do with a stalled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessHealth {
    Nominal,
    Stalled,
}

/// Has the resource manifest been cleared for stage work?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestClearance {
    Unchecked,
    Satisfied,
    Waived,
}

/// One pulse of effort from one worker.
#[derive(Debug, Clone, Copy)]
pub struct WorkerContribution {
    pub worker_id: u32,
    pub effort: f64,
    pub can_operate_rover: bool,
    /// Distance covered this pulse when operating a conveyance.
    pub drive_km: f64,
}

/// One phase of a staged process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stage {
    /// Drive a conveyance toward a destination. Exactly one operator at
    /// a time; other contributors ride along.
    Travel {
        description: String,
        distance_km: f64,
        traveled_km: f64,
        tolerance_km: f64,
        operator: Option<u32>,
    },
    /// Wait for a headcount to assemble.
    Rendezvous {
        description: String,
        required: u32,
        present: u32,
    },
    /// Accumulate effort until a threshold.
    GenericWork {
        description: String,
        required_effort: f64,
        progress: f64,
    },
}

impl Stage {
    pub fn description(&self) -> &str {
        match self {
            Stage::Travel { description, .. }
            | Stage::Rendezvous { description, .. }
            | Stage::GenericWork { description, .. } => description,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            Stage::Travel {
                distance_km,
                traveled_km,
                tolerance_km,
                ..
            } => distance_km - traveled_km <= *tolerance_km,
            Stage::Rendezvous {
                required, present, ..
            } => present >= required,
            Stage::GenericWork {
                required_effort,
                progress,
                ..
            } => progress >= required_effort,
        }
    }

    /// Apply one worker's contribution. Returns whether work was
    /// assigned this call; `false` means blocked, retry next pulse.
    fn execute(&mut self, worker: &WorkerContribution) -> bool {
        match self {
            Stage::Travel {
                distance_km,
                traveled_km,
                tolerance_km,
                operator,
                ..
            } => {
                if *distance_km - *traveled_km <= *tolerance_km {
                    // Within tolerance of the destination: finalize and
                    // release the conveyance.
                    *traveled_km = *distance_km;
                    *operator = None;
                    return true;
                }
                match *operator {
                    Some(op) if op == worker.worker_id => {
                        *traveled_km = (*traveled_km + worker.drive_km).min(*distance_km);
                        true
                    }
                    Some(_) => true,
                    None if worker.can_operate_rover => {
                        *operator = Some(worker.worker_id);
                        *traveled_km = (*traveled_km + worker.drive_km).min(*distance_km);
                        true
                    }
                    None => false,
                }
            }
            Stage::Rendezvous { present, .. } => {
                *present += 1;
                true
            }
            Stage::GenericWork { progress, .. } => {
                *progress += worker.effort.max(0.0);
                true
            }
        }
    }
}

/// A mission, resupply, or transport item advancing through ordered
/// stages toward completion or cancellation.
pub struct StagedProcess {
    id: ProcessId,
    name: String,
    stages: Vec<Stage>,
    current: usize,
    state: TransitState,
    schedule: Option<TransitSchedule>,
    manifest: TripManifest,
    clearance: ManifestClearance,
    retry: RetryPolicy,
    blocked_streak: u32,
}

impl StagedProcess {
    /// Build a process. The trip manifest is computed up front, additive
    /// across every travel stage, scaled by trip distance and headcount.
    pub fn new(id: ProcessId, name: impl Into<String>, stages: Vec<Stage>, crew: u32) -> Self {
        let mut manifest = TripManifest::new();
        for stage in &stages {
            if let Stage::Travel { distance_km, .. } = stage {
                let duration = estimate_trip_sols(*distance_km);
                manifest.merge(&travel_manifest(*distance_km, crew, duration));
            }
        }
        let clearance = if manifest.is_empty() {
            ManifestClearance::Satisfied
        } else {
            ManifestClearance::Unchecked
        };
        Self {
            id,
            name: name.into(),
            stages,
            current: 0,
            state: TransitState::Planned,
            schedule: None,
            manifest,
            clearance,
            retry: RetryPolicy::default(),
            blocked_streak: 0,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TransitState {
        self.state
    }

    pub fn schedule(&self) -> Option<&TransitSchedule> {
        self.schedule.as_ref()
    }

    pub fn manifest(&self) -> &TripManifest {
        &self.manifest
    }

    pub fn clearance(&self) -> ManifestClearance {
        self.clearance
    }

    /// Description of the stage currently being worked, if any remain.
    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.get(self.current)
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.stages.len()
    }

    pub fn health(&self) -> ProcessHealth {
        if self.blocked_streak >= self.retry.max_consecutive_blocked {
            ProcessHealth::Stalled
        } else {
            ProcessHealth::Nominal
        }
    }

    /// Set the arrival pulse; the launch pulse is derived by backing off
    /// the average transit duration. The current state is classified
    /// against `now`, so a process restored with a launch already in the
    /// past comes up mid-transit, never auto-arrived. Registers the next
    /// timer event, if the state has one.
    pub fn set_arrival(
        &mut self,
        arrival_pulse: u64,
        transit_pulses: u64,
        now: u64,
        timers: &mut TimerQueue,
    ) {
        if self.state.is_terminal() {
            return;
        }
        let schedule = TransitSchedule::from_arrival(arrival_pulse, transit_pulses);
        self.state = schedule.classify(now);
        if let Some(at) = schedule.next_event(self.state) {
            timers.schedule(self.id, at);
        }
        self.schedule = Some(schedule);
    }

    /// Timer callback: perform exactly one transition per firing and
    /// report what the queue should do next. Firing on a terminal
    /// process is a no-op.
    pub fn on_timer(&mut self, _now: u64) -> TimerOutcome {
        let schedule = match &self.schedule {
            Some(s) => *s,
            None => return TimerOutcome::Done,
        };
        match self.state {
            TransitState::Planned => {
                self.state = TransitState::InTransit;
                TimerOutcome::Reschedule(schedule.arrival_pulse)
            }
            TransitState::InTransit => {
                self.state = TransitState::Arrived;
                TimerOutcome::Done
            }
            TransitState::Arrived | TransitState::Canceled => TimerOutcome::Done,
        }
    }

    /// Cancel the process. Idempotent: canceling an already-terminal
    /// process does nothing, and the scheduled callback is deregistered
    /// exactly once so it can never fire into a canceled process.
    pub fn cancel(&mut self, timers: &mut TimerQueue) {
        if self.state.is_terminal() {
            return;
        }
        self.state = TransitState::Canceled;
        timers.cancel(self.id);
    }

    /// Check mandatory manifest quantities against available storage.
    /// Passing marks the manifest satisfied; stage work stays gated
    /// until then.
    pub fn preflight(&mut self, available: impl Fn(u8) -> f64) -> bool {
        if self.clearance != ManifestClearance::Unchecked {
            return true;
        }
        let ok = self
            .manifest
            .mandatory()
            .iter()
            .all(|(&resource, &kg)| available(resource) >= kg);
        if ok {
            self.clearance = ManifestClearance::Satisfied;
        }
        ok
    }

    /// Explicitly waive the manifest requirement.
    pub fn waive_manifest(&mut self) {
        if self.clearance == ManifestClearance::Unchecked {
            self.clearance = ManifestClearance::Waived;
        }
    }

    /// Apply one worker's contribution to the current stage. Returns
    /// whether work was assigned; a canceled process, an uncleared
    /// manifest, or a blocked stage all report `false`.
    pub fn execute(&mut self, worker: &WorkerContribution) -> bool {
        if self.state == TransitState::Canceled || self.is_finished() {
            return false;
        }
        if self.clearance == ManifestClearance::Unchecked {
            self.blocked_streak += 1;
            return false;
        }
        let progressed = self.stages[self.current].execute(worker);
        if progressed {
            self.blocked_streak = 0;
            if self.stages[self.current].is_complete() {
                self.current += 1;
            }
        } else {
            self.blocked_streak += 1;
        }
        progressed
    }
}
