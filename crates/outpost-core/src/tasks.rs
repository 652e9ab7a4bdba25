//! Task selection — candidate jobs, the score cache, and the per-agent
//! engine.
//!
//! Each agent owns a [`TaskEngine`]: a FIFO queue of injected directives
//! that pre-empt discretionary work, and a time-bucketed [`ScoreCache`]
//! of the last computed candidate set. Snapshots are immutable and
//! replaced wholesale behind an `Arc`, so display threads can hold one
//! while the pulse loop swaps in a successor.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use outpost_logic::economy::SettlementProfile;

use crate::components::{LocationContext, RoleAssignment, Traits};
use crate::selector::{weighted_choice, Weighted};

/// Distinguishes discretionary scored work from injected directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    Scored,
    Pending,
}

/// One potential activity with its computed desirability.
///
/// Score is never negative; zero means infeasible and is excluded from
/// weighted selection. Immutable once placed in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateJob {
    pub description: String,
    pub score: f64,
    pub kind: JobKind,
}

impl CandidateJob {
    pub fn scored(description: impl Into<String>, score: f64) -> Self {
        Self {
            description: description.into(),
            score: score.max(0.0),
            kind: JobKind::Scored,
        }
    }

    /// An injected directive. Directives bypass weighted selection, so
    /// they carry no score.
    pub fn pending(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            score: 0.0,
            kind: JobKind::Pending,
        }
    }
}

/// Read-only view of one agent handed to candidate providers.
#[derive(Debug, Clone, Copy)]
pub struct AgentView<'a> {
    pub is_robot: bool,
    pub role: &'a RoleAssignment,
    pub traits: Traits,
    pub location: LocationContext,
}

/// A source of one candidate activity.
///
/// `score` must be a pure function of the agent view and settlement
/// snapshot — no mutation, no hidden state. Zero means infeasible.
pub trait CandidateProvider {
    fn describe(&self) -> &str;
    /// Whether this provider applies in the given location context.
    fn applies(&self, location: LocationContext) -> bool;
    /// Desirability for this agent, >= 0.
    fn score(&self, agent: &AgentView<'_>, settlement: &SettlementProfile) -> f64;
}

/// Immutable candidate-set snapshot, replaced wholesale on rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Time bucket the set was computed in.
    pub bucket: u64,
    /// Free-text label explaining the computation context.
    pub context: String,
    /// Sum of all contained candidate scores.
    pub total: f64,
    pub jobs: Vec<CandidateJob>,
    /// Most recently selected candidate, kept for display continuity.
    pub last_selected: Option<CandidateJob>,
}

/// Time-bucketed cache of the last computed candidate set for one agent.
///
/// Rebuilt only when the time bucket changes or the owner explicitly
/// invalidates (location or intent changed, action completed).
#[derive(Debug, Default)]
pub struct ScoreCache {
    snapshot: Option<Arc<TaskSnapshot>>,
}

impl ScoreCache {
    /// The current snapshot, if any, without triggering a rebuild.
    pub fn latest(&self) -> Option<Arc<TaskSnapshot>> {
        self.snapshot.clone()
    }

    /// Drop the snapshot; the next lookup rebuilds.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    /// Return the cached set for `bucket`, rebuilding if the bucket
    /// moved on or the cache was invalidated.
    pub fn get_or_rebuild(
        &mut self,
        bucket: u64,
        agent: &AgentView<'_>,
        settlement: &SettlementProfile,
        providers: &[Box<dyn CandidateProvider>],
    ) -> Arc<TaskSnapshot> {
        if let Some(snap) = &self.snapshot {
            if snap.bucket == bucket {
                return snap.clone();
            }
        }
        let snap = Arc::new(self.rebuild(bucket, agent, settlement, providers));
        self.snapshot = Some(snap.clone());
        snap
    }

    /// Replace the snapshot with one recording `job` as the selection.
    /// Selection does not invalidate: re-selection within the same bucket
    /// stays cheap and stable.
    pub fn record_selection(&mut self, job: &CandidateJob) {
        if let Some(snap) = &self.snapshot {
            let mut next = TaskSnapshot::clone(snap);
            next.last_selected = Some(job.clone());
            self.snapshot = Some(Arc::new(next));
        }
    }

    fn rebuild(
        &self,
        bucket: u64,
        agent: &AgentView<'_>,
        settlement: &SettlementProfile,
        providers: &[Box<dyn CandidateProvider>],
    ) -> TaskSnapshot {
        let prev = self
            .snapshot
            .as_ref()
            .and_then(|s| s.last_selected.clone());

        let mut jobs = Vec::new();
        for provider in providers {
            if !provider.applies(agent.location) {
                continue;
            }
            let raw = provider.score(agent, settlement);
            let score = if raw.is_finite() && raw >= 0.0 {
                raw
            } else {
                log::warn!(
                    "provider '{}' returned invalid score {}; excluding",
                    provider.describe(),
                    raw
                );
                0.0
            };
            let is_prev = prev
                .as_ref()
                .map(|p| p.description == provider.describe())
                .unwrap_or(false);
            // Zero scores are infeasible and dropped, except the previous
            // selection, which is retained for continuity.
            if score <= 0.0 && !is_prev {
                continue;
            }
            jobs.push(CandidateJob::scored(provider.describe(), score));
        }

        // Previous selection pinned to the front, recomputed score and all.
        if let Some(prev) = &prev {
            match jobs.iter().position(|j| j.description == prev.description) {
                Some(pos) if pos > 0 => {
                    let job = jobs.remove(pos);
                    jobs.insert(0, job);
                }
                Some(_) => {}
                None => jobs.insert(0, CandidateJob::scored(prev.description.clone(), 0.0)),
            }
        }

        let total = jobs.iter().map(|j| j.score).sum();
        TaskSnapshot {
            bucket,
            context: format!("{:?} candidates", agent.location),
            total,
            jobs,
            last_selected: prev,
        }
    }
}

/// Per-agent task selection: pending directives pre-empt discretionary
/// scoring; an empty weighted set means the agent idles this pulse.
#[derive(Debug, Default)]
pub struct TaskEngine {
    pending: VecDeque<CandidateJob>,
    cache: ScoreCache,
}

impl TaskEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a directive. Directives are consumed front-first before any
    /// scored selection happens.
    pub fn push_pending(&mut self, description: impl Into<String>) {
        self.pending.push_back(CandidateJob::pending(description));
    }

    /// The queued directives, front first.
    pub fn pending_jobs(&self) -> impl Iterator<Item = &CandidateJob> {
        self.pending.iter()
    }

    pub fn latest_snapshot(&self) -> Option<Arc<TaskSnapshot>> {
        self.cache.latest()
    }

    /// Drop the cached candidate set (location or intent changed).
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Choose the agent's next activity this pulse.
    ///
    /// Precedence: pending directive, then weighted selection over the
    /// cached candidate set, then idle (`None`).
    pub fn choose_next(
        &mut self,
        bucket: u64,
        agent: &AgentView<'_>,
        settlement: &SettlementProfile,
        providers: &[Box<dyn CandidateProvider>],
        rng: &mut impl Rng,
    ) -> Option<CandidateJob> {
        if let Some(directive) = self.pending.pop_front() {
            return Some(directive);
        }

        let snap = self.cache.get_or_rebuild(bucket, agent, settlement, providers);
        if snap.jobs.is_empty() || snap.total <= 0.0 {
            return None;
        }

        let weighted: Vec<Weighted<()>> = snap
            .jobs
            .iter()
            .map(|j| Weighted::new((), j.score))
            .collect();
        let idx = weighted_choice(&weighted, rng)?;
        let job = snap.jobs[idx].clone();
        self.cache.record_selection(&job);
        Some(job)
    }
}
