//! Colony scheduling engine.
//!
//! A single synchronous pulse driver over a [hecs] world of agents:
//! every pulse each agent picks one activity from a weighted, cached
//! candidate set, staged processes (missions, transports) advance through
//! their phases, and timer callbacks move transports through the transit
//! lifecycle. Malfunctions draw from the same weighted-selection core,
//! scaled by per-component reliability.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`components`] | Agent components: persons, robots, roles, traits, location |
//! | [`engine`] | The pulse driver and read-only query surface |
//! | [`error`] | Load-time configuration errors |
//! | [`events`] | Process timer queue (at most one outstanding entry per process) |
//! | [`malfunction`] | Failure-mode registry and reliability-weighted selection |
//! | [`process`] | Staged processes: stage variants, manifests, transit timers |
//! | [`providers`] | Concrete candidate-activity providers |
//! | [`selector`] | Generic weighted-random choice with probability gate |
//! | [`tasks`] | Candidate jobs, score cache, per-agent task engine |

pub mod components;
pub mod engine;
pub mod error;
pub mod events;
pub mod malfunction;
pub mod process;
pub mod providers;
pub mod selector;
pub mod tasks;
