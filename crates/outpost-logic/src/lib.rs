//! Pure scheduling logic for Outpost.
//!
//! This crate contains all colony-scheduling logic that is independent of
//! any ECS, database, or runtime. Functions take plain data and return
//! results, making them unit-testable and portable between the native
//! engine and any headless tooling.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Resource kinds, system scopes, time units (u8/u64 IDs) |
//! | [`economy`] | Settlement snapshot and the scalar demand modifiers scoring consumes |
//! | [`manifest`] | Trip resource manifests: fuel, oxidizer, life support, margins |
//! | [`reliability`] | MTBF tracking and exponential reliability curves per component type |
//! | [`scoring`] | Multiplicative score chains with zero short-circuit and factor helpers |
//! | [`transit`] | Transit lifecycle: schedule derivation and macro-state classification |

pub mod constants;
pub mod economy;
pub mod manifest;
pub mod reliability;
pub mod scoring;
pub mod transit;
