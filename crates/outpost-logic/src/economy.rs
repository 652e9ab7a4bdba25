//! Settlement snapshot and the scalar demand modifiers scoring consumes.
//!
//! Scoring never reaches into live settlement state: the engine captures a
//! [`SettlementProfile`] once per pulse and hands the same snapshot to every
//! provider, so one pulse sees one consistent view.

use serde::{Deserialize, Serialize};

/// Headcount against capacity for one venue inside the settlement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Occupancy {
    pub occupants: u32,
    pub capacity: u32,
}

impl Occupancy {
    pub fn new(occupants: u32, capacity: u32) -> Self {
        Self {
            occupants,
            capacity,
        }
    }

    /// Occupants beyond capacity.
    pub fn excess(&self) -> u32 {
        self.occupants.saturating_sub(self.capacity)
    }
}

/// Read-only settlement state consumed by candidate scoring and manifests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementProfile {
    pub name: String,
    /// Current resident headcount.
    pub population: u32,
    /// Designed resident capacity.
    pub capacity: u32,
    /// Rovers currently fueled, maintained, and unreserved.
    pub eligible_rovers: u32,
    /// Tourism demand modifier, neutral at 1.0.
    pub tourism_demand: f32,
    /// Research demand modifier, neutral at 1.0.
    pub research_demand: f32,
    pub greenhouse: Occupancy,
    pub laboratory: Occupancy,
    pub commons: Occupancy,
}

impl Default for SettlementProfile {
    fn default() -> Self {
        Self {
            name: "Outpost One".to_string(),
            population: 24,
            capacity: 24,
            eligible_rovers: 2,
            tourism_demand: 1.0,
            research_demand: 1.0,
            greenhouse: Occupancy::new(2, 4),
            laboratory: Occupancy::new(2, 6),
            commons: Occupancy::new(6, 20),
        }
    }
}

impl SettlementProfile {
    /// Population pressure against designed capacity, clamped to [0, 2].
    /// Exactly 1.0 when the settlement is at capacity.
    pub fn population_factor(&self) -> f64 {
        safe_ratio(self.population, self.capacity).min(2.0)
    }

    /// Tourism demand as a multiplicative factor, clamped to [0, 4].
    pub fn tourism_factor(&self) -> f64 {
        (self.tourism_demand as f64).clamp(0.0, 4.0)
    }

    /// Research demand as a multiplicative factor, clamped to [0, 4].
    pub fn research_factor(&self) -> f64 {
        (self.research_demand as f64).clamp(0.0, 4.0)
    }
}

fn safe_ratio(current: u32, cap: u32) -> f64 {
    if cap == 0 {
        0.0
    } else {
        current as f64 / cap as f64
    }
}
