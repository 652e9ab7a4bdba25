//! Agent components: persons, robots, roles, traits, location context.

use serde::{Deserialize, Serialize};

/// Marker component identifying an entity as a person.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Person;

/// Marker component identifying an entity as a robot. Robots skip the
/// personality and economic factors when candidates are scored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Robot;

/// Display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name(pub String);

/// Work domains an agent can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkDomain {
    Agronomy,
    Engineering,
    Science,
    Logistics,
    Piloting,
}

/// An agent's job assignment with primary and optional secondary domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub primary: WorkDomain,
    pub secondary: Option<WorkDomain>,
}

impl RoleAssignment {
    pub fn new(primary: WorkDomain, secondary: Option<WorkDomain>) -> Self {
        Self { primary, secondary }
    }

    /// Suitability factor for work in `domain`: 1.5 for the primary
    /// assignment, 1.0 for the secondary, 0.5 for unrelated work.
    pub fn fit(&self, domain: WorkDomain) -> f64 {
        if self.primary == domain {
            1.5
        } else if self.secondary == Some(domain) {
            1.0
        } else {
            0.5
        }
    }
}

/// Personality traits consumed by scoring, on 0–100 scales.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Traits {
    pub extroversion: f32,
}

impl Default for Traits {
    fn default() -> Self {
        Self { extroversion: 50.0 }
    }
}

impl Traits {
    /// Generate random traits.
    pub fn random(rng: &mut impl rand::Rng) -> Self {
        Self {
            extroversion: rng.gen_range(0.0..=100.0),
        }
    }
}

/// Where the agent currently is. Decides which candidate providers apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationContext {
    Indoors,
    Outdoors,
    InVehicle,
}
