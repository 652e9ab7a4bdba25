//! Malfunction selection — failure modes weighted by reliability decay.
//!
//! A registry of failure-mode definitions, validated at load, plus one
//! [`Reliability`] record per component system. Selection reuses the
//! gated weighted choice: a mode's effective weight is its base weight
//! scaled by the system's reliability-derived failure factor, so young
//! plant almost never fails and old plant fails increasingly often.
//!
//! The reliability table is written only by the once-per-sol maintenance
//! pass; pulse-time selection reads the cached percentages from that
//! pass. Failures observed mid-sol are noted and folded in on the next
//! pass.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use outpost_logic::constants::system_name;
use outpost_logic::reliability::{Reliability, ReliabilityConfig};

use crate::error::ConfigError;
use crate::selector::{gated_choice, Weighted};

/// One failure mode definition, loaded at configuration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureMode {
    pub name: String,
    /// System scopes this mode can occur in.
    pub scopes: Vec<u8>,
    /// Base occurrence weight; also the per-candidate gate percentage
    /// before reliability scaling.
    pub weight: f64,
    /// Component system whose reliability scales this mode.
    pub system: u8,
}

/// A built-in failure-mode table for a small colony.
pub fn standard_failure_modes() -> Vec<FailureMode> {
    use outpost_logic::constants::systems::*;
    vec![
        FailureMode {
            name: "Air leak".to_string(),
            scopes: vec![HABITAT, ROVER],
            weight: 15.0,
            system: LIFE_SUPPORT,
        },
        FailureMode {
            name: "Electrical short".to_string(),
            scopes: vec![HABITAT, GREENHOUSE, LABORATORY, ROVER],
            weight: 35.0,
            system: POWER,
        },
        FailureMode {
            name: "Water pump failure".to_string(),
            scopes: vec![HABITAT, GREENHOUSE],
            weight: 25.0,
            system: WATER_RECLAMATION,
        },
        FailureMode {
            name: "Dust-clogged filter".to_string(),
            scopes: vec![HABITAT, LABORATORY],
            weight: 40.0,
            system: LIFE_SUPPORT,
        },
        FailureMode {
            name: "Drive motor stall".to_string(),
            scopes: vec![ROVER],
            weight: 20.0,
            system: ROVER,
        },
    ]
}

/// Per-system reliability plus the validated failure-mode table.
#[derive(Debug)]
pub struct MalfunctionRegistry {
    modes: Vec<FailureMode>,
    reliability: HashMap<u8, Reliability>,
    /// Units of each system currently in service, for MTBF estimation.
    units_in_use: HashMap<u8, u32>,
    /// Failures observed since the last maintenance pass.
    pending_failures: HashMap<u8, u32>,
    /// Reliability percentages cached by the daily pass.
    cached_pct: HashMap<u8, f64>,
    config: ReliabilityConfig,
}

impl MalfunctionRegistry {
    /// Build and validate the registry. Malformed scopes, unknown
    /// systems, and bad weights are fatal here, before the pulse loop
    /// ever runs.
    pub fn new(
        modes: Vec<FailureMode>,
        units_in_use: HashMap<u8, u32>,
        config: ReliabilityConfig,
        start_sol: u64,
    ) -> Result<Self, ConfigError> {
        config.validate().map_err(ConfigError::Reliability)?;
        for mode in &modes {
            if !mode.weight.is_finite() || mode.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    mode: mode.name.clone(),
                });
            }
            if system_name(mode.system).is_none() {
                return Err(ConfigError::UnknownSystem {
                    mode: mode.name.clone(),
                    system: mode.system,
                });
            }
            for &scope in &mode.scopes {
                if system_name(scope).is_none() {
                    return Err(ConfigError::UnknownScope {
                        mode: mode.name.clone(),
                        scope,
                    });
                }
            }
        }

        let mut reliability = HashMap::new();
        let mut cached_pct = HashMap::new();
        for mode in &modes {
            reliability
                .entry(mode.system)
                .or_insert_with(|| Reliability::new(start_sol, &config));
        }
        for (&system, rel) in &reliability {
            cached_pct.insert(system, rel.reliability_pct(start_sol, &config));
        }

        Ok(Self {
            modes,
            reliability,
            units_in_use,
            pending_failures: HashMap::new(),
            cached_pct,
            config,
        })
    }

    pub fn modes(&self) -> &[FailureMode] {
        &self.modes
    }

    /// The reliability record for a system, if any mode references it.
    pub fn reliability(&self, system: u8) -> Option<&Reliability> {
        self.reliability.get(&system)
    }

    /// Cached reliability percentage from the last maintenance pass.
    pub fn reliability_pct(&self, system: u8) -> f64 {
        self.cached_pct
            .get(&system)
            .copied()
            .unwrap_or(self.config.max_reliability_pct)
    }

    /// Effective selection weight for a mode: base weight scaled by how
    /// far the system's reliability has decayed from 100%.
    fn effective_weight(&self, mode: &FailureMode) -> f64 {
        let pct = self.reliability_pct(mode.system);
        mode.weight * (100.0 - pct) / 100.0
    }

    /// Pick at most one failure mode applicable to `scope`.
    ///
    /// Gated: the scope draw picks a tentative mode, which must then
    /// clear its own occurrence probability. `None` is the common case.
    pub fn select(&self, scope: u8, rng: &mut impl Rng) -> Option<&FailureMode> {
        let applicable: Vec<Weighted<usize>> = self
            .modes
            .iter()
            .enumerate()
            .filter(|(_, m)| m.scopes.contains(&scope))
            .map(|(i, m)| Weighted::new(i, self.effective_weight(m)))
            .collect();
        let chosen = gated_choice(&applicable, rng)?;
        Some(&self.modes[applicable[chosen].item])
    }

    /// Note a failure observed this sol. Folded into MTBF on the next
    /// maintenance pass; pulse-time code never writes the table.
    pub fn note_failure(&mut self, system: u8) {
        *self.pending_failures.entry(system).or_insert(0) += 1;
    }

    /// The once-per-sol maintenance pass: fold noted failures into the
    /// MTBF estimates and refresh the cached reliability percentages.
    pub fn run_daily_maintenance(&mut self, sol: u64) {
        let pending = std::mem::take(&mut self.pending_failures);
        for (system, count) in pending {
            let units = self.units_in_use.get(&system).copied().unwrap_or(1);
            if let Some(rel) = self.reliability.get_mut(&system) {
                rel.record_failures(count, units, sol, &self.config);
            }
        }
        for (&system, rel) in &self.reliability {
            self.cached_pct
                .insert(system, rel.reliability_pct(sol, &self.config));
        }
    }
}
