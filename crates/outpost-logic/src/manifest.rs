//! Trip resource manifests — fuel, oxidizer, life support, margins.
//!
//! A manifest maps resource kinds to required quantities, split into
//! mandatory amounts and optional margin. Manifests are additive: a
//! multi-stage process merges the manifests of its stages into one
//! requirement. The engine only computes quantities here; actual
//! store/retrieve is the storage collaborator's business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::resources;

/// Per-person consumption rates (kg per sol).
pub mod consumption {
    /// Oxygen: ~0.84 kg/sol.
    pub const OXYGEN_PER_PERSON_SOL: f64 = 0.84;
    /// Water: ~3 kg/sol (before reclamation).
    pub const WATER_PER_PERSON_SOL: f64 = 3.0;
    /// Food: ~2 kg/sol.
    pub const FOOD_PER_PERSON_SOL: f64 = 2.0;
}

/// Propellant per kilometre for rover-class conveyances (kg methane/km).
pub const FUEL_PER_KM: f64 = 0.15;
/// Oxidizer loaded as a fixed ratio of fuel mass.
pub const OXIDIZER_TO_FUEL_RATIO: f64 = 1.5;
/// Fraction of each mandatory quantity carried again as optional margin.
pub const OPTIONAL_MARGIN: f64 = 0.25;
/// Nominal rover range per sol, for trip-duration estimates (km).
pub const ROVER_KM_PER_SOL: f64 = 100.0;

/// Resource requirements for a trip or stage, mandatory vs. optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripManifest {
    mandatory: BTreeMap<u8, f64>,
    optional: BTreeMap<u8, f64>,
}

impl TripManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mandatory(&mut self, resource: u8, kg: f64) {
        if kg > 0.0 {
            *self.mandatory.entry(resource).or_insert(0.0) += kg;
        }
    }

    pub fn add_optional(&mut self, resource: u8, kg: f64) {
        if kg > 0.0 {
            *self.optional.entry(resource).or_insert(0.0) += kg;
        }
    }

    /// Fold another manifest into this one. Quantities add per resource.
    pub fn merge(&mut self, other: &TripManifest) {
        for (&res, &kg) in &other.mandatory {
            self.add_mandatory(res, kg);
        }
        for (&res, &kg) in &other.optional {
            self.add_optional(res, kg);
        }
    }

    pub fn mandatory(&self) -> &BTreeMap<u8, f64> {
        &self.mandatory
    }

    pub fn optional(&self) -> &BTreeMap<u8, f64> {
        &self.optional
    }

    pub fn mandatory_kg(&self, resource: u8) -> f64 {
        self.mandatory.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn optional_kg(&self, resource: u8) -> f64 {
        self.optional.get(&resource).copied().unwrap_or(0.0)
    }

    /// Total mandatory mass across all resources.
    pub fn mandatory_total_kg(&self) -> f64 {
        self.mandatory.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.mandatory.is_empty() && self.optional.is_empty()
    }
}

/// Estimated trip duration in sols for a given one-way distance.
pub fn estimate_trip_sols(distance_km: f64) -> f64 {
    (distance_km.max(0.0) / ROVER_KM_PER_SOL).max(1.0)
}

/// Manifest for one travel leg: propellant from distance, oxidizer as a
/// fixed ratio of fuel, life-support consumables from headcount and
/// estimated duration. Margin quantities land in the optional half.
pub fn travel_manifest(distance_km: f64, crew: u32, duration_sols: f64) -> TripManifest {
    let mut manifest = TripManifest::new();

    let fuel = distance_km.max(0.0) * FUEL_PER_KM;
    let oxidizer = fuel * OXIDIZER_TO_FUEL_RATIO;
    manifest.add_mandatory(resources::METHANE, fuel);
    manifest.add_optional(resources::METHANE, fuel * OPTIONAL_MARGIN);
    manifest.add_mandatory(resources::OXIDIZER, oxidizer);
    manifest.add_optional(resources::OXIDIZER, oxidizer * OPTIONAL_MARGIN);

    let person_sols = crew as f64 * duration_sols.max(0.0);
    let o2 = person_sols * consumption::OXYGEN_PER_PERSON_SOL;
    let water = person_sols * consumption::WATER_PER_PERSON_SOL;
    let food = person_sols * consumption::FOOD_PER_PERSON_SOL;
    manifest.add_mandatory(resources::OXYGEN, o2);
    manifest.add_optional(resources::OXYGEN, o2 * OPTIONAL_MARGIN);
    manifest.add_mandatory(resources::WATER, water);
    manifest.add_optional(resources::WATER, water * OPTIONAL_MARGIN);
    manifest.add_mandatory(resources::FOOD, food);
    manifest.add_optional(resources::FOOD, food * OPTIONAL_MARGIN);

    manifest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oxidizer_fixed_ratio_of_fuel() {
        let m = travel_manifest(200.0, 4, 2.0);
        let fuel = m.mandatory_kg(resources::METHANE);
        let ox = m.mandatory_kg(resources::OXIDIZER);
        assert!((fuel - 30.0).abs() < 1e-9);
        assert!((ox - fuel * OXIDIZER_TO_FUEL_RATIO).abs() < 1e-9);
    }

    #[test]
    fn life_support_scales_with_person_sols() {
        let small = travel_manifest(100.0, 2, 3.0);
        let large = travel_manifest(100.0, 4, 3.0);
        assert!(
            (large.mandatory_kg(resources::OXYGEN)
                - 2.0 * small.mandatory_kg(resources::OXYGEN))
            .abs()
                < 1e-9
        );
    }

    #[test]
    fn margin_goes_to_optional() {
        let m = travel_manifest(100.0, 2, 1.0);
        for &res in &[resources::METHANE, resources::OXYGEN, resources::WATER] {
            let mand = m.mandatory_kg(res);
            let opt = m.optional_kg(res);
            assert!((opt - mand * OPTIONAL_MARGIN).abs() < 1e-9, "res {}", res);
        }
    }

    #[test]
    fn manifests_additive_across_stages() {
        let leg_out = travel_manifest(150.0, 3, 2.0);
        let leg_back = travel_manifest(150.0, 3, 2.0);
        let mut total = TripManifest::new();
        total.merge(&leg_out);
        total.merge(&leg_back);
        assert!(
            (total.mandatory_kg(resources::METHANE)
                - 2.0 * leg_out.mandatory_kg(resources::METHANE))
            .abs()
                < 1e-9
        );
        assert!(
            (total.mandatory_total_kg()
                - 2.0 * leg_out.mandatory_total_kg())
            .abs()
                < 1e-9
        );
    }

    #[test]
    fn zero_distance_zero_crew_is_empty() {
        let m = travel_manifest(0.0, 0, 0.0);
        assert!(m.is_empty());
    }

    #[test]
    fn trip_duration_floor() {
        assert!((estimate_trip_sols(50.0) - 1.0).abs() < f64::EPSILON);
        assert!((estimate_trip_sols(350.0) - 3.5).abs() < 1e-9);
    }
}
