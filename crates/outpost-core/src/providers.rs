//! Concrete candidate-activity providers.
//!
//! Each provider composes the same modifier chain: a nominal base weight,
//! role suitability, then whatever settlement factors apply to that
//! activity. Robots skip the personality and economic factors. Anything
//! expensive sits behind a lazy factor so an infeasible candidate costs
//! nothing past its first zero.

use outpost_logic::economy::SettlementProfile;
use outpost_logic::manifest::{estimate_trip_sols, travel_manifest};
use outpost_logic::scoring::{
    crowding_factor, extroversion_factor, TaskScore, DEFAULT_SCORE_CEILING,
};

use crate::components::{LocationContext, WorkDomain};
use crate::tasks::{AgentView, CandidateProvider};

/// Tend greenhouse crops. Solo work; degrades when the greenhouse is
/// over-occupied.
pub struct TendGreenhouse;

impl CandidateProvider for TendGreenhouse {
    fn describe(&self) -> &str {
        "Tend greenhouse crops"
    }

    fn applies(&self, location: LocationContext) -> bool {
        location == LocationContext::Indoors
    }

    fn score(&self, agent: &AgentView<'_>, settlement: &SettlementProfile) -> f64 {
        TaskScore::new(50.0)
            .apply(agent.role.fit(WorkDomain::Agronomy))
            .apply(settlement.population_factor())
            .apply(crowding_factor(&settlement.greenhouse, false))
            .finish(DEFAULT_SCORE_CEILING)
    }
}

/// Routine equipment upkeep. Always indoors, role-weighted only.
pub struct MaintainEquipment;

impl CandidateProvider for MaintainEquipment {
    fn describe(&self) -> &str {
        "Maintain equipment"
    }

    fn applies(&self, location: LocationContext) -> bool {
        location == LocationContext::Indoors
    }

    fn score(&self, agent: &AgentView<'_>, settlement: &SettlementProfile) -> f64 {
        TaskScore::new(40.0)
            .apply(agent.role.fit(WorkDomain::Engineering))
            .apply(settlement.population_factor())
            .finish(DEFAULT_SCORE_CEILING)
    }
}

/// Laboratory research, pulled up or down by settlement research demand.
pub struct ConductResearch;

impl CandidateProvider for ConductResearch {
    fn describe(&self) -> &str {
        "Conduct laboratory research"
    }

    fn applies(&self, location: LocationContext) -> bool {
        location == LocationContext::Indoors
    }

    fn score(&self, agent: &AgentView<'_>, settlement: &SettlementProfile) -> f64 {
        let mut score = TaskScore::new(45.0)
            .apply(agent.role.fit(WorkDomain::Science))
            .apply(crowding_factor(&settlement.laboratory, false));
        if !agent.is_robot {
            score = score.apply(settlement.research_factor());
        }
        score.finish(DEFAULT_SCORE_CEILING)
    }
}

/// Guide visiting tourists. Person-only, extroversion-weighted, scaled
/// by tourism demand.
pub struct GuideVisitors;

impl CandidateProvider for GuideVisitors {
    fn describe(&self) -> &str {
        "Guide visitors"
    }

    fn applies(&self, location: LocationContext) -> bool {
        location == LocationContext::Indoors
    }

    fn score(&self, agent: &AgentView<'_>, settlement: &SettlementProfile) -> f64 {
        if agent.is_robot {
            return 0.0;
        }
        TaskScore::new(30.0)
            .apply(agent.role.fit(WorkDomain::Logistics))
            .apply(settlement.tourism_factor())
            .apply(extroversion_factor(agent.traits.extroversion))
            .finish(DEFAULT_SCORE_CEILING)
    }
}

/// Plan an exploration drive. Infeasible without an eligible rover; the
/// manifest estimate only runs once a rover is known to exist.
pub struct RoverExpedition {
    /// One-way distance to the survey site, km.
    pub distance_km: f64,
}

impl CandidateProvider for RoverExpedition {
    fn describe(&self) -> &str {
        "Rover expedition"
    }

    fn applies(&self, location: LocationContext) -> bool {
        location == LocationContext::Indoors
    }

    fn score(&self, agent: &AgentView<'_>, settlement: &SettlementProfile) -> f64 {
        let rovers = settlement.eligible_rovers;
        TaskScore::new(60.0)
            .apply(agent.role.fit(WorkDomain::Piloting))
            .apply(if rovers == 0 { 0.0 } else { 1.0 })
            .apply_with(|| {
                // Longer hauls need heavier manifests; discount them.
                let sols = estimate_trip_sols(self.distance_km);
                let load = travel_manifest(self.distance_km, 2, sols).mandatory_total_kg();
                1.0 / (1.0 + load / 1000.0)
            })
            .finish(DEFAULT_SCORE_CEILING)
    }
}

/// Join a gathering in the commons. Group-forming: crowding is a bonus.
/// Person-only.
pub struct SocialGathering;

impl CandidateProvider for SocialGathering {
    fn describe(&self) -> &str {
        "Join a gathering"
    }

    fn applies(&self, location: LocationContext) -> bool {
        location == LocationContext::Indoors
    }

    fn score(&self, agent: &AgentView<'_>, settlement: &SettlementProfile) -> f64 {
        if agent.is_robot {
            return 0.0;
        }
        TaskScore::new(20.0)
            .apply(crowding_factor(&settlement.commons, true))
            .apply(extroversion_factor(agent.traits.extroversion))
            .finish(DEFAULT_SCORE_CEILING)
    }
}

/// The standard provider set registered by the engine.
pub fn standard_providers() -> Vec<Box<dyn CandidateProvider>> {
    vec![
        Box::new(TendGreenhouse),
        Box::new(MaintainEquipment),
        Box::new(ConductResearch),
        Box::new(GuideVisitors),
        Box::new(RoverExpedition { distance_km: 120.0 }),
        Box::new(SocialGathering),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{RoleAssignment, Traits};

    fn person(role: &RoleAssignment, extroversion: f32) -> AgentView<'_> {
        AgentView {
            is_robot: false,
            role,
            traits: Traits { extroversion },
            location: LocationContext::Indoors,
        }
    }

    fn robot(role: &RoleAssignment) -> AgentView<'_> {
        AgentView {
            is_robot: true,
            role,
            traits: Traits::default(),
            location: LocationContext::Indoors,
        }
    }

    #[test]
    fn neutral_maintenance_score_is_nominal_times_fit() {
        // Settlement at capacity, secondary-fit engineer, neutral traits:
        // no distortion beyond the fit tier.
        let role = RoleAssignment::new(WorkDomain::Science, Some(WorkDomain::Engineering));
        let settlement = SettlementProfile::default();
        let score = MaintainEquipment.score(&person(&role, 50.0), &settlement);
        assert!((score - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn expedition_without_rover_scores_exactly_zero() {
        let role = RoleAssignment::new(WorkDomain::Piloting, None);
        let settlement = SettlementProfile {
            eligible_rovers: 0,
            ..SettlementProfile::default()
        };
        let provider = RoverExpedition { distance_km: 120.0 };
        assert_eq!(provider.score(&person(&role, 50.0), &settlement), 0.0);
    }

    #[test]
    fn expedition_with_rover_scores_positive() {
        let role = RoleAssignment::new(WorkDomain::Piloting, None);
        let settlement = SettlementProfile::default();
        let provider = RoverExpedition { distance_km: 120.0 };
        assert!(provider.score(&person(&role, 50.0), &settlement) > 0.0);
    }

    #[test]
    fn longer_expeditions_score_lower() {
        let role = RoleAssignment::new(WorkDomain::Piloting, None);
        let settlement = SettlementProfile::default();
        let near = RoverExpedition { distance_km: 50.0 };
        let far = RoverExpedition { distance_km: 800.0 };
        assert!(
            near.score(&person(&role, 50.0), &settlement)
                > far.score(&person(&role, 50.0), &settlement)
        );
    }

    #[test]
    fn robots_skip_social_work() {
        let role = RoleAssignment::new(WorkDomain::Logistics, None);
        let settlement = SettlementProfile::default();
        assert_eq!(SocialGathering.score(&robot(&role), &settlement), 0.0);
        assert_eq!(GuideVisitors.score(&robot(&role), &settlement), 0.0);
    }

    #[test]
    fn extroverts_favor_gatherings() {
        let role = RoleAssignment::new(WorkDomain::Logistics, None);
        let settlement = SettlementProfile::default();
        let introvert = SocialGathering.score(&person(&role, 5.0), &settlement);
        let extrovert = SocialGathering.score(&person(&role, 95.0), &settlement);
        assert!(extrovert > introvert);
    }

    #[test]
    fn tourism_demand_scales_guiding() {
        let role = RoleAssignment::new(WorkDomain::Logistics, None);
        let quiet = SettlementProfile {
            tourism_demand: 0.0,
            ..SettlementProfile::default()
        };
        let busy = SettlementProfile {
            tourism_demand: 3.0,
            ..SettlementProfile::default()
        };
        assert_eq!(GuideVisitors.score(&person(&role, 50.0), &quiet), 0.0);
        assert!(GuideVisitors.score(&person(&role, 50.0), &busy) > 0.0);
    }

    #[test]
    fn research_demand_ignored_for_robots() {
        let role = RoleAssignment::new(WorkDomain::Science, None);
        let low = SettlementProfile {
            research_demand: 0.0,
            ..SettlementProfile::default()
        };
        // A robot still researches when the human demand signal is zero.
        assert!(ConductResearch.score(&robot(&role), &low) > 0.0);
        assert_eq!(ConductResearch.score(&person(&role, 50.0), &low), 0.0);
    }

    #[test]
    fn standard_set_is_nonempty_and_indoor() {
        let providers = standard_providers();
        assert!(providers.len() >= 5);
        for p in &providers {
            assert!(p.applies(LocationContext::Indoors), "{}", p.describe());
        }
    }
}
