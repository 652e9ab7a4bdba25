//! Component reliability — MTBF tracking and exponential failure curves.
//!
//! Each physical component type owns one [`Reliability`] record. Reliability
//! decays exponentially with time in service; the mean time between failures
//! is re-estimated after recorded failures as a blend of observed field data
//! and the nominal design ceiling, so a small failure sample cannot swing
//! the estimate wildly.

use serde::{Deserialize, Serialize};

/// Smallest MTBF the model will report, in sols. Guards the failure-rate
/// division.
pub const MIN_MTBF_SOLS: f64 = 0.001;

/// Tuning constants for the reliability model.
///
/// The field/nominal blend weight and the ceilings are balance constants
/// without a derived basis; they are kept configurable rather than baked in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Design-ceiling MTBF in sols.
    pub max_mtbf_sols: f64,
    /// Upper bound on reported reliability percentage.
    pub max_reliability_pct: f64,
    /// Weight given to observed field data when re-estimating MTBF
    /// (the remainder goes to the design ceiling).
    pub field_blend: f64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_mtbf_sols: 669.0,
            max_reliability_pct: 99.99,
            field_blend: 0.25,
        }
    }
}

impl ReliabilityConfig {
    /// Reject configurations that would degenerate the model.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.max_mtbf_sols > 0.0) {
            return Err("max_mtbf_sols must be positive");
        }
        if !(self.max_reliability_pct > 0.0 && self.max_reliability_pct <= 100.0) {
            return Err("max_reliability_pct must be in (0, 100]");
        }
        if !(0.0..=1.0).contains(&self.field_blend) {
            return Err("field_blend must be in [0, 1]");
        }
        Ok(())
    }
}

/// Failure history for one component type.
///
/// Created once at configuration load, updated only through
/// [`Reliability::record_failures`]; the derived percentage and failure
/// rate are recomputed on demand from elapsed time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reliability {
    /// Cumulative recorded failures.
    pub failures: u32,
    /// Current mean time between failures, in sols.
    pub mtbf_sols: f64,
    /// Sol the component type entered service.
    pub start_sol: u64,
}

impl Reliability {
    /// New record with the cold-start assumption of full design reliability.
    pub fn new(start_sol: u64, config: &ReliabilityConfig) -> Self {
        Self {
            failures: 0,
            mtbf_sols: config.max_mtbf_sols,
            start_sol,
        }
    }

    /// Sols in service, clamped to a minimum of one so a failure recorded
    /// on the entry-into-service sol never divides by zero.
    fn elapsed_sols(&self, sol: u64) -> f64 {
        (sol.saturating_sub(self.start_sol) as f64).max(1.0)
    }

    /// Reliability percentage at `sol`: `exp(-elapsed / mtbf) * 100`,
    /// capped at the configured maximum. Monotonically non-increasing in
    /// elapsed time for a fixed MTBF.
    pub fn reliability_pct(&self, sol: u64, config: &ReliabilityConfig) -> f64 {
        let elapsed = self.elapsed_sols(sol);
        ((-elapsed / self.mtbf_sols).exp() * 100.0).min(config.max_reliability_pct)
    }

    /// Instantaneous failure rate, `1 / MTBF`.
    pub fn failure_rate(&self) -> f64 {
        1.0 / self.mtbf_sols.max(MIN_MTBF_SOLS)
    }

    /// Fold `count` new failures into the record and re-estimate MTBF.
    ///
    /// The first-ever failure keeps MTBF at the design ceiling. Later
    /// failures blend the observed field MTBF
    /// (`units_in_use * elapsed / failures`) with the ceiling at the
    /// configured weight, clamped to `[MIN_MTBF_SOLS, max_mtbf_sols]`.
    pub fn record_failures(
        &mut self,
        count: u32,
        units_in_use: u32,
        sol: u64,
        config: &ReliabilityConfig,
    ) {
        if count == 0 {
            return;
        }
        let prior = self.failures;
        self.failures += count;

        let mtbf = if prior == 0 {
            config.max_mtbf_sols
        } else {
            let elapsed = self.elapsed_sols(sol);
            let field = units_in_use as f64 * elapsed / self.failures as f64;
            config.field_blend * field + (1.0 - config.field_blend) * config.max_mtbf_sols
        };
        self.mtbf_sols = mtbf.clamp(MIN_MTBF_SOLS, config.max_mtbf_sols);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ReliabilityConfig {
        ReliabilityConfig::default()
    }

    #[test]
    fn default_config_valid() {
        assert!(cfg().validate().is_ok());
    }

    #[test]
    fn bad_configs_rejected() {
        let mut c = cfg();
        c.max_mtbf_sols = 0.0;
        assert!(c.validate().is_err());

        let mut c = cfg();
        c.max_reliability_pct = 101.0;
        assert!(c.validate().is_err());

        let mut c = cfg();
        c.field_blend = 1.5;
        assert!(c.validate().is_err());
    }

    #[test]
    fn reliability_monotonically_non_increasing() {
        let config = cfg();
        let rel = Reliability::new(0, &config);
        let mut prev = f64::INFINITY;
        for sol in [1, 5, 50, 200, 669, 2000] {
            let pct = rel.reliability_pct(sol, &config);
            assert!(pct <= prev, "reliability rose at sol {}", sol);
            assert!(pct <= config.max_reliability_pct);
            assert!(pct >= 0.0);
            prev = pct;
        }
    }

    #[test]
    fn reliability_bounded_by_max() {
        let config = cfg();
        let rel = Reliability::new(100, &config);
        // Same-sol query uses the 1-sol elapsed clamp; still under the cap.
        let pct = rel.reliability_pct(100, &config);
        assert!(pct <= config.max_reliability_pct);
        assert!(pct > 99.0, "fresh component should be near-fully reliable");
    }

    #[test]
    fn first_failure_keeps_design_mtbf() {
        let config = cfg();
        let mut rel = Reliability::new(0, &config);
        rel.record_failures(1, 10, 50, &config);
        assert_eq!(rel.failures, 1);
        assert!((rel.mtbf_sols - config.max_mtbf_sols).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_failures_blend_toward_field_data() {
        let config = cfg();
        let mut rel = Reliability::new(0, &config);
        rel.record_failures(1, 10, 50, &config);
        rel.record_failures(4, 10, 100, &config);
        // field = 10 * 100 / 5 = 200; blended = 0.25*200 + 0.75*669
        let expected = 0.25 * 200.0 + 0.75 * config.max_mtbf_sols;
        assert!((rel.mtbf_sols - expected).abs() < 1e-9);
        assert!(rel.mtbf_sols < config.max_mtbf_sols);
    }

    #[test]
    fn mtbf_never_exceeds_ceiling() {
        let config = cfg();
        let mut rel = Reliability::new(0, &config);
        // Huge fleet, few failures — field estimate far above ceiling.
        rel.record_failures(1, 100_000, 500, &config);
        rel.record_failures(1, 100_000, 600, &config);
        assert!(rel.mtbf_sols <= config.max_mtbf_sols);
    }

    #[test]
    fn same_sol_failure_uses_elapsed_clamp() {
        let config = cfg();
        let mut rel = Reliability::new(10, &config);
        rel.record_failures(1, 5, 10, &config);
        rel.record_failures(1, 5, 10, &config);
        assert!(rel.mtbf_sols.is_finite());
        assert!(rel.mtbf_sols >= MIN_MTBF_SOLS);
    }

    #[test]
    fn failure_rate_inverse_of_mtbf() {
        let config = cfg();
        let rel = Reliability::new(0, &config);
        assert!((rel.failure_rate() - 1.0 / config.max_mtbf_sols).abs() < 1e-12);
    }

    #[test]
    fn zero_count_is_noop() {
        let config = cfg();
        let mut rel = Reliability::new(0, &config);
        let before = rel.clone();
        rel.record_failures(0, 10, 50, &config);
        assert_eq!(rel.failures, before.failures);
        assert!((rel.mtbf_sols - before.mtbf_sols).abs() < f64::EPSILON);
    }
}
