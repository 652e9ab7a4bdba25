//! Simulation constants — resource kinds, system scopes, time units.
//!
//! These are simple `u8`/`u64` constants with no engine dependency.
//! Both the native engine and the headless simtest harness use these.

pub mod resources {
    pub const METHANE: u8 = 0;
    pub const OXIDIZER: u8 = 1;
    pub const OXYGEN: u8 = 2;
    pub const WATER: u8 = 3;
    pub const FOOD: u8 = 4;
    pub const SPARE_PARTS: u8 = 5;
}

/// Human-readable name for a resource kind, `None` for unknown ids.
pub fn resource_name(id: u8) -> Option<&'static str> {
    match id {
        resources::METHANE => Some("methane"),
        resources::OXIDIZER => Some("oxidizer"),
        resources::OXYGEN => Some("oxygen"),
        resources::WATER => Some("water"),
        resources::FOOD => Some("food"),
        resources::SPARE_PARTS => Some("spare parts"),
        _ => None,
    }
}

/// System scopes for malfunction selection. A failure mode lists the
/// scopes it can occur in; a scope names a class of physical plant.
pub mod systems {
    pub const HABITAT: u8 = 0;
    pub const GREENHOUSE: u8 = 1;
    pub const LABORATORY: u8 = 2;
    pub const ROVER: u8 = 3;
    pub const POWER: u8 = 4;
    pub const LIFE_SUPPORT: u8 = 5;
    pub const WATER_RECLAMATION: u8 = 6;
}

/// Human-readable name for a system scope, `None` for unknown ids.
pub fn system_name(id: u8) -> Option<&'static str> {
    match id {
        systems::HABITAT => Some("habitat"),
        systems::GREENHOUSE => Some("greenhouse"),
        systems::LABORATORY => Some("laboratory"),
        systems::ROVER => Some("rover"),
        systems::POWER => Some("power"),
        systems::LIFE_SUPPORT => Some("life support"),
        systems::WATER_RECLAMATION => Some("water reclamation"),
        _ => None,
    }
}

pub mod time {
    /// Discrete pulses per simulated sol.
    pub const PULSES_PER_SOL: u64 = 1000;
    /// Pulses per cache time-bucket (~one simulated hour). Candidate
    /// sets are rebuilt at most once per bucket.
    pub const PULSES_PER_BUCKET: u64 = 40;

    /// Sol index of a pulse timestamp.
    pub fn sol_of(pulse: u64) -> u64 {
        pulse / PULSES_PER_SOL
    }

    /// Cache bucket index of a pulse timestamp.
    pub fn bucket_of(pulse: u64) -> u64 {
        pulse / PULSES_PER_BUCKET
    }
}
