//! Load-time configuration errors.
//!
//! Invalid configuration is fatal at construction, never deferred into
//! the pulse loop.

use outpost_logic::constants;

#[derive(Debug)]
pub enum ConfigError {
    /// A failure mode names a scope id with no known system.
    UnknownScope { mode: String, scope: u8 },
    /// A failure mode is attached to an unknown component system.
    UnknownSystem { mode: String, system: u8 },
    /// A manifest or storage entry names an unknown resource kind.
    UnknownResource(u8),
    /// A failure mode carries a non-finite or negative weight.
    InvalidWeight { mode: String },
    /// Reliability tuning constants are degenerate.
    Reliability(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownScope { mode, scope } => {
                write!(f, "failure mode '{}' names unknown scope {}", mode, scope)
            }
            ConfigError::UnknownSystem { mode, system } => {
                write!(f, "failure mode '{}' names unknown system {}", mode, system)
            }
            ConfigError::UnknownResource(id) => {
                write!(f, "unknown resource kind {}", id)
            }
            ConfigError::InvalidWeight { mode } => {
                write!(f, "failure mode '{}' has an invalid weight", mode)
            }
            ConfigError::Reliability(msg) => {
                write!(f, "reliability config: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reject unknown resource ids at load time.
pub fn check_resource(id: u8) -> Result<(), ConfigError> {
    if constants::resource_name(id).is_some() {
        Ok(())
    } else {
        Err(ConfigError::UnknownResource(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_logic::constants::resources;

    #[test]
    fn known_resource_accepted() {
        assert!(check_resource(resources::WATER).is_ok());
    }

    #[test]
    fn unknown_resource_rejected() {
        let err = check_resource(250).unwrap_err();
        assert!(err.to_string().contains("250"));
    }
}
