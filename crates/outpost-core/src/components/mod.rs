//! ECS components for colony agents.

mod people;

pub use people::*;
