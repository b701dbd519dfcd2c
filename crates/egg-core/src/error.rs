use thiserror::Error;

use crate::channels::{Capability, Scope};

/// A required capability was not found on the target or its descendants.
///
/// Non-fatal: the egg stays in `PrerequisitesNotMet` and `setup` may be
/// retried once the target gains the capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrerequisiteError {
    #[error("egg `{egg}`: target is gone")]
    TargetDropped { egg: String },
    #[error("egg `{egg}`: missing {capability:?} on {scope:?}")]
    Missing {
        egg: String,
        capability: Capability,
        scope: Scope,
    },
}

/// Tuning values that would make the effect misbehave.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name}: min {min} exceeds max {max}")]
    InvertedRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
    #[error("click threshold must be at least 2, got {0}")]
    ClickThreshold(u32),
    #[error("upside-down threshold must be within (0, 180] degrees, got {0}")]
    ThresholdAngle(f32),
}
