//! Configuration-time errors.
//!
//! Runtime conditions (stale callbacks, bad parry reports, broken combo
//! segments) never surface here: they are absorbed where they happen with a
//! warning log. Only invariants that would stall or corrupt an encounter are
//! rejected up front.

use thiserror::Error;

use crate::arbitration::{BodyResource, TransitionDirection};
use crate::form::Form;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Deploy/retract without any completion fallback would stay
    /// "in progress" forever if the animation layer never confirms.
    #[error("{resource:?} {direction:?} has no completion duration: missing confirmation would deadlock arbitration")]
    ArbitrationDeadlock {
        resource: BodyResource,
        direction: TransitionDirection,
    },

    #[error("`{field}` must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("`{field}`: min {min} is greater than max {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("attack catalog has no selectable attacks for form {0:?}")]
    EmptyFormSubset(Form),

    #[error("attack catalog has no form-transition attack")]
    MissingTransitionAttack,

    #[error("failed to parse encounter config: {0}")]
    Parse(#[from] toml::de::Error),
}
