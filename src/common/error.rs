//! Error type shared by bodies, constraints and the space.

use thiserror::Error;

use crate::objects::BodyHandle;
use crate::constraints::ConstraintHandle;

/// Broad category of a [`PhysicsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The objects involved are not wired together correctly (missing bodies,
    /// removal order, sleeping disabled).
    Configuration,
    /// A numeric argument is outside its valid domain.
    InvalidParameter,
}

/// Errors surfaced at the point of misuse: construction, setters, `add_*`,
/// `remove_*` and `step` arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("body {0:?} is not part of this space")]
    BodyNotInSpace(BodyHandle),

    #[error("constraint {0:?} is not part of this space")]
    ConstraintNotInSpace(ConstraintHandle),

    #[error("body {body:?} still has {count} attached constraint(s); remove them first")]
    BodyHasConstraints { body: BodyHandle, count: usize },

    #[error("a constraint cannot connect body {0:?} to itself")]
    SameBody(BodyHandle),

    #[error("sleeping is disabled: sleep_time_threshold is infinite")]
    SleepingDisabled,

    #[error("body {0:?} is not dynamic and cannot sleep")]
    NotDynamic(BodyHandle),

    #[error("invalid {name}: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid {name} range: min {min} > max {max}")]
    InvalidRange { name: &'static str, min: f64, max: f64 },
}

impl PhysicsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } | Self::InvalidRange { .. } | Self::SameBody(_) => {
                ErrorKind::InvalidParameter
            }
            Self::BodyNotInSpace(_)
            | Self::ConstraintNotInSpace(_)
            | Self::BodyHasConstraints { .. }
            | Self::SleepingDisabled
            | Self::NotDynamic(_) => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, PhysicsError>;

/// Rejects NaN and negative values.
pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64> {
    if value.is_nan() || value < 0.0 {
        return Err(PhysicsError::InvalidParameter {
            name,
            value,
            reason: "must be >= 0",
        });
    }
    Ok(value)
}

/// Rejects NaN and infinities.
pub(crate) fn finite(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(PhysicsError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        });
    }
    Ok(value)
}

/// Rejects NaN and infinities, then `min > max`.
pub(crate) fn ordered_range(name: &'static str, min: f64, max: f64) -> Result<(f64, f64)> {
    finite(name, min)?;
    finite(name, max)?;
    if min > max {
        return Err(PhysicsError::InvalidRange { name, min, max });
    }
    Ok((min, max))
}
