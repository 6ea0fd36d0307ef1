use std::fmt;
use std::sync::Arc;

use crate::objects::Body;

pub mod constraint;
pub mod damped_rotary_spring;
pub mod damped_spring;
pub mod gear_joint;
pub mod groove_joint;
pub mod pin_joint;
pub mod pivot_joint;
pub mod ratchet_joint;
pub mod rotary_limit_joint;
pub mod simple_motor;
pub mod slide_joint;
pub(crate) mod solver;

pub use constraint::{Constraint, ConstraintParams, Joint};
pub use damped_rotary_spring::DampedRotarySpring;
pub use damped_spring::DampedSpring;
pub use gear_joint::GearJoint;
pub use groove_joint::GrooveJoint;
pub use pin_joint::PinJoint;
pub use pivot_joint::PivotJoint;
pub use ratchet_joint::RatchetJoint;
pub use rotary_limit_joint::RotaryLimitJoint;
pub use simple_motor::SimpleMotor;
pub use slide_joint::SlideJoint;

/// Identity of a constraint inside a [`Space`](crate::world::Space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) u64);

/// The per-step solving protocol every joint variant implements.
///
/// The space drives it once per step as: `pre_solve`, velocity integration,
/// `apply_cached_impulse`, then `apply_impulse` once per solver iteration.
pub trait ConstraintSolver {
    /// Caches anchor offsets, effective mass and bias for the current body
    /// transforms. Spring variants apply their spring impulse here.
    fn pre_solve(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64);

    /// Warm start: re-applies the previous step's accumulated impulse scaled
    /// by `dt_coef = dt / prev_dt`.
    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64);

    /// One solver iteration.
    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64);

    /// Magnitude of the impulse accumulated during the last step.
    fn impulse(&self) -> f64;

    /// Drops the accumulated impulse, for constraints that sat out a step.
    fn reset(&mut self);
}

/// A user-supplied spring curve: force as a function of distance for
/// [`DampedSpring`], torque as a function of relative angle for
/// [`DampedRotarySpring`].
#[derive(Clone)]
pub struct SpringFn(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl SpringFn {
    pub fn new(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, x: f64) -> f64 {
        (self.0)(x)
    }
}

impl fmt::Debug for SpringFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SpringFn(..)")
    }
}

/// Mutable references to two distinct bodies of a slice.
/// Panics if the indices are equal or out of bounds; the space guarantees neither.
pub(crate) fn get_mutable_body_pair(bodies: &mut [Body], idx_a: usize, idx_b: usize) -> (&mut Body, &mut Body) {
    assert_ne!(idx_a, idx_b, "a constraint cannot connect a body to itself");

    if idx_a < idx_b {
        let (slice_a, slice_b) = bodies.split_at_mut(idx_b);
        (&mut slice_a[idx_a], &mut slice_b[0])
    } else {
        let (slice_b, slice_a) = bodies.split_at_mut(idx_a);
        (&mut slice_a[0], &mut slice_b[idx_b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mutable_body_pair_either_order() {
        let mut bodies = vec![
            Body::new(1.0, 1.0).unwrap(),
            Body::new(2.0, 1.0).unwrap(),
            Body::new(3.0, 1.0).unwrap(),
        ];
        let (a, b) = get_mutable_body_pair(&mut bodies, 2, 0);
        assert_eq!(a.mass(), 3.0);
        assert_eq!(b.mass(), 1.0);
        let (a, b) = get_mutable_body_pair(&mut bodies, 0, 1);
        assert_eq!(a.mass(), 1.0);
        assert_eq!(b.mass(), 2.0);
    }

    #[test]
    #[should_panic]
    fn test_get_mutable_body_pair_same_index_panics() {
        let mut bodies = vec![Body::new(1.0, 1.0).unwrap()];
        get_mutable_body_pair(&mut bodies, 0, 0);
    }

    #[test]
    fn test_spring_fn_calls_closure() {
        let k = 3.0;
        let f = SpringFn::new(move |x| -k * x);
        assert_eq!(f.call(2.0), -6.0);
        assert_eq!(format!("{f:?}"), "SpringFn(..)");
    }
}
