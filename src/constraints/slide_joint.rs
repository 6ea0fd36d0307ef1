use log::debug;

use super::solver::{apply_impulses, effective_mass, k_scalar, normal_relative_velocity};
use super::{ConstraintParams, ConstraintSolver};
use crate::common::error::{self, PhysicsError, Result};
use crate::math::Vec2;
use crate::objects::Body;

/// Keeps the anchor distance within `[min, max]`, like a rope or a telescoping
/// rod. Inside the range the joint applies nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideJoint {
    anchor_a: Vec2,
    anchor_b: Vec2,
    min: f64,
    max: f64,

    r1: Vec2,
    r2: Vec2,
    n: Vec2,
    n_mass: f64,
    jn_acc: f64,
    bias: f64,
}

fn check_limits(min: f64, max: f64) -> Result<(f64, f64)> {
    let (min, max) = error::ordered_range("slide", min, max)?;
    if min < 0.0 {
        return Err(PhysicsError::InvalidParameter {
            name: "min",
            value: min,
            reason: "must be >= 0",
        });
    }
    Ok((min, max))
}

impl SlideJoint {
    pub fn new(anchor_a: Vec2, anchor_b: Vec2, min: f64, max: f64) -> Result<Self> {
        let (min, max) = check_limits(min, max)?;
        Ok(Self {
            anchor_a,
            anchor_b,
            min,
            max,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            n: Vec2::ZERO,
            n_mass: 0.0,
            jn_acc: 0.0,
            bias: 0.0,
        })
    }

    pub fn anchor_a(&self) -> Vec2 {
        self.anchor_a
    }

    pub fn set_anchor_a(&mut self, anchor_a: Vec2) {
        self.anchor_a = anchor_a;
    }

    pub fn anchor_b(&self) -> Vec2 {
        self.anchor_b
    }

    pub fn set_anchor_b(&mut self, anchor_b: Vec2) {
        self.anchor_b = anchor_b;
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn set_min(&mut self, min: f64) -> Result<()> {
        (self.min, _) = check_limits(min, self.max)?;
        Ok(())
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn set_max(&mut self, max: f64) -> Result<()> {
        (_, self.max) = check_limits(self.min, max)?;
        Ok(())
    }
}

impl ConstraintSolver for SlideJoint {
    fn pre_solve(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        self.r1 = a.transform().rotate_vector(self.anchor_a);
        self.r2 = b.transform().rotate_vector(self.anchor_b);

        let delta = (b.position + self.r2) - (a.position + self.r1);
        let dist = delta.magnitude();

        // n points the way B would have to move to violate the limit further
        let violation = if dist > self.max {
            self.n = delta.normalize();
            dist - self.max
        } else if dist < self.min {
            self.n = -delta.normalize();
            self.min - dist
        } else {
            self.n = Vec2::ZERO;
            self.jn_acc = 0.0;
            0.0
        };

        match effective_mass(k_scalar(a, b, self.r1, self.r2, self.n)) {
            Some(mass) => self.n_mass = mass,
            None => {
                debug!("slide joint skipped: no effective mass along axis");
                self.n_mass = 0.0;
                self.jn_acc = 0.0;
            }
        }

        self.bias = params.bias_velocity(violation, dt);
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        let j = self.n * (self.jn_acc * dt_coef);
        apply_impulses(a, b, self.r1, self.r2, j);
    }

    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        if self.n.is_zero() {
            return;
        }

        let vrn = normal_relative_velocity(a, b, self.r1, self.r2, self.n);
        let jn = (self.bias - vrn) * self.n_mass;
        let jn_old = self.jn_acc;
        // One-sided: the joint only ever pulls back toward the range
        self.jn_acc = (jn_old + jn).clamp(-params.max_impulse(dt), 0.0);

        apply_impulses(a, b, self.r1, self.r2, self.n * (self.jn_acc - jn_old));
    }

    fn impulse(&self) -> f64 {
        self.jn_acc.abs()
    }

    fn reset(&mut self) {
        self.jn_acc = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::BodyHandle;
    use rstest::rstest;
    const EPSILON: f64 = 1e-9;

    fn params() -> ConstraintParams {
        ConstraintParams::new(BodyHandle(0), BodyHandle(1)).with_bias_coef(1.0)
    }

    fn solve(joint: &mut SlideJoint, a: &mut Body, b: &mut Body) {
        let params = params();
        joint.pre_solve(&params, a, b, 1.0);
        for _ in 0..10 {
            joint.apply_impulse(&params, a, b, 1.0);
        }
    }

    #[rstest]
    #[case(-1.0, 2.0)]
    #[case(3.0, 2.0)]
    #[case(f64::NAN, 2.0)]
    #[case(0.0, f64::INFINITY)]
    fn test_slide_joint_rejects_bad_limits(#[case] min: f64, #[case] max: f64) {
        assert!(SlideJoint::new(Vec2::ZERO, Vec2::ZERO, min, max).is_err());
    }

    #[test]
    fn test_slide_joint_setters_keep_range_ordered() {
        let mut sj = SlideJoint::new(Vec2::ZERO, Vec2::ZERO, 1.0, 2.0).unwrap();
        assert!(sj.set_min(3.0).is_err());
        assert!(sj.set_max(0.5).is_err());
        sj.set_max(5.0).unwrap();
        sj.set_min(4.0).unwrap();
        assert_eq!((sj.min(), sj.max()), (4.0, 5.0));
    }

    #[rstest]
    #[case(1.5)]
    #[case(1.0)]
    #[case(2.0)]
    fn test_slide_joint_inactive_inside_range(#[case] dist: f64) {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, 1.0).unwrap().at(Vec2::new(dist, 0.0));
        b.velocity = Vec2::new(7.0, -3.0);
        let mut joint = SlideJoint::new(Vec2::ZERO, Vec2::ZERO, 1.0, 2.0).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert_eq!(b.velocity, Vec2::new(7.0, -3.0));
        assert_eq!(joint.impulse(), 0.0);
    }

    #[test]
    fn test_slide_joint_pulls_back_past_max() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, f64::INFINITY).unwrap().at(Vec2::new(3.0, 0.0));
        let mut joint = SlideJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0, 2.0).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert!((b.velocity.x - -1.0).abs() < EPSILON);
        assert!((joint.impulse() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_slide_joint_pushes_out_below_min() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, f64::INFINITY).unwrap().at(Vec2::new(0.5, 0.0));
        let mut joint = SlideJoint::new(Vec2::ZERO, Vec2::ZERO, 1.0, 2.0).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert!((b.velocity.x - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_slide_joint_never_pushes_outward_past_max() {
        // Already moving back into range faster than the bias asks for
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, f64::INFINITY).unwrap().at(Vec2::new(3.0, 0.0));
        b.velocity = Vec2::new(-5.0, 0.0);
        let mut joint = SlideJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0, 2.0).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert_eq!(b.velocity, Vec2::new(-5.0, 0.0));
        assert_eq!(joint.impulse(), 0.0);
    }
}
