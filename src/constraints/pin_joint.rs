use log::debug;

use super::solver::{apply_impulses, effective_mass, k_scalar, normal_relative_velocity};
use super::{ConstraintParams, ConstraintSolver};
use crate::common::error::{self, Result};
use crate::math::Vec2;
use crate::objects::Body;

/// Keeps the anchor points of two bodies at a fixed distance, like a rigid rod.
#[derive(Debug, Clone, PartialEq)]
pub struct PinJoint {
    anchor_a: Vec2,
    anchor_b: Vec2,
    distance: f64,

    r1: Vec2,
    r2: Vec2,
    n: Vec2,
    n_mass: f64,
    jn_acc: f64,
    bias: f64,
}

impl PinJoint {
    pub fn new(anchor_a: Vec2, anchor_b: Vec2, distance: f64) -> Result<Self> {
        error::finite("distance", distance)?;
        Ok(Self {
            anchor_a,
            anchor_b,
            distance: error::non_negative("distance", distance)?,
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

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn set_distance(&mut self, distance: f64) -> Result<()> {
        error::finite("distance", distance)?;
        self.distance = error::non_negative("distance", distance)?;
        Ok(())
    }
}

impl ConstraintSolver for PinJoint {
    fn pre_solve(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        self.r1 = a.transform().rotate_vector(self.anchor_a);
        self.r2 = b.transform().rotate_vector(self.anchor_b);

        let delta = (b.position + self.r2) - (a.position + self.r1);
        let dist = delta.magnitude();
        self.n = delta.normalize();

        match effective_mass(k_scalar(a, b, self.r1, self.r2, self.n)) {
            Some(mass) => self.n_mass = mass,
            None => {
                debug!("pin joint skipped: no effective mass along axis");
                self.n_mass = 0.0;
                self.jn_acc = 0.0;
            }
        }

        self.bias = params.bias_velocity(dist - self.distance, dt);
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        let j = self.n * (self.jn_acc * dt_coef);
        apply_impulses(a, b, self.r1, self.r2, j);
    }

    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        let vrn = normal_relative_velocity(a, b, self.r1, self.r2, self.n);
        let jn_max = params.max_impulse(dt);

        let jn = (self.bias - vrn) * self.n_mass;
        let jn_old = self.jn_acc;
        self.jn_acc = (jn_old + jn).clamp(-jn_max, jn_max);

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
    const EPSILON: f64 = 1e-9;

    fn solve(joint: &mut PinJoint, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        joint.pre_solve(params, a, b, dt);
        for _ in 0..10 {
            joint.apply_impulse(params, a, b, dt);
        }
    }

    #[test]
    fn test_pin_joint_new() {
        let pj = PinJoint::new(Vec2::new(1.0, 2.0), Vec2::new(-1.0, 0.0), 5.0).unwrap();
        assert_eq!(pj.anchor_a(), Vec2::new(1.0, 2.0));
        assert_eq!(pj.anchor_b(), Vec2::new(-1.0, 0.0));
        assert_eq!(pj.distance(), 5.0);
        assert_eq!(pj.impulse(), 0.0);
    }

    #[test]
    fn test_pin_joint_rejects_bad_distance() {
        assert!(PinJoint::new(Vec2::ZERO, Vec2::ZERO, -1.0).is_err());
        assert!(PinJoint::new(Vec2::ZERO, Vec2::ZERO, f64::NAN).is_err());
        let mut pj = PinJoint::new(Vec2::ZERO, Vec2::ZERO, 1.0).unwrap();
        assert!(pj.set_distance(f64::INFINITY).is_err());
        pj.set_distance(3.0).unwrap();
        assert_eq!(pj.distance(), 3.0);
    }

    #[test]
    fn test_pin_joint_cancels_separating_velocity() {
        let params = ConstraintParams::new(BodyHandle(0), BodyHandle(1));
        let mut a = Body::new(1.0, f64::INFINITY).unwrap();
        let mut b = Body::new(1.0, f64::INFINITY).unwrap().at(Vec2::new(2.0, 0.0));
        b.velocity = Vec2::new(4.0, 1.0);
        let mut joint = PinJoint::new(Vec2::ZERO, Vec2::ZERO, 2.0).unwrap();

        solve(&mut joint, &params, &mut a, &mut b, 1.0 / 60.0);

        // Only the component along the rod is removed and shared equally
        assert!((a.velocity.x - 2.0).abs() < EPSILON);
        assert!((b.velocity.x - 2.0).abs() < EPSILON);
        assert!((b.velocity.y - 1.0).abs() < EPSILON);
        assert!((joint.impulse() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_pin_joint_pushes_apart_when_too_close() {
        let params = ConstraintParams::new(BodyHandle(0), BodyHandle(1)).with_bias_coef(1.0);
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, f64::INFINITY).unwrap().at(Vec2::new(1.0, 0.0));
        let mut joint = PinJoint::new(Vec2::ZERO, Vec2::ZERO, 3.0).unwrap();

        solve(&mut joint, &params, &mut ground, &mut b, 1.0);

        // Full correction of a 2 unit error in one step
        assert!((b.velocity.x - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_pin_joint_coincident_anchors_stay_finite() {
        let params = ConstraintParams::new(BodyHandle(0), BodyHandle(1));
        let mut a = Body::new(1.0, 1.0).unwrap();
        let mut b = Body::new(1.0, 1.0).unwrap();
        b.velocity = Vec2::new(1.0, 0.0);
        let mut joint = PinJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0).unwrap();

        solve(&mut joint, &params, &mut a, &mut b, 1.0 / 60.0);

        assert!(a.velocity.is_finite() && b.velocity.is_finite());
        assert_eq!(b.velocity, Vec2::new(1.0, 0.0));
    }
}
