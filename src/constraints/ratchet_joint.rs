use log::debug;

use super::solver::{angular_effective_mass, apply_angular_impulses};
use super::{ConstraintParams, ConstraintSolver};
use crate::common::error::{self, PhysicsError, Result};
use crate::objects::Body;

/// Lets `b.angle - a.angle` advance freely in the direction of `ratchet` but
/// catches it on the last tooth, spaced `ratchet` apart starting at `phase`,
/// when it turns back.
#[derive(Debug, Clone, PartialEq)]
pub struct RatchetJoint {
    phase: f64,
    ratchet: f64,
    angle: f64,

    i_sum: f64,
    bias: f64,
    j_acc: f64,
}

fn check_ratchet(ratchet: f64) -> Result<f64> {
    error::finite("ratchet", ratchet)?;
    if ratchet == 0.0 {
        return Err(PhysicsError::InvalidParameter {
            name: "ratchet",
            value: ratchet,
            reason: "must be non-zero",
        });
    }
    Ok(ratchet)
}

impl RatchetJoint {
    /// `angle` is the relative angle the ratchet starts out caught on.
    pub fn new(phase: f64, ratchet: f64, angle: f64) -> Result<Self> {
        Ok(Self {
            phase: error::finite("phase", phase)?,
            ratchet: check_ratchet(ratchet)?,
            angle: error::finite("angle", angle)?,
            i_sum: 0.0,
            bias: 0.0,
            j_acc: 0.0,
        })
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn set_phase(&mut self, phase: f64) -> Result<()> {
        self.phase = error::finite("phase", phase)?;
        Ok(())
    }

    pub fn ratchet(&self) -> f64 {
        self.ratchet
    }

    pub fn set_ratchet(&mut self, ratchet: f64) -> Result<()> {
        self.ratchet = check_ratchet(ratchet)?;
        Ok(())
    }

    /// Cumulative relative angle of the tooth currently engaged.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) -> Result<()> {
        self.angle = error::finite("angle", angle)?;
        Ok(())
    }
}

impl ConstraintSolver for RatchetJoint {
    fn pre_solve(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        let delta = b.angle - a.angle;
        let diff = self.angle - delta;

        let pdist = if diff * self.ratchet > 0.0 {
            diff
        } else {
            self.angle = ((delta - self.phase) / self.ratchet).floor() * self.ratchet + self.phase;
            0.0
        };

        self.i_sum = angular_effective_mass(a, b).unwrap_or_else(|| {
            debug!("ratchet joint skipped: both bodies have infinite moment");
            0.0
        });

        self.bias = if self.i_sum == 0.0 {
            0.0
        } else {
            params.bias_velocity(pdist, dt)
        };

        if self.bias == 0.0 {
            self.j_acc = 0.0;
        }
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        apply_angular_impulses(a, b, self.j_acc * dt_coef);
    }

    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        if self.bias == 0.0 {
            return;
        }

        let wr = b.angular_velocity - a.angular_velocity;
        let j_max = params.max_impulse(dt);

        let j = -(self.bias + wr) * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = ((j_old + j) * self.ratchet).clamp(0.0, j_max * self.ratchet.abs()) / self.ratchet;

        apply_angular_impulses(a, b, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }

    fn reset(&mut self) {
        self.j_acc = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::BodyHandle;
    const EPSILON: f64 = 1e-9;

    fn solve(joint: &mut RatchetJoint, a: &mut Body, b: &mut Body) {
        let params = ConstraintParams::new(BodyHandle(0), BodyHandle(1)).with_bias_coef(1.0);
        joint.pre_solve(&params, a, b, 1.0);
        for _ in 0..10 {
            joint.apply_impulse(&params, a, b, 1.0);
        }
    }

    #[test]
    fn test_ratchet_joint_new() {
        let rj = RatchetJoint::new(0.3, 0.2, 0.0).unwrap();
        assert_eq!(rj.phase(), 0.3);
        assert_eq!(rj.ratchet(), 0.2);
        assert_eq!(rj.angle(), 0.0);
    }

    #[test]
    fn test_ratchet_joint_rejects_zero_ratchet() {
        assert!(RatchetJoint::new(0.0, 0.0, 0.0).is_err());
        let mut rj = RatchetJoint::new(0.0, 1.0, 0.0).unwrap();
        assert!(rj.set_ratchet(0.0).is_err());
        assert!(rj.set_phase(f64::NAN).is_err());
        rj.set_angle(2.0).unwrap();
        assert_eq!(rj.angle(), 2.0);
    }

    #[test]
    fn test_ratchet_advances_to_next_tooth() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, 1.0).unwrap();
        b.angle = 2.3;
        b.angular_velocity = 1.0;
        let mut joint = RatchetJoint::new(0.0, 1.0, 0.0).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert!((joint.angle() - 2.0).abs() < EPSILON);
        assert_eq!(b.angular_velocity, 1.0);
        assert_eq!(joint.impulse(), 0.0);
    }

    #[test]
    fn test_ratchet_catches_backward_rotation() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, 1.0).unwrap();
        b.angle = -0.5;
        b.angular_velocity = -1.0;
        let mut joint = RatchetJoint::new(0.0, 1.0, 0.0).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        // Stops the backward spin and drives back to the tooth at 0
        assert!((b.angular_velocity - 0.5).abs() < EPSILON);
        assert_eq!(joint.angle(), 0.0);
    }

    #[test]
    fn test_negative_ratchet_reverses_direction() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, 1.0).unwrap();
        b.angle = 0.5;
        let mut joint = RatchetJoint::new(0.0, -1.0, 0.0).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert!(b.angular_velocity < 0.0);
    }
}
