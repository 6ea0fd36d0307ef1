use log::debug;

use super::solver::{apply_impulses, k_tensor, relative_velocity};
use super::{ConstraintParams, ConstraintSolver};
use crate::common::error::{PhysicsError, Result};
use crate::math::{Mat2, Vec2};
use crate::objects::Body;

/// Which end of the groove, if any, the anchor is pressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrooveEnd {
    Start,
    End,
    Free,
}

/// Lets an anchor on body B slide along a segment fixed in body A, like a pin
/// in a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct GrooveJoint {
    groove_a: Vec2,
    groove_b: Vec2,
    anchor_b: Vec2,
    grv_n: Vec2,

    grv_tn: Vec2,
    end: GrooveEnd,
    r1: Vec2,
    r2: Vec2,
    k: Mat2,
    bias: Vec2,
    j_acc: Vec2,
    solvable: bool,
}

fn groove_normal(groove_a: Vec2, groove_b: Vec2) -> Result<Vec2> {
    let dir = groove_b - groove_a;
    if dir.is_zero() || !dir.is_finite() {
        return Err(PhysicsError::InvalidParameter {
            name: "groove",
            value: dir.magnitude(),
            reason: "endpoints must be distinct and finite",
        });
    }
    Ok(dir.normalize().perpendicular())
}

impl GrooveJoint {
    /// `groove_a` and `groove_b` are in body A's local frame, `anchor_b` in body B's.
    pub fn new(groove_a: Vec2, groove_b: Vec2, anchor_b: Vec2) -> Result<Self> {
        Ok(Self {
            groove_a,
            groove_b,
            anchor_b,
            grv_n: groove_normal(groove_a, groove_b)?,
            grv_tn: Vec2::ZERO,
            end: GrooveEnd::Free,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            k: Mat2::ZERO,
            bias: Vec2::ZERO,
            j_acc: Vec2::ZERO,
            solvable: false,
        })
    }

    pub fn groove_a(&self) -> Vec2 {
        self.groove_a
    }

    pub fn set_groove_a(&mut self, groove_a: Vec2) -> Result<()> {
        self.grv_n = groove_normal(groove_a, self.groove_b)?;
        self.groove_a = groove_a;
        Ok(())
    }

    pub fn groove_b(&self) -> Vec2 {
        self.groove_b
    }

    pub fn set_groove_b(&mut self, groove_b: Vec2) -> Result<()> {
        self.grv_n = groove_normal(self.groove_a, groove_b)?;
        self.groove_b = groove_b;
        Ok(())
    }

    pub fn anchor_b(&self) -> Vec2 {
        self.anchor_b
    }

    /// Alias of [`anchor_b`](Self::anchor_b).
    pub fn anchr2(&self) -> Vec2 {
        self.anchor_b
    }

    pub fn set_anchor_b(&mut self, anchor_b: Vec2) {
        self.anchor_b = anchor_b;
    }

    /// Limits the accumulated impulse: inside the groove only the normal
    /// component survives, at an end the joint may also push along the groove.
    fn constrain(&self, j: Vec2, max_impulse: f64) -> Vec2 {
        let pushing_on_end = match self.end {
            GrooveEnd::Start => j.cross(self.grv_tn) > 0.0,
            GrooveEnd::End => j.cross(self.grv_tn) < 0.0,
            GrooveEnd::Free => false,
        };
        let clamped = if pushing_on_end { j } else { j.project(self.grv_tn) };
        clamped.clamp_length(max_impulse)
    }
}

impl ConstraintSolver for GrooveJoint {
    fn pre_solve(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        let xf_a = a.transform();
        let ta = xf_a.apply(self.groove_a);
        let tb = xf_a.apply(self.groove_b);

        let n = xf_a.rotate_vector(self.grv_n);
        let d = ta.dot(n);

        self.grv_tn = n;
        self.r2 = b.transform().rotate_vector(self.anchor_b);

        // Position of B's anchor along the groove axis
        let td = (b.position + self.r2).cross(n);
        if td <= ta.cross(n) {
            self.end = GrooveEnd::Start;
            self.r1 = ta - a.position;
        } else if td >= tb.cross(n) {
            self.end = GrooveEnd::End;
            self.r1 = tb - a.position;
        } else {
            self.end = GrooveEnd::Free;
            self.r1 = n.perpendicular() * -td + n * d - a.position;
        }

        let Some(k) = k_tensor(a, b, self.r1, self.r2) else {
            debug!("groove joint skipped: singular effective mass");
            self.solvable = false;
            self.j_acc = Vec2::ZERO;
            return;
        };
        self.k = k;
        self.solvable = true;

        let delta = (b.position + self.r2) - (a.position + self.r1);
        self.bias = params.bias_vector(delta, dt);
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        if !self.solvable {
            return;
        }
        apply_impulses(a, b, self.r1, self.r2, self.j_acc * dt_coef);
    }

    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        if !self.solvable {
            return;
        }
        let vr = relative_velocity(a, b, self.r1, self.r2);
        let j = self.k.transform(self.bias - vr);

        let j_old = self.j_acc;
        self.j_acc = self.constrain(j_old + j, params.max_impulse(dt));
        apply_impulses(a, b, self.r1, self.r2, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.magnitude()
    }

    fn reset(&mut self) {
        self.j_acc = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::BodyHandle;
    const EPSILON: f64 = 1e-9;

    fn solve(joint: &mut GrooveJoint, a: &mut Body, b: &mut Body) {
        let params = ConstraintParams::new(BodyHandle(0), BodyHandle(1)).with_bias_coef(1.0);
        joint.pre_solve(&params, a, b, 1.0);
        for _ in 0..10 {
            joint.apply_impulse(&params, a, b, 1.0);
        }
    }

    #[test]
    fn test_groove_joint_new() {
        let gj = GrooveJoint::new(Vec2::new(5.0, 6.0), Vec2::new(7.0, 8.0), Vec2::new(9.0, 10.0)).unwrap();
        assert_eq!(gj.groove_a(), Vec2::new(5.0, 6.0));
        assert_eq!(gj.groove_b(), Vec2::new(7.0, 8.0));
        assert_eq!(gj.anchr2(), Vec2::new(9.0, 10.0));
        assert_eq!(gj.anchor_b(), Vec2::new(9.0, 10.0));
    }

    #[test]
    fn test_groove_joint_rejects_degenerate_groove() {
        assert!(GrooveJoint::new(Vec2::X, Vec2::X, Vec2::ZERO).is_err());
        let mut gj = GrooveJoint::new(Vec2::ZERO, Vec2::X, Vec2::ZERO).unwrap();
        assert!(gj.set_groove_b(Vec2::ZERO).is_err());
        // The failed setter leaves the groove untouched
        assert_eq!(gj.groove_b(), Vec2::X);
    }

    #[test]
    fn test_groove_joint_slides_freely_along_groove() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, f64::INFINITY).unwrap().at(Vec2::new(5.0, 0.0));
        b.velocity = Vec2::new(2.0, 3.0);
        let mut joint = GrooveJoint::new(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::ZERO).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        // Motion off the groove is removed, motion along it is kept
        assert!((b.velocity.x - 2.0).abs() < EPSILON);
        assert!(b.velocity.y.abs() < EPSILON);
    }

    #[test]
    fn test_groove_joint_stops_at_end() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, f64::INFINITY).unwrap().at(Vec2::new(10.0, 0.0));
        b.velocity = Vec2::new(2.0, 0.0);
        let mut joint = GrooveJoint::new(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::ZERO).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert!(b.velocity.x.abs() < EPSILON);
    }

    #[test]
    fn test_groove_joint_end_does_not_pull_back_inside() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, f64::INFINITY).unwrap().at(Vec2::new(10.0, 0.0));
        b.velocity = Vec2::new(-2.0, 0.0);
        let mut joint = GrooveJoint::new(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::ZERO).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert!((b.velocity.x - -2.0).abs() < EPSILON);
    }

    #[test]
    fn test_groove_joint_values_unchanged_by_solving() {
        let mut ground = Body::new_static();
        let mut b = Body::new(1.0, 1.0).unwrap().at(Vec2::new(3.0, 4.0));
        b.angle = 1.0;
        let mut joint = GrooveJoint::new(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(0.5, 0.0)).unwrap();

        solve(&mut joint, &mut ground, &mut b);

        assert_eq!(joint.groove_a(), Vec2::ZERO);
        assert_eq!(joint.groove_b(), Vec2::new(10.0, 0.0));
        assert_eq!(joint.anchr2(), Vec2::new(0.5, 0.0));
    }
}
