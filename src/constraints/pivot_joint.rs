use log::debug;

use super::solver::{apply_impulses, k_tensor, relative_velocity};
use super::{ConstraintParams, ConstraintSolver};
use crate::math::{Mat2, Vec2};
use crate::objects::Body;

/// Keeps an anchor on body A coincident with an anchor on body B.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotJoint {
    /// Anchor point on body A, in local coordinates.
    anchor_a: Vec2,
    /// Anchor point on body B, in local coordinates.
    anchor_b: Vec2,

    r1: Vec2,
    r2: Vec2,
    k: Mat2,
    bias: Vec2,
    j_acc: Vec2,
    solvable: bool,
}

impl PivotJoint {
    pub fn new(anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self {
            anchor_a,
            anchor_b,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            k: Mat2::ZERO,
            bias: Vec2::ZERO,
            j_acc: Vec2::ZERO,
            solvable: false,
        }
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

    /// Alias of [`anchor_a`](Self::anchor_a).
    pub fn anchr1(&self) -> Vec2 {
        self.anchor_a
    }

    /// Alias of [`anchor_b`](Self::anchor_b).
    pub fn anchr2(&self) -> Vec2 {
        self.anchor_b
    }
}

impl ConstraintSolver for PivotJoint {
    fn pre_solve(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        self.r1 = a.transform().rotate_vector(self.anchor_a);
        self.r2 = b.transform().rotate_vector(self.anchor_b);

        let Some(k) = k_tensor(a, b, self.r1, self.r2) else {
            debug!("pivot joint skipped: singular effective mass");
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
        self.j_acc = (j_old + j).clamp_length(params.max_impulse(dt));
        apply_impulses(a, b, self.r1, self.r2, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.magnitude()
    }

    fn reset(&mut self) {
        self.j_acc = Vec2::ZERO;
    }
}
