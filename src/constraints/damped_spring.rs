use super::solver::{apply_impulses, effective_mass, k_scalar, normal_relative_velocity};
use super::{ConstraintParams, ConstraintSolver, SpringFn};
use crate::common::error::{self, Result};
use crate::math::Vec2;
use crate::objects::Body;

/// A linear spring with a damper between two anchors.
///
/// The spring impulse is applied once per step during pre-solve. The damper
/// is solved implicitly over the solver iterations so that stiff damping
/// stays stable.
#[derive(Debug, Clone)]
pub struct DampedSpring {
    anchor_a: Vec2,
    anchor_b: Vec2,
    rest_length: f64,
    stiffness: f64,
    damping: f64,
    force_func: Option<SpringFn>,

    r1: Vec2,
    r2: Vec2,
    n: Vec2,
    n_mass: f64,
    target_vrn: f64,
    v_coef: f64,
    j_acc: f64,
}

fn checked(name: &'static str, value: f64) -> Result<f64> {
    error::non_negative(name, error::finite(name, value)?)
}

impl DampedSpring {
    pub fn new(anchor_a: Vec2, anchor_b: Vec2, rest_length: f64, stiffness: f64, damping: f64) -> Result<Self> {
        Ok(Self {
            anchor_a,
            anchor_b,
            rest_length: checked("rest_length", rest_length)?,
            stiffness: checked("stiffness", stiffness)?,
            damping: checked("damping", damping)?,
            force_func: None,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            n: Vec2::ZERO,
            n_mass: 0.0,
            target_vrn: 0.0,
            v_coef: 0.0,
            j_acc: 0.0,
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

    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }

    pub fn set_rest_length(&mut self, rest_length: f64) -> Result<()> {
        self.rest_length = checked("rest_length", rest_length)?;
        Ok(())
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn set_stiffness(&mut self, stiffness: f64) -> Result<()> {
        self.stiffness = checked("stiffness", stiffness)?;
        Ok(())
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn set_damping(&mut self, damping: f64) -> Result<()> {
        self.damping = checked("damping", damping)?;
        Ok(())
    }

    /// Replaces the Hooke's law force with `f(distance)`. A positive force
    /// pushes the anchors apart.
    pub fn set_force_func(&mut self, f: SpringFn) {
        self.force_func = Some(f);
    }

    pub fn clear_force_func(&mut self) {
        self.force_func = None;
    }

    pub fn force_func(&self) -> Option<&SpringFn> {
        self.force_func.as_ref()
    }

    /// Force the spring exerts at anchor distance `dist`.
    pub fn spring_force(&self, dist: f64) -> f64 {
        match &self.force_func {
            Some(f) => f.call(dist),
            None => (self.rest_length - dist) * self.stiffness,
        }
    }
}

impl ConstraintSolver for DampedSpring {
    fn pre_solve(&mut self, _params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        self.r1 = a.transform().rotate_vector(self.anchor_a);
        self.r2 = b.transform().rotate_vector(self.anchor_b);

        let delta = (b.position + self.r2) - (a.position + self.r1);
        let dist = delta.magnitude();
        self.n = delta.normalize();

        let k = k_scalar(a, b, self.r1, self.r2, self.n);
        self.n_mass = effective_mass(k).unwrap_or(0.0);
        self.target_vrn = 0.0;
        self.v_coef = if self.n_mass == 0.0 {
            0.0
        } else {
            1.0 - (-self.damping * dt * k).exp()
        };

        let j_spring = self.spring_force(dist) * dt;
        self.j_acc = j_spring;
        apply_impulses(a, b, self.r1, self.r2, self.n * j_spring);
    }

    fn apply_cached_impulse(&mut self, _a: &mut Body, _b: &mut Body, _dt_coef: f64) {}

    fn apply_impulse(&mut self, _params: &ConstraintParams, a: &mut Body, b: &mut Body, _dt: f64) {
        let vrn = normal_relative_velocity(a, b, self.r1, self.r2, self.n);

        // Approach the damped velocity a fraction at a time
        let v_damp = (self.target_vrn - vrn) * self.v_coef;
        self.target_vrn = vrn + v_damp;

        let j_damp = v_damp * self.n_mass;
        self.j_acc += j_damp;
        apply_impulses(a, b, self.r1, self.r2, self.n * j_damp);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }

    fn reset(&mut self) {
        self.j_acc = 0.0;
    }
}
