use log::debug;

use super::solver::effective_mass;
use super::{ConstraintParams, ConstraintSolver};
use crate::common::error::{self, PhysicsError, Result};
use crate::objects::Body;

/// Keeps `b.angle * ratio - a.angle` at `phase`, like two meshed gears.
#[derive(Debug, Clone, PartialEq)]
pub struct GearJoint {
    phase: f64,
    ratio: f64,
    ratio_inv: f64,

    i_sum: f64,
    bias: f64,
    j_acc: f64,
}

fn check_ratio(ratio: f64) -> Result<f64> {
    error::finite("ratio", ratio)?;
    if ratio == 0.0 {
        return Err(PhysicsError::InvalidParameter {
            name: "ratio",
            value: ratio,
            reason: "must be non-zero",
        });
    }
    Ok(ratio)
}

impl GearJoint {
    pub fn new(phase: f64, ratio: f64) -> Result<Self> {
        let ratio = check_ratio(ratio)?;
        Ok(Self {
            phase: error::finite("phase", phase)?,
            ratio,
            ratio_inv: 1.0 / ratio,
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

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_ratio(&mut self, ratio: f64) -> Result<()> {
        self.ratio = check_ratio(ratio)?;
        self.ratio_inv = 1.0 / self.ratio;
        Ok(())
    }

    fn apply(&self, a: &mut Body, b: &mut Body, j: f64) {
        a.angular_velocity -= j * a.inv_moment() * self.ratio_inv;
        b.angular_velocity += j * b.inv_moment();
    }
}

impl ConstraintSolver for GearJoint {
    fn pre_solve(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        let k = a.inv_moment() * self.ratio_inv + self.ratio * b.inv_moment();
        match effective_mass(k) {
            Some(mass) => {
                self.i_sum = mass;
                self.bias = params.bias_velocity(b.angle * self.ratio - a.angle - self.phase, dt);
            }
            None => {
                debug!("gear joint skipped: no effective moment");
                self.i_sum = 0.0;
                self.bias = 0.0;
                self.j_acc = 0.0;
            }
        }
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        self.apply(a, b, self.j_acc * dt_coef);
    }

    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        let wr = b.angular_velocity * self.ratio - a.angular_velocity;
        let j_max = params.max_impulse(dt);

        let j = (self.bias - wr) * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = (j_old + j).clamp(-j_max, j_max);

        self.apply(a, b, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }

    fn reset(&mut self) {
        self.j_acc = 0.0;
    }
}
