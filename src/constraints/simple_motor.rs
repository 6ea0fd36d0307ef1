use log::debug;

use super::solver::{angular_effective_mass, apply_angular_impulses};
use super::{ConstraintParams, ConstraintSolver};
use crate::common::error::{self, Result};
use crate::objects::Body;

/// Drives `a.angular_velocity - b.angular_velocity` toward `rate`, with torque
/// limited by the constraint's `max_force`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleMotor {
    rate: f64,

    i_sum: f64,
    j_acc: f64,
}

impl SimpleMotor {
    pub fn new(rate: f64) -> Result<Self> {
        Ok(Self {
            rate: error::finite("rate", rate)?,
            i_sum: 0.0,
            j_acc: 0.0,
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<()> {
        self.rate = error::finite("rate", rate)?;
        Ok(())
    }
}

impl ConstraintSolver for SimpleMotor {
    fn pre_solve(&mut self, _params: &ConstraintParams, a: &mut Body, b: &mut Body, _dt: f64) {
        self.i_sum = angular_effective_mass(a, b).unwrap_or_else(|| {
            debug!("simple motor skipped: both bodies have infinite moment");
            0.0
        });
        if self.i_sum == 0.0 {
            self.j_acc = 0.0;
        }
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        apply_angular_impulses(a, b, self.j_acc * dt_coef);
    }

    fn apply_impulse(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        let wr = b.angular_velocity - a.angular_velocity + self.rate;
        let j_max = params.max_impulse(dt);

        let j = -wr * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = (j_old + j).clamp(-j_max, j_max);

        apply_angular_impulses(a, b, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }

    fn reset(&mut self) {
        self.j_acc = 0.0;
    }
}
