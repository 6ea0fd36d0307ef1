use log::debug;

use super::solver::{angular_effective_mass, apply_angular_impulses};
use super::{ConstraintParams, ConstraintSolver};
use crate::common::error::{self, Result};
use crate::objects::Body;

/// Keeps the relative angle `b.angle - a.angle` within `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RotaryLimitJoint {
    min: f64,
    max: f64,

    i_sum: f64,
    bias: f64,
    j_acc: f64,
}

impl RotaryLimitJoint {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let (min, max) = error::ordered_range("rotary limit", min, max)?;
        Ok(Self {
            min,
            max,
            i_sum: 0.0,
            bias: 0.0,
            j_acc: 0.0,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn set_min(&mut self, min: f64) -> Result<()> {
        (self.min, _) = error::ordered_range("rotary limit", min, self.max)?;
        Ok(())
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn set_max(&mut self, max: f64) -> Result<()> {
        (_, self.max) = error::ordered_range("rotary limit", self.min, max)?;
        Ok(())
    }
}

impl ConstraintSolver for RotaryLimitJoint {
    fn pre_solve(&mut self, params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        let dist = b.angle - a.angle;
        let pdist = if dist > self.max {
            self.max - dist
        } else if dist < self.min {
            self.min - dist
        } else {
            0.0
        };

        self.i_sum = angular_effective_mass(a, b).unwrap_or_else(|| {
            debug!("rotary limit joint skipped: both bodies have infinite moment");
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
        // Past max the joint may only push the angle down, below min only up
        self.j_acc = if self.bias < 0.0 {
            (j_old + j).clamp(0.0, j_max)
        } else {
            (j_old + j).clamp(-j_max, 0.0)
        };

        apply_angular_impulses(a, b, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }

    fn reset(&mut self) {
        self.j_acc = 0.0;
    }
}
