use crate::common::error::{self, PhysicsError, Result};
use crate::math::Vec2;
use crate::objects::{Body, BodyHandle};
use crate::world::Space;

use super::{
    ConstraintSolver, DampedRotarySpring, DampedSpring, GearJoint, GrooveJoint, PinJoint,
    PivotJoint, RatchetJoint, RotaryLimitJoint, SimpleMotor, SlideJoint,
};

/// Settings shared by every constraint variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintParams {
    a: BodyHandle,
    b: BodyHandle,
    max_force: f64,
    max_bias: f64,
    error_bias: f64,
    bias_coef: Option<f64>,
    collide_bodies: bool,
}

impl ConstraintParams {
    /// Fraction of the remaining error left after one second: 10% corrected
    /// per step at 60 Hz.
    pub const DEFAULT_ERROR_BIAS: f64 = 0.001797010299914434; // 0.9^60

    pub(crate) fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self {
            a,
            b,
            max_force: f64::INFINITY,
            max_bias: f64::INFINITY,
            error_bias: Self::DEFAULT_ERROR_BIAS,
            bias_coef: None,
            collide_bodies: true,
        }
    }

    pub fn a(&self) -> BodyHandle {
        self.a
    }

    pub fn b(&self) -> BodyHandle {
        self.b
    }

    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    pub fn max_bias(&self) -> f64 {
        self.max_bias
    }

    pub fn error_bias(&self) -> f64 {
        self.error_bias
    }

    /// Fraction of positional error corrected over a step of length `dt`.
    pub(crate) fn correction_fraction(&self, dt: f64) -> f64 {
        match self.bias_coef {
            Some(coef) => coef.min(1.0),
            None => 1.0 - self.error_bias.powf(dt),
        }
    }

    /// Bias velocity `-fraction * error / dt`, clamped to `max_bias`.
    pub(crate) fn bias_velocity(&self, error: f64, dt: f64) -> f64 {
        (-self.correction_fraction(dt) * error / dt).clamp(-self.max_bias, self.max_bias)
    }

    /// Vector form of [`bias_velocity`](Self::bias_velocity), clamped by length.
    pub(crate) fn bias_vector(&self, error: Vec2, dt: f64) -> Vec2 {
        (error * (-self.correction_fraction(dt) / dt)).clamp_length(self.max_bias)
    }

    /// Largest impulse the constraint may accumulate over `dt`.
    pub(crate) fn max_impulse(&self, dt: f64) -> f64 {
        self.max_force * dt
    }

    #[cfg(test)]
    pub(crate) fn with_max_force(mut self, max_force: f64) -> Self {
        self.max_force = max_force;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_bias_coef(mut self, bias_coef: f64) -> Self {
        self.bias_coef = Some(bias_coef);
        self
    }
}

macro_rules! joint_variants {
    ($($variant:ident($ty:ty) => $as_ref:ident, $as_mut:ident;)*) => {
        /// Variant data of a [`Constraint`].
        #[derive(Debug, Clone)]
        pub enum Joint {
            $($variant($ty),)*
        }

        $(
            impl From<$ty> for Joint {
                fn from(joint: $ty) -> Self {
                    Joint::$variant(joint)
                }
            }
        )*

        impl Joint {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Joint::$variant(_) => stringify!($variant),)*
                }
            }

            fn solver(&self) -> &dyn ConstraintSolver {
                match self {
                    $(Joint::$variant(joint) => joint,)*
                }
            }

            fn solver_mut(&mut self) -> &mut dyn ConstraintSolver {
                match self {
                    $(Joint::$variant(joint) => joint,)*
                }
            }
        }

        impl Constraint {
            $(
                pub fn $as_ref(&self) -> Option<&$ty> {
                    match &self.joint {
                        Joint::$variant(joint) => Some(joint),
                        _ => None,
                    }
                }

                pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                    match &mut self.joint {
                        Joint::$variant(joint) => Some(joint),
                        _ => None,
                    }
                }
            )*
        }
    };
}

joint_variants! {
    Pivot(PivotJoint) => as_pivot_joint, as_pivot_joint_mut;
    Pin(PinJoint) => as_pin_joint, as_pin_joint_mut;
    Slide(SlideJoint) => as_slide_joint, as_slide_joint_mut;
    Groove(GrooveJoint) => as_groove_joint, as_groove_joint_mut;
    DampedSpring(DampedSpring) => as_damped_spring, as_damped_spring_mut;
    DampedRotarySpring(DampedRotarySpring) => as_damped_rotary_spring, as_damped_rotary_spring_mut;
    RotaryLimit(RotaryLimitJoint) => as_rotary_limit_joint, as_rotary_limit_joint_mut;
    Ratchet(RatchetJoint) => as_ratchet_joint, as_ratchet_joint_mut;
    Gear(GearJoint) => as_gear_joint, as_gear_joint_mut;
    SimpleMotor(SimpleMotor) => as_simple_motor, as_simple_motor_mut;
}

/// A pairwise relationship between two bodies, enforced by impulses each step.
///
/// The constraint refers to its bodies by handle; the bodies are owned by the
/// [`Space`] and must be added to it before the constraint is.
#[derive(Debug, Clone)]
pub struct Constraint {
    params: ConstraintParams,
    joint: Joint,
}

impl Constraint {
    pub fn new(a: BodyHandle, b: BodyHandle, joint: impl Into<Joint>) -> Result<Self> {
        if a == b {
            return Err(PhysicsError::SameBody(a));
        }
        Ok(Self {
            params: ConstraintParams::new(a, b),
            joint: joint.into(),
        })
    }

    /// Pivot around a single world point, converted into each body's local
    /// frame using the bodies' current transforms.
    pub fn pivot_joint(space: &Space, a: BodyHandle, b: BodyHandle, pivot: Vec2) -> Result<Self> {
        let (body_a, body_b) = lookup_pair(space, a, b)?;
        let joint = PivotJoint::new(body_a.world_to_local(pivot), body_b.world_to_local(pivot));
        Self::new(a, b, joint)
    }

    /// Pivot joining two body-local anchors.
    pub fn pivot_joint_with_anchors(a: BodyHandle, b: BodyHandle, anchor_a: Vec2, anchor_b: Vec2) -> Result<Self> {
        Self::new(a, b, PivotJoint::new(anchor_a, anchor_b))
    }

    /// Pin joint whose distance is the current world distance between the anchors.
    pub fn pin_joint(space: &Space, a: BodyHandle, b: BodyHandle, anchor_a: Vec2, anchor_b: Vec2) -> Result<Self> {
        let (body_a, body_b) = lookup_pair(space, a, b)?;
        let distance = body_a.local_to_world(anchor_a).distance(body_b.local_to_world(anchor_b));
        Self::new(a, b, PinJoint::new(anchor_a, anchor_b, distance)?)
    }

    pub fn slide_joint(
        a: BodyHandle,
        b: BodyHandle,
        anchor_a: Vec2,
        anchor_b: Vec2,
        min: f64,
        max: f64,
    ) -> Result<Self> {
        Self::new(a, b, SlideJoint::new(anchor_a, anchor_b, min, max)?)
    }

    pub fn groove_joint(
        a: BodyHandle,
        b: BodyHandle,
        groove_a: Vec2,
        groove_b: Vec2,
        anchor_b: Vec2,
    ) -> Result<Self> {
        Self::new(a, b, GrooveJoint::new(groove_a, groove_b, anchor_b)?)
    }

    pub fn damped_spring(
        a: BodyHandle,
        b: BodyHandle,
        anchor_a: Vec2,
        anchor_b: Vec2,
        rest_length: f64,
        stiffness: f64,
        damping: f64,
    ) -> Result<Self> {
        let spring = DampedSpring::new(anchor_a, anchor_b, rest_length, stiffness, damping)?;
        Self::new(a, b, spring)
    }

    pub fn damped_rotary_spring(
        a: BodyHandle,
        b: BodyHandle,
        rest_angle: f64,
        stiffness: f64,
        damping: f64,
    ) -> Result<Self> {
        Self::new(a, b, DampedRotarySpring::new(rest_angle, stiffness, damping)?)
    }

    pub fn rotary_limit_joint(a: BodyHandle, b: BodyHandle, min: f64, max: f64) -> Result<Self> {
        Self::new(a, b, RotaryLimitJoint::new(min, max)?)
    }

    /// Ratchet whose tracked angle starts at the bodies' current relative angle.
    pub fn ratchet_joint(space: &Space, a: BodyHandle, b: BodyHandle, phase: f64, ratchet: f64) -> Result<Self> {
        let (body_a, body_b) = lookup_pair(space, a, b)?;
        let joint = RatchetJoint::new(phase, ratchet, body_b.angle - body_a.angle)?;
        Self::new(a, b, joint)
    }

    pub fn gear_joint(a: BodyHandle, b: BodyHandle, phase: f64, ratio: f64) -> Result<Self> {
        Self::new(a, b, GearJoint::new(phase, ratio)?)
    }

    pub fn simple_motor(a: BodyHandle, b: BodyHandle, rate: f64) -> Result<Self> {
        Self::new(a, b, SimpleMotor::new(rate)?)
    }

    pub fn a(&self) -> BodyHandle {
        self.params.a
    }

    pub fn b(&self) -> BodyHandle {
        self.params.b
    }

    pub fn params(&self) -> &ConstraintParams {
        &self.params
    }

    pub fn joint(&self) -> &Joint {
        &self.joint
    }

    pub fn joint_mut(&mut self) -> &mut Joint {
        &mut self.joint
    }

    pub fn max_force(&self) -> f64 {
        self.params.max_force
    }

    /// Maximum force the constraint may apply. Defaults to infinity.
    pub fn set_max_force(&mut self, max_force: f64) -> Result<()> {
        self.params.max_force = error::non_negative("max_force", max_force)?;
        Ok(())
    }

    pub fn max_bias(&self) -> f64 {
        self.params.max_bias
    }

    /// Maximum speed at which positional error is corrected. Defaults to infinity.
    pub fn set_max_bias(&mut self, max_bias: f64) -> Result<()> {
        self.params.max_bias = error::non_negative("max_bias", max_bias)?;
        Ok(())
    }

    pub fn error_bias(&self) -> f64 {
        self.params.error_bias
    }

    /// Fraction of positional error left uncorrected after one second, in (0, 1].
    pub fn set_error_bias(&mut self, error_bias: f64) -> Result<()> {
        if error_bias.is_nan() || error_bias <= 0.0 || error_bias > 1.0 {
            return Err(PhysicsError::InvalidParameter {
                name: "error_bias",
                value: error_bias,
                reason: "must be in (0, 1]",
            });
        }
        self.params.error_bias = error_bias;
        Ok(())
    }

    /// Per-step correction fraction. Unless set explicitly this is the
    /// 60 Hz-equivalent value implied by `error_bias` (0.1 by default).
    pub fn bias_coef(&self) -> f64 {
        self.params
            .bias_coef
            .unwrap_or_else(|| 1.0 - self.params.error_bias.powf(1.0 / 60.0))
    }

    /// Overrides `error_bias` with a fixed per-step correction fraction.
    /// The solver never corrects more than the full error in one step.
    pub fn set_bias_coef(&mut self, bias_coef: f64) -> Result<()> {
        error::finite("bias_coef", bias_coef)?;
        self.params.bias_coef = Some(error::non_negative("bias_coef", bias_coef)?);
        Ok(())
    }

    pub fn collide_bodies(&self) -> bool {
        self.params.collide_bodies
    }

    pub fn set_collide_bodies(&mut self, collide_bodies: bool) {
        self.params.collide_bodies = collide_bodies;
    }

    /// Impulse applied during the most recent step. Always >= 0.
    pub fn impulse(&self) -> f64 {
        self.joint.solver().impulse()
    }

    /// Wakes both bodies, whether or not they are asleep. Works for a
    /// constraint that has not been added to `space` yet.
    pub fn activate_bodies(&self, space: &mut Space) -> Result<()> {
        lookup_pair(space, self.params.a, self.params.b)?;
        space.activate_body(self.params.a)?;
        space.activate_body(self.params.b)
    }

    pub(crate) fn pre_solve(&mut self, a: &mut Body, b: &mut Body, dt: f64) {
        self.joint.solver_mut().pre_solve(&self.params, a, b, dt);
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        self.joint.solver_mut().apply_cached_impulse(a, b, dt_coef);
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, dt: f64) {
        self.joint.solver_mut().apply_impulse(&self.params, a, b, dt);
    }

    pub(crate) fn reset(&mut self) {
        self.joint.solver_mut().reset();
    }
}

fn lookup_pair(space: &Space, a: BodyHandle, b: BodyHandle) -> Result<(&Body, &Body)> {
    let body_a = space.body(a).ok_or(PhysicsError::BodyNotInSpace(a))?;
    let body_b = space.body(b).ok_or(PhysicsError::BodyNotInSpace(b))?;
    Ok((body_a, body_b))
}
