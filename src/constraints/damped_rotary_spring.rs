use super::solver::angular_effective_mass;
use super::{ConstraintParams, ConstraintSolver, SpringFn};
use crate::common::error::{self, Result};
use crate::objects::Body;

/// Angular spring with a damper, acting on the relative angle `a.angle - b.angle`.
#[derive(Debug, Clone)]
pub struct DampedRotarySpring {
    rest_angle: f64,
    stiffness: f64,
    damping: f64,
    torque_func: Option<SpringFn>,

    i_sum: f64,
    target_wrn: f64,
    w_coef: f64,
    j_acc: f64,
}

fn checked(name: &'static str, value: f64) -> Result<f64> {
    error::non_negative(name, error::finite(name, value)?)
}

impl DampedRotarySpring {
    pub fn new(rest_angle: f64, stiffness: f64, damping: f64) -> Result<Self> {
        Ok(Self {
            rest_angle: error::finite("rest_angle", rest_angle)?,
            stiffness: checked("stiffness", stiffness)?,
            damping: checked("damping", damping)?,
            torque_func: None,
            i_sum: 0.0,
            target_wrn: 0.0,
            w_coef: 0.0,
            j_acc: 0.0,
        })
    }

    pub fn rest_angle(&self) -> f64 {
        self.rest_angle
    }

    pub fn set_rest_angle(&mut self, rest_angle: f64) -> Result<()> {
        self.rest_angle = error::finite("rest_angle", rest_angle)?;
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

    /// Replaces the default torque curve with `f(relative_angle)`. Called once
    /// per step, before any impulse of that step is applied.
    pub fn set_torque_func(&mut self, f: SpringFn) {
        self.torque_func = Some(f);
    }

    pub fn clear_torque_func(&mut self) {
        self.torque_func = None;
    }

    pub fn torque_func(&self) -> Option<&SpringFn> {
        self.torque_func.as_ref()
    }

    /// Torque at relative angle `relative_angle` (`a.angle - b.angle`).
    pub fn spring_torque(&self, relative_angle: f64) -> f64 {
        match &self.torque_func {
            Some(f) => f.call(relative_angle),
            None => (relative_angle - self.rest_angle) * self.stiffness,
        }
    }
}

impl ConstraintSolver for DampedRotarySpring {
    fn pre_solve(&mut self, _params: &ConstraintParams, a: &mut Body, b: &mut Body, dt: f64) {
        let moment = a.inv_moment() + b.inv_moment();
        self.i_sum = angular_effective_mass(a, b).unwrap_or(0.0);
        self.w_coef = if self.i_sum == 0.0 {
            0.0
        } else {
            1.0 - (-self.damping * dt * moment).exp()
        };
        self.target_wrn = 0.0;

        let j_spring = self.spring_torque(a.angle - b.angle) * dt;
        self.j_acc = j_spring;

        a.angular_velocity -= j_spring * a.inv_moment();
        b.angular_velocity += j_spring * b.inv_moment();
    }

    fn apply_cached_impulse(&mut self, _a: &mut Body, _b: &mut Body, _dt_coef: f64) {}

    fn apply_impulse(&mut self, _params: &ConstraintParams, a: &mut Body, b: &mut Body, _dt: f64) {
        let wrn = a.angular_velocity - b.angular_velocity;

        let w_damp = (self.target_wrn - wrn) * self.w_coef;
        self.target_wrn = wrn + w_damp;

        let j_damp = w_damp * self.i_sum;
        self.j_acc += j_damp;

        a.angular_velocity += j_damp * a.inv_moment();
        b.angular_velocity -= j_damp * b.inv_moment();
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

    fn params() -> ConstraintParams {
        ConstraintParams::new(BodyHandle(0), BodyHandle(1))
    }

    #[test]
    fn test_damped_rotary_spring_new() {
        let s = DampedRotarySpring::new(0.4, 2.0, 3.0).unwrap();
        assert_eq!(s.rest_angle(), 0.4);
        assert_eq!(s.stiffness(), 2.0);
        assert_eq!(s.damping(), 3.0);
        assert!(s.torque_func().is_none());
    }

    #[test]
    fn test_damped_rotary_spring_setters() {
        let mut s = DampedRotarySpring::new(0.0, 0.0, 0.0).unwrap();
        s.set_rest_angle(-1.0).unwrap();
        s.set_stiffness(5.0).unwrap();
        s.set_damping(6.0).unwrap();
        assert_eq!((s.rest_angle(), s.stiffness(), s.damping()), (-1.0, 5.0, 6.0));
        assert!(s.set_rest_angle(f64::INFINITY).is_err());
        assert!(s.set_stiffness(-5.0).is_err());
        assert_eq!(s.stiffness(), 5.0);
    }

    #[test]
    fn test_spring_torque_twists_back_to_rest() {
        let mut a = Body::new(1.0, 1.0).unwrap();
        let mut b = Body::new(1.0, 1.0).unwrap();
        a.angle = 1.0;
        let mut spring = DampedRotarySpring::new(0.0, 2.0, 0.0).unwrap();

        spring.pre_solve(&params(), &mut a, &mut b, 0.5);

        // Torque (1 - 0) * 2 for half a second
        assert!((a.angular_velocity - -1.0).abs() < EPSILON);
        assert!((b.angular_velocity - 1.0).abs() < EPSILON);
        assert!((spring.impulse() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_custom_torque_func_receives_relative_angle() {
        let mut a = Body::new(1.0, 1.0).unwrap();
        let mut b = Body::new(1.0, 1.0).unwrap();
        a.angle = 0.25;
        b.angle = 1.0;
        let mut spring = DampedRotarySpring::new(0.0, 0.0, 0.0).unwrap();
        spring.set_torque_func(SpringFn::new(|angle| angle * 4.0));
        assert_eq!(spring.spring_torque(-0.75), -3.0);

        spring.pre_solve(&params(), &mut a, &mut b, 1.0);

        assert!((a.angular_velocity - 3.0).abs() < EPSILON);
        spring.clear_torque_func();
        assert_eq!(spring.spring_torque(-0.75), 0.0);
    }

    #[test]
    fn test_damping_brings_spin_rates_together() {
        let mut a = Body::new(1.0, 1.0).unwrap();
        let mut b = Body::new(1.0, 1.0).unwrap();
        a.angular_velocity = 2.0;
        let mut spring = DampedRotarySpring::new(0.0, 0.0, 10.0).unwrap();
        let params = params();

        spring.pre_solve(&params, &mut a, &mut b, 0.1);
        for _ in 0..10 {
            spring.apply_impulse(&params, &mut a, &mut b, 0.1);
        }

        let wrn = a.angular_velocity - b.angular_velocity;
        assert!(wrn > 0.0 && wrn < 2.0);
        // Angular momentum is conserved between equal moments
        assert!((a.angular_velocity + b.angular_velocity - 2.0).abs() < EPSILON);
    }
}
