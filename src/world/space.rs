use hashbrown::HashMap;
use log::{debug, trace};

use crate::common::error::{PhysicsError, Result};
use crate::constraints::{get_mutable_body_pair, Constraint, ConstraintHandle};
use crate::integration::integrator;
use crate::math::vec2::Vec2;
use crate::objects::{Body, BodyHandle, BodyKind, SleepState};

use super::config::{self, SpaceConfig};
use super::island;

/// Owns bodies and the constraints between them, and advances them in time.
///
/// Bodies and constraints keep their insertion order across removals, and
/// every step visits them in that order, so identical inputs give identical
/// results.
#[derive(Debug, Clone)]
pub struct Space {
    bodies: Vec<Body>,
    body_handles: Vec<BodyHandle>,
    body_index: HashMap<BodyHandle, usize>,
    next_body: u64,

    constraints: Vec<Constraint>,
    constraint_handles: Vec<ConstraintHandle>,
    constraint_index: HashMap<ConstraintHandle, usize>,
    next_constraint: u64,

    gravity: Vec2,
    iterations: usize,
    damping: f64,
    idle_speed_threshold: f64,
    sleep_time_threshold: f64,

    current_time_step: f64,
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

impl Space {
    /// Creates an empty space with zero gravity and sleeping disabled.
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            body_handles: Vec::new(),
            body_index: HashMap::new(),
            next_body: 0,
            constraints: Vec::new(),
            constraint_handles: Vec::new(),
            constraint_index: HashMap::new(),
            next_constraint: 0,
            gravity: Vec2::ZERO,
            iterations: 10,
            damping: 1.0,
            idle_speed_threshold: 0.0,
            sleep_time_threshold: f64::INFINITY,
            current_time_step: 0.0,
        }
    }

    pub fn with_config(config: SpaceConfig) -> Result<Self> {
        config.validate()?;
        let mut space = Self::new();
        space.gravity = config.gravity;
        space.iterations = config.iterations;
        space.damping = config.damping;
        space.idle_speed_threshold = config.idle_speed_threshold;
        space.sleep_time_threshold = config.sleep_time_threshold.unwrap_or(f64::INFINITY);
        Ok(space)
    }

    /// Current settings, in the form accepted by [`with_config`](Self::with_config).
    pub fn config(&self) -> SpaceConfig {
        SpaceConfig {
            gravity: self.gravity,
            iterations: self.iterations,
            damping: self.damping,
            idle_speed_threshold: self.idle_speed_threshold,
            sleep_time_threshold: self.sleeping_enabled().then_some(self.sleep_time_threshold),
        }
    }

    // Bodies

    pub fn add_body(&mut self, mut body: Body) -> BodyHandle {
        let handle = BodyHandle(self.next_body);
        self.next_body += 1;

        body.wake();
        self.body_index.insert(handle, self.bodies.len());
        self.bodies.push(body);
        self.body_handles.push(handle);
        handle
    }

    /// Removes a body that no constraint refers to any more.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<Body> {
        let idx = self.index_of(handle)?;

        let count = self.constraints_of(handle).count();
        if count > 0 {
            debug!("refusing to remove body {handle:?}: {count} constraint(s) attached");
            return Err(PhysicsError::BodyHasConstraints { body: handle, count });
        }

        self.body_index.remove(&handle);
        self.body_handles.remove(idx);
        let body = self.bodies.remove(idx);
        for (i, h) in self.body_handles.iter().enumerate().skip(idx) {
            self.body_index.insert(*h, i);
        }
        Ok(body)
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.body_index.contains_key(&handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.body_index.get(&handle).map(|&idx| &self.bodies[idx])
    }

    /// Mutable access to a body. Touching a body wakes it along with its island.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let idx = *self.body_index.get(&handle)?;
        self.wake_island_of(idx);
        Some(&mut self.bodies[idx])
    }

    /// Bodies in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.body_handles.iter().copied().zip(self.bodies.iter())
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // Constraints

    /// Adds a constraint between two bodies already in this space and wakes them.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintHandle> {
        let idx_a = self.index_of(constraint.a())?;
        let idx_b = self.index_of(constraint.b())?;

        let handle = ConstraintHandle(self.next_constraint);
        self.next_constraint += 1;

        self.constraint_index.insert(handle, self.constraints.len());
        self.constraints.push(constraint);
        self.constraint_handles.push(handle);

        self.wake_island_of(idx_a);
        self.wake_island_of(idx_b);
        Ok(handle)
    }

    /// Removes a constraint and wakes the bodies it connected.
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<Constraint> {
        let idx = *self
            .constraint_index
            .get(&handle)
            .ok_or(PhysicsError::ConstraintNotInSpace(handle))?;

        // Wake while the link still holds the island together
        let (a, b) = (self.constraints[idx].a(), self.constraints[idx].b());
        for body in [a, b] {
            if let Some(&body_idx) = self.body_index.get(&body) {
                self.wake_island_of(body_idx);
            }
        }

        self.constraint_index.remove(&handle);
        self.constraint_handles.remove(idx);
        let constraint = self.constraints.remove(idx);
        for (i, h) in self.constraint_handles.iter().enumerate().skip(idx) {
            self.constraint_index.insert(*h, i);
        }
        Ok(constraint)
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraint_index.get(&handle).map(|&idx| &self.constraints[idx])
    }

    /// Mutable access to a constraint. Wakes both of its bodies.
    pub fn constraint_mut(&mut self, handle: ConstraintHandle) -> Option<&mut Constraint> {
        let idx = *self.constraint_index.get(&handle)?;
        for body in [self.constraints[idx].a(), self.constraints[idx].b()] {
            if let Some(&body_idx) = self.body_index.get(&body) {
                self.wake_island_of(body_idx);
            }
        }
        Some(&mut self.constraints[idx])
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintHandle, &Constraint)> + '_ {
        self.constraint_handles.iter().copied().zip(self.constraints.iter())
    }

    /// Handles of the constraints attached to `body`.
    pub fn constraints_of(&self, body: BodyHandle) -> impl Iterator<Item = ConstraintHandle> + '_ {
        self.constraints()
            .filter(move |(_, c)| c.a() == body || c.b() == body)
            .map(|(h, _)| h)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    // Settings

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) -> Result<()> {
        self.gravity = config::validate_gravity(gravity)?;
        Ok(())
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn set_iterations(&mut self, iterations: usize) -> Result<()> {
        self.iterations = config::validate_iterations(iterations)?;
        Ok(())
    }

    /// Fraction of velocity kept after one second; 1.0 means no damping.
    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn set_damping(&mut self, damping: f64) -> Result<()> {
        self.damping = config::validate_damping(damping)?;
        Ok(())
    }

    pub fn idle_speed_threshold(&self) -> f64 {
        self.idle_speed_threshold
    }

    pub fn set_idle_speed_threshold(&mut self, threshold: f64) -> Result<()> {
        self.idle_speed_threshold = config::validate_idle_speed_threshold(threshold)?;
        Ok(())
    }

    /// Seconds an island must idle before it sleeps. Infinity disables sleeping.
    pub fn sleep_time_threshold(&self) -> f64 {
        self.sleep_time_threshold
    }

    /// Setting an infinite threshold wakes every sleeping body.
    pub fn set_sleep_time_threshold(&mut self, threshold: f64) -> Result<()> {
        self.sleep_time_threshold = config::validate_sleep_time_threshold(threshold)?;
        if !self.sleeping_enabled() {
            self.bodies.iter_mut().for_each(Body::wake);
        }
        Ok(())
    }

    /// Length of the most recent step, 0 before the first one.
    pub fn current_time_step(&self) -> f64 {
        self.current_time_step
    }

    fn sleeping_enabled(&self) -> bool {
        self.sleep_time_threshold.is_finite()
    }

    // Sleeping

    /// Puts a dynamic body and its whole island to sleep immediately.
    pub fn sleep_body(&mut self, handle: BodyHandle) -> Result<()> {
        let idx = self.index_of(handle)?;
        if !self.sleeping_enabled() {
            return Err(PhysicsError::SleepingDisabled);
        }
        if !self.bodies[idx].is_dynamic() {
            return Err(PhysicsError::NotDynamic(handle));
        }

        let members = island::island_of(&self.bodies, &self.links(), idx);
        debug!("island of {handle:?} ({} bodies) put to sleep", members.len());
        for i in members {
            self.bodies[i].sleep = SleepState::Sleeping;
        }
        Ok(())
    }

    /// Wakes a body and its island. For a static or kinematic body, wakes
    /// the islands of the dynamic bodies constrained to it.
    pub fn activate_body(&mut self, handle: BodyHandle) -> Result<()> {
        let idx = self.index_of(handle)?;
        self.wake_island_of(idx);
        Ok(())
    }

    fn wake_island_of(&mut self, idx: usize) {
        if !self.bodies.iter().any(Body::is_sleeping) {
            return;
        }

        let links = self.links();
        let seeds: Vec<usize> = if self.bodies[idx].is_dynamic() {
            vec![idx]
        } else {
            links
                .iter()
                .filter_map(|&(a, b)| match (a == idx, b == idx) {
                    (true, _) => Some(b),
                    (_, true) => Some(a),
                    _ => None,
                })
                .filter(|&other| self.bodies[other].is_dynamic())
                .collect()
        };

        for seed in seeds {
            let members = island::island_of(&self.bodies, &links, seed);
            if members.iter().any(|&i| self.bodies[i].is_sleeping()) {
                debug!("waking island of {} bodies", members.len());
            }
            for i in members {
                self.bodies[i].wake();
            }
        }
    }

    /// Body index pairs joined by each constraint, in constraint order.
    fn links(&self) -> Vec<(usize, usize)> {
        self.constraints
            .iter()
            .filter_map(|c| Some((*self.body_index.get(&c.a())?, *self.body_index.get(&c.b())?)))
            .collect()
    }

    fn index_of(&self, handle: BodyHandle) -> Result<usize> {
        self.body_index
            .get(&handle)
            .copied()
            .ok_or(PhysicsError::BodyNotInSpace(handle))
    }

    // Stepping

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64) -> Result<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PhysicsError::InvalidParameter {
                name: "dt",
                value: dt,
                reason: "must be finite and > 0",
            });
        }

        let prev_dt = self.current_time_step;
        self.current_time_step = dt;
        let dt_coef = if prev_dt == 0.0 { 0.0 } else { dt / prev_dt };

        // 1. Positions, using the velocities solved last step
        for body in self.bodies.iter_mut().filter(|b| !b.is_sleeping()) {
            integrator::integrate_position(body, dt);
        }

        // 2. Pre-solve; a constraint needs an awake dynamic body to act on
        let awake = |body: &Body| body.is_dynamic() && !body.is_sleeping();
        let mut active = Vec::with_capacity(self.constraints.len());
        for (ci, constraint) in self.constraints.iter_mut().enumerate() {
            let (Some(&ia), Some(&ib)) = (
                self.body_index.get(&constraint.a()),
                self.body_index.get(&constraint.b()),
            ) else {
                continue;
            };
            if awake(&self.bodies[ia]) || awake(&self.bodies[ib]) {
                active.push((ci, ia, ib));
            } else {
                constraint.reset();
            }
        }
        for &(ci, ia, ib) in &active {
            let (a, b) = get_mutable_body_pair(&mut self.bodies, ia, ib);
            self.constraints[ci].pre_solve(a, b, dt);
        }

        // 3. Velocities
        for body in self.bodies.iter_mut().filter(|b| !b.is_sleeping()) {
            integrator::integrate_velocity(body, self.gravity, self.damping, dt);
        }

        // 4. Warm start
        for &(ci, ia, ib) in &active {
            let (a, b) = get_mutable_body_pair(&mut self.bodies, ia, ib);
            self.constraints[ci].apply_cached_impulse(a, b, dt_coef);
        }

        // 5. Solve
        for _ in 0..self.iterations {
            for &(ci, ia, ib) in &active {
                let (a, b) = get_mutable_body_pair(&mut self.bodies, ia, ib);
                self.constraints[ci].apply_impulse(a, b, dt);
            }
        }

        // 6. Sleep
        if self.sleeping_enabled() {
            let links = self.links();
            self.update_sleeping(dt, &links);
        }

        trace!(
            "step dt={dt} bodies={} active constraints={}/{}",
            self.bodies.len(),
            active.len(),
            self.constraints.len()
        );
        Ok(())
    }

    fn update_sleeping(&mut self, dt: f64, links: &[(usize, usize)]) {
        let dv = self.idle_speed_threshold;
        let dvsq = if dv != 0.0 { dv * dv } else { self.gravity.magnitude_squared() * dt * dt };

        for body in self.bodies.iter_mut().filter(|b| b.is_dynamic() && !b.is_sleeping()) {
            let ke_threshold = if dvsq != 0.0 { body.mass() * dvsq } else { 0.0 };
            body.idle_time = if body.kinetic_energy() > ke_threshold {
                0.0
            } else {
                body.idle_time + dt
            };
        }

        // Dynamic bodies held awake by a moving kinematic body
        let mut held = vec![false; self.bodies.len()];
        for &(ia, ib) in links {
            for (this, other) in [(ia, ib), (ib, ia)] {
                let driver = &self.bodies[other];
                let moving = driver.velocity != Vec2::ZERO || driver.angular_velocity != 0.0;
                if driver.kind() == BodyKind::Kinematic && moving {
                    held[this] = true;
                }
            }
        }

        for members in island::build_islands(&self.bodies, links) {
            if members.iter().any(|&i| held[i]) {
                if members.iter().any(|&i| self.bodies[i].is_sleeping()) {
                    debug!("moving kinematic body woke an island of {} bodies", members.len());
                }
                for &i in &members {
                    self.bodies[i].wake();
                }
                continue;
            }

            let ready = members.iter().all(|&i| {
                let body = &self.bodies[i];
                !body.is_sleeping() && body.idle_time >= self.sleep_time_threshold
            });
            if ready {
                debug!("island of {} bodies fell asleep", members.len());
                for &i in &members {
                    self.bodies[i].sleep = SleepState::Sleeping;
                }
            }
        }
    }
}
