use crate::common::error::{self, PhysicsError, Result};
use crate::math::{Transform, Vec2};

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Finite mass, moved by gravity, forces and constraint impulses.
    Dynamic,
    /// Infinite mass, moved only by its user-set velocity.
    Kinematic,
    /// Infinite mass, never moves.
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepState {
    #[default]
    Awake,
    Sleeping,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    kind: BodyKind,

    // Primary state
    pub position: Vec2, // World position of the center of mass
    pub angle: f64,     // Radians, cumulative (never wrapped)
    pub velocity: Vec2,
    pub angular_velocity: f64,

    // Accumulators, cleared after velocity integration
    pub force: Vec2,
    pub torque: f64,

    /// Multiplier applied to the space gravity for this body.
    pub gravity_scale: f64,

    mass: f64,
    inv_mass: f64,
    moment: f64,
    inv_moment: f64,

    pub(crate) sleep: SleepState,
    pub(crate) idle_time: f64,
}

impl Body {
    /// Creates a dynamic body. `mass` must be finite and positive; `moment`
    /// must be positive and may be `f64::INFINITY` for a body that never rotates.
    pub fn new(mass: f64, moment: f64) -> Result<Self> {
        let mut body = Self::with_kind(BodyKind::Dynamic);
        body.set_mass(mass)?;
        body.set_moment(moment)?;
        Ok(body)
    }

    /// Creates a static body (infinite mass and moment) at the origin.
    pub fn new_static() -> Self {
        Self::with_kind(BodyKind::Static)
    }

    /// Creates a kinematic body (infinite mass and moment, user-driven velocity).
    pub fn new_kinematic() -> Self {
        Self::with_kind(BodyKind::Kinematic)
    }

    fn with_kind(kind: BodyKind) -> Self {
        Self {
            kind,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            gravity_scale: 1.0,
            mass: f64::INFINITY,
            inv_mass: 0.0,
            moment: f64::INFINITY,
            inv_moment: 0.0,
            sleep: SleepState::Awake,
            idle_time: 0.0,
        }
    }

    /// Builder-style position setter.
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    pub fn moment(&self) -> f64 {
        self.moment
    }

    pub fn inv_moment(&self) -> f64 {
        self.inv_moment
    }

    /// Sets the mass of a dynamic body. Static and kinematic bodies keep their
    /// infinite mass and reject the call.
    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        if self.kind != BodyKind::Dynamic {
            return Err(PhysicsError::InvalidParameter {
                name: "mass",
                value: mass,
                reason: "only dynamic bodies have a settable mass",
            });
        }
        error::finite("mass", mass)?;
        if mass <= 0.0 {
            return Err(PhysicsError::InvalidParameter {
                name: "mass",
                value: mass,
                reason: "must be > 0",
            });
        }
        self.mass = mass;
        self.inv_mass = 1.0 / mass;
        Ok(())
    }

    /// Sets the moment of inertia of a dynamic body. `f64::INFINITY` locks rotation.
    pub fn set_moment(&mut self, moment: f64) -> Result<()> {
        if self.kind != BodyKind::Dynamic {
            return Err(PhysicsError::InvalidParameter {
                name: "moment",
                value: moment,
                reason: "only dynamic bodies have a settable moment",
            });
        }
        if moment.is_nan() || moment <= 0.0 {
            return Err(PhysicsError::InvalidParameter {
                name: "moment",
                value: moment,
                reason: "must be > 0",
            });
        }
        self.moment = moment;
        self.inv_moment = if moment.is_infinite() { 0.0 } else { 1.0 / moment };
        Ok(())
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleep == SleepState::Sleeping
    }

    pub fn sleep_state(&self) -> SleepState {
        self.sleep
    }

    /// Seconds this body has spent below the space's idle speed threshold.
    pub fn idle_time(&self) -> f64 {
        self.idle_time
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.angle)
    }

    pub fn local_to_world(&self, point: Vec2) -> Vec2 {
        self.transform().apply(point)
    }

    pub fn world_to_local(&self, point: Vec2) -> Vec2 {
        self.transform().apply_inverse(point)
    }

    /// Velocity of the material point currently at `point` (world space).
    pub fn velocity_at_world_point(&self, point: Vec2) -> Vec2 {
        let r = point - self.position;
        self.velocity + r.perpendicular() * self.angular_velocity
    }

    /// `m*|v|^2 + i*w^2`, with infinite terms counted as zero when the matching
    /// velocity is zero.
    pub fn kinetic_energy(&self) -> f64 {
        let vsq = self.velocity.magnitude_squared();
        let wsq = self.angular_velocity * self.angular_velocity;
        let linear = if vsq != 0.0 { vsq * self.mass } else { 0.0 };
        let angular = if wsq != 0.0 { wsq * self.moment } else { 0.0 };
        linear + angular
    }

    /// Applies an impulse at `offset` from the center of mass (world orientation).
    pub fn apply_impulse(&mut self, impulse: Vec2, offset: Vec2) {
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += offset.cross(impulse) * self.inv_moment;
    }

    /// Applies an impulse at a point given in body-local coordinates.
    pub fn apply_impulse_at_local_point(&mut self, impulse: Vec2, point: Vec2) {
        let offset = self.transform().rotate_vector(point);
        self.apply_impulse(impulse, offset);
    }

    /// Applies a force at the center of mass.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Applies a force at a world point, generating torque about the center of mass.
    pub fn apply_force_at_point(&mut self, force: Vec2, point_world: Vec2) {
        self.force += force;
        let radius_vector = point_world - self.position;
        self.torque += radius_vector.cross(force);
    }

    pub fn clear_accumulators(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    pub(crate) fn wake(&mut self) {
        self.sleep = SleepState::Awake;
        self.idle_time = 0.0;
    }
}
