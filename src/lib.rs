//! A 2D rigid-body constraint solver.
//!
//! Bodies live in a [`Space`] and are tied together by [`Constraint`]s: pivots,
//! pins, slides, grooves, springs, rotary limits, ratchets, gears and motors.
//! Each [`Space::step`] runs a warm-started sequential-impulse solver and puts
//! idle islands of bodies to sleep.
//!
//! ```
//! use rigid2d::{Body, Constraint, Space, Vec2};
//!
//! let mut space = Space::new();
//! space.set_gravity(Vec2::new(0.0, -10.0)).unwrap();
//!
//! let ground = space.add_body(Body::new_static());
//! let bob = space.add_body(Body::new(1.0, 1.0).unwrap().at(Vec2::new(0.0, -5.0)));
//! let rod = Constraint::pin_joint(&space, ground, bob, Vec2::ZERO, Vec2::ZERO).unwrap();
//! space.add_constraint(rod).unwrap();
//!
//! for _ in 0..60 {
//!     space.step(1.0 / 60.0).unwrap();
//! }
//! ```

pub mod common;
pub mod constraints;
pub mod integration;
pub mod logging;
pub mod math;
pub mod objects;
pub mod world;

// Re-export key types for easier use
pub use common::{ErrorKind, PhysicsError, Result};
pub use constraints::{
    Constraint, ConstraintHandle, ConstraintParams, ConstraintSolver, DampedRotarySpring,
    DampedSpring, GearJoint, GrooveJoint, Joint, PinJoint, PivotJoint, RatchetJoint,
    RotaryLimitJoint, SimpleMotor, SlideJoint, SpringFn,
};
pub use logging::{init as init_logging, LevelFilter};
pub use math::{Mat2, Transform, Vec2};
pub use objects::{Body, BodyHandle, BodyKind, SleepState};
pub use world::{Space, SpaceConfig};
