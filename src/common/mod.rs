pub mod error;

pub use error::{ErrorKind, PhysicsError, Result};
