pub mod body;

pub use body::{Body, BodyKind, SleepState};

/// Identity of a body inside a [`Space`](crate::world::Space).
///
/// Issued by `Space::add_body` and never reused, so a handle to a removed body
/// stays invalid instead of aliasing a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u64);
