pub mod mat2;
pub mod transform;
pub mod vec2;

pub use mat2::Mat2;
pub use transform::Transform;
pub use vec2::Vec2;
