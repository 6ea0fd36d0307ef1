use super::vec2::Vec2;

/// Rigid transform of a body: rotation about the center of mass followed by
/// translation to the body's world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f64,
    cos: f64,
    sin: f64,
}

impl Transform {
    pub fn new(position: Vec2, rotation: f64) -> Self {
        let (sin, cos) = rotation.sin_cos();
        Self {
            position,
            rotation,
            cos,
            sin,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }

    /// Rotates a body-local direction into world orientation. No translation.
    pub fn rotate_vector(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.cos - v.y * self.sin, v.x * self.sin + v.y * self.cos)
    }

    /// Rotates a world direction into body-local orientation. No translation.
    pub fn inverse_rotate_vector(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.cos + v.y * self.sin, -v.x * self.sin + v.y * self.cos)
    }

    /// Maps a body-local point to world space.
    pub fn apply(&self, point: Vec2) -> Vec2 {
        self.rotate_vector(point) + self.position
    }

    /// Maps a world point into body-local space.
    pub fn apply_inverse(&self, point: Vec2) -> Vec2 {
        self.inverse_rotate_vector(point - self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
