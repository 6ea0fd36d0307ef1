use super::vec2::Vec2;

/// Row-major 2x2 matrix, used for the inverse effective mass of point joints.
///
/// ```text
/// | a  b |
/// | c  d |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mat2 {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Mat2 {
    pub const ZERO: Mat2 = Mat2 { a: 0.0, b: 0.0, c: 0.0, d: 0.0 };

    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse matrix, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let det_inv = 1.0 / det;
        Some(Self::new(
            self.d * det_inv,
            -self.b * det_inv,
            -self.c * det_inv,
            self.a * det_inv,
        ))
    }

    pub fn transform(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.a + v.y * self.b, v.x * self.c + v.y * self.d)
    }
}
