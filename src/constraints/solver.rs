//! Impulse helpers shared by the joint solvers.
//!
//! Every joint works on the same primitives: the relative velocity of two
//! anchor points, the effective mass along an axis (scalar) or in the plane
//! (2x2), and the application of equal and opposite impulses.

use crate::math::{Mat2, Vec2};
use crate::objects::Body;

/// Velocity of B's anchor relative to A's anchor. `r1`/`r2` are world-space
/// offsets of the anchors from each body's center of mass.
pub(crate) fn relative_velocity(a: &Body, b: &Body, r1: Vec2, r2: Vec2) -> Vec2 {
    let v1 = a.velocity + r1.perpendicular() * a.angular_velocity;
    let v2 = b.velocity + r2.perpendicular() * b.angular_velocity;
    v2 - v1
}

pub(crate) fn normal_relative_velocity(a: &Body, b: &Body, r1: Vec2, r2: Vec2, n: Vec2) -> f64 {
    relative_velocity(a, b, r1, r2).dot(n)
}

/// Applies `-j` to A at `r1` and `j` to B at `r2`.
pub(crate) fn apply_impulses(a: &mut Body, b: &mut Body, r1: Vec2, r2: Vec2, j: Vec2) {
    a.apply_impulse(-j, r1);
    b.apply_impulse(j, r2);
}

/// Applies an angular impulse: `-j` to A, `j` to B.
pub(crate) fn apply_angular_impulses(a: &mut Body, b: &mut Body, j: f64) {
    a.angular_velocity -= j * a.inv_moment();
    b.angular_velocity += j * b.inv_moment();
}

fn k_scalar_body(body: &Body, r: Vec2, n: Vec2) -> f64 {
    let rcn = r.cross(n);
    body.inv_mass() + body.inv_moment() * rcn * rcn
}

/// Inverse effective mass along `n`.
pub(crate) fn k_scalar(a: &Body, b: &Body, r1: Vec2, r2: Vec2, n: Vec2) -> f64 {
    k_scalar_body(a, r1, n) + k_scalar_body(b, r2, n)
}

/// Effective mass matrix of a point-to-point joint, `None` when singular.
pub(crate) fn k_tensor(a: &Body, b: &Body, r1: Vec2, r2: Vec2) -> Option<Mat2> {
    let m_sum = a.inv_mass() + b.inv_mass();

    let mut k = Mat2::new(m_sum, 0.0, 0.0, m_sum);

    for (body, r) in [(a, r1), (b, r2)] {
        let i_inv = body.inv_moment();
        let rxsq = r.x * r.x * i_inv;
        let rysq = r.y * r.y * i_inv;
        let rnxy = -r.x * r.y * i_inv;
        k.a += rysq;
        k.b += rnxy;
        k.c += rnxy;
        k.d += rxsq;
    }

    k.inverse()
}

/// Reciprocal of an inverse effective mass, `None` when it is zero or not finite.
pub(crate) fn effective_mass(k: f64) -> Option<f64> {
    if k == 0.0 || !k.is_finite() {
        None
    } else {
        Some(1.0 / k)
    }
}

/// Reciprocal of the summed inverse moments of two bodies.
pub(crate) fn angular_effective_mass(a: &Body, b: &Body) -> Option<f64> {
    effective_mass(a.inv_moment() + b.inv_moment())
}
