use crate::math::vec2::Vec2;
use crate::objects::Body;

/// Semi-implicit Euler velocity update for a dynamic body.
///
/// `damping` is the fraction of velocity kept after one second. Force and
/// torque accumulators are cleared afterwards.
pub fn integrate_velocity(body: &mut Body, gravity: Vec2, damping: f64, dt: f64) {
    if !body.is_dynamic() {
        body.clear_accumulators();
        return;
    }

    let damping = damping.powf(dt);

    let linear_acceleration = gravity * body.gravity_scale + body.force * body.inv_mass();
    body.velocity = body.velocity * damping + linear_acceleration * dt;

    let angular_acceleration = body.torque * body.inv_moment();
    body.angular_velocity = body.angular_velocity * damping + angular_acceleration * dt;

    body.clear_accumulators();
}

/// Advances position and angle using the current velocities. Static bodies
/// never move. The angle is not wrapped so rotary joints see cumulative turns.
pub fn integrate_position(body: &mut Body, dt: f64) {
    if body.is_static() {
        return;
    }

    body.position += body.velocity * dt;
    body.angle += body.angular_velocity * dt;
}
