//! Pure collision math: geometry, time-of-impact, and impulse formulas.
//!
//! Every function here is stateless and takes explicit world-space inputs.
//! The time-of-impact routine is analytic for circles translating at constant
//! relative velocity over one tick interval.

use crate::simulation::states::NVec2;

/// Rotate a point counter-clockwise about the origin.
pub fn rotate_point(point: NVec2, angle: f64) -> NVec2 {
    let (sin_a, cos_a) = angle.sin_cos();
    NVec2::new(
        point.x * cos_a - point.y * sin_a,
        point.x * sin_a + point.y * cos_a,
    )
}

/// Linear velocity contributed at offset `r` by an angular velocity `w`
/// about the origin: the perpendicular of `r` scaled by the angular rate.
pub fn angular_point_velocity(w: f64, r: NVec2) -> NVec2 {
    NVec2::new(-w * r.y, w * r.x)
}

/// Closest point to `point` on the infinite line through `a` and `b`.
/// Degenerate case `a == b` returns `a`.
pub fn closest_point_on_segment(a: NVec2, b: NVec2, point: NVec2) -> NVec2 {
    let a_to_p = point - a;
    let a_to_b = b - a;
    let len2 = a_to_b.norm_squared();
    if len2 == 0.0 {
        return a;
    }
    let t = a_to_p.dot(&a_to_b) / len2;
    a + a_to_b * t
}

/// True when two circles touch or overlap.
pub fn circles_overlap(pos_a: NVec2, radius_a: f64, pos_b: NVec2, radius_b: f64) -> bool {
    let distance = (pos_a - pos_b).norm();
    radius_a + radius_b >= distance
}

/// Fractional time in `[0, 1]` at which two moving circles first touch
/// within `interval` seconds, or `None` if they never do.
///
/// Works in the frame of circle B:
/// 1. combine both velocities into one relative displacement over the interval
/// 2. early-reject with a bounding test inflated by the displacement magnitude
/// 3. project B's center onto the displacement line; if the closest approach
///    is farther than the radius sum there is no contact
/// 4. back off along the displacement by the chord half-length to the exact
///    contact instant and convert it to a fraction of the interval
///
/// The fraction is a signed projection onto the displacement direction, so
/// contacts that lie behind the motion (already elapsed) come out negative
/// and are rejected along with times beyond the tick.
pub fn time_of_impact(
    pos_a: NVec2,
    radius_a: f64,
    vel_a: NVec2,
    pos_b: NVec2,
    radius_b: f64,
    vel_b: NVec2,
    interval: f64,
) -> Option<f64> {
    // displacement of A relative to B over the whole interval
    let displacement = (vel_a - vel_b) * interval;
    let magnitude = displacement.norm();

    // no relative motion: never touches within the tick
    if magnitude == 0.0 {
        return None;
    }

    // early escape: A inflated by its reach cannot touch B
    if !circles_overlap(pos_a, radius_a + magnitude, pos_b, radius_b) {
        return None;
    }

    // closest point on the relative motion line to B's center
    let swept_end = pos_a + displacement;
    let closest = closest_point_on_segment(pos_a, swept_end, pos_b);

    let dist2 = (pos_b - closest).norm_squared();
    let radius_total = radius_a + radius_b;
    let radius_total2 = radius_total * radius_total;
    if dist2 > radius_total2 {
        return None;
    }

    // back off along the motion to where the surfaces first touch
    let back_off = (radius_total2 - dist2).sqrt();
    let contact = closest - displacement * (back_off / magnitude);

    // signed fraction of the interval at which contact happens
    let fraction = (contact - pos_a).dot(&displacement) / (magnitude * magnitude);
    if !(0.0..=1.0).contains(&fraction) {
        return None;
    }

    Some(fraction)
}

/// World contact location for two circles whose centers at contact time are
/// `future_a` and `future_b`: the point on the center line at distance
/// `radius_a` from A (equivalently `radius_b` from B when they just touch).
pub fn contact_point(future_a: NVec2, radius_a: f64, future_b: NVec2, radius_b: f64) -> NVec2 {
    let total = radius_a + radius_b;
    if total == 0.0 {
        return future_a;
    }
    future_a + (future_b - future_a) * (radius_a / total)
}

/// Physical state of one root body needed by the impulse formula.
#[derive(Debug, Clone)]
pub struct ContactState {
    pub mass: f64,
    pub moment_of_inertia: f64,
    pub elasticity: f64,
    pub center_of_mass: NVec2, // world space
}

/// Scalar contact impulse along `normal`, or `None` when no impulse applies.
///
/// `normal` is the unit contact normal pointing from body B toward body A;
/// the returned magnitude `j` is applied as `+j*normal` to A and `-j*normal`
/// to B. Returns `None` when the contact points are already separating along
/// the normal, or when either body carries no mass (spectator bodies never
/// produce non-finite state).
pub fn impulse_magnitude(
    a: &ContactState,
    b: &ContactState,
    contact: NVec2,
    normal: NVec2,
    point_velocity_a: NVec2,
    point_velocity_b: NVec2,
) -> Option<f64> {
    if a.mass <= 0.0 || b.mass <= 0.0 {
        return None;
    }

    let relative = point_velocity_a - point_velocity_b;
    let approach = relative.dot(&normal);
    // separating (or grazing) along the normal: nothing to resolve
    if approach >= 0.0 {
        return None;
    }

    let restitution = a.elasticity.min(b.elasticity);

    let r_a = contact - a.center_of_mass;
    let r_b = contact - b.center_of_mass;
    let r_a_cross_n = r_a.perp(&normal);
    let r_b_cross_n = r_b.perp(&normal);

    let inv_inertia_a = if a.moment_of_inertia > 0.0 {
        1.0 / a.moment_of_inertia
    } else {
        0.0
    };
    let inv_inertia_b = if b.moment_of_inertia > 0.0 {
        1.0 / b.moment_of_inertia
    } else {
        0.0
    };

    let denominator = 1.0 / a.mass
        + 1.0 / b.mass
        + r_a_cross_n * r_a_cross_n * inv_inertia_a
        + r_b_cross_n * r_b_cross_n * inv_inertia_b;

    Some(-(1.0 + restitution) * approach / denominator)
}
