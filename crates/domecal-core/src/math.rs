use nalgebra::{Point3, Vector2, Vector3};

pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Pt3 = Point3<Real>;

/// Real roots of `a t^2 + b t + c = 0`, sorted ascending.
///
/// Uses the cancellation-free form `q = -(b + sign(b) sqrt(disc)) / 2`,
/// `t0 = q / a`, `t1 = c / q`. A double root is returned twice. Returns
/// `None` when the discriminant is negative or the equation is degenerate.
pub fn solve_quadratic(a: Real, b: Real, c: Real) -> Option<(Real, Real)> {
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        let t = -c / b;
        return Some((t, t));
    }

    let disc = b * b - 4.0 * a * c;
    if disc.is_nan() || disc < 0.0 {
        return None;
    }

    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        // b == 0 and c == 0
        return Some((0.0, 0.0));
    }

    let t0 = q / a;
    let t1 = c / q;
    Some(if t0 <= t1 { (t0, t1) } else { (t1, t0) })
}

/// Unit vector along `v`, or `None` for a zero or non-finite vector.
pub fn normalize_checked(v: &Vec3) -> Option<Vec3> {
    let n = v.norm();
    if n > 0.0 && n.is_finite() {
        Some(v / n)
    } else {
        None
    }
}

/// Specular reflection of `incident` about the unit `normal`: `i - 2 (i·n) n`.
pub fn reflect(incident: &Vec3, normal: &Vec3) -> Vec3 {
    incident - normal * (2.0 * incident.dot(normal))
}

/// Angle between two vectors in radians, robust for nearly parallel inputs.
pub fn angle_between(a: &Vec3, b: &Vec3) -> Real {
    a.cross(b).norm().atan2(a.dot(b))
}
