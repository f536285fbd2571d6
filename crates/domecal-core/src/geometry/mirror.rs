use crate::{
    normalize_checked, reflect, GeometryError, Real, RootSelection, Sphere, Surface, Vec3,
};

/// A projector ray after bouncing off the mirror.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorReflection {
    /// Hit point `N`, relative to the mirror centre.
    pub point: Vec3,
    /// Outward unit normal at `N`.
    pub normal: Vec3,
    /// Unit direction of the incoming ray.
    pub incident: Vec3,
    /// Unit direction of the reflected ray.
    pub reflected: Vec3,
    /// Distance travelled from the projector to `N`.
    pub throw: Real,
}

/// Trace a ray from the projector focal point `projector` along the unit
/// direction `dir` to the mirror sphere centred at the origin, and reflect it.
pub fn reflect_off_mirror(
    projector: &Vec3,
    dir: &Vec3,
    mirror_radius: Real,
) -> Result<MirrorReflection, GeometryError> {
    let mirror = Sphere::new(Vec3::zeros(), mirror_radius);
    let t = mirror.hit(projector, dir, RootSelection::Near, Surface::Mirror)?;

    let pn = dir * t;
    let point = projector + pn;
    let normal = normalize_checked(&point).ok_or(GeometryError::NoIntersection(Surface::Mirror))?;
    let reflected =
        normalize_checked(&reflect(&pn, &normal)).ok_or(GeometryError::DegenerateDirection)?;

    Ok(MirrorReflection {
        point,
        normal,
        incident: *dir,
        reflected,
        throw: t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle_between;

    #[test]
    fn head_on_ray_bounces_straight_back() {
        let p = Vec3::new(0.0, -50.0, 0.0);
        let hit = reflect_off_mirror(&p, &Vec3::y(), 10.0).unwrap();
        assert!((hit.point - Vec3::new(0.0, -10.0, 0.0)).norm() < 1e-12);
        assert!((hit.throw - 40.0).abs() < 1e-12);
        assert!((hit.reflected + Vec3::y()).norm() < 1e-12);
    }

    #[test]
    fn reflection_law_holds() {
        let p = Vec3::new(0.0, -80.0, 0.0);
        let d = Vec3::new(0.05, 1.0, 0.2).normalize();
        let hit = reflect_off_mirror(&p, &d, 22.86).unwrap();

        assert!((hit.point.norm() - 22.86).abs() < 1e-9);
        assert!((hit.reflected.norm() - 1.0).abs() < 1e-12);

        // equal angles with the normal
        let incidence = angle_between(&-hit.incident, &hit.normal);
        let reflection = angle_between(&hit.reflected, &hit.normal);
        assert!((incidence - reflection).abs() < 1e-9);

        // incident, normal and reflected ray are coplanar
        let coplanarity = hit.incident.cross(&hit.normal).dot(&hit.reflected);
        assert!(coplanarity.abs() < 1e-12, "triple product {coplanarity}");
    }

    #[test]
    fn ray_missing_the_mirror() {
        let p = Vec3::new(0.0, -80.0, 0.0);
        let d = Vec3::new(0.0, 1.0, 1.0).normalize();
        assert_eq!(
            reflect_off_mirror(&p, &d, 22.86).unwrap_err(),
            GeometryError::NoIntersection(Surface::Mirror)
        );
    }
}
