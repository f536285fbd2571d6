use crate::{solve_quadratic, GeometryError, Real, Surface, Vec3};
use serde::{Deserialize, Serialize};

/// Which ray parameter of a ray/sphere intersection is physically meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSelection {
    /// Smallest positive root: first contact with a convex surface seen from outside.
    Near,
    /// Largest positive root: the far wall of a surface the ray starts inside.
    Far,
}

/// Both ray parameters of a ray/sphere intersection, `near <= far`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereRoots {
    pub near: Real,
    pub far: Real,
}

impl SphereRoots {
    /// Apply `selection`; `None` if no root is in front of the ray origin.
    pub fn select(&self, selection: RootSelection) -> Option<Real> {
        match selection {
            RootSelection::Near if self.near > 0.0 => Some(self.near),
            RootSelection::Near | RootSelection::Far if self.far > 0.0 => Some(self.far),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: Real,
}

impl Sphere {
    pub fn new(center: Vec3, radius: Real) -> Self {
        Self { center, radius }
    }

    /// Solve `|o + t d - c|^2 = r^2` for `t`.
    ///
    /// `dir` need not be unit length; the roots are in units of `|dir|`.
    pub fn intersect(&self, origin: &Vec3, dir: &Vec3) -> Option<SphereRoots> {
        let oc = origin - self.center;
        let a = dir.norm_squared();
        let b = 2.0 * dir.dot(&oc);
        let c = oc.norm_squared() - self.radius * self.radius;
        if a == 0.0 {
            return None;
        }
        solve_quadratic(a, b, c).map(|(near, far)| SphereRoots { near, far })
    }

    /// Ray parameter picked by `selection`, or `NoIntersection(surface)`.
    pub fn hit(
        &self,
        origin: &Vec3,
        dir: &Vec3,
        selection: RootSelection,
        surface: Surface,
    ) -> Result<Real, GeometryError> {
        self.intersect(origin, dir)
            .and_then(|roots| roots.select(selection))
            .ok_or(GeometryError::NoIntersection(surface))
    }
}
