use crate::{
    normalize_checked, project_onto_dome, reflect_off_mirror, DomeHit, GeometryError,
    GeometryParameters, MirrorReflection, PixelCoord, ProjectorIntrinsics, Vec3,
};
use serde::{Deserialize, Serialize};

/// Every intermediate of one traced projector pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayTrace {
    pub pixel: PixelCoord,
    pub mirror: MirrorReflection,
    pub dome: DomeHit,
    /// Unit vector from the observer to the display point.
    pub direction: Vec3,
}

/// Forward optical model of a calibrated (or candidate) display rig.
///
/// Pure and `Copy`: one instance can be shared by every worker thread.
///
/// ```
/// use domecal_core::{DomeDisplay, GeometryParameters, PixelCoord, ProjectorIntrinsics};
///
/// let display = DomeDisplay::new(ProjectorIntrinsics::default(), GeometryParameters::default());
/// let dir = display.viewing_direction(PixelCoord::new(300.5, 640.5)).unwrap();
/// assert!((dir.norm() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomeDisplay {
    pub intrinsics: ProjectorIntrinsics,
    pub geometry: GeometryParameters,
}

impl DomeDisplay {
    pub fn new(intrinsics: ProjectorIntrinsics, geometry: GeometryParameters) -> Self {
        Self {
            intrinsics,
            geometry,
        }
    }

    /// Trace `pixel` through the mirror onto the dome.
    pub fn trace(&self, pixel: PixelCoord) -> Result<RayTrace, GeometryError> {
        let g = &self.geometry;
        let ray = self.intrinsics.ray_direction(pixel);
        let mirror = reflect_off_mirror(&g.mp(), &ray, g.mirror_radius)?;
        let dome = project_onto_dome(&mirror, &g.md(), g.dome_radius)?;
        let direction =
            normalize_checked(&(dome.point - g.ma())).ok_or(GeometryError::DegenerateDirection)?;
        Ok(RayTrace {
            pixel,
            mirror,
            dome,
            direction,
        })
    }

    /// Unit viewing direction the observer perceives for `pixel`.
    pub fn viewing_direction(&self, pixel: PixelCoord) -> Result<Vec3, GeometryError> {
        self.trace(pixel).map(|t| t.direction)
    }
}

/// Free-function form of [`DomeDisplay::viewing_direction`].
pub fn viewing_direction(
    intrinsics: &ProjectorIntrinsics,
    geometry: &GeometryParameters,
    pixel: PixelCoord,
) -> Result<Vec3, GeometryError> {
    DomeDisplay::new(*intrinsics, *geometry).viewing_direction(pixel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Real, Surface};

    fn display() -> DomeDisplay {
        DomeDisplay::new(ProjectorIntrinsics::default(), GeometryParameters::default())
    }

    #[test]
    fn reachable_directions_are_unit_length() {
        let d = display();
        let mut reached = 0;
        for row in (0..720).step_by(45) {
            for col in (0..1280).step_by(80) {
                if let Ok(v) = d.viewing_direction(PixelCoord::center_of(row, col)) {
                    assert!((v.norm() - 1.0).abs() < 1e-12);
                    reached += 1;
                }
            }
        }
        assert!(reached > 50, "only {reached} pixels reached the dome");
    }

    #[test]
    fn trace_is_consistent() {
        let d = display();
        let t = d.trace(PixelCoord::new(200.0, 700.0)).unwrap();
        let g = &d.geometry;
        assert!((t.mirror.point.norm() - g.mirror_radius).abs() < 1e-9);
        assert!(((t.dome.point - g.md()).norm() - g.dome_radius).abs() < 1e-9);
        let expected = (t.dome.point - g.ma()).normalize();
        assert!((t.direction - expected).norm() < 1e-12);
    }

    #[test]
    fn symmetric_rig_keeps_centre_column_in_plane() {
        let d = display();
        for row in [200.5, 350.5, 500.5] {
            let v = d.viewing_direction(PixelCoord::new(row, 640.0)).unwrap();
            assert!(v.x.abs() < 1e-12, "row {row}: x = {}", v.x);
        }
    }

    #[test]
    fn low_rows_miss_the_mirror() {
        // The lens rise sends the bottom rows well below a tiny mirror.
        let mut g = GeometryParameters::default();
        g.mirror_radius = 1.0;
        let d = DomeDisplay::new(ProjectorIntrinsics::default(), g);
        let err = d.viewing_direction(PixelCoord::new(719.5, 0.5)).unwrap_err();
        assert_eq!(err, GeometryError::NoIntersection(Surface::Mirror));
    }

    #[test]
    fn scaled_rig_gives_identical_directions() {
        let d = display();
        let scaled = DomeDisplay::new(d.intrinsics, d.geometry.scaled(1.7 as Real));
        let px = PixelCoord::new(300.0, 700.0);
        let a = d.viewing_direction(px).unwrap();
        let b = scaled.viewing_direction(px).unwrap();
        assert!((a - b).norm() < 1e-12);
    }
}
