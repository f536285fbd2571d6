use crate::{Correspondence, DomeDisplay, PixelCoord, ProjectorIntrinsics, Real, ViewAngles};

/// Pitch rows of the reference calibration layout, in degrees.
pub const CANONICAL_PITCHES_DEG: [Real; 4] = [0.0, 20.0, 40.0, 60.0];
/// Yaw columns of every reference pitch row, in degrees.
pub const CANONICAL_YAWS_DEG: [Real; 9] = [
    -120.0, -90.0, -60.0, -30.0, 0.0, 30.0, 60.0, 90.0, 120.0,
];
/// Number of directions in the reference layout (rows x columns + zenith).
pub const CANONICAL_DIRECTION_COUNT: usize = 37;

/// The 37 reference calibration directions: pitch rows bottom to top, yaw
/// left to right inside a row, then the zenith.
pub fn canonical_angles() -> Vec<ViewAngles> {
    let mut out = Vec::with_capacity(CANONICAL_DIRECTION_COUNT);
    for &pitch in &CANONICAL_PITCHES_DEG {
        for &yaw in &CANONICAL_YAWS_DEG {
            out.push(ViewAngles::new(yaw, pitch));
        }
    }
    out.push(ViewAngles::new(0.0, 90.0));
    out
}

/// Pixel centres on a `rows x cols` lattice evenly covering the image.
pub fn pixel_lattice(intrinsics: &ProjectorIntrinsics, rows: u32, cols: u32) -> Vec<PixelCoord> {
    let dr = intrinsics.height as Real / rows.max(1) as Real;
    let dc = intrinsics.width as Real / cols.max(1) as Real;
    let mut out = Vec::with_capacity(rows as usize * cols as usize);
    for i in 0..rows {
        for j in 0..cols {
            out.push(PixelCoord::new(
                (i as Real + 0.5) * dr,
                (j as Real + 0.5) * dc,
            ));
        }
    }
    out
}

/// Trace every pixel through `display`, keeping those that reach the dome.
pub fn correspondences_from_pixels(
    display: &DomeDisplay,
    pixels: &[PixelCoord],
) -> Vec<Correspondence> {
    pixels
        .iter()
        .filter_map(|&pixel| {
            display
                .viewing_direction(pixel)
                .ok()
                .map(|direction| Correspondence { pixel, direction })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeometryParameters;

    #[test]
    fn canonical_layout_has_37_directions() {
        let angles = canonical_angles();
        assert_eq!(angles.len(), CANONICAL_DIRECTION_COUNT);
        assert_eq!(angles[4], ViewAngles::new(0.0, 0.0));
        assert_eq!(angles[36], ViewAngles::new(0.0, 90.0));
    }

    #[test]
    fn lattice_covers_image() {
        let k = ProjectorIntrinsics::default();
        let px = pixel_lattice(&k, 4, 8);
        assert_eq!(px.len(), 32);
        assert!(px.iter().all(|p| k.contains(p)));
        assert_eq!(px[0], PixelCoord::new(90.0, 80.0));
    }

    #[test]
    fn unreachable_pixels_are_skipped() {
        let display = DomeDisplay::new(ProjectorIntrinsics::default(), GeometryParameters::default());
        let pixels = pixel_lattice(&display.intrinsics, 12, 16);
        let corr = correspondences_from_pixels(&display, &pixels);
        assert!(!corr.is_empty());
        assert!(corr.len() < pixels.len());
    }
}
