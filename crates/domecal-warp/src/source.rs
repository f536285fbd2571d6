use domecal_core::{normalize_checked, Real, Vec3, ViewAngles};
use serde::{Deserialize, Serialize};

/// A flat virtual camera image placed around the observer.
///
/// The screen faces the observer along `(yaw, pitch)` at `distance`, spans
/// `width x height` (same units as `distance`) and is sampled with
/// `pixel_width x pixel_height` pixels. Columns grow to the observer's right,
/// rows grow downwards; `roll` turns the screen about its viewing axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VirtualScreen {
    pub yaw_deg: Real,
    pub pitch_deg: Real,
    #[serde(default)]
    pub roll_deg: Real,
    pub distance: Real,
    pub width: Real,
    pub height: Real,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl VirtualScreen {
    /// Unit vector from the observer to the screen centre.
    pub fn forward(&self) -> Vec3 {
        ViewAngles::new(self.yaw_deg, self.pitch_deg).to_direction()
    }

    /// `(forward, right, down)` orthonormal frame of the screen.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let f = self.forward();
        // straight up or down: fall back to the observer's right
        let right0 = normalize_checked(&f.cross(&Vec3::z())).unwrap_or(-Vec3::x());
        let down0 = f.cross(&right0);
        let (s, c) = self.roll_deg.to_radians().sin_cos();
        let right = right0 * c + down0 * s;
        let down = f.cross(&right);
        (f, right, down)
    }

    /// Sub-pixel `(row, col)` where the ray along `dir` crosses the screen
    /// plane, or `None` if the plane is behind the observer. The result may
    /// lie outside the image.
    pub fn project(&self, dir: &Vec3) -> Option<(Real, Real)> {
        let (f, right, down) = self.basis();
        let cos = dir.dot(&f);
        if cos <= 0.0 {
            return None;
        }
        let offset = dir * (self.distance / cos) - f * self.distance;
        let u = offset.dot(&right) / self.width + 0.5;
        let v = offset.dot(&down) / self.height + 0.5;
        Some((v * self.pixel_height as Real, u * self.pixel_width as Real))
    }

    /// Unit direction from the observer through sub-pixel `(row, col)`.
    pub fn direction_of(&self, row: Real, col: Real) -> Vec3 {
        let (f, right, down) = self.basis();
        let u = (col / self.pixel_width as Real - 0.5) * self.width;
        let v = (row / self.pixel_height as Real - 0.5) * self.height;
        (f * self.distance + right * u + down * v).normalize()
    }

    pub fn contains(&self, row: Real, col: Real) -> bool {
        row >= 0.0
            && col >= 0.0
            && row < self.pixel_height as Real
            && col < self.pixel_width as Real
    }
}

/// Location of a viewing direction in the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceSample {
    pub screen: usize,
    pub row: Real,
    pub col: Real,
}

/// Canonical source image: the screens a frame is rendered into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceImage {
    pub screens: Vec<VirtualScreen>,
}

impl SourceImage {
    /// Sample showing `dir`, looking at the best aligned screens first.
    pub fn locate(&self, dir: &Vec3) -> Option<SourceSample> {
        let mut order: Vec<(usize, Real)> = self
            .screens
            .iter()
            .enumerate()
            .map(|(i, s)| (i, dir.dot(&s.forward())))
            .filter(|&(_, d)| d > 0.0)
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1));

        order.into_iter().find_map(|(screen, _)| {
            let s = &self.screens[screen];
            let (row, col) = s.project(dir)?;
            s.contains(row, col)
                .then_some(SourceSample { screen, row, col })
        })
    }
}

impl Default for SourceImage {
    /// Left, front and right screens tilted up by 30 degrees.
    fn default() -> Self {
        let screen = |yaw_deg| VirtualScreen {
            yaw_deg,
            pitch_deg: 30.0,
            roll_deg: 0.0,
            distance: 0.5,
            width: 1.4,
            height: 1.0,
            pixel_width: 280,
            pixel_height: 200,
        };
        Self {
            screens: vec![screen(-90.0), screen(0.0), screen(90.0)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_centre_maps_to_image_centre() {
        let source = SourceImage::default();
        for (i, s) in source.screens.iter().enumerate() {
            let sample = source.locate(&s.forward()).unwrap();
            assert_eq!(sample.screen, i);
            assert!((sample.row - 100.0).abs() < 1e-9);
            assert!((sample.col - 140.0).abs() < 1e-9);
        }
    }

    #[test]
    fn columns_grow_to_the_right_rows_downwards() {
        let s = SourceImage::default().screens[1];
        let right = ViewAngles::new(5.0, 30.0).to_direction();
        let (_, col) = s.project(&right).unwrap();
        assert!(col > 140.0);
        let low = ViewAngles::new(0.0, 20.0).to_direction();
        let (row, _) = s.project(&low).unwrap();
        assert!(row > 100.0);
    }

    #[test]
    fn direction_of_inverts_project() {
        let mut s = SourceImage::default().screens[0];
        s.roll_deg = 12.0;
        for &(row, col) in &[(0.0, 0.0), (57.3, 201.9), (199.0, 279.0)] {
            let d = s.direction_of(row, col);
            let (r, c) = s.project(&d).unwrap();
            assert!((r - row).abs() < 1e-9 && (c - col).abs() < 1e-9);
        }
    }

    #[test]
    fn directions_behind_every_screen_are_unmapped() {
        let source = SourceImage::default();
        let behind = ViewAngles::new(180.0, 0.0).to_direction();
        assert!(source.locate(&behind).is_none());
        let below = ViewAngles::new(0.0, -80.0).to_direction();
        assert!(source.locate(&below).is_none());
    }
}
