use domecal_core::{DomeDisplay, PixelCoord, Real, Vec3, ViewAngles};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Yaw/pitch extents of the directions a display can show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    pub min_yaw_deg: Real,
    pub max_yaw_deg: Real,
    pub min_pitch_deg: Real,
    pub max_pitch_deg: Real,
}

/// Viewing direction of projector pixels on a regular lattice.
///
/// Cell `(i, j)` holds the direction of the pixel centred at
/// `(i * stride + 0.5, j * stride + 0.5)`, or `None` if that pixel does not
/// reach the dome.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionGrid {
    rows: u32,
    cols: u32,
    stride: u32,
    directions: Vec<Option<Vec3>>,
}

impl DirectionGrid {
    /// Every projector pixel.
    pub fn evaluate(display: &DomeDisplay) -> Self {
        Self::evaluate_strided(display, 1)
    }

    /// Every `stride`-th pixel in both directions, rows in parallel.
    pub fn evaluate_strided(display: &DomeDisplay, stride: u32) -> Self {
        let stride = stride.max(1);
        let rows = display.intrinsics.height.div_ceil(stride);
        let cols = display.intrinsics.width.div_ceil(stride);
        let mut directions = vec![None; rows as usize * cols as usize];
        if cols > 0 {
            directions
                .par_chunks_mut(cols as usize)
                .enumerate()
                .for_each(|(i, row)| {
                    for (j, cell) in row.iter_mut().enumerate() {
                        let pixel = PixelCoord::center_of(i as u32 * stride, j as u32 * stride);
                        *cell = display.viewing_direction(pixel).ok();
                    }
                });
        }
        Self {
            rows,
            cols,
            stride,
            directions,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn get(&self, i: u32, j: u32) -> Option<Vec3> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        self.directions[i as usize * self.cols as usize + j as usize]
    }

    /// Row-major cells.
    pub fn directions(&self) -> &[Option<Vec3>] {
        &self.directions
    }

    /// Projector pixel centre of cell `(i, j)`.
    pub fn pixel_of(&self, i: u32, j: u32) -> PixelCoord {
        PixelCoord::center_of(i * self.stride, j * self.stride)
    }

    pub fn reachable_count(&self) -> usize {
        self.directions.iter().filter(|d| d.is_some()).count()
    }

    /// Yaw/pitch extents over every reachable cell, `None` if nothing reaches the dome.
    ///
    /// Yaw is taken in `(-180, 180]`, so a field of view straddling the
    /// direction behind the observer reports the full yaw range.
    pub fn field_of_view(&self) -> Option<FieldOfView> {
        self.directions
            .par_iter()
            .filter_map(|d| d.as_ref().map(ViewAngles::from_direction))
            .map(|a| FieldOfView {
                min_yaw_deg: a.yaw_deg,
                max_yaw_deg: a.yaw_deg,
                min_pitch_deg: a.pitch_deg,
                max_pitch_deg: a.pitch_deg,
            })
            .reduce_with(|a, b| FieldOfView {
                min_yaw_deg: a.min_yaw_deg.min(b.min_yaw_deg),
                max_yaw_deg: a.max_yaw_deg.max(b.max_yaw_deg),
                min_pitch_deg: a.min_pitch_deg.min(b.min_pitch_deg),
                max_pitch_deg: a.max_pitch_deg.max(b.max_pitch_deg),
            })
    }

    /// Cell whose direction is best aligned with `target`, by exhaustive search.
    pub fn best_match(&self, target: &Vec3) -> Option<(u32, u32)> {
        let cols = self.cols as usize;
        self.directions
            .par_iter()
            .enumerate()
            .filter_map(|(k, d)| d.map(|d| (k, d.dot(target))))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(k, _)| ((k / cols) as u32, (k % cols) as u32))
    }

    /// Hill climb from `start` over the 8-neighbourhood towards `target`.
    ///
    /// Stops at the first cell none of whose reachable neighbours is better
    /// aligned. `None` if `start` itself is unreachable.
    pub fn closest_pixel(&self, target: &Vec3, start: (u32, u32)) -> Option<(u32, u32)> {
        let mut best = start;
        let mut best_dot = self.get(start.0, start.1)?.dot(target);
        loop {
            let (i, j) = best;
            let mut moved = false;
            for di in -1i64..=1 {
                for dj in -1i64..=1 {
                    if di == 0 && dj == 0 {
                        continue;
                    }
                    let (ni, nj) = (i as i64 + di, j as i64 + dj);
                    if ni < 0 || nj < 0 {
                        continue;
                    }
                    if let Some(d) = self.get(ni as u32, nj as u32) {
                        let dot = d.dot(target);
                        if dot > best_dot {
                            best_dot = dot;
                            best = (ni as u32, nj as u32);
                            moved = true;
                        }
                    }
                }
            }
            if !moved {
                return Some(best);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domecal_core::{GeometryParameters, ProjectorIntrinsics};

    fn small_display() -> DomeDisplay {
        DomeDisplay::new(
            ProjectorIntrinsics::from_throw_ratio(160, 90, 1.39, 0.15),
            GeometryParameters::default(),
        )
    }

    #[test]
    fn grid_matches_pointwise_model() {
        let display = small_display();
        let grid = DirectionGrid::evaluate(&display);
        assert_eq!((grid.rows(), grid.cols()), (90, 160));
        for &(i, j) in &[(0, 0), (40, 80), (60, 30), (89, 159)] {
            let expected = display.viewing_direction(grid.pixel_of(i, j)).ok();
            assert_eq!(grid.get(i, j), expected);
        }
        assert!(grid.reachable_count() > 0);
        assert!(grid.reachable_count() < grid.directions().len());
    }

    #[test]
    fn strided_grid_samples_every_nth_pixel() {
        let display = small_display();
        let grid = DirectionGrid::evaluate_strided(&display, 8);
        assert_eq!((grid.rows(), grid.cols()), (12, 20));
        assert_eq!(grid.pixel_of(2, 3), PixelCoord::new(16.5, 24.5));
    }

    #[test]
    fn hill_climb_reaches_exhaustive_optimum() {
        let display = small_display();
        let grid = DirectionGrid::evaluate(&display);
        let target = grid.get(60, 100).unwrap();
        let start = grid.best_match(&ViewAngles::new(0.0, 10.0).to_direction()).unwrap();
        assert_eq!(grid.closest_pixel(&target, start), Some((60, 100)));
        assert_eq!(grid.best_match(&target), Some((60, 100)));
    }

    #[test]
    fn field_of_view_contains_straight_ahead() {
        let fov = DirectionGrid::evaluate(&small_display()).field_of_view().unwrap();
        assert!(fov.min_pitch_deg < 0.0 && fov.max_pitch_deg > 60.0, "{fov:?}");
        assert!(fov.min_yaw_deg < -90.0 && fov.max_yaw_deg > 90.0, "{fov:?}");
    }
}
