//! Inverse of the forward model: which projector pixel shows a given direction.

use crate::DirectionGrid;
use domecal_core::{DomeDisplay, PixelCoord, Real, Vec3};
use log::debug;
use nalgebra::{Matrix2, Matrix3x2, Vector2};
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvertOptions {
    pub max_iters: usize,
    /// Accept once `|v(pixel) - target|` drops below this.
    pub tolerance: Real,
    /// Finite-difference step in pixels.
    pub step_px: Real,
    /// Lattice spacing of the seed search in [`locate_directions`].
    pub seed_stride: u32,
}

impl Default for InvertOptions {
    fn default() -> Self {
        Self {
            max_iters: 50,
            tolerance: 1e-9,
            step_px: 0.01,
            seed_stride: 8,
        }
    }
}

fn direction_at(display: &DomeDisplay, row: Real, col: Real) -> Option<Vec3> {
    display.viewing_direction(PixelCoord::new(row, col)).ok()
}

/// Derivative of the viewing direction along one pixel axis, one-sided next
/// to the edge of the reachable region.
fn axis_derivative(
    display: &DomeDisplay,
    at: PixelCoord,
    v: &Vec3,
    d_row: Real,
    d_col: Real,
    h: Real,
) -> Option<Vec3> {
    let plus = direction_at(display, at.row + d_row * h, at.col + d_col * h);
    let minus = direction_at(display, at.row - d_row * h, at.col - d_col * h);
    match (plus, minus) {
        (Some(p), Some(m)) => Some((p - m) / (2.0 * h)),
        (Some(p), None) => Some((p - v) / h),
        (None, Some(m)) => Some((v - m) / h),
        (None, None) => None,
    }
}

/// Gauss-Newton search for the projector pixel whose viewing direction is
/// `target`, starting at `seed`. Steps are halved until the error drops.
///
/// Returns `None` if the direction is not shown by any pixel of the image
/// (within `tolerance`).
pub fn invert_direction(
    display: &DomeDisplay,
    target: &Vec3,
    seed: PixelCoord,
    opts: &InvertOptions,
) -> Option<PixelCoord> {
    let mut px = seed;
    let mut v = display.viewing_direction(px).ok()?;
    let mut err = (target - v).norm();

    for _ in 0..opts.max_iters {
        if err <= opts.tolerance {
            break;
        }
        let d_row = axis_derivative(display, px, &v, 1.0, 0.0, opts.step_px)?;
        let d_col = axis_derivative(display, px, &v, 0.0, 1.0, opts.step_px)?;
        let j = Matrix3x2::from_columns(&[d_row, d_col]);
        let jt = j.transpose();
        let normal: Matrix2<Real> = jt * j;
        let delta: Vector2<Real> = normal.try_inverse()? * (jt * (target - v));

        let mut t = 1.0;
        let mut accepted = false;
        for _ in 0..30 {
            let cand = PixelCoord::new(px.row + t * delta.x, px.col + t * delta.y);
            if let Ok(vc) = display.viewing_direction(cand) {
                let e = (target - vc).norm();
                if e < err {
                    px = cand;
                    v = vc;
                    err = e;
                    accepted = true;
                    break;
                }
            }
            t *= 0.5;
        }
        if !accepted {
            break;
        }
    }

    (err <= opts.tolerance && display.intrinsics.contains(&px)).then_some(px)
}

/// Invert several directions, seeding each from the best aligned pixel of a
/// coarse lattice.
pub fn locate_directions(
    display: &DomeDisplay,
    targets: &[Vec3],
    opts: &InvertOptions,
) -> Vec<Option<PixelCoord>> {
    let coarse = DirectionGrid::evaluate_strided(display, opts.seed_stride);
    targets
        .par_iter()
        .map(|target| {
            let (i, j) = coarse.best_match(target)?;
            let (i, j) = coarse.closest_pixel(target, (i, j))?;
            let found = invert_direction(display, target, coarse.pixel_of(i, j), opts);
            if found.is_none() {
                debug!("direction {target:?} is not shown by any projector pixel");
            }
            found
        })
        .collect()
}
