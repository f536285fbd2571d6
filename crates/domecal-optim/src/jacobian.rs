//! Finite-difference Jacobians for models without analytic derivatives.

use domecal_core::Real;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// `cbrt(f64::EPSILON)`, the usual relative step for central differences.
pub const DEFAULT_RELATIVE_STEP: Real = 6.055_454_452_393_34e-6;

/// Jacobian of `f` at `x`, one parameter column per rayon task.
///
/// Column `k` uses the step `rel_step * max(|x_k|, 1)`. Central differences
/// are used where both neighbours are defined; next to the boundary of the
/// domain of `f` the defined side is used alone. Returns `None` if `f(x)` is
/// undefined or some column has no defined neighbour.
pub fn finite_difference_jacobian<F>(
    f: F,
    x: &DVector<Real>,
    rel_step: Real,
) -> Option<DMatrix<Real>>
where
    F: Fn(&DVector<Real>) -> Option<DVector<Real>> + Sync,
{
    let r0 = f(x)?;
    let columns: Option<Vec<DVector<Real>>> = (0..x.len())
        .into_par_iter()
        .map(|k| {
            let h = rel_step * x[k].abs().max(1.0);
            let mut xp = x.clone();
            xp[k] += h;
            let mut xm = x.clone();
            xm[k] -= h;
            match (f(&xp), f(&xm)) {
                (Some(rp), Some(rm)) => Some((rp - rm) / (2.0 * h)),
                (Some(rp), None) => Some((rp - &r0) / h),
                (None, Some(rm)) => Some((&r0 - rm) / h),
                (None, None) => None,
            }
        })
        .collect();
    let columns = columns?;

    let mut j = DMatrix::zeros(r0.len(), x.len());
    for (k, col) in columns.iter().enumerate() {
        j.set_column(k, col);
    }
    Some(j)
}
