use crate::jacobian::{finite_difference_jacobian, DEFAULT_RELATIVE_STEP};
use domecal_core::Real;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic non-linear least squares problem with dense parameter/residual vectors.
///
/// The model may be undefined for some parameter vectors (a ray that misses a
/// surface). Strict evaluation returns `None` there; backends that cannot
/// reject a step use [`residuals_penalized`](Self::residuals_penalized).
///
/// Robust IRLS row scaling is applied without differentiating the weights:
/// residuals and Jacobian rows are scaled by `sqrt(w_i)` computed from the
/// unweighted residuals at `x`.
pub trait NllsProblem: Sync {
    /// Number of parameters in the optimization vector.
    fn num_params(&self) -> usize;
    /// Number of residual rows in the problem.
    fn num_residuals(&self) -> usize;

    /// Unweighted residuals, or `None` where the model is undefined.
    fn residuals_unweighted(&self, x: &DVector<Real>) -> Option<DVector<Real>>;

    /// Unweighted residuals with undefined rows replaced by a bounded penalty.
    fn residuals_penalized(&self, x: &DVector<Real>) -> DVector<Real>;

    /// Per-row IRLS scales (sqrt(weights)) computed from unweighted residuals.
    fn robust_row_scales(&self, r_unweighted: &DVector<Real>) -> DVector<Real> {
        DVector::from_element(r_unweighted.len(), 1.0)
    }

    /// Weighted residuals used by the solver.
    fn residuals(&self, x: &DVector<Real>) -> Option<DVector<Real>> {
        let r = self.residuals_unweighted(x)?;
        Some(apply_scales(self, r))
    }

    /// Weighted Jacobian of [`residuals`](Self::residuals) by finite differences.
    fn jacobian(&self, x: &DVector<Real>) -> Option<DMatrix<Real>> {
        let r = self.residuals_unweighted(x)?;
        let scales = self.robust_row_scales(&r);
        let j = finite_difference_jacobian(
            |p| self.residuals_unweighted(p),
            x,
            DEFAULT_RELATIVE_STEP,
        )?;
        Some(scale_rows(j, &scales))
    }

    /// Weighted penalized residuals.
    fn residuals_total(&self, x: &DVector<Real>) -> DVector<Real> {
        apply_scales(self, self.residuals_penalized(x))
    }

    /// Weighted Jacobian of [`residuals_total`](Self::residuals_total).
    fn jacobian_total(&self, x: &DVector<Real>) -> Option<DMatrix<Real>> {
        let scales = self.robust_row_scales(&self.residuals_penalized(x));
        let j = finite_difference_jacobian(
            |p| Some(self.residuals_penalized(p)),
            x,
            DEFAULT_RELATIVE_STEP,
        )?;
        Some(scale_rows(j, &scales))
    }
}

fn apply_scales<P: NllsProblem + ?Sized>(problem: &P, mut r: DVector<Real>) -> DVector<Real> {
    let scales = problem.robust_row_scales(&r);
    debug_assert_eq!(scales.len(), r.len());
    r.component_mul_assign(&scales);
    r
}

fn scale_rows(mut j: DMatrix<Real>, scales: &DVector<Real>) -> DMatrix<Real> {
    debug_assert_eq!(scales.len(), j.nrows());
    for (mut row, scale) in j.row_iter_mut().zip(scales.iter()) {
        if *scale != 1.0 {
            row.scale_mut(*scale);
        }
    }
    j
}

/// Cost reported by both backends: `sum r_i^2`.
pub fn sum_of_squares(r: &DVector<Real>) -> Real {
    r.norm_squared()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Maximum number of solver iterations before termination.
    ///
    /// The MINPACK backend interprets this as a function-evaluation cap of
    /// `max_iters * (n + 1)`.
    pub max_iters: usize,
    /// Relative tolerance on the cost reduction.
    pub ftol: Real,
    /// Tolerance on the infinity norm of the gradient `J^T r`.
    pub gtol: Real,
    /// Relative tolerance on parameter updates.
    pub xtol: Real,
    /// Stop as soon as the cost drops below this value.
    pub min_cost: Real,
    /// Initial damping factor.
    pub initial_lambda: Real,
    /// Damping above which the damped backend gives up.
    pub max_lambda: Real,
    /// Enable per-iteration debug logging.
    pub verbose: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-12,
            gtol: 1e-12,
            xtol: 1e-12,
            min_cost: 1e-24,
            initial_lambda: 1e-3,
            max_lambda: 1e16,
            verbose: false,
        }
    }
}

/// Why a backend stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative cost reduction fell below `ftol`.
    CostConverged,
    /// Step size fell below `xtol`.
    StepConverged,
    /// Gradient norm fell below `gtol`.
    GradientConverged,
    /// Cost fell below `min_cost`.
    ResidualVanished,
    /// Iteration budget exhausted.
    MaxIterations,
    /// Damping grew past `max_lambda` without an acceptable step.
    DampingCeiling,
    /// No finite difference could be taken around the current estimate.
    JacobianUnavailable,
    /// The model is undefined at the starting point.
    InfeasibleStart,
    /// The MINPACK backend reported a failure.
    BackendFailure,
}

impl Termination {
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            Termination::CostConverged
                | Termination::StepConverged
                | Termination::GradientConverged
                | Termination::ResidualVanished
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::CostConverged => "cost reduction below tolerance",
            Termination::StepConverged => "step size below tolerance",
            Termination::GradientConverged => "gradient below tolerance",
            Termination::ResidualVanished => "residual vanished",
            Termination::MaxIterations => "iteration limit reached",
            Termination::DampingCeiling => "damping ceiling reached",
            Termination::JacobianUnavailable => "jacobian unavailable",
            Termination::InfeasibleStart => "model undefined at the starting point",
            Termination::BackendFailure => "backend failure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub iterations: usize,
    pub initial_cost: Real,
    pub final_cost: Real,
    /// Trial steps rejected for increasing the cost or leaving the feasible region.
    pub rejected_steps: usize,
    pub termination: Termination,
    pub converged: bool,
}

pub trait NllsSolverBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport);
}
