use crate::{sum_of_squares, NllsProblem, NllsSolverBackend, SolveOptions, SolveReport, Termination};
use domecal_core::Real;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

const LAMBDA_UP: Real = 10.0;
const LAMBDA_DOWN: Real = 0.1;
const LAMBDA_FLOOR: Real = 1e-12;
const DIAG_FLOOR: Real = 1e-12;

/// Levenberg-Marquardt with Marquardt diagonal scaling.
///
/// Each iteration solves `(J^T J + lambda diag(J^T J)) delta = -J^T r`. A
/// trial step is accepted only if the model is defined there and the cost
/// decreases; otherwise it is rejected and `lambda` grows tenfold. Accepted
/// steps shrink `lambda` tenfold.
///
/// An iteration whose trials left the feasible region never reports cost or
/// step convergence: a shrinking step against that boundary keeps raising
/// `lambda` until [`Termination::DampingCeiling`].
#[derive(Debug, Default, Clone)]
pub struct DampedLmBackend;

enum Step {
    Accepted {
        x: DVector<Real>,
        r: DVector<Real>,
        cost: Real,
        delta_norm: Real,
    },
    /// Defined trial that does not lower the cost, already below the step tolerance.
    Stalled,
    Ceiling,
}

impl NllsSolverBackend for DampedLmBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport) {
        let mut x = x0;
        let Some(mut r) = problem.residuals(&x) else {
            warn!("damped lm: model undefined at the starting point");
            return (
                x,
                SolveReport {
                    iterations: 0,
                    initial_cost: Real::INFINITY,
                    final_cost: Real::INFINITY,
                    rejected_steps: 0,
                    termination: Termination::InfeasibleStart,
                    converged: false,
                },
            );
        };

        let initial_cost = sum_of_squares(&r);
        let mut cost = initial_cost;
        let mut lambda = opts.initial_lambda;
        let mut rejected_steps = 0;
        let mut iterations = 0;

        let termination = loop {
            if cost <= opts.min_cost {
                break Termination::ResidualVanished;
            }
            if iterations >= opts.max_iters {
                break Termination::MaxIterations;
            }
            iterations += 1;

            let Some(j) = problem.jacobian(&x) else {
                break Termination::JacobianUnavailable;
            };
            let jt = j.transpose();
            let h = &jt * &j;
            let g = &jt * &r;
            if g.amax() <= opts.gtol {
                break Termination::GradientConverged;
            }

            let step_limit = opts.xtol * (x.norm() + opts.xtol);
            let mut hit_boundary = false;
            let step = loop {
                if lambda > opts.max_lambda {
                    break Step::Ceiling;
                }
                let trial = solve_damped(&h, &g, lambda)
                    .filter(|delta| delta.iter().all(|v| v.is_finite()));
                if let Some(delta) = trial {
                    let x_new = &x + &delta;
                    let delta_norm = delta.norm();
                    match problem.residuals(&x_new) {
                        Some(r_new) => {
                            let cost_new = sum_of_squares(&r_new);
                            if cost_new < cost {
                                break Step::Accepted {
                                    x: x_new,
                                    r: r_new,
                                    cost: cost_new,
                                    delta_norm,
                                };
                            }
                            if delta_norm <= step_limit && !hit_boundary {
                                break Step::Stalled;
                            }
                        }
                        None => hit_boundary = true,
                    }
                }
                rejected_steps += 1;
                lambda *= LAMBDA_UP;
            };

            match step {
                Step::Accepted {
                    x: x_new,
                    r: r_new,
                    cost: cost_new,
                    delta_norm,
                } => {
                    let rel_decrease = (cost - cost_new) / cost;
                    if opts.verbose {
                        debug!(
                            "damped lm iter {iterations}: cost {cost_new:.6e} (-{rel_decrease:.2e}), lambda {lambda:.1e}"
                        );
                    }
                    x = x_new;
                    r = r_new;
                    cost = cost_new;
                    lambda = (lambda * LAMBDA_DOWN).max(LAMBDA_FLOOR);
                    if hit_boundary {
                        continue;
                    }
                    if rel_decrease <= opts.ftol {
                        break Termination::CostConverged;
                    }
                    if delta_norm <= step_limit {
                        break Termination::StepConverged;
                    }
                }
                Step::Stalled => break Termination::StepConverged,
                Step::Ceiling => break Termination::DampingCeiling,
            }
        };

        if opts.verbose {
            debug!("damped lm: {termination} after {iterations} iterations, cost {cost:.3e}");
        }

        (
            x,
            SolveReport {
                iterations,
                initial_cost,
                final_cost: cost,
                rejected_steps,
                termination,
                converged: termination.is_converged(),
            },
        )
    }
}

fn solve_damped(h: &DMatrix<Real>, g: &DVector<Real>, lambda: Real) -> Option<DVector<Real>> {
    let mut a = h.clone();
    for i in 0..a.nrows() {
        a[(i, i)] += lambda * h[(i, i)].max(DIAG_FLOOR);
    }
    let rhs = -g;
    match a.clone().cholesky() {
        Some(chol) => Some(chol.solve(&rhs)),
        None => a.lu().solve(&rhs),
    }
}
