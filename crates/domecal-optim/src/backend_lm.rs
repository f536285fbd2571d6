use crate::{sum_of_squares, NllsProblem, NllsSolverBackend, SolveOptions, SolveReport, Termination};
use domecal_core::Real;
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use log::debug;
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};

/// Adapter feeding penalized residuals to the MINPACK solver, which has no
/// notion of an undefined model.
struct PenalizedWrapper<'a, P: NllsProblem> {
    problem: &'a P,
    params: DVector<Real>,
}

impl<'a, P: NllsProblem> LeastSquaresProblem<Real, Dyn, Dyn> for PenalizedWrapper<'a, P> {
    type ResidualStorage = Owned<Real, Dyn>;
    type JacobianStorage = Owned<Real, Dyn, Dyn>;
    type ParameterStorage = Owned<Real, Dyn>;

    fn set_params(&mut self, x: &DVector<Real>) {
        self.params.clone_from(x);
    }

    fn params(&self) -> DVector<Real> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<Real>> {
        Some(self.problem.residuals_total(&self.params))
    }

    fn jacobian(&self) -> Option<DMatrix<Real>> {
        self.problem.jacobian_total(&self.params)
    }
}

/// MINPACK Levenberg-Marquardt from the `levenberg-marquardt` crate.
#[derive(Debug, Default, Clone)]
pub struct LmBackend;

impl NllsSolverBackend for LmBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport) {
        let initial_cost = sum_of_squares(&problem.residuals_total(&x0));
        let lm = LevenbergMarquardt::new()
            .with_ftol(opts.ftol)
            .with_xtol(opts.xtol)
            .with_gtol(opts.gtol)
            .with_patience(opts.max_iters.max(1));

        let wrapper = PenalizedWrapper {
            problem,
            params: x0,
        };

        let (wrapper, report) = lm.minimize(wrapper);
        let x_opt = wrapper.params();
        let final_cost = sum_of_squares(&problem.residuals_total(&x_opt));
        if opts.verbose {
            debug!(
                "minpack: {:?} after {} evaluations, cost {:.3e}",
                report.termination, report.number_of_evaluations, final_cost
            );
        }

        let termination = termination_from_minpack(&report.termination);
        (
            x_opt,
            SolveReport {
                iterations: report.number_of_evaluations,
                initial_cost,
                final_cost,
                rejected_steps: 0,
                termination,
                converged: report.termination.was_successful(),
            },
        )
    }
}

fn termination_from_minpack(reason: &TerminationReason) -> Termination {
    match reason {
        TerminationReason::ResidualsZero => Termination::ResidualVanished,
        TerminationReason::Orthogonal => Termination::GradientConverged,
        TerminationReason::Converged { ftol: false, xtol: true } => Termination::StepConverged,
        TerminationReason::Converged { .. } => Termination::CostConverged,
        TerminationReason::LostPatience => Termination::MaxIterations,
        _ => Termination::BackendFailure,
    }
}
