//! Fit of the rig geometry to pixel/direction correspondences.
//!
//! Each correspondence contributes three residual rows, the components of
//! `v(pixel; theta) - known`. The cost is the sum of squared vector errors.

use crate::{
    DampedLmBackend, LmBackend, NllsProblem, NllsSolverBackend, ParameterLayout, RobustKernel,
    SolveOptions, SolveReport, Termination,
};
use domecal_core::{
    angle_between, CalibrationDataset, Correspondence, DatasetError, DomeDisplay, GeometryError,
    GeometryParameters, ProjectorIntrinsics, Real, Vec3,
};
use log::{info, warn};
use nalgebra::DVector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Residual rows per correspondence.
pub const RESIDUALS_PER_POINT: usize = 3;

/// Least-squares problem over the free scalars of a [`ParameterLayout`].
#[derive(Debug, Clone)]
pub struct DomeGeometryProblem {
    correspondences: Vec<Correspondence>,
    intrinsics: ProjectorIntrinsics,
    base: GeometryParameters,
    layout: ParameterLayout,
    kernel: RobustKernel,
}

impl DomeGeometryProblem {
    pub fn new(
        dataset: &CalibrationDataset,
        intrinsics: ProjectorIntrinsics,
        base: GeometryParameters,
        layout: ParameterLayout,
    ) -> Self {
        Self {
            correspondences: dataset.as_slice().to_vec(),
            intrinsics,
            base,
            layout,
            kernel: RobustKernel::None,
        }
    }

    pub fn with_kernel(mut self, kernel: RobustKernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Geometry described by the parameter vector `x`.
    pub fn geometry(&self, x: &DVector<Real>) -> GeometryParameters {
        self.layout.unpack(&self.base, x)
    }

    /// Forward model for every correspondence under `x`, in input order.
    pub fn predict(&self, x: &DVector<Real>) -> Vec<Result<Vec3, GeometryError>> {
        let geometry = self.geometry(x);
        if let Err(err) = geometry.validate() {
            return vec![Err(err); self.correspondences.len()];
        }
        let display = DomeDisplay::new(self.intrinsics, geometry);
        self.correspondences
            .par_iter()
            .map(|c| display.viewing_direction(c.pixel))
            .collect()
    }

    /// Number of correspondences without a viewing direction under `x`.
    pub fn count_unreachable(&self, x: &DVector<Real>) -> usize {
        self.predict(x).iter().filter(|p| p.is_err()).count()
    }

    /// Stack the per-point errors. Unreachable points get the opposite of
    /// their known direction when `penalize` is set, otherwise the whole
    /// evaluation is undefined.
    fn assemble(
        &self,
        predicted: &[Result<Vec3, GeometryError>],
        penalize: bool,
    ) -> Option<DVector<Real>> {
        let mut r = DVector::zeros(self.num_residuals());
        for (i, (c, p)) in self.correspondences.iter().zip(predicted).enumerate() {
            let estimate = match p {
                Ok(v) => *v,
                Err(_) if penalize => -c.direction,
                Err(_) => return None,
            };
            r.fixed_rows_mut::<3>(RESIDUALS_PER_POINT * i)
                .copy_from(&(estimate - c.direction));
        }
        Some(r)
    }
}

impl NllsProblem for DomeGeometryProblem {
    fn num_params(&self) -> usize {
        self.layout.dim()
    }

    fn num_residuals(&self) -> usize {
        RESIDUALS_PER_POINT * self.correspondences.len()
    }

    fn residuals_unweighted(&self, x: &DVector<Real>) -> Option<DVector<Real>> {
        self.assemble(&self.predict(x), false)
    }

    fn residuals_penalized(&self, x: &DVector<Real>) -> DVector<Real> {
        self.assemble(&self.predict(x), true)
            .unwrap_or_else(|| DVector::zeros(self.num_residuals()))
    }

    fn robust_row_scales(&self, r_unweighted: &DVector<Real>) -> DVector<Real> {
        self.kernel.block_scales(r_unweighted, RESIDUALS_PER_POINT)
    }
}

/// Which backend drives the fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// [`DampedLmBackend`]: rejects steps that leave the feasible region.
    #[default]
    DampedLm,
    /// [`LmBackend`]: MINPACK with penalized residuals.
    Minpack,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryEstimateOptions {
    pub layout: ParameterLayout,
    pub robust_kernel: RobustKernel,
    pub solver: SolverKind,
    pub solve: SolveOptions,
}

/// Fit quality of one correspondence under the final geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointResidual {
    pub index: usize,
    /// Fitted viewing direction, `None` if the pixel no longer reaches the dome.
    pub fitted: Option<Vec3>,
    /// Norm of the direction error (penalized for unreachable pixels).
    pub error: Real,
    /// Angle between fitted and known direction, in degrees.
    pub angular_error_deg: Option<Real>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryFit {
    pub geometry: GeometryParameters,
    pub report: SolveReport,
    pub points: Vec<PointResidual>,
    /// Root mean square of the per-point direction error norms.
    pub rms_error: Real,
    pub mean_angular_error_deg: Real,
    pub max_angular_error_deg: Real,
    pub unreachable: usize,
}

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("{correspondences} correspondences cannot determine {free_params} free parameters")]
    UnderdeterminedSystem {
        correspondences: usize,
        free_params: usize,
    },
    #[error("every geometry parameter is fixed; nothing to estimate")]
    NoFreeParameters,
    #[error("robust kernel scale must be finite and positive: {0:?}")]
    InvalidRobustKernel(RobustKernel),
    #[error("initial geometry is invalid: {0}")]
    InvalidInitialGuess(GeometryError),
    #[error("initial geometry leaves {unreachable} of {total} correspondences without a viewing direction")]
    InfeasibleInitialGuess { unreachable: usize, total: usize },
    #[error("geometry fit did not converge ({termination}): best cost {final_cost:.3e}")]
    ConvergenceFailure {
        termination: Termination,
        final_cost: Real,
        /// Best-effort fit at the point the backend stopped.
        best: Box<GeometryFit>,
    },
}

/// Estimate the rig geometry from `dataset`, starting at `initial`.
///
/// Scalars not free in `options.layout` keep their `initial` value. Returns
/// the best-effort fit inside [`EstimateError::ConvergenceFailure`] when the
/// backend stops without converging.
pub fn estimate_geometry(
    dataset: &CalibrationDataset,
    intrinsics: &ProjectorIntrinsics,
    initial: &GeometryParameters,
    options: &GeometryEstimateOptions,
) -> Result<GeometryFit, EstimateError> {
    let layout = &options.layout;
    if layout.dim() == 0 {
        return Err(EstimateError::NoFreeParameters);
    }
    if !options.robust_kernel.is_valid() {
        return Err(EstimateError::InvalidRobustKernel(options.robust_kernel));
    }
    if dataset.len() < layout.dim() {
        return Err(EstimateError::UnderdeterminedSystem {
            correspondences: dataset.len(),
            free_params: layout.dim(),
        });
    }
    dataset.check_bounds(intrinsics)?;
    intrinsics
        .validate()
        .and_then(|_| initial.validate())
        .map_err(EstimateError::InvalidInitialGuess)?;
    if layout.has_scale_gauge(initial) {
        warn!("every length is free: the geometry is only determined up to a global scale");
    }

    let problem = DomeGeometryProblem::new(dataset, *intrinsics, *initial, layout.clone())
        .with_kernel(options.robust_kernel);
    let x0 = layout.pack(initial);

    let (x, report) = match options.solver {
        SolverKind::DampedLm => {
            let unreachable = problem.count_unreachable(&x0);
            if unreachable > 0 {
                return Err(EstimateError::InfeasibleInitialGuess {
                    unreachable,
                    total: dataset.len(),
                });
            }
            DampedLmBackend.solve(&problem, x0, &options.solve)
        }
        SolverKind::Minpack => LmBackend.solve(&problem, x0, &options.solve),
    };

    let fit = summarize(&problem, &x, report);
    info!(
        "geometry fit: {} after {} iterations, cost {:.3e}, mean error {:.4} deg, max {:.4} deg",
        fit.report.termination,
        fit.report.iterations,
        fit.report.final_cost,
        fit.mean_angular_error_deg,
        fit.max_angular_error_deg
    );

    if fit.report.converged {
        Ok(fit)
    } else {
        warn!("geometry fit stopped without converging: {}", fit.report.termination);
        Err(EstimateError::ConvergenceFailure {
            termination: fit.report.termination,
            final_cost: fit.report.final_cost,
            best: Box::new(fit),
        })
    }
}

fn summarize(problem: &DomeGeometryProblem, x: &DVector<Real>, report: SolveReport) -> GeometryFit {
    let predicted = problem.predict(x);
    let points: Vec<PointResidual> = problem
        .correspondences
        .iter()
        .zip(&predicted)
        .enumerate()
        .map(|(index, (c, p))| match p {
            Ok(v) => PointResidual {
                index,
                fitted: Some(*v),
                error: (v - c.direction).norm(),
                angular_error_deg: Some(angle_between(v, &c.direction).to_degrees()),
            },
            Err(_) => PointResidual {
                index,
                fitted: None,
                error: 2.0,
                angular_error_deg: None,
            },
        })
        .collect();

    let n = points.len().max(1) as Real;
    let rms_error = (points.iter().map(|p| p.error * p.error).sum::<Real>() / n).sqrt();
    let angles: Vec<Real> = points.iter().filter_map(|p| p.angular_error_deg).collect();
    let mean_angular_error_deg = if angles.is_empty() {
        Real::NAN
    } else {
        angles.iter().sum::<Real>() / angles.len() as Real
    };
    let max_angular_error_deg = angles.iter().copied().fold(0.0, Real::max);
    let unreachable = points.iter().filter(|p| p.fitted.is_none()).count();

    GeometryFit {
        geometry: problem.geometry(x),
        report,
        points,
        rms_error,
        mean_angular_error_deg,
        max_angular_error_deg,
        unreachable,
    }
}
