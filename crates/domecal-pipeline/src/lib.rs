//! End-to-end calibration of a spherical-mirror dome display.
//!
//! JSON-friendly records around the estimator and warp builder:
//! [`run_calibration`] fits the rig geometry to measured correspondences,
//! [`run_warp`] turns a fitted display into a warp table, and
//! [`run_simulation`] produces the reference dataset for a known rig.

pub mod centroids;
mod error;
pub mod io;
pub mod simulate;
pub mod warp;

pub use centroids::{
    format_centroid_list, pair_with_canonical_directions, parse_centroid_list, read_centroid_list,
};
pub use error::PipelineError;
pub use io::{load_json_file, write_json_file};
pub use simulate::{run_simulation, simulate_dataset, SimulationConfig};
pub use warp::{run_warp, run_warp_to_file, WarpConfig, WarpOutput};

use domecal_core::{
    CalibrationDataset, CorrespondenceRecord, DomeDisplay, GeometryParam, GeometryParameters,
    ImageOutline, ProjectorIntrinsics, Real, ViewAngles,
};
use domecal_optim::{
    estimate_geometry, EstimateError, GeometryEstimateOptions, GeometryFit, ParameterLayout,
    RobustKernel, SolveOptions, SolverKind, Termination,
};
use log::info;
use serde::{Deserialize, Serialize};

/// Tape measurements of the projected image on boards at two distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectorOutlines {
    pub near: ImageOutline,
    pub far: ImageOutline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub intrinsics: ProjectorIntrinsics,
    /// When set, replaces the frustum of `intrinsics` (its pixel size is
    /// kept) and the projector offset of `initial_geometry`.
    pub projector_outlines: Option<ProjectorOutlines>,
    /// Starting point of the fit.
    pub initial_geometry: GeometryParameters,
    /// Scalars held at their initial value. Fixing one length removes the
    /// global scale ambiguity.
    pub fixed: Vec<GeometryParam>,
    pub robust_kernel: RobustKernel,
    pub solver: SolverKind,
    /// Maximum solver iterations (if `None`, use the solver default).
    pub max_iters: Option<usize>,
    /// Overrides the cost, step and gradient tolerances together.
    pub tolerance: Option<Real>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            intrinsics: ProjectorIntrinsics::default(),
            projector_outlines: None,
            initial_geometry: GeometryParameters::default(),
            fixed: Vec::new(),
            robust_kernel: RobustKernel::None,
            solver: SolverKind::default(),
            max_iters: None,
            tolerance: None,
        }
    }
}

impl CalibrationConfig {
    pub fn max_iters_or_default(&self) -> usize {
        self.max_iters.unwrap_or(SolveOptions::default().max_iters)
    }

    /// Intrinsics and starting geometry of the fit.
    pub fn resolved_setup(
        &self,
    ) -> Result<(ProjectorIntrinsics, GeometryParameters), PipelineError> {
        let mut geometry = self.initial_geometry;
        let Some(outlines) = &self.projector_outlines else {
            return Ok((self.intrinsics, geometry));
        };
        let (intrinsics, projector) = ProjectorIntrinsics::from_image_outlines(
            self.intrinsics.width,
            self.intrinsics.height,
            &outlines.near,
            &outlines.far,
        )
        .map_err(PipelineError::InvalidIntrinsics)?;
        info!(
            "projector focal point from outlines: y {:.3}, z {:.3}",
            projector.y, projector.z
        );
        geometry.projector = projector;
        Ok((intrinsics, geometry))
    }

    pub fn estimate_options(&self) -> GeometryEstimateOptions {
        let mut solve = SolveOptions {
            max_iters: self.max_iters_or_default(),
            ..Default::default()
        };
        if let Some(tol) = self.tolerance {
            solve.ftol = tol;
            solve.gtol = tol;
            solve.xtol = tol;
        }
        GeometryEstimateOptions {
            layout: ParameterLayout::with_fixed(&self.fixed),
            robust_kernel: self.robust_kernel,
            solver: self.solver,
            solve,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationInput {
    pub correspondences: Vec<CorrespondenceRecord>,
}

/// Fit of one correspondence, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointReport {
    pub pixel_row: Real,
    pub pixel_col: Real,
    pub yaw_deg: Real,
    pub pitch_deg: Real,
    /// `None` when the pixel misses the mirror or dome under the fit.
    pub fitted_yaw_deg: Option<Real>,
    pub fitted_pitch_deg: Option<Real>,
    pub angular_error_deg: Option<Real>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub intrinsics: ProjectorIntrinsics,
    pub geometry: GeometryParameters,
    pub initial_cost: Real,
    pub final_cost: Real,
    pub rms_error: Real,
    pub mean_angular_error_deg: Option<Real>,
    pub max_angular_error_deg: Real,
    pub iterations: usize,
    pub termination: Termination,
    pub converged: bool,
    pub unreachable: usize,
    pub points: Vec<PointReport>,
}

impl CalibrationReport {
    fn from_fit(
        dataset: &CalibrationDataset,
        intrinsics: ProjectorIntrinsics,
        fit: &GeometryFit,
    ) -> Self {
        let points = dataset
            .iter()
            .zip(&fit.points)
            .map(|(c, p)| {
                let known = c.angles();
                let fitted = p.fitted.as_ref().map(ViewAngles::from_direction);
                PointReport {
                    pixel_row: c.pixel.row,
                    pixel_col: c.pixel.col,
                    yaw_deg: known.yaw_deg,
                    pitch_deg: known.pitch_deg,
                    fitted_yaw_deg: fitted.map(|a| a.yaw_deg),
                    fitted_pitch_deg: fitted.map(|a| a.pitch_deg),
                    angular_error_deg: p.angular_error_deg,
                }
            })
            .collect();
        Self {
            intrinsics,
            geometry: fit.geometry,
            initial_cost: fit.report.initial_cost,
            final_cost: fit.report.final_cost,
            rms_error: fit.rms_error,
            mean_angular_error_deg: Some(fit.mean_angular_error_deg).filter(|v| v.is_finite()),
            max_angular_error_deg: fit.max_angular_error_deg,
            iterations: fit.report.iterations,
            termination: fit.report.termination,
            converged: fit.report.converged,
            unreachable: fit.unreachable,
            points,
        }
    }

    /// The calibrated display.
    pub fn display(&self) -> DomeDisplay {
        DomeDisplay::new(self.intrinsics, self.geometry)
    }
}

/// Fit the rig geometry to `input`.
///
/// A fit that stops without converging is still reported, with
/// `converged == false` and the backend's termination reason.
pub fn run_calibration(
    input: &CalibrationInput,
    config: &CalibrationConfig,
) -> Result<CalibrationReport, PipelineError> {
    let dataset = CalibrationDataset::from_records(&input.correspondences)?;
    let (intrinsics, initial) = config.resolved_setup()?;
    let options = config.estimate_options();
    let fit = match estimate_geometry(&dataset, &intrinsics, &initial, &options) {
        Ok(fit) => fit,
        Err(EstimateError::ConvergenceFailure { best, .. }) => *best,
        Err(err) => return Err(err.into()),
    };
    Ok(CalibrationReport::from_fit(&dataset, intrinsics, &fit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domecal_core::PlaneOffset;
    use domecal_core::DatasetError;

    fn perturbed_guess() -> GeometryParameters {
        GeometryParameters {
            mirror_radius: 22.86,
            dome_radius: 67.0,
            plane_x: 0.0,
            projector: PlaneOffset::new(-77.5, 1.0),
            dome_center: PlaneOffset::new(1.5, 11.5),
            observer: PlaneOffset::new(23.5, 19.5),
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: CalibrationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CalibrationConfig::default());
        assert_eq!(config.estimate_options().layout.dim(), 8);
        assert_eq!(config.max_iters_or_default(), SolveOptions::default().max_iters);
    }

    #[test]
    fn config_fields_reach_the_estimator() {
        let config: CalibrationConfig = serde_json::from_str(
            r#"{
                "fixed": ["mirror_radius", "observer_y"],
                "robust_kernel": { "type": "cauchy", "c": 0.01 },
                "solver": "minpack",
                "max_iters": 40,
                "tolerance": 1e-10
            }"#,
        )
        .unwrap();
        let options = config.estimate_options();
        assert_eq!(options.layout.dim(), 6);
        assert!(!options.layout.is_free(GeometryParam::MirrorRadius));
        assert_eq!(options.robust_kernel, RobustKernel::Cauchy { c: 0.01 });
        assert_eq!(options.solver, SolverKind::Minpack);
        assert_eq!(options.solve.max_iters, 40);
        assert_eq!(options.solve.gtol, 1e-10);
    }

    #[test]
    fn unconverged_fit_is_reported() {
        let input = run_simulation(&SimulationConfig::default()).unwrap();
        let config = CalibrationConfig {
            initial_geometry: perturbed_guess(),
            fixed: vec![GeometryParam::MirrorRadius],
            max_iters: Some(1),
            ..Default::default()
        };
        let report = run_calibration(&input, &config).unwrap();
        assert!(!report.converged);
        assert_eq!(report.termination, Termination::MaxIterations);
        assert_eq!(report.points.len(), 37);
        assert!(report.final_cost < report.initial_cost);
    }

    fn measured_outlines() -> ProjectorOutlines {
        let k = ProjectorIntrinsics::default();
        let focal = GeometryParameters::default().projector;
        ProjectorOutlines {
            near: ImageOutline::of_frustum(&k, focal, -60.0),
            far: ImageOutline::of_frustum(&k, focal, -30.0),
        }
    }

    #[test]
    fn outlines_set_the_frustum_and_projector_guess() {
        let config = CalibrationConfig {
            projector_outlines: Some(measured_outlines()),
            initial_geometry: perturbed_guess(),
            fixed: vec![GeometryParam::MirrorRadius],
            ..Default::default()
        };
        let (k, initial) = config.resolved_setup().unwrap();
        let truth = ProjectorIntrinsics::default();
        assert_eq!((k.width, k.height), (truth.width, truth.height));
        assert!((k.vertical_spread - truth.vertical_spread).abs() < 1e-12);
        assert!((initial.projector.y + 79.5).abs() < 1e-9, "{:?}", initial.projector);
        assert!(initial.projector.z.abs() < 1e-9);
        assert_eq!(initial.dome_radius, 67.0);

        let input = run_simulation(&SimulationConfig::default()).unwrap();
        let report = run_calibration(&input, &config).unwrap();
        assert!(report.converged, "termination {}", report.termination);
        assert!((report.geometry.dome_radius - 70.0).abs() < 1e-3);
        assert!((report.intrinsics.vertical_offset - truth.vertical_offset).abs() < 1e-12);
    }

    #[test]
    fn crossed_outlines_are_a_config_error() {
        let mut outlines = measured_outlines();
        std::mem::swap(&mut outlines.near, &mut outlines.far);
        let config = CalibrationConfig {
            projector_outlines: Some(outlines),
            ..Default::default()
        };
        let input = run_simulation(&SimulationConfig::default()).unwrap();
        let err = run_calibration(&input, &config).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidIntrinsics(_)), "{err}");
    }

    #[test]
    fn malformed_records_are_rejected_before_fitting() {
        let mut input = run_simulation(&SimulationConfig::default()).unwrap();
        input.correspondences[3].pitch_deg = 120.0;
        let err = run_calibration(&input, &CalibrationConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Dataset(DatasetError::MalformedCorrespondence { index: 3, .. })
        ));
    }
}
