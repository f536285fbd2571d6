use crate::{CalibrationInput, PipelineError};
use domecal_core::synthetic::{canonical_angles, CentroidNoise};
use domecal_core::{
    CorrespondenceRecord, DomeDisplay, GeometryParameters, ProjectorIntrinsics, Real, Vec3,
    ViewAngles,
};
use domecal_warp::{locate_directions, InvertOptions};
use log::info;
use serde::{Deserialize, Serialize};

/// Rig and centroid noise used to synthesize the reference dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub intrinsics: ProjectorIntrinsics,
    pub geometry: GeometryParameters,
    /// Maximum absolute centroid error per axis, in pixels.
    pub noise_px: Real,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            intrinsics: ProjectorIntrinsics::default(),
            geometry: GeometryParameters::default(),
            noise_px: 0.0,
            seed: 0,
        }
    }
}

/// Correspondences for `angles` at the pixels that show them under
/// `geometry`, offset by `noise`.
///
/// Fails if the display cannot show one of the directions.
pub fn simulate_dataset(
    intrinsics: &ProjectorIntrinsics,
    geometry: &GeometryParameters,
    angles: &[ViewAngles],
    noise: &CentroidNoise,
) -> Result<CalibrationInput, PipelineError> {
    intrinsics.validate().map_err(PipelineError::InvalidIntrinsics)?;
    geometry.validate().map_err(PipelineError::InvalidGeometry)?;

    let display = DomeDisplay::new(*intrinsics, *geometry);
    let targets: Vec<Vec3> = angles.iter().map(ViewAngles::to_direction).collect();
    let located = locate_directions(&display, &targets, &InvertOptions::default());

    let missing: Vec<usize> = located
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.is_none().then_some(i))
        .collect();
    if let Some(&first) = missing.first() {
        return Err(PipelineError::MissingDirections {
            missing: missing.len(),
            first,
        });
    }

    let correspondences = located
        .into_iter()
        .flatten()
        .zip(angles)
        .enumerate()
        .map(|(i, (pixel, a))| {
            let pixel = noise.apply(i, pixel);
            CorrespondenceRecord {
                pixel_row: pixel.row,
                pixel_col: pixel.col,
                yaw_deg: a.yaw_deg,
                pitch_deg: a.pitch_deg,
            }
        })
        .collect::<Vec<_>>();
    info!(
        "simulated {} correspondences (noise up to {} px)",
        correspondences.len(),
        noise.max_abs_px
    );
    Ok(CalibrationInput { correspondences })
}

/// The reference 37-direction dataset for `config`.
pub fn run_simulation(config: &SimulationConfig) -> Result<CalibrationInput, PipelineError> {
    simulate_dataset(
        &config.intrinsics,
        &config.geometry,
        &canonical_angles(),
        &CentroidNoise::new(config.seed, config.noise_px),
    )
}
