use domecal_core::{DatasetError, GeometryError};
use domecal_optim::EstimateError;
use domecal_warp::WarpIoError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the pipeline entry points.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// A centroid list must hold one centroid per reference direction.
    #[error("centroid list has {found} entries, expected {expected}")]
    CentroidCount { found: usize, expected: usize },
    #[error("invalid projector intrinsics: {0}")]
    InvalidIntrinsics(GeometryError),
    #[error("invalid rig geometry: {0}")]
    InvalidGeometry(GeometryError),
    /// Simulation asked for directions the display cannot show.
    #[error("{missing} direction(s) are not shown by any projector pixel (first: #{first})")]
    MissingDirections { missing: usize, first: usize },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Estimate(#[from] EstimateError),
    #[error(transparent)]
    WarpIo(#[from] WarpIoError),
}
