use crate::Real;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reflective surface of the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Mirror,
    Dome,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Mirror => f.write_str("mirror"),
            Surface::Dome => f.write_str("dome"),
        }
    }
}

/// Failure to trace a projector pixel to a viewing direction.
///
/// These are expected during optimisation and warp building: the optimizer
/// rejects the step, the warp builder marks the pixel unmapped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("ray misses the {0} sphere")]
    NoIntersection(Surface),
    #[error("viewing direction is undefined (display point coincides with the observer)")]
    DegenerateDirection,
    #[error("invalid geometry parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: Real },
}

/// Invalid calibration input, reported before any optimisation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    #[error("correspondence {index} is malformed: {reason}")]
    MalformedCorrespondence { index: usize, reason: String },
    #[error("calibration dataset is empty")]
    Empty,
}

impl DatasetError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        DatasetError::MalformedCorrespondence {
            index,
            reason: reason.into(),
        }
    }
}
