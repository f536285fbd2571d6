//! High-level entry crate for the `domecal` toolbox.
//!
//! Calibrates a single projector that lights a dome by bouncing off a
//! spherical mirror: fit the rig geometry to pixel/direction
//! correspondences, then build the warp table that pre-distorts frames.
//!
//! ```no_run
//! use domecal::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let input: CalibrationInput = load_json_file("correspondences.json".as_ref())?;
//! let config = CalibrationConfig {
//!     fixed: vec![GeometryParam::MirrorRadius],
//!     ..Default::default()
//! };
//! let report = run_calibration(&input, &config)?;
//! println!("dome radius: {:.3}", report.geometry.dome_radius);
//!
//! let warp = run_warp(&report.display(), &WarpConfig::default());
//! println!("mapped pixels: {}", warp.summary.mapped);
//! # Ok(())
//! # }
//! ```

/// All-in-one functions and JSON records for calibration, warp and simulation.
pub mod pipeline {
    pub use domecal_pipeline::*;
}

/// Geometry primitives, rig model and correspondence types.
pub mod core {
    pub use domecal_core::*;
}

/// Non-linear least-squares backends and the geometry estimator.
pub mod optim {
    pub use domecal_optim::*;
}

/// Dense direction grids, model inversion and warp tables.
pub mod warp {
    pub use domecal_warp::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use domecal::prelude::*;` to get started quickly.
pub mod prelude {
    pub use crate::core::{
        CalibrationDataset, Correspondence, DomeDisplay, GeometryParam, GeometryParameters,
        ImageOutline, PixelCoord, PlaneOffset, ProjectorIntrinsics, Real, Vec3, ViewAngles,
    };

    pub use crate::optim::{
        estimate_geometry, GeometryEstimateOptions, ParameterLayout, RobustKernel, SolverKind,
    };

    pub use crate::pipeline::{
        load_json_file, run_calibration, run_simulation, run_warp, write_json_file,
        CalibrationConfig, CalibrationInput, CalibrationReport, ProjectorOutlines,
        SimulationConfig, WarpConfig,
    };

    pub use crate::warp::{SourceImage, WarpTable};
}
