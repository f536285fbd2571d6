//! Non-linear least squares estimation of dome display geometry.
//!
//! The estimator fits the unknown rig geometry of a spherical-mirror dome
//! display to a sparse set of pixel/direction correspondences. Problems are
//! expressed through [`NllsProblem`] and solved by one of two backends behind
//! [`NllsSolverBackend`]:
//!
//! - [`DampedLmBackend`]: damped Gauss-Newton that rejects steps leaving the
//!   region where every correspondence still reaches the dome,
//! - [`LmBackend`]: MINPACK-style Levenberg-Marquardt from the
//!   `levenberg-marquardt` crate, fed penalized residuals.

pub mod backend_damped;
pub mod backend_lm;
pub mod jacobian;
pub mod params;
pub mod problems;
pub mod robust;
pub mod traits;

pub use backend_damped::DampedLmBackend;
pub use backend_lm::LmBackend;
pub use params::ParameterLayout;
pub use problems::dome_geometry::*;
pub use robust::RobustKernel;
pub use traits::*;
