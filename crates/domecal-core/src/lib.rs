//! Core math and geometry primitives for `domecal`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, ...) and a stable quadratic solver,
//! - the forward optical model of a single-projector display that reflects
//!   off a spherical mirror onto a spherical dome ([`DomeDisplay`]),
//! - calibration data types (pixel/direction correspondences, yaw/pitch angles),
//! - deterministic synthetic data helpers.
//!
//! Forward model:
//! `direction = normalize(dome ∘ reflect ∘ mirror ∘ frustum(pixel) - observer)`
//!
//! Every position is expressed relative to the centre of the mirror sphere,
//! with `+z` up and the projector throwing along `+y`.

/// Error types shared by the geometry and dataset code.
pub mod error;
/// Ray/sphere primitives and the composed forward model.
pub mod geometry;
/// Linear algebra type aliases and helpers.
pub mod math;
/// Projector intrinsics and rig geometry parameters.
pub mod models;
/// Deterministic synthetic data generation.
pub mod synthetic;
/// Correspondences, datasets and angle conversions.
pub mod types;

pub use error::*;
pub use geometry::*;
pub use math::*;
pub use models::*;
pub use types::*;
