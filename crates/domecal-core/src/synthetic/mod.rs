//! Deterministic synthetic data helpers.
//!
//! Used by tests and examples to build noiseless (or deterministically
//! perturbed) correspondences from a known rig.

pub mod dome;
pub mod noise;

pub use dome::*;
pub use noise::*;
