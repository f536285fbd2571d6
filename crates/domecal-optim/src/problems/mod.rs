//! Calibration problems expressed as [`NllsProblem`](crate::NllsProblem)s.

pub mod dome_geometry;
