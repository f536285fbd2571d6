//! Parameter packing between [`GeometryParameters`](domecal_core::GeometryParameters)
//! and the dense vectors the backends work on.

mod layout;

pub use layout::ParameterLayout;
