//! Forward optical model, leaf-first:
//! sphere intersection, projector frustum, mirror reflection, dome hit,
//! and the composed [`DomeDisplay`].

mod dome;
mod mirror;
mod projector;
mod sphere;
mod viewing;

pub use dome::*;
pub use mirror::*;
pub use sphere::*;
pub use viewing::*;
