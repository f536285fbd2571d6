//! Dense evaluation of a calibrated dome display.
//!
//! Given fitted geometry, this crate evaluates the viewing direction of every
//! projector pixel ([`DirectionGrid`]), inverts the forward model for chosen
//! directions ([`invert_direction`]), and builds the per-pixel lookup into a
//! canonical source image ([`WarpTable`]) that an external resampler uses to
//! pre-distort frames.
//!
//! The source image is modelled as a set of flat virtual camera screens
//! around the observer ([`SourceImage`]).

pub mod grid;
pub mod invert;
pub mod io;
pub mod source;
pub mod table;

pub use grid::{DirectionGrid, FieldOfView};
pub use invert::{invert_direction, locate_directions, InvertOptions};
pub use io::{load_warp_table, save_warp_table, WarpIoError};
pub use source::{SourceImage, SourceSample, VirtualScreen};
pub use table::{WarpSummary, WarpTable};
