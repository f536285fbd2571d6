mod angles;
mod observation;

pub use angles::*;
pub use observation::*;
