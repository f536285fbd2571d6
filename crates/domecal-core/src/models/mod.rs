mod intrinsics;
mod outline;
mod params;

pub use intrinsics::*;
pub use outline::*;
pub use params::*;
