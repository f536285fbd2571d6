use crate::{PixelCoord, Real};

/// Deterministic uniform centroid noise in `[-max_abs_px, +max_abs_px]` per axis.
///
/// Seeded by a splitmix64 stream keyed on the correspondence index, so a
/// dataset is reproducible across platforms without an RNG dependency.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CentroidNoise {
    pub seed: u64,
    pub max_abs_px: Real,
}

impl CentroidNoise {
    pub fn new(seed: u64, max_abs_px: Real) -> Self {
        Self { seed, max_abs_px }
    }

    /// `(d_row, d_col)` offset for correspondence `index`.
    pub fn sample(&self, index: usize) -> (Real, Real) {
        let max_abs = self.max_abs_px.abs();
        if max_abs == 0.0 {
            return (0.0, 0.0);
        }
        let key = self.seed ^ (index as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        let u = unit_interval(splitmix64(key));
        let v = unit_interval(splitmix64(key ^ 0x94D0_49BB_1331_11EB));
        ((2.0 * u - 1.0) * max_abs, (2.0 * v - 1.0) * max_abs)
    }

    pub fn apply(&self, index: usize, pixel: PixelCoord) -> PixelCoord {
        let (dr, dc) = self.sample(index);
        PixelCoord::new(pixel.row + dr, pixel.col + dc)
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Top 53 bits mapped to `[0, 1)`.
fn unit_interval(x: u64) -> Real {
    (x >> 11) as Real * (1.0 / (1u64 << 53) as Real)
}
