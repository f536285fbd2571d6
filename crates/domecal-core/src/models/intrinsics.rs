use crate::{GeometryError, Real};
use serde::{Deserialize, Serialize};

/// Sub-pixel projector image coordinates.
///
/// Integer pixel `(r, c)` covers `[r, r + 1) x [c, c + 1)`, so its centre is
/// `(r + 0.5, c + 0.5)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelCoord {
    pub row: Real,
    pub col: Real,
}

impl PixelCoord {
    pub fn new(row: Real, col: Real) -> Self {
        Self { row, col }
    }

    /// Centre of the integer pixel `(row, col)`.
    pub fn center_of(row: u32, col: u32) -> Self {
        Self::new(row as Real + 0.5, col as Real + 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.row.is_finite() && self.col.is_finite()
    }
}

/// Projector frustum constants, fixed by the equipment and never estimated.
///
/// Spreads and the vertical offset are expressed per unit throw distance: at
/// distance `t` in front of the lens the image is `t * horizontal_spread`
/// wide, `t * vertical_spread` tall, and its centre sits
/// `t * vertical_offset` above the optical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectorIntrinsics {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    pub horizontal_spread: Real,
    pub vertical_spread: Real,
    pub vertical_offset: Real,
}

impl ProjectorIntrinsics {
    /// Intrinsics of a commodity projector specified by its throw ratio
    /// (throw distance over image height) and lens rise (fraction of the
    /// image height the image centre sits above the axis).
    pub fn from_throw_ratio(width: u32, height: u32, throw_ratio: Real, rise: Real) -> Self {
        let vertical_spread = 1.0 / throw_ratio;
        let horizontal_spread = vertical_spread * width as Real / height as Real;
        Self {
            width,
            height,
            horizontal_spread,
            vertical_spread,
            vertical_offset: rise * vertical_spread,
        }
    }

    pub fn aspect_ratio(&self) -> Real {
        self.width as Real / self.height as Real
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True if `pixel` lies on the image (edges inclusive).
    pub fn contains(&self, pixel: &PixelCoord) -> bool {
        pixel.row >= 0.0
            && pixel.col >= 0.0
            && pixel.row <= self.height as Real
            && pixel.col <= self.width as Real
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.width == 0 {
            return Err(GeometryError::InvalidParameter {
                name: "width",
                value: 0.0,
            });
        }
        if self.height == 0 {
            return Err(GeometryError::InvalidParameter {
                name: "height",
                value: 0.0,
            });
        }
        for (name, value) in [
            ("horizontal_spread", self.horizontal_spread),
            ("vertical_spread", self.vertical_spread),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::InvalidParameter { name, value });
            }
        }
        if !self.vertical_offset.is_finite() {
            return Err(GeometryError::InvalidParameter {
                name: "vertical_offset",
                value: self.vertical_offset,
            });
        }
        Ok(())
    }
}

impl Default for ProjectorIntrinsics {
    /// 1280x720 projector with throw ratio 1.39 and a 15% lens rise.
    fn default() -> Self {
        Self::from_throw_ratio(1280, 720, 1.39, 0.15)
    }
}
