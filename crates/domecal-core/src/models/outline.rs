use crate::{GeometryError, PlaneOffset, ProjectorIntrinsics, Real};
use serde::{Deserialize, Serialize};

/// Edges of the projected image traced on a flat board square to the
/// projector axis, in rig coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageOutline {
    /// `y` of the board.
    pub y: Real,
    pub left: Real,
    pub right: Real,
    pub top: Real,
    pub bottom: Real,
}

impl ImageOutline {
    /// Outline a projector with focal point `(0, focal.y, focal.z)` draws on
    /// the board at `y`.
    pub fn of_frustum(intrinsics: &ProjectorIntrinsics, focal: PlaneOffset, y: Real) -> Self {
        let t = y - focal.y;
        let half_w = 0.5 * t * intrinsics.horizontal_spread;
        let half_h = 0.5 * t * intrinsics.vertical_spread;
        let centre = focal.z + t * intrinsics.vertical_offset;
        Self {
            y,
            left: -half_w,
            right: half_w,
            top: centre + half_h,
            bottom: centre - half_h,
        }
    }

    pub fn width(&self) -> Real {
        self.right - self.left
    }

    pub fn height(&self) -> Real {
        self.top - self.bottom
    }
}

impl ProjectorIntrinsics {
    /// Frustum and focal point from two outlines of the projected image.
    ///
    /// The top edges of both outlines span one line in the `y, z` plane and
    /// the bottom edges another; they meet at the focal point. The far
    /// outline then fixes the spreads and the vertical offset per unit throw.
    /// The image is taken to be horizontally centred on the mirror.
    pub fn from_image_outlines(
        width: u32,
        height: u32,
        near: &ImageOutline,
        far: &ImageOutline,
    ) -> Result<(Self, PlaneOffset), GeometryError> {
        let separation = far.y - near.y;
        if !(separation.is_finite() && separation > 0.0) {
            return Err(GeometryError::InvalidParameter {
                name: "outline_separation",
                value: separation,
            });
        }
        for (name, value) in [
            ("near_outline_height", near.height()),
            ("far_outline_height", far.height()),
            ("far_outline_width", far.width()),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::InvalidParameter { name, value });
            }
        }

        let upper_slope = (far.top - near.top) / separation;
        let lower_slope = (far.bottom - near.bottom) / separation;
        let opening = upper_slope - lower_slope;
        if !(opening.is_finite() && opening > 0.0) {
            return Err(GeometryError::InvalidParameter {
                name: "outline_opening",
                value: opening,
            });
        }
        let focal_y = near.y - near.height() / opening;
        let focal_z = near.top + upper_slope * (focal_y - near.y);

        let throw = far.y - focal_y;
        let intrinsics = Self {
            width,
            height,
            horizontal_spread: far.width() / throw,
            vertical_spread: far.height() / throw,
            vertical_offset: (far.bottom + 0.5 * far.height() - focal_z) / throw,
        };
        intrinsics.validate()?;
        Ok((intrinsics, PlaneOffset::new(focal_y, focal_z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlines_recover_frustum_and_focal_point() {
        let k = ProjectorIntrinsics::default();
        let focal = PlaneOffset::new(-79.5, 0.0);
        let near = ImageOutline::of_frustum(&k, focal, -60.0);
        let far = ImageOutline::of_frustum(&k, focal, -25.0);

        let (fitted, at) =
            ProjectorIntrinsics::from_image_outlines(1280, 720, &near, &far).unwrap();
        assert!((at.y - focal.y).abs() < 1e-9, "focal y {}", at.y);
        assert!((at.z - focal.z).abs() < 1e-9, "focal z {}", at.z);
        assert_eq!((fitted.width, fitted.height), (1280, 720));
        assert!((fitted.horizontal_spread - k.horizontal_spread).abs() < 1e-12);
        assert!((fitted.vertical_spread - k.vertical_spread).abs() < 1e-12);
        assert!((fitted.vertical_offset - k.vertical_offset).abs() < 1e-12);
    }

    #[test]
    fn raised_focal_point_is_found() {
        let k = ProjectorIntrinsics::from_throw_ratio(1920, 1080, 1.2, 0.3);
        let focal = PlaneOffset::new(-70.0, 4.25);
        let near = ImageOutline::of_frustum(&k, focal, -50.0);
        let far = ImageOutline::of_frustum(&k, focal, -10.0);
        let (fitted, at) =
            ProjectorIntrinsics::from_image_outlines(1920, 1080, &near, &far).unwrap();
        assert!((at.y + 70.0).abs() < 1e-9 && (at.z - 4.25).abs() < 1e-9, "{at:?}");
        assert!((fitted.vertical_offset - 0.3 / 1.2).abs() < 1e-12);
    }

    #[test]
    fn parallel_edges_have_no_focal_point() {
        let outline = ImageOutline {
            y: -40.0,
            left: -10.0,
            right: 10.0,
            top: 8.0,
            bottom: -2.0,
        };
        let shifted = ImageOutline { y: -20.0, ..outline };
        let err = ProjectorIntrinsics::from_image_outlines(1280, 720, &outline, &shifted)
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidParameter {
                name: "outline_opening",
                ..
            }
        ));
        let err = ProjectorIntrinsics::from_image_outlines(1280, 720, &shifted, &outline)
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidParameter {
                name: "outline_separation",
                ..
            }
        ));
    }
}
