use crate::{PixelCoord, ProjectorIntrinsics, Real, Vec3};

impl ProjectorIntrinsics {
    /// Point on the image plane one unit of throw in front of the lens.
    ///
    /// The projector looks along `+y` with `+z` up and no roll. Columns grow
    /// towards `+x`, rows grow downwards.
    pub fn image_plane_point(&self, pixel: PixelCoord) -> Vec3 {
        let w = self.width as Real;
        let h = self.height as Real;
        let x = (pixel.col - 0.5 * w) * self.horizontal_spread / w;
        let z = (0.5 * h - pixel.row) * self.vertical_spread / h + self.vertical_offset;
        Vec3::new(x, 1.0, z)
    }

    /// Unit direction of the ray leaving the projector focal point through `pixel`.
    pub fn ray_direction(&self, pixel: PixelCoord) -> Vec3 {
        self.image_plane_point(pixel).normalize()
    }

    /// Inverse of [`ray_direction`](Self::ray_direction). `None` for
    /// directions that do not point forward.
    pub fn pixel_from_direction(&self, dir: &Vec3) -> Option<PixelCoord> {
        if dir.y.is_nan() || dir.y <= 0.0 {
            return None;
        }
        let w = self.width as Real;
        let h = self.height as Real;
        let x = dir.x / dir.y;
        let z = dir.z / dir.y;
        Some(PixelCoord {
            row: 0.5 * h - (z - self.vertical_offset) * h / self.vertical_spread,
            col: 0.5 * w + x * w / self.horizontal_spread,
        })
    }
}
