use crate::{Real, Vec3};
use serde::{Deserialize, Serialize};

/// Viewing direction expressed as yaw/pitch in the observer's frame.
///
/// The observer faces the projector (`-y`). Yaw is positive to the observer's
/// right (`-x`), pitch is elevation above the horizontal plane:
///
/// `direction = (-cos p sin y, -cos p cos y, sin p)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewAngles {
    pub yaw_deg: Real,
    pub pitch_deg: Real,
}

impl ViewAngles {
    pub fn new(yaw_deg: Real, pitch_deg: Real) -> Self {
        Self { yaw_deg, pitch_deg }
    }

    pub fn to_direction(&self) -> Vec3 {
        let yaw = self.yaw_deg.to_radians();
        let pitch = self.pitch_deg.to_radians();
        Vec3::new(
            -pitch.cos() * yaw.sin(),
            -pitch.cos() * yaw.cos(),
            pitch.sin(),
        )
    }

    /// Angles of a unit direction. Yaw is arbitrary (zero) straight up or down.
    pub fn from_direction(dir: &Vec3) -> Self {
        let pitch = dir.z.clamp(-1.0, 1.0).asin();
        let yaw = if dir.x == 0.0 && dir.y == 0.0 {
            0.0
        } else {
            (-dir.x).atan2(-dir.y)
        };
        Self {
            yaw_deg: yaw.to_degrees(),
            pitch_deg: pitch.to_degrees(),
        }
    }
}
