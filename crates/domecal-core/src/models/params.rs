use crate::{GeometryError, Real, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `(y, z)` position inside the shared vertical plane `x = plane_x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneOffset {
    pub y: Real,
    pub z: Real,
}

impl PlaneOffset {
    pub const fn new(y: Real, z: Real) -> Self {
        Self { y, z }
    }
}

/// Unknown rig geometry, relative to the mirror centre `M`.
///
/// The projector focal point `P`, the dome centre `D` and the observer `A`
/// share one `x` coordinate (`plane_x`), so only their `(y, z)` offsets are
/// stored. The vectors `MP`, `MD` and `MA` are assembled on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryParameters {
    pub mirror_radius: Real,
    pub dome_radius: Real,
    #[serde(default)]
    pub plane_x: Real,
    pub projector: PlaneOffset,
    pub dome_center: PlaneOffset,
    pub observer: PlaneOffset,
}

impl GeometryParameters {
    /// Vector from the mirror centre to the projector focal point.
    pub fn mp(&self) -> Vec3 {
        Vec3::new(self.plane_x, self.projector.y, self.projector.z)
    }

    /// Vector from the mirror centre to the dome centre.
    pub fn md(&self) -> Vec3 {
        Vec3::new(self.plane_x, self.dome_center.y, self.dome_center.z)
    }

    /// Vector from the mirror centre to the observer's head.
    pub fn ma(&self) -> Vec3 {
        Vec3::new(self.plane_x, self.observer.y, self.observer.z)
    }

    pub fn get(&self, param: GeometryParam) -> Real {
        match param {
            GeometryParam::MirrorRadius => self.mirror_radius,
            GeometryParam::DomeRadius => self.dome_radius,
            GeometryParam::ProjectorY => self.projector.y,
            GeometryParam::ProjectorZ => self.projector.z,
            GeometryParam::DomeCenterY => self.dome_center.y,
            GeometryParam::DomeCenterZ => self.dome_center.z,
            GeometryParam::ObserverY => self.observer.y,
            GeometryParam::ObserverZ => self.observer.z,
        }
    }

    pub fn set(&mut self, param: GeometryParam, value: Real) {
        let slot = match param {
            GeometryParam::MirrorRadius => &mut self.mirror_radius,
            GeometryParam::DomeRadius => &mut self.dome_radius,
            GeometryParam::ProjectorY => &mut self.projector.y,
            GeometryParam::ProjectorZ => &mut self.projector.z,
            GeometryParam::DomeCenterY => &mut self.dome_center.y,
            GeometryParam::DomeCenterZ => &mut self.dome_center.z,
            GeometryParam::ObserverY => &mut self.observer.y,
            GeometryParam::ObserverZ => &mut self.observer.z,
        };
        *slot = value;
    }

    /// Same geometry with every length multiplied by `factor`.
    ///
    /// Viewing directions are invariant under this transform.
    pub fn scaled(&self, factor: Real) -> Self {
        let mut out = *self;
        out.plane_x *= factor;
        for param in GeometryParam::ALL {
            out.set(param, self.get(param) * factor);
        }
        out
    }

    /// Reject non-finite values and non-positive radii.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.plane_x.is_finite() {
            return Err(GeometryError::InvalidParameter {
                name: "plane_x",
                value: self.plane_x,
            });
        }
        for param in GeometryParam::ALL {
            let value = self.get(param);
            let ok = if param.is_radius() {
                value.is_finite() && value > 0.0
            } else {
                value.is_finite()
            };
            if !ok {
                return Err(GeometryError::InvalidParameter {
                    name: param.name(),
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for GeometryParameters {
    /// Hand-measured rig: 18" mirror (22.86 cm radius), 70 cm dome.
    fn default() -> Self {
        Self {
            mirror_radius: 22.86,
            dome_radius: 70.0,
            plane_x: 0.0,
            projector: PlaneOffset::new(-79.5, 0.0),
            dome_center: PlaneOffset::new(0.0, 10.0),
            observer: PlaneOffset::new(25.0, 18.5),
        }
    }
}

/// One scalar of [`GeometryParameters`] that may be estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryParam {
    MirrorRadius,
    DomeRadius,
    ProjectorY,
    ProjectorZ,
    DomeCenterY,
    DomeCenterZ,
    ObserverY,
    ObserverZ,
}

impl GeometryParam {
    /// Canonical packing order.
    pub const ALL: [GeometryParam; 8] = [
        GeometryParam::MirrorRadius,
        GeometryParam::DomeRadius,
        GeometryParam::ProjectorY,
        GeometryParam::ProjectorZ,
        GeometryParam::DomeCenterY,
        GeometryParam::DomeCenterZ,
        GeometryParam::ObserverY,
        GeometryParam::ObserverZ,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeometryParam::MirrorRadius => "mirror_radius",
            GeometryParam::DomeRadius => "dome_radius",
            GeometryParam::ProjectorY => "projector_y",
            GeometryParam::ProjectorZ => "projector_z",
            GeometryParam::DomeCenterY => "dome_center_y",
            GeometryParam::DomeCenterZ => "dome_center_z",
            GeometryParam::ObserverY => "observer_y",
            GeometryParam::ObserverZ => "observer_z",
        }
    }

    pub fn is_radius(self) -> bool {
        matches!(self, GeometryParam::MirrorRadius | GeometryParam::DomeRadius)
    }
}

impl fmt::Display for GeometryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
