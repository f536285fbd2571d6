use crate::{DatasetError, PixelCoord, ProjectorIntrinsics, Real, Vec3, ViewAngles};
use serde::{Deserialize, Serialize};

/// A projector pixel whose viewing direction is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub pixel: PixelCoord,
    /// Unit viewing direction.
    pub direction: Vec3,
}

impl Correspondence {
    pub fn from_angles(pixel: PixelCoord, angles: ViewAngles) -> Self {
        Self {
            pixel,
            direction: angles.to_direction(),
        }
    }

    pub fn angles(&self) -> ViewAngles {
        ViewAngles::from_direction(&self.direction)
    }
}

/// Serialized form of a correspondence: pixel centroid plus yaw/pitch in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceRecord {
    pub pixel_row: Real,
    pub pixel_col: Real,
    pub yaw_deg: Real,
    pub pitch_deg: Real,
}

impl CorrespondenceRecord {
    pub fn to_correspondence(&self, index: usize) -> Result<Correspondence, DatasetError> {
        let values = [self.pixel_row, self.pixel_col, self.yaw_deg, self.pitch_deg];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DatasetError::malformed(index, "non-finite value"));
        }
        if self.pitch_deg.abs() > 90.0 {
            return Err(DatasetError::malformed(
                index,
                format!("pitch {} deg outside [-90, 90]", self.pitch_deg),
            ));
        }
        Ok(Correspondence::from_angles(
            PixelCoord::new(self.pixel_row, self.pixel_col),
            ViewAngles::new(self.yaw_deg, self.pitch_deg),
        ))
    }
}

impl From<&Correspondence> for CorrespondenceRecord {
    fn from(c: &Correspondence) -> Self {
        let angles = c.angles();
        Self {
            pixel_row: c.pixel.row,
            pixel_col: c.pixel.col,
            yaw_deg: angles.yaw_deg,
            pitch_deg: angles.pitch_deg,
        }
    }
}

/// Validated, ordered set of correspondences.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationDataset {
    correspondences: Vec<Correspondence>,
}

impl CalibrationDataset {
    const UNIT_TOL: Real = 1e-6;

    pub fn new(correspondences: Vec<Correspondence>) -> Result<Self, DatasetError> {
        if correspondences.is_empty() {
            return Err(DatasetError::Empty);
        }
        for (index, c) in correspondences.iter().enumerate() {
            if !c.pixel.is_finite() {
                return Err(DatasetError::malformed(index, "non-finite pixel"));
            }
            let n = c.direction.norm();
            if !n.is_finite() || (n - 1.0).abs() > Self::UNIT_TOL {
                return Err(DatasetError::malformed(
                    index,
                    format!("direction is not unit length (norm {n})"),
                ));
            }
        }
        Ok(Self { correspondences })
    }

    pub fn from_records(records: &[CorrespondenceRecord]) -> Result<Self, DatasetError> {
        let correspondences = records
            .iter()
            .enumerate()
            .map(|(i, r)| r.to_correspondence(i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(correspondences)
    }

    /// Reject pixels that fall outside the projector image.
    pub fn check_bounds(&self, intrinsics: &ProjectorIntrinsics) -> Result<(), DatasetError> {
        for (index, c) in self.correspondences.iter().enumerate() {
            if !intrinsics.contains(&c.pixel) {
                return Err(DatasetError::malformed(
                    index,
                    format!(
                        "pixel ({}, {}) outside {}x{} image",
                        c.pixel.row, c.pixel.col, intrinsics.width, intrinsics.height
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.correspondences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }

    pub fn as_slice(&self) -> &[Correspondence] {
        &self.correspondences
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Correspondence> {
        self.correspondences.iter()
    }

    pub fn records(&self) -> Vec<CorrespondenceRecord> {
        self.correspondences.iter().map(Into::into).collect()
    }
}

impl<'a> IntoIterator for &'a CalibrationDataset {
    type Item = &'a Correspondence;
    type IntoIter = std::slice::Iter<'a, Correspondence>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pixel_row: Real, pixel_col: Real, yaw_deg: Real, pitch_deg: Real) -> CorrespondenceRecord {
        CorrespondenceRecord {
            pixel_row,
            pixel_col,
            yaw_deg,
            pitch_deg,
        }
    }

    #[test]
    fn records_become_unit_directions() {
        let ds = CalibrationDataset::from_records(&[
            record(100.0, 200.0, 30.0, 20.0),
            record(300.5, 640.0, 0.0, 90.0),
        ])
        .unwrap();
        assert_eq!(ds.len(), 2);
        for c in &ds {
            assert!((c.direction.norm() - 1.0).abs() < 1e-12);
        }
        let back = ds.records();
        assert!((back[0].yaw_deg - 30.0).abs() < 1e-9);
        assert!((back[0].pitch_deg - 20.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_record_reports_index() {
        let err = CalibrationDataset::from_records(&[
            record(1.0, 1.0, 0.0, 0.0),
            record(1.0, Real::NAN, 0.0, 0.0),
        ])
        .unwrap_err();
        match err {
            DatasetError::MalformedCorrespondence { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error {other:?}"),
        }

        let err = record(1.0, 1.0, 0.0, 95.0).to_correspondence(4).unwrap_err();
        assert!(err.to_string().contains("correspondence 4"), "{err}");
    }

    #[test]
    fn empty_and_out_of_bounds() {
        assert_eq!(CalibrationDataset::new(Vec::new()), Err(DatasetError::Empty));

        let ds = CalibrationDataset::from_records(&[record(800.0, 10.0, 0.0, 0.0)]).unwrap();
        assert!(ds.check_bounds(&ProjectorIntrinsics::default()).is_err());
    }

    #[test]
    fn non_unit_direction_rejected() {
        let c = Correspondence {
            pixel: PixelCoord::new(1.0, 1.0),
            direction: Vec3::new(0.0, 2.0, 0.0),
        };
        assert!(CalibrationDataset::new(vec![c]).is_err());
    }
}
