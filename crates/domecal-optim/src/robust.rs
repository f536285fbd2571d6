use domecal_core::Real;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Robust loss applied per correspondence.
///
/// A correspondence contributes a block of residual rows (the three
/// components of its direction error). The kernel sees the squared norm of
/// the whole block, so a misplaced calibration dot is down-weighted as one
/// unit rather than component by component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RobustKernel {
    /// Plain least squares.
    #[default]
    None,
    /// Quadratic up to `delta`, linear beyond.
    Huber { delta: Real },
    /// `c^2 ln(1 + s / c^2)`.
    Cauchy { c: Real },
}

impl RobustKernel {
    /// Scale parameter of the kernel, `None` for plain least squares.
    pub fn scale(self) -> Option<Real> {
        match self {
            RobustKernel::None => None,
            RobustKernel::Huber { delta } => Some(delta),
            RobustKernel::Cauchy { c } => Some(c),
        }
    }

    /// Scales must be finite and positive; a zero scale weights every
    /// correspondence to nothing.
    pub fn is_valid(self) -> bool {
        self.scale().map_or(true, |s| s.is_finite() && s > 0.0)
    }

    /// Loss `rho(s)` for a squared block norm `s`.
    pub fn loss(self, s: Real) -> Real {
        match self {
            RobustKernel::None => s,
            RobustKernel::Huber { delta } => {
                let r = s.sqrt();
                if r <= delta {
                    s
                } else {
                    2.0 * delta * r - delta * delta
                }
            }
            RobustKernel::Cauchy { c } => c * c * (s / (c * c)).ln_1p(),
        }
    }

    /// IRLS weight `rho'(s)` for a squared block norm `s`.
    pub fn weight(self, s: Real) -> Real {
        match self {
            RobustKernel::None => 1.0,
            RobustKernel::Huber { delta } => {
                let r = s.sqrt();
                if r <= delta {
                    1.0
                } else {
                    delta / r
                }
            }
            RobustKernel::Cauchy { c } => 1.0 / (1.0 + s / (c * c)),
        }
    }

    /// Row scales `sqrt(w)` for residuals laid out in consecutive blocks of `block` rows.
    pub fn block_scales(self, r: &DVector<Real>, block: usize) -> DVector<Real> {
        let mut scales = DVector::from_element(r.len(), 1.0);
        if matches!(self, RobustKernel::None) || block == 0 {
            return scales;
        }
        for start in (0..r.len()).step_by(block) {
            let end = (start + block).min(r.len());
            let s = r.rows(start, end - start).norm_squared();
            let scale = self.weight(s).sqrt();
            scales.rows_mut(start, end - start).fill(scale);
        }
        scales
    }
}
