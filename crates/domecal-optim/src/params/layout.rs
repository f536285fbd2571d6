use domecal_core::{GeometryParam, GeometryParameters, Real};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Ordered list of the geometry scalars the optimizer may move.
///
/// Scalars that are not listed keep the value of the base geometry passed to
/// [`unpack`](Self::unpack). Order follows [`GeometryParam::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterLayout {
    free: Vec<GeometryParam>,
}

impl ParameterLayout {
    /// Every scalar free.
    pub fn all_free() -> Self {
        Self {
            free: GeometryParam::ALL.to_vec(),
        }
    }

    /// Every scalar free except `fixed`.
    pub fn with_fixed(fixed: &[GeometryParam]) -> Self {
        Self {
            free: GeometryParam::ALL
                .into_iter()
                .filter(|p| !fixed.contains(p))
                .collect(),
        }
    }

    pub fn free(&self) -> &[GeometryParam] {
        &self.free
    }

    pub fn is_free(&self, param: GeometryParam) -> bool {
        self.free.contains(&param)
    }

    pub fn dim(&self) -> usize {
        self.free.len()
    }

    /// All lengths free over `base`: the fit is only determined up to a
    /// global scale. A non-zero shared `plane_x` is never free and pins the
    /// scale on its own.
    pub fn has_scale_gauge(&self, base: &GeometryParameters) -> bool {
        self.dim() == GeometryParam::ALL.len() && base.plane_x == 0.0
    }

    pub fn pack(&self, geometry: &GeometryParameters) -> DVector<Real> {
        DVector::from_iterator(self.dim(), self.free.iter().map(|&p| geometry.get(p)))
    }

    pub fn unpack(&self, base: &GeometryParameters, x: &DVector<Real>) -> GeometryParameters {
        debug_assert_eq!(x.len(), self.dim());
        let mut out = *base;
        for (&p, &v) in self.free.iter().zip(x.iter()) {
            out.set(p, v);
        }
        out
    }
}

impl Default for ParameterLayout {
    fn default() -> Self {
        Self::all_free()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_params_keep_base_value() {
        let layout = ParameterLayout::with_fixed(&[GeometryParam::MirrorRadius]);
        assert_eq!(layout.dim(), 7);
        assert!(!layout.is_free(GeometryParam::MirrorRadius));
        let base = GeometryParameters::default();
        assert!(!layout.has_scale_gauge(&base));

        let mut x = layout.pack(&base);
        assert_eq!(x[0], base.dome_radius);
        x[0] = 65.0;

        let g = layout.unpack(&base, &x);
        assert_eq!(g.dome_radius, 65.0);
        assert_eq!(g.mirror_radius, base.mirror_radius);
        assert_eq!(g.observer, base.observer);
    }

    #[test]
    fn all_free_pack_follows_canonical_order() {
        let layout = ParameterLayout::default();
        let g = GeometryParameters::default();
        assert!(layout.has_scale_gauge(&g));
        let x = layout.pack(&g);
        for (i, p) in GeometryParam::ALL.into_iter().enumerate() {
            assert_eq!(x[i], g.get(p));
        }
        assert_eq!(layout.unpack(&GeometryParameters::default().scaled(2.0), &x), g);
    }

    #[test]
    fn offset_plane_pins_the_scale() {
        let mut base = GeometryParameters::default();
        base.plane_x = 1.5;
        assert!(!ParameterLayout::all_free().has_scale_gauge(&base));
    }
}
