//! Per-cell prognostic state, diagnostics and tracer mass.

use super::geometry::ElementGeometry;
use crate::constants::Q_NUM_TIME_LEVELS;
use crate::field::{Scalar2d, ScalarField, Tensor2d, TimeLevels, VectorField};
use crate::pack::LevelLayout;

/// Prognostic variables on the leapfrog ring.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementState {
    /// Horizontal velocity.
    pub v: TimeLevels<VectorField>,
    /// Temperature.
    pub t: TimeLevels<ScalarField>,
    /// Layer pseudo-thickness.
    pub dp3d: TimeLevels<ScalarField>,
}

impl ElementState {
    fn zeros(np: usize, layout: LevelLayout) -> Self {
        Self {
            v: TimeLevels::splat(VectorField::zeros(np, layout)),
            t: TimeLevels::splat(ScalarField::zeros(np, layout)),
            dp3d: TimeLevels::splat(ScalarField::zeros(np, layout)),
        }
    }
}

/// Time-averaged diagnostics accumulated by the RHS kernel.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementDerived {
    /// Mean pressure vertical velocity divided by pressure.
    pub omega_p: ScalarField,
    /// Mean vertical mass flux on the `L + 1` interfaces.
    pub eta_dot_dpdn: ScalarField,
    /// Mean horizontal mass flux `v · dp3d`.
    pub vn0: VectorField,
}

/// Tracer mass `qdp` per tracer time level and tracer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tracers {
    num_tracers: usize,
    qdp: Vec<ScalarField>,
}

impl Tracers {
    fn zeros(np: usize, layout: LevelLayout, num_tracers: usize) -> Self {
        Self {
            num_tracers,
            qdp: vec![ScalarField::zeros(np, layout); Q_NUM_TIME_LEVELS * num_tracers],
        }
    }

    /// Number of advected tracers.
    #[inline]
    pub fn num_tracers(&self) -> usize {
        self.num_tracers
    }

    /// Tracer mass of tracer `q` at tracer time level `qtl`.
    #[inline]
    pub fn qdp(&self, qtl: usize, q: usize) -> &ScalarField {
        &self.qdp[qtl * self.num_tracers + q]
    }

    /// Mutable tracer mass of tracer `q` at tracer time level `qtl`.
    #[inline]
    pub fn qdp_mut(&mut self, qtl: usize, q: usize) -> &mut ScalarField {
        &mut self.qdp[qtl * self.num_tracers + q]
    }
}

/// Everything the core knows about one mesh cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub geometry: ElementGeometry,
    /// Surface geopotential.
    pub phis: Scalar2d,
    /// Anisotropic viscosity tensor.
    pub tensorvisc: Tensor2d,
    pub state: ElementState,
    pub derived: ElementDerived,
    pub tracers: Tracers,
}

impl Element {
    /// Zero state on `geometry` with `num_levels` physical levels.
    pub fn new(geometry: ElementGeometry, num_levels: usize, num_tracers: usize) -> Self {
        let np = geometry.np();
        let layout = LevelLayout::new(num_levels);
        let interfaces = LevelLayout::new(num_levels + 1);
        Self {
            phis: Scalar2d::zeros(np),
            tensorvisc: Tensor2d::identity(np),
            state: ElementState::zeros(np, layout),
            derived: ElementDerived {
                omega_p: ScalarField::zeros(np, layout),
                eta_dot_dpdn: ScalarField::zeros(np, interfaces),
                vn0: VectorField::zeros(np, layout),
            },
            tracers: Tracers::zeros(np, layout, num_tracers),
            geometry,
        }
    }

    /// Vertical layout of the level fields.
    #[inline]
    pub fn layout(&self) -> LevelLayout {
        self.derived.omega_p.layout()
    }

    /// Reset the time-averaged diagnostics to zero.
    pub fn reset_derived(&mut self) {
        self.derived.omega_p.fill(0.0);
        self.derived.eta_dot_dpdn.fill(0.0);
        self.derived.vn0.fill(0.0);
    }
}

/// The cells owned by this process.
#[derive(Clone, Debug, Default)]
pub struct Elements {
    elements: Vec<Element>,
}

impl Elements {
    /// Wrap a set of cells.
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if there are no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Cells as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    /// Cells as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    /// Iterate over cells.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }
}

impl std::ops::Index<usize> for Elements {
    type Output = Element;
    fn index(&self, ie: usize) -> &Element {
        &self.elements[ie]
    }
}

impl std::ops::IndexMut<usize> for Elements {
    fn index_mut(&mut self, ie: usize) -> &mut Element {
        &mut self.elements[ie]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ReferenceElement;

    #[test]
    fn test_new_element_shapes() {
        let re = ReferenceElement::new(4);
        let elem = Element::new(ElementGeometry::flat(&re), 6, 2);
        assert_eq!(elem.layout().num_physical(), 6);
        assert_eq!(elem.derived.eta_dot_dpdn.layout().num_physical(), 7);
        assert_eq!(elem.tracers.num_tracers(), 2);
        assert_eq!(elem.tracers.qdp(1, 1).np(), 4);
    }

    #[test]
    fn test_reset_derived() {
        let re = ReferenceElement::new(3);
        let mut elem = Element::new(ElementGeometry::flat(&re), 4, 0);
        elem.derived.omega_p.fill(3.0);
        elem.reset_derived();
        assert_eq!(elem.derived.omega_p.level(0, 0, 2), 0.0);
    }
}
