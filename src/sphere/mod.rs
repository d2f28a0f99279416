//! Discrete differential operators on one spectral-element cell.
//!
//! All operators are built from the 1-D derivative matrix `D[i][j] = φ'_j(x_i)`
//! of the shared [`ReferenceElement`] and the metric terms of an
//! [`ElementGeometry`](crate::element::ElementGeometry). Fields are indexed
//! `(igp, jgp)`; the second index runs along the first reference direction, so
//!
//! ```text
//! ∂s/∂ξ₁ (i, j) = Σ_k D[j][k] s(i, k)
//! ∂s/∂ξ₂ (i, j) = Σ_k D[i][k] s(k, j)
//! ```
//!
//! Every operator runs in two phases: the first fills a scratch buffer node by
//! node, the second consumes it. Scratch buffers come from a
//! [`SphereScratch`] owned by the calling task and are retired once consumed.
//!
//! Single-level (`_sl`) and multi-level variants of the same operator apply
//! the same floating-point operations in the same order, so their results agree
//! bit for bit. Multi-level variants take a pack count `nlev` so callers can
//! restrict work to the leading packs of a column.
//!
//! # Weak forms
//!
//! [`divergence_sphere_wk`](SphereOperators::divergence_sphere_wk) is the
//! discrete adjoint of [`gradient_sphere`](SphereOperators::gradient_sphere)
//! under the `spheremp`-weighted inner product:
//!
//! ```text
//! Σ s · div_wk(v) = − Σ spheremp · (v · grad s)
//! ```

mod buffers;
mod laplacian;
mod multi_level;
mod single_level;
mod testcov;

pub use buffers::SphereScratch;

use crate::element::ReferenceElement;
use crate::pack::LevelLayout;
use std::sync::Arc;

/// Stateless operator library parameterized by the reference element.
#[derive(Clone, Debug)]
pub struct SphereOperators {
    reference: Arc<ReferenceElement>,
    layout: LevelLayout,
    rrearth: f64,
}

impl SphereOperators {
    /// Operators for fields with `layout` levels on a planet of inverse radius `rrearth`.
    pub fn new(reference: Arc<ReferenceElement>, layout: LevelLayout, rrearth: f64) -> Self {
        Self {
            reference,
            layout,
            rrearth,
        }
    }

    /// Shared reference element.
    #[inline]
    pub fn reference(&self) -> &Arc<ReferenceElement> {
        &self.reference
    }

    /// Nodes per direction.
    #[inline]
    pub fn np(&self) -> usize {
        self.reference.np()
    }

    /// Vertical layout of the multi-level fields.
    #[inline]
    pub fn layout(&self) -> LevelLayout {
        self.layout
    }

    /// Inverse planetary radius.
    #[inline]
    pub fn rrearth(&self) -> f64 {
        self.rrearth
    }

    /// Scratch buffers sized for these operators.
    pub fn scratch(&self) -> SphereScratch {
        SphereScratch::new(self.np(), self.layout)
    }

    #[inline(always)]
    fn deriv(&self, i: usize, j: usize) -> f64 {
        self.reference.deriv(i, j)
    }

    #[inline(always)]
    fn mass(&self, i: usize, j: usize) -> f64 {
        self.reference.mass(i, j)
    }

    #[inline(always)]
    fn check_levels(&self, nlev: usize) {
        debug_assert!(
            nlev > 0 && nlev <= self.layout.num_packs(),
            "requested {} packs of {}",
            nlev,
            self.layout.num_packs()
        );
    }
}
