//! The reference element shared by every cell.

use crate::basis::Vandermonde;
use crate::polynomial::GllRule;
use faer::{Mat, MatRef};
use std::sync::Arc;

/// Derivative matrix and nodal mass weights on the `np × np` GLL grid.
///
/// One instance is built at setup and shared read-only between all cells
/// through an `Arc`.
#[derive(Clone, Debug)]
pub struct ReferenceElement {
    np: usize,
    rule: GllRule,
    /// D[i][j] = φ'_j(x_i)
    deriv: Mat<f64>,
    /// M[i][j] = w_i w_j
    mass: Mat<f64>,
    // Row-major copies for the operator inner loops.
    deriv_flat: Vec<f64>,
    mass_flat: Vec<f64>,
}

impl ReferenceElement {
    /// Build the reference element with `np` GLL nodes per direction.
    pub fn new(np: usize) -> Self {
        let rule = GllRule::new(np);
        let deriv = Vandermonde::new(&rule.nodes).derivative_matrix();
        let mass = Mat::from_fn(np, np, |i, j| rule.weights[i] * rule.weights[j]);

        let deriv_flat = (0..np * np).map(|ij| deriv[(ij / np, ij % np)]).collect();
        let mass_flat = (0..np * np).map(|ij| mass[(ij / np, ij % np)]).collect();

        Self {
            np,
            rule,
            deriv,
            mass,
            deriv_flat,
            mass_flat,
        }
    }

    /// Build and wrap for sharing.
    pub fn shared(np: usize) -> Arc<Self> {
        Arc::new(Self::new(np))
    }

    /// Nodes per direction.
    #[inline]
    pub fn np(&self) -> usize {
        self.np
    }

    /// GLL nodes on [-1, 1].
    #[inline]
    pub fn nodes(&self) -> &[f64] {
        &self.rule.nodes
    }

    /// GLL weights.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.rule.weights
    }

    /// Derivative matrix entry D[i][j].
    #[inline(always)]
    pub fn deriv(&self, i: usize, j: usize) -> f64 {
        self.deriv_flat[i * self.np + j]
    }

    /// Nodal mass weight at node `(i, j)`.
    #[inline(always)]
    pub fn mass(&self, i: usize, j: usize) -> f64 {
        self.mass_flat[i * self.np + j]
    }

    /// Derivative matrix as a dense matrix.
    pub fn deriv_matrix(&self) -> MatRef<'_, f64> {
        self.deriv.as_ref()
    }

    /// Mass weights as a dense matrix.
    pub fn mass_matrix(&self) -> MatRef<'_, f64> {
        self.mass.as_ref()
    }
}
