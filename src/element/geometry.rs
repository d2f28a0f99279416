//! Per-cell metric terms.
//!
//! The covariant matrix `D` maps reference-element vectors to physical
//! (spherical) components. From it:
//!
//! ```text
//! Dinv     = D⁻¹
//! metdet   = det(D)                 (Jacobian)
//! metinv   = Dinv Dinvᵀ             (inverse metric tensor)
//! spheremp = (w_i w_j) · metdet     (diagonal spherical mass)
//! ```

use super::reference::ReferenceElement;
use crate::field::{Scalar2d, Tensor2d};

/// Constant metric data of one cell. Read-only for the operators and kernel.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementGeometry {
    np: usize,
    /// Covariant matrix D(i, j) per node.
    pub d: Tensor2d,
    /// Inverse of D per node.
    pub dinv: Tensor2d,
    /// Inverse metric tensor per node.
    pub metinv: Tensor2d,
    /// Jacobian per node.
    pub metdet: Scalar2d,
    /// Mass weight times Jacobian.
    pub spheremp: Scalar2d,
    /// Reciprocal of `spheremp`.
    pub rspheremp: Scalar2d,
    /// Coriolis parameter.
    pub fcor: Scalar2d,
    /// Spherical-to-Cartesian vector transform, `[2][3][np][np]`.
    vec_sph2cart: Vec<f64>,
}

impl ElementGeometry {
    /// Geometry derived from the covariant matrix `d`, with zero Coriolis
    /// parameter and the planar embedding `(u, v) -> (u, v, 0)` as
    /// Cartesian transform.
    pub fn from_covariant(reference: &ReferenceElement, d: Tensor2d) -> Self {
        let np = reference.np();
        let mut dinv = Tensor2d::zeros(np);
        let mut metinv = Tensor2d::zeros(np);
        let mut metdet = Scalar2d::zeros(np);
        let mut spheremp = Scalar2d::zeros(np);
        let mut rspheremp = Scalar2d::zeros(np);

        for igp in 0..np {
            for jgp in 0..np {
                let (a, b) = (d[(0, 0, igp, jgp)], d[(0, 1, igp, jgp)]);
                let (c, e) = (d[(1, 0, igp, jgp)], d[(1, 1, igp, jgp)]);
                let det = a * e - b * c;
                let inv = [[e / det, -b / det], [-c / det, a / det]];
                for i in 0..2 {
                    for j in 0..2 {
                        dinv[(i, j, igp, jgp)] = inv[i][j];
                        metinv[(i, j, igp, jgp)] = inv[i][0] * inv[j][0] + inv[i][1] * inv[j][1];
                    }
                }
                metdet[(igp, jgp)] = det;
                spheremp[(igp, jgp)] = reference.mass(igp, jgp) * det;
                rspheremp[(igp, jgp)] = 1.0 / spheremp[(igp, jgp)];
            }
        }

        let mut geo = Self {
            np,
            d,
            dinv,
            metinv,
            metdet,
            spheremp,
            rspheremp,
            fcor: Scalar2d::zeros(np),
            vec_sph2cart: vec![0.0; 6 * np * np],
        };
        geo.set_vec_sph2cart(|h, c, _, _| if h == c { 1.0 } else { 0.0 });
        geo
    }

    /// Identity metric: reference coordinates are physical coordinates.
    pub fn flat(reference: &ReferenceElement) -> Self {
        Self::from_covariant(reference, Tensor2d::identity(reference.np()))
    }

    /// Replace the Coriolis parameter.
    pub fn with_fcor(mut self, fcor: Scalar2d) -> Self {
        self.fcor = fcor;
        self
    }

    /// Replace the Cartesian transform with `f(h, c, igp, jgp)`.
    pub fn with_vec_sph2cart(mut self, f: impl Fn(usize, usize, usize, usize) -> f64) -> Self {
        self.set_vec_sph2cart(f);
        self
    }

    fn set_vec_sph2cart(&mut self, f: impl Fn(usize, usize, usize, usize) -> f64) {
        let np = self.np;
        for h in 0..2 {
            for c in 0..3 {
                for igp in 0..np {
                    for jgp in 0..np {
                        self.vec_sph2cart[((h * 3 + c) * np + igp) * np + jgp] = f(h, c, igp, jgp);
                    }
                }
            }
        }
    }

    /// Nodes per direction.
    #[inline]
    pub fn np(&self) -> usize {
        self.np
    }

    /// Cartesian component `c` of spherical unit vector `h` at node `(igp, jgp)`.
    #[inline(always)]
    pub fn sph2cart(&self, h: usize, c: usize, igp: usize, jgp: usize) -> f64 {
        self.vec_sph2cart[((h * 3 + c) * self.np + igp) * self.np + jgp]
    }
}
