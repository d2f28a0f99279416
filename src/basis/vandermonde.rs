//! Legendre Vandermonde matrix and the nodal derivative matrix.
//!
//! With `V[i][j] = P_j(x_i)` and `Vr[i][j] = P'_j(x_i)`, the Lagrange cardinal
//! functions φ_j on the nodes satisfy `φ = P V⁻¹`, so the derivative matrix is
//!
//! ```text
//! D = Vr V⁻¹,    D[i][j] = φ'_j(x_i)
//! ```

use crate::polynomial::legendre_with_derivative;
use faer::{Mat, linalg::solvers::Solve};

/// Vandermonde matrices of the 1-D Legendre basis at a node set.
#[derive(Clone, Debug)]
pub struct Vandermonde {
    /// V[i][j] = P_j(x_i)
    pub v: Mat<f64>,
    /// Vr[i][j] = P'_j(x_i)
    pub vr: Mat<f64>,
    /// V⁻¹ via full-pivot LU
    pub v_inv: Mat<f64>,
}

impl Vandermonde {
    /// Build the Vandermonde matrices at `nodes`.
    pub fn new(nodes: &[f64]) -> Self {
        let n = nodes.len();
        let mut v = Mat::zeros(n, n);
        let mut vr = Mat::zeros(n, n);
        for (i, &x) in nodes.iter().enumerate() {
            for j in 0..n {
                let (p, dp) = legendre_with_derivative(j, x);
                v[(i, j)] = p;
                vr[(i, j)] = dp;
            }
        }

        let lu = v.as_ref().full_piv_lu();
        let v_inv = lu.solve(&Mat::<f64>::identity(n, n));

        Self { v, vr, v_inv }
    }

    /// Nodal derivative matrix `D = Vr V⁻¹`.
    pub fn derivative_matrix(&self) -> Mat<f64> {
        &self.vr * &self.v_inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::GllRule;

    #[test]
    fn test_inverse() {
        let rule = GllRule::new(5);
        let vander = Vandermonde::new(&rule.nodes);
        let prod = &vander.v * &vander.v_inv;
        for i in 0..5 {
            for j in 0..5 {
                let e = if i == j { 1.0 } else { 0.0 };
                assert!((prod[(i, j)] - e).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_derivative_matrix_closed_form() {
        // D[i][j] = P_N(x_i) / (P_N(x_j) (x_i - x_j)) off the diagonal,
        // ∓N(N+1)/4 at the endpoints and zero on the interior diagonal.
        for np in 3..=6 {
            let n = np - 1;
            let rule = GllRule::new(np);
            let d = Vandermonde::new(&rule.nodes).derivative_matrix();
            let x = &rule.nodes;
            for i in 0..np {
                for j in 0..np {
                    let expected = if i != j {
                        let pi = legendre_with_derivative(n, x[i]).0;
                        let pj = legendre_with_derivative(n, x[j]).0;
                        pi / (pj * (x[i] - x[j]))
                    } else if i == 0 {
                        -((n * (n + 1)) as f64) / 4.0
                    } else if i == n {
                        ((n * (n + 1)) as f64) / 4.0
                    } else {
                        0.0
                    };
                    assert!(
                        (d[(i, j)] - expected).abs() < 1e-11,
                        "np={np} D[{i}][{j}] = {} vs {expected}",
                        d[(i, j)]
                    );
                }
            }
        }
    }

    #[test]
    fn test_differentiates_polynomials_exactly() {
        let rule = GllRule::new(4);
        let d = Vandermonde::new(&rule.nodes).derivative_matrix();
        for i in 0..4 {
            let dx: f64 = (0..4).map(|j| d[(i, j)] * rule.nodes[j].powi(3)).sum();
            let exact = 3.0 * rule.nodes[i].powi(2);
            assert!((dx - exact).abs() < 1e-12);
        }
    }
}
