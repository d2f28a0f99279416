//! Gauss-Lobatto-Legendre nodes and weights.

use super::legendre::legendre_with_derivative;
use std::f64::consts::PI;

const NEWTON_MAX_ITERS: usize = 64;
const NEWTON_TOL: f64 = 1e-15;

/// GLL quadrature rule with `np` points on [-1, 1].
///
/// Nodes are ±1 plus the roots of P'_N with N = np − 1, sorted ascending.
/// Weights are `w_j = 2 / (N (N+1) P_N(x_j)²)`; the rule integrates polynomials
/// of degree 2N − 1 exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct GllRule {
    pub nodes: Vec<f64>,
    pub weights: Vec<f64>,
}

impl GllRule {
    /// Build the `np`-point rule.
    ///
    /// # Panics
    ///
    /// Panics if `np < 2`.
    pub fn new(np: usize) -> Self {
        assert!(np >= 2, "GLL rule needs at least 2 points, got {np}");
        let n = np - 1;
        let nn1 = (n * (n + 1)) as f64;

        let mut nodes = vec![0.0; np];
        nodes[0] = -1.0;
        nodes[n] = 1.0;
        for (j, node) in nodes.iter_mut().enumerate().take(n).skip(1) {
            // Chebyshev-Lobatto guess, then Newton on P'_N using the Legendre ODE
            // (1 - x²) P''_N = 2x P'_N - N(N+1) P_N.
            let mut x = -(PI * j as f64 / n as f64).cos();
            for _ in 0..NEWTON_MAX_ITERS {
                let (p, dp) = legendre_with_derivative(n, x);
                let d2p = (2.0 * x * dp - nn1 * p) / (1.0 - x * x);
                let dx = dp / d2p;
                x -= dx;
                if dx.abs() < NEWTON_TOL {
                    break;
                }
            }
            *node = x;
        }

        let weights = nodes
            .iter()
            .map(|&x| {
                let p = legendre_with_derivative(n, x).0;
                2.0 / (nn1 * p * p)
            })
            .collect();

        Self { nodes, weights }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a rule has at least two points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
