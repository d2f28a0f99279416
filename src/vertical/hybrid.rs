//! Hybrid sigma-pressure vertical coordinate.
//!
//! Interface `k` (0 at the model top, `L` at the surface) sits at pressure
//!
//! ```text
//! p_k = A_k · ps0 + B_k · ps
//! ```
//!
//! so the pure-pressure part `A_0 · ps0` seeds the pressure reconstruction and
//! the `B_k` redistribute the column mass tendency among interfaces.

use crate::error::{DycoreError, Result};

/// Interface coefficients of the hybrid coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct HybridVCoord {
    /// Reference surface pressure (Pa).
    pub ps0: f64,
    hybrid_ai: Vec<f64>,
    hybrid_bi: Vec<f64>,
}

impl HybridVCoord {
    /// Build from `L + 1` interface coefficients each.
    pub fn new(ps0: f64, hybrid_ai: Vec<f64>, hybrid_bi: Vec<f64>) -> Result<Self> {
        if hybrid_ai.len() != hybrid_bi.len() {
            return Err(DycoreError::dimension_mismatch(
                "hybrid_bi",
                hybrid_ai.len(),
                hybrid_bi.len(),
            ));
        }
        if hybrid_ai.len() < 3 {
            return Err(DycoreError::invalid_config(format!(
                "hybrid coordinate needs at least 2 levels, got {}",
                hybrid_ai.len().saturating_sub(1)
            )));
        }
        if !(ps0 > 0.0) {
            return Err(DycoreError::invalid_config(format!(
                "reference pressure must be positive, got {ps0}"
            )));
        }
        Ok(Self {
            ps0,
            hybrid_ai,
            hybrid_bi,
        })
    }

    /// Evenly spaced coordinate between a pure-pressure top `ptop` and a pure
    /// sigma surface.
    pub fn uniform(num_levels: usize, ps0: f64, ptop: f64) -> Result<Self> {
        let n = num_levels as f64;
        let bi: Vec<f64> = (0..=num_levels).map(|k| k as f64 / n).collect();
        let ai = bi.iter().map(|b| (1.0 - b) * ptop / ps0).collect();
        Self::new(ps0, ai, bi)
    }

    /// Number of physical levels.
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.hybrid_ai.len() - 1
    }

    /// Pressure coefficient at the model top.
    #[inline]
    pub fn hybrid_ai0(&self) -> f64 {
        self.hybrid_ai[0]
    }

    /// Pressure at the model top.
    #[inline]
    pub fn ptop(&self) -> f64 {
        self.hybrid_ai[0] * self.ps0
    }

    /// Pressure coefficients on the interfaces.
    #[inline]
    pub fn hybrid_ai(&self) -> &[f64] {
        &self.hybrid_ai
    }

    /// Sigma coefficients on the interfaces.
    #[inline]
    pub fn hybrid_bi(&self) -> &[f64] {
        &self.hybrid_bi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_coordinate() {
        let hv = HybridVCoord::uniform(4, 1.0e5, 200.0).unwrap();
        assert_eq!(hv.num_levels(), 4);
        assert!((hv.ptop() - 200.0).abs() < 1e-10);
        assert_eq!(hv.hybrid_bi()[0], 0.0);
        assert_eq!(hv.hybrid_bi()[4], 1.0);
        assert_eq!(hv.hybrid_ai()[4], 0.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(HybridVCoord::new(1.0e5, vec![0.0; 4], vec![0.0; 3]).is_err());
        assert!(HybridVCoord::new(1.0e5, vec![0.0; 2], vec![0.0; 2]).is_err());
        assert!(HybridVCoord::new(-1.0, vec![0.0; 4], vec![0.0; 4]).is_err());
    }
}
