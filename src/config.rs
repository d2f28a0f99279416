//! Run configuration for the RHS kernel.

use crate::constants::PhysicalConstants;
use crate::error::{DycoreError, Result};
use crate::scratch::SlotPolicy;
use crate::vertical::{HybridVCoord, ScanStrategy};

/// Default reference surface pressure (Pa).
pub const DEFAULT_PS0: f64 = 1.0e5;

/// Default model-top pressure for the generated uniform coordinate (Pa).
pub const DEFAULT_PTOP: f64 = 219.4067;

/// Discretization and physics parameters of one run.
///
/// # Example
///
/// ```
/// use se_dycore::{DycoreConfig, ScanStrategy};
///
/// let config = DycoreConfig::new(4, 26)
///     .with_tracers(1)
///     .with_scan(ScanStrategy::WorkEfficient);
/// assert!(config.validate().is_ok());
/// assert!(config.is_eulerian());
/// ```
#[derive(Clone, Debug)]
pub struct DycoreConfig {
    /// GLL nodes per direction
    pub np: usize,
    /// Physical vertical levels
    pub num_levels: usize,
    /// Advected tracers carried by the state
    pub num_tracers: usize,
    /// Vertical remap frequency; 0 means Eulerian vertical coordinate
    pub rsplit: usize,
    pub scan: ScanStrategy,
    pub slot_policy: SlotPolicy,
    pub constants: PhysicalConstants,
    /// Reference surface pressure (Pa)
    pub ps0: f64,
    hvcoord: Option<HybridVCoord>,
}

impl DycoreConfig {
    /// Earth constants, no tracers, Eulerian vertical coordinate.
    pub fn new(np: usize, num_levels: usize) -> Self {
        Self {
            np,
            num_levels,
            num_tracers: 0,
            rsplit: 0,
            scan: ScanStrategy::default(),
            slot_policy: SlotPolicy::default(),
            constants: PhysicalConstants::earth(),
            ps0: DEFAULT_PS0,
            hvcoord: None,
        }
    }

    pub fn with_tracers(mut self, num_tracers: usize) -> Self {
        self.num_tracers = num_tracers;
        self
    }

    pub fn with_rsplit(mut self, rsplit: usize) -> Self {
        self.rsplit = rsplit;
        self
    }

    pub fn with_scan(mut self, scan: ScanStrategy) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_slot_policy(mut self, policy: SlotPolicy) -> Self {
        self.slot_policy = policy;
        self
    }

    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_ps0(mut self, ps0: f64) -> Self {
        self.ps0 = ps0;
        self
    }

    /// Use explicit hybrid coefficients instead of the uniform default.
    pub fn with_hybrid_vcoord(mut self, hvcoord: HybridVCoord) -> Self {
        self.ps0 = hvcoord.ps0;
        self.hvcoord = Some(hvcoord);
        self
    }

    /// Eulerian vertical coordinate (`rsplit == 0`).
    #[inline]
    pub fn is_eulerian(&self) -> bool {
        self.rsplit == 0
    }

    /// Hybrid coordinate for this run.
    pub fn hybrid_vcoord(&self) -> Result<HybridVCoord> {
        match &self.hvcoord {
            Some(hv) => Ok(hv.clone()),
            None => HybridVCoord::uniform(self.num_levels, self.ps0, DEFAULT_PTOP),
        }
    }

    /// Check structural consistency.
    pub fn validate(&self) -> Result<()> {
        if self.np < 2 {
            return Err(DycoreError::invalid_config(format!(
                "np must be at least 2, got {}",
                self.np
            )));
        }
        if self.num_levels < 2 {
            return Err(DycoreError::invalid_config(format!(
                "at least 2 vertical levels are required, got {}",
                self.num_levels
            )));
        }
        if !(self.constants.rearth > 0.0 && self.constants.rgas > 0.0 && self.constants.cp > 0.0) {
            return Err(DycoreError::invalid_config(
                "planet radius, gas constant and cp must be positive",
            ));
        }
        if let Some(hv) = &self.hvcoord {
            if hv.num_levels() != self.num_levels {
                return Err(DycoreError::dimension_mismatch(
                    "hybrid coordinate levels",
                    self.num_levels,
                    hv.num_levels(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = DycoreConfig::new(4, 10);
        assert!(config.validate().is_ok());
        assert!(config.is_eulerian());
        let hv = config.hybrid_vcoord().unwrap();
        assert_eq!(hv.num_levels(), 10);
        assert!((hv.ps0 - DEFAULT_PS0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_sizes() {
        assert!(DycoreConfig::new(1, 10).validate().is_err());
        assert!(DycoreConfig::new(4, 1).validate().is_err());
    }

    #[test]
    fn test_hybrid_levels_must_match() {
        let hv = HybridVCoord::uniform(5, 1.0e5, 100.0).unwrap();
        let config = DycoreConfig::new(4, 6).with_hybrid_vcoord(hv);
        assert!(matches!(
            config.validate(),
            Err(DycoreError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_lagrangian_flag() {
        let config = DycoreConfig::new(4, 10).with_rsplit(3);
        assert!(!config.is_eulerian());
    }
}
