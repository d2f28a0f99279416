//! Physical constants of the planet and the dry/moist atmosphere.

/// Number of slots in the leapfrog time-level ring.
pub const NUM_TIME_LEVELS: usize = 3;

/// Number of time-level slots for tracer mass.
pub const Q_NUM_TIME_LEVELS: usize = 2;

/// Physical constants used by the operators and the RHS kernel.
///
/// Defaults are Earth values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicalConstants {
    /// Planetary radius (m)
    pub rearth: f64,
    /// Gas constant of dry air (J kg⁻¹ K⁻¹)
    pub rgas: f64,
    /// Gas constant of water vapor (J kg⁻¹ K⁻¹)
    pub rwater_vapor: f64,
    /// Specific heat of dry air at constant pressure (J kg⁻¹ K⁻¹)
    pub cp: f64,
    /// Gravitational acceleration (m s⁻²)
    pub g: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::earth()
    }
}

impl PhysicalConstants {
    /// Earth values.
    pub const fn earth() -> Self {
        Self {
            rearth: 6.376e6,
            rgas: 287.04,
            rwater_vapor: 461.50,
            cp: 1005.0,
            g: 9.80616,
        }
    }

    /// Earth constants with a rescaled radius (small-planet runs).
    pub fn with_radius(self, rearth: f64) -> Self {
        Self { rearth, ..self }
    }

    /// Inverse planetary radius.
    #[inline]
    pub fn rrearth(&self) -> f64 {
        1.0 / self.rearth
    }

    /// κ = R/cp.
    #[inline]
    pub fn kappa(&self) -> f64 {
        self.rgas / self.cp
    }

    /// Factor (Rv/R − 1) multiplying the specific humidity in the virtual temperature.
    #[inline]
    pub fn virtual_factor(&self) -> f64 {
        self.rwater_vapor / self.rgas - 1.0
    }
}
