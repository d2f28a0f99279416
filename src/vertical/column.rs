//! Column integrations and stencils over the physical levels of one node.
//!
//! All slices here hold physical levels only (length `L`, or `L + 1` for
//! interface quantities), so pack padding never enters a sum or a stencil.

use super::scan::PrefixScan;

/// Mid-level pressure from layer thicknesses.
///
/// `p[0] = p_top + dp[0]/2`, `p[k] = p[k-1] + (dp[k-1] + dp[k])/2`, i.e.
/// `p[k] = p_top + Σ_{j<k} dp[j] + dp[k]/2`.
pub fn pressure<S: PrefixScan + ?Sized>(scan: &S, p_top: f64, dp: &[f64], p: &mut [f64]) {
    scan.exclusive(dp, p);
    for (pk, dpk) in p.iter_mut().zip(dp) {
        *pk += p_top + 0.5 * dpk;
    }
}

/// Geopotential at mid levels from hydrostatic balance.
///
/// With `r[k] = Rgas·Tv[k]·dp[k] / (2 p[k])` the level value is
/// `phi[k] = phis + 2 Σ_{j>k} r[j] + r[k]`. `r` is caller-provided scratch.
#[allow(clippy::too_many_arguments)]
pub fn hydrostatic_geopotential<S: PrefixScan + ?Sized>(
    scan: &S,
    rgas: f64,
    phis: f64,
    tv: &[f64],
    dp: &[f64],
    p: &[f64],
    r: &mut [f64],
    phi: &mut [f64],
) {
    for k in 0..r.len() {
        r[k] = rgas * tv[k] * dp[k] * 0.5 / p[k];
    }
    scan.reverse_exclusive(r, phi);
    for (phik, rk) in phi.iter_mut().zip(r.iter()) {
        *phik = phis + 2.0 * *phik + rk;
    }
}

/// Pressure vertical velocity divided by pressure.
///
/// `omega[k] = (v·∇p[k] - (Σ_{j<k} div[j] + div[k]/2)) / p[k]`.
/// `integral` is caller-provided scratch.
pub fn omega<S: PrefixScan + ?Sized>(
    scan: &S,
    div_vdp: &[f64],
    vgrad_p: &[f64],
    p: &[f64],
    integral: &mut [f64],
    omega: &mut [f64],
) {
    scan.exclusive(div_vdp, integral);
    for k in 0..omega.len() {
        omega[k] = (vgrad_p[k] - (integral[k] + 0.5 * div_vdp[k])) / p[k];
    }
}

/// Vertical mass flux on the `L + 1` interfaces.
///
/// `eta[k] = bi[k]·Σ_all div - Σ_{j<k} div[j]`, with both boundary
/// interfaces pinned to zero. Returns the column total `Σ_all div`.
pub fn vertical_mass_flux<S: PrefixScan + ?Sized>(
    scan: &S,
    hybrid_bi: &[f64],
    div_vdp: &[f64],
    eta: &mut [f64],
) -> f64 {
    let nlev = div_vdp.len();
    debug_assert_eq!(eta.len(), nlev + 1);
    debug_assert_eq!(hybrid_bi.len(), nlev + 1);

    scan.inclusive(div_vdp, &mut eta[1..]);
    let sdot_sum = eta[nlev];
    for k in 1..nlev {
        eta[k] = hybrid_bi[k] * sdot_sum - eta[k];
    }
    eta[0] = 0.0;
    eta[nlev] = 0.0;
    sdot_sum
}

/// Vertical advection of `field` by the interface flux `eta`.
///
/// Centered in the interior, one-sided at the top and bottom levels:
/// `out[k] = facp·(f[k+1] - f[k]) + facm·(f[k] - f[k-1])` with
/// `facp = eta[k+1] / (2 dp[k])` and `facm = eta[k] / (2 dp[k])`.
pub fn vertical_advection(eta: &[f64], dp: &[f64], field: &[f64], out: &mut [f64]) {
    let nlev = field.len();
    debug_assert!(nlev >= 2);
    debug_assert_eq!(eta.len(), nlev + 1);

    let facp = 0.5 * (1.0 / dp[0]) * eta[1];
    out[0] = facp * (field[1] - field[0]);
    for k in 1..nlev - 1 {
        let half_rdp = 0.5 * (1.0 / dp[k]);
        let facp = half_rdp * eta[k + 1];
        let facm = half_rdp * eta[k];
        out[k] = facp * (field[k + 1] - field[k]) + facm * (field[k] - field[k - 1]);
    }
    let last = nlev - 1;
    let facm = 0.5 * (1.0 / dp[last]) * eta[last];
    out[last] = facm * (field[last] - field[last - 1]);
}
