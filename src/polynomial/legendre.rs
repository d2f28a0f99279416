//! Legendre polynomial evaluation by three-term recurrence.

/// Evaluate P_n(x).
#[inline]
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_with_derivative(n, x).0
}

/// Evaluate (P_n(x), P'_n(x)).
///
/// Both values come from the same sweep:
///
/// ```text
/// (k+1) P_{k+1} = (2k+1) x P_k − k P_{k−1}
/// P'_{k+1}      = P'_{k−1} + (2k+1) P_k
/// ```
///
/// which stays well defined at the endpoints x = ±1.
pub fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let (mut p_km1, mut p_k) = (1.0, x);
    let (mut dp_km1, mut dp_k) = (0.0, 1.0);
    if n == 0 {
        return (p_km1, dp_km1);
    }
    for k in 1..n {
        let kf = k as f64;
        let p_kp1 = ((2.0 * kf + 1.0) * x * p_k - kf * p_km1) / (kf + 1.0);
        let dp_kp1 = dp_km1 + (2.0 * kf + 1.0) * p_k;
        (p_km1, p_k) = (p_k, p_kp1);
        (dp_km1, dp_k) = (dp_k, dp_kp1);
    }
    (p_k, dp_k)
}
