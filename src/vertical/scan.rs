//! Prefix sums over vertical columns.
//!
//! The serial strategy accumulates level by level. The work-efficient strategy
//! is the in-place Brent-Kung scan: an up-sweep builds partial sums at
//! power-of-two strides, a down-sweep fills the gaps. Both run in `O(n)` work;
//! Brent-Kung has `O(log n)` depth so it suits lane-parallel hardware.
//! The two agree to rounding.

/// A column prefix-sum implementation.
pub trait PrefixScan {
    /// Replace `data` with its inclusive prefix sum.
    fn scan_in_place(&self, data: &mut [f64]);

    /// `out[k] = Σ_{j ≤ k} input[j]`.
    fn inclusive(&self, input: &[f64], out: &mut [f64]) {
        debug_assert_eq!(input.len(), out.len());
        out.copy_from_slice(input);
        self.scan_in_place(out);
    }

    /// `out[k] = Σ_{j < k} input[j]`.
    fn exclusive(&self, input: &[f64], out: &mut [f64]) {
        debug_assert_eq!(input.len(), out.len());
        let n = input.len();
        if n == 0 {
            return;
        }
        out[0] = 0.0;
        out[1..].copy_from_slice(&input[..n - 1]);
        self.scan_in_place(out);
    }

    /// `out[k] = Σ_{j > k} input[j]`.
    fn reverse_exclusive(&self, input: &[f64], out: &mut [f64]) {
        debug_assert_eq!(input.len(), out.len());
        let n = input.len();
        if n == 0 {
            return;
        }
        out[0] = 0.0;
        for i in 1..n {
            out[i] = input[n - i];
        }
        self.scan_in_place(out);
        out.reverse();
    }
}

/// Level-by-level running sum.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialScan;

impl PrefixScan for SerialScan {
    fn scan_in_place(&self, data: &mut [f64]) {
        let mut acc = 0.0;
        for x in data.iter_mut() {
            acc += *x;
            *x = acc;
        }
    }
}

/// In-place Brent-Kung scan.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkEfficientScan;

impl PrefixScan for WorkEfficientScan {
    fn scan_in_place(&self, data: &mut [f64]) {
        let n = data.len();
        let mut stride = 1;
        while stride < n {
            let mut i = 2 * stride - 1;
            while i < n {
                data[i] += data[i - stride];
                i += 2 * stride;
            }
            stride *= 2;
        }
        stride /= 2;
        while stride > 0 {
            let mut i = 3 * stride - 1;
            while i < n {
                data[i] += data[i - stride];
                i += 2 * stride;
            }
            stride /= 2;
        }
    }
}

/// Scan implementation chosen at setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanStrategy {
    #[default]
    Serial,
    WorkEfficient,
}

impl PrefixScan for ScanStrategy {
    #[inline]
    fn scan_in_place(&self, data: &mut [f64]) {
        match self {
            ScanStrategy::Serial => SerialScan.scan_in_place(data),
            ScanStrategy::WorkEfficient => WorkEfficientScan.scan_in_place(data),
        }
    }
}
