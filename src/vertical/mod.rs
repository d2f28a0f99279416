//! Vertical structure: hybrid coordinate, prefix scans and column kernels.

pub mod column;
mod hybrid;
mod scan;

pub use hybrid::HybridVCoord;
pub use scan::{PrefixScan, ScanStrategy, SerialScan, WorkEfficientScan};

