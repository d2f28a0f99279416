//! One-dimensional nodal basis on the GLL nodes.

mod vandermonde;

pub use vandermonde::Vandermonde;
