//! Legendre polynomials and Gauss-Lobatto-Legendre quadrature.
//!
//! The spectral-element node grid inside each cell is the tensor product of the
//! `np` one-dimensional GLL nodes; the diagonal mass matrix is the tensor product
//! of the GLL weights.

mod gll;
mod legendre;

pub use gll::GllRule;
pub use legendre::{legendre, legendre_with_derivative};
