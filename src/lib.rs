//! # se-dycore
//!
//! Spectral-element building blocks of a hydrostatic atmospheric dynamical core.
//!
//! This crate provides:
//! - Gauss-Lobatto-Legendre nodes and the nodal derivative matrix
//! - Per-cell metric terms and the packed vertical column layout
//! - Discrete sphere operators (gradient, divergence, vorticity, curl,
//!   scalar and vector Laplacians) in strong and weak form
//! - Column prefix sums for pressure, geopotential and vertical velocity
//! - The right-hand-side kernel of the primitive equations with its leapfrog
//!   time update and per-task scratch arena
//!
//! Cells are independent; with the `parallel` feature the kernel distributes
//! them over `rayon` workers.

pub mod basis;
pub mod caar;
pub mod config;
pub mod constants;
pub mod element;
pub mod error;
pub mod exchange;
pub mod field;
pub mod pack;
pub mod polynomial;
pub mod scratch;
pub mod sphere;
pub mod vertical;

pub use basis::Vandermonde;
pub use caar::{CaarFunctor, CaarSlot, KernelVariables, StageData};
pub use config::DycoreConfig;
pub use constants::{NUM_TIME_LEVELS, PhysicalConstants, Q_NUM_TIME_LEVELS};
pub use element::{Element, ElementGeometry, Elements, ReferenceElement};
pub use error::{DycoreError, Result};
pub use exchange::{BoundaryExchange, ExchangeField, FieldRegistry};
pub use field::{Scalar2d, ScalarField, Tensor2d, TimeLevels, Vector2d, VectorField};
pub use pack::{LevelLayout, Pack, VECTOR_SIZE};
pub use polynomial::GllRule;
pub use scratch::{ScratchArena, SlotPolicy, Tracked};
pub use sphere::{SphereOperators, SphereScratch};
pub use vertical::{HybridVCoord, PrefixScan, ScanStrategy, SerialScan, WorkEfficientScan};
