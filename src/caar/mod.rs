//! Right-hand side of the hydrostatic primitive equations.
//!
//! For every cell the kernel runs three stages separated by phase barriers:
//!
//! 1. virtual temperature, horizontal mass flux `v·dp3d` and its divergence;
//! 2. mid-level pressure, hydrostatic geopotential and `omega_p` from column
//!    prefix sums;
//! 3. vertical mass flux and vertical advection (Eulerian coordinate only),
//!    then the leapfrog update of temperature, velocity and layer thickness
//!    from level `nm1` into level `np1`.
//!
//! Each stage reads the state at level `n0`. Scratch comes from a per-task
//! [`CaarSlot`]; padding lanes of the written level are left untouched.

mod buffers;
mod functor;
mod kernel;

pub use buffers::{CaarBuffers, CaarSlot, ColumnScratch};
pub use functor::CaarFunctor;
pub use kernel::{KernelVariables, StageData};
