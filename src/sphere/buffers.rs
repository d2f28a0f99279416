//! Scratch buffers needed by any single sphere-operator call.

use crate::field::{ScalarField, Vector2d, VectorField};
use crate::pack::{LevelLayout, VECTOR_SIZE};
use crate::scratch::Tracked;

const NUM_2D_VECTOR_BUFFERS: usize = 2;
const NUM_3D_SCALAR_BUFFERS: usize = 3;
const NUM_3D_VECTOR_BUFFERS: usize = 3;

/// Per-task temporaries of the operator library.
///
/// Callers may borrow these buffers between operator calls, but any operator
/// may overwrite them; a buffer is only valid while it is live.
#[derive(Clone, Debug)]
pub struct SphereScratch {
    pub vector_sl: [Tracked<Vector2d>; NUM_2D_VECTOR_BUFFERS],
    pub scalar_ml: [Tracked<ScalarField>; NUM_3D_SCALAR_BUFFERS],
    pub vector_ml: [Tracked<VectorField>; NUM_3D_VECTOR_BUFFERS],
}

impl SphereScratch {
    /// Allocate buffers for `np × np` nodes and `layout` levels.
    pub fn new(np: usize, layout: LevelLayout) -> Self {
        Self {
            vector_sl: std::array::from_fn(|_| Tracked::new("vector_sl", Vector2d::zeros(np))),
            scalar_ml: std::array::from_fn(|_| {
                Tracked::new("scalar_ml", ScalarField::zeros(np, layout))
            }),
            vector_ml: std::array::from_fn(|_| {
                Tracked::new("vector_ml", VectorField::zeros(np, layout))
            }),
        }
    }

    /// Declared number of values, from the buffer counts.
    pub fn size(np: usize, layout: LevelLayout) -> usize {
        let nlev = layout.num_packs() * VECTOR_SIZE;
        NUM_2D_VECTOR_BUFFERS * 2 * np * np
            + NUM_3D_SCALAR_BUFFERS * np * np * nlev
            + NUM_3D_VECTOR_BUFFERS * 2 * np * np * nlev
    }

    /// Number of values actually allocated.
    pub fn num_values(&self) -> usize {
        let sl: usize = self
            .vector_sl
            .iter()
            .map(|b| b.storage().comps.iter().map(|c| c.as_slice().len()).sum::<usize>())
            .sum();
        let sml: usize = self.scalar_ml.iter().map(|b| b.storage().num_values()).sum();
        let vml: usize = self.vector_ml.iter().map(|b| b.storage().num_values()).sum();
        sl + sml + vml
    }

    /// Retire every buffer.
    pub fn retire_all(&mut self) {
        self.vector_sl.iter_mut().for_each(|b| b.retire());
        self.scalar_ml.iter_mut().for_each(|b| b.retire());
        self.vector_ml.iter_mut().for_each(|b| b.retire());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_matches_allocation() {
        let layout = LevelLayout::new(10);
        let scratch = SphereScratch::new(4, layout);
        assert_eq!(scratch.num_values(), SphereScratch::size(4, layout));
    }
}
