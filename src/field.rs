//! Packed node-grid field storage.
//!
//! All fields live on the `np × np` node grid of one cell. Indexing is
//! `(igp, jgp)` where the second index runs along the first logical
//! direction of the reference element.
//!
//! Multi-level fields store one column of [`Pack`]s per node, contiguous in the
//! vertical: `data[(igp * np + jgp) * num_packs + ilev]`.

use crate::constants::NUM_TIME_LEVELS;
use crate::error::{DycoreError, Result};
use crate::pack::{LevelLayout, Pack, as_levels, as_levels_mut};
use std::ops::{Index, IndexMut};

// =============================================================================
// Single-level fields
// =============================================================================

/// A 2-D scalar sampled on the node grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Scalar2d {
    np: usize,
    data: Vec<f64>,
}

impl Scalar2d {
    /// Zero-initialized field.
    pub fn zeros(np: usize) -> Self {
        Self {
            np,
            data: vec![0.0; np * np],
        }
    }

    /// Field with every node set to `f(igp, jgp)`.
    pub fn from_fn(np: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut out = Self::zeros(np);
        for igp in 0..np {
            for jgp in 0..np {
                out[(igp, jgp)] = f(igp, jgp);
            }
        }
        out
    }

    /// Wrap a row-major `np × np` array.
    pub fn from_vec(np: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != np * np {
            return Err(DycoreError::dimension_mismatch("Scalar2d", np * np, data.len()));
        }
        Ok(Self { np, data })
    }

    /// Nodes per direction.
    #[inline]
    pub fn np(&self) -> usize {
        self.np
    }

    /// Raw row-major values.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw row-major values.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Set every node to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }
}

impl Index<(usize, usize)> for Scalar2d {
    type Output = f64;
    #[inline(always)]
    fn index(&self, (igp, jgp): (usize, usize)) -> &f64 {
        &self.data[igp * self.np + jgp]
    }
}

impl IndexMut<(usize, usize)> for Scalar2d {
    #[inline(always)]
    fn index_mut(&mut self, (igp, jgp): (usize, usize)) -> &mut f64 {
        &mut self.data[igp * self.np + jgp]
    }
}

/// A 2-D vector (two components) on the node grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Vector2d {
    pub comps: [Scalar2d; 2],
}

impl Vector2d {
    /// Zero-initialized vector field.
    pub fn zeros(np: usize) -> Self {
        Self {
            comps: [Scalar2d::zeros(np), Scalar2d::zeros(np)],
        }
    }

    /// Vector field with component `c` at each node set to `f(c, igp, jgp)`.
    pub fn from_fn(np: usize, f: impl Fn(usize, usize, usize) -> f64) -> Self {
        Self {
            comps: [
                Scalar2d::from_fn(np, |i, j| f(0, i, j)),
                Scalar2d::from_fn(np, |i, j| f(1, i, j)),
            ],
        }
    }
}

/// A 2×2 tensor per node, indexed `(i, j, igp, jgp)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor2d {
    np: usize,
    data: Vec<f64>,
}

impl Tensor2d {
    /// Zero tensor at every node.
    pub fn zeros(np: usize) -> Self {
        Self {
            np,
            data: vec![0.0; 4 * np * np],
        }
    }

    /// Identity tensor at every node.
    pub fn identity(np: usize) -> Self {
        Self::from_fn(np, |i, j, _, _| if i == j { 1.0 } else { 0.0 })
    }

    /// Tensor with entry `(i, j)` at node `(igp, jgp)` set to `f(i, j, igp, jgp)`.
    pub fn from_fn(np: usize, f: impl Fn(usize, usize, usize, usize) -> f64) -> Self {
        let mut out = Self::zeros(np);
        for i in 0..2 {
            for j in 0..2 {
                for igp in 0..np {
                    for jgp in 0..np {
                        out[(i, j, igp, jgp)] = f(i, j, igp, jgp);
                    }
                }
            }
        }
        out
    }
}

impl Index<(usize, usize, usize, usize)> for Tensor2d {
    type Output = f64;
    #[inline(always)]
    fn index(&self, (i, j, igp, jgp): (usize, usize, usize, usize)) -> &f64 {
        &self.data[((i * 2 + j) * self.np + igp) * self.np + jgp]
    }
}

impl IndexMut<(usize, usize, usize, usize)> for Tensor2d {
    #[inline(always)]
    fn index_mut(&mut self, (i, j, igp, jgp): (usize, usize, usize, usize)) -> &mut f64 {
        &mut self.data[((i * 2 + j) * self.np + igp) * self.np + jgp]
    }
}

// =============================================================================
// Multi-level fields
// =============================================================================

/// A 3-D scalar: one packed column per node.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    np: usize,
    layout: LevelLayout,
    data: Vec<Pack>,
}

impl ScalarField {
    /// Zero-initialized field.
    pub fn zeros(np: usize, layout: LevelLayout) -> Self {
        Self {
            np,
            layout,
            data: vec![Pack::ZERO; np * np * layout.num_packs()],
        }
    }

    /// Field with physical level `k` of node `(igp, jgp)` set to `f(igp, jgp, k)`.
    ///
    /// Padding lanes are left at zero.
    pub fn from_fn(np: usize, layout: LevelLayout, f: impl Fn(usize, usize, usize) -> f64) -> Self {
        let mut out = Self::zeros(np, layout);
        for igp in 0..np {
            for jgp in 0..np {
                let col = out.physical_column_mut(igp, jgp);
                for (k, x) in col.iter_mut().enumerate() {
                    *x = f(igp, jgp, k);
                }
            }
        }
        out
    }

    /// Nodes per direction.
    #[inline]
    pub fn np(&self) -> usize {
        self.np
    }

    /// Vertical layout.
    #[inline]
    pub fn layout(&self) -> LevelLayout {
        self.layout
    }

    /// Total number of stored values, padding included.
    #[inline]
    pub fn num_values(&self) -> usize {
        self.data.len() * crate::pack::VECTOR_SIZE
    }

    #[inline(always)]
    fn offset(&self, igp: usize, jgp: usize) -> usize {
        (igp * self.np + jgp) * self.layout.num_packs()
    }

    /// Pack `ilev` of node `(igp, jgp)`.
    #[inline(always)]
    pub fn pack(&self, igp: usize, jgp: usize, ilev: usize) -> Pack {
        self.data[self.offset(igp, jgp) + ilev]
    }

    /// Mutable pack `ilev` of node `(igp, jgp)`.
    #[inline(always)]
    pub fn pack_mut(&mut self, igp: usize, jgp: usize, ilev: usize) -> &mut Pack {
        let off = self.offset(igp, jgp);
        &mut self.data[off + ilev]
    }

    /// Packed column of node `(igp, jgp)`.
    #[inline]
    pub fn column(&self, igp: usize, jgp: usize) -> &[Pack] {
        let off = self.offset(igp, jgp);
        &self.data[off..off + self.layout.num_packs()]
    }

    /// Mutable packed column of node `(igp, jgp)`.
    #[inline]
    pub fn column_mut(&mut self, igp: usize, jgp: usize) -> &mut [Pack] {
        let off = self.offset(igp, jgp);
        let n = self.layout.num_packs();
        &mut self.data[off..off + n]
    }

    /// Physical levels of node `(igp, jgp)`, padding excluded.
    #[inline]
    pub fn physical_column(&self, igp: usize, jgp: usize) -> &[f64] {
        let n = self.layout.num_physical();
        &as_levels(self.column(igp, jgp))[..n]
    }

    /// Mutable physical levels of node `(igp, jgp)`, padding excluded.
    #[inline]
    pub fn physical_column_mut(&mut self, igp: usize, jgp: usize) -> &mut [f64] {
        let n = self.layout.num_physical();
        &mut as_levels_mut(self.column_mut(igp, jgp))[..n]
    }

    /// Value at physical level `k` of node `(igp, jgp)`.
    #[inline]
    pub fn level(&self, igp: usize, jgp: usize, k: usize) -> f64 {
        let (ilev, lane) = self.layout.locate(k);
        self.pack(igp, jgp, ilev)[lane]
    }

    /// Set every stored value, padding included.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(Pack::splat(value));
    }

    /// Copy all values from `other`.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn copy_from(&mut self, other: &ScalarField) {
        self.data.copy_from_slice(&other.data);
    }

    /// All packs, node-major.
    #[inline]
    pub fn packs(&self) -> &[Pack] {
        &self.data
    }
}

/// A 3-D vector: two packed scalar components.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorField {
    pub comps: [ScalarField; 2],
}

impl VectorField {
    /// Zero-initialized vector field.
    pub fn zeros(np: usize, layout: LevelLayout) -> Self {
        Self {
            comps: [ScalarField::zeros(np, layout), ScalarField::zeros(np, layout)],
        }
    }

    /// Vector field with component `c` set to `f(c, igp, jgp, k)`.
    pub fn from_fn(
        np: usize,
        layout: LevelLayout,
        f: impl Fn(usize, usize, usize, usize) -> f64,
    ) -> Self {
        Self {
            comps: [
                ScalarField::from_fn(np, layout, |i, j, k| f(0, i, j, k)),
                ScalarField::from_fn(np, layout, |i, j, k| f(1, i, j, k)),
            ],
        }
    }

    /// Nodes per direction.
    #[inline]
    pub fn np(&self) -> usize {
        self.comps[0].np()
    }

    /// Vertical layout.
    #[inline]
    pub fn layout(&self) -> LevelLayout {
        self.comps[0].layout()
    }

    /// Total number of stored values, padding included.
    #[inline]
    pub fn num_values(&self) -> usize {
        self.comps[0].num_values() + self.comps[1].num_values()
    }

    /// Copy all values from `other`.
    pub fn copy_from(&mut self, other: &VectorField) {
        self.comps[0].copy_from(&other.comps[0]);
        self.comps[1].copy_from(&other.comps[1]);
    }

    /// Set every stored value, padding included.
    pub fn fill(&mut self, value: f64) {
        self.comps[0].fill(value);
        self.comps[1].fill(value);
    }
}

// =============================================================================
// Time-level ring
// =============================================================================

/// A field stored across the leapfrog time-level ring.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeLevels<F> {
    levels: [F; NUM_TIME_LEVELS],
}

/// One writable time level plus shared access to the others.
pub struct LevelSplit<'a, F> {
    /// The level being written.
    pub target: &'a mut F,
    target_index: usize,
    others: [(usize, &'a F); NUM_TIME_LEVELS - 1],
}

impl<'a, F> LevelSplit<'a, F> {
    /// Shared access to a level other than the target.
    ///
    /// # Panics
    ///
    /// Panics if `tl` is the target level.
    #[inline]
    pub fn get(&self, tl: usize) -> &'a F {
        assert_ne!(tl, self.target_index, "time level {tl} is being written");
        self.others
            .iter()
            .find(|(i, _)| *i == tl)
            .map(|(_, f)| *f)
            .unwrap_or_else(|| panic!("time level {tl} out of range"))
    }
}

impl<F: Clone> TimeLevels<F> {
    /// Every level initialized to a copy of `value`.
    pub fn splat(value: F) -> Self {
        Self {
            levels: std::array::from_fn(|_| value.clone()),
        }
    }
}

impl<F> TimeLevels<F> {
    /// Build from explicit levels.
    pub fn new(levels: [F; NUM_TIME_LEVELS]) -> Self {
        Self { levels }
    }

    /// Level `tl`.
    #[inline]
    pub fn get(&self, tl: usize) -> &F {
        &self.levels[tl]
    }

    /// Mutable level `tl`.
    #[inline]
    pub fn get_mut(&mut self, tl: usize) -> &mut F {
        &mut self.levels[tl]
    }

    /// Split into a mutable `write` level and shared access to the rest.
    pub fn split_update(&mut self, write: usize) -> LevelSplit<'_, F> {
        let (head, rest) = self.levels.split_at_mut(write);
        let (target, tail) = rest
            .split_first_mut()
            .unwrap_or_else(|| panic!("time level {write} out of range"));
        let mut others = head
            .iter()
            .enumerate()
            .chain(tail.iter().enumerate().map(|(i, f)| (i + write + 1, f)));
        let others = std::array::from_fn(|_| {
            others
                .next()
                .map(|(i, f)| (i, &*f))
                .unwrap_or_else(|| unreachable!())
        });
        LevelSplit {
            target,
            target_index: write,
            others,
        }
    }
}
