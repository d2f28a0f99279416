//! Vertical level packs.
//!
//! Vertical levels are grouped into fixed-width packs of [`VECTOR_SIZE`] lanes so
//! level loops vectorize. A column of `L` physical levels occupies
//! `ceil(L / VECTOR_SIZE)` packs; when `L` is not a multiple of the lane width the
//! trailing lanes of the last pack are padding.
//!
//! Padding lanes never influence physical results: column kernels use explicit
//! level-count bounds, and time updates blend new values into the physical lanes
//! only (see [`Pack::blend`]).
//!
//! ```
//! use se_dycore::pack::{LevelLayout, VECTOR_SIZE};
//!
//! let layout = LevelLayout::new(VECTOR_SIZE + 1);
//! assert_eq!(layout.num_packs(), 2);
//! assert_eq!(layout.locate(VECTOR_SIZE), (1, 0));
//! ```

use bytemuck::{Pod, Zeroable};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign,
};

/// Number of vertical levels per pack.
pub const VECTOR_SIZE: usize = 4;

/// A fixed-width group of vertical levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(transparent)]
pub struct Pack(pub [f64; VECTOR_SIZE]);

impl Pack {
    /// All lanes zero.
    pub const ZERO: Self = Self([0.0; VECTOR_SIZE]);

    /// All lanes equal to `value`.
    #[inline(always)]
    pub const fn splat(value: f64) -> Self {
        Self([value; VECTOR_SIZE])
    }

    /// Apply `f` lane-wise.
    #[inline(always)]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }

    /// Keep the first `lanes` lanes of `self` and the rest from `other`.
    #[inline(always)]
    pub fn blend(self, other: Self, lanes: usize) -> Self {
        let mut out = other;
        out.0[..lanes].copy_from_slice(&self.0[..lanes]);
        out
    }

    /// Largest absolute value over the first `lanes` lanes.
    pub fn max_abs(&self, lanes: usize) -> f64 {
        self.0[..lanes].iter().fold(0.0, |m, x| m.max(x.abs()))
    }
}

impl Index<usize> for Pack {
    type Output = f64;
    #[inline(always)]
    fn index(&self, lane: usize) -> &f64 {
        &self.0[lane]
    }
}

impl IndexMut<usize> for Pack {
    #[inline(always)]
    fn index_mut(&mut self, lane: usize) -> &mut f64 {
        &mut self.0[lane]
    }
}

macro_rules! impl_pack_binop {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait for Pack {
            type Output = Pack;
            #[inline(always)]
            fn $method(self, rhs: Pack) -> Pack {
                let mut out = self;
                for (o, r) in out.0.iter_mut().zip(rhs.0) {
                    *o = *o $op r;
                }
                out
            }
        }

        impl $trait<f64> for Pack {
            type Output = Pack;
            #[inline(always)]
            fn $method(self, rhs: f64) -> Pack {
                self.map(|x| x $op rhs)
            }
        }

        impl $trait<Pack> for f64 {
            type Output = Pack;
            #[inline(always)]
            fn $method(self, rhs: Pack) -> Pack {
                rhs.map(|x| self $op x)
            }
        }

        impl $assign_trait for Pack {
            #[inline(always)]
            fn $assign_method(&mut self, rhs: Pack) {
                *self = *self $op rhs;
            }
        }

        impl $assign_trait<f64> for Pack {
            #[inline(always)]
            fn $assign_method(&mut self, rhs: f64) {
                *self = *self $op rhs;
            }
        }
    };
}

impl_pack_binop!(Add, add, AddAssign, add_assign, +);
impl_pack_binop!(Sub, sub, SubAssign, sub_assign, -);
impl_pack_binop!(Mul, mul, MulAssign, mul_assign, *);
impl_pack_binop!(Div, div, DivAssign, div_assign, /);

impl Neg for Pack {
    type Output = Pack;
    #[inline(always)]
    fn neg(self) -> Pack {
        self.map(|x| -x)
    }
}

/// Mapping between physical level indices and (pack, lane) positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelLayout {
    num_physical: usize,
    num_packs: usize,
}

impl LevelLayout {
    /// Layout for `num_physical` levels.
    pub fn new(num_physical: usize) -> Self {
        Self {
            num_physical,
            num_packs: num_physical.div_ceil(VECTOR_SIZE),
        }
    }

    /// Number of physical levels.
    #[inline]
    pub fn num_physical(&self) -> usize {
        self.num_physical
    }

    /// Number of packs covering the physical levels.
    #[inline]
    pub fn num_packs(&self) -> usize {
        self.num_packs
    }

    /// Number of interface packs (`num_physical + 1` interfaces).
    #[inline]
    pub fn num_interface_packs(&self) -> usize {
        (self.num_physical + 1).div_ceil(VECTOR_SIZE)
    }

    /// Number of lane slots including padding.
    #[inline]
    pub fn padded_len(&self) -> usize {
        self.num_packs * VECTOR_SIZE
    }

    /// Pack and lane holding physical level `level`.
    ///
    /// # Panics
    ///
    /// Panics if `level` is not a physical level, in every build profile.
    #[inline]
    pub fn locate(&self, level: usize) -> (usize, usize) {
        assert!(
            level < self.num_physical,
            "level {} out of range for {} physical levels",
            level,
            self.num_physical
        );
        (level / VECTOR_SIZE, level % VECTOR_SIZE)
    }

    /// Number of physical lanes in pack `ilev`.
    #[inline]
    pub fn lanes_in_pack(&self, ilev: usize) -> usize {
        debug_assert!(ilev < self.num_packs);
        (self.num_physical - ilev * VECTOR_SIZE).min(VECTOR_SIZE)
    }
}

/// View a column of packs as a flat slice of levels (padding included).
#[inline]
pub fn as_levels(packs: &[Pack]) -> &[f64] {
    bytemuck::cast_slice(packs)
}

/// Mutable flat view of a column of packs (padding included).
#[inline]
pub fn as_levels_mut(packs: &mut [Pack]) -> &mut [f64] {
    bytemuck::cast_slice_mut(packs)
}
