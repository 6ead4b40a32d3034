//! Row-major buffer shapes of rank 1 to 3.

use std::fmt;

use crate::config::{MAX_DIMENSION, MAX_RANK};
use crate::error::{FftError, Result};

/// Dimensions of an aligned buffer, outermost first.
///
/// A valid shape has between 1 and [`MAX_RANK`] dimensions, none of them
/// zero or above [`MAX_DIMENSION`], and an element count that fits in
/// `usize`. Element `(i0, i1, i2)` of a 3D shape `(n0, n1, n2)` lives at
/// flat offset `i0*(n1*n2) + i1*n2 + i2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: [usize; MAX_RANK],
    rank: usize,
}

impl Shape {
    /// Validate `dims` and build a shape from them.
    pub fn new(dims: &[usize]) -> Result<Self> {
        let invalid = || FftError::InvalidShape {
            dims: dims.to_vec(),
        };

        if dims.is_empty() || dims.len() > MAX_RANK {
            return Err(invalid());
        }
        if dims.iter().any(|&n| n == 0 || n > MAX_DIMENSION) {
            return Err(invalid());
        }
        dims.iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(invalid)?;

        let mut packed = [1; MAX_RANK];
        packed[..dims.len()].copy_from_slice(dims);
        Ok(Self {
            dims: packed,
            rank: dims.len(),
        })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.rank]
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims().iter().product()
    }

    /// Always `false`: a valid shape has no zero dimension.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Length of the innermost, contiguous dimension.
    #[inline]
    pub fn last(&self) -> usize {
        self.dims[self.rank - 1]
    }

    /// Flat row-major offset of a multi-index.
    ///
    /// # Panics
    /// Panics if `index` has the wrong rank or is out of bounds.
    pub fn offset(&self, index: &[usize]) -> usize {
        assert_eq!(
            index.len(),
            self.rank,
            "index rank {} does not match shape {}",
            index.len(),
            self
        );
        index
            .iter()
            .zip(self.dims())
            .fold(0, |acc, (&i, &n)| {
                assert!(i < n, "index {:?} out of bounds for shape {}", index, self);
                acc * n + i
            })
    }

    /// Shape of the non-redundant half spectrum of a real signal of this
    /// shape: the last dimension `n` becomes `n/2 + 1`.
    pub fn half_spectrum(&self) -> Shape {
        let mut dims = self.dims;
        dims[self.rank - 1] = self.last() / 2 + 1;
        Shape {
            dims,
            rank: self.rank,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, n) in self.dims().iter().enumerate() {
            if i > 0 {
                f.write_str("x")?;
            }
            write!(f, "{}", n)?;
        }
        Ok(())
    }
}
