//! Planning parameters and layout constants.
//!
//! The whole configuration surface is passed as plain values to the plan
//! constructors. The integer encoding the native library expects for each
//! variant is applied only inside the engine boundary (`native`).

use std::fmt;

/// Granularity, in bytes, of the alignment class compared by
/// [`Plan::execute_new_array`](crate::Plan::execute_new_array).
///
/// Two buffers share an alignment class when their addresses agree modulo
/// this value. Every buffer from [`AlignedBuf`](crate::AlignedBuf) is
/// aligned to at least this many bytes.
pub const ALIGNMENT_CLASS: usize = 16;

/// Highest dimensionality a buffer or plan may have.
pub const MAX_RANK: usize = 3;

/// Largest size of a single dimension; the native planner takes `int`.
pub const MAX_DIMENSION: usize = libc::c_int::MAX as usize;

/// Sign of the exponent of the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `exp(-2πi jk/n)`
    Forward,
    /// `exp(+2πi jk/n)`
    Backward,
}

impl Direction {
    /// The direction that undoes this one (up to a factor of `n`).
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

/// Planning strategy.
///
/// Stronger strategies spend more time in the planner to find a faster
/// execution path. Everything above [`Flag::Estimate`] may overwrite the
/// input and output buffers while planning, so fill the input *after*
/// constructing the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flag {
    /// Heuristics only. Fast to plan, buffers untouched.
    #[default]
    Estimate,
    /// Times a handful of candidate algorithms.
    Measure,
    /// Like `Measure`, over a wider candidate set.
    Patient,
    /// Tries everything. Can take minutes for large sizes.
    Exhaustive,
}

impl Flag {
    /// Whether planning may scribble over the planned buffers.
    #[inline]
    pub fn touches_buffers(self) -> bool {
        !matches!(self, Flag::Estimate)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flag::Estimate => "estimate",
            Flag::Measure => "measure",
            Flag::Patient => "patient",
            Flag::Exhaustive => "exhaustive",
        };
        f.write_str(name)
    }
}
