//! Error type shared by the allocator, the planner and plan execution.

use std::fmt;

use crate::plan::PlanKind;
use crate::shape::Shape;

/// Everything that can go wrong between a caller and the native engine.
///
/// None of these are retried: shape and state errors are caller mistakes
/// caught before the engine is touched, and allocation or planning
/// failures are surfaced as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FftError {
    /// The native allocator could not provide `bytes` bytes.
    AllocFailed { bytes: usize },
    /// Dimensions are empty, zero, too many, too large for the native API,
    /// or their product overflows.
    InvalidShape { dims: Vec<usize> },
    /// A buffer of the wrong dimensionality was handed to a constructor.
    RankMismatch { expected: usize, found: usize },
    /// A buffer does not have the shape the transform requires.
    ShapeMismatch { expected: Shape, found: Shape },
    /// A new array lies in a different alignment class than the planned one.
    Misaligned { expected: usize, found: usize },
    /// The plan was already destroyed.
    PlanDestroyed,
    /// The native planner returned no plan.
    PlanFailed { kind: PlanKind },
}

pub type Result<T> = std::result::Result<T, FftError>;

impl std::error::Error for FftError {}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::AllocFailed { bytes } => {
                write!(f, "native allocation of {} bytes failed", bytes)
            }
            FftError::InvalidShape { dims } => write!(f, "invalid buffer shape {:?}", dims),
            FftError::RankMismatch { expected, found } => write!(
                f,
                "expected a {}-dimensional buffer, found {} dimensions",
                expected, found
            ),
            FftError::ShapeMismatch { expected, found } => {
                write!(f, "shape mismatch: expected {}, found {}", expected, found)
            }
            FftError::Misaligned { expected, found } => write!(
                f,
                "alignment class mismatch: planned at offset {}, got {}",
                expected, found
            ),
            FftError::PlanDestroyed => write!(f, "plan has already been destroyed"),
            FftError::PlanFailed { kind } => write!(f, "native planner rejected {} plan", kind),
        }
    }
}
