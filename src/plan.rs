//! Plan handles and their execution.
//!
//! A [`Plan`] owns one native plan. The native plan is released exactly
//! once: by [`Plan::destroy`] or, failing that, when the `Plan` is dropped.
//! Plans are only built by the constructors in [`crate::planner`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use num_complex::Complex32;

use crate::buffer::{AlignedBuf, Element};
use crate::config::Direction;
use crate::error::{FftError, Result};
use crate::native::{self, RawPlan};
use crate::shape::Shape;
use crate::stats;

/// Serializes plan construction and destruction across threads.
///
/// The native planner keeps global state and is not assumed to be
/// re-entrant. Execution does not take this lock.
static PLANNER_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn planner_guard() -> MutexGuard<'static, ()> {
    // The lock guards no data, so a panic while holding it leaves nothing torn.
    PLANNER_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Which domain pair a plan transforms between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    ComplexToComplex,
    RealToComplex,
    ComplexToReal,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanKind::ComplexToComplex => f.write_str("c2c"),
            PlanKind::RealToComplex => f.write_str("r2c"),
            PlanKind::ComplexToReal => f.write_str("c2r"),
        }
    }
}

/// Complex-to-complex plan.
pub type C2cPlan = Plan<Complex32, Complex32>;
/// Real-to-complex plan; the output holds the `n/2 + 1` half spectrum.
pub type R2cPlan = Plan<f32, Complex32>;
/// Complex-to-real plan. **Execution destroys the input buffer.**
pub type C2rPlan = Plan<Complex32, f32>;

/// A prepared transform for one problem shape.
///
/// Planning is the expensive step; execution is cheap and repeatable.
///
/// # Thread Safety
///
/// A `Plan` can be sent to another thread, and distinct plans may execute
/// concurrently. Execution needs `&mut self`, so one plan never runs on two
/// threads at once.
pub struct Plan<I: Element, O: Element> {
    raw: Option<RawPlan>,
    kind: PlanKind,
    direction: Direction,
    input_shape: Shape,
    output_shape: Shape,
    input_align: usize,
    output_align: usize,
    _types: PhantomData<(*mut I, *mut O)>,
}

impl<I: Element, O: Element> Plan<I, O> {
    /// Wrap a freshly built native plan.
    pub(crate) fn from_raw(
        raw: RawPlan,
        kind: PlanKind,
        direction: Direction,
        input: &AlignedBuf<I>,
        output: &AlignedBuf<O>,
    ) -> Self {
        stats::record_plan_created();
        Self {
            raw: Some(raw),
            kind,
            direction,
            input_shape: input.shape(),
            output_shape: output.shape(),
            input_align: input.alignment_offset(),
            output_align: output.alignment_offset(),
            _types: PhantomData,
        }
    }

    #[inline]
    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    /// Sign of the transform. Real-to-complex plans are always forward,
    /// complex-to-real plans always backward.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    #[inline]
    pub fn output_shape(&self) -> Shape {
        self.output_shape
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.raw.is_none()
    }

    /// Release the native plan now.
    ///
    /// Idempotent: later calls, and the eventual drop, do nothing.
    pub fn destroy(&mut self) {
        if let Some(raw) = self.raw.take() {
            let _guard = planner_guard();
            // Safety: `raw` came from the native planner and was taken out
            // of `self`, so it cannot be released twice.
            unsafe { raw.destroy() };
            stats::record_plan_destroyed();
            log::debug!(
                "{}: destroyed {} plan {} -> {}",
                native::ENGINE,
                self.kind,
                self.input_shape,
                self.output_shape
            );
        }
    }

    /// Run the transform on the buffers the plan was built against.
    ///
    /// The result lands in the construction-time output buffer. For
    /// [`C2rPlan`] the input buffer contents are destroyed.
    ///
    /// # Errors
    /// [`FftError::PlanDestroyed`] after [`Plan::destroy`].
    ///
    /// # Safety
    /// The input and output buffers passed to the constructor must still be
    /// alive (not dropped) and must not be borrowed anywhere else for the
    /// duration of the call. Use [`Plan::execute_new_array`] for a checked
    /// alternative.
    pub unsafe fn execute(&mut self) -> Result<()> {
        let raw = self.raw.as_mut().ok_or(FftError::PlanDestroyed)?;
        raw.execute();
        Ok(())
    }

    /// Shape, alignment and state checks shared by the new-array entry points.
    fn check_arrays(&mut self, input: &AlignedBuf<I>, output: &AlignedBuf<O>) -> Result<&mut RawPlan> {
        if input.shape() != self.input_shape {
            return Err(FftError::ShapeMismatch {
                expected: self.input_shape,
                found: input.shape(),
            });
        }
        if output.shape() != self.output_shape {
            return Err(FftError::ShapeMismatch {
                expected: self.output_shape,
                found: output.shape(),
            });
        }
        if input.alignment_offset() != self.input_align {
            return Err(FftError::Misaligned {
                expected: self.input_align,
                found: input.alignment_offset(),
            });
        }
        if output.alignment_offset() != self.output_align {
            return Err(FftError::Misaligned {
                expected: self.output_align,
                found: output.alignment_offset(),
            });
        }
        self.raw.as_mut().ok_or(FftError::PlanDestroyed)
    }
}

impl C2cPlan {
    /// Run the planned transform on another pair of buffers with the planned
    /// shapes. The input is left intact.
    pub fn execute_new_array(
        &mut self,
        input: &mut AlignedBuf<Complex32>,
        output: &mut AlignedBuf<Complex32>,
    ) -> Result<()> {
        let raw = self.check_arrays(input, output)?;
        // Safety: both buffers are live, exclusively borrowed and match the
        // planned shapes and alignment.
        unsafe { raw.execute_dft(input.as_mut_ptr(), output.as_mut_ptr()) };
        Ok(())
    }
}

impl R2cPlan {
    /// Run the planned transform on another pair of buffers with the planned
    /// shapes. The input is left intact.
    pub fn execute_new_array(
        &mut self,
        input: &mut AlignedBuf<f32>,
        output: &mut AlignedBuf<Complex32>,
    ) -> Result<()> {
        let raw = self.check_arrays(input, output)?;
        // Safety: see `C2cPlan::execute_new_array`.
        unsafe { raw.execute_dft_r2c(input.as_mut_ptr(), output.as_mut_ptr()) };
        Ok(())
    }
}

impl C2rPlan {
    /// Run the planned transform on another pair of buffers with the planned
    /// shapes. **The input contents are destroyed.**
    pub fn execute_new_array(
        &mut self,
        input: &mut AlignedBuf<Complex32>,
        output: &mut AlignedBuf<f32>,
    ) -> Result<()> {
        let raw = self.check_arrays(input, output)?;
        // Safety: see `C2cPlan::execute_new_array`.
        unsafe { raw.execute_dft_c2r(input.as_mut_ptr(), output.as_mut_ptr()) };
        Ok(())
    }
}

impl<I: Element, O: Element> Drop for Plan<I, O> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<I: Element, O: Element> fmt::Debug for Plan<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("kind", &self.kind)
            .field("direction", &self.direction)
            .field("input_shape", &self.input_shape)
            .field("output_shape", &self.output_shape)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

// Safety: the native plan is only touched through `&mut self` (execution)
// or under `PLANNER_LOCK` (destruction), so moving it between threads is
// fine. It is deliberately not `Sync`.
unsafe impl<I: Element, O: Element> Send for Plan<I, O> {}
