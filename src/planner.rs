//! Plan constructors, one per transform variant.
//!
//! Every constructor checks ranks and shapes first and only then calls the
//! native planner, once, under the global planner lock. Planning is the
//! expensive step (with [`Flag::Measure`] and stronger it times candidate
//! algorithms and may overwrite both buffers), so build one plan per
//! problem shape and reuse it.
//!
//! | Constructor | Input | Output |
//! |---|---|---|
//! | `plan_dft_{1,2,3}d` | complex `n0 x .. x nk` | complex, same shape |
//! | `plan_dft_r2c_{1,2,3}d` | real `n0 x .. x nk` | complex `n0 x .. x (nk/2+1)` |
//! | `plan_dft_c2r_{1,2,3}d` | complex `n0 x .. x (nk/2+1)` | real `n0 x .. x nk` |

use num_complex::Complex32;

use crate::buffer::AlignedBuf;
use crate::config::{Direction, Flag};
use crate::error::{FftError, Result};
use crate::native::{self, RawPlan};
use crate::plan::{planner_guard, C2cPlan, C2rPlan, PlanKind, R2cPlan};
use crate::shape::Shape;

fn check_rank(shape: Shape, rank: usize) -> Result<()> {
    if shape.rank() != rank {
        return Err(FftError::RankMismatch {
            expected: rank,
            found: shape.rank(),
        });
    }
    Ok(())
}

fn check_shape(expected: Shape, found: Shape) -> Result<()> {
    if expected != found {
        return Err(FftError::ShapeMismatch { expected, found });
    }
    Ok(())
}

fn planning_failed(kind: PlanKind, logical: Shape) -> FftError {
    log::warn!(
        "{}: native planner returned no {} plan for {}",
        native::ENGINE,
        kind,
        logical
    );
    FftError::PlanFailed { kind }
}

fn log_planned(kind: PlanKind, logical: Shape, direction: Direction, flag: Flag) {
    log::debug!(
        "{}: planned {} {} ({}, {})",
        native::ENGINE,
        kind,
        logical,
        direction,
        flag
    );
}

fn plan_dft(
    rank: usize,
    input: &mut AlignedBuf<Complex32>,
    output: &mut AlignedBuf<Complex32>,
    direction: Direction,
    flag: Flag,
) -> Result<C2cPlan> {
    let shape = input.shape();
    check_rank(shape, rank)?;
    check_shape(shape, output.shape())?;

    let raw = {
        let _guard = planner_guard();
        // Safety: both buffers are live, exclusively borrowed and hold
        // `shape.len()` elements each.
        unsafe {
            RawPlan::dft(
                shape.dims(),
                input.as_mut_ptr(),
                output.as_mut_ptr(),
                direction,
                flag,
            )
        }
    }
    .ok_or_else(|| planning_failed(PlanKind::ComplexToComplex, shape))?;

    log_planned(PlanKind::ComplexToComplex, shape, direction, flag);
    Ok(C2cPlan::from_raw(
        raw,
        PlanKind::ComplexToComplex,
        direction,
        input,
        output,
    ))
}

fn plan_r2c(
    rank: usize,
    input: &mut AlignedBuf<f32>,
    output: &mut AlignedBuf<Complex32>,
    flag: Flag,
) -> Result<R2cPlan> {
    let real = input.shape();
    check_rank(real, rank)?;
    check_shape(real.half_spectrum(), output.shape())?;

    let raw = {
        let _guard = planner_guard();
        // Safety: as in `plan_dft`, with the half-spectrum output length.
        unsafe { RawPlan::dft_r2c(real.dims(), input.as_mut_ptr(), output.as_mut_ptr(), flag) }
    }
    .ok_or_else(|| planning_failed(PlanKind::RealToComplex, real))?;

    log_planned(PlanKind::RealToComplex, real, Direction::Forward, flag);
    Ok(R2cPlan::from_raw(
        raw,
        PlanKind::RealToComplex,
        Direction::Forward,
        input,
        output,
    ))
}

fn plan_c2r(
    rank: usize,
    input: &mut AlignedBuf<Complex32>,
    output: &mut AlignedBuf<f32>,
    flag: Flag,
) -> Result<C2rPlan> {
    // The logical size comes from the real side; `n/2 + 1` loses parity.
    let real = output.shape();
    check_rank(real, rank)?;
    check_shape(real.half_spectrum(), input.shape())?;

    let raw = {
        let _guard = planner_guard();
        // Safety: as in `plan_dft`, with the half-spectrum input length.
        unsafe { RawPlan::dft_c2r(real.dims(), input.as_mut_ptr(), output.as_mut_ptr(), flag) }
    }
    .ok_or_else(|| planning_failed(PlanKind::ComplexToReal, real))?;

    log_planned(PlanKind::ComplexToReal, real, Direction::Backward, flag);
    Ok(C2rPlan::from_raw(
        raw,
        PlanKind::ComplexToReal,
        Direction::Backward,
        input,
        output,
    ))
}

/// Plan a 1D complex transform of `input.len()` points.
///
/// # Errors
/// [`FftError::RankMismatch`] unless both buffers are 1D,
/// [`FftError::ShapeMismatch`] if their lengths differ.
pub fn plan_dft_1d(
    input: &mut AlignedBuf<Complex32>,
    output: &mut AlignedBuf<Complex32>,
    direction: Direction,
    flag: Flag,
) -> Result<C2cPlan> {
    plan_dft(1, input, output, direction, flag)
}

/// Plan a 2D complex transform over `(n0, n1)` buffers.
pub fn plan_dft_2d(
    input: &mut AlignedBuf<Complex32>,
    output: &mut AlignedBuf<Complex32>,
    direction: Direction,
    flag: Flag,
) -> Result<C2cPlan> {
    plan_dft(2, input, output, direction, flag)
}

/// Plan a 3D complex transform over `(n0, n1, n2)` buffers.
pub fn plan_dft_3d(
    input: &mut AlignedBuf<Complex32>,
    output: &mut AlignedBuf<Complex32>,
    direction: Direction,
    flag: Flag,
) -> Result<C2cPlan> {
    plan_dft(3, input, output, direction, flag)
}

/// Plan a forward transform of `n` reals into `n/2 + 1` complex bins.
///
/// Only the non-redundant half of the spectrum is produced; the rest is its
/// complex-conjugate mirror.
pub fn plan_dft_r2c_1d(
    input: &mut AlignedBuf<f32>,
    output: &mut AlignedBuf<Complex32>,
    flag: Flag,
) -> Result<R2cPlan> {
    plan_r2c(1, input, output, flag)
}

pub fn plan_dft_r2c_2d(
    input: &mut AlignedBuf<f32>,
    output: &mut AlignedBuf<Complex32>,
    flag: Flag,
) -> Result<R2cPlan> {
    plan_r2c(2, input, output, flag)
}

pub fn plan_dft_r2c_3d(
    input: &mut AlignedBuf<f32>,
    output: &mut AlignedBuf<Complex32>,
    flag: Flag,
) -> Result<R2cPlan> {
    plan_r2c(3, input, output, flag)
}

/// Plan a backward transform of `n/2 + 1` complex bins into `n` reals,
/// where `n` is the length of `output`.
///
/// Executing the plan destroys the contents of the complex input; refill it
/// before every execution.
pub fn plan_dft_c2r_1d(
    input: &mut AlignedBuf<Complex32>,
    output: &mut AlignedBuf<f32>,
    flag: Flag,
) -> Result<C2rPlan> {
    plan_c2r(1, input, output, flag)
}

pub fn plan_dft_c2r_2d(
    input: &mut AlignedBuf<Complex32>,
    output: &mut AlignedBuf<f32>,
    flag: Flag,
) -> Result<C2rPlan> {
    plan_c2r(2, input, output, flag)
}

pub fn plan_dft_c2r_3d(
    input: &mut AlignedBuf<Complex32>,
    output: &mut AlignedBuf<f32>,
    flag: Flag,
) -> Result<C2rPlan> {
    plan_c2r(3, input, output, flag)
}
