//! Engine linking the system single-precision FFTW 3 library.
//!
//! This is the only place that knows FFTW's integer encodings for the
//! transform sign and the planner flags.

use std::ptr::NonNull;

use libc::{c_int, c_uint, c_void, size_t};
use num_complex::Complex32;

use crate::config::{Direction, Flag};
use crate::platform::AllocFailed;

pub(crate) const ENGINE: &str = "fftw3f";

const FFTW_FORWARD: c_int = -1;
const FFTW_BACKWARD: c_int = 1;

const FFTW_MEASURE: c_uint = 0;
const FFTW_EXHAUSTIVE: c_uint = 1 << 3;
const FFTW_PATIENT: c_uint = 1 << 5;
const FFTW_ESTIMATE: c_uint = 1 << 6;

#[repr(C)]
struct FftwfPlanS {
    _private: [u8; 0],
}

type FftwfPlan = *mut FftwfPlanS;

/// `fftwf_complex` is `float[2]`, layout-compatible with `Complex32`.
type FftwfComplex = [f32; 2];

#[link(name = "fftw3f")]
extern "C" {
    fn fftwf_malloc(n: size_t) -> *mut c_void;
    fn fftwf_free(p: *mut c_void);

    fn fftwf_plan_dft(
        rank: c_int,
        n: *const c_int,
        input: *mut FftwfComplex,
        output: *mut FftwfComplex,
        sign: c_int,
        flags: c_uint,
    ) -> FftwfPlan;
    fn fftwf_plan_dft_r2c(
        rank: c_int,
        n: *const c_int,
        input: *mut f32,
        output: *mut FftwfComplex,
        flags: c_uint,
    ) -> FftwfPlan;
    fn fftwf_plan_dft_c2r(
        rank: c_int,
        n: *const c_int,
        input: *mut FftwfComplex,
        output: *mut f32,
        flags: c_uint,
    ) -> FftwfPlan;

    fn fftwf_execute(plan: FftwfPlan);
    fn fftwf_execute_dft(plan: FftwfPlan, input: *mut FftwfComplex, output: *mut FftwfComplex);
    fn fftwf_execute_dft_r2c(plan: FftwfPlan, input: *mut f32, output: *mut FftwfComplex);
    fn fftwf_execute_dft_c2r(plan: FftwfPlan, input: *mut FftwfComplex, output: *mut f32);

    fn fftwf_destroy_plan(plan: FftwfPlan);
}

fn sign(direction: Direction) -> c_int {
    match direction {
        Direction::Forward => FFTW_FORWARD,
        Direction::Backward => FFTW_BACKWARD,
    }
}

fn flags(flag: Flag) -> c_uint {
    match flag {
        Flag::Estimate => FFTW_ESTIMATE,
        Flag::Measure => FFTW_MEASURE,
        Flag::Patient => FFTW_PATIENT,
        Flag::Exhaustive => FFTW_EXHAUSTIVE,
    }
}

/// Dimensions are range-checked against `c_int` by the planner.
fn native_dims(dims: &[usize]) -> Vec<c_int> {
    dims.iter().map(|&n| n as c_int).collect()
}

pub(crate) fn malloc(bytes: usize) -> Result<NonNull<u8>, AllocFailed> {
    let ptr = unsafe { fftwf_malloc(bytes as size_t) };
    NonNull::new(ptr as *mut u8).ok_or(AllocFailed)
}

pub(crate) unsafe fn free(ptr: NonNull<u8>, _bytes: usize) {
    fftwf_free(ptr.as_ptr() as *mut c_void);
}

/// Owned `fftwf_plan`. FFTW keeps the planned buffer addresses itself.
pub(crate) struct RawPlan {
    plan: NonNull<FftwfPlanS>,
}

impl RawPlan {
    pub(crate) unsafe fn dft(
        dims: &[usize],
        input: *mut Complex32,
        output: *mut Complex32,
        direction: Direction,
        flag: Flag,
    ) -> Option<Self> {
        let n = native_dims(dims);
        let plan = fftwf_plan_dft(
            n.len() as c_int,
            n.as_ptr(),
            input.cast(),
            output.cast(),
            sign(direction),
            flags(flag),
        );
        NonNull::new(plan).map(|plan| Self { plan })
    }

    pub(crate) unsafe fn dft_r2c(
        dims: &[usize],
        input: *mut f32,
        output: *mut Complex32,
        flag: Flag,
    ) -> Option<Self> {
        let n = native_dims(dims);
        let plan = fftwf_plan_dft_r2c(
            n.len() as c_int,
            n.as_ptr(),
            input,
            output.cast(),
            flags(flag),
        );
        NonNull::new(plan).map(|plan| Self { plan })
    }

    pub(crate) unsafe fn dft_c2r(
        dims: &[usize],
        input: *mut Complex32,
        output: *mut f32,
        flag: Flag,
    ) -> Option<Self> {
        let n = native_dims(dims);
        let plan = fftwf_plan_dft_c2r(
            n.len() as c_int,
            n.as_ptr(),
            input.cast(),
            output,
            flags(flag),
        );
        NonNull::new(plan).map(|plan| Self { plan })
    }

    pub(crate) unsafe fn execute(&mut self) {
        fftwf_execute(self.plan.as_ptr());
    }

    pub(crate) unsafe fn execute_dft(&mut self, input: *mut Complex32, output: *mut Complex32) {
        fftwf_execute_dft(self.plan.as_ptr(), input.cast(), output.cast());
    }

    pub(crate) unsafe fn execute_dft_r2c(&mut self, input: *mut f32, output: *mut Complex32) {
        fftwf_execute_dft_r2c(self.plan.as_ptr(), input, output.cast());
    }

    pub(crate) unsafe fn execute_dft_c2r(&mut self, input: *mut Complex32, output: *mut f32) {
        fftwf_execute_dft_c2r(self.plan.as_ptr(), input.cast(), output);
    }

    pub(crate) unsafe fn destroy(self) {
        fftwf_destroy_plan(self.plan.as_ptr());
    }
}
