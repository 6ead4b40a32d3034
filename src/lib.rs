//! fftplan: plan/execute FFT bindings over natively aligned buffers.
//!
//! This crate exposes the plan-based model of native FFT libraries such as
//! FFTW: build a plan once for a problem shape (expensive), then execute it
//! many times (cheap). Buffers come from the engine's own allocator so they
//! meet its SIMD alignment requirements, and plans release their native
//! resources exactly once, on [`Plan::destroy`] or on drop.
//!
//! # Features
//!
//! - **Aligned buffers**: [`AlignedBuf`] owns one native allocation and
//!   exposes it as a flat slice plus row/slab views without copying
//! - **Complex and real transforms**: 1D/2D/3D complex-to-complex,
//!   real-to-complex and complex-to-real plans
//! - **Checked execution**: shapes are validated before the native planner is
//!   reached, and [`Plan::execute_new_array`] rechecks them on every call
//! - **Two engines**: `portable` (default, `rustfft`/`realfft`) or `fftw`
//!   (links the system `libfftw3f`)
//!
//! # Usage
//!
//! ```rust
//! use fftplan::{alloc_1d, plan_dft_1d, Complex32, Direction, Flag};
//!
//! let mut input = alloc_1d(8).unwrap();
//! let mut output = alloc_1d(8).unwrap();
//! let mut plan = plan_dft_1d(&mut input, &mut output, Direction::Forward, Flag::Estimate).unwrap();
//!
//! // A pure tone at bin 1.
//! for (j, x) in input.iter_mut().enumerate() {
//!     *x = Complex32::from_polar(1.0, 2.0 * std::f32::consts::PI * j as f32 / 8.0);
//! }
//! plan.execute_new_array(&mut input, &mut output).unwrap();
//! assert!((output[1].norm() - 8.0).abs() < 1e-3);
//! assert!(output[3].norm() < 1e-3);
//! ```
//!
//! Running on the construction-time buffers skips the per-call checks and
//! is therefore `unsafe`:
//!
//! ```rust
//! use fftplan::{alloc_real_1d, alloc_1d, plan_dft_r2c_1d, Flag};
//!
//! let mut signal = alloc_real_1d(16).unwrap();
//! let mut spectrum = alloc_1d(9).unwrap();
//! let mut plan = plan_dft_r2c_1d(&mut signal, &mut spectrum, Flag::Estimate).unwrap();
//!
//! signal.fill(1.0);
//! // Safety: `signal` and `spectrum` are alive and not borrowed elsewhere.
//! unsafe { plan.execute().unwrap() };
//! assert!((spectrum[0].re - 16.0).abs() < 1e-4);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
mod native;
pub mod plan;
pub mod planner;
pub mod platform;
pub mod shape;
pub mod stats;

pub use buffer::{
    alloc_1d, alloc_2d, alloc_3d, alloc_real_1d, alloc_real_2d, alloc_real_3d, AlignedBuf, Element,
    Slab, SlabMut,
};
pub use config::*;
pub use error::{FftError, Result};
pub use num_complex::Complex32;
pub use plan::{C2cPlan, C2rPlan, Plan, PlanKind, R2cPlan};
pub use planner::{
    plan_dft_1d, plan_dft_2d, plan_dft_3d, plan_dft_c2r_1d, plan_dft_c2r_2d, plan_dft_c2r_3d,
    plan_dft_r2c_1d, plan_dft_r2c_2d, plan_dft_r2c_3d,
};
pub use shape::Shape;
pub use stats::{stats, Stats};

/// Name of the engine compiled into this build (`"rustfft"` or `"fftw3f"`).
pub fn engine() -> &'static str {
    native::ENGINE
}
