//! Boundary to the native transform engine.
//!
//! Exactly one engine is compiled in. Both expose the same surface:
//!
//! - `malloc` / `free`: aligned storage for buffers,
//! - `RawPlan::{dft, dft_r2c, dft_c2r}`: plan construction over raw buffer
//!   addresses and logical (real-side) dimensions,
//! - `RawPlan::execute*`: run on the planned or on new same-shaped buffers,
//! - `RawPlan::destroy`: release the native plan.
//!
//! Everything here is `unsafe` and unchecked. Shape, rank and alignment
//! validation happens in `planner` and `plan` before any call lands here.

#[cfg(feature = "fftw")]
mod fftw;
#[cfg(feature = "fftw")]
pub(crate) use fftw::{free, malloc, RawPlan, ENGINE};

#[cfg(all(feature = "portable", not(feature = "fftw")))]
mod portable;
#[cfg(all(feature = "portable", not(feature = "fftw")))]
pub(crate) use portable::{free, malloc, RawPlan, ENGINE};

#[cfg(not(any(feature = "fftw", feature = "portable")))]
compile_error!("enable either the `portable` or the `fftw` feature to select a transform engine");
