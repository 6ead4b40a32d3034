//! Engine built on `rustfft` and `realfft`.
//!
//! Mirrors the native plan model: a plan captures the raw addresses of the
//! buffers it was built for, execution runs against those or against new
//! addresses of the same shape. Storage comes from anonymous OS pages.
//!
//! Multi-dimensional transforms are done axis by axis over the row-major
//! block. Real transforms run the real FFT along the last axis and complex
//! FFTs along the leading axes of the half spectrum.

use std::ptr::{self, NonNull};
use std::slice;
use std::sync::Arc;

use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftDirection, FftPlanner};

use crate::config::{Direction, Flag};
use crate::platform::{sys, AllocFailed};
use crate::shape::Shape;

pub(crate) const ENGINE: &str = "rustfft";

pub(crate) fn malloc(bytes: usize) -> Result<NonNull<u8>, AllocFailed> {
    let ptr = sys::alloc(bytes)?;
    NonNull::new(ptr).ok_or(AllocFailed)
}

pub(crate) unsafe fn free(ptr: NonNull<u8>, bytes: usize) {
    sys::free(ptr.as_ptr(), bytes);
}

fn fft_direction(direction: Direction) -> FftDirection {
    match direction {
        Direction::Forward => FftDirection::Forward,
        Direction::Backward => FftDirection::Inverse,
    }
}

/// Complex FFTs along the leading `ffts.len()` axes of a row-major block.
struct AxisPass {
    dims: Vec<usize>,
    ffts: Vec<Arc<dyn Fft<f32>>>,
    scratch: Vec<Complex32>,
    line: Vec<Complex32>,
}

impl AxisPass {
    fn new(
        planner: &mut FftPlanner<f32>,
        dims: &[usize],
        axes: usize,
        direction: FftDirection,
    ) -> Self {
        let ffts: Vec<_> = dims[..axes]
            .iter()
            .map(|&n| planner.plan_fft(n, direction))
            .collect();
        let scratch_len = ffts
            .iter()
            .map(|fft| fft.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);
        let line_len = dims[..axes].iter().copied().max().unwrap_or(0);

        Self {
            dims: dims.to_vec(),
            ffts,
            scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
            line: vec![Complex32::new(0.0, 0.0); line_len],
        }
    }

    fn run(&mut self, data: &mut [Complex32]) {
        for (axis, fft) in self.ffts.iter().enumerate() {
            let n = self.dims[axis];
            let stride: usize = self.dims[axis + 1..].iter().product();

            if stride == 1 {
                // Innermost axis: rustfft walks the contiguous rows itself.
                fft.process_with_scratch(data, &mut self.scratch);
                continue;
            }

            let line = &mut self.line[..n];
            for block in data.chunks_exact_mut(n * stride) {
                for i in 0..stride {
                    for (k, v) in line.iter_mut().enumerate() {
                        *v = block[i + k * stride];
                    }
                    fft.process_with_scratch(line, &mut self.scratch);
                    for (k, v) in line.iter().enumerate() {
                        block[i + k * stride] = *v;
                    }
                }
            }
        }
    }
}

enum Kernel {
    C2c {
        pass: AxisPass,
        len: usize,
        input: *mut Complex32,
        output: *mut Complex32,
    },
    R2c {
        rows: Arc<dyn RealToComplex<f32>>,
        pass: AxisPass,
        staging: Vec<f32>,
        scratch: Vec<Complex32>,
        row_len: usize,
        real_len: usize,
        complex_len: usize,
        input: *mut f32,
        output: *mut Complex32,
    },
    C2r {
        rows: Arc<dyn ComplexToReal<f32>>,
        pass: AxisPass,
        scratch: Vec<Complex32>,
        row_len: usize,
        real_len: usize,
        complex_len: usize,
        input: *mut Complex32,
        output: *mut f32,
    },
}

pub(crate) struct RawPlan {
    kernel: Kernel,
}

impl RawPlan {
    pub(crate) unsafe fn dft(
        dims: &[usize],
        input: *mut Complex32,
        output: *mut Complex32,
        direction: Direction,
        flag: Flag,
    ) -> Option<Self> {
        log::trace!("{}: c2c {:?} planned as {}", ENGINE, dims, flag);
        let mut planner = FftPlanner::new();
        let pass = AxisPass::new(&mut planner, dims, dims.len(), fft_direction(direction));

        Some(Self {
            kernel: Kernel::C2c {
                pass,
                len: dims.iter().product(),
                input,
                output,
            },
        })
    }

    pub(crate) unsafe fn dft_r2c(
        dims: &[usize],
        input: *mut f32,
        output: *mut Complex32,
        flag: Flag,
    ) -> Option<Self> {
        log::trace!("{}: r2c {:?} planned as {}", ENGINE, dims, flag);
        let spectrum = Shape::new(dims).ok()?.half_spectrum();
        let leading = dims.len() - 1;
        let n = dims[leading];

        let mut real_planner = RealFftPlanner::<f32>::new();
        let rows = real_planner.plan_fft_forward(n);
        let mut planner = FftPlanner::new();
        let pass = AxisPass::new(&mut planner, spectrum.dims(), leading, FftDirection::Forward);

        Some(Self {
            kernel: Kernel::R2c {
                scratch: rows.make_scratch_vec(),
                staging: vec![0.0; n],
                rows,
                pass,
                row_len: n,
                real_len: dims.iter().product(),
                complex_len: spectrum.len(),
                input,
                output,
            },
        })
    }

    pub(crate) unsafe fn dft_c2r(
        dims: &[usize],
        input: *mut Complex32,
        output: *mut f32,
        flag: Flag,
    ) -> Option<Self> {
        log::trace!("{}: c2r {:?} planned as {}", ENGINE, dims, flag);
        let spectrum = Shape::new(dims).ok()?.half_spectrum();
        let leading = dims.len() - 1;
        let n = dims[leading];

        let mut real_planner = RealFftPlanner::<f32>::new();
        let rows = real_planner.plan_fft_inverse(n);
        let mut planner = FftPlanner::new();
        let pass = AxisPass::new(&mut planner, spectrum.dims(), leading, FftDirection::Inverse);

        Some(Self {
            kernel: Kernel::C2r {
                scratch: rows.make_scratch_vec(),
                rows,
                pass,
                row_len: n,
                real_len: dims.iter().product(),
                complex_len: spectrum.len(),
                input,
                output,
            },
        })
    }

    /// Run on the buffers captured at construction.
    pub(crate) unsafe fn execute(&mut self) {
        match self.kernel {
            Kernel::C2c { input, output, .. } => self.execute_dft(input, output),
            Kernel::R2c { input, output, .. } => self.execute_dft_r2c(input, output),
            Kernel::C2r { input, output, .. } => self.execute_dft_c2r(input, output),
        }
    }

    pub(crate) unsafe fn execute_dft(&mut self, input: *mut Complex32, output: *mut Complex32) {
        let Kernel::C2c { pass, len, .. } = &mut self.kernel else {
            debug_assert!(false, "execute_dft on a real plan");
            return;
        };

        // c2c leaves the input intact: copy it over and transform in place.
        if input != output {
            ptr::copy_nonoverlapping(input, output, *len);
        }
        pass.run(slice::from_raw_parts_mut(output, *len));
    }

    pub(crate) unsafe fn execute_dft_r2c(&mut self, input: *mut f32, output: *mut Complex32) {
        let Kernel::R2c {
            rows,
            pass,
            staging,
            scratch,
            row_len,
            real_len,
            complex_len,
            ..
        } = &mut self.kernel
        else {
            debug_assert!(false, "execute_dft_r2c on a non-r2c plan");
            return;
        };

        let input = slice::from_raw_parts(input, *real_len);
        let output = slice::from_raw_parts_mut(output, *complex_len);
        let width = *row_len / 2 + 1;

        // realfft consumes its input, so each row goes through `staging`.
        for (src, dst) in input
            .chunks_exact(*row_len)
            .zip(output.chunks_exact_mut(width))
        {
            staging.copy_from_slice(src);
            if let Err(err) = rows.process_with_scratch(staging, dst, scratch) {
                log::error!("{}: r2c row transform failed: {}", ENGINE, err);
            }
        }
        pass.run(output);
    }

    pub(crate) unsafe fn execute_dft_c2r(&mut self, input: *mut Complex32, output: *mut f32) {
        let Kernel::C2r {
            rows,
            pass,
            scratch,
            row_len,
            real_len,
            complex_len,
            ..
        } = &mut self.kernel
        else {
            debug_assert!(false, "execute_dft_c2r on a non-c2r plan");
            return;
        };

        let input = slice::from_raw_parts_mut(input, *complex_len);
        let output = slice::from_raw_parts_mut(output, *real_len);
        let n = *row_len;
        let width = n / 2 + 1;

        // The input is scratch from here on.
        pass.run(input);
        for (src, dst) in input
            .chunks_exact_mut(width)
            .zip(output.chunks_exact_mut(n))
        {
            // DC and Nyquist of a real signal are real; drop stray imaginary parts.
            src[0].im = 0.0;
            if n % 2 == 0 {
                src[width - 1].im = 0.0;
            }
            if let Err(err) = rows.process_with_scratch(src, dst, scratch) {
                log::error!("{}: c2r row transform failed: {}", ENGINE, err);
            }
        }
    }

    pub(crate) unsafe fn destroy(self) {
        drop(self);
    }
}
