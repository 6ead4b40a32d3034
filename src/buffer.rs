//! Aligned buffers backed by the native allocator.
//!
//! An [`AlignedBuf`] owns exactly one native allocation. The 2D and 3D
//! views it hands out ([`AlignedBuf::row`], [`AlignedBuf::slab`], ...) are
//! borrowed sub-slices of that single block, never copies, so the whole
//! block is released as one unit when the owner is dropped.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice::{self, ChunksExact, ChunksExactMut};

use num_complex::Complex32;

use crate::config::ALIGNMENT_CLASS;
use crate::error::{FftError, Result};
use crate::native;
use crate::shape::Shape;
use crate::stats;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for num_complex::Complex32 {}
}

/// Element types the native engine understands.
///
/// Implemented for `f32` and [`Complex32`] only. For both, the all-zero
/// bit pattern is `0.0`.
pub trait Element: Copy + Send + Sync + fmt::Debug + sealed::Sealed + 'static {}

impl Element for f32 {}
impl Element for Complex32 {}

/// A zero-initialized, natively aligned, row-major buffer.
///
/// Dereferences to the flat 1D slice of all elements.
pub struct AlignedBuf<T: Element> {
    ptr: NonNull<T>,
    shape: Shape,
    bytes: usize,
    _owns: PhantomData<T>,
}

impl<T: Element> AlignedBuf<T> {
    /// Allocate a zeroed buffer of the given shape.
    ///
    /// Performs exactly one native allocation call.
    pub fn new(shape: Shape) -> Result<Self> {
        let bytes = shape
            .len()
            .checked_mul(mem::size_of::<T>())
            .ok_or_else(|| FftError::InvalidShape {
                dims: shape.dims().to_vec(),
            })?;

        let raw = native::malloc(bytes).map_err(|_| {
            log::warn!("native allocation of {} bytes for {} failed", bytes, shape);
            FftError::AllocFailed { bytes }
        })?;
        debug_assert_eq!(raw.as_ptr() as usize % ALIGNMENT_CLASS, 0);

        // Safety: the block is `bytes` long and exclusively ours.
        unsafe {
            ptr::write_bytes(raw.as_ptr(), 0, bytes);
        }
        stats::record_alloc(bytes);
        log::trace!("allocated {} buffer ({} bytes) at {:p}", shape, bytes, raw);

        Ok(Self {
            ptr: raw.cast(),
            shape,
            bytes,
            _owns: PhantomData,
        })
    }

    /// Allocate a zeroed buffer with the given dimensions.
    #[inline]
    pub fn with_dims(dims: &[usize]) -> Result<Self> {
        Self::new(Shape::new(dims)?)
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Size of the allocation in bytes.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.bytes
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Address modulo [`ALIGNMENT_CLASS`].
    #[inline]
    pub fn alignment_offset(&self) -> usize {
        self.ptr.as_ptr() as usize % ALIGNMENT_CLASS
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // Safety: `ptr` points to `shape.len()` initialized elements we own.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.shape.len()) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: as above, and `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.shape.len()) }
    }

    /// Element at a multi-index of the buffer's rank.
    ///
    /// # Panics
    /// Panics if the index rank or bounds do not match the shape.
    #[inline]
    pub fn at(&self, index: &[usize]) -> &T {
        &self.as_slice()[self.shape.offset(index)]
    }

    #[inline]
    pub fn at_mut(&mut self, index: &[usize]) -> &mut T {
        let offset = self.shape.offset(index);
        &mut self.as_mut_slice()[offset]
    }

    /// Contiguous rows along the last dimension.
    ///
    /// For a 2D `(n0, n1)` buffer these are the `n0` rows of length `n1`;
    /// for 3D they are all `n0*n1` rows of length `n2`, slab by slab.
    #[inline]
    pub fn rows(&self) -> ChunksExact<'_, T> {
        let width = self.shape.last();
        self.as_slice().chunks_exact(width)
    }

    #[inline]
    pub fn rows_mut(&mut self) -> ChunksExactMut<'_, T> {
        let width = self.shape.last();
        self.as_mut_slice().chunks_exact_mut(width)
    }

    /// Row `i`, i.e. elements `[i*w, (i+1)*w)` with `w` the last dimension.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        let width = self.shape.last();
        &self.as_slice()[i * width..(i + 1) * width]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        let width = self.shape.last();
        &mut self.as_mut_slice()[i * width..(i + 1) * width]
    }

    /// Outer slab `i` of a 3D buffer, as an `(n1, n2)` view.
    ///
    /// # Panics
    /// Panics if the buffer is not 3D or `i >= n0`.
    pub fn slab(&self, i: usize) -> Slab<'_, T> {
        let (rows, cols) = self.slab_dims();
        let size = rows * cols;
        Slab {
            data: &self.as_slice()[i * size..(i + 1) * size],
            rows,
            cols,
        }
    }

    pub fn slab_mut(&mut self, i: usize) -> SlabMut<'_, T> {
        let (rows, cols) = self.slab_dims();
        let size = rows * cols;
        SlabMut {
            data: &mut self.as_mut_slice()[i * size..(i + 1) * size],
            rows,
            cols,
        }
    }

    /// All outer slabs of a 3D buffer, in order.
    pub fn slabs(&self) -> impl Iterator<Item = Slab<'_, T>> {
        let (rows, cols) = self.slab_dims();
        self.as_slice()
            .chunks_exact(rows * cols)
            .map(move |data| Slab { data, rows, cols })
    }

    fn slab_dims(&self) -> (usize, usize) {
        let dims = self.shape.dims();
        assert_eq!(
            dims.len(),
            3,
            "slab views need a 3D buffer, this one is {}",
            self.shape
        );
        (dims[1], dims[2])
    }
}

impl<T: Element> Deref for AlignedBuf<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Element> DerefMut for AlignedBuf<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Element> Drop for AlignedBuf<T> {
    fn drop(&mut self) {
        // Safety: the block came from `native::malloc(self.bytes)` and no
        // view can outlive `self`.
        unsafe {
            native::free(self.ptr.cast(), self.bytes);
        }
        stats::record_free(self.bytes);
        log::trace!("freed {} buffer at {:p}", self.shape, self.ptr);
    }
}

impl<T: Element> fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuf")
            .field("shape", &self.shape)
            .field("ptr", &self.ptr)
            .field("bytes", &self.bytes)
            .finish()
    }
}

// Safety: AlignedBuf uniquely owns its block, exactly like Vec<T>.
unsafe impl<T: Element> Send for AlignedBuf<T> {}
unsafe impl<T: Element> Sync for AlignedBuf<T> {}

/// Borrowed `(rows, cols)` view of one slab of a 3D buffer.
#[derive(Debug, Clone, Copy)]
pub struct Slab<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
}

impl<'a, T> Slab<'a, T> {
    #[inline]
    pub fn row(&self, j: usize) -> &'a [T] {
        &self.data[j * self.cols..(j + 1) * self.cols]
    }

    #[inline]
    pub fn rows(&self) -> ChunksExact<'a, T> {
        self.data.chunks_exact(self.cols)
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}

/// Mutable `(rows, cols)` view of one slab of a 3D buffer.
#[derive(Debug)]
pub struct SlabMut<'a, T> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
}

impl<'a, T> SlabMut<'a, T> {
    #[inline]
    pub fn row(&self, j: usize) -> &[T] {
        &self.data[j * self.cols..(j + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, j: usize) -> &mut [T] {
        &mut self.data[j * self.cols..(j + 1) * self.cols]
    }

    #[inline]
    pub fn rows_mut(&mut self) -> ChunksExactMut<'_, T> {
        self.data.chunks_exact_mut(self.cols)
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows
    }
}

/// `n` complex elements.
pub fn alloc_1d(n: usize) -> Result<AlignedBuf<Complex32>> {
    AlignedBuf::with_dims(&[n])
}

/// `n0 * n1` complex elements, exposed as `n0` rows of `n1`.
pub fn alloc_2d(n0: usize, n1: usize) -> Result<AlignedBuf<Complex32>> {
    AlignedBuf::with_dims(&[n0, n1])
}

/// `n0 * n1 * n2` complex elements, exposed as `n0` slabs of `n1` rows of `n2`.
pub fn alloc_3d(n0: usize, n1: usize, n2: usize) -> Result<AlignedBuf<Complex32>> {
    AlignedBuf::with_dims(&[n0, n1, n2])
}

/// `n` real elements.
pub fn alloc_real_1d(n: usize) -> Result<AlignedBuf<f32>> {
    AlignedBuf::with_dims(&[n])
}

pub fn alloc_real_2d(n0: usize, n1: usize) -> Result<AlignedBuf<f32>> {
    AlignedBuf::with_dims(&[n0, n1])
}

pub fn alloc_real_3d(n0: usize, n1: usize, n2: usize) -> Result<AlignedBuf<f32>> {
    AlignedBuf::with_dims(&[n0, n1, n2])
}
