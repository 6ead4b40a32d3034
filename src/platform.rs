//! Platform-specific page allocation used by the portable engine.
//!
//! Buffers handed to the transform engine come straight from the
//! operating system's virtual memory API, which returns page-aligned
//! blocks (far stricter than any SIMD requirement):
//! - **Linux**: `mmap`/`munmap` via `rustix`
//! - **macOS**: `mach_vm_allocate`/`mach_vm_deallocate` via `mach2`
//! - **Other Unix**: `mmap`/`munmap` via `libc`

use std::fmt;

/// Error type for system memory allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocFailed;

impl std::error::Error for AllocFailed {}

impl fmt::Display for AllocFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "System memory allocation failed")
    }
}

/// Platform-specific memory allocation functions.
pub mod sys {
    use super::AllocFailed;

    /// Allocate `size` bytes of zeroed virtual memory from the OS.
    ///
    /// The memory is:
    /// - Read/Write accessible
    /// - Zero-filled
    /// - Aligned to at least the system page size
    #[cfg(target_os = "linux")]
    #[inline]
    pub fn alloc(size: usize) -> Result<*mut u8, AllocFailed> {
        use rustix::mm::{mmap_anonymous, MapFlags, ProtFlags};
        use std::ptr;

        debug_assert!(size > 0);

        unsafe {
            match mmap_anonymous(
                ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::PRIVATE,
            ) {
                Ok(ptr) => Ok(ptr as *mut u8),
                Err(_) => Err(AllocFailed),
            }
        }
    }

    /// Return a block obtained from [`alloc`] to the OS.
    ///
    /// # Safety
    /// `ptr` must come from `alloc(size)` with the same `size`, and must not
    /// be used afterwards.
    #[cfg(target_os = "linux")]
    #[inline]
    pub unsafe fn free(ptr: *mut u8, size: usize) {
        // munmap only fails for ranges we never mapped.
        let _ = rustix::mm::munmap(ptr as *mut std::ffi::c_void, size);
    }

    #[cfg(target_vendor = "apple")]
    #[inline]
    pub fn alloc(size: usize) -> Result<*mut u8, AllocFailed> {
        use mach2::kern_return::KERN_SUCCESS;
        use mach2::traps::mach_task_self;
        use mach2::vm::mach_vm_allocate;
        use mach2::vm_statistics::VM_FLAGS_ANYWHERE;
        use mach2::vm_types::{mach_vm_address_t, mach_vm_size_t};

        debug_assert!(size > 0);

        let task = unsafe { mach_task_self() };
        let mut address: mach_vm_address_t = 0;
        let vm_size: mach_vm_size_t = size as mach_vm_size_t;

        let retval = unsafe { mach_vm_allocate(task, &mut address, vm_size, VM_FLAGS_ANYWHERE) };

        if retval == KERN_SUCCESS {
            Ok(address as *mut u8)
        } else {
            Err(AllocFailed)
        }
    }

    #[cfg(target_vendor = "apple")]
    #[inline]
    pub unsafe fn free(ptr: *mut u8, size: usize) {
        use mach2::traps::mach_task_self;
        use mach2::vm::mach_vm_deallocate;
        use mach2::vm_types::{mach_vm_address_t, mach_vm_size_t};

        let _ = mach_vm_deallocate(
            mach_task_self(),
            ptr as mach_vm_address_t,
            size as mach_vm_size_t,
        );
    }

    /// Fallback for other Unix-like systems.
    #[cfg(all(not(target_os = "linux"), not(target_vendor = "apple"), unix))]
    #[inline]
    pub fn alloc(size: usize) -> Result<*mut u8, AllocFailed> {
        use libc::{mmap, MAP_ANON, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE};
        use std::ptr;

        debug_assert!(size > 0);

        let ptr = unsafe {
            mmap(
                ptr::null_mut(),
                size,
                PROT_READ | PROT_WRITE,
                MAP_PRIVATE | MAP_ANON,
                -1,
                0,
            )
        };

        if ptr == MAP_FAILED {
            Err(AllocFailed)
        } else {
            Ok(ptr as *mut u8)
        }
    }

    #[cfg(all(not(target_os = "linux"), not(target_vendor = "apple"), unix))]
    #[inline]
    pub unsafe fn free(ptr: *mut u8, size: usize) {
        let _ = libc::munmap(ptr as *mut libc::c_void, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_is_page_aligned_and_zeroed() {
        let size = 3 * 1000;
        let ptr = sys::alloc(size).unwrap();
        assert!(!ptr.is_null());
        assert_eq!((ptr as usize) % 4096, 0);
        unsafe {
            for i in 0..size {
                assert_eq!(*ptr.add(i), 0);
            }
            ptr.add(size - 1).write(7);
            assert_eq!(ptr.add(size - 1).read(), 7);
            sys::free(ptr, size);
        }
    }

    #[test]
    fn test_alloc_failed_display() {
        assert_eq!(AllocFailed.to_string(), "System memory allocation failed");
    }
}
