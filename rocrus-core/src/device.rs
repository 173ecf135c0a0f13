//! Host-emulated device memory.
//!
//! Device allocations are 64-byte aligned, zero-initialised heap blocks
//! tracked in a process-wide table. Kernels dereference them directly, so a
//! device pointer is an ordinary address; the table lets `free` recover the
//! layout and lets callers ask whether an address is device memory.
//!
//! # Safety model
//!
//! Every block is a separate `std::alloc` allocation. [`memcpy`] and
//! [`memset`] take raw pointers and trust the caller for bounds, exactly like
//! the runtime they emulate; [`DeviceAllocation`] is the safe owner used by
//! the workspace and the test harness.

use crate::error::Error;
use std::alloc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Alignment of every device allocation.
pub const ALIGNMENT: usize = 64;

/// Direction of a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum MemcpyKind {
    HostToHost = 0,
    HostToDevice = 1,
    DeviceToHost = 2,
    DeviceToDevice = 3,
    #[default]
    Default = 4,
}

impl TryFrom<u32> for MemcpyKind {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Error> {
        Ok(match raw {
            0 => MemcpyKind::HostToHost,
            1 => MemcpyKind::HostToDevice,
            2 => MemcpyKind::DeviceToHost,
            3 => MemcpyKind::DeviceToDevice,
            4 => MemcpyKind::Default,
            _ => return Err(Error::InvalidValue("kind")),
        })
    }
}

/// Live allocations keyed by start address.
static REGISTRY: Mutex<BTreeMap<usize, alloc::Layout>> = Mutex::new(BTreeMap::new());
static ALLOCATED: AtomicUsize = AtomicUsize::new(0);

fn registry() -> std::sync::MutexGuard<'static, BTreeMap<usize, alloc::Layout>> {
    // The table stays consistent even if a holder panicked mid-insert.
    REGISTRY.lock().unwrap_or_else(|e| e.into_inner())
}

/// Allocates `bytes` of zeroed device memory.
///
/// Zero bytes yields a null pointer, as the emulated runtime allows.
pub fn malloc(bytes: usize) -> Result<*mut u8, Error> {
    if bytes == 0 {
        return Ok(std::ptr::null_mut());
    }
    let layout = alloc::Layout::from_size_align(bytes, ALIGNMENT).map_err(|_| {
        Error::MemoryError {
            requested: bytes,
            limit: isize::MAX as usize,
        }
    })?;
    // SAFETY: layout has non-zero size.
    let ptr = unsafe { alloc::alloc_zeroed(layout) };
    if ptr.is_null() {
        return Err(Error::MemoryError {
            requested: bytes,
            limit: ALLOCATED.load(Ordering::Relaxed),
        });
    }
    registry().insert(ptr as usize, layout);
    ALLOCATED.fetch_add(bytes, Ordering::Relaxed);
    tracing::trace!(bytes, ptr = ?ptr, "device malloc");
    Ok(ptr)
}

/// Frees a pointer returned by [`malloc`]. Null is a no-op.
pub fn free(ptr: *mut u8) -> Result<(), Error> {
    if ptr.is_null() {
        return Ok(());
    }
    let layout = registry()
        .remove(&(ptr as usize))
        .ok_or(Error::InvalidPointer("ptr"))?;
    // SAFETY: the registry only holds live blocks from `malloc` with this layout.
    unsafe { alloc::dealloc(ptr, layout) };
    ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
    Ok(())
}

/// Whether `ptr` points into a live device allocation.
pub fn is_device_pointer(ptr: *const u8) -> bool {
    let addr = ptr as usize;
    registry()
        .range(..=addr)
        .next_back()
        .is_some_and(|(&start, layout)| addr < start + layout.size())
}

/// Bytes currently allocated on the device.
pub fn allocated_bytes() -> usize {
    ALLOCATED.load(Ordering::Relaxed)
}

/// Copies `bytes` from `src` to `dst`.
///
/// # Safety
/// Both ranges must be valid for `bytes` and must not overlap.
pub unsafe fn memcpy(
    dst: *mut u8,
    src: *const u8,
    bytes: usize,
    _kind: MemcpyKind,
) -> Result<(), Error> {
    if bytes == 0 {
        return Ok(());
    }
    if dst.is_null() {
        return Err(Error::InvalidPointer("dst"));
    }
    if src.is_null() {
        return Err(Error::InvalidPointer("src"));
    }
    std::ptr::copy_nonoverlapping(src, dst, bytes);
    Ok(())
}

/// Copies a `rows x cols` block of `elem_size`-byte elements between
/// column-major layouts with leading dimensions `lda` and `ldb`.
///
/// # Safety
/// Both matrices must be valid for their extents and must not overlap.
pub unsafe fn memcpy_2d(
    dst: *mut u8,
    ldb: usize,
    src: *const u8,
    lda: usize,
    rows: usize,
    cols: usize,
    elem_size: usize,
    kind: MemcpyKind,
) -> Result<(), Error> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    if lda == rows && ldb == rows {
        return memcpy(dst, src, rows * cols * elem_size, kind);
    }
    for j in 0..cols {
        memcpy(
            dst.add(j * ldb * elem_size),
            src.add(j * lda * elem_size),
            rows * elem_size,
            kind,
        )?;
    }
    Ok(())
}

/// Sets `bytes` bytes at `dst` to `value`.
///
/// # Safety
/// `dst` must be valid for `bytes`.
pub unsafe fn memset(dst: *mut u8, value: u8, bytes: usize) -> Result<(), Error> {
    if bytes == 0 {
        return Ok(());
    }
    if dst.is_null() {
        return Err(Error::InvalidPointer("dst"));
    }
    std::ptr::write_bytes(dst, value, bytes);
    Ok(())
}

/// Owned device allocation, freed on drop.
#[derive(Debug)]
pub struct DeviceAllocation {
    ptr: *mut u8,
    bytes: usize,
}

// SAFETY: the allocation is uniquely owned; access goes through raw pointers.
unsafe impl Send for DeviceAllocation {}
unsafe impl Sync for DeviceAllocation {}

impl DeviceAllocation {
    pub fn new(bytes: usize) -> Result<Self, Error> {
        Ok(DeviceAllocation {
            ptr: malloc(bytes)?,
            bytes,
        })
    }

    /// Allocation for `len` elements of `T`.
    pub fn for_elements<T>(len: usize) -> Result<Self, Error> {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(Error::MemoryError {
                requested: usize::MAX,
                limit: isize::MAX as usize,
            })?;
        Self::new(bytes)
    }

    pub fn len_bytes(&self) -> usize {
        self.bytes
    }

    pub fn as_ptr<T>(&self) -> *const T {
        self.ptr as *const T
    }

    pub fn as_mut_ptr<T>(&self) -> *mut T {
        self.ptr as *mut T
    }
}

impl Drop for DeviceAllocation {
    fn drop(&mut self) {
        if let Err(e) = free(self.ptr) {
            tracing::error!(error = %e, "device free failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malloc_is_aligned_and_zeroed() {
        let a = DeviceAllocation::new(100).unwrap();
        let p = a.as_ptr::<u8>();
        assert_eq!(p as usize % ALIGNMENT, 0);
        let bytes = unsafe { std::slice::from_raw_parts(p, 100) };
        assert!(bytes.iter().all(|&b| b == 0));
        assert!(is_device_pointer(p));
        assert!(is_device_pointer(unsafe { p.add(99) }));
        assert!(!is_device_pointer(unsafe { p.add(100) }));
    }

    #[test]
    fn test_zero_bytes_is_null() {
        let a = DeviceAllocation::new(0).unwrap();
        assert!(a.as_ptr::<u8>().is_null());
    }

    #[test]
    fn test_free_unknown_pointer() {
        let mut x = 0u8;
        assert_eq!(free(&mut x), Err(Error::InvalidPointer("ptr")));
        assert!(!is_device_pointer(&x));
    }

    #[test]
    fn test_memcpy_round_trip() {
        let host = [1.0f32, 2.0, 3.0, 4.0];
        let d = DeviceAllocation::for_elements::<f32>(4).unwrap();
        let mut back = [0.0f32; 4];
        unsafe {
            memcpy(d.as_mut_ptr(), host.as_ptr().cast(), 16, MemcpyKind::HostToDevice).unwrap();
            memcpy(back.as_mut_ptr().cast(), d.as_ptr(), 16, MemcpyKind::DeviceToHost).unwrap();
        }
        assert_eq!(back, host);
    }

    #[test]
    fn test_memcpy_2d_respects_leading_dims() {
        // 2x3 matrix, source ld 3, destination ld 2.
        let src: Vec<u8> = vec![1, 2, 0, 3, 4, 0, 5, 6, 0];
        let mut dst = vec![9u8; 6];
        unsafe {
            memcpy_2d(dst.as_mut_ptr(), 2, src.as_ptr(), 3, 2, 3, 1, MemcpyKind::HostToHost)
                .unwrap();
        }
        assert_eq!(dst, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_memset_null() {
        assert!(unsafe { memset(std::ptr::null_mut(), 0, 4) }.is_err());
        assert!(unsafe { memset(std::ptr::null_mut(), 0, 0) }.is_ok());
    }
}
