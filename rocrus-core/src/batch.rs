//! Per-batch operand addressing.
//!
//! A routine operand is either one allocation walked with a batch stride
//! ([`Strided`]) or a device array holding one pointer per batch
//! ([`Batched`]). Kernels only see the [`BatchSrc`]/[`BatchDst`] traits.

use crate::types::Stride;

/// Read access to the operand of every batch.
///
/// Implementors are plain pointer bundles; they are `Send + Sync` so kernels
/// can hand them to worker threads. The caller of the unsafe accessors
/// guarantees that the memory is valid and that concurrent batches do not
/// alias mutably.
pub trait BatchSrc<T>: Copy + Send + Sync {
    /// True when the operand pointer itself (not a per-batch entry) is null.
    fn is_null(&self) -> bool;

    /// Pointer to element 0 of batch `b`, or null if that batch has none.
    ///
    /// # Safety
    /// `b` must be within the batch count the operand was built for and a
    /// batched pointer array must be readable.
    unsafe fn batch_ptr(&self, b: i64) -> *const T;

    /// Same operand with batch 0 moved to batch `b_base`.
    fn shifted(self, b_base: i64) -> Self;

    /// Same operand with every batch pointer advanced by `elems` elements.
    fn offset(self, elems: i64) -> Self;
}

/// Write access to the operand of every batch.
pub trait BatchDst<T>: BatchSrc<T> {
    /// # Safety
    /// See [`BatchSrc::batch_ptr`]; the caller also owns the write.
    unsafe fn batch_ptr_mut(&self, b: i64) -> *mut T {
        self.batch_ptr(b) as *mut T
    }
}

/// One allocation, batches `stride` elements apart.
pub struct Strided<T> {
    ptr: *mut T,
    offset: i64,
    stride: Stride,
}

impl<T> Clone for Strided<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Strided<T> {}

// SAFETY: a bundle of addresses; access rules are on the unsafe accessors.
unsafe impl<T> Send for Strided<T> {}
unsafe impl<T> Sync for Strided<T> {}

impl<T> Strided<T> {
    pub fn new(ptr: *const T, stride: Stride) -> Self {
        Strided {
            ptr: ptr as *mut T,
            offset: 0,
            stride,
        }
    }

    pub fn new_mut(ptr: *mut T, stride: Stride) -> Self {
        Strided {
            ptr,
            offset: 0,
            stride,
        }
    }

    /// A non-batched operand.
    pub fn single(ptr: *const T) -> Self {
        Self::new(ptr, 0)
    }

    pub fn stride(&self) -> Stride {
        self.stride
    }
}

impl<T: Send + Sync> BatchSrc<T> for Strided<T> {
    #[inline]
    fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    #[inline]
    unsafe fn batch_ptr(&self, b: i64) -> *const T {
        if self.ptr.is_null() {
            return std::ptr::null();
        }
        self.ptr
            .wrapping_offset((self.offset + b * self.stride) as isize)
            .cast_const()
    }

    #[inline]
    fn shifted(self, b_base: i64) -> Self {
        Strided {
            offset: self.offset + b_base * self.stride,
            ..self
        }
    }

    #[inline]
    fn offset(self, elems: i64) -> Self {
        Strided {
            offset: self.offset + elems,
            ..self
        }
    }
}

impl<T: Send + Sync> BatchDst<T> for Strided<T> {}

/// Device array of per-batch pointers.
pub struct Batched<T> {
    array: *const *mut T,
    offset: i64,
}

impl<T> Clone for Batched<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Batched<T> {}

// SAFETY: see `Strided`.
unsafe impl<T> Send for Batched<T> {}
unsafe impl<T> Sync for Batched<T> {}

impl<T> Batched<T> {
    pub fn new(array: *const *const T) -> Self {
        Batched {
            array: array as *const *mut T,
            offset: 0,
        }
    }

    pub fn new_mut(array: *const *mut T) -> Self {
        Batched { array, offset: 0 }
    }
}

impl<T: Send + Sync> BatchSrc<T> for Batched<T> {
    #[inline]
    fn is_null(&self) -> bool {
        self.array.is_null()
    }

    #[inline]
    unsafe fn batch_ptr(&self, b: i64) -> *const T {
        if self.array.is_null() {
            return std::ptr::null();
        }
        let p = *self.array.offset(b as isize);
        if p.is_null() {
            return std::ptr::null();
        }
        p.wrapping_offset(self.offset as isize).cast_const()
    }

    #[inline]
    fn shifted(self, b_base: i64) -> Self {
        Batched {
            array: self.array.wrapping_offset(b_base as isize),
            ..self
        }
    }

    #[inline]
    fn offset(self, elems: i64) -> Self {
        Batched {
            offset: self.offset + elems,
            ..self
        }
    }
}

impl<T: Send + Sync> BatchDst<T> for Batched<T> {}

/// Scalar argument as a kernel sees it.
///
/// In host pointer mode the value is read once before launch; in device
/// pointer mode the kernel dereferences the pointer itself, per batch when
/// the scalar has a stride.
pub enum ScalarArg<T> {
    Host(T),
    Device { ptr: *const T, stride: Stride },
}

impl<T: Copy> Clone for ScalarArg<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: Copy> Copy for ScalarArg<T> {}

// SAFETY: see `Strided`.
unsafe impl<T: Send> Send for ScalarArg<T> {}
unsafe impl<T: Sync> Sync for ScalarArg<T> {}

impl<T: Copy> ScalarArg<T> {
    /// Reads a host scalar now or wraps a device scalar for the kernel.
    ///
    /// # Safety
    /// `ptr` must be non-null and readable.
    pub unsafe fn from_ptr(ptr: *const T, mode: crate::types::PointerMode) -> Self {
        match mode {
            crate::types::PointerMode::Host => ScalarArg::Host(*ptr),
            crate::types::PointerMode::Device => ScalarArg::Device { ptr, stride: 0 },
        }
    }

    /// Host value, if known before launch.
    pub fn host_value(&self) -> Option<T> {
        match *self {
            ScalarArg::Host(v) => Some(v),
            ScalarArg::Device { .. } => None,
        }
    }

    /// Value seen by batch `b`.
    ///
    /// # Safety
    /// A device pointer must be readable for batch `b`.
    #[inline]
    pub unsafe fn load(&self, b: i64) -> T {
        match *self {
            ScalarArg::Host(v) => v,
            ScalarArg::Device { ptr, stride } => *ptr.offset((b * stride) as isize),
        }
    }

    /// Same scalar with batch 0 moved to `b_base`.
    pub fn shifted(self, b_base: i64) -> Self {
        match self {
            ScalarArg::Host(v) => ScalarArg::Host(v),
            ScalarArg::Device { ptr, stride } => ScalarArg::Device {
                ptr: ptr.wrapping_offset((b_base * stride) as isize),
                stride,
            },
        }
    }
}

/// Scalar result slot(s) of a reduction, one per batch.
pub struct ResultPtr<T> {
    ptr: *mut T,
}

impl<T> Clone for ResultPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ResultPtr<T> {}

// SAFETY: see `Strided`.
unsafe impl<T> Send for ResultPtr<T> {}
unsafe impl<T> Sync for ResultPtr<T> {}

impl<T> ResultPtr<T> {
    pub fn new(ptr: *mut T) -> Self {
        ResultPtr { ptr }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn shifted(self, b_base: i64) -> Self {
        ResultPtr {
            ptr: self.ptr.wrapping_offset(b_base as isize),
        }
    }

    /// # Safety
    /// Slot `b` must be writable.
    #[inline]
    pub unsafe fn write(&self, b: i64, v: T) {
        *self.ptr.offset(b as isize) = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strided_addressing() {
        let data: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let s = Strided::new(data.as_ptr(), 4);
        unsafe {
            assert_eq!(*s.batch_ptr(0), 0.0);
            assert_eq!(*s.batch_ptr(2), 8.0);
            assert_eq!(*s.shifted(1).batch_ptr(1), 8.0);
            assert_eq!(*s.offset(3).batch_ptr(1), 7.0);
        }
    }

    #[test]
    fn test_batched_addressing() {
        let a = [1.0f64, 2.0, 3.0];
        let b = [4.0f64, 5.0, 6.0];
        let ptrs = [a.as_ptr(), std::ptr::null(), b.as_ptr()];
        let x = Batched::new(ptrs.as_ptr());
        unsafe {
            assert_eq!(*x.batch_ptr(0), 1.0);
            assert!(x.batch_ptr(1).is_null());
            assert_eq!(*x.offset(1).batch_ptr(2), 5.0);
            assert_eq!(*x.shifted(2).batch_ptr(0), 4.0);
        }
    }

    #[test]
    fn test_null_operands() {
        let s: Strided<f32> = Strided::single(std::ptr::null());
        assert!(s.is_null());
        unsafe { assert!(s.shifted(5).batch_ptr(1).is_null()) };
        let x: Batched<f32> = Batched::new(std::ptr::null());
        assert!(x.is_null());
    }

    #[test]
    fn test_scalar_arg_device_stride() {
        let alphas = [2.0f32, 3.0, 5.0];
        let a = ScalarArg::Device {
            ptr: alphas.as_ptr(),
            stride: 1,
        };
        unsafe {
            assert_eq!(a.load(2), 5.0);
            assert_eq!(a.shifted(1).load(0), 3.0);
        }
        assert_eq!(a.host_value(), None);
        assert_eq!(ScalarArg::Host(1.5f32).host_value(), Some(1.5));
    }
}
