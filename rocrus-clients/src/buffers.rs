//! Host and device buffers in the three batch shapes a routine accepts.
//!
//! Vectors hold `n` elements at increment `inc`, taking `n * |inc|` slots
//! (`n` slots for `inc == 0`). Matrices are unit-increment vectors of
//! `ld * cols` elements, see [`matrix_len`].

use rocrus_core::device::{memcpy, DeviceAllocation, MemcpyKind};
use rocrus_core::Error;
use std::marker::PhantomData;
use std::mem::size_of;

/// Slots taken by a vector of `n` elements at increment `inc`.
pub fn vector_len(n: i64, inc: i64) -> usize {
    (n.max(0) * inc.abs().max(1)) as usize
}

/// Elements of a column-major matrix with `cols` columns and leading
/// dimension `ld`.
pub fn matrix_len(ld: i64, cols: i64) -> usize {
    (ld.max(0) * cols.max(0)) as usize
}

/// Read access to every batch of a host buffer.
pub trait BatchView<T> {
    fn batch_count(&self) -> usize;
    fn batch(&self, b: usize) -> &[T];
}

// ============================================================================
// Host
// ============================================================================

/// Plain host vector.
#[derive(Debug, Clone, PartialEq)]
pub struct HostVector<T> {
    data: Vec<T>,
}

impl<T: Copy + Default> HostVector<T> {
    pub fn new(n: i64, inc: i64) -> Self {
        HostVector {
            data: vec![T::default(); vector_len(n, inc)],
        }
    }

    pub fn matrix(ld: i64, cols: i64) -> Self {
        HostVector {
            data: vec![T::default(); matrix_len(ld, cols)],
        }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        HostVector { data }
    }

    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    /// Copies a device buffer of the same length back to the host.
    pub fn transfer_from(&mut self, d: &DeviceVector<T>) -> Result<(), Error> {
        unsafe {
            memcpy(
                self.data.as_mut_ptr().cast(),
                d.mem.as_ptr(),
                self.data.len() * size_of::<T>(),
                MemcpyKind::DeviceToHost,
            )
        }
    }
}

impl<T> std::ops::Deref for HostVector<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> std::ops::DerefMut for HostVector<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> BatchView<T> for HostVector<T> {
    fn batch_count(&self) -> usize {
        1
    }
    fn batch(&self, _b: usize) -> &[T] {
        &self.data
    }
}

/// One host allocation per batch.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBatchVector<T> {
    batches: Vec<Vec<T>>,
}

impl<T: Copy + Default> HostBatchVector<T> {
    pub fn new(n: i64, inc: i64, batch_count: i64) -> Self {
        Self::with_len(vector_len(n, inc), batch_count)
    }

    pub fn matrix(ld: i64, cols: i64, batch_count: i64) -> Self {
        Self::with_len(matrix_len(ld, cols), batch_count)
    }

    fn with_len(len: usize, batch_count: i64) -> Self {
        HostBatchVector {
            batches: vec![vec![T::default(); len]; batch_count.max(0) as usize],
        }
    }

    pub fn batch_mut(&mut self, b: usize) -> &mut [T] {
        &mut self.batches[b]
    }

    pub fn transfer_from(&mut self, d: &DeviceBatchVector<T>) -> Result<(), Error> {
        for (dst, src) in self.batches.iter_mut().zip(&d.mems) {
            unsafe {
                memcpy(
                    dst.as_mut_ptr().cast(),
                    src.as_ptr(),
                    dst.len() * size_of::<T>(),
                    MemcpyKind::DeviceToHost,
                )?;
            }
        }
        Ok(())
    }
}

impl<T> std::ops::Index<usize> for HostBatchVector<T> {
    type Output = [T];
    fn index(&self, b: usize) -> &[T] {
        &self.batches[b]
    }
}

impl<T> std::ops::IndexMut<usize> for HostBatchVector<T> {
    fn index_mut(&mut self, b: usize) -> &mut [T] {
        &mut self.batches[b]
    }
}

impl<T> BatchView<T> for HostBatchVector<T> {
    fn batch_count(&self) -> usize {
        self.batches.len()
    }
    fn batch(&self, b: usize) -> &[T] {
        &self.batches[b]
    }
}

/// One host allocation, batches `stride` elements apart.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStridedBatchVector<T> {
    data: Vec<T>,
    len: usize,
    stride: usize,
    batch_count: usize,
}

impl<T: Copy + Default> HostStridedBatchVector<T> {
    /// `stride` is raised to the batch length if smaller.
    pub fn new(n: i64, inc: i64, stride: i64, batch_count: i64) -> Self {
        Self::with_len(vector_len(n, inc), stride, batch_count)
    }

    pub fn matrix(ld: i64, cols: i64, stride: i64, batch_count: i64) -> Self {
        Self::with_len(matrix_len(ld, cols), stride, batch_count)
    }

    fn with_len(len: usize, stride: i64, batch_count: i64) -> Self {
        let stride = (stride.max(0) as usize).max(len);
        let batch_count = batch_count.max(0) as usize;
        HostStridedBatchVector {
            data: vec![T::default(); stride * batch_count],
            len,
            stride,
            batch_count,
        }
    }

    pub fn stride(&self) -> i64 {
        self.stride as i64
    }

    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    pub fn batch_mut(&mut self, b: usize) -> &mut [T] {
        let at = b * self.stride;
        &mut self.data[at..at + self.len]
    }

    pub fn transfer_from(&mut self, d: &DeviceStridedBatchVector<T>) -> Result<(), Error> {
        unsafe {
            memcpy(
                self.data.as_mut_ptr().cast(),
                d.mem.as_ptr(),
                self.data.len() * size_of::<T>(),
                MemcpyKind::DeviceToHost,
            )
        }
    }
}

impl<T> std::ops::Index<usize> for HostStridedBatchVector<T> {
    type Output = [T];
    fn index(&self, b: usize) -> &[T] {
        let at = b * self.stride;
        &self.data[at..at + self.len]
    }
}

impl<T> std::ops::IndexMut<usize> for HostStridedBatchVector<T> {
    fn index_mut(&mut self, b: usize) -> &mut [T] {
        let at = b * self.stride;
        &mut self.data[at..at + self.len]
    }
}

impl<T> BatchView<T> for HostStridedBatchVector<T> {
    fn batch_count(&self) -> usize {
        self.batch_count
    }
    fn batch(&self, b: usize) -> &[T] {
        &self[b]
    }
}

// ============================================================================
// Device
// ============================================================================

/// Plain device vector.
pub struct DeviceVector<T> {
    mem: DeviceAllocation,
    _elem: PhantomData<T>,
}

impl<T> DeviceVector<T> {
    pub fn new(len: usize) -> Result<Self, Error> {
        Ok(DeviceVector {
            mem: DeviceAllocation::for_elements::<T>(len)?,
            _elem: PhantomData,
        })
    }

    pub fn as_ptr(&self) -> *const T {
        self.mem.as_ptr()
    }

    pub fn as_mut_ptr(&self) -> *mut T {
        self.mem.as_mut_ptr()
    }

    pub fn transfer_from(&self, h: &HostVector<T>) -> Result<(), Error>
    where
        T: Copy + Default,
    {
        unsafe {
            memcpy(
                self.mem.as_mut_ptr(),
                h.as_ptr().cast(),
                h.len() * size_of::<T>(),
                MemcpyKind::HostToDevice,
            )
        }
    }
}

/// One device allocation per batch plus the device array of their
/// addresses.
pub struct DeviceBatchVector<T> {
    mems: Vec<DeviceAllocation>,
    ptrs: DeviceAllocation,
    _elem: PhantomData<T>,
}

impl<T> DeviceBatchVector<T> {
    pub fn new(n: i64, inc: i64, batch_count: i64) -> Result<Self, Error> {
        Self::with_len(vector_len(n, inc), batch_count)
    }

    pub fn matrix(ld: i64, cols: i64, batch_count: i64) -> Result<Self, Error> {
        Self::with_len(matrix_len(ld, cols), batch_count)
    }

    fn with_len(len: usize, batch_count: i64) -> Result<Self, Error> {
        let batch_count = batch_count.max(0) as usize;
        let mems = (0..batch_count)
            .map(|_| DeviceAllocation::for_elements::<T>(len))
            .collect::<Result<Vec<_>, _>>()?;
        let addrs: Vec<*mut T> = mems.iter().map(|m| m.as_mut_ptr()).collect();
        let ptrs = DeviceAllocation::for_elements::<*mut T>(batch_count)?;
        unsafe {
            memcpy(
                ptrs.as_mut_ptr(),
                addrs.as_ptr().cast(),
                batch_count * size_of::<*mut T>(),
                MemcpyKind::HostToDevice,
            )?;
        }
        Ok(DeviceBatchVector {
            mems,
            ptrs,
            _elem: PhantomData,
        })
    }

    /// Device array of per-batch pointers, for input operands.
    pub fn ptr_on_device(&self) -> *const *const T {
        self.ptrs.as_ptr()
    }

    /// Device array of per-batch pointers, for output operands.
    pub fn ptr_on_device_mut(&self) -> *const *mut T {
        self.ptrs.as_ptr()
    }

    pub fn transfer_from(&self, h: &HostBatchVector<T>) -> Result<(), Error>
    where
        T: Copy + Default,
    {
        for (b, mem) in self.mems.iter().enumerate() {
            let src = &h[b];
            unsafe {
                memcpy(
                    mem.as_mut_ptr(),
                    src.as_ptr().cast(),
                    src.len() * size_of::<T>(),
                    MemcpyKind::HostToDevice,
                )?;
            }
        }
        Ok(())
    }
}

/// One device allocation, batches `stride` elements apart.
pub struct DeviceStridedBatchVector<T> {
    mem: DeviceAllocation,
    stride: i64,
    _elem: PhantomData<T>,
}

impl<T> DeviceStridedBatchVector<T> {
    /// Same layout as `h`.
    pub fn like(h: &HostStridedBatchVector<T>) -> Result<Self, Error> {
        Ok(DeviceStridedBatchVector {
            mem: DeviceAllocation::for_elements::<T>(h.data.len())?,
            stride: h.stride as i64,
            _elem: PhantomData,
        })
    }

    pub fn stride(&self) -> i64 {
        self.stride
    }

    pub fn as_ptr(&self) -> *const T {
        self.mem.as_ptr()
    }

    pub fn as_mut_ptr(&self) -> *mut T {
        self.mem.as_mut_ptr()
    }

    pub fn transfer_from(&self, h: &HostStridedBatchVector<T>) -> Result<(), Error> {
        unsafe {
            memcpy(
                self.mem.as_mut_ptr(),
                h.data.as_ptr().cast(),
                h.data.len() * size_of::<T>(),
                MemcpyKind::HostToDevice,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        assert_eq!(vector_len(5, -3), 15);
        assert_eq!(vector_len(5, 0), 5);
        assert_eq!(vector_len(-1, 1), 0);
        assert_eq!(matrix_len(7, 3), 21);
    }

    #[test]
    fn test_batch_round_trip() {
        let mut h = HostBatchVector::<f32>::new(3, 1, 2);
        h[0].copy_from_slice(&[1.0, 2.0, 3.0]);
        h[1].copy_from_slice(&[4.0, 5.0, 6.0]);
        let d = DeviceBatchVector::<f32>::new(3, 1, 2).unwrap();
        d.transfer_from(&h).unwrap();
        let second = unsafe { *d.ptr_on_device().add(1) };
        assert_eq!(unsafe { *second.add(2) }, 6.0);
        let mut back = HostBatchVector::<f32>::new(3, 1, 2);
        back.transfer_from(&d).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_strided_layout() {
        let mut h = HostStridedBatchVector::<f64>::new(2, 2, 1, 3);
        assert_eq!(h.stride(), 4);
        h[2][3] = 9.0;
        let d = DeviceStridedBatchVector::like(&h).unwrap();
        d.transfer_from(&h).unwrap();
        assert_eq!(unsafe { *d.as_ptr().add(11) }, 9.0);
        let mut back = h.clone();
        back[2][3] = 0.0;
        back.transfer_from(&d).unwrap();
        assert_eq!(back, h);
    }
}
