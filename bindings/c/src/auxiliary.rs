//! Host/device transfer exports.

use crate::{guard, rocrus_stream};
use rocrus_blas::auxiliary;
use rocrus_core::{Error, Status, Stream};
use std::ffi::c_void;
use std::sync::Arc;

/// Borrows a stream reference for the duration of one call.
unsafe fn with_stream<F>(stream: rocrus_stream, f: F) -> Status
where
    F: FnOnce(&Arc<Stream>) -> rocrus_core::BlasResult,
{
    guard(|| {
        if stream.is_null() {
            return Err(Error::InvalidPointer("stream"));
        }
        Arc::increment_strong_count(stream);
        let s = Arc::from_raw(stream);
        f(&s)
    })
}

macro_rules! vector_exports {
    ($int:ty, $set:ident, $get:ident, $set_async:ident, $get_async:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $set(
            n: $int,
            elem_size: $int,
            x: *const c_void,
            incx: $int,
            y: *mut c_void,
            incy: $int,
        ) -> Status {
            guard(|| auxiliary::set_vector::<$int>(n, elem_size, x.cast(), incx, y.cast(), incy))
        }

        #[no_mangle]
        pub unsafe extern "C" fn $get(
            n: $int,
            elem_size: $int,
            x: *const c_void,
            incx: $int,
            y: *mut c_void,
            incy: $int,
        ) -> Status {
            guard(|| auxiliary::get_vector::<$int>(n, elem_size, x.cast(), incx, y.cast(), incy))
        }

        #[no_mangle]
        pub unsafe extern "C" fn $set_async(
            n: $int,
            elem_size: $int,
            x: *const c_void,
            incx: $int,
            y: *mut c_void,
            incy: $int,
            stream: rocrus_stream,
        ) -> Status {
            with_stream(stream, |s| {
                auxiliary::set_vector_async::<$int>(n, elem_size, x.cast(), incx, y.cast(), incy, s)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $get_async(
            n: $int,
            elem_size: $int,
            x: *const c_void,
            incx: $int,
            y: *mut c_void,
            incy: $int,
            stream: rocrus_stream,
        ) -> Status {
            with_stream(stream, |s| {
                auxiliary::get_vector_async::<$int>(n, elem_size, x.cast(), incx, y.cast(), incy, s)
            })
        }
    };
}

vector_exports!(
    i32,
    rocrus_set_vector,
    rocrus_get_vector,
    rocrus_set_vector_async,
    rocrus_get_vector_async
);
vector_exports!(
    i64,
    rocrus_set_vector_64,
    rocrus_get_vector_64,
    rocrus_set_vector_async_64,
    rocrus_get_vector_async_64
);

macro_rules! matrix_exports {
    ($int:ty, $set:ident, $get:ident, $set_async:ident, $get_async:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $set(
            rows: $int,
            cols: $int,
            elem_size: $int,
            a: *const c_void,
            lda: $int,
            b: *mut c_void,
            ldb: $int,
        ) -> Status {
            guard(|| auxiliary::set_matrix::<$int>(rows, cols, elem_size, a.cast(), lda, b.cast(), ldb))
        }

        #[no_mangle]
        pub unsafe extern "C" fn $get(
            rows: $int,
            cols: $int,
            elem_size: $int,
            a: *const c_void,
            lda: $int,
            b: *mut c_void,
            ldb: $int,
        ) -> Status {
            guard(|| auxiliary::get_matrix::<$int>(rows, cols, elem_size, a.cast(), lda, b.cast(), ldb))
        }

        #[no_mangle]
        pub unsafe extern "C" fn $set_async(
            rows: $int,
            cols: $int,
            elem_size: $int,
            a: *const c_void,
            lda: $int,
            b: *mut c_void,
            ldb: $int,
            stream: rocrus_stream,
        ) -> Status {
            with_stream(stream, |s| {
                auxiliary::set_matrix_async::<$int>(
                    rows,
                    cols,
                    elem_size,
                    a.cast(),
                    lda,
                    b.cast(),
                    ldb,
                    s,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $get_async(
            rows: $int,
            cols: $int,
            elem_size: $int,
            a: *const c_void,
            lda: $int,
            b: *mut c_void,
            ldb: $int,
            stream: rocrus_stream,
        ) -> Status {
            with_stream(stream, |s| {
                auxiliary::get_matrix_async::<$int>(
                    rows,
                    cols,
                    elem_size,
                    a.cast(),
                    lda,
                    b.cast(),
                    ldb,
                    s,
                )
            })
        }
    };
}

matrix_exports!(
    i32,
    rocrus_set_matrix,
    rocrus_get_matrix,
    rocrus_set_matrix_async,
    rocrus_get_matrix_async
);
matrix_exports!(
    i64,
    rocrus_set_matrix_64,
    rocrus_get_matrix_64,
    rocrus_set_matrix_async_64,
    rocrus_get_matrix_async_64
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{rocrus_stream_create, rocrus_stream_destroy, rocrus_stream_synchronize};
    use rocrus_core::device::DeviceAllocation;

    #[test]
    fn test_async_matrix_through_c() {
        let a: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let d = DeviceAllocation::for_elements::<f32>(6).unwrap();
        let mut back = vec![0.0f32; 6];
        unsafe {
            let mut s: rocrus_stream = std::ptr::null();
            assert_eq!(rocrus_stream_create(&mut s), Status::Success);
            assert_eq!(
                rocrus_set_matrix_async(3, 2, 4, a.as_ptr().cast(), 3, d.as_mut_ptr(), 3, s),
                Status::Success
            );
            assert_eq!(
                rocrus_get_matrix_async_64(3, 2, 4, d.as_ptr(), 3, back.as_mut_ptr().cast(), 3, s),
                Status::Success
            );
            assert_eq!(rocrus_stream_synchronize(s), Status::Success);
            assert_eq!(rocrus_stream_destroy(s), Status::Success);
        }
        assert_eq!(back, a);
    }

    #[test]
    fn test_null_stream_is_rejected() {
        let x = [0u8; 4];
        let mut y = [0u8; 4];
        let s = unsafe {
            rocrus_set_vector_async(1, 4, x.as_ptr().cast(), 1, y.as_mut_ptr().cast(), 1, std::ptr::null())
        };
        assert_eq!(s, Status::InvalidPointer);
        let s = unsafe { rocrus_get_vector(1, 4, x.as_ptr().cast(), 0, y.as_mut_ptr().cast(), 1) };
        assert_eq!(s, Status::InvalidSize);
    }
}
