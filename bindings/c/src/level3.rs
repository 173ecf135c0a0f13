//! Level-3 exports: `trtri`.

use crate::{guard, handle_ref, rocrus_handle, rocrus_int, rocrus_stride, triangle};
use rocrus_blas::level3;
use rocrus_core::{Complex32, Complex64, Operation, Status};

macro_rules! trtri_exports {
    ($t:ty, $single:ident, $batched:ident, $strided:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $single(
            handle: rocrus_handle,
            uplo: u32,
            diag: u32,
            n: rocrus_int,
            a: *const $t,
            lda: rocrus_int,
            inv_a: *mut $t,
            ld_inv_a: rocrus_int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                let (uplo, _, diag) = triangle(uplo, Operation::None as u32, diag);
                level3::trtri::<$t>(h, uplo, diag, n, a, lda, inv_a, ld_inv_a)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $batched(
            handle: rocrus_handle,
            uplo: u32,
            diag: u32,
            n: rocrus_int,
            a: *const *const $t,
            lda: rocrus_int,
            inv_a: *const *mut $t,
            ld_inv_a: rocrus_int,
            batch_count: rocrus_int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                let (uplo, _, diag) = triangle(uplo, Operation::None as u32, diag);
                level3::trtri_batched::<$t>(h, uplo, diag, n, a, lda, inv_a, ld_inv_a, batch_count)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $strided(
            handle: rocrus_handle,
            uplo: u32,
            diag: u32,
            n: rocrus_int,
            a: *const $t,
            lda: rocrus_int,
            stride_a: rocrus_stride,
            inv_a: *mut $t,
            ld_inv_a: rocrus_int,
            stride_inv_a: rocrus_stride,
            batch_count: rocrus_int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                let (uplo, _, diag) = triangle(uplo, Operation::None as u32, diag);
                level3::trtri_strided_batched::<$t>(
                    h,
                    uplo,
                    diag,
                    n,
                    a,
                    lda,
                    stride_a,
                    inv_a,
                    ld_inv_a,
                    stride_inv_a,
                    batch_count,
                )
            })
        }
    };
}

trtri_exports!(f32, rocrus_strtri, rocrus_strtri_batched, rocrus_strtri_strided_batched);
trtri_exports!(f64, rocrus_dtrtri, rocrus_dtrtri_batched, rocrus_dtrtri_strided_batched);
trtri_exports!(Complex32, rocrus_ctrtri, rocrus_ctrtri_batched, rocrus_ctrtri_strided_batched);
trtri_exports!(Complex64, rocrus_ztrtri, rocrus_ztrtri_batched, rocrus_ztrtri_strided_batched);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rocrus_destroy_handle;
    use crate::tests::create;

    #[test]
    fn test_dtrtri_lower() {
        let h = create();
        // [[2, 0], [1, 4]] column-major
        let a = [2.0f64, 1.0, f64::NAN, 4.0];
        let mut inv = [9.0f64; 4];
        unsafe {
            let s = rocrus_dtrtri(h, 122, 131, 2, a.as_ptr(), 2, inv.as_mut_ptr(), 2);
            assert_eq!(s, Status::Success);
            rocrus_destroy_handle(h);
        }
        assert_eq!(inv, [0.5, -0.125, 0.0, 0.25]);
    }

    #[test]
    fn test_invalid_diag_answers_size_query_first() {
        let h = create();
        let a = [1.0f32; 4];
        let mut inv = [9.0f32; 4];
        let mut size = 0usize;
        unsafe {
            assert_eq!(crate::rocrus_start_device_memory_size_query(h), Status::Success);
            let s = rocrus_strtri(h, 121, 999, 2, a.as_ptr(), 2, inv.as_mut_ptr(), 2);
            assert_eq!(s, Status::SizeUnchanged);
            assert_eq!(crate::rocrus_stop_device_memory_size_query(h, &mut size), Status::Success);

            let s = rocrus_strtri(h, 121, 999, 2, a.as_ptr(), 2, inv.as_mut_ptr(), 2);
            assert_eq!(s, Status::InvalidValue);
            rocrus_destroy_handle(h);
        }
        assert_eq!(inv, [9.0; 4]);
    }
}
