//! Level-1 exports: `nrm2`, `dot`, `dotu`, `dotc`.

use crate::{guard, handle_ref, rocrus_handle, rocrus_stride};
use rocrus_blas::level1;
use rocrus_core::{bf16, f16, Complex32, Complex64, Status};

macro_rules! nrm2_exports {
    ($t:ty, $r:ty, $int:ty, $single:ident, $batched:ident, $strided:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $single(
            handle: rocrus_handle,
            n: $int,
            x: *const $t,
            incx: $int,
            result: *mut $r,
        ) -> Status {
            guard(|| level1::nrm2::<$int, $t>(handle_ref(handle)?, n, x, incx, result))
        }

        #[no_mangle]
        pub unsafe extern "C" fn $batched(
            handle: rocrus_handle,
            n: $int,
            x: *const *const $t,
            incx: $int,
            batch_count: $int,
            result: *mut $r,
        ) -> Status {
            guard(|| {
                level1::nrm2_batched::<$int, $t>(handle_ref(handle)?, n, x, incx, batch_count, result)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $strided(
            handle: rocrus_handle,
            n: $int,
            x: *const $t,
            incx: $int,
            stridex: rocrus_stride,
            batch_count: $int,
            result: *mut $r,
        ) -> Status {
            guard(|| {
                level1::nrm2_strided_batched::<$int, $t>(
                    handle_ref(handle)?,
                    n,
                    x,
                    incx,
                    stridex,
                    batch_count,
                    result,
                )
            })
        }
    };
}

nrm2_exports!(f32, f32, i32, rocrus_snrm2, rocrus_snrm2_batched, rocrus_snrm2_strided_batched);
nrm2_exports!(f64, f64, i32, rocrus_dnrm2, rocrus_dnrm2_batched, rocrus_dnrm2_strided_batched);
nrm2_exports!(Complex32, f32, i32, rocrus_scnrm2, rocrus_scnrm2_batched, rocrus_scnrm2_strided_batched);
nrm2_exports!(Complex64, f64, i32, rocrus_dznrm2, rocrus_dznrm2_batched, rocrus_dznrm2_strided_batched);
nrm2_exports!(f32, f32, i64, rocrus_snrm2_64, rocrus_snrm2_batched_64, rocrus_snrm2_strided_batched_64);
nrm2_exports!(f64, f64, i64, rocrus_dnrm2_64, rocrus_dnrm2_batched_64, rocrus_dnrm2_strided_batched_64);
nrm2_exports!(
    Complex32,
    f32,
    i64,
    rocrus_scnrm2_64,
    rocrus_scnrm2_batched_64,
    rocrus_scnrm2_strided_batched_64
);
nrm2_exports!(
    Complex64,
    f64,
    i64,
    rocrus_dznrm2_64,
    rocrus_dznrm2_batched_64,
    rocrus_dznrm2_strided_batched_64
);

macro_rules! dot_exports {
    ($t:ty, $int:ty, $single:ident, $batched:ident, $strided:ident,
     $f:ident, $fb:ident, $fs:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $single(
            handle: rocrus_handle,
            n: $int,
            x: *const $t,
            incx: $int,
            y: *const $t,
            incy: $int,
            result: *mut $t,
        ) -> Status {
            guard(|| level1::$f::<$int, $t>(handle_ref(handle)?, n, x, incx, y, incy, result))
        }

        #[no_mangle]
        pub unsafe extern "C" fn $batched(
            handle: rocrus_handle,
            n: $int,
            x: *const *const $t,
            incx: $int,
            y: *const *const $t,
            incy: $int,
            batch_count: $int,
            result: *mut $t,
        ) -> Status {
            guard(|| {
                level1::$fb::<$int, $t>(handle_ref(handle)?, n, x, incx, y, incy, batch_count, result)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $strided(
            handle: rocrus_handle,
            n: $int,
            x: *const $t,
            incx: $int,
            stridex: rocrus_stride,
            y: *const $t,
            incy: $int,
            stridey: rocrus_stride,
            batch_count: $int,
            result: *mut $t,
        ) -> Status {
            guard(|| {
                level1::$fs::<$int, $t>(
                    handle_ref(handle)?,
                    n,
                    x,
                    incx,
                    stridex,
                    y,
                    incy,
                    stridey,
                    batch_count,
                    result,
                )
            })
        }
    };
}

macro_rules! dot_family {
    ($t:ty, $single:ident, $batched:ident, $strided:ident,
     $single64:ident, $batched64:ident, $strided64:ident, $f:ident, $fb:ident, $fs:ident) => {
        dot_exports!($t, i32, $single, $batched, $strided, $f, $fb, $fs);
        dot_exports!($t, i64, $single64, $batched64, $strided64, $f, $fb, $fs);
    };
}

dot_family!(
    f32, rocrus_sdot, rocrus_sdot_batched, rocrus_sdot_strided_batched,
    rocrus_sdot_64, rocrus_sdot_batched_64, rocrus_sdot_strided_batched_64,
    dot, dot_batched, dot_strided_batched
);
dot_family!(
    f64, rocrus_ddot, rocrus_ddot_batched, rocrus_ddot_strided_batched,
    rocrus_ddot_64, rocrus_ddot_batched_64, rocrus_ddot_strided_batched_64,
    dot, dot_batched, dot_strided_batched
);
dot_family!(
    f16, rocrus_hdot, rocrus_hdot_batched, rocrus_hdot_strided_batched,
    rocrus_hdot_64, rocrus_hdot_batched_64, rocrus_hdot_strided_batched_64,
    dot, dot_batched, dot_strided_batched
);
dot_family!(
    bf16, rocrus_bfdot, rocrus_bfdot_batched, rocrus_bfdot_strided_batched,
    rocrus_bfdot_64, rocrus_bfdot_batched_64, rocrus_bfdot_strided_batched_64,
    dot, dot_batched, dot_strided_batched
);
dot_family!(
    Complex32, rocrus_cdotu, rocrus_cdotu_batched, rocrus_cdotu_strided_batched,
    rocrus_cdotu_64, rocrus_cdotu_batched_64, rocrus_cdotu_strided_batched_64,
    dot, dot_batched, dot_strided_batched
);
dot_family!(
    Complex64, rocrus_zdotu, rocrus_zdotu_batched, rocrus_zdotu_strided_batched,
    rocrus_zdotu_64, rocrus_zdotu_batched_64, rocrus_zdotu_strided_batched_64,
    dot, dot_batched, dot_strided_batched
);
dot_family!(
    Complex32, rocrus_cdotc, rocrus_cdotc_batched, rocrus_cdotc_strided_batched,
    rocrus_cdotc_64, rocrus_cdotc_batched_64, rocrus_cdotc_strided_batched_64,
    dotc, dotc_batched, dotc_strided_batched
);
dot_family!(
    Complex64, rocrus_zdotc, rocrus_zdotc_batched, rocrus_zdotc_strided_batched,
    rocrus_zdotc_64, rocrus_zdotc_batched_64, rocrus_zdotc_strided_batched_64,
    dotc, dotc_batched, dotc_strided_batched
);
