use super::{expect_status, int, CaseInt, CaseResult};
use crate::argument_model::{ArgumentModel, Field, Timing};
use crate::arguments::Arguments;
use crate::buffers::{matrix_len, DeviceVector, HostVector};
use crate::check::{norm_error, unit_check_general};
use crate::flops::set_get_matrix_gbyte_count;
use crate::init::{init_matrix, seeded_rng};
use crate::timing::{time_us_no_sync, time_us_sync};
use anyhow::ensure;
use rocrus_blas::auxiliary::{get_matrix_async, set_matrix_async};
use rocrus_core::{status_of, Scalar, Status, Stream};
use std::mem::size_of;
use std::ptr;
use std::sync::Arc;

const SET_GET_FIELDS: &[Field] = &[Field::M, Field::N, Field::Lda, Field::Ldb];

pub fn testing_set_get_matrix_async_bad_arg<I: CaseInt, T: Scalar>(_arg: &Arguments) -> CaseResult {
    let (rows, cols, ld) = (100i64, 10i64, 100i64);
    let stream = Arc::new(Stream::new()?);
    let ha = HostVector::<T>::matrix(ld, cols);
    let db = DeviceVector::<T>::new(matrix_len(ld, cols))?;
    let es = size_of::<T>() as i64;
    let (a, b) = (ha.as_ptr().cast::<u8>(), db.as_mut_ptr().cast::<u8>());

    let size_cases = [
        (-1, es, ld, ld, "rows < 0"),
        (rows, 0, ld, ld, "elem_size == 0"),
        (rows, es, rows - 1, ld, "lda < rows"),
        (rows, es, ld, rows - 1, "ldb < rows"),
        (rows, es, 0, ld, "lda == 0"),
    ];
    for (r, e, lda, ldb, what) in size_cases {
        let s = unsafe {
            set_matrix_async::<I>(int(r)?, int(cols)?, int(e)?, a, int(lda)?, b, int(ldb)?, &stream)
        };
        expect_status(s, Status::InvalidSize, what)?;
        let s = unsafe {
            get_matrix_async::<I>(int(r)?, int(cols)?, int(e)?, a, int(lda)?, b, int(ldb)?, &stream)
        };
        expect_status(s, Status::InvalidSize, what)?;
    }

    let (rows_i, cols_i, es_i, ld_i) = (int::<I>(rows)?, int::<I>(cols)?, int::<I>(es)?, int::<I>(ld)?);
    unsafe {
        expect_status(
            set_matrix_async::<I>(rows_i, cols_i, es_i, ptr::null(), ld_i, b, ld_i, &stream),
            Status::InvalidPointer,
            "null a",
        )?;
        expect_status(
            set_matrix_async::<I>(rows_i, cols_i, es_i, a, ld_i, ptr::null_mut(), ld_i, &stream),
            Status::InvalidPointer,
            "null b",
        )?;
        expect_status(
            get_matrix_async::<I>(rows_i, cols_i, es_i, ptr::null(), ld_i, b, ld_i, &stream),
            Status::InvalidPointer,
            "null a",
        )?;
    }
    expect_status(
        unsafe { set_matrix_async::<I>(rows_i, cols_i, es_i, a, ld_i, b, ld_i, &stream) },
        Status::Success,
        "valid copy",
    )?;
    stream.synchronize()?;
    Ok(None)
}

pub fn testing_set_get_matrix_async<I: CaseInt, T: Scalar>(arg: &Arguments) -> CaseResult {
    let (rows, cols) = (arg.m, arg.n);
    let (lda, ldb, ldd) = (arg.lda, arg.ldb, arg.ldd);
    let es = size_of::<T>() as i64;
    let stream = Arc::new(Stream::new()?);

    let invalid =
        rows < 0 || cols < 0 || lda < rows.max(1) || ldb < rows.max(1) || ldd < rows.max(1);
    if invalid {
        // the upload sees lda and ldd, the download ldb
        let (up, down) = unsafe {
            (
                set_matrix_async::<I>(
                    int(rows)?,
                    int(cols)?,
                    int(es)?,
                    ptr::null(),
                    int(lda)?,
                    ptr::null_mut(),
                    int(ldd)?,
                    &stream,
                ),
                get_matrix_async::<I>(
                    int(rows)?,
                    int(cols)?,
                    int(es)?,
                    ptr::null(),
                    int(ldd)?,
                    ptr::null_mut(),
                    int(ldb)?,
                    &stream,
                ),
            )
        };
        let (up, down) = (status_of(up), status_of(down));
        ensure!(
            up == Status::InvalidSize || down == Status::InvalidSize,
            "invalid shape accepted: upload {up:?}, download {down:?}"
        );
        return Ok(None);
    }

    let mut rng = seeded_rng(arg.seed);
    let mut ha = HostVector::<T>::matrix(lda, cols);
    let mut hb = HostVector::<T>::matrix(ldb, cols);
    init_matrix(&mut rng, &mut ha, rows, cols, lda);
    init_matrix(&mut rng, &mut hb, rows, cols, ldb);
    let mut hc = hb.clone();
    // empty shapes still need non-null buffers
    let dc = DeviceVector::<T>::new(matrix_len(ldd, cols).max(1))?;

    let (rows_i, cols_i, es_i) = (int::<I>(rows)?, int::<I>(cols)?, int::<I>(es)?);
    let (lda_i, ldb_i, ldd_i) = (int::<I>(lda)?, int::<I>(ldb)?, int::<I>(ldd)?);
    let round_trip = |hb: &mut HostVector<T>| -> CaseResult {
        unsafe {
            set_matrix_async::<I>(
                rows_i,
                cols_i,
                es_i,
                ha.as_ptr().cast(),
                lda_i,
                dc.as_mut_ptr().cast(),
                ldd_i,
                &stream,
            )?;
            get_matrix_async::<I>(
                rows_i,
                cols_i,
                es_i,
                dc.as_ptr().cast(),
                ldd_i,
                hb.as_mut_ptr().cast(),
                ldb_i,
                &stream,
            )?;
        }
        stream.synchronize()?;
        Ok(None)
    };

    let mut timing = Timing::default();
    if arg.unit_check || arg.norm_check {
        round_trip(&mut hb)?;

        let start = time_us_no_sync();
        for j in 0..cols as usize {
            for i in 0..rows as usize {
                hc[i + j * ldb as usize] = ha[i + j * lda as usize];
            }
        }
        timing.cpu_us = time_us_no_sync() - start;

        if arg.unit_check {
            unit_check_general(rows, cols, ldb, &hc, &hb)?;
        }
        if arg.norm_check {
            timing.error_host = Some(norm_error(rows, cols, ldb, &hc, &hb)[0]);
        }
    }

    if !arg.timing {
        return Ok(None);
    }
    for _ in 0..arg.cold_iters {
        round_trip(&mut hb)?;
    }
    let start = time_us_sync(&stream)?;
    for _ in 0..arg.iters {
        round_trip(&mut hb)?;
    }
    timing.gpu_us = (time_us_sync(&stream)? - start) / arg.iters.max(1) as f64;
    timing.gbyte = set_get_matrix_gbyte_count(rows, cols, es);
    Ok(Some(ArgumentModel(SET_GET_FIELDS).log_args(arg, T::IS_COMPLEX, &timing)))
}
