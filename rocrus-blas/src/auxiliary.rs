//! Host/device transfers of vectors and column-major matrices.
//!
//! These calls take no handle; trace logging follows the process-wide
//! [`RuntimeConfig`]. Element types are opaque: only `elem_size` bytes per
//! element are moved.

use rocrus_core::device::{memcpy, memcpy_2d, MemcpyKind};
use rocrus_core::logging::{emit_trace, trace_line, Arg};
use rocrus_core::{ApiInt, BlasResult, Error, LayerMode, RoutineName, RuntimeConfig, Status, Stream, Variant};
use std::sync::Arc;

macro_rules! trace_aux {
    ($name:expr $(, $arg:expr)* $(,)?) => {
        if RuntimeConfig::global().layer_mode.contains(LayerMode::LOG_TRACE) {
            emit_trace(&trace_line(&$name, &[$(Arg(&$arg)),*]));
        }
    };
}

fn name<I: ApiInt>(base: &'static str) -> RoutineName {
    RoutineName::new::<I>("", base, Variant::Single)
}

/// Addresses of one copy, moved to a stream worker.
#[derive(Clone, Copy)]
struct Transfer {
    src: usize,
    dst: usize,
}

impl Transfer {
    fn new(src: *const u8, dst: *mut u8) -> Self {
        Transfer {
            src: src as usize,
            dst: dst as usize,
        }
    }
}

// ============================================================================
// Vectors
// ============================================================================

fn check_vector_args(
    n: i64,
    elem_size: i64,
    x: *const u8,
    incx: i64,
    y: *const u8,
    incy: i64,
) -> Result<bool, Error> {
    if n < 0 || elem_size <= 0 || incx <= 0 || incy <= 0 {
        return Err(Error::size(format_args!(
            "n = {n}, elem_size = {elem_size}, incx = {incx}, incy = {incy}"
        )));
    }
    if x.is_null() {
        return Err(Error::InvalidPointer("x"));
    }
    if y.is_null() {
        return Err(Error::InvalidPointer("y"));
    }
    Ok(n > 0)
}

unsafe fn copy_vector(
    n: i64,
    elem_size: i64,
    t: Transfer,
    incx: i64,
    incy: i64,
    kind: MemcpyKind,
) -> Result<(), Error> {
    let (src, dst) = (t.src as *const u8, t.dst as *mut u8);
    let es = elem_size as usize;
    if incx == 1 && incy == 1 {
        return memcpy(dst, src, n as usize * es, kind);
    }
    for i in 0..n as usize {
        memcpy(
            dst.add(i * incy as usize * es),
            src.add(i * incx as usize * es),
            es,
            kind,
        )?;
    }
    Ok(())
}

unsafe fn vector_transfer<I: ApiInt>(
    base: &'static str,
    kind: MemcpyKind,
    n: I,
    elem_size: I,
    x: *const u8,
    incx: I,
    y: *mut u8,
    incy: I,
    stream: Option<&Arc<Stream>>,
) -> BlasResult {
    let (n, es, incx, incy) = (n.as_i64(), elem_size.as_i64(), incx.as_i64(), incy.as_i64());
    trace_aux!(name::<I>(base), n, es, x, incx, y, incy);
    if !check_vector_args(n, es, x, incx, y, incy)? {
        return Ok(Status::Success);
    }
    let t = Transfer::new(x, y);
    match stream {
        None => copy_vector(n, es, t, incx, incy, kind)?,
        Some(s) => s.submit(move || {
            // SAFETY: the caller keeps both buffers alive until the stream
            // is synchronized.
            if let Err(e) = unsafe { copy_vector(n, es, t, incx, incy, kind) } {
                tracing::error!(error = %e, "asynchronous vector copy failed");
            }
        })?,
    }
    Ok(Status::Success)
}

/// Copies `n` elements of `elem_size` bytes from host vector `x` to device
/// vector `y`.
///
/// # Safety
/// `x` must be readable and `y` writable at every strided element.
pub unsafe fn set_vector<I: ApiInt>(
    n: I,
    elem_size: I,
    x: *const u8,
    incx: I,
    y: *mut u8,
    incy: I,
) -> BlasResult {
    vector_transfer("set_vector", MemcpyKind::HostToDevice, n, elem_size, x, incx, y, incy, None)
}

/// Copies device vector `x` to host vector `y`.
///
/// # Safety
/// As [`set_vector`].
pub unsafe fn get_vector<I: ApiInt>(
    n: I,
    elem_size: I,
    x: *const u8,
    incx: I,
    y: *mut u8,
    incy: I,
) -> BlasResult {
    vector_transfer("get_vector", MemcpyKind::DeviceToHost, n, elem_size, x, incx, y, incy, None)
}

/// [`set_vector`] queued on `stream`; returns once the copy is submitted.
///
/// # Safety
/// As [`set_vector`], with both buffers kept alive until `stream` is
/// synchronized.
pub unsafe fn set_vector_async<I: ApiInt>(
    n: I,
    elem_size: I,
    x: *const u8,
    incx: I,
    y: *mut u8,
    incy: I,
    stream: &Arc<Stream>,
) -> BlasResult {
    vector_transfer(
        "set_vector_async",
        MemcpyKind::HostToDevice,
        n,
        elem_size,
        x,
        incx,
        y,
        incy,
        Some(stream),
    )
}

/// [`get_vector`] queued on `stream`.
///
/// # Safety
/// As [`set_vector_async`].
pub unsafe fn get_vector_async<I: ApiInt>(
    n: I,
    elem_size: I,
    x: *const u8,
    incx: I,
    y: *mut u8,
    incy: I,
    stream: &Arc<Stream>,
) -> BlasResult {
    vector_transfer(
        "get_vector_async",
        MemcpyKind::DeviceToHost,
        n,
        elem_size,
        x,
        incx,
        y,
        incy,
        Some(stream),
    )
}

// ============================================================================
// Matrices
// ============================================================================

fn check_matrix_args(
    rows: i64,
    cols: i64,
    elem_size: i64,
    a: *const u8,
    lda: i64,
    b: *const u8,
    ldb: i64,
) -> Result<bool, Error> {
    if rows < 0 || cols < 0 || elem_size <= 0 || lda <= 0 || ldb <= 0 || lda < rows || ldb < rows
    {
        return Err(Error::size(format_args!(
            "rows = {rows}, cols = {cols}, elem_size = {elem_size}, lda = {lda}, ldb = {ldb}"
        )));
    }
    if a.is_null() {
        return Err(Error::InvalidPointer("a"));
    }
    if b.is_null() {
        return Err(Error::InvalidPointer("b"));
    }
    Ok(rows > 0 && cols > 0)
}

unsafe fn matrix_transfer<I: ApiInt>(
    base: &'static str,
    kind: MemcpyKind,
    rows: I,
    cols: I,
    elem_size: I,
    a: *const u8,
    lda: I,
    b: *mut u8,
    ldb: I,
    stream: Option<&Arc<Stream>>,
) -> BlasResult {
    let (rows, cols, es) = (rows.as_i64(), cols.as_i64(), elem_size.as_i64());
    let (lda, ldb) = (lda.as_i64(), ldb.as_i64());
    trace_aux!(name::<I>(base), rows, cols, es, a, lda, b, ldb);
    if !check_matrix_args(rows, cols, es, a, lda, b, ldb)? {
        return Ok(Status::Success);
    }
    let t = Transfer::new(a, b);
    let copy = move || unsafe {
        memcpy_2d(
            t.dst as *mut u8,
            ldb as usize,
            t.src as *const u8,
            lda as usize,
            rows as usize,
            cols as usize,
            es as usize,
            kind,
        )
    };
    match stream {
        None => copy()?,
        Some(s) => s.submit(move || {
            if let Err(e) = copy() {
                tracing::error!(error = %e, "asynchronous matrix copy failed");
            }
        })?,
    }
    Ok(Status::Success)
}

/// Copies a `rows x cols` host matrix `a` into device matrix `b`.
///
/// # Safety
/// `a` must be readable and `b` writable over their column-major extents.
pub unsafe fn set_matrix<I: ApiInt>(
    rows: I,
    cols: I,
    elem_size: I,
    a: *const u8,
    lda: I,
    b: *mut u8,
    ldb: I,
) -> BlasResult {
    matrix_transfer("set_matrix", MemcpyKind::HostToDevice, rows, cols, elem_size, a, lda, b, ldb, None)
}

/// Copies a `rows x cols` device matrix `a` into host matrix `b`.
///
/// # Safety
/// As [`set_matrix`].
pub unsafe fn get_matrix<I: ApiInt>(
    rows: I,
    cols: I,
    elem_size: I,
    a: *const u8,
    lda: I,
    b: *mut u8,
    ldb: I,
) -> BlasResult {
    matrix_transfer("get_matrix", MemcpyKind::DeviceToHost, rows, cols, elem_size, a, lda, b, ldb, None)
}

/// # Safety
/// As [`set_matrix`], with both buffers kept alive until `stream` is
/// synchronized.
pub unsafe fn set_matrix_async<I: ApiInt>(
    rows: I,
    cols: I,
    elem_size: I,
    a: *const u8,
    lda: I,
    b: *mut u8,
    ldb: I,
    stream: &Arc<Stream>,
) -> BlasResult {
    matrix_transfer(
        "set_matrix_async",
        MemcpyKind::HostToDevice,
        rows,
        cols,
        elem_size,
        a,
        lda,
        b,
        ldb,
        Some(stream),
    )
}

/// # Safety
/// As [`set_matrix_async`].
pub unsafe fn get_matrix_async<I: ApiInt>(
    rows: I,
    cols: I,
    elem_size: I,
    a: *const u8,
    lda: I,
    b: *mut u8,
    ldb: I,
    stream: &Arc<Stream>,
) -> BlasResult {
    matrix_transfer(
        "get_matrix_async",
        MemcpyKind::DeviceToHost,
        rows,
        cols,
        elem_size,
        a,
        lda,
        b,
        ldb,
        Some(stream),
    )
}
