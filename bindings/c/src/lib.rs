// C signatures fix the argument lists.
#![allow(clippy::too_many_arguments, clippy::missing_safety_doc, non_camel_case_types)]

//! C ABI of rocrus.
//!
//! Every export returns a [`Status`] and never unwinds: panics are caught
//! and reported as `rocrus_status_internal_error`. Enum arguments arrive as
//! `u32`; handle modes are validated on entry, while the triangle enums of a
//! routine are rejected by the routine itself. `include/rocrus.h` declares
//! the surface.

mod auxiliary;
mod level1;
mod level2;
mod level3;
mod runtime;

use rocrus_core::{
    status_of, BlasResult, CheckNumericsMode, Diagonal, Error, Fill, Handle, LayerMode, Operation,
    PointerMode, Status, Stream,
};
use std::ffi::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub use rocrus_core::{bf16, f16, Complex32, Complex64};

pub type rocrus_int = i32;
pub type rocrus_stride = i64;
pub type rocrus_handle = *mut Handle;
/// Owned reference to a stream; see `rocrus_stream_create`.
pub type rocrus_stream = *const Stream;

/// Runs `f`, mapping its outcome and any panic onto a status code.
pub(crate) fn guard<F>(f: F) -> Status
where
    F: FnOnce() -> BlasResult,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => {
            if let Err(e) = &r {
                tracing::debug!(error = %e, "call failed");
            }
            status_of(r)
        }
        Err(_) => {
            tracing::error!("panic caught at the C boundary");
            Status::InternalError
        }
    }
}

/// Decodes the `uplo`, `trans` and `diag` of a triangular routine.
///
/// An unknown value in any of them reaches the routine as `Fill::Full`. The
/// routine answers a size query and logs the call before its `uplo` check
/// turns that into `InvalidValue`.
pub(crate) fn triangle(uplo: u32, trans: u32, diag: u32) -> (Fill, Operation, Diagonal) {
    match (Fill::try_from(uplo), Operation::try_from(trans), Diagonal::try_from(diag)) {
        (Ok(uplo), Ok(trans), Ok(diag)) => (uplo, trans, diag),
        _ => (Fill::Full, Operation::None, Diagonal::NonUnit),
    }
}

/// Borrows the handle behind a C pointer.
pub(crate) unsafe fn handle_ref<'a>(handle: rocrus_handle) -> Result<&'a Handle, Error> {
    handle.as_ref().ok_or(Error::InvalidHandle)
}

unsafe fn handle_mut<'a>(handle: rocrus_handle) -> Result<&'a mut Handle, Error> {
    handle.as_mut().ok_or(Error::InvalidHandle)
}

/// Writes `value` through an out-pointer.
pub(crate) unsafe fn write_out<T>(out: *mut T, value: T, what: &'static str) -> BlasResult {
    if out.is_null() {
        return Err(Error::InvalidPointer(what));
    }
    out.write(value);
    Ok(Status::Success)
}

// ============================================================================
// Handle
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn rocrus_create_handle(handle: *mut rocrus_handle) -> Status {
    guard(|| {
        if handle.is_null() {
            return Err(Error::InvalidHandle);
        }
        let h = Box::new(Handle::new()?);
        handle.write(Box::into_raw(h));
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_destroy_handle(handle: rocrus_handle) -> Status {
    guard(|| {
        if handle.is_null() {
            return Err(Error::InvalidHandle);
        }
        drop(Box::from_raw(handle));
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_set_pointer_mode(handle: rocrus_handle, mode: u32) -> Status {
    guard(|| {
        let h = handle_mut(handle)?;
        h.set_pointer_mode(PointerMode::try_from(mode)?);
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_get_pointer_mode(handle: rocrus_handle, mode: *mut u32) -> Status {
    guard(|| write_out(mode, handle_ref(handle)?.pointer_mode() as u32, "mode"))
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_set_layer_mode(handle: rocrus_handle, mode: u32) -> Status {
    guard(|| {
        if mode & !0x7 != 0 {
            return Err(Error::InvalidValue("layer_mode"));
        }
        handle_mut(handle)?.set_layer_mode(LayerMode(mode));
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_set_check_numerics(handle: rocrus_handle, mode: u32) -> Status {
    guard(|| {
        if mode & !0xf != 0 {
            return Err(Error::InvalidValue("check_numerics"));
        }
        handle_mut(handle)?.set_check_numerics(CheckNumericsMode(mode));
        Ok(Status::Success)
    })
}

/// Makes `stream` current; null restores the handle's own stream. The
/// handle keeps its own reference.
#[no_mangle]
pub unsafe extern "C" fn rocrus_set_stream(handle: rocrus_handle, stream: rocrus_stream) -> Status {
    guard(|| {
        let h = handle_mut(handle)?;
        let stream = if stream.is_null() {
            None
        } else {
            Arc::increment_strong_count(stream);
            Some(Arc::from_raw(stream))
        };
        h.set_stream(stream)?;
        Ok(Status::Success)
    })
}

/// Current stream, borrowed: it must not be passed to
/// `rocrus_stream_destroy` unless it came from `rocrus_stream_create`.
#[no_mangle]
pub unsafe extern "C" fn rocrus_get_stream(handle: rocrus_handle, stream: *mut rocrus_stream) -> Status {
    guard(|| write_out(stream, Arc::as_ptr(handle_ref(handle)?.stream()), "stream"))
}

// ============================================================================
// Device memory
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn rocrus_start_device_memory_size_query(handle: rocrus_handle) -> Status {
    guard(|| {
        handle_ref(handle)?.start_device_memory_size_query()?;
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_stop_device_memory_size_query(
    handle: rocrus_handle,
    size: *mut usize,
) -> Status {
    guard(|| {
        let h = handle_ref(handle)?;
        if size.is_null() {
            return Err(Error::InvalidPointer("size"));
        }
        write_out(size, h.stop_device_memory_size_query()?, "size")
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_is_device_memory_size_query(handle: rocrus_handle) -> bool {
    handle_ref(handle).is_ok_and(Handle::is_device_memory_size_query)
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_set_device_memory_size(handle: rocrus_handle, size: usize) -> Status {
    guard(|| {
        handle_ref(handle)?.set_device_memory_size(size)?;
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_get_device_memory_size(handle: rocrus_handle, size: *mut usize) -> Status {
    guard(|| write_out(size, handle_ref(handle)?.get_device_memory_size(), "size"))
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_is_managing_device_memory(handle: rocrus_handle) -> bool {
    handle_ref(handle).is_ok_and(Handle::is_managing_device_memory)
}

/// Name of a status code; unknown codes map to `"invalid status"`.
#[no_mangle]
pub extern "C" fn rocrus_status_to_string(status: u32) -> *const c_char {
    match Status::from_raw(status) {
        Some(s) => s.as_c_str().as_ptr(),
        None => c"invalid status".as_ptr(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    pub(crate) fn create() -> rocrus_handle {
        let mut h = std::ptr::null_mut();
        assert_eq!(unsafe { rocrus_create_handle(&mut h) }, Status::Success);
        h
    }

    #[test]
    fn test_handle_lifecycle_and_modes() {
        let h = create();
        unsafe {
            assert_eq!(rocrus_set_pointer_mode(h, 1), Status::Success);
            let mut mode = 0u32;
            assert_eq!(rocrus_get_pointer_mode(h, &mut mode), Status::Success);
            assert_eq!(mode, 1);
            assert_eq!(rocrus_set_pointer_mode(h, 7), Status::InvalidValue);
            assert_eq!(rocrus_set_layer_mode(h, 8), Status::InvalidValue);
            assert_eq!(rocrus_set_check_numerics(h, 4), Status::Success);
            assert_eq!(rocrus_destroy_handle(h), Status::Success);
        }
    }

    #[test]
    fn test_null_handle_is_rejected() {
        unsafe {
            assert_eq!(rocrus_set_pointer_mode(std::ptr::null_mut(), 0), Status::InvalidHandle);
            assert_eq!(rocrus_destroy_handle(std::ptr::null_mut()), Status::InvalidHandle);
            assert!(!rocrus_is_managing_device_memory(std::ptr::null_mut()));
        }
    }

    #[test]
    fn test_size_query_protocol() {
        let h = create();
        unsafe {
            let mut size = 0usize;
            assert_eq!(rocrus_stop_device_memory_size_query(h, &mut size), Status::SizeQueryMismatch);
            assert_eq!(rocrus_start_device_memory_size_query(h), Status::Success);
            assert!(rocrus_is_device_memory_size_query(h));
            assert_eq!(rocrus_start_device_memory_size_query(h), Status::SizeQueryMismatch);
            assert_eq!(rocrus_stop_device_memory_size_query(h, &mut size), Status::Success);
            assert_eq!(size, 0);

            assert_eq!(rocrus_set_device_memory_size(h, 100), Status::Success);
            assert!(!rocrus_is_managing_device_memory(h));
            assert_eq!(rocrus_get_device_memory_size(h, &mut size), Status::Success);
            assert_eq!(size, 128);
            rocrus_destroy_handle(h);
        }
    }

    #[test]
    fn test_status_strings() {
        let s = unsafe { CStr::from_ptr(rocrus_status_to_string(Status::InvalidSize as u32)) };
        assert_eq!(s.to_str().unwrap(), "rocrus_status_invalid_size");
        let s = unsafe { CStr::from_ptr(rocrus_status_to_string(99)) };
        assert_eq!(s.to_str().unwrap(), "invalid status");
    }

    #[test]
    fn test_panics_become_internal_errors() {
        let s = guard(|| panic!("boom"));
        assert_eq!(s, Status::InternalError);
    }
}
