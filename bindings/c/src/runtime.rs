//! Emulated device runtime: memory and streams.

use crate::{guard, rocrus_stream};
use rocrus_core::device::{self, MemcpyKind};
use rocrus_core::{Error, Status, Stream};
use std::ffi::c_void;
use std::sync::Arc;

#[no_mangle]
pub unsafe extern "C" fn rocrus_device_malloc(ptr: *mut *mut c_void, bytes: usize) -> Status {
    guard(|| {
        if ptr.is_null() {
            return Err(Error::InvalidPointer("ptr"));
        }
        ptr.write(device::malloc(bytes)?.cast());
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_device_free(ptr: *mut c_void) -> Status {
    guard(|| {
        device::free(ptr.cast())?;
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_device_memcpy(
    dst: *mut c_void,
    src: *const c_void,
    bytes: usize,
    kind: u32,
) -> Status {
    guard(|| {
        device::memcpy(dst.cast(), src.cast(), bytes, MemcpyKind::try_from(kind)?)?;
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_device_memset(dst: *mut c_void, value: i32, bytes: usize) -> Status {
    guard(|| {
        device::memset(dst.cast(), value as u8, bytes)?;
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_stream_create(stream: *mut rocrus_stream) -> Status {
    guard(|| {
        if stream.is_null() {
            return Err(Error::InvalidPointer("stream"));
        }
        stream.write(Arc::into_raw(Arc::new(Stream::new()?)));
        Ok(Status::Success)
    })
}

/// Releases the reference from `rocrus_stream_create`; handles still using
/// the stream keep it alive.
#[no_mangle]
pub unsafe extern "C" fn rocrus_stream_destroy(stream: rocrus_stream) -> Status {
    guard(|| {
        if stream.is_null() {
            return Err(Error::InvalidPointer("stream"));
        }
        drop(Arc::from_raw(stream));
        Ok(Status::Success)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rocrus_stream_synchronize(stream: rocrus_stream) -> Status {
    guard(|| {
        let s = stream.as_ref().ok_or(Error::InvalidPointer("stream"))?;
        s.synchronize()?;
        Ok(Status::Success)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::create;
    use crate::{rocrus_destroy_handle, rocrus_get_stream, rocrus_set_stream};

    #[test]
    fn test_device_memory_round_trip() {
        unsafe {
            let mut d: *mut c_void = std::ptr::null_mut();
            assert_eq!(rocrus_device_malloc(&mut d, 16), Status::Success);
            assert!(device::is_device_pointer(d.cast()));
            let src = [1u8; 16];
            let mut back = [0u8; 16];
            assert_eq!(rocrus_device_memcpy(d, src.as_ptr().cast(), 16, 1), Status::Success);
            assert_eq!(rocrus_device_memset(d, 3, 8), Status::Success);
            assert_eq!(rocrus_device_memcpy(back.as_mut_ptr().cast(), d, 16, 2), Status::Success);
            assert_eq!(&back[..8], &[3u8; 8]);
            assert_eq!(&back[8..], &[1u8; 8]);
            assert_eq!(rocrus_device_memcpy(d, src.as_ptr().cast(), 16, 9), Status::InvalidValue);
            assert_eq!(rocrus_device_free(d), Status::Success);
            assert_eq!(rocrus_device_free(d), Status::InvalidPointer);
        }
    }

    #[test]
    fn test_handle_keeps_stream_alive() {
        let h = create();
        unsafe {
            let mut s: rocrus_stream = std::ptr::null();
            assert_eq!(rocrus_stream_create(&mut s), Status::Success);
            assert_eq!(rocrus_set_stream(h, s), Status::Success);
            let mut current: rocrus_stream = std::ptr::null();
            assert_eq!(rocrus_get_stream(h, &mut current), Status::Success);
            assert_eq!(current, s);
            assert_eq!(rocrus_stream_destroy(s), Status::Success);
            assert_eq!(rocrus_stream_synchronize(current), Status::Success);
            assert_eq!(rocrus_set_stream(h, std::ptr::null()), Status::Success);
            assert_eq!(rocrus_destroy_handle(h), Status::Success);
        }
    }
}
