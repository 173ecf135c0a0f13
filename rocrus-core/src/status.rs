//! Status codes returned across the C boundary.
//!
//! Discriminants are part of the ABI and never change.

use std::fmt;

/// Result code of every library call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub enum Status {
    /// Call completed.
    #[default]
    Success = 0,
    /// Handle was null or not initialised.
    InvalidHandle = 1,
    /// Function is not implemented.
    NotImplemented = 2,
    /// A required pointer argument was null.
    InvalidPointer = 3,
    /// A size, increment or leading dimension was out of range.
    InvalidSize = 4,
    /// Device memory could not be allocated.
    MemoryError = 5,
    /// Unexpected failure inside the library.
    InternalError = 6,
    /// Completed with degraded performance.
    PerfDegraded = 7,
    /// Device memory size query was started twice or stopped without start.
    SizeQueryMismatch = 8,
    /// Size query raised the required workspace.
    SizeIncreased = 9,
    /// Size query left the required workspace as it was.
    SizeUnchanged = 10,
    /// An enum argument had an unsupported value.
    InvalidValue = 11,
    /// Internal: argument checks passed and work should proceed.
    Continue = 12,
    /// NaN or Inf found while checking numerics in fail mode.
    CheckNumericsFail = 13,
    /// Function was excluded from this build.
    ExcludedFromBuild = 14,
    /// Device architecture does not match the build.
    ArchMismatch = 15,
}

impl Status {
    /// All statuses in discriminant order.
    pub const ALL: [Status; 16] = [
        Status::Success,
        Status::InvalidHandle,
        Status::NotImplemented,
        Status::InvalidPointer,
        Status::InvalidSize,
        Status::MemoryError,
        Status::InternalError,
        Status::PerfDegraded,
        Status::SizeQueryMismatch,
        Status::SizeIncreased,
        Status::SizeUnchanged,
        Status::InvalidValue,
        Status::Continue,
        Status::CheckNumericsFail,
        Status::ExcludedFromBuild,
        Status::ArchMismatch,
    ];

    /// Stable, NUL-free name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "rocrus_status_success",
            Status::InvalidHandle => "rocrus_status_invalid_handle",
            Status::NotImplemented => "rocrus_status_not_implemented",
            Status::InvalidPointer => "rocrus_status_invalid_pointer",
            Status::InvalidSize => "rocrus_status_invalid_size",
            Status::MemoryError => "rocrus_status_memory_error",
            Status::InternalError => "rocrus_status_internal_error",
            Status::PerfDegraded => "rocrus_status_perf_degraded",
            Status::SizeQueryMismatch => "rocrus_status_size_query_mismatch",
            Status::SizeIncreased => "rocrus_status_size_increased",
            Status::SizeUnchanged => "rocrus_status_size_unchanged",
            Status::InvalidValue => "rocrus_status_invalid_value",
            Status::Continue => "rocrus_status_continue",
            Status::CheckNumericsFail => "rocrus_status_check_numerics_fail",
            Status::ExcludedFromBuild => "rocrus_status_excluded_from_build",
            Status::ArchMismatch => "rocrus_status_arch_mismatch",
        }
    }

    /// Same name as [`Status::as_str`], NUL-terminated for C callers.
    pub fn as_c_str(self) -> &'static std::ffi::CStr {
        macro_rules! c {
            ($s:literal) => {
                match std::ffi::CStr::from_bytes_with_nul(concat!($s, "\0").as_bytes()) {
                    Ok(s) => s,
                    Err(_) => unreachable!(),
                }
            };
        }
        match self {
            Status::Success => c!("rocrus_status_success"),
            Status::InvalidHandle => c!("rocrus_status_invalid_handle"),
            Status::NotImplemented => c!("rocrus_status_not_implemented"),
            Status::InvalidPointer => c!("rocrus_status_invalid_pointer"),
            Status::InvalidSize => c!("rocrus_status_invalid_size"),
            Status::MemoryError => c!("rocrus_status_memory_error"),
            Status::InternalError => c!("rocrus_status_internal_error"),
            Status::PerfDegraded => c!("rocrus_status_perf_degraded"),
            Status::SizeQueryMismatch => c!("rocrus_status_size_query_mismatch"),
            Status::SizeIncreased => c!("rocrus_status_size_increased"),
            Status::SizeUnchanged => c!("rocrus_status_size_unchanged"),
            Status::InvalidValue => c!("rocrus_status_invalid_value"),
            Status::Continue => c!("rocrus_status_continue"),
            Status::CheckNumericsFail => c!("rocrus_status_check_numerics_fail"),
            Status::ExcludedFromBuild => c!("rocrus_status_excluded_from_build"),
            Status::ArchMismatch => c!("rocrus_status_arch_mismatch"),
        }
    }

    /// Success and the two informational size-query answers.
    #[inline]
    pub fn is_ok(self) -> bool {
        matches!(
            self,
            Status::Success | Status::SizeIncreased | Status::SizeUnchanged
        )
    }

    /// Lookup by raw discriminant.
    pub fn from_raw(raw: u32) -> Option<Status> {
        Status::ALL.get(raw as usize).copied()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants_are_abi() {
        assert_eq!(Status::Success as u32, 0);
        assert_eq!(Status::InvalidPointer as u32, 3);
        assert_eq!(Status::SizeUnchanged as u32, 10);
        assert_eq!(Status::Continue as u32, 12);
        assert_eq!(Status::ArchMismatch as u32, 15);
        for (i, s) in Status::ALL.iter().enumerate() {
            assert_eq!(*s as usize, i);
            assert_eq!(Status::from_raw(i as u32), Some(*s));
        }
        assert_eq!(Status::from_raw(16), None);
    }

    #[test]
    fn test_c_names_match() {
        for s in Status::ALL {
            assert_eq!(s.as_c_str().to_str().unwrap(), s.as_str());
        }
    }

    #[test]
    fn test_is_ok() {
        assert!(Status::Success.is_ok());
        assert!(Status::SizeUnchanged.is_ok());
        assert!(!Status::Continue.is_ok());
        assert!(!Status::InvalidSize.is_ok());
    }
}
