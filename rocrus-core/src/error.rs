//! Library error type.
//!
//! Every [`Error`] maps onto exactly one non-success [`Status`]; the C layer
//! only ever sees the status, Rust callers get the context.

use crate::numerics::NumericsReport;
use crate::status::Status;

/// Failure of a library call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("handle is null or invalid")]
    InvalidHandle,

    #[error("null pointer passed for `{0}`")]
    InvalidPointer(&'static str),

    #[error("invalid size: {0}")]
    InvalidSize(String),

    #[error("invalid value for `{0}`")]
    InvalidValue(&'static str),

    #[error("device memory allocation of {requested} bytes failed (limit {limit} bytes)")]
    MemoryError { requested: usize, limit: usize },

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("device memory size query {0}")]
    SizeQueryMismatch(&'static str),

    #[error("numerics check failed in {routine}: {report}")]
    CheckNumerics {
        routine: String,
        report: NumericsReport,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Status code reported to C callers.
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidHandle => Status::InvalidHandle,
            Error::InvalidPointer(_) => Status::InvalidPointer,
            Error::InvalidSize(_) => Status::InvalidSize,
            Error::InvalidValue(_) => Status::InvalidValue,
            Error::MemoryError { .. } => Status::MemoryError,
            Error::NotImplemented(_) => Status::NotImplemented,
            Error::SizeQueryMismatch(_) => Status::SizeQueryMismatch,
            Error::CheckNumerics { .. } => Status::CheckNumericsFail,
            Error::Internal(_) => Status::InternalError,
        }
    }

    /// `InvalidSize` describing the offending sizes, e.g.
    /// `Error::size(format_args!("n = {n}"))`.
    pub fn size(what: impl std::fmt::Display) -> Self {
        Error::InvalidSize(what.to_string())
    }
}

impl From<Error> for Status {
    fn from(e: Error) -> Self {
        e.status()
    }
}

impl From<&Error> for Status {
    fn from(e: &Error) -> Self {
        e.status()
    }
}

/// Outcome of a routine: `Ok` carries success or a size-query answer.
pub type BlasResult<T = Status> = Result<T, Error>;

/// Flattens a routine result into the status a C caller sees.
#[inline]
pub fn status_of(r: BlasResult) -> Status {
    match r {
        Ok(s) => s,
        Err(e) => e.status(),
    }
}

/// What argument checking decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgCheck {
    /// Arguments are valid and there is work to do.
    Continue,
    /// Arguments are valid and the call is a no-op.
    QuickReturn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(Status::from(Error::InvalidHandle), Status::InvalidHandle);
        assert_eq!(Status::from(Error::InvalidPointer("x")), Status::InvalidPointer);
        assert_eq!(Status::from(Error::size("n < 0")), Status::InvalidSize);
        assert_eq!(
            Status::from(Error::MemoryError { requested: 10, limit: 0 }),
            Status::MemoryError
        );
        assert_eq!(
            status_of(Err(Error::InvalidValue("uplo"))),
            Status::InvalidValue
        );
        assert_eq!(status_of(Ok(Status::SizeUnchanged)), Status::SizeUnchanged);
    }

    #[test]
    fn test_error_messages_name_the_argument() {
        let msg = Error::InvalidPointer("alpha").to_string();
        assert!(msg.contains("alpha"));
        let n = -3;
        let msg = Error::size(format_args!("n = {n}")).to_string();
        assert!(msg.contains("n = -3"));
    }
}
