// Routine plumbing mirrors C signatures; argument counts are inherent.
#![allow(clippy::too_many_arguments)]

//! # rocrus core
//!
//! Shared plumbing for the rocrus BLAS library:
//! - **Status and errors**: ABI status codes and the [`Error`] they come from.
//! - **Types**: fill/operation/diagonal enums, handle modes, routine names,
//!   scalar traits over real, complex and half types.
//! - **Handle**: pointer mode, layer logging, numerics checking, stream and
//!   the device workspace with its size-query protocol.
//! - **Emulated device**: aligned device allocations, copies and in-order
//!   streams; kernels run on the host thread pool.
//! - **64-bit support**: chunk iterators and per-batch operand addressing
//!   used by the `_64` launchers.

pub mod batch;
pub mod config;
pub mod device;
pub mod error;
pub mod handle;
pub mod int64;
pub mod launch;
pub mod logging;
pub mod numerics;
pub mod scalar;
pub mod status;
pub mod stream;
pub mod types;

pub use batch::{BatchDst, BatchSrc, Batched, ResultPtr, ScalarArg, Strided};
pub use config::RuntimeConfig;
pub use error::{status_of, ArgCheck, BlasResult, Error};
pub use handle::{Handle, WorkspaceGuard};
pub use scalar::{Accumulate, RealScalar, Scalar};
pub use status::Status;
pub use stream::Stream;
pub use types::{
    ApiInt, CheckNumericsMode, Diagonal, Fill, LayerMode, Operation, PointerMode, RoutineName,
    Side, Stride, Variant,
};

pub use half::{bf16, f16};
pub use num_complex::{Complex32, Complex64};
