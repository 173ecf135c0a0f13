// Routine signatures mirror the C API; argument counts are inherent.
// Kernels index strided and packed storage where iterators hurt readability.
#![allow(clippy::too_many_arguments, clippy::needless_range_loop)]

//! # rocrus BLAS
//!
//! Batched BLAS routines on the emulated device of `rocrus-core`.
//!
//! Every routine follows one shape: answer a workspace size query, log the
//! call, validate arguments, check input numerics, take workspace, launch
//! the 32-bit or 64-bit kernel, then check output numerics. Each comes in
//! plain, `_batched` (array of per-batch pointers) and `_strided_batched`
//! forms, generic over the API integer (`i32` or `i64` for `_64`) and the
//! element type.
//!
//! - **Level 1**: `nrm2`, `dot`, `dotc`
//! - **Level 2**: `spr2`, `her2`, `hbmv`, `hpmv`, `tpsv`
//! - **Level 3**: `trtri`
//! - **Auxiliary**: `set/get_vector`, `set/get_matrix` and their `_async` forms
//!
//! ```
//! use rocrus_blas::level1;
//! use rocrus_core::Handle;
//!
//! let handle = Handle::new().unwrap();
//! let x = [3.0f32, 4.0];
//! let mut norm = 0.0f32;
//! unsafe { level1::nrm2::<i32, f32>(&handle, 2, x.as_ptr(), 1, &mut norm) }.unwrap();
//! assert_eq!(norm, 5.0);
//! ```

pub mod auxiliary;
pub mod level1;
pub mod level2;
pub mod level3;

pub use rocrus_core::{
    BlasResult, Diagonal, Error, Fill, Handle, Operation, PointerMode, Status, Stride,
};
