// Templates mirror the library signatures; argument counts are inherent.
#![allow(clippy::too_many_arguments, clippy::needless_range_loop)]

//! # rocrus clients
//!
//! Correctness and timing harness for `rocrus-blas`. A case is one
//! [`Arguments`] table; [`run_case`] picks the template for its function,
//! precision and API, fills host data, runs the routine in both pointer
//! modes, compares against the host reference in [`reference`] and, when
//! asked, times it.
//!
//! Cases come from YAML tables (see `data/`) or the `rocrus-bench` command
//! line.

pub mod argument_model;
pub mod arguments;
pub mod buffers;
pub mod check;
pub mod flops;
pub mod init;
pub mod reference;
pub mod testing;
pub mod timing;

pub use arguments::{Api, Arguments};
pub use testing::{run_case, CaseResult, FUNCTIONS};
