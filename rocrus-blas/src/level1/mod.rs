//! Level-1 reductions.

pub mod dot;
pub mod nrm2;
pub(crate) mod reduction;

pub use dot::{dot, dot_batched, dot_strided_batched, dotc, dotc_batched, dotc_strided_batched};
pub use nrm2::{nrm2, nrm2_batched, nrm2_strided_batched};
