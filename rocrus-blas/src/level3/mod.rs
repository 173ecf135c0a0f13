//! Level-3 routines.

pub mod trtri;

pub use trtri::{trtri, trtri_batched, trtri_strided_batched, trtri_temp_size};
