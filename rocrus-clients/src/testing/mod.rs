//! Test templates: run a routine on the library, check it against the host
//! reference in both pointer modes, and optionally time it.
//!
//! Every routine also has a `_bad_arg` template feeding it the invalid
//! arguments it must reject.

use crate::arguments::{Api, Arguments};
use crate::buffers::{DeviceVector, HostVector};
use crate::timing::time_us_sync;
use anyhow::{anyhow, bail, ensure, Result};
use rocrus_core::{bf16, f16, status_of, ApiInt, BlasResult, Complex32, Complex64, Handle, Scalar, Status};

mod auxiliary;
mod level1;
mod level2;
mod level3;

pub use auxiliary::{testing_set_get_matrix_async, testing_set_get_matrix_async_bad_arg};
pub use level1::{
    testing_dot, testing_dot_bad_arg, testing_dotc, testing_dotc_bad_arg, testing_nrm2,
    testing_nrm2_bad_arg,
};
pub use level2::{
    testing_hbmv_batched, testing_hbmv_batched_bad_arg, testing_her2_strided_batched,
    testing_her2_strided_batched_bad_arg, testing_hpmv_strided_batched,
    testing_hpmv_strided_batched_bad_arg, testing_spr2_batched, testing_spr2_batched_bad_arg,
    testing_tpsv_batched, testing_tpsv_batched_bad_arg,
};
pub use level3::{
    testing_trtri_batched, testing_trtri_batched_bad_arg, testing_trtri_strided_batched,
    testing_trtri_strided_batched_bad_arg,
};

/// Timing line of a case, when timing was requested.
pub type CaseResult = Result<Option<String>>;

/// Integer flavour the templates are instantiated with.
pub trait CaseInt: ApiInt + TryFrom<i64> {}

impl CaseInt for i32 {}
impl CaseInt for i64 {}

/// Narrows a case argument to the integer type of the API under test.
pub fn int<I: CaseInt>(v: i64) -> Result<I> {
    I::try_from(v).map_err(|_| anyhow!("{v} does not fit the 32-bit API"))
}

/// Fails unless `r` carries `expected`.
pub fn expect_status(r: BlasResult, expected: Status, what: &str) -> Result<()> {
    let got = status_of(r);
    ensure!(got == expected, "{what}: expected {expected:?}, got {got:?}");
    Ok(())
}

/// Host and device copies of the scalars a case passes by pointer.
pub struct Scalars<T> {
    host: HostVector<T>,
    device: DeviceVector<T>,
}

impl<T: Scalar> Scalars<T> {
    pub fn new(values: &[T]) -> Result<Self> {
        let host = HostVector::from_vec(values.to_vec());
        let device = DeviceVector::new(values.len())?;
        device.transfer_from(&host)?;
        Ok(Scalars { host, device })
    }

    /// Pointer to scalar `i` as `mode` expects it.
    pub fn ptr(&self, i: usize, mode: rocrus_core::PointerMode) -> *const T {
        match mode {
            rocrus_core::PointerMode::Host => self.host[i..].as_ptr(),
            rocrus_core::PointerMode::Device => self.device.as_ptr().wrapping_add(i),
        }
    }
}

/// Pointer modes enabled for a case.
pub fn pointer_modes(arg: &Arguments) -> Vec<rocrus_core::PointerMode> {
    let mut modes = Vec::with_capacity(2);
    if arg.pointer_mode_host {
        modes.push(rocrus_core::PointerMode::Host);
    }
    if arg.pointer_mode_device {
        modes.push(rocrus_core::PointerMode::Device);
    }
    modes
}

/// Mean microseconds of `arg.iters` hot calls after `arg.cold_iters` cold
/// ones.
pub fn time_calls<F>(handle: &Handle, arg: &Arguments, mut call: F) -> Result<f64>
where
    F: FnMut() -> BlasResult,
{
    for _ in 0..arg.cold_iters {
        call()?;
    }
    let start = time_us_sync(handle.stream())?;
    for _ in 0..arg.iters {
        call()?;
    }
    let end = time_us_sync(handle.stream())?;
    Ok((end - start) / arg.iters.max(1) as f64)
}

macro_rules! by_api {
    ($arg:expr, $f:ident :: <$t:ty>) => {
        match $arg.api {
            Api::C => $f::<i32, $t>($arg),
            Api::C64 => $f::<i64, $t>($arg),
        }
    };
}

macro_rules! by_precision {
    ($arg:expr, $f:ident, [$($p:literal => $t:ty),+ $(,)?]) => {
        match $arg.precision.as_str() {
            $($p => by_api!($arg, $f::<$t>),)+
            p => bail!("{} does not support precision {p}", $arg.function),
        }
    };
}

macro_rules! by_precision_32 {
    ($arg:expr, $f:ident, [$($p:literal => $t:ty),+ $(,)?]) => {{
        ensure!($arg.api == Api::C, "{} has no 64-bit API", $arg.function);
        match $arg.precision.as_str() {
            $($p => $f::<$t>($arg),)+
            p => bail!("{} does not support precision {p}", $arg.function),
        }
    }};
}

/// Runs the template `arg.function` names, `_bad_arg` suffix included.
pub fn run_case(arg: &Arguments) -> CaseResult {
    match arg.function.as_str() {
        "nrm2" => by_precision!(arg, testing_nrm2, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "nrm2_bad_arg" => by_precision!(arg, testing_nrm2_bad_arg, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "dot" => by_precision!(arg, testing_dot, [
            "f32_r" => f32, "f64_r" => f64, "f16_r" => f16, "bf16_r" => bf16,
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "dot_bad_arg" => by_precision!(arg, testing_dot_bad_arg, [
            "f32_r" => f32, "f64_r" => f64, "f16_r" => f16, "bf16_r" => bf16,
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "dotc" => by_precision!(arg, testing_dotc, [
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "dotc_bad_arg" => by_precision!(arg, testing_dotc_bad_arg, [
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "spr2_batched" => by_precision!(arg, testing_spr2_batched, [
            "f32_r" => f32, "f64_r" => f64,
        ]),
        "spr2_batched_bad_arg" => by_precision!(arg, testing_spr2_batched_bad_arg, [
            "f32_r" => f32, "f64_r" => f64,
        ]),
        "her2_strided_batched" => by_precision!(arg, testing_her2_strided_batched, [
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "her2_strided_batched_bad_arg" => by_precision!(arg, testing_her2_strided_batched_bad_arg, [
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "hbmv_batched" => by_precision!(arg, testing_hbmv_batched, [
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "hbmv_batched_bad_arg" => by_precision!(arg, testing_hbmv_batched_bad_arg, [
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "hpmv_strided_batched" => by_precision!(arg, testing_hpmv_strided_batched, [
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "hpmv_strided_batched_bad_arg" => by_precision!(arg, testing_hpmv_strided_batched_bad_arg, [
            "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "tpsv_batched" => by_precision!(arg, testing_tpsv_batched, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "tpsv_batched_bad_arg" => by_precision!(arg, testing_tpsv_batched_bad_arg, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "trtri_batched" => by_precision_32!(arg, testing_trtri_batched, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "trtri_batched_bad_arg" => by_precision_32!(arg, testing_trtri_batched_bad_arg, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "trtri_strided_batched" => by_precision_32!(arg, testing_trtri_strided_batched, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "trtri_strided_batched_bad_arg" => by_precision_32!(arg, testing_trtri_strided_batched_bad_arg, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "set_get_matrix_async" => by_precision!(arg, testing_set_get_matrix_async, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        "set_get_matrix_async_bad_arg" => by_precision!(arg, testing_set_get_matrix_async_bad_arg, [
            "f32_r" => f32, "f64_r" => f64, "f32_c" => Complex32, "f64_c" => Complex64,
        ]),
        other => bail!("unknown function `{other}`"),
    }
}

/// Names [`run_case`] accepts, without the `_bad_arg` forms.
pub const FUNCTIONS: &[&str] = &[
    "nrm2",
    "dot",
    "dotc",
    "spr2_batched",
    "her2_strided_batched",
    "hbmv_batched",
    "hpmv_strided_batched",
    "tpsv_batched",
    "trtri_batched",
    "trtri_strided_batched",
    "set_get_matrix_async",
];
