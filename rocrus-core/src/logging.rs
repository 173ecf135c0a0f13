//! Layer logging: trace, bench and profile.
//!
//! The three layers are gated by the handle's [`LayerMode`]. Events go
//! through `tracing` on the targets `rocrus::trace`, `rocrus::bench` and
//! `rocrus::profile`; the profile layer counts calls in the handle and is
//! flushed when the handle drops.
//!
//! [`LayerMode`]: crate::types::LayerMode

use crate::handle::Handle;
use crate::types::PointerMode;
use half::{bf16, f16};
use num_complex::Complex;
use std::fmt::{self, Write};

/// Formatting used for routine arguments in log lines.
pub trait LogValue {
    fn log_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

macro_rules! log_display {
    ($($t:ty),+) => {
        $(impl LogValue for $t {
            fn log_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        })+
    };
}

log_display!(i32, i64, u32, u64, usize, f32, f64, f16, bf16, char, str, String, bool);

impl<T: fmt::Display> LogValue for Complex<T> {
    fn log_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.re, self.im)
    }
}

impl<T> LogValue for *const T {
    fn log_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:p}", *self)
    }
}

impl<T> LogValue for *mut T {
    fn log_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:p}", *self)
    }
}

macro_rules! log_letter {
    ($($t:ty),+) => {
        $(impl LogValue for $t {
            fn log_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_char(self.letter())
            }
        })+
    };
}

log_letter!(
    crate::types::Fill,
    crate::types::Operation,
    crate::types::Diagonal,
    crate::types::Side
);

impl<T: LogValue + ?Sized> LogValue for &T {
    fn log_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).log_fmt(f)
    }
}

/// Scalar argument as traced: the value in host pointer mode, the address
/// in device pointer mode or when null.
pub struct ScalarLog<T> {
    value: Option<T>,
    ptr: *const T,
}

impl<T: LogValue> LogValue for ScalarLog<T> {
    fn log_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => v.log_fmt(f),
            None => self.ptr.log_fmt(f),
        }
    }
}

/// # Safety
/// A non-null `ptr` must be readable in host pointer mode.
pub unsafe fn scalar_log<T: Copy>(handle: &Handle, ptr: *const T) -> ScalarLog<T> {
    let value = match handle.pointer_mode() {
        PointerMode::Host if !ptr.is_null() => Some(*ptr),
        _ => None,
    };
    ScalarLog { value, ptr }
}

/// Adapter giving any [`LogValue`] a `Display` impl.
pub struct Arg<'a>(pub &'a dyn LogValue);

impl fmt::Display for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.log_fmt(f)
    }
}

/// `name,arg,arg,...`
pub fn trace_line(name: &dyn fmt::Display, args: &[Arg<'_>]) -> String {
    let mut line = name.to_string();
    for a in args {
        let _ = write!(line, ",{a}");
    }
    line
}

/// `rocrus-bench tok tok ...`
pub fn bench_line(args: &[Arg<'_>]) -> String {
    let mut line = String::from("rocrus-bench");
    for a in args {
        let _ = write!(line, " {a}");
    }
    line
}

/// `rocrus_function: "name", key: value, ...`
pub fn profile_signature(name: &dyn fmt::Display, pairs: &[(&str, Arg<'_>)]) -> String {
    let mut line = format!("rocrus_function: \"{name}\"");
    for (k, v) in pairs {
        let _ = write!(line, ", {k}: {v}");
    }
    line
}

pub fn emit_trace(line: &str) {
    tracing::info!(target: "rocrus::trace", "{line}");
}

pub fn emit_bench(line: &str) {
    tracing::info!(target: "rocrus::bench", "{line}");
}

pub fn record_profile(handle: &Handle, signature: String) {
    handle.record_profile(signature);
}

/// Logs a call with every argument when trace logging is on.
#[macro_export]
macro_rules! log_trace {
    ($handle:expr, $name:expr $(, $arg:expr)* $(,)?) => {
        if $handle.layer_mode().contains($crate::types::LayerMode::LOG_TRACE) {
            $crate::logging::emit_trace(&$crate::logging::trace_line(
                &$name,
                &[$($crate::logging::Arg(&$arg)),*],
            ));
        }
    };
}

/// Logs a `rocrus-bench` command line when bench logging is on.
#[macro_export]
macro_rules! log_bench {
    ($handle:expr $(, $arg:expr)* $(,)?) => {
        if $handle.layer_mode().contains($crate::types::LayerMode::LOG_BENCH) {
            $crate::logging::emit_bench(&$crate::logging::bench_line(&[
                $($crate::logging::Arg(&$arg)),*
            ]));
        }
    };
}

/// Counts the call signature when profile logging is on.
#[macro_export]
macro_rules! log_profile {
    ($handle:expr, $name:expr $(, $key:literal, $value:expr)* $(,)?) => {
        if $handle.layer_mode().contains($crate::types::LayerMode::LOG_PROFILE) {
            $crate::logging::record_profile(
                $handle,
                $crate::logging::profile_signature(
                    &$name,
                    &[$(($key, $crate::logging::Arg(&$value))),*],
                ),
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::types::{Fill, LayerMode};
    use num_complex::Complex32;

    #[test]
    fn test_trace_line_formats_arguments() {
        let p: *const f32 = std::ptr::null();
        let alpha = Complex32::new(1.0, -2.0);
        let line = trace_line(
            &"rocrus_chpmv",
            &[Arg(&Fill::Lower), Arg(&5i32), Arg(&alpha), Arg(&p)],
        );
        assert!(line.starts_with("rocrus_chpmv,L,5,(1,-2),0x"));
    }

    #[test]
    fn test_bench_line() {
        let line = bench_line(&[
            Arg(&"-f"),
            Arg(&"nrm2"),
            Arg(&"-r"),
            Arg(&"f32_r"),
            Arg(&"-n"),
            Arg(&10i64),
        ]);
        assert_eq!(line, "rocrus-bench -f nrm2 -r f32_r -n 10");
    }

    #[test]
    fn test_profile_macro_counts_calls() {
        let mut h = Handle::with_config(&RuntimeConfig::default()).unwrap();
        log_profile!(&h, "rocrus_snrm2", "N", 3i32);
        assert!(h.profile_counts().is_empty());
        h.set_layer_mode(LayerMode::LOG_PROFILE);
        log_profile!(&h, "rocrus_snrm2", "N", 3i32, "incx", 1i32);
        log_profile!(&h, "rocrus_snrm2", "N", 3i32, "incx", 1i32);
        let counts = h.profile_counts();
        assert_eq!(
            counts,
            vec![("rocrus_function: \"rocrus_snrm2\", N: 3, incx: 1".to_string(), 2)]
        );
    }

    #[test]
    fn test_trace_macro_is_gated() {
        let h = Handle::with_config(&RuntimeConfig::default()).unwrap();
        // Nothing to observe without a subscriber; this checks the macro expands.
        log_trace!(&h, "rocrus_sdot", 1i32, 2i64);
        log_bench!(&h, "-f", "dot", "-n", 1i32);
    }

    #[test]
    fn test_scalar_log_follows_pointer_mode() {
        let mut h = Handle::with_config(&RuntimeConfig::default()).unwrap();
        let alpha = 2.5f32;
        let shown = unsafe { scalar_log(&h, &alpha) };
        assert_eq!(trace_line(&"f", &[Arg(&shown)]), "f,2.5");
        h.set_pointer_mode(crate::types::PointerMode::Device);
        let shown = unsafe { scalar_log(&h, &alpha) };
        assert!(trace_line(&"f", &[Arg(&shown)]).starts_with("f,0x"));
    }
}
