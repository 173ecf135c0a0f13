//! Timing report: the arguments a routine depends on, then its speed and
//! error columns, as a two-line CSV block.

use crate::arguments::Arguments;
use std::fmt::Write as _;

/// An argument column of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Uplo,
    TransA,
    Diag,
    M,
    N,
    K,
    Alpha,
    Beta,
    Lda,
    Ldb,
    Incx,
    Incy,
    StrideA,
    StrideX,
    StrideY,
    BatchCount,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Uplo => "uplo",
            Field::TransA => "transA",
            Field::Diag => "diag",
            Field::M => "M",
            Field::N => "N",
            Field::K => "K",
            Field::Alpha => "alpha",
            Field::Beta => "beta",
            Field::Lda => "lda",
            Field::Ldb => "ldb",
            Field::Incx => "incx",
            Field::Incy => "incy",
            Field::StrideA => "stride_a",
            Field::StrideX => "stride_x",
            Field::StrideY => "stride_y",
            Field::BatchCount => "batch_count",
        }
    }

    fn value(self, arg: &Arguments, complex: bool) -> String {
        let scalar = |re: f64, im: f64| {
            if complex {
                format!("({re}:{im})")
            } else {
                re.to_string()
            }
        };
        match self {
            Field::Uplo => arg.uplo.to_string(),
            Field::TransA => arg.trans_a.to_string(),
            Field::Diag => arg.diag.to_string(),
            Field::M => arg.m.to_string(),
            Field::N => arg.n.to_string(),
            Field::K => arg.k.to_string(),
            Field::Alpha => scalar(arg.alpha, arg.alphai),
            Field::Beta => scalar(arg.beta, arg.betai),
            Field::Lda => arg.lda.to_string(),
            Field::Ldb => arg.ldb.to_string(),
            Field::Incx => arg.incx.to_string(),
            Field::Incy => arg.incy.to_string(),
            Field::StrideA => arg.stride_a.to_string(),
            Field::StrideX => arg.stride_x.to_string(),
            Field::StrideY => arg.stride_y.to_string(),
            Field::BatchCount => arg.batch_count.to_string(),
        }
    }
}

/// Measurements of one timed case.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timing {
    /// Mean microseconds per hot call.
    pub gpu_us: f64,
    pub gflop: f64,
    pub gbyte: f64,
    pub cpu_us: f64,
    /// Norm errors of the host and device pointer-mode runs, when checked.
    pub error_host: Option<f64>,
    pub error_device: Option<f64>,
}

/// Columns reported for one routine.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentModel(pub &'static [Field]);

impl ArgumentModel {
    /// Header and value lines, newline-terminated.
    pub fn log_args(&self, arg: &Arguments, complex: bool, t: &Timing) -> String {
        let mut header: Vec<String> = self.0.iter().map(|f| f.name().to_string()).collect();
        let mut values: Vec<String> = self.0.iter().map(|f| f.value(arg, complex)).collect();
        let per_sec = |count: f64| {
            if t.gpu_us > 0.0 {
                count / t.gpu_us * 1e6
            } else {
                0.0
            }
        };
        if t.gflop > 0.0 {
            header.push("rocrus-Gflops".into());
            values.push(format!("{:.4}", per_sec(t.gflop)));
        }
        if t.gbyte > 0.0 {
            header.push("rocrus-GB/s".into());
            values.push(format!("{:.4}", per_sec(t.gbyte)));
        }
        header.push("us".into());
        values.push(format!("{:.2}", t.gpu_us));
        if arg.unit_check || arg.norm_check {
            header.push("CPU-us".into());
            values.push(format!("{:.2}", t.cpu_us));
        }
        if arg.norm_check {
            for (name, e) in [
                ("norm_error_host_ptr", t.error_host),
                ("norm_error_device_ptr", t.error_device),
            ] {
                if let Some(e) = e {
                    header.push(name.into());
                    values.push(format!("{e:e}"));
                }
            }
        }
        let mut out = String::new();
        let _ = writeln!(out, "{}", header.join(","));
        let _ = writeln!(out, "{}", values.join(","));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_args_columns() {
        let arg = Arguments {
            n: 1000,
            incx: 2,
            alpha: 2.0,
            alphai: -1.0,
            unit_check: false,
            ..Default::default()
        };
        let t = Timing {
            gpu_us: 10.0,
            gflop: 1e-3,
            ..Default::default()
        };
        let out = ArgumentModel(&[Field::N, Field::Incx, Field::Alpha]).log_args(&arg, true, &t);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "N,incx,alpha,rocrus-Gflops,us");
        assert_eq!(lines[1], "1000,2,(2:-1),100.0000,10.00");
    }
}
