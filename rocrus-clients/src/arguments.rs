//! Test-case arguments, read from YAML tables or the command line.

use anyhow::{anyhow, Context, Result};
use rocrus_core::{Diagonal, Fill, Operation, Scalar};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Integer flavour a case is run through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Api {
    #[default]
    C,
    #[serde(rename = "C_64")]
    C64,
}

impl std::str::FromStr for Api {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "C" | "c" => Ok(Api::C),
            "C_64" | "c_64" => Ok(Api::C64),
            _ => Err(anyhow!("unknown api `{s}` (expected C or C_64)")),
        }
    }
}

/// One test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arguments {
    pub function: String,
    /// `f32_r`, `f64_r`, `f32_c`, `f64_c`, `f16_r` or `bf16_r`.
    pub precision: String,

    #[serde(rename = "M")]
    pub m: i64,
    #[serde(rename = "N")]
    pub n: i64,
    #[serde(rename = "K")]
    pub k: i64,
    pub lda: i64,
    pub ldb: i64,
    pub ldd: i64,
    pub incx: i64,
    pub incy: i64,
    pub stride_a: i64,
    pub stride_x: i64,
    pub stride_y: i64,
    pub batch_count: i64,

    pub alpha: f64,
    pub alphai: f64,
    pub beta: f64,
    pub betai: f64,

    pub uplo: char,
    #[serde(rename = "transA")]
    pub trans_a: char,
    pub diag: char,

    pub unit_check: bool,
    pub norm_check: bool,
    pub timing: bool,
    pub iters: u32,
    pub cold_iters: u32,
    pub pointer_mode_host: bool,
    pub pointer_mode_device: bool,
    pub api: Api,
    pub seed: u64,
}

impl Default for Arguments {
    fn default() -> Self {
        Arguments {
            function: String::new(),
            precision: "f32_r".into(),
            m: 128,
            n: 128,
            k: 0,
            lda: 128,
            ldb: 128,
            ldd: 128,
            incx: 1,
            incy: 1,
            stride_a: 0,
            stride_x: 0,
            stride_y: 0,
            batch_count: 1,
            alpha: 1.0,
            alphai: 0.0,
            beta: 0.0,
            betai: 0.0,
            uplo: 'U',
            trans_a: 'N',
            diag: 'N',
            unit_check: true,
            norm_check: false,
            timing: false,
            iters: 10,
            cold_iters: 2,
            pointer_mode_host: true,
            pointer_mode_device: true,
            api: Api::C,
            seed: 69069,
        }
    }
}

impl Arguments {
    /// Parses a YAML sequence of argument tables.
    pub fn from_yaml_str(text: &str) -> Result<Vec<Arguments>> {
        serde_yaml::from_str(text).context("invalid argument table")
    }

    pub fn from_yaml_file(path: &Path) -> Result<Vec<Arguments>> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn get_alpha<T: Scalar>(&self) -> T {
        T::from_parts(self.alpha, self.alphai)
    }

    pub fn get_beta<T: Scalar>(&self) -> T {
        T::from_parts(self.beta, self.betai)
    }

    pub fn alpha_is_nan(&self) -> bool {
        self.alpha.is_nan() || self.alphai.is_nan()
    }

    pub fn beta_is_nan(&self) -> bool {
        self.beta.is_nan() || self.betai.is_nan()
    }

    pub fn uplo(&self) -> Result<Fill> {
        Fill::from_letter(self.uplo).ok_or_else(|| anyhow!("bad uplo `{}`", self.uplo))
    }

    pub fn trans_a(&self) -> Result<Operation> {
        Operation::from_letter(self.trans_a).ok_or_else(|| anyhow!("bad transA `{}`", self.trans_a))
    }

    pub fn diag(&self) -> Result<Diagonal> {
        Diagonal::from_letter(self.diag).ok_or_else(|| anyhow!("bad diag `{}`", self.diag))
    }

    /// `function/precision/N/...` label used in reports.
    pub fn label(&self) -> String {
        format!(
            "{}_{}_M{}_N{}_K{}_incx{}_incy{}_batch{}_{:?}",
            self.function,
            self.precision,
            self.m,
            self.n,
            self.k,
            self.incx,
            self.incy,
            self.batch_count,
            self.api
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_yaml_table_fills_defaults() {
        let cases = Arguments::from_yaml_str(
            r#"
- function: dotc
  precision: f64_c
  N: 7
  incy: -2
  alpha: 2.0
  alphai: -1.0
  api: C_64
- function: tpsv_batched
  uplo: L
  transA: C
  diag: U
"#,
        )
        .unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].n, 7);
        assert_eq!(cases[0].incx, 1);
        assert_eq!(cases[0].incy, -2);
        assert_eq!(cases[0].api, Api::C64);
        assert_eq!(cases[0].get_alpha::<Complex64>(), Complex64::new(2.0, -1.0));
        assert_eq!(cases[1].uplo().unwrap(), Fill::Lower);
        assert_eq!(cases[1].trans_a().unwrap(), Operation::ConjugateTranspose);
        assert_eq!(cases[1].diag().unwrap(), Diagonal::Unit);
        assert_eq!(cases[1].precision, "f32_r");
    }

    #[test]
    fn test_bad_letters_are_errors() {
        let arg = Arguments {
            uplo: 'X',
            ..Default::default()
        };
        assert!(arg.uplo().is_err());
        assert!("C_32".parse::<Api>().is_err());
    }
}
