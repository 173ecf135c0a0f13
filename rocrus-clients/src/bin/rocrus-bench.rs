//! Runs rocrus test cases from YAML tables or the command line.
//!
//! ```bash
//! # every case of a table
//! rocrus-bench --yaml rocrus-clients/data/level2.yaml
//!
//! # one timed case
//! rocrus-bench -f dot -r f32_r -n 1000000 --timing --iters 20
//! ```

use anyhow::{bail, Result};
use clap::Parser;
use rocrus_clients::{run_case, Api, Arguments, FUNCTIONS};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rocrus-bench")]
#[command(about = "Check and time rocrus routines against the host reference")]
#[command(version)]
struct Cli {
    /// Argument tables to run; the single-case options are ignored
    #[arg(long)]
    yaml: Vec<PathBuf>,

    /// Print the routine names and exit
    #[arg(long)]
    list: bool,

    #[arg(short, long, default_value = "nrm2")]
    function: String,

    /// f32_r, f64_r, f32_c, f64_c, f16_r or bf16_r
    #[arg(short = 'r', long, default_value = "f32_r")]
    precision: String,

    /// C or C_64
    #[arg(long, default_value = "C")]
    api: Api,

    #[arg(short, default_value_t = 128)]
    m: i64,
    #[arg(short, default_value_t = 128)]
    n: i64,
    #[arg(short, default_value_t = 0)]
    k: i64,
    #[arg(long, default_value_t = 128)]
    lda: i64,
    #[arg(long, default_value_t = 128)]
    ldb: i64,
    #[arg(long, default_value_t = 128)]
    ldd: i64,
    #[arg(long, default_value_t = 1)]
    incx: i64,
    #[arg(long, default_value_t = 1)]
    incy: i64,
    #[arg(long, default_value_t = 0)]
    stride_a: i64,
    #[arg(long, default_value_t = 0)]
    stride_x: i64,
    #[arg(long, default_value_t = 0)]
    stride_y: i64,
    #[arg(long, default_value_t = 1)]
    batch_count: i64,

    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    alpha: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    alphai: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    beta: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    betai: f64,

    #[arg(long, default_value_t = 'U')]
    uplo: char,
    #[arg(long = "transA", default_value_t = 'N')]
    trans_a: char,
    #[arg(long, default_value_t = 'N')]
    diag: char,

    /// Skip the element-wise comparison
    #[arg(long)]
    no_unit_check: bool,
    #[arg(long)]
    norm_check: bool,
    #[arg(long)]
    timing: bool,
    #[arg(long, default_value_t = 10)]
    iters: u32,
    #[arg(long, default_value_t = 2)]
    cold_iters: u32,
    #[arg(long, default_value_t = 69069)]
    seed: u64,
}

impl Cli {
    fn arguments(&self) -> Arguments {
        Arguments {
            function: self.function.clone(),
            precision: self.precision.clone(),
            m: self.m,
            n: self.n,
            k: self.k,
            lda: self.lda,
            ldb: self.ldb,
            ldd: self.ldd,
            incx: self.incx,
            incy: self.incy,
            stride_a: self.stride_a,
            stride_x: self.stride_x,
            stride_y: self.stride_y,
            batch_count: self.batch_count,
            alpha: self.alpha,
            alphai: self.alphai,
            beta: self.beta,
            betai: self.betai,
            uplo: self.uplo,
            trans_a: self.trans_a,
            diag: self.diag,
            unit_check: !self.no_unit_check,
            norm_check: self.norm_check,
            timing: self.timing,
            iters: self.iters,
            cold_iters: self.cold_iters,
            api: self.api,
            seed: self.seed,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if cli.list {
        for f in FUNCTIONS {
            println!("{f}");
        }
        return Ok(());
    }

    let cases = if cli.yaml.is_empty() {
        vec![cli.arguments()]
    } else {
        let mut cases = Vec::new();
        for path in &cli.yaml {
            cases.extend(Arguments::from_yaml_file(path)?);
        }
        cases
    };

    let mut failed = 0usize;
    for arg in &cases {
        match run_case(arg) {
            Ok(Some(report)) => print!("{report}"),
            Ok(None) => tracing::debug!(case = %arg.label(), "passed"),
            Err(e) => {
                failed += 1;
                tracing::error!(case = %arg.label(), "{e:#}");
            }
        }
    }
    tracing::info!("{} of {} cases passed", cases.len() - failed, cases.len());
    if failed > 0 {
        bail!("{failed} cases failed");
    }
    Ok(())
}
