use rocrus_clients::{run_case, Arguments};

/// Runs every case of a YAML table and returns their timing reports.
/// Panics with the labels of all failing cases.
pub fn run_table(yaml: &str) -> Vec<Option<String>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let cases = Arguments::from_yaml_str(yaml).expect("argument table parses");
    assert!(!cases.is_empty());
    let mut failures = Vec::new();
    let mut reports = Vec::new();
    for arg in &cases {
        match run_case(arg) {
            Ok(r) => reports.push(r),
            Err(e) => failures.push(format!("{}: {e:#}", arg.label())),
        }
    }
    assert!(failures.is_empty(), "failed cases:\n{}", failures.join("\n"));
    reports
}
