//! One small case per routine, run through both integer APIs and every
//! precision it supports.

mod common;

use common::run_table;

fn case(function: &str, precision: &str, api: &str, extra: &str) -> String {
    format!("- {{ function: {function}, precision: {precision}, api: {api}, {extra} }}\n")
}

#[test]
fn level1_in_both_apis() {
    let mut table = String::new();
    for api in ["C", "C_64"] {
        for p in ["f32_r", "f64_r", "f32_c", "f64_c"] {
            table += &case("nrm2", p, api, "N: 17, incx: 2");
            table += &case("dot", p, api, "N: 17, incx: -1, incy: 2");
        }
        for p in ["f16_r", "bf16_r"] {
            table += &case("dot", p, api, "N: 9");
        }
        for p in ["f32_c", "f64_c"] {
            table += &case("dotc", p, api, "N: 17, incy: -1");
        }
    }
    run_table(&table);
}

#[test]
fn level2_in_both_apis() {
    let mut table = String::new();
    for api in ["C", "C_64"] {
        for p in ["f32_r", "f64_r"] {
            table += &case("spr2_batched", p, api, "N: 7, alpha: 3, batch_count: 2");
        }
        for p in ["f32_c", "f64_c"] {
            table += &case("her2_strided_batched", p, api, "N: 7, lda: 7, alpha: 1, alphai: 1, batch_count: 2");
            table += &case("hbmv_batched", p, api, "N: 7, K: 2, lda: 3, alpha: 2, beta: 1, batch_count: 2");
            table += &case("hpmv_strided_batched", p, api, "N: 7, alpha: 1, beta: 2, betai: -1, batch_count: 2");
        }
        for p in ["f32_r", "f64_r", "f32_c", "f64_c"] {
            table += &case("tpsv_batched", p, api, "N: 7, uplo: L, transA: T, batch_count: 2");
        }
    }
    run_table(&table);
}

#[test]
fn level3_and_auxiliary_in_supported_apis() {
    let mut table = String::new();
    for p in ["f32_r", "f64_r", "f32_c", "f64_c"] {
        table += &case("trtri_batched", p, "C", "N: 20, lda: 20, batch_count: 2");
        table += &case("trtri_strided_batched", p, "C", "N: 20, lda: 21, uplo: L, batch_count: 2");
        for api in ["C", "C_64"] {
            table += &case("set_get_matrix_async", p, api, "M: 9, N: 4, lda: 9, ldb: 10, ldd: 11");
        }
    }
    run_table(&table);
}

#[test]
fn host_pointer_mode_only() {
    let table = "\
- { function: dot, precision: f64_r, N: 33, pointer_mode_device: false }
- { function: hpmv_strided_batched, precision: f64_c, N: 9, beta: 1, pointer_mode_device: false }
- { function: spr2_batched, precision: f32_r, N: 9, alpha: 2, pointer_mode_host: false }
";
    run_table(table);
}
