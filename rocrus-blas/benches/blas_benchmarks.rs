use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rocrus_blas::{level1, level2, level3, Diagonal, Fill, Handle, Operation};

fn bench_sdot(c: &mut Criterion) {
    let handle = Handle::new().unwrap();
    let mut group = c.benchmark_group("sdot");
    for &n in &[64usize, 1024, 16384, 262144] {
        let x: Vec<f32> = (0..n).map(|i| i as f32 * 0.001).collect();
        let y: Vec<f32> = (0..n).map(|i| i as f32 * 0.002).collect();
        let mut r = 0.0f32;
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| unsafe {
                level1::dot::<i32, f32>(&handle, n as i32, x.as_ptr(), 1, y.as_ptr(), 1, &mut r)
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_dnrm2_strided_batched(c: &mut Criterion) {
    let handle = Handle::new().unwrap();
    let mut group = c.benchmark_group("dnrm2_strided_batched");
    let n = 4096usize;
    for &batch in &[1usize, 16, 128] {
        let x: Vec<f64> = (0..n * batch).map(|i| (i % 17) as f64).collect();
        let mut r = vec![0.0f64; batch];
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.iter(|| unsafe {
                level1::nrm2_strided_batched::<i32, f64>(
                    &handle,
                    n as i32,
                    x.as_ptr(),
                    1,
                    n as i64,
                    batch as i32,
                    r.as_mut_ptr(),
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_dtpsv(c: &mut Criterion) {
    let handle = Handle::new().unwrap();
    let mut group = c.benchmark_group("dtpsv");
    for &n in &[64usize, 256, 1024] {
        let ap: Vec<f64> = (0..n * (n + 1) / 2).map(|i| 1.0 + (i % 3) as f64).collect();
        let mut x = vec![1.0f64; n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| unsafe {
                x.fill(1.0);
                level2::tpsv::<i32, f64>(
                    &handle,
                    Fill::Upper,
                    Operation::None,
                    Diagonal::NonUnit,
                    n as i32,
                    ap.as_ptr(),
                    x.as_mut_ptr(),
                    1,
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_strtri(c: &mut Criterion) {
    let handle = Handle::new().unwrap();
    let mut group = c.benchmark_group("strtri");
    for &n in &[16usize, 64, 256] {
        let mut a = vec![0.0f32; n * n];
        for j in 0..n {
            for i in 0..=j {
                a[i + j * n] = if i == j { 2.0 } else { 0.01 };
            }
        }
        let mut inv = vec![0.0f32; n * n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| unsafe {
                level3::trtri::<f32>(
                    &handle,
                    Fill::Upper,
                    Diagonal::NonUnit,
                    n as i32,
                    a.as_ptr(),
                    n as i32,
                    inv.as_mut_ptr(),
                    n as i32,
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sdot, bench_dnrm2_strided_batched, bench_dtpsv, bench_strtri);
criterion_main!(benches);
