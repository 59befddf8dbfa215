//! Benchmarks for the reference and device SpMV kernels

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spmv_bench::{
    generate_vector, reference_spmv, AcceleratedSpmv, DuplicatePolicy, HostDevice,
    SparseMatrixCSR, SpmvAlgorithm, TripletBuilder,
};

/// Random square matrix with about `per_row` nonzeros in each row
fn create_random_matrix(n: usize, per_row: usize, seed: u64) -> SparseMatrixCSR<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut builder = TripletBuilder::new(n, n, DuplicatePolicy::LastWins);

    for i in 0..n {
        for _ in 0..per_row {
            let j = rng.gen_range(0..n);
            builder.push(i, j, rng.gen::<f64>()).unwrap();
        }
    }

    builder.build().unwrap()
}

fn bench_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_spmv");

    for &n in &[1_000, 10_000, 100_000] {
        let a = create_random_matrix(n, 16, 42);
        let x: Vec<f64> = generate_vector(n, 54321);
        group.throughput(Throughput::Elements(a.nnz() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| reference_spmv(black_box(&a), black_box(&x)))
        });
    }

    group.finish();
}

fn bench_device(c: &mut Criterion) {
    let device = HostDevice::new().unwrap();
    let mut group = c.benchmark_group("device_spmv");

    for &n in &[10_000, 100_000] {
        let a = create_random_matrix(n, 16, 42);
        let x: Vec<f64> = generate_vector(n, 54321);
        let mut y = vec![0.0; n];
        group.throughput(Throughput::Elements(a.nnz() as u64));

        for algorithm in [SpmvAlgorithm::Adaptive, SpmvAlgorithm::RowSplit] {
            let spmv = AcceleratedSpmv::new(&device, &a, algorithm).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", algorithm), n),
                &n,
                |bench, _| bench.iter(|| spmv.run(black_box(&x), &mut y).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_reference, bench_device);
criterion_main!(benches);
