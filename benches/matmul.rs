use criterion::{black_box, criterion_group, criterion_main, Criterion};
use doodlegan::math::Matrix;
use doodlegan::rng::rng_from_seed;
use rand::Rng;

fn matmul_naive(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(a.cols, b.rows);
    let mut out = vec![0.0; a.rows * b.cols];
    for i in 0..a.rows {
        let a_row = &a.data[i * a.cols..(i + 1) * a.cols];
        for k in 0..a.cols {
            let a_val = a_row[k];
            let b_row = &b.data[k * b.cols..(k + 1) * b.cols];
            for j in 0..b.cols {
                out[i * b.cols + j] += a_val * b_row[j];
            }
        }
    }
    Matrix::from_vec(a.rows, b.cols, out)
}

fn random(rows: usize, cols: usize, seed: u64) -> Matrix {
    let mut rng = rng_from_seed(Some(seed));
    Matrix::from_vec(rows, cols, (0..rows * cols).map(|_| rng.gen()).collect())
}

fn bench_matmul(c: &mut Criterion) {
    let size = 256;
    let a = random(size, size, 1);
    let b = random(size, size, 2);

    c.bench_function("matmul_naive", |bencher| {
        bencher.iter(|| {
            let res = matmul_naive(black_box(&a), black_box(&b));
            black_box(res);
        });
    });

    c.bench_function("matmul_rayon", |bencher| {
        bencher.iter(|| {
            let res = Matrix::matmul(black_box(&a), black_box(&b));
            black_box(res);
        });
    });

    // Shape of the generator's final 7x7 convolution for one image:
    // 784 positions x (128 * 49) patch values against a single filter.
    let cols = random(784, 128 * 49, 3);
    let kernel = random(128 * 49, 1, 4);
    c.bench_function("matmul_im2col_7x7", |bencher| {
        bencher.iter(|| black_box(Matrix::matmul(black_box(&cols), black_box(&kernel))));
    });
}

criterion_group!(benches, bench_matmul);
criterion_main!(benches);
