use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

static MATRIX_OPS: AtomicUsize = AtomicUsize::new(0);

/// Probability clip applied before taking logarithms in the BCE loss.
pub const BCE_EPSILON: f32 = 1e-7;

pub fn reset_matrix_ops() {
    MATRIX_OPS.store(0, Ordering::SeqCst);
}

pub fn matrix_ops_count() -> usize {
    MATRIX_OPS.load(Ordering::SeqCst)
}

pub(crate) fn inc_ops() {
    MATRIX_OPS.fetch_add(1, Ordering::SeqCst);
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(r: usize, c: usize) -> Self {
        Matrix {
            rows: r,
            cols: c,
            data: vec![0.0; r * c],
        }
    }

    pub fn from_vec(r: usize, c: usize, v: Vec<f32>) -> Self {
        assert_eq!(v.len(), r * c);
        Matrix {
            rows: r,
            cols: c,
            data: v,
        }
    }

    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f32) {
        self.data[r * self.cols + c] = v;
    }

    /// Borrow a single row.
    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Gather the given rows into a new matrix, in order.
    pub fn select_rows(&self, idx: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(idx.len() * self.cols);
        for &i in idx {
            data.extend_from_slice(self.row(i));
        }
        Matrix::from_vec(idx.len(), self.cols, data)
    }

    /// Row-parallel matrix product. Each output row is independent, so rows
    /// are distributed over the rayon pool.
    pub fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
        inc_ops();
        assert_eq!(a.cols, b.rows);
        let mut out = vec![0.0; a.rows * b.cols];
        if b.cols == 0 {
            return Matrix::from_vec(a.rows, 0, out);
        }
        out.par_chunks_mut(b.cols)
            .enumerate()
            .for_each(|(i, out_row)| {
                let a_row = &a.data[i * a.cols..(i + 1) * a.cols];
                for (k, &a_val) in a_row.iter().enumerate() {
                    if a_val == 0.0 {
                        continue;
                    }
                    let b_row = &b.data[k * b.cols..(k + 1) * b.cols];
                    for (o, &bv) in out_row.iter_mut().zip(b_row) {
                        *o += a_val * bv;
                    }
                }
            });
        Matrix::from_vec(a.rows, b.cols, out)
    }

    pub fn add(&self, other: &Matrix) -> Matrix {
        inc_ops();
        assert_eq!(self.rows, other.rows);
        assert_eq!(self.cols, other.cols);
        let v = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();
        Matrix::from_vec(self.rows, self.cols, v)
    }

    pub fn transpose(&self) -> Matrix {
        inc_ops();
        let mut v = vec![0.0; self.rows * self.cols];
        for i in 0..self.rows {
            for j in 0..self.cols {
                v[j * self.rows + i] = self.get(i, j);
            }
        }
        Matrix::from_vec(self.cols, self.rows, v)
    }

    /// Column sums, i.e. the gradient of a bias broadcast over rows.
    pub fn sum_rows(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.cols];
        for r in 0..self.rows {
            for (o, v) in out.iter_mut().zip(self.row(r)) {
                *o += v;
            }
        }
        out
    }

    /// Concatenate two batches feature-wise (`[a | b]` per row).
    pub fn hcat(a: &Matrix, b: &Matrix) -> Matrix {
        assert_eq!(a.rows, b.rows);
        let cols = a.cols + b.cols;
        let mut data = Vec::with_capacity(a.rows * cols);
        for r in 0..a.rows {
            data.extend_from_slice(a.row(r));
            data.extend_from_slice(b.row(r));
        }
        Matrix::from_vec(a.rows, cols, data)
    }

    /// Inverse of [`Matrix::hcat`]: split every row after `left_cols`.
    pub fn hsplit(&self, left_cols: usize) -> (Matrix, Matrix) {
        assert!(left_cols <= self.cols);
        let right_cols = self.cols - left_cols;
        let mut left = Vec::with_capacity(self.rows * left_cols);
        let mut right = Vec::with_capacity(self.rows * right_cols);
        for r in 0..self.rows {
            let row = self.row(r);
            left.extend_from_slice(&row[..left_cols]);
            right.extend_from_slice(&row[left_cols..]);
        }
        (
            Matrix::from_vec(self.rows, left_cols, left),
            Matrix::from_vec(self.rows, right_cols, right),
        )
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Binary cross-entropy on sigmoid outputs.
///
/// `logits` holds one pre-activation per row and `targets` the expected
/// probability for each row. Returns the mean loss and the gradient with
/// respect to the logits, already divided by the batch size.
pub fn binary_cross_entropy(logits: &Matrix, targets: &[f32]) -> (f32, Matrix) {
    assert_eq!(logits.data.len(), targets.len());
    let n = targets.len().max(1) as f32;
    let mut grad = Matrix::zeros(logits.rows, logits.cols);
    let mut loss = 0.0f32;
    for (i, (&z, &y)) in logits.data.iter().zip(targets).enumerate() {
        let p = sigmoid(z).clamp(BCE_EPSILON, 1.0 - BCE_EPSILON);
        loss -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
        grad.data[i] = (sigmoid(z) - y) / n;
    }
    (loss / n, grad)
}

/// Fraction of probabilities that fall on the same side of 0.5 as their
/// target.
pub fn binary_accuracy(probs: &[f32], targets: &[f32]) -> f32 {
    let len = probs.len().min(targets.len());
    if len == 0 {
        return 0.0;
    }
    let correct = probs
        .iter()
        .zip(targets)
        .filter(|&(&p, &y)| (p > 0.5) == (y > 0.5))
        .count();
    correct as f32 / len as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hcat_then_hsplit_restores_parts() {
        let a = Matrix::from_vec(2, 1, vec![1.0, 2.0]);
        let b = Matrix::from_vec(2, 2, vec![3.0, 4.0, 5.0, 6.0]);
        let joined = Matrix::hcat(&a, &b);
        assert_eq!(joined.data, vec![1.0, 3.0, 4.0, 2.0, 5.0, 6.0]);
        let (l, r) = joined.hsplit(1);
        assert_eq!(l, a);
        assert_eq!(r, b);
    }

    #[test]
    fn bce_of_confident_correct_prediction_is_small() {
        let logits = Matrix::from_vec(2, 1, vec![10.0, -10.0]);
        let (loss, grad) = binary_cross_entropy(&logits, &[1.0, 0.0]);
        assert!(loss < 1e-3);
        assert!(grad.data[0] < 0.0 && grad.data[0] > -1e-3);
        assert!(grad.data[1] > 0.0 && grad.data[1] < 1e-3);
    }

    #[test]
    fn bce_at_zero_logit_is_ln_two() {
        let logits = Matrix::from_vec(1, 1, vec![0.0]);
        let (loss, grad) = binary_cross_entropy(&logits, &[1.0]);
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);
        assert!((grad.data[0] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn accuracy_thresholds_at_half() {
        assert_eq!(binary_accuracy(&[0.9, 0.2, 0.6, 0.4], &[1.0, 0.0, 0.0, 1.0]), 0.5);
    }
}
