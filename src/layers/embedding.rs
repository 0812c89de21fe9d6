use super::param::Param;
use crate::math::Matrix;
use rand::Rng;

/// Embedding layer: maps an integer label to a dense row of `dim` values.
pub struct EmbeddingT {
    pub table: Param, // weight matrix (num_embeddings x dim)
    last_labels: Vec<usize>,
}

impl EmbeddingT {
    pub fn new<R: Rng>(num_embeddings: usize, dim: usize, rng: &mut R) -> Self {
        Self {
            table: Param::uniform(num_embeddings, dim, 0.05, rng),
            last_labels: Vec::new(),
        }
    }

    pub fn num_embeddings(&self) -> usize {
        self.table.value.rows
    }

    pub fn dim(&self) -> usize {
        self.table.value.cols
    }

    /// Look up one row per label. Labels must be `< num_embeddings`.
    pub fn forward(&self, labels: &[usize]) -> Matrix {
        self.table.value.select_rows(labels)
    }

    pub fn forward_train(&mut self, labels: &[usize]) -> Matrix {
        self.last_labels = labels.to_vec();
        self.forward(labels)
    }

    /// Scatter the incoming gradient into the rows that were looked up.
    /// Labels are not differentiable, so nothing is returned.
    pub fn backward(&mut self, grad_out: &Matrix) {
        let dim = self.dim();
        for (r, &label) in self.last_labels.iter().enumerate() {
            let dst = &mut self.table.grad.data[label * dim..(label + 1) * dim];
            for (d, &g) in dst.iter_mut().zip(grad_out.row(r)) {
                *d += g;
            }
        }
    }

    pub fn zero_grad(&mut self) {
        self.table.zero_grad();
    }

    pub fn parameters(&mut self) -> Vec<&mut Param> {
        vec![&mut self.table]
    }

    pub fn params(&self) -> Vec<&Param> {
        vec![&self.table]
    }
}
