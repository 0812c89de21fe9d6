use super::layer::{Layer, LayerError};
use super::param::Param;
use crate::math::Matrix;
use rand::Rng;

// Dense layer `y = x W + b`. During training `LinearT` keeps the last input so
// that the backward pass can produce gradients for the weights, the bias and
// the input.

pub struct LinearT {
    pub w: Param,
    pub b: Param,
    last_x: Matrix,
}

impl LinearT {
    pub fn new<R: Rng>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self {
        Self {
            w: Param::glorot(in_dim, out_dim, in_dim, out_dim, rng),
            b: Param::zeros(1, out_dim),
            last_x: Matrix::zeros(0, 0),
        }
    }

    pub fn in_dim(&self) -> usize {
        self.w.value.rows
    }

    pub fn out_dim(&self) -> usize {
        self.w.value.cols
    }

    fn check(&self, x: &Matrix) -> Result<(), LayerError> {
        if x.cols != self.in_dim() {
            return Err(LayerError::FeatureMismatch {
                expected: self.in_dim(),
                got: x.cols,
            });
        }
        Ok(())
    }

    fn affine(&self, x: &Matrix) -> Matrix {
        let mut out = Matrix::matmul(x, &self.w.value);
        for r in 0..out.rows {
            for (o, &b) in out.data[r * out.cols..(r + 1) * out.cols]
                .iter_mut()
                .zip(&self.b.value.data)
            {
                *o += b;
            }
        }
        out
    }
}

impl Layer for LinearT {
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        self.check(x)?;
        Ok(self.affine(x))
    }

    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        self.check(x)?;
        self.last_x = x.clone();
        Ok(self.affine(x))
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let grad_w = Matrix::matmul(&self.last_x.transpose(), grad_out);
        self.w.accumulate(&grad_w.data);
        self.b.accumulate(&grad_out.sum_rows());
        Matrix::matmul(grad_out, &self.w.value.transpose())
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        vec![&mut self.w, &mut self.b]
    }

    fn params(&self) -> Vec<&Param> {
        vec![&self.w, &self.b]
    }
}
