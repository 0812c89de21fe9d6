use super::layer::{Layer, LayerError};
use super::param::Param;
use crate::math::Matrix;

/// Apply leaky ReLU in place on a matrix and return the derivative mask.
pub fn forward_matrix(m: &mut Matrix, slope: f32) -> Vec<f32> {
    let mut mask = vec![1.0; m.data.len()];
    for (i, v) in m.data.iter_mut().enumerate() {
        if *v < 0.0 {
            *v *= slope;
            mask[i] = slope;
        }
    }
    mask
}

/// Apply derivative mask to gradient matrix.
pub fn backward(grad: &mut Matrix, mask: &[f32]) {
    for (g, &m) in grad.data.iter_mut().zip(mask.iter()) {
        *g *= m;
    }
}

/// Leaky ReLU activation layer.
pub struct LeakyReLUT {
    slope: f32,
    mask: Vec<f32>,
}

impl LeakyReLUT {
    pub fn new(slope: f32) -> Self {
        Self {
            slope,
            mask: Vec::new(),
        }
    }
}

impl Layer for LeakyReLUT {
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        let mut out = x.clone();
        forward_matrix(&mut out, self.slope);
        Ok(out)
    }

    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        let mut out = x.clone();
        self.mask = forward_matrix(&mut out, self.slope);
        Ok(out)
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let mut grad = grad_out.clone();
        backward(&mut grad, &self.mask);
        grad
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        Vec::new()
    }

    fn params(&self) -> Vec<&Param> {
        Vec::new()
    }
}
