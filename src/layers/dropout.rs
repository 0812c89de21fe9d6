use super::layer::{Layer, LayerError};
use super::param::Param;
use crate::math::Matrix;
use rand::rngs::StdRng;
use rand::Rng;

/// Dropout layer that randomly zeros elements during training.
///
/// During the training forward pass each element of the input is kept with
/// probability `1 - p`. When an element is kept its value is scaled by
/// `1/(1 - p)` to preserve the expected activation ("inverted" dropout).
/// The generated mask is stored so that it can be reused during the
/// backward pass. Inference is the identity.
pub struct DropoutT {
    p: f32,
    mask: Vec<f32>,
    rng: StdRng,
}

impl DropoutT {
    pub fn new(p: f32, rng: StdRng) -> Self {
        Self {
            p,
            mask: Vec::new(),
            rng,
        }
    }

    pub fn rate(&self) -> f32 {
        self.p
    }
}

impl Layer for DropoutT {
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        Ok(x.clone())
    }

    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        let scale = if self.p < 1.0 { 1.0 / (1.0 - self.p) } else { 0.0 };
        let mut out = Matrix::zeros(x.rows, x.cols);
        self.mask = vec![0.0; x.data.len()];
        for i in 0..x.data.len() {
            if self.rng.gen::<f32>() >= self.p {
                self.mask[i] = scale;
                out.data[i] = x.data[i] * scale;
            }
        }
        Ok(out)
    }

    fn backward(&mut self, grad: &Matrix) -> Matrix {
        let mut grad_input = Matrix::zeros(grad.rows, grad.cols);
        for i in 0..grad.data.len() {
            grad_input.data[i] = grad.data[i] * self.mask[i];
        }
        grad_input
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        Vec::new()
    }

    fn params(&self) -> Vec<&Param> {
        Vec::new()
    }
}
