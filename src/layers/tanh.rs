use super::layer::{Layer, LayerError};
use super::param::Param;
use crate::math::Matrix;

/// Apply tanh in place.
pub fn forward_matrix(m: &mut Matrix) {
    m.data.iter_mut().for_each(|v| *v = v.tanh());
}

/// Scale `grad` by `1 - tanh(x)^2`, given the activated values.
pub fn backward(grad: &mut Matrix, activated: &Matrix) {
    for (g, &h) in grad.data.iter_mut().zip(&activated.data) {
        *g *= 1.0 - h * h;
    }
}

/// Tanh output layer. Keeps its activations for the backward pass.
#[derive(Default)]
pub struct TanhT {
    out: Matrix,
}

impl TanhT {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for TanhT {
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        let mut out = x.clone();
        forward_matrix(&mut out);
        Ok(out)
    }

    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        let out = self.forward(x)?;
        self.out = out.clone();
        Ok(out)
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let mut grad = grad_out.clone();
        backward(&mut grad, &self.out);
        grad
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        Vec::new()
    }

    fn params(&self) -> Vec<&Param> {
        Vec::new()
    }
}
