use crate::math::Matrix;
use rand::Rng;

/// A trainable tensor together with its gradient and Adam moments.
///
/// Layers own their parameters directly, so optimizer state persists across
/// iterations without any external bookkeeping.
#[derive(Clone, Debug)]
pub struct Param {
    pub value: Matrix,
    pub grad: Matrix,
    m: Vec<f32>,
    v: Vec<f32>,
    t: usize,
}

impl Param {
    pub fn new(value: Matrix) -> Self {
        let len = value.data.len();
        Self {
            grad: Matrix::zeros(value.rows, value.cols),
            value,
            m: vec![0.0; len],
            v: vec![0.0; len],
            t: 0,
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::new(Matrix::zeros(rows, cols))
    }

    /// Uniform initialisation in `[-limit, limit]`.
    pub fn uniform<R: Rng>(rows: usize, cols: usize, limit: f32, rng: &mut R) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.gen_range(-limit..=limit))
            .collect();
        Self::new(Matrix::from_vec(rows, cols, data))
    }

    /// Glorot/Xavier uniform initialisation for a kernel with the given fan
    /// in and fan out.
    pub fn glorot<R: Rng>(
        rows: usize,
        cols: usize,
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
        Self::uniform(rows, cols, limit, rng)
    }

    pub fn len(&self) -> usize {
        self.value.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.data.is_empty()
    }

    pub fn zero_grad(&mut self) {
        self.grad.data.iter_mut().for_each(|g| *g = 0.0);
    }

    /// Add `g` elementwise onto the accumulated gradient.
    pub fn accumulate(&mut self, g: &[f32]) {
        assert_eq!(g.len(), self.grad.data.len());
        for (acc, &v) in self.grad.data.iter_mut().zip(g) {
            *acc += v;
        }
    }

    /// Replace the values, keeping the shape. Used when restoring weights.
    pub fn load(&mut self, data: Vec<f32>) -> bool {
        if data.len() != self.value.data.len() {
            return false;
        }
        self.value.data = data;
        true
    }

    pub fn adam_step(&mut self, lr: f32, beta1: f32, beta2: f32, eps: f32, weight_decay: f32) {
        self.t += 1;
        let bc1 = 1.0 - beta1.powi(self.t as i32);
        let bc2 = 1.0 - beta2.powi(self.t as i32);
        for i in 0..self.grad.data.len() {
            let g = self.grad.data[i] + weight_decay * self.value.data[i];
            self.m[i] = beta1 * self.m[i] + (1.0 - beta1) * g;
            self.v[i] = beta2 * self.v[i] + (1.0 - beta2) * g * g;
            let m_hat = self.m[i] / bc1;
            let v_hat = self.v[i] / bc2;
            self.value.data[i] -= lr * m_hat / (v_hat.sqrt() + eps);
        }
    }
}
