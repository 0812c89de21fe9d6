use crate::layers::Param;

/// Adam with bias correction. Moment estimates live on each [`Param`].
#[derive(Clone, Debug)]
pub struct Adam {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
    pub weight_decay: f32,
}

impl Adam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, eps: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            eps,
            weight_decay,
        }
    }

    pub fn step(&mut self, params: &mut [&mut Param]) {
        for p in params.iter_mut() {
            p.adam_step(self.lr, self.beta1, self.beta2, self.eps, self.weight_decay);
        }
    }
}

impl Default for Adam {
    /// Settings used for both GAN players: lr 2e-4 and beta1 0.5.
    fn default() -> Self {
        Self::new(0.0002, 0.5, 0.999, 1e-7, 0.0)
    }
}
