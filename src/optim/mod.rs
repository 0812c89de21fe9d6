pub mod adam;

pub use adam::Adam;

use crate::layers::Param;

/// Common interface for optimizers operating on layer parameters.
pub trait Optimizer {
    /// Update the provided parameters in-place from their accumulated
    /// gradients.
    fn step(&mut self, params: &mut [&mut Param]);
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Param]) {
        Adam::step(self, params);
    }
}
