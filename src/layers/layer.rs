use super::param::Param;
use crate::math::Matrix;
use thiserror::Error;

/// Shape errors raised by a layer's forward pass.
#[derive(Debug, Error, PartialEq)]
pub enum LayerError {
    #[error("input feature count {features} is not divisible by in_channels {in_channels}")]
    ChannelMismatch { features: usize, in_channels: usize },
    #[error("input spatial size {size} is not a perfect square")]
    NonSquareInput { size: usize },
    #[error("expected {expected} input features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },
}

/// Common interface for network layers.
///
/// Inputs are batches with one sample per row. Image layers read each row as
/// channel-major `C*H*W` data.
pub trait Layer {
    /// Forward pass used during inference.
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError>;

    /// Forward pass used during training, allowing the layer to cache values
    /// required for the backward pass.
    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError>;

    /// Backward pass accumulating parameter gradients and returning the
    /// gradient with respect to the layer input.
    fn backward(&mut self, grad_out: &Matrix) -> Matrix;

    /// Zero any accumulated gradients.
    fn zero_grad(&mut self) {
        for p in self.parameters() {
            p.zero_grad();
        }
    }

    /// Mutable references to parameters for optimisation.
    fn parameters(&mut self) -> Vec<&mut Param>;

    /// Read-only parameter access for serialisation.
    fn params(&self) -> Vec<&Param>;
}
