pub mod conv;
pub mod conv_transpose;
pub mod dropout;
pub mod embedding;
pub mod layer;
pub mod leaky_relu;
pub mod linear;
pub mod param;
pub mod sigmoid;
pub mod tanh;

pub use conv::Conv2d;
pub use conv_transpose::ConvTranspose2d;
pub use dropout::DropoutT;
pub use embedding::EmbeddingT;
pub use layer::{Layer, LayerError};
pub use leaky_relu::LeakyReLUT;
pub use linear::LinearT;
pub use param::Param;
pub use tanh::TanhT;
