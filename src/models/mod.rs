pub mod cgan;
pub mod sequential;

pub use cgan::{CGan, Discriminator, Generator, IMAGE_PIXELS, IMAGE_SIDE};
pub use sequential::Sequential;
