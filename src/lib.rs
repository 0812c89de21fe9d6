//! Conditional GAN for Quick Draw doodles on a small CPU neural-network core.

pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod logging;
pub mod math;
pub mod models;
pub mod optim;
pub mod plot;
pub mod rng;
pub mod train;
pub mod util;
pub mod weights;

pub use error::{Error, Result};
