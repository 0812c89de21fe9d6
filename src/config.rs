use crate::error::Result;
use crate::optim::Adam;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Architecture hyper-parameters shared by the generator and discriminator.
///
/// This is stored inside generator checkpoints so a saved model can be
/// rebuilt without the training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Size of the latent noise vector.
    pub latent_dim: usize,
    /// Number of conditioning classes.
    pub n_classes: usize,
    /// Filters in every hidden conv / transposed conv layer.
    pub filters: usize,
    /// Width of the label embedding.
    pub embedding_dim: usize,
    /// Negative slope of the leaky ReLU activations.
    pub leaky_slope: f32,
    /// Dropout rate before the discriminator head.
    pub dropout: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            latent_dim: 100,
            n_classes: 3,
            filters: 128,
            embedding_dim: 50,
            leaky_slope: 0.2,
            dropout: 0.4,
        }
    }
}

/// Adam settings used for both players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimConfig {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
}

impl Default for OptimConfig {
    fn default() -> Self {
        let adam = Adam::default();
        Self {
            lr: adam.lr,
            beta1: adam.beta1,
            beta2: adam.beta2,
            eps: adam.eps,
        }
    }
}

impl OptimConfig {
    pub fn build(&self) -> Adam {
        Adam::new(self.lr, self.beta1, self.beta2, self.eps, 0.0)
    }
}

/// Where the Quick Draw bitmaps live and how they are sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding `<category>.npy` files.
    pub dir: PathBuf,
    /// Drawings kept per category after shuffling.
    pub samples_per_class: usize,
    /// Fraction of drawings held out for testing.
    pub test_size: f32,
    /// Seed for the per-category shuffle.
    pub shuffle_seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("quickdraw/bitmap"),
            samples_per_class: 10_000,
            test_size: 0.2,
            shuffle_seed: 100,
        }
    }
}

/// Training configuration loaded from a TOML or JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Number of training epochs.
    pub epochs: usize,
    /// Full batch size; each discriminator update sees half of it.
    pub batch_size: usize,
    /// Side of the sample grid written after every epoch.
    pub grid: usize,
    /// Directory for sample plots, per-epoch checkpoints and metrics.
    pub out_dir: PathBuf,
    /// Path of the generator saved once training finishes.
    pub final_model: PathBuf,
    /// Seed for weight initialisation and sampling. Falls back to `SEED`.
    pub seed: Option<u64>,
    pub model: ModelConfig,
    pub optim: OptimConfig,
    pub data: DataConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            batch_size: 100,
            grid: 10,
            out_dir: PathBuf::from("results_convergence"),
            final_model: PathBuf::from("cgan_doodle_generator.json"),
            seed: None,
            model: ModelConfig::default(),
            optim: OptimConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl TrainConfig {
    /// Load configuration from the given path. Supports TOML or JSON based on
    /// the file extension; missing keys keep their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }
}
