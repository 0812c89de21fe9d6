use crate::layers::LayerError;
use thiserror::Error;

/// Errors produced while loading data, training or persisting models.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download of {url} failed with status {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("invalid npy file {path}: {reason}")]
    Npy { path: String, reason: String },

    #[error("cannot reshape {len} pixels to 28x28x1")]
    Shape { len: usize },

    #[error("label {label} outside 0..{n_classes}")]
    InvalidLabel { label: usize, n_classes: usize },

    #[error("batch has {inputs} rows but {labels} labels")]
    BatchMismatch { inputs: usize, labels: usize },

    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error("checkpoint mismatch: {0}")]
    Checkpoint(String),

    #[error("model.n_classes is {configured} but the dataset has {expected} categories")]
    ClassMismatch { configured: usize, expected: usize },

    #[error("dataset loader failed: {0}")]
    Dataset(String),
}

pub type Result<T> = std::result::Result<T, Error>;
