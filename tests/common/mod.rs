#![allow(dead_code)]

use doodlegan::config::{DataConfig, ModelConfig, TrainConfig};
use doodlegan::data::npy::encode_u8_2d;
use doodlegan::data::quickdraw::{category_path, CATEGORIES};
use std::fs;
use std::path::{Path, PathBuf};

/// Fresh, empty scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("doodlegan_{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write one `.npy` per category where every pixel of category `i` equals
/// `i * 100` and rows are distinguished by their first pixel.
pub fn write_fake_quickdraw(dir: &Path, rows: usize, cols: usize) {
    for (label, category) in CATEGORIES.iter().enumerate() {
        let mut data = vec![(label * 100) as u8; rows * cols];
        for r in 0..rows {
            data[r * cols] = r as u8;
        }
        fs::write(category_path(dir, category), encode_u8_2d(rows, cols, &data)).unwrap();
    }
}

/// Architecture small enough for debug-mode tests.
pub fn tiny_model() -> ModelConfig {
    ModelConfig {
        latent_dim: 5,
        filters: 4,
        embedding_dim: 3,
        ..ModelConfig::default()
    }
}

pub fn tiny_train_config(data_dir: &Path, out_dir: &Path) -> TrainConfig {
    TrainConfig {
        epochs: 1,
        batch_size: 4,
        grid: 3,
        out_dir: out_dir.to_path_buf(),
        final_model: out_dir.join("final_generator.json"),
        seed: Some(42),
        model: tiny_model(),
        data: DataConfig {
            dir: data_dir.to_path_buf(),
            samples_per_class: 8,
            test_size: 0.25,
            shuffle_seed: 100,
        },
        ..TrainConfig::default()
    }
}
