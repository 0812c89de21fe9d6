//! Quick Draw bitmaps: fetching the per-category `.npy` dumps and turning
//! them into labelled, shuffled train/test splits.

use super::npy;
use crate::config::DataConfig;
use crate::error::{Error, Result};
use crate::math::Matrix;
use crate::models::IMAGE_PIXELS;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Categories trained on, in label order.
pub const CATEGORIES: [&str; 3] = ["apple", "banana", "grapes"];

/// Public bucket holding one `<category>.npy` file per category.
pub const DEFAULT_BASE_URL: &str =
    "https://storage.googleapis.com/quickdraw_dataset/full/numpy_bitmap";

pub fn label_for(category: &str) -> Result<usize> {
    CATEGORIES
        .iter()
        .position(|&c| c == category)
        .ok_or_else(|| Error::UnknownCategory(category.to_string()))
}

pub fn category_for(label: usize) -> Option<&'static str> {
    CATEGORIES.get(label).copied()
}

pub fn category_path(dir: &Path, category: &str) -> PathBuf {
    dir.join(format!("{category}.npy"))
}

/// Download `<base_url>/<category>.npy` for every category into `dir`.
///
/// Existing files are overwritten. Bodies are streamed to a `.part` file
/// and renamed once complete. There is no overall request timeout.
/// Returns the paths written, in order.
pub fn download<P: AsRef<Path>>(
    dir: P,
    base_url: &str,
    categories: &[&str],
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let client = reqwest::blocking::Client::builder().timeout(None).build()?;
    let base = base_url.trim_end_matches('/');
    let mut written = Vec::with_capacity(categories.len());
    for (i, category) in categories.iter().enumerate() {
        let url = format!("{base}/{category}.npy");
        log::debug!("fetching {url}");
        let mut resp = client.get(&url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::DownloadStatus {
                url,
                status: status.as_u16(),
            });
        }
        let path = category_path(dir, category);
        let part = path.with_extension("npy.part");
        let copied = File::create(&part).map_err(Error::from).and_then(|file| {
            let mut out = BufWriter::new(file);
            resp.copy_to(&mut out)?;
            out.flush()?;
            Ok(())
        });
        if let Err(e) = copied {
            let _ = fs::remove_file(&part);
            return Err(e);
        }
        fs::rename(&part, &path)?;
        log::debug!("wrote {}", path.display());
        log::info!(
            "Downloaded {category} drawings (category {}/{})",
            i + 1,
            categories.len()
        );
        written.push(path);
    }
    Ok(written)
}

/// A single 28x28 grayscale drawing with its class label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Drawing {
    pub pixels: Vec<u8>,
    pub label: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Split {
    pub train: Vec<Drawing>,
    pub test: Vec<Drawing>,
}

/// Load every category from `cfg.dir`, subsample and split.
pub fn load(cfg: &DataConfig) -> Result<Split> {
    let mut drawings = Vec::with_capacity(cfg.samples_per_class * CATEGORIES.len());
    // One stream across categories, so equal-sized files are not sampled
    // with the same permutation.
    let mut rng = StdRng::seed_from_u64(cfg.shuffle_seed);
    for (label, category) in CATEGORIES.iter().enumerate() {
        let arr = npy::read_u8_2d(category_path(&cfg.dir, category))?;
        if arr.cols != IMAGE_PIXELS {
            return Err(Error::Shape { len: arr.cols });
        }
        let mut rows: Vec<usize> = (0..arr.rows).collect();
        rows.shuffle(&mut rng);
        rows.truncate(cfg.samples_per_class);
        drawings.extend(rows.into_iter().map(|r| Drawing {
            pixels: arr.row(r).to_vec(),
            label,
        }));
        log::info!("...{category} bitmaps complete");
    }
    let n = drawings.len();
    log::info!("{n} bitmaps with {n} labels");
    Ok(train_test_split(
        drawings,
        cfg.test_size,
        cfg.shuffle_seed.wrapping_add(1),
    ))
}

/// Shuffle and hold out `ceil(len * test_size)` drawings for testing.
pub fn train_test_split(mut drawings: Vec<Drawing>, test_size: f32, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    drawings.shuffle(&mut rng);
    let n_test = ((drawings.len() as f32) * test_size.clamp(0.0, 1.0)).ceil() as usize;
    let train = drawings.split_off(n_test.min(drawings.len()));
    Split {
        train,
        test: drawings,
    }
}

/// Map a byte pixel from `[0, 255]` to `[-1, 1]`.
pub fn scale_pixels(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(|&p| (p as f32 - 127.5) / 127.5).collect()
}

/// Map generator output from `[-1, 1]` back to `[0, 1]`.
pub fn unscale_pixels(values: &mut [f32]) {
    for v in values {
        *v = (*v + 1.0) / 2.0;
    }
}

/// Stack drawings into a scaled image matrix plus their labels.
pub fn to_matrix(drawings: &[&Drawing]) -> (Matrix, Vec<usize>) {
    let mut data = Vec::with_capacity(drawings.len() * IMAGE_PIXELS);
    let mut labels = Vec::with_capacity(drawings.len());
    for d in drawings {
        data.extend(scale_pixels(&d.pixels));
        labels.push(d.label);
    }
    (Matrix::from_vec(drawings.len(), IMAGE_PIXELS, data), labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_category_order() {
        assert_eq!(label_for("banana").unwrap(), 1);
        assert_eq!(category_for(2), Some("grapes"));
        assert!(matches!(label_for("pear"), Err(Error::UnknownCategory(_))));
    }

    #[test]
    fn scaling_hits_both_ends() {
        let v = scale_pixels(&[0, 255]);
        assert_eq!(v, vec![-1.0, 1.0]);
        let mut back = v.clone();
        unscale_pixels(&mut back);
        assert_eq!(back, vec![0.0, 1.0]);
    }

    #[test]
    fn split_holds_out_fraction() {
        let drawings: Vec<Drawing> = (0..10)
            .map(|i| Drawing {
                pixels: vec![i as u8],
                label: i % 3,
            })
            .collect();
        let split = train_test_split(drawings, 0.2, 7);
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.test.len(), 2);
    }
}
