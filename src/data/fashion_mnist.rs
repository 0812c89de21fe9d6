use super::dataloader::Dataset;
use super::quickdraw::Drawing;
use crate::error::{Error, Result};
use crate::models::IMAGE_PIXELS;
use mnist::MnistBuilder;
use std::fs;
use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};

const TRAIN_LEN: u32 = 60_000;
const TEST_LEN: u32 = 10_000;
const FASHION_BASE_URL: &str = "http://fashion-mnist.s3-website.eu-central-1.amazonaws.com/";

/// Fashion-MNIST split into its canonical train and test sets.
pub struct FashionMnistData {
    pub train: Vec<Drawing>,
    pub test: Vec<Drawing>,
}

impl FashionMnistData {
    /// `(samples, rows, cols)` of the training images.
    pub fn train_shape(&self) -> (usize, usize, usize) {
        (self.train.len(), 28, 28)
    }

    pub fn test_shape(&self) -> (usize, usize, usize) {
        (self.test.len(), 28, 28)
    }
}

fn to_drawings(images: &[u8], labels: &[u8]) -> Vec<Drawing> {
    images
        .chunks(IMAGE_PIXELS)
        .zip(labels)
        .map(|(img, &lbl)| Drawing {
            pixels: img.to_vec(),
            label: lbl as usize,
        })
        .collect()
}

/// Run a loader that reports failure by panicking, turning the panic into
/// [`Error::Dataset`].
fn catch_loader_panic<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    panic::catch_unwind(f).map_err(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Error::Dataset(msg)
    })
}

/// Fetch (on first use) and load Fashion-MNIST into `dir`.
///
/// The `mnist` crate downloads and extracts the archives itself and panics
/// if that fails; the panic comes back as [`Error::Dataset`].
pub fn load<P: AsRef<Path>>(dir: P) -> Result<FashionMnistData> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let base = format!("{}/", dir.display().to_string().trim_end_matches('/'));
    let raw = catch_loader_panic(|| {
        MnistBuilder::new()
            .use_fashion_data()
            .base_url(FASHION_BASE_URL)
            .base_path(&base)
            .download_and_extract()
            .label_format_digit()
            .training_set_length(TRAIN_LEN)
            .validation_set_length(0)
            .test_set_length(TEST_LEN)
            .finalize()
    })?;
    let data = FashionMnistData {
        train: to_drawings(&raw.trn_img, &raw.trn_lbl),
        test: to_drawings(&raw.tst_img, &raw.tst_lbl),
    };
    let (n, h, w) = data.train_shape();
    log::info!("Train ({n}, {h}, {w}) ({n},)");
    let (n, h, w) = data.test_shape();
    log::info!("Test ({n}, {h}, {w}) ({n},)");
    Ok(data)
}

/// Fashion-MNIST training set as a [`Dataset`].
pub struct FashionMnist {
    pub dir: PathBuf,
}

impl Dataset for FashionMnist {
    type Item = Drawing;

    fn load(&self) -> Result<Vec<Drawing>> {
        Ok(load(&self.dir)?.train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bytes_become_labelled_drawings() {
        let images = vec![7u8; IMAGE_PIXELS * 2];
        let drawings = to_drawings(&images, &[3, 9]);
        assert_eq!(drawings.len(), 2);
        assert_eq!(drawings[1].label, 9);
        assert_eq!(drawings[0].pixels.len(), IMAGE_PIXELS);
    }

    #[test]
    fn loader_panic_becomes_dataset_error() {
        let err = catch_loader_panic(|| -> usize { panic!("archive missing") }).unwrap_err();
        assert!(matches!(err, Error::Dataset(ref msg) if msg == "archive missing"));

        let path = String::from("t10k-images");
        let err = catch_loader_panic(move || -> usize { panic!("cannot open {path}") }).unwrap_err();
        assert!(matches!(err, Error::Dataset(ref msg) if msg == "cannot open t10k-images"));

        assert_eq!(catch_loader_panic(|| 7).unwrap(), 7);
    }
}
