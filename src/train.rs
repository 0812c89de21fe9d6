//! Adversarial training loop for the conditional GAN.

use crate::config::TrainConfig;
use crate::data::quickdraw::{self, Drawing, Split};
use crate::data::DataLoader;
use crate::error::{Error, Result};
use crate::logging::{Logger, MetricRecord};
use crate::math::{self, Matrix};
use crate::models::CGan;
use crate::plot;
use crate::rng::rng_from_seed;
use crate::util::logging::{
    format_batch_summary, format_test_accuracy, log_checkpoint_saved, log_total_ops,
};
use crate::weights;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use std::path::PathBuf;

/// Loss values recorded after every batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History {
    pub d_loss_real: Vec<f32>,
    pub d_loss_fake: Vec<f32>,
    pub g_loss: Vec<f32>,
}

/// Draw `n` real drawings uniformly with replacement.
pub fn generate_real_samples(
    train: &[Drawing],
    n: usize,
    rng: &mut StdRng,
) -> (Matrix, Vec<usize>) {
    let picked: Vec<&Drawing> = (0..n)
        .map(|_| &train[rng.gen_range(0..train.len())])
        .collect();
    quickdraw::to_matrix(&picked)
}

/// Standard normal latent points with uniformly drawn labels.
pub fn generate_latent_points(
    latent_dim: usize,
    n: usize,
    n_classes: usize,
    rng: &mut StdRng,
) -> (Matrix, Vec<usize>) {
    let z: Vec<f32> = (0..n * latent_dim)
        .map(|_| rng.sample(StandardNormal))
        .collect();
    let labels = (0..n).map(|_| rng.gen_range(0..n_classes)).collect();
    (Matrix::from_vec(n, latent_dim, z), labels)
}

/// Generate `n` images for random labels with the current generator.
pub fn generate_fake_samples(
    gan: &CGan,
    n: usize,
    rng: &mut StdRng,
) -> Result<(Matrix, Vec<usize>)> {
    let cfg = gan.generator.config();
    let (z, labels) = generate_latent_points(cfg.latent_dim, n, cfg.n_classes, rng);
    let images = gan.generate(&z, &labels)?;
    Ok((images, labels))
}

/// Labels for a `grid x grid` sample mosaic: each row shows one class,
/// cycling through the classes when there are more rows than classes.
pub fn grid_labels(grid: usize, n_classes: usize) -> Vec<usize> {
    (0..grid * grid).map(|i| (i / grid) % n_classes).collect()
}

/// Discriminator accuracy on held-out real drawings and on an equal number
/// of fresh fakes. Returns `(real, fake)`.
pub fn evaluate(
    gan: &CGan,
    test: &[Drawing],
    batch_size: usize,
    rng: &mut StdRng,
) -> Result<(f32, f32)> {
    if test.is_empty() {
        return Ok((0.0, 0.0));
    }
    let mut real_hits = 0.0;
    let mut fake_hits = 0.0;
    for batch in DataLoader::new(test.iter().collect::<Vec<_>>(), batch_size) {
        let n = batch.len();
        let (images, labels) = quickdraw::to_matrix(&batch);
        let probs = gan.discriminator.predict(&images, &labels)?;
        real_hits += math::binary_accuracy(&probs, &vec![1.0; n]) * n as f32;

        let (fakes, labels) = generate_fake_samples(gan, n, rng)?;
        let probs = gan.discriminator.predict(&fakes, &labels)?;
        fake_hits += math::binary_accuracy(&probs, &vec![0.0; n]) * n as f32;
    }
    let total = test.len() as f32;
    Ok((real_hits / total, fake_hits / total))
}

/// Sample grid, generator checkpoint and held-out accuracy for one epoch.
pub fn summarize_performance(
    epoch: usize,
    gan: &CGan,
    split: &Split,
    cfg: &TrainConfig,
    rng: &mut StdRng,
) -> Result<(f32, f32)> {
    let model = gan.generator.config();
    let labels = grid_labels(cfg.grid, model.n_classes);
    let (z, _) = generate_latent_points(model.latent_dim, labels.len(), model.n_classes, rng);
    let mut images = gan.generate(&z, &labels)?;
    quickdraw::unscale_pixels(&mut images.data);
    let plot_path = cfg.out_dir.join(format!("generated_plot_{:03}.png", epoch + 1));
    plot::save_sample_grid(&images, cfg.grid, &plot_path)?;

    let model_path = cfg.out_dir.join(format!("model_{:03}.json", epoch + 1));
    weights::save_generator(&model_path, &gan.generator)?;
    log_checkpoint_saved(epoch, &model_path);

    let (real, fake) = evaluate(gan, &split.test, cfg.batch_size, rng)?;
    log::info!("{}", format_test_accuracy(real, fake));
    Ok((real, fake))
}

/// Train `gan` on `split.train` for `cfg.epochs` epochs.
///
/// Every batch updates the discriminator on half a batch of real drawings,
/// then on half a batch of fakes, then updates the generator through the
/// discriminator on a full batch of latent points labelled real.
pub fn train(gan: &mut CGan, split: &Split, cfg: &TrainConfig, rng: &mut StdRng) -> Result<History> {
    let mut history = History::default();
    if split.train.is_empty() {
        log::warn!("no training drawings, skipping training");
        return Ok(history);
    }
    let batch_size = cfg.batch_size.max(2);
    let bat_per_epo = split.train.len() / batch_size;
    let half_batch = batch_size / 2;
    let (latent_dim, n_classes) = {
        let model = gan.generator.config();
        (model.latent_dim, model.n_classes)
    };
    let mut logger = Logger::new(&cfg.out_dir)?;
    let mut step = 0;

    for epoch in 0..cfg.epochs {
        let pb = ProgressBar::new(bat_per_epo as u64);
        for j in 0..bat_per_epo {
            let (x_real, labels_real) = generate_real_samples(&split.train, half_batch, rng);
            let (d_loss1, d_acc1) = gan.train_discriminator(&x_real, &labels_real, 1.0)?;

            let (x_fake, labels_fake) = generate_fake_samples(gan, half_batch, rng)?;
            let (d_loss2, d_acc2) = gan.train_discriminator(&x_fake, &labels_fake, 0.0)?;

            let (z, labels) = generate_latent_points(latent_dim, batch_size, n_classes, rng);
            let g_loss = gan.train_generator(&z, &labels)?;

            let line = format_batch_summary(epoch, j, bat_per_epo, d_loss1, d_loss2, g_loss);
            pb.suspend(|| log::info!("{line}"));
            pb.inc(1);

            history.d_loss_real.push(d_loss1);
            history.d_loss_fake.push(d_loss2);
            history.g_loss.push(g_loss);
            logger.log(&MetricRecord {
                epoch,
                step,
                d_loss_real: d_loss1,
                d_loss_fake: d_loss2,
                g_loss,
                d_acc_real: d_acc1,
                d_acc_fake: d_acc2,
                kind: "batch".into(),
            });
            step += 1;
        }
        pb.finish_and_clear();

        let (acc_real, acc_fake) = summarize_performance(epoch, gan, split, cfg, rng)?;
        logger.log(&MetricRecord {
            epoch,
            step,
            d_loss_real: history.d_loss_real.last().copied().unwrap_or(f32::NAN),
            d_loss_fake: history.d_loss_fake.last().copied().unwrap_or(f32::NAN),
            g_loss: history.g_loss.last().copied().unwrap_or(f32::NAN),
            d_acc_real: acc_real,
            d_acc_fake: acc_fake,
            kind: "epoch".into(),
        });
    }
    log_total_ops(math::matrix_ops_count());
    Ok(history)
}

/// Files written by [`run`] besides the per-epoch outputs.
#[derive(Clone, Debug)]
pub struct RunOutputs {
    pub history: History,
    pub loss_plot: PathBuf,
    pub final_model: PathBuf,
}

/// Load the Quick Draw split, build a fresh model, train it and write the
/// loss plot and final generator.
///
/// `cfg.model.n_classes` must equal the number of Quick Draw categories.
pub fn run(cfg: &TrainConfig) -> Result<RunOutputs> {
    if cfg.model.n_classes != quickdraw::CATEGORIES.len() {
        return Err(Error::ClassMismatch {
            configured: cfg.model.n_classes,
            expected: quickdraw::CATEGORIES.len(),
        });
    }
    let split = quickdraw::load(&cfg.data)?;
    log::info!(
        "Train {} drawings, test {} drawings",
        split.train.len(),
        split.test.len()
    );
    let mut rng = rng_from_seed(cfg.seed);
    let mut gan = CGan::new(&cfg.model, &cfg.optim, &mut rng);
    let history = train(&mut gan, &split, cfg, &mut rng)?;

    let loss_plot = cfg.out_dir.join("plot_line_plot_loss.png");
    plot::plot_history(
        &history.d_loss_real,
        &history.d_loss_fake,
        &history.g_loss,
        &loss_plot,
    )?;
    log::info!("Loss plot written to {}", loss_plot.display());
    weights::save_generator(&cfg.final_model, &gan.generator)?;
    Ok(RunOutputs {
        history,
        loss_plot,
        final_model: cfg.final_model.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rows_cycle_through_classes() {
        let labels = grid_labels(4, 3);
        assert_eq!(&labels[0..4], &[0, 0, 0, 0]);
        assert_eq!(&labels[4..8], &[1, 1, 1, 1]);
        assert_eq!(&labels[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn latent_points_have_requested_shape() {
        let mut rng = rng_from_seed(Some(5));
        let (z, labels) = generate_latent_points(8, 6, 3, &mut rng);
        assert_eq!((z.rows, z.cols), (6, 8));
        assert!(labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn real_samples_are_scaled() {
        let mut rng = rng_from_seed(Some(6));
        let train = vec![Drawing {
            pixels: vec![255; 784],
            label: 2,
        }];
        let (x, labels) = generate_real_samples(&train, 3, &mut rng);
        assert_eq!(labels, vec![2, 2, 2]);
        assert!(x.data.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
}
