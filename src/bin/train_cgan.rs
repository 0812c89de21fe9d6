use clap::Parser;
use doodlegan::config::TrainConfig;
use doodlegan::train;
use doodlegan::util::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;

/// Train the conditional GAN on Quick Draw bitmaps.
///
/// Flags override values from `--config`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML or JSON training configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    epochs: Option<usize>,
    #[arg(long)]
    batch_size: Option<usize>,
    /// Directory holding `<category>.npy` files.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Where sample plots, checkpoints and metrics go.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> doodlegan::Result<TrainConfig> {
        let mut cfg = match &self.config {
            Some(path) => TrainConfig::from_path(path)?,
            None => TrainConfig::default(),
        };
        if let Some(epochs) = self.epochs {
            cfg.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            cfg.batch_size = batch_size;
        }
        if let Some(dir) = self.data_dir {
            cfg.data.dir = dir;
        }
        if let Some(dir) = self.out_dir {
            cfg.out_dir = dir;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    init_logging();
    let cfg = match Args::parse().into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::debug!("{cfg:?}");
    match train::run(&cfg) {
        Ok(out) => {
            log::info!(
                "trained {} batches, generator saved to {}",
                out.history.g_loss.len(),
                out.final_model.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("training failed: {e}");
            ExitCode::FAILURE
        }
    }
}
