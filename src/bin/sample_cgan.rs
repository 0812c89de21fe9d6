use clap::Parser;
use doodlegan::data::quickdraw::{self, label_for};
use doodlegan::plot::save_sample_grid;
use doodlegan::rng::rng_from_seed;
use doodlegan::train::{generate_latent_points, grid_labels};
use doodlegan::util::logging::init_logging;
use doodlegan::{weights, Error, Result};
use std::path::PathBuf;
use std::process::ExitCode;

/// Draw a grid of doodles from a saved generator.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = "cgan_doodle_generator.json")]
    model: PathBuf,
    /// Draw every tile from this class index.
    #[arg(long, conflicts_with = "category")]
    label: Option<usize>,
    /// Draw every tile from this category name, e.g. `banana`.
    #[arg(long)]
    category: Option<String>,
    #[arg(long, default_value_t = 10)]
    grid: usize,
    #[arg(long, default_value = "samples.png")]
    out: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
}

fn run(args: &Args) -> Result<()> {
    let generator = weights::load_generator(&args.model)?;
    let cfg = generator.config();
    let fixed = match (&args.category, args.label) {
        (Some(name), _) => Some(label_for(name)?),
        (None, Some(label)) if label >= cfg.n_classes => {
            return Err(Error::InvalidLabel {
                label,
                n_classes: cfg.n_classes,
            })
        }
        (None, label) => label,
    };
    let labels = match fixed {
        Some(label) => vec![label; args.grid * args.grid],
        None => grid_labels(args.grid, cfg.n_classes),
    };
    let mut rng = rng_from_seed(args.seed);
    let (z, _) = generate_latent_points(cfg.latent_dim, labels.len(), cfg.n_classes, &mut rng);
    let mut images = generator.forward(&z, &labels)?;
    quickdraw::unscale_pixels(&mut images.data);
    save_sample_grid(&images, args.grid, &args.out)?;
    log::info!("wrote {} samples to {}", labels.len(), args.out.display());
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("sampling failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
