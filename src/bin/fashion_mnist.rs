use clap::Parser;
use doodlegan::data::quickdraw::{to_matrix, unscale_pixels};
use doodlegan::data::{fashion_mnist, DataLoader};
use doodlegan::plot::save_sample_grid;
use doodlegan::rng::rng_from_env;
use doodlegan::util::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;

/// Load Fashion-MNIST and report its shapes.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = "data/fashion")]
    dir: PathBuf,
    /// Also write a 10x10 grid of shuffled training images.
    #[arg(long)]
    plot: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    let data = match fashion_mnist::load(&args.dir) {
        Ok(data) => data,
        Err(e) => {
            log::error!("failed to load Fashion-MNIST: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(path) = args.plot else {
        return ExitCode::SUCCESS;
    };
    let mut rng = rng_from_env();
    let mut loader = DataLoader::new(data.train.iter().collect::<Vec<_>>(), 100).shuffled(&mut rng);
    let Some(batch) = loader.next() else {
        return ExitCode::SUCCESS;
    };
    let (mut images, _) = to_matrix(&batch);
    unscale_pixels(&mut images.data);
    if let Err(e) = save_sample_grid(&images, 10, &path) {
        log::error!("failed to write {}: {e}", path.display());
        return ExitCode::FAILURE;
    }
    log::info!("wrote {}", path.display());
    ExitCode::SUCCESS
}
