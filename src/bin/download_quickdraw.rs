use clap::Parser;
use doodlegan::data::quickdraw::{self, CATEGORIES, DEFAULT_BASE_URL};
use doodlegan::util::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;

/// Fetch the Quick Draw bitmap dumps for every trained category.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory the `.npy` files are written to.
    #[arg(long, default_value = "quickdraw/bitmap")]
    dir: PathBuf,
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    match quickdraw::download(&args.dir, &args.base_url, &CATEGORIES) {
        Ok(paths) => {
            log::info!("{} files in {}", paths.len(), args.dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("download failed: {e}");
            ExitCode::FAILURE
        }
    }
}
