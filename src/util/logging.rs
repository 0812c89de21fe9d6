/// Install `env_logger`, defaulting to `info` unless `RUST_LOG` is set.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Format the per-batch line printed while training.
pub fn format_batch_summary(
    epoch: usize,
    batch: usize,
    batches: usize,
    d_loss_real: f32,
    d_loss_fake: f32,
    g_loss: f32,
) -> String {
    format!(
        ">{}, {}/{}, d1={:.3}, d2={:.3} g={:.3}",
        epoch + 1,
        batch + 1,
        batches,
        d_loss_real,
        d_loss_fake,
        g_loss
    )
}

/// Format a message reporting the total number of matrix operations.
pub fn format_total_ops(count: usize) -> String {
    format!("Total matrix ops: {}", count)
}

/// Log the total number of matrix operations at info level.
pub fn log_total_ops(count: usize) {
    log::info!("{}", format_total_ops(count));
}

/// Format a checkpoint saved message.
pub fn format_checkpoint_saved(epoch: usize, path: &std::path::Path) -> String {
    format!("Checkpoint saved at epoch {}: {}", epoch + 1, path.display())
}

/// Log that a checkpoint was saved at info level.
pub fn log_checkpoint_saved(epoch: usize, path: &std::path::Path) {
    log::info!("{}", format_checkpoint_saved(epoch, path));
}

/// Format the held-out discriminator accuracy reported after each epoch.
pub fn format_test_accuracy(real: f32, fake: f32) -> String {
    format!(
        "Test accuracy real: {:.0}%, fake: {:.0}%",
        real * 100.0,
        fake * 100.0
    )
}
