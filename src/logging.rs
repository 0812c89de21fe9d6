use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Appends metric records to `metrics.jsonl` and `metrics.csv` in a run
/// directory.
pub struct Logger {
    json: File,
    csv: Writer<File>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub epoch: usize,
    pub step: usize,
    pub d_loss_real: f32,
    pub d_loss_fake: f32,
    pub g_loss: f32,
    pub d_acc_real: f32,
    pub d_acc_fake: f32,
    /// `"batch"` for per-step values, `"epoch"` for test-split evaluation.
    pub kind: String,
}

impl Logger {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let json_path = dir.join("metrics.jsonl");
        let csv_path = dir.join("metrics.csv");
        let json = OpenOptions::new()
            .create(true)
            .append(true)
            .open(json_path)?;
        let fresh_csv = !csv_path.exists();
        let csv_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(csv_path)?;
        let csv = csv::WriterBuilder::new()
            .has_headers(fresh_csv)
            .from_writer(csv_file);
        Ok(Logger { json, csv })
    }

    /// Write failures are logged and otherwise ignored.
    pub fn log<T: Serialize>(&mut self, metrics: &T) {
        if let Ok(line) = serde_json::to_string(metrics) {
            if let Err(e) = writeln!(self.json, "{}", line) {
                log::warn!("failed to append metrics.jsonl: {e}");
            }
        }
        let written = self
            .csv
            .serialize(metrics)
            .and_then(|()| self.csv.flush().map_err(csv::Error::from));
        if let Err(e) = written {
            log::warn!("failed to append metrics.csv: {e}");
        }
    }
}
