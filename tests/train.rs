use doodlegan::logging::MetricRecord;
use doodlegan::train;
use doodlegan::Error;

mod common;

#[test]
fn one_epoch_writes_every_artifact() {
    let data = common::scratch_dir("train_data");
    let out = common::scratch_dir("train_out");
    common::write_fake_quickdraw(&data, 10, 784);
    let cfg = common::tiny_train_config(&data, &out);

    let result = train::run(&cfg).unwrap();
    // 18 training drawings in batches of 4.
    assert_eq!(result.history.g_loss.len(), 4);
    assert_eq!(result.history.d_loss_real.len(), 4);
    assert!(result.history.g_loss.iter().all(|l| l.is_finite()));

    assert!(out.join("generated_plot_001.png").exists());
    assert!(out.join("model_001.json").exists());
    assert!(result.loss_plot.exists());
    assert!(result.final_model.exists());

    let grid = image::open(out.join("generated_plot_001.png")).unwrap();
    assert_eq!(grid.width(), 3 * 28 + 2 * 2);

    let jsonl = std::fs::read_to_string(out.join("metrics.jsonl")).unwrap();
    let records: Vec<MetricRecord> = jsonl
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 5);
    assert_eq!(records.iter().filter(|r| r.kind == "batch").count(), 4);
    assert_eq!(records.last().map(|r| r.kind.as_str()), Some("epoch"));
}

#[test]
fn class_count_must_match_categories() {
    let data = common::scratch_dir("train_classes_data");
    let out = common::scratch_dir("train_classes_out");
    common::write_fake_quickdraw(&data, 10, 784);

    for n_classes in [2, 5] {
        let mut cfg = common::tiny_train_config(&data, &out);
        cfg.model.n_classes = n_classes;
        let err = train::run(&cfg).unwrap_err();
        assert!(matches!(
            err,
            Error::ClassMismatch { configured, expected: 3 } if configured == n_classes
        ));
    }
    assert!(!out.join("model_001.json").exists());
    assert!(!out.join("final_generator.json").exists());
}
