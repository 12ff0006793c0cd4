//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use aerocast_core::{DomainConfig, PipelineConfig};
use aerocast_training::{ProgressEvent, ProgressSink, RegressorSpec, SgdParams};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Mutex;

/// Features of row `i`: two deterministic, well-spread columns.
pub fn features(i: usize) -> (f64, f64) {
    (((i * 37) % 101) as f64 / 10.0, ((i * 53) % 97) as f64 / 10.0)
}

/// Target `a` is linear in the features. Target `b` is missing on every
/// training row and alternates between 1 and -1 on test rows.
pub fn write_split(dir: &Path, prefix: &str, rows: std::ops::Range<usize>, train: bool) {
    let mut x = String::from(",f1,f2,station\n");
    let mut y = String::from("a,b\n");
    for i in rows {
        let (f1, f2) = features(i);
        writeln!(x, "{i},{f1},{f2},st{}", i % 3).unwrap();
        let b = if train { String::new() } else if i % 2 == 0 { "1".to_string() } else { "-1".to_string() };
        writeln!(y, "{},{b}", 3.0 * f1 - 2.0 * f2 + 5.0).unwrap();
    }
    std::fs::write(dir.join(format!("{prefix}_x.csv")), x).unwrap();
    std::fs::write(dir.join(format!("{prefix}_y.csv")), y).unwrap();
}

/// 100 training rows, 20 held-out rows and a config pointing at them.
pub fn fixture(dir: &Path) -> PipelineConfig {
    write_split(dir, "train", 0..100, true);
    write_split(dir, "test", 100..120, false);

    let mut config = PipelineConfig {
        data_dir: dir.to_path_buf(),
        model_dir: dir.join("models"),
        log_file: dir.join("log.txt"),
        chunk_size: 40,
        regressor: RegressorSpec::Sgd(SgdParams { eta0: 0.1, ..Default::default() }),
        ..PipelineConfig::default()
    };
    config.domains.insert(
        "unit".to_string(),
        DomainConfig {
            train_features: "train_x.csv".into(),
            train_targets: "train_y.csv".into(),
            test_features: "test_x.csv".into(),
            test_targets: "test_y.csv".into(),
            targets: vec!["a".to_string(), "b".to_string()],
            target_fill: None,
        },
    );
    config
}

/// Records the row count of every chunk event.
#[derive(Default)]
pub struct ChunkRecorder {
    pub rows: Mutex<Vec<usize>>,
}

impl ProgressSink for ChunkRecorder {
    fn on_event(&self, event: ProgressEvent) {
        if let ProgressEvent::Chunk { rows, .. } = event {
            self.rows.lock().unwrap().push(rows);
        }
    }
}
