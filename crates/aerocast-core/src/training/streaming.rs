use aerocast_training::{
    make_artifact, DatasetCursor, Frame, FsModelStore, Imputer, ModelLayout, ModelSet, ModelSnapshot, ModelStore,
    ProgressEvent, ProgressSink, RunningScaler, ScalerMode, StandardScaler, Trainer, TrainerStatus, TrainingError,
    TrainingJob, TrainingJobId, TrainingManifest, TrainingResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Chunked trainer: read a window, impute, scale, update every target model,
/// advance, and persist once the training source is exhausted.
///
/// Feature and target frames are allocated once per run and refilled for each
/// chunk, so memory follows the chunk size rather than the dataset size.
#[derive(Clone)]
pub struct StreamingTrainer {
    store: FsModelStore,
    statuses: Arc<Mutex<HashMap<String, TrainerStatus>>>,
    cancellations: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl StreamingTrainer {
    #[must_use]
    pub fn new(layout: ModelLayout) -> Self {
        Self {
            store: FsModelStore::new(layout),
            statuses: Arc::new(Mutex::new(HashMap::new())),
            cancellations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn store(&self) -> &FsModelStore {
        &self.store
    }

    fn set_status(&self, job_id: &TrainingJobId, status: TrainerStatus) {
        if let Ok(mut s) = self.statuses.lock() {
            s.insert(job_id.0.clone(), status);
        }
    }

    fn cancellation(&self, job_id: &TrainingJobId) -> CancellationToken {
        self.cancellations
            .lock()
            .map(|mut c| c.entry(job_id.0.clone()).or_default().clone())
            .unwrap_or_default()
    }

    async fn train(&self, job: &TrainingJob, progress: &dyn ProgressSink) -> TrainingResult<TrainingManifest> {
        let job_id = job.job_id.clone();
        let cancel = self.cancellation(&job_id);
        let pause = Duration::from_millis(job.chunk_pause_ms);

        progress.on_event(ProgressEvent::Started {
            job_id: job_id.clone(),
            domain: job.domain.name.clone(),
            targets: job.targets.clone(),
        });

        let feature_cursor = DatasetCursor::new(job.domain.train.features.clone());
        let target_cursor = DatasetCursor::new(job.domain.train.targets.clone());
        let imputer = Imputer::new(job.domain.target_fill);

        let mut models = ModelSet::new(&job.targets, &job.regressor);
        let mut scaler = StandardScaler::new();
        let mut running = RunningScaler::new();
        let mut features = Frame::default();
        let mut targets = Frame::default();
        let mut feature_columns: Option<Vec<String>> = None;

        let mut offset = 0usize;
        let mut chunks = 0u64;

        self.set_status(&job_id, TrainerStatus::Running);

        loop {
            tracing::debug!(offset, "reading train data");
            let fw = feature_cursor.read_window(offset, job.chunk_size, &mut features)?;
            let tw = target_cursor.read_window(offset, job.chunk_size, &mut targets)?;
            if fw.rows != tw.rows {
                return Err(TrainingError::RowMisalignment { features: fw.rows, targets: tw.rows });
            }

            if fw.rows > 0 {
                if let Some(columns) = &feature_columns {
                    features.ensure_same_columns(columns)?;
                } else {
                    for target in &job.targets {
                        if targets.column(target).is_none() {
                            return Err(TrainingError::UnknownTarget(format!(
                                "{target} is not a numeric column of {}",
                                target_cursor.path().display()
                            )));
                        }
                    }
                    feature_columns = Some(features.columns().to_vec());
                }

                let filled = imputer.impute_features(&mut features);
                imputer.impute_targets(&mut targets);
                tracing::debug!(
                    cells = filled.filled_cells,
                    degenerate = filled.degenerate_columns.len(),
                    "missing values filled"
                );

                match job.scaler_mode {
                    ScalerMode::PerChunk => scaler.fit_transform(&mut features)?,
                    ScalerMode::Running => {
                        running.partial_fit(&features)?;
                        running.state()?.transform(&mut features)?;
                    }
                }

                for target in &job.targets {
                    tracing::debug!(target_name = %target, "training model");
                    models.update(&features, &targets, target)?;
                }
                chunks += 1;
            }

            offset += fw.rows;
            if fw.rows > 0 {
                progress.on_event(ProgressEvent::Chunk { job_id: job_id.clone(), index: chunks, rows: fw.rows, offset });
            }

            if fw.exhausted {
                break;
            }

            if cancel.is_cancelled() {
                return Err(TrainingError::Cancelled(job_id.0.clone()));
            }
            if pause.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    () = cancel.cancelled() => return Err(TrainingError::Cancelled(job_id.0.clone())),
                    () = tokio::time::sleep(pause) => {}
                }
            }
        }

        let feature_columns = feature_columns.unwrap_or_default();
        let scaler_state = match job.scaler_mode {
            ScalerMode::PerChunk => None,
            ScalerMode::Running => Some(running.state()?),
        };

        let mut artifacts = Vec::with_capacity(models.len());
        for (target, regressor) in models.into_models() {
            let snapshot = ModelSnapshot {
                target: target.clone(),
                domain: job.domain.name.clone(),
                feature_columns: feature_columns.clone(),
                scaler: scaler_state.clone(),
                regressor,
                saved_at: chrono::Utc::now(),
            };
            let path = self.store.save(&target, &snapshot)?;
            progress.on_event(ProgressEvent::Persisted { job_id: job_id.clone(), target: target.clone(), path: path.clone() });
            artifacts.push(make_artifact(&target, path)?);
        }

        let manifest = TrainingManifest {
            job_id: job_id.clone(),
            created_at: chrono::Utc::now(),
            domain: job.domain.name.clone(),
            chunk_size: job.chunk_size,
            chunks,
            rows: offset as u64,
            scaler_mode: job.scaler_mode,
            feature_columns,
            artifacts,
        };
        manifest.write(&self.store.layout().manifest_path(&job.domain.name))?;

        progress.on_event(ProgressEvent::Finished { job_id, rows: manifest.rows });
        Ok(manifest)
    }
}

#[async_trait]
impl Trainer for StreamingTrainer {
    fn id(&self) -> &'static str {
        "streaming"
    }

    async fn prepare(&self, job: &TrainingJob) -> TrainingResult<()> {
        self.set_status(&job.job_id, TrainerStatus::Preparing);
        job.validate()?;
        self.store.layout().ensure_dirs()?;
        self.cancellation(&job.job_id);
        Ok(())
    }

    async fn run(&self, job: &TrainingJob, progress: &dyn ProgressSink) -> TrainingResult<TrainingManifest> {
        job.validate()?;

        let span = tracing::info_span!("train", domain = %job.domain.name);
        let result = self.train(job, progress).instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(manifest) => tracing::info!(chunks = manifest.chunks, rows = manifest.rows, "training finished"),
            Err(e) => tracing::warn!("training stopped: {e}"),
        });

        let status = match &result {
            Ok(_) => TrainerStatus::Finished,
            Err(TrainingError::Cancelled(_)) => TrainerStatus::Cancelled,
            Err(e) => TrainerStatus::Failed(e.to_string()),
        };
        self.set_status(&job.job_id, status);
        if let Ok(mut c) = self.cancellations.lock() {
            c.remove(&job.job_id.0);
        }
        result
    }

    async fn status(&self, job_id: &TrainingJobId) -> TrainingResult<TrainerStatus> {
        Ok(self
            .statuses
            .lock()
            .ok()
            .and_then(|s| s.get(&job_id.0).cloned())
            .unwrap_or(TrainerStatus::Idle))
    }

    async fn cancel(&self, job_id: &TrainingJobId) -> TrainingResult<()> {
        if let Some(token) = self.cancellations.lock().ok().and_then(|c| c.get(&job_id.0).cloned()) {
            token.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerocast_training::{CsvSource, DatasetPair, DomainSpec, FillPolicy};
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        chunks: Mutex<Vec<usize>>,
    }

    impl ProgressSink for RecordingSink {
        fn on_event(&self, event: ProgressEvent) {
            if let ProgressEvent::Chunk { rows, .. } = event {
                self.chunks.lock().unwrap().push(rows);
            }
        }
    }

    fn write_dataset(dir: &Path, rows: usize) {
        let mut x = String::from(",f1,f2,station\n");
        let mut y = String::from("a,b\n");
        for i in 0..rows {
            let f1 = (i % 7) as f64;
            let f2 = (i % 3) as f64;
            x.push_str(&format!("{i},{f1},{f2},st{}\n", i % 2));
            y.push_str(&format!("{},{}\n", f1 + f2, if i % 4 == 0 { String::new() } else { "1".to_string() }));
        }
        std::fs::write(dir.join("x.csv"), x).unwrap();
        std::fs::write(dir.join("y.csv"), y).unwrap();
    }

    fn domain(dir: &Path) -> DomainSpec {
        let pair = DatasetPair {
            features: CsvSource::with_index_column(dir.join("x.csv")),
            targets: CsvSource::new(dir.join("y.csv")),
        };
        DomainSpec {
            name: "unit".to_string(),
            train: pair.clone(),
            test: pair,
            targets: vec!["a".to_string(), "b".to_string()],
            target_fill: FillPolicy::Zero,
        }
    }

    #[tokio::test]
    async fn test_chunks_follow_window_size_and_models_persist() {
        let temp = TempDir::new().unwrap();
        write_dataset(temp.path(), 25);
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));
        let job = TrainingJob::new(domain(temp.path()), 10);
        let sink = RecordingSink::default();

        trainer.prepare(&job).await.unwrap();
        let manifest = trainer.run(&job, &sink).await.unwrap();

        assert_eq!(*sink.chunks.lock().unwrap(), vec![10, 10, 5]);
        assert_eq!(manifest.chunks, 3);
        assert_eq!(manifest.rows, 25);
        assert_eq!(manifest.feature_columns, vec!["f1".to_string(), "f2".to_string()]);
        assert_eq!(manifest.artifacts.len(), 2);
        assert!(trainer.store().layout().manifest_path("unit").exists());
        assert_eq!(trainer.store().load("a").unwrap().rows_seen(), 25);
        assert_eq!(trainer.status(&job.job_id).await.unwrap(), TrainerStatus::Finished);
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_on_empty_window() {
        let temp = TempDir::new().unwrap();
        write_dataset(temp.path(), 20);
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));
        let job = TrainingJob::new(domain(temp.path()), 10);
        let sink = RecordingSink::default();

        let manifest = trainer.run(&job, &sink).await.unwrap();
        assert_eq!(*sink.chunks.lock().unwrap(), vec![10, 10]);
        assert_eq!(manifest.chunks, 2);
        assert_eq!(manifest.rows, 20);
    }

    #[tokio::test]
    async fn test_running_scaler_is_persisted() {
        let temp = TempDir::new().unwrap();
        write_dataset(temp.path(), 25);
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));
        let mut job = TrainingJob::new(domain(temp.path()), 10);
        job.scaler_mode = ScalerMode::Running;

        trainer.run(&job, &RecordingSink::default()).await.unwrap();
        let snapshot = trainer.store().load("b").unwrap();
        let scaler = snapshot.scaler.unwrap();
        assert_eq!(scaler.columns, vec!["f1".to_string(), "f2".to_string()]);
        // mean of i % 3 over 0..25
        assert!((scaler.mean[1] - 24.0 / 25.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_target_column_fails_before_persisting() {
        let temp = TempDir::new().unwrap();
        write_dataset(temp.path(), 5);
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));
        let mut spec = domain(temp.path());
        spec.targets.push("c".to_string());
        let job = TrainingJob::new(spec, 10);

        let err = trainer.run(&job, &RecordingSink::default()).await.unwrap_err();
        assert!(matches!(err, TrainingError::UnknownTarget(_)));
        assert!(matches!(trainer.store().load("a"), Err(TrainingError::ModelNotFound(_))));
        assert!(matches!(trainer.status(&job.job_id).await.unwrap(), TrainerStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_cancel_is_honored_at_chunk_boundary() {
        let temp = TempDir::new().unwrap();
        write_dataset(temp.path(), 25);
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));
        let job = TrainingJob::new(domain(temp.path()), 10);
        let sink = RecordingSink::default();

        trainer.prepare(&job).await.unwrap();
        trainer.cancel(&job.job_id).await.unwrap();
        let err = trainer.run(&job, &sink).await.unwrap_err();

        assert!(matches!(err, TrainingError::Cancelled(_)));
        assert_eq!(*sink.chunks.lock().unwrap(), vec![10]);
        assert!(matches!(trainer.store().load("a"), Err(TrainingError::ModelNotFound(_))));
        assert_eq!(trainer.status(&job.job_id).await.unwrap(), TrainerStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_of_unknown_job_leaves_no_token() {
        let temp = TempDir::new().unwrap();
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));

        trainer.cancel(&TrainingJobId::new()).await.unwrap();
        assert!(trainer.cancellations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_short_target_source_is_row_misalignment() {
        let temp = TempDir::new().unwrap();
        write_dataset(temp.path(), 25);
        let y = std::fs::read_to_string(temp.path().join("y.csv")).unwrap();
        let short: Vec<&str> = y.lines().take(1 + 22).collect();
        std::fs::write(temp.path().join("y.csv"), short.join("\n") + "\n").unwrap();
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));
        let job = TrainingJob::new(domain(temp.path()), 10);
        let sink = RecordingSink::default();

        let err = trainer.run(&job, &sink).await.unwrap_err();
        assert!(matches!(err, TrainingError::RowMisalignment { features: 5, targets: 2 }));
        assert_eq!(*sink.chunks.lock().unwrap(), vec![10, 10]);
        assert!(matches!(trainer.store().load("a"), Err(TrainingError::ModelNotFound(_))));
        assert!(!trainer.store().layout().manifest_path("unit").exists());
    }

    #[tokio::test]
    async fn test_feature_columns_changing_mid_stream_is_schema_mismatch() {
        let temp = TempDir::new().unwrap();
        write_dataset(temp.path(), 25);
        // f1 turns to text in row 22, so the third window loses that column
        let x = std::fs::read_to_string(temp.path().join("x.csv")).unwrap();
        let x = x.replace("\n22,1,", "\n22,n/a,");
        std::fs::write(temp.path().join("x.csv"), x).unwrap();
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));
        let job = TrainingJob::new(domain(temp.path()), 10);
        let sink = RecordingSink::default();

        let err = trainer.run(&job, &sink).await.unwrap_err();
        assert!(matches!(err, TrainingError::SchemaMismatch(_)));
        assert_eq!(*sink.chunks.lock().unwrap(), vec![10, 10]);
        assert!(matches!(trainer.store().load("b"), Err(TrainingError::ModelNotFound(_))));
        assert!(!trainer.store().layout().manifest_path("unit").exists());
    }

    #[tokio::test]
    async fn test_empty_training_source_is_no_data() {
        let temp = TempDir::new().unwrap();
        write_dataset(temp.path(), 0);
        let trainer = StreamingTrainer::new(ModelLayout::new(temp.path().join("models")));
        let job = TrainingJob::new(domain(temp.path()), 10);

        let err = trainer.run(&job, &RecordingSink::default()).await.unwrap_err();
        assert!(matches!(err, TrainingError::NoData(_)));
    }
}
