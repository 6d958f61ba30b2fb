//! Parallel batch processor.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::backup::create_backup;
use super::config::BatchConfig;
use super::stats::BatchStats;
use super::types::{BatchReport, ImageJob, ImageReport, OperationRequest};
use crate::converter::{is_same_file, Converter, Operation};

/// Validates `job.path` once, then runs each operation in order.
///
/// Every result is kept, failed or not. Invalid input yields a report with the
/// validation error and no operations run. The report succeeds when at least
/// one operation did.
///
/// With `backup_original` set, the source is copied aside before the first
/// operation that rewrites it in place. A failed backup is logged and the job
/// carries on.
pub async fn process_image<C: Converter + ?Sized>(
    converter: &C,
    job: &ImageJob,
    config: &BatchConfig,
) -> ImageReport {
    let info = match converter.inspect(&job.path).await {
        Ok(info) => info,
        Err(e) => {
            let original_size = tokio::fs::metadata(&job.path)
                .await
                .map(|m| m.len())
                .unwrap_or(0);
            debug!(file = %job.path.display(), error = %e, "Image rejected");
            return ImageReport::failed(&job.path, original_size, e.messages());
        }
    };

    let mut report = ImageReport {
        path: job.path.clone(),
        original_size: info.size_bytes,
        success: false,
        results: Vec::with_capacity(job.operations.len()),
        total_savings: 0,
        errors: Vec::new(),
        backup_path: None,
    };

    for request in &job.operations {
        if config.backup_original
            && report.backup_path.is_none()
            && rewrites_source(&job.path, request).await
        {
            match create_backup(&job.path, &config.backup_dir).await {
                Ok(path) => report.backup_path = Some(path),
                Err(e) => {
                    warn!(file = %job.path.display(), error = %e, "Failed to back up original")
                }
            }
        }

        let result = converter
            .convert(&job.path, request.operation, &request.options)
            .await;
        if result.success {
            report.success = true;
            report.total_savings += result.bytes_saved();
        } else {
            report.errors.extend(result.errors.iter().cloned());
        }
        report.results.push(result);
    }

    report
}

/// Whether `request` writes over the file at `source`.
async fn rewrites_source(source: &Path, request: &OperationRequest) -> bool {
    match request.operation {
        Operation::Optimize | Operation::Resize => match &request.options.output_path {
            None => true,
            Some(output) => is_same_file(source, output).await,
        },
        Operation::Webp | Operation::Avif => false,
    }
}

/// Runs image jobs concurrently with a parallelism bound.
pub struct BatchProcessor<C: Converter> {
    config: Arc<BatchConfig>,
    converter: Arc<C>,
    semaphore: Arc<Semaphore>,
    stats: Arc<BatchStats>,
}

impl<C: Converter + 'static> BatchProcessor<C> {
    /// Creates a new batch processor.
    pub fn new(config: BatchConfig, converter: Arc<C>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_parallel.max(1)));
        Self {
            config: Arc::new(config),
            converter,
            semaphore,
            stats: Arc::new(BatchStats::new()),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn converter(&self) -> &Arc<C> {
        &self.converter
    }

    pub fn stats(&self) -> &Arc<BatchStats> {
        &self.stats
    }

    /// Processes a single image under the same parallelism bound.
    pub async fn process_one(&self, job: ImageJob) -> ImageReport {
        let report = run_job(
            Arc::clone(&self.converter),
            Arc::clone(&self.semaphore),
            Arc::clone(&self.config),
            job,
        )
        .await;
        self.stats.record(&report).await;
        report
    }

    /// Processes every job, each on its own task.
    ///
    /// A job that fails or panics gets a failed report; the rest carry on.
    pub async fn process_batch(&self, jobs: Vec<ImageJob>) -> BatchReport {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(batch_id = %id, jobs = jobs.len(), max_parallel = self.config.max_parallel, "Batch started");

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let path = job.path.clone();
                let converter = Arc::clone(&self.converter);
                let semaphore = Arc::clone(&self.semaphore);
                let config = Arc::clone(&self.config);
                (path, tokio::spawn(run_job(converter, semaphore, config, job)))
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (path, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => {
                    error!(batch_id = %id, file = %path.display(), error = %e, "Batch job aborted");
                    ImageReport::failed(path, 0, vec![format!("job aborted: {}", e)])
                }
            };
            self.stats.record(&report).await;
            reports.push(report);
        }

        let succeeded = reports.iter().filter(|r| r.success).count();
        let failed = reports.len() - succeeded;
        let report = BatchReport {
            id,
            reports,
            succeeded,
            failed,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            batch_id = %id,
            succeeded,
            failed,
            total_savings = report.total_savings(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch finished"
        );

        report
    }
}

async fn run_job<C: Converter>(
    converter: Arc<C>,
    semaphore: Arc<Semaphore>,
    config: Arc<BatchConfig>,
    job: ImageJob,
) -> ImageReport {
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return ImageReport::failed(&job.path, 0, vec!["batch processor shut down".to_string()])
        }
    };
    process_image(converter.as_ref(), &job, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ConversionOptions, Operation};
    use crate::testing::{fixtures, MockConverter};
    use crate::batch::OperationRequest;
    use std::time::Duration;
    use tempfile::TempDir;

    fn processor(max_parallel: usize) -> (BatchProcessor<MockConverter>, Arc<MockConverter>) {
        let converter = Arc::new(MockConverter::new());
        let processor = BatchProcessor::new(
            BatchConfig::default().with_max_parallel(max_parallel),
            Arc::clone(&converter),
        );
        (processor, converter)
    }

    #[tokio::test]
    async fn test_process_image_runs_operations_in_order() {
        let dir = TempDir::new().unwrap();
        let path = fixtures::write_file(dir.path(), "photo.jpg", 1000).unwrap();
        let converter = MockConverter::new();
        let job = ImageJob::new(&path)
            .with_operation(Operation::Optimize)
            .with_request(
                OperationRequest::new(Operation::Webp)
                    .with_options(ConversionOptions::new().with_quality(70)),
            )
            .with_operation(Operation::Avif);

        let report = process_image(&converter, &job, &BatchConfig::default()).await;

        assert!(report.success);
        assert_eq!(report.original_size, 1000);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.total_savings, 1500);
        let recorded = converter.recorded_conversions().await;
        let operations: Vec<_> = recorded.iter().map(|c| c.operation).collect();
        assert_eq!(
            operations,
            vec![Operation::Optimize, Operation::Webp, Operation::Avif]
        );
        assert_eq!(recorded[1].options.quality, Some(70));
    }

    #[tokio::test]
    async fn test_process_image_invalid_input_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let converter = MockConverter::new();
        let job = ImageJob::new(dir.path().join("missing.png")).with_operation(Operation::Webp);

        let report = process_image(&converter, &job, &BatchConfig::default()).await;

        assert!(!report.success);
        assert!(report.results.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(converter.conversion_count().await, 0);
    }

    #[tokio::test]
    async fn test_process_image_keeps_going_after_failed_operation() {
        let dir = TempDir::new().unwrap();
        let path = fixtures::write_file(dir.path(), "photo.jpg", 1000).unwrap();
        let converter = MockConverter::new();
        converter.fail_path(&path).await;
        let job = ImageJob::new(&path)
            .with_operation(Operation::Webp)
            .with_operation(Operation::Avif);

        let report = process_image(&converter, &job, &BatchConfig::default()).await;

        assert!(!report.success);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.total_savings, 0);
    }

    #[tokio::test]
    async fn test_process_image_succeeds_if_any_operation_did() {
        let dir = TempDir::new().unwrap();
        let path = fixtures::write_file(dir.path(), "photo.jpg", 1000).unwrap();
        let converter = MockConverter::new();
        converter.fail_operation(Operation::Avif).await;
        let job = ImageJob::new(&path)
            .with_operation(Operation::Webp)
            .with_operation(Operation::Avif);

        let report = process_image(&converter, &job, &BatchConfig::default()).await;

        assert!(report.success);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].success);
        assert!(!report.results[1].success);
        assert_eq!(report.errors, vec!["mock failed with exit code 1: simulated failure"]);
        assert_eq!(report.total_savings, 500);
    }

    #[tokio::test]
    async fn test_process_image_without_operations_is_not_a_success() {
        let dir = TempDir::new().unwrap();
        let path = fixtures::write_file(dir.path(), "photo.jpg", 1000).unwrap();

        let report =
            process_image(&MockConverter::new(), &ImageJob::new(&path), &BatchConfig::default())
                .await;

        assert!(!report.success);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_process_image_backs_up_before_in_place_operation() {
        let dir = TempDir::new().unwrap();
        let path = fixtures::write_file(dir.path(), "photo.jpg", 1000).unwrap();
        let backups = dir.path().join("backups");
        let config = BatchConfig::default().with_backup_dir(&backups);
        let job = ImageJob::new(&path)
            .with_operation(Operation::Webp)
            .with_operation(Operation::Optimize)
            .with_operation(Operation::Optimize);

        let report = process_image(&MockConverter::new(), &job, &config).await;

        assert!(report.success);
        let backup = report.backup_path.expect("backup taken");
        assert!(backup.starts_with(&backups));
        assert_eq!(backup.file_name().unwrap(), "photo.jpg");
        assert_eq!(std::fs::metadata(&backup).unwrap().len(), 1000);
        // One copy per job, however many in-place operations it has.
        let month_dir = backup.parent().unwrap();
        assert_eq!(std::fs::read_dir(month_dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_process_image_skips_backup_when_nothing_is_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = fixtures::write_file(dir.path(), "photo.png", 1000).unwrap();
        let backups = dir.path().join("backups");
        let config = BatchConfig::default().with_backup_dir(&backups);
        let job = ImageJob::new(&path)
            .with_operation(Operation::Avif)
            .with_request(
                OperationRequest::new(Operation::Optimize).with_options(
                    ConversionOptions::new().with_output_path(dir.path().join("small.png")),
                ),
            );

        let report = process_image(&MockConverter::new(), &job, &config).await;

        assert!(report.success);
        assert!(report.backup_path.is_none());
        assert!(!backups.exists());
    }

    #[tokio::test]
    async fn test_failed_backup_does_not_stop_the_job() {
        let dir = TempDir::new().unwrap();
        let path = fixtures::write_file(dir.path(), "photo.jpg", 1000).unwrap();
        // A regular file where the backup tree should go.
        let blocker = fixtures::write_file(dir.path(), "backups", 1).unwrap();
        let config = BatchConfig::default().with_backup_dir(&blocker);
        let converter = MockConverter::new();
        let job = ImageJob::new(&path).with_operation(Operation::Optimize);

        let report = process_image(&converter, &job, &config).await;

        assert!(report.success);
        assert!(report.backup_path.is_none());
        assert_eq!(converter.conversion_count().await, 1);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures_and_keeps_order() {
        let dir = TempDir::new().unwrap();
        let good_a = fixtures::write_file(dir.path(), "a.jpg", 1000).unwrap();
        let bad = fixtures::write_file(dir.path(), "b.png", 1000).unwrap();
        let good_c = fixtures::write_file(dir.path(), "c.gif", 2000).unwrap();
        let (processor, converter) = processor(2);
        converter.fail_path(&bad).await;

        let jobs = vec![
            ImageJob::new(&good_a).with_operation(Operation::Webp),
            ImageJob::new(&bad).with_operation(Operation::Webp),
            ImageJob::new(&good_c).with_operation(Operation::Webp),
        ];
        let report = processor.process_batch(jobs).await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        let paths: Vec<_> = report.reports.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec![good_a, bad, good_c]);
        assert!(!report.reports[1].success);
        assert_eq!(report.total_savings(), 1500);
        assert!(report.finished_at >= report.started_at);

        let stats = processor.stats().snapshot().await;
        assert_eq!(stats.images_processed, 2);
        assert_eq!(stats.images_failed, 1);
        assert_eq!(stats.conversions, 2);
    }

    #[tokio::test]
    async fn test_batch_respects_parallelism_bound() {
        let dir = TempDir::new().unwrap();
        let (processor, converter) = processor(2);
        converter.set_delay(Duration::from_millis(100)).await;
        let jobs: Vec<_> = (0..4)
            .map(|i| {
                let path = fixtures::write_file(dir.path(), &format!("{}.jpg", i), 100).unwrap();
                ImageJob::new(path).with_operation(Operation::Webp)
            })
            .collect();

        let start = std::time::Instant::now();
        let report = processor.process_batch(jobs).await;

        assert_eq!(report.succeeded, 4);
        // Four 100ms jobs two at a time take at least two rounds.
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (processor, _) = processor(4);
        let report = processor.process_batch(Vec::new()).await;
        assert!(report.reports.is_empty());
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_process_one_updates_stats() {
        let dir = TempDir::new().unwrap();
        let path = fixtures::write_file(dir.path(), "a.jpg", 1000).unwrap();
        let (processor, _) = processor(1);

        let report = processor
            .process_one(ImageJob::new(&path).with_operation(Operation::Optimize))
            .await;

        assert!(report.success);
        assert_eq!(processor.stats().snapshot().await.images_processed, 1);
    }
}
