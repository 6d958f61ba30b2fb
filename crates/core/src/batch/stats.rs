//! Running totals across batch runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::types::ImageReport;
use crate::converter::compression_ratio;

/// Counters updated as image reports come in.
#[derive(Debug, Default)]
pub struct BatchStats {
    images_processed: AtomicU64,
    images_failed: AtomicU64,
    conversions: AtomicU64,
    original_bytes: AtomicU64,
    optimized_bytes: AtomicU64,
    last_run: RwLock<Option<DateTime<Utc>>>,
}

/// Point-in-time copy of [`BatchStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub images_processed: u64,
    pub images_failed: u64,
    pub conversions: u64,
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    /// Percentage saved over all successful conversions.
    pub average_compression: f64,
    pub last_run: Option<DateTime<Utc>>,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one image report into the totals.
    pub async fn record(&self, report: &ImageReport) {
        if report.success {
            self.images_processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.images_failed.fetch_add(1, Ordering::Relaxed);
        }

        for result in report.results.iter().filter(|r| r.success) {
            self.conversions.fetch_add(1, Ordering::Relaxed);
            self.original_bytes
                .fetch_add(result.original_size, Ordering::Relaxed);
            self.optimized_bytes
                .fetch_add(result.file_size, Ordering::Relaxed);
        }

        *self.last_run.write().await = Some(Utc::now());
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        let original_bytes = self.original_bytes.load(Ordering::Relaxed);
        let optimized_bytes = self.optimized_bytes.load(Ordering::Relaxed);
        StatsSnapshot {
            images_processed: self.images_processed.load(Ordering::Relaxed),
            images_failed: self.images_failed.load(Ordering::Relaxed),
            conversions: self.conversions.load(Ordering::Relaxed),
            original_bytes,
            optimized_bytes,
            average_compression: compression_ratio(original_bytes, optimized_bytes),
            last_run: *self.last_run.read().await,
        }
    }
}
