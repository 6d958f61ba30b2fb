//! Batch layer: several operations per image, many images per run.
//!
//! One image's failure never aborts the others. Each job runs on its own
//! task, bounded by `max_parallel`, and reports come back in job order.

mod backup;
mod config;
mod processor;
mod stats;
mod types;

pub use backup::create_backup;
pub use config::BatchConfig;
pub use processor::{process_image, BatchProcessor};
pub use stats::{BatchStats, StatsSnapshot};
pub use types::{BatchReport, ImageJob, ImageReport, OperationRequest};
