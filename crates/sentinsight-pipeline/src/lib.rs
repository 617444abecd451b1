//! Batch annotation pipeline over a work repository.
//!
//! A run repeatedly fetches a bounded batch of pending opinions, scores it
//! with the sentiment classifier and the category scorer, and writes each
//! result back independently. Classifier failures fail their batch, write
//! failures fail their item, and neither stops the run. Only a failed fetch
//! aborts, carrying the report accumulated so far.

mod config;
mod error;
mod pipeline;
mod report;

pub use config::{PipelineConfig, limit_from_signed};
pub use error::{PipelineError, StageError};
pub use pipeline::{BatchPipeline, PendingStats, RunRequest, Target};
pub use report::{ItemOutcome, ItemReport, PipelineReport};
pub use tokio_util::sync::CancellationToken;
