use std::time::Duration;

/// Tuning knobs for a [`BatchPipeline`](crate::BatchPipeline).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Opinions fetched per batch.
    pub batch_size: usize,
    /// Internal batch size handed to the sentiment model.
    pub classifier_batch_size: usize,
    /// Deadline for one classifier call covering a whole batch.
    pub classify_timeout: Duration,
    /// Deadline for each fetch, count and write.
    pub repository_timeout: Duration,
    /// Maximum parallel writes within a batch.
    pub write_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            classifier_batch_size: 8,
            classify_timeout: Duration::from_secs(120),
            repository_timeout: Duration::from_secs(30),
            write_concurrency: 4,
        }
    }
}

/// Map a signed command-line limit to an optional cap. Zero or negative means no limit.
pub fn limit_from_signed(limit: i64) -> Option<usize> {
    usize::try_from(limit).ok().filter(|&n| n > 0)
}
