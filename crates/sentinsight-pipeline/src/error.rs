use serde::Serialize;
use sentinsight_store::StoreError;
use thiserror::Error;

use crate::pipeline::Target;
use crate::report::PipelineReport;

/// Failure recorded against a single item in a report.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StageError {
    /// The classifier call for the item's whole batch failed or timed out.
    #[error("classifier batch failure: {0}")]
    ClassifierBatchFailure(String),

    /// Writing the item's annotations failed, timed out, or modified nothing.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("repository fetch failed: {source}")]
    RepositoryFetch {
        #[source]
        source: StoreError,
        /// Work completed before the failing fetch.
        partial: Box<PipelineReport>,
    },

    #[error("target {0} needs a sentiment classifier but none is configured")]
    MissingClassifier(Target),
}

impl PipelineError {
    /// The report accumulated before a failed fetch stopped the run.
    pub fn partial_report(&self) -> Option<&PipelineReport> {
        match self {
            Self::RepositoryFetch { partial, .. } => Some(partial),
            Self::MissingClassifier(_) => None,
        }
    }
}
