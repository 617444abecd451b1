use sentinsight_core::OpinionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("opinion already stored: {0}")]
    Duplicate(OpinionId),

    #[error("repository call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("no results for query")]
    NoResults,

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("annotation JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
