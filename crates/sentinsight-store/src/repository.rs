use async_trait::async_trait;
use sentinsight_core::{Categorization, OpinionId, PendingOn, PendingOpinion, Scope, SentimentAnnotation};

use crate::StoreError;

/// Narrow query/update contract the annotation pipeline runs against.
///
/// Ordering of `fetch_pending` must be stable across calls (insertion order),
/// so that `skip` addresses the same prefix of the pending set each time.
#[async_trait]
pub trait WorkRepository: Send + Sync {
    /// Up to `limit` opinions in `scope` still pending on `on`, after skipping `skip`.
    async fn fetch_pending(
        &self,
        scope: &Scope,
        on: PendingOn,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<PendingOpinion>, StoreError>;

    /// Number of opinions in `scope` still pending on `on`.
    async fn count_pending(&self, scope: &Scope, on: PendingOn) -> Result<u64, StoreError>;

    /// Write either or both annotation sub-records.
    ///
    /// Returns whether a stored document was modified. An unknown id, or
    /// nothing to write, yields `Ok(false)`.
    async fn apply_annotation(
        &self,
        id: &OpinionId,
        sentiment: Option<&SentimentAnnotation>,
        categorization: Option<&Categorization>,
    ) -> Result<bool, StoreError>;
}
