//! In-process opinion store.

use async_trait::async_trait;
use sentinsight_core::{
    Categorization, Opinion, OpinionId, PendingOn, PendingOpinion, Scope, SentimentAnnotation,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{StoreError, WorkRepository};

/// Opinions held in memory, in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    opinions: RwLock<Vec<Opinion>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing documents, keeping their order.
    pub fn with_opinions(opinions: Vec<Opinion>) -> Self {
        Self {
            opinions: RwLock::new(opinions),
        }
    }

    pub async fn insert_opinion(&self, opinion: Opinion) -> Result<(), StoreError> {
        let mut opinions = self.opinions.write().await;
        if opinions.iter().any(|o| o.id == opinion.id) {
            return Err(StoreError::Duplicate(opinion.id));
        }
        opinions.push(opinion);
        Ok(())
    }

    pub async fn get_opinion(&self, id: &OpinionId) -> Option<Opinion> {
        self.opinions
            .read()
            .await
            .iter()
            .find(|o| &o.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.opinions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl WorkRepository for MemoryStore {
    async fn fetch_pending(
        &self,
        scope: &Scope,
        on: PendingOn,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<PendingOpinion>, StoreError> {
        let opinions = self.opinions.read().await;
        let batch: Vec<PendingOpinion> = opinions
            .iter()
            .filter(|o| scope.matches(o) && o.is_pending(on))
            .skip(skip)
            .take(limit)
            .map(Opinion::to_pending)
            .collect();
        debug!(scope = %scope, on = %on, count = batch.len(), "fetched pending");
        Ok(batch)
    }

    async fn count_pending(&self, scope: &Scope, on: PendingOn) -> Result<u64, StoreError> {
        let opinions = self.opinions.read().await;
        Ok(opinions
            .iter()
            .filter(|o| scope.matches(o) && o.is_pending(on))
            .count() as u64)
    }

    async fn apply_annotation(
        &self,
        id: &OpinionId,
        sentiment: Option<&SentimentAnnotation>,
        categorization: Option<&Categorization>,
    ) -> Result<bool, StoreError> {
        if sentiment.is_none() && categorization.is_none() {
            return Ok(false);
        }
        let mut opinions = self.opinions.write().await;
        let Some(opinion) = opinions.iter_mut().find(|o| &o.id == id) else {
            return Ok(false);
        };
        if let Some(s) = sentiment {
            opinion.sentiment = Some(s.clone());
        }
        if let Some(c) = categorization {
            opinion.categorization = Some(c.clone());
        }
        Ok(true)
    }
}
