use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use sentinsight_ai::{CategoryScorer, SentimentClassifier, SentimentScore};
use sentinsight_core::{
    Categorization, OpinionId, PendingOn, PendingOpinion, Scope, SentimentAnnotation,
};
use sentinsight_store::{StoreError, WorkRepository};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, StageError};
use crate::report::{ItemReport, PipelineReport};

/// Which annotations a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Sentiment and categorization for opinions lacking sentiment.
    Full,
    /// Sentiment only, for opinions lacking sentiment.
    SentimentOnly,
    /// Categorization only, for opinions lacking categorization. Needs no classifier.
    CategorizationOnly,
}

impl Target {
    pub fn pending_on(self) -> PendingOn {
        match self {
            Self::Full | Self::SentimentOnly => PendingOn::Sentiment,
            Self::CategorizationOnly => PendingOn::Categorization,
        }
    }

    pub fn needs_sentiment(self) -> bool {
        !matches!(self, Self::CategorizationOnly)
    }

    pub fn needs_categorization(self) -> bool {
        !matches!(self, Self::SentimentOnly)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::SentimentOnly => f.write_str("sentiment_only"),
            Self::CategorizationOnly => f.write_str("categorization_only"),
        }
    }
}

/// Parameters of one invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub scope: Scope,
    pub target: Target,
    /// Maximum opinions to attempt. `None` drains the pending set.
    pub limit: Option<usize>,
    /// Pending opinions to pass over before the first fetch.
    pub skip: usize,
}

impl RunRequest {
    pub fn new(scope: Scope, target: Target) -> Self {
        Self {
            scope,
            target,
            limit: None,
            skip: 0,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }
}

/// Pending counts for a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStats {
    pub scope: Scope,
    pub sentiment: u64,
    pub categorization: u64,
    /// Version of the configured sentiment model, if any.
    pub model_version: Option<String>,
}

/// Annotations produced for one opinion, ready to write.
struct Annotated {
    id: OpinionId,
    sentiment: Option<SentimentAnnotation>,
    categorization: Option<Categorization>,
}

/// Drives fetch → classify → persist over a [`WorkRepository`].
///
/// Holds its collaborators by reference; the caller owns their lifetime.
pub struct BatchPipeline<'a> {
    repository: &'a dyn WorkRepository,
    classifier: Option<&'a dyn SentimentClassifier>,
    scorer: CategoryScorer,
    config: PipelineConfig,
}

impl<'a> BatchPipeline<'a> {
    pub fn new(repository: &'a dyn WorkRepository, config: PipelineConfig) -> Self {
        Self {
            repository,
            classifier: None,
            scorer: CategoryScorer::default(),
            config,
        }
    }

    pub fn with_classifier(mut self, classifier: &'a dyn SentimentClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_scorer(mut self, scorer: CategoryScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one invocation until the pending set is exhausted, the limit is
    /// reached, or `cancel` fires. Cancellation is checked between batches.
    pub async fn run(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        let target = request.target;
        let classifier = if target.needs_sentiment() {
            Some(
                self.classifier
                    .ok_or(PipelineError::MissingClassifier(target))?,
            )
        } else {
            None
        };

        let scope = &request.scope;
        let on = target.pending_on();
        let batch_size = self.config.batch_size.max(1);
        let mut report = PipelineReport::new(scope.clone(), target);
        let mut seen: HashSet<OpinionId> = HashSet::new();
        let mut batch_no = 0usize;

        info!(scope = %scope, target = %target, limit = ?request.limit, skip = request.skip, "starting run");

        loop {
            if cancel.is_cancelled() {
                info!(scope = %scope, attempted = report.attempted, "run cancelled");
                break;
            }

            let want = match request.limit {
                Some(limit) if report.attempted >= limit => break,
                Some(limit) => batch_size.min(limit - report.attempted),
                None => batch_size,
            };

            // Written items leave the pending set. Failed ones may or may not
            // (a vanished document, a write that landed after its deadline),
            // so read past as many of them as could still be there.
            let lookahead = report.failed;
            let fetched = match self.fetch(scope, on, want + lookahead, request.skip).await {
                Ok(fetched) => fetched,
                Err(source) => {
                    warn!(scope = %scope, error = %source, attempted = report.attempted, "fetch failed, aborting run");
                    return Err(PipelineError::RepositoryFetch {
                        source,
                        partial: Box::new(report),
                    });
                }
            };
            if fetched.is_empty() {
                debug!(scope = %scope, "pending set exhausted");
                break;
            }

            let fresh: Vec<PendingOpinion> = fetched
                .into_iter()
                .filter(|p| !seen.contains(&p.id))
                .take(want)
                .collect();
            // Everything left in range was already attempted this run.
            if fresh.is_empty() {
                debug!(scope = %scope, "only attempted items remain pending");
                break;
            }
            seen.extend(fresh.iter().map(|p| p.id.clone()));

            batch_no += 1;
            info!(scope = %scope, batch = batch_no, size = fresh.len(), "processing batch");
            for item in self.process_batch(&fresh, target, classifier).await {
                report.record(item);
            }
        }

        info!(
            scope = %scope,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "run complete"
        );
        Ok(report)
    }

    /// Pending counts for both annotations in `scope`.
    pub async fn pending(&self, scope: &Scope) -> Result<PendingStats, StoreError> {
        let sentiment = self
            .with_deadline(self.repository.count_pending(scope, PendingOn::Sentiment))
            .await?;
        let categorization = self
            .with_deadline(self.repository.count_pending(scope, PendingOn::Categorization))
            .await?;
        Ok(PendingStats {
            scope: scope.clone(),
            sentiment,
            categorization,
            model_version: self.classifier.map(|c| c.model_version()),
        })
    }

    // ── Stages ──

    async fn fetch(
        &self,
        scope: &Scope,
        on: PendingOn,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<PendingOpinion>, StoreError> {
        self.with_deadline(self.repository.fetch_pending(scope, on, limit, skip))
            .await
    }

    async fn process_batch(
        &self,
        batch: &[PendingOpinion],
        target: Target,
        classifier: Option<&dyn SentimentClassifier>,
    ) -> Vec<ItemReport> {
        let texts: Vec<String> = batch.iter().map(|p| p.comment.clone()).collect();

        let sentiments = match classifier {
            Some(classifier) => match self.classify(classifier, &texts).await {
                Ok(scores) => {
                    let version = classifier.model_version();
                    Some(
                        scores
                            .into_iter()
                            .map(|s| to_annotation(s, &version))
                            .collect::<Vec<_>>(),
                    )
                }
                Err(e) => {
                    warn!(size = batch.len(), error = %e, "classifier failed, batch skipped");
                    return batch
                        .iter()
                        .map(|p| ItemReport::failed(p.id.clone(), e.clone()))
                        .collect();
                }
            },
            None => None,
        };

        let categorizations = target
            .needs_categorization()
            .then(|| self.scorer.categorize_batch(&texts));

        let mut sentiments = sentiments.map(Vec::into_iter);
        let mut categorizations = categorizations.map(Vec::into_iter);
        let annotated: Vec<Annotated> = batch
            .iter()
            .map(|p| Annotated {
                id: p.id.clone(),
                sentiment: sentiments.as_mut().and_then(|it| it.next()),
                categorization: categorizations.as_mut().and_then(|it| it.next()),
            })
            .collect();

        stream::iter(annotated)
            .map(|a| self.persist(a))
            .buffered(self.config.write_concurrency.max(1))
            .collect()
            .await
    }

    async fn classify(
        &self,
        classifier: &dyn SentimentClassifier,
        texts: &[String],
    ) -> Result<Vec<SentimentScore>, StageError> {
        let timeout = self.config.classify_timeout;
        let call = classifier.classify_batch(texts, self.config.classifier_batch_size.max(1));
        let scores = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(scores)) => scores,
            Ok(Err(e)) => return Err(StageError::ClassifierBatchFailure(e.to_string())),
            Err(_) => {
                return Err(StageError::ClassifierBatchFailure(format!(
                    "timed out after {timeout:?}"
                )));
            }
        };
        if scores.len() != texts.len() {
            return Err(StageError::ClassifierBatchFailure(format!(
                "expected {} results, got {}",
                texts.len(),
                scores.len()
            )));
        }
        Ok(scores)
    }

    async fn persist(&self, item: Annotated) -> ItemReport {
        let Annotated {
            id,
            sentiment,
            categorization,
        } = item;

        let write = self.with_deadline(self.repository.apply_annotation(
            &id,
            sentiment.as_ref(),
            categorization.as_ref(),
        ));
        let error = match write.await {
            Ok(true) => {
                return ItemReport::succeeded(
                    id,
                    sentiment.as_ref().map(|s| s.label),
                    sentiment.as_ref().map(|s| s.confidence),
                );
            }
            Ok(false) => "no document modified".to_string(),
            Err(e) => e.to_string(),
        };
        warn!(id = %id, error = %error, "write failed");
        ItemReport::failed(id, StageError::PersistenceFailure(error))
    }

    async fn with_deadline<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let deadline: Duration = self.config.repository_timeout;
        tokio::time::timeout(deadline, call)
            .await
            .unwrap_or(Err(StoreError::Timeout(deadline)))
    }
}

fn to_annotation(score: SentimentScore, model_version: &str) -> SentimentAnnotation {
    SentimentAnnotation {
        analyzed: true,
        label: score.label,
        confidence: score.confidence,
        weights: score.weights,
        model_version: model_version.to_string(),
        processing_time_ms: score.processing_time_ms,
        analyzed_at: Utc::now(),
    }
}
