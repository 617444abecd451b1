//! Sentiment classifier backed by a remote text-classification endpoint.
//!
//! Speaks the Hugging Face inference wire format: the request body is
//! `{"inputs": [...]}` and the response holds one entry per input, either a
//! single `{label, score}` or the full list of label scores.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sentinsight_core::{Label, Weights};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::sentiment::{
    ClassifierError, SentimentClassifier, SentimentScore, label_from_model, normalize,
    truncate_input,
};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Prediction {
    All(Vec<LabelScore>),
    Top(LabelScore),
}

impl Prediction {
    fn into_score(self, processing_time_ms: u64) -> Result<SentimentScore, ClassifierError> {
        match self {
            Prediction::Top(top) => Ok(SentimentScore::from_top(
                label_from_model(&top.label),
                top.score,
                processing_time_ms,
            )),
            Prediction::All(scores) => {
                let mut weights: Weights = Label::ALL.into_iter().map(|l| (l, 0.0)).collect();
                for s in scores {
                    *weights.entry(label_from_model(&s.label)).or_insert(0.0) += s.score;
                }
                normalize(&mut weights);
                SentimentScore::from_weights(weights, processing_time_ms).ok_or_else(|| {
                    ClassifierError::Inference("empty label list in response".into())
                })
            }
        }
    }
}

/// HTTP client for a hosted sentiment model.
pub struct HttpSentimentClassifier {
    client: reqwest::Client,
    url: String,
    model_name: String,
}

impl HttpSentimentClassifier {
    /// Create a classifier posting to `url`.
    ///
    /// `model_name` only feeds the reported model version.
    pub fn new(
        url: String,
        model_name: String,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            model_name,
        })
    }

    async fn post(&self, inputs: &[&str]) -> Result<Vec<Prediction>, ClassifierError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest { inputs })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SentimentClassifier for HttpSentimentClassifier {
    async fn classify_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<SentimentScore>, ClassifierError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        info!(url = %self.url, count = texts.len(), "requesting remote sentiment");
        let start = Instant::now();
        let truncated: Vec<&str> = texts.iter().map(|t| truncate_input(t)).collect();

        let mut predictions = Vec::with_capacity(texts.len());
        for chunk in truncated.chunks(batch_size.max(1)) {
            let got = self.post(chunk).await?;
            if got.len() != chunk.len() {
                return Err(ClassifierError::LengthMismatch {
                    expected: chunk.len(),
                    actual: got.len(),
                });
            }
            predictions.extend(got);
        }

        let per_text_ms = start.elapsed().as_millis() as u64 / texts.len() as u64;
        let scores = predictions
            .into_iter()
            .map(|p| p.into_score(per_text_ms))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = scores.len(), per_text_ms, "remote batch classified");
        Ok(scores)
    }

    fn model_version(&self) -> String {
        format!("{}-v1.0", self.model_name)
    }
}
