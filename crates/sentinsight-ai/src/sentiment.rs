//! Sentiment classifier contract and helpers shared by its backends.
//!
//! A classifier scores a whole batch at once. A failed call yields no
//! partial result: either every text gets a [`SentimentScore`] in input
//! order, or the call returns a [`ClassifierError`].

use async_trait::async_trait;
use sentinsight_core::{Label, Weights, argmax};
use thiserror::Error;

/// Maximum characters of a text passed to a model.
pub const MAX_INPUT_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("expected {expected} results, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "http")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-text fragment of a sentiment annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentScore {
    pub label: Label,
    pub confidence: f64,
    pub weights: Weights,
    pub processing_time_ms: u64,
}

impl SentimentScore {
    /// Build a score from a full probability distribution. The label is its argmax.
    pub fn from_weights(weights: Weights, processing_time_ms: u64) -> Option<Self> {
        let (label, confidence) = argmax(&weights)?;
        Some(Self {
            label,
            confidence,
            weights,
            processing_time_ms,
        })
    }

    /// Build a score from a top-1 prediction, synthesizing the distribution.
    pub fn from_top(label: Label, score: f64, processing_time_ms: u64) -> Self {
        Self {
            label,
            confidence: score,
            weights: weights_from_top(label, score),
            processing_time_ms,
        }
    }
}

/// Pluggable sentiment model.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Score `texts`, returning one result per text in input order.
    ///
    /// `batch_size` is the model's internal batch; implementations may ignore it.
    async fn classify_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<SentimentScore>, ClassifierError>;

    /// Version string written as the annotation's `modelVersion`.
    fn model_version(&self) -> String;
}

// ── Label and text helpers ──

/// Map a raw model label onto a [`Label`]. Unknown labels map to neutral.
pub fn label_from_model(raw: &str) -> Label {
    match raw.trim().to_ascii_uppercase().as_str() {
        "POSITIVE" | "POS" | "LABEL_2" | "POSITIVO" => Label::Positive,
        "NEGATIVE" | "NEG" | "LABEL_0" | "NEGATIVO" => Label::Negative,
        _ => Label::Neutral,
    }
}

/// Truncate to at most [`MAX_INPUT_CHARS`] characters on a char boundary.
pub fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Distribution for a top-1 prediction: the winner keeps `score`, the other
/// two labels share the remainder evenly, normalized to sum to 1.
pub fn weights_from_top(label: Label, score: f64) -> Weights {
    let score = score.clamp(0.0, 1.0);
    let rest = (1.0 - score) / 2.0;
    let mut weights: Weights = Label::ALL
        .into_iter()
        .map(|l| (l, if l == label { score } else { rest }))
        .collect();
    normalize(&mut weights);
    weights
}

/// Scale weights in place so they sum to 1. All-zero input is left as is.
pub fn normalize(weights: &mut Weights) {
    let total: f64 = weights.values().sum();
    if total > 0.0 {
        for w in weights.values_mut() {
            *w /= total;
        }
    }
}

/// Softmax over raw logits.
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&x| (x as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(w: &Weights) -> f64 {
        w.values().sum()
    }

    #[test]
    fn model_labels_map_to_polarity() {
        assert_eq!(label_from_model("POSITIVE"), Label::Positive);
        assert_eq!(label_from_model("LABEL_2"), Label::Positive);
        assert_eq!(label_from_model("neg"), Label::Negative);
        assert_eq!(label_from_model("LABEL_0"), Label::Negative);
        assert_eq!(label_from_model("NEU"), Label::Neutral);
        assert_eq!(label_from_model("LABEL_1"), Label::Neutral);
        assert_eq!(label_from_model("something-else"), Label::Neutral);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "á".repeat(MAX_INPUT_CHARS + 10);
        let cut = truncate_input(&long);
        assert_eq!(cut.chars().count(), MAX_INPUT_CHARS);
        assert_eq!(truncate_input("corto"), "corto");
    }

    #[test]
    fn synthesized_weights_sum_to_one() {
        let w = weights_from_top(Label::Negative, 0.85);
        assert!((sum(&w) - 1.0).abs() < 1e-9);
        assert!((w[&Label::Negative] - 0.85).abs() < 1e-9);
        assert!((w[&Label::Positive] - 0.075).abs() < 1e-9);
        assert!(w.values().all(|&v| v >= 0.0));
    }

    #[test]
    fn from_top_label_is_argmax() {
        let s = SentimentScore::from_top(Label::Positive, 0.9, 3);
        assert_eq!(argmax(&s.weights).map(|(l, _)| l), Some(Label::Positive));
        assert_eq!(s.confidence, 0.9);
    }

    #[test]
    fn from_weights_uses_argmax() {
        let w: Weights = [(Label::Positive, 0.2), (Label::Neutral, 0.5), (Label::Negative, 0.3)]
            .into_iter()
            .collect();
        let s = SentimentScore::from_weights(w, 0).unwrap();
        assert_eq!(s.label, Label::Neutral);
        assert_eq!(s.confidence, 0.5);
        assert!(SentimentScore::from_weights(Weights::new(), 0).is_none());
    }

    #[test]
    fn softmax_is_a_distribution() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }
}
