//! Annotation sub-records written onto each opinion.
//!
//! Two independent records: a [`SentimentAnnotation`] produced by the
//! sentiment model, and a [`Categorization`] produced by the keyword scorer.
//! Field names on the wire are fixed; readers rely on `analyzed`, `label` /
//! `valuation`, `confidence`, `weights` / `keywords`, `modelVersion` and the
//! timestamps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Three-way polarity used both as a sentiment label and a category valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Neutral,
    Negative,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Positive, Label::Neutral, Label::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            _ => Err(ParseError::Label(s.to_string())),
        }
    }
}

/// Probability mass per label. Values are non-negative and sum to 1.0.
pub type Weights = BTreeMap<Label, f64>;

/// Label with the highest weight. Ties resolve in [`Label::ALL`] order.
pub fn argmax(weights: &Weights) -> Option<(Label, f64)> {
    let mut best: Option<(Label, f64)> = None;
    for label in Label::ALL {
        if let Some(&w) = weights.get(&label)
            && best.is_none_or(|(_, b)| w > b)
        {
            best = Some((label, w));
        }
    }
    best
}

/// Overall sentiment of one opinion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAnnotation {
    pub analyzed: bool,
    pub label: Label,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    pub weights: Weights,
    pub model_version: String,
    pub processing_time_ms: u64,
    pub analyzed_at: DateTime<Utc>,
}

// ── Categorization ──

/// One of the three fixed categorization dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    TeachingQuality,
    EvaluationMethod,
    Empathy,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [
        Dimension::TeachingQuality,
        Dimension::EvaluationMethod,
        Dimension::Empathy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeachingQuality => "teaching_quality",
            Self::EvaluationMethod => "evaluation_method",
            Self::Empathy => "empathy",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| ParseError::Dimension(s.to_string()))
    }
}

/// Maximum number of keywords kept on a [`CategoryVerdict`].
pub const MAX_KEYWORDS: usize = 5;

/// Verdict for a single dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVerdict {
    pub valuation: Label,
    pub confidence: f64,
    /// Matched phrases in lexicon order, at most [`MAX_KEYWORDS`].
    pub keywords: Vec<String>,
}

impl CategoryVerdict {
    /// The verdict for a text with no lexicon hits.
    pub fn neutral() -> Self {
        Self {
            valuation: Label::Neutral,
            confidence: 0.5,
            keywords: Vec::new(),
        }
    }
}

/// Three-dimension categorization of one opinion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Categorization {
    pub analyzed: bool,
    #[serde(rename = "teaching_quality")]
    pub teaching_quality: CategoryVerdict,
    #[serde(rename = "evaluation_method")]
    pub evaluation_method: CategoryVerdict,
    pub empathy: CategoryVerdict,
    pub model_version: String,
    pub processing_time_ms: u64,
    pub analyzed_at: DateTime<Utc>,
}

impl Categorization {
    pub fn verdict(&self, dimension: Dimension) -> &CategoryVerdict {
        match dimension {
            Dimension::TeachingQuality => &self.teaching_quality,
            Dimension::EvaluationMethod => &self.evaluation_method,
            Dimension::Empathy => &self.empathy,
        }
    }

    /// Iterate `(dimension, verdict)` in fixed dimension order.
    pub fn verdicts(&self) -> impl Iterator<Item = (Dimension, &CategoryVerdict)> {
        Dimension::ALL.into_iter().map(|d| (d, self.verdict(d)))
    }
}
