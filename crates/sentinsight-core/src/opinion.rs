//! Opinion documents and the selection of pending work.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::annotation::{Categorization, SentimentAnnotation};

/// Store-assigned opaque identifier of an opinion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpinionId(String);

impl OpinionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpinionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OpinionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OpinionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A stored course/instructor review.
///
/// Everything except the two annotation sub-records is immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opinion {
    pub id: OpinionId,
    pub comment: String,
    pub professor_id: i64,
    pub course: String,
    pub review_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorization: Option<Categorization>,
}

impl Opinion {
    /// A fresh, unannotated opinion.
    pub fn new(
        id: impl Into<OpinionId>,
        comment: impl Into<String>,
        professor_id: i64,
        course: impl Into<String>,
        review_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            comment: comment.into(),
            professor_id,
            course: course.into(),
            review_date,
            sentiment: None,
            categorization: None,
        }
    }

    pub fn sentiment_analyzed(&self) -> bool {
        self.sentiment.as_ref().is_some_and(|s| s.analyzed)
    }

    pub fn categorization_analyzed(&self) -> bool {
        self.categorization.as_ref().is_some_and(|c| c.analyzed)
    }

    /// Whether this opinion still lacks the annotation named by `on`.
    pub fn is_pending(&self, on: PendingOn) -> bool {
        match on {
            PendingOn::Sentiment => !self.sentiment_analyzed(),
            PendingOn::Categorization => !self.categorization_analyzed(),
        }
    }

    pub fn to_pending(&self) -> PendingOpinion {
        PendingOpinion {
            id: self.id.clone(),
            comment: self.comment.clone(),
        }
    }
}

/// The projection of an opinion the pipeline works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOpinion {
    pub id: OpinionId,
    pub comment: String,
}

/// Which annotation defines the pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOn {
    Sentiment,
    Categorization,
}

impl fmt::Display for PendingOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentiment => f.write_str("sentiment"),
            Self::Categorization => f.write_str("categorization"),
        }
    }
}

/// Selection criterion for which opinions a run targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scope {
    All,
    /// Opinions about one professor (catalog id).
    Professor(i64),
    /// Opinions whose course name contains this pattern, case-insensitively.
    Course(String),
}

impl Scope {
    /// Whether `opinion` falls inside this scope.
    pub fn matches(&self, opinion: &Opinion) -> bool {
        match self {
            Self::All => true,
            Self::Professor(id) => opinion.professor_id == *id,
            Self::Course(pattern) => opinion
                .course
                .to_lowercase()
                .contains(&pattern.to_lowercase()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Professor(id) => write!(f, "professor:{id}"),
            Self::Course(name) => write!(f, "course:{name}"),
        }
    }
}
