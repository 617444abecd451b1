//! Core types for opinion annotation: documents, sentiment and category records, scopes.

pub mod annotation;
mod error;
pub mod opinion;

pub use annotation::{
    CategoryVerdict, Categorization, Dimension, Label, MAX_KEYWORDS, SentimentAnnotation, Weights,
    argmax,
};
pub use error::ParseError;
pub use opinion::{Opinion, OpinionId, PendingOn, PendingOpinion, Scope};
