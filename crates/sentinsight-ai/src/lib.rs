//! Opinion classifiers: lexicon-based category scoring and pluggable sentiment models.

pub mod categorizer;
pub mod lexicon;
pub mod sentiment;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxSentimentClassifier;

#[cfg(feature = "http")]
mod remote;
#[cfg(feature = "http")]
pub use remote::HttpSentimentClassifier;

pub use categorizer::CategoryScorer;
pub use lexicon::{KeywordLexicon, Polarity, SPANISH};
pub use sentiment::{ClassifierError, SentimentClassifier, SentimentScore};
