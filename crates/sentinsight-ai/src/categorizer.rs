//! Keyword-based categorization of opinions.
//!
//! Scores each of the three dimensions independently by counting which
//! lexicon phrases occur in the lowercased text, then thresholding the share
//! of positive hits. Matching is plain substring search with no word
//! boundaries and no negation handling, so "no explica bien" hits both
//! "no explica" and "explica bien".

use std::time::Instant;

use chrono::Utc;
use sentinsight_core::{CategoryVerdict, Categorization, Dimension, Label, MAX_KEYWORDS};
use tracing::debug;

use crate::lexicon::{KeywordLexicon, Polarity, SPANISH};

const MODEL_VERSION: &str = "keyword-based-v1.0";

/// Positive share above which a dimension is rated positive.
const POSITIVE_ABOVE: f64 = 0.6;
/// Positive share below which a dimension is rated negative.
const NEGATIVE_BELOW: f64 = 0.4;

/// Deterministic rule-based scorer over a [`KeywordLexicon`].
#[derive(Debug, Clone, Copy)]
pub struct CategoryScorer {
    lexicon: &'static KeywordLexicon,
}

impl Default for CategoryScorer {
    fn default() -> Self {
        Self::new(&SPANISH)
    }
}

impl CategoryScorer {
    pub fn new(lexicon: &'static KeywordLexicon) -> Self {
        Self { lexicon }
    }

    /// Version string written as the categorization's `modelVersion`.
    pub fn version(&self) -> &'static str {
        MODEL_VERSION
    }

    /// Score one dimension of a text.
    pub fn score(&self, text: &str, dimension: Dimension) -> CategoryVerdict {
        score_lowered(self.lexicon, &text.to_lowercase(), dimension)
    }

    /// Score all three dimensions and aggregate them into a categorization.
    pub fn categorize(&self, text: &str) -> Categorization {
        let start = Instant::now();
        let lowered = text.to_lowercase();

        let teaching_quality = score_lowered(self.lexicon, &lowered, Dimension::TeachingQuality);
        let evaluation_method = score_lowered(self.lexicon, &lowered, Dimension::EvaluationMethod);
        let empathy = score_lowered(self.lexicon, &lowered, Dimension::Empathy);

        Categorization {
            analyzed: true,
            teaching_quality,
            evaluation_method,
            empathy,
            model_version: MODEL_VERSION.to_string(),
            processing_time_ms: start.elapsed().as_millis() as u64,
            analyzed_at: Utc::now(),
        }
    }

    /// Categorize a batch of texts, preserving input order.
    pub fn categorize_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Categorization> {
        let start = Instant::now();
        let results: Vec<Categorization> =
            texts.iter().map(|t| self.categorize(t.as_ref())).collect();
        debug!(
            count = texts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "categorized batch"
        );
        results
    }
}

// ── Scoring helpers ──

fn score_lowered(lexicon: &KeywordLexicon, lowered: &str, dimension: Dimension) -> CategoryVerdict {
    let positive = hits(lexicon.phrases(dimension, Polarity::Positive), lowered);
    let negative = hits(lexicon.phrases(dimension, Polarity::Negative), lowered);

    let total = positive.len() + negative.len();
    if total == 0 {
        return CategoryVerdict::neutral();
    }

    let score = positive.len() as f64 / total as f64;

    let (valuation, confidence, keywords) = if score > POSITIVE_ABOVE {
        (Label::Positive, score, positive)
    } else if score < NEGATIVE_BELOW {
        (Label::Negative, 1.0 - score, negative)
    } else {
        let mut both = positive;
        both.extend(negative);
        (Label::Neutral, 0.5, both)
    };

    CategoryVerdict {
        valuation,
        confidence: round3(confidence),
        keywords: keywords
            .into_iter()
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect(),
    }
}

/// Phrases occurring anywhere in `lowered`, in declaration order.
fn hits<'a>(phrases: &[&'a str], lowered: &str) -> Vec<&'a str> {
    phrases
        .iter()
        .copied()
        .filter(|p| lowered.contains(p))
        .collect()
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::PhraseSet;

    fn scorer() -> CategoryScorer {
        CategoryScorer::default()
    }

    fn tq(text: &str) -> CategoryVerdict {
        scorer().score(text, Dimension::TeachingQuality)
    }

    #[test]
    fn no_hits_is_neutral_half() {
        for d in Dimension::ALL {
            let v = scorer().score("clase normal", d);
            assert_eq!(v, CategoryVerdict::neutral(), "{d}");
        }
        assert_eq!(tq(""), CategoryVerdict::neutral());
    }

    #[test]
    fn three_positive_two_negative_is_neutral() {
        // score == 0.6 exactly: not strictly above the positive threshold.
        let v = tq("claro, excelente y con ejemplos, pero aburrido y confuso");
        assert_eq!(v.valuation, Label::Neutral);
        assert_eq!(v.confidence, 0.5);
        assert_eq!(
            v.keywords,
            ["claro", "excelente", "ejemplos", "confuso", "aburrido"]
        );
    }

    #[test]
    fn two_positive_three_negative_is_neutral() {
        // score == 0.4 exactly: not strictly below the negative threshold.
        let v = tq("claro y excelente, pero aburrido, confuso y desorganizado");
        assert_eq!(v.valuation, Label::Neutral);
        assert_eq!(v.confidence, 0.5);
        assert_eq!(
            v.keywords,
            ["claro", "excelente", "confuso", "desorganizado", "aburrido"]
        );
    }

    #[test]
    fn one_positive_one_negative_is_neutral() {
        let v = tq("claro pero aburrido");
        assert_eq!(v.valuation, Label::Neutral);
        assert_eq!(v.keywords, ["claro", "aburrido"]);
    }

    #[test]
    fn four_positive_one_negative_is_positive() {
        let v = tq("claro, excelente, preparado y con ejemplos, aunque algo aburrido");
        assert_eq!(v.valuation, Label::Positive);
        assert_eq!(v.confidence, 0.8);
        assert_eq!(v.keywords, ["claro", "excelente", "preparado", "ejemplos"]);
    }

    #[test]
    fn one_positive_four_negative_is_negative() {
        let v = tq("claro, pero aburrido, confuso, desorganizado y perdido");
        assert_eq!(v.valuation, Label::Negative);
        assert_eq!(v.confidence, 0.8);
        assert_eq!(
            v.keywords,
            ["confuso", "desorganizado", "aburrido", "perdido"]
        );
    }

    #[test]
    fn only_positive_hits_full_confidence() {
        let v = tq("Excelente");
        assert_eq!(v.valuation, Label::Positive);
        assert_eq!(v.confidence, 1.0);
        assert_eq!(v.keywords, ["excelente"]);
    }

    #[test]
    fn keywords_capped_at_five() {
        let v = tq("explica bien, domina, claro, enseña bien, excelente, didáctico y preparado");
        assert_eq!(v.valuation, Label::Positive);
        assert_eq!(v.keywords.len(), MAX_KEYWORDS);
        assert_eq!(
            v.keywords,
            ["explica bien", "domina", "claro", "enseña bien", "didáctico"]
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let v = tq("DIDÁCTICO Y CLARO");
        assert_eq!(v.valuation, Label::Positive);
        assert_eq!(v.keywords, ["claro", "didáctico"]);
    }

    #[test]
    fn negation_is_not_handled() {
        // Known limitation: the positive phrase still hits inside the negation.
        let v = tq("no explica bien");
        assert_eq!(v.valuation, Label::Neutral);
        assert_eq!(v.keywords, ["explica bien", "no explica"]);
    }

    #[test]
    fn split_empathy_phrase_kept_verbatim() {
        // The lexicon spells this phrase with a space, so the joined word never hits.
        let joined = scorer().score("es un déspota", Dimension::Empathy);
        assert_eq!(joined, CategoryVerdict::neutral());

        let split = scorer().score("es un déspo ta", Dimension::Empathy);
        assert_eq!(split.valuation, Label::Negative);
        assert_eq!(split.keywords, ["déspo ta"]);
    }

    #[test]
    fn confidence_rounded_to_three_places() {
        // "justo" hits inside "injusto": 1 positive, 2 negative.
        let v = scorer().score("muy difícil e injusto", Dimension::EvaluationMethod);
        assert_eq!(v.valuation, Label::Negative);
        assert_eq!(v.confidence, 0.667);
        assert_eq!(v.keywords, ["difícil", "injusto"]);
    }

    #[test]
    fn categorize_scores_dimensions_independently() {
        let cat = scorer().categorize("explica bien y domina el tema, pero es muy estricto");
        assert!(cat.analyzed);
        assert_eq!(cat.model_version, "keyword-based-v1.0");
        assert_eq!(cat.teaching_quality.valuation, Label::Positive);
        assert_eq!(cat.evaluation_method.valuation, Label::Negative);
        assert_eq!(cat.evaluation_method.keywords, ["estricto"]);
        assert_eq!(cat.empathy, CategoryVerdict::neutral());
    }

    #[test]
    fn categorize_batch_preserves_order() {
        let texts = ["muy difícil e injusto", "clase normal", "excelente"];
        let cats = scorer().categorize_batch(&texts);
        assert_eq!(cats.len(), 3);
        assert_eq!(cats[0].evaluation_method.valuation, Label::Negative);
        assert_eq!(cats[1].teaching_quality, CategoryVerdict::neutral());
        assert_eq!(cats[2].teaching_quality.valuation, Label::Positive);
    }

    #[test]
    fn custom_lexicon() {
        static TINY: KeywordLexicon = KeywordLexicon {
            teaching_quality: PhraseSet {
                positive: &["a", "b", "c"],
                negative: &["x", "y"],
            },
            evaluation_method: PhraseSet {
                positive: &[],
                negative: &[],
            },
            empathy: PhraseSet {
                positive: &["kind"],
                negative: &[],
            },
        };
        let s = CategoryScorer::new(&TINY);
        assert_eq!(s.score("abc", Dimension::TeachingQuality).valuation, Label::Positive);
        assert_eq!(s.score("abcxy", Dimension::TeachingQuality).valuation, Label::Neutral);
        assert_eq!(s.score("axy", Dimension::TeachingQuality).confidence, 0.667);
        assert_eq!(
            s.score("anything", Dimension::EvaluationMethod),
            CategoryVerdict::neutral()
        );
        assert_eq!(s.score("KIND", Dimension::Empathy).confidence, 1.0);
    }
}
