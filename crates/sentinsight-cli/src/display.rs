//! Terminal rendering for run reports, pending counts and opinion cards.

use sentinsight_core::{Categorization, Opinion, SentimentAnnotation};
use sentinsight_pipeline::{PendingStats, PipelineReport};

const MAX_LISTED_FAILURES: usize = 10;

// ── Public API ──

pub fn print_report(report: &PipelineReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    print!("{}", report_text(report));
    Ok(())
}

pub fn print_stats(stats: &PendingStats, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }
    println!("=== Pending ({}) ===", stats.scope);
    println!("  {:<26} {}", "sentiment", stats.sentiment);
    println!("  {:<26} {}", "categorization", stats.categorization);
    if let Some(version) = &stats.model_version {
        println!("  {:<26} {}", "model", version);
    }
    Ok(())
}

/// Print a single opinion as a vertical card.
pub fn print_opinion(opinion: &Opinion, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(opinion)?);
        return Ok(());
    }
    print!("{}", opinion_card(opinion));
    Ok(())
}

// ── Rendering ──

fn report_text(report: &PipelineReport) -> String {
    let mut out = format!("=== Run ({}, {}) ===\n", report.scope, report.target);
    out += &format!("  {:<26} {}\n", "attempted", report.attempted);
    out += &format!("  {:<26} {}\n", "succeeded", report.succeeded);
    out += &format!("  {:<26} {}\n", "failed", report.failed);
    if report.attempted > 0 {
        out += &format!("  {:<26} {:.1}%\n", "success rate", report.success_rate());
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        out += "\nFailures\n";
        for item in failures.iter().take(MAX_LISTED_FAILURES) {
            if let Some(error) = item.error() {
                out += &format!("  {:<26} {}\n", item.id.as_str(), error);
            }
        }
        if failures.len() > MAX_LISTED_FAILURES {
            out += &format!("  ... and {} more\n", failures.len() - MAX_LISTED_FAILURES);
        }
    }
    out
}

fn opinion_card(opinion: &Opinion) -> String {
    let mut out = format!("=== {} ===\n{}\n\n", opinion.id, opinion.comment);
    out += "Identity\n";
    out += &format!("  {:<26} {}\n", "professor", opinion.professor_id);
    out += &format!("  {:<26} {}\n", "course", opinion.course);
    out += &format!("  {:<26} {}\n\n", "review date", opinion.review_date);

    match &opinion.sentiment {
        Some(s) => out += &sentiment_section(s),
        None => out += "Sentiment\n  (pending)\n\n",
    }
    match &opinion.categorization {
        Some(c) => out += &categorization_section(c),
        None => out += "Categories\n  (pending)\n\n",
    }
    out
}

fn sentiment_section(s: &SentimentAnnotation) -> String {
    let mut out = String::from("Sentiment\n");
    out += &format!("  {:<26} {} ({:.3})\n", "label", s.label, s.confidence);
    let weights: Vec<String> = s
        .weights
        .iter()
        .map(|(label, w)| format!("{label} {w:.3}"))
        .collect();
    out += &format!("  {:<26} {}\n", "weights", weights.join(", "));
    out += &format!("  {:<26} {}\n", "model", s.model_version);
    out += &format!("  {:<26} {}\n\n", "analyzed at", s.analyzed_at.to_rfc3339());
    out
}

fn categorization_section(c: &Categorization) -> String {
    let mut out = String::from("Categories\n");
    for (dimension, verdict) in c.verdicts() {
        let mut line = format!("{} ({:.3})", verdict.valuation, verdict.confidence);
        if !verdict.keywords.is_empty() {
            line += &format!(" [{}]", verdict.keywords.join(", "));
        }
        out += &format!("  {:<26} {}\n", dimension.as_str(), line);
    }
    out += &format!("  {:<26} {}\n\n", "model", c.model_version);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sentinsight_ai::CategoryScorer;
    use sentinsight_core::Scope;
    use sentinsight_pipeline::{ItemReport, StageError, Target};

    #[test]
    fn report_lists_counts_and_failures() {
        let mut report = PipelineReport::new(Scope::Course("cálculo".into()), Target::Full);
        report.attempted = 4;
        report.succeeded = 3;
        report.failed = 1;
        report.items.push(ItemReport::failed(
            "o9".into(),
            StageError::PersistenceFailure("no document modified".into()),
        ));

        let text = report_text(&report);
        assert!(text.starts_with("=== Run (course:cálculo, full) ==="));
        assert!(text.contains("success rate"));
        assert!(text.contains("75.0%"));
        assert!(text.contains("persistence failure: no document modified"));
    }

    #[test]
    fn empty_report_omits_rate() {
        let report = PipelineReport::new(Scope::All, Target::CategorizationOnly);
        let text = report_text(&report);
        assert!(text.contains("attempted"));
        assert!(!text.contains("success rate"));
    }

    #[test]
    fn card_shows_pending_and_categories() {
        let mut opinion = Opinion::new(
            "o1",
            "muy difícil e injusto",
            4,
            "Cálculo I",
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        );
        opinion.categorization = Some(CategoryScorer::default().categorize(&opinion.comment));

        let card = opinion_card(&opinion);
        assert!(card.contains("Sentiment\n  (pending)"));
        assert!(card.contains("negative (0.667) [difícil, injusto]"));
        assert!(card.contains("keyword-based-v1.0"));
        assert!(card.contains("2024-02-10"));
    }
}
