use sentinsight_core::{Label, OpinionId, Scope};
use serde::Serialize;

use crate::error::StageError;
use crate::pipeline::Target;

/// What happened to one opinion in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Annotations written. Sentiment fields are absent on categorization-only runs.
    Succeeded {
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<Label>,
        #[serde(skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
    Failed { error: StageError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub id: OpinionId,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

impl ItemReport {
    pub fn succeeded(id: OpinionId, label: Option<Label>, confidence: Option<f64>) -> Self {
        Self {
            id,
            outcome: ItemOutcome::Succeeded { label, confidence },
        }
    }

    pub fn failed(id: OpinionId, error: StageError) -> Self {
        Self {
            id,
            outcome: ItemOutcome::Failed { error },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Succeeded { .. })
    }

    pub fn error(&self) -> Option<&StageError> {
        match &self.outcome {
            ItemOutcome::Failed { error } => Some(error),
            ItemOutcome::Succeeded { .. } => None,
        }
    }
}

/// Summary of one pipeline invocation.
///
/// `attempted == succeeded + failed` and `items` lists every attempted
/// opinion in processing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub scope: Scope,
    pub target: Target,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
}

impl PipelineReport {
    pub fn new(scope: Scope, target: Target) -> Self {
        Self {
            scope,
            target,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            items: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, item: ItemReport) {
        self.attempted += 1;
        if item.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.items.push(item);
    }

    /// Succeeded share of attempted items as a percentage; 0 when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.attempted as f64 * 100.0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|i| !i.is_success())
    }
}
