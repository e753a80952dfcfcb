use crate::pagination::cursor::Cursor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the external transform/upsert collaborator classified one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Imported,
    Updated,
    Skipped,
    Failed,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Imported => "imported",
            UpsertOutcome::Updated => "updated",
            UpsertOutcome::Skipped => "skipped",
            UpsertOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record upsert result crossing the collaborator boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpsertReport {
    pub outcome: UpsertOutcome,
    pub reason: Option<String>,
}

impl UpsertReport {
    pub fn new(outcome: UpsertOutcome) -> Self {
        UpsertReport {
            outcome,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        UpsertReport {
            outcome: UpsertOutcome::Failed,
            reason: Some(reason.into()),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        UpsertReport {
            outcome: UpsertOutcome::Skipped,
            reason: Some(reason.into()),
        }
    }
}

/// Aggregated result of processing exactly one page of records.
///
/// Produced by the batch processor, folded into the import session by the
/// scheduler, then discarded.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub imported: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
    pub log: Vec<String>,
    pub has_next_page: bool,
    /// Cursor the follow-up batch should resume from.
    pub next_cursor: Cursor,
}

impl BatchOutcome {
    pub fn new(has_next_page: bool, next_cursor: Cursor) -> Self {
        BatchOutcome {
            imported: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            log: Vec::new(),
            has_next_page,
            next_cursor,
        }
    }

    pub fn tally(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Imported => self.imported += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
            UpsertOutcome::Failed => self.failed += 1,
        }
    }

    /// Records this batch handed through the pipeline, in any classification.
    pub fn processed(&self) -> u64 {
        self.imported + self.updated + self.skipped + self.failed
    }

    pub fn succeeded(&self) -> u64 {
        self.imported + self.updated
    }
}
