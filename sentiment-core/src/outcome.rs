//! Stage results.
//!
//! A stage either fails outright (`Err(CoreError)`) or returns a
//! [`StageReport`] listing what it wrote and which items it had to skip.

use crate::{CoreError, ErrorExt, ErrorReporter};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collect,
    Score,
    Correlate,
    Visualize,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Collect => "collect",
            Stage::Score => "score",
            Stage::Correlate => "correlate",
            Stage::Visualize => "visualize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An item (sheet, ticker, search pair, chart) a stage gave up on.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub item: String,
    pub error_code: String,
    pub reason: String,
}

/// How a finished stage went, judged from its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Everything was written, nothing skipped.
    Complete,
    /// Some items were written, some skipped.
    Partial,
    /// Nothing was written.
    Empty,
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub outputs: Vec<PathBuf>,
    pub written: Vec<String>,
    pub skipped: Vec<SkippedItem>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            outputs: Vec::new(),
            written: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn record_written(&mut self, item: impl Into<String>) {
        self.written.push(item.into());
    }

    pub fn record_output(&mut self, path: PathBuf) {
        self.outputs.push(path);
    }

    pub fn record_skipped(&mut self, item: impl Into<String>, error: &CoreError) {
        let item = item.into();
        ErrorReporter::for_stage(self.stage.name()).report_skip(&item, error);
        self.skipped.push(SkippedItem {
            item,
            error_code: error.error_code(),
            reason: error.to_string(),
        });
    }

    /// Records `error` against `item` when the error allows the stage to carry
    /// on, otherwise hands it back so the stage can abort.
    pub fn skip_or_fail(&mut self, item: impl Into<String>, error: CoreError) -> Result<(), CoreError> {
        if error.is_skippable() {
            self.record_skipped(item, &error);
            Ok(())
        } else {
            Err(error)
        }
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_skipped(&self, item: &str) -> bool {
        self.skipped.iter().any(|s| s.item == item)
    }

    pub fn outcome(&self) -> StageOutcome {
        if self.written.is_empty() {
            StageOutcome::Empty
        } else if self.skipped.is_empty() {
            StageOutcome::Complete
        } else {
            StageOutcome::Partial
        }
    }

    pub fn log_summary(&self) {
        info!(
            "[{}] finished ({:?}): {} written, {} skipped",
            self.stage,
            self.outcome(),
            self.written.len(),
            self.skipped.len()
        );
        for path in &self.outputs {
            info!("[{}] output saved to '{}'", self.stage, path.display());
        }
        for skipped in &self.skipped {
            warn!(
                "[{}] skipped {} [{}]: {}",
                self.stage, skipped.item, skipped.error_code, skipped.reason
            );
        }
    }
}
