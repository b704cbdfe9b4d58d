//! Parsed log records and the top-level parse entry point.
//!
//! [`parse_training_log`] turns one raw log blob into a [`ParsedLog`]: one
//! [`StageRecord`] per step-progress line, in log order. Parsing is
//! all-or-nothing at the top level — a log with no progress lines, or a line
//! that fails classification outright, yields `None` rather than a partial
//! result. Individual malformed metric pairs within a line are merely
//! skipped. Nothing on this path panics or returns an error.

use serde::{Deserialize, Serialize};

use crate::classify::{classify_metrics, LineLosses, MapLosses, OtherLosses, TrackLosses};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::extract::{extract_fields, progress_lines};

/// One parsed step-progress line. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Epoch number from the progress marker.
    pub epoch: u32,
    /// Step within the epoch.
    pub step: u32,
    /// Total steps per epoch.
    pub total_steps: u32,
    /// Estimated time remaining; `"N/A"` when absent.
    pub eta: String,
    /// Learning rate literal; `"N/A"` when absent.
    pub lr: String,
    /// Per-step wall time; `"N/A"` when absent.
    pub time: String,
    /// Data-loading time; `"N/A"` when absent.
    pub data_time: String,
    /// Device memory; `"N/A"` when absent.
    pub memory: String,
    /// Per-frame track losses.
    pub track_losses: TrackLosses,
    /// Map-head losses per sub-branch.
    pub map_losses: MapLosses,
    /// Motion / occupancy / planning / uncategorized buckets.
    pub other_losses: OtherLosses,
}

/// An ordered sequence of [`StageRecord`]s in log-line order.
///
/// The order is whatever the log emitted; records are never reordered by
/// epoch or step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedLog {
    /// Records in log-line order.
    pub stages: Vec<StageRecord>,
}

impl ParsedLog {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The first record, which fixes chart-series identity downstream.
    pub fn first(&self) -> Option<&StageRecord> {
        self.stages.first()
    }

    /// Iterate records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, StageRecord> {
        self.stages.iter()
    }
}

/// Parse a raw training log, reporting diagnostics to `tracing`.
///
/// Returns `None` when the input is empty, contains no step-progress lines,
/// or a line fails classification (see module docs).
pub fn parse_training_log(text: &str) -> Option<ParsedLog> {
    parse_training_log_with_sink(text, &TracingSink)
}

/// Parse a raw training log, reporting diagnostics to the supplied sink.
pub fn parse_training_log_with_sink(
    text: &str,
    sink: &dyn DiagnosticSink,
) -> Option<ParsedLog> {
    let lines = progress_lines(text);
    if lines.is_empty() {
        sink.emit(Diagnostic::NoMatchingLines);
        return None;
    }

    let mut stages = Vec::with_capacity(lines.len());
    for (line_no, line) in lines {
        let fields = extract_fields(line);
        let losses = match classify_metrics(line, line_no, sink) {
            Ok(losses) => losses,
            Err(err) => {
                sink.emit(Diagnostic::LineDiscarded {
                    line_no,
                    reason: err.to_string(),
                });
                return None;
            }
        };
        stages.push(build_record(fields, losses));
    }

    Some(ParsedLog { stages })
}

fn build_record(fields: crate::extract::LineFields, losses: LineLosses) -> StageRecord {
    StageRecord {
        epoch: fields.epoch,
        step: fields.step,
        total_steps: fields.total_steps,
        eta: fields.eta,
        lr: fields.lr,
        time: fields.time,
        data_time: fields.data_time,
        memory: fields.memory,
        track_losses: losses.track,
        map_losses: losses.map,
        other_losses: losses.other,
    }
}
