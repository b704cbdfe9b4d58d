//! Structured diagnostics for the parse pipeline.
//!
//! Parsing never raises out of the crate: failures surface as an absence of
//! data, and everything worth telling the host about is reported as a
//! [`Diagnostic`] event through a [`DiagnosticSink`]. The default sink
//! forwards events to `tracing`; hosts that want to surface parse problems
//! in their own UI install a sink of their own.

use std::sync::Mutex;

use serde::Serialize;

/// One diagnostic event emitted while parsing a training log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Diagnostic {
    /// The log text contained no step-progress lines at all.
    NoMatchingLines,
    /// A `key: value` occurrence whose value failed numeric parsing; the
    /// pair is skipped, the line survives.
    MalformedMetricPair {
        /// 1-based line number in the raw log text.
        line_no: usize,
        /// Metric key of the offending pair.
        key: String,
        /// Raw value text that failed to parse.
        raw: String,
    },
    /// A line failed classification outright; the whole parse is abandoned.
    LineDiscarded {
        /// 1-based line number in the raw log text.
        line_no: usize,
        /// Human-readable failure description.
        reason: String,
    },
}

/// Receives diagnostic events from the parse pipeline.
pub trait DiagnosticSink {
    /// Report one event. Implementations must not panic.
    fn emit(&self, diagnostic: Diagnostic);
}

/// Default sink: forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::NoMatchingLines => {
                tracing::debug!("training log contains no step-progress lines");
            }
            Diagnostic::MalformedMetricPair { line_no, key, raw } => {
                tracing::debug!(
                    line_no = *line_no,
                    key = %key,
                    raw = %raw,
                    "skipping malformed metric pair"
                );
            }
            Diagnostic::LineDiscarded { line_no, reason } => {
                tracing::warn!(
                    line_no = *line_no,
                    reason = %reason,
                    "discarding training log parse"
                );
            }
        }
    }
}

/// Test/host helper that records every event it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return the events collected so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match self.events.lock() {
            Ok(mut events) => events.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
