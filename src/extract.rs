//! Line-level extraction of step-progress fields.
//!
//! A step-progress line starts (possibly after a logging prefix) with the
//! marker `Epoch [<epoch>][<step>/<total>]`; the rest of the line is
//! free-form `key: value` text. Extraction here is purely textual pattern
//! matching; no semantic validation of ranges is attempted.

use std::sync::OnceLock;

use regex::Regex;

/// `Epoch [e][s/t]` progress marker with its three bracketed integers.
fn epoch_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Epoch \[(\d+)\]\[(\d+)/(\d+)\]").expect("hard-coded pattern compiles")
    })
}

/// `eta:` up to the next comma (ETA is a clock string, not a number).
fn eta_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"eta:\s*([^,]+)").expect("hard-coded pattern compiles"))
}

/// `lr:` followed by a numeric literal, exponential notation allowed.
fn lr_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"lr:\s*([\d.e-]+)").expect("hard-coded pattern compiles"))
}

fn time_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"time:\s*([\d.]+)").expect("hard-coded pattern compiles"))
}

fn data_time_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"data_time:\s*([\d.]+)").expect("hard-coded pattern compiles"))
}

fn memory_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"memory:\s*([\d.]+)").expect("hard-coded pattern compiles"))
}

/// Sentinel stored for auxiliary fields that are absent from a line.
///
/// The literal string is kept (rather than an `Option`) so dashboards can
/// display the field directly.
pub const MISSING_FIELD: &str = "N/A";

/// Scalar fields extracted from one step-progress line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFields {
    /// Epoch number from the first bracket.
    pub epoch: u32,
    /// Step within the epoch from the second bracket.
    pub step: u32,
    /// Total steps per epoch from the second bracket.
    pub total_steps: u32,
    /// Estimated time remaining, e.g. `"1:02:03"`.
    pub eta: String,
    /// Learning rate literal, e.g. `"2.5e-4"`.
    pub lr: String,
    /// Per-step wall time in seconds.
    pub time: String,
    /// Data-loading time in seconds.
    pub data_time: String,
    /// Device memory in MB.
    pub memory: String,
}

/// Find every step-progress line in the log text.
///
/// Returns `(line_no, tail)` pairs where `line_no` is the 1-based line number
/// in the raw text and `tail` is the line from the `Epoch [...]` marker to the
/// end (any logging prefix before the marker is cut off). Lines without the
/// marker are ignored.
pub fn progress_lines(text: &str) -> Vec<(usize, &str)> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            epoch_marker()
                .find(line)
                .map(|m| (idx + 1, &line[m.start()..]))
        })
        .collect()
}

/// Extract the scalar fields from one step-progress line.
///
/// The line is expected to contain the epoch marker; the bracketed integers
/// default to 0 if a sub-capture is somehow absent, and each auxiliary field
/// defaults to [`MISSING_FIELD`].
pub fn extract_fields(line: &str) -> LineFields {
    let (epoch, step, total_steps) = match epoch_marker().captures(line) {
        Some(caps) => (
            capture_u32(&caps, 1),
            capture_u32(&caps, 2),
            capture_u32(&caps, 3),
        ),
        None => (0, 0, 0),
    };

    LineFields {
        epoch,
        step,
        total_steps,
        eta: capture_trimmed(eta_field(), line),
        lr: capture_string(lr_field(), line),
        time: capture_string(time_field(), line),
        data_time: capture_string(data_time_field(), line),
        memory: capture_string(memory_field(), line),
    }
}

fn capture_u32(caps: &regex::Captures<'_>, group: usize) -> u32 {
    caps.get(group)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn capture_string(re: &Regex, line: &str) -> String {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| MISSING_FIELD.to_string(), |m| m.as_str().to_string())
}

fn capture_trimmed(re: &Regex, line: &str) -> String {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| MISSING_FIELD.to_string(), |m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "Epoch [2][15/100] eta: 1:02:03, lr: 2.5e-4, time: 0.512, \
                        data_time: 0.021, memory: 4096";

    #[test]
    fn test_progress_lines_filters_and_numbers() {
        let text = "starting up\nEpoch [1][1/10] loss: 0.5\nsome chatter\nEpoch [1][2/10] loss: 0.4\n";
        let lines = progress_lines(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, 2);
        assert_eq!(lines[1].0, 4);
    }

    #[test]
    fn test_progress_lines_cut_logging_prefix() {
        let text = "2024-01-01 12:00:00 INFO Epoch [3][7/50] time: 0.1";
        let lines = progress_lines(text);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.starts_with("Epoch [3]"));
    }

    #[test]
    fn test_bracket_integers_roundtrip() {
        let fields = extract_fields(LINE);
        assert_eq!(fields.epoch, 2);
        assert_eq!(fields.step, 15);
        assert_eq!(fields.total_steps, 100);
    }

    #[test]
    fn test_auxiliary_fields() {
        let fields = extract_fields(LINE);
        assert_eq!(fields.eta, "1:02:03");
        assert_eq!(fields.lr, "2.5e-4");
        assert_eq!(fields.time, "0.512");
        assert_eq!(fields.data_time, "0.021");
        assert_eq!(fields.memory, "4096");
    }

    #[test]
    fn test_absent_fields_default_to_sentinel() {
        let fields = extract_fields("Epoch [1][1/10] loss: 0.5");
        assert_eq!(fields.eta, MISSING_FIELD);
        assert_eq!(fields.lr, MISSING_FIELD);
        assert_eq!(fields.time, MISSING_FIELD);
        assert_eq!(fields.data_time, MISSING_FIELD);
        assert_eq!(fields.memory, MISSING_FIELD);
    }
}
