//! Fixed-precision codec for metric values.
//!
//! Every numeric value stored in a [`StageRecord`](crate::record::StageRecord)
//! goes through this codec: parsed as a float, then re-encoded as a decimal
//! string with exactly [`METRIC_DECIMALS`] fractional digits. The rounding in
//! that step is deliberate precision normalization; decoding the stored
//! string back to a float may not recover the raw log value.

/// Number of fractional digits every stored metric value carries.
pub const METRIC_DECIMALS: usize = 4;

/// Encode a raw metric value as a fixed-precision decimal string.
///
/// Rounds (never truncates) to [`METRIC_DECIMALS`] fractional digits, so
/// `0.12345` becomes `"0.1235"` and `0.5` becomes `"0.5000"`. Encoding an
/// already-encoded value yields the same string.
pub fn format_metric(raw: f64) -> String {
    format!("{:.1$}", raw, METRIC_DECIMALS)
}

/// Decode a metric value string back to a float.
///
/// Returns `None` for anything that is not a finite float literal, including
/// the `"N/A"` sentinel used for absent auxiliary fields.
pub fn parse_metric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
