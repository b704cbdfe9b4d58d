//! Building chartable series from a parsed log.
//!
//! A chart request pairs a [`ParsedLog`] with a selector that pulls an
//! ordered set of labeled leaf values out of one record (all layers of a
//! track loss, all keys of a map branch, ...). [`build_series`] turns that
//! into one [`ChartSeries`] per label plus per-record x-axis labels, ready
//! for the rendering layer. Nothing here is cached; series are rebuilt on
//! every request.
//!
//! Series identity (count and labels) is fixed by the **first** record.
//! Later records missing an entry contribute `0.0` rather than a gap, so a
//! chart never breaks mid-run when a layer disappears; this favors chart
//! continuity over strict correctness. The source taxonomy does not handle
//! layers added after the first record — they are simply never charted.

use serde::{Deserialize, Serialize};

use crate::classify::TrackLossKind;
use crate::color::Color;
use crate::ordered::OrderedMap;
use crate::record::{ParsedLog, StageRecord};
use crate::value::parse_metric;

/// Default chart palette (stroke colors), cycled by series index.
pub const DEFAULT_PALETTE: [Color; 6] = [
    Color::rgb(0x42, 0xb9, 0x83), // #42b983
    Color::rgb(0x66, 0x7e, 0xea), // #667eea
    Color::rgb(0xf0, 0x93, 0xfb), // #f093fb
    Color::rgb(0xf6, 0xd3, 0x65), // #f6d365
    Color::rgb(0xfd, 0xa0, 0x85), // #fda085
    Color::rgb(0xa8, 0xed, 0xea), // #a8edea
];

/// Alpha applied to a stroke color to derive the series fill.
pub const FILL_ALPHA: f32 = 0.1;

/// Line styling shared by every series of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    /// Curve tension (0 = straight segments).
    pub tension: f32,
    /// Stroke width in pixels.
    pub line_width: f32,
}

impl Default for SeriesStyle {
    fn default() -> Self {
        Self {
            tension: 0.4,
            line_width: 2.0,
        }
    }
}

/// One plotted line: a label, one value per record, and its colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Legend label (`Layer 0`, a map loss name, a raw metric key).
    pub label: String,
    /// One sample per record, in record order; missing samples are `0.0`.
    pub values: Vec<f64>,
    /// Stroke color from the palette.
    pub stroke: Color,
    /// Fill color: the stroke with [`FILL_ALPHA`].
    pub fill: Color,
}

/// A complete chart payload for the rendering layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// X-axis labels, `E<epoch>-S<step>` per record (not deduplicated).
    pub labels: Vec<String>,
    /// One series per label of the first record's selection.
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    /// Whether there is anything to draw.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Build chart series from a parsed log.
///
/// `selector` extracts the ordered `(label, value)` pairs to chart from one
/// record. The first record fixes which series exist; for every record each
/// series samples the first pair with a matching label, or `0.0` when none
/// is present. Returns an empty series list when the log is empty or the
/// first record's selection is empty.
pub fn build_series<F>(log: &ParsedLog, selector: F, palette: &[Color]) -> ChartData
where
    F: Fn(&StageRecord) -> Vec<(String, f64)>,
{
    let Some(first) = log.first() else {
        return ChartData::default();
    };

    let labels = log
        .iter()
        .map(|s| format!("E{}-S{}", s.epoch, s.step))
        .collect();

    let identity: Vec<String> = selector(first).into_iter().map(|(label, _)| label).collect();
    if identity.is_empty() {
        return ChartData {
            labels,
            series: Vec::new(),
        };
    }

    let palette = if palette.is_empty() {
        &DEFAULT_PALETTE[..]
    } else {
        palette
    };

    // One selector pass per record, shared across all series.
    let samples: Vec<Vec<(String, f64)>> = log.iter().map(|record| selector(record)).collect();

    let series = identity
        .into_iter()
        .enumerate()
        .map(|(index, label)| {
            let values = samples
                .iter()
                .map(|pairs| {
                    pairs
                        .iter()
                        .find_map(|(l, v)| (*l == label).then_some(*v))
                        .unwrap_or(0.0)
                })
                .collect();
            let stroke = palette[index % palette.len()];
            ChartSeries {
                label,
                values,
                stroke,
                fill: stroke.with_alpha(FILL_ALPHA),
            }
        })
        .collect();

    ChartData { labels, series }
}

/// The charts the dashboard offers, one selector each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    /// Per-layer track loss for one frame and kind; labels `Layer <i>`.
    Track {
        /// Frame id (0..=2).
        frame: u32,
        /// Loss kind within the frame.
        kind: TrackLossKind,
    },
    /// All losses of one map branch (`main`, `d0`, ...); labels are loss names.
    Map {
        /// Branch name.
        branch: String,
    },
    /// `motion.*` bucket; labels are raw keys.
    Motion,
    /// Occupancy bucket; labels are raw keys.
    Occ,
    /// Planning bucket; labels are raw keys.
    Planning,
    /// Catch-all bucket; labels are raw keys.
    Uncategorized,
}

impl ChartKind {
    /// Extract this chart's `(label, value)` pairs from one record.
    pub fn select(&self, record: &StageRecord) -> Vec<(String, f64)> {
        match self {
            Self::Track { frame, kind } => record
                .track_losses
                .frame(*frame)
                .map(|f| f.kind(*kind))
                .unwrap_or(&[])
                .iter()
                .enumerate()
                .map(|(i, layer)| {
                    (format!("Layer {i}"), parse_metric(&layer.value).unwrap_or(0.0))
                })
                .collect(),
            Self::Map { branch } => record
                .map_losses
                .branch(branch)
                .map(collect_bucket)
                .unwrap_or_default(),
            Self::Motion => collect_bucket(&record.other_losses.motion),
            Self::Occ => collect_bucket(&record.other_losses.occ),
            Self::Planning => collect_bucket(&record.other_losses.planning),
            Self::Uncategorized => collect_bucket(&record.other_losses.uncategorized),
        }
    }
}

fn collect_bucket(bucket: &OrderedMap<String>) -> Vec<(String, f64)> {
    bucket
        .iter()
        .map(|(key, value)| (key.to_string(), parse_metric(value).unwrap_or(0.0)))
        .collect()
}

/// Build the chart for one [`ChartKind`] with the default palette.
pub fn build_chart(log: &ParsedLog, kind: &ChartKind) -> ChartData {
    build_series(log, |record| kind.select(record), &DEFAULT_PALETTE)
}
