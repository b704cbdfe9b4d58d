//! Training-log chart pipeline.
//!
//! Converts free-form textual progress logs from a long-running training job
//! into structured, chartable time-series records, so a dashboard can render
//! per-metric line charts without re-parsing raw text on every request.
//!
//! # Pipeline
//!
//! ```text
//! raw log text
//!      │
//!      ▼
//! ┌────────────────────────────────────────────┐
//! │  extract   — step-progress lines + fields  │
//! │  classify  — key:value pairs → loss buckets│
//! └────────────────────────────────────────────┘
//!      │
//!      ▼
//! record::parse_training_log → ParsedLog (one StageRecord per line)
//!      │
//!      ├──▶ epoch::group_by_epoch  → EpochGroup sequence (navigation)
//!      │
//!      └──▶ chart::build_series    → ChartData (labels + colored series)
//!                │
//!                ▼
//!          render::ChartSlot       → caller-supplied RenderTarget
//! ```
//!
//! Everything is synchronous and pure: each call is an independent function
//! of its inputs, nothing is cached, and no parse-path failure ever escapes
//! the crate — absent data comes back as `None`/empty and problems are
//! reported through [`diagnostics::DiagnosticSink`].
//!
//! # Example
//!
//! ```
//! use training_charts::{build_chart, group_by_epoch, parse_training_log, ChartKind};
//!
//! let text = "Epoch [1][1/100] eta: 0:10:00, map.seg: 0.5\n\
//!             Epoch [1][2/100] eta: 0:09:55, map.seg: 0.4\n";
//! let log = parse_training_log(text).expect("log has progress lines");
//!
//! let epochs = group_by_epoch(&log);
//! assert_eq!(epochs[0].number, 1);
//!
//! let chart = build_chart(&log, &ChartKind::Map { branch: "main".into() });
//! assert_eq!(chart.series[0].values, [0.5, 0.4]);
//! ```

pub mod chart;
pub mod classify;
pub mod color;
pub mod diagnostics;
pub mod epoch;
pub mod extract;
pub mod ordered;
pub mod record;
pub mod render;
pub mod value;

pub use chart::{
    build_chart, build_series, ChartData, ChartKind, ChartSeries, SeriesStyle, DEFAULT_PALETTE,
    FILL_ALPHA,
};
pub use classify::{
    ClassifyError, LayerLoss, LineLosses, MapLosses, OtherLosses, TrackFrameLosses, TrackLossKind,
    TrackLosses,
};
pub use color::Color;
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use epoch::{group_by_epoch, EpochGroup, IndexedStage};
pub use extract::{extract_fields, progress_lines, LineFields, MISSING_FIELD};
pub use ordered::OrderedMap;
pub use record::{parse_training_log, parse_training_log_with_sink, ParsedLog, StageRecord};
pub use render::{ChartSlot, RenderError, RenderTarget};
pub use value::{format_metric, parse_metric, METRIC_DECIMALS};
