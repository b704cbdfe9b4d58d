//! Metric classification into nested loss buckets.
//!
//! Each `key: value` pair found on a step-progress line is routed by
//! key-prefix into one of three bucket families:
//!
//! - **track** — per-frame detection losses, keyed
//!   `track.frame_<N>_loss_<kind>_<layer>` with kind one of `cls`, `bbox`,
//!   `past_trajs`; layers accumulate in order of appearance.
//! - **map** — map-head losses, `map.<name>` into the `main` branch and
//!   `map.<sub>.<name>` into a (possibly dynamically created) sub-branch.
//! - **other** — `motion.*`, `occ.*`/`occupancy.*`, `planning.*`/`plan.*`,
//!   and a catch-all `uncategorized` bucket for any other key containing a
//!   `.` or `_` separator.
//!
//! Keys with no separator and no recognized prefix are silently dropped.
//! Values are stored through the fixed-precision codec in [`crate::value`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::ordered::OrderedMap;
use crate::value::{format_metric, parse_metric};

/// Frame ids the track buckets cover.
pub const TRACK_FRAMES: u32 = 3;

/// `<dotted.or.underscored.key>: <decimal>` occurrence.
fn metric_pair() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\w.]+):\s*([\d.]+)").expect("hard-coded pattern compiles"))
}

/// Detailed shape of a track loss key.
fn track_key() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"track\.frame_(\d+)_loss_(cls|bbox|past_trajs)_(\d+)")
            .expect("hard-coded pattern compiles")
    })
}

/// One layer's contribution to a track loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerLoss {
    /// Layer index as written in the key (kept as text).
    pub layer: String,
    /// Fixed-precision value string.
    pub value: String,
}

/// The kinds of per-frame track losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackLossKind {
    /// Classification loss.
    Cls,
    /// Bounding-box regression loss.
    Bbox,
    /// Past-trajectory loss.
    PastTrajs,
}

impl TrackLossKind {
    fn from_key_segment(segment: &str) -> Option<Self> {
        match segment {
            "cls" => Some(Self::Cls),
            "bbox" => Some(Self::Bbox),
            "past_trajs" => Some(Self::PastTrajs),
            _ => None,
        }
    }
}

/// Track losses for one frame, per kind, layers in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFrameLosses {
    /// Classification losses per layer.
    pub cls: Vec<LayerLoss>,
    /// Bounding-box losses per layer.
    pub bbox: Vec<LayerLoss>,
    /// Past-trajectory losses per layer.
    pub past_trajs: Vec<LayerLoss>,
}

impl TrackFrameLosses {
    /// Layer sequence for one loss kind.
    pub fn kind(&self, kind: TrackLossKind) -> &[LayerLoss] {
        match kind {
            TrackLossKind::Cls => &self.cls,
            TrackLossKind::Bbox => &self.bbox,
            TrackLossKind::PastTrajs => &self.past_trajs,
        }
    }

    fn kind_mut(&mut self, kind: TrackLossKind) -> &mut Vec<LayerLoss> {
        match kind {
            TrackLossKind::Cls => &mut self.cls,
            TrackLossKind::Bbox => &mut self.bbox,
            TrackLossKind::PastTrajs => &mut self.past_trajs,
        }
    }
}

/// Track losses for the fixed set of frames 0..=2.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackLosses {
    /// Frame 0 losses.
    pub frame_0: TrackFrameLosses,
    /// Frame 1 losses.
    pub frame_1: TrackFrameLosses,
    /// Frame 2 losses.
    pub frame_2: TrackFrameLosses,
}

impl TrackLosses {
    /// Losses for one frame id, `None` outside 0..=2.
    pub fn frame(&self, frame: u32) -> Option<&TrackFrameLosses> {
        match frame {
            0 => Some(&self.frame_0),
            1 => Some(&self.frame_1),
            2 => Some(&self.frame_2),
            _ => None,
        }
    }

    fn frame_mut(&mut self, frame: u32) -> Option<&mut TrackFrameLosses> {
        match frame {
            0 => Some(&mut self.frame_0),
            1 => Some(&mut self.frame_1),
            2 => Some(&mut self.frame_2),
            _ => None,
        }
    }
}

/// Map-head losses per sub-branch.
///
/// The `main`, `d0`, `d1` and `d2` branches always exist; further branches
/// are created on first sight and iterate after the predeclared ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapLosses {
    branches: OrderedMap<OrderedMap<String>>,
}

/// Branch name for top-level `map.<name>` keys.
pub const MAP_MAIN_BRANCH: &str = "main";

const MAP_PREDECLARED: [&str; 4] = [MAP_MAIN_BRANCH, "d0", "d1", "d2"];

fn empty_bucket() -> &'static OrderedMap<String> {
    static EMPTY: OnceLock<OrderedMap<String>> = OnceLock::new();
    EMPTY.get_or_init(OrderedMap::new)
}

impl Default for MapLosses {
    fn default() -> Self {
        let mut branches = OrderedMap::new();
        for name in MAP_PREDECLARED {
            let _ = branches.insert(name, OrderedMap::new());
        }
        Self { branches }
    }
}

impl MapLosses {
    /// Losses in one branch, `None` if the branch was never created.
    pub fn branch(&self, name: &str) -> Option<&OrderedMap<String>> {
        self.branches.get(name)
    }

    /// Losses in the `main` branch.
    pub fn main(&self) -> &OrderedMap<String> {
        // Predeclared by Default; fall back to empty for maps deserialized
        // from foreign data that dropped the branch.
        self.branches.get(MAP_MAIN_BRANCH).unwrap_or_else(|| empty_bucket())
    }

    /// Branch names in iteration order (predeclared first, then discovered).
    pub fn branch_names(&self) -> impl Iterator<Item = &str> {
        self.branches.keys()
    }

    fn insert(&mut self, branch: &str, name: &str, value: String) {
        let _ = self
            .branches
            .entry_or_insert_with(branch, OrderedMap::new)
            .insert(name, value);
    }
}

/// Fixed catch-all buckets for everything outside track and map.
///
/// Full keys are retained (prefixes are not stripped).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherLosses {
    /// `motion.*` keys.
    pub motion: OrderedMap<String>,
    /// `occ.*` and `occupancy.*` keys.
    pub occ: OrderedMap<String>,
    /// `planning.*` and `plan.*` keys.
    pub planning: OrderedMap<String>,
    /// Any other key containing a `.` or `_` separator.
    pub uncategorized: OrderedMap<String>,
}

/// All loss buckets extracted from one line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineLosses {
    /// Per-frame track losses.
    pub track: TrackLosses,
    /// Map-head losses.
    pub map: MapLosses,
    /// Everything else.
    pub other: OtherLosses,
}

/// A line-level classification failure; aborts the whole parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// A track loss key referenced a frame outside the tracked 0..=2 range.
    #[error("track loss key {key:?} references frame {frame}, only frames 0..={} exist", TRACK_FRAMES - 1)]
    UnknownTrackFrame {
        /// Offending metric key.
        key: String,
        /// Frame id parsed from the key.
        frame: u32,
    },
}

/// Classify every metric pair on one step-progress line.
///
/// Malformed values are skipped with a [`Diagnostic::MalformedMetricPair`];
/// a track key naming an untracked frame is the one hard failure and bubbles
/// up so the caller can abandon the parse.
pub fn classify_metrics(
    line: &str,
    line_no: usize,
    sink: &dyn DiagnosticSink,
) -> Result<LineLosses, ClassifyError> {
    let mut losses = LineLosses::default();

    for caps in metric_pair().captures_iter(line) {
        let key = &caps[1];
        let raw = &caps[2];

        let Some(numeric) = parse_metric(raw) else {
            sink.emit(Diagnostic::MalformedMetricPair {
                line_no,
                key: key.to_string(),
                raw: raw.to_string(),
            });
            continue;
        };
        let value = format_metric(numeric);

        if key.starts_with("track.frame_") {
            classify_track(key, value, &mut losses.track)?;
        } else if let Some(rest) = key.strip_prefix("map.") {
            classify_map(rest, value, &mut losses.map);
        } else if key.starts_with("motion.") {
            let _ = losses.other.motion.insert(key, value);
        } else if key.starts_with("occ.") || key.starts_with("occupancy.") {
            let _ = losses.other.occ.insert(key, value);
        } else if key.starts_with("planning.") || key.starts_with("plan.") {
            let _ = losses.other.planning.insert(key, value);
        } else if key.contains('.') || key.contains('_') {
            let _ = losses.other.uncategorized.insert(key, value);
        }
        // Separator-free keys with no recognized prefix (`eta`, `lr`, `loss`)
        // are intentionally dropped.
    }

    Ok(losses)
}

fn classify_track(key: &str, value: String, track: &mut TrackLosses) -> Result<(), ClassifyError> {
    // Keys carrying the prefix but not the full detailed shape are consumed
    // and dropped, matching the precedence of the routing rules.
    let Some(caps) = track_key().captures(key) else {
        return Ok(());
    };
    let frame: u32 = caps[1].parse().unwrap_or(u32::MAX);
    let layer = caps[3].to_string();
    let kind = TrackLossKind::from_key_segment(&caps[2]).unwrap_or(TrackLossKind::Cls);

    let Some(frame_losses) = track.frame_mut(frame) else {
        return Err(ClassifyError::UnknownTrackFrame {
            key: key.to_string(),
            frame,
        });
    };
    frame_losses.kind_mut(kind).push(LayerLoss { layer, value });
    Ok(())
}

fn classify_map(rest: &str, value: String, map: &mut MapLosses) {
    let segments: Vec<&str> = rest.split('.').collect();
    match segments.as_slice() {
        &[name] => map.insert(MAP_MAIN_BRANCH, name, value),
        &[sub, name] => map.insert(sub, name, value),
        // Deeper nesting is not part of the taxonomy; dropped.
        _ => {}
    }
}
