//! End-to-end tests for the training-charts pipeline.
//!
//! Tests cover:
//! 1. Full parse of a realistic multi-line log
//! 2. Epoch grouping and index navigation over the parsed log
//! 3. Chart building for every ChartKind family
//! 4. Soft-failure behavior (no data, discarded parses) with diagnostics
//! 5. ParsedLog/ChartData serialization roundtrips
//! 6. Render-slot dispose ordering with a stub backend

use training_charts::{
    build_chart, build_series, group_by_epoch, parse_training_log,
    parse_training_log_with_sink, ChartData, ChartKind, ChartSlot, CollectingSink, Diagnostic,
    ParsedLog, RenderError, RenderTarget, SeriesStyle, TrackLossKind, DEFAULT_PALETTE,
};

fn sample_log_text() -> String {
    let mut text = String::new();
    text.push_str("2024-03-02 10:11:12 INFO starting run uniad-base\n");
    for step in 1..=3u32 {
        text.push_str(&format!(
            "2024-03-02 10:12:0{step} INFO Epoch [1][{step}/100] eta: 1:02:0{step}, lr: 2.5e-4, \
             time: 0.512, data_time: 0.021, memory: 4096, \
             track.frame_0_loss_cls_0: 0.5{step}, track.frame_0_loss_cls_1: 0.4{step}, \
             track.frame_1_loss_bbox_0: 0.3{step}, \
             map.seg: 0.2{step}, map.d0.iou: 0.1{step}, \
             motion.ade: 0.9{step}, occ.grid: 0.8{step}, planning.l2: 0.7{step}\n"
        ));
    }
    text.push_str("checkpoint saved\n");
    text.push_str(
        "Epoch [2][1/100] eta: 0:59:00, lr: 2.5e-4, time: 0.500, data_time: 0.020, \
         memory: 4096, track.frame_0_loss_cls_0: 0.40, track.frame_0_loss_cls_1: 0.30, \
         map.seg: 0.10\n",
    );
    text
}

fn sample_log() -> ParsedLog {
    parse_training_log(&sample_log_text()).expect("sample log parses")
}

// ============================================================================
// Test 1: Full parse
// ============================================================================

#[test]
fn test_full_log_parses_in_line_order() {
    let log = sample_log();
    assert_eq!(log.len(), 4, "chatter lines are skipped");

    let first = log.first().expect("non-empty");
    assert_eq!((first.epoch, first.step, first.total_steps), (1, 1, 100));
    assert_eq!(first.eta, "1:02:01");
    assert_eq!(first.lr, "2.5e-4");
    assert_eq!(first.track_losses.frame_0.cls.len(), 2);
    assert_eq!(first.track_losses.frame_0.cls[0].value, "0.5100");
    assert_eq!(first.map_losses.main().get("seg"), Some(&"0.2100".to_string()));
    let d0 = first.map_losses.branch("d0").expect("predeclared");
    assert_eq!(d0.get("iou"), Some(&"0.1100".to_string()));
    assert!(first.other_losses.motion.contains_key("motion.ade"));
    assert!(first.other_losses.occ.contains_key("occ.grid"));
    assert!(first.other_losses.planning.contains_key("planning.l2"));
    // data_time carries an underscore, so it lands in the catch-all bucket.
    assert!(first.other_losses.uncategorized.contains_key("data_time"));

    let last = &log.stages[3];
    assert_eq!(last.epoch, 2);
    assert_eq!(last.track_losses.frame_1.bbox.len(), 0);
}

// ============================================================================
// Test 2: Epoch grouping and navigation
// ============================================================================

#[test]
fn test_epoch_groups_navigate_back_to_records() {
    let log = sample_log();
    let groups = group_by_epoch(&log);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].number, 1);
    assert_eq!(groups[0].stages.len(), 3);
    assert_eq!(groups[1].number, 2);
    assert_eq!(groups[1].stages.len(), 1);

    let jump = &groups[1].stages[0];
    assert_eq!(jump.index, 3);
    assert_eq!(log.stages[jump.index], jump.record);

    assert_eq!(groups, group_by_epoch(&log), "grouping is idempotent");
}

// ============================================================================
// Test 3: Chart building
// ============================================================================

#[test]
fn test_track_chart_layers_and_continuity() {
    let log = sample_log();
    let chart = build_chart(
        &log,
        &ChartKind::Track {
            frame: 1,
            kind: TrackLossKind::Bbox,
        },
    );

    // Frame 1 bbox exists on the first record only; the epoch-2 record
    // contributes a zero sample instead of a gap.
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.series[0].label, "Layer 0");
    assert_eq!(chart.series[0].values, [0.31, 0.32, 0.33, 0.0]);
    assert_eq!(chart.labels, ["E1-S1", "E1-S2", "E1-S3", "E2-S1"]);
    assert_eq!(chart.series[0].stroke, DEFAULT_PALETTE[0]);
    assert_eq!(chart.series[0].stroke.to_css(), "rgb(66, 185, 131)");
    assert_eq!(chart.series[0].fill.to_css(), "rgba(66, 185, 131, 0.1)");
}

#[test]
fn test_map_and_bucket_charts() {
    let log = sample_log();

    let main = build_chart(&log, &ChartKind::Map { branch: "main".into() });
    assert_eq!(main.series.len(), 1);
    assert_eq!(main.series[0].label, "seg");
    assert_eq!(main.series[0].values, [0.21, 0.22, 0.23, 0.1]);

    let motion = build_chart(&log, &ChartKind::Motion);
    assert_eq!(motion.series[0].label, "motion.ade");
    assert_eq!(motion.series[0].values, [0.91, 0.92, 0.93, 0.0]);

    let planning = build_chart(&log, &ChartKind::Planning);
    assert_eq!(planning.series[0].values, [0.71, 0.72, 0.73, 0.0]);
}

#[test]
fn test_custom_selector_and_palette() {
    let log = sample_log();
    let palette = [training_charts::Color::rgb(10, 20, 30)];
    let chart = build_series(
        &log,
        |record| {
            vec![(
                "lr".to_string(),
                training_charts::parse_metric(&record.lr).unwrap_or(0.0),
            )]
        },
        &palette,
    );
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.series[0].values, [2.5e-4; 4]);
    assert_eq!(chart.series[0].stroke, palette[0]);
}

// ============================================================================
// Test 4: Soft failures and diagnostics
// ============================================================================

#[test]
fn test_no_progress_lines_is_no_data() {
    let sink = CollectingSink::new();
    assert!(parse_training_log_with_sink("nothing to see here\n", &sink).is_none());
    assert_eq!(sink.take(), [Diagnostic::NoMatchingLines]);
}

#[test]
fn test_untracked_frame_discards_parse_with_diagnostic() {
    let text = "Epoch [1][1/10] map.seg: 0.5\nEpoch [1][2/10] track.frame_4_loss_cls_0: 0.1\n";
    let sink = CollectingSink::new();
    assert!(parse_training_log_with_sink(text, &sink).is_none());
    let events = sink.take();
    assert!(matches!(
        &events[..],
        [Diagnostic::LineDiscarded { line_no: 2, .. }]
    ));
}

#[test]
fn test_malformed_pair_skipped_rest_of_line_survives() {
    let text = "Epoch [1][1/10] map.seg: ...., map.iou: 0.5\n";
    let sink = CollectingSink::new();
    let log = parse_training_log_with_sink(text, &sink).expect("line survives");
    assert_eq!(log.stages[0].map_losses.main().get("iou"), Some(&"0.5000".to_string()));
    assert!(sink
        .take()
        .iter()
        .any(|e| matches!(e, Diagnostic::MalformedMetricPair { key, .. } if key == "map.seg")));
}

// ============================================================================
// Test 5: Serialization roundtrips
// ============================================================================

#[test]
fn test_parsed_log_and_chart_roundtrip() {
    let log = sample_log();
    let json = serde_json::to_string(&log).expect("log serializes");
    let back: ParsedLog = serde_json::from_str(&json).expect("log deserializes");
    assert_eq!(back, log);

    let chart = build_chart(&log, &ChartKind::Map { branch: "d0".into() });
    let json = serde_json::to_string(&chart).expect("chart serializes");
    let back: ChartData = serde_json::from_str(&json).expect("chart deserializes");
    assert_eq!(back, chart);
}

// ============================================================================
// Test 6: Render-slot contract
// ============================================================================

#[derive(Clone, Default)]
struct BackendState {
    inner: std::sync::Arc<std::sync::Mutex<(usize, bool)>>,
}

impl BackendState {
    fn drawn_series(&self) -> usize {
        self.inner.lock().expect("state lock").0
    }

    fn disposed(&self) -> bool {
        self.inner.lock().expect("state lock").1
    }
}

struct StubBackend {
    state: BackendState,
}

impl RenderTarget for StubBackend {
    fn draw(&mut self, data: &ChartData, _style: &SeriesStyle) -> Result<(), RenderError> {
        self.state.inner.lock().expect("state lock").0 = data.series.len();
        Ok(())
    }

    fn dispose(&mut self) {
        self.state.inner.lock().expect("state lock").1 = true;
    }
}

#[test]
fn test_chart_slot_draws_and_disposes() {
    let log = sample_log();
    let chart = build_chart(&log, &ChartKind::Map { branch: "main".into() });

    let first = BackendState::default();
    let second = BackendState::default();
    {
        let mut slot = ChartSlot::new();
        slot.install(Box::new(StubBackend {
            state: first.clone(),
        }));
        assert!(slot
            .render(&chart, &SeriesStyle::default())
            .expect("draw succeeds"));
        assert!(!first.disposed());

        slot.install(Box::new(StubBackend {
            state: second.clone(),
        }));
        assert!(first.disposed(), "old target disposed before replacement");
        assert!(slot
            .render(&chart, &SeriesStyle::default())
            .expect("draw succeeds"));
    }
    assert!(second.disposed(), "slot disposes its target on drop");
    assert_eq!(first.drawn_series(), 1);
    assert_eq!(second.drawn_series(), 1);
}
