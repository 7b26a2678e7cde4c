use candlestick_chart_wasm::domain::chart::scene::{PointerEventKind, PointerPosition};
use candlestick_chart_wasm::domain::market_data::ONE_DAY_MS;
use candlestick_chart_wasm::infrastructure::rendering::MemoryScene;
use candlestick_chart_wasm::{CandlestickChart, ChartConfig, ChartError, OhlcRecord, RedrawPolicy, Timestamp};

fn day(n: i64) -> Timestamp {
    Timestamp::from_millis(n * ONE_DAY_MS)
}

fn example() -> Vec<OhlcRecord> {
    vec![
        OhlcRecord::new(day(0), 100.0, 112.0, 98.0, 110.0),
        OhlcRecord::new(day(1), 110.0, 111.0, 104.0, 105.0),
    ]
}

fn chart(redraw: RedrawPolicy) -> CandlestickChart<MemoryScene> {
    let scene = MemoryScene::with_container("#chart", 960.0, 500.0);
    CandlestickChart::construct(scene, ChartConfig::new("#chart").with_redraw(redraw)).unwrap()
}

#[test]
fn construct_creates_the_skeleton_once() {
    let chart = chart(RedrawPolicy::Accumulate);
    let scene = chart.scene();

    for class in ["candlestick-svg", "grid-group", "axis-group", "chart-group", "candlestick-tooltip"] {
        assert_eq!(scene.query_class(class).len(), 1, "{class}");
    }
    let svg = chart.nodes().svg;
    assert_eq!(scene.attribute(svg, "width"), Some("960"));
    assert_eq!(scene.attribute(svg, "height"), Some("500"));
    assert_eq!(scene.attribute(chart.nodes().chart, "transform"), Some("translate(60,30)"));
    assert_eq!(scene.attribute(chart.nodes().y_axis, "transform"), Some("translate(840,0)"));
    assert_eq!(scene.attribute(chart.nodes().x_axis, "transform"), Some("translate(0,440)"));
    assert_eq!(scene.style(chart.nodes().tooltip, "opacity"), Some("0"));
    assert_eq!((chart.layout().width, chart.layout().height), (840.0, 440.0));
    assert!(chart.state().is_none());
}

#[test]
fn unresolvable_container_creates_nothing() {
    let mut scene = MemoryScene::with_container("#chart", 960.0, 500.0);
    let err = CandlestickChart::construct(&mut scene, ChartConfig::new("#elsewhere")).err().unwrap();

    assert!(matches!(err, ChartError::ConfigurationError(_)));
    assert_eq!(scene.live_nodes(), 0);
    assert_eq!(scene.mutations(), 0);
}

#[test]
fn container_smaller_than_margins_is_rejected() {
    let mut scene = MemoryScene::with_container("#chart", 100.0, 40.0);
    let err = CandlestickChart::construct(&mut scene, ChartConfig::new("#chart")).err().unwrap();
    assert!(matches!(err, ChartError::ConfigurationError(_)));
    assert_eq!(scene.live_nodes(), 0);
}

#[test]
fn example_candles_are_classified_and_placed() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    chart.load_data(example()).unwrap();
    chart.scene_mut().finish();

    let scales = chart.state().unwrap().scales;
    let scene = chart.scene();
    let bodies = scene.query_class("candle-body");
    let wicks = scene.query_class("candle-wick");
    assert_eq!((bodies.len(), wicks.len()), (2, 2));

    assert_eq!(scene.style(bodies[0], "fill"), Some("red"));
    assert_eq!(scene.style(bodies[1], "fill"), Some("blue"));
    assert_eq!(scene.attribute(wicks[0], "stroke"), Some("red"));
    assert_eq!(scene.attribute(wicks[1], "stroke"), Some("blue"));

    // 840px over three days
    assert!((scales.candle_width - 279.0).abs() < 1e-9);
    assert_eq!(scales.x.scale(day(-1)), 0.0);
    assert_eq!(scales.x.scale(day(2)), 840.0);
    assert_eq!(scales.y.scale(112.0), 0.0);
    assert_eq!(scales.y.scale(49.0), 440.0);

    let y = scene.numeric_attribute(bodies[0], "y").unwrap();
    let height = scene.numeric_attribute(bodies[0], "height").unwrap();
    assert!((y - scales.y.scale(110.0)).abs() < 1e-9);
    assert!((height - (scales.y.scale(100.0) - scales.y.scale(110.0) + 1.0)).abs() < 1e-9);
    assert_eq!(scene.attribute(bodies[1], "data-key"), Some(ONE_DAY_MS.to_string().as_str()));
    assert!(bodies.iter().chain(&wicks).all(|n| scene.has_handler(*n)));
    assert_eq!(scene.parent(bodies[0]), scene.first_of_class("candle-layer"));
}

#[test]
fn candles_enter_collapsed_at_open() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    chart.load_data(example()).unwrap();
    let open_y = chart.state().unwrap().scales.y.scale(100.0);

    let scene = chart.scene_mut();
    let body = scene.query_class("candle-body")[0];
    let wick = scene.query_class("candle-wick")[0];
    assert_eq!(scene.numeric_attribute(body, "height"), Some(0.0));
    assert!((scene.numeric_attribute(body, "y").unwrap() - open_y).abs() < 1e-9);
    assert_eq!(scene.attribute(wick, "y1"), scene.attribute(wick, "y2"));
    assert_eq!(scene.running_transitions(), 4);
    assert!(scene.is_transitioning(body) && scene.is_transitioning(wick));

    scene.advance(250.0);
    let mid = scene.numeric_attribute(body, "height").unwrap();
    assert!(mid > 0.0);
    assert_eq!(scene.running_transitions(), 4);

    scene.advance(250.0);
    assert_eq!(scene.running_transitions(), 0);
    assert!(scene.numeric_attribute(body, "height").unwrap() > mid);
}

#[test]
fn headless_layer_markup() {
    // 40x64 plot: 20px per day and one price unit per pixel
    let scene = MemoryScene::with_container("#chart", 160.0, 124.0);
    let mut chart = CandlestickChart::construct(scene, ChartConfig::new("#chart")).unwrap();
    chart.load_data(vec![OhlcRecord::new(day(0), 24.0, 72.0, 16.0, 40.0)]).unwrap();
    chart.scene_mut().finish();

    let scene = chart.scene();
    let layer = scene.first_of_class("candle-layer").unwrap();
    insta::assert_snapshot!(
        scene.to_markup(layer),
        @r#"<g class="candle-layer" data-generation="1"><rect class="candle-body" data-key="0" x="10.5" y="32" width="19" height="17" style="fill: red"></rect><line class="candle-wick" data-key="0" x1="20" x2="20" y1="56" y2="0" stroke="red"></line></g>"#
    );
}

#[test]
fn hovering_shows_rates_against_previous_close() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    chart.load_data(example()).unwrap();
    let tooltip = chart.nodes().tooltip;

    let scene = chart.scene_mut();
    scene.finish();
    let second = scene.query_class("candle-body")[1];
    let handled = scene
        .dispatch_pointer(second, PointerEventKind::Enter, PointerPosition::new(100.0, 200.0))
        .unwrap();
    assert!(handled);

    insta::assert_snapshot!(scene.text(tooltip).unwrap(), @r"
    1970-01-02
    open: 110.00 (0.00%)
    close: 105.00 (-4.55%)
    high: 111.00 (0.91%)
    low: 104.00 (-5.45%)
    ");
    assert_eq!(scene.style(tooltip, "left"), Some("110px"));
    assert_eq!(scene.style(tooltip, "top"), Some("172px"));
    assert_eq!(scene.style(tooltip, "opacity"), Some("0"));

    scene.advance(10.0);
    assert_eq!(scene.style(tooltip, "opacity"), Some("1"));

    scene
        .dispatch_pointer(second, PointerEventKind::Move, PointerPosition::new(150.0, 90.0))
        .unwrap();
    assert_eq!(scene.style(tooltip, "left"), Some("160px"));
    assert_eq!(scene.style(tooltip, "top"), Some("62px"));

    scene
        .dispatch_pointer(second, PointerEventKind::Leave, PointerPosition::new(150.0, 90.0))
        .unwrap();
    scene.advance(10.0);
    assert_eq!(scene.style(tooltip, "opacity"), Some("0"));
}

#[test]
fn first_record_rates_are_zero() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    chart.load_data(example()).unwrap();
    let tooltip = chart.nodes().tooltip;

    let scene = chart.scene_mut();
    let first = scene.query_class("candle-wick")[0];
    scene.dispatch_pointer(first, PointerEventKind::Enter, PointerPosition::default()).unwrap();

    let text = scene.text(tooltip).unwrap();
    assert!(text.starts_with("1970-01-01\n"), "{text}");
    assert_eq!(text.matches("(0.00%)").count(), 4, "{text}");
}

#[test]
fn accumulate_keeps_every_load() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    chart.load_data(example()).unwrap();
    let gridlines = chart.scene().query_class("gridline").len();
    chart.load_data(example()).unwrap();

    let scene = chart.scene();
    assert_eq!(scene.query_class("candle-body").len(), 4);
    assert_eq!(scene.query_class("candle-wick").len(), 4);
    assert_eq!(chart.layer_count(), 2);
    assert_eq!(chart.state().unwrap().generation, 2);
    // grid and axes describe only the current scales
    assert_eq!(scene.query_class("gridline").len(), gridlines);
    assert_eq!(scene.query_class("domain").len(), 2);
}

#[test]
fn replace_drops_earlier_layers() {
    let mut chart = chart(RedrawPolicy::Replace);
    chart.load_data(example()).unwrap();
    chart.scene_mut().advance(100.0);
    chart.load_data(example()).unwrap();

    let scene = chart.scene();
    assert_eq!(scene.query_class("candle-body").len(), 2);
    assert_eq!(scene.query_class("candle-layer").len(), 1);
    assert_eq!(chart.layer_count(), 1);
    assert_eq!(scene.running_transitions(), 4);
}

#[test]
fn replace_keeps_the_scene_bounded() {
    let mut chart = chart(RedrawPolicy::Replace);
    chart.load_data(example()).unwrap();
    let after_first = chart.scene().live_nodes();

    for _ in 0..50 {
        chart.load_data(example()).unwrap();
    }
    assert_eq!(chart.scene().live_nodes(), after_first);
    assert_eq!(chart.scene().query_class("candle-body").len(), 2);
}

#[test]
fn accumulate_grows_only_by_candle_layers() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    chart.load_data(example()).unwrap();
    let first = chart.scene().live_nodes();
    chart.load_data(example()).unwrap();
    let second = chart.scene().live_nodes();
    chart.load_data(example()).unwrap();

    // one group plus a body and a wick per record
    assert_eq!(second - first, 5);
    assert_eq!(chart.scene().live_nodes() - second, 5);
}

#[test]
fn leaving_mid_fade_fades_out_from_the_current_opacity() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    chart.load_data(example()).unwrap();
    let tooltip = chart.nodes().tooltip;

    let scene = chart.scene_mut();
    scene.finish();
    let body = scene.query_class("candle-body")[0];
    let at = PointerPosition::new(10.0, 10.0);
    scene.dispatch_pointer(body, PointerEventKind::Enter, at).unwrap();
    scene.advance(5.0);
    assert_eq!(scene.style(tooltip, "opacity"), Some("0.5"));

    scene.dispatch_pointer(body, PointerEventKind::Leave, at).unwrap();
    scene.advance(1.0);
    let opacity: f64 = scene.style(tooltip, "opacity").unwrap().parse().unwrap();
    assert!(opacity < 0.5, "{opacity}");
    scene.advance(9.0);
    assert_eq!(scene.style(tooltip, "opacity"), Some("0"));
    assert_eq!(scene.running_transitions(), 0);
}

#[test]
fn dates_at_the_timestamp_limit_are_a_data_error() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    let before = chart.scene().mutations();
    let err = chart
        .load_data(vec![OhlcRecord::new(Timestamp::from_millis(i64::MAX), 10.0, 11.0, 9.0, 10.5)])
        .unwrap_err();
    assert!(matches!(err, ChartError::DataError(_)));
    assert_eq!(chart.scene().mutations(), before);
    assert!(chart.state().is_none());
}

#[test]
fn empty_dataset_leaves_scene_untouched() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    let before = chart.scene().mutations();

    let err = chart.load_data(Vec::new()).unwrap_err();
    assert!(matches!(err, ChartError::DataError(_)));
    assert_eq!(chart.scene().mutations(), before);
    assert!(chart.state().is_none());
}

#[test]
fn invalid_record_keeps_previous_load() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    chart.load_data(example()).unwrap();
    let before = chart.scene().mutations();

    let mut broken = example();
    broken[1].high = 100.0;
    let err = chart.load_data(broken).unwrap_err();

    assert!(matches!(err, ChartError::ValidationError { index: 1, .. }));
    assert_eq!(chart.scene().mutations(), before);
    assert_eq!(chart.state().unwrap().generation, 1);
    assert_eq!(chart.scene().query_class("candle-body").len(), 2);
}

#[test]
fn dates_out_of_order_are_rejected() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    let mut records = example();
    records.swap(0, 1);

    let err = chart.load_data(records).unwrap_err();
    assert!(matches!(err, ChartError::ValidationError { index: 1, .. }));
    assert!(chart.scene().query_class("candle-body").is_empty());
}

#[test]
fn flat_zero_prices_are_a_data_error() {
    let mut chart = chart(RedrawPolicy::Accumulate);
    let before = chart.scene().mutations();
    let err = chart.load_data(vec![OhlcRecord::new(day(0), 0.0, 0.0, 0.0, 0.0)]).unwrap_err();
    assert!(matches!(err, ChartError::DataError(_)));
    assert_eq!(chart.scene().mutations(), before);
}
