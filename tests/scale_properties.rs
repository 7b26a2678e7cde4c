#![cfg(not(target_arch = "wasm32"))]

use candlestick_chart_wasm::domain::chart::{
    GeometryBuilder, Layout, Margin, ScaleEngine,
    scales::{GUTTER_PX, MIN_CANDLE_WIDTH, nice_ticks},
};
use candlestick_chart_wasm::domain::market_data::{Dataset, ONE_DAY_MS, OhlcRecord, Timestamp};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

/// Valid, strictly increasing daily records derived from arbitrary input.
fn records(raw: &[(u16, u16, u16, u16)]) -> Vec<OhlcRecord> {
    let mut day = 0i64;
    raw.iter()
        .map(|&(a, b, c, d)| {
            day += 1 + (a % 3) as i64;
            let base = 1.0 + (a % 1000) as f64;
            let open = base + (b % 50) as f64;
            let close = base + (c % 50) as f64;
            let low = open.min(close) - (d % 10) as f64 * 0.09;
            let high = open.max(close) + (d % 7) as f64;
            OhlcRecord::new(Timestamp::from_millis(day * ONE_DAY_MS), open, high, low, close)
        })
        .collect()
}

fn layout(width: u16, height: u16) -> Layout {
    Layout {
        margin: Margin::default(),
        width: 1.0 + (width % 2000) as f64,
        height: 1.0 + (height % 1000) as f64,
    }
}

#[quickcheck]
fn scale_domains_hit_range_ends(raw: Vec<(u16, u16, u16, u16)>, w: u16, h: u16) -> TestResult {
    if raw.is_empty() || raw.len() > 200 {
        return TestResult::discard();
    }
    let dataset = Dataset::new(records(&raw)).unwrap();
    let layout = layout(w, h);
    let scales = ScaleEngine::new().compute(&dataset, &layout).unwrap();

    let first = dataset.first().date;
    let last = dataset.last().date;
    TestResult::from_bool(
        scales.x.scale_ms(first.as_f64() - ONE_DAY_MS as f64) == 0.0
            && scales.x.scale_ms(last.as_f64() + ONE_DAY_MS as f64) == layout.width
            && scales.y.scale(dataset.max_high()) == 0.0
            && scales.y.scale(dataset.min_low() * 0.5) == layout.height,
    )
}

#[quickcheck]
fn candle_width_is_day_span_minus_gutter(raw: Vec<(u16, u16, u16, u16)>, w: u16) -> TestResult {
    if raw.is_empty() || raw.len() > 200 {
        return TestResult::discard();
    }
    let dataset = Dataset::new(records(&raw)).unwrap();
    let scales = ScaleEngine::new().compute(&dataset, &layout(w, 300)).unwrap();

    let expected = (scales.x.day_width() - GUTTER_PX).max(MIN_CANDLE_WIDTH);
    TestResult::from_bool(scales.candle_width > 0.0 && scales.candle_width == expected)
}

#[quickcheck]
fn geometry_is_ordered_and_well_formed(raw: Vec<(u16, u16, u16, u16)>, w: u16, h: u16) -> TestResult {
    if raw.is_empty() || raw.len() > 200 {
        return TestResult::discard();
    }
    let dataset = Dataset::new(records(&raw)).unwrap();
    let scales = ScaleEngine::new().compute(&dataset, &layout(w, h)).unwrap();
    let candles = GeometryBuilder::new().build(&dataset, &scales).unwrap();

    let centered = candles
        .iter()
        .all(|c| (c.body.x + c.body.width / 2.0 - c.wick.x).abs() < 1e-6);
    let upright = candles.iter().all(|c| c.body.height >= 1.0 - 1e-9 && c.wick.y1 >= c.wick.y2);
    let increasing = candles.windows(2).all(|pair| pair[0].wick.x < pair[1].wick.x);
    TestResult::from_bool(candles.len() == dataset.len() && centered && upright && increasing)
}

#[quickcheck]
fn ticks_stay_inside_the_domain(lo: i32, span: u16, count: u8) -> TestResult {
    if span == 0 || count == 0 {
        return TestResult::discard();
    }
    let start = lo as f64 / 100.0;
    let stop = start + span as f64 / 10.0;
    let ticks = nice_ticks(start, stop, count as usize);

    let inside = ticks.iter().all(|t| *t >= start - 1e-9 && *t <= stop + 1e-9);
    let sorted = ticks.windows(2).all(|p| p[0] < p[1]);
    TestResult::from_bool(inside && sorted)
}
