use super::animation::Transition;
use super::scene::{NodeId, PointerEventKind, PointerPosition, SceneGraph, format_number};
use crate::domain::errors::ChartResult;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::OhlcRecord;
use crate::time_utils::format_tooltip_date;

/// Tooltip offset from the pointer, in pixels.
pub const TOOLTIP_OFFSET: (f64, f64) = (10.0, -28.0);

/// Round to two decimals. Never yields negative zero.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Percentage change of each price against the previous close.
/// `None` marks a rate that has no finite value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverRates {
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl HoverRates {
    pub const ZERO: Self = Self { open: Some(0.0), close: Some(0.0), high: Some(0.0), low: Some(0.0) };

    pub const UNAVAILABLE: Self = Self { open: None, close: None, high: None, low: None };

    /// All zero for the first record (`previous_close == None`), all
    /// unavailable when the previous close is zero.
    pub fn compute(record: &OhlcRecord, previous_close: Option<f64>) -> Self {
        let Some(prev) = previous_close else {
            return Self::ZERO;
        };
        if prev == 0.0 {
            crate::log_warn!(
                LogComponent::Domain("HoverRates"),
                "previous close of {} is zero, rates unavailable",
                record.date
            );
            return Self::UNAVAILABLE;
        }
        let rate = |value: f64| Some(round2((value - prev) / prev * 100.0)).filter(|r| r.is_finite());
        Self {
            open: rate(record.open),
            close: rate(record.close),
            high: rate(record.high),
            low: rate(record.low),
        }
    }
}

/// Multi-line tooltip text: the date, then one `name: value (rate%)` line per
/// price, `(n/a)` for an unavailable rate.
pub fn tooltip_label(record: &OhlcRecord, rates: &HoverRates) -> String {
    let line = |name: &str, value: f64, rate: Option<f64>| match rate {
        Some(rate) => format!("{}: {:.2} ({:.2}%)", name, value, rate),
        None => format!("{}: {:.2} (n/a)", name, value),
    };
    [
        format_tooltip_date(record.date),
        line("open", record.open, rates.open),
        line("close", record.close, rates.close),
        line("high", record.high, rates.high),
        line("low", record.low, rates.low),
    ]
    .join("\n")
}

/// What a pointer event does to the tooltip overlay
#[derive(Debug, Clone, PartialEq)]
pub enum TooltipUpdate {
    Show { text: String, position: PointerPosition },
    Move { position: PointerPosition },
    Hide,
}

impl TooltipUpdate {
    pub fn apply<S: SceneGraph + ?Sized>(&self, scene: &mut S, tooltip: NodeId) -> ChartResult<()> {
        match self {
            TooltipUpdate::Show { text, position } => {
                scene.set_text(tooltip, text)?;
                place(scene, tooltip, *position)?;
                scene.set_style(tooltip, "opacity", "0")?;
                scene.run_transition(tooltip, Transition::fade(0.0, 1.0))
            }
            TooltipUpdate::Move { position } => place(scene, tooltip, *position),
            TooltipUpdate::Hide => {
                // fade out from wherever a running show fade left the overlay
                let from = scene
                    .style_value(tooltip, "opacity")
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .unwrap_or(1.0);
                scene.run_transition(tooltip, Transition::fade(from, 0.0))
            }
        }
    }
}

fn place<S: SceneGraph + ?Sized>(scene: &mut S, tooltip: NodeId, position: PointerPosition) -> ChartResult<()> {
    let (dx, dy) = TOOLTIP_OFFSET;
    scene.set_style(tooltip, "left", &format!("{}px", format_number(position.x + dx)))?;
    scene.set_style(tooltip, "top", &format!("{}px", format_number(position.y + dy)))
}

/// Reacts to pointer events on one candle
pub trait PointerHandler {
    /// Overlay the updates are applied to.
    fn tooltip(&self) -> NodeId;

    fn on_enter(&self, position: PointerPosition) -> TooltipUpdate;

    fn on_move(&self, position: PointerPosition) -> TooltipUpdate {
        TooltipUpdate::Move { position }
    }

    fn on_leave(&self, _position: PointerPosition) -> TooltipUpdate {
        TooltipUpdate::Hide
    }

    fn dispatch(&self, kind: PointerEventKind, position: PointerPosition) -> TooltipUpdate {
        match kind {
            PointerEventKind::Enter => self.on_enter(position),
            PointerEventKind::Move => self.on_move(position),
            PointerEventKind::Leave => self.on_leave(position),
        }
    }
}

/// Hover handler for one record; holds only what the label needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleHoverHandler {
    record: OhlcRecord,
    previous_close: Option<f64>,
    tooltip: NodeId,
}

impl CandleHoverHandler {
    pub fn new(record: OhlcRecord, previous_close: Option<f64>, tooltip: NodeId) -> Self {
        Self { record, previous_close, tooltip }
    }

    pub fn rates(&self) -> HoverRates {
        HoverRates::compute(&self.record, self.previous_close)
    }

    pub fn label(&self) -> String {
        tooltip_label(&self.record, &self.rates())
    }
}

impl PointerHandler for CandleHoverHandler {
    fn tooltip(&self) -> NodeId {
        self.tooltip
    }

    fn on_enter(&self, position: PointerPosition) -> TooltipUpdate {
        TooltipUpdate::Show { text: self.label(), position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{ONE_DAY_MS, Timestamp};

    fn second() -> OhlcRecord {
        OhlcRecord::new(Timestamp::from_millis(ONE_DAY_MS), 110.0, 111.0, 104.0, 105.0)
    }

    #[test]
    fn rates_against_previous_close() {
        let rates = HoverRates::compute(&second(), Some(110.0));
        assert_eq!(
            rates,
            HoverRates { open: Some(0.0), close: Some(-4.55), high: Some(0.91), low: Some(-5.45) }
        );
    }

    #[test]
    fn first_record_has_zero_rates() {
        assert_eq!(HoverRates::compute(&second(), None), HoverRates::ZERO);
    }

    #[test]
    fn zero_previous_close_leaves_rates_unavailable() {
        let record = OhlcRecord::new(Timestamp::from_millis(ONE_DAY_MS), 0.0, 2.0, 0.0, 1.0);
        assert_eq!(HoverRates::compute(&record, Some(0.0)), HoverRates::UNAVAILABLE);

        let handler = CandleHoverHandler::new(record, Some(0.0), NodeId::from(1));
        insta::assert_snapshot!(handler.label(), @r"
        1970-01-02
        open: 0.00 (n/a)
        close: 1.00 (n/a)
        high: 2.00 (n/a)
        low: 0.00 (n/a)
        ");
    }

    #[test]
    fn round2_drops_negative_zero() {
        assert_eq!(round2(-0.001).to_string(), "0");
        assert_eq!(round2(1.005_1), 1.01);
    }

    #[test]
    fn label_lists_prices_and_rates() {
        let handler = CandleHoverHandler::new(second(), Some(110.0), NodeId::from(7));
        insta::assert_snapshot!(handler.label(), @r"
        1970-01-02
        open: 110.00 (0.00%)
        close: 105.00 (-4.55%)
        high: 111.00 (0.91%)
        low: 104.00 (-5.45%)
        ");
    }

    #[test]
    fn dispatch_routes_by_event_kind() {
        let handler = CandleHoverHandler::new(second(), None, NodeId::from(3));
        let at = PointerPosition::new(5.0, 6.0);
        assert!(matches!(handler.dispatch(PointerEventKind::Enter, at), TooltipUpdate::Show { .. }));
        assert_eq!(handler.dispatch(PointerEventKind::Move, at), TooltipUpdate::Move { position: at });
        assert_eq!(handler.dispatch(PointerEventKind::Leave, at), TooltipUpdate::Hide);
        assert_eq!(handler.tooltip(), NodeId::from(3));
    }
}
