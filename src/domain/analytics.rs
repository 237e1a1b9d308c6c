//! Chart-ready series derived from a view of bars and the trade history.
//!
//! Everything here is a pure function of its inputs: the same bars and trade
//! points always produce the same output, so a renderer can skip redraws by
//! comparing snapshots.

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Range;

use super::portfolio::{Portfolio, PortfolioSummary, TradePoint};
use super::price_bar::PriceBar;
use super::trade_engine::Side;

/// Vertical marker offset in chart pixels; positive draws below the anchor.
pub const MARKER_OFFSET: i32 = 7;

/// Candle body in the renderer's `(open, close, low, high)` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
}

impl Serialize for Candle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.open, self.close, self.low, self.high).serialize(serializer)
    }
}

/// Volume bar `(index, volume, direction)`; direction is `1` for a down day
/// (open above close) and `-1` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeBar {
    pub index: usize,
    pub volume: i64,
    pub direction: i8,
}

impl Serialize for VolumeBar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.index, self.volume, self.direction).serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvSplit {
    pub labels: Vec<String>,
    pub candles: Vec<Candle>,
    pub volumes: Vec<VolumeBar>,
}

pub fn split_ohlcv(bars: &[PriceBar]) -> OhlcvSplit {
    let mut labels = Vec::with_capacity(bars.len());
    let mut candles = Vec::with_capacity(bars.len());
    let mut volumes = Vec::with_capacity(bars.len());

    for (index, bar) in bars.iter().enumerate() {
        labels.push(bar.label());
        candles.push(Candle {
            open: bar.open,
            close: bar.close,
            low: bar.low,
            high: bar.high,
        });
        volumes.push(VolumeBar {
            index,
            volume: bar.volume,
            direction: if bar.is_down() { 1 } else { -1 },
        });
    }

    OhlcvSplit {
        labels,
        candles,
        volumes,
    }
}

/// One moving-average output; renders as `-` or a 3-decimal string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaPoint {
    Undefined,
    Value(f64),
}

impl MaPoint {
    pub fn value(self) -> Option<f64> {
        match self {
            MaPoint::Undefined => None,
            MaPoint::Value(v) => Some(v),
        }
    }
}

impl fmt::Display for MaPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaPoint::Undefined => write!(f, "-"),
            MaPoint::Value(v) => write!(f, "{:.3}", v),
        }
    }
}

impl Serialize for MaPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverage {
    pub name: String,
    #[serde(skip)]
    pub period: usize,
    pub values: Vec<MaPoint>,
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Lazily yield one moving-average point per bar.
///
/// Index `i` is undefined while `i < period`; after that it is the mean close
/// of the `period` bars ending at `i`. A zero period yields only undefined
/// points.
pub fn moving_average_iter(period: usize, bars: &[PriceBar]) -> impl Iterator<Item = MaPoint> + '_ {
    let warmup = if period == 0 {
        bars.len()
    } else {
        period.min(bars.len())
    };
    let windows = if period == 0 { None } else { Some(bars.windows(period)) };

    std::iter::repeat_n(MaPoint::Undefined, warmup).chain(
        windows
            .into_iter()
            .flatten()
            .skip(1)
            .map(move |w| {
                let sum: f64 = w.iter().map(|b| b.close).sum();
                MaPoint::Value(round3(sum / period as f64))
            }),
    )
}

pub fn moving_average(period: usize, bars: &[PriceBar]) -> MovingAverage {
    MovingAverage {
        name: format!("MA{}", period),
        period,
        values: moving_average_iter(period, bars).collect(),
    }
}

pub fn moving_averages(periods: &[usize], bars: &[PriceBar]) -> Vec<MovingAverage> {
    periods.iter().map(|&p| moving_average(p, bars)).collect()
}

/// A buy or sell marker placed on the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeMarker {
    pub label: String,
    pub value: f64,
    pub offset: i32,
    /// False when no bar in the view matched and the fill price was used.
    pub anchored: bool,
}

/// Place trade points on the bars of the current view.
///
/// Buys anchor to the matching bar's low and draw below it; sells anchor to
/// the high and draw above it. Points whose date is not in `bars` fall back
/// to the recorded fill price.
pub fn project_trade_points(points: &[TradePoint], bars: &[PriceBar], side: Side) -> Vec<TradeMarker> {
    let offset = match side {
        Side::Buy => MARKER_OFFSET,
        Side::Sell => -MARKER_OFFSET,
    };

    points
        .iter()
        .map(|point| {
            let matched = bars
                .binary_search_by_key(&point.date, |b| b.date)
                .ok()
                .map(|i| &bars[i]);
            let (value, anchored) = match (matched, side) {
                (Some(bar), Side::Buy) => (bar.low, true),
                (Some(bar), Side::Sell) => (bar.high, true),
                (None, _) => (point.price.to_float(), false),
            };
            TradeMarker {
                label: point.date.format(super::price_bar::LABEL_FORMAT).to_string(),
                value,
                offset,
                anchored,
            }
        })
        .collect()
}

/// Everything the render consumer needs for one redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSnapshot {
    pub symbol: String,
    pub display_start: usize,
    pub display_end: usize,
    #[serde(flatten)]
    pub ohlcv: OhlcvSplit,
    pub moving_averages: Vec<MovingAverage>,
    pub buy_markers: Vec<TradeMarker>,
    pub sell_markers: Vec<TradeMarker>,
    pub summary: PortfolioSummary,
}

impl ChartSnapshot {
    /// Build a snapshot for `view`, the bars at `range` of the series.
    pub fn build(
        symbol: &str,
        view: &[PriceBar],
        range: Range<usize>,
        ma_periods: &[usize],
        portfolio: &Portfolio,
    ) -> Self {
        ChartSnapshot {
            symbol: symbol.to_string(),
            display_start: range.start,
            display_end: range.end,
            ohlcv: split_ohlcv(view),
            moving_averages: moving_averages(ma_periods, view),
            buy_markers: project_trade_points(portfolio.buy_points(), view, Side::Buy),
            sell_markers: project_trade_points(portfolio.sell_points(), view, Side::Sell),
            summary: portfolio.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Cash, Price};
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: close + 0.5,
                high: close + 2.0,
                low: close - 2.0,
                close,
                volume: 1000 + i as i64,
            })
            .collect()
    }

    fn point(day: u32, price: f64) -> TradePoint {
        TradePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            price: Price::from_float(price),
        }
    }

    #[test]
    fn split_orders_candle_as_open_close_low_high() {
        let bars = make_bars(&[10.0]);
        let split = split_ohlcv(&bars);
        assert_eq!(split.labels, vec!["2024/01/01".to_string()]);
        assert_eq!(
            split.candles[0],
            Candle {
                open: 10.5,
                close: 10.0,
                low: 8.0,
                high: 12.0
            }
        );
        let json = serde_json::to_string(&split.candles[0]).unwrap();
        assert_eq!(json, "[10.5,10.0,8.0,12.0]");
    }

    #[test]
    fn split_volume_direction_sign() {
        let mut bars = make_bars(&[10.0, 10.0]);
        bars[1].open = 9.0;
        let split = split_ohlcv(&bars);
        // open above close: down day
        assert_eq!(split.volumes[0].direction, 1);
        assert_eq!(split.volumes[1].direction, -1);
        assert_eq!(split.volumes[1].index, 1);
        assert_eq!(split.volumes[1].volume, 1001);
    }

    #[test]
    fn split_empty() {
        let split = split_ohlcv(&[]);
        assert!(split.labels.is_empty());
        assert!(split.candles.is_empty());
        assert!(split.volumes.is_empty());
    }

    #[test]
    fn moving_average_step_series() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 20.0]);
        let ma = moving_average(5, &bars);
        let rendered: Vec<String> = ma.values.iter().map(|p| p.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["-", "-", "-", "-", "-", "12.000", "14.000", "16.000", "18.000", "20.000"]
        );
        assert_eq!(ma.name, "MA5");
    }

    #[test]
    fn moving_average_period_longer_than_series() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let ma = moving_average(30, &bars);
        assert_eq!(ma.values.len(), 3);
        assert!(ma.values.iter().all(|p| *p == MaPoint::Undefined));
    }

    #[test]
    fn moving_average_period_equal_to_series() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let ma = moving_average(3, &bars);
        assert_eq!(ma.values, vec![MaPoint::Undefined; 3]);
    }

    #[test]
    fn moving_average_zero_period() {
        let bars = make_bars(&[1.0, 2.0]);
        let ma = moving_average(0, &bars);
        assert_eq!(ma.values, vec![MaPoint::Undefined; 2]);
    }

    #[test]
    fn moving_average_rounds_to_three_places() {
        let bars = make_bars(&[1.0, 1.0, 2.0, 2.0]);
        let ma = moving_average(3, &bars);
        // mean of 1, 2, 2
        assert_eq!(ma.values[3], MaPoint::Value(1.667));
        assert_eq!(ma.values[3].to_string(), "1.667");
    }

    #[test]
    fn moving_average_serializes_as_strings() {
        let bars = make_bars(&[2.0, 4.0, 6.0]);
        let ma = moving_average(1, &bars);
        let json = serde_json::to_string(&ma).unwrap();
        assert_eq!(json, r#"{"name":"MA1","values":["-","4.000","6.000"]}"#);
    }

    #[test]
    fn moving_averages_one_series_per_period() {
        let bars = make_bars(&[1.0; 40]);
        let all = moving_averages(&[5, 10, 20, 30], &bars);
        let names: Vec<&str> = all.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["MA5", "MA10", "MA20", "MA30"]);
        assert!(all.iter().all(|m| m.values.len() == 40));
    }

    #[test]
    fn project_buy_anchors_to_low() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let markers = project_trade_points(&[point(2, 11.0)], &bars, Side::Buy);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].label, "2024/01/02");
        assert!((markers[0].value - 9.0).abs() < f64::EPSILON);
        assert_eq!(markers[0].offset, MARKER_OFFSET);
        assert!(markers[0].anchored);
    }

    #[test]
    fn project_sell_anchors_to_high() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let markers = project_trade_points(&[point(3, 12.0)], &bars, Side::Sell);
        assert!((markers[0].value - 14.0).abs() < f64::EPSILON);
        assert_eq!(markers[0].offset, -MARKER_OFFSET);
    }

    #[test]
    fn project_falls_back_to_fill_price() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let markers = project_trade_points(&[point(20, 42.5)], &bars, Side::Buy);
        assert!((markers[0].value - 42.5).abs() < 1e-9);
        assert!(!markers[0].anchored);
    }

    #[test]
    fn snapshot_collects_all_series() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let portfolio = Portfolio::new(Cash::from_float(1_000.0));
        let snapshot = ChartSnapshot::build("TEST", &bars[2..6], 2..6, &[2, 3], &portfolio);

        assert_eq!(snapshot.display_start, 2);
        assert_eq!(snapshot.display_end, 6);
        assert_eq!(snapshot.ohlcv.labels.len(), 4);
        assert_eq!(snapshot.moving_averages.len(), 2);
        assert!(snapshot.buy_markers.is_empty());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["symbol"], "TEST");
        assert_eq!(json["labels"][0], "2024/01/03");
        assert_eq!(json["summary"]["total_asset"], 1000.0);
    }
}
