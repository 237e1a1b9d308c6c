//! Candlestick chart rendering to a standalone SVG file.
//!
//! Layout: price pane (candles, moving averages, trade markers) on top and a
//! volume pane underneath, sharing the x axis. The file is rewritten on every
//! render so it always shows the latest snapshot.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use crate::domain::analytics::{ChartSnapshot, TradeMarker};
use crate::domain::error::TraderError;
use crate::ports::render_port::RenderPort;

const CHART_WIDTH: f64 = 960.0;
const CHART_HEIGHT: f64 = 540.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 30.0;
const VOLUME_PANE: f64 = 100.0;
const PANE_GAP: f64 = 15.0;

const UP_COLOR: &str = "#00da3c";
const DOWN_COLOR: &str = "#ec0000";
const MA_COLORS: &[&str] = &["#2563eb", "#f59e0b", "#8b5cf6", "#0d9488", "#db2777"];

pub struct SvgRenderAdapter {
    path: PathBuf,
}

impl SvgRenderAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RenderPort for SvgRenderAdapter {
    fn render(&mut self, snapshot: &ChartSnapshot) -> Result<(), TraderError> {
        fs::write(&self.path, render_svg(snapshot))?;
        Ok(())
    }
}

struct Scale {
    count: usize,
    min: f64,
    max: f64,
    max_volume: f64,
}

impl Scale {
    fn plot_width() -> f64 {
        CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn price_height() -> f64 {
        CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM - VOLUME_PANE - PANE_GAP
    }

    fn slot(&self) -> f64 {
        Self::plot_width() / self.count.max(1) as f64
    }

    fn x(&self, i: usize) -> f64 {
        MARGIN_LEFT + (i as f64 + 0.5) * self.slot()
    }

    fn y(&self, price: f64) -> f64 {
        let range = (self.max - self.min).max(f64::EPSILON);
        MARGIN_TOP + Self::price_height() - ((price - self.min) / range) * Self::price_height()
    }

    fn volume_top(&self, volume: i64) -> f64 {
        let base = CHART_HEIGHT - MARGIN_BOTTOM;
        base - (volume.max(0) as f64 / self.max_volume.max(1.0)) * VOLUME_PANE
    }
}

fn price_scale(snapshot: &ChartSnapshot) -> Scale {
    let candles = &snapshot.ohlcv.candles;
    let mut min = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let mut max = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    for marker in snapshot.buy_markers.iter().chain(&snapshot.sell_markers) {
        min = min.min(marker.value);
        max = max.max(marker.value);
    }
    let max_volume = snapshot
        .ohlcv
        .volumes
        .iter()
        .map(|v| v.volume)
        .max()
        .unwrap_or(0) as f64;

    Scale {
        count: candles.len(),
        min,
        max,
        max_volume,
    }
}

/// Escape the characters XML reserves in text content and attributes.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the snapshot as an SVG document.
pub fn render_svg(snapshot: &ChartSnapshot) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"##,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    let summary = &snapshot.summary;
    let _ = writeln!(
        svg,
        "  <text x=\"{}\" y=\"18\" font-size=\"13\" fill=\"#333\">{} | capital {} | units {} | total {} ({:+.2}%)</text>",
        MARGIN_LEFT, escape_text(&snapshot.symbol), summary.capital, summary.units, summary.total_asset, summary.return_pct
    );

    if snapshot.ohlcv.candles.is_empty() {
        svg.push_str("</svg>");
        return svg;
    }

    let scale = price_scale(snapshot);
    write_axes(&mut svg, &scale, snapshot);
    write_candles(&mut svg, &scale, snapshot);
    write_moving_averages(&mut svg, &scale, snapshot);
    write_markers(&mut svg, &scale, snapshot, &snapshot.buy_markers, "#16a34a");
    write_markers(&mut svg, &scale, snapshot, &snapshot.sell_markers, "#dc2626");

    svg.push_str("</svg>");
    svg
}

fn write_axes(svg: &mut String, scale: &Scale, snapshot: &ChartSnapshot) {
    let price_bottom = MARGIN_TOP + Scale::price_height();
    let _ = writeln!(
        svg,
        "  <line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"#ccc\" stroke-width=\"1\"/>",
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = CHART_HEIGHT - MARGIN_BOTTOM
    );
    let _ = writeln!(
        svg,
        "  <line x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"#ccc\" stroke-width=\"1\"/>",
        MARGIN_LEFT,
        CHART_WIDTH - MARGIN_RIGHT,
        y = price_bottom
    );
    for price in [scale.max, (scale.max + scale.min) / 2.0, scale.min] {
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>",
            MARGIN_LEFT - 5.0,
            scale.y(price) + 3.0,
            price
        );
    }

    let labels = &snapshot.ohlcv.labels;
    let ticks = [0, labels.len() / 2, labels.len() - 1];
    for i in ticks {
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>",
            scale.x(i),
            CHART_HEIGHT - 8.0,
            labels[i]
        );
    }
}

fn write_candles(svg: &mut String, scale: &Scale, snapshot: &ChartSnapshot) {
    let body_width = (scale.slot() * 0.7).max(1.0);
    for (i, candle) in snapshot.ohlcv.candles.iter().enumerate() {
        let color = if candle.close >= candle.open {
            UP_COLOR
        } else {
            DOWN_COLOR
        };
        let x = scale.x(i);
        let top = scale.y(candle.open.max(candle.close));
        let bottom = scale.y(candle.open.min(candle.close));
        let _ = writeln!(
            svg,
            "  <line x1=\"{x:.1}\" y1=\"{:.1}\" x2=\"{x:.1}\" y2=\"{:.1}\" stroke=\"{color}\" stroke-width=\"1\"/>",
            scale.y(candle.high),
            scale.y(candle.low),
        );
        let _ = writeln!(
            svg,
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{color}\"/>",
            x - body_width / 2.0,
            top,
            body_width,
            (bottom - top).max(1.0),
        );
    }

    for volume in &snapshot.ohlcv.volumes {
        let color = if volume.direction > 0 {
            DOWN_COLOR
        } else {
            UP_COLOR
        };
        let top = scale.volume_top(volume.volume);
        let _ = writeln!(
            svg,
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{color}\" fill-opacity=\"0.6\"/>",
            scale.x(volume.index) - body_width / 2.0,
            top,
            body_width,
            CHART_HEIGHT - MARGIN_BOTTOM - top,
        );
    }
}

fn write_moving_averages(svg: &mut String, scale: &Scale, snapshot: &ChartSnapshot) {
    for (n, ma) in snapshot.moving_averages.iter().enumerate() {
        let points: Vec<String> = ma
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.value().map(|v| format!("{:.1},{:.1}", scale.x(i), scale.y(v))))
            .collect();
        if points.len() < 2 {
            continue;
        }
        let color = MA_COLORS[n % MA_COLORS.len()];
        let _ = writeln!(
            svg,
            "  <polyline points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\"/>",
            points.join(" ")
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{}\" font-size=\"11\" fill=\"{color}\">{}</text>",
            CHART_WIDTH - MARGIN_RIGHT - 60.0 * (snapshot.moving_averages.len() - n) as f64,
            MARGIN_TOP - 2.0,
            ma.name
        );
    }
}

/// Markers whose date is outside the view have no x position and are skipped.
fn write_markers(
    svg: &mut String,
    scale: &Scale,
    snapshot: &ChartSnapshot,
    markers: &[TradeMarker],
    color: &str,
) {
    for marker in markers {
        let Some(i) = snapshot.ohlcv.labels.iter().position(|l| *l == marker.label) else {
            continue;
        };
        let x = scale.x(i);
        let y = scale.y(marker.value) + f64::from(marker.offset);
        // triangle points away from the candle
        let tip = if marker.offset > 0 { y - 5.0 } else { y + 5.0 };
        let base = if marker.offset > 0 { y + 5.0 } else { y - 5.0 };
        let _ = writeln!(
            svg,
            "  <polygon points=\"{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" fill=\"{color}\"/>",
            x,
            tip,
            x - 5.0,
            base,
            x + 5.0,
            base
        );
    }
}
