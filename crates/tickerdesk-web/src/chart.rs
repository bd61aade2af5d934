//! Inline SVG line chart of closing prices.

use std::fmt::Write;

use tickerdesk_core::PriceHistory;

use crate::view::escape;

const WIDTH: f64 = 760.0;
const HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 40.0;
const Y_TICKS: usize = 4;

/// Heading shown above the chart: symbol and lookback label.
pub fn chart_title(history: &PriceHistory) -> String {
    format!("{} — {}", history.symbol, history.lookback.label())
}

/// Plot area in SVG user units.
struct Frame {
    t_min: i64,
    t_max: i64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn plot_width() -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn time_to_x(&self, ts: i64) -> f64 {
        let span = (self.t_max - self.t_min) as f64;
        if span <= 0.0 {
            return MARGIN_LEFT + Self::plot_width() / 2.0;
        }
        MARGIN_LEFT + (ts - self.t_min) as f64 / span * Self::plot_width()
    }

    fn price_to_y(&self, price: f64) -> f64 {
        let range = (self.y_max - self.y_min).max(1e-9);
        let norm = (price - self.y_min) / range;
        MARGIN_TOP + Self::plot_height() - norm * Self::plot_height()
    }
}

/// Render `history` as a standalone `<svg>` element.
///
/// Returns `None` for an empty series; callers show the no-data warning
/// instead.
pub fn render_svg(history: &PriceHistory) -> Option<String> {
    let first = history.first()?;
    let last = history.last()?;
    let (low, high) = history.close_range()?;

    // Flat series still get a visible band.
    let pad = if high > low { (high - low) * 0.05 } else { high.abs().max(1.0) * 0.01 };
    let frame = Frame {
        t_min: first.ts.unix_timestamp(),
        t_max: last.ts.unix_timestamp(),
        y_min: low - pad,
        y_max: high + pad,
    };

    let title = escape(&chart_title(history));
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="{title}" xmlns="http://www.w3.org/2000/svg">"#
    );
    let _ = write!(
        svg,
        r#"<text x="{x}" y="22" class="chart-title" text-anchor="middle">{title}</text>"#,
        x = WIDTH / 2.0
    );

    for step in 0..=Y_TICKS {
        let price = frame.y_min + (frame.y_max - frame.y_min) * step as f64 / Y_TICKS as f64;
        let y = frame.price_to_y(price);
        let _ = write!(
            svg,
            r#"<line x1="{MARGIN_LEFT}" x2="{x2}" y1="{y:.1}" y2="{y:.1}" class="grid"/><text x="{tx}" y="{ty:.1}" text-anchor="end" class="tick">{price:.2}</text>"#,
            x2 = WIDTH - MARGIN_RIGHT,
            tx = MARGIN_LEFT - 6.0,
            ty = y + 4.0,
        );
    }

    let baseline = HEIGHT - MARGIN_BOTTOM;
    let _ = write!(
        svg,
        r#"<text x="{MARGIN_LEFT}" y="{y}" text-anchor="start" class="tick">{start}</text><text x="{x}" y="{y}" text-anchor="end" class="tick">{end}</text>"#,
        y = baseline + 18.0,
        x = WIDTH - MARGIN_RIGHT,
        start = first.ts.format_date(),
        end = last.ts.format_date(),
    );
    let _ = write!(
        svg,
        r#"<text x="{x}" y="{y}" text-anchor="middle" class="axis-label">Date</text><text x="14" y="{ly}" text-anchor="middle" class="axis-label" transform="rotate(-90 14 {ly})">Price</text>"#,
        x = MARGIN_LEFT + Frame::plot_width() / 2.0,
        y = HEIGHT - 4.0,
        ly = MARGIN_TOP + Frame::plot_height() / 2.0,
    );

    svg.push_str(r#"<polyline class="close" fill="none" points=""#);
    for (index, point) in history.points.iter().enumerate() {
        if index > 0 {
            svg.push(' ');
        }
        let _ = write!(
            svg,
            "{:.1},{:.1}",
            frame.time_to_x(point.ts.unix_timestamp()),
            frame.price_to_y(point.close)
        );
    }
    svg.push_str(r#""/></svg>"#);

    Some(svg)
}
