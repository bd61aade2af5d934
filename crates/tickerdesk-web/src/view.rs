//! Server-rendered HTML pages.
//!
//! Pages are assembled with `write!` into a `String`. Every value that came
//! from a user or a provider goes through [`escape`].

use std::fmt::Write;

use tickerdesk_core::NewsItem;

use crate::chart;
use crate::error::SnapshotError;
use crate::session::Flash;
use crate::terminal::{HistorySection, InfoSection, NewsSection, QuoteSnapshot};

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#0e1117;color:#e6e6e6}\
main{max-width:1100px;margin:0 auto;padding:24px}\
a{color:#58a6ff}\
.layout{display:grid;grid-template-columns:260px 1fr;gap:24px}\
.panel{background:#161b22;border-radius:8px;padding:16px;margin-bottom:16px}\
.flash{padding:10px 14px;border-radius:6px;margin-bottom:16px}\
.flash.success{background:#12361f}\
.flash.error,.alert.error{background:#3d1418}\
.alert{padding:10px 14px;border-radius:6px}\
.alert.warning{background:#3d3014}\
.alert.info{background:#142a3d}\
table{border-collapse:collapse;width:100%}\
td{padding:4px 8px;border-bottom:1px solid #30363d}\
.chart{width:100%;height:auto}\
.chart .grid{stroke:#30363d}\
.chart .close{stroke:#58a6ff;stroke-width:2}\
.chart text{fill:#8b949e;font-size:11px}\
.chart .chart-title{fill:#e6e6e6;font-size:14px}\
footer{color:#8b949e;font-size:12px;margin-top:24px}";

const FOOTER: &str =
    "Demo login is session-only (no database). For production, connect to a DB or OAuth provider.";

/// Minimal HTML text and attribute escaping.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{}</title><style>{STYLE}</style></head><body><main>{body}</main></body></html>",
        escape(title)
    )
}

fn flash_banner(out: &mut String, flash: Option<&Flash>) {
    match flash {
        Some(Flash::Success(message)) => {
            let _ = write!(out, r#"<div class="flash success">{}</div>"#, escape(message));
        }
        Some(Flash::Error(message)) => {
            let _ = write!(out, r#"<div class="flash error">{}</div>"#, escape(message));
        }
        None => {}
    }
}

fn credentials_form(out: &mut String, action: &str, heading: &str, button: &str) {
    let _ = write!(
        out,
        r#"<section class="panel"><h2>{heading}</h2><form method="post" action="{action}">
<p><label>Username <input name="username" autocomplete="username"></label></p>
<p><label>Password <input name="password" type="password"></label></p>
<p><button type="submit">{button}</button></p></form></section>"#
    );
}

/// Login and registration surface shown to logged-out sessions.
pub fn welcome_page(flash: Option<&Flash>) -> String {
    let mut body = String::from("<h1>Stock Terminal</h1><p>Welcome — please login</p>");
    flash_banner(&mut body, flash);
    credentials_form(&mut body, "/login", "Login", "Login");
    credentials_form(&mut body, "/register", "Register", "Create account");
    let _ = write!(body, "<footer>{FOOTER}</footer>");
    page("Stock Terminal", &body)
}

/// What the detail pane shows for the current selection.
pub enum Detail<'a> {
    /// Empty watchlist; the pane is disabled.
    Nothing,
    Snapshot(&'a QuoteSnapshot),
    Invalid(&'a SnapshotError),
}

/// Input to [`terminal_page`].
pub struct TerminalView<'a> {
    pub username: &'a str,
    pub tickers: &'a [String],
    pub selected: Option<&'a str>,
    pub flash: Option<&'a Flash>,
    pub detail: Detail<'a>,
}

/// Full terminal page for a logged-in session.
pub fn terminal_page(view: &TerminalView<'_>) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        r#"<header><h1>Stock Terminal</h1><p>Logged in as <strong>{}</strong></p>
<form method="post" action="/logout"><button type="submit">Logout</button></form></header>"#,
        escape(view.username)
    );
    flash_banner(&mut body, view.flash);

    body.push_str(r#"<div class="layout"><aside>"#);
    watchlist_panel(&mut body, view.tickers);
    body.push_str("</aside><div>");
    selector(&mut body, view.tickers, view.selected);
    match &view.detail {
        Detail::Nothing => body.push_str(
            r#"<div class="alert info">Add a ticker to your watchlist to see its details.</div>"#,
        ),
        Detail::Invalid(error) => {
            let _ = write!(
                body,
                r#"<div class="alert error">{}</div>"#,
                escape(&error.to_string())
            );
        }
        Detail::Snapshot(snapshot) => detail_pane(&mut body, snapshot),
    }
    body.push_str("</div></div>");
    let _ = write!(body, "<footer>{FOOTER}</footer>");

    page("Stock Terminal", &body)
}

fn watchlist_panel(out: &mut String, tickers: &[String]) {
    out.push_str(r#"<section class="panel"><h2>Watchlist</h2>"#);
    out.push_str(
        r#"<form method="post" action="/terminal/watchlist"><input name="ticker" placeholder="e.g. AAPL"> <button type="submit">Add</button></form>"#,
    );
    if tickers.is_empty() {
        out.push_str("<p>Your watchlist is empty.</p>");
    } else {
        out.push_str("<ul>");
        for ticker in tickers {
            let _ = write!(
                out,
                r#"<li>{} <a href="/terminal?ticker={}">Open</a></li>"#,
                escape(ticker),
                urlencoding::encode(ticker)
            );
        }
        out.push_str("</ul>");
    }
    out.push_str(
        r#"<form method="post" action="/terminal/watchlist/clear"><button type="submit">Clear watchlist</button></form></section>"#,
    );
}

fn selector(out: &mut String, tickers: &[String], selected: Option<&str>) {
    let disabled = if tickers.is_empty() { " disabled" } else { "" };
    let _ = write!(
        out,
        r#"<form method="get" action="/terminal" class="panel"><label>Select ticker <select name="ticker"{disabled}>"#
    );
    for ticker in tickers {
        let mark = if Some(ticker.as_str()) == selected { " selected" } else { "" };
        let ticker = escape(ticker);
        let _ = write!(out, r#"<option value="{ticker}"{mark}>{ticker}</option>"#);
    }
    let _ = write!(out, r#"</select></label> <button type="submit"{disabled}>Show</button></form>"#);
}

fn detail_pane(out: &mut String, snapshot: &QuoteSnapshot) {
    let _ = write!(out, "<h2>{}</h2>", escape(snapshot.symbol.as_str()));
    info_panel(out, &snapshot.info);
    history_panel(out, snapshot);
    news_panel(out, &snapshot.news);
}

fn info_panel(out: &mut String, info: &InfoSection) {
    out.push_str(r#"<section class="panel"><h3>Company info</h3>"#);
    match info {
        InfoSection::Profile(entries) => {
            out.push_str("<table>");
            for entry in entries {
                let _ = write!(
                    out,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    entry.field.label(),
                    escape(&entry.value)
                );
            }
            out.push_str("</table>");
        }
        InfoSection::Unavailable => {
            out.push_str(r#"<div class="alert info">No company info available.</div>"#);
        }
    }
    out.push_str("</section>");
}

fn history_panel(out: &mut String, snapshot: &QuoteSnapshot) {
    let _ = write!(
        out,
        r#"<section class="panel"><h3>Price history ({})</h3>"#,
        snapshot.lookback.label()
    );
    match &snapshot.history {
        HistorySection::Series(history) => match chart::render_svg(history) {
            Some(svg) => out.push_str(&svg),
            None => no_history(out),
        },
        HistorySection::NoData => no_history(out),
        HistorySection::Failed(message) => {
            let _ = write!(
                out,
                r#"<div class="alert error">Error fetching history: {}</div>"#,
                escape(message)
            );
        }
    }
    out.push_str("</section>");
}

fn no_history(out: &mut String) {
    out.push_str(
        r#"<div class="alert warning">No price history found for this ticker (it may be delisted or the symbol is invalid). Try a different ticker.</div>"#,
    );
}

fn news_panel(out: &mut String, news: &NewsSection) {
    out.push_str(r#"<section class="panel"><h3>Latest news</h3>"#);
    match news {
        NewsSection::Headlines(items) => {
            out.push_str("<ul>");
            for item in items {
                news_item(out, item);
            }
            out.push_str("</ul>");
        }
        NewsSection::Empty => {
            out.push_str(r#"<div class="alert info">No news found for this ticker.</div>"#);
        }
        NewsSection::Failed(message) => {
            let _ = write!(
                out,
                r#"<div class="alert info">News not available: {}</div>"#,
                escape(message)
            );
        }
    }
    out.push_str("</section>");
}

fn news_item(out: &mut String, item: &NewsItem) {
    let headline = escape(item.headline());
    match item.href() {
        Some(link) => {
            let _ = write!(
                out,
                r#"<li><a href="{}" target="_blank" rel="noopener">{headline}</a></li>"#,
                escape(link)
            );
        }
        None => {
            let _ = write!(out, "<li>{headline}</li>");
        }
    }
}

#[cfg(test)]
mod tests {
    use tickerdesk_core::{InfoEntry, InfoField, Lookback, Symbol};

    use super::*;

    fn snapshot(info: InfoSection, history: HistorySection, news: NewsSection) -> QuoteSnapshot {
        QuoteSnapshot {
            symbol: Symbol::parse("AAPL").expect("symbol"),
            lookback: Lookback::SixMonths,
            info,
            history,
            news,
        }
    }

    fn render(snapshot: &QuoteSnapshot) -> String {
        let tickers = [String::from("AAPL")];
        terminal_page(&TerminalView {
            username: "alice",
            tickers: &tickers,
            selected: Some("AAPL"),
            flash: None,
            detail: Detail::Snapshot(snapshot),
        })
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn welcome_page_shows_both_forms_and_flash() {
        let html = welcome_page(Some(&Flash::Error(String::from("Invalid username or password"))));

        assert!(html.contains("Welcome — please login"));
        assert!(html.contains(r#"action="/login""#));
        assert!(html.contains(r#"action="/register""#));
        assert!(html.contains("Invalid username or password"));
    }

    #[test]
    fn failed_history_and_headlines_render_side_by_side() {
        let html = render(&snapshot(
            InfoSection::Unavailable,
            HistorySection::Failed(String::from("timeout")),
            NewsSection::Headlines(vec![
                NewsItem {
                    title: Some(String::from("Apple <beats>")),
                    link: Some(String::from("https://news.example/1")),
                    ..NewsItem::default()
                },
                NewsItem {
                    publisher: Some(String::from("Reuters")),
                    ..NewsItem::default()
                },
            ]),
        ));

        assert!(html.contains("No company info available."));
        assert!(html.contains("Error fetching history: timeout"));
        assert!(html.contains(r#"<a href="https://news.example/1""#));
        assert!(html.contains("Apple &lt;beats&gt;"));
        assert!(html.contains("<li>Reuters</li>"));
    }

    #[test]
    fn no_data_is_a_warning_not_an_error() {
        let html = render(&snapshot(
            InfoSection::Profile(vec![InfoEntry {
                field: InfoField::Sector,
                value: String::from("Technology"),
            }]),
            HistorySection::NoData,
            NewsSection::Empty,
        ));

        assert!(html.contains(r#"<div class="alert warning">No price history found"#));
        assert!(!html.contains("Error fetching history"));
        assert!(html.contains("Technology"));
        assert!(html.contains("No news found for this ticker."));
    }

    #[test]
    fn empty_watchlist_disables_detail_pane() {
        let html = terminal_page(&TerminalView {
            username: "admin",
            tickers: &[],
            selected: None,
            flash: None,
            detail: Detail::Nothing,
        });

        assert!(html.contains("Your watchlist is empty."));
        assert!(html.contains(r#"<select name="ticker" disabled>"#));
        assert!(!html.contains("Company info"));
    }
}
