//! End-to-end journeys through the axum router.

use std::sync::Arc;

use axum::http::StatusCode;
use tickerdesk_core::SampleMarketData;
use tickerdesk_tests::{
    app, app_with_watchlist, headline, router, state, Browser, ScriptedSource, SessionLimits,
    SessionRegistry, SourceError,
};

fn seeded() -> Vec<String> {
    ["AAPL", "TSLA", "INFY.NS"].map(String::from).to_vec()
}

#[tokio::test]
async fn when_health_is_probed_it_answers_ok_json() {
    let mut browser = Browser::new(app(Arc::new(SampleMarketData)));

    let response = browser.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&response.body).expect("json body");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn when_anonymous_visitor_opens_the_site_a_session_cookie_and_welcome_page_are_served() {
    let mut browser = Browser::new(app(Arc::new(SampleMarketData)));

    let response = browser.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.set_cookie.expect("session cookie issued");
    assert!(cookie.starts_with("tickerdesk_session="));
    assert!(response.body.contains("Welcome — please login"));

    // Same browser, same session: no new cookie
    let again = browser.get("/").await;
    assert_eq!(again.set_cookie, None);
}

#[tokio::test]
async fn when_logged_out_every_terminal_route_redirects_home() {
    let mut browser = Browser::new(app_with_watchlist(Arc::new(SampleMarketData), seeded()));

    for response in [
        browser.get("/terminal").await,
        browser.get("/terminal?ticker=AAPL").await,
        browser.post_form("/terminal/watchlist", &[("ticker", "MSFT")]).await,
        browser.post_form("/terminal/watchlist/clear", &[]).await,
    ] {
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location.as_deref(), Some("/"));
    }
}

#[tokio::test]
async fn when_login_uses_a_wrong_password_the_error_is_shown_and_terminal_stays_locked() {
    // Given: A fresh browser
    let mut browser = Browser::new(app_with_watchlist(Arc::new(SampleMarketData), seeded()));

    // When: admin logs in with the wrong password
    let response = browser
        .post_form("/login", &[("username", "admin"), ("password", "wrongpass")])
        .await;

    // Then: The browser is sent back home with the error shown once
    assert_eq!(response.location.as_deref(), Some("/"));
    let home = browser.get("/").await;
    assert!(home.body.contains("Invalid username or password"));
    let home_again = browser.get("/").await;
    assert!(!home_again.body.contains("Invalid username or password"));

    // And: The terminal is still inaccessible
    let terminal = browser.get("/terminal").await;
    assert_eq!(terminal.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn when_alice_registers_logs_in_and_opens_aapl_history_failure_leaves_news_intact() {
    // Given: A provider whose history fails but which has two headlines
    let source = ScriptedSource::new()
        .with_history(Err(SourceError::unavailable("connection reset by peer")))
        .with_news(Ok(vec![
            headline("Apple earnings beat", Some("https://news.example/apple-1")),
            headline("iPhone demand steady", Some("https://news.example/apple-2")),
        ]));
    let mut browser = Browser::new(app(Arc::new(source)));

    // When: alice registers
    let registered = browser
        .post_form("/register", &[("username", "alice"), ("password", "secret")])
        .await;
    assert_eq!(registered.location.as_deref(), Some("/"));
    assert!(browser.get("/").await.body.contains("Registered"));

    // And: logs in
    let login = browser
        .post_form("/login", &[("username", "alice"), ("password", "secret")])
        .await;
    assert_eq!(login.location.as_deref(), Some("/terminal"));

    // And: adds "aapl" to an empty watchlist
    let empty = browser.get("/terminal").await;
    assert!(empty.body.contains("Your watchlist is empty."));
    browser
        .post_form("/terminal/watchlist", &[("ticker", "aapl")])
        .await;

    // And: opens AAPL
    let page = browser.get("/terminal?ticker=AAPL").await;

    // Then: The watchlist is exactly ["AAPL"]
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body.matches(r#"href="/terminal?ticker="#).count(), 1);
    assert!(page.body.contains(r#"<option value="AAPL" selected>AAPL</option>"#));

    // And: The chart area shows the error while both headlines render
    assert!(page.body.contains("Error fetching history: connection reset by peer"));
    assert!(page.body.contains("Apple earnings beat"));
    assert!(page.body.contains("iPhone demand steady"));
    assert!(page.body.contains("Logged in as <strong>alice</strong>"));
}

#[tokio::test]
async fn when_watchlist_is_cleared_the_detail_pane_is_disabled() {
    let mut browser = Browser::new(app_with_watchlist(Arc::new(SampleMarketData), seeded()));
    browser
        .post_form("/login", &[("username", "admin"), ("password", "1234")])
        .await;

    let before = browser.get("/terminal").await;
    assert!(before.body.contains("INFY.NS"));
    assert!(before.body.contains("AAPL Holdings"));

    browser.post_form("/terminal/watchlist/clear", &[]).await;
    let after = browser.get("/terminal?ticker=AAPL").await;

    assert!(after.body.contains("Your watchlist is empty."));
    assert!(after.body.contains(r#"<select name="ticker" disabled>"#));
    assert!(!after.body.contains("Company info"));
}

#[tokio::test]
async fn when_user_logs_out_the_terminal_locks_and_the_watchlist_survives_next_login() {
    let mut browser = Browser::new(app_with_watchlist(Arc::new(SampleMarketData), seeded()));
    browser
        .post_form("/login", &[("username", "admin"), ("password", "1234")])
        .await;
    browser
        .post_form("/terminal/watchlist", &[("ticker", "nvda")])
        .await;

    let logout = browser.post_form("/logout", &[]).await;
    assert_eq!(logout.location.as_deref(), Some("/"));
    assert_eq!(browser.get("/terminal").await.location.as_deref(), Some("/"));

    browser
        .post_form("/login", &[("username", "admin"), ("password", "1234")])
        .await;
    let page = browser.get("/terminal").await;
    assert!(page.body.contains(r#"href="/terminal?ticker=NVDA""#));
}

#[tokio::test]
async fn when_sessions_are_separate_browsers_their_logins_do_not_leak() {
    let app = app_with_watchlist(Arc::new(SampleMarketData), seeded());
    let mut first = Browser::new(app.clone());
    let mut second = Browser::new(app);

    first
        .post_form("/login", &[("username", "admin"), ("password", "1234")])
        .await;

    assert_eq!(first.get("/terminal").await.status, StatusCode::OK);
    assert_eq!(
        second.get("/terminal").await.location.as_deref(),
        Some("/")
    );
}

#[tokio::test]
async fn when_cookieless_clients_hammer_the_site_live_sessions_stay_bounded() {
    // Given: A server that keeps at most 8 sessions
    let sessions = SessionRegistry::with_limits(
        Vec::new(),
        SessionLimits {
            max_sessions: 8,
            ..SessionLimits::default()
        },
    );
    let state = state(Arc::new(SampleMarketData), sessions);
    let app = router(state.clone());

    // When: 500 clients that never send the cookie back open the welcome page
    for _ in 0..500 {
        let response = Browser::new(app.clone()).get("/").await;
        assert_eq!(response.status, StatusCode::OK);
    }

    // Then: The registry never grows past its bound
    assert_eq!(state.sessions.len().await, 8);

    // And: A logged-in browser keeps working
    let mut browser = Browser::new(app);
    browser
        .post_form("/login", &[("username", "admin"), ("password", "1234")])
        .await;
    assert_eq!(browser.get("/terminal").await.status, StatusCode::OK);
}
