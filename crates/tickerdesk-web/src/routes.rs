//! HTTP surface.
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | GET | `/` | welcome page, or redirect to `/terminal` when logged in |
//! | POST | `/login` | log in with `username` / `password` |
//! | POST | `/register` | create an account |
//! | POST | `/logout` | end the session |
//! | GET | `/terminal` | terminal page; `?ticker=X` selects X |
//! | POST | `/terminal/watchlist` | add `ticker` |
//! | POST | `/terminal/watchlist/clear` | empty the watchlist |
//! | GET | `/health` | liveness probe |
//!
//! Every `/terminal*` route redirects to `/` while logged out.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;

use crate::accounts::AccountStore;
use crate::session::{Flash, SessionRegistry, SharedContext};
use crate::terminal::TerminalController;
use crate::view::{self, Detail, TerminalView};
use crate::watchlist::WatchlistChange;

pub const SESSION_COOKIE: &str = "tickerdesk_session";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub sessions: Arc<SessionRegistry>,
    pub terminal: Arc<TerminalController>,
}

impl AppState {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        sessions: SessionRegistry,
        terminal: TerminalController,
    ) -> Self {
        Self {
            accounts,
            sessions: Arc::new(sessions),
            terminal: Arc::new(terminal),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/terminal", get(terminal))
        .route("/terminal/watchlist", post(add_ticker))
        .route("/terminal/watchlist/clear", post(clear_watchlist))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct TickerQuery {
    ticker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickerForm {
    #[serde(default)]
    ticker: String,
}

/// Connection context resolved from the request cookie.
struct Connection {
    id: Uuid,
    context: SharedContext,
    fresh: bool,
}

impl Connection {
    async fn resolve(state: &AppState, headers: &HeaderMap) -> Self {
        let (id, context, fresh) = state.sessions.resolve(session_id(headers)).await;
        Self { id, context, fresh }
    }

    /// Attach the session cookie when this connection was just created.
    fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.fresh {
            let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let connection = Connection::resolve(&state, &headers).await;
    let mut context = connection.context.lock().await;
    if context.session().is_logged_in() {
        return connection.respond(Redirect::to("/terminal"));
    }
    let flash = context.take_flash();
    drop(context);
    connection.respond(Html(view::welcome_page(flash.as_ref())))
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<Credentials>,
) -> Response {
    let connection = Connection::resolve(&state, &headers).await;
    let mut context = connection.context.lock().await;
    let target = match context.login(state.accounts.as_ref(), &form.username, &form.password) {
        Ok(()) => {
            context.set_flash(Flash::Success(String::from("Login successful")));
            "/terminal"
        }
        Err(error) => {
            context.set_flash(Flash::Error(error.to_string()));
            "/"
        }
    };
    drop(context);
    connection.respond(Redirect::to(target))
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<Credentials>,
) -> Response {
    let connection = Connection::resolve(&state, &headers).await;
    let mut context = connection.context.lock().await;
    let flash = match context.register(state.accounts.as_ref(), &form.username, &form.password) {
        Ok(()) => Flash::Success(String::from("Registered — now choose Login and sign in")),
        Err(error) => Flash::Error(error.to_string()),
    };
    context.set_flash(flash);
    drop(context);
    connection.respond(Redirect::to("/"))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let connection = Connection::resolve(&state, &headers).await;
    connection.context.lock().await.logout();
    connection.respond(Redirect::to("/"))
}

async fn terminal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TickerQuery>,
) -> Response {
    let connection = Connection::resolve(&state, &headers).await;

    // Copy what the page needs, then release the context before any provider
    // call.
    let (username, tickers, selected, flash) = {
        let mut context = connection.context.lock().await;
        let username = match context.session().username() {
            Some(username) => username.to_owned(),
            None => return connection.respond(Redirect::to("/")),
        };
        let flash = context.take_flash();
        let Ok(watchlist) = context.watchlist_mut() else {
            return connection.respond(Redirect::to("/"));
        };
        if let Some(ticker) = query.ticker.as_deref() {
            if !watchlist.select(ticker) {
                debug!(ticker, "ignoring selection outside the watchlist");
            }
        }
        (
            username,
            watchlist.tickers().to_vec(),
            watchlist.selected().map(str::to_owned),
            flash,
        )
    };

    let outcome = match selected.as_deref() {
        Some(ticker) => Some(state.terminal.snapshot(ticker).await),
        None => None,
    };
    let detail = match &outcome {
        None => Detail::Nothing,
        Some(Ok(snapshot)) => Detail::Snapshot(snapshot),
        Some(Err(error)) => Detail::Invalid(error),
    };

    let page = view::terminal_page(&TerminalView {
        username: &username,
        tickers: &tickers,
        selected: selected.as_deref(),
        flash: flash.as_ref(),
        detail,
    });
    connection.respond(Html(page))
}

async fn add_ticker(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TickerForm>,
) -> Response {
    let connection = Connection::resolve(&state, &headers).await;
    let mut context = connection.context.lock().await;
    let target = match context.watchlist_mut() {
        Ok(watchlist) => {
            match watchlist.add(&form.ticker) {
                WatchlistChange::Added(ticker) => debug!(%ticker, "added to watchlist"),
                WatchlistChange::AlreadyPresent(ticker) => debug!(%ticker, "already on watchlist"),
                WatchlistChange::Ignored => {}
            }
            "/terminal"
        }
        Err(_) => "/",
    };
    drop(context);
    connection.respond(Redirect::to(target))
}

async fn clear_watchlist(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let connection = Connection::resolve(&state, &headers).await;
    let mut context = connection.context.lock().await;
    let target = match context.watchlist_mut() {
        Ok(watchlist) => {
            watchlist.clear();
            "/terminal"
        }
        Err(_) => "/",
    };
    drop(context);
    connection.respond(Redirect::to(target))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_found_among_others() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; other=1"))
                .expect("header"),
        );

        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn malformed_session_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("tickerdesk_session=not-a-uuid"),
        );

        assert_eq!(session_id(&headers), None);
    }
}
