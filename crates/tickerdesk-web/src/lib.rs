//! # tickerdesk-web
//!
//! Browser stock terminal built on [`tickerdesk_core`].
//!
//! A visitor logs in, keeps a watchlist of tickers and opens one of them to
//! see its company profile, a six-month closing-price chart and the latest
//! headlines. All state lives in memory for the lifetime of the process.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`accounts`] | Username/password store |
//! | [`session`] | Per-browser login state, watchlist and flash messages |
//! | [`watchlist`] | Ordered ticker list with a current selection |
//! | [`terminal`] | Fault-isolated info/history/news pipeline |
//! | [`view`], [`chart`] | HTML pages and the SVG price chart |
//! | [`routes`] | axum router |
//! | [`config`] | `clap` server configuration |
//!
//! ## Request flow
//!
//! ```text
//! browser ──cookie──► SessionRegistry ──► SessionContext (login gate)
//!                                              │
//!                                              ▼
//!                                   TerminalController::snapshot
//!                                     ├── info    ─► InfoSection
//!                                     ├── history ─► HistorySection
//!                                     └── news    ─► NewsSection
//! ```

pub mod accounts;
pub mod chart;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod terminal;
pub mod view;
pub mod watchlist;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

pub use accounts::{AccountStore, InMemoryAccountStore, DEMO_ACCOUNTS};
pub use config::ServerConfig;
pub use error::{AccessDenied, AccountError, ServerError, SnapshotError};
pub use routes::{router, AppState, SESSION_COOKIE};
pub use session::{Flash, Session, SessionContext, SessionLimits, SessionRegistry};
pub use terminal::{
    HistorySection, InfoSection, NewsSection, PipelineConfig, QuoteSnapshot, TerminalController,
};
pub use watchlist::{Watchlist, WatchlistChange};

/// Wire the configured provider, account store and session registry.
///
/// # Errors
///
/// [`ServerError::HttpClient`] when the provider's HTTP client cannot be
/// built.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let source = config.market_data()?;
    info!(provider = %source.id(), "market data source ready");

    let accounts: Arc<dyn AccountStore> = Arc::new(config.account_store());
    let sessions = SessionRegistry::with_limits(config.seed_watchlist(), config.session_limits());
    let terminal = TerminalController::new(source, config.pipeline_config());
    Ok(AppState::new(accounts, sessions, terminal))
}

/// Bind `config.bind` and serve until ctrl-c.
///
/// # Errors
///
/// Startup and IO failures as [`ServerError`].
pub async fn serve(config: &ServerConfig) -> Result<(), ServerError> {
    let app = router(build_state(config)?);

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;
    info!(addr = %config.bind, "tickerdesk listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("tickerdesk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
