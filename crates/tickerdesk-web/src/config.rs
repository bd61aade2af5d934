//! Command-line and environment configuration for the `tickerdesk` server.
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--bind` | `TICKERDESK_BIND` | `127.0.0.1:8501` |
//! | `--offline` | `TICKERDESK_OFFLINE` | `false` |
//! | `--no-demo-accounts` | | `false` |
//! | `--default-watchlist` | `TICKERDESK_WATCHLIST` | `AAPL,TSLA,INFY.NS` |
//! | `--news-limit` | | `6` |
//! | `--timeout-ms` | | `10000` |
//! | `--max-retries` | | `2` |
//! | `--max-sessions` | `TICKERDESK_MAX_SESSIONS` | `10000` |
//! | `--session-idle-secs` | `TICKERDESK_SESSION_IDLE_SECS` | `1800` |
//! | `--yahoo-cookie` | `YAHOO_COOKIE` | |
//! | `--log-filter` | `RUST_LOG` | `tickerdesk=info,tower_http=info` |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::builder::TypedValueParser;
use clap::Parser;
use tickerdesk_core::{
    HttpClient, MarketData, ReqwestHttpClient, RetryConfig, SampleMarketData, YahooAdapter,
    YahooAuth, DEFAULT_TIMEOUT_MS,
};

use crate::accounts::InMemoryAccountStore;
use crate::error::ServerError;
use crate::session::{SessionLimits, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_SECS};
use crate::terminal::{PipelineConfig, DEFAULT_NEWS_LIMIT};

pub const DEFAULT_LOG_FILTER: &str = "tickerdesk=info,tower_http=info";

/// Stock terminal: watchlist, company profile, price chart and headlines.
#[derive(Debug, Clone, Parser)]
#[command(name = "tickerdesk", version, about = "Browser stock terminal")]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    #[arg(long, env = "TICKERDESK_BIND", default_value = "127.0.0.1:8501")]
    pub bind: SocketAddr,

    /// Serve deterministic sample data instead of calling Yahoo Finance.
    #[arg(long, env = "TICKERDESK_OFFLINE", default_value_t = false)]
    pub offline: bool,

    /// Start with an empty account store.
    #[arg(long, default_value_t = false)]
    pub no_demo_accounts: bool,

    /// Tickers every new session starts with (comma-separated, may be empty).
    #[arg(
        long,
        env = "TICKERDESK_WATCHLIST",
        value_delimiter = ',',
        default_value = "AAPL,TSLA,INFY.NS"
    )]
    pub default_watchlist: Vec<String>,

    /// Maximum number of headlines per ticker.
    #[arg(long, default_value_t = DEFAULT_NEWS_LIMIT, value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub news_limit: usize,

    /// Per-request provider timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Retries for transient provider failures.
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// Upper bound on live browser sessions; the least recently seen is evicted.
    #[arg(long, env = "TICKERDESK_MAX_SESSIONS", default_value_t = DEFAULT_MAX_SESSIONS, value_parser = clap::value_parser!(u32).range(1..).map(|max| max as usize))]
    pub max_sessions: usize,

    /// Seconds a browser session may sit idle before it is dropped.
    #[arg(long, env = "TICKERDESK_SESSION_IDLE_SECS", default_value_t = DEFAULT_SESSION_IDLE_SECS)]
    pub session_idle_secs: u64,

    /// Fixed cookie header for Yahoo, skipping the cookie handshake.
    #[arg(long, env = "YAHOO_COOKIE", hide_env_values = true)]
    pub yahoo_cookie: Option<String>,

    /// `tracing` filter directives.
    #[arg(long, env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

impl ServerConfig {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            news_limit: self.news_limit,
            ..PipelineConfig::default()
        }
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.max_sessions,
            idle_timeout: Duration::from_secs(self.session_idle_secs),
        }
    }

    /// Watchlist entries with blanks dropped.
    pub fn seed_watchlist(&self) -> Vec<String> {
        self.default_watchlist
            .iter()
            .map(|ticker| ticker.trim())
            .filter(|ticker| !ticker.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn account_store(&self) -> InMemoryAccountStore {
        if self.no_demo_accounts {
            InMemoryAccountStore::new()
        } else {
            InMemoryAccountStore::with_demo_accounts()
        }
    }

    /// The provider behind the terminal.
    ///
    /// # Errors
    ///
    /// [`ServerError::HttpClient`] when the HTTP client cannot be built.
    pub fn market_data(&self) -> Result<Arc<dyn MarketData>, ServerError> {
        if self.offline {
            return Ok(Arc::new(SampleMarketData));
        }

        let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
        let auth = match self.yahoo_cookie.as_deref().map(str::trim) {
            Some(cookie) if !cookie.is_empty() => YahooAuth::with_cookie(cookie),
            _ => YahooAuth::default(),
        };
        let adapter = YahooAdapter::new(http_client)
            .with_auth(auth)
            .with_retry(RetryConfig::with_max_retries(self.max_retries))
            .with_timeout_ms(self.timeout_ms);
        Ok(Arc::new(adapter))
    }
}
