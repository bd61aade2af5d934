//! # tickerdesk core
//!
//! Domain types and market-data contracts behind the tickerdesk dashboard.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance and offline sample sources |
//! | [`domain`] | Symbols, lookback windows, company info, price history, news |
//! | [`error`] | Validation errors |
//! | [`http_client`] | HTTP transport abstraction (reqwest in production) |
//! | [`market_data`] | The [`MarketData`] provider trait and its error type |
//! | [`retry`] | Retry/backoff policy for transient provider failures |
//! | [`source`] | Provider identifiers |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ Terminal controller  │  (tickerdesk-web)
//! └──────────┬───────────┘
//!            │ info / history / news, each independently
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │ MarketData           │────▶│ HttpClient       │
//! │ (Yahoo | Sample)     │     │ (reqwest + jar)  │
//! └──────────┬───────────┘     └──────────────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ Domain models        │
//! └──────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Provider calls return [`SourceError`]; callers branch on its kind:
//!
//! ```rust
//! use tickerdesk_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::NoData => "symbol may be delisted or invalid",
//!         SourceErrorKind::RateLimited => "try again shortly",
//!         _ => "provider call failed",
//!     }
//! }
//!
//! assert_eq!(describe(&SourceError::no_data("gone")), "symbol may be delisted or invalid");
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod market_data;
pub mod retry;
pub mod source;

pub use adapters::{SampleMarketData, YahooAdapter, YahooAuth};

pub use domain::{
    normalize_ticker, CompanyInfo, InfoEntry, InfoField, Interval, Lookback, NewsItem,
    PriceHistory, PricePoint, Symbol, UtcDateTime, UNTITLED_NEWS,
};

pub use error::ValidationError;

pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, DEFAULT_TIMEOUT_MS,
};

pub use market_data::{
    Endpoint, HistoryRequest, MarketData, NewsRequest, SourceError, SourceErrorKind, SourceFuture,
};

pub use retry::{Backoff, RetryConfig};

pub use source::ProviderId;
