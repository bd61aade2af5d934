//! Market-data provider contract and request types.
//!
//! | Endpoint | Request | Response | Description |
//! |----------|---------|----------|-------------|
//! | Info | [`Symbol`] | [`CompanyInfo`] | Free-form company profile |
//! | History | [`HistoryRequest`] | [`PriceHistory`] | Closing prices over a lookback window |
//! | News | [`NewsRequest`] | `Vec<NewsItem>` | Recent headlines in provider order |
//!
//! Each endpoint fails independently; callers are expected to treat every
//! call as best effort and every returned field as optional.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{
    CompanyInfo, Interval, Lookback, NewsItem, PriceHistory, ProviderId, Symbol, ValidationError,
};

/// Boxed future returned by [`MarketData`] methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Data endpoint, used in log fields and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Info,
    History,
    News,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::History => "history",
            Self::News => "news",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The provider answered but had nothing usable for the symbol.
    NoData,
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NoData,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn is_no_data(&self) -> bool {
        matches!(self.kind, SourceErrorKind::NoData)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::internal(error.to_string())
    }
}

/// Request payload for the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub lookback: Lookback,
    pub interval: Interval,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, lookback: Lookback, interval: Interval) -> Self {
        Self {
            symbol,
            lookback,
            interval,
        }
    }
}

/// Request payload for the news endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRequest {
    pub symbol: Symbol,
    pub limit: usize,
}

impl NewsRequest {
    pub fn new(symbol: Symbol, limit: usize) -> Result<Self, SourceError> {
        if limit == 0 {
            return Err(SourceError::invalid_request(
                ValidationError::ZeroNewsLimit.to_string(),
            ));
        }
        Ok(Self { symbol, limit })
    }
}

/// Remote market-data source.
///
/// The terminal calls the three endpoints independently for one symbol on
/// every refresh; implementations must not assume any ordering between them.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared across request
/// handlers.
pub trait MarketData: Send + Sync {
    /// Returns the provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches the free-form company profile.
    ///
    /// An empty [`CompanyInfo`] is a valid answer.
    fn info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, CompanyInfo>;

    /// Fetches closing prices for the requested window.
    ///
    /// # Errors
    ///
    /// Returns [`SourceErrorKind::NoData`] when the provider knows nothing
    /// about the symbol (delisted or invalid), other kinds on transport or
    /// decoding failures. An empty series is returned as `Ok`.
    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceHistory>;

    /// Fetches up to `req.limit` headlines in provider order.
    fn news<'a>(&'a self, req: NewsRequest) -> SourceFuture<'a, Vec<NewsItem>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_news_limit_is_rejected() {
        let symbol = Symbol::parse("AAPL").expect("valid");
        let error = NewsRequest::new(symbol, 0).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
    }

    #[test]
    fn error_display_carries_code() {
        let error = SourceError::no_data("No data found, symbol may be delisted");
        assert!(error.is_no_data());
        assert!(!error.retryable());
        assert_eq!(
            error.to_string(),
            "No data found, symbol may be delisted (source.no_data)"
        );
    }
}
