//! # Domain Models
//!
//! Canonical domain types for tickerdesk market data.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker symbol |
//! | [`Lookback`] | Trailing history window (1mo .. 5y) |
//! | [`Interval`] | Spacing of history points |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`CompanyInfo`] | Free-form provider profile with a fixed projection |
//! | [`PriceHistory`] | Closing-price series |
//! | [`NewsItem`] | Headline with optional title, publisher and link |
//!
//! Types that carry numeric values validate them at construction:
//!
//! ```rust
//! use tickerdesk_core::{PricePoint, UtcDateTime, ValidationError};
//!
//! let ts = UtcDateTime::parse("2024-01-01T00:00:00Z").unwrap();
//! assert!(PricePoint::new(ts, 187.5).is_ok());
//! assert!(matches!(
//!     PricePoint::new(ts, f64::NAN),
//!     Err(ValidationError::NonFiniteValue { .. })
//! ));
//! ```

mod interval;
mod lookback;
mod models;
mod symbol;
mod timestamp;

pub use interval::Interval;
pub use lookback::Lookback;
pub use models::{
    CompanyInfo, InfoEntry, InfoField, NewsItem, PriceHistory, PricePoint, UNTITLED_NEWS,
};
pub use symbol::{normalize_ticker, Symbol};
pub use timestamp::UtcDateTime;
