//! Fetch pipeline behind the terminal page.
//!
//! A snapshot is built from three independent provider calls. Each call is
//! folded into its own tagged section, so a failing history fetch never hides
//! the company profile or the headlines.

use std::sync::Arc;

use tickerdesk_core::{
    HistoryRequest, InfoEntry, Interval, Lookback, MarketData, NewsItem, NewsRequest,
    PriceHistory, Symbol,
};
use tracing::{debug, warn};

use crate::error::SnapshotError;

pub const DEFAULT_NEWS_LIMIT: usize = 6;

/// Knobs of the snapshot pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub lookback: Lookback,
    pub interval: Interval,
    pub news_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookback: Lookback::SixMonths,
            interval: Interval::OneDay,
            news_limit: DEFAULT_NEWS_LIMIT,
        }
    }
}

/// Company profile region. A failed fetch and an empty profile both end up
/// as `Unavailable`.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoSection {
    Profile(Vec<InfoEntry>),
    Unavailable,
}

/// Chart region.
#[derive(Debug, Clone, PartialEq)]
pub enum HistorySection {
    Series(PriceHistory),
    /// The provider had nothing for this symbol. Rendered as a warning.
    NoData,
    /// The fetch itself failed. Rendered as an error.
    Failed(String),
}

/// Headline region.
#[derive(Debug, Clone, PartialEq)]
pub enum NewsSection {
    Headlines(Vec<NewsItem>),
    Empty,
    Failed(String),
}

/// Everything shown for one ticker on one render.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub symbol: Symbol,
    pub lookback: Lookback,
    pub info: InfoSection,
    pub history: HistorySection,
    pub news: NewsSection,
}

pub struct TerminalController {
    source: Arc<dyn MarketData>,
    config: PipelineConfig,
}

impl TerminalController {
    pub fn new(source: Arc<dyn MarketData>, config: PipelineConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Build the snapshot for `ticker`.
    ///
    /// # Errors
    ///
    /// Only when `ticker` is not a usable symbol; no provider call is made in
    /// that case. Provider failures are reported inside the sections.
    pub async fn snapshot(&self, ticker: &str) -> Result<QuoteSnapshot, SnapshotError> {
        let symbol = Symbol::parse(ticker).map_err(|source| SnapshotError {
            ticker: ticker.to_owned(),
            source,
        })?;
        debug!(%symbol, provider = %self.source.id(), "building snapshot");

        let info = self.load_info(&symbol).await;
        let history = self.load_history(&symbol).await;
        let news = self.load_news(&symbol).await;

        Ok(QuoteSnapshot {
            symbol,
            lookback: self.config.lookback,
            info,
            history,
            news,
        })
    }

    async fn load_info(&self, symbol: &Symbol) -> InfoSection {
        match self.source.info(symbol).await {
            Ok(info) => {
                let profile = info.profile();
                if profile.is_empty() {
                    InfoSection::Unavailable
                } else {
                    InfoSection::Profile(profile)
                }
            }
            Err(error) => {
                warn!(%symbol, step = "info", %error, "company info fetch failed");
                InfoSection::Unavailable
            }
        }
    }

    async fn load_history(&self, symbol: &Symbol) -> HistorySection {
        let request = HistoryRequest::new(symbol.clone(), self.config.lookback, self.config.interval);
        match self.source.history(request).await {
            Ok(history) if history.is_empty() => HistorySection::NoData,
            Ok(history) => HistorySection::Series(history),
            Err(error) if error.is_no_data() => {
                debug!(%symbol, %error, "provider has no history");
                HistorySection::NoData
            }
            Err(error) => {
                warn!(%symbol, step = "history", %error, "price history fetch failed");
                HistorySection::Failed(error.message().to_owned())
            }
        }
    }

    async fn load_news(&self, symbol: &Symbol) -> NewsSection {
        let result = match NewsRequest::new(symbol.clone(), self.config.news_limit) {
            Ok(request) => self.source.news(request).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(items) if items.is_empty() => NewsSection::Empty,
            Ok(mut items) => {
                items.truncate(self.config.news_limit);
                NewsSection::Headlines(items)
            }
            Err(error) => {
                warn!(%symbol, step = "news", %error, "news fetch failed");
                NewsSection::Failed(error.message().to_owned())
            }
        }
    }
}
