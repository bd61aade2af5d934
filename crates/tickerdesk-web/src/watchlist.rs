use tickerdesk_core::normalize_ticker;

/// Result of [`Watchlist::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchlistChange {
    Added(String),
    AlreadyPresent(String),
    /// Input was blank after trimming.
    Ignored,
}

/// Ordered, duplicate-free list of tickers plus the current selection.
///
/// Entries are stored trimmed and upper-cased. The selection always
/// resolves to a member: a stale selection falls back to the first entry,
/// and an empty list has no selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    tickers: Vec<String>,
    selected: Option<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut watchlist = Self::new();
        for ticker in tickers {
            watchlist.add(ticker.as_ref());
        }
        watchlist
    }

    pub fn add(&mut self, raw: &str) -> WatchlistChange {
        let ticker = normalize_ticker(raw);
        if ticker.is_empty() {
            return WatchlistChange::Ignored;
        }
        if self.contains(&ticker) {
            return WatchlistChange::AlreadyPresent(ticker);
        }
        self.tickers.push(ticker.clone());
        WatchlistChange::Added(ticker)
    }

    pub fn clear(&mut self) {
        self.tickers.clear();
        self.selected = None;
    }

    /// Select `ticker` if it is on the list; otherwise keep the prior value.
    pub fn select(&mut self, ticker: &str) -> bool {
        let ticker = normalize_ticker(ticker);
        if !self.contains(&ticker) {
            return false;
        }
        self.selected = Some(ticker);
        true
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected
            .as_deref()
            .filter(|ticker| self.contains(ticker))
            .or_else(|| self.tickers.first().map(String::as_str))
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|entry| entry == ticker)
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}
