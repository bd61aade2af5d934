use serde_json::json;
use time::Duration;

use crate::market_data::{HistoryRequest, MarketData, NewsRequest, SourceError, SourceFuture};
use crate::{CompanyInfo, NewsItem, PriceHistory, PricePoint, ProviderId, Symbol, UtcDateTime};

const SECTORS: [(&str, &str); 5] = [
    ("Technology", "Software - Infrastructure"),
    ("Healthcare", "Drug Manufacturers"),
    ("Financial Services", "Banks - Diversified"),
    ("Consumer Cyclical", "Auto Manufacturers"),
    ("Energy", "Oil & Gas Integrated"),
];

const PUBLISHERS: [&str; 4] = ["Reuters", "Bloomberg", "MarketWatch", "Barron's"];

/// Offline source producing deterministic data per symbol.
///
/// Used by `--offline` so the dashboard can be explored without network
/// access. The same symbol always yields the same profile, curve and
/// headlines; only the time axis follows the wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleMarketData;

impl SampleMarketData {
    fn company_info(symbol: &Symbol) -> CompanyInfo {
        let seed = symbol_seed(symbol);
        let (sector, industry) = SECTORS[(seed % SECTORS.len() as u64) as usize];
        let root = symbol
            .as_str()
            .split(['.', '-', '='])
            .next()
            .unwrap_or_else(|| symbol.as_str())
            .trim_start_matches('^');

        CompanyInfo::from_value(json!({
            "shortName": format!("{root} Holdings"),
            "longName": format!("{root} Holdings Incorporated"),
            "sector": sector,
            "industry": industry,
            "country": "United States",
            "website": format!("https://www.{}.example", root.to_ascii_lowercase()),
        }))
    }

    fn price_history(req: &HistoryRequest) -> Result<PriceHistory, SourceError> {
        let seed = symbol_seed(&req.symbol);
        let step = Duration::days(i64::from(req.interval.approx_days()));
        let count = (req.lookback.days() / req.interval.approx_days()).max(1) as usize;
        let now = UtcDateTime::now().into_inner();

        let mut price = 40.0 + (seed % 400) as f64;
        let mut points = Vec::with_capacity(count);
        for index in 0..count {
            let offset = step * (count - index - 1) as i32;
            let ts = UtcDateTime::from_offset_datetime(now - offset)?;
            let wave = wobble(seed, index);
            price = (price * (1.0 + wave / 400.0)).max(1.0);
            points.push(PricePoint::new(ts, (price * 100.0).round() / 100.0)?);
        }

        Ok(PriceHistory::new(
            req.symbol.clone(),
            req.lookback,
            req.interval,
            points,
        ))
    }

    fn headlines(req: &NewsRequest) -> Vec<NewsItem> {
        let seed = symbol_seed(&req.symbol);
        let symbol = req.symbol.as_str();
        let templates = [
            format!("{symbol} shares move as analysts revise targets"),
            format!("What to watch in {symbol} earnings this quarter"),
            format!("{symbol} announces investor day"),
        ];

        templates
            .into_iter()
            .enumerate()
            .take(req.limit)
            .map(|(index, title)| NewsItem {
                title: Some(title),
                publisher: Some(
                    PUBLISHERS[(seed.wrapping_add(index as u64) % PUBLISHERS.len() as u64) as usize]
                        .to_owned(),
                ),
                link: Some(format!(
                    "https://news.example/{}/{index}",
                    symbol.to_ascii_lowercase()
                )),
                published_at: None,
            })
            .collect()
    }
}

impl MarketData for SampleMarketData {
    fn id(&self) -> ProviderId {
        ProviderId::Sample
    }

    fn info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, CompanyInfo> {
        Box::pin(async move { Ok(Self::company_info(symbol)) })
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceHistory> {
        Box::pin(async move { Self::price_history(&req) })
    }

    fn news<'a>(&'a self, req: NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move { Ok(Self::headlines(&req)) })
    }
}

/// Small deterministic wobble in `-5.0..=5.0` around a slow drift.
fn wobble(seed: u64, index: usize) -> f64 {
    (seed.wrapping_add((index as u64).wrapping_mul(7)) % 11) as f64 - 5.0
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Interval, Lookback};

    #[tokio::test]
    async fn same_symbol_yields_same_profile() {
        let source = SampleMarketData;
        let symbol = Symbol::parse("INFY.NS").expect("valid");

        let first = source.info(&symbol).await.expect("info");
        let second = source.info(&symbol).await.expect("info");

        assert_eq!(first, second);
        assert_eq!(first.profile()[0].value, "INFY Holdings");
    }

    #[tokio::test]
    async fn six_month_daily_history_is_ordered_and_positive() {
        let request = HistoryRequest::new(
            Symbol::parse("AAPL").expect("valid"),
            Lookback::SixMonths,
            Interval::OneDay,
        );

        let history = SampleMarketData.history(request).await.expect("history");

        assert_eq!(history.len(), 182);
        assert!(history.points.windows(2).all(|pair| pair[0].ts < pair[1].ts));
        assert!(history.points.iter().all(|point| point.close >= 1.0));
    }

    #[tokio::test]
    async fn news_respects_limit() {
        let request = NewsRequest::new(Symbol::parse("TSLA").expect("valid"), 2).expect("limit");
        let news = SampleMarketData.news(request).await.expect("news");
        assert_eq!(news.len(), 2);
        assert!(news.iter().all(|item| item.href().is_some()));
    }

    #[test]
    fn wobble_wraps_for_seeds_near_the_top_of_the_range() {
        let values: Vec<_> = (0..200).map(|index| wobble(u64::MAX - 3, index)).collect();
        assert!(values.iter().all(|value| (-5.0..=5.0).contains(value)));
    }

    #[tokio::test]
    async fn longest_symbols_produce_history_and_news() {
        let symbol = Symbol::parse("ZZZZZZZZZZZZZZZ").expect("valid");
        let history = SampleMarketData
            .history(HistoryRequest::new(symbol.clone(), Lookback::SixMonths, Interval::OneDay))
            .await
            .expect("history");
        let news = SampleMarketData
            .news(NewsRequest::new(symbol, 3).expect("limit"))
            .await
            .expect("news");

        assert!(!history.is_empty());
        assert_eq!(news.len(), 3);
    }
}
