use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::http_client::{HttpClient, HttpRequest, HttpResponse, DEFAULT_TIMEOUT_MS};
use crate::market_data::{
    Endpoint, HistoryRequest, MarketData, NewsRequest, SourceError, SourceFuture,
};
use crate::retry::RetryConfig;
use crate::{
    CompanyInfo, NewsItem, PriceHistory, PricePoint, ProviderId, Symbol, UtcDateTime,
};

const REFERER: &str = "https://finance.yahoo.com/";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const SUMMARY_MODULES: &str = "price,assetProfile";
const CRUMB_TTL: Duration = Duration::from_secs(3600);

// ============================================================================
// Crumb handling
// ============================================================================

#[derive(Debug, Clone)]
struct Crumb {
    value: String,
    fetched_at: Instant,
}

/// Cookie/crumb state for Yahoo's unofficial API.
///
/// The session cookie lives in the transport's cookie jar; `quoteSummary`
/// additionally requires a crumb token bound to that cookie.
#[derive(Debug, Default)]
pub struct YahooAuth {
    crumb: Mutex<Option<Crumb>>,
    cookie_override: Option<String>,
}

impl YahooAuth {
    /// Send a fixed cookie header instead of relying on the cookie jar
    /// (`YAHOO_COOKIE`).
    pub fn with_cookie(cookie: impl Into<String>) -> Self {
        Self {
            crumb: Mutex::new(None),
            cookie_override: Some(cookie.into()),
        }
    }

    pub fn cookie_override(&self) -> Option<&str> {
        self.cookie_override.as_deref()
    }

    fn cached(&self) -> Option<String> {
        let guard = self.crumb.lock().expect("crumb lock is not poisoned");
        guard
            .as_ref()
            .filter(|crumb| crumb.fetched_at.elapsed() < CRUMB_TTL)
            .map(|crumb| crumb.value.clone())
    }

    fn store(&self, value: String) {
        let mut guard = self.crumb.lock().expect("crumb lock is not poisoned");
        *guard = Some(Crumb {
            value,
            fetched_at: Instant::now(),
        });
    }

    pub fn invalidate(&self) {
        let mut guard = self.crumb.lock().expect("crumb lock is not poisoned");
        *guard = None;
    }
}

fn looks_like_crumb(body: &str) -> bool {
    !body.is_empty()
        && body.len() < 100
        && !body.contains(char::is_whitespace)
        && !body.contains('<')
}

// ============================================================================
// Adapter
// ============================================================================

/// Yahoo Finance market-data source.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    auth: Arc<YahooAuth>,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            auth: Arc::new(YahooAuth::default()),
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_auth(mut self, auth: YahooAuth) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn request(&self, url: &str) -> HttpRequest {
        HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_cookie(self.auth.cookie_override())
            .with_timeout_ms(self.timeout_ms)
    }

    /// Execute a GET, retrying transport failures and retryable statuses.
    ///
    /// Any other status is handed back to the caller, whose error body may
    /// still carry a meaningful Yahoo error.
    async fn send(&self, endpoint: Endpoint, url: &str) -> Result<HttpResponse, SourceError> {
        let mut attempt = 0;
        loop {
            debug!(%endpoint, attempt, url, "yahoo request");
            match self.http_client.execute(self.request(url)).await {
                Ok(response)
                    if self.retry.should_retry_status(response.status)
                        && self.retry.allows_retry(attempt) =>
                {
                    debug!(%endpoint, status = response.status, "retrying yahoo status");
                }
                Ok(response) => return Ok(response),
                Err(error) if error.retryable() && self.retry.allows_retry(attempt) => {
                    debug!(%endpoint, error = error.message(), "retrying yahoo transport error");
                }
                Err(error) => {
                    return Err(SourceError::unavailable(format!(
                        "yahoo {endpoint} transport error: {}",
                        error.message()
                    )));
                }
            }

            tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
            attempt += 1;
        }
    }

    async fn crumb(&self) -> Result<String, SourceError> {
        if let Some(crumb) = self.auth.cached() {
            return Ok(crumb);
        }

        // fc.yahoo.com answers 404 but sets the session cookie; only a
        // transport failure matters here.
        if self.auth.cookie_override().is_none() {
            self.http_client
                .execute(self.request(COOKIE_URL))
                .await
                .map_err(|e| {
                    SourceError::unavailable(format!(
                        "failed to fetch yahoo session cookie: {}",
                        e.message()
                    ))
                })?;
        }

        for url in CRUMB_URLS {
            let response = match self.http_client.execute(self.request(url)).await {
                Ok(response) => response,
                Err(error) => {
                    warn!(url, error = error.message(), "yahoo crumb endpoint failed");
                    continue;
                }
            };

            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited while fetching crumb",
                ));
            }

            let body = response.body.trim();
            if response.is_success() && looks_like_crumb(body) {
                self.auth.store(body.to_owned());
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }

    async fn fetch_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        let mut refreshed = false;
        loop {
            let crumb = self.crumb().await?;
            let url = format!(
                "{SUMMARY_URL}/{}?modules={SUMMARY_MODULES}&crumb={}",
                urlencoding::encode(symbol.as_str()),
                urlencoding::encode(&crumb)
            );
            let response = self.send(Endpoint::Info, &url).await?;

            // A stale crumb surfaces as 401; refresh it once.
            if matches!(response.status, 401 | 403) && !refreshed {
                self.auth.invalidate();
                refreshed = true;
                continue;
            }

            return parse_summary_response(&response);
        }
    }

    async fn fetch_history(&self, req: &HistoryRequest) -> Result<PriceHistory, SourceError> {
        let url = format!(
            "{CHART_URL}/{}?range={}&interval={}&includePrePost=false&events=div%2Csplit",
            urlencoding::encode(req.symbol.as_str()),
            req.lookback.as_str(),
            req.interval.as_str(),
        );
        let response = self.send(Endpoint::History, &url).await?;
        parse_chart_response(req, &response)
    }

    async fn fetch_news(&self, req: &NewsRequest) -> Result<Vec<NewsItem>, SourceError> {
        let url = format!(
            "{SEARCH_URL}?q={}&quotesCount=0&newsCount={}",
            urlencoding::encode(req.symbol.as_str()),
            req.limit
        );
        let response = self.send(Endpoint::News, &url).await?;
        parse_search_response(req.limit, &response)
    }
}

impl MarketData for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, CompanyInfo> {
        Box::pin(self.fetch_info(symbol))
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceHistory> {
        Box::pin(async move { self.fetch_history(&req).await })
    }

    fn news<'a>(&'a self, req: NewsRequest) -> SourceFuture<'a, Vec<NewsItem>> {
        Box::pin(async move { self.fetch_news(&req).await })
    }
}

// ============================================================================
// Response parsing
// ============================================================================

fn status_error(endpoint: Endpoint, response: &HttpResponse) -> SourceError {
    match response.status {
        404 => SourceError::no_data(format!("yahoo has no {endpoint} data for this symbol")),
        429 => SourceError::rate_limited(format!("yahoo rate limited the {endpoint} request")),
        status => SourceError::unavailable(format!("yahoo {endpoint} returned status {status}")),
    }
}

fn api_error(endpoint: Endpoint, error: &YahooApiError) -> SourceError {
    let description = error
        .description
        .clone()
        .unwrap_or_else(|| format!("yahoo {endpoint} error"));
    match error.code.as_deref() {
        Some("Not Found") => SourceError::no_data(description),
        Some("Bad Request") => SourceError::invalid_request(description),
        _ => SourceError::unavailable(description),
    }
}

fn parse_summary_response(response: &HttpResponse) -> Result<CompanyInfo, SourceError> {
    let parsed = serde_json::from_str::<YahooSummaryEnvelope>(&response.body);
    let summary = match parsed {
        Ok(envelope) => envelope.quote_summary,
        Err(_) if !response.is_success() => return Err(status_error(Endpoint::Info, response)),
        Err(e) => {
            return Err(SourceError::internal(format!(
                "failed to parse yahoo quoteSummary: {e}"
            )))
        }
    };

    if let Some(error) = &summary.error {
        return Err(api_error(Endpoint::Info, error));
    }
    if !response.is_success() {
        return Err(status_error(Endpoint::Info, response));
    }

    let mut info = CompanyInfo::default();
    for result in summary.result.unwrap_or_default() {
        // Modules are flattened; `price` wins over `assetProfile` on clashes.
        for module in [result.price, result.asset_profile].into_iter().flatten() {
            info.absorb(module);
        }
    }
    Ok(info)
}

fn parse_chart_response(
    req: &HistoryRequest,
    response: &HttpResponse,
) -> Result<PriceHistory, SourceError> {
    let parsed = serde_json::from_str::<YahooChartEnvelope>(&response.body);
    let chart = match parsed {
        Ok(envelope) => envelope.chart,
        Err(_) if !response.is_success() => {
            return Err(status_error(Endpoint::History, response))
        }
        Err(e) => {
            return Err(SourceError::internal(format!(
                "failed to parse yahoo chart: {e}"
            )))
        }
    };

    if let Some(error) = &chart.error {
        return Err(api_error(Endpoint::History, error));
    }
    if !response.is_success() {
        return Err(status_error(Endpoint::History, response));
    }

    let result = chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::no_data("yahoo chart response has no result"))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let mut points = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.into_iter().zip(closes) {
        // Yahoo pads halted sessions with nulls.
        let Some(close) = close else { continue };
        let Ok(ts) = UtcDateTime::from_unix(ts) else {
            warn!(symbol = %req.symbol, ts, "skipping chart bar with out-of-range timestamp");
            continue;
        };
        if let Ok(point) = PricePoint::new(ts, close) {
            points.push(point);
        }
    }

    Ok(PriceHistory::new(
        req.symbol.clone(),
        req.lookback,
        req.interval,
        points,
    ))
}

fn parse_search_response(
    limit: usize,
    response: &HttpResponse,
) -> Result<Vec<NewsItem>, SourceError> {
    if !response.is_success() {
        return Err(status_error(Endpoint::News, response));
    }

    let search = serde_json::from_str::<YahooSearchResponse>(&response.body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo search: {e}")))?;

    Ok(search
        .news
        .into_iter()
        .take(limit)
        .map(|raw| NewsItem {
            title: raw.title,
            publisher: raw.publisher,
            link: raw.link.or(raw.link_href),
            published_at: raw
                .provider_publish_time
                .and_then(|ts| UtcDateTime::from_unix(ts).ok()),
        })
        .collect())
}

// Yahoo Finance API response structures

#[derive(Debug, Clone, Deserialize)]
struct YahooApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooSummaryData,
}

#[derive(Debug, Deserialize)]
struct YahooSummaryData {
    #[serde(default)]
    result: Option<Vec<YahooSummaryResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct YahooSummaryResult {
    #[serde(default)]
    price: Option<Map<String, Value>>,
    #[serde(rename = "assetProfile", default)]
    asset_profile: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartEnvelope {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    news: Vec<YahooNewsItem>,
}

#[derive(Debug, Deserialize)]
struct YahooNewsItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(rename = "linkHref", default)]
    link_href: Option<String>,
    #[serde(rename = "providerPublishTime", default)]
    provider_publish_time: Option<i64>,
}
