//! Data-access layer composing cache, gate and transport.
//!
//! `MarketDataService` is the only component consumers talk to. Every public
//! operation resolves to a value or an explicit absence, never an error the
//! caller must catch. Internally each fetch walks the same path: cache check,
//! breaker check, gated dispatch through the transport, normalization,
//! cache write. When history is unavailable the chart operation degrades to a
//! synthesized series anchored at the live quote, because a plausible
//! placeholder beats a blank chart.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use time::Duration;

use crate::breaker::CircuitBreaker;
use crate::cache::{CacheKind, CacheStore};
use crate::catalog;
use crate::domain::{
    ChartSeries, FinancialMetric, NewsImpact, NewsItem, PricePoint, ProfileRecord, Quote,
    StockDetails, Symbol, TimeRange, UtcDateTime,
};
use crate::error::{FetchError, FetchErrorKind};
use crate::gate::RequestGate;
use crate::transport::{HttpClient, HttpRequest};
use crate::upstream::{
    self, round_cents, CandleWire, MetricWire, NewsWire, ProfileWire, QuoteWire, SearchWire,
};

const NA: &str = "N/A";
const NEWS_LIMIT: usize = 10;
const SEARCH_LIMIT: usize = 3;
const NEWS_LOOKBACK_DAYS: i64 = 30;
const MIN_SYNTHETIC_PRICE: f64 = 0.01;
/// Bounded perturbation applied to interior synthetic points, as a fraction
/// of the anchor price.
const SYNTHETIC_JITTER: f64 = 0.004;

const HIGH_IMPACT_KEYWORDS: [&str; 3] = ["earnings", "beats", "record"];
const MEDIUM_IMPACT_KEYWORDS: [&str; 5] =
    ["upgrade", "downgrade", "product", "launch", "partnership"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NewsScope {
    Company,
    Global,
}

/// Service tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Proxy origin plus prefix; endpoint paths are appended verbatim.
    pub api_base: String,
    /// Per-call transport timeout, below the gate's own timeout.
    pub request_timeout_ms: u64,
    /// Point count for synthesized series.
    pub synthetic_points: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base: String::from("http://127.0.0.1:8787/api"),
            request_timeout_ms: 5_000,
            synthetic_points: 30,
        }
    }
}

/// Typed market-data operations over the shared cache and request gate.
#[derive(Clone)]
pub struct MarketDataService {
    transport: Arc<dyn HttpClient>,
    cache: CacheStore,
    gate: RequestGate,
    breaker: Arc<CircuitBreaker>,
    config: ServiceConfig,
}

impl MarketDataService {
    pub fn new(transport: Arc<dyn HttpClient>, cache: CacheStore, gate: RequestGate) -> Self {
        Self::with_config(transport, cache, gate, ServiceConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn HttpClient>,
        cache: CacheStore,
        gate: RequestGate,
        config: ServiceConfig,
    ) -> Self {
        Self {
            transport,
            cache,
            gate,
            breaker: Arc::new(CircuitBreaker::default()),
            config,
        }
    }

    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    /// Current quote for a symbol, or `None` when the upstream has no
    /// meaningful price data (zero current and zero previous close) or the
    /// fetch failed this cycle. Callers poll again on their own schedule.
    pub async fn quote(&self, symbol: &Symbol) -> Option<Quote> {
        if let Some(cached) = self.read_cached::<Quote>(CacheKind::Quote, symbol.as_str()) {
            return Some(cached);
        }

        match self.fetch_quote(symbol).await {
            Ok(Some(quote)) => {
                self.write_cached(CacheKind::Quote, symbol.as_str(), &quote);
                Some(quote)
            }
            Ok(None) => None,
            Err(err) => {
                self.log_failure("quote", symbol.as_str(), &err);
                None
            }
        }
    }

    /// Chart series for `(symbol, range)`. Never fails: when upstream
    /// history is unusable the series is synthesized from the live quote and
    /// cached under the same TTL, so repeated views stay stable within the
    /// cache window. An empty series means the symbol has no data at all.
    pub async fn chart_series(&self, symbol: &Symbol, range: TimeRange) -> ChartSeries {
        let cache_key = chart_cache_key(symbol, range);
        if let Some(cached) = self.read_cached::<ChartSeries>(CacheKind::Chart, &cache_key) {
            return cached;
        }

        match self.fetch_series(symbol, range).await {
            Ok(points) => match ChartSeries::new(symbol.clone(), range, points) {
                Ok(series) => {
                    self.write_cached(CacheKind::Chart, &cache_key, &series);
                    return series;
                }
                Err(err) => {
                    tracing::warn!(symbol = %symbol, range = %range, %err, "unordered candle payload, synthesizing");
                }
            },
            Err(err) => self.log_failure("chart", &cache_key, &err),
        }

        self.synthesize_series(symbol, range).await
    }

    /// Labeled financial figures for the symbol, formatted for display.
    /// Empty on any failure.
    pub async fn financial_summary(&self, symbol: &Symbol) -> Vec<FinancialMetric> {
        match self.fetch_financials(symbol).await {
            Ok(metrics) => metrics,
            Err(err) => {
                self.log_failure("financials", symbol.as_str(), &err);
                Vec::new()
            }
        }
    }

    /// Recent news: the last 30 days for a symbol, or the latest general
    /// items for the global feed. Capped at ten articles, each classified
    /// into an impact tier at ingestion.
    pub async fn news(&self, symbol: Option<&Symbol>) -> Vec<NewsItem> {
        let cache_key = symbol
            .map(|s| s.as_str().to_owned())
            .unwrap_or_else(|| String::from("global"));
        if let Some(cached) = self.read_cached::<Vec<NewsItem>>(CacheKind::News, &cache_key) {
            return cached;
        }

        match self.fetch_news(symbol).await {
            Ok(items) => {
                self.write_cached(CacheKind::News, &cache_key, &items);
                items
            }
            Err(err) => {
                self.log_failure("news", &cache_key, &err);
                Vec::new()
            }
        }
    }

    /// Symbol search resolved into full quotes. An empty query returns
    /// immediately without touching the transport. Composite/foreign
    /// listings are excluded and the candidate set is capped small, since
    /// each candidate costs a gated quote fetch.
    pub async fn search(&self, query: &str) -> Vec<Quote> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let candidates = match self.fetch_search(query).await {
            Ok(candidates) => candidates,
            Err(err) => {
                self.log_failure("search", query, &err);
                return Vec::new();
            }
        };

        self.batch_quotes(&candidates).await
    }

    /// Quotes for many symbols, resolved sequentially in input order.
    /// Intentionally not parallel: the gate serializes dispatch anyway, and
    /// iterating one at a time avoids piling up pending futures on a
    /// free-tier key.
    pub async fn batch_quotes(&self, symbols: &[Symbol]) -> Vec<Quote> {
        let mut quotes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(quote) = self.quote(symbol).await {
                quotes.push(quote);
            }
        }
        quotes
    }

    /// Composite detail-view payload. `None` when the quote itself is
    /// absent; partial failures inside (a chart, the news) degrade to empty
    /// or synthesized sections instead.
    pub async fn stock_details(&self, symbol: &Symbol) -> Option<StockDetails> {
        let quote = self.quote(symbol).await?;

        let mut charts = Vec::with_capacity(TimeRange::ALL.len());
        for range in TimeRange::ALL {
            charts.push(self.chart_series(symbol, range).await);
        }

        let financials = self.financial_summary(symbol).await;
        let news = self.news(Some(symbol)).await;

        Some(StockDetails {
            quote,
            charts,
            financials,
            news,
        })
    }

    // -----------------------------------------------------------------------
    // Fetch internals
    // -----------------------------------------------------------------------

    async fn fetch_body(&self, label: &str, path: &str) -> Result<String, FetchError> {
        if !self.breaker.allow_request() {
            return Err(FetchError::upstream("upstream circuit is open"));
        }

        let request = HttpRequest::get(format!("{}{}", self.config.api_base, path))
            .with_timeout_ms(self.config.request_timeout_ms);
        let transport = Arc::clone(&self.transport);

        let outcome = self
            .gate
            .enqueue(label, || async move {
                transport
                    .execute(request)
                    .await
                    .map_err(|err| FetchError::network(err.message().to_owned()))
            })
            .await;

        match outcome {
            Ok(response) if response.is_success() => {
                self.breaker.record_success();
                Ok(response.body)
            }
            Ok(response) if response.is_rate_limited() => Err(FetchError::rate_limited(format!(
                "upstream quota exhausted for '{label}'"
            ))),
            Ok(response) => {
                self.breaker.record_failure();
                Err(FetchError::upstream(format!(
                    "upstream returned status {} for '{label}'",
                    response.status
                )))
            }
            Err(err) => {
                if matches!(
                    err.kind(),
                    FetchErrorKind::Network | FetchErrorKind::Upstream
                ) {
                    self.breaker.record_failure();
                }
                Err(err)
            }
        }
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, FetchError> {
        let body = self.fetch_body("quote", &upstream::quote_path(symbol)).await?;
        let wire: QuoteWire = upstream::decode(&body)?;
        if !wire.has_data() {
            return Ok(None);
        }

        let display_name = self.display_name(symbol).await;
        let quote = Quote::new(
            symbol.clone(),
            display_name,
            wire.best_price(),
            wire.absolute_change(),
            wire.percent_change(),
        )
        .map_err(|err| FetchError::upstream(format!("inconsistent quote payload: {err}")))?;

        Ok(Some(quote))
    }

    /// Display-name resolution: seeded catalog, then cached profile, then a
    /// gated profile fetch. A profile failure must not fail the quote, so
    /// the raw symbol text is the terminal fallback.
    async fn display_name(&self, symbol: &Symbol) -> String {
        if let Some(seeded) = catalog::seeded_profile(symbol) {
            return seeded.display_name;
        }

        if let Some(profile) =
            self.read_cached::<ProfileRecord>(CacheKind::Profile, symbol.as_str())
        {
            return profile.display_name;
        }

        match self.fetch_profile(symbol).await {
            Ok(profile) => {
                self.write_cached(CacheKind::Profile, symbol.as_str(), &profile);
                profile.display_name
            }
            Err(err) => {
                self.log_failure("profile", symbol.as_str(), &err);
                symbol.as_str().to_owned()
            }
        }
    }

    async fn fetch_profile(&self, symbol: &Symbol) -> Result<ProfileRecord, FetchError> {
        let body = self
            .fetch_body("profile", &upstream::profile_path(symbol))
            .await?;
        let wire: ProfileWire = upstream::decode(&body)?;
        let canonical = wire
            .ticker
            .as_deref()
            .and_then(|ticker| Symbol::parse(ticker).ok())
            .unwrap_or_else(|| symbol.clone());
        Ok(ProfileRecord::new(canonical, wire.name.unwrap_or_default()))
    }

    async fn fetch_series(
        &self,
        symbol: &Symbol,
        range: TimeRange,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let to = UtcDateTime::now();
        let from = to.minus(range.lookback());
        let path = upstream::candle_path(
            symbol,
            range.resolution(),
            from.unix_timestamp(),
            to.unix_timestamp(),
        );

        let body = self.fetch_body("chart", &path).await?;
        let wire: CandleWire = upstream::decode(&body)?;
        if wire.is_no_data() {
            return Err(FetchError::no_data(format!(
                "no history for {symbol} over {range}"
            )));
        }

        wire.into_points()
            .map_err(|err| FetchError::upstream(format!("unusable candle payload: {err}")))
    }

    async fn synthesize_series(&self, symbol: &Symbol, range: TimeRange) -> ChartSeries {
        let Some(quote) = self.quote(symbol).await else {
            return ChartSeries::empty(symbol.clone(), range);
        };

        let points = synthesize_points(&quote, range, self.config.synthetic_points);
        match ChartSeries::synthesized(symbol.clone(), range, points) {
            Ok(series) => {
                self.write_cached(CacheKind::Chart, &chart_cache_key(symbol, range), &series);
                series
            }
            Err(err) => {
                tracing::warn!(symbol = %symbol, range = %range, %err, "synthesis produced an invalid series");
                ChartSeries::empty(symbol.clone(), range)
            }
        }
    }

    async fn fetch_financials(&self, symbol: &Symbol) -> Result<Vec<FinancialMetric>, FetchError> {
        let body = self
            .fetch_body("financials", &upstream::metric_path(symbol))
            .await?;
        let wire: MetricWire = upstream::decode(&body)?;
        let Some(fields) = wire.metric else {
            return Ok(Vec::new());
        };

        Ok(vec![
            FinancialMetric::new("Market Cap", format_magnitude(fields.market_cap)),
            FinancialMetric::new("52W High", format_dollars(fields.week52_high)),
            FinancialMetric::new("52W Low", format_dollars(fields.week52_low)),
            FinancialMetric::new("P/E Ratio", format_ratio(fields.pe_normalized)),
        ])
    }

    async fn fetch_news(&self, symbol: Option<&Symbol>) -> Result<Vec<NewsItem>, FetchError> {
        let path = match symbol {
            Some(symbol) => {
                let to = UtcDateTime::now();
                let from = to.minus(Duration::days(NEWS_LOOKBACK_DAYS));
                upstream::company_news_path(symbol, &from, &to)
            }
            None => upstream::global_news_path(),
        };

        let body = self.fetch_body("news", &path).await?;
        let wire: Vec<NewsWire> = upstream::decode(&body)?;
        let scope = if symbol.is_some() {
            NewsScope::Company
        } else {
            NewsScope::Global
        };

        Ok(wire
            .into_iter()
            .take(NEWS_LIMIT)
            .map(|article| {
                let impact = classify_impact(&article.headline, scope);
                NewsItem {
                    headline: article.headline,
                    source: article.source,
                    published_at: article.datetime,
                    url: article.url,
                    impact,
                }
            })
            .collect())
    }

    async fn fetch_search(&self, query: &str) -> Result<Vec<Symbol>, FetchError> {
        let body = self.fetch_body("search", &upstream::search_path(query)).await?;
        let wire: SearchWire = upstream::decode(&body)?;

        Ok(wire
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|hit| Symbol::parse(&hit.symbol).ok())
            .filter(|symbol| !symbol.has_separator())
            .take(SEARCH_LIMIT)
            .collect())
    }

    // -----------------------------------------------------------------------
    // Cache plumbing
    // -----------------------------------------------------------------------

    fn read_cached<T: DeserializeOwned>(&self, kind: CacheKind, key: &str) -> Option<T> {
        let payload = self.cache.get(kind, key)?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(kind = kind.as_str(), key, %err, "corrupt cache entry, treating as miss");
                None
            }
        }
    }

    fn write_cached<T: Serialize>(&self, kind: CacheKind, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(payload) => self.cache.put(kind, key, payload),
            Err(err) => {
                tracing::debug!(kind = kind.as_str(), key, %err, "unserializable cache payload, skipping");
            }
        }
    }

    /// Rate limits are expected background noise on a shared key, so they
    /// stay out of warn-level logs; genuine failures do not.
    fn log_failure(&self, operation: &str, key: &str, err: &FetchError) {
        match err.kind() {
            FetchErrorKind::RateLimited => {
                tracing::debug!(operation, key, %err, "rate limited, returning absent this cycle");
            }
            FetchErrorKind::NoData => {
                tracing::trace!(operation, key, %err, "upstream has no data");
            }
            _ => {
                tracing::warn!(operation, key, %err, "fetch failed, returning absent");
            }
        }
    }
}

fn chart_cache_key(symbol: &Symbol, range: TimeRange) -> String {
    format!("{}_{}", symbol.as_str(), range.as_str())
}

/// Fabricates a plausible series when history is unavailable: the last point
/// anchors at the live price, the first back-computes from the percent
/// change, and interior points follow the straight trend between them with a
/// small bounded perturbation. All prices clamp to a positive minimum.
fn synthesize_points(quote: &Quote, range: TimeRange, count: usize) -> Vec<PricePoint> {
    let count = count.max(2);
    let last = quote.last_price.max(MIN_SYNTHETIC_PRICE);
    let growth = 1.0 + quote.percent_change / 100.0;
    let start = if growth > 0.0 { last / growth } else { last };

    let now = UtcDateTime::now();
    let step_secs = (range.lookback().whole_seconds() / (count as i64 - 1)).max(1);

    let mut points = Vec::with_capacity(count);
    for index in 0..count {
        let offset = Duration::seconds(step_secs * (count as i64 - 1 - index as i64));
        let ts = now.minus(offset);

        let fraction = index as f64 / (count as f64 - 1.0);
        let mut price = start + (last - start) * fraction;
        if index != 0 && index != count - 1 {
            price += (fastrand::f64() * 2.0 - 1.0) * last * SYNTHETIC_JITTER;
        }
        let price = round_cents(price.max(MIN_SYNTHETIC_PRICE));

        points.push(PricePoint::new(ts, price).expect("clamped synthetic price is valid"));
    }

    points
}

/// Formats a raw magnitude with a K/M/B/T suffix; non-positive and missing
/// values render as the `"N/A"` sentinel rather than propagating nulls.
pub fn format_magnitude(value: Option<f64>) -> String {
    let Some(v) = value else {
        return String::from(NA);
    };
    if !v.is_finite() || v <= 0.0 {
        return String::from(NA);
    }

    if v > 1e12 {
        format!("{:.2}T", v / 1e12)
    } else if v > 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if v > 1e6 {
        format!("{:.2}M", v / 1e6)
    } else if v > 1e3 {
        format!("{:.2}K", v / 1e3)
    } else {
        format!("{v:.2}")
    }
}

fn format_dollars(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => format!("${v:.2}"),
        _ => String::from(NA),
    }
}

fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => format!("{v:.2}"),
        _ => String::from(NA),
    }
}

fn classify_impact(headline: &str, scope: NewsScope) -> NewsImpact {
    let lowered = headline.to_ascii_lowercase();
    if HIGH_IMPACT_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return NewsImpact::High;
    }
    if MEDIUM_IMPACT_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return NewsImpact::Medium;
    }
    match scope {
        NewsScope::Global => NewsImpact::Medium,
        NewsScope::Company => NewsImpact::Low,
    }
}
