//! Upstream wire formats and endpoint paths.
//!
//! The provider exposes a Finnhub-shaped REST surface behind the proxy. This
//! module owns the raw response structs, the path builders and the
//! normalization into domain types, so the service layer never touches field
//! soup like `c`/`dp`/`pc` directly.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{PricePoint, Symbol, UtcDateTime};
use crate::error::{FetchError, ValidationError};

const CANDLE_STATUS_OK: &str = "ok";

// ---------------------------------------------------------------------------
// Endpoint paths (relative to the proxy's /api prefix)
// ---------------------------------------------------------------------------

pub fn quote_path(symbol: &Symbol) -> String {
    format!("/quote?symbol={}", urlencoding::encode(symbol.as_str()))
}

pub fn profile_path(symbol: &Symbol) -> String {
    format!(
        "/stock/profile2?symbol={}",
        urlencoding::encode(symbol.as_str())
    )
}

pub fn candle_path(symbol: &Symbol, resolution: &str, from: i64, to: i64) -> String {
    format!(
        "/stock/candle?symbol={}&resolution={}&from={}&to={}",
        urlencoding::encode(symbol.as_str()),
        resolution,
        from,
        to
    )
}

pub fn metric_path(symbol: &Symbol) -> String {
    format!(
        "/stock/metric?symbol={}&metric=all",
        urlencoding::encode(symbol.as_str())
    )
}

pub fn company_news_path(symbol: &Symbol, from: &UtcDateTime, to: &UtcDateTime) -> String {
    format!(
        "/company-news?symbol={}&from={}&to={}",
        urlencoding::encode(symbol.as_str()),
        from.as_calendar_date(),
        to.as_calendar_date()
    )
}

pub fn global_news_path() -> String {
    String::from("/news?category=general")
}

pub fn search_path(query: &str) -> String {
    format!("/search?q={}", urlencoding::encode(query))
}

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

/// `/quote` payload: current, change, percent change, previous close.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteWire {
    #[serde(default)]
    pub c: Option<f64>,
    #[serde(default)]
    pub d: Option<f64>,
    #[serde(default)]
    pub dp: Option<f64>,
    #[serde(default)]
    pub pc: Option<f64>,
}

impl QuoteWire {
    pub fn current(&self) -> f64 {
        self.c.unwrap_or(0.0)
    }

    pub fn previous_close(&self) -> f64 {
        self.pc.unwrap_or(0.0)
    }

    /// Zero current and zero previous close means the upstream knows nothing
    /// about the symbol: an empty result, not an error.
    pub fn has_data(&self) -> bool {
        self.current() != 0.0 || self.previous_close() != 0.0
    }

    /// Best available price: the live price, falling back to the previous
    /// close outside market hours.
    pub fn best_price(&self) -> f64 {
        if self.current() != 0.0 {
            self.current()
        } else {
            self.previous_close()
        }
    }

    pub fn absolute_change(&self) -> f64 {
        self.d.unwrap_or(0.0)
    }

    pub fn percent_change(&self) -> f64 {
        self.dp.unwrap_or(0.0)
    }
}

/// `/stock/profile2` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileWire {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
}

/// `/stock/candle` payload: parallel price/timestamp arrays plus a status
/// marker; anything but `"ok"` is a no-data response.
#[derive(Debug, Clone, Deserialize)]
pub struct CandleWire {
    #[serde(default)]
    pub s: Option<String>,
    #[serde(default)]
    pub c: Option<Vec<f64>>,
    #[serde(default)]
    pub t: Option<Vec<i64>>,
}

impl CandleWire {
    pub fn is_no_data(&self) -> bool {
        if self.s.as_deref() != Some(CANDLE_STATUS_OK) {
            return true;
        }
        self.c.as_ref().map_or(true, |prices| prices.is_empty())
    }

    /// Zips the parallel arrays into ordered chart points. Prices are
    /// rounded to cents, matching what the dashboard renders.
    pub fn into_points(self) -> Result<Vec<PricePoint>, ValidationError> {
        let prices = self.c.unwrap_or_default();
        let timestamps = self.t.unwrap_or_default();
        if prices.len() != timestamps.len() {
            return Err(ValidationError::CandleLengthMismatch {
                prices: prices.len(),
                timestamps: timestamps.len(),
            });
        }

        prices
            .into_iter()
            .zip(timestamps)
            .map(|(price, ts)| {
                let ts = UtcDateTime::from_unix_timestamp(ts)?;
                PricePoint::new(ts, round_cents(price))
            })
            .collect()
    }
}

/// `/stock/metric?metric=all` payload; only the projected fields are
/// decoded, the rest of the nested map is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricWire {
    #[serde(default)]
    pub metric: Option<MetricFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricFields {
    #[serde(rename = "marketCapitalization", default)]
    pub market_cap: Option<f64>,
    #[serde(rename = "52WeekHigh", default)]
    pub week52_high: Option<f64>,
    #[serde(rename = "52WeekLow", default)]
    pub week52_low: Option<f64>,
    #[serde(rename = "peNormalizedAnnual", default)]
    pub pe_normalized: Option<f64>,
}

/// One `/company-news` or `/news` article.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsWire {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub url: String,
}

/// `/search` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchWire {
    #[serde(default)]
    pub result: Option<Vec<SearchHit>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub symbol: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Decodes an upstream body, mapping malformed payloads to upstream errors.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body)
        .map_err(|err| FetchError::upstream(format!("malformed upstream payload: {err}")))
}

pub(crate) fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
