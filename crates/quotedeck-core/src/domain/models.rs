use serde::{Deserialize, Serialize};

use crate::{Symbol, TimeRange, UtcDateTime, ValidationError};

/// Long-lived mapping from a ticker to its human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub symbol: Symbol,
    pub display_name: String,
}

impl ProfileRecord {
    pub fn new(symbol: Symbol, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let display_name = if display_name.trim().is_empty() {
            symbol.as_str().to_owned()
        } else {
            display_name
        };
        Self {
            symbol,
            display_name,
        }
    }
}

/// Snapshot quote for one symbol. Replaced whole on every successful fetch,
/// never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub display_name: String,
    pub last_price: f64,
    pub absolute_change: f64,
    pub percent_change: f64,
}

impl Quote {
    pub fn new(
        symbol: Symbol,
        display_name: impl Into<String>,
        last_price: f64,
        absolute_change: f64,
        percent_change: f64,
    ) -> Result<Self, ValidationError> {
        validate_finite("last_price", last_price)?;
        validate_finite("absolute_change", absolute_change)?;
        validate_finite("percent_change", percent_change)?;
        if last_price < 0.0 {
            return Err(ValidationError::NegativeValue {
                field: "last_price",
            });
        }

        // Both may be zero pre-market; opposite signs mean a corrupt payload.
        if sign_of(absolute_change) * sign_of(percent_change) == -1 {
            return Err(ValidationError::ChangeSignMismatch {
                absolute: absolute_change,
                percent: percent_change,
            });
        }

        Ok(Self {
            symbol,
            display_name: display_name.into(),
            last_price,
            absolute_change,
            percent_change,
        })
    }
}

/// Single chart sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ts: UtcDateTime,
    pub price: f64,
}

impl PricePoint {
    pub fn new(ts: UtcDateTime, price: f64) -> Result<Self, ValidationError> {
        validate_finite("price", price)?;
        if price < 0.0 {
            return Err(ValidationError::NegativeValue { field: "price" });
        }
        Ok(Self { ts, price })
    }
}

/// Ordered price series for one `(symbol, range)` pair.
///
/// Construction enforces strictly increasing timestamps. The `synthetic`
/// flag records provenance for tests only; it is not serialized, so a series
/// read back from the cache is indistinguishable from an upstream one, and
/// consumers treat both uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub symbol: Symbol,
    pub range: TimeRange,
    pub points: Vec<PricePoint>,
    #[serde(skip)]
    pub synthetic: bool,
}

impl ChartSeries {
    pub fn new(
        symbol: Symbol,
        range: TimeRange,
        points: Vec<PricePoint>,
    ) -> Result<Self, ValidationError> {
        Self::build(symbol, range, points, false)
    }

    pub fn synthesized(
        symbol: Symbol,
        range: TimeRange,
        points: Vec<PricePoint>,
    ) -> Result<Self, ValidationError> {
        Self::build(symbol, range, points, true)
    }

    pub fn empty(symbol: Symbol, range: TimeRange) -> Self {
        Self {
            symbol,
            range,
            points: Vec::new(),
            synthetic: false,
        }
    }

    fn build(
        symbol: Symbol,
        range: TimeRange,
        points: Vec<PricePoint>,
        synthetic: bool,
    ) -> Result<Self, ValidationError> {
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].ts <= pair[0].ts {
                return Err(ValidationError::NonMonotonicSeries { index: index + 1 });
            }
        }
        Ok(Self {
            symbol,
            range,
            points,
            synthetic,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// One labeled, display-ready financial figure (`"Market Cap" -> "2.50T"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialMetric {
    pub label: String,
    pub value: String,
}

impl FinancialMetric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Headline impact tier, derived once at ingestion and frozen thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsImpact {
    High,
    Medium,
    Low,
}

impl NewsImpact {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Normalized news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub source: String,
    /// Unix seconds, as delivered by the upstream feed.
    pub published_at: i64,
    pub url: String,
    pub impact: NewsImpact,
}

/// Composite detail-view payload: quote plus every chart range, financials
/// and company news, fetched sequentially to avoid burst errors on a
/// free-tier key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDetails {
    pub quote: Quote,
    pub charts: Vec<ChartSeries>,
    pub financials: Vec<FinancialMetric>,
    pub news: Vec<NewsItem>,
}

fn sign_of(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteValue { field })
    }
}
