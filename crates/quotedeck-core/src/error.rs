use thiserror::Error;

/// Validation and contract errors exposed by `quotedeck-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid time range '{value}', expected one of 1D, 5D, 1M, 6M, 1Y, 5Y")]
    InvalidRange { value: String },

    #[error("timestamp must be UTC: '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("absolute change {absolute} and percent change {percent} disagree in sign")]
    ChangeSignMismatch { absolute: f64, percent: f64 },

    #[error("chart series timestamps must be strictly increasing (index {index})")]
    NonMonotonicSeries { index: usize },

    #[error("candle arrays differ in length: {prices} prices vs {timestamps} timestamps")]
    CandleLengthMismatch { prices: usize, timestamps: usize },
}

/// Classification for a failed upstream fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Upstream has nothing for the symbol. Normal empty result, never logged
    /// as an error.
    NoData,
    /// Upstream request quota exhausted. Expected background noise on a shared
    /// free-tier key; suppressed from warn-level logs.
    RateLimited,
    /// Any other non-success upstream status, including malformed payloads.
    Upstream,
    /// Transport-level failure reaching the proxy or upstream.
    Network,
    /// Storage unavailable or a corrupt cache entry. Always treated as a miss.
    Cache,
}

/// Structured fetch error used throughout the data-access layer.
///
/// Public service operations never surface these to callers; they resolve to
/// absence instead. The kind decides logging policy and breaker accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    retryable: bool,
}

impl FetchError {
    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::NoData,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Upstream,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Cache,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn is_rate_limited(&self) -> bool {
        matches!(self.kind, FetchErrorKind::RateLimited)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::NoData => "fetch.no_data",
            FetchErrorKind::RateLimited => "fetch.rate_limited",
            FetchErrorKind::Upstream => "fetch.upstream",
            FetchErrorKind::Network => "fetch.network",
            FetchErrorKind::Cache => "fetch.cache",
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}
