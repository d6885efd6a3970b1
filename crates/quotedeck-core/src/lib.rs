//! # Quotedeck Core
//!
//! Data-access engine for a market dashboard backed by a rate-limited
//! third-party provider.
//!
//! ## Overview
//!
//! Many dashboard widgets want data at once; the upstream allows roughly one
//! request per second on a shared key. This crate sits between the two:
//!
//! - **Canonical domain models** for quotes, chart series, profiles,
//!   financial metrics and news
//! - **Cache store** with per-kind TTLs and lazy expiry
//! - **Request gate**: one process-wide FIFO queue with minimum
//!   inter-dispatch spacing and a hard quota backstop
//! - **Data-access layer** composing both, with graceful degradation
//!   (synthesized chart series, absence instead of errors)
//! - **Circuit breaker** for a sick upstream
//! - **Transport abstraction** so tests never touch the network
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`breaker`] | Circuit breaker for upstream calls |
//! | [`cache`] | Kind-namespaced TTL cache |
//! | [`catalog`] | Seeded ticker/profile tables |
//! | [`domain`] | Domain models (Quote, ChartSeries, NewsItem, ...) |
//! | [`error`] | Validation and fetch error types |
//! | [`gate`] | Serialized, paced request queue |
//! | [`service`] | Typed data-access operations |
//! | [`transport`] | HTTP client abstraction |
//! | [`upstream`] | Upstream wire formats and endpoint paths |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quotedeck_core::{
//!     CacheStore, MarketDataService, RequestGate, ReqwestHttpClient, Symbol,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = MarketDataService::new(
//!         Arc::new(ReqwestHttpClient::new()),
//!         CacheStore::new(),
//!         RequestGate::default(),
//!     );
//!
//!     let symbol = Symbol::parse("AAPL").unwrap();
//!     if let Some(quote) = service.quote(&symbol).await {
//!         println!("{}: ${:.2}", quote.display_name, quote.last_price);
//!     }
//! }
//! ```
//!
//! ## Error Handling
//!
//! Public service operations never reject: every failure resolves to an
//! absence (`None`, an empty vec, or a synthesized series). Internals use
//! [`FetchError`] with a kind per failure class; rate limits are expected
//! noise and stay out of warn-level logs.

pub mod breaker;
pub mod cache;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod gate;
pub mod service;
pub mod transport;
pub mod upstream;

pub use breaker::{BreakerConfig, BreakerState, CircuitBreaker};
pub use cache::{CacheBackend, CacheError, CacheKind, CacheStore, MemoryBackend, StoredEntry};
pub use domain::{
    ChartSeries, FinancialMetric, NewsImpact, NewsItem, PricePoint, ProfileRecord, Quote,
    StockDetails, Symbol, TimeRange, UtcDateTime,
};
pub use error::{FetchError, FetchErrorKind, ValidationError};
pub use gate::{GateConfig, RequestGate};
pub use service::{format_magnitude, MarketDataService, ServiceConfig};
pub use transport::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};
