//! Behavior-driven tests for the cache store and its interaction with the
//! data-access layer.

use std::sync::Arc;

use quotedeck_core::{
    CacheBackend, CacheError, CacheKind, CacheStore, MarketDataService, MemoryBackend,
    StoredEntry, Symbol, UtcDateTime,
};

use quotedeck_tests::{fast_gate, quote_body, ScriptedTransport};

// =============================================================================
// TTL policy
// =============================================================================

#[test]
fn each_kind_carries_its_own_lifetime() {
    assert_eq!(CacheKind::Profile.ttl().as_secs(), 48 * 60 * 60);
    assert_eq!(CacheKind::Quote.ttl().as_secs(), 5 * 60);
    assert_eq!(CacheKind::Chart.ttl().as_secs(), 60 * 60);
    assert_eq!(CacheKind::News.ttl().as_secs(), 30 * 60);
}

#[test]
fn entries_older_than_their_kind_ttl_read_as_misses() {
    // Given: a chart entry written 61 minutes ago
    let backend = Arc::new(MemoryBackend::new());
    let cache = CacheStore::with_backend(backend.clone());
    backend
        .store(
            "chart_TSLA_1Y",
            StoredEntry {
                stored_at: UtcDateTime::now().unix_timestamp() - 61 * 60,
                payload: String::from("old-series"),
            },
        )
        .expect("store succeeds");

    // When/Then: the read misses, but the entry is left for lazy overwrite
    assert!(cache.get(CacheKind::Chart, "TSLA_1Y").is_none());
    assert_eq!(backend.len(), 1);
}

// =============================================================================
// Failure swallowing
// =============================================================================

struct BrokenBackend;

impl CacheBackend for BrokenBackend {
    fn load(&self, _key: &str) -> Result<Option<StoredEntry>, CacheError> {
        Err(CacheError::Unavailable(String::from("storage detached")))
    }

    fn store(&self, _key: &str, _entry: StoredEntry) -> Result<(), CacheError> {
        Err(CacheError::QuotaExceeded)
    }
}

#[tokio::test]
async fn when_storage_is_broken_fetches_still_succeed_without_caching() {
    // Given: a service whose cache backend always fails
    let transport = ScriptedTransport::new(|url| {
        assert!(url.contains("/quote"), "unexpected call: {url}");
        Ok(quotedeck_core::HttpResponse::ok_json(quote_body(
            184.2, 1.1, 0.6, 183.1,
        )))
    });
    let service = MarketDataService::new(
        transport.clone(),
        CacheStore::with_backend(Arc::new(BrokenBackend)),
        fast_gate(),
    );
    let symbol = Symbol::parse("AAPL").expect("valid");

    // When: the same quote is requested twice
    let first = service.quote(&symbol).await.expect("quote resolves");
    let second = service.quote(&symbol).await.expect("quote resolves");

    // Then: both succeed; the broken cache just means two network calls
    assert_eq!(first.last_price, 184.2);
    assert_eq!(second.last_price, 184.2);
    assert_eq!(transport.call_count(), 2);
}
