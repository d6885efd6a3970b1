//! Behavior-driven tests for the data-access layer.
//!
//! These verify HOW the service composes cache, gate and transport: cache
//! hits suppress network calls, failures resolve to absence, and every
//! operation honors the contracts consumers rely on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use quotedeck_core::{
    BreakerConfig, BreakerState, CacheBackend, CacheStore, CircuitBreaker, HttpError,
    HttpResponse, MarketDataService, MemoryBackend, NewsImpact, StoredEntry, Symbol, UtcDateTime,
};
use quotedeck_tests::{fast_gate, quote_body, service_with, ScriptedTransport};

fn symbol(s: &str) -> Symbol {
    Symbol::parse(s).expect("valid symbol")
}

// =============================================================================
// Quote: caching and absence
// =============================================================================

#[tokio::test]
async fn when_a_quote_is_requested_twice_within_ttl_only_one_network_call_is_made() {
    // Given: a transport that serves one healthy quote
    let transport = ScriptedTransport::new(|url| {
        assert!(url.contains("/quote"), "unexpected call: {url}");
        Ok(HttpResponse::ok_json(quote_body(184.2, 1.1, 0.6, 183.1)))
    });
    let service = service_with(transport.clone());
    let aapl = symbol("AAPL");

    // When: the same quote is requested twice
    let first = service.quote(&aapl).await.expect("quote resolves");
    let second = service.quote(&aapl).await.expect("quote resolves");

    // Then: one fetch, identical records, seeded display name (no profile call)
    assert_eq!(transport.call_count(), 1);
    assert_eq!(first, second);
    assert_eq!(first.display_name, "Apple Inc");
    assert_eq!(first.last_price, 184.2);
}

#[tokio::test]
async fn when_the_quote_has_no_meaningful_price_data_the_result_is_absent() {
    // Given: the upstream returns a zero-valued quote
    let transport = ScriptedTransport::new(|url| {
        assert!(url.contains("/quote"), "unexpected call: {url}");
        Ok(HttpResponse::ok_json(quote_body(0.0, 0.0, 0.0, 0.0)))
    });
    let service = service_with(transport.clone());

    // When: the quote is requested
    let result = service.quote(&symbol("AAPL")).await;

    // Then: absent, not a zero-priced record, and no profile fetch happened
    assert!(result.is_none());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn when_only_the_previous_close_is_set_the_quote_uses_it() {
    // Pre-market: current price zero, previous close live
    let transport = ScriptedTransport::new(|url| {
        if url.contains("/stock/profile2") {
            return Ok(HttpResponse::ok_json(r#"{"name":"Xylo Corp","ticker":"XYLO"}"#));
        }
        Ok(HttpResponse::ok_json(quote_body(0.0, 0.0, 0.0, 52.5)))
    });
    let service = service_with(transport.clone());

    let quote = service.quote(&symbol("XYLO")).await.expect("quote resolves");
    assert_eq!(quote.last_price, 52.5);
    assert_eq!(quote.display_name, "Xylo Corp");
}

// =============================================================================
// Profile resolution
// =============================================================================

#[tokio::test]
async fn when_the_profile_fetch_fails_the_symbol_text_becomes_the_display_name() {
    // Given: quotes work but profiles are down
    let transport = ScriptedTransport::new(|url| {
        if url.contains("/stock/profile2") {
            return Err(HttpError::new("connection reset"));
        }
        Ok(HttpResponse::ok_json(quote_body(12.3, -0.2, -1.6, 12.5)))
    });
    let service = service_with(transport.clone());

    // When: a quote for an unseeded symbol is requested
    let quote = service.quote(&symbol("XYZW")).await.expect("quote resolves");

    // Then: the whole quote does not fail; the raw symbol stands in
    assert_eq!(quote.display_name, "XYZW");
    assert_eq!(transport.calls_matching("/stock/profile2"), 1);
}

#[tokio::test]
async fn profiles_outlive_quotes_in_the_cache() {
    // Given: an unseeded symbol whose profile is fetched once
    let transport = ScriptedTransport::new(|url| {
        if url.contains("/stock/profile2") {
            return Ok(HttpResponse::ok_json(r#"{"name":"Xylo Corp","ticker":"XYLO"}"#));
        }
        Ok(HttpResponse::ok_json(quote_body(52.5, 0.5, 0.96, 52.0)))
    });
    let backend = Arc::new(MemoryBackend::new());
    let service = MarketDataService::new(
        transport.clone(),
        CacheStore::with_backend(backend.clone()),
        fast_gate(),
    );
    let xylo = symbol("XYLO");

    let quote = service.quote(&xylo).await.expect("quote resolves");
    assert_eq!(quote.display_name, "Xylo Corp");

    // When: the quote entry ages past its 5-minute TTL (the 48-hour profile
    // entry stays fresh) and the symbol is requested again
    backend
        .store(
            "quote_XYLO",
            StoredEntry {
                stored_at: UtcDateTime::now().unix_timestamp() - 400,
                payload: String::from("aged out"),
            },
        )
        .expect("store succeeds");
    let refreshed = service.quote(&xylo).await.expect("quote resolves");

    // Then: the quote was refetched but the profile came from cache
    assert_eq!(refreshed.display_name, "Xylo Corp");
    assert_eq!(transport.calls_matching("/quote"), 2);
    assert_eq!(transport.calls_matching("/stock/profile2"), 1);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn searching_with_an_empty_query_never_touches_the_transport() {
    let transport = ScriptedTransport::new(|url| {
        panic!("no call expected, got {url}");
    });
    let service = service_with(transport.clone());

    assert!(service.search("").await.is_empty());
    assert!(service.search("   ").await.is_empty());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn search_excludes_composite_listings_and_caps_candidates() {
    // Given: a search result mixing plain and composite symbols
    let transport = ScriptedTransport::new(|url| {
        if url.contains("/search") {
            return Ok(HttpResponse::ok_json(
                r#"{"count":5,"result":[
                    {"symbol":"AAPL","description":"APPLE INC"},
                    {"symbol":"BRK.A","description":"BERKSHIRE HATHAWAY"},
                    {"symbol":"MSFT","description":"MICROSOFT CORP"},
                    {"symbol":"TSLA","description":"TESLA INC"},
                    {"symbol":"NVDA","description":"NVIDIA CORP"}
                ]}"#,
            ));
        }
        Ok(HttpResponse::ok_json(quote_body(100.0, 1.0, 1.0, 99.0)))
    });
    let service = service_with(transport.clone());

    // When: the search resolves
    let quotes = service.search("a").await;

    // Then: composite BRK.A is excluded, the cap keeps the first three, and
    // candidates resolve in order
    let tickers: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(tickers, vec!["AAPL", "MSFT", "TSLA"]);
    assert_eq!(transport.calls_matching("BRK"), 0);
    assert_eq!(transport.calls_matching("NVDA"), 0);
}

// =============================================================================
// Batch quotes
// =============================================================================

#[tokio::test]
async fn batch_quotes_resolve_sequentially_in_input_order() {
    let transport = ScriptedTransport::new(|url| {
        assert!(url.contains("/quote"), "unexpected call: {url}");
        Ok(HttpResponse::ok_json(quote_body(55.0, 0.0, 0.0, 55.0)))
    });
    let service = service_with(transport.clone());
    let symbols = vec![symbol("MSFT"), symbol("AAPL"), symbol("SPY")];

    let quotes = service.batch_quotes(&symbols).await;

    let tickers: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(tickers, vec!["MSFT", "AAPL", "SPY"]);

    // Dispatch order follows input order
    let calls = transport.calls();
    assert!(calls[0].contains("MSFT"));
    assert!(calls[1].contains("AAPL"));
    assert!(calls[2].contains("SPY"));
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn a_rate_limited_cycle_resolves_absent_and_the_next_cycle_recovers() {
    // Given: the first quote call hits the quota, the second succeeds
    let attempts = Arc::new(AtomicUsize::new(0));
    let transport = {
        let attempts = attempts.clone();
        ScriptedTransport::new(move |_url| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(HttpResponse::with_status(429, "API limit reached"))
            } else {
                Ok(HttpResponse::ok_json(quote_body(184.2, 1.1, 0.6, 183.1)))
            }
        })
    };
    let service = service_with(transport.clone());
    let aapl = symbol("AAPL");

    // When/Then: first cycle absent, second cycle resolves normally
    assert!(service.quote(&aapl).await.is_none());
    let quote = service.quote(&aapl).await.expect("second cycle resolves");
    assert_eq!(quote.last_price, 184.2);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn upstream_errors_resolve_to_absence_not_panics() {
    let transport = ScriptedTransport::new(|_url| {
        Ok(HttpResponse::with_status(500, "internal error"))
    });
    let service = service_with(transport.clone());

    assert!(service.quote(&symbol("AAPL")).await.is_none());
    assert!(service.financial_summary(&symbol("AAPL")).await.is_empty());
    assert!(service.news(Some(&symbol("AAPL"))).await.is_empty());
}

#[tokio::test]
async fn repeated_hard_failures_open_the_circuit_and_stop_network_calls() {
    // Given: an upstream that always fails hard, behind a two-strike breaker
    let transport = ScriptedTransport::new(|_url| {
        Ok(HttpResponse::with_status(500, "internal error"))
    });
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
        failure_threshold: 2,
        cooldown: std::time::Duration::from_secs(60),
    }));
    let service = service_with(transport.clone()).with_breaker(breaker.clone());
    let aapl = symbol("AAPL");

    // When: consecutive failures reach the threshold
    assert!(service.quote(&aapl).await.is_none());
    assert!(service.quote(&aapl).await.is_none());
    assert_eq!(transport.call_count(), 2);
    assert_eq!(breaker.state(), BreakerState::Open);

    // Then: the next fetch fails fast without reaching the transport
    assert!(service.quote(&aapl).await.is_none());
    assert_eq!(transport.call_count(), 2);
}

// =============================================================================
// Financials
// =============================================================================

#[tokio::test]
async fn financial_summary_projects_and_formats_the_fixed_field_set() {
    let transport = ScriptedTransport::new(|url| {
        assert!(url.contains("/stock/metric"), "unexpected call: {url}");
        Ok(HttpResponse::ok_json(
            r#"{"metric":{"marketCapitalization":2500000000000.0,"52WeekHigh":199.62,"52WeekLow":124.17,"peNormalizedAnnual":31.2,"beta":1.29}}"#,
        ))
    });
    let service = service_with(transport.clone());

    let metrics = service.financial_summary(&symbol("AAPL")).await;

    let rendered: Vec<(&str, &str)> = metrics
        .iter()
        .map(|m| (m.label.as_str(), m.value.as_str()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("Market Cap", "2.50T"),
            ("52W High", "$199.62"),
            ("52W Low", "$124.17"),
            ("P/E Ratio", "31.20"),
        ]
    );
}

#[tokio::test]
async fn missing_numeric_fields_render_the_na_sentinel() {
    let transport = ScriptedTransport::new(|_url| {
        Ok(HttpResponse::ok_json(r#"{"metric":{}}"#))
    });
    let service = service_with(transport.clone());

    let metrics = service.financial_summary(&symbol("AAPL")).await;

    assert_eq!(metrics.len(), 4);
    for metric in &metrics {
        assert_eq!(metric.value, "N/A", "{} should be N/A", metric.label);
    }
}

// =============================================================================
// News
// =============================================================================

fn news_article(headline: &str, datetime: i64) -> String {
    format!(
        r#"{{"headline":"{headline}","source":"Newswire","datetime":{datetime},"url":"https://news.example/{datetime}"}}"#
    )
}

#[tokio::test]
async fn company_news_is_capped_classified_and_cached() {
    // Given: twelve articles with telling headlines
    let transport = ScriptedTransport::new(|url| {
        assert!(url.contains("/company-news"), "unexpected call: {url}");
        let mut articles = vec![
            news_article("Acme beats earnings expectations", 1_700_000_300),
            news_article("Analyst upgrade lifts Acme", 1_700_000_200),
            news_article("Acme opens a new office", 1_700_000_100),
        ];
        for index in 0..9 {
            articles.push(news_article("Routine filing", 1_700_000_000 - index));
        }
        Ok(HttpResponse::ok_json(format!("[{}]", articles.join(","))))
    });
    let service = service_with(transport.clone());
    let aapl = symbol("AAPL");

    // When: news is requested twice
    let items = service.news(Some(&aapl)).await;
    let again = service.news(Some(&aapl)).await;

    // Then: capped at ten, classified per headline, served from cache after
    assert_eq!(items.len(), 10);
    assert_eq!(items[0].impact, NewsImpact::High);
    assert_eq!(items[1].impact, NewsImpact::Medium);
    assert_eq!(items[2].impact, NewsImpact::Low);
    assert_eq!(items, again);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn the_global_feed_defaults_neutral_headlines_to_medium() {
    let transport = ScriptedTransport::new(|url| {
        assert!(url.contains("/news?category=general"), "unexpected call: {url}");
        Ok(HttpResponse::ok_json(format!(
            "[{}]",
            news_article("Markets drift sideways", 1_700_000_000)
        )))
    });
    let service = service_with(transport.clone());

    let items = service.news(None).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].impact, NewsImpact::Medium);
    assert_eq!(items[0].source, "Newswire");
}
