//! Static ticker catalog.
//!
//! The dashboard leans on a small set of mega-cap tickers and index ETFs for
//! its default views. Their profiles are seeded here as permanent records so
//! startup renders names without a single profile round trip.

use crate::domain::{ProfileRecord, Symbol};

pub const POPULAR_TICKERS: [&str; 13] = [
    "AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "NVDA", "META", "JPM", "V", "JNJ", "WMT", "PG",
    "DIS",
];

pub const MARKET_INDEX_TICKERS: [&str; 3] = ["SPY", "QQQ", "DIA"];

const SEEDED_PROFILES: [(&str, &str); 16] = [
    ("AAPL", "Apple Inc"),
    ("GOOGL", "Alphabet Inc"),
    ("MSFT", "Microsoft Corp"),
    ("AMZN", "Amazon.com Inc"),
    ("TSLA", "Tesla Inc"),
    ("NVDA", "NVIDIA Corp"),
    ("META", "Meta Platforms Inc"),
    ("JPM", "JPMorgan Chase & Co"),
    ("V", "Visa Inc"),
    ("JNJ", "Johnson & Johnson"),
    ("WMT", "Walmart Inc"),
    ("PG", "Procter & Gamble Co"),
    ("DIS", "Walt Disney Co"),
    ("SPY", "S&P 500 ETF Trust"),
    ("QQQ", "Invesco QQQ Trust"),
    ("DIA", "SPDR Dow Jones Industrial Average ETF"),
];

/// Permanent profile for a seeded ticker, if any.
pub fn seeded_profile(symbol: &Symbol) -> Option<ProfileRecord> {
    SEEDED_PROFILES
        .iter()
        .find(|(ticker, _)| *ticker == symbol.as_str())
        .map(|(_, name)| ProfileRecord::new(symbol.clone(), *name))
}

pub fn popular_symbols() -> Vec<Symbol> {
    POPULAR_TICKERS
        .iter()
        .map(|ticker| Symbol::parse(ticker).expect("catalog tickers are valid"))
        .collect()
}

pub fn market_index_symbols() -> Vec<Symbol> {
    MARKET_INDEX_TICKERS
        .iter()
        .map(|ticker| Symbol::parse(ticker).expect("catalog tickers are valid"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_popular_and_index_ticker_is_seeded() {
        for ticker in POPULAR_TICKERS.iter().chain(MARKET_INDEX_TICKERS.iter()) {
            let symbol = Symbol::parse(ticker).expect("valid");
            let profile = seeded_profile(&symbol);
            assert!(profile.is_some(), "{ticker} must be seeded");
        }
    }

    #[test]
    fn unknown_tickers_are_not_seeded() {
        let symbol = Symbol::parse("ZZZQ").expect("valid");
        assert!(seeded_profile(&symbol).is_none());
    }

    #[test]
    fn symbol_accessors_mirror_the_tables() {
        assert_eq!(popular_symbols().len(), POPULAR_TICKERS.len());
        assert!(market_index_symbols()
            .iter()
            .any(|symbol| symbol.as_str() == "SPY"));
    }

    #[test]
    fn seeded_profile_carries_display_name() {
        let symbol = Symbol::parse("AAPL").expect("valid");
        let profile = seeded_profile(&symbol).expect("seeded");
        assert_eq!(profile.display_name, "Apple Inc");
    }
}
