//! Same-origin proxy for the quotedeck dashboard.
//!
//! Forwards `GET /api/<path>` to the upstream market-data API, injecting the
//! secret token server-side so it never reaches a browser. Successful
//! responses carry short shared-cache headers so an intermediary CDN can
//! absorb repeated hits.

pub mod proxy;
pub mod settings;

pub use proxy::{build_upstream_url, router, PathSpec, ProxyState};
pub use settings::{ConfigError, Settings};
