//! HTTP protocol against the admin server.
//!
//! # Endpoints
//! ```text
//! GET  /configs/fetch     → full data set for the requested groups
//! POST /configs/listener  → long poll; returns the groups whose content
//!                           differs from the digests in the request body
//! ```
//!
//! # Design Decisions
//! - One shared reqwest client; connect timeout applied at client build time
//! - Send failures are transport errors; decode failures and non-200
//!   envelope codes are protocol errors

pub mod fetcher;
pub mod listener;
pub mod types;

pub use fetcher::ConfigFetcher;
pub use listener::ChangeListener;

/// Join the admin base URL with an endpoint path.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
