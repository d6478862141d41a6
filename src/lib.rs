pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod normalize;
pub mod quota;
pub mod request;
pub mod services;
pub mod store;
pub mod transport;
pub mod usage;

pub use cache::PersistentCache;
pub use errors::{FetchError, GatewayError};
pub use models::{AppState, CacheEntry, Fetched, Freshness, QuotaLevel};
pub use quota::QuotaPolicy;
pub use services::{FetchPipeline, SportsApi};
pub use usage::UsageTracker;

#[cfg(test)]
mod tests {
    mod integration_tests;
}
