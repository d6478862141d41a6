use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cache::PersistentCache;
use crate::config;
use crate::quota::QuotaPolicy;
use crate::services::SportsApi;

/// A cached payload. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub value: Value,
    pub created_at: i64,
    pub expires_at: i64,
}

impl CacheEntry {
    pub fn is_valid(&self, now_millis: i64) -> bool {
        now_millis < self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaLevel {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub provider: String,
    pub level: QuotaLevel,
    pub used: u64,
    pub limit: u64,
    pub percent_used: f64,
}

/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// A live cache entry or a successful network call.
    Fresh,
    /// The last-known-good shadow copy.
    Stale,
    /// A placeholder standing in for missing data.
    Empty,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<T> {
    pub data: T,
    pub freshness: Freshness,
}

impl<T> Fetched<T> {
    pub fn fresh(data: T) -> Self {
        Self { data, freshness: Freshness::Fresh }
    }

    pub fn stale(data: T) -> Self {
        Self { data, freshness: Freshness::Stale }
    }

    pub fn empty(data: T) -> Self {
        Self { data, freshness: Freshness::Empty }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            freshness: self.freshness,
        }
    }
}

/// Resource families the gateway knows how to cache and normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Matches,
    Standings,
    Team,
    UfcRankings,
    UfcFighters,
    UfcMarkets,
    UfcEvents,
    F1Races,
    F1DriverStandings,
    F1ConstructorStandings,
    F1RaceResults,
    News,
    Trending,
}

impl ResourceKind {
    /// Default cache lifetime in seconds. Matches for a month other than the
    /// current one use [`config::TTL_MATCHES_OTHER_MONTH`] instead.
    pub fn ttl_secs(&self) -> u64 {
        match self {
            Self::Matches => config::TTL_MATCHES_CURRENT_MONTH,
            Self::Standings => config::TTL_STANDINGS,
            Self::Team => config::TTL_TEAM,
            Self::UfcRankings => config::TTL_UFC_RANKINGS,
            Self::UfcFighters => config::TTL_UFC_FIGHTERS,
            Self::UfcMarkets => config::TTL_UFC_MARKETS,
            Self::UfcEvents => config::TTL_UFC_EVENTS,
            Self::F1Races => config::TTL_F1_SCHEDULE,
            Self::F1DriverStandings | Self::F1ConstructorStandings => config::TTL_F1_STANDINGS,
            Self::F1RaceResults => config::TTL_F1_RESULTS,
            Self::News => config::TTL_NEWS,
            Self::Trending => config::TTL_TRENDING,
        }
    }

    /// Live scores must not be served from the stale shadow while the
    /// provider is merely approaching its limit.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Matches)
    }

    /// Raw-shaped placeholder returned when nothing else is available.
    /// Every list resource has one; a single team profile does not.
    pub fn typed_empty(&self) -> Option<Value> {
        let empty = match self {
            Self::Matches => json!({ "events": [] }),
            Self::Standings => json!({ "standings": [] }),
            Self::UfcRankings | Self::UfcFighters => json!([]),
            Self::UfcMarkets => json!({ "specials": [] }),
            Self::UfcEvents => json!({}),
            Self::F1Races => json!({ "races": [] }),
            Self::F1DriverStandings => json!({ "drivers": [] }),
            Self::F1ConstructorStandings => json!({ "teams": [] }),
            Self::F1RaceResults => json!({ "results": [] }),
            Self::News => json!({ "articles": [] }),
            Self::Trending => json!({ "topics": [] }),
            Self::Team => return None,
        };
        Some(empty)
    }
}

/// Shared by every route.
pub struct AppState {
    pub api: SportsApi,
    pub quota: Arc<QuotaPolicy>,
    pub cache: Arc<PersistentCache>,
}
