//! Classifies each provider's daily usage against its limit.
//!
//! Statuses are memoized per provider for `status_ttl`. The memo expires by
//! time only, so a burst of calls can run a little past a threshold before
//! the classification catches up.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::clock::Clock;
use crate::config::{Providers, QuotaConfig};
use crate::models::{QuotaLevel, QuotaStatus};
use crate::usage::UsageTracker;

#[cfg(test)]
mod tests;

pub struct QuotaPolicy {
    config: QuotaConfig,
    providers: Providers,
    usage: Arc<UsageTracker>,
    clock: Arc<dyn Clock>,
    memo: Mutex<HashMap<String, (DateTime<Utc>, QuotaStatus)>>,
}

impl QuotaPolicy {
    pub fn new(
        config: QuotaConfig,
        providers: Providers,
        usage: Arc<UsageTracker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            providers,
            usage,
            clock,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    pub async fn status(&self, provider: &str) -> QuotaStatus {
        let now = self.clock.now();
        let ttl = chrono::Duration::from_std(self.config.status_ttl)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let mut memo = self.memo.lock().await;
        if let Some((computed_at, status)) = memo.get(provider) {
            if now - *computed_at < ttl {
                return status.clone();
            }
        }

        let status = self.compute(provider).await;
        if status.level != QuotaLevel::Green {
            warn!(
                provider,
                used = status.used,
                limit = status.limit,
                level = ?status.level,
                "API usage above warning threshold"
            );
        }
        memo.insert(provider.to_string(), (now, status.clone()));
        status
    }

    async fn compute(&self, provider: &str) -> QuotaStatus {
        let used = self.usage.used_today(provider).await;
        let limit = self.config.limit_for(provider);
        let percent_used = used as f64 / limit as f64 * 100.0;
        QuotaStatus {
            provider: provider.to_string(),
            level: self.level_for(percent_used),
            used,
            limit,
            percent_used,
        }
    }

    fn level_for(&self, percent_used: f64) -> QuotaLevel {
        if percent_used >= self.config.emergency_pct {
            QuotaLevel::Red
        } else if percent_used >= self.config.warning_pct {
            QuotaLevel::Yellow
        } else {
            QuotaLevel::Green
        }
    }

    pub async fn classify(&self, provider: &str) -> QuotaLevel {
        self.status(provider).await.level
    }

    pub async fn is_approaching(&self, provider: &str) -> bool {
        self.classify(provider).await >= QuotaLevel::Yellow
    }

    pub async fn is_exceeded(&self, provider: &str) -> bool {
        self.classify(provider).await == QuotaLevel::Red
    }

    /// Status of every configured provider.
    pub async fn report(&self) -> Vec<QuotaStatus> {
        let mut statuses = Vec::new();
        for name in self.providers.names() {
            statuses.push(self.status(name).await);
        }
        statuses
    }

    /// Worst level across the configured providers.
    pub async fn overall(&self) -> QuotaLevel {
        self.report()
            .await
            .iter()
            .map(|s| s.level)
            .max()
            .unwrap_or(QuotaLevel::Green)
    }
}
