//! Per-provider, per-day counters of outbound API calls.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::config::{USAGE_RETENTION_DAYS, USAGE_STORAGE_KEY};
use crate::store::KvStore;


/// Day bucket (`YYYY-MM-DD`) -> provider -> calls.
pub type UsageTable = BTreeMap<String, BTreeMap<String, u64>>;

pub struct UsageTracker {
    usage: Mutex<UsageTable>,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl UsageTracker {
    /// Load persisted counters and drop buckets past the retention window.
    pub async fn open(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        let usage = match store.get(USAGE_STORAGE_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                error!("error initializing API usage tracking: {}", e);
                UsageTable::new()
            }),
            Ok(None) => UsageTable::new(),
            Err(e) => {
                error!("error initializing API usage tracking: {}", e);
                UsageTable::new()
            }
        };
        let tracker = Self {
            usage: Mutex::new(usage),
            store,
            clock,
        };
        tracker.purge_older_than(USAGE_RETENTION_DAYS).await;
        tracker
    }

    /// Count one outbound call to `provider` today. Returns today's total.
    pub async fn record_call(&self, provider: &str) -> u64 {
        let today = self.clock.today();
        let mut usage = self.usage.lock().await;
        let count = usage
            .entry(today)
            .or_default()
            .entry(provider.to_string())
            .or_insert(0);
        *count += 1;
        let count = *count;
        debug!(provider, count, "API call recorded");
        self.persist(&usage).await;
        count
    }

    /// Remove buckets older than `days` days before today. Buckets whose
    /// name is not a date are removed as well.
    pub async fn purge_older_than(&self, days: i64) -> usize {
        let cutoff = self.clock.now().date_naive() - Duration::days(days);
        let mut usage = self.usage.lock().await;
        let before = usage.len();
        usage.retain(|bucket, _| {
            NaiveDate::parse_from_str(bucket, "%Y-%m-%d")
                .map(|date| date >= cutoff)
                .unwrap_or(false)
        });
        let removed = before - usage.len();
        if removed > 0 {
            info!(removed, "purged old API usage buckets");
        }
        self.persist(&usage).await;
        removed
    }

    pub async fn used_today(&self, provider: &str) -> u64 {
        let today = self.clock.today();
        self.usage
            .lock()
            .await
            .get(&today)
            .and_then(|providers| providers.get(provider))
            .copied()
            .unwrap_or(0)
    }

    pub async fn snapshot(&self) -> UsageTable {
        self.usage.lock().await.clone()
    }

    async fn persist(&self, usage: &UsageTable) {
        let raw = match serde_json::to_string(usage) {
            Ok(raw) => raw,
            Err(e) => {
                error!("could not serialize API usage: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(USAGE_STORAGE_KEY, &raw).await {
            error!("could not save API usage: {}", e);
        }
    }
}
