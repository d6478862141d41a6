use super::*;
use crate::clock::ManualClock;
use crate::store::MemoryStore;
use chrono::{Duration as ChronoDuration, TimeZone};
use std::time::Duration;

async fn setup(limit: u64) -> (QuotaPolicy, Arc<UsageTracker>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()));
    let usage = Arc::new(UsageTracker::open(Arc::new(MemoryStore::new()), clock.clone()).await);
    let mut config = QuotaConfig::default();
    config.limits.insert("x".to_string(), limit);
    let policy = QuotaPolicy::new(config, Providers::default(), usage.clone(), clock.clone());
    (policy, usage, clock)
}

async fn record(usage: &UsageTracker, provider: &str, calls: u64) {
    for _ in 0..calls {
        usage.record_call(provider).await;
    }
}

#[tokio::test]
async fn test_thresholds() {
    let (policy, usage, clock) = setup(100).await;
    assert_eq!(policy.classify("x").await, QuotaLevel::Green);

    record(&usage, "x", 79).await;
    clock.advance(ChronoDuration::seconds(61));
    assert_eq!(policy.classify("x").await, QuotaLevel::Green);
    assert!(!policy.is_approaching("x").await);

    record(&usage, "x", 1).await;
    clock.advance(ChronoDuration::seconds(61));
    assert_eq!(policy.classify("x").await, QuotaLevel::Yellow);
    assert!(policy.is_approaching("x").await);
    assert!(!policy.is_exceeded("x").await);

    record(&usage, "x", 15).await;
    clock.advance(ChronoDuration::seconds(61));
    let status = policy.status("x").await;
    assert_eq!(status.level, QuotaLevel::Red);
    assert_eq!(status.used, 95);
    assert_eq!(status.limit, 100);
    assert!(policy.is_approaching("x").await);
    assert!(policy.is_exceeded("x").await);
}

#[tokio::test]
async fn test_status_is_memoized_by_time_only() {
    let (policy, usage, clock) = setup(10).await;
    assert_eq!(policy.classify("x").await, QuotaLevel::Green);

    record(&usage, "x", 10).await;
    clock.advance(ChronoDuration::seconds(59));
    assert_eq!(policy.classify("x").await, QuotaLevel::Green);

    clock.advance(ChronoDuration::seconds(1));
    assert_eq!(policy.classify("x").await, QuotaLevel::Red);
}

#[tokio::test]
async fn test_zero_status_ttl_recomputes_every_time() {
    let (mut policy, usage, _) = setup(10).await;
    policy.config.status_ttl = Duration::ZERO;
    assert_eq!(policy.classify("x").await, QuotaLevel::Green);
    record(&usage, "x", 8).await;
    assert_eq!(policy.classify("x").await, QuotaLevel::Yellow);
}

#[tokio::test]
async fn test_unknown_provider_uses_default_limit() {
    let (policy, usage, _) = setup(10).await;
    record(&usage, "mystery", 96).await;
    let status = policy.status("mystery").await;
    assert_eq!(status.limit, 100);
    assert_eq!(status.level, QuotaLevel::Red);
}

#[tokio::test]
async fn test_classification_never_downgrades_within_a_day() {
    let (policy, usage, clock) = setup(20).await;
    let mut last = QuotaLevel::Green;
    for _ in 0..25 {
        usage.record_call("x").await;
        clock.advance(ChronoDuration::seconds(61));
        let level = policy.classify("x").await;
        assert!(level >= last);
        last = level;
    }
    assert_eq!(last, QuotaLevel::Red);
}

#[tokio::test]
async fn test_report_covers_configured_providers() {
    let (policy, usage, _) = setup(10).await;
    record(&usage, "news", 170).await;

    let report = policy.report().await;
    let names: Vec<_> = report.iter().map(|s| s.provider.as_str()).collect();
    assert_eq!(names, vec!["football", "ufc", "allsports", "odds", "f1", "news"]);
    let news = report.iter().find(|s| s.provider == "news").unwrap();
    assert_eq!(news.level, QuotaLevel::Yellow);
    assert_eq!(policy.overall().await, QuotaLevel::Yellow);
}
