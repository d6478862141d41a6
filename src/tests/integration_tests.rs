use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use http::StatusCode;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::PersistentCache;
use crate::clock::ManualClock;
use crate::config::{Providers, QuotaConfig};
use crate::errors::{FetchError, NetworkError};
use crate::handlers::routes;
use crate::models::AppState;
use crate::quota::QuotaPolicy;
use crate::services::{FetchPipeline, RetryPolicy, SportsApi};
use crate::store::MemoryStore;
use crate::transport::{Transport, TransportResponse};
use crate::usage::UsageTracker;

/// Answers every URL containing a registered fragment with its body and
/// fails everything else with a connection error.
struct FakeProviders {
    routes: Vec<(&'static str, Value)>,
    calls: Mutex<Vec<String>>,
}

impl FakeProviders {
    fn new(routes: Vec<(&'static str, Value)>) -> Self {
        Self {
            routes,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeProviders {
    async fn get(&self, url: &str, _headers: &[(String, String)]) -> Result<TransportResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.routes.iter().find(|(fragment, _)| url.contains(fragment)) {
            Some((_, body)) => Ok(TransportResponse {
                status: StatusCode::OK,
                body: Bytes::from(body.to_string()),
            }),
            None => Err(NetworkError::Connection("connection refused".into()).into()),
        }
    }
}

async fn gateway(transport: Arc<FakeProviders>) -> Arc<AppState> {
    gateway_with_limit(transport, 150).await
}

async fn gateway_with_limit(transport: Arc<FakeProviders>, football_limit: u64) -> Arc<AppState> {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()));
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(PersistentCache::open(store.clone(), clock.clone()).await);
    let usage = Arc::new(UsageTracker::open(store, clock.clone()).await);
    let mut config = QuotaConfig::default();
    config.status_ttl = Duration::ZERO;
    config.limits.insert("football".to_string(), football_limit);
    let quota = Arc::new(QuotaPolicy::new(config, Providers::default(), usage.clone(), clock.clone()));
    let pipeline = FetchPipeline::new(cache.clone(), usage, quota.clone(), transport, Providers::default())
        .with_retry_policy(RetryPolicy { max_attempts: 1, base_delay: Duration::ZERO });
    let api = SportsApi::new(Arc::new(pipeline), "test-key", clock);
    Arc::new(AppState { api, quota, cache })
}

fn body(response: &http::Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let state = gateway(Arc::new(FakeProviders::new(vec![]))).await;
    let resp = warp::test::request().path("/health").reply(&routes(state)).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.body(), "OK");
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
}

#[tokio::test]
async fn test_matches_served_then_cached() {
    let transport = Arc::new(FakeProviders::new(vec![(
        "/api/matches/1/10/2026",
        json!({"events": [{
            "id": 7,
            "startTimestamp": 1_792_500_000,
            "homeTeam": {"id": 1, "name": "Arsenal"},
            "awayTeam": {"id": 2, "name": "Chelsea"},
            "status": {"description": "Not started", "type": "notstarted"}
        }]}),
    )]));
    let state = gateway(transport.clone()).await;
    let filter = routes(state.clone());

    let resp = warp::test::request()
        .path("/api/football/matches/1/10/2026")
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("x-data-freshness").unwrap(), "fresh");
    let json = body(&resp);
    assert_eq!(json["freshness"], "fresh");
    assert_eq!(json["data"][0]["id"], "7");
    assert_eq!(json["data"][0]["homeTeam"]["name"], "Arsenal");

    let again = warp::test::request()
        .path("/api/football/matches/1/10/2026")
        .reply(&filter)
        .await;
    assert_eq!(again.status(), 200);
    assert_eq!(transport.calls().len(), 1);

    let status = warp::test::request().path("/api/status").reply(&filter).await;
    let json = body(&status);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["quota"], "green");
    assert_eq!(json["cache"]["entries"], 1);
    assert!(json["lastDataUpdate"].is_string());
}

#[tokio::test]
async fn test_status_reports_worst_quota_level() {
    let transport = Arc::new(FakeProviders::new(vec![("/api/team/", json!({"team": {"id": 5}}))]));
    let filter = routes(gateway_with_limit(transport, 1).await);

    let resp = warp::test::request().path("/api/football/team/5").reply(&filter).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body(&resp)["data"]["venue"]["name"], "Unknown Venue");

    let json = body(&warp::test::request().path("/api/status").reply(&filter).await);
    assert_eq!(json["quota"], "red");
    let football = json["providers"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["provider"] == "football")
        .unwrap();
    assert_eq!(football["level"], "red");
}

#[tokio::test]
async fn test_list_routes_answer_empty_when_providers_fail() {
    let filter = routes(gateway(Arc::new(FakeProviders::new(vec![]))).await);
    for path in ["/api/news", "/api/ufc/markets", "/api/f1/drivers/2025", "/api/f1/results/2025/3"] {
        let resp = warp::test::request().path(path).reply(&filter).await;
        assert_eq!(resp.status(), 200, "{}", path);
        assert_eq!(resp.headers().get("x-data-freshness").unwrap(), "empty");
        assert_eq!(body(&resp)["data"], json!([]));
    }
}

#[tokio::test]
async fn test_bad_parameters_are_rejected_without_calls() {
    let transport = Arc::new(FakeProviders::new(vec![]));
    let filter = routes(gateway(transport.clone()).await);

    for path in [
        "/api/football/matches/premier/10/2026",
        "/api/football/matches/1/13/2026",
        "/api/football/team/0",
        "/api/ufc/fighters/j",
        "/api/f1/results/2025/0",
        "/api/news?limit=0",
    ] {
        let resp = warp::test::request().path(path).reply(&filter).await;
        assert_eq!(resp.status(), 400, "{}", path);
        assert!(body(&resp)["error"].as_str().unwrap().starts_with("invalid parameter"));
    }
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let filter = routes(gateway(Arc::new(FakeProviders::new(vec![]))).await);
    let resp = warp::test::request().path("/api/cricket").reply(&filter).await;
    assert_eq!(resp.status(), 404);
    assert_eq!(body(&resp), json!({"error": "Not Found"}));
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
}

#[tokio::test]
async fn test_unreachable_provider_is_bad_gateway() {
    let filter = routes(gateway(Arc::new(FakeProviders::new(vec![]))).await);
    let resp = warp::test::request().path("/api/football/team/5").reply(&filter).await;
    assert_eq!(resp.status(), 502);
    assert!(body(&resp)["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_built_in_data_when_providers_fail() {
    let filter = routes(gateway(Arc::new(FakeProviders::new(vec![]))).await);

    let resp = warp::test::request().path("/api/trending?limit=3").reply(&filter).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("x-data-freshness").unwrap(), "empty");
    assert_eq!(body(&resp)["data"].as_array().unwrap().len(), 3);

    let resp = warp::test::request().path("/api/ufc/rankings").reply(&filter).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body(&resp)["data"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_encoded_fighter_query_is_decoded() {
    let transport = Arc::new(FakeProviders::new(vec![(
        "/fighters/search",
        json!([{"first_name": "Jon", "last_name": "Jones", "nickname": "Bones"}]),
    )]));
    let filter = routes(gateway(transport.clone()).await);

    let resp = warp::test::request().path("/api/ufc/fighters/jon%20jones").reply(&filter).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body(&resp)["data"][0]["name"], "Jon Jones");
    assert!(transport.calls()[0].contains("jon%20jones"));
}
