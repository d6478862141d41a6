//! The request/cache/fallback pipeline and the per-resource facade built
//! on top of it.

use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::cache::PersistentCache;
use crate::config::Providers;
use crate::errors::{FetchError, NetworkError, ProviderError};
use crate::models::Fetched;
use crate::quota::QuotaPolicy;
use crate::request::ApiRequest;
use crate::transport::Transport;
use crate::usage::UsageTracker;

mod coalesce;
mod retry;
pub mod sports;

pub use coalesce::KeyedLocks;
pub use retry::RetryPolicy;
pub use sports::SportsApi;


/// Runs one logical request through cache lookup, quota check, network
/// attempts with backoff, cache write and stale fallback.
pub struct FetchPipeline {
    cache: Arc<PersistentCache>,
    usage: Arc<UsageTracker>,
    quota: Arc<QuotaPolicy>,
    transport: Arc<dyn Transport>,
    providers: Providers,
    retry: RetryPolicy,
    inflight: KeyedLocks,
}

impl FetchPipeline {
    pub fn new(
        cache: Arc<PersistentCache>,
        usage: Arc<UsageTracker>,
        quota: Arc<QuotaPolicy>,
        transport: Arc<dyn Transport>,
        providers: Providers,
    ) -> Self {
        Self {
            cache,
            usage,
            quota,
            transport,
            providers,
            retry: RetryPolicy::default(),
            inflight: KeyedLocks::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &Arc<PersistentCache> {
        &self.cache
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    #[instrument(skip(self, req), fields(key = %req.cache_key))]
    pub async fn fetch(&self, req: &ApiRequest) -> Result<Fetched<Value>, FetchError> {
        let _inflight = self.inflight.acquire(&req.cache_key).await;

        if let Some(value) = self.cache.get(&req.cache_key).await {
            return Ok(Fetched::fresh(value));
        }

        let provider = self.providers.name_for_host(&req.api_host());

        if self.quota.is_exceeded(&provider).await {
            error!(provider = %provider, "API limit exceeded");
            return match self.cache.get_stale(&req.cache_key).await {
                Some(value) => Ok(Fetched::stale(value)),
                None => Err(FetchError::QuotaExceeded { provider }),
            };
        }

        if !req.critical && self.quota.is_approaching(&provider).await {
            if let Some(value) = self.cache.get_stale(&req.cache_key).await {
                warn!(provider = %provider, "approaching API limit, using stale data");
                return Ok(Fetched::stale(value));
            }
        }

        match self.fetch_remote(req, &provider).await {
            Ok(value) => {
                self.cache
                    .set(&req.cache_key, value.clone(), req.ttl_secs)
                    .await;
                self.cache.mark_updated().await;
                Ok(Fetched::fresh(value))
            }
            Err(e) => self.fall_back(req, e).await,
        }
    }

    /// Network attempts for one request. Each attempt is counted against
    /// the provider's quota. Rate limiting and transient transport failures
    /// back off and retry up to the policy's attempt cap; anything else
    /// fails at once.
    async fn fetch_remote(&self, req: &ApiRequest, provider: &str) -> Result<Value, FetchError> {
        let url = req.url();
        let mut attempt = 0;
        loop {
            self.usage.record_call(provider).await;
            info!(provider, attempt = attempt + 1, url = %url, "fetching from provider");

            let err = match self.transport.get(&url, &req.headers).await {
                Ok(resp) if resp.status.is_success() => return parse_body(&resp.body),
                Ok(resp) if resp.status == StatusCode::TOO_MANY_REQUESTS => {
                    FetchError::from(NetworkError::RateLimited)
                }
                Ok(resp) => return Err(ProviderError::Status(resp.status.as_u16()).into()),
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e),
            };

            let delay = self.retry.delay(attempt);
            warn!(
                provider,
                attempt = attempt + 1,
                delay_secs = delay.as_secs_f64(),
                "{}, backing off",
                err
            );
            tokio::time::sleep(delay).await;

            attempt += 1;
            if attempt >= self.retry.max_attempts {
                warn!(provider, attempts = attempt, "retries exhausted");
                return Err(err);
            }
        }
    }

    async fn fall_back(&self, req: &ApiRequest, err: FetchError) -> Result<Fetched<Value>, FetchError> {
        error!(url = %req.url(), "API request error: {}", err);
        if let Some(value) = self.cache.get_stale(&req.cache_key).await {
            warn!("using stale data after API error");
            return Ok(Fetched::stale(value));
        }
        match req.kind.typed_empty() {
            Some(empty) => Ok(Fetched::empty(empty)),
            None => Err(err),
        }
    }
}

fn parse_body(body: &Bytes) -> Result<Value, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ProviderError::EmptyBody.into());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => Err(ProviderError::EmptyBody.into()),
        Ok(value) => Ok(value),
        Err(e) => Err(ProviderError::InvalidJson(e.to_string()).into()),
    }
}
