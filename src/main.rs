use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sports_gateway::{
    cache::spawn_sweeper,
    clock::{Clock, SystemClock},
    config::Settings,
    handlers,
    store::{FileStore, KvStore, MemoryStore},
    transport::HyperTransport,
    AppState, FetchPipeline, PersistentCache, QuotaPolicy, SportsApi, UsageTracker,
};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn open_store(settings: &Settings) -> Option<Arc<dyn KvStore>> {
    match &settings.store_dir {
        Some(dir) => match FileStore::open(dir).await {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "cannot open store");
                None
            }
        },
        None => Some(match settings.store_capacity {
            Some(capacity) => Arc::new(MemoryStore::with_capacity(capacity)),
            None => Arc::new(MemoryStore::new()),
        }),
    }
}

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    init_tracing(settings.log_json);

    let addr: SocketAddr = match settings.bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(bind = %settings.bind, error = %e, "invalid bind address");
            std::process::exit(2);
        }
    };
    let Some(store) = open_store(&settings).await else {
        std::process::exit(1);
    };
    if settings.api_key.is_empty() {
        warn!("RAPIDAPI_KEY is not set; provider calls will be rejected upstream");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(PersistentCache::open(store.clone(), clock.clone()).await);
    let usage = Arc::new(UsageTracker::open(store, clock.clone()).await);
    let quota = Arc::new(QuotaPolicy::new(
        settings.quota.clone(),
        settings.providers.clone(),
        usage.clone(),
        clock.clone(),
    ));
    let pipeline = Arc::new(FetchPipeline::new(
        cache.clone(),
        usage,
        quota.clone(),
        Arc::new(HyperTransport::new(settings.request_timeout)),
        settings.providers.clone(),
    ));
    let api = SportsApi::new(pipeline, settings.api_key.clone(), clock);

    spawn_sweeper(cache.clone(), settings.sweep_interval);
    if settings.warm_on_start {
        let api = api.clone();
        tokio::spawn(async move {
            let resources = api.default_warmup();
            api.warm(&resources).await;
        });
    }

    let state = Arc::new(AppState { api, quota, cache });
    info!(%addr, entries = state.cache.len().await, "sports gateway listening");
    warp::serve(handlers::routes(state)).run(addr).await;
}
