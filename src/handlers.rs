use hyper::header::{HeaderName, HeaderValue};
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};
use warp::{Filter, Rejection, Reply};

use crate::config::{DEFAULT_NEWS_LIMIT, FRESHNESS_HEADER};
use crate::errors::{FetchError, GatewayError, NetworkError};
use crate::middleware::add_cors_headers;
use crate::models::AppState;
use crate::services::sports::ApiResult;

#[cfg(test)]
mod tests;

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

/// Every route, with JSON error bodies, CORS headers and request logging.
pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path!("health").and(warp::get()).map(|| "OK");

    let status = warp::path!("api" / "status")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(api_status);

    let football = warp::path!("api" / "football" / "matches" / String / String / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(football_matches)
        .or(warp::path!("api" / "football" / "standings" / String / String)
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(league_standings))
        .or(warp::path!("api" / "football" / "team" / String)
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(team_details));

    let ufc = warp::path!("api" / "ufc" / "rankings")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(|state: Arc<AppState>| ufc_rankings(String::new(), state))
        .or(warp::path!("api" / "ufc" / "rankings" / String)
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(ufc_rankings))
        .or(warp::path!("api" / "ufc" / "fighters" / String)
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(ufc_fighters))
        .or(warp::path!("api" / "ufc" / "events")
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(ufc_events))
        .or(warp::path!("api" / "ufc" / "markets")
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(ufc_markets));

    let f1 = warp::path!("api" / "f1" / "races" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(f1_races)
        .or(warp::path!("api" / "f1" / "drivers" / String)
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(f1_drivers))
        .or(warp::path!("api" / "f1" / "constructors" / String)
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(f1_constructors))
        .or(warp::path!("api" / "f1" / "results" / String / String)
            .and(warp::get())
            .and(with_state(state.clone()))
            .and_then(f1_results));

    let news = warp::path!("api" / "news")
        .and(warp::get())
        .and(warp::query::<NewsQuery>())
        .and(with_state(state.clone()))
        .and_then(sports_news)
        .or(warp::path!("api" / "trending")
            .and(warp::get())
            .and(warp::query::<LimitQuery>())
            .and(with_state(state))
            .and_then(trending));

    health
        .or(status)
        .or(football)
        .or(ufc)
        .or(f1)
        .or(news)
        .recover(handle_rejection)
        .map(|reply| {
            let mut response = warp::Reply::into_response(reply);
            add_cors_headers(response.headers_mut());
            response
        })
        .with(warp::log::custom(|info| {
            info!(
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                elapsed_ms = info.elapsed().as_millis() as u64,
                "request served"
            );
        }))
}

fn with_state(state: Arc<AppState>) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn param<T: FromStr>(name: &str, raw: &str) -> Result<T, Rejection> {
    raw.parse().map_err(|_| {
        warp::reject::custom(GatewayError::InvalidParameter(format!(
            "{} must be a number, got {:?}",
            name, raw
        )))
    })
}

fn text_param(name: &str, raw: &str) -> Result<String, Rejection> {
    urlencoding::decode(raw).map(|s| s.into_owned()).map_err(|_| {
        warp::reject::custom(GatewayError::InvalidParameter(format!("{} is not valid UTF-8", name)))
    })
}

/// `{data, freshness}` body plus the freshness header.
fn respond(result: ApiResult) -> Result<warp::reply::Response, Rejection> {
    let fetched = result.map_err(warp::reject::custom)?;
    let mut response = warp::reply::json(&fetched).into_response();
    response.headers_mut().insert(
        HeaderName::from_static(FRESHNESS_HEADER),
        HeaderValue::from_static(fetched.freshness.as_str()),
    );
    Ok(response)
}

async fn api_status(state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let providers = state.quota.report().await;
    let body = json!({
        "status": "ok",
        "quota": state.quota.overall().await,
        "providers": providers,
        "cache": {
            "entries": state.cache.len().await,
            "staleKeys": state.cache.stale_keys().await.len(),
        },
        "lastDataUpdate": state.cache.last_updated().await,
    });
    Ok(warp::reply::json(&body).into_response())
}

async fn football_matches(
    league: String,
    month: String,
    year: String,
    state: Arc<AppState>,
) -> Result<warp::reply::Response, Rejection> {
    let league = param("league", &league)?;
    let month = param("month", &month)?;
    let year = param("year", &year)?;
    respond(state.api.football_matches(league, Some(month), Some(year)).await)
}

async fn league_standings(
    tournament: String,
    season: String,
    state: Arc<AppState>,
) -> Result<warp::reply::Response, Rejection> {
    let tournament = param("tournament", &tournament)?;
    let season = param("season", &season)?;
    respond(state.api.league_standings(tournament, season).await)
}

async fn team_details(id: String, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let id = param("team", &id)?;
    respond(state.api.team_details(id).await)
}

async fn ufc_rankings(weight_class: String, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let weight_class = text_param("weight class", &weight_class)?;
    respond(state.api.ufc_rankings(&weight_class).await)
}

async fn ufc_fighters(query: String, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let query = text_param("query", &query)?;
    respond(state.api.search_ufc_fighters(&query).await)
}

async fn ufc_events(state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    respond(state.api.ufc_events().await)
}

async fn ufc_markets(state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    respond(state.api.ufc_markets().await)
}

async fn f1_races(season: String, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let season = param("season", &season)?;
    respond(state.api.f1_races(season).await)
}

async fn f1_drivers(season: String, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let season = param("season", &season)?;
    respond(state.api.f1_driver_standings(season).await)
}

async fn f1_constructors(season: String, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let season = param("season", &season)?;
    respond(state.api.f1_constructor_standings(season).await)
}

async fn f1_results(
    season: String,
    race: String,
    state: Arc<AppState>,
) -> Result<warp::reply::Response, Rejection> {
    let season = param("season", &season)?;
    let race = param("race", &race)?;
    respond(state.api.f1_race_results(season, race).await)
}

async fn sports_news(query: NewsQuery, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let limit = query.limit.unwrap_or(DEFAULT_NEWS_LIMIT);
    respond(state.api.sports_news(query.q.as_deref(), limit).await)
}

async fn trending(query: LimitQuery, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let limit = query.limit.unwrap_or(DEFAULT_NEWS_LIMIT);
    respond(state.api.trending_keywords(limit).await)
}

/// HTTP status for a failed lookup.
pub fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        GatewayError::UnknownProvider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        GatewayError::Fetch(FetchError::QuotaExceeded { .. }) => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::Fetch(FetchError::Network(NetworkError::Timeout)) => StatusCode::GATEWAY_TIMEOUT,
        GatewayError::Fetch(_) => StatusCode::BAD_GATEWAY,
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = err.find::<GatewayError>() {
        (status_for(e), e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else {
        error!("unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "error": message })),
        code,
    ))
}
