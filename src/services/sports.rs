//! Per-resource operations: request building, normalization and the static
//! fallbacks some resources carry.

use chrono::Datelike;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use super::FetchPipeline;
use crate::clock::Clock;
use crate::config::{
    self, F1_CURRENT_SEASON, F1_UPCOMING_RACES, LEAGUES, PRIORITY_KEYWORDS, UFC_CHAMPIONS,
    UFC_UPCOMING_EVENTS,
};
use crate::errors::GatewayError;
use crate::models::{Freshness, Fetched, ResourceKind};
use crate::normalize::{self, fields::slugify, ufc, F1Race, Normalized, UfcEvent};
use crate::request::{cache_key, ApiRequest};

pub type ApiResult = Result<Fetched<Normalized>, GatewayError>;

/// A logical resource a caller can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// Month and year default to the current UTC month.
    Matches { league: u64, month: Option<u32>, year: Option<i32> },
    Standings { tournament: u64, season: u64 },
    Team { id: u64 },
    /// An empty weight class asks for every division.
    UfcRankings { weight_class: String },
    UfcFighters { query: String },
    UfcEvents,
    UfcMarkets,
    F1Races { season: i32 },
    F1DriverStandings { season: i32 },
    F1ConstructorStandings { season: i32 },
    F1RaceResults { season: i32, race: u64 },
    News { keyword: Option<String>, limit: u32 },
    Trending { limit: u32 },
}

#[derive(Clone)]
pub struct SportsApi {
    pipeline: Arc<FetchPipeline>,
    api_key: String,
    clock: Arc<dyn Clock>,
}

impl SportsApi {
    pub fn new(pipeline: Arc<FetchPipeline>, api_key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pipeline,
            api_key: api_key.into(),
            clock,
        }
    }

    pub fn pipeline(&self) -> &Arc<FetchPipeline> {
        &self.pipeline
    }

    /// Fetch and normalize `resource`. UFC rankings, UFC events, F1 races
    /// and trending topics answer with built-in data when the provider
    /// yields nothing usable.
    pub async fn get(&self, resource: &Resource) -> ApiResult {
        let req = self.request(resource)?;
        let result = self.pipeline.fetch(&req).await;
        let now = self.clock.now();

        let fetched = match result {
            Ok(fetched) => fetched.map(|raw| normalize::normalize(req.kind, &raw, now)),
            Err(e) => match self.static_fallback(resource) {
                Some(data) => {
                    warn!(key = %req.cache_key, "serving built-in data after error: {}", e);
                    return Ok(Fetched::empty(data));
                }
                None => return Err(e.into()),
            },
        };

        if fetched.freshness == Freshness::Empty || fetched.data.is_empty() {
            if let Some(data) = self.static_fallback(resource) {
                return Ok(Fetched::empty(data));
            }
        }
        Ok(fetched)
    }

    /// Fetch a batch concurrently, as a scheduled refresh would.
    pub async fn warm(&self, resources: &[Resource]) -> Vec<Result<Freshness, GatewayError>> {
        let results = join_all(
            resources
                .iter()
                .map(|resource| async move { self.get(resource).await.map(|f| f.freshness) }),
        )
        .await;
        let fresh = results
            .iter()
            .filter(|r| matches!(r, Ok(Freshness::Fresh)))
            .count();
        info!(requested = resources.len(), fresh, "cache warm-up finished");
        results
    }

    /// The set refreshed at startup: this month's fixtures and the table of
    /// every configured league, plus the headline UFC, F1 and trending data.
    pub fn default_warmup(&self) -> Vec<Resource> {
        let mut resources = Vec::new();
        for league in LEAGUES.iter() {
            resources.push(Resource::Matches { league: league.id, month: None, year: None });
            resources.push(Resource::Standings {
                tournament: league.tournament_id,
                season: league.season_id,
            });
        }
        resources.extend([
            Resource::UfcRankings { weight_class: String::new() },
            Resource::UfcEvents,
            Resource::F1Races { season: F1_CURRENT_SEASON },
            Resource::F1DriverStandings { season: F1_CURRENT_SEASON },
            Resource::Trending { limit: config::DEFAULT_NEWS_LIMIT },
        ]);
        resources
    }

    pub async fn football_matches(&self, league: u64, month: Option<u32>, year: Option<i32>) -> ApiResult {
        self.get(&Resource::Matches { league, month, year }).await
    }

    pub async fn league_standings(&self, tournament: u64, season: u64) -> ApiResult {
        self.get(&Resource::Standings { tournament, season }).await
    }

    pub async fn team_details(&self, id: u64) -> ApiResult {
        self.get(&Resource::Team { id }).await
    }

    pub async fn ufc_rankings(&self, weight_class: &str) -> ApiResult {
        self.get(&Resource::UfcRankings { weight_class: weight_class.to_string() }).await
    }

    pub async fn search_ufc_fighters(&self, query: &str) -> ApiResult {
        self.get(&Resource::UfcFighters { query: query.to_string() }).await
    }

    pub async fn ufc_events(&self) -> ApiResult {
        self.get(&Resource::UfcEvents).await
    }

    pub async fn ufc_markets(&self) -> ApiResult {
        self.get(&Resource::UfcMarkets).await
    }

    pub async fn f1_races(&self, season: i32) -> ApiResult {
        self.get(&Resource::F1Races { season }).await
    }

    pub async fn f1_driver_standings(&self, season: i32) -> ApiResult {
        self.get(&Resource::F1DriverStandings { season }).await
    }

    pub async fn f1_constructor_standings(&self, season: i32) -> ApiResult {
        self.get(&Resource::F1ConstructorStandings { season }).await
    }

    pub async fn f1_race_results(&self, season: i32, race: u64) -> ApiResult {
        self.get(&Resource::F1RaceResults { season, race }).await
    }

    pub async fn sports_news(&self, keyword: Option<&str>, limit: u32) -> ApiResult {
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string);
        self.get(&Resource::News { keyword, limit }).await
    }

    pub async fn trending_keywords(&self, limit: u32) -> ApiResult {
        self.get(&Resource::Trending { limit }).await
    }

    /// Outbound request for `resource`, or `InvalidParameter` when its
    /// arguments cannot address anything.
    pub fn request(&self, resource: &Resource) -> Result<ApiRequest, GatewayError> {
        let req = match resource {
            Resource::Matches { league, month, year } => {
                require_id("league", *league)?;
                let now = self.clock.now();
                let month = month.unwrap_or_else(|| now.month());
                let year = year.unwrap_or_else(|| now.year());
                if !(1..=12).contains(&month) {
                    return Err(invalid(format!("month must be between 1 and 12, got {}", month)));
                }
                let ttl = if month == now.month() && year == now.year() {
                    config::TTL_MATCHES_CURRENT_MONTH
                } else {
                    config::TTL_MATCHES_OTHER_MONTH
                };
                self.build(
                    "football",
                    ResourceKind::Matches,
                    config::FOOTBALL_MATCHES,
                    cache_key("matches", [league.to_string(), month.to_string(), year.to_string()]),
                )?
                .path_param("league", league)
                .path_param("month", month)
                .path_param("year", year)
                .ttl(ttl)
            }
            Resource::Standings { tournament, season } => {
                require_id("tournament", *tournament)?;
                require_id("season", *season)?;
                self.build(
                    "football",
                    ResourceKind::Standings,
                    config::FOOTBALL_STANDINGS,
                    cache_key("standings", [tournament, season]),
                )?
                .path_param("tournament", tournament)
                .path_param("season", season)
            }
            Resource::Team { id } => {
                require_id("team", *id)?;
                self.build("football", ResourceKind::Team, config::FOOTBALL_TEAM, cache_key("team", [id]))?
                    .path_param("team", id)
            }
            Resource::UfcRankings { weight_class } => {
                let class = slugify(weight_class);
                if class.is_empty() {
                    self.build(
                        "ufc",
                        ResourceKind::UfcRankings,
                        config::UFC_RANKINGS,
                        cache_key("ufc_rankings", ["all"]),
                    )?
                } else {
                    self.build(
                        "ufc",
                        ResourceKind::UfcRankings,
                        &format!("{}/:weight_class", config::UFC_RANKINGS),
                        cache_key("ufc_rankings", [class.as_str()]),
                    )?
                    .path_param("weight_class", &class)
                }
            }
            Resource::UfcFighters { query } => {
                let query = query.trim();
                if query.chars().count() < 2 {
                    return Err(invalid("search query must be at least 2 characters".to_string()));
                }
                self.build(
                    "ufc",
                    ResourceKind::UfcFighters,
                    config::UFC_FIGHTER_SEARCH,
                    cache_key("ufc_fighter_search", [query.to_lowercase()]),
                )?
                .path_param("query", query)
            }
            Resource::UfcEvents => self
                .build("allsports", ResourceKind::UfcEvents, config::UFC_EVENTS, "ufc_events".to_string())?
                .query_param("sport", "UFC"),
            Resource::UfcMarkets => self
                .build("odds", ResourceKind::UfcMarkets, config::UFC_MARKETS, "ufc_markets".to_string())?
                .query_param("league_ids", config::UFC_MARKET_LEAGUE_IDS)
                .query_param("sport_id", config::UFC_MARKET_SPORT_ID),
            Resource::F1Races { season } => self
                .build("f1", ResourceKind::F1Races, config::F1_RACES, cache_key("f1_races", [season]))?
                .query_param("season", season),
            Resource::F1DriverStandings { season } => self
                .build(
                    "f1",
                    ResourceKind::F1DriverStandings,
                    config::F1_DRIVER_STANDINGS,
                    cache_key("f1_driver_standings", [season]),
                )?
                .query_param("season", season),
            Resource::F1ConstructorStandings { season } => self
                .build(
                    "f1",
                    ResourceKind::F1ConstructorStandings,
                    config::F1_CONSTRUCTOR_STANDINGS,
                    cache_key("f1_constructor_standings", [season]),
                )?
                .query_param("season", season),
            Resource::F1RaceResults { season, race } => {
                require_id("race", *race)?;
                self.build(
                    "f1",
                    ResourceKind::F1RaceResults,
                    config::F1_RACE_RESULTS,
                    cache_key("f1_race_results", [season.to_string(), race.to_string()]),
                )?
                .query_param("race", race)
                .query_param("season", season)
            }
            Resource::News { keyword, limit } => {
                require_limit(*limit)?;
                let label = keyword.as_deref().unwrap_or("latest");
                let req = self
                    .build(
                        "news",
                        ResourceKind::News,
                        config::NEWS_HEADLINES,
                        cache_key("news", [label.to_string(), limit.to_string()]),
                    )?
                    .query_param("limit", limit);
                match keyword {
                    Some(q) => req.query_param("q", q),
                    None => req,
                }
            }
            Resource::Trending { limit } => {
                require_limit(*limit)?;
                self.build(
                    "news",
                    ResourceKind::Trending,
                    config::TRENDING_TOPICS,
                    cache_key("trending", [limit]),
                )?
                .query_param("limit", limit)
            }
        };
        Ok(req)
    }

    fn build(
        &self,
        provider: &str,
        kind: ResourceKind,
        endpoint: &str,
        key: String,
    ) -> Result<ApiRequest, GatewayError> {
        let provider = self
            .pipeline
            .providers()
            .get(provider)
            .ok_or_else(|| GatewayError::UnknownProvider(provider.to_string()))?;
        Ok(ApiRequest::new(provider, &self.api_key, kind, endpoint, key))
    }

    fn static_fallback(&self, resource: &Resource) -> Option<Normalized> {
        match resource {
            Resource::UfcRankings { weight_class } => {
                let wanted = slugify(weight_class);
                Some(Normalized::UfcRankings(ufc::champions_only(
                    UFC_CHAMPIONS
                        .iter()
                        .filter(|(class, _)| wanted.is_empty() || slugify(class) == wanted),
                )))
            }
            Resource::UfcEvents => Some(Normalized::UfcEvents(
                UFC_UPCOMING_EVENTS.iter().map(UfcEvent::from).collect(),
            )),
            Resource::F1Races { .. } => {
                let now = self.clock.now();
                Some(Normalized::F1Races(
                    F1_UPCOMING_RACES
                        .iter()
                        .map(|race| F1Race::scheduled(race, now))
                        .collect(),
                ))
            }
            Resource::Trending { limit } => Some(Normalized::Trending(
                PRIORITY_KEYWORDS
                    .iter()
                    .take(*limit as usize)
                    .map(|k| k.to_string())
                    .collect(),
            )),
            _ => None,
        }
    }
}

fn invalid(msg: String) -> GatewayError {
    GatewayError::InvalidParameter(msg)
}

fn require_id(name: &str, id: u64) -> Result<(), GatewayError> {
    if id == 0 {
        return Err(invalid(format!("{} id is required", name)));
    }
    Ok(())
}

fn require_limit(limit: u32) -> Result<(), GatewayError> {
    if limit == 0 {
        return Err(invalid("limit must be at least 1".to_string()));
    }
    Ok(())
}
