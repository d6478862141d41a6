use lazy_static::lazy_static;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:3030";
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// Backend keys
pub const CACHE_STORAGE_KEY: &str = "sportsDataCache";
pub const USAGE_STORAGE_KEY: &str = "apiDailyUsage";
pub const LAST_UPDATE_KEY: &str = "lastDataUpdate";
pub const STALE_PREFIX: &str = "stale_";

pub const EVICT_BATCH: usize = 10; // entries dropped when the store is full
pub const SWEEP_INTERVAL_SECS: u64 = 3600;
pub const USAGE_RETENTION_DAYS: i64 = 7;

pub const DEFAULT_DAILY_LIMIT: u64 = 100;
pub const WARNING_THRESHOLD_PCT: f64 = 80.0;
pub const EMERGENCY_THRESHOLD_PCT: f64 = 95.0;
pub const STATUS_TTL_SECS: u64 = 60;

pub const RETRY_MAX_ATTEMPTS: u32 = 3;

// Cache lifetimes in seconds
pub const TTL_MATCHES_CURRENT_MONTH: u64 = 21_600;
pub const TTL_MATCHES_OTHER_MONTH: u64 = 43_200;
pub const TTL_STANDINGS: u64 = 43_200;
pub const TTL_TEAM: u64 = 604_800;
pub const TTL_UFC_RANKINGS: u64 = 86_400;
pub const TTL_UFC_FIGHTERS: u64 = 604_800;
pub const TTL_UFC_MARKETS: u64 = 3_600;
pub const TTL_UFC_EVENTS: u64 = 43_200;
pub const TTL_F1_SCHEDULE: u64 = 86_400;
pub const TTL_F1_STANDINGS: u64 = 43_200;
pub const TTL_F1_RESULTS: u64 = 604_800;
pub const TTL_NEWS: u64 = 7_200;
pub const TTL_TRENDING: u64 = 3_600;

pub const API_KEY_HEADER: &str = "X-RapidAPI-Key";
pub const API_HOST_HEADER: &str = "X-RapidAPI-Host";
pub const FRESHNESS_HEADER: &str = "x-data-freshness";

// Endpoints, relative to the owning provider's base URL
pub const FOOTBALL_MATCHES: &str = "/api/matches/:league/:month/:year";
pub const FOOTBALL_STANDINGS: &str = "/api/tournament/:tournament/season/:season/standings/total";
pub const FOOTBALL_TEAM: &str = "/api/team/:team";
pub const UFC_RANKINGS: &str = "/rankings";
pub const UFC_FIGHTER_SEARCH: &str = "/fighters/search/:query";
pub const UFC_EVENTS: &str = "/api/mma/tournaments";
pub const UFC_MARKETS: &str = "/kit/v1/special-markets";
pub const F1_RACES: &str = "/races";
pub const F1_DRIVER_STANDINGS: &str = "/driver-standings";
pub const F1_CONSTRUCTOR_STANDINGS: &str = "/constructor-standings";
pub const F1_RACE_RESULTS: &str = "/race-results";
pub const NEWS_HEADLINES: &str = "/headlines";
pub const TRENDING_TOPICS: &str = "/trending";

pub const UFC_MARKET_CATEGORY: &str = "UFC General Props";
pub const UFC_MARKET_LEAGUE_IDS: &str = "1624";
pub const UFC_MARKET_SPORT_ID: &str = "8";
pub const F1_CURRENT_SEASON: i32 = 2025;
pub const DEFAULT_NEWS_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub host: String,
    pub base_url: String,
    pub daily_limit: Option<u64>,
}

impl ProviderConfig {
    fn rapidapi(name: &str, host: &str, daily_limit: Option<u64>) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            base_url: format!("https://{}", host),
            daily_limit,
        }
    }
}

pub struct League {
    pub id: u64,
    pub name: &'static str,
    pub tournament_id: u64,
    pub season_id: u64,
}

pub struct StaticEvent {
    pub id: &'static str,
    pub name: &'static str,
    pub date: &'static str,
    pub location: &'static str,
    pub main_event: &'static str,
}

pub struct StaticRace {
    pub name: &'static str,
    pub circuit: &'static str,
    pub date: &'static str,
}

pub struct F1Team {
    pub name: &'static str,
    pub short_name: &'static str,
    pub color: &'static str,
}

lazy_static! {
    pub static ref DEFAULT_PROVIDERS: Vec<ProviderConfig> = vec![
        ProviderConfig::rapidapi("football", "api-football-v1.p.rapidapi.com", Some(150)),
        ProviderConfig::rapidapi("ufc", "ufc-fighters.p.rapidapi.com", Some(100)),
        ProviderConfig::rapidapi("allsports", "allsportsapi2.p.rapidapi.com", None),
        ProviderConfig::rapidapi("odds", "pinnacle-odds.p.rapidapi.com", None),
        ProviderConfig::rapidapi("f1", "formula-1-standings.p.rapidapi.com", Some(100)),
        ProviderConfig::rapidapi("news", "sports-news-api.p.rapidapi.com", Some(200)),
    ];

    /// Leagues refreshed by the startup warm-up.
    pub static ref LEAGUES: Vec<League> = vec![
        League { id: 1, name: "Premier League", tournament_id: 1, season_id: 2025 },
        League { id: 2, name: "La Liga", tournament_id: 2, season_id: 2025 },
        League { id: 3, name: "Serie A", tournament_id: 3, season_id: 2025 },
        League { id: 4, name: "Bundesliga", tournament_id: 4, season_id: 2025 },
        League { id: 5, name: "Ligue 1", tournament_id: 5, season_id: 2025 },
        League { id: 6, name: "Champions League", tournament_id: 6, season_id: 2025 },
    ];

    /// Champions served when rankings cannot be fetched.
    pub static ref UFC_CHAMPIONS: Vec<(&'static str, &'static str)> = vec![
        ("Heavyweight", "Jon Jones"),
        ("Light Heavyweight", "Alex Pereira"),
        ("Middleweight", "Dricus Du Plessis"),
        ("Welterweight", "Leon Edwards"),
        ("Lightweight", "Islam Makhachev"),
        ("Featherweight", "Ilia Topuria"),
        ("Bantamweight", "Sean O'Malley"),
        ("Flyweight", "Alexandre Pantoja"),
        ("Women's Strawweight", "Zhang Weili"),
        ("Women's Flyweight", "Alexa Grasso"),
        ("Women's Bantamweight", "Julianna Peña"),
        ("Women's Featherweight", "Amanda Nunes"),
    ];

    pub static ref UFC_UPCOMING_EVENTS: Vec<StaticEvent> = vec![
        StaticEvent {
            id: "ufc-307",
            name: "UFC 307: Jones vs Aspinall",
            date: "2025-03-22T22:00:00Z",
            location: "T-Mobile Arena, Las Vegas, NV",
            main_event: "Jon Jones vs Tom Aspinall",
        },
        StaticEvent {
            id: "ufc-fight-night-whittaker-costa",
            name: "UFC Fight Night: Whittaker vs Costa",
            date: "2025-04-05T20:00:00Z",
            location: "UFC APEX, Las Vegas, NV",
            main_event: "Robert Whittaker vs Paulo Costa",
        },
    ];

    pub static ref F1_UPCOMING_RACES: Vec<StaticRace> = vec![
        StaticRace {
            name: "Monaco Grand Prix",
            circuit: "Circuit de Monaco, Monte Carlo",
            date: "2025-03-25T15:00:00Z",
        },
        StaticRace {
            name: "British Grand Prix",
            circuit: "Silverstone Circuit, Silverstone",
            date: "2025-07-06T15:00:00Z",
        },
    ];

    pub static ref F1_TEAMS: Vec<F1Team> = vec![
        F1Team { name: "Red Bull Racing", short_name: "RBR", color: "#0600EF" },
        F1Team { name: "Ferrari", short_name: "FER", color: "#DC0000" },
        F1Team { name: "Mercedes", short_name: "MER", color: "#00D2BE" },
        F1Team { name: "McLaren", short_name: "MCL", color: "#FF8700" },
        F1Team { name: "Aston Martin", short_name: "AST", color: "#006F62" },
        F1Team { name: "Alpine", short_name: "ALP", color: "#0090FF" },
        F1Team { name: "Haas F1 Team", short_name: "HAA", color: "#FFFFFF" },
        F1Team { name: "Alfa Romeo", short_name: "ALF", color: "#900000" },
        F1Team { name: "Williams", short_name: "WIL", color: "#0082FA" },
        F1Team { name: "AlphaTauri", short_name: "APH", color: "#2B4562" },
    ];

    /// Topics served when the trending endpoint is unavailable.
    pub static ref PRIORITY_KEYWORDS: Vec<&'static str> = vec![
        "Premier League",
        "Champions League",
        "UFC",
        "Formula 1",
        "Boxing",
        "La Liga",
        "Transfer News",
        "Grand Prix",
    ];
}

#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub default_daily_limit: u64,
    pub warning_pct: f64,
    pub emergency_pct: f64,
    pub status_ttl: Duration,
    pub limits: HashMap<String, u64>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_daily_limit: DEFAULT_DAILY_LIMIT,
            warning_pct: WARNING_THRESHOLD_PCT,
            emergency_pct: EMERGENCY_THRESHOLD_PCT,
            status_ttl: Duration::from_secs(STATUS_TTL_SECS),
            limits: DEFAULT_PROVIDERS
                .iter()
                .filter_map(|p| p.daily_limit.map(|limit| (p.name.clone(), limit)))
                .collect(),
        }
    }
}

impl QuotaConfig {
    pub fn limit_for(&self, provider: &str) -> u64 {
        self.limits
            .get(provider)
            .copied()
            .unwrap_or(self.default_daily_limit)
            .max(1)
    }
}

/// Known upstream providers, looked up by name or by API host.
#[derive(Debug, Clone)]
pub struct Providers {
    providers: Vec<ProviderConfig>,
}

impl Default for Providers {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDERS.clone())
    }
}

impl Providers {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self { providers }
    }

    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name.as_str())
    }

    /// Provider name for an API host: the configured provider serving that
    /// host, otherwise the host's first DNS label.
    pub fn name_for_host(&self, host: &str) -> String {
        let host = host.trim().to_ascii_lowercase();
        if let Some(p) = self.providers.iter().find(|p| p.host.eq_ignore_ascii_case(&host)) {
            return p.name.clone();
        }
        match host.split('.').next() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub store_dir: Option<PathBuf>,
    pub store_capacity: Option<usize>,
    pub api_key: String,
    pub providers: Providers,
    pub quota: QuotaConfig,
    pub request_timeout: Duration,
    pub sweep_interval: Duration,
    pub warm_on_start: bool,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            store_dir: None,
            store_capacity: None,
            api_key: String::new(),
            providers: Providers::default(),
            quota: QuotaConfig::default(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            sweep_interval: Duration::from_secs(SWEEP_INTERVAL_SECS),
            warm_on_start: false,
            log_json: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut quota = defaults.quota.clone();
        quota.default_daily_limit = env_u64("GATEWAY_DAILY_LIMIT", quota.default_daily_limit);
        quota.warning_pct = env_f64("GATEWAY_WARNING_PCT", quota.warning_pct);
        quota.emergency_pct = env_f64("GATEWAY_EMERGENCY_PCT", quota.emergency_pct);
        quota.status_ttl = Duration::from_secs(env_u64("GATEWAY_STATUS_TTL_SECS", STATUS_TTL_SECS));
        for (provider, limit) in env_map("GATEWAY_LIMITS") {
            if let Ok(limit) = limit.parse::<u64>() {
                quota.limits.insert(provider, limit);
            }
        }

        Self {
            bind: env::var("GATEWAY_BIND").unwrap_or(defaults.bind),
            store_dir: env::var("GATEWAY_STORE_DIR").ok().map(PathBuf::from),
            store_capacity: env::var("GATEWAY_STORE_CAPACITY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
            api_key: env::var("RAPIDAPI_KEY").unwrap_or_default(),
            providers: defaults.providers,
            quota,
            request_timeout: Duration::from_secs(env_u64(
                "GATEWAY_REQUEST_TIMEOUT_SECS",
                REQUEST_TIMEOUT_SECS,
            )),
            sweep_interval: Duration::from_secs(env_u64(
                "GATEWAY_SWEEP_INTERVAL_SECS",
                SWEEP_INTERVAL_SECS,
            )),
            warm_on_start: env_bool("GATEWAY_WARM_ON_START", false),
            log_json: env_bool("GATEWAY_LOG_JSON", false),
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_map(name: &str) -> Vec<(String, String)> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .filter_map(|item| {
            let (k, v) = item.split_once('=')?;
            let key = k.trim();
            let value = v.trim();
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_lookup_by_host() {
        let providers = Providers::default();
        assert_eq!(providers.name_for_host("api-football-v1.p.rapidapi.com"), "football");
        assert_eq!(providers.name_for_host("F1-Data.example.com"), "f1-data");
        assert_eq!(providers.name_for_host(""), "unknown");
    }

    #[test]
    fn test_limits_fall_back_to_default() {
        let quota = QuotaConfig::default();
        assert_eq!(quota.limit_for("football"), 150);
        assert_eq!(quota.limit_for("news"), 200);
        assert_eq!(quota.limit_for("allsports"), DEFAULT_DAILY_LIMIT);
        assert_eq!(quota.limit_for("somewhere-else"), DEFAULT_DAILY_LIMIT);
    }
}
