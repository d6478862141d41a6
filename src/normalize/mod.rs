//! Turns raw provider payloads into stable, fully-defaulted shapes.
//!
//! Normalization is total: malformed or partial input produces empty lists
//! and placeholder values, never an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::ResourceKind;

pub mod f1;
pub mod fields;
pub mod football;
pub mod news;
pub mod ufc;

pub use f1::{ConstructorStanding, DriverStanding, F1Race, RaceResult, RaceStatus};
pub use football::{Match, StandingRow, TeamProfile};
pub use news::Article;
pub use ufc::{Fighter, Market, UfcEvent, WeightClassRanking};


pub const UNKNOWN_TEAM: &str = "Unknown Team";
pub const UNKNOWN_FIGHTER: &str = "Unknown Fighter";
pub const PLACEHOLDER_TEAM_IMAGE: &str = "/main/images/placeholder-team.png";
pub const PLACEHOLDER_FIGHTER_IMAGE: &str = "/main/images/placeholder-player.png";

/// One variant per resource kind. Serializes as the bare payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Normalized {
    Matches(Vec<Match>),
    Standings(Vec<StandingRow>),
    Team(TeamProfile),
    UfcRankings(Vec<WeightClassRanking>),
    UfcFighters(Vec<Fighter>),
    UfcMarkets(Vec<Market>),
    UfcEvents(Vec<UfcEvent>),
    F1Races(Vec<F1Race>),
    F1DriverStandings(Vec<DriverStanding>),
    F1ConstructorStandings(Vec<ConstructorStanding>),
    F1RaceResults(Vec<RaceResult>),
    News(Vec<Article>),
    Trending(Vec<String>),
}

impl Normalized {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Matches(_) => ResourceKind::Matches,
            Self::Standings(_) => ResourceKind::Standings,
            Self::Team(_) => ResourceKind::Team,
            Self::UfcRankings(_) => ResourceKind::UfcRankings,
            Self::UfcFighters(_) => ResourceKind::UfcFighters,
            Self::UfcMarkets(_) => ResourceKind::UfcMarkets,
            Self::UfcEvents(_) => ResourceKind::UfcEvents,
            Self::F1Races(_) => ResourceKind::F1Races,
            Self::F1DriverStandings(_) => ResourceKind::F1DriverStandings,
            Self::F1ConstructorStandings(_) => ResourceKind::F1ConstructorStandings,
            Self::F1RaceResults(_) => ResourceKind::F1RaceResults,
            Self::News(_) => ResourceKind::News,
            Self::Trending(_) => ResourceKind::Trending,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Matches(v) => v.is_empty(),
            Self::Standings(v) => v.is_empty(),
            Self::Team(v) => v.id == 0,
            Self::UfcRankings(v) => v.is_empty(),
            Self::UfcFighters(v) => v.is_empty(),
            Self::UfcMarkets(v) => v.is_empty(),
            Self::UfcEvents(v) => v.is_empty(),
            Self::F1Races(v) => v.is_empty(),
            Self::F1DriverStandings(v) => v.is_empty(),
            Self::F1ConstructorStandings(v) => v.is_empty(),
            Self::F1RaceResults(v) => v.is_empty(),
            Self::News(v) => v.is_empty(),
            Self::Trending(v) => v.is_empty(),
        }
    }
}

/// `now` decides upcoming/past splits and market expiry.
pub fn normalize(kind: ResourceKind, raw: &Value, now: DateTime<Utc>) -> Normalized {
    match kind {
        ResourceKind::Matches => Normalized::Matches(football::matches(raw, now)),
        ResourceKind::Standings => Normalized::Standings(football::standings(raw)),
        ResourceKind::Team => Normalized::Team(football::team(raw)),
        ResourceKind::UfcRankings => Normalized::UfcRankings(ufc::rankings(raw)),
        ResourceKind::UfcFighters => Normalized::UfcFighters(ufc::fighters(raw)),
        ResourceKind::UfcMarkets => Normalized::UfcMarkets(ufc::markets(raw, now)),
        ResourceKind::UfcEvents => Normalized::UfcEvents(ufc::events(raw)),
        ResourceKind::F1Races => Normalized::F1Races(f1::races(raw, now)),
        ResourceKind::F1DriverStandings => Normalized::F1DriverStandings(f1::driver_standings(raw)),
        ResourceKind::F1ConstructorStandings => {
            Normalized::F1ConstructorStandings(f1::constructor_standings(raw))
        }
        ResourceKind::F1RaceResults => Normalized::F1RaceResults(f1::race_results(raw)),
        ResourceKind::News => Normalized::News(news::articles(raw)),
        ResourceKind::Trending => Normalized::Trending(news::topics(raw)),
    }
}
