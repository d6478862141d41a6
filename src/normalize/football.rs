use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use super::fields::{float, int, items, object, opt_text, slugify, text, uint};
use super::{PLACEHOLDER_TEAM_IMAGE, UNKNOWN_TEAM};

const DEFAULT_TEAM_COLOR: &str = "#374df5";
const LIVE_STATUSES: [&str; 2] = ["In Progress", "Halftime"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub home_team: MatchTeam,
    pub away_team: MatchTeam,
    pub score: Score,
    pub status: MatchStatus,
    /// Kick-off in epoch milliseconds.
    pub start_time: i64,
    pub tournament: String,
    pub slug: String,
    pub round: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTeam {
    pub id: u64,
    pub name: String,
    pub logo: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub home: u64,
    pub away: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatus {
    pub description: String,
    pub is_live: bool,
    pub code: u64,
}

/// Live and upcoming matches first, soonest first, then past matches most
/// recent first.
pub fn matches(raw: &Value, now: DateTime<Utc>) -> Vec<Match> {
    let now_millis = now.timestamp_millis();
    let (mut upcoming, mut past): (Vec<Match>, Vec<Match>) = items(raw.get("events"))
        .iter()
        .enumerate()
        .map(|(i, event)| to_match(event, i, now_millis))
        .partition(|m| m.status.is_live || m.start_time >= now_millis);

    upcoming.sort_by_key(|m| m.start_time);
    past.sort_by_key(|m| std::cmp::Reverse(m.start_time));
    upcoming.extend(past);
    upcoming
}

fn to_match(event: &Value, index: usize, now_millis: i64) -> Match {
    let start_time = match int(event.get("startTimestamp")) {
        0 => now_millis,
        secs => secs.saturating_mul(1000),
    };
    let home_team = match_team(event.get("homeTeam"));
    let away_team = match_team(event.get("awayTeam"));
    let description = text(event.pointer("/status/description"), "Unknown");

    let slug = opt_text(event.get("slug")).unwrap_or_else(|| {
        let home = opt_text(event.pointer("/homeTeam/name")).unwrap_or_else(|| "team-1".into());
        let away = opt_text(event.pointer("/awayTeam/name")).unwrap_or_else(|| "team-2".into());
        slugify(&format!("{} vs {}", home, away))
    });

    Match {
        id: opt_text(event.get("id")).unwrap_or_else(|| format!("match-{}-{}", start_time, index)),
        home_team,
        away_team,
        score: Score {
            home: uint(event.pointer("/homeScore/current")),
            away: uint(event.pointer("/awayScore/current")),
        },
        status: MatchStatus {
            is_live: LIVE_STATUSES.contains(&description.as_str()),
            description,
            code: uint(event.pointer("/status/code")),
        },
        start_time,
        tournament: text(event.pointer("/tournament/name"), "Unknown League"),
        slug,
        round: uint(event.pointer("/roundInfo/round")),
    }
}

fn match_team(team: Option<&Value>) -> MatchTeam {
    let team = team.unwrap_or(&Value::Null);
    MatchTeam {
        id: uint(team.get("id")),
        name: text(team.get("name"), UNKNOWN_TEAM),
        logo: text(team.get("logo"), PLACEHOLDER_TEAM_IMAGE),
        color: text(team.pointer("/teamColors/primary"), DEFAULT_TEAM_COLOR),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub position: u64,
    pub team: StandingTeam,
    pub stats: StandingStats,
    /// Zone marker; `text` is empty for rows outside any zone.
    pub promotion: Promotion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingTeam {
    pub id: u64,
    pub name: String,
    pub short_name: String,
    pub logo: String,
    pub colors: TeamColors,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamColors {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingStats {
    pub matches: u64,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    pub points: u64,
    pub goals_for: u64,
    pub goals_against: u64,
    pub goal_difference: i64,
    pub goal_difference_formatted: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Promotion {
    pub text: String,
    pub id: u64,
}

/// Rows of the first standings table, in provider order.
pub fn standings(raw: &Value) -> Vec<StandingRow> {
    let table = items(raw.get("standings")).first();
    items(table.and_then(|t| t.get("rows")))
        .iter()
        .map(|row| {
            let name = text(row.pointer("/team/name"), UNKNOWN_TEAM);
            StandingRow {
                position: uint(row.get("position")),
                team: StandingTeam {
                    id: uint(row.pointer("/team/id")),
                    short_name: opt_text(row.pointer("/team/shortName"))
                        .or_else(|| opt_text(row.pointer("/team/name")))
                        .unwrap_or_else(|| "Unknown".to_string()),
                    name,
                    logo: text(row.pointer("/team/logo"), PLACEHOLDER_TEAM_IMAGE),
                    colors: TeamColors {
                        primary: text(row.pointer("/team/teamColors/primary"), "#444444"),
                        secondary: text(row.pointer("/team/teamColors/secondary"), "#FFFFFF"),
                    },
                },
                stats: StandingStats {
                    matches: uint(row.get("matches")),
                    wins: uint(row.get("wins")),
                    draws: uint(row.get("draws")),
                    losses: uint(row.get("losses")),
                    points: uint(row.get("points")),
                    goals_for: uint(row.get("scoresFor")),
                    goals_against: uint(row.get("scoresAgainst")),
                    goal_difference: int(row.get("scoreDifference")),
                    goal_difference_formatted: text(row.get("scoreDifferenceFormatted"), "0"),
                },
                promotion: promotion(row.get("promotion")),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfile {
    pub id: u64,
    pub name: String,
    pub short_name: String,
    pub full_name: String,
    pub slug: String,
    pub name_code: String,
    pub logo: String,
    pub colors: ProfileColors,
    pub venue: Venue,
    pub country: Country,
    pub manager: Manager,
    pub tournament: TournamentRef,
    /// RFC 3339, or empty when unknown.
    pub foundation_date: String,
    pub form: Form,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileColors {
    pub primary: String,
    pub secondary: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Venue {
    pub name: String,
    pub city: String,
    pub capacity: u64,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub name: String,
    pub flag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub id: u64,
    pub name: String,
    pub short_name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentRef {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub position: u64,
    pub rating: f64,
    pub value: String,
    pub recent_results: Vec<String>,
}

/// Profile from the payload's `team` object. Every nested object is
/// defaulted, so a payload without one yields an all-placeholder profile
/// with id 0.
pub fn team(raw: &Value) -> TeamProfile {
    let team = nested(raw.get("team"));
    let raw_name = opt_text(team.get("name"));
    let name = raw_name.clone().unwrap_or_else(|| UNKNOWN_TEAM.to_string());

    let venue = nested(team.get("venue"));
    let manager = nested(team.get("manager"));
    let manager_name = opt_text(manager.get("name"));
    let tournament = nested(team.get("tournament"));
    let form = nested(team.get("pregameForm"));

    TeamProfile {
        id: uint(team.get("id")),
        short_name: opt_text(team.get("shortName"))
            .or_else(|| raw_name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        full_name: opt_text(team.get("fullName")).unwrap_or_else(|| name.clone()),
        slug: opt_text(team.get("slug"))
            .or_else(|| raw_name.as_deref().map(slugify))
            .unwrap_or_else(|| "unknown-team".to_string()),
        name,
        name_code: text(team.get("nameCode"), ""),
        logo: text(team.get("logo"), PLACEHOLDER_TEAM_IMAGE),
        colors: ProfileColors {
            primary: text(team.pointer("/teamColors/primary"), "#000000"),
            secondary: text(team.pointer("/teamColors/secondary"), "#ffffff"),
            text: text(team.pointer("/teamColors/text"), "#ffffff"),
        },
        venue: Venue {
            name: text(venue.get("name"), "Unknown Venue"),
            city: text(venue.pointer("/city/name"), "Unknown City"),
            capacity: uint(venue.get("capacity")),
            coordinates: Coordinates {
                latitude: float(venue.pointer("/venueCoordinates/latitude")),
                longitude: float(venue.pointer("/venueCoordinates/longitude")),
            },
        },
        country: Country {
            name: text(team.pointer("/country/name"), "Unknown Country"),
            flag: text(team.pointer("/country/slug"), "unknown"),
        },
        manager: Manager {
            id: uint(manager.get("id")),
            short_name: opt_text(manager.get("shortName"))
                .or_else(|| manager_name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            name: manager_name.unwrap_or_else(|| "Unknown Manager".to_string()),
            country: text(manager.pointer("/country/name"), "Unknown Country"),
        },
        tournament: TournamentRef {
            id: uint(tournament.get("id")),
            name: text(tournament.get("name"), "Unknown Tournament"),
            slug: text(tournament.get("slug"), "unknown-tournament"),
        },
        foundation_date: match int(team.get("foundationDateTimestamp")) {
            0 => String::new(),
            secs => Utc
                .timestamp_opt(secs, 0)
                .single()
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
        },
        form: Form {
            position: uint(form.get("position")),
            rating: float(form.get("avgRating")),
            value: text(form.get("value"), "0"),
            recent_results: items(form.get("form"))
                .iter()
                .filter_map(|r| opt_text(Some(r)))
                .collect(),
        },
    }
}

fn promotion(v: Option<&Value>) -> Promotion {
    let p = nested(v);
    Promotion {
        text: text(p.get("text"), ""),
        id: uint(p.get("id")),
    }
}

static NULL: Value = Value::Null;

/// The object at `v`, or `null` so that every lookup below it misses.
fn nested(v: Option<&Value>) -> &Value {
    object(v).unwrap_or(&NULL)
}
