use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use super::fields::{flag, float, items, opt_text, parse_time, text, uint};
use crate::config::{StaticRace, F1_TEAMS};

const LIVE_WINDOW_HOURS: i64 = 3;
const DEFAULT_CONSTRUCTOR_COLOR: &str = "#333333";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    Upcoming,
    Live,
    Completed,
}

impl RaceStatus {
    /// Live from the start until three hours later.
    pub fn at(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if start > now {
            Self::Upcoming
        } else if now <= start + Duration::hours(LIVE_WINDOW_HOURS) {
            Self::Live
        } else {
            Self::Completed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct F1Race {
    pub round: u64,
    pub name: String,
    pub circuit: String,
    pub date: DateTime<Utc>,
    pub status: RaceStatus,
    pub completed: bool,
    pub winner: Option<String>,
}

impl F1Race {
    pub fn scheduled(race: &StaticRace, now: DateTime<Utc>) -> Self {
        let date = parse_time(race.date).unwrap_or(now);
        Self {
            round: 0,
            name: race.name.to_string(),
            circuit: race.circuit.to_string(),
            date,
            status: RaceStatus::at(date, now),
            completed: false,
            winner: None,
        }
    }
}

/// Upcoming races soonest first, then past races in calendar order.
pub fn races(raw: &Value, now: DateTime<Utc>) -> Vec<F1Race> {
    let mut races: Vec<F1Race> = items(raw.get("races"))
        .iter()
        .map(|race| {
            let date = race_start(race).unwrap_or(now);
            let circuit = match race.get("circuit") {
                Some(Value::Object(_)) => text(race.pointer("/circuit/name"), "Unknown Circuit"),
                other => text(other, "Unknown Circuit"),
            };
            F1Race {
                round: uint(race.get("round")),
                name: text(race.get("name"), "Unknown Grand Prix"),
                circuit,
                date,
                status: RaceStatus::at(date, now),
                completed: flag(race.get("completed")) || date < now,
                winner: opt_text(race.get("winner")),
            }
        })
        .collect();
    races.sort_by_key(|r| (r.date <= now, r.date, r.round));
    races
}

fn race_start(race: &Value) -> Option<DateTime<Utc>> {
    let date = race.get("date").and_then(Value::as_str)?;
    match race.get("time").and_then(Value::as_str) {
        Some(time) if !date.contains('T') => parse_time(&format!("{}T{}", date, time)),
        _ => parse_time(date),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStanding {
    pub position: u64,
    pub name: String,
    pub team: String,
    pub points: f64,
    pub nationality: String,
}

pub fn driver_standings(raw: &Value) -> Vec<DriverStanding> {
    let mut drivers: Vec<DriverStanding> = items(raw.get("drivers"))
        .iter()
        .map(|d| DriverStanding {
            position: uint(d.get("position")),
            name: text(d.get("name"), "Unknown Driver"),
            team: text(d.get("team"), "Unknown Team"),
            points: float(d.get("points")),
            nationality: text(d.get("nationality"), "Unknown"),
        })
        .collect();
    drivers.sort_by_key(|d| d.position);
    drivers
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorStanding {
    pub position: u64,
    pub name: String,
    pub points: f64,
    pub color: String,
    pub drivers: Vec<String>,
}

pub fn constructor_standings(raw: &Value) -> Vec<ConstructorStanding> {
    let mut teams: Vec<ConstructorStanding> = items(raw.get("teams"))
        .iter()
        .map(|t| {
            let name = text(t.get("name"), "Unknown Team");
            let drivers = match t.get("drivers") {
                Some(Value::Array(list)) => list.iter().filter_map(|d| opt_text(Some(d))).collect(),
                other => opt_text(other).into_iter().collect(),
            };
            ConstructorStanding {
                position: uint(t.get("position")),
                color: team_color(&name).to_string(),
                name,
                points: float(t.get("points")),
                drivers,
            }
        })
        .collect();
    teams.sort_by_key(|t| t.position);
    teams
}

/// Livery colour for a constructor, matched by full name or short code.
pub fn team_color(name: &str) -> &'static str {
    let name = name.to_lowercase();
    F1_TEAMS
        .iter()
        .find(|t| t.name.to_lowercase() == name || name.contains(&t.short_name.to_lowercase()))
        .map(|t| t.color)
        .unwrap_or(DEFAULT_CONSTRUCTOR_COLOR)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    pub position: u64,
    pub driver: String,
    pub team: String,
    pub time: String,
    pub points: f64,
    pub fastest_lap: bool,
}

pub fn race_results(raw: &Value) -> Vec<RaceResult> {
    let mut results: Vec<RaceResult> = items(raw.get("results"))
        .iter()
        .map(|r| RaceResult {
            position: uint(r.get("position")),
            driver: text(r.get("driver"), "Unknown Driver"),
            team: text(r.get("team"), "Unknown Team"),
            time: text(r.get("time"), "DNF"),
            points: float(r.get("points")),
            fastest_lap: flag(r.get("fastestLap")),
        })
        .collect();
    results.sort_by_key(|r| r.position);
    results
}
