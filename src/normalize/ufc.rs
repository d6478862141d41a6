use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::fields::{float, items, opt_text, parse_time, slugify, text, uint};
use super::{PLACEHOLDER_FIGHTER_IMAGE, UNKNOWN_FIGHTER};
use crate::config::{StaticEvent, UFC_MARKET_CATEGORY};

const MAX_CONTENDERS: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightClassRanking {
    pub weight_class: String,
    pub champion: RankedFighter,
    pub contenders: Vec<Contender>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedFighter {
    pub name: String,
    pub image: String,
    pub record: String,
    pub last_fight: String,
}

impl RankedFighter {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            image: fighter_image(name),
            record: String::new(),
            last_fight: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contender {
    pub rank: usize,
    #[serde(flatten)]
    pub fighter: RankedFighter,
}

pub fn fighter_image(name: &str) -> String {
    if name.trim().is_empty() {
        return PLACEHOLDER_FIGHTER_IMAGE.to_string();
    }
    format!("/images/fighters/{}.png", slugify(name))
}

/// Weight classes without a name or a champion are skipped. Contenders are
/// read from the `"1"`..`"15"` keys of the provider's contender map.
pub fn rankings(raw: &Value) -> Vec<WeightClassRanking> {
    items(Some(raw))
        .iter()
        .filter_map(|class| {
            let weight_class = opt_text(class.get("weight_class"))?;
            let champion = opt_text(class.get("champion"))?;
            let contenders = (1..=MAX_CONTENDERS)
                .filter_map(|rank| {
                    let name = opt_text(class.pointer(&format!("/contenders/{}", rank)))?;
                    Some(Contender {
                        rank,
                        fighter: RankedFighter::named(&name),
                    })
                })
                .collect();
            Some(WeightClassRanking {
                weight_class,
                champion: RankedFighter::named(&champion),
                contenders,
            })
        })
        .collect()
}

/// Champion-only rankings built from a static champion table.
pub fn champions_only<'a>(table: impl IntoIterator<Item = &'a (&'static str, &'static str)>) -> Vec<WeightClassRanking> {
    table
        .into_iter()
        .map(|(weight_class, champion)| WeightClassRanking {
            weight_class: weight_class.to_string(),
            champion: RankedFighter::named(champion),
            contenders: Vec::new(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fighter {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub weight_class: String,
    pub height: String,
    pub weight: String,
    pub reach: String,
    pub stance: String,
    pub record: FightRecord,
    pub is_champion: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FightRecord {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

pub fn fighters(raw: &Value) -> Vec<Fighter> {
    items(Some(raw))
        .iter()
        .map(|f| {
            let first_name = text(f.get("first_name"), "");
            let last_name = text(f.get("last_name"), "");
            let full = format!("{} {}", first_name, last_name).trim().to_string();
            Fighter {
                name: if full.is_empty() { UNKNOWN_FIGHTER.to_string() } else { full },
                first_name,
                last_name,
                nickname: text(f.get("nickname"), ""),
                weight_class: text(f.get("weight_class"), "Unknown"),
                height: text(f.get("height"), ""),
                weight: text(f.get("weight"), ""),
                reach: text(f.get("reach"), ""),
                stance: text(f.get("stance"), ""),
                record: FightRecord {
                    wins: uint(f.get("wins")),
                    losses: uint(f.get("losses")),
                    draws: uint(f.get("draws")),
                },
                is_champion: f.get("belt").and_then(Value::as_str) == Some("1"),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: String,
    pub name: String,
    pub fighters: MarketFighters,
    pub start_time: DateTime<Utc>,
    pub category: String,
    pub odds: Vec<OddsLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketFighters {
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsLine {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// Future UFC prop markets with both fighters named, earliest first.
pub fn markets(raw: &Value, now: DateTime<Utc>) -> Vec<Market> {
    let mut markets: Vec<Market> = items(raw.get("specials"))
        .iter()
        .enumerate()
        .filter_map(|(i, m)| {
            if m.get("category").and_then(Value::as_str) != Some(UFC_MARKET_CATEGORY) {
                return None;
            }
            let home = opt_text(m.pointer("/event/home"))?;
            let away = opt_text(m.pointer("/event/away"))?;
            let start_time = m
                .get("starts")
                .and_then(Value::as_str)
                .and_then(parse_time)
                .filter(|t| *t > now)?;

            let odds = match m.get("lines") {
                Some(Value::Object(lines)) => lines
                    .iter()
                    .map(|(key, line)| OddsLine {
                        id: text(line.get("id"), key),
                        name: text(line.get("name"), "Unknown"),
                        price: float(line.get("price")),
                    })
                    .collect(),
                _ => Vec::new(),
            };

            Some(Market {
                id: opt_text(m.get("special_id"))
                    .unwrap_or_else(|| format!("market-{}-{}", start_time.timestamp(), i)),
                name: text(m.get("name"), "Unknown Market"),
                fighters: MarketFighters { home, away },
                start_time,
                category: UFC_MARKET_CATEGORY.to_string(),
                odds,
            })
        })
        .collect();
    markets.sort_by_key(|m| m.start_time);
    markets
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UfcEvent {
    pub id: String,
    pub name: String,
    pub main_event: String,
    pub location: String,
    pub start_date: Option<String>,
    pub sport_name: String,
}

impl From<&StaticEvent> for UfcEvent {
    fn from(event: &StaticEvent) -> Self {
        Self {
            id: event.id.to_string(),
            name: event.name.to_string(),
            main_event: event.main_event.to_string(),
            location: event.location.to_string(),
            start_date: Some(event.date.to_string()),
            sport_name: "UFC".to_string(),
        }
    }
}

/// UFC tournaments from either a keyed object or an array.
pub fn events(raw: &Value) -> Vec<UfcEvent> {
    let entries: Vec<(String, &Value)> = match raw {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(list) => list.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter(|(_, e)| e.get("categoryName").and_then(Value::as_str) == Some("UFC"))
        .filter_map(|(key, e)| {
            let name = opt_text(e.get("name"))?;
            Some(UfcEvent {
                id: opt_text(e.get("tournamentId")).unwrap_or(key),
                main_event: main_event(&name).unwrap_or_default(),
                name,
                location: String::new(),
                start_date: opt_text(e.get("startDate")),
                sport_name: text(e.get("sportName"), "UFC"),
            })
        })
        .collect()
}

/// `"UFC 314: Volkanovski vs. Lopes"` -> `"Volkanovski vs Lopes"`.
pub fn main_event(name: &str) -> Option<String> {
    let (_, bout) = name.split_once(':')?;
    let lower = bout.to_ascii_lowercase();
    let at = lower.find(" vs. ")?;
    let first = bout[..at].trim();
    let second = bout[at + " vs. ".len()..].trim();
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some(format!("{} vs {}", first, second))
}
