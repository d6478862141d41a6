//! Lenient field readers over raw provider JSON.
//!
//! Providers omit fields, send `null`, or switch between numbers and
//! numeric strings. Every reader here returns a value for any input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Non-empty string at `v`, numbers rendered as text, else `default`.
pub fn text(v: Option<&Value>, default: &str) -> String {
    opt_text(v).unwrap_or_else(|| default.to_string())
}

pub fn opt_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Unsigned integer at `v`. Accepts numeric strings and truncates floats;
/// anything else is 0.
pub fn uint(v: Option<&Value>) -> u64 {
    match v {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_or(0, |f| f.max(0.0) as u64),
        _ => 0,
    }
}

pub fn int(v: Option<&Value>) -> i64 {
    match v {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_or(0, |f| f as i64),
        _ => 0,
    }
}

pub fn float(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn flag(v: Option<&Value>) -> bool {
    matches!(v, Some(Value::Bool(true)))
}

/// Elements of the array at `v`, or nothing.
pub fn items(v: Option<&Value>) -> &[Value] {
    match v {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// `v` if it is a JSON object.
pub fn object(v: Option<&Value>) -> Option<&Value> {
    v.filter(|v| v.is_object())
}

/// Lowercase with whitespace runs collapsed to `-`.
pub fn slugify(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Timestamps as providers send them: RFC 3339, a naive date-time taken as
/// UTC, or a bare date at midnight UTC.
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&t));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| Utc.from_utc_datetime(&t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_defaults() {
        let v = json!({"a": "x", "b": "", "c": null, "d": 7, "e": {"f": 1}});
        assert_eq!(text(v.get("a"), "?"), "x");
        assert_eq!(text(v.get("b"), "?"), "?");
        assert_eq!(text(v.get("c"), "?"), "?");
        assert_eq!(text(v.get("d"), "?"), "7");
        assert_eq!(text(v.get("e"), "?"), "?");
        assert_eq!(text(v.get("missing"), "?"), "?");
    }

    #[test]
    fn test_numbers_accept_numeric_strings() {
        let v = json!({"a": "12", "b": 3.7, "c": "abc", "d": -4, "e": " 5 "});
        assert_eq!(uint(v.get("a")), 12);
        assert_eq!(uint(v.get("b")), 3);
        assert_eq!(uint(v.get("c")), 0);
        assert_eq!(uint(v.get("d")), 0);
        assert_eq!(int(v.get("d")), -4);
        assert_eq!(float(v.get("e")), 5.0);
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 22, 22, 0, 0).unwrap();
        assert_eq!(parse_time("2026-03-22T22:00:00Z"), Some(expected));
        assert_eq!(parse_time("2026-03-22T23:00:00+01:00"), Some(expected));
        assert_eq!(parse_time("2026-03-22T22:00:00"), Some(expected));
        assert_eq!(
            parse_time("2026-03-22"),
            Some(Utc.with_ymd_and_hms(2026, 3, 22, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_time("soon"), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Light  Heavyweight"), "light-heavyweight");
        assert_eq!(slugify("Jon Jones"), "jon-jones");
    }
}
