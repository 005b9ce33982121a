//! Lenient deserializers for client payloads

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

/// HTML form inputs post numbers as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Distinguish an absent field from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent -> `None`, `null` -> `Some(None)`, value -> `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn lenient_number<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(raw)) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse().map(Some).map_err(|e| {
                serde::de::Error::custom(format!("invalid number '{}': {}", raw, e))
            })
        }
    }
}

/// Accept a number, a numeric string, `""` or `null`.
pub fn opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer)
}

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer)
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer)
}

/// [`double_option`] for scores posted from forms: `""` clears like `null`.
pub fn double_option_f64<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_f64(deserializer).map(Some)
}

/// Accept `null`, `""`, an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub fn opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_datetime(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s))),
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "double_option")]
        score: Option<Option<f64>>,
        #[serde(default, deserialize_with = "opt_datetime")]
        from: Option<DateTime<Utc>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.score, None);
        let p: Probe = serde_json::from_str(r#"{"score": null}"#).unwrap();
        assert_eq!(p.score, Some(None));
        let p: Probe = serde_json::from_str(r#"{"score": 7.5}"#).unwrap();
        assert_eq!(p.score, Some(Some(7.5)));
    }

    #[derive(Deserialize)]
    struct FormBody {
        #[serde(default, deserialize_with = "opt_i32")]
        count: Option<i32>,
        #[serde(default, deserialize_with = "double_option_f64")]
        score: Option<Option<f64>>,
    }

    #[test]
    fn numbers_from_form_strings() {
        let b: FormBody = serde_json::from_str(r#"{"count": "5", "score": " 7.5 "}"#).unwrap();
        assert_eq!(b.count, Some(5));
        assert_eq!(b.score, Some(Some(7.5)));

        let b: FormBody = serde_json::from_str(r#"{"count": 12, "score": 8}"#).unwrap();
        assert_eq!(b.count, Some(12));
        assert_eq!(b.score, Some(Some(8.0)));
    }

    #[test]
    fn blank_form_values_are_none() {
        let b: FormBody = serde_json::from_str(r#"{"count": "", "score": ""}"#).unwrap();
        assert_eq!(b.count, None);
        assert_eq!(b.score, Some(None));

        let b: FormBody = serde_json::from_str("{}").unwrap();
        assert_eq!(b.count, None);
        assert_eq!(b.score, None);
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert!(serde_json::from_str::<FormBody>(r#"{"count": "five"}"#).is_err());
        assert!(serde_json::from_str::<FormBody>(r#"{"count": true}"#).is_err());
    }

    #[test]
    fn parses_jikan_timestamps() {
        let p: Probe = serde_json::from_str(r#"{"from": "2009-04-05T00:00:00+00:00"}"#).unwrap();
        assert_eq!(p.from.unwrap().year(), 2009);
    }

    #[test]
    fn empty_and_date_only() {
        let p: Probe = serde_json::from_str(r#"{"from": ""}"#).unwrap();
        assert!(p.from.is_none());
        let p: Probe = serde_json::from_str(r#"{"from": "2011-10-02"}"#).unwrap();
        assert_eq!(p.from.unwrap().month(), 10);
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(serde_json::from_str::<Probe>(r#"{"from": "yesterday"}"#).is_err());
    }
}
