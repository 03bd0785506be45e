// Lenient field decoders
//
// The Atlas API is loose about shapes: timestamps show up as RFC 3339
// strings, naive ISO strings, or unix seconds; ids as strings or numbers;
// enum-like fields as plain strings or `{id, name}` objects.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a timestamp from any of the shapes the API uses.
///
/// `null`, `""`, and unparseable strings decode to `None` rather than failing
/// the whole record.
pub(crate) fn resilient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_time))
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(ts.with_timezone(&Utc));
            }
            [
                "%Y-%m-%dT%H:%M:%S%.f",
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%dT%H:%M:%S",
            ]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| naive.and_utc())
            .or_else(|| {
                s.parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
            })
        }
        _ => None,
    }
}

/// Accept `"12345"` or `12345`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Accept `"ping"` or `{"id": 1, "name": "ping"}`.
pub(crate) fn string_or_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Object(map) => match map.get("name") {
            Some(Value::String(name)) => Ok(name.clone()),
            _ => Err(serde::de::Error::custom("object without a string `name`")),
        },
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or object, got {other}"
        ))),
    }
}

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_time_handles_every_shape() {
        let expected = DateTime::from_timestamp(1_752_244_648, 0);

        assert_eq!(parse_time(&json!(1_752_244_648)), expected);
        assert_eq!(parse_time(&json!("1752244648")), expected);
        assert_eq!(parse_time(&json!("2025-07-11T14:37:28Z")), expected);
        assert_eq!(parse_time(&json!("2025-07-11T14:37:28")), expected);
        assert_eq!(parse_time(&json!("2025-07-11 14:37:28")), expected);
        assert_eq!(parse_time(&json!("")), None);
        assert_eq!(parse_time(&json!("not a time")), None);
        assert_eq!(parse_time(&json!(true)), None);
    }
}
