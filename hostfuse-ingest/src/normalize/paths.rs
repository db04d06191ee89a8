// JSON path helpers shared by the source normalizers
//
// Vendor records are partial at every depth. Every helper here returns None or an
// empty iterator for absent or wrongly-typed paths instead of failing.

use chrono::{DateTime, Utc};
use hostfuse_common::time::{from_epoch_millis, parse_timestamp};
use hostfuse_common::Field;
use serde_json::Value;

/// Walk nested objects by key
pub fn lookup<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(raw, |node, key| node.as_object()?.get(*key))
        .filter(|v| !v.is_null())
}

/// Render a JSON scalar as a trimmed, non-empty string
pub fn scalar_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Scalar at `path` as a canonical field
pub fn field_at(raw: &Value, path: &[&str]) -> Field {
    Field::from_option(lookup(raw, path).and_then(scalar_string).as_deref())
}

/// Identifier value: string, number, or Mongo `{"$oid": "..."}`
pub fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("$oid").and_then(scalar_string),
        other => scalar_string(other),
    }
}

/// Flatten `<path>.list[].<wrapper>.<key>` into scalar strings
///
/// Entries missing the wrapper or the key are skipped.
pub fn wrapped_list<'a>(
    raw: &'a Value,
    path: &[&str],
    wrapper: &'a str,
    key: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let entries = lookup(raw, path)
        .and_then(|container| container.get("list"))
        .and_then(Value::as_array)
        .map(|list| list.as_slice())
        .unwrap_or(&[]);

    entries
        .iter()
        .filter_map(move |entry| entry.get(wrapper)?.get(key))
        .filter_map(scalar_string)
}

/// Flatten a plain array at `path`; object entries contribute their `key` field
pub fn flat_list<'a>(raw: &'a Value, path: &[&str], key: &'a str) -> impl Iterator<Item = String> + 'a {
    let entries = lookup(raw, path)
        .and_then(Value::as_array)
        .map(|list| list.as_slice())
        .unwrap_or(&[]);

    entries.iter().filter_map(move |entry| match entry {
        Value::Object(map) => map.get(key).and_then(scalar_string),
        other => scalar_string(other),
    })
}

/// Parse a timestamp value
///
/// Strings go through [`parse_timestamp`]; integers are epoch milliseconds;
/// `{"$numberLong": "..."}` and `{"$date": ...}` wrappers are unwrapped.
pub fn instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(from_epoch_millis),
        Value::Object(map) => {
            if let Some(inner) = map.get("$date") {
                instant(inner)
            } else {
                map.get("$numberLong")
                    .and_then(Value::as_str)
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    .and_then(from_epoch_millis)
            }
        }
        _ => None,
    }
}

/// First available identifying hint among `paths`, for error messages
pub fn record_hint(raw: &Value, paths: &[&[&str]]) -> String {
    paths
        .iter()
        .find_map(|path| lookup(raw, path).and_then(scalar_string))
        .unwrap_or_else(|| "<unidentified>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_tolerates_missing_and_wrong_types() {
        let raw = json!({"a": {"b": "x"}, "s": "leaf", "n": null});
        assert_eq!(lookup(&raw, &["a", "b"]), Some(&json!("x")));
        assert!(lookup(&raw, &["a", "c"]).is_none());
        assert!(lookup(&raw, &["s", "deeper"]).is_none());
        assert!(lookup(&raw, &["n"]).is_none());
    }

    #[test]
    fn test_wrapped_list_skips_incomplete_entries() {
        let raw = json!({
            "tags": {"list": [
                {"TagSimple": {"name": "prod"}},
                {"TagSimple": {}},
                {"Other": {"name": "ignored"}},
                {"TagSimple": {"name": "  "}},
                {"TagSimple": {"name": "web"}}
            ]}
        });
        let names: Vec<_> = wrapped_list(&raw, &["tags"], "TagSimple", "name").collect();
        assert_eq!(names, vec!["prod", "web"]);
    }

    #[test]
    fn test_wrapped_list_on_missing_path_is_empty() {
        let raw = json!({"tags": "not-an-object"});
        assert_eq!(wrapped_list(&raw, &["tags"], "TagSimple", "name").count(), 0);
        assert_eq!(wrapped_list(&raw, &["vuln"], "HostAssetVuln", "qid").count(), 0);
    }

    #[test]
    fn test_flat_list_mixed_entries() {
        let raw = json!({"policies": ["p1", {"policy_id": "p2"}, {"policy_type": "x"}, 7]});
        let values: Vec<_> = flat_list(&raw, &["policies"], "policy_id").collect();
        assert_eq!(values, vec!["p1", "p2", "7"]);
    }

    #[test]
    fn test_identifier_forms() {
        assert_eq!(identifier(&json!("abc")), Some("abc".to_string()));
        assert_eq!(identifier(&json!(42)), Some("42".to_string()));
        assert_eq!(identifier(&json!({"$oid": "64f0"})), Some("64f0".to_string()));
        assert_eq!(identifier(&json!({"other": 1})), None);
        assert_eq!(identifier(&json!("")), None);
    }

    #[test]
    fn test_instant_forms() {
        let expected = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(instant(&json!("2024-01-01T00:00:00Z")), Some(expected));
        assert_eq!(instant(&json!(1_704_067_200_000i64)), Some(expected));
        assert_eq!(instant(&json!({"$numberLong": "1704067200000"})), Some(expected));
        assert_eq!(instant(&json!({"$date": "2024-01-01"})), Some(expected));
        assert_eq!(instant(&json!("not a date")), None);
        assert_eq!(instant(&json!(true)), None);
    }
}
