//! Task payload: ordered key/value pairs and their form encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::TaskQueueError;

/// Ordered key/value data carried by a task.
///
/// Nested JSON flattens the way legacy form encoders do:
/// `{"a": {"b": 1}, "c": [2, 3]}` becomes `a[b]=1`, `c[0]=2`, `c[1]=3`.
/// A top-level list is keyed by index, so `["x", "y"]` becomes `0=x&1=y`.
///
/// Emptiness is judged on the flattened pairs. `null` leaves, `{}` and `[]`
/// contribute nothing, so `{"a": {}}` is an empty payload: the task gets no
/// body, no implicit content-type and no `?` on its URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload(Vec<(String, String)>);

impl Payload {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build from a JSON object or list. `null` means "no payload"; scalars
    /// are rejected.
    pub fn from_json(value: &Value) -> Result<Self, TaskQueueError> {
        let mut pairs = Vec::new();
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    flatten(i.to_string(), item, &mut pairs);
                }
            }
            Value::Object(map) => {
                for (key, v) in map {
                    flatten(key.clone(), v, &mut pairs);
                }
            }
            other => {
                return Err(TaskQueueError::invalid(format!(
                    "query_data must be an array. Actual type: {}",
                    json_type(other)
                )));
            }
        }
        Ok(Self(pairs))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `application/x-www-form-urlencoded` serialization.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn flatten(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(format!("{prefix}[{i}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(format!("{prefix}[{key}]"), item, out);
            }
        }
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_pairs_in_order() {
        let payload: Payload = [("x", "1"), ("y", "a b&c")].into_iter().collect();
        assert_eq!(payload.encode(), "x=1&y=a+b%26c");
    }

    #[test]
    fn flattens_nested_json_like_form_encoders() {
        let payload = Payload::from_json(&json!({
            "user": {"id": 7},
            "tags": ["a", "b"],
            "on": true,
            "off": false,
            "skip": null
        }))
        .unwrap();

        assert_eq!(payload.get("user[id]"), Some("7"));
        assert_eq!(payload.get("tags[1]"), Some("b"));
        assert_eq!(payload.get("on"), Some("1"));
        assert_eq!(payload.get("off"), Some("0"));
        assert_eq!(payload.get("skip"), None);
        assert!(payload.encode().contains("user%5Bid%5D=7"));
    }

    #[test]
    fn null_and_empty_list_mean_no_payload() {
        assert!(Payload::from_json(&Value::Null).unwrap().is_empty());
        assert!(Payload::from_json(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn scalar_payload_is_rejected() {
        let err = Payload::from_json(&json!("x=1")).unwrap_err();
        assert!(err.to_string().contains("query_data must be an array"));
        assert!(Payload::from_json(&json!(3)).is_err());
        assert!(Payload::from_json(&json!(true)).is_err());
    }

    #[test]
    fn top_level_list_is_keyed_by_index() {
        let payload = Payload::from_json(&json!(["a", {"b": 2}, null, "c"])).unwrap();
        assert_eq!(payload.encode(), "0=a&1%5Bb%5D=2&3=c");
    }

    #[test]
    fn containers_without_leaves_flatten_to_nothing() {
        let payload = Payload::from_json(&json!({"a": {}, "b": [], "c": null})).unwrap();
        assert!(payload.is_empty());
        assert_eq!(payload.encode(), "");
    }
}
