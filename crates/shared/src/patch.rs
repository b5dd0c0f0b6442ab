//! Helpers for partial-update payloads.
//!
//! A nullable column in an update payload has three states: absent (leave the
//! column alone), `null` (clear it) and a value (set it). Those map onto
//! `Option<Option<T>>` with:
//!
//! ```ignore
//! #[serde(
//!     default,
//!     deserialize_with = "shared::patch::double_option",
//!     skip_serializing_if = "Option::is_none"
//! )]
//! pub description: Option<Option<String>>,
//! ```
//!
//! Serializing `Some(None)` emits `null`, and `None` is skipped, so the JSON
//! object handed to the repository only carries the keys the client sent.

use serde::{Deserialize, Deserializer};

/// Deserializes a present field (even `null`) as `Some(..)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Deserialize, Serialize)]
    struct Payload {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        description: Option<Option<String>>,
    }

    #[test]
    fn test_absent_field_is_none() {
        let p: Payload = serde_json::from_str(r#"{"name": "core-1"}"#).unwrap();
        assert_eq!(p.description, None);
        let out = serde_json::to_value(&p).unwrap();
        assert!(out.get("description").is_none());
    }

    #[test]
    fn test_explicit_null_clears() {
        let p: Payload = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(p.description, Some(None));
        let out = serde_json::to_value(&p).unwrap();
        assert_eq!(out["description"], serde_json::Value::Null);
        assert!(out.get("name").is_none());
    }

    #[test]
    fn test_value_is_set() {
        let p: Payload = serde_json::from_str(r#"{"description": "uplink"}"#).unwrap();
        assert_eq!(p.description, Some(Some("uplink".to_string())));
    }
}
