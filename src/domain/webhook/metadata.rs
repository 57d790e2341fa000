//! Correlation metadata extraction from heterogeneous event payloads.
//!
//! Whop places checkout metadata in different positions depending on the
//! event type, so extraction is an ordered list of probes tried in sequence.
//! The metadata itself carries the local `user_id` and a `flow` tag set when
//! the checkout session was created.

use serde_json::{Map, Value};

/// Payload locations probed for metadata, in precedence order.
const METADATA_PATHS: [&[&str]; 4] = [
    &["metadata"],
    &["checkout_session", "metadata"],
    &["checkout", "metadata"],
    &["payment", "metadata"],
];

/// Extracts correlation metadata from an event's `data` value.
///
/// Returns the first probe location that holds a JSON object, or an empty
/// map when none does.
pub fn extract_metadata(data: &Value) -> Map<String, Value> {
    for path in METADATA_PATHS {
        let mut current = data;
        for key in path {
            match current.get(key) {
                Some(next) => current = next,
                None => {
                    current = &Value::Null;
                    break;
                }
            }
        }
        if let Some(map) = current.as_object() {
            return map.clone();
        }
    }
    Map::new()
}

/// Reads the local user id from metadata.
///
/// Accepts `user_id` with `app_user_id` as fallback; values may be JSON
/// numbers or numeric strings. Anything else yields `None`.
pub fn extract_user_id(metadata: &Map<String, Value>) -> Option<i64> {
    let raw = metadata.get("user_id").or_else(|| metadata.get("app_user_id"))?;

    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if !s.is_empty() => s.parse().ok(),
        _ => None,
    }
}

/// Checks whether the metadata's `flow` tag matches the expected flow.
///
/// Events without a flow tag match permissively: historical checkout
/// sessions predate the tag.
pub fn flow_matches(metadata: &Map<String, Value>, expected_flow: &str) -> bool {
    match metadata.get("flow").and_then(Value::as_str) {
        None | Some("") => true,
        Some(flow) => flow == expected_flow,
    }
}
