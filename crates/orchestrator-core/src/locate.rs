//! Reading coordinates and distances out of map-provider replies.

use serde_json::Value;

use crate::model::Coordinate;
use crate::numeric;

/// First location from a geocode reply, accepting either the `results` or the
/// `geocodes` list. An explicit error status means not found.
pub fn coordinate_from_geocode(body: &Value) -> Option<Coordinate> {
    if is_error_status(body) {
        return None;
    }
    first_location(body, "results")
        .or_else(|| first_location(body, "geocodes"))
        .map(|loc| Coordinate(loc.to_string()))
}

/// Meters from the first entry of a distance reply.
pub fn meters_from_distance(body: &Value) -> Option<i64> {
    if is_error_status(body) {
        return None;
    }
    let first = body.get("results")?.as_array()?.first()?;
    numeric::parse_int(first.get("distance")).filter(|m| *m >= 0)
}

fn first_location<'a>(body: &'a Value, list: &str) -> Option<&'a str> {
    let entry = body.get(list)?.as_array()?.first()?;
    numeric::text(entry.get("location"))
}

fn is_error_status(body: &Value) -> bool {
    match body.get("status") {
        Some(Value::String(s)) => s == "0",
        Some(Value::Number(n)) => n.as_i64() == Some(0),
        _ => false,
    }
}
