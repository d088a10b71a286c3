//! Building a [`RoutePlan`] from direction replies.

use serde_json::Value;

use crate::model::{RoutePlan, Segment, Step};
use crate::numeric::safe_int;

/// Direction replies come either bare or wrapped in a `route` object.
fn route_body(body: &Value) -> &Value {
    body.get("route").filter(|r| r.is_object()).unwrap_or(body)
}

/// First walking path, or `None` when the reply has no paths.
pub fn walking_plan(body: &Value) -> Option<RoutePlan> {
    let path = route_body(body).get("paths")?.as_array()?.first()?;
    let steps = path
        .get("steps")
        .and_then(Value::as_array)
        .map(|steps| steps.iter().cloned().map(Step).collect())
        .unwrap_or_default();
    Some(RoutePlan::Walking {
        distance_meters: safe_int(path.get("distance")),
        duration_minutes: safe_int(path.get("duration")) / 60,
        steps,
    })
}

/// First transit option, or `None` when the reply has no transits.
pub fn transit_plan(body: &Value) -> Option<RoutePlan> {
    let route = route_body(body);
    let transit = route.get("transits")?.as_array()?.first()?;
    let segments = transit
        .get("segments")
        .and_then(Value::as_array)
        .map(|segs| segs.iter().cloned().map(Segment).collect())
        .unwrap_or_default();
    Some(RoutePlan::Transit {
        duration_minutes: safe_int(transit.get("duration")) / 60,
        walking_distance_meters: safe_int(transit.get("walking_distance")),
        segments,
        distance_meters: safe_int(route.get("distance")),
    })
}
