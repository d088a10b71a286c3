//! Markdown-flavoured itinerary text.

use serde_json::Value;

use crate::model::{FormattedAddresses, RoutePlan, Segment, Step};
use crate::numeric::{self, display_minutes, safe_int};

/// Walk steps shorter than this are noise in a leg summary.
const MIN_LEG_STEP_METERS: i64 = 5;
/// Walk steps shown per transit leg.
const LEG_STEP_PREVIEW: usize = 2;
/// Line type code the map provider uses for metro lines.
const SUBWAY_TYPE_CODE: &str = "1";
const SUBWAY_MARKER: &str = "地铁";

pub fn render_plan(plan: &RoutePlan, addresses: &FormattedAddresses, straight_line_meters: i64) -> String {
    let mut out = format!(
        "🗺️ **从 {} 到 {} 的路线规划**\n\n📏 **直线距离**: {}米\n\n",
        addresses.origin, addresses.destination, straight_line_meters
    );
    match plan {
        RoutePlan::Walking { distance_meters, duration_minutes, steps } => {
            render_walking(&mut out, *distance_meters, *duration_minutes, steps)
        }
        RoutePlan::Transit { duration_minutes, walking_distance_meters, segments, .. } => {
            render_transit(&mut out, *duration_minutes, *walking_distance_meters, segments)
        }
    }
    out
}

fn render_walking(out: &mut String, distance: i64, duration: i64, steps: &[Step]) {
    out.push_str("## 🚶 步行方案\n");
    out.push_str(&format!("**距离**: {}米\n", distance));
    out.push_str(&format!("**时间**: 约{}分钟\n\n", duration));

    if steps.is_empty() {
        return;
    }
    out.push_str(&format!("**详细路线** ({}个步骤):\n", steps.len()));
    for (i, step) in steps.iter().enumerate() {
        out.push_str(&format!("  **{}.** {}", i + 1, step.instruction().unwrap_or("继续前行")));
        if let Some(road) = step.road_name() {
            out.push_str(&format!(" (沿{})", road));
        }
        out.push_str(&format!(" - {}米", step.distance_meters()));
        let minutes = step.duration_minutes();
        if minutes > 0 {
            out.push_str(&format!(", 约{}分钟", minutes));
        }
        out.push('\n');
    }
}

fn render_transit(out: &mut String, duration: i64, walking_distance: i64, segments: &[Segment]) {
    out.push_str("## 🚇 公共交通方案\n");
    out.push_str(&format!("**总时间**: 约{}分钟\n", duration));
    out.push_str(&format!("**步行距离**: {}米\n\n", walking_distance));

    if segments.is_empty() {
        return;
    }
    out.push_str("**详细路线**:\n\n");

    let mut counter = 1;
    for segment in segments {
        if let Some(walking) = segment.walking() {
            render_walk_leg(out, counter, walking);
            counter += 1;
        }
        if let Some(line) = segment.first_line() {
            render_ride_leg(out, counter, line);
            counter += 1;
        }
    }

    let walking_legs = segments.iter().filter(|s| s.walking().is_some()).count();
    let ride_legs = segments.iter().filter(|s| s.has_ride()).count();
    out.push_str("**路线总结**:\n");
    out.push_str(&format!("• 步行段: {}个\n", walking_legs));
    out.push_str(&format!("• 乘车段: {}个\n", ride_legs));
    if ride_legs > 1 {
        out.push_str(&format!("• 需要换乘: {}次\n", ride_legs - 1));
    }
}

fn render_walk_leg(out: &mut String, counter: usize, walking: &Value) {
    out.push_str(&format!("**{}. 🚶 步行到站点**\n", counter));
    out.push_str(&format!(
        "   距离: {}米, 时间: 约{}分钟\n",
        safe_int(walking.get("distance")),
        display_minutes(walking.get("duration"))
    ));

    let steps = walking.get("steps").and_then(Value::as_array).filter(|s| !s.is_empty());
    if let Some(steps) = steps {
        let preview: Vec<String> = steps
            .iter()
            .take(LEG_STEP_PREVIEW)
            .filter_map(|step| {
                let instruction = numeric::text(step.get("instruction"))?;
                let meters = safe_int(step.get("distance"));
                (meters > MIN_LEG_STEP_METERS).then(|| format!("{}({}米)", instruction, meters))
            })
            .collect();
        out.push_str("   路线: ");
        out.push_str(&preview.join(" → "));
        out.push('\n');
    }
    out.push('\n');
}

fn render_ride_leg(out: &mut String, counter: usize, line: &Value) {
    let name = numeric::text(line.get("name")).unwrap_or("未知线路");
    let type_code = line.get("type").and_then(Value::as_str).unwrap_or("");
    let (icon, kind) = if name.contains(SUBWAY_MARKER) || type_code == SUBWAY_TYPE_CODE {
        ("🚇", "地铁")
    } else {
        ("🚌", "公交")
    };

    out.push_str(&format!("**{}. {} 乘坐{}**\n", counter, icon, kind));
    out.push_str(&format!("   线路: {}\n", name));

    if let Some(stop) = stop_name(line, "departure_stop") {
        out.push_str(&format!("   上车站: {}\n", stop));
    }
    if let Some(stop) = stop_name(line, "arrival_stop") {
        out.push_str(&format!("   下车站: {}\n", stop));
    }

    let via = safe_int(line.get("via_num"));
    let distance = safe_int(line.get("distance"));
    let minutes = display_minutes(line.get("duration"));
    let fare = safe_int(line.get("price"));
    if via > 0 {
        out.push_str(&format!("   途经: {}站\n", via));
    }
    if distance > 0 {
        out.push_str(&format!("   距离: {}米\n", distance));
    }
    if minutes > 0 {
        out.push_str(&format!("   时间: 约{}分钟\n", minutes));
    }
    if fare > 0 {
        out.push_str(&format!("   票价: {}元\n", fare));
    }
    out.push('\n');
}

fn stop_name<'a>(line: &'a Value, key: &str) -> Option<&'a str> {
    numeric::text(line.get(key)?.get("name"))
}
