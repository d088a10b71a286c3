//! Value types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::numeric::{self, safe_int};

/// Origin and destination as the user mentioned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPair {
    pub origin: String,
    pub destination: String,
}

impl LocationPair {
    /// Exactly two non-empty mentions, or nothing.
    pub fn from_mentions(mentions: &[String]) -> Option<Self> {
        match mentions {
            [origin, destination] => {
                let (origin, destination) = (origin.trim(), destination.trim());
                if origin.is_empty() || destination.is_empty() {
                    return None;
                }
                Some(Self { origin: origin.to_string(), destination: destination.to_string() })
            }
            _ => None,
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        vec![self.origin.clone(), self.destination.clone()]
    }
}

/// Outcome of intent classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntentResult {
    RouteRequest { locations: Vec<String> },
    Correction { correction_info: String, suggested_address: String },
    Other { reason: String },
}

/// Outcome of city disambiguation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CityAnalysis {
    Resolved { suggested_city_info: String, analysis: String },
    NeedsInput { question: String, analysis: String },
}

/// Analysis text shown when the interpreter could not place the locations.
pub const UNANALYSED_CITY: &str = "无法分析地点归属";

impl CityAnalysis {
    pub fn fallback_question(locations: &LocationPair) -> String {
        format!("请告诉我'{}'和'{}'分别在哪个城市？", locations.origin, locations.destination)
    }

    /// Deterministic question used when the interpreter cannot analyse the locations.
    pub fn fallback(locations: &LocationPair) -> Self {
        CityAnalysis::NeedsInput {
            question: Self::fallback_question(locations),
            analysis: UNANALYSED_CITY.to_string(),
        }
    }
}

/// Map-provider coordinate string, never parsed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate(pub String);

impl Coordinate {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two fully-qualified addresses the pipeline geocodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedAddresses {
    pub origin: String,
    pub destination: String,
}

/// One walking instruction, passed through from the map provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step(pub Value);

impl Step {
    pub fn instruction(&self) -> Option<&str> {
        numeric::text(self.0.get("instruction"))
    }

    pub fn road_name(&self) -> Option<&str> {
        numeric::text(self.0.get("road_name")).or_else(|| numeric::text(self.0.get("road")))
    }

    pub fn distance_meters(&self) -> i64 {
        safe_int(self.0.get("distance"))
    }

    pub fn duration_minutes(&self) -> i64 {
        numeric::display_minutes(self.0.get("duration"))
    }
}

/// One leg of a transit option: an optional walk and an optional ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment(pub Value);

impl Segment {
    pub fn walking(&self) -> Option<&Value> {
        self.0.get("walking").filter(|w| numeric::is_present(Some(w)))
    }

    pub fn bus(&self) -> Option<&Value> {
        self.0.get("bus").filter(|b| numeric::is_present(Some(b)))
    }

    /// First listed line of the ride, if the segment has one.
    pub fn first_line(&self) -> Option<&Value> {
        self.bus()?.get("buslines")?.as_array()?.first()
    }

    pub fn has_ride(&self) -> bool {
        self.bus().map(|b| numeric::is_present(b.get("buslines"))).unwrap_or(false)
    }
}

/// Computed itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoutePlan {
    Walking {
        distance_meters: i64,
        duration_minutes: i64,
        steps: Vec<Step>,
    },
    Transit {
        duration_minutes: i64,
        walking_distance_meters: i64,
        segments: Vec<Segment>,
        distance_meters: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelMode {
    Walking,
    Transit,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Walking => write!(f, "walking"),
            TravelMode::Transit => write!(f, "transit"),
        }
    }
}
