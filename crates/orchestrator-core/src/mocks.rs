//! Scripted collaborators for tests and the demo binary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::model::{CityAnalysis, Coordinate, IntentResult, LocationPair};
use crate::ports::{AddressPrompt, InterpreterPort, MapPort};

/// Interpreter whose answers are fixed up front. Unscripted calls fail.
#[derive(Default)]
pub struct MockInterpreter {
    intents: HashMap<String, IntentResult>,
    city: Option<CityAnalysis>,
    delimited_reply: Option<String>,
    labeled_reply: Option<String>,
    corrected_address: Option<String>,
    delay: Option<Duration>,
    classify_calls: AtomicUsize,
    city_calls: AtomicUsize,
    delimited_calls: AtomicUsize,
    labeled_calls: AtomicUsize,
    correction_calls: AtomicUsize,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intent<S: Into<String>>(mut self, text: S, intent: IntentResult) -> Self {
        self.intents.insert(text.into(), intent);
        self
    }

    pub fn with_city(mut self, city: CityAnalysis) -> Self {
        self.city = Some(city);
        self
    }

    pub fn with_address_reply<S: Into<String>>(mut self, prompt: AddressPrompt, reply: S) -> Self {
        match prompt {
            AddressPrompt::Delimited => self.delimited_reply = Some(reply.into()),
            AddressPrompt::Labeled => self.labeled_reply = Some(reply.into()),
        }
        self
    }

    pub fn with_corrected_address<S: Into<String>>(mut self, address: S) -> Self {
        self.corrected_address = Some(address.into());
        self
    }

    /// Sleep this long before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn classify_calls(&self) -> usize { self.classify_calls.load(Ordering::SeqCst) }
    pub fn city_calls(&self) -> usize { self.city_calls.load(Ordering::SeqCst) }
    pub fn correction_calls(&self) -> usize { self.correction_calls.load(Ordering::SeqCst) }

    pub fn address_calls(&self, prompt: AddressPrompt) -> usize {
        match prompt {
            AddressPrompt::Delimited => self.delimited_calls.load(Ordering::SeqCst),
            AddressPrompt::Labeled => self.labeled_calls.load(Ordering::SeqCst),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl InterpreterPort for MockInterpreter {
    async fn classify_intent(&self, text: &str) -> Result<IntentResult> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.intents
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow!("unparseable interpreter output for '{}'", text))
    }

    async fn resolve_city(&self, _locations: &LocationPair, _text: &str) -> Result<CityAnalysis> {
        self.city_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.city.clone().ok_or_else(|| anyhow!("city analysis not scripted"))
    }

    async fn format_addresses(&self, _locations: &LocationPair, _city_hint: &str, prompt: AddressPrompt) -> Result<String> {
        let (counter, reply) = match prompt {
            AddressPrompt::Delimited => (&self.delimited_calls, &self.delimited_reply),
            AddressPrompt::Labeled => (&self.labeled_calls, &self.labeled_reply),
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        reply.clone().ok_or_else(|| anyhow!("{:?} reply not scripted", prompt))
    }

    async fn extract_corrected_address(&self, _correction: &str) -> Result<String> {
        self.correction_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.corrected_address.clone().ok_or_else(|| anyhow!("correction not scripted"))
    }
}

/// Map provider answering from canned JSON bodies. Unscripted calls fail.
#[derive(Default)]
pub struct MockMap {
    geocodes: HashMap<String, Value>,
    distance: Option<Value>,
    walking: Option<Value>,
    transit: Option<Value>,
    delay: Option<Duration>,
    walking_calls: AtomicUsize,
    transit_calls: AtomicUsize,
    transit_cities: Mutex<Vec<String>>,
}

impl MockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply `body` when `address` is geocoded.
    pub fn with_geocode<S: Into<String>>(mut self, address: S, body: Value) -> Self {
        self.geocodes.insert(address.into(), body);
        self
    }

    pub fn with_distance(mut self, body: Value) -> Self {
        self.distance = Some(body);
        self
    }

    pub fn with_walking(mut self, body: Value) -> Self {
        self.walking = Some(body);
        self
    }

    pub fn with_transit(mut self, body: Value) -> Self {
        self.transit = Some(body);
        self
    }

    /// Sleep this long before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn walking_calls(&self) -> usize { self.walking_calls.load(Ordering::SeqCst) }
    pub fn transit_calls(&self) -> usize { self.transit_calls.load(Ordering::SeqCst) }

    /// Cities passed to transit queries, in call order.
    pub async fn transit_cities(&self) -> Vec<String> {
        self.transit_cities.lock().await.clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MapPort for MockMap {
    async fn geocode(&self, address: &str) -> Result<Value> {
        self.pause().await;
        Ok(self
            .geocodes
            .get(address)
            .cloned()
            .unwrap_or_else(|| json!({ "status": "1", "count": "0", "geocodes": [] })))
    }

    async fn distance(&self, _origin: &Coordinate, _destination: &Coordinate) -> Result<Value> {
        self.pause().await;
        self.distance.clone().ok_or_else(|| anyhow!("distance not scripted"))
    }

    async fn walking_route(&self, _origin: &Coordinate, _destination: &Coordinate) -> Result<Value> {
        self.walking_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.walking.clone().ok_or_else(|| anyhow!("walking route not scripted"))
    }

    async fn transit_route(&self, _origin: &Coordinate, _destination: &Coordinate, city: &str) -> Result<Value> {
        self.transit_calls.fetch_add(1, Ordering::SeqCst);
        self.transit_cities.lock().await.push(city.to_string());
        self.pause().await;
        self.transit.clone().ok_or_else(|| anyhow!("transit route not scripted"))
    }
}

/// Geocode reply in the provider's `geocodes` shape.
pub fn geocode_reply(location: &str) -> Value {
    json!({ "status": "1", "count": "1", "geocodes": [ { "location": location } ] })
}

pub fn distance_reply(meters: i64) -> Value {
    json!({ "status": "1", "results": [ { "distance": meters.to_string(), "duration": "0" } ] })
}

/// A two-step walk.
pub fn walking_reply(meters: i64, seconds: i64) -> Value {
    json!({
        "status": "1",
        "route": { "paths": [ {
            "distance": meters.to_string(),
            "duration": seconds.to_string(),
            "steps": [
                { "instruction": "沿红荔路向东步行200米右转", "road": "红荔路", "distance": "200", "duration": "160" },
                { "instruction": "向南步行到达终点", "road": [], "distance": (meters - 200).max(0).to_string(), "duration": "320" }
            ]
        } ] }
    })
}

/// One walk-then-metro transit option.
pub fn transit_reply(meters: i64, seconds: i64) -> Value {
    json!({
        "status": "1",
        "route": {
            "distance": meters.to_string(),
            "transits": [ {
                "duration": seconds.to_string(),
                "walking_distance": "480",
                "segments": [ {
                    "walking": { "distance": "300", "duration": "250", "steps": [
                        { "instruction": "向北步行300米", "distance": "300" }
                    ] },
                    "bus": { "buslines": [ {
                        "name": "地铁1号线(罗宝线)(罗湖--机场东)",
                        "type": "地铁线路",
                        "departure_stop": { "name": "购物公园" },
                        "arrival_stop": { "name": "宝安中心" },
                        "via_num": "8",
                        "distance": meters.to_string(),
                        "duration": "1500",
                        "price": "4"
                    } ] }
                } ]
            } ]
        }
    })
}

pub const DEMO_REQUEST: &str = "从莲花山到壹方城怎么走";
pub const DEMO_CITY_ANSWER: &str = "深圳";

/// Collaborators for the 莲花山 → 壹方城 conversation used by the demo.
pub fn demo_collaborators(distance_meters: i64) -> (MockInterpreter, MockMap) {
    let interpreter = MockInterpreter::new()
        .with_intent(
            DEMO_REQUEST,
            IntentResult::RouteRequest { locations: vec!["莲花山".into(), "壹方城".into()] },
        )
        .with_city(CityAnalysis::NeedsInput {
            question: "请问莲花山和壹方城分别在哪个城市？".into(),
            analysis: "莲花山和壹方城在多个城市都有同名地点".into(),
        })
        .with_address_reply(AddressPrompt::Delimited, "深圳市莲花山,深圳市壹方城");
    let maps = MockMap::new()
        .with_geocode("深圳市莲花山", geocode_reply("114.056,22.556"))
        .with_geocode("深圳市壹方城", geocode_reply("113.885,22.557"))
        .with_distance(distance_reply(distance_meters))
        .with_walking(walking_reply(distance_meters, 480))
        .with_transit(transit_reply(distance_meters, 2400));
    (interpreter, maps)
}
