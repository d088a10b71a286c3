use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::model::{CityAnalysis, Coordinate, IntentResult, LocationPair};

/// Which address-reformatting prompt to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPrompt {
    /// Two addresses on one line, comma separated.
    Delimited,
    /// Two labeled lines ("第一个地址：…").
    Labeled,
}

/// Natural-language collaborator.
#[async_trait]
pub trait InterpreterPort: Send + Sync {
    async fn classify_intent(&self, text: &str) -> Result<IntentResult>;

    async fn resolve_city(&self, locations: &LocationPair, text: &str) -> Result<CityAnalysis>;

    /// Raw model text; parsing belongs to the address formatter.
    async fn format_addresses(&self, locations: &LocationPair, city_hint: &str, prompt: AddressPrompt) -> Result<String>;

    async fn extract_corrected_address(&self, correction: &str) -> Result<String>;
}

/// Mapping backend. Every call returns the provider's JSON body untouched.
#[async_trait]
pub trait MapPort: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Value>;

    async fn distance(&self, origin: &Coordinate, destination: &Coordinate) -> Result<Value>;

    async fn walking_route(&self, origin: &Coordinate, destination: &Coordinate) -> Result<Value>;

    async fn transit_route(&self, origin: &Coordinate, destination: &Coordinate, city: &str) -> Result<Value>;
}
