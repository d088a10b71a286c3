use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use orchestrator_core::model::{CityAnalysis, IntentResult, LocationPair};
use orchestrator_core::ports::{AddressPrompt, InterpreterPort};

use crate::extractors::json::parse_payload;
use crate::prompts;
use crate::types::{CityPayload, IntentPayload};

const TEMPERATURE: f32 = 0.1;

/// Interpreter backed by an OpenAI-compatible chat model.
pub struct LlmInterpreter {
    client: llm::Client,
}

impl LlmInterpreter {
    pub fn new(client: llm::Client) -> Self {
        info!(provider = ?client.provider(), model = %client.model(), "interpreter ready");
        Self { client }
    }

    /// Provider and credentials from the environment; see [`llm::Client::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(llm::Client::from_env()?))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    async fn ask(&self, step: &'static str, messages: Vec<llm::ChatMessage>, json_object: bool) -> Result<String> {
        for message in &messages {
            debug!(step, role = ?message.role, content = %message.content, "prompt");
        }
        let options = llm::ChatOptions { temperature: Some(TEMPERATURE), json_object };
        let reply = self.client.chat(&messages, options).await?;
        debug!(step, reply = %reply, "model reply");
        Ok(reply)
    }
}

#[async_trait]
impl InterpreterPort for LlmInterpreter {
    async fn classify_intent(&self, text: &str) -> Result<IntentResult> {
        let messages = vec![
            llm::ChatMessage::system(prompts::INTENT_SYSTEM),
            llm::ChatMessage::user(prompts::intent_user(text)),
        ];
        let reply = self.ask("intent", messages, true).await?;
        let payload: IntentPayload = parse_payload(&reply)?;
        Ok(payload.into())
    }

    async fn resolve_city(&self, locations: &LocationPair, text: &str) -> Result<CityAnalysis> {
        let messages = vec![llm::ChatMessage::system(prompts::city_system(locations, text))];
        let reply = self.ask("city", messages, true).await?;
        let payload: CityPayload = parse_payload(&reply)?;
        Ok(payload.into_analysis(locations))
    }

    async fn format_addresses(&self, locations: &LocationPair, city_hint: &str, prompt: AddressPrompt) -> Result<String> {
        let text = match prompt {
            AddressPrompt::Delimited => prompts::delimited_addresses(locations, city_hint),
            AddressPrompt::Labeled => prompts::labeled_addresses(locations, city_hint),
        };
        self.ask("address", vec![llm::ChatMessage::system(text)], false).await
    }

    async fn extract_corrected_address(&self, correction: &str) -> Result<String> {
        let messages = vec![llm::ChatMessage::system(prompts::corrected_address(correction))];
        let reply = self.ask("correction", messages, false).await?;
        Ok(reply.trim().to_string())
    }
}
