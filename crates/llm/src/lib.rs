use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client as Http;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq)]
pub enum Provider {
    OpenAi,
    Groq,
}

impl Provider {
    fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Groq => "https://api.groq.com/openai/v1",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    http: Http,
    provider: Provider,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role { System, User, Assistant }

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    /// If true, request JSON-only output (`json_object`) when provider supports it.
    pub json_object: bool,
}

impl Client {
    pub fn new(provider: Provider, api_key: String, model: String) -> Result<Self> {
        Self::with_timeout(provider, api_key, model, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(provider: Provider, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let base_url = provider.default_base_url().to_string();
        Ok(Self {
            http: Http::builder()
                .pool_max_idle_per_host(8)
                .timeout(timeout)
                .build()?,
            provider, api_key, model, base_url,
        })
    }

    /// Point the client at another OpenAI-compatible endpoint (proxy, self-hosted gateway).
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convenience: pick up OPENAI_API_KEY / OPENAI_MODEL / OPENAI_BASE_URL from env.
    pub fn from_env_openai() -> Result<Self> {
        let key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let client = Self::new(Provider::OpenAi, key, model)?;
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    /// Convenience: pick up GROQ_API_KEY / GROQ_MODEL from env.
    pub fn from_env_groq() -> Result<Self> {
        let key = std::env::var("GROQ_API_KEY").context("GROQ_API_KEY not set")?;
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| "llama-3.1-8b-instant".to_string());
        Self::new(Provider::Groq, key, model)
    }

    /// LLM_PROVIDER selects `openai` (default) or `groq`.
    pub fn from_env() -> Result<Self> {
        match std::env::var("LLM_PROVIDER").unwrap_or_default().trim().to_lowercase().as_str() {
            "" | "openai" => Self::from_env_openai(),
            "groq" => Self::from_env_groq(),
            other => Err(anyhow!("unknown LLM_PROVIDER: {}", other)),
        }
    }

    pub fn provider(&self) -> &Provider { &self.provider }

    pub fn model(&self) -> &str { &self.model }

    /// Both providers speak the OpenAI Chat Completions dialect.
    pub async fn chat(&self, messages: &[ChatMessage], opts: ChatOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = completion_body(&self.model, messages, &opts);
        debug!(model = %self.model, messages = messages.len(), "chat completion request");

        let resp = self.http.post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send().await
            .context("request failed")?;

        if !resp.status().is_success() {
            return Err(anyhow!("{:?} {}: {}", self.provider, resp.status(), resp.text().await.unwrap_or_default()));
        }

        let v: Value = resp.json().await.context("invalid json")?;
        extract_content(&v)
    }

    /// Simple helper for one-shot prompts.
    pub async fn simple(&self, prompt: &str) -> Result<String> {
        let msgs = vec![ChatMessage::user(prompt)];
        self.chat(&msgs, ChatOptions::default()).await
    }
}

fn completion_body(model: &str, messages: &[ChatMessage], opts: &ChatOptions) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
        "temperature": opts.temperature.unwrap_or(0.0)
    });
    if opts.json_object {
        body["response_format"] = json!({ "type": "json_object" });
    }
    body
}

fn extract_content(v: &Value) -> Result<String> {
    let content = v.pointer("/choices/0/message/content")
        .and_then(|x| x.as_str())
        .ok_or_else(|| anyhow!("missing choices[0].message.content"))?;
    Ok(content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_requests_json_object_only_when_asked() {
        let msgs = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let plain = completion_body("gpt-4o", &msgs, &ChatOptions::default());
        assert!(plain.get("response_format").is_none());
        assert_eq!(plain["messages"][0]["role"], "system");
        assert_eq!(plain["messages"][1]["content"], "hi");

        let json_mode = completion_body("gpt-4o", &msgs, &ChatOptions { temperature: Some(0.1), json_object: true });
        assert_eq!(json_mode["response_format"]["type"], "json_object");
    }

    #[test]
    fn content_is_trimmed_and_required() {
        let v = json!({ "choices": [ { "message": { "content": "  深圳市莲花山,深圳市壹方城 \n" } } ] });
        assert_eq!(extract_content(&v).unwrap(), "深圳市莲花山,深圳市壹方城");
        assert!(extract_content(&json!({ "choices": [] })).is_err());
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let client = Client::new(Provider::OpenAi, "k".into(), "gpt-4o".into())
            .unwrap()
            .with_base_url("http://localhost:9000/v1/");
        assert_eq!(client.base_url, "http://localhost:9000/v1");
    }
}
