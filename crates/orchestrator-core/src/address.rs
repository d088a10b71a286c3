//! Turn raw location mentions plus a city hint into two full addresses.
//!
//! Strategies are tried in order, each with its own prompt; the first one whose
//! reply parses into a complete pair wins. A reply that yields fewer than two
//! addresses is never returned as a partial pair.

use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::model::{FormattedAddresses, LocationPair};
use crate::ports::AddressPrompt;

/// One prompt style and the parser for its replies.
pub trait AddressStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn prompt(&self) -> AddressPrompt;

    fn parse(&self, reply: &str) -> Option<FormattedAddresses>;
}

/// `城市市地点1,城市市地点2` on a single line.
pub struct DelimitedStrategy;

impl AddressStrategy for DelimitedStrategy {
    fn name(&self) -> &'static str { "delimited" }

    fn prompt(&self) -> AddressPrompt { AddressPrompt::Delimited }

    fn parse(&self, reply: &str) -> Option<FormattedAddresses> {
        let parts: Vec<&str> = reply.trim().split(',').map(str::trim).collect();
        match parts.as_slice() {
            [origin, destination] if !origin.is_empty() && !destination.is_empty() => Some(FormattedAddresses {
                origin: origin.to_string(),
                destination: destination.to_string(),
            }),
            _ => None,
        }
    }
}

/// Words that mark a label line rather than an address.
const LABEL_WORDS: [&str; 4] = ["第一", "第二", "first", "second"];

/// Two lines such as `第一个地址：深圳市莲花山`; bare lines count unless they are labels.
pub struct LabeledLinesStrategy;

impl LabeledLinesStrategy {
    fn line_value(line: &str) -> Option<String> {
        for sep in ['：', ':'] {
            if line.contains(sep) {
                let value = line.split(sep).nth(1).unwrap_or("").trim();
                return (!value.is_empty()).then(|| value.to_string());
            }
        }
        let lower = line.to_lowercase();
        if LABEL_WORDS.iter().any(|w| lower.contains(w)) {
            None
        } else {
            Some(line.to_string())
        }
    }
}

impl AddressStrategy for LabeledLinesStrategy {
    fn name(&self) -> &'static str { "labeled_lines" }

    fn prompt(&self) -> AddressPrompt { AddressPrompt::Labeled }

    fn parse(&self, reply: &str) -> Option<FormattedAddresses> {
        let mut found = reply
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .filter_map(Self::line_value);
        let origin = found.next()?;
        let destination = found.next()?;
        Some(FormattedAddresses { origin, destination })
    }
}

/// Runs the strategies in order against the interpreter.
pub struct AddressFormatter {
    strategies: Vec<Box<dyn AddressStrategy>>,
}

impl AddressFormatter {
    pub fn new(strategies: Vec<Box<dyn AddressStrategy>>) -> Self {
        Self { strategies }
    }

    /// Ask the interpreter once per strategy until a reply parses.
    ///
    /// `ask` performs the interpreter call; the orchestrator passes a closure
    /// that applies its per-call timeout.
    pub async fn format_with<F, Fut>(
        &self,
        locations: &LocationPair,
        city_hint: &str,
        mut ask: F,
    ) -> Result<FormattedAddresses, PipelineError>
    where
        F: FnMut(AddressPrompt) -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<String>>,
    {
        for strategy in &self.strategies {
            info!(strategy = strategy.name(), origin = %locations.origin, destination = %locations.destination, city_hint = %city_hint, "formatting addresses");
            match ask(strategy.prompt()).await {
                Ok(reply) => {
                    debug!(strategy = strategy.name(), reply = %reply, "address reply");
                    if let Some(addresses) = strategy.parse(&reply) {
                        info!(origin = %addresses.origin, destination = %addresses.destination, "addresses formatted");
                        return Ok(addresses);
                    }
                    warn!(strategy = strategy.name(), "address reply did not parse");
                }
                Err(e) => warn!(strategy = strategy.name(), error = %e, "address formatting call failed"),
            }
        }
        Err(PipelineError::AddressFormattingFailed)
    }
}

impl Default for AddressFormatter {
    fn default() -> Self {
        Self::new(vec![Box::new(DelimitedStrategy), Box::new(LabeledLinesStrategy)])
    }
}
