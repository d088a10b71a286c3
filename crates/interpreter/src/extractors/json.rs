use serde::de::DeserializeOwned;

use orchestrator_core::error::PipelineError;

/// Slice from the first `{` to the last `}`; models like to wrap JSON in prose or fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into `T`, tolerating text around the object.
pub fn parse_payload<T: DeserializeOwned>(reply: &str) -> Result<T, PipelineError> {
    let body = extract_json_object(reply).unwrap_or(reply);
    serde_json::from_str(body).map_err(|e| PipelineError::InterpretationMalformed(format!("{}: {}", e, reply)))
}
