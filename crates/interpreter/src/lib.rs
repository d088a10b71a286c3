pub mod extractors;
pub mod prompts;
pub mod providers;
pub mod types;

pub use extractors::json::{extract_json_object, parse_payload};
pub use providers::openai::LlmInterpreter;
pub use types::{CityPayload, IntentPayload};
