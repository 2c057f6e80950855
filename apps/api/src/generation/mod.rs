// Post generation: validate → build prompt → call generator → parse.
// All generator calls go through llm_client::TextGenerator.

pub mod generator;
pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod validation;
