//! Test doubles: wiremock reply templates and a canned `TextGenerator`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use wiremock::ResponseTemplate;

use crate::llm_client::{GenerationError, GenerationRequest, TextGenerator};

// ────────────────────────────────────────────────────────────────────────────
// Responses API replies
// ────────────────────────────────────────────────────────────────────────────

/// A successful Responses API envelope carrying `text`.
pub fn output_text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "output": [{
            "type": "message",
            "content": [{ "type": "output_text", "text": text }]
        }],
        "usage": { "input_tokens": 12, "output_tokens": 34 }
    }))
}

/// An OpenAI-style error envelope.
pub fn api_error_reply(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "error": { "message": message } }))
}

// ────────────────────────────────────────────────────────────────────────────
// Canned generator
// ────────────────────────────────────────────────────────────────────────────

/// What the mock generator does on every call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Reply(String),
    RateLimited,
    AuthFailure,
}

/// A `TextGenerator` that never touches the network and counts its calls.
pub struct MockGenerator {
    behavior: MockBehavior,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Reply(text.into()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match &self.behavior {
            MockBehavior::Reply(text) => Ok(text.clone()),
            MockBehavior::RateLimited => Err(GenerationError::RateLimited { attempts: 3 }),
            MockBehavior::AuthFailure => Err(GenerationError::Auth("bad key".to_string())),
        }
    }
}
