use serde::{Deserialize, Serialize};

use crate::models::platform::Platform;

/// A single generated post. Only the response parser constructs these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub platform: Platform,
    pub content: String,
}

/// Body of a successful `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub posts: Vec<GeneratedPost>,
}
