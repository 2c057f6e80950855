//! Response Parser — decodes the generator's structured output into posts.
//!
//! The output schema is enforced at the API boundary, so anything that fails to
//! decode is a contract violation and is never retried.

use serde::Deserialize;
use tracing::warn;

use crate::llm_client::GenerationError;
use crate::models::platform::Platform;
use crate::models::post::GeneratedPost;
use crate::models::product::PlatformSelection;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GeneratedPayload {
    array: Vec<GeneratedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GeneratedEntry {
    platform: Platform,
    #[serde(alias = "content")]
    post: String,
}

/// Decodes `raw` and maps each entry to a `GeneratedPost`, preserving order.
///
/// Only a platform that was not requested is rejected beyond what serde enforces.
/// An empty `array` yields no posts. Over-length posts are kept and logged.
pub fn parse_posts(
    raw: &str,
    requested: &PlatformSelection,
) -> Result<Vec<GeneratedPost>, GenerationError> {
    let payload: GeneratedPayload = serde_json::from_str(raw.trim())
        .map_err(|e| GenerationError::Parse(e.to_string()))?;

    payload
        .array
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if !requested.contains(entry.platform) {
                return Err(GenerationError::Parse(format!(
                    "entry {index} is for unrequested platform '{}'",
                    entry.platform
                )));
            }

            let max_length = entry.platform.spec().max_length;
            let length = entry.post.chars().count();
            if length > max_length {
                warn!(
                    "Generated {} post exceeds character limit ({length}/{max_length})",
                    entry.platform.spec().display_name
                );
            }

            Ok(GeneratedPost {
                platform: entry.platform,
                content: entry.post,
            })
        })
        .collect()
}
