//! Platform catalog — the fixed set of supported social networks and their limits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Static limits for a single platform. Compiled in; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformSpec {
    pub display_name: &'static str,
    pub max_length: usize,
    pub hashtag_limit: u32,
}

/// A supported social-media platform. Serialized as its wire id (`x`, `instagram`, `linkedin`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    X,
    Instagram,
    Linkedin,
}

impl Platform {
    /// Catalog order. Prompts and selections iterate platforms in this order.
    pub const ALL: [Platform; 3] = [Platform::X, Platform::Instagram, Platform::Linkedin];

    pub fn id(self) -> &'static str {
        match self {
            Platform::X => "x",
            Platform::Instagram => "instagram",
            Platform::Linkedin => "linkedin",
        }
    }

    /// Looks up a platform by wire id. Ids are matched exactly.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn spec(self) -> PlatformSpec {
        match self {
            Platform::X => PlatformSpec {
                display_name: "Twitter/X",
                max_length: 280,
                hashtag_limit: 3,
            },
            Platform::Instagram => PlatformSpec {
                display_name: "Instagram",
                max_length: 2200,
                hashtag_limit: 30,
            },
            Platform::Linkedin => PlatformSpec {
                display_name: "LinkedIn",
                max_length: 3000,
                hashtag_limit: 5,
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
