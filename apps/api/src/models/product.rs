//! Validated request data: the product being promoted and the requested platforms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::platform::Platform;

/// A product after validation and normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    /// Rounded to 2 decimals.
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Wire shape of one platform entry: `{ "count": n }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRequest {
    pub count: u32,
}

/// Requested platforms and how many posts to generate for each.
///
/// Only positive counts are stored, so every key is a requested platform.
/// Iterates in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSelection {
    counts: BTreeMap<Platform, u32>,
}

impl PlatformSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests `count` posts for `platform`. A zero count excludes the platform.
    pub fn insert(&mut self, platform: Platform, count: u32) {
        if count == 0 {
            self.counts.remove(&platform);
        } else {
            self.counts.insert(platform, count);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.counts.contains_key(&platform)
    }

    pub fn count(&self, platform: Platform) -> Option<u32> {
        self.counts.get(&platform).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Platform, u32)> + '_ {
        self.counts.iter().map(|(p, c)| (*p, *c))
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.counts.keys().copied()
    }

    /// Converts into the wire map sent by the API client.
    pub fn to_wire(&self) -> BTreeMap<Platform, PlatformRequest> {
        self.iter()
            .map(|(p, count)| (p, PlatformRequest { count }))
            .collect()
    }
}

impl FromIterator<(Platform, u32)> for PlatformSelection {
    fn from_iter<I: IntoIterator<Item = (Platform, u32)>>(iter: I) -> Self {
        let mut selection = Self::new();
        for (platform, count) in iter {
            selection.insert(platform, count);
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_count_excludes_platform() {
        let selection: PlatformSelection =
            [(Platform::X, 0), (Platform::Linkedin, 2)].into_iter().collect();
        assert!(!selection.contains(Platform::X));
        assert_eq!(selection.count(Platform::Linkedin), Some(2));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_selection_iterates_in_catalog_order() {
        let selection: PlatformSelection = [
            (Platform::Linkedin, 1),
            (Platform::X, 3),
            (Platform::Instagram, 2),
        ]
        .into_iter()
        .collect();
        let order: Vec<Platform> = selection.platforms().collect();
        assert_eq!(order, Platform::ALL.to_vec());
    }

    #[test]
    fn test_to_wire_shape() {
        let selection: PlatformSelection = [(Platform::X, 1)].into_iter().collect();
        let json = serde_json::to_value(selection.to_wire()).unwrap();
        assert_eq!(json, serde_json::json!({ "x": { "count": 1 } }));
    }
}
