//! Node — a distinct UI state (spec §3).

use super::element::Element;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub url: String,
    pub normalized_url: String,
    pub title: String,
    pub is_entry_point: bool,
    pub elements: Vec<Element>,
    #[serde(default)]
    pub console_errors: Vec<String>,
    pub load_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    pub dom_fingerprint: String,
    pub depth: usize,
    pub timestamp: DateTime<Utc>,
}

/// Node identity: MD5 of `normalizedUrl + "#" + domFingerprint`.
/// URL-only nodes (empty fingerprint) hash `normalizedUrl + "#"`, per the
/// asymmetry spec.md §9's Open Questions calls out as intentional.
pub fn node_id(normalized_url: &str, dom_fingerprint: &str) -> String {
    let input = format!("{}#{}", normalized_url, dom_fingerprint);
    format!("{:x}", md5::compute(input.as_bytes()))
}

impl Node {
    /// Returns `true` if the element list has two elements sharing the
    /// `(text, round(x), round(y))` key — violates the node invariant.
    pub fn has_duplicate_elements(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        for el in &self.elements {
            if !seen.insert(el.dedup_key()) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_a_pure_function_of_url_and_fingerprint() {
        let a = node_id("https://ex.test/", "abc123");
        let b = node_id("https://ex.test/", "abc123");
        assert_eq!(a, b);
    }

    #[test]
    fn node_id_distinguishes_empty_fingerprint_from_missing_hash_char() {
        let with_empty = node_id("https://ex.test/", "");
        let with_value = node_id("https://ex.test/", "x");
        assert_ne!(with_empty, with_value);
    }
}
