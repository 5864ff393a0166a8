//! DOM Fingerprinter (spec §4.5) — a bounded structural digest of the main
//! content area, used as the DOM-state axis of node identity.

use crate::browser::BrowserCapability;
use anyhow::Result;

/// Evaluated in-page. Walks the main content root to depth 4 emitting
/// `<tagname>` with an optional `role="…"`, skipping text, other
/// attributes, and styling entirely. Mirrors the element-extraction
/// script's pattern of doing all DOM traversal inside `evaluate`.
pub const FINGERPRINT_SCRIPT: &str = r#"
(() => {
  const root = document.querySelector('main')
    || document.querySelector('[role="main"]')
    || document.getElementById('root')
    || document.querySelector('.dataframe-dashboard')
    || document.body;
  if (!root) return '';

  const parts = [];
  const walk = (node, depth) => {
    if (!node || depth > 4) return;
    if (node.nodeType !== 1) return;
    const tag = node.tagName.toLowerCase();
    const role = node.getAttribute && node.getAttribute('role');
    parts.push(role ? `<${tag} role="${role}">` : `<${tag}>`);
    for (const child of node.children) {
      walk(child, depth + 1);
    }
  };
  walk(root, 0);
  return parts.join('');
})()
"#;

/// MD5 hex of the walked structural string. Empty input produces the empty
/// digest by convention, and callers must treat that as "no fingerprint"
/// (a URL-only node), not as a genuine empty-DOM fingerprint.
pub fn digest(structural_dump: &str) -> String {
    if structural_dump.is_empty() {
        return String::new();
    }
    format!("{:x}", md5::compute(structural_dump.as_bytes()))
}

pub struct Fingerprinter;

impl Fingerprinter {
    /// Runs the walker script against the live page and digests the result.
    /// A script failure is treated as an empty fingerprint per spec §4.11
    /// ("Fingerprint failure: treat as empty fingerprint").
    pub async fn compute(page: &dyn BrowserCapability) -> Result<String> {
        let dump = match page.evaluate(FINGERPRINT_SCRIPT).await {
            Ok(value) => value.as_str().unwrap_or_default().to_string(),
            Err(_) => String::new(),
        };
        Ok(digest(&dump))
    }
}
