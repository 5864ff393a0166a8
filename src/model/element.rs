//! Element — an interactive DOM element observed on some page (spec §3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Link,
    Button,
    Tab,
    NavItem,
    Dropdown,
    Input,
    Other,
}

impl ElementKind {
    /// Priority used to order Phase 2 candidates: tab > nav-item > button > other.
    pub fn click_priority(self) -> u8 {
        match self {
            ElementKind::Tab => 0,
            ElementKind::NavItem => 1,
            ElementKind::Button => 2,
            ElementKind::Other => 3,
            ElementKind::Link | ElementKind::Input | ElementKind::Dropdown => 255,
        }
    }

    /// Does this kind carry an href the explorer should follow directly
    /// (Phase 1), rather than clicking (Phase 2)?
    pub fn is_url_typed(self) -> bool {
        matches!(self, ElementKind::Link)
    }

    /// Should the explorer attempt to click this kind at all during
    /// Phase 2? `input`/`dropdown` are deliberately excluded from
    /// exploration per spec §9.
    pub fn is_clickable_in_exploration(self) -> bool {
        matches!(
            self,
            ElementKind::Button | ElementKind::Tab | ElementKind::NavItem | ElementKind::Other
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub kind: ElementKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_path: Option<String>,
    pub bounding_box: BoundingBox,
    /// Filled in once the element has been clicked/followed and a
    /// resulting state identified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_target_state_id: Option<String>,
}

impl Element {
    /// A minimal descriptor sufficient to replay a click on this element
    /// from a different page load (spec §4.10, Replay Recursion).
    pub fn replay_descriptor(&self) -> ReplayDescriptor {
        ReplayDescriptor {
            css_path: self.css_path.clone(),
            text: self.text.clone(),
            test_id: self.test_id.clone(),
        }
    }

    /// The `(text, round(x), round(y))` dedup key used both for
    /// within-page extraction dedup and for the node-level "no duplicate
    /// elements" invariant.
    pub fn dedup_key(&self) -> (String, i64, i64) {
        (
            self.text.clone(),
            self.bounding_box.x.round() as i64,
            self.bounding_box.y.round() as i64,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayDescriptor {
    pub css_path: Option<String>,
    pub text: String,
    pub test_id: Option<String>,
}

/// Stable element id: MD5, truncated to the first 10 hex characters, of
/// `(css_path || selector) + "-" + text + "-" + ordinal`.
pub fn element_id(css_path_or_selector: &str, text: &str, ordinal: usize) -> String {
    let input = format!("{}-{}-{}", css_path_or_selector, text, ordinal);
    let digest = md5::compute(input.as_bytes());
    format!("{:x}", digest)[..10].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_id_is_deterministic() {
        let a = element_id("body > div > button", "Submit", 0);
        let b = element_id("body > div > button", "Submit", 0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn element_id_varies_with_ordinal() {
        let a = element_id("body > button", "Next", 0);
        let b = element_id("body > button", "Next", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn click_priority_orders_tab_before_button() {
        assert!(ElementKind::Tab.click_priority() < ElementKind::Button.click_priority());
        assert!(ElementKind::NavItem.click_priority() < ElementKind::Button.click_priority());
    }
}
