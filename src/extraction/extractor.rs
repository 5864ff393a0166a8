//! Pure candidate-to-[`Element`] pipeline (spec §4.4). Visibility gating
//! happens in-page (see [`super::script`]); everything from here on —
//! long-text rejection, danger filtering, dedup, capping, id assignment —
//! is a pure function over the deserialized candidate list, kept
//! independently testable of any browser.

use crate::model::element::{element_id, BoundingBox, Element, ElementKind};
use crate::policy::danger_filter;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub test_id: Option<String>,
    pub css_path: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

fn map_kind(kind: &str) -> ElementKind {
    match kind {
        "link" => ElementKind::Link,
        "tab" => ElementKind::Tab,
        "nav_item" => ElementKind::NavItem,
        "button" => ElementKind::Button,
        _ => ElementKind::Other,
    }
}

/// Long button/non-link text above this length is almost always a
/// misattribution (spec §4.4); link text of any length is legitimate.
const MAX_NON_LINK_TEXT_LEN: usize = 80;

/// Turn raw in-page candidates into capped, deduplicated, danger-filtered
/// [`Element`]s. `per_page_cap` stops iteration once reached, matching the
/// teacher's pattern of capping expensive DOM work at the Rust layer
/// rather than inside the evaluated script.
pub fn extract(candidates: Vec<RawCandidate>, per_page_cap: usize) -> Vec<Element> {
    let mut seen_keys: HashSet<(String, i64, i64)> = HashSet::new();
    let mut out = Vec::new();
    let mut ordinal = 0usize;

    for candidate in candidates {
        if out.len() >= per_page_cap {
            break;
        }

        let kind = map_kind(&candidate.kind);

        if kind != ElementKind::Link && candidate.text.chars().count() > MAX_NON_LINK_TEXT_LEN {
            continue;
        }

        if danger_filter::is_rejected(&candidate.text, candidate.href.as_deref()) {
            continue;
        }

        let dedup_key = (
            candidate.text.clone(),
            candidate.x.round() as i64,
            candidate.y.round() as i64,
        );
        if !seen_keys.insert(dedup_key) {
            continue;
        }

        let selector_or_path = if candidate.css_path.is_empty() {
            candidate.test_id.clone().unwrap_or_default()
        } else {
            candidate.css_path.clone()
        };
        let id = element_id(&selector_or_path, &candidate.text, ordinal);
        ordinal += 1;

        out.push(Element {
            id,
            kind,
            text: candidate.text,
            href: candidate.href,
            aria_label: candidate.aria_label,
            test_id: candidate.test_id,
            css_path: Some(candidate.css_path),
            bounding_box: BoundingBox {
                x: candidate.x,
                y: candidate.y,
                w: candidate.w,
                h: candidate.h,
            },
            resolved_target_state_id: None,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(kind: &str, text: &str, href: Option<&str>, x: f64, y: f64) -> RawCandidate {
        RawCandidate {
            kind: kind.to_string(),
            text: text.to_string(),
            href: href.map(str::to_string),
            aria_label: None,
            test_id: None,
            css_path: "body > a".to_string(),
            x,
            y,
            w: 20.0,
            h: 20.0,
        }
    }

    #[test]
    fn drops_destructive_text() {
        let out = extract(vec![candidate("button", "Log Out", None, 0.0, 0.0)], 30);
        assert!(out.is_empty());
    }

    #[test]
    fn drops_dangerous_href() {
        let out = extract(
            vec![candidate("link", "Report", Some("/r.pdf"), 0.0, 0.0)],
            30,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn drops_overlong_non_link_text() {
        let long = "x".repeat(81);
        let out = extract(vec![candidate("button", &long, None, 0.0, 0.0)], 30);
        assert!(out.is_empty());
    }

    #[test]
    fn keeps_overlong_link_text() {
        let long = "x".repeat(120);
        let out = extract(
            vec![candidate("link", &long, Some("/page"), 0.0, 0.0)],
            30,
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn dedups_by_text_and_rounded_position() {
        let out = extract(
            vec![
                candidate("button", "Next", None, 10.4, 20.4),
                candidate("button", "Next", None, 10.49, 20.49),
            ],
            30,
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn respects_per_page_cap() {
        let many: Vec<_> = (0..10)
            .map(|i| candidate("button", &format!("Item {i}"), None, i as f64, 0.0))
            .collect();
        let out = extract(many, 3);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn assigns_stable_ids_in_ordinal_order() {
        let out = extract(
            vec![
                candidate("button", "A", None, 0.0, 0.0),
                candidate("button", "B", None, 1.0, 0.0),
            ],
            30,
        );
        assert_ne!(out[0].id, out[1].id);
    }
}
