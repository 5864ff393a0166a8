//! Danger Filter (spec §4.3) — refuse to click elements that could destroy
//! state (logout, delete, unsubscribe, ...).

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::sync::OnceLock;

const DESTRUCTIVE_VERBS: &[&str] = &[
    "logout",
    "log out",
    "sign out",
    "signout",
    "exit",
    "delete",
    "remove",
    "destroy",
    "erase",
    "purge",
    "cancel subscription",
    "deactivate",
    "close account",
    "unsubscribe",
    "revoke",
    "terminate",
];

const BINARY_DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "exe", "dmg", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv",
];

fn verb_matcher() -> &'static AhoCorasick {
    static MATCHER: OnceLock<AhoCorasick> = OnceLock::new();
    MATCHER.get_or_init(|| {
        AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostFirst)
            .build(DESTRUCTIVE_VERBS)
            .expect("static verb list always compiles")
    })
}

/// Case-insensitive substring match against the destructive-verb list.
pub fn text_is_destructive(text: &str) -> bool {
    verb_matcher().is_match(text)
}

/// Reject by href: `mailto:`, `tel:`, `javascript:void`, bare `#`, or a
/// binary-document extension.
pub fn href_is_dangerous(href: &str) -> bool {
    let trimmed = href.trim();
    if trimmed == "#" {
        return true;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with("mailto:") || lower.starts_with("tel:") || lower.starts_with("javascript:void") {
        return true;
    }

    let path_part = lower.split(['?', '#']).next().unwrap_or(&lower);
    if let Some(ext) = path_part.rsplit('.').next() {
        if path_part.contains('.') && BINARY_DOCUMENT_EXTENSIONS.contains(&ext) {
            return true;
        }
    }
    false
}

/// Should this candidate (text + optional href) be rejected entirely from
/// extraction output?
pub fn is_rejected(text: &str, href: Option<&str>) -> bool {
    if text_is_destructive(text) {
        return true;
    }
    if let Some(href) = href {
        if href_is_dangerous(href) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_logout_case_insensitively() {
        assert!(is_rejected("Log Out", None));
        assert!(is_rejected("LOGOUT", None));
        assert!(is_rejected("  sign out now", None));
    }

    #[test]
    fn rejects_delete_and_unsubscribe() {
        assert!(is_rejected("Delete account", None));
        assert!(is_rejected("Unsubscribe", None));
    }

    #[test]
    fn accepts_benign_text() {
        assert!(!is_rejected("View Dashboard", None));
    }

    #[test]
    fn rejects_mailto_and_tel_and_bare_hash() {
        assert!(is_rejected("Contact", Some("mailto:a@b.com")));
        assert!(is_rejected("Call", Some("tel:+15551234")));
        assert!(is_rejected("Anchor", Some("#")));
    }

    #[test]
    fn rejects_binary_document_hrefs() {
        assert!(is_rejected("Report", Some("/files/report.pdf")));
        assert!(is_rejected("Archive", Some("/downloads/app.zip")));
        assert!(is_rejected("Sheet", Some("/export.xlsx")));
    }

    #[test]
    fn href_with_query_string_still_detects_extension() {
        assert!(is_rejected("Report", Some("/files/report.pdf?v=2")));
    }

    #[test]
    fn accepts_normal_page_href() {
        assert!(!is_rejected("About", Some("/about")));
    }
}
