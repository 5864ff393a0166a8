//! Click Dispatcher (spec §4.6) — ordered fallback strategies, each
//! bounded by a per-strategy timeout, never throwing.

use crate::browser::{BrowserCapability, ClickOptions, Locator};
use crate::model::element::{BoundingBox, ReplayDescriptor};
use std::time::Duration;
use tracing::debug;

/// Per-strategy timeout (spec §4.6: "~3s").
pub const STRATEGY_TIMEOUT: Duration = Duration::from_secs(3);

/// Everything the dispatcher needs to try all five strategies against a
/// live element.
#[derive(Debug, Clone)]
pub struct ClickTarget {
    pub css_path: Option<String>,
    pub test_id: Option<String>,
    pub text: String,
    pub aria_label: Option<String>,
    pub bounding_box: BoundingBox,
}

impl ClickTarget {
    pub fn replay_descriptor(&self) -> ReplayDescriptor {
        ReplayDescriptor {
            css_path: self.css_path.clone(),
            text: self.text.clone(),
            test_id: self.test_id.clone(),
        }
    }
}

async fn try_locator(page: &dyn BrowserCapability, locator: Locator) -> bool {
    let result = tokio::time::timeout(
        STRATEGY_TIMEOUT,
        page.click(&locator, ClickOptions::default()),
    )
    .await;
    match result {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!("click strategy {:?} failed: {}", locator, e);
            false
        }
        Err(_) => {
            debug!("click strategy {:?} timed out", locator);
            false
        }
    }
}

/// Full five-strategy dispatch for a live, newly-extracted element.
pub async fn dispatch(page: &dyn BrowserCapability, target: &ClickTarget) -> bool {
    if let Some(css_path) = &target.css_path {
        if try_locator(page, Locator::Css(css_path.clone())).await {
            return true;
        }
    }
    if let Some(test_id) = &target.test_id {
        let selector = format!("[data-testid=\"{test_id}\"], [data-test-id=\"{test_id}\"]");
        if try_locator(page, Locator::TestId(selector)).await {
            return true;
        }
    }
    if !target.text.is_empty() {
        if try_locator(page, Locator::ExactText(target.text.clone())).await {
            return true;
        }
    }
    if let Some(aria_label) = &target.aria_label {
        let selector = format!("[aria-label=\"{aria_label}\"]");
        if try_locator(page, Locator::AriaLabel(selector)).await {
            return true;
        }
    }
    let bbox = &target.bounding_box;
    let (cx, cy) = (bbox.x, bbox.y);
    if try_locator(page, Locator::Point(cx, cy)).await {
        return true;
    }
    false
}

/// Replay variant (spec §4.6): restricted to strategies 1-3, used when
/// reconstructing an SPA state via a click-path replay. If any step in a
/// path fails the caller abandons the whole replay — this function only
/// attempts a single step.
pub async fn dispatch_replay(page: &dyn BrowserCapability, descriptor: &ReplayDescriptor) -> bool {
    if let Some(css_path) = &descriptor.css_path {
        if try_locator(page, Locator::Css(css_path.clone())).await {
            return true;
        }
    }
    if let Some(test_id) = &descriptor.test_id {
        let selector = format!("[data-testid=\"{test_id}\"], [data-test-id=\"{test_id}\"]");
        if try_locator(page, Locator::TestId(selector)).await {
            return true;
        }
    }
    if !descriptor.text.is_empty() {
        if try_locator(page, Locator::ExactText(descriptor.text.clone())).await {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::ScriptedBrowser;
    use crate::browser::{ConsoleMessage, WaitMode};
    use std::collections::HashMap;

    fn target_for(css_path: &str, text: &str) -> ClickTarget {
        ClickTarget {
            css_path: Some(css_path.to_string()),
            test_id: None,
            text: text.to_string(),
            aria_label: None,
            bounding_box: BoundingBox::default(),
        }
    }

    #[tokio::test]
    async fn first_strategy_success_short_circuits() {
        use crate::browser::mock::ScriptedPage;
        let page = ScriptedPage {
            url: "https://example.test/".to_string(),
            title: "Home".to_string(),
            click_targets: HashMap::from([("button.cta".to_string(), None)]),
            ..Default::default()
        };
        let browser = ScriptedBrowser::new(vec![page]);
        browser
            .goto("https://example.test/", WaitMode::Load, std::time::Duration::from_secs(1))
            .await
            .unwrap();

        let target = target_for("button.cta", "Get Started");
        let ok = dispatch(&browser, &target).await;
        assert!(ok);
        let (_, clicks) = browser.history();
        assert_eq!(clicks, vec!["button.cta".to_string()]);
    }

    #[tokio::test]
    async fn all_strategies_fail_returns_false() {
        use crate::browser::mock::ScriptedPage;
        let page = ScriptedPage {
            url: "https://example.test/".to_string(),
            title: "Home".to_string(),
            ..Default::default()
        };
        let browser = ScriptedBrowser::new(vec![page]);
        browser
            .goto("https://example.test/", WaitMode::Load, std::time::Duration::from_secs(1))
            .await
            .unwrap();

        let target = target_for("button.missing", "Nope");
        let ok = dispatch(&browser, &target).await;
        assert!(!ok);
        let _: Option<ConsoleMessage> = None;
    }
}
