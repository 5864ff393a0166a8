//! Framework Settler (spec §4.8) — race a mutation-observer-style poll
//! against a fixed grace window so the explorer never captures a
//! half-rendered DOM. Grounded on the teacher's innerText-length-stability
//! polling loop in `features::non_robot_search`.

use crate::browser::BrowserCapability;
use std::time::Duration;
use tracing::debug;

/// Fixed grace window applied unconditionally, matching the teacher's
/// settle delay after navigation/click.
pub const GRACE_WINDOW: Duration = Duration::from_millis(1500);

/// Upper bound on how long the stability poll itself may run before the
/// settler gives up and falls through to the grace window alone.
const STABILITY_POLL_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Checks `document.body.innerText.length` (or 0 on a detached/empty body)
/// twice, `POLL_INTERVAL` apart; stability is declared once two
/// consecutive reads agree.
const STABILITY_PROBE_SCRIPT: &str = r#"
(() => (document.body ? document.body.innerText.length : 0))()
"#;

/// Waits for the page to settle: races an innerText-stability poll against
/// a fixed grace window. A poll failure (evaluate error, detached page) is
/// silent — the settler falls through to the grace window and the crawl
/// proceeds (spec §4.8: "Silent failure (timeout) is acceptable").
pub async fn settle(page: &dyn BrowserCapability) {
    let poll = poll_until_stable(page);
    let grace = tokio::time::sleep(GRACE_WINDOW);
    tokio::select! {
        _ = poll => {}
        _ = grace => {
            debug!("framework settle: grace window elapsed before stability detected");
        }
    }
}

async fn poll_until_stable(page: &dyn BrowserCapability) {
    let deadline = tokio::time::Instant::now() + STABILITY_POLL_TIMEOUT;
    let mut previous: Option<i64> = None;

    while tokio::time::Instant::now() < deadline {
        let current = match page.evaluate(STABILITY_PROBE_SCRIPT).await {
            Ok(value) => value.as_i64().unwrap_or(0),
            Err(_) => return,
        };

        if let Some(prev) = previous {
            if prev == current {
                return;
            }
        }
        previous = Some(current);
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{ScriptedBrowser, ScriptedPage};
    use crate::browser::WaitMode;
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn settle_returns_when_page_has_no_scripted_response() {
        let page = ScriptedPage {
            url: "https://example.test/".to_string(),
            title: "Home".to_string(),
            evaluate_responses: HashMap::from([("innerText".to_string(), json!(42))]),
            ..Default::default()
        };
        let browser = ScriptedBrowser::new(vec![page]);
        browser
            .goto("https://example.test/", WaitMode::Load, std::time::Duration::from_secs(1))
            .await
            .unwrap();

        let start = std::time::Instant::now();
        settle(&browser).await;
        assert!(start.elapsed() < std::time::Duration::from_secs(6));
    }
}
