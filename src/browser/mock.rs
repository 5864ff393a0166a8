//! A scripted [`BrowserCapability`] test double. Lets the explorer/replay
//! state machine be exercised deterministically without a real browser,
//! mirroring how the teacher keeps parsing logic (`rust_scraper::parse`)
//! testable independently of `rust_scraper::cdp`.

use super::capability::{
    BrowserCapability, ClickOptions, ConsoleMessage, ConsoleMessageKind, Locator, WaitMode,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

/// One scripted page: its URL, the JSON value `evaluate` should return for
/// a given script prefix, and the elements clickable on it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub url: String,
    pub title: String,
    /// Keyed by a substring of the script; the first matching key wins.
    pub evaluate_responses: HashMap<String, Value>,
    /// Locators this page accepts clicks on, mapped to the URL (or same-URL
    /// marker `None` for an SPA-only transition) the click lands on.
    pub click_targets: HashMap<String, Option<String>>,
}

/// Shared mutable state behind the scripted browser, so tests can assert on
/// what the explorer actually tried to do.
#[derive(Debug, Default)]
pub struct ScriptedState {
    pub current_url: String,
    pub goto_history: Vec<String>,
    pub click_history: Vec<String>,
}

pub struct ScriptedBrowser {
    pages: HashMap<String, ScriptedPage>,
    state: Mutex<ScriptedState>,
    console_sender: broadcast::Sender<ConsoleMessage>,
}

impl ScriptedBrowser {
    pub fn new(pages: Vec<ScriptedPage>) -> Self {
        let mut map = HashMap::new();
        for page in pages {
            map.insert(page.url.clone(), page);
        }
        let (console_sender, _) = broadcast::channel(64);
        Self {
            pages: map,
            state: Mutex::new(ScriptedState::default()),
            console_sender,
        }
    }

    pub fn history(&self) -> (Vec<String>, Vec<String>) {
        let state = self.state.lock().expect("scripted state poisoned");
        (state.goto_history.clone(), state.click_history.clone())
    }

    fn current_page(&self) -> Result<ScriptedPage> {
        let url = self.state.lock().expect("scripted state poisoned").current_url.clone();
        self.pages
            .get(&url)
            .cloned()
            .ok_or_else(|| anyhow!("no scripted page registered for {}", url))
    }

    /// Emit a synthetic console error visible to the next `subscribe_console`
    /// reader. Used by tests exercising error-path telemetry.
    pub fn emit_console_error(&self, text: &str) {
        let _ = self.console_sender.send(ConsoleMessage {
            kind: ConsoleMessageKind::Error,
            text: text.to_string(),
        });
    }
}

#[async_trait]
impl BrowserCapability for ScriptedBrowser {
    async fn goto(&self, url: &str, _wait: WaitMode, _timeout: Duration) -> Result<Option<u16>> {
        if !self.pages.contains_key(url) {
            return Err(anyhow!("no scripted page registered for {}", url));
        }
        let mut state = self.state.lock().expect("scripted state poisoned");
        state.current_url = url.to_string();
        state.goto_history.push(url.to_string());
        Ok(Some(200))
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let page = self.current_page()?;
        for (key, value) in &page.evaluate_responses {
            if script.contains(key.as_str()) {
                return Ok(value.clone());
            }
        }
        Ok(Value::Null)
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        let page = self.current_page()?;
        Ok(page.click_targets.contains_key(selector))
    }

    async fn click(&self, locator: &Locator, _opts: ClickOptions) -> Result<()> {
        let key = match locator {
            Locator::Css(s) | Locator::TestId(s) | Locator::ExactText(s) | Locator::AriaLabel(s) => {
                s.clone()
            }
            Locator::Point(x, y) => format!("point:{x},{y}"),
        };
        let page = self.current_page()?;
        let Some(destination) = page.click_targets.get(&key) else {
            return Err(anyhow!("scripted page has no click target for {}", key));
        };
        let mut state = self.state.lock().expect("scripted state poisoned");
        state.click_history.push(key);
        if let Some(dest) = destination {
            state.current_url = dest.clone();
            state.goto_history.push(dest.clone());
        }
        Ok(())
    }

    async fn screenshot(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.current_page()?.title)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().expect("scripted state poisoned").current_url.clone())
    }

    async fn mouse_click(&self, x: f64, y: f64) -> Result<()> {
        self.click(&Locator::Point(x, y), ClickOptions::default()).await
    }

    fn subscribe_console(&self) -> broadcast::Receiver<ConsoleMessage> {
        self.console_sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_pages() -> Vec<ScriptedPage> {
        vec![
            ScriptedPage {
                url: "https://example.test/".to_string(),
                title: "Home".to_string(),
                click_targets: HashMap::from([(
                    "a.nav-link".to_string(),
                    Some("https://example.test/about".to_string()),
                )]),
                ..Default::default()
            },
            ScriptedPage {
                url: "https://example.test/about".to_string(),
                title: "About".to_string(),
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn goto_and_click_follow_the_script() {
        let browser = ScriptedBrowser::new(simple_pages());
        browser
            .goto("https://example.test/", WaitMode::Load, Duration::from_secs(1))
            .await
            .unwrap();
        browser
            .click(&Locator::Css("a.nav-link".to_string()), ClickOptions::default())
            .await
            .unwrap();
        assert_eq!(browser.current_url().await.unwrap(), "https://example.test/about");
    }

    #[tokio::test]
    async fn goto_unknown_url_errors() {
        let browser = ScriptedBrowser::new(simple_pages());
        let result = browser
            .goto("https://example.test/missing", WaitMode::Load, Duration::from_secs(1))
            .await;
        assert!(result.is_err());
    }
}
