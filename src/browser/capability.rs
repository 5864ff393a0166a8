//! Browser capability (spec §6) — the interface the explorer consumes.
//! Browser automation itself is assumed; this crate depends only on this
//! trait, plus ships one concrete implementation ([`crate::browser::chromium`])
//! and one scripted test double ([`crate::browser::mock`]).

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

#[derive(Debug, Clone)]
pub enum Locator {
    Css(String),
    TestId(String),
    ExactText(String),
    AriaLabel(String),
    Point(f64, f64),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClickOptions {
    pub force: bool,
    pub position: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMessageKind {
    Log,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    pub kind: ConsoleMessageKind,
    pub text: String,
}

/// A single live page/tab. Every method is a suspension point (spec §5) —
/// implementations must not block the executor thread.
#[async_trait]
pub trait BrowserCapability: Send + Sync {
    async fn goto(&self, url: &str, wait: WaitMode, timeout: Duration) -> anyhow::Result<Option<u16>>;

    /// Execute `script` in the page context and deserialize the result.
    async fn evaluate(&self, script: &str) -> anyhow::Result<Value>;

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> anyhow::Result<bool>;

    /// Succeeds or fails; never panics. `locator` determines the strategy
    /// (CSS path, test-id attribute, exact text, aria-label, or a raw
    /// point for synthetic pointer events).
    async fn click(&self, locator: &Locator, opts: ClickOptions) -> anyhow::Result<()>;

    async fn screenshot(&self, path: &Path) -> anyhow::Result<()>;

    async fn title(&self) -> anyhow::Result<String>;

    async fn current_url(&self) -> anyhow::Result<String>;

    async fn mouse_click(&self, x: f64, y: f64) -> anyhow::Result<()>;

    /// Console messages observed on this page. Subscription must be wired
    /// before the first `goto` so error capture begins before navigation.
    fn subscribe_console(&self) -> broadcast::Receiver<ConsoleMessage>;
}
