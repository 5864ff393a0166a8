//! Concrete [`BrowserCapability`] on top of `chromiumoxide`, grounded on the
//! teacher's `scraping::browser_manager` (executable discovery, headless
//! `BrowserConfig` builder) and `scraping::rust_scraper::cdp` (launch +
//! event-pump task + `evaluate`/`goto` usage).

use super::capability::{
    BrowserCapability, ClickOptions, ConsoleMessage, ConsoleMessageKind, Locator, WaitMode,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::browser_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Cross-platform Chromium-family executable discovery. Resolution order:
/// `CHROME_EXECUTABLE` env var, then a `PATH` scan, then OS-specific
/// well-known install paths.
pub fn find_chrome_executable() -> Option<String> {
    if let Ok(p) = std::env::var("CHROME_EXECUTABLE") {
        if Path::new(&p).exists() {
            return Some(p);
        }
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
            "brave-browser",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

/// A launched browser plus its event-pump task. Dropping this struct closes
/// the browser.
pub struct ChromiumBrowser {
    browser: Browser,
    _handle: JoinHandle<()>,
}

impl ChromiumBrowser {
    pub async fn launch(headless: bool, width: u32, height: u32) -> Result<Self> {
        let exe = find_chrome_executable()
            .ok_or_else(|| anyhow!("no Chromium-family browser found; set CHROME_EXECUTABLE"))?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&exe)
            .viewport(Viewport {
                width,
                height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .window_size(width, height)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if !headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .with_context(|| format!("failed to launch browser ({})", exe))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            _handle: handle,
        })
    }

    pub async fn new_page(&self, url: &str) -> Result<ChromiumPage> {
        let page = self
            .browser
            .new_page(url)
            .await
            .context("failed to open new page")?;

        let (sender, _) = broadcast::channel(256);
        let console_sender = sender.clone();
        let console_page = page.clone();
        let console_task = tokio::spawn(async move {
            let Ok(mut stream) = console_page
                .event_listener::<EventConsoleApiCalled>()
                .await
            else {
                return;
            };
            while let Some(event) = stream.next().await {
                let kind = match event.r#type {
                    chromiumoxide::cdp::browser_protocol::runtime::ConsoleApiCalledType::Error => {
                        ConsoleMessageKind::Error
                    }
                    chromiumoxide::cdp::browser_protocol::runtime::ConsoleApiCalledType::Warning => {
                        ConsoleMessageKind::Warning
                    }
                    chromiumoxide::cdp::browser_protocol::runtime::ConsoleApiCalledType::Info => {
                        ConsoleMessageKind::Info
                    }
                    _ => ConsoleMessageKind::Log,
                };
                let text = event
                    .args
                    .iter()
                    .filter_map(|v| v.value.as_ref().map(|v| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = console_sender.send(ConsoleMessage { kind, text });
            }
        });

        Ok(ChromiumPage {
            page,
            console_sender: sender,
            _console_task: console_task,
        })
    }
}

pub struct ChromiumPage {
    page: Page,
    console_sender: broadcast::Sender<ConsoleMessage>,
    _console_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserCapability for ChromiumPage {
    async fn goto(&self, url: &str, _wait: WaitMode, timeout: Duration) -> Result<Option<u16>> {
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| anyhow!("navigation to {} timed out after {:?}", url, timeout))?
            .map_err(|e| anyhow!("navigation to {} failed: {}", url, e))?;
        Ok(None)
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| anyhow!("evaluate failed: {}", e))?;
        result
            .into_value::<Value>()
            .map_err(|e| anyhow!("evaluate result deserialize failed: {}", e))
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool> {
        match tokio::time::timeout(timeout, self.page.find_element(selector)).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(_)) | Err(_) => Ok(false),
        }
    }

    async fn click(&self, locator: &Locator, opts: ClickOptions) -> Result<()> {
        match locator {
            Locator::Css(sel) | Locator::ExactText(sel) | Locator::AriaLabel(sel) | Locator::TestId(sel) => {
                let element = self
                    .page
                    .find_element(sel)
                    .await
                    .map_err(|e| anyhow!("element not found for {:?}: {}", locator, e))?;
                element
                    .click()
                    .await
                    .map_err(|e| anyhow!("click failed for {:?}: {}", locator, e))?;
                Ok(())
            }
            Locator::Point(x, y) => {
                let (x, y) = opts.position.unwrap_or((*x, *y));
                self.mouse_click(x, y).await
            }
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let params = chromiumoxide::page::ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();
        let bytes = self
            .page
            .screenshot(params)
            .await
            .map_err(|e| anyhow!("screenshot failed: {}", e))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("failed to write screenshot to {}", path.display()))?;
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(|e| anyhow!("title failed: {}", e))?
            .unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| anyhow!("url failed: {}", e))?
            .ok_or_else(|| anyhow!("page has no url"))
    }

    async fn mouse_click(&self, x: f64, y: f64) -> Result<()> {
        self.page
            .click(chromiumoxide::cdp::browser_protocol::dom::Point { x, y })
            .await
            .map_err(|e| anyhow!("mouse click at ({}, {}) failed: {}", x, y, e))?;
        Ok(())
    }

    fn subscribe_console(&self) -> broadcast::Receiver<ConsoleMessage> {
        self.console_sender.subscribe()
    }
}

/// Best-effort: warn and continue. Used anywhere a failure in this module
/// must not abort the crawl (screenshot, console capture wiring).
pub fn warn_non_fatal(context: &str, err: &anyhow::Error) {
    warn!("{}: {} (non-fatal)", context, err);
}
