//! Login Driver (spec §4.7) — one-shot best-effort authentication before
//! the crawl begins.

use crate::browser::{BrowserCapability, ClickOptions, Locator, WaitMode};
use crate::config::LoginCredentials;
use crate::events::{EventSink, EventTag};
use crate::policy::url_normalize::normalize;
use crate::settle;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const EMAIL_SELECTORS: &[&str] = &[
    "input[type=\"email\"]",
    "input[name=\"email\"]",
    "input[id=\"email\"]",
    "input[autocomplete=\"username\"]",
];

const PASSWORD_SELECTORS: &[&str] = &["input[type=\"password\"]"];

const SUBMIT_SELECTORS: &[&str] = &[
    "button[type=\"submit\"]",
    "input[type=\"submit\"]",
    "button[data-testid=\"login-submit\"]",
];

const LOGIN_TEXT_MARKERS: &[&str] = &["sign in", "log in"];

const MAX_URL_STABILITY_POLLS: u8 = 5;
const URL_POLL_INTERVAL: Duration = Duration::from_millis(800);

/// Result of the login attempt: if the post-login URL differs from the
/// declared entry URL, the caller must rewrite the seed accordingly and
/// mark both forms visited (spec §4.7, §4.10).
#[derive(Debug, Clone, Default)]
pub struct LoginOutcome {
    pub attempted: bool,
    pub succeeded: bool,
    pub resolved_entry_url: Option<String>,
}

/// Probe the DOM for login affordances without attempting to fill anything.
async fn has_login_affordances(page: &dyn BrowserCapability) -> bool {
    for sel in EMAIL_SELECTORS.iter().chain(PASSWORD_SELECTORS.iter()) {
        if page
            .wait_for_selector(sel, Duration::from_millis(500))
            .await
            .unwrap_or(false)
        {
            return true;
        }
    }
    let script = r#"(() => (document.body ? document.body.innerText.toLowerCase() : ''))()"#;
    if let Ok(value) = page.evaluate(script).await {
        if let Some(text) = value.as_str() {
            return LOGIN_TEXT_MARKERS.iter().any(|marker| text.contains(marker));
        }
    }
    false
}

async fn fill_first_matching(page: &dyn BrowserCapability, selectors: &[&str], value: &str) -> bool {
    for sel in selectors {
        if page
            .wait_for_selector(sel, Duration::from_millis(500))
            .await
            .unwrap_or(false)
        {
            let script = format!(
                "(() => {{ const el = document.querySelector({sel:?}); if (!el) return false; \
                 const setter = Object.getOwnPropertyDescriptor(window.HTMLInputElement.prototype, 'value').set; \
                 setter.call(el, {value:?}); el.dispatchEvent(new Event('input', {{ bubbles: true }})); return true; }})()"
            );
            if page.evaluate(&script).await.is_ok() {
                return true;
            }
        }
    }
    false
}

async fn click_first_matching(page: &dyn BrowserCapability, selectors: &[&str]) -> bool {
    for sel in selectors {
        if page
            .wait_for_selector(sel, Duration::from_millis(500))
            .await
            .unwrap_or(false)
        {
            let ok = page
                .click(&Locator::Css(sel.to_string()), ClickOptions::default())
                .await
                .is_ok();
            if ok {
                return true;
            }
        }
    }
    false
}

/// Navigates to `entry_url`, settles, and — if login affordances are
/// present — fills credentials and submits. Failures are reported through
/// the event sink but never abort the crawl (spec §4.7).
pub async fn attempt_login(
    page: &dyn BrowserCapability,
    entry_url: &str,
    credentials: Option<&LoginCredentials>,
    events: &EventSink,
) -> LoginOutcome {
    events.emit(EventTag::LoginStart, json!({ "url": entry_url }));

    if page
        .goto(entry_url, WaitMode::Load, Duration::from_secs(30))
        .await
        .is_err()
    {
        events.emit(
            EventTag::LoginError,
            json!({ "reason": "navigation_failed", "url": entry_url }),
        );
        return LoginOutcome::default();
    }
    settle::settle(page).await;

    if !has_login_affordances(page).await {
        events.emit(EventTag::LoginNotNeeded, json!({}));
        return LoginOutcome::default();
    }

    let Some(credentials) = credentials else {
        info!("login affordances detected but no credentials configured; proceeding anonymously");
        events.emit(EventTag::LoginError, json!({ "reason": "no_credentials" }));
        return LoginOutcome {
            attempted: false,
            ..Default::default()
        };
    };

    let mut outcome = LoginOutcome {
        attempted: true,
        ..Default::default()
    };

    if !fill_first_matching(page, EMAIL_SELECTORS, &credentials.email).await {
        warn!("login: no email-like input found to fill");
        events.emit(EventTag::LoginError, json!({ "reason": "no_email_input" }));
        return outcome;
    }
    events.emit(EventTag::LoginEmailFilled, json!({}));
    if !fill_first_matching(page, PASSWORD_SELECTORS, &credentials.password).await {
        warn!("login: no password input found to fill");
        events.emit(EventTag::LoginError, json!({ "reason": "no_password_input" }));
        return outcome;
    }
    events.emit(EventTag::LoginPasswordFilled, json!({}));
    if !click_first_matching(page, SUBMIT_SELECTORS).await {
        warn!("login: no submit affordance found to click");
        events.emit(EventTag::LoginError, json!({ "reason": "no_submit_affordance" }));
        return outcome;
    }

    let mut last_url = page.current_url().await.unwrap_or_default();
    for _ in 0..MAX_URL_STABILITY_POLLS {
        tokio::time::sleep(URL_POLL_INTERVAL).await;
        let current = page.current_url().await.unwrap_or_default();
        if current == last_url {
            break;
        }
        last_url = current;
    }
    settle::settle(page).await;

    let actual_url = page.current_url().await.unwrap_or_else(|_| entry_url.to_string());
    outcome.succeeded = true;
    if normalize(&actual_url) != normalize(entry_url) {
        info!("login: entry rewritten from {} to {}", entry_url, actual_url);
        outcome.resolved_entry_url = Some(actual_url.clone());
        events.emit(
            EventTag::LoginRedirect,
            json!({ "declared_entry": entry_url, "resolved_entry": actual_url }),
        );
    }
    events.emit(EventTag::LoginComplete, json!({ "declared_entry": entry_url }));

    outcome
}
