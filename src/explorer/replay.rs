//! Replay Recursion (spec §4.10) — discovers grandchildren of an SPA
//! state. Because each click must start from a clean page load, the
//! engine cannot simply stay on the rendered page: it replays the
//! ordered click path from the base URL before trying each new candidate.

use crate::browser::{BrowserCapability, WaitMode};
use crate::click::{self, ClickTarget};
use crate::events::EventTag;
use crate::explorer::core::{Explorer, SPA_DEPTH_LIMIT};
use crate::fingerprint::Fingerprinter;
use crate::model::edge::InteractionKind;
use crate::model::element::ReplayDescriptor;
use crate::model::node::{node_id, Node};
use crate::policy::url_normalize::normalize;
use crate::settle;
use serde_json::json;
use std::time::Duration;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// At depth 1 (first SPA hop) up to 10 candidates are tried; at depth 2,
/// the throttle tightens to 5 (spec §4.10).
fn candidate_cap(spa_depth: usize) -> usize {
    match spa_depth {
        1 => 10,
        _ => 5,
    }
}

/// Explores the children of the SPA state reached by replaying `path` from
/// `base_url`. `parent_node_id` is the id of the SPA node already
/// registered for that state; `spa_depth` counts SPA hops from the nearest
/// URL-distinct ancestor (1 for the first hop).
pub async fn explore_spa_children(
    explorer: &mut Explorer,
    page: &dyn BrowserCapability,
    base_url: &str,
    parent_node_id: &str,
    path: Vec<ReplayDescriptor>,
    spa_depth: usize,
) {
    if spa_depth >= SPA_DEPTH_LIMIT {
        return;
    }

    let parent_elements = explorer
        .store()
        .graph()
        .nodes
        .get(parent_node_id)
        .map(|n| n.elements.clone())
        .unwrap_or_default();
    let parent_fingerprint = explorer
        .store()
        .graph()
        .nodes
        .get(parent_node_id)
        .map(|n| n.dom_fingerprint.clone())
        .unwrap_or_default();

    let mut candidates: Vec<_> = parent_elements
        .into_iter()
        .filter(|e| e.kind.is_clickable_in_exploration())
        .collect();
    candidates.sort_by_key(|e| e.kind.click_priority());
    candidates.truncate(candidate_cap(spa_depth));

    for element in candidates {
        if explorer.wall_clock_exceeded() || explorer.budget_exhausted() {
            return;
        }

        if page.goto(base_url, WaitMode::Load, NAVIGATION_TIMEOUT).await.is_err() {
            continue;
        }
        settle::settle(page).await;

        if !replay_path(page, &path).await {
            continue;
        }

        let target = ClickTarget {
            css_path: element.css_path.clone(),
            test_id: element.test_id.clone(),
            text: element.text.clone(),
            aria_label: element.aria_label.clone(),
            bounding_box: element.bounding_box,
        };
        if !click::dispatch(page, &target).await {
            continue;
        }
        settle::settle(page).await;

        let post_click_url = page.current_url().await.unwrap_or_else(|_| base_url.to_string());
        let post_click_normalized = normalize(&post_click_url);

        if post_click_normalized != normalize(base_url) {
            explorer.events().emit(
                EventTag::NavigationDetected,
                json!({ "from": base_url, "to": post_click_url, "via": element.text }),
            );
            continue;
        }

        let new_fingerprint = Fingerprinter::compute(page).await.unwrap_or_default();
        if new_fingerprint.is_empty() || new_fingerprint == parent_fingerprint {
            continue;
        }
        if explorer.queue_mut().is_url_dom_visited(&post_click_normalized, &new_fingerprint) {
            continue;
        }

        let spa_id = node_id(&post_click_normalized, &new_fingerprint);
        let spa_elements = explorer.extract_elements(page).await;
        let console_errors = explorer.drain_console_errors();
        let parent_depth = explorer
            .store()
            .graph()
            .nodes
            .get(parent_node_id)
            .map(|n| n.depth)
            .unwrap_or(0);
        let node = Node {
            id: spa_id.clone(),
            url: post_click_normalized.clone(),
            normalized_url: post_click_normalized.clone(),
            title: element.text.clone(),
            is_entry_point: false,
            elements: spa_elements,
            console_errors,
            load_time_ms: 0,
            http_status: None,
            screenshot: explorer.capture_screenshot(page, &spa_id).await,
            dom_fingerprint: new_fingerprint.clone(),
            depth: parent_depth + 1,
            timestamp: chrono::Utc::now(),
        };

        explorer.store_mut().insert_node(node);
        explorer
            .queue_mut()
            .mark_url_dom_visited(&post_click_normalized, &new_fingerprint);
        explorer
            .events()
            .emit(EventTag::SpaStateFound, json!({ "id": spa_id, "url": post_click_normalized }));
        explorer.record_edge(parent_node_id, &spa_id, &element.id, InteractionKind::Click);

        let mut next_path = path.clone();
        next_path.push(element.replay_descriptor());
        Box::pin(explore_spa_children(
            explorer,
            page,
            base_url,
            &spa_id,
            next_path,
            spa_depth + 1,
        ))
        .await;
    }
}

/// Replays an ordered click path from a fresh page load. Any failed step
/// abandons the whole replay (spec §4.10).
async fn replay_path(page: &dyn BrowserCapability, path: &[ReplayDescriptor]) -> bool {
    for descriptor in path {
        if !click::dispatch_replay(page, descriptor).await {
            return false;
        }
        settle::settle(page).await;
    }
    true
}
