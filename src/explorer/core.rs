//! Explorer Core (spec §4.10) — the single-threaded cooperative BFS loop
//! that drives everything else in this crate.

use crate::browser::{BrowserCapability, ConsoleMessageKind, WaitMode};
use crate::click::{self, ClickTarget};
use crate::config::{AppType, ExplorerConfig};
use crate::error::DiscoveryError;
use crate::events::{EventSink, EventTag};
use crate::explorer::queue::{WorkItem, WorkQueue};
use crate::explorer::replay;
use crate::extraction::{self, RawCandidate};
use crate::fingerprint::Fingerprinter;
use crate::login;
use crate::model::edge::InteractionKind;
use crate::model::element::{Element, ElementKind};
use crate::model::node::{node_id, Node};
use crate::policy::url_normalize::normalize;
use crate::policy::DomainPolicy;
use crate::report::{Report, Status};
use crate::settle;
use crate::store::GraphStore;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::warn;
use uuid_like::new_id;

/// Up to 15 clickable candidates are tried per page at Phase-2 depth 0
/// (spec §4.10).
const PHASE2_MAX_CANDIDATES: usize = 15;

/// Hard bound on how deep SPA-state recursion may go from any URL-distinct
/// node (spec §4.10, §9 Open Questions).
pub const SPA_DEPTH_LIMIT: usize = 3;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const SELECTOR_PROBE_TIMEOUT: Duration = Duration::from_millis(800);

mod uuid_like {
    /// A short content-free identifier for the graph itself (not a node).
    /// The graph id has no identity contract the way node/element ids do —
    /// it only needs to be unique per run, so a counter-free random-ish
    /// value from the clock plus pid suffices.
    pub fn new_id() -> String {
        let pid = std::process::id();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("graph-{pid:x}-{nanos:x}")
    }
}

const APP_TYPE_DETECT_SCRIPT: &str = r#"
(() => {
  if (document.querySelector('.dataframe-dashboard')) return 'dataframe_dashboard';
  if (document.getElementById('root')) return 'component_root';
  return 'generic';
})()
"#;

pub struct Explorer {
    config: ExplorerConfig,
    events: EventSink,
    domain_policy: DomainPolicy,
    store: GraphStore,
    queue: WorkQueue,
    errors: Vec<String>,
    started_at: Instant,
    deadline: Instant,
    /// Console-error subscription, wired before the first navigation
    /// (spec §6: "Capture of console errors must begin before navigation").
    /// `None` only until `discover` subscribes it.
    console_rx: Option<broadcast::Receiver<crate::browser::ConsoleMessage>>,
}

impl Explorer {
    pub fn new(config: ExplorerConfig, events: EventSink) -> Result<Self, DiscoveryError> {
        config.validate()?;
        let domain_policy = DomainPolicy::from_entry_point(&config.entry_points[0], config.domain_whitelist.clone())
            .ok_or(DiscoveryError::NoEntryPoints)?;
        let id = new_id();
        let app_name = config.app_name.clone();
        let entry_points = config.entry_points.clone();
        let started_at = Instant::now();
        let deadline = started_at + Duration::from_millis(config.timeout_ms);
        Ok(Self {
            store: GraphStore::new(id, app_name, entry_points),
            domain_policy,
            errors: Vec::new(),
            started_at,
            deadline,
            config,
            events,
            queue: WorkQueue::new(),
            console_rx: None,
        })
    }

    pub(crate) fn budget_exhausted(&self) -> bool {
        self.store.graph().nodes.len() >= self.config.max_nodes
    }

    /// Runs the full discovery and returns a final report. The explorer is
    /// single-use: this consumes `self`.
    pub async fn discover(mut self, page: &dyn BrowserCapability) -> Report {
        self.events.emit(
            EventTag::DiscoveryStart,
            json!({ "entry_points": self.config.entry_points }),
        );

        // Subscribe before any goto so the very first navigation's errors
        // are visible to the buffer (spec §6).
        self.console_rx = Some(page.subscribe_console());

        let mut entry_url = self.config.entry_points[0].clone();
        let login_outcome = login::attempt_login(
            page,
            &entry_url,
            self.config.login_credentials.as_ref(),
            &self.events,
        )
        .await;
        self.store.set_login_required(login_outcome.attempted);

        if let Some(resolved) = login_outcome.resolved_entry_url {
            self.queue.mark_url_visited(&normalize(&entry_url));
            entry_url = resolved;
        }

        self.queue.push(WorkItem::seed(entry_url.clone()));
        for extra in self.config.entry_points.iter().skip(1) {
            self.queue.push(WorkItem::seed(extra.clone()));
        }

        let status = self.run_main_loop(page).await;

        self.store.graph_mut().sync_metadata(self.started_at.elapsed().as_millis() as u64);
        let duration_ms = self.started_at.elapsed().as_millis() as u64;
        let saved_to = match self
            .store
            .persist(duration_ms, std::path::Path::new(crate::store::GRAPH_DIR))
        {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                warn!("graphscout: failed to persist graph: {}", e);
                self.errors.push(format!("persist failed: {e}"));
                None
            }
        };

        self.events.emit(
            EventTag::DiscoveryComplete,
            json!({
                "nodes": self.store.graph().nodes.len(),
                "edges": self.store.graph().edges.len(),
                "duration_ms": duration_ms,
            }),
        );

        Report::from_graph(
            self.store.graph().clone(),
            status,
            self.errors,
            duration_ms,
            saved_to,
        )
    }

    async fn run_main_loop(&mut self, page: &dyn BrowserCapability) -> Status {
        while !self.queue.is_empty() {
            if self.budget_exhausted() {
                return Status::Partial;
            }

            let Some(item) = self.queue.pop() else {
                break;
            };

            if self.wall_clock_exceeded() {
                self.events.emit(EventTag::DiscoveryTimeout, json!({}));
                return Status::Partial;
            }

            let normalized = normalize(&item.url);

            if self.queue.is_url_visited(&normalized) {
                if let (Some(src), Some(el)) = (&item.source_node_id, &item.source_element_id) {
                    if let Some(target_id) = self.find_node_by_normalized_url(&normalized) {
                        self.record_edge(src, &target_id, el, InteractionKind::Navigate);
                    }
                }
                continue;
            }

            if item.depth > self.config.max_depth {
                continue;
            }
            if !self.domain_policy.is_in_scope(&item.url) {
                self.events.emit(EventTag::SkipExternal, json!({ "url": item.url }));
                continue;
            }

            self.queue.mark_url_visited(&normalized);
            self.events.emit(EventTag::Visiting, json!({ "url": item.url, "depth": item.depth }));

            match self.visit(page, &item, &normalized).await {
                Ok(()) => {}
                Err(e) => {
                    warn!("graphscout: navigation to {} failed: {}", item.url, e);
                    self.errors.push(format!("{}: {}", item.url, e));
                    self.events.emit(EventTag::VisitError, json!({ "url": item.url, "error": e.to_string() }));
                }
            }
        }

        // A drained queue with one or more recorded per-item errors is
        // still a coherent graph, but not a clean run (spec §6/§7:
        // "partial means ... a populated errors array").
        if self.errors.is_empty() {
            Status::Complete
        } else {
            Status::Partial
        }
    }

    /// Looks up a URL-distinct node's id. Per the §9 hash asymmetry,
    /// URL-distinct nodes are identified with the fingerprint omitted
    /// (`node_id(normalized_url, "")`) even though their `dom_fingerprint`
    /// field carries the real computed digest — so the lookup must
    /// recompute the same asymmetric id rather than search for a node
    /// whose stored fingerprint happens to be empty.
    fn find_node_by_normalized_url(&self, normalized_url: &str) -> Option<String> {
        let id = node_id(normalized_url, "");
        self.store.graph().nodes.contains_key(&id).then(|| id)
    }

    async fn visit(&mut self, page: &dyn BrowserCapability, item: &WorkItem, normalized: &str) -> anyhow::Result<()> {
        let start = Instant::now();
        self.drain_console_errors(); // clear the buffer before navigating (spec §4.10 step 5)
        let http_status = page.goto(&item.url, WaitMode::Load, NAVIGATION_TIMEOUT).await?;
        settle::settle(page).await;
        let _ = page.wait_for_selector("body", SELECTOR_PROBE_TIMEOUT).await;

        if self.store.graph().app_type.is_none() {
            if let Ok(value) = page.evaluate(APP_TYPE_DETECT_SCRIPT).await {
                if let Some(tag) = value.as_str() {
                    let app_type = match tag {
                        "dataframe_dashboard" => AppType::DataframeDashboard,
                        "component_root" => AppType::ComponentRoot,
                        _ => AppType::Generic,
                    };
                    self.store.set_app_type(app_type);
                    self.events.emit(EventTag::AppTypeDetected, json!({ "app_type": app_type }));
                }
            }
        }

        let fingerprint = Fingerprinter::compute(page).await.unwrap_or_default();
        let url = page.current_url().await.unwrap_or_else(|_| item.url.clone());
        let title = page.title().await.unwrap_or_default();
        // URL-distinct nodes hash with the fingerprint omitted (spec §9
        // hash asymmetry); `dom_fingerprint` below still carries the real
        // digest for the node-dom-visited set and SPA-child comparisons.
        let id = node_id(normalized, "");

        let elements = self.extract_elements(page).await;
        let load_time_ms = start.elapsed().as_millis() as u64;
        let console_errors = self.drain_console_errors();

        let node = Node {
            id: id.clone(),
            url,
            normalized_url: normalized.to_string(),
            title,
            is_entry_point: item.depth == 0,
            elements,
            console_errors,
            load_time_ms,
            http_status,
            screenshot: self.capture_screenshot(page, &id).await,
            dom_fingerprint: fingerprint.clone(),
            depth: item.depth,
            timestamp: chrono::Utc::now(),
        };

        self.store.insert_node(node);
        self.queue.mark_url_dom_visited(normalized, &fingerprint);
        self.events.emit(EventTag::NodeCreated, json!({ "id": id, "url": item.url }));

        if let (Some(src), Some(el)) = (&item.source_node_id, &item.source_element_id) {
            self.record_edge(src, &id, el, InteractionKind::Navigate);
        }

        if item.depth < self.config.max_depth {
            self.queue_children(page, &id, item.depth).await;
        }

        Ok(())
    }

    async fn queue_children(&mut self, page: &dyn BrowserCapability, parent_id: &str, depth: usize) {
        let parent_elements = self
            .store
            .graph()
            .nodes
            .get(parent_id)
            .map(|n| n.elements.clone())
            .unwrap_or_default();

        // Phase 1: URL-typed children.
        for element in parent_elements.iter().filter(|e| e.kind.is_url_typed()) {
            let Some(href) = &element.href else { continue };
            let resolved = self.resolve_href(&self.current_page_url(parent_id), href);
            let normalized = normalize(&resolved);
            if self.queue.is_url_visited(&normalized) {
                continue;
            }
            if !self.domain_policy.is_in_scope(&resolved) {
                continue;
            }
            self.queue.push(WorkItem::child(resolved, depth + 1, parent_id.to_string(), element.id.clone()));
        }

        // Phase 2: clickable children, sorted by priority and capped.
        let mut candidates: Vec<Element> = parent_elements
            .into_iter()
            .filter(|e| e.kind.is_clickable_in_exploration())
            .collect();
        candidates.sort_by_key(|e| e.kind.click_priority());
        let remaining_budget = self.config.max_nodes.saturating_sub(self.store.graph().nodes.len());
        let cap = PHASE2_MAX_CANDIDATES.min(remaining_budget.max(1));
        candidates.truncate(cap);

        let parent_url = self.current_page_url(parent_id);
        let parent_fingerprint = self
            .store
            .graph()
            .nodes
            .get(parent_id)
            .map(|n| n.dom_fingerprint.clone())
            .unwrap_or_default();

        for element in candidates {
            if self.wall_clock_exceeded() || self.budget_exhausted() {
                break;
            }

            if page.goto(&parent_url, WaitMode::Load, NAVIGATION_TIMEOUT).await.is_err() {
                continue;
            }
            settle::settle(page).await;

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
            let post_click_url = page.current_url().await.unwrap_or_else(|_| parent_url.clone());
            let post_click_normalized = normalize(&post_click_url);

            if post_click_normalized != normalize(&parent_url) {
                self.events.emit(
                    EventTag::NavigationDetected,
                    json!({ "from": parent_url, "to": post_click_url, "via": element.text }),
                );
                if !self.queue.is_url_visited(&post_click_normalized) && self.domain_policy.is_in_scope(&post_click_url) {
                    self.queue.push(WorkItem::child(post_click_url, depth + 1, parent_id.to_string(), element.id.clone()));
                }
                continue;
            }

            let new_fingerprint = Fingerprinter::compute(page).await.unwrap_or_default();
            if new_fingerprint.is_empty() || new_fingerprint == parent_fingerprint {
                continue;
            }
            if self.queue.is_url_dom_visited(&post_click_normalized, &new_fingerprint) {
                continue;
            }

            self.register_spa_state(
                page,
                parent_id,
                &element,
                &post_click_normalized,
                &new_fingerprint,
                depth,
            )
            .await;
        }
    }

    /// Registers a virtual SPA node reached from `parent_id` by clicking
    /// `element`, then recurses into its children via Replay Recursion.
    async fn register_spa_state(
        &mut self,
        page: &dyn BrowserCapability,
        parent_id: &str,
        element: &Element,
        normalized_url: &str,
        fingerprint: &str,
        depth: usize,
    ) {
        if self.budget_exhausted() {
            return;
        }

        let spa_id = node_id(normalized_url, fingerprint);
        let spa_elements = self.extract_elements(page).await;
        let console_errors = self.drain_console_errors();
        let spa_node = Node {
            id: spa_id.clone(),
            url: normalized_url.to_string(),
            normalized_url: normalized_url.to_string(),
            title: element.text.clone(),
            is_entry_point: false,
            elements: spa_elements,
            console_errors,
            load_time_ms: 0,
            http_status: None,
            screenshot: self.capture_screenshot(page, &spa_id).await,
            dom_fingerprint: fingerprint.to_string(),
            depth: depth + 1,
            timestamp: chrono::Utc::now(),
        };
        self.store.insert_node(spa_node);
        self.queue.mark_url_dom_visited(normalized_url, fingerprint);
        self.events.emit(EventTag::SpaStateFound, json!({ "id": spa_id, "url": normalized_url }));
        self.record_edge(parent_id, &spa_id, &element.id, InteractionKind::Click);

        let base_url = self.current_page_url(parent_id);
        let path = vec![element.replay_descriptor()];
        replay::explore_spa_children(self, page, &base_url, &spa_id, path, 1).await;
    }

    fn current_page_url(&self, node_id: &str) -> String {
        self.store
            .graph()
            .nodes
            .get(node_id)
            .map(|n| n.url.clone())
            .unwrap_or_default()
    }

    fn resolve_href(&self, base: &str, href: &str) -> String {
        match url::Url::parse(base).and_then(|b| b.join(href)) {
            Ok(joined) => joined.to_string(),
            Err(_) => href.to_string(),
        }
    }

    pub(crate) fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub(crate) fn store(&self) -> &GraphStore {
        &self.store
    }

    pub(crate) fn events(&self) -> &EventSink {
        &self.events
    }

    pub(crate) fn domain_policy(&self) -> &DomainPolicy {
        &self.domain_policy
    }

    pub(crate) fn queue_mut(&mut self) -> &mut WorkQueue {
        &mut self.queue
    }

    pub(crate) fn wall_clock_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Drains every message currently buffered in the console-error
    /// channel without blocking, discarding non-error kinds. A `Lagged`
    /// gap just means older messages were dropped; draining continues.
    pub(crate) fn drain_console_errors(&mut self) -> Vec<String> {
        let Some(rx) = self.console_rx.as_mut() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(msg) => {
                    if msg.kind == ConsoleMessageKind::Error {
                        out.push(msg.text);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        out
    }

    pub(crate) async fn extract_elements(&self, page: &dyn BrowserCapability) -> Vec<Element> {
        match page.evaluate(extraction::ELEMENT_EXTRACTION_SCRIPT).await {
            Ok(value) => {
                let candidates: Vec<RawCandidate> = serde_json::from_value(value).unwrap_or_default();
                extraction::extract(candidates, self.config.max_elements_per_page)
            }
            Err(e) => {
                warn!("graphscout: element extraction failed: {}", e);
                Vec::new()
            }
        }
    }

    pub(crate) async fn capture_screenshot(&self, page: &dyn BrowserCapability, node_id: &str) -> Option<String> {
        let path = self.store.screenshot_path(node_id);
        match page.screenshot(&path).await {
            Ok(()) => Some(path.display().to_string()),
            Err(e) => {
                self.store.record_screenshot_failure(node_id, &e);
                None
            }
        }
    }

    pub(crate) fn record_edge(&mut self, src: &str, dst: &str, element_id: &str, interaction: InteractionKind) {
        let (text, kind) = self
            .store
            .graph()
            .nodes
            .get(src)
            .and_then(|n| n.elements.iter().find(|e| e.id == element_id))
            .map(|e| (e.text.clone(), e.kind))
            .unwrap_or_else(|| (String::new(), ElementKind::Other));
        self.store.add_edge(src, dst, element_id, text, kind, interaction);
    }
}
