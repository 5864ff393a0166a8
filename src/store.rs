//! Graph Store (spec §4.9) — in-memory node map plus append-only edge
//! list, with dual JSON persistence. Grounded on the teacher's
//! `features::session_store` slug-keyed persistence pattern.

use crate::model::edge::{Edge, InteractionKind};
use crate::model::element::ElementKind;
use crate::model::graph::Graph;
use crate::model::node::Node;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const GRAPH_DIR: &str = "test-results/site-graphs";
pub const SCREENSHOT_DIR: &str = "test-results/graph-screenshots";

/// Lowercases and replaces every run of non-alphanumerics with a single
/// hyphen, trimming leading/trailing hyphens.
pub fn slugify(app_name: &str) -> String {
    let mut slug = String::with_capacity(app_name.len());
    let mut last_was_hyphen = false;
    for ch in app_name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen && !slug.is_empty() {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

pub struct GraphStore {
    graph: Graph,
    edge_keys: HashSet<(String, String, String)>,
}

impl GraphStore {
    pub fn new(id: String, app_name: String, entry_points: Vec<String>) -> Self {
        Self {
            graph: Graph::new(id, app_name, entry_points),
            edge_keys: HashSet::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.graph.nodes.contains_key(id)
    }

    pub fn insert_node(&mut self, node: Node) {
        self.graph.nodes.insert(node.id.clone(), node);
    }

    pub fn set_app_type(&mut self, app_type: crate::config::AppType) {
        self.graph.app_type = Some(app_type);
    }

    pub fn set_login_required(&mut self, required: bool) {
        self.graph.login_required = required;
    }

    /// Idempotent w.r.t. `(src, dst, element_id)`. Re-adding the same
    /// triple is a no-op; the caller already has the edge recorded.
    pub fn add_edge(
        &mut self,
        src: &str,
        dst: &str,
        element_id: &str,
        element_text: String,
        element_kind: ElementKind,
        interaction_kind: InteractionKind,
    ) {
        let key = (src.to_string(), dst.to_string(), element_id.to_string());
        if self.edge_keys.contains(&key) {
            return;
        }
        self.edge_keys.insert(key);
        self.graph.edges.push(Edge {
            source_id: src.to_string(),
            target_id: dst.to_string(),
            element_id: element_id.to_string(),
            element_text,
            element_kind,
            interaction_kind,
            verified: true,
        });
    }

    /// Persist the graph to `{slug}-latest.json` and a timestamped
    /// `{slug}-{ts}.json`, both pretty-printed. Returns the path of the
    /// stable "latest" file.
    pub fn persist(&mut self, duration_ms: u64, dir: &Path) -> Result<PathBuf> {
        self.graph.sync_metadata(duration_ms);
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let slug = slugify(&self.graph.app_name);
        let json = serde_json::to_string_pretty(&self.graph).context("serialize graph")?;

        let latest_path = dir.join(format!("{slug}-latest.json"));
        std::fs::write(&latest_path, &json)
            .with_context(|| format!("write {}", latest_path.display()))?;

        let ts = Utc::now().format("%Y%m%dT%H%M%SZ");
        let history_path = dir.join(format!("{slug}-{ts}.json"));
        std::fs::write(&history_path, &json)
            .with_context(|| format!("write {}", history_path.display()))?;

        info!(
            "graphscout: persisted graph to {} ({} nodes, {} edges)",
            latest_path.display(),
            self.graph.nodes.len(),
            self.graph.edges.len()
        );

        Ok(latest_path)
    }

    /// Best-effort screenshot path for a node. Save failures are logged
    /// and otherwise ignored (spec §4.11: "Screenshot failure: ignore").
    pub fn screenshot_path(&self, node_id: &str) -> PathBuf {
        PathBuf::from(SCREENSHOT_DIR).join(format!("graph-{node_id}.png"))
    }

    pub fn record_screenshot_failure(&self, node_id: &str, err: &anyhow::Error) {
        warn!("screenshot capture failed for node {}: {} (ignored)", node_id, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::node_id;
    use chrono::Utc as ChronoUtc;

    fn dummy_node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            url: "https://ex.test/".into(),
            normalized_url: "https://ex.test".into(),
            title: "home".into(),
            is_entry_point: true,
            elements: vec![],
            console_errors: vec![],
            load_time_ms: 5,
            http_status: Some(200),
            screenshot: None,
            dom_fingerprint: String::new(),
            depth: 0,
            timestamp: ChronoUtc::now(),
        }
    }

    #[test]
    fn slugify_replaces_non_alphanumerics_and_lowercases() {
        assert_eq!(slugify("My Cool App!"), "my-cool-app");
        assert_eq!(slugify("Already-Slug"), "already-slug");
        assert_eq!(slugify("  leading spaces"), "leading-spaces");
    }

    #[test]
    fn add_edge_is_idempotent_on_triple() {
        let mut store = GraphStore::new("g1".into(), "app".into(), vec!["https://ex.test/".into()]);
        let a = node_id("https://ex.test", "");
        let b = node_id("https://ex.test/about", "");
        store.insert_node(dummy_node(&a));
        store.insert_node(dummy_node(&b));

        store.add_edge(&a, &b, "e1", "About".into(), ElementKind::Link, InteractionKind::Navigate);
        store.add_edge(&a, &b, "e1", "About".into(), ElementKind::Link, InteractionKind::Navigate);

        assert_eq!(store.graph().edges.len(), 1);
    }

    #[test]
    fn persist_writes_latest_and_timestamped_files() {
        let dir = std::env::temp_dir().join(format!("graphscout-test-{}", std::process::id()));
        let mut store = GraphStore::new("g1".into(), "Test App".into(), vec!["https://ex.test/".into()]);
        store.insert_node(dummy_node(&node_id("https://ex.test", "")));
        let latest = store.persist(10, &dir).unwrap();
        assert!(latest.exists());
        assert_eq!(latest.file_name().unwrap(), "test-app-latest.json");

        let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert!(entries.len() >= 2);
        std::fs::remove_dir_all(&dir).ok();
    }
}
