//! Graph — named collection of nodes and edges plus metadata (spec §3).

use super::edge::Edge;
use super::node::Node;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub discovery_duration_ms: u64,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_elements: usize,
    pub max_depth_reached: usize,
    pub entry_urls: Vec<String>,
    pub app_type: Option<crate::config::AppType>,
    pub login_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub id: String,
    pub app_name: String,
    pub app_type: Option<crate::config::AppType>,
    pub entry_points: Vec<String>,
    pub nodes: HashMap<String, Node>,
    pub edges: Vec<Edge>,
    pub metadata: GraphMetadata,
    pub login_required: bool,
}

impl Graph {
    pub fn new(id: String, app_name: String, entry_points: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            app_name,
            app_type: None,
            entry_points: entry_points.clone(),
            nodes: HashMap::new(),
            edges: Vec::new(),
            metadata: GraphMetadata {
                created_at: now,
                last_updated: now,
                discovery_duration_ms: 0,
                total_nodes: 0,
                total_edges: 0,
                total_elements: 0,
                max_depth_reached: 0,
                entry_urls: entry_points,
                app_type: None,
                login_required: false,
            },
            login_required: false,
        }
    }

    /// Every edge's source/target id must exist among the nodes.
    pub fn all_edges_well_formed(&self) -> bool {
        self.edges
            .iter()
            .all(|e| self.nodes.contains_key(&e.source_id) && self.nodes.contains_key(&e.target_id))
    }

    /// No two edges share `(source, target, element)`.
    pub fn edges_are_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.edges.iter().all(|e| seen.insert(e.uniqueness_key()))
    }

    /// No two nodes share `(normalizedUrl, domFingerprint)` — a direct
    /// consequence of node ids being a pure function of that pair, but
    /// checked explicitly here for the invariant test suite.
    pub fn nodes_have_unique_identity(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.nodes
            .values()
            .all(|n| seen.insert((n.normalized_url.clone(), n.dom_fingerprint.clone())))
    }

    pub fn sync_metadata(&mut self, duration_ms: u64) {
        self.metadata.last_updated = Utc::now();
        self.metadata.discovery_duration_ms = duration_ms;
        self.metadata.total_nodes = self.nodes.len();
        self.metadata.total_edges = self.edges.len();
        self.metadata.total_elements = self.nodes.values().map(|n| n.elements.len()).sum();
        self.metadata.max_depth_reached = self.nodes.values().map(|n| n.depth).max().unwrap_or(0);
        self.metadata.app_type = self.app_type;
        self.metadata.login_required = self.login_required;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::edge::InteractionKind;
    use crate::model::element::ElementKind;
    use crate::model::node::{node_id, Node};

    fn dummy_node(id: &str, depth: usize) -> Node {
        Node {
            id: id.to_string(),
            url: "https://ex.test/".into(),
            normalized_url: "https://ex.test".into(),
            title: "home".into(),
            is_entry_point: depth == 0,
            elements: vec![],
            console_errors: vec![],
            load_time_ms: 10,
            http_status: Some(200),
            screenshot: None,
            dom_fingerprint: String::new(),
            depth,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn rejects_dangling_edges() {
        let mut g = Graph::new("g1".into(), "app".into(), vec!["https://ex.test/".into()]);
        g.nodes.insert("a".into(), dummy_node("a", 0));
        g.edges.push(Edge {
            source_id: "a".into(),
            target_id: "missing".into(),
            element_id: "e1".into(),
            element_text: "Go".into(),
            element_kind: ElementKind::Link,
            interaction_kind: InteractionKind::Navigate,
            verified: true,
        });
        assert!(!g.all_edges_well_formed());
    }

    #[test]
    fn detects_duplicate_edges() {
        let mut g = Graph::new("g1".into(), "app".into(), vec!["https://ex.test/".into()]);
        g.nodes.insert("a".into(), dummy_node("a", 0));
        g.nodes.insert("b".into(), dummy_node("b", 1));
        let edge = Edge {
            source_id: "a".into(),
            target_id: "b".into(),
            element_id: "e1".into(),
            element_text: "Go".into(),
            element_kind: ElementKind::Link,
            interaction_kind: InteractionKind::Navigate,
            verified: true,
        };
        g.edges.push(edge.clone());
        g.edges.push(edge);
        assert!(!g.edges_are_unique());
    }

    #[test]
    fn node_identity_is_pure_function_of_url_and_fingerprint() {
        let id = node_id("https://ex.test", "fp1");
        let mut n = dummy_node(&id, 0);
        n.normalized_url = "https://ex.test".into();
        n.dom_fingerprint = "fp1".into();
        let mut g = Graph::new("g1".into(), "app".into(), vec!["https://ex.test/".into()]);
        g.nodes.insert(id, n);
        assert!(g.nodes_have_unique_identity());
    }
}
