//! The discovery report returned to the caller (spec §6).

use crate::model::graph::Graph;
use serde::{Deserialize, Serialize};

/// Rust-side variant names stay descriptive; the wire values match the
/// report contract's own vocabulary (spec §6: `status ∈ {success, partial,
/// error}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[serde(rename = "success")]
    Complete,
    Partial,
    #[serde(rename = "error")]
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub graph: Graph,
    pub status: Status,
    pub nodes_discovered: usize,
    pub edges_discovered: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

impl Report {
    pub fn from_graph(graph: Graph, status: Status, errors: Vec<String>, duration_ms: u64, saved_to: Option<String>) -> Self {
        Self {
            nodes_discovered: graph.nodes.len(),
            edges_discovered: graph.edges.len(),
            graph,
            status,
            errors,
            duration_ms,
            saved_to,
        }
    }
}
