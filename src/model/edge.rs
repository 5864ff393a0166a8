//! Edge — a directed transition from a source Node to a target Node
//! through a specific Element (spec §3).

use crate::model::element::ElementKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Click,
    Navigate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub element_id: String,
    pub element_text: String,
    pub element_kind: ElementKind,
    pub interaction_kind: InteractionKind,
    pub verified: bool,
}

impl Edge {
    /// Uniqueness key: no two edges may share `(source, target, element)`.
    pub fn uniqueness_key(&self) -> (String, String, String) {
        (
            self.source_id.clone(),
            self.target_id.clone(),
            self.element_id.clone(),
        )
    }
}
