//! Data models for graph nodes and edges.
//!
//! Both nodes and edges carry a single optional string label. Empty labels
//! are normalized to `None` so that a graph written and loaded back compares
//! equal to the original.

use serde::{Deserialize, Serialize};

/// Node identifier. Nodes are addressed by ordinal position in the file.
pub type NodeId = u32;

/// Per-node attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: Option<String>,
}

impl NodeData {
    pub fn new(label: Option<String>) -> Self {
        Self {
            label: normalize(label),
        }
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Self::new(Some(label.into()))
    }

    /// Label text, empty when unlabeled.
    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}

/// Per-edge attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub label: Option<String>,
}

impl EdgeData {
    pub fn new(label: Option<String>) -> Self {
        Self {
            label: normalize(label),
        }
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Self::new(Some(label.into()))
    }

    /// Label text, empty when unlabeled.
    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}

fn normalize(label: Option<String>) -> Option<String> {
    label.filter(|l| !l.is_empty())
}
