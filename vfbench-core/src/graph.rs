//! Labeled directed graph powered by petgraph.
//!
//! `VfGraph` holds the in-memory form of a VF file: a directed graph whose
//! nodes and edges each carry an optional string label.
//!
//! # Soft failures
//!
//! Edges are accepted even when they reference a node that was never
//! declared. Such a node is created on the fly without a label and is
//! reported by [`VfGraph::undeclared_nodes`]. Adding an edge that already
//! exists replaces its label; multi-edges are not modeled.

use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{EdgeData, NodeData, NodeId};

static UNLABELED: NodeData = NodeData { label: None };

/// Directed graph with optional node and edge labels.
#[derive(Clone, Debug, Default)]
pub struct VfGraph {
    graph: DiGraphMap<NodeId, EdgeData>,
    declared: BTreeMap<NodeId, NodeData>,
    next_id: NodeId,
}

impl VfGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declared node and return its identifier.
    ///
    /// Identifiers are handed out in ascending order starting at 0.
    pub fn add_node(&mut self, data: NodeData) -> NodeId {
        let id = self.next_id;
        self.graph.add_node(id);
        self.declared.insert(id, data);
        self.next_id = id + 1;
        id
    }

    /// Add or update the edge `src -> dst`, returning the replaced edge data.
    ///
    /// Endpoints that do not exist yet are created as unlabeled, undeclared nodes.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, data: EdgeData) -> Option<EdgeData> {
        self.next_id = self.next_id.max(src.max(dst).saturating_add(1));
        self.graph.add_edge(src, dst, data)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.graph.contains_node(id)
    }

    /// Node attributes; undeclared nodes report an empty label.
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        if !self.graph.contains_node(id) {
            return None;
        }
        Some(self.declared.get(&id).unwrap_or(&UNLABELED))
    }

    pub fn edge(&self, src: NodeId, dst: NodeId) -> Option<&EdgeData> {
        self.graph.edge_weight(src, dst)
    }

    /// All node identifiers in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.graph.nodes().collect();
        ids.sort_unstable();
        ids
    }

    /// Outgoing edges of `src`, sorted by destination identifier.
    pub fn out_edges(&self, src: NodeId) -> Vec<(NodeId, &EdgeData)> {
        if !self.graph.contains_node(src) {
            return Vec::new();
        }
        let mut edges: Vec<(NodeId, &EdgeData)> = self
            .graph
            .edges(src)
            .map(|(_, dst, data)| (dst, data))
            .collect();
        edges.sort_by_key(|(dst, _)| *dst);
        edges
    }

    /// Nodes that only exist because an edge referenced them.
    pub fn undeclared_nodes(&self) -> Vec<NodeId> {
        self.node_ids()
            .into_iter()
            .filter(|id| !self.declared.contains_key(id))
            .collect()
    }

    /// Number of nodes per label (unlabeled nodes counted under "").
    pub fn node_label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for id in self.graph.nodes() {
            let label = self.node(id).map(NodeData::label_str).unwrap_or("");
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of edges per label (unlabeled edges counted under "").
    pub fn edge_label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (_, _, data) in self.graph.all_edges() {
            *counts.entry(data.label_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn edge_set(&self) -> BTreeSet<(NodeId, NodeId, &str)> {
        self.graph
            .all_edges()
            .map(|(s, d, data)| (s, d, data.label_str()))
            .collect()
    }
}

impl PartialEq for VfGraph {
    fn eq(&self, other: &Self) -> bool {
        self.node_ids() == other.node_ids()
            && self
                .node_ids()
                .into_iter()
                .all(|id| self.node(id) == other.node(id))
            && self.edge_set() == other.edge_set()
    }
}

impl Eq for VfGraph {}
