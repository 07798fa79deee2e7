//! Node dictionary: the fixed population of nodes in a run.
//!
//! The dictionary file holds one node per line:
//!
//! ```text
//! TP53	p
//! 人参	h
//! fatigue	m
//! ```
//!
//! The first token is the node identifier, the optional second token is its
//! node type. Indices are assigned in file order and never change.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Dense node index, assigned in dictionary order.
pub type NodeIndex = usize;

/// Mapping between node identifiers and dense indices.
#[derive(Debug, Clone, Default)]
pub struct NodeDictionary {
    /// Node IDs by index.
    ids: Vec<String>,
    /// Node type labels by index (empty string when the file has none).
    types: Vec<String>,
    /// Map from ID to index.
    id_to_idx: HashMap<String, NodeIndex>,
}

impl NodeDictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an iterator of node IDs with no type labels.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dict = Self::new();
        for id in ids {
            dict.add_node(id, "");
        }
        dict
    }

    /// Load a dictionary file.
    ///
    /// Blank lines and lines starting with `#` are skipped. A repeated ID keeps
    /// its first index.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut dict = Self::new();

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let id = parts
                .next()
                .ok_or_else(|| Error::parse(path, lineno + 1, "missing node id"))?;
            let node_type = parts.next().unwrap_or("");

            if dict.contains(id) {
                tracing::warn!(node = id, line = lineno + 1, "duplicate node id ignored");
                continue;
            }
            dict.add_node(id, node_type);
        }

        tracing::info!(path = %path.display(), nodes = dict.len(), "loaded node dictionary");
        Ok(dict)
    }

    /// Add a node, returning its index. Existing IDs keep their index.
    pub fn add_node(&mut self, id: impl Into<String>, node_type: impl Into<String>) -> NodeIndex {
        let id = id.into();
        if let Some(&idx) = self.id_to_idx.get(&id) {
            return idx;
        }
        let idx = self.ids.len();
        self.id_to_idx.insert(id.clone(), idx);
        self.ids.push(id);
        self.types.push(node_type.into());
        idx
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Get a node's index by ID.
    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.id_to_idx.get(id).copied()
    }

    /// Get a node's ID by index.
    pub fn id(&self, idx: NodeIndex) -> Option<&str> {
        self.ids.get(idx).map(String::as_str)
    }

    /// Get a node's type label by index.
    pub fn node_type(&self, idx: NodeIndex) -> Option<&str> {
        self.types.get(idx).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_idx.contains_key(id)
    }

    /// Iterate over `(index, id)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &str)> + '_ {
        self.ids.iter().enumerate().map(|(i, s)| (i, s.as_str()))
    }
}
