//! Typed graph index over a heterogeneous information network.
//!
//! Links are directed and weighted, and carry an edge-type tag:
//!
//! ```text
//! TP53	人参	1	a
//! 人参	TP53	1	a
//! fatigue	人参	2.5	b
//! ```
//!
//! Each tag owns a disjoint partition of the links with its own alias table
//! over edge weight, so a positive edge of a given type is drawn in O(1).
//! Negative targets come from one population-level table weighted by
//! `degree^0.75`, the smoothing used by word2vec and LINE
//! ([Mikolov et al. 2013](https://arxiv.org/abs/1310.4546),
//! [Tang et al. 2015](https://arxiv.org/abs/1503.03578)).
//!
//! All tables are built before training and never mutated afterwards, so the
//! graph is shared read-only between worker threads.

use crate::alias::AliasTable;
use crate::dictionary::{NodeDictionary, NodeIndex};
use crate::embedding::EmbeddingStore;
use crate::error::{Error, Result};
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Smoothing exponent applied to node degree for negative sampling.
pub const NEGATIVE_SAMPLING_POWER: f64 = 0.75;

/// An edge-type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeType(pub String);

impl EdgeType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EdgeType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<char> for EdgeType {
    fn from(c: char) -> Self {
        Self(c.to_string())
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directed weighted edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub src: NodeIndex,
    pub dst: NodeIndex,
    pub weight: f64,
}

/// All edges of one type plus their sampling table.
#[derive(Debug, Clone)]
pub struct EdgePartition {
    edge_type: EdgeType,
    edges: Vec<Edge>,
    /// `None` when there is nothing to sample (no edges, or all weights zero).
    sampler: Option<AliasTable>,
}

impl EdgePartition {
    fn build(edge_type: EdgeType, edges: Vec<Edge>) -> Result<Self> {
        let total: f64 = edges.iter().map(|e| e.weight).sum();
        let sampler = if edges.is_empty() || !(total > 0.0) {
            None
        } else {
            let weights: Vec<f64> = edges.iter().map(|e| e.weight).collect();
            Some(AliasTable::new(&weights)?)
        };
        Ok(Self {
            edge_type,
            edges,
            sampler,
        })
    }

    pub fn edge_type(&self) -> &EdgeType {
        &self.edge_type
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges (including zero-weight ones).
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when no edge can be sampled.
    pub fn is_empty(&self) -> bool {
        self.sampler.is_none()
    }

    /// Draw one edge with probability proportional to its weight.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Edge> {
        match &self.sampler {
            Some(table) => Ok(&self.edges[table.sample(rng)]),
            None => Err(Error::EmptyPartition(self.edge_type.0.clone())),
        }
    }
}

/// Summary counts for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct HinStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub edges_per_type: Vec<(EdgeType, usize)>,
}

/// Heterogeneous graph partitioned by edge type.
#[derive(Debug, Clone)]
pub struct HinGraph {
    num_nodes: usize,
    /// Partitions in declaration order.
    partitions: Vec<EdgePartition>,
    type_index: HashMap<EdgeType, usize>,
    /// Weighted degree (in + out, all types) per node.
    degree: Vec<f64>,
    negative: AliasTable,
}

impl HinGraph {
    /// Parse a link file against an already loaded dictionary.
    pub fn from_link_file(path: impl AsRef<Path>, dictionary: &NodeDictionary) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut builder = HinGraphBuilder::new(dictionary.len());

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 4 {
                return Err(Error::parse(
                    path,
                    lineno + 1,
                    format!("expected '<src> <dst> <weight> <type>', found {} fields", parts.len()),
                ));
            }
            let src = dictionary
                .index_of(parts[0])
                .ok_or_else(|| Error::UnknownNode(parts[0].to_string()))?;
            let dst = dictionary
                .index_of(parts[1])
                .ok_or_else(|| Error::UnknownNode(parts[1].to_string()))?;
            let weight: f64 = parts[2].parse().map_err(|_| {
                Error::parse(path, lineno + 1, format!("invalid weight '{}'", parts[2]))
            })?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::parse(
                    path,
                    lineno + 1,
                    format!("weight must be finite and non-negative, got {weight}"),
                ));
            }
            builder.add_edge(parts[3], src, dst, weight)?;
        }

        let graph = builder.build()?;
        let stats = graph.stats();
        tracing::info!(
            path = %path.display(),
            nodes = stats.num_nodes,
            edges = stats.num_edges,
            edge_types = stats.edges_per_type.len(),
            "loaded link file"
        );
        Ok(graph)
    }

    /// Load the link file for a source/context store pair.
    ///
    /// Both stores must be indexed by the same node population.
    pub fn init(
        link_path: impl AsRef<Path>,
        source: &EmbeddingStore,
        context: &EmbeddingStore,
    ) -> Result<Self> {
        if source.len() != context.len() {
            return Err(Error::DimensionMismatch {
                expected: source.len(),
                actual: context.len(),
            });
        }
        if source.dim() != context.dim() {
            return Err(Error::DimensionMismatch {
                expected: source.dim(),
                actual: context.dim(),
            });
        }
        Self::from_link_file(link_path, source.dictionary())
    }

    /// Register an edge type, returning its partition id. A new type starts empty.
    pub fn declare_edge_type(&mut self, edge_type: impl Into<EdgeType>) -> usize {
        let edge_type = edge_type.into();
        if let Some(&id) = self.type_index.get(&edge_type) {
            return id;
        }
        let id = self.partitions.len();
        self.type_index.insert(edge_type.clone(), id);
        self.partitions.push(EdgePartition {
            edge_type,
            edges: Vec::new(),
            sampler: None,
        });
        id
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.partitions.iter().map(EdgePartition::len).sum()
    }

    /// Edge types in declaration order.
    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> + '_ {
        self.partitions.iter().map(EdgePartition::edge_type)
    }

    pub fn num_edge_types(&self) -> usize {
        self.partitions.len()
    }

    /// Partition id of an edge type.
    pub fn partition_id(&self, edge_type: &str) -> Option<usize> {
        self.type_index.get(&EdgeType::from(edge_type)).copied()
    }

    pub fn partition(&self, id: usize) -> Option<&EdgePartition> {
        self.partitions.get(id)
    }

    pub fn partitions(&self) -> &[EdgePartition] {
        &self.partitions
    }

    /// Weighted degree of a node (all types, both directions).
    pub fn degree(&self, node: NodeIndex) -> Option<f64> {
        self.degree.get(node).copied()
    }

    /// Draw one `(src, dst)` pair of the given type, proportional to edge weight.
    pub fn sample_edge<R: Rng + ?Sized>(
        &self,
        edge_type: &str,
        rng: &mut R,
    ) -> Result<(NodeIndex, NodeIndex)> {
        let id = self
            .partition_id(edge_type)
            .ok_or_else(|| Error::UnknownEdgeType(edge_type.to_string()))?;
        let edge = self.partitions[id].sample(rng)?;
        Ok((edge.src, edge.dst))
    }

    /// Draw one negative target for an edge of the given type.
    ///
    /// Draws from the population `degree^0.75` table only. The draw is not
    /// repeated when it equals the true target; such collisions are rare and
    /// accepted to keep sampling O(1).
    pub fn sample_negative<R: Rng + ?Sized>(
        &self,
        edge_type: &str,
        _exclude: NodeIndex,
        rng: &mut R,
    ) -> Result<NodeIndex> {
        if self.partition_id(edge_type).is_none() {
            return Err(Error::UnknownEdgeType(edge_type.to_string()));
        }
        Ok(self.draw_negative(rng))
    }

    /// Draw from the negative table without a type lookup.
    #[inline]
    pub fn draw_negative<R: Rng + ?Sized>(&self, rng: &mut R) -> NodeIndex {
        self.negative.sample(rng)
    }

    /// Probability of each node under the negative-sampling distribution.
    pub fn negative_distribution(&self) -> Vec<f64> {
        let weights = negative_weights(&self.degree);
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / total).collect()
    }

    pub fn stats(&self) -> HinStats {
        HinStats {
            num_nodes: self.num_nodes,
            num_edges: self.num_edges(),
            edges_per_type: self
                .partitions
                .iter()
                .map(|p| (p.edge_type.clone(), p.len()))
                .collect(),
        }
    }
}

fn negative_weights(degree: &[f64]) -> Vec<f64> {
    let weights: Vec<f64> = degree.iter().map(|d| d.powf(NEGATIVE_SAMPLING_POWER)).collect();
    if weights.iter().sum::<f64>() > 0.0 {
        weights
    } else {
        vec![1.0; degree.len()]
    }
}

/// Incremental construction of a [`HinGraph`].
#[derive(Debug, Clone)]
pub struct HinGraphBuilder {
    num_nodes: usize,
    order: Vec<EdgeType>,
    edges: HashMap<EdgeType, Vec<Edge>>,
}

impl HinGraphBuilder {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            order: Vec::new(),
            edges: HashMap::new(),
        }
    }

    /// Register an edge type even if it ends up with no edges.
    pub fn declare_edge_type(&mut self, edge_type: impl Into<EdgeType>) -> &mut Self {
        let edge_type = edge_type.into();
        if !self.edges.contains_key(&edge_type) {
            self.order.push(edge_type.clone());
            self.edges.insert(edge_type, Vec::new());
        }
        self
    }

    /// Add a directed edge.
    pub fn add_edge(
        &mut self,
        edge_type: impl Into<EdgeType>,
        src: NodeIndex,
        dst: NodeIndex,
        weight: f64,
    ) -> Result<&mut Self> {
        for index in [src, dst] {
            if index >= self.num_nodes {
                return Err(Error::IndexOutOfRange {
                    index,
                    len: self.num_nodes,
                });
            }
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeights(format!("edge weight {weight}")));
        }
        let edge_type = edge_type.into();
        self.declare_edge_type(edge_type.clone());
        if let Some(list) = self.edges.get_mut(&edge_type) {
            list.push(Edge { src, dst, weight });
        }
        Ok(self)
    }

    pub fn build(mut self) -> Result<HinGraph> {
        if self.num_nodes == 0 {
            return Err(Error::Config("node dictionary is empty".into()));
        }

        let mut degree = vec![0.0f64; self.num_nodes];
        let mut partitions = Vec::with_capacity(self.order.len());
        let mut type_index = HashMap::with_capacity(self.order.len());

        for edge_type in self.order {
            let edges = self.edges.remove(&edge_type).unwrap_or_default();
            for e in &edges {
                degree[e.src] += e.weight;
                degree[e.dst] += e.weight;
            }
            let partition = EdgePartition::build(edge_type.clone(), edges)?;
            if partition.is_empty() {
                tracing::warn!(edge_type = %edge_type, "edge type has no sampleable edges");
            }
            type_index.insert(edge_type, partitions.len());
            partitions.push(partition);
        }

        let negative = AliasTable::new(&negative_weights(&degree))?;

        Ok(HinGraph {
            num_nodes: self.num_nodes,
            partitions,
            type_index,
            degree,
            negative,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;
    use std::io::Write;

    fn write(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_parse_and_partition_in_order() {
        let dict = NodeDictionary::from_ids(["A", "B", "C"]);
        let file = write(&["B\tC\t1\tb", "# comment", "A\tB\t2\ta", "", "C\tA\t1\tb"]);
        let graph = HinGraph::from_link_file(file.path(), &dict).unwrap();

        let types: Vec<&str> = graph.edge_types().map(EdgeType::as_str).collect();
        assert_eq!(types, vec!["b", "a"]);
        assert_eq!(graph.num_edges(), 3);
        assert_eq!(graph.partition(0).unwrap().len(), 2);
        assert_eq!(graph.degree(0), Some(3.0));
        assert_eq!(graph.degree(1), Some(3.0));
        assert_eq!(graph.degree(2), Some(2.0));
    }

    #[test]
    fn test_unknown_node_is_config_error() {
        let dict = NodeDictionary::from_ids(["A", "B"]);
        let file = write(&["A\tZ\t1\ta"]);
        let err = HinGraph::from_link_file(file.path(), &dict).unwrap_err();
        assert!(matches!(err, Error::UnknownNode(ref n) if n == "Z"));
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn test_malformed_line_is_parse_error() {
        let dict = NodeDictionary::from_ids(["A", "B"]);
        let file = write(&["A\tB\t1\ta", "A\tB\tx\ta"]);
        let err = HinGraph::from_link_file(file.path(), &dict).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let file = write(&["A\tB\t1"]);
        assert!(HinGraph::from_link_file(file.path(), &dict).is_err());

        let file = write(&["A\tB\t-1\ta"]);
        assert!(HinGraph::from_link_file(file.path(), &dict).is_err());
    }

    #[test]
    fn test_single_edge_always_returned() {
        let mut b = HinGraphBuilder::new(4);
        b.add_edge("a", 2, 3, 0.5).unwrap();
        let graph = b.build().unwrap();
        let mut rng = XorShiftRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert_eq!(graph.sample_edge("a", &mut rng).unwrap(), (2, 3));
        }
    }

    #[test]
    fn test_zero_weight_edge_never_sampled() {
        let mut b = HinGraphBuilder::new(3);
        b.add_edge("a", 0, 1, 1.0).unwrap();
        b.add_edge("a", 1, 2, 0.0).unwrap();
        b.add_edge("a", 2, 0, 3.0).unwrap();
        let graph = b.build().unwrap();
        let mut rng = XorShiftRng::seed_from_u64(11);
        for _ in 0..20_000 {
            assert_ne!(graph.sample_edge("a", &mut rng).unwrap(), (1, 2));
        }
    }

    #[test]
    fn test_empty_and_unknown_types() {
        let mut b = HinGraphBuilder::new(2);
        b.add_edge("a", 0, 1, 1.0).unwrap();
        b.declare_edge_type("z");
        let mut graph = b.build().unwrap();
        let mut rng = XorShiftRng::seed_from_u64(0);

        let err = graph.sample_edge("z", &mut rng).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::EmptyPartition);

        let err = graph.sample_edge("q", &mut rng).unwrap_err();
        assert!(matches!(err, Error::UnknownEdgeType(_)));
        assert!(graph.sample_negative("q", 0, &mut rng).is_err());

        assert_eq!(graph.declare_edge_type("a"), 0);
        assert_eq!(graph.declare_edge_type("w"), 2);
        assert!(graph.partition(2).unwrap().is_empty());
    }

    #[test]
    fn test_negative_distribution_uses_smoothed_degree() {
        let mut b = HinGraphBuilder::new(4);
        b.add_edge("a", 0, 1, 1.0).unwrap();
        b.add_edge("a", 1, 2, 1.0).unwrap();
        let graph = b.build().unwrap();
        let p = graph.negative_distribution();

        let w = [1.0f64, 2.0f64.powf(0.75), 1.0, 0.0];
        let total: f64 = w.iter().sum();
        for (pi, wi) in p.iter().zip(w) {
            assert!((pi - wi / total).abs() < 1e-12);
        }

        // Isolated node 3 is never a negative.
        let mut rng = XorShiftRng::seed_from_u64(5);
        for _ in 0..10_000 {
            assert_ne!(graph.draw_negative(&mut rng), 3);
        }
    }

    #[test]
    fn test_negative_may_equal_true_target() {
        // Self-loop on 0; node 1 is isolated, so every draw is the target itself.
        let mut b = HinGraphBuilder::new(2);
        b.add_edge("a", 0, 0, 1.0).unwrap();
        let graph = b.build().unwrap();
        let mut rng = XorShiftRng::seed_from_u64(8);
        for _ in 0..100 {
            assert_eq!(graph.sample_negative("a", 0, &mut rng).unwrap(), 0);
        }
    }

    #[test]
    fn test_negatives_ignore_edge_weights_chi_squared() {
        // Type "a" puts all its weight on 0 -> 1, type "b" spreads over 2 and 3.
        let mut b = HinGraphBuilder::new(4);
        b.add_edge("a", 0, 1, 9.0).unwrap();
        b.add_edge("b", 2, 3, 1.0).unwrap();
        b.add_edge("b", 3, 2, 1.0).unwrap();
        let graph = b.build().unwrap();
        let p = graph.negative_distribution();

        let trials = 60_000usize;
        let mut rng = XorShiftRng::seed_from_u64(42);
        let mut counts = [0usize; 4];
        for _ in 0..trials {
            counts[graph.sample_negative("a", 1, &mut rng).unwrap()] += 1;
        }
        let chi2: f64 = counts
            .iter()
            .zip(&p)
            .map(|(&c, &pi)| {
                let e = pi * trials as f64;
                (c as f64 - e).powi(2) / e
            })
            .sum();
        // df = 3; conservative cutoff.
        assert!(chi2 < 30.0, "chi2={chi2:.2} counts={counts:?}");
    }

    #[test]
    fn test_init_checks_store_pair() {
        use std::sync::Arc;
        let dict = Arc::new(NodeDictionary::from_ids(["A", "B"]));
        let other = Arc::new(NodeDictionary::from_ids(["A"]));
        let file = write(&["A\tB\t1\ta"]);

        let source = EmbeddingStore::new(dict.clone(), 4, 1).unwrap();
        let context = EmbeddingStore::new(dict, 4, 2).unwrap();
        assert!(HinGraph::init(file.path(), &source, &context).is_ok());

        let short = EmbeddingStore::new(other, 4, 2).unwrap();
        assert!(HinGraph::init(file.path(), &source, &short).is_err());
    }
}
