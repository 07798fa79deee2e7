//! Per-edge-type skip-gram trainer.
//!
//! One training sample is one positive edge `(u, v)` of the trainer's type
//! plus `K` negative targets. For each target `t` with label `l` (1 for `v`,
//! 0 for negatives):
//!
//! ```text
//! g      = (l - σ(u · t)) · alpha
//! error += g · t
//! t     += g · u          (if the mode updates targets)
//! u     += error          (once, after all targets, if the mode updates sources)
//! ```
//!
//! This is the negative-sampling objective of LINE
//! ([Tang et al. 2015](https://arxiv.org/abs/1503.03578)) applied separately
//! per relation, as in ProSNet
//! ([Wang et al. 2017](https://doi.org/10.1093/bioinformatics/btx257)).
//! Vectors are read and written in place in the shared stores.

use crate::error::Result;
use crate::mode::{Mode, Space};
use prosnet_core::{EdgeType, EmbeddingStore, Error as CoreError, HinGraph};
use rand::Rng;

/// Logits beyond this magnitude saturate the sigmoid to exactly 0 or 1.
pub const MAX_EXP: f32 = 6.0;

/// Logistic function, clamped outside `[-MAX_EXP, MAX_EXP]`.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    if x > MAX_EXP {
        1.0
    } else if x < -MAX_EXP {
        0.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

/// Graph plus the two embedding spaces, borrowed for one run.
#[derive(Debug, Clone, Copy)]
pub struct TrainContext<'a> {
    pub graph: &'a HinGraph,
    pub source: &'a EmbeddingStore,
    pub context: &'a EmbeddingStore,
}

impl<'a> TrainContext<'a> {
    /// Check that graph and stores cover the same nodes with one dimension.
    pub fn new(
        graph: &'a HinGraph,
        source: &'a EmbeddingStore,
        context: &'a EmbeddingStore,
    ) -> Result<Self> {
        for store in [source, context] {
            if store.len() != graph.num_nodes() {
                return Err(CoreError::DimensionMismatch {
                    expected: graph.num_nodes(),
                    actual: store.len(),
                }
                .into());
            }
        }
        if source.dim() != context.dim() {
            return Err(CoreError::DimensionMismatch {
                expected: source.dim(),
                actual: context.dim(),
            }
            .into());
        }
        Ok(Self {
            graph,
            source,
            context,
        })
    }

    pub fn dim(&self) -> usize {
        self.source.dim()
    }

    #[inline]
    fn targets(&self, mode: Mode) -> &'a EmbeddingStore {
        match mode.target_space() {
            Space::Source => self.source,
            Space::Context => self.context,
        }
    }
}

/// Per-thread buffers, sized to the embedding dimension.
#[derive(Debug, Clone)]
pub struct Scratch {
    error: Vec<f32>,
    source: Vec<f32>,
    target: Vec<f32>,
}

impl Scratch {
    pub fn new(dim: usize) -> Self {
        Self {
            error: vec![0.0; dim],
            source: vec![0.0; dim],
            target: vec![0.0; dim],
        }
    }
}

/// Trainer for one edge type.
#[derive(Debug, Clone)]
pub struct EdgeTrainer {
    edge_type: EdgeType,
    partition: usize,
    negative: usize,
}

impl EdgeTrainer {
    /// Bind a trainer to an edge type of `graph`.
    pub fn new(graph: &HinGraph, edge_type: &str, negative: usize) -> Result<Self> {
        let partition = graph
            .partition_id(edge_type)
            .ok_or_else(|| CoreError::UnknownEdgeType(edge_type.to_string()))?;
        Ok(Self {
            edge_type: EdgeType::from(edge_type),
            partition,
            negative,
        })
    }

    pub fn edge_type(&self) -> &EdgeType {
        &self.edge_type
    }

    pub fn negative(&self) -> usize {
        self.negative
    }

    /// True when the type has nothing to sample.
    pub fn is_empty(&self, graph: &HinGraph) -> bool {
        graph.partition(self.partition).map_or(true, |p| p.is_empty())
    }

    /// Run one positive edge and its negatives.
    ///
    /// Fails with `EmptyPartition` when the type has no sampleable edge.
    #[inline]
    pub fn train_sample<R: Rng + ?Sized>(
        &self,
        ctx: &TrainContext<'_>,
        mode: Mode,
        alpha: f32,
        scratch: &mut Scratch,
        rng: &mut R,
    ) -> Result<()> {
        let partition = ctx
            .graph
            .partition(self.partition)
            .ok_or_else(|| CoreError::UnknownEdgeType(self.edge_type.to_string()))?;
        let edge = *partition.sample(rng)?;
        let targets = ctx.targets(mode);

        let u = ctx.source.vector_of(edge.src)?;
        u.read_into(&mut scratch.source);
        scratch.error.fill(0.0);

        for d in 0..=self.negative {
            let (target, label) = if d == 0 {
                (edge.dst, 1.0)
            } else {
                (ctx.graph.draw_negative(rng), 0.0)
            };
            let t = targets.vector_of(target)?;
            t.read_into(&mut scratch.target);

            let f: f32 = scratch
                .source
                .iter()
                .zip(&scratch.target)
                .map(|(a, b)| a * b)
                .sum();
            let g = (label - sigmoid(f)) * alpha;

            for (e, &x) in scratch.error.iter_mut().zip(&scratch.target) {
                *e += g * x;
            }
            if mode.updates_targets() {
                t.add_scaled(g, &scratch.source);
            }
        }

        if mode.updates_source() {
            u.add_assign(&scratch.error);
        }
        Ok(())
    }
}

/// Trainers in declaration order, one per edge type.
#[derive(Debug, Clone, Default)]
pub struct TrainerSet {
    trainers: Vec<EdgeTrainer>,
}

impl TrainerSet {
    /// One trainer per edge type of `graph`, in graph order.
    pub fn from_graph(graph: &HinGraph, negative: usize) -> Self {
        let trainers = graph
            .edge_types()
            .enumerate()
            .map(|(partition, t)| EdgeTrainer {
                edge_type: t.clone(),
                partition,
                negative,
            })
            .collect();
        Self { trainers }
    }

    /// Trainers for an explicit list of tags, in list order.
    ///
    /// Repeated tags are kept once.
    pub fn from_tags<I, S>(graph: &HinGraph, tags: I, negative: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for tag in tags {
            let tag = tag.as_ref();
            if set.get(tag).is_some() {
                continue;
            }
            set.trainers.push(EdgeTrainer::new(graph, tag, negative)?);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.trainers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trainers.is_empty()
    }

    pub fn get(&self, tag: &str) -> Option<&EdgeTrainer> {
        self.trainers.iter().find(|t| t.edge_type.as_str() == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EdgeTrainer> + '_ {
        self.trainers.iter()
    }

    /// Trainers whose type has sampleable edges.
    pub fn active<'a>(&'a self, graph: &'a HinGraph) -> impl Iterator<Item = &'a EdgeTrainer> + 'a {
        self.trainers.iter().filter(move |t| !t.is_empty(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prosnet_core::{HinGraphBuilder, NodeDictionary};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;
    use std::sync::Arc;

    fn setup() -> (HinGraph, EmbeddingStore, EmbeddingStore) {
        let dict = Arc::new(NodeDictionary::from_ids(["A", "B", "C"]));
        let mut b = HinGraphBuilder::new(3);
        b.add_edge("a", 0, 1, 1.0).unwrap();
        b.declare_edge_type("z");
        let graph = b.build().unwrap();
        let source = EmbeddingStore::new(dict.clone(), 8, 1).unwrap();
        let context = EmbeddingStore::new(dict, 8, 2).unwrap();
        (graph, source, context)
    }

    #[test]
    fn test_sigmoid_clamp() {
        assert_eq!(sigmoid(6.5), 1.0);
        assert_eq!(sigmoid(-6.5), 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-7);
        assert!(sigmoid(5.9) < 1.0);
    }

    #[test]
    fn test_modes_touch_expected_sides() {
        let (graph, source, context) = setup();
        let ctx = TrainContext::new(&graph, &source, &context).unwrap();
        let trainer = EdgeTrainer::new(&graph, "a", 0).unwrap();
        let mut scratch = Scratch::new(8);
        let mut rng = XorShiftRng::seed_from_u64(0);

        let before_u = source.vector(0).unwrap();
        let before_v = context.vector(1).unwrap();
        trainer
            .train_sample(&ctx, Mode::SourceOnly, 0.1, &mut scratch, &mut rng)
            .unwrap();
        assert_ne!(source.vector(0).unwrap(), before_u);
        assert_eq!(context.vector(1).unwrap(), before_v);

        let before_u = source.vector(0).unwrap();
        trainer
            .train_sample(&ctx, Mode::ContextOnly, 0.1, &mut scratch, &mut rng)
            .unwrap();
        assert_eq!(source.vector(0).unwrap(), before_u);
        assert_ne!(context.vector(1).unwrap(), before_v);

        // First-order pairs source with source; context stays put.
        let before_ctx = context.vector(1).unwrap();
        let before_src_v = source.vector(1).unwrap();
        trainer
            .train_sample(&ctx, Mode::FirstOrder, 0.1, &mut scratch, &mut rng)
            .unwrap();
        assert_eq!(context.vector(1).unwrap(), before_ctx);
        assert_ne!(source.vector(1).unwrap(), before_src_v);
    }

    #[test]
    fn test_positive_step_raises_score() {
        let (graph, source, context) = setup();
        let ctx = TrainContext::new(&graph, &source, &context).unwrap();
        let trainer = EdgeTrainer::new(&graph, "a", 0).unwrap();
        let mut scratch = Scratch::new(8);
        let mut rng = XorShiftRng::seed_from_u64(0);

        let before = source.dot(0, &context, 1).unwrap();
        for _ in 0..100 {
            trainer
                .train_sample(&ctx, Mode::SecondOrder, 0.05, &mut scratch, &mut rng)
                .unwrap();
        }
        assert!(source.dot(0, &context, 1).unwrap() > before);
    }

    #[test]
    fn test_unknown_and_empty_types() {
        let (graph, source, context) = setup();
        let err = EdgeTrainer::new(&graph, "q", 5).unwrap_err();
        assert_eq!(err.kind(), prosnet_core::ErrorKind::Config);

        let ctx = TrainContext::new(&graph, &source, &context).unwrap();
        let empty = EdgeTrainer::new(&graph, "z", 5).unwrap();
        assert!(empty.is_empty(&graph));
        let mut rng = XorShiftRng::seed_from_u64(0);
        let err = empty
            .train_sample(&ctx, Mode::SecondOrder, 0.1, &mut Scratch::new(8), &mut rng)
            .unwrap_err();
        assert_eq!(err.kind(), prosnet_core::ErrorKind::EmptyPartition);
    }

    #[test]
    fn test_trainer_set_order_and_active() {
        let (graph, _, _) = setup();
        let all = TrainerSet::from_graph(&graph, 5);
        let tags: Vec<&str> = all.iter().map(|t| t.edge_type().as_str()).collect();
        assert_eq!(tags, vec!["a", "z"]);
        assert_eq!(all.active(&graph).count(), 1);

        let listed = TrainerSet::from_tags(&graph, ["z", "a", "z"], 2).unwrap();
        let tags: Vec<&str> = listed.iter().map(|t| t.edge_type().as_str()).collect();
        assert_eq!(tags, vec!["z", "a"]);
        assert!(TrainerSet::from_tags(&graph, ["a", "q"], 2).is_err());
    }

    #[test]
    fn test_context_rejects_mismatched_store() {
        let (graph, source, _) = setup();
        let small = EmbeddingStore::new(Arc::new(NodeDictionary::from_ids(["A"])), 8, 0).unwrap();
        assert!(TrainContext::new(&graph, &source, &small).is_err());
        let wide = EmbeddingStore::new(source.dictionary().clone(), 4, 0).unwrap();
        assert!(TrainContext::new(&graph, &source, &wide).is_err());
    }
}
