// Allow minor clippy style warnings at crate level
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

//! Core data structures for heterogeneous network embedding.
//!
//! This crate holds everything a trainer reads from or writes to:
//!
//! - [`NodeDictionary`] - the fixed node population and its ids
//! - [`EmbeddingStore`] - one dense vector per node, shared lock-free between threads
//! - [`HinGraph`] - links partitioned by edge type, with O(1) samplers
//! - [`AliasTable`] - Walker/Vose tables behind every sampler
//! - [`read_embeddings`] / [`write_embeddings`] - the text and binary dump format
//!
//! # Heterogeneous Information Networks
//!
//! A HIN has several node types and several relation types. Biomedical
//! networks are typical:
//!
//! | Edge type | Relation | Example |
//! |-----------|----------|---------|
//! | `a` | protein - protein | TP53 - MDM2 |
//! | `b` | symptom - herb | fatigue - 人参 |
//! | `c` | herb - compound | 人参 - ginsenoside |
//!
//! Treating all links as one relation lets dense types drown sparse ones. Here
//! each type keeps its own edge list and sampler, and a trainer visits every
//! type once per batch, so each relation gets an equal share of updates
//! regardless of its size.
//!
//! # Example
//!
//! ```rust
//! use prosnet_core::{EmbeddingStore, HinGraphBuilder, NodeDictionary};
//! use rand::SeedableRng;
//! use std::sync::Arc;
//!
//! let dict = Arc::new(NodeDictionary::from_ids(["TP53", "MDM2", "fatigue"]));
//! let store = EmbeddingStore::new(dict.clone(), 16, 42).unwrap();
//!
//! let mut builder = HinGraphBuilder::new(dict.len());
//! builder.add_edge("a", 0, 1, 1.0).unwrap();
//! let graph = builder.build().unwrap();
//!
//! let mut rng = rand_xorshift::XorShiftRng::seed_from_u64(7);
//! let (src, dst) = graph.sample_edge("a", &mut rng).unwrap();
//! assert_eq!((src, dst), (0, 1));
//! assert_eq!(store.vector(src).unwrap().len(), 16);
//! ```

pub mod alias;
pub mod dictionary;
pub mod embedding;
pub mod error;
pub mod hin;
pub mod io;

pub use alias::AliasTable;
pub use dictionary::{NodeDictionary, NodeIndex};
pub use embedding::{EmbeddingStore, VectorView};
pub use error::{Error, ErrorKind, Result};
pub use hin::{
    Edge, EdgePartition, EdgeType, HinGraph, HinGraphBuilder, HinStats, NEGATIVE_SAMPLING_POWER,
};
pub use io::{read_embeddings, write_embeddings};
