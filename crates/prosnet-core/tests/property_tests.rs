//! Property-based tests for prosnet-core.
//!
//! These tests verify invariants that should hold for any input:
//! - Alias table draws follow the weights
//! - Typed graph partitions cover every link exactly once
//! - Embedding dumps reload to the same vectors

use proptest::prelude::*;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

mod alias_props {
    use super::*;
    use prosnet_core::AliasTable;

    fn arb_weights() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(prop_oneof![Just(0.0), 0.01f64..10.0], 1..12)
            .prop_filter("needs positive mass", |w| w.iter().any(|x| *x > 0.0))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn draws_stay_in_support(weights in arb_weights(), seed in any::<u64>()) {
            let table = AliasTable::new(&weights).unwrap();
            prop_assert_eq!(table.len(), weights.len());
            let mut rng = XorShiftRng::seed_from_u64(seed);
            for _ in 0..2_000 {
                let k = table.sample(&mut rng);
                prop_assert!(k < weights.len());
                prop_assert!(weights[k] > 0.0, "drew zero-weight outcome {}", k);
            }
        }

        #[test]
        fn frequencies_track_weights(weights in arb_weights(), seed in any::<u64>()) {
            let table = AliasTable::new(&weights).unwrap();
            let total: f64 = weights.iter().sum();
            let trials = 40_000usize;
            let mut counts = vec![0usize; weights.len()];
            let mut rng = XorShiftRng::seed_from_u64(seed);
            for _ in 0..trials {
                counts[table.sample(&mut rng)] += 1;
            }
            for (c, w) in counts.iter().zip(&weights) {
                let observed = *c as f64 / trials as f64;
                let expected = w / total;
                // Six standard deviations of a binomial proportion, plus float slack.
                let tol = 6.0 * (expected * (1.0 - expected) / trials as f64).sqrt() + 1e-3;
                prop_assert!(
                    (observed - expected).abs() <= tol,
                    "observed {} expected {} tol {}", observed, expected, tol
                );
            }
        }
    }
}

mod graph_props {
    use super::*;
    use prosnet_core::HinGraphBuilder;

    fn arb_links() -> impl Strategy<Value = Vec<(u8, usize, usize, f64)>> {
        prop::collection::vec((0u8..4, 0usize..8, 0usize..8, 0.1f64..5.0), 1..40)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn partitions_cover_links(links in arb_links()) {
            let mut builder = HinGraphBuilder::new(8);
            for &(t, s, d, w) in &links {
                builder.add_edge(char::from(b'a' + t), s, d, w).unwrap();
            }
            let graph = builder.build().unwrap();

            prop_assert_eq!(graph.num_edges(), links.len());
            let stats = graph.stats();
            let per_type: usize = stats.edges_per_type.iter().map(|(_, n)| n).sum();
            prop_assert_eq!(per_type, links.len());

            // Weighted degree sums to twice the total weight.
            let total: f64 = links.iter().map(|l| l.3).sum();
            let degree_sum: f64 = (0..8).map(|i| graph.degree(i).unwrap()).sum();
            prop_assert!((degree_sum - 2.0 * total).abs() < 1e-9);
        }

        #[test]
        fn sampled_edges_belong_to_their_type(links in arb_links(), seed in any::<u64>()) {
            let mut builder = HinGraphBuilder::new(8);
            for &(t, s, d, w) in &links {
                builder.add_edge(char::from(b'a' + t), s, d, w).unwrap();
            }
            let graph = builder.build().unwrap();
            let mut rng = XorShiftRng::seed_from_u64(seed);

            for tag in graph.edge_types().map(|t| t.as_str().to_string()).collect::<Vec<_>>() {
                let t = tag.as_bytes()[0] - b'a';
                for _ in 0..50 {
                    let (s, d) = graph.sample_edge(&tag, &mut rng).unwrap();
                    prop_assert!(links.iter().any(|l| l.0 == t && l.1 == s && l.2 == d));
                }
            }
        }
    }
}

mod dump_props {
    use super::*;
    use prosnet_core::{read_embeddings, EmbeddingStore, NodeDictionary};
    use std::sync::Arc;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn text_and_binary_dumps_reload(
            n in 1usize..20,
            dim in 1usize..24,
            seed in any::<u64>(),
        ) {
            let dict = Arc::new(NodeDictionary::from_ids((0..n).map(|i| format!("node_{i}"))));
            let store = EmbeddingStore::new(dict, dim, seed).unwrap();
            let dir = tempfile::tempdir().unwrap();
            let text = dir.path().join("emb.txt");
            let bin = dir.path().join("emb.bin");
            store.output(&text, false).unwrap();
            store.output(&bin, true).unwrap();

            let from_text = read_embeddings(&text, false).unwrap();
            let from_bin = read_embeddings(&bin, true).unwrap();
            prop_assert_eq!(from_text.len(), n);
            prop_assert_eq!(from_bin.len(), n);

            for (i, ((tid, tv), (bid, bv))) in from_text.iter().zip(&from_bin).enumerate() {
                let expected_id = format!("node_{i}");
                prop_assert_eq!(tid, &expected_id);
                prop_assert_eq!(bid, &expected_id);
                let original = store.vector(i).unwrap();
                prop_assert_eq!(bv, &original);
                for (a, b) in tv.iter().zip(&original) {
                    prop_assert!((a - b).abs() <= 1e-5);
                }
            }
        }
    }
}
