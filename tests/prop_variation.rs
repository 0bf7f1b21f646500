//! Property-based tests for generators and variation operators.
//!
//! These tests verify that no operator ever lets an invalid tree into a
//! population. Run with: cargo test --release prop_variation

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use evominer::gp::{
    GenerationContext, GeneratorKind, MutationKind, Population, VariationStrategy, crossover,
    mutate_with,
};
use evominer::{EventLog, ProcessTree};

fn generator(kind: usize) -> GeneratorKind {
    match kind {
        0 => GeneratorKind::BottomUp,
        1 => GeneratorKind::Sequence,
        2 => GeneratorKind::DirectlyFollows,
        _ => GeneratorKind::Noisy { mutations: 2 },
    }
}

fn context_strategy() -> impl Strategy<Value = GenerationContext> {
    prop::collection::vec(prop::collection::vec(0u8..8, 1..8), 1..12).prop_map(|traces| {
        GenerationContext::from_log(&EventLog::from_traces(
            traces
                .into_iter()
                .map(|t| t.into_iter().map(|i| char::from(b'A' + i).to_string())),
        ))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Generators place every activity exactly once.
    #[test]
    fn prop_generated_trees_are_strictly_valid(
        context in context_strategy(),
        seed in any::<u64>(),
        kind in 0usize..4,
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let tree = generator(kind).generate(&context, &mut rng);
        prop_assert!(tree.is_strictly_valid(context.alphabet()), "{}", tree);
    }

    /// Every mutation kind keeps a strictly valid tree strictly valid.
    #[test]
    fn prop_mutation_preserves_strict_validity(
        context in context_strategy(),
        seed in any::<u64>(),
        kind in 0usize..4,
        rounds in 1usize..20,
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut tree = generator(kind).generate(&context, &mut rng);
        for round in 0..rounds {
            let mutation = MutationKind::ALL[round % MutationKind::ALL.len()];
            tree = mutate_with(mutation, &tree, context.alphabet(), &mut rng);
            prop_assert!(tree.is_strictly_valid(context.alphabet()), "{:?}: {}", mutation, tree);
        }
    }

    /// Crossover children contain every activity exactly once.
    #[test]
    fn prop_crossover_preserves_strict_validity(
        context in context_strategy(),
        seed in any::<u64>(),
        first_kind in 0usize..4,
        second_kind in 0usize..4,
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let first = generator(first_kind).generate(&context, &mut rng);
        let second = generator(second_kind).generate(&context, &mut rng);
        let child = crossover(&first, &second, context.alphabet(), &mut rng);
        prop_assert!(child.is_strictly_valid(context.alphabet()), "{} x {} = {}", first, second, child);
    }

    /// Operators never modify their inputs.
    #[test]
    fn prop_variation_leaves_parents_untouched(
        context in context_strategy(),
        seed in any::<u64>(),
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let first = GeneratorKind::BottomUp.generate(&context, &mut rng);
        let second = GeneratorKind::DirectlyFollows.generate(&context, &mut rng);
        let (first_text, second_text) = (first.to_string(), second.to_string());
        let _ = crossover(&first, &second, context.alphabet(), &mut rng);
        for kind in MutationKind::ALL {
            let _ = mutate_with(kind, &first, context.alphabet(), &mut rng);
        }
        prop_assert_eq!(first.to_string(), first_text);
        prop_assert_eq!(second.to_string(), second_text);
    }

    /// The next generation is exactly as large as the current one and
    /// strictly valid throughout.
    #[test]
    fn prop_next_generation_preserves_size(
        context in context_strategy(),
        seed in any::<u64>(),
        size in 1usize..40,
        tournament in any::<bool>(),
        elite_rate in 0.0f64..0.3,
        random_creation_rate in 0.0f64..0.3,
        crossover_rate in 0.0f64..0.4,
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mutation_rate = (1.0 - elite_rate - random_creation_rate - crossover_rate).max(0.0);
        let strategy = if tournament {
            VariationStrategy::Tournament {
                elite_rate,
                random_creation_rate,
                crossover_rate,
                mutation_rate,
                crossover_pool: 0.5,
                mutation_pool: 0.5,
            }
        } else {
            VariationStrategy::Proportional {
                elite_rate,
                random_creation_rate,
                crossover_rate,
                mutation_rate,
            }
        };
        let mut trees = GeneratorKind::BottomUp.generate_population(&context, size, &mut rng);
        for (i, tree) in trees.iter_mut().enumerate() {
            tree.set_fitness(i as f64 / size as f64);
        }
        let population = Population::new(trees);
        let next = strategy.next_generation(&population, &GeneratorKind::Sequence, &context, &mut rng);
        prop_assert_eq!(next.len(), size);
        for tree in next.trees() {
            prop_assert!(tree.is_strictly_valid(context.alphabet()), "{}", tree);
        }
    }

    /// Reordering commutative children does not change the structural hash.
    #[test]
    fn prop_structural_hash_ignores_commutative_order(
        context in context_strategy(),
        seed in any::<u64>(),
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let tree = GeneratorKind::BottomUp.generate(&context, &mut rng);
        let mut shuffled = tree.deep_copy();
        for id in shuffled.operator_nodes() {
            if shuffled.kind(id).operator().is_some_and(|op| op.is_commutative()) {
                shuffled.shuffle_children(id, &mut rng);
            }
        }
        prop_assert_eq!(tree.structural_hash(), shuffled.structural_hash());
        let reparsed: ProcessTree = tree.to_string().parse().unwrap();
        prop_assert_eq!(reparsed.structural_hash(), tree.structural_hash());
    }
}
