//! Building the next generation from the current one.
//!
//! Both strategies split the new population the same way:
//!
//! ```text
//! | elites | random trees | crossover children | mutants | random fill |
//! ```
//!
//! and differ only in how parents are picked. The fill keeps the new
//! population exactly as large as the old one whatever the rounding.

// Slot counts are fractions of the population size
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use crate::error::ConfigError;
use crate::gp::crossover::crossover;
use crate::gp::generator::{GenerationContext, GeneratorKind};
use crate::gp::mutation::mutate;
use crate::gp::population::Population;
use crate::tree::ProcessTree;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Individuals sampled per tournament.
pub(crate) const TOURNAMENT_GROUP_SIZE: usize = 6;

/// How the next generation is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum VariationStrategy {
    /// Parents drawn uniformly from the whole population.
    Proportional {
        /// Fraction kept verbatim from the top.
        elite_rate: f64,
        /// Fraction of fresh random trees.
        random_creation_rate: f64,
        /// Fraction of crossover children.
        crossover_rate: f64,
        /// Fraction of mutated copies.
        mutation_rate: f64,
    },
    /// Parents drawn from tournaments among the top of the ranking.
    Tournament {
        /// Fraction kept verbatim from the top.
        elite_rate: f64,
        /// Fraction of fresh random trees.
        random_creation_rate: f64,
        /// Fraction of crossover children.
        crossover_rate: f64,
        /// Fraction of mutated copies.
        mutation_rate: f64,
        /// Top fraction of the ranking tournaments sample from.
        crossover_pool: f64,
        /// Top fraction of the ranking mutants are drawn from.
        mutation_pool: f64,
    },
}

impl Default for VariationStrategy {
    fn default() -> Self {
        VariationStrategy::Proportional {
            elite_rate: 0.05,
            random_creation_rate: 0.15,
            crossover_rate: 0.4,
            mutation_rate: 0.4,
        }
    }
}

impl VariationStrategy {
    /// Tournament strategy with the default rates, sampling from the top half.
    #[must_use]
    pub fn tournament() -> Self {
        VariationStrategy::Tournament {
            elite_rate: 0.05,
            random_creation_rate: 0.15,
            crossover_rate: 0.4,
            mutation_rate: 0.4,
            crossover_pool: 0.5,
            mutation_pool: 0.5,
        }
    }

    /// `(elite, random, crossover, mutation)` rates.
    fn rates(&self) -> [(&'static str, f64); 4] {
        let (VariationStrategy::Proportional {
            elite_rate,
            random_creation_rate,
            crossover_rate,
            mutation_rate,
        }
        | VariationStrategy::Tournament {
            elite_rate,
            random_creation_rate,
            crossover_rate,
            mutation_rate,
            ..
        }) = *self;
        [
            ("elite_rate", elite_rate),
            ("random_creation_rate", random_creation_rate),
            ("crossover_rate", crossover_rate),
            ("mutation_rate", mutation_rate),
        ]
    }

    /// Check that every rate is in `[0, 1]`, that they sum to at most 1 and
    /// that tournament pools are non-empty fractions.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = self.rates();
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        let sum: f64 = rates.iter().map(|(_, v)| v).sum();
        if sum > 1.0 + 1e-9 {
            return Err(ConfigError::RateSumExceeded(sum));
        }
        if let VariationStrategy::Tournament {
            crossover_pool,
            mutation_pool,
            ..
        } = *self
        {
            for (name, value) in [("crossover_pool", crossover_pool), ("mutation_pool", mutation_pool)] {
                if !(value > 0.0 && value <= 1.0) {
                    return Err(ConfigError::InvalidPoolFraction { name, value });
                }
            }
        }
        Ok(())
    }

    /// Produce a population of the same size as `population`.
    ///
    /// Elites are deep copies that keep their memoized fitness; every other
    /// individual is new and unscored unless a variation fell back to a copy.
    #[must_use]
    pub fn next_generation<R: Rng>(
        &self,
        population: &Population,
        generator: &GeneratorKind,
        context: &GenerationContext,
        rng: &mut R,
    ) -> Population {
        let n = population.len();
        let [elite, random, crossovers, mutations] =
            self.rates().map(|(_, rate)| (rate * n as f64).floor() as usize);
        let alphabet = context.alphabet();

        let mut next: Vec<ProcessTree> = Vec::with_capacity(n);
        next.extend(population.get_best(elite).into_iter().map(ProcessTree::deep_copy));
        next.extend(generator.generate_population(context, random, rng));

        if !population.is_empty() {
            match *self {
                VariationStrategy::Proportional { .. } => {
                    let trees = population.trees();
                    for _ in 0..crossovers {
                        let first = &trees[rng.gen_range(0..n)];
                        let second = &trees[rng.gen_range(0..n)];
                        next.push(crossover(first, second, alphabet, rng));
                    }
                    for _ in 0..mutations {
                        next.push(mutate(&trees[rng.gen_range(0..n)], alphabet, rng));
                    }
                }
                VariationStrategy::Tournament {
                    crossover_pool,
                    mutation_pool,
                    ..
                } => {
                    let pool = population.get_interval(0.0, crossover_pool);
                    for _ in 0..crossovers {
                        let (first, second) = tournament(&pool, rng);
                        next.push(crossover(first, second, alphabet, rng));
                    }
                    let pool = population.get_interval(0.0, mutation_pool);
                    for _ in 0..mutations {
                        let parent = pool[rng.gen_range(0..pool.len())];
                        next.push(mutate(parent, alphabet, rng));
                    }
                }
            }
        }

        next.truncate(n);
        let shortfall = n - next.len();
        next.extend(generator.generate_population(context, shortfall, rng));
        Population::new(next)
    }
}

/// The two fittest members of a random group drawn from `pool`, which must
/// be ranked best first and non-empty.
fn tournament<'a, R: Rng>(pool: &[&'a ProcessTree], rng: &mut R) -> (&'a ProcessTree, &'a ProcessTree) {
    let size = TOURNAMENT_GROUP_SIZE.min(pool.len());
    let mut group = rand::seq::index::sample(rng, pool.len(), size).into_vec();
    // Lower pool index means higher rank.
    group.sort_unstable();
    let first = pool[group[0]];
    let second = group.get(1).map_or(first, |&i| pool[i]);
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventlog::EventLog;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn setup(n: usize) -> (Population, GenerationContext, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(42);
        let context = GenerationContext::from_log(&EventLog::parse_text("A B C D\nA C B D\n"));
        let mut trees = GeneratorKind::BottomUp.generate_population(&context, n, &mut rng);
        for (i, tree) in trees.iter_mut().enumerate() {
            tree.set_fitness(i as f64 / n as f64);
        }
        (Population::new(trees), context, rng)
    }

    #[test]
    fn test_default_is_valid() {
        assert!(VariationStrategy::default().validate().is_ok());
        assert!(VariationStrategy::tournament().validate().is_ok());
    }

    #[test]
    fn test_rate_errors() {
        let strategy = VariationStrategy::Proportional {
            elite_rate: 0.5,
            random_creation_rate: 0.5,
            crossover_rate: 0.5,
            mutation_rate: 0.0,
        };
        assert!(matches!(strategy.validate(), Err(ConfigError::RateSumExceeded(_))));

        let strategy = VariationStrategy::Proportional {
            elite_rate: -0.1,
            random_creation_rate: 0.0,
            crossover_rate: 0.0,
            mutation_rate: 0.0,
        };
        assert!(matches!(
            strategy.validate(),
            Err(ConfigError::RateOutOfRange { name: "elite_rate", .. })
        ));

        let strategy = VariationStrategy::Tournament {
            elite_rate: 0.1,
            random_creation_rate: 0.1,
            crossover_rate: 0.1,
            mutation_rate: 0.1,
            crossover_pool: 0.0,
            mutation_pool: 0.5,
        };
        assert!(matches!(
            strategy.validate(),
            Err(ConfigError::InvalidPoolFraction { name: "crossover_pool", .. })
        ));
    }

    #[test]
    fn test_size_is_preserved() {
        for n in [1, 7, 20, 33] {
            for strategy in [VariationStrategy::default(), VariationStrategy::tournament()] {
                let (population, context, mut rng) = setup(n);
                let next =
                    strategy.next_generation(&population, &GeneratorKind::BottomUp, &context, &mut rng);
                assert_eq!(next.len(), n);
                assert!(next.trees().iter().all(|t| t.is_strictly_valid(context.alphabet())));
            }
        }
    }

    #[test]
    fn test_elites_keep_fitness() {
        let (population, context, mut rng) = setup(20);
        let next = VariationStrategy::default().next_generation(
            &population,
            &GeneratorKind::BottomUp,
            &context,
            &mut rng,
        );
        assert_eq!(next.trees()[0].fitness(), Some(19.0 / 20.0));
    }

    #[test]
    fn test_tournament_picks_top_of_group() {
        let (population, _, mut rng) = setup(4);
        let pool = population.get_interval(0.0, 1.0);
        let (first, second) = tournament(&pool, &mut rng);
        assert_eq!(first.fitness(), Some(0.75));
        assert_eq!(second.fitness(), Some(0.5));
    }
}
