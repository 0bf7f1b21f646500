//! A generation of candidate trees and its fitness ranking.

// Ranks are derived from fractions of the population size
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use crate::tree::ProcessTree;
use serde::Serialize;

/// An ordered collection of trees.
///
/// Ranking uses the memoized fitness of each tree; unscored trees rank
/// last. Ties keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct Population {
    trees: Vec<ProcessTree>,
}

impl Population {
    /// Wrap a set of trees.
    #[must_use]
    pub fn new(trees: Vec<ProcessTree>) -> Self {
        Self { trees }
    }

    /// Number of individuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether the population is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Individuals in insertion order.
    #[must_use]
    pub fn trees(&self) -> &[ProcessTree] {
        &self.trees
    }

    /// Mutable access for scoring.
    pub fn trees_mut(&mut self) -> &mut [ProcessTree] {
        &mut self.trees
    }

    /// Take the individuals out.
    #[must_use]
    pub fn into_trees(self) -> Vec<ProcessTree> {
        self.trees
    }

    fn score(tree: &ProcessTree) -> f64 {
        tree.fitness().unwrap_or(f64::NEG_INFINITY)
    }

    /// Indices from fittest to least fit.
    #[must_use]
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.trees.len()).collect();
        order.sort_by(|&a, &b| Self::score(&self.trees[b]).total_cmp(&Self::score(&self.trees[a])));
        order
    }

    /// The fittest individual.
    #[must_use]
    pub fn best(&self) -> Option<&ProcessTree> {
        self.ranking().first().map(|&i| &self.trees[i])
    }

    /// The `k` fittest individuals, best first.
    #[must_use]
    pub fn get_best(&self, k: usize) -> Vec<&ProcessTree> {
        self.ranking()
            .into_iter()
            .take(k)
            .map(|i| &self.trees[i])
            .collect()
    }

    /// Individuals ranked between two relative positions, best first.
    ///
    /// `get_interval(0.0, 0.25)` is the top quarter. The interval holds at
    /// least one individual whenever the population is not empty.
    #[must_use]
    pub fn get_interval(&self, lo: f64, hi: f64) -> Vec<&ProcessTree> {
        let n = self.trees.len();
        if n == 0 {
            return Vec::new();
        }
        let start = ((lo.clamp(0.0, 1.0) * n as f64).floor() as usize).min(n - 1);
        let end = ((hi.clamp(0.0, 1.0) * n as f64).ceil() as usize).clamp(start + 1, n);
        self.ranking()[start..end]
            .iter()
            .map(|&i| &self.trees[i])
            .collect()
    }

    /// Summary of the scored individuals.
    #[must_use]
    pub fn stats(&self) -> FitnessStats {
        let fitness: Vec<f64> = self.trees.iter().filter_map(ProcessTree::fitness).collect();
        FitnessStats::from_fitness(&fitness)
    }
}

impl FromIterator<ProcessTree> for Population {
    fn from_iter<I: IntoIterator<Item = ProcessTree>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Fitness distribution of one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FitnessStats {
    /// Highest fitness.
    pub best: f64,
    /// Mean fitness.
    pub mean: f64,
    /// Lowest fitness.
    pub worst: f64,
    /// Standard deviation of fitness.
    pub std: f64,
}

impl FitnessStats {
    /// Calculate statistics from fitness values.
    #[must_use]
    pub fn from_fitness(fitness: &[f64]) -> Self {
        if fitness.is_empty() {
            return Self::default();
        }

        let n = fitness.len() as f64;
        let mean = fitness.iter().sum::<f64>() / n;
        let best = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;

        Self {
            best,
            mean,
            worst,
            std: variance.sqrt(),
        }
    }
}
