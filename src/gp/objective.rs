//! Weighted multi-metric objective.
//!
//! The objective is configured once from a `{metric name: weight}` map.
//! Names are resolved at construction so a typo fails the run before the
//! first generation instead of silently scoring nothing.
//!
//! | name | value |
//! |---|---|
//! | `replay_fitness` (`fitness`) | token replay fitness |
//! | `precision` | escaping-edges precision |
//! | `simplicity` | `1 - places / max_places`, at least 0 |
//! | `arc_degree_simplicity` | `1 / (1 + max(mean arc degree - 2, 0))` |
//!
//! Other names resolve against registered [`ConformanceMetric`]s.

// Place counts are small enough for f64
#![allow(clippy::cast_precision_loss)]

use crate::error::{ConfigError, ReplayError};
use crate::eventlog::EventLog;
use crate::net::PetriNet;
use crate::replay::{ReplayConfig, ReplayLog, replay};
use crate::tree::ProcessTree;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A conformance measure supplied from outside the crate.
pub trait ConformanceMetric: Send + Sync {
    /// Name used in the weight map.
    fn name(&self) -> &str;

    /// Score in `[0, 1]` of a replayable net against a log.
    fn score(&self, net: &PetriNet, log: &EventLog) -> f64;
}

/// A resolved objective term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Metric {
    /// Token replay fitness.
    ReplayFitness,
    /// Escaping-edges precision.
    Precision,
    /// Place-count simplicity.
    Simplicity,
    /// Arc-degree simplicity.
    ArcDegreeSimplicity,
    /// A registered [`ConformanceMetric`], by registration order.
    External(usize),
}

impl Metric {
    /// Resolve a built-in metric name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "replay_fitness" | "fitness" => Some(Metric::ReplayFitness),
            "precision" => Some(Metric::Precision),
            "simplicity" => Some(Metric::Simplicity),
            "arc_degree_simplicity" => Some(Metric::ArcDegreeSimplicity),
            _ => None,
        }
    }

    fn needs_replay(self) -> bool {
        matches!(self, Metric::ReplayFitness | Metric::Precision)
    }
}

/// The objective function of a mining run.
#[derive(Clone)]
pub struct Objective {
    terms: Vec<(Metric, f64)>,
    external: Vec<Arc<dyn ConformanceMetric>>,
    log: EventLog,
    replay_log: ReplayLog,
    replay: ReplayConfig,
    max_places: usize,
}

impl fmt::Debug for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objective")
            .field("terms", &self.terms)
            .field("external", &self.external.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("traces", &self.log.len())
            .field("replay", &self.replay)
            .field("max_places", &self.max_places)
            .finish()
    }
}

impl Objective {
    /// Objective over the built-in metrics.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names, negative or non-finite weights,
    /// or an empty weight map.
    pub fn new(
        weights: &BTreeMap<String, f64>,
        log: &EventLog,
        replay: ReplayConfig,
        max_places: usize,
    ) -> Result<Self, ConfigError> {
        Self::with_external(weights, log, replay, max_places, Vec::new())
    }

    /// Objective that may also name the given external metrics.
    ///
    /// # Errors
    ///
    /// Same as [`Objective::new`].
    pub fn with_external(
        weights: &BTreeMap<String, f64>,
        log: &EventLog,
        replay: ReplayConfig,
        max_places: usize,
        external: Vec<Arc<dyn ConformanceMetric>>,
    ) -> Result<Self, ConfigError> {
        if weights.is_empty() {
            return Err(ConfigError::EmptyObjective);
        }
        let mut terms = Vec::with_capacity(weights.len());
        for (name, &weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    metric: name.clone(),
                    weight,
                });
            }
            let metric = Metric::builtin(name)
                .or_else(|| {
                    external
                        .iter()
                        .position(|m| m.name() == name.as_str())
                        .map(Metric::External)
                })
                .ok_or_else(|| ConfigError::UnknownMetric(name.clone()))?;
            terms.push((metric, weight));
        }
        Ok(Self {
            terms,
            external,
            log: log.clone(),
            replay_log: ReplayLog::new(log),
            replay,
            max_places: max_places.max(1),
        })
    }

    /// Resolved terms in name order.
    #[must_use]
    pub fn terms(&self) -> &[(Metric, f64)] {
        &self.terms
    }

    /// Display name of a metric.
    #[must_use]
    pub fn metric_name(&self, metric: Metric) -> &str {
        match metric {
            Metric::ReplayFitness => "replay_fitness",
            Metric::Precision => "precision",
            Metric::Simplicity => "simplicity",
            Metric::ArcDegreeSimplicity => "arc_degree_simplicity",
            Metric::External(i) => self.external.get(i).map_or("external", |m| m.name()),
        }
    }

    /// Value of every configured metric for `tree`, unweighted.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::MalformedNet`] if the converted net is not a
    /// replayable workflow net.
    pub fn evaluate(&self, tree: &ProcessTree) -> Result<Vec<(Metric, f64)>, ReplayError> {
        let net = PetriNet::from_tree(tree);
        net.validate()?;
        let outcome = if self.terms.iter().any(|(m, _)| m.needs_replay()) {
            Some(replay(&net, &self.replay_log, &self.replay)?)
        } else {
            None
        };

        Ok(self
            .terms
            .iter()
            .map(|&(metric, _)| {
                let value = match metric {
                    Metric::ReplayFitness => outcome.as_ref().map_or(0.0, |o| o.fitness),
                    Metric::Precision => outcome.as_ref().map_or(0.0, |o| o.precision),
                    Metric::Simplicity => {
                        (1.0 - net.places().len() as f64 / self.max_places as f64).max(0.0)
                    }
                    Metric::ArcDegreeSimplicity => {
                        1.0 / (1.0 + (net.mean_arc_degree() - 2.0).max(0.0))
                    }
                    Metric::External(i) => self
                        .external
                        .get(i)
                        .map_or(0.0, |m| m.score(&net, &self.log)),
                };
                (metric, value)
            })
            .collect())
    }

    /// Weighted sum of the configured metrics. A tree whose net cannot be
    /// replayed scores 0.
    #[must_use]
    pub fn fitness(&self, tree: &ProcessTree) -> f64 {
        match self.evaluate(tree) {
            Ok(values) => values
                .iter()
                .zip(&self.terms)
                .map(|((_, value), (_, weight))| value * weight)
                .sum(),
            Err(e) => {
                log::debug!("scoring {tree} as 0: {e}");
                0.0
            }
        }
    }
}
