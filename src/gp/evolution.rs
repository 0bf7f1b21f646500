//! The genetic algorithm driver.
//!
//! A run moves through a small state machine:
//!
//! ```text
//!  Initializing ──► Evaluating ──► CheckingStop ──► Done
//!                       ▲               │
//!                       └── Evolving ◄──┘
//! ```
//!
//! Generations are strictly sequential. Within a generation, individuals
//! without a memoized fitness are scored in parallel on a fixed rayon pool;
//! all randomness stays on the driver thread so a seed reproduces a run
//! regardless of the number of workers.

// Statistics use intentional casts
#![allow(clippy::cast_precision_loss)]

use crate::error::{ConfigError, LogError, MineError};
use crate::eventlog::EventLog;
use crate::gp::generator::{GenerationContext, GeneratorKind};
use crate::gp::objective::{ConformanceMetric, Objective};
use crate::gp::population::{FitnessStats, Population};
use crate::gp::selection::VariationStrategy;
use crate::replay::ReplayConfig;
use crate::tree::ProcessTree;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Configuration of a mining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Strategy for generation 0 and random injection.
    pub generator: GeneratorKind,
    /// How each generation is derived from the previous one.
    pub variation: VariationStrategy,
    /// Metric name to weight.
    pub objective: BTreeMap<String, f64>,
    /// Last generation index to evaluate.
    pub max_generations: usize,
    /// Stop once the best-ever fitness reaches this value.
    pub min_fitness: Option<f64>,
    /// Stop after this many generations without a new best.
    pub stagnation_limit: Option<usize>,
    /// Stop after this much wall-clock time, checked between generations.
    pub time_limit_secs: Option<f64>,
    /// Fraction of the traces used for scoring.
    pub percentage_of_log: f64,
    /// Place count at which simplicity reaches 0. Defaults to four places
    /// per activity plus source and sink.
    pub max_places: Option<usize>,
    /// Replay engine options.
    pub replay: ReplayConfig,
    /// Generations a fitness cache entry survives without being used.
    /// Unset keeps every entry for the whole run.
    pub fitness_cache_horizon: Option<usize>,
    /// Worker threads for scoring, rayon's default when unset.
    pub threads: Option<usize>,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generator: GeneratorKind::default(),
            variation: VariationStrategy::default(),
            objective: BTreeMap::from([
                ("replay_fitness".to_owned(), 0.5),
                ("precision".to_owned(), 0.4),
                ("simplicity".to_owned(), 0.1),
            ]),
            max_generations: usize::MAX,
            min_fitness: None,
            stagnation_limit: None,
            time_limit_secs: None,
            percentage_of_log: 1.0,
            max_places: None,
            replay: ReplayConfig::default(),
            fitness_cache_horizon: Some(50),
            threads: None,
            seed: 42,
        }
    }
}

impl MinerConfig {
    /// Load a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, MineError> {
        let text = std::fs::read_to_string(path).map_err(|source| MineError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check everything that can be checked without a log. Objective
    /// names are resolved when the miner is built.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        self.variation.validate()?;
        if !(self.percentage_of_log > 0.0 && self.percentage_of_log <= 1.0) {
            return Err(ConfigError::InvalidLogFraction(self.percentage_of_log));
        }
        if let Some(secs) = self.time_limit_secs {
            if !(secs > 0.0 && secs.is_finite()) {
                return Err(ConfigError::InvalidTimeLimit(secs));
            }
        }
        Ok(())
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The best-ever fitness reached `min_fitness`.
    MinFitness,
    /// No new best for `stagnation_limit` generations.
    Stagnation,
    /// `time_limit_secs` elapsed.
    TimeLimit,
    /// `max_generations` was evaluated.
    MaxGenerations,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::MinFitness => "minimum fitness reached",
            StopReason::Stagnation => "stagnation limit reached",
            StopReason::TimeLimit => "time limit exceeded",
            StopReason::MaxGenerations => "generation limit reached",
        })
    }
}

/// Driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MinerState {
    /// Generation 0 has not been created.
    Initializing,
    /// The current generation needs scoring.
    Evaluating,
    /// The current generation is scored; stop criteria are pending.
    CheckingStop,
    /// The next generation needs building.
    Evolving,
    /// The run is over.
    Done(StopReason),
}

/// Statistics for a single generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationStats {
    /// Generation number, starting at 0.
    pub generation: usize,
    /// Fitness distribution of the generation.
    #[serde(flatten)]
    pub fitness: FitnessStats,
    /// Best fitness seen so far in the run.
    pub best_ever: f64,
    /// Individuals scored by the objective in this generation.
    pub evaluated: usize,
    /// Individuals scored from the fitness cache.
    pub cache_hits: usize,
    /// Seconds since the run started.
    pub elapsed_secs: f64,
}

/// Observer of a running miner.
pub trait Monitor: Send {
    /// Called after every generation has been scored.
    fn on_generation(&mut self, stats: &GenerationStats, population: &Population);

    /// Called once with the final result.
    fn on_finish(&mut self, _result: &MiningResult) {}
}

impl<F> Monitor for F
where
    F: FnMut(&GenerationStats, &Population) + Send,
{
    fn on_generation(&mut self, stats: &GenerationStats, population: &Population) {
        self(stats, population);
    }
}

/// Objective values by canonical structure, for one run.
///
/// Trees that differ only in the order of commutative children share an
/// entry, as do structures rediscovered in later generations. Entries
/// not looked up for a number of generations can be dropped with
/// [`FitnessCache::evict_older_than`].
#[derive(Debug, Clone, Default)]
pub struct FitnessCache {
    /// Score and the last generation that used it.
    scores: HashMap<u64, (f64, usize)>,
    generation: usize,
    scored: usize,
    hits: u64,
}

impl FitnessCache {
    /// Score of a structure, counting the lookup as a hit when found.
    pub fn get(&mut self, hash: u64) -> Option<f64> {
        let entry = self.scores.get_mut(&hash)?;
        entry.1 = self.generation;
        self.hits += 1;
        Some(entry.0)
    }

    /// Record a score.
    pub fn insert(&mut self, hash: u64, score: f64) {
        if self.scores.insert(hash, (score, self.generation)).is_none() {
            self.scored += 1;
        }
    }

    /// Mark later lookups and inserts as made in `generation`.
    pub fn set_generation(&mut self, generation: usize) {
        self.generation = generation;
    }

    /// Drop entries last used more than `horizon` generations ago and
    /// return how many were dropped.
    pub fn evict_older_than(&mut self, horizon: usize) -> usize {
        let before = self.scores.len();
        let current = self.generation;
        self.scores
            .retain(|_, &mut (_, used)| current.saturating_sub(used) <= horizon);
        before - self.scores.len()
    }

    /// Number of structures currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Scores recorded over the whole run, evicted ones included.
    #[must_use]
    pub fn scored(&self) -> usize {
        self.scored
    }

    /// Lookups answered from the cache.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }
}

/// Outcome of a mining run.
#[derive(Debug, Clone, Serialize)]
pub struct MiningResult {
    /// Best individual of the whole run.
    #[serde(skip)]
    pub best: ProcessTree,
    /// Text notation of `best`.
    pub best_model: String,
    /// Objective value of `best`.
    pub best_fitness: f64,
    /// Generation in which `best` was found.
    pub best_generation: usize,
    /// Number of generations evaluated.
    pub generations: usize,
    /// What ended the run.
    pub stop_reason: StopReason,
    /// Wall-clock duration.
    pub elapsed_secs: f64,
    /// Structures scored by the objective. A structure scored again after
    /// leaving the fitness cache counts twice.
    pub distinct_models: usize,
    /// Per-generation statistics.
    pub history: Vec<GenerationStats>,
}

/// Evolutionary process discovery on one event log.
pub struct GeneticMiner {
    config: MinerConfig,
    context: GenerationContext,
    objective: Objective,
    pool: rayon::ThreadPool,
    rng: SmallRng,
    cache: FitnessCache,
    monitors: Vec<Box<dyn Monitor>>,
    state: MinerState,
    population: Population,
    generation: usize,
    best: Option<ProcessTree>,
    best_fitness: f64,
    best_generation: usize,
    history: Vec<GenerationStats>,
    started: Instant,
}

impl fmt::Debug for GeneticMiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneticMiner")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("best_fitness", &self.best_fitness)
            .field("population", &self.population.len())
            .finish_non_exhaustive()
    }
}

impl GeneticMiner {
    /// Build a miner for `log`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the log is empty,
    /// or the worker pool cannot be created.
    pub fn new(config: MinerConfig, log: &EventLog) -> Result<Self, MineError> {
        Self::with_external_metrics(config, log, Vec::new())
    }

    /// Build a miner whose objective may also name `external` metrics.
    ///
    /// # Errors
    ///
    /// Same as [`GeneticMiner::new`].
    pub fn with_external_metrics(
        config: MinerConfig,
        log: &EventLog,
        external: Vec<Arc<dyn ConformanceMetric>>,
    ) -> Result<Self, MineError> {
        config.validate()?;
        if log.is_empty() {
            return Err(LogError::Empty.into());
        }
        let context = GenerationContext::from_log(log);
        if context.alphabet().is_empty() {
            return Err(ConfigError::EmptyAlphabet.into());
        }

        let mut rng = SmallRng::seed_from_u64(config.seed);
        let scored_log = log.sample(config.percentage_of_log, &mut rng);
        if scored_log.len() < log.len() {
            log::info!("scoring on {} of {} traces", scored_log.len(), log.len());
        }
        let max_places = config
            .max_places
            .unwrap_or(4 * context.alphabet().len() + 2);
        let objective = Objective::with_external(
            &config.objective,
            &scored_log,
            config.replay,
            max_places,
            external,
        )?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads.unwrap_or(0))
            .build()?;

        Ok(Self {
            config,
            context,
            objective,
            pool,
            rng,
            cache: FitnessCache::default(),
            monitors: Vec::new(),
            state: MinerState::Initializing,
            population: Population::default(),
            generation: 0,
            best: None,
            best_fitness: f64::NEG_INFINITY,
            best_generation: 0,
            history: Vec::new(),
            started: Instant::now(),
        })
    }

    /// Register an observer.
    pub fn add_monitor(&mut self, monitor: Box<dyn Monitor>) {
        self.monitors.push(monitor);
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> MinerState {
        self.state
    }

    /// Index of the current generation.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Current population.
    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Best individual so far and its fitness.
    #[must_use]
    pub fn best(&self) -> Option<(&ProcessTree, f64)> {
        self.best.as_ref().map(|tree| (tree, self.best_fitness))
    }

    /// The objective in use.
    #[must_use]
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Advance by one state transition and return the new state.
    pub fn step(&mut self) -> MinerState {
        self.state = match self.state {
            MinerState::Initializing => {
                self.started = Instant::now();
                self.population = Population::new(self.config.generator.generate_population(
                    &self.context,
                    self.config.population_size,
                    &mut self.rng,
                ));
                MinerState::Evaluating
            }
            MinerState::Evaluating => {
                self.evaluate();
                MinerState::CheckingStop
            }
            MinerState::CheckingStop => match self.stop_reason() {
                Some(reason) => {
                    log::info!("stopping after generation {}: {reason}", self.generation);
                    MinerState::Done(reason)
                }
                None => MinerState::Evolving,
            },
            MinerState::Evolving => {
                self.population = self.config.variation.next_generation(
                    &self.population,
                    &self.config.generator,
                    &self.context,
                    &mut self.rng,
                );
                self.generation += 1;
                MinerState::Evaluating
            }
            done @ MinerState::Done(_) => done,
        };
        self.state
    }

    /// Run to completion.
    #[must_use]
    pub fn run(mut self) -> MiningResult {
        loop {
            if let MinerState::Done(reason) = self.step() {
                return self.finish(reason);
            }
        }
    }

    fn evaluate(&mut self) {
        self.cache.set_generation(self.generation);
        let trees = self.population.trees_mut();
        let mut pending: Vec<(usize, u64)> = Vec::new();
        let mut cache_hits = 0;
        for (i, tree) in trees.iter_mut().enumerate() {
            if tree.fitness().is_some() {
                continue;
            }
            let hash = tree.structural_hash();
            if let Some(score) = self.cache.get(hash) {
                tree.set_fitness(score);
                cache_hits += 1;
            } else {
                pending.push((i, hash));
            }
        }

        let objective = &self.objective;
        let shared: &[ProcessTree] = &*trees;
        let scores: Vec<f64> = self.pool.install(|| {
            pending
                .par_iter()
                .map(|&(i, _)| objective.fitness(&shared[i]))
                .collect()
        });
        for (&(i, hash), score) in pending.iter().zip(scores) {
            self.cache.insert(hash, score);
            trees[i].set_fitness(score);
        }
        if let Some(horizon) = self.config.fitness_cache_horizon {
            let evicted = self.cache.evict_older_than(horizon);
            if evicted > 0 {
                log::debug!("dropped {evicted} stale fitness cache entries");
            }
        }

        if let Some(best) = self.population.best() {
            let fitness = best.fitness().unwrap_or(f64::NEG_INFINITY);
            if self.best.is_none() || fitness > self.best_fitness {
                self.best = Some(best.deep_copy());
                self.best_fitness = fitness;
                self.best_generation = self.generation;
            }
        }

        let stats = GenerationStats {
            generation: self.generation,
            fitness: self.population.stats(),
            best_ever: self.best_fitness,
            evaluated: pending.len(),
            cache_hits,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        };
        log::info!(
            "Gen {:>5}: best={:.4} mean={:.4} std={:.4} best_ever={:.4}",
            stats.generation,
            stats.fitness.best,
            stats.fitness.mean,
            stats.fitness.std,
            stats.best_ever
        );
        log::trace!(
            "{} scored, {} from cache, {} cached models",
            stats.evaluated,
            stats.cache_hits,
            self.cache.len()
        );
        for monitor in &mut self.monitors {
            monitor.on_generation(&stats, &self.population);
        }
        self.history.push(stats);
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self
            .config
            .min_fitness
            .is_some_and(|min| self.best_fitness >= min)
        {
            return Some(StopReason::MinFitness);
        }
        if self
            .config
            .stagnation_limit
            .is_some_and(|limit| self.generation - self.best_generation >= limit)
        {
            return Some(StopReason::Stagnation);
        }
        if self
            .config
            .time_limit_secs
            .is_some_and(|secs| self.started.elapsed().as_secs_f64() >= secs)
        {
            return Some(StopReason::TimeLimit);
        }
        if self.generation >= self.config.max_generations {
            return Some(StopReason::MaxGenerations);
        }
        None
    }

    fn finish(mut self, stop_reason: StopReason) -> MiningResult {
        let best = self.best.take().unwrap_or_else(ProcessTree::silent);
        let result = MiningResult {
            best_model: best.to_string(),
            best,
            best_fitness: self.best_fitness,
            best_generation: self.best_generation,
            generations: self.generation + 1,
            stop_reason,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            distinct_models: self.cache.scored(),
            history: std::mem::take(&mut self.history),
        };
        for monitor in &mut self.monitors {
            monitor.on_finish(&result);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    fn log() -> EventLog {
        EventLog::parse_text("A B C D\nA C B D\nA B C D\nA E D\n")
    }

    fn small() -> MinerConfig {
        MinerConfig {
            population_size: 12,
            max_generations: 5,
            threads: Some(2),
            ..MinerConfig::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = MinerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, usize::MAX);
    }

    #[test]
    fn test_config_validation() {
        let config = MinerConfig {
            population_size: 0,
            ..MinerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPopulation));
        let config = MinerConfig {
            percentage_of_log: 0.0,
            ..MinerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidLogFraction(0.0)));
        let config = MinerConfig {
            time_limit_secs: Some(-1.0),
            ..MinerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeLimit(-1.0)));
    }

    #[test]
    fn test_unknown_metric_fails_before_running() {
        let config = MinerConfig {
            objective: BTreeMap::from([("generalization".to_owned(), 1.0)]),
            ..small()
        };
        assert!(matches!(
            GeneticMiner::new(config, &log()),
            Err(MineError::Config(ConfigError::UnknownMetric(_)))
        ));
    }

    #[test]
    fn test_empty_log_is_rejected() {
        assert!(matches!(
            GeneticMiner::new(small(), &EventLog::default()),
            Err(MineError::Log(LogError::Empty))
        ));
    }

    #[test]
    fn test_state_machine_order() {
        let mut miner = GeneticMiner::new(
            MinerConfig {
                max_generations: 1,
                ..small()
            },
            &log(),
        )
        .unwrap();
        assert_eq!(miner.state(), MinerState::Initializing);
        assert_eq!(miner.step(), MinerState::Evaluating);
        assert_eq!(miner.step(), MinerState::CheckingStop);
        assert_eq!(miner.step(), MinerState::Evolving);
        assert_eq!(miner.step(), MinerState::Evaluating);
        assert_eq!(miner.generation(), 1);
        assert_eq!(miner.step(), MinerState::CheckingStop);
        assert_eq!(miner.step(), MinerState::Done(StopReason::MaxGenerations));
        assert_eq!(miner.step(), MinerState::Done(StopReason::MaxGenerations));
    }

    #[test]
    fn test_stagnation_counts_from_last_improvement() {
        let mut miner = GeneticMiner::new(
            MinerConfig {
                stagnation_limit: Some(5),
                ..small()
            },
            &log(),
        )
        .unwrap();
        miner.config.max_generations = usize::MAX;
        miner.best_fitness = 0.5;
        miner.best_generation = 10;
        miner.generation = 14;
        assert_eq!(miner.stop_reason(), None);
        miner.generation = 15;
        assert_eq!(miner.stop_reason(), Some(StopReason::Stagnation));
    }

    #[test]
    fn test_min_fitness_checked_before_stagnation() {
        let mut miner = GeneticMiner::new(
            MinerConfig {
                stagnation_limit: Some(1),
                min_fitness: Some(0.9),
                ..small()
            },
            &log(),
        )
        .unwrap();
        miner.best_fitness = 0.95;
        miner.generation = 3;
        assert_eq!(miner.stop_reason(), Some(StopReason::MinFitness));
    }

    #[test]
    fn test_run_is_reproducible() {
        let first = GeneticMiner::new(small(), &log()).unwrap().run();
        let second = GeneticMiner::new(
            MinerConfig {
                threads: Some(1),
                ..small()
            },
            &log(),
        )
        .unwrap()
        .run();
        assert_eq!(first.best_model, second.best_model);
        assert_eq!(first.best_fitness.to_bits(), second.best_fitness.to_bits());
        assert_eq!(first.generations, 6);
    }

    #[test]
    fn test_monitor_sees_every_generation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut miner = GeneticMiner::new(small(), &log()).unwrap();
        miner.add_monitor(Box::new(move |stats: &GenerationStats, population: &Population| {
            assert_eq!(population.len(), 12);
            sink.lock().unwrap().push(stats.generation);
        }));
        let result = miner.run();
        assert_eq!(*seen.lock().unwrap(), (0..result.generations).collect::<Vec<_>>());
    }

    #[test]
    fn test_fitness_cache_drops_unused_entries() {
        let mut cache = FitnessCache::default();
        cache.insert(1, 0.5);
        cache.insert(2, 0.7);
        cache.set_generation(3);
        assert_eq!(cache.get(1), Some(0.5));
        cache.set_generation(5);
        assert_eq!(cache.evict_older_than(2), 1);
        assert_eq!(cache.get(2), None);
        assert_eq!(cache.get(1), Some(0.5));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.scored(), 2);
        assert_eq!(cache.hits(), 2);
    }

    #[test]
    fn test_cache_horizon_bounds_cached_models() {
        let mut miner = GeneticMiner::new(
            MinerConfig {
                fitness_cache_horizon: Some(0),
                max_generations: 4,
                ..small()
            },
            &log(),
        )
        .unwrap();
        while !matches!(miner.step(), MinerState::Done(_)) {
            assert!(miner.cache.len() <= miner.population.len());
        }
        let result = miner.run();
        assert!(result.distinct_models >= result.history[0].evaluated);
    }

    #[test]
    fn test_reordered_children_share_a_consistent_score() {
        let mut miner = GeneticMiner::new(small(), &EventLog::parse_text("A B D\nA E\n")).unwrap();
        let first: ProcessTree = "X(->(A, B, C), ->(A, B, D), ->(A, E))".parse().unwrap();
        let second: ProcessTree = "X(->(A, E), ->(A, B, D), ->(A, B, C))".parse().unwrap();
        miner.population = Population::new(vec![first]);
        miner.evaluate();
        miner.population = Population::new(vec![second]);
        miner.evaluate();
        assert_eq!(miner.cache.len(), 1);
        assert_eq!(miner.cache.hits(), 1);
        let cached = miner.population.trees()[0].fitness().unwrap();
        let direct = miner.objective.fitness(&miner.population.trees()[0]);
        assert_eq!(cached.to_bits(), direct.to_bits());
    }

    #[test]
    fn test_config_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"population_size": 10, "variation": {{"strategy": "tournament",
                "elite_rate": 0.1, "random_creation_rate": 0.1, "crossover_rate": 0.4,
                "mutation_rate": 0.4, "crossover_pool": 0.5, "mutation_pool": 0.8}},
                "generator": {{"kind": "noisy", "mutations": 2}}}}"#
        )
        .unwrap();
        let config = MinerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.population_size, 10);
        assert_eq!(config.generator, GeneratorKind::Noisy { mutations: 2 });
        assert!(matches!(config.variation, VariationStrategy::Tournament { .. }));
        assert_eq!(config.seed, 42);
    }
}
