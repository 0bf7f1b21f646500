//! Genetic programming over process trees.
//!
//! This module evolves process trees towards a weighted blend of replay
//! fitness, precision and simplicity on an event log.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │       GeneticMiner (driver)         │
//! ├─────────────────────────────────────┤
//! │ Selection │ Crossover │ Mutation    │
//! ├─────────────────────────────────────┤
//! │   Objective (weighted metrics)      │
//! ├─────────────────────────────────────┤
//! │   Tree → Net → Token replay         │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use evominer::eventlog::EventLog;
//! use evominer::gp::{GeneticMiner, MinerConfig};
//!
//! let log = EventLog::parse_text("A B C\nA C B\n");
//! let config = MinerConfig { max_generations: 50, ..MinerConfig::default() };
//! let result = GeneticMiner::new(config, &log)?.run();
//! println!("{} ({:.4})", result.best, result.best_fitness);
//! # Ok::<(), evominer::error::MineError>(())
//! ```

mod crossover;
mod evolution;
mod generator;
mod mutation;
mod objective;
mod population;
mod selection;

pub use crossover::crossover;
pub use evolution::{
    FitnessCache, GenerationStats, GeneticMiner, MinerConfig, MinerState, MiningResult, Monitor,
    StopReason,
};
pub use generator::{GenerationContext, GeneratorKind};
pub use mutation::{MutationKind, mutate, mutate_with};
pub use objective::{ConformanceMetric, Metric, Objective};
pub use population::{FitnessStats, Population};
pub use selection::VariationStrategy;
