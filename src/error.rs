//! Error types for process discovery.
//!
//! Only conditions that are fatal for a caller surface here. Structural
//! failures inside the variation operators are handled where they occur by
//! falling back to an unmodified copy, and non-fitting traces are scored
//! rather than reported.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid run configuration. Raised at construction, never mid-run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An objective weight names a metric nobody provides.
    #[error("unknown objective metric: {0}")]
    UnknownMetric(String),
    /// Objective weights must be finite and non-negative.
    #[error("invalid weight {weight} for metric {metric}")]
    InvalidWeight {
        /// Metric the weight belongs to.
        metric: String,
        /// Offending weight.
        weight: f64,
    },
    /// The objective has no terms at all.
    #[error("objective has no metrics")]
    EmptyObjective,
    /// A rate is outside `[0, 1]`.
    #[error("rate {name} = {value} is outside [0, 1]")]
    RateOutOfRange {
        /// Name of the rate field.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Variation rates add up to more than the whole population.
    #[error("variation rates sum to {0}, which exceeds 1")]
    RateSumExceeded(f64),
    /// Population must hold at least one individual.
    #[error("population size must be at least 1")]
    EmptyPopulation,
    /// Fraction of the log used for evaluation must be in `(0, 1]`.
    #[error("percentage_of_log must be in (0, 1], got {0}")]
    InvalidLogFraction(f64),
    /// A fraction of the ranked population must be in `(0, 1]`.
    #[error("pool fraction {name} = {value} must be in (0, 1]")]
    InvalidPoolFraction {
        /// Name of the fraction field.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Time limit must be a positive number of seconds.
    #[error("time limit must be positive, got {0}")]
    InvalidTimeLimit(f64),
    /// Nothing to discover.
    #[error("activity alphabet is empty")]
    EmptyAlphabet,
}

/// Structural defects of a workflow net.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    /// No initial place designated.
    #[error("net has no source place")]
    MissingSource,
    /// No final place designated.
    #[error("net has no sink place")]
    MissingSink,
    /// The source place has incoming arcs.
    #[error("source place {0} has incoming arcs")]
    SourceHasInputs(String),
    /// The sink place has outgoing arcs.
    #[error("sink place {0} has outgoing arcs")]
    SinkHasOutputs(String),
    /// A transition can never receive a token from the source.
    #[error("transition {0} is unreachable from the source place")]
    UnreachableTransition(String),
}

/// Failure of a replay run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The net cannot be replayed at all.
    #[error("malformed net: {0}")]
    MalformedNet(#[from] NetError),
}

/// Failure to read the text notation of a process tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tree notation error at byte {position}: {message}")]
pub struct TreeParseError {
    /// Byte offset into the input.
    pub position: usize,
    /// What was expected.
    pub message: String,
}

/// Failure to load an event log.
#[derive(Debug, Error)]
pub enum LogError {
    /// Reading the file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The JSON form did not parse.
    #[error("invalid JSON log: {0}")]
    Json(#[from] serde_json::Error),
    /// The log holds no traces.
    #[error("event log contains no traces")]
    Empty,
}

/// Top-level failure of a mining run.
#[derive(Debug, Error)]
pub enum MineError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The event log could not be used.
    #[error(transparent)]
    Log(#[from] LogError),
    /// A configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigFile {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A configuration file did not parse.
    #[error("invalid config: {0}")]
    ConfigFormat(#[from] serde_json::Error),
    /// The evaluation worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
