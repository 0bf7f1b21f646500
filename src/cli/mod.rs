//! CLI command implementations for evominer.

pub(crate) mod mine;
pub(crate) mod replay;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;

/// Output format for `mine` and `replay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Initial population strategy selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum GeneratorArg {
    /// Random binary trees.
    BottomUp,
    /// Position-ordered sequences.
    Sequence,
    /// Blocks from the directly-follows relation.
    DirectlyFollows,
    /// Directly-follows trees with random mutations.
    Noisy,
}

/// Variation strategy selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StrategyArg {
    /// Parents drawn uniformly.
    Proportional,
    /// Parents drawn from tournaments.
    Tournament,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<evominer::MineError> for CliError {
    fn from(e: evominer::MineError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<evominer::LogError> for CliError {
    fn from(e: evominer::LogError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<evominer::ReplayError> for CliError {
    fn from(e: evominer::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<evominer::TreeParseError> for CliError {
    fn from(e: evominer::TreeParseError) -> Self {
        Self::new(format!("invalid model: {e}"))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}
