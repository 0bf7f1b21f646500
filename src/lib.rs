// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Evominer: evolutionary discovery of process trees from event logs.
//!
//! This crate searches for a process tree that explains a set of recorded
//! traces, scoring every candidate by token-based replay on its workflow
//! net:
//! - Arena-backed process trees with arity and activity invariants
//! - Tree to workflow net conversion
//! - Token replay fitness and precision with prefix/suffix caching
//! - A genetic algorithm with pluggable generators and variation strategies
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        GeneticMiner (gp)            │
//! ├─────────────────────────────────────┤
//! │   Objective │ Variation operators   │
//! ├─────────────────────────────────────┤
//! │   Token replay (replay)             │
//! ├─────────────────────────────────────┤
//! │   ProcessTree → PetriNet │ EventLog │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod eventlog;
pub mod gp;
pub mod net;
pub mod replay;
pub mod tree;

pub use error::{ConfigError, LogError, MineError, NetError, ReplayError, TreeParseError};
pub use eventlog::EventLog;
pub use gp::{GeneticMiner, MinerConfig, MiningResult};
pub use net::PetriNet;
pub use replay::{ReplayConfig, ReplayLog, ReplayOutcome, replay};
pub use tree::{NodeId, NodeKind, Operator, ProcessTree};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_to_replay_pipeline() {
        let tree: ProcessTree = "->(A, X(B, C))".parse().unwrap();
        let net = PetriNet::from_tree(&tree);
        let log = EventLog::parse_text("A B\nA C\n");
        let outcome = replay(&net, &ReplayLog::new(&log), &ReplayConfig::default()).unwrap();
        assert_eq!(outcome.traces, 2);
        assert_eq!(outcome.fitting_traces, 2);
    }
}
