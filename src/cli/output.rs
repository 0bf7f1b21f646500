//! Output formatting utilities for CLI.

use evominer::gp::MiningResult;
use evominer::{PetriNet, ProcessTree, ReplayOutcome};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// JSON report of a mining run.
#[derive(Debug, Serialize)]
pub(super) struct JsonMiningReport<'a> {
    /// Run summary and history.
    #[serde(flatten)]
    pub(super) result: &'a MiningResult,
    /// Unweighted metric values of the best model.
    pub(super) metrics: BTreeMap<String, f64>,
}

/// Format a mining result as human-readable text.
pub(super) fn format_mining_text(result: &MiningResult, metrics: &[(String, f64)]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Best model (generation {}):", result.best_generation);
    let _ = writeln!(output, "  {}", result.best);
    let _ = writeln!(output, "  Fitness: {:.4}", result.best_fitness);
    for (name, value) in metrics {
        let _ = writeln!(output, "    {name:<24} {value:.4}");
    }
    let _ = writeln!(
        output,
        "Stopped: {} after {} generations ({:.2}s, {} distinct models)",
        result.stop_reason, result.generations, result.elapsed_secs, result.distinct_models
    );

    output
}

/// Format a replay outcome as human-readable text.
pub(super) fn format_replay_text(tree: &ProcessTree, net: &PetriNet, outcome: &ReplayOutcome) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Model: {tree}");
    let _ = writeln!(
        output,
        "  Net: {} places, {} transitions, {} arcs",
        net.places().len(),
        net.transitions().len(),
        net.arc_count()
    );
    let _ = writeln!(output, "  Fitness:   {:.4}", outcome.fitness);
    let _ = writeln!(output, "  Precision: {:.4}", outcome.precision);
    let _ = writeln!(
        output,
        "  Traces: {}/{} fitting",
        outcome.fitting_traces, outcome.traces
    );
    let _ = writeln!(
        output,
        "  Tokens: produced={} consumed={} missing={} remaining={}",
        outcome.produced, outcome.consumed, outcome.missing, outcome.remaining
    );
    if !outcome.missing_by_place.is_empty() {
        output.push_str("  Missing tokens by place:\n");
        for (place, n) in &outcome.missing_by_place {
            let _ = writeln!(output, "    {place:<24} {n}");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use evominer::{EventLog, ReplayConfig, ReplayLog, replay};

    #[test]
    fn test_replay_text_lists_missing_places() {
        let tree: ProcessTree = "->(A, B)".parse().unwrap();
        let net = PetriNet::from_tree(&tree);
        let log = EventLog::parse_text("A B D\n");
        let outcome = replay(&net, &ReplayLog::new(&log), &ReplayConfig::default()).unwrap();
        let text = format_replay_text(&tree, &net, &outcome);
        assert!(text.contains("Model: ->('A', 'B')"));
        assert!(text.contains("unmodeled:D"));
        assert!(text.contains("0/1 fitting"));
    }
}
