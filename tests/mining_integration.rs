//! Mining runs end to end: stop criteria, history and result shape.
//!
//! Run with: cargo test --release mining_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use evominer::gp::{GeneratorKind, GeneticMiner, MinerConfig, StopReason, VariationStrategy};
use evominer::{EventLog, PetriNet, ProcessTree, ReplayConfig, ReplayLog, replay};

fn log() -> EventLog {
    EventLog::parse_text("A B C\nA C B\nA B C\nA D\n")
}

fn config() -> MinerConfig {
    MinerConfig {
        population_size: 16,
        max_generations: 8,
        threads: Some(2),
        seed: 7,
        ..MinerConfig::default()
    }
}

#[test]
fn test_generation_limit_bounds_the_run() {
    let result = GeneticMiner::new(config(), &log()).unwrap().run();
    assert_eq!(result.stop_reason, StopReason::MaxGenerations);
    assert_eq!(result.generations, 9);
    assert_eq!(result.history.len(), 9);
    assert!(result.best_generation < result.generations);
}

#[test]
fn test_best_ever_never_decreases() {
    let result = GeneticMiner::new(config(), &log()).unwrap().run();
    for pair in result.history.windows(2) {
        assert!(pair[1].best_ever >= pair[0].best_ever);
    }
    let last = result.history.last().unwrap();
    assert_eq!(last.best_ever.to_bits(), result.best_fitness.to_bits());
    for stats in &result.history {
        assert!(stats.fitness.best <= stats.best_ever);
    }
}

#[test]
fn test_stagnation_stops_after_limit() {
    let result = GeneticMiner::new(
        MinerConfig {
            max_generations: 500,
            stagnation_limit: Some(5),
            ..config()
        },
        &log(),
    )
    .unwrap()
    .run();
    assert_eq!(result.stop_reason, StopReason::Stagnation);
    assert_eq!(result.generations - 1, result.best_generation + 5);
}

#[test]
fn test_min_fitness_stops_immediately_when_met() {
    let result = GeneticMiner::new(
        MinerConfig {
            min_fitness: Some(0.0),
            ..config()
        },
        &log(),
    )
    .unwrap()
    .run();
    assert_eq!(result.stop_reason, StopReason::MinFitness);
    assert_eq!(result.generations, 1);
}

#[test]
fn test_time_limit_is_checked_between_generations() {
    let result = GeneticMiner::new(
        MinerConfig {
            max_generations: usize::MAX,
            time_limit_secs: Some(1e-9),
            ..config()
        },
        &log(),
    )
    .unwrap()
    .run();
    assert_eq!(result.stop_reason, StopReason::TimeLimit);
    assert_eq!(result.generations, 1);
}

#[test]
fn test_best_model_is_strictly_valid_and_scored() {
    let log = log();
    let result = GeneticMiner::new(
        MinerConfig {
            generator: GeneratorKind::DirectlyFollows,
            variation: VariationStrategy::tournament(),
            ..config()
        },
        &log,
    )
    .unwrap()
    .run();
    assert!(result.best.is_strictly_valid(&log.alphabet()));
    let reparsed: ProcessTree = result.best_model.parse().unwrap();
    assert_eq!(reparsed.canonical_form(), result.best.canonical_form());

    let outcome = replay(
        &PetriNet::from_tree(&result.best),
        &ReplayLog::new(&log),
        &ReplayConfig::default(),
    )
    .unwrap();
    assert!(outcome.fitness > 0.0);
}

#[test]
fn test_fitness_only_objective_finds_fitting_model() {
    let log = EventLog::parse_text("A B\nA B\nB A\n");
    let result = GeneticMiner::new(
        MinerConfig {
            objective: [("replay_fitness".to_owned(), 1.0)].into(),
            min_fitness: Some(1.0),
            max_generations: 200,
            ..config()
        },
        &log,
    )
    .unwrap()
    .run();
    assert_eq!(result.stop_reason, StopReason::MinFitness);
    assert_eq!(result.best_fitness, 1.0);
}

#[test]
fn test_sampled_log_run_completes() {
    let log = EventLog::parse_text("A B C\nA C B\nA B C\nA B C\nA C B\nA B C\nA B C\nA C B\n");
    let result = GeneticMiner::new(
        MinerConfig {
            percentage_of_log: 0.5,
            max_generations: 3,
            ..config()
        },
        &log,
    )
    .unwrap()
    .run();
    assert_eq!(result.generations, 4);
    assert!(result.distinct_models > 0);
}

#[test]
fn test_result_serializes_without_tree_arena() {
    let result = GeneticMiner::new(
        MinerConfig {
            max_generations: 1,
            ..config()
        },
        &log(),
    )
    .unwrap()
    .run();
    let json: serde_json::Value = serde_json::to_value(&result).unwrap();
    assert_eq!(json["stop_reason"], "max_generations");
    assert_eq!(json["history"].as_array().unwrap().len(), 2);
    assert!(json.get("best").is_none());
    assert!(json["best_model"].is_string());
}

#[test]
fn test_best_fitness_is_the_objective_of_the_best_model() {
    // Duplicate-label branches stress the replay branch choice.
    let log = EventLog::parse_text("A B D\nA B C\nA B D\nA E\n");
    for generator in [GeneratorKind::BottomUp, GeneratorKind::Noisy { mutations: 3 }] {
        let miner = GeneticMiner::new(
            MinerConfig {
                generator,
                max_generations: 6,
                ..config()
            },
            &log,
        )
        .unwrap();
        let objective = miner.objective().clone();
        let result = miner.run();
        assert_eq!(
            result.best_fitness.to_bits(),
            objective.fitness(&result.best).to_bits(),
            "{}",
            result.best_model
        );
    }
}
