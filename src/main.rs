//! Evominer CLI - Command-line interface for process discovery and replay.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use evominer::ReplayConfig;
use std::path::PathBuf;
use std::process::ExitCode;

/// Evominer - evolutionary process tree discovery
#[derive(Parser, Debug)]
#[command(name = "evominer")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover a process tree from an event log
    Mine {
        /// Event log (JSON array of traces, or one trace per line)
        #[arg(required = true)]
        log: PathBuf,

        /// JSON run configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Population size (default: 100)
        #[arg(short, long)]
        population: Option<usize>,

        /// Last generation to evaluate (default: unbounded)
        #[arg(short, long)]
        generations: Option<usize>,

        /// Stop once this fitness is reached
        #[arg(long)]
        min_fitness: Option<f64>,

        /// Stop after N generations without improvement
        #[arg(long)]
        stagnation: Option<usize>,

        /// Stop after this many seconds
        #[arg(long)]
        time_limit: Option<f64>,

        /// Fraction of traces used for scoring, in (0, 1]
        #[arg(long)]
        sample: Option<f64>,

        /// Random seed (default: 42)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Initial population strategy
        #[arg(long)]
        generator: Option<cli::GeneratorArg>,

        /// Mutations applied by the noisy generator
        #[arg(long, default_value = "3")]
        noise_mutations: usize,

        /// Variation strategy
        #[arg(long)]
        strategy: Option<cli::StrategyArg>,

        /// Objective term as name=weight (repeatable)
        #[arg(short, long)]
        objective: Vec<String>,

        /// Disable the replay prefix cache
        #[arg(long)]
        no_prefix_cache: bool,

        /// Disable the replay suffix cache
        #[arg(long)]
        no_suffix_cache: bool,

        /// Write the best model's notation to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long)]
        format: Option<cli::OutputFormat>,

        /// Show a progress spinner
        #[arg(long)]
        progress: bool,
    },

    /// Replay an event log on a process tree
    Replay {
        /// Event log (JSON array of traces, or one trace per line)
        #[arg(required = true)]
        log: PathBuf,

        /// Model in tree notation, e.g. "->(A, X(B, C))"
        #[arg(short, long, conflicts_with = "model_file", required_unless_present = "model_file")]
        model: Option<String>,

        /// File holding the model in tree notation
        #[arg(long)]
        model_file: Option<PathBuf>,

        /// Disable the prefix cache
        #[arg(long)]
        no_prefix_cache: bool,

        /// Disable the suffix cache
        #[arg(long)]
        no_suffix_cache: bool,

        /// Silent firings allowed to enable one transition (default: 256)
        #[arg(long)]
        max_silent_steps: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let result = match args.command {
        Commands::Mine {
            log,
            config,
            population,
            generations,
            min_fitness,
            stagnation,
            time_limit,
            sample,
            seed,
            threads,
            generator,
            noise_mutations,
            strategy,
            objective,
            no_prefix_cache,
            no_suffix_cache,
            output,
            format,
            progress,
        } => cli::mine::execute(cli::mine::MineArgs {
            log,
            config,
            population,
            generations,
            min_fitness,
            stagnation,
            time_limit,
            sample,
            seed,
            threads,
            generator,
            noise_mutations,
            strategy,
            objective,
            no_prefix_cache,
            no_suffix_cache,
            output,
            format,
            progress,
        }),

        Commands::Replay {
            log,
            model,
            model_file,
            no_prefix_cache,
            no_suffix_cache,
            max_silent_steps,
            format,
        } => {
            let defaults = ReplayConfig::default();
            let config = ReplayConfig {
                prefix_cache: !no_prefix_cache,
                suffix_cache: !no_suffix_cache,
                max_silent_steps: max_silent_steps.unwrap_or(defaults.max_silent_steps),
            };
            let model = match (model, model_file) {
                (Some(text), _) => cli::replay::ModelSource::Inline(text),
                (None, Some(path)) => cli::replay::ModelSource::File(path),
                (None, None) => {
                    eprintln!("Error: either --model or --model-file is required");
                    return ExitCode::FAILURE;
                }
            };
            cli::replay::execute(log, model, config, format)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
