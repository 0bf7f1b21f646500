//! Mine command implementation.

use super::output::{JsonMiningReport, format_mining_text};
use super::{CliError, GeneratorArg, OutputFormat, StrategyArg};
use evominer::EventLog;
use evominer::gp::{
    GenerationStats, GeneratorKind, GeneticMiner, MinerConfig, MiningResult, Monitor, Population,
    VariationStrategy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line settings of `evominer mine`. Every option left unset keeps
/// the value from the config file, or the built-in default.
#[derive(Debug, Default)]
pub(crate) struct MineArgs {
    pub(crate) log: PathBuf,
    pub(crate) config: Option<PathBuf>,
    pub(crate) population: Option<usize>,
    pub(crate) generations: Option<usize>,
    pub(crate) min_fitness: Option<f64>,
    pub(crate) stagnation: Option<usize>,
    pub(crate) time_limit: Option<f64>,
    pub(crate) sample: Option<f64>,
    pub(crate) seed: Option<u64>,
    pub(crate) threads: Option<usize>,
    pub(crate) generator: Option<GeneratorArg>,
    pub(crate) noise_mutations: usize,
    pub(crate) strategy: Option<StrategyArg>,
    pub(crate) objective: Vec<String>,
    pub(crate) no_prefix_cache: bool,
    pub(crate) no_suffix_cache: bool,
    pub(crate) output: Option<PathBuf>,
    pub(crate) format: Option<OutputFormat>,
    pub(crate) progress: bool,
}

/// Spinner updated once per generation.
struct ProgressMonitor {
    bar: ProgressBar,
}

impl Monitor for ProgressMonitor {
    fn on_generation(&mut self, stats: &GenerationStats, _population: &Population) {
        self.bar.set_position(stats.generation as u64 + 1);
        self.bar
            .set_message(format!("best={:.4} mean={:.4}", stats.best_ever, stats.fitness.mean));
    }

    fn on_finish(&mut self, result: &MiningResult) {
        self.bar.finish_with_message(result.stop_reason.to_string());
    }
}

fn parse_weight(entry: &str) -> Result<(String, f64), CliError> {
    let (name, weight) = entry
        .split_once('=')
        .ok_or_else(|| CliError::new(format!("objective term must be name=weight: {entry}")))?;
    let weight = weight
        .trim()
        .parse()
        .map_err(|e| CliError::new(format!("invalid weight in {entry}: {e}")))?;
    Ok((name.trim().to_owned(), weight))
}

fn build_config(args: &MineArgs) -> Result<MinerConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => MinerConfig::from_json_file(path)?,
        None => MinerConfig::default(),
    };
    if let Some(n) = args.population {
        config.population_size = n;
    }
    if let Some(n) = args.generations {
        config.max_generations = n;
    }
    if args.min_fitness.is_some() {
        config.min_fitness = args.min_fitness;
    }
    if args.stagnation.is_some() {
        config.stagnation_limit = args.stagnation;
    }
    if args.time_limit.is_some() {
        config.time_limit_secs = args.time_limit;
    }
    if let Some(fraction) = args.sample {
        config.percentage_of_log = fraction;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if let Some(generator) = args.generator {
        config.generator = match generator {
            GeneratorArg::BottomUp => GeneratorKind::BottomUp,
            GeneratorArg::Sequence => GeneratorKind::Sequence,
            GeneratorArg::DirectlyFollows => GeneratorKind::DirectlyFollows,
            GeneratorArg::Noisy => GeneratorKind::Noisy {
                mutations: args.noise_mutations,
            },
        };
    }
    if let Some(strategy) = args.strategy {
        config.variation = match strategy {
            StrategyArg::Proportional => VariationStrategy::default(),
            StrategyArg::Tournament => VariationStrategy::tournament(),
        };
    }
    if !args.objective.is_empty() {
        config.objective = args
            .objective
            .iter()
            .map(|entry| parse_weight(entry))
            .collect::<Result<_, _>>()?;
    }
    if args.no_prefix_cache {
        config.replay.prefix_cache = false;
    }
    if args.no_suffix_cache {
        config.replay.suffix_cache = false;
    }
    Ok(config)
}

/// Execute the mine command.
///
/// # Errors
///
/// Returns an error if the log or config cannot be loaded, the config is
/// invalid, or the output cannot be written.
pub(crate) fn execute(args: MineArgs) -> Result<(), CliError> {
    let config = build_config(&args)?;
    let log = EventLog::from_path(&args.log)?;
    log::info!(
        "loaded {} traces with {} activities from {}",
        log.len(),
        log.alphabet().len(),
        args.log.display()
    );

    let mut miner = GeneticMiner::new(config, &log)?;
    if args.progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] gen {pos} {msg}")
                .map_err(|e| CliError::new(format!("invalid progress template: {e}")))?,
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        miner.add_monitor(Box::new(ProgressMonitor { bar }));
    }
    let objective = miner.objective().clone();
    let result = miner.run();
    let metrics: Vec<(String, f64)> = objective
        .evaluate(&result.best)
        .map(|values| {
            values
                .into_iter()
                .map(|(metric, value)| (objective.metric_name(metric).to_owned(), value))
                .collect()
        })
        .unwrap_or_default();

    if let Some(path) = &args.output {
        fs::write(path, format!("{}\n", result.best))?;
    }

    match args.format.unwrap_or(OutputFormat::Text) {
        OutputFormat::Text => print!("{}", format_mining_text(&result, &metrics)),
        OutputFormat::Json => {
            let report = JsonMiningReport {
                result: &result,
                metrics: metrics.into_iter().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
