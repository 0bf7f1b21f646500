//! Replay command implementation.

use super::output::format_replay_text;
use super::{CliError, OutputFormat};
use evominer::{EventLog, PetriNet, ProcessTree, ReplayConfig, ReplayLog, replay};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Where the model comes from.
#[derive(Debug)]
pub(crate) enum ModelSource {
    /// Tree notation given inline.
    Inline(String),
    /// File holding tree notation.
    File(PathBuf),
}

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the log or model cannot be loaded, or the model
/// converts to a net that cannot be replayed.
pub(crate) fn execute(
    log_path: PathBuf,
    model: ModelSource,
    config: ReplayConfig,
    format: OutputFormat,
) -> Result<(), CliError> {
    let text = match model {
        ModelSource::Inline(text) => text,
        ModelSource::File(path) => fs::read_to_string(&path).map_err(|e| {
            CliError::new(format!("Failed to read {}: {e}", path.display()))
        })?,
    };
    let tree: ProcessTree = text.trim().parse()?;
    if !tree.is_valid() {
        log::warn!("model violates operator arity rules: {tree}");
    }

    let log = EventLog::from_path(&log_path)?;
    let replay_log = ReplayLog::new(&log);
    let net = PetriNet::from_tree(&tree);

    let start = Instant::now();
    let outcome = replay(&net, &replay_log, &config)?;
    log::info!(
        "replayed {} variants in {:.3}s",
        replay_log.variants().len(),
        start.elapsed().as_secs_f64()
    );

    match format {
        OutputFormat::Text => print!("{}", format_replay_text(&tree, &net, &outcome)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}
