//! Token-based replay of event logs on workflow nets.
//!
//! Replay fitness and precision are computed from one token game per
//! distinct trace variant:
//!
//! ```text
//! fitness   = 0.5 * (1 - missing / consumed) + 0.5 * (1 - remaining / produced)
//! precision = 1 - escaping / enabled
//! ```
//!
//! `enabled` counts, before every event and at the end of every trace, the
//! visible labels the model allows at that point; `escaping` counts those
//! among them that the log never shows after the same prefix.
//!
//! # Branches
//!
//! When several transitions carry the same label, every one that can fire
//! starts its own branch, and the branches are replayed side by side until
//! the trace ends. Branches that reach the same marking are merged, keeping
//! the cheaper history. At the end the branch with the fewest missing, then
//! remaining, tokens is counted. The result does not depend on the order of
//! a tree's children.
//!
//! # Caching
//!
//! Variants are replayed in lexicographic order, which walks the prefix trie
//! depth first. With the prefix cache on, the branches after each prefix are
//! kept at its trie node and later variants resume from the deepest stored
//! ancestor. With the suffix cache on, the options of every step are stored
//! under `(suffix, marking)` so a branch that reaches a known marking with a
//! known remainder reuses them. All counters are integers, so every cache
//! configuration yields the same bits.

mod engine;
mod trie;

use crate::error::{NetError, ReplayError};
use crate::eventlog::EventLog;
use crate::net::PetriNet;
use engine::{Marking, ReplayNet, Step, StepRecord, TokenCounts};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::hash_map::Entry as CacheEntry;
use std::collections::{BTreeMap, HashMap};
use trie::Trie;

/// Replay engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Resume from the deepest replayed prefix.
    pub prefix_cache: bool,
    /// Reuse recorded steps for a known `(suffix, marking)` pair.
    pub suffix_cache: bool,
    /// Bound on silent firings used to enable one transition.
    pub max_silent_steps: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            prefix_cache: true,
            suffix_cache: true,
            max_silent_steps: 256,
        }
    }
}

impl ReplayConfig {
    /// Both caches off.
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            prefix_cache: false,
            suffix_cache: false,
            ..Self::default()
        }
    }
}

/// A distinct trace and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Label ids into [`ReplayLog::labels`].
    pub events: Vec<u32>,
    /// Number of traces with exactly these events.
    pub count: u64,
}

/// An event log prepared for replay: labels interned in sorted order and
/// traces grouped into variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayLog {
    labels: Vec<String>,
    variants: Vec<Variant>,
}

impl ReplayLog {
    /// Prepare a log.
    #[must_use]
    pub fn new(log: &EventLog) -> Self {
        let labels = log.alphabet();
        let ids: HashMap<&str, u32> = labels
            .iter()
            .zip(0u32..)
            .map(|(label, id)| (label.as_str(), id))
            .collect();
        let variants = log
            .variants()
            .into_iter()
            .map(|(trace, count)| Variant {
                events: trace.iter().map(|label| ids[label.as_str()]).collect(),
                count: count as u64,
            })
            .collect();
        Self { labels, variants }
    }

    /// Distinct labels, sorted.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Distinct traces in lexicographic order.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Total number of traces.
    #[must_use]
    pub fn trace_count(&self) -> u64 {
        self.variants.iter().map(|v| v.count).sum()
    }
}

impl From<&EventLog> for ReplayLog {
    fn from(log: &EventLog) -> Self {
        Self::new(log)
    }
}

/// Aggregated replay result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayOutcome {
    /// Token-based replay fitness in `[0, 1]`.
    pub fitness: f64,
    /// Escaping-edges precision in `[0, 1]`.
    pub precision: f64,
    /// Tokens produced, including the initial one.
    pub produced: u64,
    /// Tokens consumed, including the final one.
    pub consumed: u64,
    /// Tokens inserted artificially.
    pub missing: u64,
    /// Tokens left outside the sink at trace end.
    pub remaining: u64,
    /// Visible labels enabled, summed over all steps.
    pub enabled: u64,
    /// Enabled labels never observed after the same prefix.
    pub escaping: u64,
    /// Number of traces replayed.
    pub traces: u64,
    /// Traces replayed without missing or remaining tokens.
    pub fitting_traces: u64,
    /// Missing tokens per place name, in place order.
    pub missing_by_place: Vec<(String, u64)>,
}

/// Ratio-based score with a perfect result for an empty denominator.
#[allow(clippy::cast_precision_loss)]
fn complement_ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        1.0 - numerator as f64 / denominator as f64
    }
}

/// Running totals of one trace.
#[derive(Debug, Clone, Default)]
struct Counters {
    tokens: TokenCounts,
    enabled: u64,
    escaping: u64,
    missing_places: Vec<u32>,
}

impl Counters {
    fn start() -> Self {
        Self {
            tokens: TokenCounts {
                produced: 1,
                ..TokenCounts::default()
            },
            ..Self::default()
        }
    }

    fn apply(&mut self, record: &StepRecord, prefixes: &Trie, node: usize) {
        self.tokens.add(&record.tokens);
        self.missing_places.extend_from_slice(&record.missing_places);
        self.enabled += record.enabled.len() as u64;
        self.escaping += record
            .enabled
            .iter()
            .filter(|&&label| !prefixes.follows(node, label))
            .count() as u64;
    }

    /// Order in which competing branches are preferred.
    fn rank(&self) -> (u64, u64, u64, u64, u64, u64, &[u32]) {
        (
            self.tokens.missing,
            self.tokens.remaining,
            self.escaping,
            self.enabled,
            self.tokens.consumed,
            self.tokens.produced,
            &self.missing_places,
        )
    }
}

/// Branches kept per trace.
const MAX_BRANCHES: usize = 32;

/// One way the trace replayed so far.
#[derive(Debug, Clone)]
struct Branch {
    marking: Marking,
    counters: Counters,
}

/// Options for replaying `event` from `marking`, or for closing the trace.
fn step(net: &ReplayNet, marking: &[u32], event: Option<u32>) -> Vec<Step> {
    match event {
        Some(event) => net.step_event(marking, event),
        None => vec![net.step_final(marking)],
    }
}

/// Replays variants one after another, sharing caches between them.
struct Replayer<'a> {
    net: &'a ReplayNet,
    prefixes: &'a Trie,
    config: &'a ReplayConfig,
    prefix_cache: Vec<Option<Vec<Branch>>>,
    suffix_cache: HashMap<(usize, Marking), Vec<Step>>,
    prefix_hits: u64,
    suffix_hits: u64,
}

impl<'a> Replayer<'a> {
    fn new(net: &'a ReplayNet, prefixes: &'a Trie, config: &'a ReplayConfig) -> Self {
        Self {
            net,
            prefixes,
            config,
            prefix_cache: if config.prefix_cache {
                vec![None; prefixes.len()]
            } else {
                Vec::new()
            },
            suffix_cache: HashMap::new(),
            prefix_hits: 0,
            suffix_hits: 0,
        }
    }

    /// Counters of the best branch for one variant. `prefix_path` and
    /// `suffix_path` are the variant's nodes in the two tries.
    fn variant(&mut self, events: &[u32], prefix_path: &[usize], suffix_path: &[usize]) -> Option<Counters> {
        let len = events.len();
        let resumed = if self.config.prefix_cache {
            (1..=len)
                .rev()
                .find_map(|depth| self.prefix_cache[prefix_path[depth]].clone().map(|b| (depth, b)))
        } else {
            None
        };
        let (first, mut frontier) = match resumed {
            Some(state) => {
                self.prefix_hits += 1;
                state
            }
            None => (
                0,
                vec![Branch {
                    marking: self.net.initial_marking(),
                    counters: Counters::start(),
                }],
            ),
        };

        for i in first..len {
            let mut merged: BTreeMap<Marking, Counters> = BTreeMap::new();
            for branch in frontier.drain(..) {
                for option in self.options(suffix_path[len - i], branch.marking, Some(events[i])) {
                    let mut counters = branch.counters.clone();
                    counters.apply(&option.record, self.prefixes, prefix_path[i]);
                    match merged.entry(option.marking) {
                        Entry::Vacant(entry) => {
                            entry.insert(counters);
                        }
                        Entry::Occupied(mut entry) => {
                            if counters.rank() < entry.get().rank() {
                                entry.insert(counters);
                            }
                        }
                    }
                }
            }
            frontier = merged
                .into_iter()
                .map(|(marking, counters)| Branch { marking, counters })
                .collect();
            frontier.sort_by(|a, b| a.counters.rank().cmp(&b.counters.rank()));
            frontier.truncate(MAX_BRANCHES);
            if self.config.prefix_cache {
                self.prefix_cache[prefix_path[i + 1]] = Some(frontier.clone());
            }
        }

        let mut best: Option<Counters> = None;
        for branch in frontier {
            for option in self.options(suffix_path[0], branch.marking, None) {
                let mut counters = branch.counters.clone();
                counters.apply(&option.record, self.prefixes, prefix_path[len]);
                if best.as_ref().is_none_or(|b| counters.rank() < b.rank()) {
                    best = Some(counters);
                }
            }
        }
        best
    }

    /// Step options from `marking`, through the suffix cache when enabled.
    fn options(&mut self, suffix: usize, marking: Marking, event: Option<u32>) -> Vec<Step> {
        if !self.config.suffix_cache {
            return step(self.net, &marking, event);
        }
        match self.suffix_cache.entry((suffix, marking)) {
            CacheEntry::Occupied(entry) => {
                self.suffix_hits += 1;
                entry.get().clone()
            }
            CacheEntry::Vacant(entry) => {
                let options = step(self.net, &entry.key().1, event);
                entry.insert(options).clone()
            }
        }
    }
}

/// Replay `log` on `net` and score it.
///
/// Non-fitting traces are scored, never rejected.
///
/// # Errors
///
/// Returns [`ReplayError::MalformedNet`] if the net fails
/// [`PetriNet::validate`].
pub fn replay(
    net: &PetriNet,
    log: &ReplayLog,
    config: &ReplayConfig,
) -> Result<ReplayOutcome, ReplayError> {
    net.validate()?;
    let source = net.source().ok_or(NetError::MissingSource)?;
    let sink = net.sink().ok_or(NetError::MissingSink)?;
    let replay_net = ReplayNet::new(net, &log.labels, source.0, sink.0, config.max_silent_steps);

    let mut prefixes = Trie::new();
    let mut suffixes = Trie::new();
    let mut order: Vec<usize> = (0..log.variants.len()).collect();
    order.sort_by(|&a, &b| log.variants[a].events.cmp(&log.variants[b].events));
    let prefix_paths: Vec<Vec<usize>> = log
        .variants
        .iter()
        .map(|v| prefixes.insert(v.events.iter().copied()))
        .collect();
    let suffix_paths: Vec<Vec<usize>> = log
        .variants
        .iter()
        .map(|v| suffixes.insert(v.events.iter().rev().copied()))
        .collect();

    let mut replayer = Replayer::new(&replay_net, &prefixes, config);
    let mut totals = TokenCounts::default();
    let (mut enabled, mut escaping, mut fitting) = (0u64, 0u64, 0u64);
    let mut missing_by_place: BTreeMap<u32, u64> = BTreeMap::new();

    for &v in &order {
        let variant = &log.variants[v];
        // The frontier is never empty, so the closing step always runs.
        let Some(counters) = replayer.variant(&variant.events, &prefix_paths[v], &suffix_paths[v]) else {
            continue;
        };

        let count = variant.count;
        totals.produced += count * counters.tokens.produced;
        totals.consumed += count * counters.tokens.consumed;
        totals.missing += count * counters.tokens.missing;
        totals.remaining += count * counters.tokens.remaining;
        enabled += count * counters.enabled;
        escaping += count * counters.escaping;
        if counters.tokens.missing == 0 && counters.tokens.remaining == 0 {
            fitting += count;
        }
        for &place in &counters.missing_places {
            *missing_by_place.entry(place).or_default() += count;
        }
    }

    log::trace!(
        "replayed {} variants: {} prefix resumes, {} suffix steps reused",
        log.variants.len(),
        replayer.prefix_hits,
        replayer.suffix_hits
    );

    let fitness = 0.5 * complement_ratio(totals.missing, totals.consumed)
        + 0.5 * complement_ratio(totals.remaining, totals.produced);
    Ok(ReplayOutcome {
        fitness,
        precision: complement_ratio(escaping, enabled),
        produced: totals.produced,
        consumed: totals.consumed,
        missing: totals.missing,
        remaining: totals.remaining,
        enabled,
        escaping,
        traces: log.trace_count(),
        fitting_traces: fitting,
        missing_by_place: missing_by_place
            .into_iter()
            .map(|(place, n)| (replay_net.place_name(place).to_owned(), n))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ProcessTree;

    fn outcome(model: &str, traces: &[&str], config: &ReplayConfig) -> ReplayOutcome {
        let tree: ProcessTree = model.parse().unwrap();
        let net = PetriNet::from_tree(&tree);
        let log = EventLog::from_traces(traces.iter().map(|t| t.chars().map(String::from)));
        replay(&net, &ReplayLog::new(&log), config).unwrap()
    }

    #[test]
    fn test_perfect_sequence() {
        let result = outcome("->(A, B, C)", &["ABC", "ABC"], &ReplayConfig::default());
        assert_eq!(result.missing, 0);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.produced, 8);
        assert_eq!(result.consumed, 8);
        assert_eq!(result.fitting_traces, 2);
        assert!((result.fitness - 1.0).abs() < f64::EPSILON);
        assert!((result.precision - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_skipped_activity_costs_tokens() {
        let result = outcome("->(A, B, C)", &["AC"], &ReplayConfig::default());
        assert_eq!(result.missing, 1);
        assert_eq!(result.remaining, 1);
        assert_eq!(result.fitting_traces, 0);
        assert!(result.fitness < 1.0);
    }

    #[test]
    fn test_parallel_accepts_both_orders() {
        let result = outcome("+(A, B)", &["AB", "BA"], &ReplayConfig::default());
        assert!((result.fitness - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.fitting_traces, 2);
    }

    #[test]
    fn test_imprecise_model_lowers_precision() {
        let result = outcome("X(A, B, C)", &["A"], &ReplayConfig::default());
        assert!((result.fitness - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.enabled, 3);
        assert_eq!(result.escaping, 2);
        assert!((result.precision - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_caches_agree_on_noisy_log() {
        let traces = ["ABCD", "ABDC", "ABCD", "ACBD", "ADCB", "AB", "BCD", "ABCDD"];
        let model = "->(A, +(B, *(C, tau)), X(D, tau))";
        let reference = outcome(model, &traces, &ReplayConfig::uncached());
        for (prefix_cache, suffix_cache) in [(true, false), (false, true), (true, true)] {
            let config = ReplayConfig {
                prefix_cache,
                suffix_cache,
                ..ReplayConfig::default()
            };
            assert_eq!(outcome(model, &traces, &config), reference);
        }
    }

    #[test]
    fn test_malformed_net_is_rejected() {
        let net = PetriNet::new();
        let log = ReplayLog::new(&EventLog::from_traces([vec!["A"]]));
        assert!(replay(&net, &log, &ReplayConfig::default()).is_err());
    }

    #[test]
    fn test_empty_trace_fits_skippable_model() {
        let result = outcome("X(A, tau)", &["", "A"], &ReplayConfig::default());
        assert!((result.fitness - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duplicate_labels_wait_for_later_events() {
        for model in ["X(->(A, B, C), ->(A, B, D))", "X(->(A, B, D), ->(A, B, C))"] {
            let result = outcome(model, &["ABD"], &ReplayConfig::uncached());
            assert_eq!(result.missing, 0, "{model}");
            assert_eq!(result.remaining, 0, "{model}");
            assert_eq!(result.fitting_traces, 1, "{model}");
        }
    }

    #[test]
    fn test_wide_optional_block_closes_silently() {
        let result = outcome("O(A, B, C, D, E, F, G, H, I, J)", &["A", "J"], &ReplayConfig::default());
        assert_eq!(result.missing, 0);
        assert_eq!(result.remaining, 0);
        assert!(result.missing_by_place.is_empty());
        assert_eq!(result.fitting_traces, 2);
    }

    #[test]
    fn test_branches_reaching_one_marking_merge() {
        // Either branch can produce every A, and both end up in the loop.
        let traces = ["AAAAAAAA"];
        let model = "*(X(A, ->(A, tau)), tau)";
        let reference = outcome(model, &traces, &ReplayConfig::uncached());
        assert!((reference.fitness - 1.0).abs() < f64::EPSILON);
        assert_eq!(outcome(model, &traces, &ReplayConfig::default()), reference);
    }
}
