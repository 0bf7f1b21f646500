//! Random tree generators for seeding and topping up populations.
//!
//! Every generator places each activity of the alphabet exactly once, so
//! its output is strictly valid.

use crate::eventlog::EventLog;
use crate::gp::mutation;
use crate::tree::{Operator, ProcessTree};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Chance that a directly-follows block ignores the inferred operator.
const DF_OPERATOR_NOISE: f64 = 0.2;

/// Chance that the sequence generator groups two neighbours.
const SEQUENCE_GROUPING: f64 = 0.3;

/// What a generator may look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationContext {
    alphabet: Vec<String>,
    by_position: Vec<String>,
    follows: BTreeSet<(String, String)>,
}

impl GenerationContext {
    /// Alphabet, position order and directly-follows pairs of a log.
    #[must_use]
    pub fn from_log(log: &EventLog) -> Self {
        Self {
            alphabet: log.alphabet(),
            by_position: log.activities_by_position(),
            follows: log.directly_follows().into_keys().collect(),
        }
    }

    /// A bare alphabet; log-guided generators fall back to its order.
    #[must_use]
    pub fn from_alphabet(alphabet: Vec<String>) -> Self {
        Self {
            by_position: alphabet.clone(),
            alphabet,
            follows: BTreeSet::new(),
        }
    }

    /// Activities every tree must contain, sorted.
    #[must_use]
    pub fn alphabet(&self) -> &[String] {
        &self.alphabet
    }

    fn follows(&self, a: &str, b: &str) -> bool {
        self.follows.contains(&(a.to_owned(), b.to_owned()))
    }
}

/// Strategy for building random strictly valid trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Pair nodes under random operators until one root remains.
    #[default]
    BottomUp,
    /// A sequence in average-position order with random local groups.
    Sequence,
    /// Blocks inferred from the directly-follows relation of the log.
    DirectlyFollows,
    /// Directly-follows trees perturbed by random mutations.
    Noisy {
        /// Mutations applied to each tree.
        mutations: usize,
    },
}

impl GeneratorKind {
    /// Build one tree.
    #[must_use]
    pub fn generate<R: Rng>(&self, context: &GenerationContext, rng: &mut R) -> ProcessTree {
        match self {
            GeneratorKind::BottomUp => bottom_up(&context.alphabet, rng),
            GeneratorKind::Sequence => sequence(context, rng),
            GeneratorKind::DirectlyFollows => directly_follows(context, rng),
            GeneratorKind::Noisy { mutations } => {
                let mut tree = directly_follows(context, rng);
                for _ in 0..*mutations {
                    tree = mutation::mutate(&tree, &context.alphabet, rng);
                }
                tree
            }
        }
    }

    /// Build `n` trees.
    #[must_use]
    pub fn generate_population<R: Rng>(
        &self,
        context: &GenerationContext,
        n: usize,
        rng: &mut R,
    ) -> Vec<ProcessTree> {
        (0..n).map(|_| self.generate(context, rng)).collect()
    }
}

/// Random binary tree over `labels`, each used once.
pub(crate) fn bottom_up<R: Rng>(labels: &[String], rng: &mut R) -> ProcessTree {
    let mut level: Vec<ProcessTree> = labels.iter().map(ProcessTree::leaf).collect();
    if level.is_empty() {
        return ProcessTree::silent();
    }
    level.shuffle(rng);
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut nodes = level.into_iter();
        while let Some(left) = nodes.next() {
            match nodes.next() {
                Some(right) => {
                    next.push(ProcessTree::operator(Operator::random(rng), vec![left, right]));
                }
                None => next.push(left),
            }
        }
        level = next;
    }
    level.pop().unwrap_or_else(ProcessTree::silent)
}

fn sequence<R: Rng>(context: &GenerationContext, rng: &mut R) -> ProcessTree {
    let mut blocks = Vec::new();
    let mut labels = context.by_position.iter();
    while let Some(label) = labels.next() {
        let leaf = ProcessTree::leaf(label);
        if rng.gen_bool(SEQUENCE_GROUPING) {
            if let Some(next) = labels.next() {
                let op = [Operator::Xor, Operator::Parallel, Operator::Or, Operator::Loop]
                    [rng.gen_range(0..4)];
                blocks.push(ProcessTree::operator(op, vec![leaf, ProcessTree::leaf(next)]));
                continue;
            }
        }
        blocks.push(leaf);
    }
    wrap_sequence(blocks)
}

fn directly_follows<R: Rng>(context: &GenerationContext, rng: &mut R) -> ProcessTree {
    // Consecutive activities in position order join a block when the log
    // shows them in both orders (parallel) or never adjacent (choice).
    let mut blocks: Vec<(Operator, Vec<&str>)> = Vec::new();
    for label in &context.by_position {
        let joined = blocks.last_mut().and_then(|(op, members)| {
            let last = members.last()?;
            let forward = context.follows(last, label);
            let backward = context.follows(label, last);
            let relation = match (forward, backward) {
                (true, true) => Operator::Parallel,
                (false, false) => Operator::Xor,
                _ => return None,
            };
            if members.len() > 1 && *op != relation {
                return None;
            }
            *op = relation;
            members.push(label.as_str());
            Some(())
        });
        if joined.is_none() {
            blocks.push((Operator::Sequence, vec![label.as_str()]));
        }
    }

    let children = blocks
        .into_iter()
        .map(|(op, members)| {
            let leaves: Vec<ProcessTree> = members
                .iter()
                .map(|&label| {
                    let leaf = ProcessTree::leaf(label);
                    if context.follows(label, label) {
                        ProcessTree::operator(Operator::Loop, vec![leaf, ProcessTree::silent()])
                    } else {
                        leaf
                    }
                })
                .collect();
            if leaves.len() == 1 {
                return leaves.into_iter().next().unwrap_or_else(ProcessTree::silent);
            }
            let op = if rng.gen_bool(DF_OPERATOR_NOISE) {
                Operator::random(rng)
            } else {
                op
            };
            ProcessTree::operator(op, leaves)
        })
        .collect();
    wrap_sequence(children)
}

fn wrap_sequence(mut blocks: Vec<ProcessTree>) -> ProcessTree {
    match blocks.len() {
        0 => ProcessTree::silent(),
        1 => blocks.pop().unwrap_or_else(ProcessTree::silent),
        _ => ProcessTree::operator(Operator::Sequence, blocks),
    }
}
