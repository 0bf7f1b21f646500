//! The token game on an indexed copy of a workflow net.
//!
//! Every replay step is a pure function of the marking it starts from and
//! the event it replays, which is what makes prefix and suffix results
//! reusable across traces.

// Place indices fit in u32 for any net the converter builds
#![allow(clippy::cast_possible_truncation)]

use crate::net::PetriNet;
use std::collections::{HashMap, VecDeque};

/// Token distribution over places.
pub(super) type Marking = Vec<u32>;

/// Token bookkeeping of one or more steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct TokenCounts {
    pub(super) produced: u64,
    pub(super) consumed: u64,
    pub(super) missing: u64,
    pub(super) remaining: u64,
}

impl TokenCounts {
    pub(super) fn add(&mut self, other: &TokenCounts) {
        self.produced += other.produced;
        self.consumed += other.consumed;
        self.missing += other.missing;
        self.remaining += other.remaining;
    }
}

/// Result of a single replay step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct StepRecord {
    pub(super) tokens: TokenCounts,
    /// Places that received an artificial token, once per token.
    pub(super) missing_places: Vec<u32>,
    /// Visible labels enabled before the step, sorted.
    pub(super) enabled: Vec<u32>,
}

/// One way to replay a step: its bookkeeping and the marking it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Step {
    pub(super) record: StepRecord,
    pub(super) marking: Marking,
}

/// A net indexed for replay against one label table.
///
/// Log labels the net does not know get a private transition whose input
/// place never holds a token, so each occurrence is charged one missing
/// token there and leaves one token behind.
///
/// Silent moves are planned on the net structure rather than on the
/// marking graph: `distances[p][k]` is the fewest silent firings, starting
/// with `silent[k]`, that put a token into place `p`. Concurrent branches
/// are then advanced one after another instead of in every interleaving.
#[derive(Debug)]
pub(super) struct ReplayNet {
    inputs: Vec<Vec<usize>>,
    outputs: Vec<Vec<usize>>,
    labels: Vec<Option<u32>>,
    by_label: Vec<Vec<usize>>,
    silent: Vec<usize>,
    first_unmodeled: usize,
    place_names: Vec<String>,
    source: usize,
    sink: usize,
    distances: Vec<Vec<u32>>,
    max_silent_steps: usize,
}

impl ReplayNet {
    /// Index `net` for the labels of a log. `source` and `sink` must have
    /// been checked by the caller.
    pub(super) fn new(
        net: &PetriNet,
        log_labels: &[String],
        source: usize,
        sink: usize,
        max_silent_steps: usize,
    ) -> Self {
        let mut ids: HashMap<&str, u32> = HashMap::new();
        let mut label_count = 0u32;
        for label in log_labels {
            ids.entry(label.as_str()).or_insert_with(|| {
                label_count += 1;
                label_count - 1
            });
        }

        let mut replay_net = Self {
            inputs: Vec::with_capacity(net.transitions().len()),
            outputs: Vec::with_capacity(net.transitions().len()),
            labels: Vec::with_capacity(net.transitions().len()),
            by_label: Vec::new(),
            silent: Vec::new(),
            first_unmodeled: net.transitions().len(),
            place_names: net.places().iter().map(|p| p.name.clone()).collect(),
            source,
            sink,
            distances: Vec::new(),
            max_silent_steps: max_silent_steps.max(1),
        };

        for (t, transition) in net.transitions().iter().enumerate() {
            replay_net.inputs.push(transition.inputs.iter().map(|p| p.0).collect());
            replay_net.outputs.push(transition.outputs.iter().map(|p| p.0).collect());
            let label = transition.label.as_deref().map(|l| {
                *ids.entry(l).or_insert_with(|| {
                    label_count += 1;
                    label_count - 1
                })
            });
            if label.is_none() {
                replay_net.silent.push(t);
            }
            replay_net.labels.push(label);
        }

        replay_net.by_label = vec![Vec::new(); label_count as usize];
        for (t, label) in replay_net.labels.iter().enumerate() {
            if let Some(l) = label {
                replay_net.by_label[*l as usize].push(t);
            }
        }

        for (l, label) in log_labels.iter().enumerate() {
            if !replay_net.by_label[l].is_empty() {
                continue;
            }
            let input = replay_net.place_names.len();
            replay_net.place_names.push(format!("unmodeled:{label}"));
            replay_net.place_names.push(format!("unmodeled:{label}:out"));
            let t = replay_net.labels.len();
            replay_net.inputs.push(vec![input]);
            replay_net.outputs.push(vec![input + 1]);
            replay_net.labels.push(u32::try_from(l).ok());
            replay_net.by_label[l].push(t);
        }
        replay_net.distances = replay_net.silent_distances();
        replay_net
    }

    /// Reverse breadth-first search from every place that can be a goal:
    /// the input of a visible transition, and the sink.
    fn silent_distances(&self) -> Vec<Vec<u32>> {
        let places = self.place_names.len();
        let mut producers: Vec<Vec<usize>> = vec![Vec::new(); places];
        for (k, &s) in self.silent.iter().enumerate() {
            for &p in &self.outputs[s] {
                producers[p].push(k);
            }
        }

        let mut goals = vec![false; places];
        goals[self.sink] = true;
        for (t, label) in self.labels[..self.first_unmodeled].iter().enumerate() {
            if label.is_some() {
                for &p in &self.inputs[t] {
                    goals[p] = true;
                }
            }
        }

        let mut distances = vec![Vec::new(); places];
        for (goal, _) in goals.iter().enumerate().filter(|(_, g)| **g) {
            let mut via = vec![u32::MAX; self.silent.len()];
            let mut place_distance = vec![u32::MAX; places];
            place_distance[goal] = 0;
            let mut queue = VecDeque::from([goal]);
            while let Some(p) = queue.pop_front() {
                for &k in &producers[p] {
                    if via[k] != u32::MAX {
                        continue;
                    }
                    via[k] = place_distance[p] + 1;
                    for &q in &self.inputs[self.silent[k]] {
                        if place_distance[q] == u32::MAX {
                            place_distance[q] = via[k];
                            queue.push_back(q);
                        }
                    }
                }
            }
            distances[goal] = via;
        }
        distances
    }

    pub(super) fn place_name(&self, place: u32) -> &str {
        &self.place_names[place as usize]
    }

    pub(super) fn initial_marking(&self) -> Marking {
        let mut marking = vec![0; self.place_names.len()];
        marking[self.source] = 1;
        marking
    }

    fn is_enabled(&self, marking: &[u32], t: usize) -> bool {
        let inputs = &self.inputs[t];
        inputs.iter().all(|&p| {
            let needed = inputs.iter().filter(|&&q| q == p).count();
            marking[p] as usize >= needed
        })
    }

    fn missing_for(&self, marking: &[u32], t: usize) -> u64 {
        let mut scratch = marking.to_vec();
        let mut missing = 0;
        for &p in &self.inputs[t] {
            if scratch[p] == 0 {
                missing += 1;
            } else {
                scratch[p] -= 1;
            }
        }
        missing
    }

    /// Fire an enabled transition.
    fn apply(&self, marking: &mut [u32], t: usize) {
        for &p in &self.inputs[t] {
            marking[p] -= 1;
        }
        for &p in &self.outputs[t] {
            marking[p] += 1;
        }
    }

    fn fire(&self, marking: &mut [u32], t: usize, tokens: &mut TokenCounts) {
        self.apply(marking, t);
        tokens.consumed += self.inputs[t].len() as u64;
        tokens.produced += self.outputs[t].len() as u64;
    }

    /// Fire `t`, inserting whatever tokens its inputs lack.
    fn fire_forced(&self, marking: &mut [u32], t: usize, record: &mut StepRecord) {
        for &p in &self.inputs[t] {
            if marking[p] == 0 {
                marking[p] = 1;
                record.tokens.missing += 1;
                record.missing_places.push(p as u32);
            }
            marking[p] -= 1;
        }
        for &p in &self.outputs[t] {
            marking[p] += 1;
        }
        record.tokens.consumed += self.inputs[t].len() as u64;
        record.tokens.produced += self.outputs[t].len() as u64;
    }

    /// Silent firing sequence that puts a token into `goal`.
    ///
    /// At every step the enabled silent transition closest to `goal` fires,
    /// ties going to the lowest index. Gives up when no enabled silent
    /// transition leads towards `goal` or after `max_silent_steps` firings.
    fn silent_path(&self, start: &[u32], goal: usize) -> Option<Vec<usize>> {
        if start[goal] > 0 {
            return Some(Vec::new());
        }
        let distance = self.distances.get(goal).filter(|d| !d.is_empty())?;
        let mut marking = start.to_vec();
        let mut path = Vec::new();
        while marking[goal] == 0 {
            if path.len() >= self.max_silent_steps {
                return None;
            }
            let (_, k) = self
                .silent
                .iter()
                .enumerate()
                .filter(|&(k, &s)| distance[k] != u32::MAX && self.is_enabled(&marking, s))
                .map(|(k, _)| (distance[k], k))
                .min()?;
            self.apply(&mut marking, self.silent[k]);
            path.push(self.silent[k]);
        }
        Some(path)
    }

    /// Visible labels enabled in `marking` or after silent moves from it.
    pub(super) fn enabled_labels(&self, marking: &[u32]) -> Vec<u32> {
        let mut enabled: Vec<u32> = Vec::new();
        for (t, label) in self.labels[..self.first_unmodeled].iter().enumerate() {
            let Some(l) = *label else { continue };
            if enabled.contains(&l) {
                continue;
            }
            if self.enabling_path(marking, t).is_some() {
                enabled.push(l);
            }
        }
        enabled.sort_unstable();
        enabled
    }

    /// Every way to replay one event from `marking`.
    ///
    /// Each transition carrying the label that silent moves can enable
    /// yields one option. Only when none can is a transition forced, and
    /// then every one missing the fewest tokens yields an option. Which
    /// option wins is left to the caller, once later events tell them
    /// apart.
    pub(super) fn step_event(&self, marking: &[u32], event: u32) -> Vec<Step> {
        let enabled = self.enabled_labels(marking);
        let candidates = &self.by_label[event as usize];

        let mut options: Vec<Step> = Vec::new();
        for &t in candidates {
            let Some(path) = self.enabling_path(marking, t) else {
                continue;
            };
            let mut step = Step {
                record: StepRecord {
                    enabled: enabled.clone(),
                    ..StepRecord::default()
                },
                marking: marking.to_vec(),
            };
            for &s in &path {
                self.fire(&mut step.marking, s, &mut step.record.tokens);
            }
            self.fire(&mut step.marking, t, &mut step.record.tokens);
            options.push(step);
        }
        if !options.is_empty() {
            return options;
        }

        let fewest = candidates.iter().map(|&t| self.missing_for(marking, t)).min();
        for &t in candidates {
            if Some(self.missing_for(marking, t)) != fewest {
                continue;
            }
            let mut step = Step {
                record: StepRecord {
                    enabled: enabled.clone(),
                    ..StepRecord::default()
                },
                marking: marking.to_vec(),
            };
            self.fire_forced(&mut step.marking, t, &mut step.record);
            options.push(step);
        }
        if options.is_empty() {
            options.push(Step {
                record: StepRecord {
                    enabled,
                    ..StepRecord::default()
                },
                marking: marking.to_vec(),
            });
        }
        options
    }

    /// Silent moves that enable `t`, filling its input places in order.
    fn enabling_path(&self, marking: &[u32], t: usize) -> Option<Vec<usize>> {
        let mut after = marking.to_vec();
        let mut path = Vec::new();
        for &p in &self.inputs[t] {
            let part = self.silent_path(&after, p)?;
            for &s in &part {
                self.apply(&mut after, s);
            }
            path.extend(part);
        }
        self.is_enabled(&after, t).then_some(path)
    }

    /// Close a trace: move towards the sink silently, take the final token
    /// and count what is left.
    pub(super) fn step_final(&self, marking: &[u32]) -> Step {
        let mut step = Step {
            record: StepRecord {
                enabled: self.enabled_labels(marking),
                ..StepRecord::default()
            },
            marking: marking.to_vec(),
        };
        if let Some(path) = self.silent_path(marking, self.sink) {
            for &s in &path {
                self.fire(&mut step.marking, s, &mut step.record.tokens);
            }
        }
        if step.marking[self.sink] == 0 {
            step.record.tokens.missing += 1;
            step.record.missing_places.push(self.sink as u32);
        } else {
            step.marking[self.sink] -= 1;
        }
        step.record.tokens.consumed += 1;
        step.record.tokens.remaining = step.marking.iter().map(|&n| u64::from(n)).sum();
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ProcessTree;

    fn indexed(model: &str, labels: &[&str], max_silent_steps: usize) -> ReplayNet {
        let tree: ProcessTree = model.parse().unwrap();
        let net = PetriNet::from_tree(&tree);
        let labels: Vec<String> = labels.iter().map(|&l| l.to_owned()).collect();
        let source = net.source().unwrap().0;
        let sink = net.sink().unwrap().0;
        ReplayNet::new(&net, &labels, source, sink, max_silent_steps)
    }

    #[test]
    fn test_silent_path_skips_every_optional_branch() {
        let net = indexed("O(A, B, C, D, E, F, G, H, I, J)", &[], 256);
        let path = net.silent_path(&net.initial_marking(), net.sink).unwrap();
        // split, ten skips, join
        assert_eq!(path.len(), 12);
    }

    #[test]
    fn test_silent_path_respects_step_cap() {
        let net = indexed("O(A, B, C, D, E, F, G, H, I, J)", &[], 5);
        assert!(net.silent_path(&net.initial_marking(), net.sink).is_none());
    }

    #[test]
    fn test_silent_path_needs_visible_work() {
        let net = indexed("+(*(A, tau), *(B, tau))", &[], 256);
        assert!(net.silent_path(&net.initial_marking(), net.sink).is_none());
        assert_eq!(net.enabled_labels(&net.initial_marking()).len(), 2);
    }

    #[test]
    fn test_duplicate_label_yields_every_option() {
        let net = indexed("X(->(A, B), ->(A, C))", &["A", "B", "C"], 256);
        let options = net.step_event(&net.initial_marking(), 0);
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|o| o.record.tokens.missing == 0));
        assert_ne!(options[0].marking, options[1].marking);
    }

    #[test]
    fn test_unreachable_label_is_forced() {
        let net = indexed("->(A, B)", &["A", "B"], 256);
        let options = net.step_event(&net.initial_marking(), 1);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].record.tokens.missing, 1);
        assert_eq!(options[0].record.enabled, vec![0]);
    }

    #[test]
    fn test_final_step_charges_empty_sink() {
        let net = indexed("->(A, B)", &["A", "B"], 256);
        let step = net.step_final(&net.initial_marking());
        assert_eq!(step.record.tokens.missing, 1);
        assert_eq!(step.record.tokens.remaining, 1);
        assert_eq!(step.record.missing_places, vec![net.sink as u32]);
    }
}
