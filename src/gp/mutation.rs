//! Mutation operators for process trees.
//!
//! Every operator works on a private copy of its input. An attempt that
//! cannot produce a valid tree returns an unmodified copy instead, so no
//! invalid individual ever reaches the population.

use crate::gp::generator::bottom_up;
use crate::tree::{NodeId, NodeKind, Operator, ProcessTree};
use rand::Rng;
use rand::seq::SliceRandom;

/// The four structural mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Reassign the operator of an internal node and shuffle its children.
    OperatorSwap,
    /// Remove an operator subtree and graft its activities back elsewhere.
    SubtreeRemoval,
    /// Move a leaf under a different operator node.
    LeafRelocation,
    /// Wrap a leaf as `*(tau, leaf)`, making it repeatable and optional.
    LoopInsertion,
}

impl MutationKind {
    /// Every mutation kind.
    pub const ALL: [MutationKind; 4] = [
        MutationKind::OperatorSwap,
        MutationKind::SubtreeRemoval,
        MutationKind::LeafRelocation,
        MutationKind::LoopInsertion,
    ];
}

/// Apply one uniformly chosen mutation to a copy of `tree`.
#[must_use]
pub fn mutate<R: Rng>(tree: &ProcessTree, alphabet: &[String], rng: &mut R) -> ProcessTree {
    let kind = MutationKind::ALL[rng.gen_range(0..MutationKind::ALL.len())];
    mutate_with(kind, tree, alphabet, rng)
}

/// Apply a specific mutation to a copy of `tree`.
///
/// A result is accepted only if it is valid and, when `tree` contains
/// exactly the activities of `alphabet`, still does.
#[must_use]
pub fn mutate_with<R: Rng>(
    kind: MutationKind,
    tree: &ProcessTree,
    alphabet: &[String],
    rng: &mut R,
) -> ProcessTree {
    let mut copy = tree.deep_copy();
    let applied = match kind {
        MutationKind::OperatorSwap => swap_operator(&mut copy, rng),
        MutationKind::SubtreeRemoval => remove_subtree(&mut copy, rng),
        MutationKind::LeafRelocation => relocate_leaf(&mut copy, rng),
        MutationKind::LoopInsertion => insert_loop(&mut copy, rng),
    };
    let strict = tree.is_strictly_valid(alphabet);
    if applied && copy.is_valid() && (!strict || copy.is_strictly_valid(alphabet)) {
        copy.deep_copy()
    } else {
        log::debug!("{kind:?} mutation fell back to an unmodified copy");
        tree.deep_copy()
    }
}

fn pick<R: Rng>(candidates: &[NodeId], rng: &mut R) -> Option<NodeId> {
    candidates.choose(rng).copied()
}

fn swap_operator<R: Rng>(tree: &mut ProcessTree, rng: &mut R) -> bool {
    let Some(node) = pick(&tree.operator_nodes(), rng) else {
        return false;
    };
    let Some(current) = tree.kind(node).operator() else {
        return false;
    };

    // Silent children were only meaningful as the skip part of a loop.
    let silent: Vec<NodeId> = if current == Operator::Loop {
        tree.children(node)
            .iter()
            .copied()
            .filter(|&c| *tree.kind(c) == NodeKind::Silent)
            .collect()
    } else {
        Vec::new()
    };
    let kept = tree.children(node).len() - silent.len();

    let choices: Vec<Operator> = Operator::ALL
        .into_iter()
        .filter(|&op| op != current)
        .filter(|&op| {
            let arity = if op == Operator::Loop {
                tree.children(node).len()
            } else {
                kept
            };
            arity >= op.min_children()
        })
        .collect();
    let Some(&op) = choices.choose(rng) else {
        return false;
    };

    if op != Operator::Loop {
        for child in silent {
            tree.remove_child(node, child);
        }
    }
    tree.set_operator(node, op);
    tree.shuffle_children(node, rng);
    true
}

fn remove_subtree<R: Rng>(tree: &mut ProcessTree, rng: &mut R) -> bool {
    let candidates: Vec<NodeId> = tree
        .operator_nodes()
        .into_iter()
        .filter(|&id| tree.parent(id).is_some_and(|p| tree.can_lose_child(p)))
        .collect();
    let Some(node) = pick(&candidates, rng) else {
        return false;
    };
    let lost = tree.subtree_activities(node);
    tree.detach(node);
    if lost.is_empty() {
        return true;
    }

    let fresh = bottom_up(&lost, rng);
    let Some(target) = pick(&tree.operator_nodes(), rng) else {
        return false;
    };
    tree.copy_subtree_from(&fresh, fresh.root(), Some(target));
    true
}

fn relocate_leaf<R: Rng>(tree: &mut ProcessTree, rng: &mut R) -> bool {
    let candidates: Vec<NodeId> = tree
        .preorder()
        .into_iter()
        .filter(|&id| tree.kind(id).is_leaf())
        .filter(|&id| tree.parent(id).is_some_and(|p| tree.can_lose_child(p)))
        .collect();
    let Some(leaf) = pick(&candidates, rng) else {
        return false;
    };
    let Some(old_parent) = tree.parent(leaf) else {
        return false;
    };
    let targets: Vec<NodeId> = tree
        .operator_nodes()
        .into_iter()
        .filter(|&id| id != old_parent)
        .collect();
    let Some(target) = pick(&targets, rng) else {
        return false;
    };
    tree.detach(leaf);
    let position = rng.gen_range(0..=tree.children(target).len());
    tree.insert_child(target, position, leaf)
}

fn insert_loop<R: Rng>(tree: &mut ProcessTree, rng: &mut R) -> bool {
    let Some(leaf) = pick(&tree.activity_leaves(), rng) else {
        return false;
    };
    let wrapper = tree.add_detached(NodeKind::Operator(Operator::Loop));
    if !tree.replace(leaf, wrapper) {
        return false;
    }
    tree.add_child(wrapper, NodeKind::Silent);
    tree.attach(wrapper, leaf)
}
