//! Subtree-exchange crossover with activity repair.
//!
//! One operator node is picked in each parent. The first child takes the
//! second parent's subtree in place of its own, the second child the other
//! way round. Exchanging subtrees almost always duplicates some activities
//! and loses others, so each child is repaired before it is checked:
//!
//! ```text
//!   duplicates  ->  drop extra occurrences, outside the graft first
//!   missing     ->  new leaves under random operator nodes
//! ```
//!
//! The first repaired child that is valid wins. If neither is, a copy of a
//! random parent is returned.

use crate::tree::{NodeId, NodeKind, ProcessTree};
use rand::Rng;
use rand::seq::SliceRandom;

/// Recombine two parents into one child.
#[must_use]
pub fn crossover<R: Rng>(
    first: &ProcessTree,
    second: &ProcessTree,
    alphabet: &[String],
    rng: &mut R,
) -> ProcessTree {
    let a = first.deep_copy();
    let b = second.deep_copy();
    let strict = a.is_strictly_valid(alphabet) && b.is_strictly_valid(alphabet);

    if let (Some(&at_a), Some(&at_b)) = (
        a.operator_nodes().choose(rng),
        b.operator_nodes().choose(rng),
    ) {
        for (receiver, at_receiver, donor, at_donor) in [(&a, at_a, &b, at_b), (&b, at_b, &a, at_a)] {
            if let Some(child) = exchange(receiver, at_receiver, donor, at_donor, alphabet, rng) {
                if child.is_valid() && (!strict || child.is_strictly_valid(alphabet)) {
                    return child;
                }
            }
        }
    }

    log::debug!("crossover fell back to a parent copy");
    if rng.gen_bool(0.5) { a } else { b }
}

/// Replace the subtree at `at_receiver` with a copy of the donor's subtree
/// and repair the activity set. `None` if a duplicate cannot be removed
/// without breaking an arity rule.
fn exchange<R: Rng>(
    receiver: &ProcessTree,
    at_receiver: NodeId,
    donor: &ProcessTree,
    at_donor: NodeId,
    alphabet: &[String],
    rng: &mut R,
) -> Option<ProcessTree> {
    let mut child = receiver.clone();
    child.invalidate_fitness();
    let graft = child.copy_subtree_from(donor, at_donor, None);
    if !child.replace(at_receiver, graft) {
        return None;
    }
    remove_duplicates(&mut child, graft)?;
    insert_missing(&mut child, alphabet, rng);
    Some(child.deep_copy())
}

fn remove_duplicates(tree: &mut ProcessTree, graft: NodeId) -> Option<()> {
    for label in tree.duplicate_activities() {
        loop {
            let occurrences: Vec<NodeId> = tree
                .activity_leaves()
                .into_iter()
                .filter(|&id| tree.kind(id).activity() == Some(label.as_str()))
                .collect();
            if occurrences.len() <= 1 {
                break;
            }
            let removable = |id: &NodeId| tree.parent(*id).is_some_and(|p| tree.can_lose_child(p));
            let victim = occurrences
                .iter()
                .copied()
                .filter(removable)
                .find(|&id| !tree.is_descendant(id, graft))
                .or_else(|| occurrences.iter().copied().find(removable))?;
            tree.detach(victim);
        }
    }
    Some(())
}

fn insert_missing<R: Rng>(tree: &mut ProcessTree, alphabet: &[String], rng: &mut R) {
    for label in tree.missing_activities(alphabet) {
        let Some(&target) = tree.operator_nodes().choose(rng) else {
            // A lone leaf has nowhere to put a sibling.
            return;
        };
        let leaf = tree.add_detached(NodeKind::Activity(label));
        let position = rng.gen_range(0..=tree.children(target).len());
        tree.insert_child(target, position, leaf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::generator::bottom_up;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn alphabet() -> Vec<String> {
        ["A", "B", "C", "D", "E"].iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_children_are_strictly_valid() {
        let mut rng = SmallRng::seed_from_u64(42);
        let alphabet = alphabet();
        for _ in 0..100 {
            let a = bottom_up(&alphabet, &mut rng);
            let b = bottom_up(&alphabet, &mut rng);
            let child = crossover(&a, &b, &alphabet, &mut rng);
            assert!(child.is_strictly_valid(&alphabet), "{a} x {b} -> {child}");
        }
    }

    #[test]
    fn test_parents_are_untouched() {
        let mut rng = SmallRng::seed_from_u64(7);
        let alphabet = alphabet();
        let a: ProcessTree = "->(A, X(B, C), D, E)".parse().unwrap();
        let b: ProcessTree = "X(+(A, E), ->(D, C, B))".parse().unwrap();
        let (before_a, before_b) = (a.to_string(), b.to_string());
        for _ in 0..20 {
            let _ = crossover(&a, &b, &alphabet, &mut rng);
        }
        assert_eq!(a.to_string(), before_a);
        assert_eq!(b.to_string(), before_b);
    }

    #[test]
    fn test_leaf_parents_fall_back_to_copy() {
        let mut rng = SmallRng::seed_from_u64(3);
        let a: ProcessTree = "'A'".parse().unwrap();
        let child = crossover(&a, &a, &["A".to_owned()], &mut rng);
        assert_eq!(child, a);
    }

    #[test]
    fn test_duplicate_removal_prefers_receiver_side() {
        let mut tree: ProcessTree = "->(A, B, C)".parse().unwrap();
        let donor: ProcessTree = "X(A, D)".parse().unwrap();
        let root = tree.root();
        let graft = tree.copy_subtree_from(&donor, donor.root(), Some(root));
        remove_duplicates(&mut tree, graft).unwrap();
        let tree = tree.deep_copy();
        assert_eq!(tree.to_string(), "->('B', 'C', X('A', 'D'))");
    }
}
