//! Process tree to workflow net conversion.
//!
//! Every subtree is translated between an entry and an exit place:
//!
//! ```text
//! ->(a, b)     entry -a-> p -b-> exit
//! X(a, b)      entry -a-> exit, entry -b-> exit
//! +(a, b)      entry -split-> {sa, sb}; sa -a-> ea; sb -b-> eb; {ea, eb} -join-> exit
//! O(a, b)      like +, with a silent skip next to every branch
//! *(do, redo)  entry -enter-> in -do-> out -redo-> in; out -exit-> exit
//! ```

use super::{PetriNet, PlaceId};
use crate::tree::{NodeId, NodeKind, Operator, ProcessTree};

impl PetriNet {
    /// Translate a process tree into a workflow net.
    ///
    /// The conversion is purely structural and never fails; use
    /// [`PetriNet::validate`] to check the result before replaying it.
    #[must_use]
    pub fn from_tree(tree: &ProcessTree) -> Self {
        let mut builder = Builder {
            net: PetriNet::new(),
            silent_count: 0,
        };
        let source = builder.net.add_place("source");
        let sink = builder.net.add_place("sink");
        builder.net.set_source(source);
        builder.net.set_sink(sink);
        builder.convert(tree, tree.root(), source, sink);
        builder.net
    }
}

struct Builder {
    net: PetriNet,
    silent_count: usize,
}

impl Builder {
    fn place(&mut self) -> PlaceId {
        let name = format!("p{}", self.net.places().len());
        self.net.add_place(name)
    }

    fn silent(&mut self, role: &str, inputs: Vec<PlaceId>, outputs: Vec<PlaceId>) {
        let name = format!("tau_{role}_{}", self.silent_count);
        self.silent_count += 1;
        self.net.add_transition(name, None, inputs, outputs);
    }

    fn convert(&mut self, tree: &ProcessTree, id: NodeId, entry: PlaceId, exit: PlaceId) {
        let children = tree.children(id);
        match tree.kind(id) {
            NodeKind::Activity(label) => {
                self.net
                    .add_transition(label.clone(), Some(label.clone()), vec![entry], vec![exit]);
            }
            NodeKind::Silent => self.silent("skip", vec![entry], vec![exit]),
            NodeKind::Operator(_) if children.is_empty() => {
                self.silent("empty", vec![entry], vec![exit]);
            }
            NodeKind::Operator(Operator::Sequence) => {
                let mut current = entry;
                for (i, &child) in children.iter().enumerate() {
                    let next = if i + 1 == children.len() {
                        exit
                    } else {
                        self.place()
                    };
                    self.convert(tree, child, current, next);
                    current = next;
                }
            }
            NodeKind::Operator(Operator::Xor) => {
                for &child in children {
                    self.convert(tree, child, entry, exit);
                }
            }
            NodeKind::Operator(op @ (Operator::Parallel | Operator::Or)) => {
                let mut starts = Vec::with_capacity(children.len());
                let mut ends = Vec::with_capacity(children.len());
                for &child in children {
                    let start = self.place();
                    let end = self.place();
                    self.convert(tree, child, start, end);
                    if *op == Operator::Or {
                        self.silent("or_skip", vec![start], vec![end]);
                    }
                    starts.push(start);
                    ends.push(end);
                }
                self.silent("split", vec![entry], starts);
                self.silent("join", ends, vec![exit]);
            }
            NodeKind::Operator(Operator::Loop) => {
                let body_in = self.place();
                let body_out = self.place();
                self.silent("loop_enter", vec![entry], vec![body_in]);
                self.convert(tree, children[0], body_in, body_out);
                for &redo in &children[1..] {
                    self.convert(tree, redo, body_out, body_in);
                }
                self.silent("loop_exit", vec![body_out], vec![exit]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(text: &str) -> PetriNet {
        PetriNet::from_tree(&text.parse().unwrap())
    }

    #[test]
    fn test_sequence_chains_through_places() {
        let net = net("->(A, B, C)");
        assert_eq!(net.places().len(), 4);
        assert_eq!(net.transitions().len(), 3);
        assert!(net.transitions().iter().all(|t| !t.is_silent()));
        assert!(net.validate().is_ok());
    }

    #[test]
    fn test_xor_shares_places() {
        let net = net("X(A, B)");
        assert_eq!(net.places().len(), 2);
        let source = net.source().unwrap();
        assert!(net.transitions().iter().all(|t| t.inputs == vec![source]));
    }

    #[test]
    fn test_parallel_uses_split_and_join() {
        let net = net("+(A, B)");
        let silent: Vec<_> = net.transitions().iter().filter(|t| t.is_silent()).collect();
        assert_eq!(silent.len(), 2);
        assert_eq!(silent[0].outputs.len(), 2);
        assert_eq!(silent[1].inputs.len(), 2);
        assert!(net.validate().is_ok());
    }

    #[test]
    fn test_loop_has_enter_and_exit() {
        let net = net("->(A, *(tau, B), C)");
        let names: Vec<_> = net.transitions().iter().map(|t| t.name.as_str()).collect();
        assert!(names.iter().any(|n| n.starts_with("tau_loop_enter")));
        assert!(names.iter().any(|n| n.starts_with("tau_loop_exit")));
        assert!(net.validate().is_ok());
    }

    #[test]
    fn test_or_adds_skips() {
        let net = net("O(A, B)");
        let skips = net
            .transitions()
            .iter()
            .filter(|t| t.name.starts_with("tau_or_skip"))
            .count();
        assert_eq!(skips, 2);
        assert!(net.validate().is_ok());
    }
}
