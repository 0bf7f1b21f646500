//! Process tree representation.
//!
//! A process tree is stored as an arena of nodes owned by a single
//! [`ProcessTree`]. Children are listed by [`NodeId`] in their parent, and
//! each node keeps a non-owning index back to its parent so that local edits
//! (removal, operator change) can be done without a search. Nodes detached
//! by an edit stay in the arena until the next [`ProcessTree::deep_copy`],
//! which rebuilds a compact arena from the root.
//!
//! ```text
//!            ->
//!          /  |  \
//!        'A'  *  'C'        ->( 'A', *( tau, 'B' ), 'C' )
//!            / \
//!          tau 'B'
//! ```

mod notation;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

/// Control-flow operator of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Children execute one after another.
    Sequence,
    /// Exactly one child executes.
    Xor,
    /// All children execute, interleaved.
    Parallel,
    /// First child is the body, any other child may run between repetitions.
    Loop,
    /// Any subset of the children executes, interleaved. Every child
    /// can be skipped, so the empty subset is allowed too.
    Or,
}

impl Operator {
    /// Every operator, in a fixed order.
    pub const ALL: [Operator; 5] = [
        Operator::Sequence,
        Operator::Xor,
        Operator::Parallel,
        Operator::Loop,
        Operator::Or,
    ];

    /// Minimum number of children for a node with this operator.
    #[must_use]
    pub fn min_children(self) -> usize {
        match self {
            Operator::Sequence | Operator::Xor => 1,
            Operator::Parallel | Operator::Loop | Operator::Or => 2,
        }
    }

    /// Symbol used by the text notation.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Sequence => "->",
            Operator::Xor => "X",
            Operator::Parallel => "+",
            Operator::Loop => "*",
            Operator::Or => "O",
        }
    }

    /// Whether child order carries no meaning.
    #[must_use]
    pub fn is_commutative(self) -> bool {
        matches!(self, Operator::Xor | Operator::Parallel | Operator::Or)
    }

    /// Pick an operator uniformly at random.
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Observable activity.
    Activity(String),
    /// Silent step (tau).
    Silent,
    /// Internal control-flow node.
    Operator(Operator),
}

impl NodeKind {
    /// The operator, for internal nodes.
    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        match self {
            NodeKind::Operator(op) => Some(*op),
            NodeKind::Activity(_) | NodeKind::Silent => None,
        }
    }

    /// The activity label, for observable leaves.
    #[must_use]
    pub fn activity(&self) -> Option<&str> {
        match self {
            NodeKind::Activity(label) => Some(label),
            NodeKind::Silent | NodeKind::Operator(_) => None,
        }
    }

    /// Whether this kind must have no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !matches!(self, NodeKind::Operator(_))
    }
}

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single node of a process tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    /// What the node represents.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Ordered child list.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent link, `None` for the root and for detached nodes.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A candidate process model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Memoized objective value, cleared by every structural edit.
    #[serde(skip)]
    fitness: Option<f64>,
}

impl PartialEq for ProcessTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl ProcessTree {
    fn with_root(kind: NodeKind) -> Self {
        Self {
            nodes: vec![Node {
                kind,
                children: Vec::new(),
                parent: None,
            }],
            root: NodeId(0),
            fitness: None,
        }
    }

    /// A tree consisting of one activity.
    #[must_use]
    pub fn leaf(label: impl Into<String>) -> Self {
        Self::with_root(NodeKind::Activity(label.into()))
    }

    /// A tree consisting of one silent step.
    #[must_use]
    pub fn silent() -> Self {
        Self::with_root(NodeKind::Silent)
    }

    /// An operator node over copies of the given subtrees.
    #[must_use]
    pub fn operator(op: Operator, children: Vec<ProcessTree>) -> Self {
        let mut tree = Self::with_root(NodeKind::Operator(op));
        let root = tree.root;
        for child in &children {
            tree.copy_subtree_from(child, child.root, Some(root));
        }
        tree
    }

    /// Root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Nodes reachable from `start`, parents before children.
    #[must_use]
    pub fn subtree(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// All nodes of the tree in preorder.
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        self.subtree(self.root)
    }

    /// Number of nodes reachable from the root.
    #[must_use]
    pub fn size(&self) -> usize {
        self.preorder().len()
    }

    /// Length of the longest root-to-leaf path, counted in nodes.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(tree: &ProcessTree, id: NodeId) -> usize {
            1 + tree
                .children(id)
                .iter()
                .map(|&c| walk(tree, c))
                .max()
                .unwrap_or(0)
        }
        walk(self, self.root)
    }

    /// Internal nodes in preorder.
    #[must_use]
    pub fn operator_nodes(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.kind(id).operator().is_some())
            .collect()
    }

    /// Observable leaves in preorder.
    #[must_use]
    pub fn activity_leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.kind(id).activity().is_some())
            .collect()
    }

    /// Activity labels in preorder, duplicates included.
    #[must_use]
    pub fn activities(&self) -> Vec<&str> {
        self.preorder()
            .into_iter()
            .filter_map(|id| self.kind(id).activity())
            .collect()
    }

    /// Activity labels of the subtree rooted at `id`.
    #[must_use]
    pub fn subtree_activities(&self, id: NodeId) -> Vec<String> {
        self.subtree(id)
            .into_iter()
            .filter_map(|n| self.kind(n).activity().map(str::to_owned))
            .collect()
    }

    /// Whether `node` lies in the subtree rooted at `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Memoized fitness, if this exact structure has been scored.
    #[must_use]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Record the objective value for the current structure.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Forget the memoized fitness.
    pub fn invalidate_fitness(&mut self) {
        self.fitness = None;
    }

    // ------------------------------------------------------------------
    // Structural edits. Each keeps parent links consistent and clears the
    // memoized fitness; none of them checks arity.
    // ------------------------------------------------------------------

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
            parent,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        self.fitness = None;
        id
    }

    /// Create a new node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        self.alloc(kind, Some(parent))
    }

    /// Create a node that is not yet part of the tree.
    pub fn add_detached(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind, None)
    }

    /// Append a detached node (and its subtree) under `parent`.
    ///
    /// Returns `false` if `child` is still attached somewhere, is the root,
    /// or would become its own ancestor.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> bool {
        let position = self.nodes[parent.0].children.len();
        self.insert_child(parent, position, child)
    }

    /// Insert a detached node under `parent` at `position`.
    pub fn insert_child(&mut self, parent: NodeId, position: usize, child: NodeId) -> bool {
        if self.nodes[child.0].parent.is_some()
            || child == self.root
            || self.is_descendant(parent, child)
        {
            return false;
        }
        let siblings = &mut self.nodes[parent.0].children;
        let position = position.min(siblings.len());
        siblings.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        self.fitness = None;
        true
    }

    /// Detach `child` from `parent`. The subtree stays in the arena.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let siblings = &mut self.nodes[parent.0].children;
        let Some(position) = siblings.iter().position(|&c| c == child) else {
            return false;
        };
        siblings.remove(position);
        self.nodes[child.0].parent = None;
        self.fitness = None;
        true
    }

    /// Detach a node from its parent.
    pub fn detach(&mut self, id: NodeId) -> bool {
        match self.parent(id) {
            Some(parent) => self.remove_child(parent, id),
            None => false,
        }
    }

    /// Reassign the operator of an internal node.
    pub fn set_operator(&mut self, id: NodeId, op: Operator) -> bool {
        if self.kind(id).operator().is_none() {
            return false;
        }
        self.nodes[id.0].kind = NodeKind::Operator(op);
        self.fitness = None;
        true
    }

    /// Put the detached node `replacement` where `target` is, detaching
    /// `target`. Replacing the root makes `replacement` the new root.
    pub fn replace(&mut self, target: NodeId, replacement: NodeId) -> bool {
        if target == replacement
            || self.nodes[replacement.0].parent.is_some()
            || replacement == self.root
        {
            return false;
        }
        match self.parent(target) {
            Some(parent) => {
                let Some(position) = self.children(parent).iter().position(|&c| c == target)
                else {
                    return false;
                };
                self.nodes[parent.0].children[position] = replacement;
                self.nodes[replacement.0].parent = Some(parent);
                self.nodes[target.0].parent = None;
            }
            None if target == self.root => {
                self.root = replacement;
            }
            None => return false,
        }
        self.fitness = None;
        true
    }

    /// Copy the subtree of `other` rooted at `start` into this arena,
    /// attaching it under `parent` when given. Returns the copy's root.
    pub fn copy_subtree_from(
        &mut self,
        other: &ProcessTree,
        start: NodeId,
        parent: Option<NodeId>,
    ) -> NodeId {
        let copy = self.alloc(other.kind(start).clone(), parent);
        for &child in other.children(start) {
            self.copy_subtree_from(other, child, Some(copy));
        }
        copy
    }

    /// Randomly permute the children of a node.
    pub fn shuffle_children<R: Rng>(&mut self, id: NodeId, rng: &mut R) {
        self.nodes[id.0].children.shuffle(rng);
        self.fitness = None;
    }

    /// A fully independent, compacted copy. Parent links are rebuilt and
    /// detached nodes are dropped; the memoized fitness carries over since
    /// the structure is identical.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        let mut copy = Self::with_root(self.kind(self.root).clone());
        let root = copy.root;
        for &child in self.children(self.root) {
            copy.copy_subtree_from(self, child, Some(root));
        }
        copy.fitness = self.fitness;
        copy
    }

    // ------------------------------------------------------------------
    // Validity
    // ------------------------------------------------------------------

    /// Whether a node with this kind could lose one child and still satisfy
    /// the arity rules.
    #[must_use]
    pub fn can_lose_child(&self, id: NodeId) -> bool {
        match self.kind(id).operator() {
            Some(op) => self.children(id).len() > op.min_children(),
            None => false,
        }
    }

    /// Arity rules hold for every reachable node and parent links agree
    /// with child lists.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.parent(self.root).is_some() {
            return false;
        }
        self.preorder().into_iter().all(|id| {
            let node = self.node(id);
            let arity_ok = match node.kind.operator() {
                Some(op) => node.children.len() >= op.min_children(),
                None => node.children.is_empty(),
            };
            arity_ok && node.children.iter().all(|&c| self.parent(c) == Some(id))
        })
    }

    /// Valid, contains every activity of `alphabet`, nothing else, and no
    /// activity twice.
    #[must_use]
    pub fn is_strictly_valid<S: AsRef<str>>(&self, alphabet: &[S]) -> bool {
        if !self.is_valid() {
            return false;
        }
        let expected: BTreeSet<&str> = alphabet.iter().map(AsRef::as_ref).collect();
        let found = self.activities();
        found.len() == expected.len()
            && found.iter().collect::<BTreeSet<_>>().len() == found.len()
            && found.iter().all(|label| expected.contains(label))
    }

    /// Labels occurring more than once, sorted.
    #[must_use]
    pub fn duplicate_activities(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in self.activities() {
            *counts.entry(label).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|&(_, n)| n > 1)
            .map(|(label, _)| label.to_owned())
            .collect()
    }

    /// Labels of `alphabet` that do not occur in the tree, in alphabet order.
    #[must_use]
    pub fn missing_activities<S: AsRef<str>>(&self, alphabet: &[S]) -> Vec<String> {
        let present: BTreeSet<&str> = self.activities().into_iter().collect();
        alphabet
            .iter()
            .map(AsRef::as_ref)
            .filter(|label| !present.contains(label))
            .map(str::to_owned)
            .collect()
    }

    // ------------------------------------------------------------------
    // Canonical form
    // ------------------------------------------------------------------

    /// Notation with the children of commutative operators sorted, so that
    /// trees describing the same behavior through reordering agree.
    #[must_use]
    pub fn canonical_form(&self) -> String {
        self.canonical_at(self.root)
    }

    fn canonical_at(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Activity(label) => notation::quote(label),
            NodeKind::Silent => notation::TAU.to_owned(),
            NodeKind::Operator(op) => {
                let mut parts: Vec<String> = self
                    .children(id)
                    .iter()
                    .map(|&c| self.canonical_at(c))
                    .collect();
                if op.is_commutative() {
                    parts.sort_unstable();
                }
                format!("{}({})", op.symbol(), parts.join(","))
            }
        }
    }

    /// Hash of the canonical form.
    #[must_use]
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.canonical_form().hash(&mut hasher);
        hasher.finish()
    }

    fn subtree_eq(&self, id: NodeId, other: &ProcessTree, other_id: NodeId) -> bool {
        let (a, b) = (self.children(id), other.children(other_id));
        self.kind(id) == other.kind(other_id)
            && a.len() == b.len()
            && a.iter().zip(b).all(|(&x, &y)| self.subtree_eq(x, other, y))
    }
}
