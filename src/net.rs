//! Workflow nets derived from process trees.
//!
//! A [`PetriNet`] is a bipartite place/transition graph with a designated
//! source and sink place. Nets are built once per evaluation by
//! [`PetriNet::from_tree`] and never changed afterwards.

mod convert;

use crate::error::NetError;
use serde::Serialize;
use std::collections::VecDeque;

/// Index of a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlaceId(pub usize);

/// Index of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TransitionId(pub usize);

/// A place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Place {
    /// Diagnostic name.
    pub name: String,
}

/// A transition with unit-weight arcs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Diagnostic name.
    pub name: String,
    /// Activity label, `None` for silent transitions.
    pub label: Option<String>,
    /// Places consumed from, one token per entry.
    pub inputs: Vec<PlaceId>,
    /// Places produced into, one token per entry.
    pub outputs: Vec<PlaceId>,
}

impl Transition {
    /// Whether the transition has no observable label.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.label.is_none()
    }
}

/// A Petri net with an initial and a final place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PetriNet {
    places: Vec<Place>,
    transitions: Vec<Transition>,
    source: Option<PlaceId>,
    sink: Option<PlaceId>,
}

impl PetriNet {
    /// An empty net without source or sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a place.
    pub fn add_place(&mut self, name: impl Into<String>) -> PlaceId {
        let id = PlaceId(self.places.len());
        self.places.push(Place { name: name.into() });
        id
    }

    /// Add a transition; `label` is `None` for a silent one.
    pub fn add_transition(
        &mut self,
        name: impl Into<String>,
        label: Option<String>,
        inputs: Vec<PlaceId>,
        outputs: Vec<PlaceId>,
    ) -> TransitionId {
        let id = TransitionId(self.transitions.len());
        self.transitions.push(Transition {
            name: name.into(),
            label,
            inputs,
            outputs,
        });
        id
    }

    /// Designate the initial place.
    pub fn set_source(&mut self, place: PlaceId) {
        self.source = Some(place);
    }

    /// Designate the final place.
    pub fn set_sink(&mut self, place: PlaceId) {
        self.sink = Some(place);
    }

    /// Initial place, if designated.
    #[must_use]
    pub fn source(&self) -> Option<PlaceId> {
        self.source
    }

    /// Final place, if designated.
    #[must_use]
    pub fn sink(&self) -> Option<PlaceId> {
        self.sink
    }

    /// All places.
    #[must_use]
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// All transitions.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Place by id.
    #[must_use]
    pub fn place(&self, id: PlaceId) -> &Place {
        &self.places[id.0]
    }

    /// Transition by id.
    #[must_use]
    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.0]
    }

    /// Number of arcs.
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.transitions
            .iter()
            .map(|t| t.inputs.len() + t.outputs.len())
            .sum()
    }

    /// Average number of arcs per node (places and transitions).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_arc_degree(&self) -> f64 {
        let nodes = self.places.len() + self.transitions.len();
        if nodes == 0 {
            return 0.0;
        }
        2.0 * self.arc_count() as f64 / nodes as f64
    }

    /// Check that the net is a replayable workflow net: it has a source
    /// without inputs, a sink without outputs, and every transition can be
    /// reached from the source along the arcs.
    ///
    /// # Errors
    ///
    /// Returns the first defect found.
    pub fn validate(&self) -> Result<(), NetError> {
        let source = self.source.ok_or(NetError::MissingSource)?;
        let sink = self.sink.ok_or(NetError::MissingSink)?;
        for t in &self.transitions {
            if t.outputs.contains(&source) {
                return Err(NetError::SourceHasInputs(self.place(source).name.clone()));
            }
            if t.inputs.contains(&sink) {
                return Err(NetError::SinkHasOutputs(self.place(sink).name.clone()));
            }
        }

        let mut place_seen = vec![false; self.places.len()];
        let mut transition_seen = vec![false; self.transitions.len()];
        let mut queue = VecDeque::from([source]);
        place_seen[source.0] = true;
        while let Some(place) = queue.pop_front() {
            for (i, t) in self.transitions.iter().enumerate() {
                if transition_seen[i] || !t.inputs.contains(&place) {
                    continue;
                }
                transition_seen[i] = true;
                for &out in &t.outputs {
                    if !place_seen[out.0] {
                        place_seen[out.0] = true;
                        queue.push_back(out);
                    }
                }
            }
        }
        if let Some(i) = transition_seen.iter().position(|&seen| !seen) {
            return Err(NetError::UnreachableTransition(
                self.transitions[i].name.clone(),
            ));
        }
        Ok(())
    }
}
