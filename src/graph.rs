//! Reachability graph
//!
//! Arena-indexed adjacency lists over dense `StateId`s: integer ids index a
//! flat `Vec` of nodes, and each node carries its outgoing edges inline.
//! No pointer-linked structure exists anywhere, so the cyclic reachability
//! needed for SCC analysis raises no lifetime concerns and stays cache
//! friendly.
//!
//! Write discipline (this is what makes trace reconstruction well-defined in
//! concurrent mode):
//! - a node is pushed exactly once, by the discoverer of its state, with its
//!   parent pointer fixed at that moment;
//! - a node's edge list and enabled-action set are written exactly once, by
//!   whoever expands it.

use crate::store::StateId;
use smallvec::SmallVec;
use std::sync::Arc;

/// An outgoing transition edge.
#[derive(Clone, Debug)]
pub struct Edge {
    /// Index of the action in the model's declaration order.
    pub action: u16,
    /// Instance name for traces (e.g. `"Transfer(30)"`).
    pub label: Arc<str>,
    pub target: StateId,
}

/// The transition over which a state was first discovered.
#[derive(Clone, Debug)]
pub struct Parent {
    pub source: StateId,
    pub label: Arc<str>,
}

/// Per-state record in the arena.
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// First-discovery transition; `None` for init states.
    pub parent: Option<Parent>,
    /// BFS depth (0 for init states).
    pub depth: u32,
    /// Failed a constraint: recorded but never expanded.
    pub pruned: bool,
    /// All actions have been applied to this state.
    pub expanded: bool,
    pub edges: SmallVec<[Edge; 4]>,
    /// Bitset over action indices: which actions had at least one successor
    /// here. Populated at expansion.
    enabled: SmallVec<[u64; 1]>,
}

/// The accumulated reachable graph: states as arena indices, transitions as
/// flat adjacency lists.
pub struct StateGraph {
    nodes: Vec<Node>,
    /// Bitset words needed per node for the enabled-action set.
    enabled_words: usize,
    inits: Vec<StateId>,
}

impl StateGraph {
    pub fn new(num_actions: usize) -> Self {
        StateGraph {
            nodes: Vec::new(),
            enabled_words: num_actions.div_ceil(64),
            inits: Vec::new(),
        }
    }

    /// Push the node for a freshly interned state.
    ///
    /// Ids are dense and assigned by the store in the same order, so the new
    /// node's index must equal `id`.
    pub fn push_node(&mut self, id: StateId, parent: Option<Parent>, depth: u32) {
        debug_assert_eq!(id.as_usize(), self.nodes.len());
        self.nodes.push(Node {
            parent,
            depth,
            ..Node::default()
        });
    }

    pub fn mark_init(&mut self, id: StateId) {
        self.inits.push(id);
    }

    pub fn mark_pruned(&mut self, id: StateId) {
        self.nodes[id.as_usize()].pruned = true;
    }

    /// Record the outcome of fully expanding a state: its edges and the set
    /// of actions that were enabled.
    pub fn record_expansion(
        &mut self,
        id: StateId,
        edges: SmallVec<[Edge; 4]>,
        enabled_actions: impl IntoIterator<Item = u16>,
    ) {
        let node = &mut self.nodes[id.as_usize()];
        debug_assert!(!node.expanded, "state expanded twice");
        let mut words: SmallVec<[u64; 1]> = SmallVec::new();
        words.resize(self.enabled_words, 0);
        for action in enabled_actions {
            words[action as usize / 64] |= 1u64 << (action as usize % 64);
        }
        node.edges = edges;
        node.enabled = words;
        node.expanded = true;
    }

    pub fn node(&self, id: StateId) -> &Node {
        &self.nodes[id.as_usize()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn inits(&self) -> &[StateId] {
        &self.inits
    }

    pub fn edges(&self, id: StateId) -> &[Edge] {
        &self.nodes[id.as_usize()].edges
    }

    /// Whether `action` had at least one successor in state `id`.
    pub fn is_enabled(&self, id: StateId, action: u16) -> bool {
        let node = &self.nodes[id.as_usize()];
        node.enabled
            .get(action as usize / 64)
            .is_some_and(|w| w & (1u64 << (action as usize % 64)) != 0)
    }

    /// Whether the state has an edge back to itself.
    pub fn has_self_loop(&self, id: StateId) -> bool {
        self.edges(id).iter().any(|e| e.target == id)
    }

    /// Iterate all ids in the arena.
    pub fn ids(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.nodes.len() as u32).map(StateId)
    }
}
