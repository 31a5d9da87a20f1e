//! Bidirectional adjacency index over the facts of one source file.

use std::collections::HashMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::model::{Direction, Fact, Node, Predicate};

/// Key of one adjacency list: the predicate and the side the node sits on.
pub type EdgeKey = (Predicate, Direction);

/// Neighbours of a node, grouped by edge key in first-seen order.
pub type Adjacency = IndexMap<EdgeKey, Vec<Node>>;

static EMPTY_ADJACENCY: Lazy<Adjacency> = Lazy::new(IndexMap::new);

/// Index of one file's facts, traversable from either end of every fact.
///
/// For every fact `(s, p, o)` the index holds `o` under `(p, Outgoing)` for
/// `s` and `s` under `(p, Incoming)` for `o`. Repeated facts are kept.
/// The index is immutable once built; reloads build a new one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TripleIndex {
    nodes: HashMap<Node, Adjacency>,
    fact_count: usize,
}

impl TripleIndex {
    /// Build an index from a sequence of facts.
    pub fn build<I>(facts: I) -> Self
    where
        I: IntoIterator<Item = Fact>,
    {
        let mut nodes: HashMap<Node, Adjacency> = HashMap::new();
        let mut fact_count = 0;

        for Fact {
            subject,
            predicate,
            object,
        } in facts
        {
            nodes
                .entry(subject.clone())
                .or_default()
                .entry((predicate.clone(), Direction::Outgoing))
                .or_default()
                .push(object.clone());
            nodes
                .entry(object)
                .or_default()
                .entry((predicate, Direction::Incoming))
                .or_default()
                .push(subject);
            fact_count += 1;
        }

        Self { nodes, fact_count }
    }

    /// Adjacency of `node`; empty if the node never appeared in a fact.
    #[must_use]
    pub fn facts_at(&self, node: &Node) -> &Adjacency {
        self.nodes.get(node).unwrap_or(&EMPTY_ADJACENCY)
    }

    /// Neighbours of `node` under one edge key.
    #[must_use]
    pub fn objects(&self, node: &Node, key: &EdgeKey) -> &[Node] {
        self.nodes
            .get(node)
            .and_then(|adjacency| adjacency.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check whether `node` appears in any fact.
    #[must_use]
    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains_key(node)
    }

    /// Number of facts the index was built from.
    #[must_use]
    pub const fn fact_count(&self) -> usize {
        self.fact_count
    }

    /// Number of distinct nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Reconstruct the indexed facts from the outgoing edges.
    ///
    /// Iteration order is unspecified.
    pub fn facts(&self) -> impl Iterator<Item = Fact> + '_ {
        self.nodes.iter().flat_map(|(subject, adjacency)| {
            adjacency
                .iter()
                .filter(|((_, direction), _)| *direction == Direction::Outgoing)
                .flat_map(move |((predicate, _), objects)| {
                    objects
                        .iter()
                        .map(move |object| Fact::new(subject.clone(), predicate.clone(), object.clone()))
                })
        })
    }
}
