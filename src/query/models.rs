//! Response models for lookups.

use indexmap::IndexMap;
use serde::Serialize;

use crate::graph::{Direction, Label, Predicate};

/// Lookup result: predicate groups bucketed by namespace.
///
/// Namespaces appear in catalog path order and groups in the order their
/// keys were first seen while indexing. Neither order is stable across
/// reloads.
pub type NamespaceGroups = IndexMap<String, Vec<PredicateGroup>>;

/// Neighbours reached from one node over one predicate in one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateGroup {
    pub predicate: Predicate,
    /// `rdfs:label` values of the predicate itself.
    #[serde(rename = "labels")]
    pub predicate_labels: Vec<Label>,
    pub direction: Direction,
    pub objects: Vec<ObjectDescriptor>,
}

/// A neighbour node, described for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectDescriptor {
    Iri {
        uri: String,
        labels: Vec<Label>,
    },
    Literal {
        value: String,
        language: Option<String>,
    },
}

impl ObjectDescriptor {
    /// IRI of the neighbour, if it is a named resource.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Iri { uri, .. } => Some(uri),
            Self::Literal { .. } => None,
        }
    }
}

/// Everything known about one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceView {
    pub resource_uri: String,
    pub resource_label: Vec<Label>,
    pub data: NamespaceGroups,
}
