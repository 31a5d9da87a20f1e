//! Node, predicate and fact types.

use std::fmt;

use serde::Serialize;

/// `rdfs:label`, the predicate used to resolve human readable names.
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// A node of the graph: a named resource or a scalar value.
///
/// Equality is by value, so an IRI and a literal with the same lexical
/// form are distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    /// A named resource.
    Iri(String),
    /// A scalar value with an optional language tag.
    Literal {
        value: String,
        language: Option<String>,
    },
}

impl Node {
    /// Create an IRI node.
    pub fn iri(identifier: impl Into<String>) -> Self {
        Self::Iri(identifier.into())
    }

    /// Create a plain literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: None,
        }
    }

    /// Create a language-tagged literal.
    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: Some(language.into()),
        }
    }

    /// The identifier if this node is an IRI.
    #[must_use]
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(id) => Some(id),
            Self::Literal { .. } => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(id) => write!(f, "<{id}>"),
            Self::Literal {
                value,
                language: Some(lang),
            } => write!(f, "{value:?}@{lang}"),
            Self::Literal {
                value,
                language: None,
            } => write!(f, "{value:?}"),
        }
    }
}

/// An IRI in the relation position of a fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Predicate(String);

impl Predicate {
    /// Create a predicate from its IRI.
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    /// The predicate IRI.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The predicate as a graph node, for label resolution.
    #[must_use]
    pub fn to_node(&self) -> Node {
        Node::Iri(self.0.clone())
    }
}

impl From<&str> for Predicate {
    fn from(iri: &str) -> Self {
        Self::new(iri)
    }
}

impl From<String> for Predicate {
    fn from(iri: String) -> Self {
        Self(iri)
    }
}

/// Which side of a fact a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Direction {
    /// The node is the subject; neighbours are objects.
    #[serde(rename = "out")]
    Outgoing,
    /// The node is the object; neighbours are subjects.
    #[serde(rename = "in")]
    Incoming,
}

impl Direction {
    /// Short wire name of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outgoing => "out",
            Self::Incoming => "in",
        }
    }
}

/// A single subject-predicate-object statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    pub subject: Node,
    pub predicate: Predicate,
    pub object: Node,
}

impl Fact {
    /// Create a fact.
    pub fn new(subject: Node, predicate: impl Into<Predicate>, object: Node) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// A resolved label value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub value: String,
    pub language: Option<String>,
}

impl From<&Node> for Label {
    fn from(node: &Node) -> Self {
        match node {
            Node::Iri(id) => Self {
                value: id.clone(),
                language: None,
            },
            Node::Literal { value, language } => Self {
                value: value.clone(),
                language: language.clone(),
            },
        }
    }
}
