//! Graph data model and per-file triple indexes.
//!
//! This module provides:
//! - The `Node` / `Predicate` / `Fact` model
//! - `TripleIndex`, the bidirectional adjacency index of one source file
//! - `FactParser` and the oxigraph-backed `TurtleParser`

mod index;
mod model;
mod parser;

pub use index::{Adjacency, EdgeKey, TripleIndex};
pub use model::{Direction, Fact, Label, Node, Predicate, RDFS_LABEL};
pub use parser::{FactParser, TurtleParser};
