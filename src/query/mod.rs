//! Read-only queries over the catalog.

mod engine;
mod models;

pub use engine::QueryEngine;
pub use models::{NamespaceGroups, ObjectDescriptor, PredicateGroup, ResourceView};
