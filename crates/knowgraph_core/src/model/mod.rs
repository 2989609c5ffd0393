//! Knowledge-graph domain model.
//!
//! # Responsibility
//! - Define the records persisted by the graph store.
//! - Own the pure rules that gate writes: relation-name normalization and
//!   attribute value validation.
//!
//! # Invariants
//! - Node titles and relation-type names compare case-insensitively.
//! - `Node::is_instance` is derived from relations and never set directly.

pub mod attribute;
pub mod node;
pub mod relation;

/// Case-folded comparison key used for title and relation-name uniqueness.
pub(crate) fn case_key(value: &str) -> String {
    value.to_lowercase()
}
