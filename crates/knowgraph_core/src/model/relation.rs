//! Relation and relation-type model.
//!
//! # Invariants
//! - Relations are directed: `source_node_id -> target_node_id`.
//! - Qualifiers (`modality`, quantifiers) are free text, never validated
//!   against a vocabulary.
//! - Two naming conventions coexist and are kept apart on purpose:
//!   [`is_instance_of_name`] runs the stopword normalizer, while
//!   [`is_class_link_name`] matches the literal `is_a` / `is a` spellings.

use crate::model::node::{Node, NodeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RelationTypeId = Uuid;
pub type RelationId = Uuid;

const NAME_STOPWORDS: &[&str] = &["is", "an", "a", "the"];
const INSTANCE_OF: &str = "instance of";
const CLASS_LINK_NAMES: &[&str] = &["is_a", "is a"];

/// Typed edge vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationType {
    pub id: RelationTypeId,
    pub name: String,
    pub inverse_name: String,
    pub is_symmetric: bool,
    pub is_transitive: bool,
}

/// Input for relation-type create/update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTypeDraft {
    pub name: String,
    pub inverse_name: String,
    pub is_symmetric: bool,
    pub is_transitive: bool,
}

impl RelationTypeDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_inverse(mut self, inverse_name: impl Into<String>) -> Self {
        self.inverse_name = inverse_name.into();
        self
    }

    pub fn symmetric(mut self, value: bool) -> Self {
        self.is_symmetric = value;
        self
    }

    pub fn transitive(mut self, value: bool) -> Self {
        self.is_transitive = value;
        self
    }

    /// Returns a copy with surrounding whitespace removed from both names.
    pub(crate) fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            inverse_name: self.inverse_name.trim().to_string(),
            is_symmetric: self.is_symmetric,
            is_transitive: self.is_transitive,
        }
    }
}

/// Directed, typed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub relation_type_id: RelationTypeId,
    pub modality: Option<String>,
    pub subject_quantifier: Option<String>,
    pub object_quantifier: Option<String>,
}

/// Input for relation creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelation {
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub relation_type_id: RelationTypeId,
    pub modality: Option<String>,
    pub subject_quantifier: Option<String>,
    pub object_quantifier: Option<String>,
}

impl NewRelation {
    pub fn new(source: NodeId, target: NodeId, relation_type_id: RelationTypeId) -> Self {
        Self {
            source_node_id: source,
            target_node_id: target,
            relation_type_id,
            modality: None,
            subject_quantifier: None,
            object_quantifier: None,
        }
    }

    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = Some(modality.into());
        self
    }

    pub fn with_subject_quantifier(mut self, quantifier: impl Into<String>) -> Self {
        self.subject_quantifier = Some(quantifier.into());
        self
    }

    pub fn with_object_quantifier(mut self, quantifier: impl Into<String>) -> Self {
        self.object_quantifier = Some(quantifier.into());
        self
    }
}

/// Relation joined with the labels of its endpoints and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationView {
    #[serde(flatten)]
    pub relation: Relation,
    pub source_title: String,
    pub relation_name: String,
    pub target_title: String,
}

/// One outgoing edge in a [`Neighborhood`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborEdge {
    pub relation_id: RelationId,
    pub source: NodeId,
    pub target: NodeId,
    pub label: String,
}

/// A node plus every node one outgoing edge away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighborhood {
    /// The center node first, then targets in edge order.
    pub nodes: Vec<Node>,
    pub edges: Vec<NeighborEdge>,
}

/// Normalizes a relation-type name for the instance-of check.
///
/// Lower-cases, drops the stopwords `is`, `an`, `a`, `the` and joins the
/// remaining tokens with single spaces.
pub fn normalize_relation_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .filter(|token| !NAME_STOPWORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns whether relations of this type mark their source as an instance.
pub fn is_instance_of_name(name: &str) -> bool {
    normalize_relation_name(name) == INSTANCE_OF
}

/// Returns whether relations of this type are class-hierarchy parent links.
///
/// Only the literal spellings `is_a` and `is a` qualify (case-insensitive);
/// the stopword normalizer is not applied here.
pub fn is_class_link_name(name: &str) -> bool {
    let folded = name.trim().to_lowercase();
    CLASS_LINK_NAMES.contains(&folded.as_str())
}
