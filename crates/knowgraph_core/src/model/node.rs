//! Node model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable node identifier.
pub type NodeId = Uuid;

/// Entity in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Unique under case-insensitive comparison at creation time.
    pub title: String,
    /// Generated once at creation, editable afterwards.
    pub summary: String,
    /// Set when the node becomes the subject of an "instance of" relation.
    pub is_instance: bool,
}

/// Partial node edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
}

impl NodeUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            summary: None,
        }
    }

    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            title: None,
            summary: Some(summary.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.summary.is_none()
    }
}
