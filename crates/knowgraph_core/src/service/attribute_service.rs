//! Attribute use-case service.
//!
//! # Responsibility
//! - Attribute definition CRUD with boundary cleanup.
//! - Validated node attribute assignments.
//! - Possible-attribute declarations and their inherited closure.

use crate::error::{EntityKind, GraphError, GraphResult};
use crate::model::attribute::{
    AssignmentId, Attribute, AttributeDraft, AttributeId, NodeAttributeAssignment,
    NodeAttributeView, PossibleAttributes,
};
use crate::model::node::NodeId;
use crate::repo::attribute_repo::AttributeRepository;
use crate::service::inheritance::resolve_possible_attributes;
use log::info;

/// Attribute service facade over an [`AttributeRepository`].
pub struct AttributeService<R: AttributeRepository> {
    repo: R,
}

impl<R: AttributeRepository> AttributeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an attribute definition.
    ///
    /// Text fields are trimmed and blank list entries dropped before storage.
    pub fn create_attribute(&self, draft: &AttributeDraft) -> GraphResult<Attribute> {
        let draft = normalized_draft(draft)?;
        self.repo.create_attribute(&draft)
    }

    pub fn get_attribute(&self, id: AttributeId) -> GraphResult<Option<Attribute>> {
        self.repo.get_attribute(id)
    }

    pub fn list_attributes(&self) -> GraphResult<Vec<Attribute>> {
        self.repo.list_attributes()
    }

    /// Replaces an attribute definition. Existing assignments are not
    /// re-validated against a changed data type.
    pub fn update_attribute(&self, id: AttributeId, draft: &AttributeDraft) -> GraphResult<Attribute> {
        let draft = normalized_draft(draft)?;
        self.repo.update_attribute(id, &draft)
    }

    pub fn delete_attribute(&self, id: AttributeId) -> GraphResult<()> {
        self.repo.delete_attribute(id)
    }

    /// Binds a validated value to a node.
    pub fn add_node_attribute(
        &self,
        node_id: NodeId,
        attribute_id: AttributeId,
        value: &str,
        quantifier: Option<&str>,
    ) -> GraphResult<NodeAttributeAssignment> {
        self.repo
            .create_node_attribute(node_id, attribute_id, value, quantifier)
            .inspect_err(|err| {
                if let GraphError::InvalidAttributeValue { data_type } = err {
                    info!(
                        "event=node_attribute_write module=attribute status=rejected node_id={node_id} data_type={data_type}"
                    );
                }
            })
    }

    /// Revalidates and overwrites an existing assignment.
    pub fn update_node_attribute(
        &self,
        id: AssignmentId,
        value: &str,
        quantifier: Option<&str>,
    ) -> GraphResult<NodeAttributeAssignment> {
        self.repo.update_node_attribute(id, value, quantifier)
    }

    pub fn get_node_attribute(&self, id: AssignmentId) -> GraphResult<Option<NodeAttributeAssignment>> {
        self.repo.get_node_attribute(id)
    }

    pub fn list_node_attributes(&self, node_id: NodeId) -> GraphResult<Vec<NodeAttributeView>> {
        self.repo.list_node_attributes(node_id)
    }

    pub fn delete_node_attribute(&self, id: AssignmentId) -> GraphResult<()> {
        self.repo.delete_node_attribute(id)
    }

    /// Declares one attribute as assignable to a node. Idempotent.
    pub fn add_possible_attribute(&self, node_id: NodeId, attribute_id: AttributeId) -> GraphResult<()> {
        self.repo.add_possible_attributes(node_id, &[attribute_id])?;
        Ok(())
    }

    /// Declares several attributes at once; all or none are recorded.
    pub fn add_possible_attributes(
        &self,
        node_id: NodeId,
        attribute_ids: &[AttributeId],
    ) -> GraphResult<usize> {
        self.repo.add_possible_attributes(node_id, attribute_ids)
    }

    pub fn remove_possible_attribute(
        &self,
        node_id: NodeId,
        attribute_id: AttributeId,
    ) -> GraphResult<bool> {
        self.repo.remove_possible_attribute(node_id, attribute_id)
    }

    /// Direct and inherited possible attributes of a node.
    pub fn possible_attributes(&self, node_id: NodeId) -> GraphResult<PossibleAttributes> {
        resolve_possible_attributes(&self.repo, node_id)
    }
}

fn normalized_draft(draft: &AttributeDraft) -> GraphResult<AttributeDraft> {
    let draft = draft.normalized();
    if draft.name.is_empty() {
        return Err(GraphError::BlankName {
            kind: EntityKind::Attribute,
        });
    }
    Ok(draft)
}
