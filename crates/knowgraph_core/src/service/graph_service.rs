//! Node, relation-type and relation use-case service.
//!
//! # Responsibility
//! - Create nodes with a generated summary.
//! - Expose relation-type and relation CRUD with the store's guards.
//!
//! # Invariants
//! - The summary generator is called at most once per `create_node`, only
//!   after the title passed the duplicate pre-check, and never inside a
//!   store transaction.
//! - `update_node` and `update_relation_type` do not re-check uniqueness.

use crate::error::{EntityKind, GraphError, GraphResult};
use crate::model::node::{Node, NodeId, NodeUpdate};
use crate::model::relation::{
    Neighborhood, NewRelation, Relation, RelationId, RelationType, RelationTypeDraft,
    RelationTypeId, RelationView,
};
use crate::repo::graph_repo::GraphRepository;
use crate::summary::SummaryGenerator;
use log::{info, warn};
use std::time::Instant;

/// Graph service facade over a [`GraphRepository`].
pub struct GraphService<R: GraphRepository> {
    repo: R,
}

impl<R: GraphRepository> GraphService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a node titled `title` with a summary from `summaries`.
    ///
    /// # Errors
    /// - `BlankName` when the trimmed title is empty.
    /// - `DuplicateTitle` on a case-insensitive title match.
    /// - `GenerationFailed` when the generator fails; nothing is stored.
    pub fn create_node<S>(&self, title: &str, summaries: &S) -> GraphResult<Node>
    where
        S: SummaryGenerator + ?Sized,
    {
        let started_at = Instant::now();
        let title = title.trim();
        if title.is_empty() {
            return Err(GraphError::BlankName {
                kind: EntityKind::Node,
            });
        }
        if self.repo.node_title_exists(title)? {
            return Err(GraphError::DuplicateTitle(title.to_string()));
        }

        let summary = summaries.generate_summary(title).map_err(|err| {
            warn!(
                "event=node_create module=graph status=error error_code=generation_failed duration_ms={}",
                started_at.elapsed().as_millis()
            );
            GraphError::GenerationFailed(err.message().to_string())
        })?;

        let node = self.repo.create_node(title, summary.trim())?;
        info!(
            "event=node_create module=graph status=ok node_id={} duration_ms={}",
            node.id,
            started_at.elapsed().as_millis()
        );
        Ok(node)
    }

    pub fn get_node(&self, id: NodeId) -> GraphResult<Option<Node>> {
        self.repo.get_node(id)
    }

    pub fn list_nodes(&self) -> GraphResult<Vec<Node>> {
        self.repo.list_nodes()
    }

    /// Overwrites the provided fields. `is_instance` is not editable here.
    pub fn update_node(&self, id: NodeId, update: &NodeUpdate) -> GraphResult<Node> {
        self.repo.update_node(id, update)
    }

    /// Deletes a node unless a relation still touches it.
    pub fn delete_node(&self, id: NodeId) -> GraphResult<()> {
        self.repo.delete_node(id).inspect_err(|err| {
            if let GraphError::ReferencedEntity { count, .. } = err {
                info!("event=node_delete module=graph status=refused node_id={id} references={count}");
            }
        })
    }

    pub fn create_relation_type(&self, draft: &RelationTypeDraft) -> GraphResult<RelationType> {
        let draft = draft.trimmed();
        if draft.name.is_empty() {
            return Err(GraphError::BlankName {
                kind: EntityKind::RelationType,
            });
        }
        self.repo.create_relation_type(&draft)
    }

    pub fn get_relation_type(&self, id: RelationTypeId) -> GraphResult<Option<RelationType>> {
        self.repo.get_relation_type(id)
    }

    pub fn list_relation_types(&self) -> GraphResult<Vec<RelationType>> {
        self.repo.list_relation_types()
    }

    /// Overwrites every field of a relation type.
    pub fn update_relation_type(
        &self,
        id: RelationTypeId,
        draft: &RelationTypeDraft,
    ) -> GraphResult<RelationType> {
        self.repo.update_relation_type(id, &draft.trimmed())
    }

    pub fn delete_relation_type(&self, id: RelationTypeId) -> GraphResult<()> {
        self.repo.delete_relation_type(id)
    }

    /// Inserts an edge; an "instance of" type also marks the source node.
    pub fn create_relation(&self, relation: &NewRelation) -> GraphResult<Relation> {
        let (stored, marked_instance) = self.repo.create_relation(relation)?;
        if marked_instance {
            info!(
                "event=node_mark_instance module=graph status=ok node_id={} relation_id={}",
                stored.source_node_id, stored.id
            );
        }
        Ok(stored)
    }

    pub fn get_relation(&self, id: RelationId) -> GraphResult<Option<Relation>> {
        self.repo.get_relation(id)
    }

    pub fn list_relations(&self) -> GraphResult<Vec<RelationView>> {
        self.repo.list_relations()
    }

    pub fn delete_relation(&self, id: RelationId) -> GraphResult<()> {
        self.repo.delete_relation(id)
    }

    pub fn neighbors(&self, id: NodeId) -> GraphResult<Neighborhood> {
        self.repo.neighbors(id)
    }
}
