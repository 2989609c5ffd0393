//! Node, relation-type and relation repository.
//!
//! # Responsibility
//! - Persist nodes, the relation-type vocabulary and directed relations.
//! - Enforce case-insensitive uniqueness and deletion guards atomically.
//!
//! # Invariants
//! - `title_key` / `name_key` always hold the case-folded title / name.
//! - `is_instance` only changes as a side effect of `create_relation`.
//! - Updates overwrite without re-checking uniqueness.

use crate::error::{EntityKind, GraphError, GraphResult};
use crate::model::case_key;
use crate::model::node::{Node, NodeId, NodeUpdate};
use crate::model::relation::{
    is_instance_of_name, NeighborEdge, Neighborhood, NewRelation, Relation, RelationId,
    RelationType, RelationTypeDraft, RelationTypeId, RelationView,
};
use crate::repo::{bool_to_int, ensure_schema_ready, parse_flag, parse_uuid};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use uuid::Uuid;

const NODE_SELECT_SQL: &str = "SELECT id, title, summary, is_instance FROM nodes";

const RELATION_TYPE_SELECT_SQL: &str = "SELECT
    id,
    name,
    inverse_name,
    is_symmetric,
    is_transitive
FROM relation_types";

const RELATION_SELECT_SQL: &str = "SELECT
    id,
    source_node_id,
    target_node_id,
    relation_type_id,
    modality,
    subject_quantifier,
    object_quantifier
FROM relations";

/// Repository interface for the structural graph.
pub trait GraphRepository {
    /// Returns whether a node title collides case-insensitively.
    fn node_title_exists(&self, title: &str) -> GraphResult<bool>;
    /// Inserts a node; rejects case-insensitive title collisions.
    fn create_node(&self, title: &str, summary: &str) -> GraphResult<Node>;
    fn get_node(&self, id: NodeId) -> GraphResult<Option<Node>>;
    fn list_nodes(&self) -> GraphResult<Vec<Node>>;
    /// Overwrites the provided fields and returns the stored node.
    fn update_node(&self, id: NodeId, update: &NodeUpdate) -> GraphResult<Node>;
    /// Deletes a node that no relation references.
    fn delete_node(&self, id: NodeId) -> GraphResult<()>;

    fn create_relation_type(&self, draft: &RelationTypeDraft) -> GraphResult<RelationType>;
    fn get_relation_type(&self, id: RelationTypeId) -> GraphResult<Option<RelationType>>;
    fn list_relation_types(&self) -> GraphResult<Vec<RelationType>>;
    fn update_relation_type(
        &self,
        id: RelationTypeId,
        draft: &RelationTypeDraft,
    ) -> GraphResult<RelationType>;
    /// Deletes a relation type no relation uses.
    fn delete_relation_type(&self, id: RelationTypeId) -> GraphResult<()>;

    /// Inserts an edge and flips `is_instance` on the source when the type
    /// normalizes to "instance of". Returns the edge and whether the flag
    /// was set by this call.
    fn create_relation(&self, relation: &NewRelation) -> GraphResult<(Relation, bool)>;
    fn get_relation(&self, id: RelationId) -> GraphResult<Option<Relation>>;
    fn list_relations(&self) -> GraphResult<Vec<RelationView>>;
    fn delete_relation(&self, id: RelationId) -> GraphResult<()>;
    /// Loads a node and the targets of its outgoing edges.
    fn neighbors(&self, id: NodeId) -> GraphResult<Neighborhood>;
}

/// SQLite-backed graph repository.
pub struct SqliteGraphRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGraphRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> GraphResult<Self> {
        ensure_schema_ready(conn, &["nodes", "relation_types", "relations"])?;
        Ok(Self { conn })
    }
}

impl GraphRepository for SqliteGraphRepository<'_> {
    fn node_title_exists(&self, title: &str) -> GraphResult<bool> {
        title_taken(self.conn, title)
    }

    fn create_node(&self, title: &str, summary: &str) -> GraphResult<Node> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if title_taken(&tx, title)? {
            return Err(GraphError::DuplicateTitle(title.to_string()));
        }

        let node = Node {
            id: Uuid::new_v4(),
            title: title.to_string(),
            summary: summary.to_string(),
            is_instance: false,
        };
        tx.execute(
            "INSERT INTO nodes (id, title, title_key, summary, is_instance)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                node.id.to_string(),
                node.title.as_str(),
                case_key(&node.title),
                node.summary.as_str(),
            ],
        )?;
        tx.commit()?;
        Ok(node)
    }

    fn get_node(&self, id: NodeId) -> GraphResult<Option<Node>> {
        load_node(self.conn, id)
    }

    fn list_nodes(&self) -> GraphResult<Vec<Node>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NODE_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        Ok(nodes)
    }

    fn update_node(&self, id: NodeId, update: &NodeUpdate) -> GraphResult<Node> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE nodes
             SET
                title = COALESCE(?2, title),
                title_key = COALESCE(?3, title_key),
                summary = COALESCE(?4, summary),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                update.title.as_deref(),
                update.title.as_deref().map(case_key),
                update.summary.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(GraphError::not_found(EntityKind::Node, id));
        }

        let node = load_node(&tx, id)?.ok_or(GraphError::not_found(EntityKind::Node, id))?;
        tx.commit()?;
        Ok(node)
    }

    fn delete_node(&self, id: NodeId) -> GraphResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_node(&tx, id)?.is_none() {
            return Err(GraphError::not_found(EntityKind::Node, id));
        }

        let count: i64 = tx.query_row(
            "SELECT COUNT(*)
             FROM relations
             WHERE source_node_id = ?1 OR target_node_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Err(GraphError::ReferencedEntity {
                kind: EntityKind::Node,
                id,
                count: count as u64,
            });
        }

        tx.execute("DELETE FROM nodes WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn create_relation_type(&self, draft: &RelationTypeDraft) -> GraphResult<RelationType> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if relation_name_taken(&tx, &draft.name)? {
            return Err(GraphError::DuplicateRelationType(draft.name.clone()));
        }

        let relation_type = RelationType {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            inverse_name: draft.inverse_name.clone(),
            is_symmetric: draft.is_symmetric,
            is_transitive: draft.is_transitive,
        };
        tx.execute(
            "INSERT INTO relation_types (
                id,
                name,
                name_key,
                inverse_name,
                is_symmetric,
                is_transitive
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                relation_type.id.to_string(),
                relation_type.name.as_str(),
                case_key(&relation_type.name),
                relation_type.inverse_name.as_str(),
                bool_to_int(relation_type.is_symmetric),
                bool_to_int(relation_type.is_transitive),
            ],
        )?;
        tx.commit()?;
        Ok(relation_type)
    }

    fn get_relation_type(&self, id: RelationTypeId) -> GraphResult<Option<RelationType>> {
        load_relation_type(self.conn, id)
    }

    fn list_relation_types(&self) -> GraphResult<Vec<RelationType>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RELATION_TYPE_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut relation_types = Vec::new();
        while let Some(row) = rows.next()? {
            relation_types.push(parse_relation_type_row(row)?);
        }
        Ok(relation_types)
    }

    fn update_relation_type(
        &self,
        id: RelationTypeId,
        draft: &RelationTypeDraft,
    ) -> GraphResult<RelationType> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE relation_types
             SET
                name = ?2,
                name_key = ?3,
                inverse_name = ?4,
                is_symmetric = ?5,
                is_transitive = ?6
             WHERE id = ?1;",
            params![
                id.to_string(),
                draft.name.as_str(),
                case_key(&draft.name),
                draft.inverse_name.as_str(),
                bool_to_int(draft.is_symmetric),
                bool_to_int(draft.is_transitive),
            ],
        )?;
        if changed == 0 {
            return Err(GraphError::not_found(EntityKind::RelationType, id));
        }
        tx.commit()?;

        Ok(RelationType {
            id,
            name: draft.name.clone(),
            inverse_name: draft.inverse_name.clone(),
            is_symmetric: draft.is_symmetric,
            is_transitive: draft.is_transitive,
        })
    }

    fn delete_relation_type(&self, id: RelationTypeId) -> GraphResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_relation_type(&tx, id)?.is_none() {
            return Err(GraphError::not_found(EntityKind::RelationType, id));
        }

        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM relations WHERE relation_type_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Err(GraphError::ReferencedEntity {
                kind: EntityKind::RelationType,
                id,
                count: count as u64,
            });
        }

        tx.execute("DELETE FROM relation_types WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn create_relation(&self, relation: &NewRelation) -> GraphResult<(Relation, bool)> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for node_id in [relation.source_node_id, relation.target_node_id] {
            if load_node(&tx, node_id)?.is_none() {
                return Err(GraphError::not_found(EntityKind::Node, node_id));
            }
        }
        let relation_type = load_relation_type(&tx, relation.relation_type_id)?.ok_or(
            GraphError::not_found(EntityKind::RelationType, relation.relation_type_id),
        )?;

        let stored = Relation {
            id: Uuid::new_v4(),
            source_node_id: relation.source_node_id,
            target_node_id: relation.target_node_id,
            relation_type_id: relation.relation_type_id,
            modality: relation.modality.clone(),
            subject_quantifier: relation.subject_quantifier.clone(),
            object_quantifier: relation.object_quantifier.clone(),
        };
        tx.execute(
            "INSERT INTO relations (
                id,
                source_node_id,
                target_node_id,
                relation_type_id,
                modality,
                subject_quantifier,
                object_quantifier
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                stored.id.to_string(),
                stored.source_node_id.to_string(),
                stored.target_node_id.to_string(),
                stored.relation_type_id.to_string(),
                stored.modality.as_deref(),
                stored.subject_quantifier.as_deref(),
                stored.object_quantifier.as_deref(),
            ],
        )?;

        let marks_instance = is_instance_of_name(&relation_type.name);
        if marks_instance {
            tx.execute(
                "UPDATE nodes
                 SET
                    is_instance = 1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                [stored.source_node_id.to_string()],
            )?;
        }

        tx.commit()?;
        Ok((stored, marks_instance))
    }

    fn get_relation(&self, id: RelationId) -> GraphResult<Option<Relation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RELATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_relation_row(row)?));
        }
        Ok(None)
    }

    fn list_relations(&self) -> GraphResult<Vec<RelationView>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                r.id AS id,
                r.source_node_id AS source_node_id,
                r.target_node_id AS target_node_id,
                r.relation_type_id AS relation_type_id,
                r.modality AS modality,
                r.subject_quantifier AS subject_quantifier,
                r.object_quantifier AS object_quantifier,
                s.title AS source_title,
                rt.name AS relation_name,
                t.title AS target_title
             FROM relations r
             INNER JOIN nodes s ON s.id = r.source_node_id
             INNER JOIN nodes t ON t.id = r.target_node_id
             INNER JOIN relation_types rt ON rt.id = r.relation_type_id
             ORDER BY r.rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            views.push(RelationView {
                relation: parse_relation_row(row)?,
                source_title: row.get("source_title")?,
                relation_name: row.get("relation_name")?,
                target_title: row.get("target_title")?,
            });
        }
        Ok(views)
    }

    fn delete_relation(&self, id: RelationId) -> GraphResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM relations WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(GraphError::not_found(EntityKind::Relation, id));
        }
        tx.commit()?;
        Ok(())
    }

    fn neighbors(&self, id: NodeId) -> GraphResult<Neighborhood> {
        let center = load_node(self.conn, id)?.ok_or(GraphError::not_found(EntityKind::Node, id))?;

        let mut stmt = self.conn.prepare(
            "SELECT
                r.id AS relation_id,
                rt.name AS label,
                t.id AS id,
                t.title AS title,
                t.summary AS summary,
                t.is_instance AS is_instance
             FROM relations r
             INNER JOIN nodes t ON t.id = r.target_node_id
             INNER JOIN relation_types rt ON rt.id = r.relation_type_id
             WHERE r.source_node_id = ?1
             ORDER BY r.rowid ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;

        let mut seen = HashSet::from([center.id]);
        let mut nodes = vec![center];
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            let relation_id_text: String = row.get("relation_id")?;
            let target = parse_node_row(row)?;
            edges.push(NeighborEdge {
                relation_id: parse_uuid(&relation_id_text, "relations.id")?,
                source: id,
                target: target.id,
                label: row.get("label")?,
            });
            if seen.insert(target.id) {
                nodes.push(target);
            }
        }

        Ok(Neighborhood { nodes, edges })
    }
}

fn title_taken(conn: &Connection, title: &str) -> GraphResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM nodes WHERE title_key = ?1);",
        [case_key(title)],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn relation_name_taken(conn: &Connection, name: &str) -> GraphResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM relation_types WHERE name_key = ?1);",
        [case_key(name)],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_node(conn: &Connection, id: NodeId) -> GraphResult<Option<Node>> {
    let mut stmt = conn.prepare(&format!("{NODE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_node_row(row)?));
    }
    Ok(None)
}

fn load_relation_type(conn: &Connection, id: RelationTypeId) -> GraphResult<Option<RelationType>> {
    let mut stmt = conn.prepare(&format!("{RELATION_TYPE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_relation_type_row(row)?));
    }
    Ok(None)
}

pub(crate) fn parse_node_row(row: &Row<'_>) -> GraphResult<Node> {
    let id_text: String = row.get("id")?;
    Ok(Node {
        id: parse_uuid(&id_text, "nodes.id")?,
        title: row.get("title")?,
        summary: row.get("summary")?,
        is_instance: parse_flag(row.get("is_instance")?, "nodes.is_instance")?,
    })
}

fn parse_relation_type_row(row: &Row<'_>) -> GraphResult<RelationType> {
    let id_text: String = row.get("id")?;
    Ok(RelationType {
        id: parse_uuid(&id_text, "relation_types.id")?,
        name: row.get("name")?,
        inverse_name: row.get("inverse_name")?,
        is_symmetric: parse_flag(row.get("is_symmetric")?, "relation_types.is_symmetric")?,
        is_transitive: parse_flag(row.get("is_transitive")?, "relation_types.is_transitive")?,
    })
}

fn parse_relation_row(row: &Row<'_>) -> GraphResult<Relation> {
    let id_text: String = row.get("id")?;
    let source_text: String = row.get("source_node_id")?;
    let target_text: String = row.get("target_node_id")?;
    let type_text: String = row.get("relation_type_id")?;
    Ok(Relation {
        id: parse_uuid(&id_text, "relations.id")?,
        source_node_id: parse_uuid(&source_text, "relations.source_node_id")?,
        target_node_id: parse_uuid(&target_text, "relations.target_node_id")?,
        relation_type_id: parse_uuid(&type_text, "relations.relation_type_id")?,
        modality: row.get("modality")?,
        subject_quantifier: row.get("subject_quantifier")?,
        object_quantifier: row.get("object_quantifier")?,
    })
}
