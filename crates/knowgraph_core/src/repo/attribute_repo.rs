//! Attribute, assignment and possible-attribute repository.
//!
//! # Responsibility
//! - Persist attribute definitions with their ordered value/label lists.
//! - Gate every assignment write through `validate_attribute_value`.
//! - Expose the per-node queries the inheritance resolver walks.
//!
//! # Invariants
//! - Assignment values are validated inside the write transaction against
//!   the attribute definition read in that same transaction.
//! - Declaring an existing possible attribute is a no-op.

use crate::error::{EntityKind, GraphError, GraphResult};
use crate::model::attribute::{
    validate_attribute_value, AssignmentId, Attribute, AttributeDraft, AttributeId, DataType,
    NodeAttributeAssignment, NodeAttributeView,
};
use crate::model::node::NodeId;
use crate::model::relation::is_class_link_name;
use crate::repo::{ensure_schema_ready, parse_uuid};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const ATTRIBUTE_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    data_type,
    unit
FROM attributes";

const ASSIGNMENT_SELECT_SQL: &str = "SELECT
    id,
    node_id,
    attribute_id,
    value,
    quantifier
FROM node_attributes";

/// Repository interface for attribute definitions and node bindings.
pub trait AttributeRepository {
    /// Inserts an attribute; rejects exact-name collisions.
    fn create_attribute(&self, draft: &AttributeDraft) -> GraphResult<Attribute>;
    fn get_attribute(&self, id: AttributeId) -> GraphResult<Option<Attribute>>;
    fn list_attributes(&self) -> GraphResult<Vec<Attribute>>;
    /// Replaces every field; renaming onto another attribute's name fails.
    fn update_attribute(&self, id: AttributeId, draft: &AttributeDraft) -> GraphResult<Attribute>;
    /// Deletes an attribute no assignment or declaration references.
    fn delete_attribute(&self, id: AttributeId) -> GraphResult<()>;

    /// Validates and stores one value for a node.
    fn create_node_attribute(
        &self,
        node_id: NodeId,
        attribute_id: AttributeId,
        value: &str,
        quantifier: Option<&str>,
    ) -> GraphResult<NodeAttributeAssignment>;
    /// Validates and overwrites an existing assignment's value and quantifier.
    fn update_node_attribute(
        &self,
        id: AssignmentId,
        value: &str,
        quantifier: Option<&str>,
    ) -> GraphResult<NodeAttributeAssignment>;
    fn get_node_attribute(&self, id: AssignmentId) -> GraphResult<Option<NodeAttributeAssignment>>;
    fn list_node_attributes(&self, node_id: NodeId) -> GraphResult<Vec<NodeAttributeView>>;
    fn delete_node_attribute(&self, id: AssignmentId) -> GraphResult<()>;

    /// Declares attributes as assignable to a node. Returns how many
    /// declarations were new.
    fn add_possible_attributes(
        &self,
        node_id: NodeId,
        attribute_ids: &[AttributeId],
    ) -> GraphResult<usize>;
    /// Removes one declaration. Returns whether it existed.
    fn remove_possible_attribute(
        &self,
        node_id: NodeId,
        attribute_id: AttributeId,
    ) -> GraphResult<bool>;
    /// Attributes declared directly on the node, ordered by name.
    fn list_possible_attributes(&self, node_id: NodeId) -> GraphResult<Vec<Attribute>>;

    fn node_exists(&self, node_id: NodeId) -> GraphResult<bool>;
    /// Targets of the node's outgoing `is_a` / `is a` relations.
    fn class_parents(&self, node_id: NodeId) -> GraphResult<Vec<NodeId>>;
}

/// SQLite-backed attribute repository.
pub struct SqliteAttributeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttributeRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> GraphResult<Self> {
        ensure_schema_ready(
            conn,
            &[
                "attributes",
                "attribute_allowed_values",
                "attribute_node_types",
                "node_attributes",
                "possible_node_attributes",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl AttributeRepository for SqliteAttributeRepository<'_> {
    fn create_attribute(&self, draft: &AttributeDraft) -> GraphResult<Attribute> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if attribute_name_owner(&tx, &draft.name)?.is_some() {
            return Err(GraphError::DuplicateAttributeName(draft.name.clone()));
        }

        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO attributes (id, name, description, data_type, unit)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                draft.name.as_str(),
                draft.description.as_str(),
                draft.data_type.as_str(),
                draft.unit.as_deref(),
            ],
        )?;
        write_attribute_lists(&tx, id, draft)?;
        tx.commit()?;

        Ok(attribute_from_draft(id, draft))
    }

    fn get_attribute(&self, id: AttributeId) -> GraphResult<Option<Attribute>> {
        load_attribute(self.conn, id)
    }

    fn list_attributes(&self) -> GraphResult<Vec<Attribute>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTRIBUTE_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        collect_attributes(self.conn, &mut stmt, params![])
    }

    fn update_attribute(&self, id: AttributeId, draft: &AttributeDraft) -> GraphResult<Attribute> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_attribute(&tx, id)?.is_none() {
            return Err(GraphError::not_found(EntityKind::Attribute, id));
        }
        if matches!(attribute_name_owner(&tx, &draft.name)?, Some(owner) if owner != id) {
            return Err(GraphError::DuplicateAttributeName(draft.name.clone()));
        }

        tx.execute(
            "UPDATE attributes
             SET
                name = ?2,
                description = ?3,
                data_type = ?4,
                unit = ?5
             WHERE id = ?1;",
            params![
                id.to_string(),
                draft.name.as_str(),
                draft.description.as_str(),
                draft.data_type.as_str(),
                draft.unit.as_deref(),
            ],
        )?;
        write_attribute_lists(&tx, id, draft)?;
        tx.commit()?;

        Ok(attribute_from_draft(id, draft))
    }

    fn delete_attribute(&self, id: AttributeId) -> GraphResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_attribute(&tx, id)?.is_none() {
            return Err(GraphError::not_found(EntityKind::Attribute, id));
        }

        let count: i64 = tx.query_row(
            "SELECT
                (SELECT COUNT(*) FROM node_attributes WHERE attribute_id = ?1)
              + (SELECT COUNT(*) FROM possible_node_attributes WHERE attribute_id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Err(GraphError::ReferencedEntity {
                kind: EntityKind::Attribute,
                id,
                count: count as u64,
            });
        }

        tx.execute("DELETE FROM attributes WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn create_node_attribute(
        &self,
        node_id: NodeId,
        attribute_id: AttributeId,
        value: &str,
        quantifier: Option<&str>,
    ) -> GraphResult<NodeAttributeAssignment> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !node_exists(&tx, node_id)? {
            return Err(GraphError::not_found(EntityKind::Node, node_id));
        }
        let attribute = load_attribute(&tx, attribute_id)?
            .ok_or(GraphError::not_found(EntityKind::Attribute, attribute_id))?;
        ensure_valid_value(&attribute, value)?;

        let assignment = NodeAttributeAssignment {
            id: Uuid::new_v4(),
            node_id,
            attribute_id,
            value: value.to_string(),
            quantifier: quantifier.map(str::to_string),
        };
        tx.execute(
            "INSERT INTO node_attributes (id, node_id, attribute_id, value, quantifier)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                assignment.id.to_string(),
                node_id.to_string(),
                attribute_id.to_string(),
                assignment.value.as_str(),
                assignment.quantifier.as_deref(),
            ],
        )?;
        tx.commit()?;
        Ok(assignment)
    }

    fn update_node_attribute(
        &self,
        id: AssignmentId,
        value: &str,
        quantifier: Option<&str>,
    ) -> GraphResult<NodeAttributeAssignment> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = load_assignment(&tx, id)?
            .ok_or(GraphError::not_found(EntityKind::NodeAttribute, id))?;
        let attribute = load_attribute(&tx, existing.attribute_id)?.ok_or(
            GraphError::not_found(EntityKind::Attribute, existing.attribute_id),
        )?;
        ensure_valid_value(&attribute, value)?;

        tx.execute(
            "UPDATE node_attributes
             SET value = ?2, quantifier = ?3
             WHERE id = ?1;",
            params![id.to_string(), value, quantifier],
        )?;
        tx.commit()?;

        Ok(NodeAttributeAssignment {
            value: value.to_string(),
            quantifier: quantifier.map(str::to_string),
            ..existing
        })
    }

    fn get_node_attribute(&self, id: AssignmentId) -> GraphResult<Option<NodeAttributeAssignment>> {
        load_assignment(self.conn, id)
    }

    fn list_node_attributes(&self, node_id: NodeId) -> GraphResult<Vec<NodeAttributeView>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                na.id AS id,
                na.node_id AS node_id,
                na.attribute_id AS attribute_id,
                na.value AS value,
                na.quantifier AS quantifier,
                a.name AS attribute_name,
                a.data_type AS data_type,
                a.unit AS unit
             FROM node_attributes na
             INNER JOIN attributes a ON a.id = na.attribute_id
             WHERE na.node_id = ?1
             ORDER BY na.rowid ASC;",
        )?;
        let mut rows = stmt.query([node_id.to_string()])?;
        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            let data_type_text: String = row.get("data_type")?;
            views.push(NodeAttributeView {
                assignment: parse_assignment_row(row)?,
                attribute_name: row.get("attribute_name")?,
                data_type: parse_data_type(&data_type_text)?,
                unit: row.get("unit")?,
            });
        }
        Ok(views)
    }

    fn delete_node_attribute(&self, id: AssignmentId) -> GraphResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM node_attributes WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(GraphError::not_found(EntityKind::NodeAttribute, id));
        }
        tx.commit()?;
        Ok(())
    }

    fn add_possible_attributes(
        &self,
        node_id: NodeId,
        attribute_ids: &[AttributeId],
    ) -> GraphResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !node_exists(&tx, node_id)? {
            return Err(GraphError::not_found(EntityKind::Node, node_id));
        }

        let mut inserted = 0;
        for attribute_id in attribute_ids {
            if load_attribute(&tx, *attribute_id)?.is_none() {
                return Err(GraphError::not_found(EntityKind::Attribute, *attribute_id));
            }
            inserted += tx.execute(
                "INSERT OR IGNORE INTO possible_node_attributes (node_id, attribute_id)
                 VALUES (?1, ?2);",
                params![node_id.to_string(), attribute_id.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn remove_possible_attribute(
        &self,
        node_id: NodeId,
        attribute_id: AttributeId,
    ) -> GraphResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "DELETE FROM possible_node_attributes
             WHERE node_id = ?1 AND attribute_id = ?2;",
            params![node_id.to_string(), attribute_id.to_string()],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    fn list_possible_attributes(&self, node_id: NodeId) -> GraphResult<Vec<Attribute>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                a.id AS id,
                a.name AS name,
                a.description AS description,
                a.data_type AS data_type,
                a.unit AS unit
             FROM possible_node_attributes p
             INNER JOIN attributes a ON a.id = p.attribute_id
             WHERE p.node_id = ?1
             ORDER BY a.name COLLATE NOCASE ASC, a.id ASC;",
        )?;
        collect_attributes(self.conn, &mut stmt, [node_id.to_string()])
    }

    fn node_exists(&self, node_id: NodeId) -> GraphResult<bool> {
        node_exists(self.conn, node_id)
    }

    fn class_parents(&self, node_id: NodeId) -> GraphResult<Vec<NodeId>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.target_node_id AS target_node_id, rt.name AS name
             FROM relations r
             INNER JOIN relation_types rt ON rt.id = r.relation_type_id
             WHERE r.source_node_id = ?1
             ORDER BY r.rowid ASC;",
        )?;
        let mut rows = stmt.query([node_id.to_string()])?;
        let mut parents = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            if !is_class_link_name(&name) {
                continue;
            }
            let target_text: String = row.get("target_node_id")?;
            parents.push(parse_uuid(&target_text, "relations.target_node_id")?);
        }
        Ok(parents)
    }
}

fn ensure_valid_value(attribute: &Attribute, value: &str) -> GraphResult<()> {
    if validate_attribute_value(attribute.data_type, value, &attribute.allowed_values) {
        Ok(())
    } else {
        Err(GraphError::InvalidAttributeValue {
            data_type: attribute.data_type,
        })
    }
}

fn attribute_from_draft(id: AttributeId, draft: &AttributeDraft) -> Attribute {
    Attribute {
        id,
        name: draft.name.clone(),
        description: draft.description.clone(),
        data_type: draft.data_type,
        allowed_values: draft.allowed_values.clone(),
        unit: draft.unit.clone(),
        applicable_node_types: draft.applicable_node_types.clone(),
    }
}

fn attribute_name_owner(conn: &Connection, name: &str) -> GraphResult<Option<AttributeId>> {
    let mut stmt = conn.prepare("SELECT id FROM attributes WHERE name = ?1;")?;
    let mut rows = stmt.query([name])?;
    if let Some(row) = rows.next()? {
        let id_text: String = row.get(0)?;
        return Ok(Some(parse_uuid(&id_text, "attributes.id")?));
    }
    Ok(None)
}

fn node_exists(conn: &Connection, node_id: NodeId) -> GraphResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM nodes WHERE id = ?1);",
        [node_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn write_attribute_lists(
    conn: &Connection,
    id: AttributeId,
    draft: &AttributeDraft,
) -> GraphResult<()> {
    let id_text = id.to_string();
    conn.execute(
        "DELETE FROM attribute_allowed_values WHERE attribute_id = ?1;",
        [id_text.as_str()],
    )?;
    conn.execute(
        "DELETE FROM attribute_node_types WHERE attribute_id = ?1;",
        [id_text.as_str()],
    )?;

    for (position, value) in draft.allowed_values.iter().enumerate() {
        conn.execute(
            "INSERT INTO attribute_allowed_values (attribute_id, position, value)
             VALUES (?1, ?2, ?3);",
            params![id_text.as_str(), position as i64, value.as_str()],
        )?;
    }
    for (position, label) in draft.applicable_node_types.iter().enumerate() {
        conn.execute(
            "INSERT INTO attribute_node_types (attribute_id, position, label)
             VALUES (?1, ?2, ?3);",
            params![id_text.as_str(), position as i64, label.as_str()],
        )?;
    }
    Ok(())
}

fn load_attribute(conn: &Connection, id: AttributeId) -> GraphResult<Option<Attribute>> {
    let mut stmt = conn.prepare(&format!("{ATTRIBUTE_SELECT_SQL} WHERE id = ?1;"))?;
    Ok(collect_attributes(conn, &mut stmt, [id.to_string()])?
        .into_iter()
        .next())
}

fn collect_attributes<P: rusqlite::Params>(
    conn: &Connection,
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> GraphResult<Vec<Attribute>> {
    let mut rows = stmt.query(params)?;
    let mut attributes = Vec::new();
    while let Some(row) = rows.next()? {
        attributes.push(parse_attribute_row(row)?);
    }
    for attribute in &mut attributes {
        attribute.allowed_values = load_ordered_list(
            conn,
            "SELECT value FROM attribute_allowed_values
             WHERE attribute_id = ?1
             ORDER BY position ASC;",
            attribute.id,
        )?;
        attribute.applicable_node_types = load_ordered_list(
            conn,
            "SELECT label FROM attribute_node_types
             WHERE attribute_id = ?1
             ORDER BY position ASC;",
            attribute.id,
        )?;
    }
    Ok(attributes)
}

fn load_ordered_list(conn: &Connection, sql: &str, id: AttributeId) -> GraphResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        values.push(row.get(0)?);
    }
    Ok(values)
}

fn load_assignment(
    conn: &Connection,
    id: AssignmentId,
) -> GraphResult<Option<NodeAttributeAssignment>> {
    let mut stmt = conn.prepare(&format!("{ASSIGNMENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_assignment_row(row)?));
    }
    Ok(None)
}

fn parse_attribute_row(row: &Row<'_>) -> GraphResult<Attribute> {
    let id_text: String = row.get("id")?;
    let data_type_text: String = row.get("data_type")?;
    Ok(Attribute {
        id: parse_uuid(&id_text, "attributes.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        data_type: parse_data_type(&data_type_text)?,
        allowed_values: Vec::new(),
        unit: row.get("unit")?,
        applicable_node_types: Vec::new(),
    })
}

fn parse_assignment_row(row: &Row<'_>) -> GraphResult<NodeAttributeAssignment> {
    let id_text: String = row.get("id")?;
    let node_text: String = row.get("node_id")?;
    let attribute_text: String = row.get("attribute_id")?;
    Ok(NodeAttributeAssignment {
        id: parse_uuid(&id_text, "node_attributes.id")?,
        node_id: parse_uuid(&node_text, "node_attributes.node_id")?,
        attribute_id: parse_uuid(&attribute_text, "node_attributes.attribute_id")?,
        value: row.get("value")?,
        quantifier: row.get("quantifier")?,
    })
}

fn parse_data_type(value: &str) -> GraphResult<DataType> {
    DataType::parse(value).ok_or_else(|| {
        GraphError::InvalidData(format!("invalid data type `{value}` in attributes.data_type"))
    })
}
