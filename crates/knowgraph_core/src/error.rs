//! Graph-store error model.
//!
//! Every failure is local and non-retriable: a refused operation leaves the
//! store unchanged and carries a specific reason.

use crate::db::DbError;
use crate::model::attribute::DataType;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type GraphResult<T> = Result<T, GraphError>;

/// Entity table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Node,
    RelationType,
    Relation,
    Attribute,
    NodeAttribute,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::RelationType => "relation type",
            Self::Relation => "relation",
            Self::Attribute => "attribute",
            Self::NodeAttribute => "node attribute",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum GraphError {
    /// A node with the same case-folded title exists.
    DuplicateTitle(String),
    /// A relation type with the same case-folded name exists.
    DuplicateRelationType(String),
    /// An attribute with the same name exists.
    DuplicateAttributeName(String),
    /// Deletion blocked while `count` rows still reference the entity.
    ReferencedEntity {
        kind: EntityKind,
        id: Uuid,
        count: u64,
    },
    NotFound {
        kind: EntityKind,
        id: Uuid,
    },
    /// Value rejected by the attribute's data-type contract.
    InvalidAttributeValue {
        data_type: DataType,
    },
    /// Required title or name is blank after trimming.
    BlankName {
        kind: EntityKind,
    },
    /// The summary collaborator failed; surfaced without retry.
    GenerationFailed(String),
    Db(DbError),
    /// Connection schema is not at the migrated version this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted into a model value.
    InvalidData(String),
}

impl GraphError {
    pub(crate) fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTitle(title) => write!(f, "node with title `{title}` already exists"),
            Self::DuplicateRelationType(name) => {
                write!(f, "relation type `{name}` already exists")
            }
            Self::DuplicateAttributeName(name) => write!(f, "attribute `{name}` already exists"),
            Self::ReferencedEntity { kind, id, count } => write!(
                f,
                "{kind} {id} is referenced by {count} row(s); cannot delete"
            ),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidAttributeValue { data_type } => {
                write!(f, "value does not satisfy data type `{data_type}`")
            }
            Self::BlankName { kind } => write!(f, "{kind} name must not be blank"),
            Self::GenerationFailed(message) => write!(f, "summary generation failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "graph store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "graph store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted graph data: {message}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for GraphError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for GraphError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
