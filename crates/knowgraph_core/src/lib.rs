//! Core of the knowledge-graph service.
//!
//! Owns the graph store and its consistency rules, attribute validation and
//! inheritance, and the text annotation pipeline. Transport layers call into
//! the services re-exported here.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod nlp;
pub mod repo;
pub mod service;
pub mod summary;

pub use config::CoreConfig;
pub use db::{inspect_schema, open_db, open_db_in_memory, DbError, DbResult, SchemaStatus};
pub use error::{EntityKind, GraphError, GraphResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attribute::{
    parse_allowed_values, validate_attribute_value, AssignmentId, Attribute, AttributeDraft,
    AttributeId, DataType, NodeAttributeAssignment, NodeAttributeView, PossibleAttributes,
};
pub use model::node::{Node, NodeId, NodeUpdate};
pub use model::relation::{
    normalize_relation_name, NeighborEdge, Neighborhood, NewRelation, Relation, RelationId,
    RelationType, RelationTypeDraft, RelationTypeId, RelationView,
};
pub use nlp::{AnnotateError, Annotation, ParsedLabel, TagError, TaggedText, Tagger};
pub use repo::attribute_repo::{AttributeRepository, SqliteAttributeRepository};
pub use repo::graph_repo::{GraphRepository, SqliteGraphRepository};
pub use service::annotation_service::AnnotationService;
pub use service::attribute_service::AttributeService;
pub use service::graph_service::GraphService;
pub use summary::{summary_prompt, FixedSummary, SummaryError, SummaryGenerator};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
