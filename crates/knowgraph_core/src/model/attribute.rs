//! Attribute definitions, node assignments and value validation.
//!
//! # Responsibility
//! - Define typed attributes and the assignments binding values to nodes.
//! - Provide the single validation gate every attribute write passes.
//!
//! # Invariants
//! - `allowed_values` and `applicable_node_types` keep caller order.
//! - `allowed_values` only constrains [`DataType::Enum`].

use crate::model::node::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type AttributeId = Uuid;
pub type AssignmentId = Uuid;

static INTEGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid integer regex"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

/// Value contract of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Base-10 integer.
    Integer,
    /// Decimal number.
    Float,
    /// `true|false|1|0`, case-insensitive.
    Boolean,
    /// `YYYY-MM-DD` shape. Calendar validity is not checked.
    Date,
    /// Any non-blank text.
    Array,
    /// Free text.
    String,
    /// One of `allowed_values`, or free text when none are declared.
    Enum,
}

impl DataType {
    pub const ALL: [DataType; 7] = [
        DataType::Integer,
        DataType::Float,
        DataType::Boolean,
        DataType::Date,
        DataType::Array,
        DataType::String,
        DataType::Enum,
    ];

    /// Stable label used in storage and serialized payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Array => "array",
            Self::String => "string",
            Self::Enum => "enum",
        }
    }

    /// Parses a stored or user-supplied label. Unknown labels yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let folded = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|data_type| data_type.as_str() == folded)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named, typed property definable on nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    pub description: String,
    pub data_type: DataType,
    pub allowed_values: Vec<String>,
    pub unit: Option<String>,
    /// Node-category labels, returned verbatim.
    pub applicable_node_types: Vec<String>,
}

/// Input for attribute create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data_type: DataType,
    #[serde(default)]
    pub allowed_values: Vec<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub applicable_node_types: Vec<String>,
}

impl AttributeDraft {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            data_type,
            allowed_values: Vec::new(),
            unit: None,
            applicable_node_types: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_node_types<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applicable_node_types = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Boundary cleanup: trims text fields and drops blank list entries while
    /// keeping list order.
    pub(crate) fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            data_type: self.data_type,
            allowed_values: clean_list(&self.allowed_values),
            unit: self
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|unit| !unit.is_empty())
                .map(str::to_string),
            applicable_node_types: clean_list(&self.applicable_node_types),
        }
    }
}

/// Value bound to one node for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributeAssignment {
    pub id: AssignmentId,
    pub node_id: NodeId,
    pub attribute_id: AttributeId,
    pub value: String,
    pub quantifier: Option<String>,
}

/// Assignment joined with the attribute fields callers usually render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributeView {
    #[serde(flatten)]
    pub assignment: NodeAttributeAssignment,
    pub attribute_name: String,
    pub data_type: DataType,
    pub unit: Option<String>,
}

/// Attributes assignable to a node, split by provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossibleAttributes {
    /// Declared on the node itself.
    pub direct: Vec<Attribute>,
    /// Declared on ancestors reached through `is_a` links.
    pub inherited: Vec<Attribute>,
}

/// Splits a `;`-separated allowed-values string.
///
/// Each element is trimmed; empty elements are discarded.
pub fn parse_allowed_values(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Checks `value` against an attribute's value contract.
///
/// Total and side-effect free. `allowed_values` is consulted only for
/// [`DataType::Enum`], where an empty list accepts anything.
pub fn validate_attribute_value(
    data_type: DataType,
    value: &str,
    allowed_values: &[String],
) -> bool {
    match data_type {
        DataType::Integer => INTEGER_RE.is_match(value.trim()),
        DataType::Float => value.trim().parse::<f64>().is_ok(),
        DataType::Boolean => matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "false" | "1" | "0"
        ),
        DataType::Date => DATE_RE.is_match(value),
        DataType::Array => !value.trim().is_empty(),
        DataType::String => true,
        DataType::Enum => {
            allowed_values.is_empty() || allowed_values.iter().any(|allowed| allowed == value)
        }
    }
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}
