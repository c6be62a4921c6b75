//! Field definitions and relationship cardinality

use serde::{Deserialize, Serialize};

/// How many entities a relationship field may reference
///
/// Decides the document shape: `One` serializes as an identifier or null,
/// `Many`/`Unlimited` always serialize as an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
    #[default]
    Unlimited,
}

impl Cardinality {
    /// Whether the relationship resolves to a single identifier-or-null
    pub fn is_single(&self) -> bool {
        matches!(self, Cardinality::One)
    }
}

/// Relationship-specific part of a field definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    #[serde(default)]
    pub cardinality: Cardinality,

    /// Resource type names this field may point to (empty = any)
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Definition of one field of a resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field (member) name, e.g. "title" or "field_tags"
    pub name: String,

    /// Present when the field references other entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipDefinition>,

    /// Internal fields are never normalized
    #[serde(default)]
    pub internal: bool,

    /// Whether clients may set the field when creating a resource
    #[serde(default = "default_writable")]
    pub writable: bool,
}

fn default_writable() -> bool {
    true
}

impl FieldDefinition {
    /// Create an attribute field
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relationship: None,
            internal: false,
            writable: true,
        }
    }

    /// Create a relationship field
    pub fn relationship(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            relationship: Some(RelationshipDefinition {
                cardinality,
                targets: Vec::new(),
            }),
            internal: false,
            writable: true,
        }
    }

    /// Restrict the resource types a relationship may point to
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(relationship) = self.relationship.as_mut() {
            relationship.targets = targets.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn is_relationship(&self) -> bool {
        self.relationship.is_some()
    }

    /// Cardinality of a relationship field
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.relationship.as_ref().map(|r| r.cardinality)
    }

    /// Whether a relationship may point to the given resource type
    pub fn accepts_target(&self, type_name: &str) -> bool {
        match &self.relationship {
            Some(relationship) => {
                relationship.targets.is_empty()
                    || relationship.targets.iter().any(|t| t == type_name)
            }
            None => false,
        }
    }
}
