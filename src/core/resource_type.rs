//! Resource types and their repository
//!
//! A resource type binds an (entity type, bundle) pair to the public
//! `{entity_type}--{bundle}` type name and lists its fields in canonical
//! order.

use crate::core::entity::{Entity, EntityKind};
use crate::core::error::JsonApiError;
use crate::core::field::FieldDefinition;
use crate::core::member_name::is_valid_member_name;
use indexmap::IndexMap;

/// Compute the public type name of an (entity type, bundle) pair
pub fn type_name(entity_type_id: &str, bundle: &str) -> String {
    format!("{}--{}", entity_type_id, bundle)
}

/// Split a public type name back into (entity type, bundle)
pub fn split_type_name(type_name: &str) -> Option<(&str, &str)> {
    type_name.split_once("--")
}

/// A JSON:API resource type
#[derive(Debug, Clone)]
pub struct ResourceType {
    entity_type_id: String,
    bundle: String,
    kind: EntityKind,
    type_name: String,
    fields: IndexMap<String, FieldDefinition>,
}

impl ResourceType {
    /// Create a resource type, validating every member name it exposes
    pub fn new(
        entity_type_id: impl Into<String>,
        bundle: impl Into<String>,
        kind: EntityKind,
        fields: impl IntoIterator<Item = FieldDefinition>,
    ) -> Result<Self, JsonApiError> {
        let entity_type_id = entity_type_id.into();
        let bundle = bundle.into();
        let type_name = type_name(&entity_type_id, &bundle);

        if !is_valid_member_name(&type_name) {
            return Err(JsonApiError::MalformedMemberName {
                name: type_name,
                context: "resource type".to_string(),
            });
        }

        let mut by_name = IndexMap::new();
        for field in fields {
            if !is_valid_member_name(&field.name) {
                return Err(JsonApiError::MalformedMemberName {
                    name: field.name,
                    context: format!("fields of '{}'", type_name),
                });
            }
            if kind == EntityKind::Config && field.is_relationship() {
                return Err(JsonApiError::Config(format!(
                    "config resource type '{}' cannot declare relationship '{}'",
                    type_name, field.name
                )));
            }
            by_name.insert(field.name.clone(), field);
        }

        Ok(Self {
            entity_type_id,
            bundle,
            kind,
            type_name,
            fields: by_name,
        })
    }

    pub fn entity_type_id(&self) -> &str {
        &self.entity_type_id
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Public type name, e.g. "node--article"
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// All field definitions in canonical order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Relationship field by name
    pub fn relationship(&self, name: &str) -> Option<&FieldDefinition> {
        self.field(name).filter(|f| f.is_relationship())
    }

    /// Whether an entity belongs to this resource type
    pub fn matches(&self, entity: &Entity) -> bool {
        entity.entity_type_id() == self.entity_type_id && entity.bundle() == self.bundle
    }
}

/// Lookup of resource types by key or public name
pub trait ResourceTypeRepository: Send + Sync {
    /// Get the resource type for an (entity type, bundle) pair
    fn get(&self, entity_type_id: &str, bundle: &str) -> Option<&ResourceType>;

    /// Get a resource type by its public name
    fn get_by_type_name(&self, type_name: &str) -> Option<&ResourceType>;

    /// All registered resource types
    fn all(&self) -> Vec<&ResourceType>;

    /// Resource type of an entity
    fn for_entity(&self, entity: &Entity) -> Result<&ResourceType, JsonApiError> {
        self.get(entity.entity_type_id(), entity.bundle())
            .ok_or_else(|| JsonApiError::UnknownResourceType {
                type_name: type_name(entity.entity_type_id(), entity.bundle()),
            })
    }
}

/// In-process resource type registry
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeRegistry {
    types: IndexMap<String, ResourceType>,
}

impl ResourceTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type, replacing any previous one of the same name
    pub fn register(&mut self, resource_type: ResourceType) {
        self.types
            .insert(resource_type.type_name().to_string(), resource_type);
    }

    pub fn with(mut self, resource_type: ResourceType) -> Self {
        self.register(resource_type);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ResourceTypeRepository for ResourceTypeRegistry {
    fn get(&self, entity_type_id: &str, bundle: &str) -> Option<&ResourceType> {
        self.types.get(&type_name(entity_type_id, bundle))
    }

    fn get_by_type_name(&self, type_name: &str) -> Option<&ResourceType> {
        self.types.get(type_name)
    }

    fn all(&self) -> Vec<&ResourceType> {
        self.types.values().collect()
    }
}
