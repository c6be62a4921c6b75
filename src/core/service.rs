//! Collaborator traits consumed by the normalizer
//!
//! Entity loading and URL generation live outside the engine. The engine is
//! synchronous and agnostic to whether these calls hit a cache or storage;
//! any failure is surfaced immediately, never retried.

use crate::core::entity::{Entity, EntityKey};
use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Loads entities from the external store
pub trait EntityLoader: Send + Sync {
    /// Load an entity by its internal key
    fn load(&self, key: &EntityKey) -> Result<Option<Arc<Entity>>>;

    /// Load an entity by entity type and public uuid
    fn load_by_uuid(&self, entity_type_id: &str, uuid: &Uuid) -> Result<Option<Arc<Entity>>>;

    /// Load all entities of a bundle, in storage order
    fn load_bundle(&self, entity_type_id: &str, bundle: &str) -> Result<Vec<Arc<Entity>>>;
}

/// Entity store that can also save new entities
pub trait EntityStorage: EntityLoader {
    /// Save a new entity, assigning its storage id
    fn save(&self, entity: Entity) -> Result<Arc<Entity>>;
}

/// Generates URLs for resources and relationships
pub trait LinkGenerator: Send + Sync {
    /// Canonical URL of a resource
    fn entity_link(&self, entity: &Entity) -> String;

    /// URL of a relationship's linkage (`.../relationships/{field}`)
    fn relationship_link(&self, host: &Entity, field: &str) -> String;

    /// URL of a relationship's related resources (`.../{field}`)
    fn related_link(&self, host: &Entity, field: &str) -> String;
}
