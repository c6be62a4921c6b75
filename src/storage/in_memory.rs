//! In-memory entity store for testing and development

use crate::core::entity::{Entity, EntityKey};
use crate::core::service::{EntityLoader, EntityStorage};
use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct StoreState {
    /// Entities in insertion order
    entities: IndexMap<EntityKey, Arc<Entity>>,
    uuids: HashMap<(String, Uuid), EntityKey>,
    last_ids: HashMap<String, u64>,
}

/// In-memory entity store
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
/// New entities get sequential numeric ids per entity type, starting at 1.
#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryEntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities
    pub fn len(&self) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(state.entities.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl EntityLoader for InMemoryEntityStore {
    fn load(&self, key: &EntityKey) -> Result<Option<Arc<Entity>>> {
        let state = self
            .state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(state.entities.get(key).cloned())
    }

    fn load_by_uuid(&self, entity_type_id: &str, uuid: &Uuid) -> Result<Option<Arc<Entity>>> {
        let state = self
            .state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(state
            .uuids
            .get(&(entity_type_id.to_string(), *uuid))
            .and_then(|key| state.entities.get(key))
            .cloned())
    }

    fn load_bundle(&self, entity_type_id: &str, bundle: &str) -> Result<Vec<Arc<Entity>>> {
        let state = self
            .state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(state
            .entities
            .values()
            .filter(|e| e.entity_type_id() == entity_type_id && e.bundle() == bundle)
            .cloned()
            .collect())
    }
}

impl EntityStorage for InMemoryEntityStore {
    /// Save an entity, assigning an id to new ones
    ///
    /// Saving an entity whose id is already stored replaces it.
    fn save(&self, mut entity: Entity) -> Result<Arc<Entity>> {
        let mut state = self
            .state
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if entity.is_new() {
            let entity_type_id = entity.entity_type_id().to_string();
            let mut next = state.last_ids.get(&entity_type_id).copied().unwrap_or(0);
            loop {
                next += 1;
                let key = EntityKey::new(entity_type_id.clone(), next.to_string());
                if !state.entities.contains_key(&key) {
                    break;
                }
            }
            state.last_ids.insert(entity_type_id, next);
            entity.assign_id(next.to_string());
        }

        let key = entity
            .key()
            .ok_or_else(|| anyhow!("Entity has no id after save"))?;
        let uuid_key = (entity.entity_type_id().to_string(), entity.uuid());

        if let Some(existing) = state.uuids.get(&uuid_key).filter(|k| **k != key) {
            return Err(anyhow!(
                "Entity with uuid {} already exists as {}:{}",
                entity.uuid(),
                existing.entity_type_id,
                existing.id
            ));
        }

        if let Some(previous) = state.entities.get(&key) {
            let previous_uuid = (previous.entity_type_id().to_string(), previous.uuid());
            state.uuids.remove(&previous_uuid);
        }

        let entity = Arc::new(entity);
        state.uuids.insert(uuid_key, key.clone());
        state.entities.insert(key, Arc::clone(&entity));

        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_assigns_sequential_ids_per_type() {
        let store = InMemoryEntityStore::new();

        let first = store.save(Entity::new("node", "article")).unwrap();
        let second = store.save(Entity::new("node", "page")).unwrap();
        let user = store.save(Entity::new("user", "user")).unwrap();

        assert_eq!(first.id(), Some("1"));
        assert_eq!(second.id(), Some("2"));
        assert_eq!(user.id(), Some("1"));
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_save_skips_ids_taken_explicitly() {
        let store = InMemoryEntityStore::new();
        store.save(Entity::new("node", "article").with_id("1")).unwrap();

        let next = store.save(Entity::new("node", "article")).unwrap();
        assert_eq!(next.id(), Some("2"));
    }

    #[test]
    fn test_load_by_key_and_uuid() {
        let store = InMemoryEntityStore::new();
        let saved = store.save(Entity::new("taxonomy_term", "tags")).unwrap();

        let by_key = store.load(&saved.key().unwrap()).unwrap().unwrap();
        assert_eq!(by_key.uuid(), saved.uuid());

        let by_uuid = store
            .load_by_uuid("taxonomy_term", &saved.uuid())
            .unwrap()
            .unwrap();
        assert_eq!(by_uuid.id(), Some("1"));

        assert!(store.load_by_uuid("node", &saved.uuid()).unwrap().is_none());
        assert!(store.load(&EntityKey::new("taxonomy_term", "2")).unwrap().is_none());
    }

    #[test]
    fn test_load_bundle_keeps_insertion_order() {
        let store = InMemoryEntityStore::new();
        let a = store.save(Entity::new("node", "article")).unwrap();
        store.save(Entity::new("node", "page")).unwrap();
        let b = store.save(Entity::new("node", "article")).unwrap();

        let articles = store.load_bundle("node", "article").unwrap();
        let uuids: Vec<_> = articles.iter().map(|e| e.uuid()).collect();
        assert_eq!(uuids, vec![a.uuid(), b.uuid()]);
    }

    #[test]
    fn test_save_replaces_existing_id() {
        let store = InMemoryEntityStore::new();
        let saved = store
            .save(Entity::new("node", "article").with_attribute("title", "old"))
            .unwrap();

        let updated = Entity::new("node", "article")
            .with_id("1")
            .with_uuid(saved.uuid())
            .with_attribute("title", "new");
        store.save(updated).unwrap();

        let loaded = store.load(&saved.key().unwrap()).unwrap().unwrap();
        assert_eq!(loaded.attribute("title").unwrap(), "new");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_replacement_drops_previous_uuid() {
        let store = InMemoryEntityStore::new();
        let original = store.save(Entity::new("node", "article")).unwrap();

        let replacement = store
            .save(Entity::new("node", "article").with_id("1"))
            .unwrap();
        assert_ne!(replacement.uuid(), original.uuid());

        assert!(store.load_by_uuid("node", &original.uuid()).unwrap().is_none());
        let loaded = store
            .load_by_uuid("node", &replacement.uuid())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id(), Some("1"));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_uuid_is_rejected() {
        let store = InMemoryEntityStore::new();
        let saved = store.save(Entity::new("node", "article")).unwrap();

        let duplicate = Entity::new("node", "article").with_uuid(saved.uuid());
        assert!(store.save(duplicate).is_err());
    }
}
