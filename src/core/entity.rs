//! Entity model consumed by the document normalizer
//!
//! Entities are owned by an external store and shared as `Arc<Entity>`;
//! normalization never mutates them.

use crate::core::cache::{CacheableMetadata, MaxAge};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kind of entity, which decides how it is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Fieldable content (nodes, users, terms...) with relationships
    #[default]
    Content,

    /// Configuration object: flat properties, no relationships
    Config,
}

/// Reference to an entity by type and internal id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    /// The entity type (e.g., "node", "taxonomy_term")
    pub entity_type_id: String,

    /// The internal (storage) id, not the public uuid
    pub id: String,
}

impl EntityKey {
    pub fn new(entity_type_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type_id: entity_type_id.into(),
            id: id.into(),
        }
    }
}

/// Stored value of one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldItemList {
    /// A plain value exposed as an attribute
    Value(Value),

    /// Ordered references to other entities
    References(Vec<EntityKey>),
}

/// A domain object in the entity graph
#[derive(Debug, Clone)]
pub struct Entity {
    entity_type_id: String,
    bundle: String,
    id: Option<String>,
    uuid: Uuid,
    label: Option<String>,
    kind: EntityKind,
    published: bool,
    fields: IndexMap<String, FieldItemList>,
    cacheability: CacheableMetadata,
}

impl Entity {
    /// Create a new, unsaved content entity with a random uuid
    pub fn new(entity_type_id: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            entity_type_id: entity_type_id.into(),
            bundle: bundle.into(),
            id: None,
            uuid: Uuid::new_v4(),
            label: None,
            kind: EntityKind::Content,
            published: true,
            fields: IndexMap::new(),
            cacheability: CacheableMetadata::new(),
        }
    }

    // === Builder ===

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the entity as unpublished
    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_references(
        mut self,
        name: impl Into<String>,
        references: impl IntoIterator<Item = EntityKey>,
    ) -> Self {
        self.set_references(name, references);
        self
    }

    /// Add cache tags on top of the entity's own `{type}:{id}` tag
    pub fn with_cache_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cacheability.add_tags(tags);
        self
    }

    pub fn with_cache_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cacheability.add_contexts(contexts);
        self
    }

    pub fn with_max_age(mut self, max_age: MaxAge) -> Self {
        self.cacheability.merge_max_age(max_age);
        self
    }

    // === Mutation (unsaved entities only) ===

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields
            .insert(name.into(), FieldItemList::Value(value.into()));
    }

    pub fn set_references(
        &mut self,
        name: impl Into<String>,
        references: impl IntoIterator<Item = EntityKey>,
    ) {
        self.fields.insert(
            name.into(),
            FieldItemList::References(references.into_iter().collect()),
        );
    }

    /// Assign the storage id; used by stores when saving a new entity
    pub fn assign_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    // === Accessors ===

    pub fn entity_type_id(&self) -> &str {
        &self.entity_type_id
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// Internal storage id, `None` until the entity has been saved
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Key of a saved entity
    pub fn key(&self) -> Option<EntityKey> {
        self.id
            .as_ref()
            .map(|id| EntityKey::new(self.entity_type_id.clone(), id.clone()))
    }

    /// Fields in canonical (insertion) order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldItemList)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, name: &str) -> Option<&FieldItemList> {
        self.fields.get(name)
    }

    /// Attribute value of a field, `None` for missing or reference fields
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name) {
            Some(FieldItemList::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// References held by a field, empty for missing or value fields
    pub fn references(&self, name: &str) -> &[EntityKey] {
        match self.fields.get(name) {
            Some(FieldItemList::References(keys)) => keys,
            _ => &[],
        }
    }

    /// Cache tag identifying this entity, once saved
    ///
    /// Content entities use `{type}:{id}`, config entities
    /// `config:{type}.{id}`.
    pub fn cache_tag(&self) -> Option<String> {
        let id = self.id.as_ref()?;
        Some(match self.kind {
            EntityKind::Content => format!("{}:{}", self.entity_type_id, id),
            EntityKind::Config => format!("config:{}.{}", self.entity_type_id, id),
        })
    }

    /// Cache metadata this entity contributes to any document it appears in
    pub fn cacheability(&self) -> CacheableMetadata {
        let mut metadata = self.cacheability.clone();
        if let Some(tag) = self.cache_tag() {
            metadata.add_tags([tag]);
        }
        metadata
    }
}
