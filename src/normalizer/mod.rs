//! Document normalization engine
//!
//! Turns a view of the entity graph into a JSON:API document:
//!
//! - [`fields`]: sparse fieldset selection
//! - [`relationship`]: relationship linkage, cardinality and access outcomes
//! - [`include`]: include-path parsing and compound document resolution
//! - [`assembler`]: top-level orchestration and denormalization
//!
//! Every call threads one [`ResolutionContext`] by `&mut` reference. The
//! context owns the request's cache metadata and access errors and is
//! dropped once the document is assembled; nothing is shared between
//! requests.

pub mod assembler;
pub mod denormalizer;
pub mod document;
pub mod entity;
pub mod error;
pub mod fields;
pub mod include;
pub mod relationship;

#[cfg(test)]
pub(crate) mod test_support;

use crate::core::access::{AccessCheck, AccessError, AccessResult};
use crate::core::cache::CacheableMetadata;
use crate::core::entity::{Entity, EntityKey, EntityKind};
use crate::core::error::JsonApiError;
use crate::core::query::SparseFieldsets;
use crate::core::resource_type::{ResourceType, ResourceTypeRepository};
use crate::core::service::{EntityLoader, LinkGenerator};
use document::{RelationshipObject, ResourceObject};
use error::ErrorObject;
use relationship::Relationship;
use std::collections::HashSet;
use std::sync::Arc;

pub use assembler::{DocumentAssembler, DocumentRequest, PrimaryData, ResourceResponse};
pub use document::{Document, ErrorDocument, JSONAPI_MEDIA_TYPE};
pub use include::IncludeTree;

/// The external capabilities the engine calls into
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub resource_types: &'a dyn ResourceTypeRepository,
    pub loader: &'a dyn EntityLoader,
    pub access: &'a dyn AccessCheck,
    pub links: &'a dyn LinkGenerator,
}

/// Per-request state threaded through every normalization call
pub struct ResolutionContext<'a> {
    collaborators: Collaborators<'a>,
    fieldsets: &'a SparseFieldsets,
    access_denied_message: &'a str,
    cacheability: CacheableMetadata,
    errors: Vec<AccessError>,
    reported: HashSet<String>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(
        collaborators: Collaborators<'a>,
        fieldsets: &'a SparseFieldsets,
        access_denied_message: &'a str,
    ) -> Self {
        Self {
            collaborators,
            fieldsets,
            access_denied_message,
            cacheability: CacheableMetadata::new(),
            errors: Vec::new(),
            reported: HashSet::new(),
        }
    }

    pub fn fieldsets(&self) -> &'a SparseFieldsets {
        self.fieldsets
    }

    pub fn links(&self) -> &'a dyn LinkGenerator {
        self.collaborators.links
    }

    /// Resource type of an entity
    pub fn resource_type_of(&self, entity: &Entity) -> Result<&'a ResourceType, JsonApiError> {
        self.collaborators.resource_types.for_entity(entity)
    }

    /// Whether an entity has a registered resource type
    ///
    /// Entities without one can be linked to but never rendered as
    /// resource objects.
    pub fn is_exposed(&self, entity: &Entity) -> bool {
        let exposed = self.resource_type_of(entity).is_ok();
        if !exposed {
            tracing::debug!(
                entity_type = %entity.entity_type_id(),
                bundle = %entity.bundle(),
                "entity has no resource type, not rendering it"
            );
        }
        exposed
    }

    /// Load a referenced entity
    pub fn load(&self, key: &EntityKey) -> Result<Option<Arc<Entity>>, JsonApiError> {
        Ok(self.collaborators.loader.load(key)?)
    }

    /// Record that an entity contributed to the document
    pub fn touch(&mut self, entity: &Entity) {
        self.cacheability.merge(&entity.cacheability());
    }

    /// Run the access gate for an entity placed at `pointer`
    ///
    /// The entity's cache metadata is merged whatever the outcome. A denial
    /// is recorded once per entity; later denials of the same entity (e.g.
    /// reached again through an include path) are not repeated.
    pub fn check_access(&mut self, entity: &Entity, pointer: &str) -> bool {
        self.touch(entity);

        match self.collaborators.access.check(entity) {
            AccessResult::Allowed => true,
            AccessResult::Denied { reason } => {
                let error = AccessError::new(entity, pointer, reason);
                if self.reported.insert(error.error_id()) {
                    tracing::debug!(
                        entity = %error.error_id(),
                        pointer = %error.pointer,
                        "access denied, emitting null placeholder"
                    );
                    self.errors.push(error);
                }
                false
            }
        }
    }

    /// Access errors recorded so far
    pub fn access_errors(&self) -> &[AccessError] {
        &self.errors
    }

    /// Consume the context into error objects and the drained cache metadata
    pub fn finish(mut self) -> (Vec<ErrorObject>, CacheableMetadata) {
        self.cacheability
            .merge(&self.collaborators.access.cacheability());

        let errors = self
            .errors
            .iter()
            .map(|e| ErrorObject::access_denied(e, self.access_denied_message))
            .collect();

        (errors, self.cacheability.drain())
    }
}

/// Everything the engine knows how to normalize
///
/// A closed set: each variant has exactly one normalization routine.
pub enum Normalizable<'e> {
    ContentEntity(&'e Arc<Entity>),
    ConfigEntity(&'e Arc<Entity>),
    Relationship(&'e Relationship),
    Exception(&'e JsonApiError),
}

/// Output of [`Normalizable::normalize`]
#[derive(Debug)]
pub enum Normalized {
    Resource(ResourceObject),
    Relationship(RelationshipObject),
    Errors(Vec<ErrorObject>),
}

impl<'e> Normalizable<'e> {
    /// Pick the entity variant from the entity's kind
    pub fn entity(entity: &'e Arc<Entity>) -> Self {
        match entity.kind() {
            EntityKind::Content => Normalizable::ContentEntity(entity),
            EntityKind::Config => Normalizable::ConfigEntity(entity),
        }
    }

    /// Normalize the value placed at `pointer` in the document
    ///
    /// For relationships `pointer` locates the relationship's `data` member.
    pub fn normalize(
        &self,
        pointer: &str,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Normalized, JsonApiError> {
        match self {
            Normalizable::ContentEntity(entity) => {
                entity::normalize_content(entity, pointer, ctx).map(Normalized::Resource)
            }
            Normalizable::ConfigEntity(entity) => {
                entity::normalize_config(entity, ctx).map(Normalized::Resource)
            }
            Normalizable::Relationship(relationship) => relationship
                .normalize(pointer, ctx)
                .map(|resolved| Normalized::Relationship(resolved.object)),
            Normalizable::Exception(error) => {
                Ok(Normalized::Errors(vec![ErrorObject::from_exception(error)]))
            }
        }
    }
}
