//! Entity access gate
//!
//! The normalizer never decides access itself. It asks an injected
//! [`AccessCheck`] and, on denial, records an [`AccessError`] and leaves a
//! null placeholder where the resource would have been.

use crate::core::cache::CacheableMetadata;
use crate::core::entity::Entity;
use crate::core::resource_type::type_name;
use axum::http::StatusCode;
use uuid::Uuid;

/// Message used for every access denial unless the caller overrides it
pub const DEFAULT_ACCESS_DENIED_MESSAGE: &str =
    "The current user is not allowed to GET the selected resource.";

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
    Allowed,
    Denied { reason: Option<String> },
}

impl AccessResult {
    pub fn allowed() -> Self {
        AccessResult::Allowed
    }

    pub fn denied() -> Self {
        AccessResult::Denied { reason: None }
    }

    pub fn denied_because(reason: impl Into<String>) -> Self {
        AccessResult::Denied {
            reason: Some(reason.into()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessResult::Allowed)
    }
}

/// Capability deciding whether the current user may view an entity
pub trait AccessCheck: Send + Sync {
    fn check(&self, entity: &Entity) -> AccessResult;

    /// Cache metadata the decision depends on (e.g. the user's roles)
    fn cacheability(&self) -> CacheableMetadata {
        CacheableMetadata::new()
    }
}

impl<F> AccessCheck for F
where
    F: Fn(&Entity) -> AccessResult + Send + Sync,
{
    fn check(&self, entity: &Entity) -> AccessResult {
        self(entity)
    }
}

/// Access check granting everything (development and trusted callers)
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessCheck for AllowAll {
    fn check(&self, _entity: &Entity) -> AccessResult {
        AccessResult::Allowed
    }
}

/// A denied entity, located within the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessError {
    pub entity_type_id: String,
    pub bundle: String,
    pub uuid: Uuid,
    /// JSON pointer to the null placeholder, e.g. `/data/relationships/uid/data`
    pub pointer: String,
    pub reason: Option<String>,
}

impl AccessError {
    pub fn new(entity: &Entity, pointer: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            entity_type_id: entity.entity_type_id().to_string(),
            bundle: entity.bundle().to_string(),
            uuid: entity.uuid(),
            pointer: pointer.into(),
            reason,
        }
    }

    /// Error id: `/{entity_type}--{bundle}/{uuid}`
    pub fn error_id(&self) -> String {
        format!("/{}/{}", type_name(&self.entity_type_id, &self.bundle), self.uuid)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_result_helpers() {
        assert!(AccessResult::allowed().is_allowed());
        assert!(!AccessResult::denied().is_allowed());
        assert_eq!(
            AccessResult::denied_because("unpublished"),
            AccessResult::Denied {
                reason: Some("unpublished".to_string())
            }
        );
    }

    #[test]
    fn test_closure_access_check() {
        let check = |entity: &Entity| {
            if entity.is_published() {
                AccessResult::Allowed
            } else {
                AccessResult::denied_because("unpublished")
            }
        };

        assert!(check.check(&Entity::new("node", "article")).is_allowed());
        assert!(!check.check(&Entity::new("node", "article").unpublished()).is_allowed());
        assert!(check.cacheability().is_empty());
    }

    #[test]
    fn test_access_error_id() {
        let entity = Entity::new("taxonomy_term", "tags");
        let error = AccessError::new(&entity, "/data/relationships/field_tags/data/1", None);

        assert_eq!(error.error_id(), format!("/taxonomy_term--tags/{}", entity.uuid()));
        assert_eq!(error.status(), StatusCode::FORBIDDEN);
        assert_eq!(error.pointer, "/data/relationships/field_tags/data/1");
    }
}
