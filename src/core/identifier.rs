//! Resource identifiers (`{type, id}`)

use crate::core::entity::Entity;
use crate::core::error::JsonApiError;
use crate::core::member_name::is_valid_member_name;
use crate::core::resource_type::type_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Canonical identifier of a resource
///
/// Also serves as the dedup key for compound documents: two resource
/// objects are the same resource iff their identifiers are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: Uuid,
}

impl ResourceIdentifier {
    /// Build the identifier of an entity
    ///
    /// The type is `{entity_type}--{bundle}` and must be a valid member name.
    pub fn from_entity(entity: &Entity) -> Result<Self, JsonApiError> {
        let type_name = type_name(entity.entity_type_id(), entity.bundle());
        if !is_valid_member_name(&type_name) {
            return Err(JsonApiError::MalformedMemberName {
                name: type_name,
                context: "resource identifier".to_string(),
            });
        }
        Ok(Self {
            type_name,
            id: entity.uuid(),
        })
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.type_name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entity() {
        let entity = Entity::new("taxonomy_term", "tags");
        let identifier = ResourceIdentifier::from_entity(&entity).unwrap();

        assert_eq!(identifier.type_name, "taxonomy_term--tags");
        assert_eq!(identifier.id, entity.uuid());
        assert_eq!(
            identifier.to_string(),
            format!("/taxonomy_term--tags/{}", entity.uuid())
        );
    }

    #[test]
    fn test_rejects_invalid_type() {
        let entity = Entity::new("node", "bad.bundle");
        let err = ResourceIdentifier::from_entity(&entity).unwrap_err();
        assert!(matches!(err, JsonApiError::MalformedMemberName { .. }));
    }

    #[test]
    fn test_serializes_type_member() {
        let entity = Entity::new("user", "user");
        let json = serde_json::to_value(ResourceIdentifier::from_entity(&entity).unwrap()).unwrap();

        assert_eq!(json["type"], "user--user");
        assert_eq!(json["id"], entity.uuid().to_string());
    }
}
