//! Entity normalization
//!
//! Builds the resource object of an entity that already passed the access
//! gate. Content entities expose attributes and relationships; config
//! entities are flat property bags.

use crate::core::entity::Entity;
use crate::core::error::JsonApiError;
use crate::core::identifier::ResourceIdentifier;
use crate::normalizer::ResolutionContext;
use crate::normalizer::document::{ResourceLinks, ResourceObject};
use crate::normalizer::fields::select_fields;
use crate::normalizer::relationship;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Normalize a content entity located at `pointer` in the document
///
/// Selected attribute fields without a stored value normalize to `null`.
pub fn normalize_content(
    entity: &Arc<Entity>,
    pointer: &str,
    ctx: &mut ResolutionContext<'_>,
) -> Result<ResourceObject, JsonApiError> {
    let resource_type = ctx.resource_type_of(entity)?;
    let identifier = ResourceIdentifier::from_entity(entity)?;

    let mut attributes = IndexMap::new();
    let mut relationships = IndexMap::new();

    for field in select_fields(resource_type, ctx.fieldsets()) {
        if field.is_relationship() {
            let resolved = relationship::resolve(entity, field, pointer, ctx)?;
            relationships.insert(field.name.clone(), resolved.object);
        } else {
            let value = entity.attribute(&field.name).cloned().unwrap_or(Value::Null);
            attributes.insert(field.name.clone(), value);
        }
    }

    Ok(ResourceObject {
        type_name: identifier.type_name,
        id: identifier.id,
        attributes,
        relationships,
        links: Some(self_link(entity, ctx)),
    })
}

/// Normalize a config entity
///
/// Every selected property the entity actually holds becomes an attribute.
pub fn normalize_config(
    entity: &Arc<Entity>,
    ctx: &mut ResolutionContext<'_>,
) -> Result<ResourceObject, JsonApiError> {
    let resource_type = ctx.resource_type_of(entity)?;
    let identifier = ResourceIdentifier::from_entity(entity)?;

    let attributes = select_fields(resource_type, ctx.fieldsets())
        .into_iter()
        .filter_map(|field| {
            entity
                .attribute(&field.name)
                .map(|value| (field.name.clone(), value.clone()))
        })
        .collect();

    Ok(ResourceObject {
        type_name: identifier.type_name,
        id: identifier.id,
        attributes,
        relationships: IndexMap::new(),
        links: Some(self_link(entity, ctx)),
    })
}

fn self_link(entity: &Entity, ctx: &ResolutionContext<'_>) -> ResourceLinks {
    ResourceLinks {
        self_link: ctx.links().entity_link(entity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::access::{AllowAll, DEFAULT_ACCESS_DENIED_MESSAGE};
    use crate::core::entity::EntityKind;
    use crate::core::query::SparseFieldsets;
    use crate::normalizer::test_support::Fixture;
    use serde_json::json;

    #[test]
    fn test_content_entity_attributes_and_relationships() {
        let fixture = Fixture::new();
        let author = fixture.save(Entity::new("user", "user").with_attribute("name", "user1"));
        let node = fixture.save(
            Entity::new("node", "article")
                .with_attribute("title", "dummy_title")
                .with_references("uid", [author.key().unwrap()]),
        );

        let fieldsets = SparseFieldsets::new();
        let mut ctx =
            ResolutionContext::new(fixture.collaborators(&AllowAll), &fieldsets, DEFAULT_ACCESS_DENIED_MESSAGE);

        let resource = normalize_content(&node, "/data", &mut ctx).unwrap();
        assert_eq!(resource.type_name, "node--article");
        assert_eq!(resource.id, node.uuid());
        assert_eq!(resource.attributes["title"], json!("dummy_title"));
        assert_eq!(resource.attributes["body"], Value::Null);
        assert!(!resource.attributes.contains_key("revision_log"));

        let names: Vec<_> = resource.relationships.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["uid", "field_tags"]);
        assert_eq!(
            resource.links.unwrap().self_link,
            format!("http://localhost/jsonapi/node/article/{}", node.uuid())
        );
    }

    #[test]
    fn test_content_entity_sparse_fieldset() {
        let fixture = Fixture::new();
        let node = fixture.save(Entity::new("node", "article").with_attribute("title", "x"));

        let fieldsets = SparseFieldsets::new().with("node--article", ["title"]);
        let mut ctx =
            ResolutionContext::new(fixture.collaborators(&AllowAll), &fieldsets, DEFAULT_ACCESS_DENIED_MESSAGE);

        let resource = normalize_content(&node, "/data", &mut ctx).unwrap();
        assert_eq!(resource.attributes.len(), 1);
        assert!(resource.relationships.is_empty());
    }

    #[test]
    fn test_config_entity_is_flat() {
        let fixture = Fixture::new();
        let node_type = fixture.save(
            Entity::new("node_type", "node_type")
                .with_kind(EntityKind::Config)
                .with_attribute("name", "Article"),
        );

        let fieldsets = SparseFieldsets::new();
        let mut ctx =
            ResolutionContext::new(fixture.collaborators(&AllowAll), &fieldsets, DEFAULT_ACCESS_DENIED_MESSAGE);

        let resource = normalize_config(&node_type, &mut ctx).unwrap();
        assert_eq!(resource.type_name, "node_type--node_type");
        assert_eq!(resource.attributes.len(), 1);
        assert_eq!(resource.attributes["name"], json!("Article"));
        assert!(resource.relationships.is_empty());
    }

    #[test]
    fn test_unknown_resource_type() {
        let fixture = Fixture::new();
        let page = Arc::new(Entity::new("node", "page"));

        let fieldsets = SparseFieldsets::new();
        let mut ctx =
            ResolutionContext::new(fixture.collaborators(&AllowAll), &fieldsets, DEFAULT_ACCESS_DENIED_MESSAGE);

        let err = normalize_content(&page, "/data", &mut ctx).unwrap_err();
        assert!(matches!(err, JsonApiError::UnknownResourceType { .. }));
    }
}
