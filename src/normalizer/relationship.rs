//! Relationship resolution
//!
//! A [`Relationship`] is one reference field of a host entity with its
//! targets loaded. Normalizing it runs the access gate on every target and
//! shapes the linkage by cardinality.

use crate::core::entity::Entity;
use crate::core::error::JsonApiError;
use crate::core::field::{Cardinality, FieldDefinition};
use crate::core::identifier::ResourceIdentifier;
use crate::core::resource_type::type_name;
use crate::normalizer::ResolutionContext;
use crate::normalizer::document::{RelationshipData, RelationshipLinks, RelationshipObject};
use std::sync::{Arc, Weak};

/// A reference field of a host entity, targets loaded in stored order
#[derive(Debug)]
pub struct Relationship {
    property_name: String,
    cardinality: Cardinality,
    host: Weak<Entity>,
    targets: Vec<Option<Arc<Entity>>>,
}

/// Result of normalizing a relationship
#[derive(Debug)]
pub struct ResolvedRelationship {
    pub object: RelationshipObject,

    /// Targets that passed the access gate, in slot order
    pub visible: Vec<Arc<Entity>>,
}

impl Relationship {
    /// Load the targets of a relationship field
    ///
    /// References that no longer load keep their slot as `None`. A
    /// cardinality-one field only ever considers its first reference.
    pub fn load(
        host: &Arc<Entity>,
        definition: &FieldDefinition,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Self, JsonApiError> {
        let cardinality =
            definition
                .cardinality()
                .ok_or_else(|| JsonApiError::UnknownRelationship {
                    type_name: type_name(host.entity_type_id(), host.bundle()),
                    field: definition.name.clone(),
                })?;

        let references = host.references(&definition.name);
        let references = if cardinality.is_single() {
            &references[..references.len().min(1)]
        } else {
            references
        };

        let mut targets = Vec::with_capacity(references.len());
        for key in references {
            let target = ctx.load(key)?;
            if target.is_none() {
                tracing::debug!(
                    field = %definition.name,
                    entity_type = %key.entity_type_id,
                    id = %key.id,
                    "referenced entity not found"
                );
            }
            targets.push(target);
        }

        Ok(Self {
            property_name: definition.name.clone(),
            cardinality,
            host: Arc::downgrade(host),
            targets,
        })
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// The host entity, if it is still alive
    pub fn host(&self) -> Option<Arc<Entity>> {
        self.host.upgrade()
    }

    pub fn targets(&self) -> &[Option<Arc<Entity>>] {
        &self.targets
    }

    /// Normalize the relationship
    ///
    /// `data_pointer` locates the relationship's `data` member; denied
    /// targets are reported at `{data_pointer}/{index}`, or at
    /// `data_pointer` itself for cardinality one.
    pub fn normalize(
        &self,
        data_pointer: &str,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<ResolvedRelationship, JsonApiError> {
        let single = self.cardinality.is_single();
        let mut visible = Vec::new();
        let mut slots = Vec::with_capacity(self.targets.len());

        for (index, target) in self.targets.iter().enumerate() {
            let Some(entity) = target else {
                slots.push(None);
                continue;
            };

            let pointer = if single {
                data_pointer.to_string()
            } else {
                format!("{}/{}", data_pointer, index)
            };

            if ctx.check_access(entity, &pointer) {
                slots.push(Some(ResourceIdentifier::from_entity(entity)?));
                visible.push(Arc::clone(entity));
            } else {
                slots.push(None);
            }
        }

        let data = if single {
            RelationshipData::One(slots.into_iter().next().flatten())
        } else {
            RelationshipData::Many(slots)
        };

        let links = self.host().map(|host| RelationshipLinks {
            self_link: ctx.links().relationship_link(&host, &self.property_name),
            related: ctx.links().related_link(&host, &self.property_name),
        });

        Ok(ResolvedRelationship {
            object: RelationshipObject { data, links },
            visible,
        })
    }
}

/// Pointer to the `data` member of a relationship of the resource at `base`
pub fn data_pointer(base: &str, field: &str) -> String {
    format!("{}/relationships/{}/data", base, field)
}

/// Load and normalize one relationship field of a resource located at
/// `base_pointer`
pub fn resolve(
    host: &Arc<Entity>,
    definition: &FieldDefinition,
    base_pointer: &str,
    ctx: &mut ResolutionContext<'_>,
) -> Result<ResolvedRelationship, JsonApiError> {
    Relationship::load(host, definition, ctx)?
        .normalize(&data_pointer(base_pointer, &definition.name), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::access::{AccessResult, AllowAll, DEFAULT_ACCESS_DENIED_MESSAGE};
    use crate::core::entity::EntityKey;
    use crate::core::query::SparseFieldsets;
    use crate::core::resource_type::ResourceTypeRepository;
    use crate::normalizer::test_support::Fixture;
    use serde_json::json;

    fn deny_unpublished(entity: &Entity) -> AccessResult {
        if entity.is_published() {
            AccessResult::Allowed
        } else {
            AccessResult::denied()
        }
    }

    fn field<'a>(fixture: &'a Fixture, name: &str) -> &'a FieldDefinition {
        fixture
            .registry
            .get("node", "article")
            .and_then(|rt| rt.relationship(name))
            .unwrap()
    }

    #[test]
    fn test_many_keeps_denied_slot_as_null() {
        let fixture = Fixture::new();
        let term1 = fixture.save(Entity::new("taxonomy_term", "tags").with_attribute("name", "one"));
        let term2 = fixture.save(Entity::new("taxonomy_term", "tags").unpublished());
        let node = fixture.save(
            Entity::new("node", "article")
                .with_references("field_tags", [term1.key().unwrap(), term2.key().unwrap()]),
        );

        let fieldsets = SparseFieldsets::new();
        let access = deny_unpublished;
        let mut ctx = ResolutionContext::new(
            fixture.collaborators(&access),
            &fieldsets,
            DEFAULT_ACCESS_DENIED_MESSAGE,
        );

        let resolved = resolve(&node, field(&fixture, "field_tags"), "/data", &mut ctx).unwrap();
        let json = serde_json::to_value(&resolved.object.data).unwrap();
        assert_eq!(
            json,
            json!([{"type": "taxonomy_term--tags", "id": term1.uuid().to_string()}, null])
        );
        assert_eq!(resolved.visible.len(), 1);

        let errors = ctx.access_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].pointer, "/data/relationships/field_tags/data/1");
        assert_eq!(errors[0].uuid, term2.uuid());

        // Denied targets still contribute their cache tags
        let (_, cacheability) = ctx.finish();
        assert_eq!(cacheability.tags(), vec!["taxonomy_term:1", "taxonomy_term:2"]);
    }

    #[test]
    fn test_one_denied_target_points_at_data() {
        let fixture = Fixture::new();
        let author = fixture.save(Entity::new("user", "user").unpublished());
        let node = fixture.save(
            Entity::new("node", "article").with_references("uid", [author.key().unwrap()]),
        );

        let fieldsets = SparseFieldsets::new();
        let access = deny_unpublished;
        let mut ctx = ResolutionContext::new(
            fixture.collaborators(&access),
            &fieldsets,
            DEFAULT_ACCESS_DENIED_MESSAGE,
        );

        let resolved = resolve(&node, field(&fixture, "uid"), "/data", &mut ctx).unwrap();
        assert_eq!(resolved.object.data, RelationshipData::One(None));
        assert_eq!(ctx.access_errors()[0].pointer, "/data/relationships/uid/data");
    }

    #[test]
    fn test_cardinality_shapes_when_empty() {
        let fixture = Fixture::new();
        let node = fixture.save(Entity::new("node", "article"));

        let fieldsets = SparseFieldsets::new();
        let mut ctx =
            ResolutionContext::new(fixture.collaborators(&AllowAll), &fieldsets, DEFAULT_ACCESS_DENIED_MESSAGE);

        let uid = resolve(&node, field(&fixture, "uid"), "/data", &mut ctx).unwrap();
        assert_eq!(serde_json::to_value(&uid.object.data).unwrap(), json!(null));

        let tags = resolve(&node, field(&fixture, "field_tags"), "/data", &mut ctx).unwrap();
        assert_eq!(serde_json::to_value(&tags.object.data).unwrap(), json!([]));
    }

    #[test]
    fn test_missing_target_is_null_without_error() {
        let fixture = Fixture::new();
        let node = fixture.save(
            Entity::new("node", "article")
                .with_references("field_tags", [EntityKey::new("taxonomy_term", "404")]),
        );

        let fieldsets = SparseFieldsets::new();
        let mut ctx =
            ResolutionContext::new(fixture.collaborators(&AllowAll), &fieldsets, DEFAULT_ACCESS_DENIED_MESSAGE);

        let resolved = resolve(&node, field(&fixture, "field_tags"), "/data", &mut ctx).unwrap();
        assert_eq!(resolved.object.data, RelationshipData::Many(vec![None]));
        assert!(ctx.access_errors().is_empty());
    }

    #[test]
    fn test_relationship_links_and_weak_host() {
        let fixture = Fixture::new();
        let author = fixture.save(Entity::new("user", "user"));
        let node = Arc::new(
            Entity::new("node", "article")
                .with_id("7")
                .with_references("uid", [author.key().unwrap()]),
        );

        let fieldsets = SparseFieldsets::new();
        let mut ctx =
            ResolutionContext::new(fixture.collaborators(&AllowAll), &fieldsets, DEFAULT_ACCESS_DENIED_MESSAGE);

        let relationship = Relationship::load(&node, field(&fixture, "uid"), &ctx).unwrap();
        assert_eq!(relationship.property_name(), "uid");
        assert_eq!(relationship.cardinality(), Cardinality::One);
        assert_eq!(relationship.targets().len(), 1);

        let resolved = relationship.normalize("/data/relationships/uid/data", &mut ctx).unwrap();
        let links = resolved.object.links.unwrap();
        assert_eq!(
            links.self_link,
            format!("http://localhost/jsonapi/node/article/{}/relationships/uid", node.uuid())
        );
        assert_eq!(
            links.related,
            format!("http://localhost/jsonapi/node/article/{}/uid", node.uuid())
        );

        drop(node);
        assert!(relationship.host().is_none());
        let orphan = relationship.normalize("/data", &mut ctx).unwrap();
        assert!(orphan.object.links.is_none());
    }

    #[test]
    fn test_one_uses_first_reference_only() {
        let fixture = Fixture::new();
        let first = fixture.save(Entity::new("user", "user"));
        let second = fixture.save(Entity::new("user", "user"));
        let node = fixture.save(
            Entity::new("node", "article")
                .with_references("uid", [first.key().unwrap(), second.key().unwrap()]),
        );

        let fieldsets = SparseFieldsets::new();
        let mut ctx =
            ResolutionContext::new(fixture.collaborators(&AllowAll), &fieldsets, DEFAULT_ACCESS_DENIED_MESSAGE);

        let resolved = resolve(&node, field(&fixture, "uid"), "/data", &mut ctx).unwrap();
        assert_eq!(resolved.object.data.identifiers()[0].id, first.uuid());
        assert_eq!(resolved.visible.len(), 1);
    }
}
