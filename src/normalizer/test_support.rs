//! Shared fixture for normalizer unit tests

use crate::core::access::AccessCheck;
use crate::core::entity::{Entity, EntityKind};
use crate::core::field::{Cardinality, FieldDefinition};
use crate::core::resource_type::{ResourceType, ResourceTypeRegistry};
use crate::core::service::EntityStorage;
use crate::links::UrlLinkGenerator;
use crate::normalizer::{Collaborators, DocumentAssembler};
use crate::storage::InMemoryEntityStore;
use std::sync::Arc;

pub(crate) struct Fixture {
    pub registry: ResourceTypeRegistry,
    pub store: InMemoryEntityStore,
    pub links: UrlLinkGenerator,
}

impl Fixture {
    pub fn new() -> Self {
        let article = ResourceType::new(
            "node",
            "article",
            EntityKind::Content,
            [
                FieldDefinition::attribute("title"),
                FieldDefinition::attribute("body"),
                FieldDefinition::attribute("created").read_only(),
                FieldDefinition::attribute("revision_log").internal(),
                FieldDefinition::relationship("uid", Cardinality::One).with_targets(["user--user"]),
                FieldDefinition::relationship("field_tags", Cardinality::Unlimited)
                    .with_targets(["taxonomy_term--tags"]),
            ],
        );
        let user = ResourceType::new(
            "user",
            "user",
            EntityKind::Content,
            [FieldDefinition::attribute("name")],
        );
        let tags = ResourceType::new(
            "taxonomy_term",
            "tags",
            EntityKind::Content,
            [
                FieldDefinition::attribute("name"),
                FieldDefinition::relationship("parent", Cardinality::Many)
                    .with_targets(["taxonomy_term--tags"]),
            ],
        );
        let node_type = ResourceType::new(
            "node_type",
            "node_type",
            EntityKind::Config,
            [
                FieldDefinition::attribute("name"),
                FieldDefinition::attribute("description"),
            ],
        );

        let registry = [article, user, tags, node_type]
            .into_iter()
            .map(|rt| rt.unwrap())
            .fold(ResourceTypeRegistry::new(), ResourceTypeRegistry::with);

        Self {
            registry,
            store: InMemoryEntityStore::new(),
            links: UrlLinkGenerator::new("http://localhost", "/jsonapi"),
        }
    }

    pub fn save(&self, entity: Entity) -> Arc<Entity> {
        self.store.save(entity).unwrap()
    }

    pub fn collaborators<'a>(&'a self, access: &'a dyn AccessCheck) -> Collaborators<'a> {
        Collaborators {
            resource_types: &self.registry,
            loader: &self.store,
            access,
            links: &self.links,
        }
    }

    pub fn assembler<'a>(&'a self, access: &'a dyn AccessCheck) -> DocumentAssembler<'a> {
        DocumentAssembler::new(&self.registry, &self.store, access, &self.links)
    }
}
