//! Top-level document assembly

use crate::core::access::{AccessCheck, DEFAULT_ACCESS_DENIED_MESSAGE};
use crate::core::cache::CacheableMetadata;
use crate::core::entity::Entity;
use crate::core::error::JsonApiError;
use crate::core::identifier::ResourceIdentifier;
use crate::core::query::{DocumentQuery, SparseFieldsets};
use crate::core::resource_type::{ResourceType, ResourceTypeRepository, type_name};
use crate::core::service::{EntityLoader, LinkGenerator};
use crate::normalizer::denormalizer;
use crate::normalizer::document::{
    Document, DocumentLinks, DocumentMeta, PrimaryDocumentData, RelationshipData, ResourceObject,
};
use crate::normalizer::include::{IncludeResolver, IncludeTree};
use crate::normalizer::relationship::Relationship;
use crate::normalizer::{Collaborators, Normalizable, Normalized, ResolutionContext};
use serde_json::Value;
use std::sync::Arc;

/// What the document is about
#[derive(Debug, Clone)]
pub enum PrimaryData {
    /// A single resource
    Entity(Arc<Entity>),

    /// A collection; denied members keep a null slot
    Collection(Vec<Arc<Entity>>),

    /// The linkage of one relationship of a host entity
    Relationship { host: Arc<Entity>, field: String },

    /// The resources one relationship of a host entity points to
    Related { host: Arc<Entity>, field: String },
}

/// Client-controlled shape of the document
#[derive(Debug, Clone, Default)]
pub struct DocumentRequest {
    pub fields: SparseFieldsets,
    pub include: IncludeTree,
    pub self_link: Option<String>,

    /// Overrides [`DEFAULT_ACCESS_DENIED_MESSAGE`]
    pub access_denied_message: Option<String>,
}

impl DocumentRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed query parameters
    pub fn from_query(query: &DocumentQuery) -> Result<Self, JsonApiError> {
        let include = match &query.include {
            Some(include) => IncludeTree::parse(include)?,
            None => IncludeTree::new(),
        };

        Ok(Self {
            fields: query.fields.clone(),
            include,
            ..Self::default()
        })
    }

    pub fn with_fields(mut self, fields: SparseFieldsets) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_include(mut self, include: IncludeTree) -> Self {
        self.include = include;
        self
    }

    pub fn with_self_link(mut self, link: impl Into<String>) -> Self {
        self.self_link = Some(link.into());
        self
    }

    pub fn with_access_denied_message(mut self, message: impl Into<String>) -> Self {
        self.access_denied_message = Some(message.into());
        self
    }
}

/// An assembled document plus the cache metadata of everything it touched
#[derive(Debug, Clone)]
pub struct ResourceResponse {
    pub document: Document,
    pub cacheability: CacheableMetadata,
}

/// Turns primary data into documents, and request documents into entities
pub struct DocumentAssembler<'a> {
    collaborators: Collaborators<'a>,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(
        resource_types: &'a dyn ResourceTypeRepository,
        loader: &'a dyn EntityLoader,
        access: &'a dyn AccessCheck,
        links: &'a dyn LinkGenerator,
    ) -> Self {
        Self {
            collaborators: Collaborators {
                resource_types,
                loader,
                access,
                links,
            },
        }
    }

    /// Assemble the document for `primary`
    ///
    /// Denied entities never abort assembly: they become null slots plus an
    /// entry in `meta.errors`. Includes are resolved from the primary
    /// resources the client may see.
    pub fn assemble(
        &self,
        primary: PrimaryData,
        request: &DocumentRequest,
    ) -> Result<ResourceResponse, JsonApiError> {
        let message = request
            .access_denied_message
            .as_deref()
            .unwrap_or(DEFAULT_ACCESS_DENIED_MESSAGE);
        let mut ctx = ResolutionContext::new(self.collaborators, &request.fields, message);

        let mut roots = Vec::new();
        let mut seeds = Vec::new();

        let data = match &primary {
            PrimaryData::Entity(entity) => {
                let resource = self.primary_resource(entity, "/data", &mut ctx)?;
                if resource.is_some() {
                    roots.push(Arc::clone(entity));
                    seeds.push((ResourceIdentifier::from_entity(entity)?, "/data".to_string()));
                }
                PrimaryDocumentData::Resource(resource)
            }
            PrimaryData::Collection(entities) => {
                let mut slots = Vec::with_capacity(entities.len());
                for (index, entity) in entities.iter().enumerate() {
                    let pointer = format!("/data/{}", index);
                    let resource = self.primary_resource(entity, &pointer, &mut ctx)?;
                    if resource.is_some() {
                        roots.push(Arc::clone(entity));
                        seeds.push((ResourceIdentifier::from_entity(entity)?, pointer));
                    }
                    slots.push(resource);
                }
                PrimaryDocumentData::Collection(slots)
            }
            PrimaryData::Relationship { host, field } => {
                let linkage = self.relationship_linkage(host, field, &mut ctx)?;
                if linkage.is_some() {
                    roots.push(Arc::clone(host));
                }
                match linkage {
                    Some(data) => PrimaryDocumentData::Linkage(data),
                    None => PrimaryDocumentData::Resource(None),
                }
            }
            PrimaryData::Related { host, field } => {
                let Some(relationship) = self.host_relationship(host, field, &mut ctx)? else {
                    return self.finish(PrimaryDocumentData::Resource(None), Vec::new(), request, ctx);
                };

                if relationship.cardinality().is_single() {
                    let target = relationship
                        .targets()
                        .iter()
                        .flatten()
                        .next()
                        .filter(|target| ctx.is_exposed(target));
                    let resource = match target {
                        Some(target) => self.primary_resource(target, "/data", &mut ctx)?,
                        None => None,
                    };
                    if let (Some(target), Some(_)) = (target, &resource) {
                        roots.push(Arc::clone(target));
                        seeds.push((ResourceIdentifier::from_entity(target)?, "/data".to_string()));
                    }
                    PrimaryDocumentData::Resource(resource)
                } else {
                    let mut slots = Vec::new();
                    for target in relationship.targets().iter().flatten() {
                        if !ctx.is_exposed(target) {
                            continue;
                        }
                        let pointer = format!("/data/{}", slots.len());
                        let resource = self.primary_resource(target, &pointer, &mut ctx)?;
                        if resource.is_some() {
                            roots.push(Arc::clone(target));
                            seeds.push((ResourceIdentifier::from_entity(target)?, pointer));
                        }
                        slots.push(resource);
                    }
                    PrimaryDocumentData::Collection(slots)
                }
            }
        };

        let included = IncludeResolver::new(seeds).resolve(&roots, &request.include, &mut ctx)?;
        self.finish(data, included, request, ctx)
    }

    fn finish(
        &self,
        data: PrimaryDocumentData,
        included: Vec<ResourceObject>,
        request: &DocumentRequest,
        ctx: ResolutionContext<'_>,
    ) -> Result<ResourceResponse, JsonApiError> {
        let (errors, cacheability) = ctx.finish();

        tracing::debug!(
            included = included.len(),
            errors = errors.len(),
            tags = cacheability.tags().len(),
            "assembled document"
        );

        Ok(ResourceResponse {
            document: Document {
                data,
                included,
                meta: (!errors.is_empty()).then_some(DocumentMeta { errors }),
                links: DocumentLinks {
                    self_link: request.self_link.clone(),
                },
            },
            cacheability,
        })
    }

    /// Build an entity from a request document targeting `expected`
    ///
    /// See [`denormalizer::denormalize`].
    pub fn denormalize(
        &self,
        payload: &Value,
        expected: &ResourceType,
    ) -> Result<Entity, JsonApiError> {
        denormalizer::denormalize(
            payload,
            expected,
            self.collaborators.resource_types,
            self.collaborators.loader,
        )
    }

    fn primary_resource(
        &self,
        entity: &Arc<Entity>,
        pointer: &str,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Option<ResourceObject>, JsonApiError> {
        if !ctx.check_access(entity, pointer) {
            return Ok(None);
        }

        match Normalizable::entity(entity).normalize(pointer, ctx)? {
            Normalized::Resource(resource) => Ok(Some(resource)),
            other => Err(JsonApiError::Internal(format!(
                "entity normalized to {:?}",
                other
            ))),
        }
    }

    /// Load a relationship of a host the client may see
    ///
    /// A denied host is reported at `/data` and yields `None`.
    fn host_relationship(
        &self,
        host: &Arc<Entity>,
        field: &str,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Option<Relationship>, JsonApiError> {
        let definition = ctx
            .resource_type_of(host)?
            .relationship(field)
            .ok_or_else(|| JsonApiError::UnknownRelationship {
                type_name: type_name(host.entity_type_id(), host.bundle()),
                field: field.to_string(),
            })?;

        if !ctx.check_access(host, "/data") {
            return Ok(None);
        }

        Relationship::load(host, definition, ctx).map(Some)
    }

    fn relationship_linkage(
        &self,
        host: &Arc<Entity>,
        field: &str,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Option<RelationshipData>, JsonApiError> {
        let Some(relationship) = self.host_relationship(host, field, ctx)? else {
            return Ok(None);
        };

        match Normalizable::Relationship(&relationship).normalize("/data", ctx)? {
            Normalized::Relationship(object) => Ok(Some(object.data)),
            other => Err(JsonApiError::Internal(format!(
                "relationship normalized to {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::access::{AccessResult, AllowAll};
    use crate::core::cache::MaxAge;
    use crate::core::entity::EntityKind;
    use crate::normalizer::test_support::Fixture;
    use serde_json::json;

    fn deny_unpublished(entity: &Entity) -> AccessResult {
        if entity.is_published() {
            AccessResult::Allowed
        } else {
            AccessResult::denied()
        }
    }

    #[test]
    fn test_single_resource_document() {
        let fixture = Fixture::new();
        let node = fixture.save(Entity::new("node", "article").with_attribute("title", "t"));
        let assembler = fixture.assembler(&AllowAll);

        let response = assembler
            .assemble(
                PrimaryData::Entity(node.clone()),
                &DocumentRequest::new().with_self_link("http://localhost/jsonapi/node/article"),
            )
            .unwrap();

        let json = serde_json::to_value(&response.document).unwrap();
        assert_eq!(json["data"]["id"], node.uuid().to_string());
        assert_eq!(json["links"]["self"], "http://localhost/jsonapi/node/article");
        assert!(json.get("included").is_none());
        assert!(json.get("meta").is_none());
        assert_eq!(response.cacheability.tags(), vec!["node:1"]);
        assert_eq!(response.cacheability.max_age(), MaxAge::Permanent);
    }

    #[test]
    fn test_denied_primary_is_null_with_error() {
        let fixture = Fixture::new();
        let node = fixture.save(Entity::new("node", "article").unpublished());
        let access = deny_unpublished;
        let assembler = fixture.assembler(&access);

        let response = assembler
            .assemble(
                PrimaryData::Entity(node.clone()),
                &DocumentRequest::new().with_include(IncludeTree::parse("uid").unwrap()),
            )
            .unwrap();

        let json = serde_json::to_value(&response.document).unwrap();
        assert_eq!(json["data"], json!(null));
        assert_eq!(json["meta"]["errors"][0]["source"]["pointer"], "/data");
        assert_eq!(
            json["meta"]["errors"][0]["id"],
            format!("/node--article/{}", node.uuid())
        );
        assert!(response.document.included.is_empty());
        assert_eq!(response.cacheability.tags(), vec!["node:1"]);
    }

    #[test]
    fn test_collection_keeps_denied_slots() {
        let fixture = Fixture::new();
        let visible = fixture.save(Entity::new("node", "article"));
        let hidden = fixture.save(Entity::new("node", "article").unpublished());
        let access = deny_unpublished;
        let assembler = fixture.assembler(&access);

        let response = assembler
            .assemble(
                PrimaryData::Collection(vec![visible.clone(), hidden]),
                &DocumentRequest::new(),
            )
            .unwrap();

        let json = serde_json::to_value(&response.document).unwrap();
        assert_eq!(json["data"][0]["id"], visible.uuid().to_string());
        assert_eq!(json["data"][1], json!(null));
        assert_eq!(response.document.errors()[0].source.as_ref().unwrap().pointer, "/data/1");
    }

    #[test]
    fn test_custom_access_denied_message() {
        let fixture = Fixture::new();
        let node = fixture.save(Entity::new("node", "article").unpublished());
        let access = deny_unpublished;
        let assembler = fixture.assembler(&access);

        let response = assembler
            .assemble(
                PrimaryData::Entity(node),
                &DocumentRequest::new().with_access_denied_message("Nope."),
            )
            .unwrap();

        let error = &response.document.errors()[0];
        assert_eq!(error.title, "Forbidden");
        assert_eq!(error.detail.as_ref().unwrap().message, "Nope.");
    }

    #[test]
    fn test_relationship_linkage_document() {
        let fixture = Fixture::new();
        let tag = fixture.save(Entity::new("taxonomy_term", "tags"));
        let node = fixture.save(
            Entity::new("node", "article").with_references("field_tags", [tag.key().unwrap()]),
        );
        let assembler = fixture.assembler(&AllowAll);

        let response = assembler
            .assemble(
                PrimaryData::Relationship {
                    host: node,
                    field: "field_tags".to_string(),
                },
                &DocumentRequest::new(),
            )
            .unwrap();

        let json = serde_json::to_value(&response.document).unwrap();
        assert_eq!(
            json["data"],
            json!([{"type": "taxonomy_term--tags", "id": tag.uuid().to_string()}])
        );
        assert_eq!(response.cacheability.tags(), vec!["node:1", "taxonomy_term:1"]);
    }

    #[test]
    fn test_related_document() {
        let fixture = Fixture::new();
        let author = fixture.save(Entity::new("user", "user").with_attribute("name", "user1"));
        let tag = fixture.save(Entity::new("taxonomy_term", "tags").unpublished());
        let node = fixture.save(
            Entity::new("node", "article")
                .with_references("uid", [author.key().unwrap()])
                .with_references("field_tags", [tag.key().unwrap()]),
        );
        let access = deny_unpublished;
        let assembler = fixture.assembler(&access);

        let author_doc = assembler
            .assemble(
                PrimaryData::Related {
                    host: node.clone(),
                    field: "uid".to_string(),
                },
                &DocumentRequest::new(),
            )
            .unwrap();
        let json = serde_json::to_value(&author_doc.document).unwrap();
        assert_eq!(json["data"]["type"], "user--user");
        assert_eq!(json["data"]["attributes"]["name"], "user1");

        let tags_doc = assembler
            .assemble(
                PrimaryData::Related {
                    host: node,
                    field: "field_tags".to_string(),
                },
                &DocumentRequest::new(),
            )
            .unwrap();
        let json = serde_json::to_value(&tags_doc.document).unwrap();
        assert_eq!(json["data"], json!([null]));
        assert_eq!(json["meta"]["errors"][0]["source"]["pointer"], "/data/0");
    }

    #[test]
    fn test_related_document_skips_unexposed_targets() {
        let fixture = Fixture::new();
        let tag = fixture.save(Entity::new("taxonomy_term", "tags"));
        let stray = fixture.save(Entity::new("taxonomy_term", "unregistered"));
        let node = fixture.save(
            Entity::new("node", "article")
                .with_references("field_tags", [stray.key().unwrap(), tag.key().unwrap()]),
        );
        let assembler = fixture.assembler(&AllowAll);

        let response = assembler
            .assemble(
                PrimaryData::Related {
                    host: node,
                    field: "field_tags".to_string(),
                },
                &DocumentRequest::new(),
            )
            .unwrap();
        let json = serde_json::to_value(&response.document).unwrap();

        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["id"], tag.uuid().to_string());
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn test_relationship_document_unknown_field() {
        let fixture = Fixture::new();
        let node = fixture.save(Entity::new("node", "article"));
        let assembler = fixture.assembler(&AllowAll);

        let err = assembler
            .assemble(
                PrimaryData::Relationship {
                    host: node,
                    field: "title".to_string(),
                },
                &DocumentRequest::new(),
            )
            .unwrap_err();
        assert!(matches!(err, JsonApiError::UnknownRelationship { .. }));
    }

    #[test]
    fn test_config_entity_document() {
        let fixture = Fixture::new();
        let node_type = fixture.save(
            Entity::new("node_type", "node_type")
                .with_kind(EntityKind::Config)
                .with_id("article")
                .with_attribute("name", "Article"),
        );
        let assembler = fixture.assembler(&AllowAll);

        let response = assembler
            .assemble(PrimaryData::Entity(node_type), &DocumentRequest::new())
            .unwrap();

        let json = serde_json::to_value(&response.document).unwrap();
        assert_eq!(json["data"]["type"], "node_type--node_type");
        assert_eq!(json["data"]["attributes"], json!({"name": "Article"}));
        assert_eq!(response.cacheability.tags(), vec!["config:node_type.article"]);
    }

    #[test]
    fn test_request_from_query() {
        let query = DocumentQuery::from_pairs(vec![
            ("fields[node--article]".to_string(), "title".to_string()),
            ("include".to_string(), "uid,field_tags".to_string()),
        ])
        .unwrap();

        let request = DocumentRequest::from_query(&query).unwrap();
        assert_eq!(request.fields.get("node--article"), Some(&["title".to_string()][..]));
        assert!(request.include.get("uid").is_some());
        assert!(request.include.get("field_tags").is_some());
    }
}
