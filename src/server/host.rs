//! Server host
//!
//! Holds everything the REST handlers need: configuration, resource types,
//! the entity store, link generation and authentication. Per-request
//! engine state is never kept here.

use crate::config::JsonApiConfig;
use crate::core::access::AccessCheck;
use crate::core::auth::{AuthProvider, PolicyAccessCheck};
use crate::core::entity::Entity;
use crate::core::error::JsonApiError;
use crate::core::query::DocumentQuery;
use crate::core::resource_type::{ResourceType, ResourceTypeRegistry, ResourceTypeRepository};
use crate::core::service::{EntityLoader, EntityStorage};
use crate::links::UrlLinkGenerator;
use crate::normalizer::{DocumentAssembler, DocumentRequest};
use anyhow::Result;
use axum::http::HeaderMap;
use std::sync::Arc;
use uuid::Uuid;

/// Shared state of a JSON:API server
pub struct ServerHost {
    pub config: Arc<JsonApiConfig>,
    pub resource_types: Arc<ResourceTypeRegistry>,
    pub loader: Arc<dyn EntityLoader>,
    pub storage: Arc<dyn EntityStorage>,
    pub links: Arc<UrlLinkGenerator>,
    pub auth_provider: Arc<dyn AuthProvider>,
}

impl ServerHost {
    /// Build the host from builder components
    pub fn from_builder_components(
        config: JsonApiConfig,
        loader: Arc<dyn EntityLoader>,
        storage: Arc<dyn EntityStorage>,
        auth_provider: Arc<dyn AuthProvider>,
    ) -> Result<Self> {
        let resource_types = config.build_registry()?;
        let links = config.link_generator();

        Ok(Self {
            config: Arc::new(config),
            resource_types: Arc::new(resource_types),
            loader,
            storage,
            links: Arc::new(links),
            auth_provider,
        })
    }

    /// Resource type served under `/{entity_type}/{bundle}`
    pub fn resource_type(&self, entity_type: &str, bundle: &str) -> Result<&ResourceType, JsonApiError> {
        self.resource_types
            .get(entity_type, bundle)
            .ok_or_else(|| JsonApiError::UnknownResourceType {
                type_name: format!("{}--{}", entity_type, bundle),
            })
    }

    /// Load the entity addressed by a uuid path segment
    pub fn load_entity(&self, resource_type: &ResourceType, id: &str) -> Result<Arc<Entity>, JsonApiError> {
        let not_found = || JsonApiError::NotFound {
            type_name: resource_type.type_name().to_string(),
            id: id.to_string(),
        };

        let uuid = Uuid::parse_str(id).map_err(|_| not_found())?;

        self.loader
            .load_by_uuid(resource_type.entity_type_id(), &uuid)?
            .filter(|entity| resource_type.matches(entity))
            .ok_or_else(not_found)
    }

    /// Access check for the caller identified by `headers`
    pub async fn access_check(&self, headers: &HeaderMap) -> Result<PolicyAccessCheck, JsonApiError> {
        let context = self
            .auth_provider
            .extract_context(headers)
            .await
            .map_err(|e| JsonApiError::BadRequest {
                message: e.to_string(),
            })?;

        Ok(self.config.access_check(context))
    }

    /// Document request from raw query pairs
    pub fn document_request(
        &self,
        params: Vec<(String, String)>,
        self_link: String,
    ) -> Result<DocumentRequest, JsonApiError> {
        let query = DocumentQuery::from_pairs(params)?;
        let mut request = DocumentRequest::from_query(&query)?.with_self_link(self_link);
        if let Some(message) = &self.config.access_denied_message {
            request = request.with_access_denied_message(message.clone());
        }
        Ok(request)
    }

    /// Assembler bound to this host's collaborators and one access check
    pub fn assembler<'a>(&'a self, access: &'a dyn AccessCheck) -> DocumentAssembler<'a> {
        DocumentAssembler::new(
            self.resource_types.as_ref(),
            self.loader.as_ref(),
            access,
            self.links.as_ref(),
        )
    }
}
