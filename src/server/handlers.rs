//! REST handlers
//!
//! Thin adapters: resolve the route to a resource type and entity, build the
//! per-request access check, hand primary data to the assembler.

use crate::core::error::JsonApiError;
use crate::core::service::LinkGenerator;
use crate::normalizer::PrimaryData;
use crate::server::host::ServerHost;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::sync::Arc;

/// Shared handler state
pub type AppState = Arc<ServerHost>;

type QueryPairs = Query<Vec<(String, String)>>;

/// GET /{entity_type}/{bundle}
pub async fn list_resources(
    State(host): State<AppState>,
    Path((entity_type, bundle)): Path<(String, String)>,
    Query(params): QueryPairs,
    headers: HeaderMap,
) -> Result<Response, JsonApiError> {
    let resource_type = host.resource_type(&entity_type, &bundle)?;
    let request = host.document_request(params, host.links.collection_link(&entity_type, &bundle))?;
    let access = host.access_check(&headers).await?;

    let entities = host.loader.load_bundle(&entity_type, &bundle)?;
    tracing::debug!(
        resource_type = %resource_type.type_name(),
        count = entities.len(),
        "listing resources"
    );

    let response = host
        .assembler(&access)
        .assemble(PrimaryData::Collection(entities), &request)?;
    Ok(response.into_response())
}

/// GET /{entity_type}/{bundle}/{uuid}
pub async fn get_resource(
    State(host): State<AppState>,
    Path((entity_type, bundle, id)): Path<(String, String, String)>,
    Query(params): QueryPairs,
    headers: HeaderMap,
) -> Result<Response, JsonApiError> {
    let resource_type = host.resource_type(&entity_type, &bundle)?;
    let entity = host.load_entity(resource_type, &id)?;
    let request = host.document_request(params, host.links.entity_link(&entity))?;
    let access = host.access_check(&headers).await?;

    let response = host
        .assembler(&access)
        .assemble(PrimaryData::Entity(entity), &request)?;
    Ok(response.into_response())
}

/// GET /{entity_type}/{bundle}/{uuid}/{field}
pub async fn get_related(
    State(host): State<AppState>,
    Path((entity_type, bundle, id, field)): Path<(String, String, String, String)>,
    Query(params): QueryPairs,
    headers: HeaderMap,
) -> Result<Response, JsonApiError> {
    let resource_type = host.resource_type(&entity_type, &bundle)?;
    let host_entity = host.load_entity(resource_type, &id)?;
    let request = host.document_request(params, host.links.related_link(&host_entity, &field))?;
    let access = host.access_check(&headers).await?;

    let response = host.assembler(&access).assemble(
        PrimaryData::Related {
            host: host_entity,
            field,
        },
        &request,
    )?;
    Ok(response.into_response())
}

/// GET /{entity_type}/{bundle}/{uuid}/relationships/{field}
pub async fn get_relationship(
    State(host): State<AppState>,
    Path((entity_type, bundle, id, field)): Path<(String, String, String, String)>,
    Query(params): QueryPairs,
    headers: HeaderMap,
) -> Result<Response, JsonApiError> {
    let resource_type = host.resource_type(&entity_type, &bundle)?;
    let host_entity = host.load_entity(resource_type, &id)?;
    let request =
        host.document_request(params, host.links.relationship_link(&host_entity, &field))?;
    let access = host.access_check(&headers).await?;

    let response = host.assembler(&access).assemble(
        PrimaryData::Relationship {
            host: host_entity,
            field,
        },
        &request,
    )?;
    Ok(response.into_response())
}

/// POST /{entity_type}/{bundle}
pub async fn create_resource(
    State(host): State<AppState>,
    Path((entity_type, bundle)): Path<(String, String)>,
    Query(params): QueryPairs,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, JsonApiError> {
    let resource_type = host.resource_type(&entity_type, &bundle)?;
    let payload: Value = serde_json::from_slice(&body).map_err(|e| JsonApiError::BadRequest {
        message: format!("request body is not valid JSON: {}", e),
    })?;
    let access = host.access_check(&headers).await?;

    let entity = host
        .assembler(&access)
        .denormalize(&payload, resource_type)?;
    if host
        .loader
        .load_by_uuid(resource_type.entity_type_id(), &entity.uuid())?
        .is_some()
    {
        return Err(JsonApiError::AlreadyExists {
            type_name: resource_type.type_name().to_string(),
            id: entity.uuid().to_string(),
        });
    }
    let saved = host.storage.save(entity)?;

    tracing::info!(
        resource_type = %resource_type.type_name(),
        uuid = %saved.uuid(),
        "created resource"
    );

    let location = host.links.entity_link(&saved);
    let request = host.document_request(params, location.clone())?;
    let mut response = host
        .assembler(&access)
        .assemble(PrimaryData::Entity(saved), &request)?
        .into_response_with_status(StatusCode::CREATED);

    if let Ok(location) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    Ok(response)
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    axum::Json(json!({
        "status": "ok",
        "service": "this-jsonapi"
    }))
}
