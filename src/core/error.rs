//! Typed error handling for the JSON:API layer
//!
//! [`JsonApiError`] covers every failure that aborts a request. Per-entity
//! access denials are not part of this enum: they are
//! recorded as [`AccessError`](crate::core::access::AccessError)s and
//! embedded in `meta.errors` while the document keeps being built.
//!
//! # Example
//!
//! ```rust,ignore
//! use jsonapi::prelude::*;
//!
//! let resource_type = repository
//!     .get_by_type_name("node--article")
//!     .ok_or_else(|| JsonApiError::UnknownResourceType {
//!         type_name: "node--article".to_string(),
//!     })?;
//! ```

use crate::normalizer::document::{ErrorDocument, JSONAPI_MEDIA_TYPE};
use crate::normalizer::error::ErrorObject;
use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// The main error type for request-level failures
#[derive(Debug, Error)]
pub enum JsonApiError {
    /// A type, field or parameter name violates the member-name grammar
    #[error("Invalid member name '{name}' in {context}")]
    MalformedMemberName { name: String, context: String },

    /// A query parameter is not allowed or cannot be parsed
    #[error("Invalid query parameter '{name}': {message}")]
    InvalidQueryParameter { name: String, message: String },

    /// Malformed request outside the document body (e.g. path segments)
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// No resource type is registered under this name
    #[error("Resource type '{type_name}' is not registered")]
    UnknownResourceType { type_name: String },

    /// The requested entity does not exist
    #[error("{type_name} with id '{id}' not found")]
    NotFound { type_name: String, id: String },

    /// The field is not a relationship of the resource type
    #[error("Relationship '{field}' does not exist on '{type_name}'")]
    UnknownRelationship { type_name: String, field: String },

    /// The document's resource type does not match the route
    #[error("Resource type mismatch: expected '{expected}', got '{actual}'")]
    TypeMismatch { expected: String, actual: String },

    /// A resource with the requested id already exists
    #[error("Resource '{type_name}' with id '{id}' already exists")]
    AlreadyExists { type_name: String, id: String },

    /// The request document is structurally invalid
    #[error("Invalid document: {message}")]
    InvalidPayload { message: String },

    /// A collaborator (entity store) failed
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JsonApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            JsonApiError::MalformedMemberName { .. } => StatusCode::BAD_REQUEST,
            JsonApiError::InvalidQueryParameter { .. } => StatusCode::BAD_REQUEST,
            JsonApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            JsonApiError::UnknownResourceType { .. } => StatusCode::NOT_FOUND,
            JsonApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            JsonApiError::UnknownRelationship { .. } => StatusCode::NOT_FOUND,
            JsonApiError::TypeMismatch { .. } => StatusCode::CONFLICT,
            JsonApiError::AlreadyExists { .. } => StatusCode::CONFLICT,
            JsonApiError::InvalidPayload { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            JsonApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            JsonApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            JsonApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            JsonApiError::MalformedMemberName { .. } => "MALFORMED_MEMBER_NAME",
            JsonApiError::InvalidQueryParameter { .. } => "INVALID_QUERY_PARAMETER",
            JsonApiError::BadRequest { .. } => "BAD_REQUEST",
            JsonApiError::UnknownResourceType { .. } => "UNKNOWN_RESOURCE_TYPE",
            JsonApiError::NotFound { .. } => "RESOURCE_NOT_FOUND",
            JsonApiError::UnknownRelationship { .. } => "UNKNOWN_RELATIONSHIP",
            JsonApiError::TypeMismatch { .. } => "RESOURCE_TYPE_MISMATCH",
            JsonApiError::AlreadyExists { .. } => "RESOURCE_ALREADY_EXISTS",
            JsonApiError::InvalidPayload { .. } => "INVALID_DOCUMENT",
            JsonApiError::Storage(_) => "STORAGE_ERROR",
            JsonApiError::Config(_) => "CONFIG_ERROR",
            JsonApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to a top-level error document (no `data` member)
    pub fn to_document(&self) -> ErrorDocument {
        ErrorDocument {
            errors: vec![ErrorObject::from_exception(self)],
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        } else {
            tracing::debug!(code = self.error_code(), "{}", self);
        }

        (
            status,
            [(header::CONTENT_TYPE, JSONAPI_MEDIA_TYPE)],
            Json(self.to_document()),
        )
            .into_response()
    }
}
