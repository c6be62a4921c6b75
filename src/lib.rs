//! # This-JSONAPI
//!
//! A JSON:API document normalization engine with a REST exposure layer.
//!
//! ## Features
//!
//! - **Resource Types**: Entity types and bundles declared in YAML, with
//!   attribute and relationship fields
//! - **Sparse Fieldsets**: `fields[type]=a,b` selects the emitted fields
//! - **Includes**: `include=a.b,c` pulls related resources into `included`,
//!   deduplicated and cycle-safe
//! - **Access Errors**: Denied resources become `null` slots plus
//!   `meta.errors` entries carrying a JSON pointer
//! - **Cacheability**: Tags, contexts and max-age of every touched entity
//!   are bubbled up to the response
//! - **Denormalization**: Request documents become unsaved entities
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jsonapi::prelude::*;
//!
//! let config = JsonApiConfig::from_yaml_file("config/jsonapi.yaml")?;
//! let store = InMemoryEntityStore::new();
//! store.save(Entity::new("node", "article").with_attribute("title", "Hello"))?;
//!
//! ServerBuilder::new()
//!     .with_config(config)
//!     .with_store(store)
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod links;
pub mod normalizer;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        AccessCheck, AccessError, AccessResult, AllowAll, AuthContext, AuthPolicy, AuthProvider,
        CacheableMetadata, Cardinality, DocumentQuery, Entity, EntityKey, EntityKind,
        EntityLoader, EntityStorage, FieldDefinition, HeaderAuthProvider, JsonApiError,
        LinkGenerator, MaxAge, NoAuthProvider, PolicyAccessCheck, ResourceIdentifier,
        ResourceType, ResourceTypeRegistry, ResourceTypeRepository, SparseFieldsets,
    };

    // === Normalizer ===
    pub use crate::normalizer::{
        Collaborators, Document, DocumentAssembler, DocumentRequest, ErrorDocument, IncludeTree,
        JSONAPI_MEDIA_TYPE, Normalizable, Normalized, PrimaryData, ResolutionContext,
        ResourceResponse,
    };

    // === Links ===
    pub use crate::links::UrlLinkGenerator;

    // === Storage ===
    pub use crate::storage::InMemoryEntityStore;

    // === Config ===
    pub use crate::config::{JsonApiConfig, ResourceTypeConfig};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{
        Router,
        extract::{Path, State},
        http::HeaderMap,
        routing::{get, post},
    };
}
