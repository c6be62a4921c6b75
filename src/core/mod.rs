//! Core module containing the entity model, resource types and the
//! collaborator traits the normalizer consumes

pub mod access;
pub mod auth;
pub mod cache;
pub mod entity;
pub mod error;
pub mod field;
pub mod identifier;
pub mod member_name;
pub mod query;
pub mod resource_type;
pub mod service;

pub use access::{AccessCheck, AccessError, AccessResult, AllowAll, DEFAULT_ACCESS_DENIED_MESSAGE};
pub use auth::{AuthContext, AuthPolicy, AuthProvider, HeaderAuthProvider, NoAuthProvider, PolicyAccessCheck};
pub use cache::{CacheableMetadata, MaxAge};
pub use entity::{Entity, EntityKey, EntityKind, FieldItemList};
pub use error::JsonApiError;
pub use field::{Cardinality, FieldDefinition, RelationshipDefinition};
pub use identifier::ResourceIdentifier;
pub use member_name::{is_valid_custom_query_parameter, is_valid_member_name};
pub use query::{DocumentQuery, SparseFieldsets};
pub use resource_type::{ResourceType, ResourceTypeRegistry, ResourceTypeRepository};
pub use service::{EntityLoader, EntityStorage, LinkGenerator};
