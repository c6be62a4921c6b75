//! Authorization for resource access
//!
//! Provides the request-side half of entity access control:
//! - [`AuthContext`]: who is asking, extracted by an [`AuthProvider`]
//! - [`AuthPolicy`]: per resource type view policy, parsed from config
//! - [`PolicyAccessCheck`]: the [`AccessCheck`] the normalizer consumes

use crate::core::access::{AccessCheck, AccessResult};
use crate::core::cache::CacheableMetadata;
use crate::core::entity::Entity;
use crate::core::resource_type::type_name;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::collections::HashMap;
use uuid::Uuid;

/// Header carrying the authenticated user's id (see [`HeaderAuthProvider`])
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's comma-separated roles
pub const USER_ROLES_HEADER: &str = "x-user-roles";

/// Authorization context extracted from a request
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// Authenticated user
    User { user_id: Uuid, roles: Vec<String> },

    /// System administrator
    Admin { admin_id: Uuid },

    /// No authentication (public access)
    Anonymous,
}

impl AuthContext {
    /// Check if context represents an admin
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthContext::Admin { .. })
    }

    /// Get user_id if available
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            AuthContext::Admin { admin_id } => Some(*admin_id),
            _ => None,
        }
    }
}

/// Authorization policy for viewing a resource type
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated user
    Authenticated,

    /// User must have one of these roles
    HasRole(Vec<String>),

    /// Admin only
    AdminOnly,
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Public => true,

            AuthPolicy::Authenticated => !matches!(context, AuthContext::Anonymous),

            AuthPolicy::HasRole(required_roles) => match context {
                AuthContext::User { roles, .. } => required_roles.iter().any(|r| roles.contains(r)),
                AuthContext::Admin { .. } => true,
                _ => false,
            },

            AuthPolicy::AdminOnly => context.is_admin(),
        }
    }

    /// Parse policy from string (for YAML config)
    pub fn parse_policy(s: &str) -> Self {
        match s {
            "public" => AuthPolicy::Public,
            "authenticated" => AuthPolicy::Authenticated,
            "admin_only" => AuthPolicy::AdminOnly,
            s if s.starts_with("role:") => {
                let roles = s["role:".len()..]
                    .split('|')
                    .map(|r| r.trim().to_string())
                    .collect();
                AuthPolicy::HasRole(roles)
            }
            _ => AuthPolicy::Authenticated, // Default
        }
    }
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Extract auth context from HTTP request headers
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext>;
}

/// Default no-auth provider (for development)
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn extract_context(&self, _headers: &HeaderMap) -> Result<AuthContext> {
        Ok(AuthContext::Anonymous)
    }
}

/// Provider trusting identity headers set by an upstream gateway
///
/// `x-user-id` selects the user, `x-user-roles` lists its roles; the
/// `admin` role yields an [`AuthContext::Admin`]. Requests without the id
/// header are anonymous.
pub struct HeaderAuthProvider;

#[async_trait]
impl AuthProvider for HeaderAuthProvider {
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let Some(raw_id) = headers.get(USER_ID_HEADER) else {
            return Ok(AuthContext::Anonymous);
        };

        let user_id = raw_id
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| anyhow!("Invalid {} header", USER_ID_HEADER))?;

        let roles: Vec<String> = headers
            .get(USER_ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if roles.iter().any(|r| r == "admin") {
            Ok(AuthContext::Admin { admin_id: user_id })
        } else {
            Ok(AuthContext::User { user_id, roles })
        }
    }
}

/// [`AccessCheck`] evaluating configured view policies for one request
///
/// An entity is viewable when the policy of its resource type accepts the
/// context and, unless the context is an admin, the entity is published.
pub struct PolicyAccessCheck {
    context: AuthContext,
    policies: HashMap<String, (String, AuthPolicy)>,
    default_policy: (String, AuthPolicy),
}

impl PolicyAccessCheck {
    /// Create a check with a public default policy
    pub fn new(context: AuthContext) -> Self {
        Self {
            context,
            policies: HashMap::new(),
            default_policy: ("public".to_string(), AuthPolicy::Public),
        }
    }

    /// Set the policy of resource types without one of their own
    pub fn with_default_policy(mut self, policy: &str) -> Self {
        self.default_policy = (policy.to_string(), AuthPolicy::parse_policy(policy));
        self
    }

    /// Set the view policy of a resource type from its config string
    pub fn with_policy(mut self, type_name: impl Into<String>, policy: &str) -> Self {
        self.policies.insert(
            type_name.into(),
            (policy.to_string(), AuthPolicy::parse_policy(policy)),
        );
        self
    }

    pub fn context(&self) -> &AuthContext {
        &self.context
    }
}

impl AccessCheck for PolicyAccessCheck {
    fn check(&self, entity: &Entity) -> AccessResult {
        let type_name = type_name(entity.entity_type_id(), entity.bundle());

        let (raw, policy) = self
            .policies
            .get(&type_name)
            .unwrap_or(&self.default_policy);
        if !policy.check(&self.context) {
            return AccessResult::denied_because(format!(
                "The '{}' policy is required to view '{}' resources.",
                raw, type_name
            ));
        }

        if !entity.is_published() && !self.context.is_admin() {
            return AccessResult::denied_because("The entity is not published.");
        }

        AccessResult::Allowed
    }

    fn cacheability(&self) -> CacheableMetadata {
        CacheableMetadata::new().with_contexts(["user.roles"])
    }
}
