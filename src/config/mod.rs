//! Configuration loading and management

use crate::core::access::DEFAULT_ACCESS_DENIED_MESSAGE;
use crate::core::auth::{AuthContext, PolicyAccessCheck};
use crate::core::entity::EntityKind;
use crate::core::error::JsonApiError;
use crate::core::field::FieldDefinition;
use crate::core::resource_type::{ResourceType, ResourceTypeRegistry, type_name};
use crate::links::UrlLinkGenerator;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration of one exposed resource type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTypeConfig {
    /// Entity type (e.g., "node", "taxonomy_term")
    pub entity_type: String,

    /// Bundle (e.g., "article", "tags")
    pub bundle: String,

    #[serde(default)]
    pub kind: EntityKind,

    /// View policy (e.g., "public", "authenticated", "role:editor")
    ///
    /// Types without a policy are public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,

    /// Fields in canonical order
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ResourceTypeConfig {
    pub fn type_name(&self) -> String {
        type_name(&self.entity_type, &self.bundle)
    }
}

/// Complete configuration of a JSON:API server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonApiConfig {
    /// Path prefix of every route (default "/jsonapi")
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Scheme and authority used in generated links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// View policy of resource types without their own `view`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_view: Option<String>,

    /// Overrides the default access-denied error title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_denied_message: Option<String>,

    pub resource_types: Vec<ResourceTypeConfig>,
}

fn default_base_path() -> String {
    "/jsonapi".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for JsonApiConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            base_url: default_base_url(),
            default_view: None,
            access_denied_message: None,
            resource_types: Vec::new(),
        }
    }
}

impl JsonApiConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    ///
    /// Every type and field name is checked against the member-name grammar.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.build_registry()?;
        Ok(config)
    }

    /// Build the resource type registry
    pub fn build_registry(&self) -> Result<ResourceTypeRegistry, JsonApiError> {
        let mut registry = ResourceTypeRegistry::new();
        let mut seen = HashSet::new();

        for rt in &self.resource_types {
            if !seen.insert(rt.type_name()) {
                return Err(JsonApiError::Config(format!(
                    "resource type '{}' is declared twice",
                    rt.type_name()
                )));
            }
            registry.register(ResourceType::new(
                rt.entity_type.clone(),
                rt.bundle.clone(),
                rt.kind,
                rt.fields.iter().cloned(),
            )?);
        }

        Ok(registry)
    }

    /// Access check applying the configured view policies to `context`
    pub fn access_check(&self, context: AuthContext) -> PolicyAccessCheck {
        let check = match &self.default_view {
            Some(policy) => PolicyAccessCheck::new(context).with_default_policy(policy),
            None => PolicyAccessCheck::new(context),
        };

        self.resource_types
            .iter()
            .filter_map(|rt| rt.view.as_deref().map(|policy| (rt.type_name(), policy)))
            .fold(check, |check, (type_name, policy)| {
                check.with_policy(type_name, policy)
            })
    }

    pub fn link_generator(&self) -> UrlLinkGenerator {
        UrlLinkGenerator::new(&self.base_url, &self.base_path)
    }

    pub fn access_denied_message(&self) -> &str {
        self.access_denied_message
            .as_deref()
            .unwrap_or(DEFAULT_ACCESS_DENIED_MESSAGE)
    }
}
