//! URL generation for resources and relationships

use crate::core::entity::Entity;
use crate::core::service::LinkGenerator;

/// Builds absolute URLs under `{base_url}{base_path}`
///
/// - resource: `{base}/{entity_type}/{bundle}/{uuid}`
/// - relationship: `{base}/{entity_type}/{bundle}/{uuid}/relationships/{field}`
/// - related: `{base}/{entity_type}/{bundle}/{uuid}/{field}`
#[derive(Debug, Clone)]
pub struct UrlLinkGenerator {
    base: String,
}

impl UrlLinkGenerator {
    pub fn new(base_url: &str, base_path: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let base_path = base_path.trim_matches('/');

        let base = if base_path.is_empty() {
            base_url.to_string()
        } else {
            format!("{}/{}", base_url, base_path)
        };

        Self { base }
    }

    /// URL of a resource collection
    pub fn collection_link(&self, entity_type_id: &str, bundle: &str) -> String {
        format!("{}/{}/{}", self.base, entity_type_id, bundle)
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

impl LinkGenerator for UrlLinkGenerator {
    fn entity_link(&self, entity: &Entity) -> String {
        format!(
            "{}/{}",
            self.collection_link(entity.entity_type_id(), entity.bundle()),
            entity.uuid()
        )
    }

    fn relationship_link(&self, host: &Entity, field: &str) -> String {
        format!("{}/relationships/{}", self.entity_link(host), field)
    }

    fn related_link(&self, host: &Entity, field: &str) -> String {
        format!("{}/{}", self.entity_link(host), field)
    }
}
