//! Serializable JSON:API document structures

use crate::core::identifier::ResourceIdentifier;
use crate::normalizer::error::ErrorObject;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Media type of JSON:API documents
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// A top-level document with primary data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub data: PrimaryDocumentData,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMeta>,

    #[serde(skip_serializing_if = "DocumentLinks::is_empty")]
    pub links: DocumentLinks,
}

impl Document {
    /// Access errors embedded in `meta.errors`
    pub fn errors(&self) -> &[ErrorObject] {
        self.meta.as_ref().map(|m| m.errors.as_slice()).unwrap_or(&[])
    }
}

/// Primary data: a resource, a collection, or relationship linkage
///
/// Denied resources keep their slot as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryDocumentData {
    Resource(Option<ResourceObject>),
    Collection(Vec<Option<ResourceObject>>),
    Linkage(RelationshipData),
}

/// A top-level document reporting request failure (no `data` member)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMeta {
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentLinks {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

impl DocumentLinks {
    pub fn is_empty(&self) -> bool {
        self.self_link.is_none()
    }
}

/// One entity rendered as a resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub type_name: String,

    pub id: Uuid,

    pub attributes: IndexMap<String, Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub relationships: IndexMap<String, RelationshipObject>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<ResourceLinks>,
}

impl ResourceObject {
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier {
            type_name: self.type_name.clone(),
            id: self.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceLinks {
    #[serde(rename = "self")]
    pub self_link: String,
}

/// A relationship member: linkage plus links
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipObject {
    pub data: RelationshipData,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<RelationshipLinks>,
}

/// Resource linkage, shaped by cardinality
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// Cardinality one: identifier or null
    One(Option<ResourceIdentifier>),

    /// Cardinality many/unlimited: always an array, nulls kept in place
    Many(Vec<Option<ResourceIdentifier>>),
}

impl RelationshipData {
    /// Identifiers of the visible targets, in order
    pub fn identifiers(&self) -> Vec<&ResourceIdentifier> {
        match self {
            RelationshipData::One(identifier) => identifier.iter().collect(),
            RelationshipData::Many(identifiers) => identifiers.iter().flatten().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub related: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identifier(type_name: &str) -> ResourceIdentifier {
        ResourceIdentifier {
            type_name: type_name.to_string(),
            id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_relationship_data_shapes() {
        let one = serde_json::to_value(RelationshipData::One(None)).unwrap();
        assert_eq!(one, json!(null));

        let tag = identifier("taxonomy_term--tags");
        let many = serde_json::to_value(RelationshipData::Many(vec![Some(tag.clone()), None])).unwrap();
        assert_eq!(
            many,
            json!([{"type": "taxonomy_term--tags", "id": tag.id.to_string()}, null])
        );

        let empty = serde_json::to_value(RelationshipData::Many(vec![])).unwrap();
        assert_eq!(empty, json!([]));
    }

    #[test]
    fn test_identifiers_skip_nulls() {
        let a = identifier("user--user");
        let data = RelationshipData::Many(vec![None, Some(a.clone())]);
        assert_eq!(data.identifiers(), vec![&a]);
        assert!(RelationshipData::One(None).identifiers().is_empty());
    }

    #[test]
    fn test_document_omits_empty_members() {
        let document = Document {
            data: PrimaryDocumentData::Resource(None),
            included: vec![],
            meta: None,
            links: DocumentLinks::default(),
        };

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json, json!({"data": null}));
        assert!(document.errors().is_empty());
    }

    #[test]
    fn test_resource_object_serialization() {
        let id = Uuid::new_v4();
        let mut attributes = IndexMap::new();
        attributes.insert("title".to_string(), json!("dummy_title"));

        let resource = ResourceObject {
            type_name: "node--article".to_string(),
            id,
            attributes,
            relationships: IndexMap::new(),
            links: Some(ResourceLinks {
                self_link: "http://localhost/jsonapi/node/article/x".to_string(),
            }),
        };

        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], "node--article");
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["attributes"]["title"], "dummy_title");
        assert!(json.get("relationships").is_none());
        assert_eq!(json["links"]["self"], "http://localhost/jsonapi/node/article/x");
        assert_eq!(resource.identifier().type_name, "node--article");
    }
}
