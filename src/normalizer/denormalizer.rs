//! Request document denormalization
//!
//! Turns the `data` member of a create request into an unsaved [`Entity`].
//! Structural problems reject the whole payload; relationship entries that
//! do not resolve to an existing, acceptable target are dropped one by one.

use crate::core::entity::{Entity, EntityKey};
use crate::core::error::JsonApiError;
use crate::core::field::FieldDefinition;
use crate::core::resource_type::{ResourceType, ResourceTypeRepository, split_type_name};
use crate::core::service::EntityLoader;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Build an unsaved entity of `expected` from a request document
///
/// - `data.type`, when present, must equal the expected type name
/// - `data.id`, when present, must be a uuid and becomes the entity's uuid
/// - only writable, non-internal attribute fields are copied; other members
///   are ignored
/// - relationship linkage must be an object or null for cardinality one and
///   an array otherwise
pub fn denormalize(
    payload: &Value,
    expected: &ResourceType,
    resource_types: &dyn ResourceTypeRepository,
    loader: &dyn EntityLoader,
) -> Result<Entity, JsonApiError> {
    let data = payload
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("the document must contain a 'data' object"))?;

    if let Some(actual) = data.get("type") {
        let actual = actual
            .as_str()
            .ok_or_else(|| invalid("'data.type' must be a string"))?;
        if actual != expected.type_name() {
            return Err(JsonApiError::TypeMismatch {
                expected: expected.type_name().to_string(),
                actual: actual.to_string(),
            });
        }
    }

    let mut entity =
        Entity::new(expected.entity_type_id(), expected.bundle()).with_kind(expected.kind());

    if let Some(id) = data.get("id") {
        let uuid = id
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| invalid("'data.id' must be a uuid"))?;
        entity = entity.with_uuid(uuid);
    }

    if let Some(attributes) = data.get("attributes") {
        let attributes = attributes
            .as_object()
            .ok_or_else(|| invalid("'data.attributes' must be an object"))?;

        for (name, value) in attributes {
            match expected.field(name) {
                Some(field) if is_writable(field) && !field.is_relationship() => {
                    entity.set_attribute(name.as_str(), value.clone());
                }
                _ => tracing::debug!(
                    resource_type = %expected.type_name(),
                    attribute = %name,
                    "ignoring attribute that is not writable"
                ),
            }
        }
    }

    if let Some(relationships) = data.get("relationships") {
        let relationships = relationships
            .as_object()
            .ok_or_else(|| invalid("'data.relationships' must be an object"))?;

        for (name, member) in relationships {
            let Some(field) = expected.relationship(name).filter(|f| is_writable(f)) else {
                tracing::debug!(
                    resource_type = %expected.type_name(),
                    relationship = %name,
                    "ignoring relationship that is not writable"
                );
                continue;
            };

            let mut keys = Vec::new();
            for entry in linkage_entries(field, member)? {
                match resolve_entry(entry, field, resource_types, loader)? {
                    Some(key) => keys.push(key),
                    None => tracing::debug!(
                        relationship = %name,
                        entry = ?entry,
                        "dropping relationship entry that does not resolve"
                    ),
                }
            }
            entity.set_references(name.as_str(), keys);
        }
    }

    Ok(entity)
}

fn invalid(message: &str) -> JsonApiError {
    JsonApiError::InvalidPayload {
        message: message.to_string(),
    }
}

fn is_writable(field: &FieldDefinition) -> bool {
    field.writable && !field.internal
}

/// Entries of a relationship member's `data`, checked against cardinality
fn linkage_entries<'v>(
    field: &FieldDefinition,
    member: &'v Value,
) -> Result<Vec<&'v Map<String, Value>>, JsonApiError> {
    let data = member
        .get("data")
        .ok_or_else(|| invalid(&format!("relationship '{}' has no 'data' member", field.name)))?;
    let single = field.cardinality().is_some_and(|c| c.is_single());

    let entries: Vec<&Value> = match data {
        Value::Null if single => Vec::new(),
        Value::Object(_) if single => vec![data],
        Value::Array(items) if !single => items.iter().collect(),
        _ => {
            let expected = if single { "an object or null" } else { "an array" };
            return Err(invalid(&format!(
                "relationship '{}' data must be {}",
                field.name, expected
            )));
        }
    };

    entries
        .into_iter()
        .map(|entry| {
            entry.as_object().ok_or_else(|| {
                invalid(&format!(
                    "relationship '{}' entries must be resource identifiers",
                    field.name
                ))
            })
        })
        .collect()
}

/// Resolve one `{type, id}` entry to the key of an existing entity
///
/// `None` means the entry is dropped: unknown or unacceptable type, an id
/// that is not a uuid, or no such entity.
fn resolve_entry(
    entry: &Map<String, Value>,
    field: &FieldDefinition,
    resource_types: &dyn ResourceTypeRepository,
    loader: &dyn EntityLoader,
) -> Result<Option<EntityKey>, JsonApiError> {
    let (Some(type_name), Some(id)) = (
        entry.get("type").and_then(Value::as_str),
        entry.get("id").and_then(Value::as_str),
    ) else {
        return Ok(None);
    };

    if !field.accepts_target(type_name) || resource_types.get_by_type_name(type_name).is_none() {
        return Ok(None);
    }
    let Some((entity_type_id, bundle)) = split_type_name(type_name) else {
        return Ok(None);
    };
    let Ok(uuid) = Uuid::parse_str(id) else {
        return Ok(None);
    };

    let target = loader.load_by_uuid(entity_type_id, &uuid)?;
    Ok(target
        .filter(|entity| entity.bundle() == bundle)
        .and_then(|entity| entity.key()))
}
