//! Query parameter parsing
//!
//! Splits a request's query string into the structural JSON:API parameters
//! (`fields[...]`, `include`), the reserved ones (`sort`, `page`, `filter`,
//! passed through untouched since they arrive already resolved) and custom
//! parameters, whose names must satisfy the custom parameter grammar.
//!
//! # Example
//! ```rust,ignore
//! // GET /jsonapi/node/article?fields[node--article]=title,uid&include=uid
//! let query = DocumentQuery::from_pairs(pairs)?;
//! assert_eq!(query.fields.get("node--article"), Some(&["title".into(), "uid".into()][..]));
//! assert_eq!(query.include.as_deref(), Some("uid"));
//! ```

use crate::core::error::JsonApiError;
use crate::core::member_name::{is_valid_custom_query_parameter, is_valid_member_name};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Requested fields per resource type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseFieldsets {
    fields: HashMap<String, Vec<String>>,
}

impl SparseFieldsets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper restricting a resource type to the given fields
    pub fn with<I, S>(mut self, type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(type_name, fields);
        self
    }

    pub fn insert<I, S>(&mut self, type_name: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .insert(type_name.into(), fields.into_iter().map(Into::into).collect());
    }

    /// Requested fields for a type, `None` when the client did not restrict it
    pub fn get(&self, type_name: &str) -> Option<&[String]> {
        self.fields.get(type_name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parsed query parameters of a document request
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub fields: SparseFieldsets,

    /// Raw include parameter (comma-separated dot paths)
    pub include: Option<String>,

    pub sort: Option<String>,

    /// `page[...]` members, e.g. `{"offset": "0", "limit": "50"}`
    pub page: IndexMap<String, String>,

    /// `filter[...]` members, keyed by their bracketed path
    pub filter: IndexMap<String, String>,

    /// Custom (implementation-specific) parameters
    pub custom: IndexMap<String, String>,
}

impl DocumentQuery {
    /// Parse raw `(key, value)` query pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, JsonApiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = DocumentQuery::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();
            let (family, member) = split_key(key);

            match family {
                "fields" => {
                    let type_name = member.ok_or_else(|| JsonApiError::InvalidQueryParameter {
                        name: key.to_string(),
                        message: "expected fields[{type}]".to_string(),
                    })?;
                    if !is_valid_member_name(type_name) {
                        return Err(JsonApiError::MalformedMemberName {
                            name: type_name.to_string(),
                            context: "fields parameter".to_string(),
                        });
                    }
                    query.fields.insert(type_name, parse_field_list(&value)?);
                }
                "include" => query.include = Some(value),
                "sort" => query.sort = Some(value),
                "page" => {
                    query.page.insert(member.unwrap_or_default().to_string(), value);
                }
                "filter" => {
                    query
                        .filter
                        .insert(member.unwrap_or_default().to_string(), value);
                }
                custom => {
                    if !is_valid_custom_query_parameter(custom) {
                        return Err(JsonApiError::InvalidQueryParameter {
                            name: custom.to_string(),
                            message: "custom query parameters must be valid member names \
                                      containing at least one non a-z character"
                                .to_string(),
                        });
                    }
                    query.custom.insert(key.to_string(), value);
                }
            }
        }

        Ok(query)
    }
}

/// Split `family[member]` into its parts
fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once('[') {
        Some((family, rest)) => (family, rest.strip_suffix(']')),
        None => (key, None),
    }
}

fn parse_field_list(value: &str) -> Result<Vec<String>, JsonApiError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            if is_valid_member_name(name) {
                Ok(name.to_string())
            } else {
                Err(JsonApiError::MalformedMemberName {
                    name: name.to_string(),
                    context: "fields parameter".to_string(),
                })
            }
        })
        .collect()
}
