//! Include paths and compound document resolution

use crate::core::entity::Entity;
use crate::core::error::JsonApiError;
use crate::core::identifier::ResourceIdentifier;
use crate::core::member_name::is_valid_member_name;
use crate::normalizer::document::ResourceObject;
use crate::normalizer::relationship;
use crate::normalizer::{Normalizable, Normalized, ResolutionContext};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Parsed `include` parameter
///
/// Paths are grouped by their first segment; the rest of each path becomes
/// the subtree to apply to the resources reached through that segment.
/// `include=uid,field_tags.parent,field_tags.vid` parses to:
///
/// ```text
/// uid
/// field_tags
/// ├── parent
/// └── vid
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncludeTree {
    children: IndexMap<String, IncludeTree>,
}

impl IncludeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list of dot paths
    ///
    /// Empty paths are skipped; every segment must be a valid member name.
    pub fn parse(include: &str) -> Result<Self, JsonApiError> {
        let mut tree = Self::new();

        for path in include.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let segments: Vec<&str> = path.split('.').collect();
            if let Some(bad) = segments.iter().find(|s| !is_valid_member_name(s)) {
                return Err(JsonApiError::MalformedMemberName {
                    name: bad.to_string(),
                    context: format!("include path '{}'", path),
                });
            }
            tree.insert_path(&segments);
        }

        Ok(tree)
    }

    /// Add one path, merging with existing branches
    pub fn insert_path(&mut self, segments: &[&str]) {
        if let Some((first, rest)) = segments.split_first() {
            self.children
                .entry(first.to_string())
                .or_default()
                .insert_path(rest);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, segment: &str) -> Option<&IncludeTree> {
        self.children.get(segment)
    }

    /// Top-level segments with their subtrees, in request order
    pub fn children(&self) -> impl Iterator<Item = (&str, &IncludeTree)> {
        self.children.iter().map(|(name, tree)| (name.as_str(), tree))
    }
}

/// Resolves `included` for one document
///
/// Keeps a document-wide seen set (primary resources are seeded into it, so
/// they are never repeated) and, while descending, the set of resources on
/// the current branch so reference cycles terminate.
pub struct IncludeResolver {
    seen: HashSet<ResourceIdentifier>,
    pointers: HashMap<ResourceIdentifier, String>,
    included: Vec<ResourceObject>,
}

impl IncludeResolver {
    /// Create a resolver knowing the primary resources and their pointers
    pub fn new(primary: impl IntoIterator<Item = (ResourceIdentifier, String)>) -> Self {
        let pointers: HashMap<_, _> = primary.into_iter().collect();
        Self {
            seen: pointers.keys().cloned().collect(),
            pointers,
            included: Vec::new(),
        }
    }

    /// Walk `tree` from every root and return the included resources
    pub fn resolve(
        mut self,
        roots: &[Arc<Entity>],
        tree: &IncludeTree,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Vec<ResourceObject>, JsonApiError> {
        if tree.is_empty() {
            return Ok(self.included);
        }

        for root in roots {
            let identifier = ResourceIdentifier::from_entity(root)?;
            let mut branch = HashSet::from([identifier]);
            self.descend(root, tree, &mut branch, ctx)?;
        }

        Ok(self.included)
    }

    fn descend(
        &mut self,
        host: &Arc<Entity>,
        tree: &IncludeTree,
        branch: &mut HashSet<ResourceIdentifier>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<(), JsonApiError> {
        let resource_type = ctx.resource_type_of(host)?;
        let host_pointer = self
            .pointers
            .get(&ResourceIdentifier::from_entity(host)?)
            .cloned()
            .unwrap_or_else(|| "/data".to_string());

        for (segment, subtree) in tree.children() {
            let Some(definition) = resource_type.relationship(segment) else {
                tracing::debug!(
                    resource_type = %resource_type.type_name(),
                    segment,
                    "ignoring include segment that is not a relationship"
                );
                continue;
            };

            let resolved = relationship::resolve(host, definition, &host_pointer, ctx)?;

            for target in &resolved.visible {
                if !ctx.is_exposed(target) {
                    continue;
                }

                let identifier = ResourceIdentifier::from_entity(target)?;

                if self.seen.insert(identifier.clone()) {
                    let pointer = format!("/included/{}", self.included.len());
                    if let Normalized::Resource(resource) =
                        Normalizable::entity(target).normalize(&pointer, ctx)?
                    {
                        self.included.push(resource);
                    }
                    self.pointers.insert(identifier.clone(), pointer);
                }

                if !subtree.is_empty() && branch.insert(identifier.clone()) {
                    self.descend(target, subtree, branch, ctx)?;
                    branch.remove(&identifier);
                }
            }
        }

        Ok(())
    }
}
