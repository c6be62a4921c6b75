//! Cache metadata aggregation
//!
//! Every entity touched while building a document contributes its cache
//! tags, contexts and max-age, whether or not the current user may see it.
//! The merged result travels with the response so that a cached document is
//! invalidated when any contributor changes, including a change that would
//! make a previously denied entity visible.

use std::collections::BTreeSet;
use std::fmt;

/// Max-age of a cached document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxAge {
    /// Never expires on its own; only tag invalidation clears it
    #[default]
    Permanent,

    /// Expires after the given number of seconds (0 = uncacheable)
    Seconds(u32),
}

impl MaxAge {
    /// Seconds advertised for a permanent document in `Cache-Control`
    pub const PERMANENT_HTTP_SECONDS: u32 = 31_536_000;

    /// Combine two max-ages: the shortest one wins
    pub fn merge(self, other: MaxAge) -> MaxAge {
        match (self, other) {
            (MaxAge::Permanent, other) => other,
            (this, MaxAge::Permanent) => this,
            (MaxAge::Seconds(a), MaxAge::Seconds(b)) => MaxAge::Seconds(a.min(b)),
        }
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, MaxAge::Permanent)
    }

    /// Value for the `Cache-Control` response header
    pub fn cache_control(&self) -> String {
        match self {
            MaxAge::Permanent => format!("max-age={}", Self::PERMANENT_HTTP_SECONDS),
            MaxAge::Seconds(0) => "no-cache".to_string(),
            MaxAge::Seconds(s) => format!("max-age={}", s),
        }
    }
}

impl fmt::Display for MaxAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxAge::Permanent => write!(f, "permanent"),
            MaxAge::Seconds(s) => write!(f, "{}s", s),
        }
    }
}

/// Accumulator for cache tags, cache contexts and max-age
///
/// Tags and contexts are kept sorted and unique so that headers derived
/// from them are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheableMetadata {
    tags: BTreeSet<String>,
    contexts: BTreeSet<String>,
    max_age: MaxAge,
}

impl CacheableMetadata {
    /// Create an empty, permanent metadata set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper adding cache tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_tags(tags);
        self
    }

    /// Builder-style helper adding cache contexts
    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_contexts(contexts);
        self
    }

    /// Builder-style helper lowering the max-age
    pub fn with_max_age(mut self, max_age: MaxAge) -> Self {
        self.merge_max_age(max_age);
        self
    }

    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    pub fn add_contexts<I, S>(&mut self, contexts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts.extend(contexts.into_iter().map(Into::into));
    }

    pub fn merge_max_age(&mut self, max_age: MaxAge) {
        self.max_age = self.max_age.merge(max_age);
    }

    /// Merge another contribution into this accumulator
    pub fn merge(&mut self, other: &CacheableMetadata) {
        self.tags.extend(other.tags.iter().cloned());
        self.contexts.extend(other.contexts.iter().cloned());
        self.merge_max_age(other.max_age);
    }

    /// Take the accumulated metadata, leaving an empty permanent set behind
    pub fn drain(&mut self) -> CacheableMetadata {
        std::mem::take(self)
    }

    /// Sorted cache tags
    pub fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    /// Sorted cache contexts
    pub fn contexts(&self) -> Vec<&str> {
        self.contexts.iter().map(String::as_str).collect()
    }

    pub fn max_age(&self) -> MaxAge {
        self.max_age
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.contexts.is_empty() && self.max_age.is_permanent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_permanent_and_empty() {
        let meta = CacheableMetadata::new();
        assert!(meta.is_empty());
        assert_eq!(meta.max_age(), MaxAge::Permanent);
    }

    #[test]
    fn test_max_age_merge_takes_minimum() {
        assert_eq!(MaxAge::Permanent.merge(MaxAge::Permanent), MaxAge::Permanent);
        assert_eq!(MaxAge::Permanent.merge(MaxAge::Seconds(60)), MaxAge::Seconds(60));
        assert_eq!(MaxAge::Seconds(60).merge(MaxAge::Permanent), MaxAge::Seconds(60));
        assert_eq!(MaxAge::Seconds(60).merge(MaxAge::Seconds(10)), MaxAge::Seconds(10));
        assert_eq!(MaxAge::Seconds(0).merge(MaxAge::Seconds(10)), MaxAge::Seconds(0));
    }

    #[test]
    fn test_merge_unions_tags_and_contexts() {
        let mut meta = CacheableMetadata::new().with_tags(["node:1"]);
        let other = CacheableMetadata::new()
            .with_tags(["taxonomy_term:2", "node:1"])
            .with_contexts(["user.roles"])
            .with_max_age(MaxAge::Seconds(300));

        meta.merge(&other);

        assert_eq!(meta.tags(), vec!["node:1", "taxonomy_term:2"]);
        assert_eq!(meta.contexts(), vec!["user.roles"]);
        assert_eq!(meta.max_age(), MaxAge::Seconds(300));
    }

    #[test]
    fn test_drain_resets_accumulator() {
        let mut meta = CacheableMetadata::new()
            .with_tags(["node:1"])
            .with_max_age(MaxAge::Seconds(5));

        let drained = meta.drain();

        assert_eq!(drained.tags(), vec!["node:1"]);
        assert_eq!(drained.max_age(), MaxAge::Seconds(5));
        assert!(meta.is_empty());
    }

    #[test]
    fn test_cache_control_header() {
        assert_eq!(MaxAge::Permanent.cache_control(), "max-age=31536000");
        assert_eq!(MaxAge::Seconds(0).cache_control(), "no-cache");
        assert_eq!(MaxAge::Seconds(120).cache_control(), "max-age=120");
    }
}
