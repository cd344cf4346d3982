//! Type snapshot cache
//!
//! Snapshots are keyed by (type, filter), built at most once per key, and
//! never evicted. The shard guard is released before a build starts, so
//! builds for different keys run in parallel while callers racing on the
//! same key wait on its cell.

use std::sync::Arc;

use dashmap::DashMap;
use mirror_types::{MemberFilter, MetadataProvider, Reflector, TypeHandle};
use once_cell::sync::{Lazy, OnceCell};

use crate::config::MirrorConfig;
use crate::snapshot::TypeSnapshot;

type SnapshotCell = Arc<OnceCell<Arc<TypeSnapshot>>>;

/// Memoized snapshots per (type, filter)
pub struct TypeCache {
    provider: Arc<dyn MetadataProvider>,
    default_filter: MemberFilter,
    entries: DashMap<(TypeHandle, MemberFilter), SnapshotCell>,
}

static GLOBAL: Lazy<TypeCache> = Lazy::new(TypeCache::new);

impl TypeCache {
    /// Empty cache over the default [`Reflector`]
    pub fn new() -> Self {
        Self::with_provider(Arc::new(Reflector::new()))
    }

    /// Empty cache over a custom provider
    pub fn with_provider(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            default_filter: MemberFilter::DEFAULT,
            entries: DashMap::new(),
        }
    }

    /// Empty cache sized from `[cache]`, filtering by `[members] default_filter`
    pub fn with_config(config: &MirrorConfig) -> Self {
        Self {
            provider: Arc::new(Reflector::new()),
            default_filter: config.default_filter(),
            entries: DashMap::with_capacity(config.cache.initial_capacity),
        }
    }

    /// Process-wide cache
    pub fn global() -> &'static TypeCache {
        &GLOBAL
    }

    /// Provider snapshots are built from
    pub fn provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.provider
    }

    /// Filter used by [`TypeCache::get`]
    pub fn default_filter(&self) -> MemberFilter {
        self.default_filter
    }

    /// Cached snapshot for `ty` under the default filter
    pub fn get(&self, ty: &TypeHandle) -> Arc<TypeSnapshot> {
        self.get_or_build(ty, self.default_filter)
    }

    /// Cached snapshot for (`ty`, `filter`), built on first request
    pub fn get_or_build(&self, ty: &TypeHandle, filter: MemberFilter) -> Arc<TypeSnapshot> {
        let cell = self
            .entries
            .entry((ty.clone(), filter))
            .or_default()
            .clone();
        cell.get_or_init(|| Arc::new(self.build(ty, filter))).clone()
    }

    /// Fresh snapshot, bypassing the cache
    pub fn build(&self, ty: &TypeHandle, filter: MemberFilter) -> TypeSnapshot {
        TypeSnapshot::build(Arc::clone(&self.provider), ty, filter)
    }

    /// Whether a snapshot for (`ty`, `filter`) has been built
    pub fn contains(&self, ty: &TypeHandle, filter: MemberFilter) -> bool {
        self.entries
            .get(&(ty.clone(), filter))
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Number of keys requested so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been requested
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cached snapshot from the process-wide cache
pub fn get_type_snapshot(ty: &TypeHandle, filter: MemberFilter) -> Arc<TypeSnapshot> {
    TypeCache::global().get_or_build(ty, filter)
}

/// Uncached snapshot built with the process-wide cache's provider
pub fn build_type_snapshot(ty: &TypeHandle, filter: MemberFilter) -> TypeSnapshot {
    TypeCache::global().build(ty, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_types::{FieldDefinition, TypeBuilder};

    #[test]
    fn test_same_key_same_snapshot() {
        let cache = TypeCache::new();
        let ty = TypeBuilder::class("Cached")
            .field(FieldDefinition::new("x", TypeHandle::i32()))
            .finish()
            .unwrap();

        assert!(!cache.contains(&ty, MemberFilter::DEFAULT));
        let first = cache.get_or_build(&ty, MemberFilter::DEFAULT);
        let second = cache.get_or_build(&ty, MemberFilter::DEFAULT);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains(&ty, MemberFilter::DEFAULT));

        let other = cache.get_or_build(&ty, MemberFilter::ALL);
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_uses_default_filter() {
        let cache = TypeCache::new();
        assert_eq!(cache.default_filter(), MemberFilter::DEFAULT);
        let ty = TypeBuilder::class("Defaulted").finish().unwrap();
        let snapshot = cache.get(&ty);
        assert_eq!(snapshot.filter(), MemberFilter::DEFAULT);
        assert!(Arc::ptr_eq(&snapshot, &cache.get_or_build(&ty, MemberFilter::DEFAULT)));
    }

    #[test]
    fn test_build_bypasses_cache() {
        let cache = TypeCache::new();
        let ty = TypeBuilder::class("Uncached").finish().unwrap();
        let _ = cache.build(&ty, MemberFilter::DEFAULT);
        assert!(cache.is_empty());
    }
}
