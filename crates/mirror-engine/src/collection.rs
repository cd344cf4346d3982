//! Name-keyed member collections with hiding resolution

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::accessor::Accessor;

/// Insertion-ordered accessors keyed by member name
///
/// When a derived type redeclares a base member's name, only the derived
/// accessor is kept, in the position of whichever came first.
#[derive(Debug, Clone, Default)]
pub struct MemberCollection {
    entries: IndexMap<String, Accessor>,
}

impl MemberCollection {
    /// Build a collection, resolving hidden members
    pub fn build(accessors: impl IntoIterator<Item = Accessor>) -> Self {
        let mut entries: IndexMap<String, Accessor> = IndexMap::new();
        for accessor in accessors {
            match entries.get_mut(accessor.name()) {
                None => {
                    entries.insert(accessor.name().to_string(), accessor);
                }
                Some(existing) => {
                    let hides = accessor.declaring() != existing.declaring()
                        && accessor.declaring().is_subtype_of(existing.declaring());
                    let (kept, dropped) = if hides {
                        (accessor.declaring().clone(), existing.declaring().clone())
                    } else {
                        (existing.declaring().clone(), accessor.declaring().clone())
                    };
                    tracing::trace!(
                        member = accessor.name(),
                        kept = %kept,
                        hidden = %dropped,
                        "dropping hidden member"
                    );
                    if hides {
                        *existing = accessor;
                    }
                }
            }
        }
        Self { entries }
    }

    /// Accessor for `name`
    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.entries.get(name)
    }

    /// Whether `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no members
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Member names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Accessors in order
    pub fn iter(&self) -> impl Iterator<Item = &Accessor> {
        self.entries.values()
    }
}

impl<'a> IntoIterator for &'a MemberCollection {
    type Item = &'a Accessor;
    type IntoIter = indexmap::map::Values<'a, String, Accessor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl PartialEq for MemberCollection {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(name, accessor)| other.get(name) == Some(accessor))
    }
}

impl Eq for MemberCollection {}

impl Hash for MemberCollection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Wrapping sum of per-entry hashes does not depend on order.
        let combined = self.entries.iter().fold(0u64, |acc, (name, accessor)| {
            let mut hasher = FxHasher::default();
            name.hash(&mut hasher);
            accessor.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        });
        state.write_usize(self.entries.len());
        state.write_u64(combined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_types::{FieldDefinition, TypeBuilder, TypeHandle};

    fn entry_hash(collection: &MemberCollection) -> u64 {
        let mut hasher = FxHasher::default();
        collection.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_derived_member_hides_base() {
        let base = TypeBuilder::class("B")
            .field(FieldDefinition::new("m", TypeHandle::i32()))
            .field(FieldDefinition::new("other", TypeHandle::i32()))
            .finish()
            .unwrap();
        let derived = TypeBuilder::class("D")
            .extends(&base)
            .field(FieldDefinition::new("m", TypeHandle::string()))
            .finish()
            .unwrap();

        let base_m = Accessor::for_field(&base.declared_fields()[0]);
        let other = Accessor::for_field(&base.declared_fields()[1]);
        let derived_m = Accessor::for_field(&derived.declared_fields()[0]);

        // Base first: the derived member takes over the first slot.
        let collection = MemberCollection::build(vec![base_m.clone(), other.clone(), derived_m.clone()]);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get("m"), Some(&derived_m));
        assert_eq!(collection.names().collect::<Vec<_>>(), vec!["m", "other"]);

        // Derived first: the base member is dropped.
        let collection = MemberCollection::build(vec![derived_m.clone(), base_m, other]);
        assert_eq!(collection.get("m"), Some(&derived_m));
    }

    #[test]
    fn test_equality_ignores_order() {
        let ty = TypeBuilder::class("Pair")
            .field(FieldDefinition::new("a", TypeHandle::i32()))
            .field(FieldDefinition::new("b", TypeHandle::i32()))
            .finish()
            .unwrap();
        let a = Accessor::for_field(&ty.declared_fields()[0]);
        let b = Accessor::for_field(&ty.declared_fields()[1]);

        let forward = MemberCollection::build(vec![a.clone(), b.clone()]);
        let backward = MemberCollection::build(vec![b, a.clone()]);
        assert_eq!(forward, backward);
        assert_eq!(entry_hash(&forward), entry_hash(&backward));

        let partial = MemberCollection::build(vec![a]);
        assert_ne!(forward, partial);
    }
}
