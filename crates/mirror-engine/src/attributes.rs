//! Attribute lookup with inheritance folding

use mirror_types::{AttributeInstance, AttributeTarget, MetadataProvider, TypeHandle};

use crate::error::{MirrorError, MirrorResult};

/// Attribute queries for one declaration and its ancestry
///
/// The ancestry (base types for a type, overridden declarations for a method
/// or property) is collected once, most-derived first.
#[derive(Debug, Clone)]
pub struct AttributeQuery {
    levels: Vec<Vec<AttributeInstance>>,
}

impl AttributeQuery {
    /// Collect the declared attributes of `target` and each of its ancestors
    pub fn new(provider: &dyn MetadataProvider, target: AttributeTarget) -> Self {
        let mut levels = Vec::new();
        let mut current = Some(target);
        while let Some(target) = current {
            levels.push(provider.list_attributes(&target));
            current = target.parent();
        }
        Self { levels }
    }

    /// Number of declarations in the ancestry, the target included
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Whether an attribute of `kind` (or a subtype) applies
    pub fn has(&self, kind: &TypeHandle, inherit: bool) -> MirrorResult<bool> {
        Ok(!self.fold(kind, inherit, true)?.is_empty())
    }

    /// First applicable attribute of `kind`
    pub fn get(&self, kind: &TypeHandle, inherit: bool) -> MirrorResult<Option<AttributeInstance>> {
        Ok(self.fold(kind, inherit, true)?.into_iter().next())
    }

    /// Every applicable attribute of `kind`, most-derived declaration first
    pub fn get_all(&self, kind: &TypeHandle, inherit: bool) -> MirrorResult<Vec<AttributeInstance>> {
        self.fold(kind, inherit, false)
    }

    fn fold(
        &self,
        kind: &TypeHandle,
        inherit: bool,
        first_only: bool,
    ) -> MirrorResult<Vec<AttributeInstance>> {
        if !kind.is_attribute() {
            return Err(MirrorError::NotAnAttributeType {
                ty: kind.name().to_string(),
            });
        }

        let levels = if inherit { self.levels.len() } else { 1 };
        let mut found: Vec<AttributeInstance> = Vec::new();
        for (depth, level) in self.levels.iter().take(levels).enumerate() {
            for attribute in level {
                if !attribute.ty.is_subtype_of(kind) {
                    continue;
                }
                if depth > 0 {
                    let usage = attribute.ty.effective_attribute_usage();
                    if !usage.inherited {
                        continue;
                    }
                    if !usage.allow_multiple && found.iter().any(|f| f.ty == attribute.ty) {
                        continue;
                    }
                }
                found.push(attribute.clone());
                if first_only {
                    return Ok(found);
                }
            }
        }
        Ok(found)
    }
}
