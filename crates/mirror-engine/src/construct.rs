//! Constructor resolution and compiled factories
//!
//! Default construction, best-match parameterized construction, and copy
//! construction over the constructors a type declares directly. Primitive,
//! struct, enum, and nullable types are treated as having a trivial copy
//! constructor: copying them clones the value.

use std::fmt;
use std::sync::Arc;

use mirror_types::{
    ConstructorDef, MetadataProvider, ParamKind, PrimitiveKind, Reflector, TypeHandle, TypeKind,
    Value,
};
use once_cell::sync::Lazy;

use crate::binder::Signature;
use crate::config::MirrorConfig;
use crate::error::{Attempt, MirrorError, MirrorResult};

/// Compiled constructor
#[derive(Clone)]
pub struct Factory {
    ctor: Arc<ConstructorDef>,
    signature: Signature,
}

impl Factory {
    /// Compile a factory for `ctor`
    pub fn new(ctor: &Arc<ConstructorDef>) -> Self {
        Self {
            ctor: Arc::clone(ctor),
            signature: Signature::new(format!("{}::new", ctor.declaring.name()), &ctor.params),
        }
    }

    /// Constructor descriptor
    pub fn constructor(&self) -> &Arc<ConstructorDef> {
        &self.ctor
    }

    /// Type the factory produces
    pub fn declaring(&self) -> &TypeHandle {
        &self.ctor.declaring
    }

    /// Number of formal parameters (a variadic tail counts as one)
    pub fn arity(&self) -> usize {
        self.ctor.arity()
    }

    /// Construct an instance, writing back `ref`-style arguments into `args`
    pub fn invoke(&self, args: &mut [Value]) -> MirrorResult<Value> {
        let ty = &self.ctor.declaring;
        ensure_constructible(ty)?;
        if is_uninstantiable(ty) {
            return Err(MirrorError::NoMatchingConstructor {
                ty: ty.name().to_string(),
            });
        }

        let mut bound = self.signature.bind(args)?;
        let mut instance = ty.instantiate();
        let result = (self.ctor.body)(&mut instance, &mut bound);
        self.signature.write_back(&bound, args);
        result.map_err(|source| MirrorError::ConstructionRaised {
            ty: ty.name().to_string(),
            source,
        })?;
        Ok(instance)
    }

    /// Construct an instance from borrowed arguments
    pub fn create(&self, args: &[Value]) -> MirrorResult<Value> {
        let mut owned = args.to_vec();
        self.invoke(&mut owned)
    }
}

impl PartialEq for Factory {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ctor, &other.ctor)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("declaring", &self.ctor.declaring)
            .field("arity", &self.ctor.arity())
            .field("variadic", &self.ctor.is_variadic())
            .finish()
    }
}

/// Resolver behavior switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Consider non-public constructors too
    pub non_public: bool,
}

/// Constructor overload resolution over a metadata provider
#[derive(Clone)]
pub struct ConstructorResolver {
    provider: Arc<dyn MetadataProvider>,
    options: ResolverOptions,
}

impl ConstructorResolver {
    /// Public-only resolver over the default [`Reflector`]
    pub fn new() -> Self {
        Self::with_provider(Arc::new(Reflector::new()), ResolverOptions::default())
    }

    /// Resolver over a custom provider
    pub fn with_provider(provider: Arc<dyn MetadataProvider>, options: ResolverOptions) -> Self {
        Self { provider, options }
    }

    /// Resolver configured from the `[constructors]` section
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self::with_provider(
            Arc::new(Reflector::new()),
            ResolverOptions {
                non_public: config.constructors.non_public,
            },
        )
    }

    /// Active options
    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    fn candidates(&self, ty: &TypeHandle) -> Vec<Arc<ConstructorDef>> {
        self.provider
            .list_constructors(ty)
            .into_iter()
            .filter(|c| self.options.non_public || c.visibility.is_public())
            .collect()
    }

    // ========================================================================
    // Default construction
    // ========================================================================

    /// Constructor used for parameterless construction; `None` for value types
    fn resolve_default(&self, ty: &TypeHandle) -> MirrorResult<Option<Arc<ConstructorDef>>> {
        ensure_constructible(ty)?;
        if is_uninstantiable(ty) {
            return Err(no_default(ty));
        }
        if ty.is_value_type() {
            return Ok(None);
        }

        let candidates = self.candidates(ty);
        if let Some(ctor) = candidates.iter().find(|c| c.arity() == 0) {
            return Ok(Some(Arc::clone(ctor)));
        }
        let variadic: Vec<_> = candidates
            .iter()
            .filter(|c| c.arity() == 1 && c.is_variadic())
            .collect();
        match variadic.as_slice() {
            [] => Err(no_default(ty)),
            [only] => Ok(Some(Arc::clone(only))),
            many => Err(MirrorError::AmbiguousMatch {
                ty: ty.name().to_string(),
                candidates: many.len(),
            }),
        }
    }

    /// Whether `ty` can be constructed without arguments
    pub fn has_default_constructor(&self, ty: &TypeHandle) -> bool {
        self.resolve_default(ty).is_ok()
    }

    /// Construct with no arguments
    pub fn construct(&self, ty: &TypeHandle) -> MirrorResult<Value> {
        match self.resolve_default(ty)? {
            None => Ok(ty.default_value()),
            Some(ctor) => {
                log_selection(&ctor);
                Factory::new(&ctor).invoke(&mut [])
            }
        }
    }

    // ========================================================================
    // Parameterized construction
    // ========================================================================

    /// Select the constructor that best matches `args`
    pub fn resolve(&self, ty: &TypeHandle, args: &[Value]) -> MirrorResult<Arc<ConstructorDef>> {
        ensure_constructible(ty)?;
        if is_uninstantiable(ty) {
            return Err(no_default(ty));
        }

        let (variadic, exact): (Vec<_>, Vec<_>) = self
            .candidates(ty)
            .into_iter()
            .filter(|c| Signature::new(ty.name(), &c.params).accepts(args))
            .partition(|c| c.is_variadic());

        let ambiguous = |candidates: usize| MirrorError::AmbiguousMatch {
            ty: ty.name().to_string(),
            candidates,
        };
        match (exact.as_slice(), variadic.as_slice()) {
            ([only], _) => Ok(Arc::clone(only)),
            ([], []) => Err(no_match(ty)),
            ([], many) => {
                // Longest fixed prefix wins; a tie in shape is ambiguous.
                let widest = many.iter().map(|c| c.fixed_arity()).max().unwrap_or(0);
                let shaped: Vec<_> = many.iter().filter(|c| c.fixed_arity() == widest).collect();
                match shaped.as_slice() {
                    [only] => Ok(Arc::clone(only)),
                    tied => Err(ambiguous(tied.len())),
                }
            }
            (many, _) => most_specific(many)
                .cloned()
                .ok_or_else(|| ambiguous(many.len())),
        }
    }

    /// Construct with the best-matching constructor; `None` arguments are rejected
    pub fn construct_with(&self, ty: &TypeHandle, args: Option<&[Value]>) -> MirrorResult<Value> {
        let args = args.ok_or(MirrorError::NullArgument("args"))?;
        if args.is_empty() && ty.is_value_type() {
            ensure_constructible(ty)?;
            return Ok(ty.default_value());
        }
        let ctor = self.resolve(ty, args)?;
        log_selection(&ctor);
        Factory::new(&ctor).create(args)
    }

    // ========================================================================
    // Copy construction
    // ========================================================================

    fn copy_constructor(&self, ty: &TypeHandle) -> Option<Arc<ConstructorDef>> {
        self.candidates(ty).into_iter().find(|c| {
            matches!(c.params.as_slice(), [p] if p.kind == ParamKind::Normal && p.ty == *ty)
        })
    }

    /// Whether `ty` can be copy-constructed
    pub fn has_copy_constructor(&self, ty: &TypeHandle) -> bool {
        has_trivial_copy(ty) || self.copy_constructor(ty).is_some()
    }

    /// Copy `source` as an instance of `ty`
    pub fn copy(&self, ty: &TypeHandle, source: &Value) -> MirrorResult<Value> {
        if source.is_null() {
            return Ok(Value::Null);
        }
        if !ty.accepts(source) {
            return Err(MirrorError::TypeMismatch {
                expected: ty.name().to_string(),
                found: source.type_name(),
            });
        }
        if has_trivial_copy(ty) {
            return Ok(source.clone());
        }
        let ctor = self
            .copy_constructor(ty)
            .ok_or_else(|| MirrorError::NoCopyConstructor {
                ty: ty.name().to_string(),
            })?;
        log_selection(&ctor);
        Factory::new(&ctor).create(std::slice::from_ref(source))
    }
}

impl Default for ConstructorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConstructorResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorResolver")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn ensure_constructible(ty: &TypeHandle) -> MirrorResult<()> {
    if ty.is_generic_definition() || ty.is_metadata() {
        return Err(MirrorError::NotConstructible {
            ty: ty.name().to_string(),
        });
    }
    Ok(())
}

fn is_uninstantiable(ty: &TypeHandle) -> bool {
    ty.is_abstract() || ty.is_interface() || ty.is_static()
}

fn has_trivial_copy(ty: &TypeHandle) -> bool {
    match ty.kind() {
        TypeKind::Primitive(kind) => *kind != PrimitiveKind::Object,
        TypeKind::Struct | TypeKind::Enum | TypeKind::Nullable(_) => true,
        _ => false,
    }
}

fn most_specific(candidates: &[Arc<ConstructorDef>]) -> Option<&Arc<ConstructorDef>> {
    candidates.iter().find(|c| {
        candidates
            .iter()
            .all(|other| Arc::ptr_eq(c, other) || at_least_as_specific(c, other))
    })
}

fn at_least_as_specific(a: &ConstructorDef, b: &ConstructorDef) -> bool {
    a.params
        .iter()
        .zip(&b.params)
        .all(|(x, y)| x.ty.is_subtype_of(&y.ty))
}

fn no_default(ty: &TypeHandle) -> MirrorError {
    MirrorError::NoDefaultConstructor {
        ty: ty.name().to_string(),
    }
}

fn no_match(ty: &TypeHandle) -> MirrorError {
    MirrorError::NoMatchingConstructor {
        ty: ty.name().to_string(),
    }
}

fn log_selection(ctor: &ConstructorDef) {
    tracing::debug!(
        ty = %ctor.declaring,
        arity = ctor.arity(),
        variadic = ctor.is_variadic(),
        synthesized = ctor.synthesized,
        "selected constructor"
    );
}

// ============================================================================
// Free functions over the default resolver
// ============================================================================

static DEFAULT_RESOLVER: Lazy<ConstructorResolver> = Lazy::new(ConstructorResolver::new);

/// Whether `ty` can be constructed without arguments
pub fn has_default_constructor(ty: &TypeHandle) -> bool {
    DEFAULT_RESOLVER.has_default_constructor(ty)
}

/// Construct `ty` with no arguments
pub fn construct(ty: &TypeHandle) -> MirrorResult<Value> {
    DEFAULT_RESOLVER.construct(ty)
}

/// Construct `ty` with the constructor best matching `args`
pub fn construct_with(ty: &TypeHandle, args: Option<&[Value]>) -> MirrorResult<Value> {
    DEFAULT_RESOLVER.construct_with(ty, args)
}

/// [`construct`] reporting through an [`Attempt`]
pub fn try_construct(ty: &TypeHandle) -> Attempt<Value> {
    construct(ty).into()
}

/// [`construct_with`] reporting through an [`Attempt`]
pub fn try_construct_with(ty: &TypeHandle, args: Option<&[Value]>) -> Attempt<Value> {
    construct_with(ty, args).into()
}

/// Whether `ty` can be copy-constructed
pub fn has_copy_constructor(ty: &TypeHandle) -> bool {
    DEFAULT_RESOLVER.has_copy_constructor(ty)
}

/// Copy `source` as an instance of `ty`
pub fn copy(ty: &TypeHandle, source: &Value) -> MirrorResult<Value> {
    DEFAULT_RESOLVER.copy(ty, source)
}

/// [`copy`] reporting through an [`Attempt`]
pub fn try_copy(ty: &TypeHandle, source: &Value) -> Attempt<Value> {
    copy(ty, source).into()
}
