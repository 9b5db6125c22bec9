//! The symbol table.
//!
//! Types are interned by structural key in a concurrent map with atomic
//! insert-if-absent, so any number of threads may reference a name for the
//! first time at once and all of them observe the same `TypeId`. Declared
//! types start out `Unloaded` and are completed from the `TypeProvider` on
//! first use; completion is serialized by a single table-wide lock and
//! re-checks the state under it, so each type is completed at most once.

use crate::descriptors::{
    FieldDescriptor, MethodDescriptor, MethodFlags, TypeDescriptor, TypeKind, TypeState,
};
use crate::error::{Result, SymbolError};
use crate::ids::{FieldId, MethodId, TypeId, TypeKey, VarOwner, WildcardBound};
use crate::provider::TypeProvider;
use crate::scope::TypeVarScope;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jbind_common::{ShardedInterner, names};
use jbind_signature::{BaseType, ClassTypeSignature, TypeArgument, TypeSignature};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::trace;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct TypeEntry {
    pub(crate) key: TypeKey,
    pub(crate) descriptor: Arc<TypeDescriptor>,
}

type SpecializationKey = (MethodId, SmallVec<[TypeId; 4]>, TypeId);

/// Shared, thread-safe symbol table over one `TypeProvider`.
pub struct SymbolTable {
    instance_id: u64,
    names: ShardedInterner,
    keys: DashMap<TypeKey, TypeId>,
    pub(crate) types: DashMap<TypeId, TypeEntry>,
    pub(crate) methods: DashMap<MethodId, Arc<MethodDescriptor>>,
    pub(crate) fields: DashMap<FieldId, Arc<FieldDescriptor>>,
    next_type: AtomicU32,
    next_method: AtomicU32,
    next_field: AtomicU32,
    pub(crate) provider: Arc<dyn TypeProvider>,
    pub(crate) load_lock: Mutex<()>,
    specializations: DashMap<SpecializationKey, MethodId>,
}

impl SymbolTable {
    pub fn new(provider: Arc<dyn TypeProvider>) -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(instance_id, "SymbolTable::new");
        let names = ShardedInterner::new();
        names.intern_common();
        let table = Self {
            instance_id,
            names,
            keys: DashMap::new(),
            types: DashMap::new(),
            methods: DashMap::new(),
            fields: DashMap::new(),
            next_type: AtomicU32::new(TypeId::FIRST_VALID),
            next_method: AtomicU32::new(1),
            next_field: AtomicU32::new(1),
            provider,
            load_lock: Mutex::new(()),
            specializations: DashMap::new(),
        };
        for base in BaseType::ALL {
            let id = TypeId::primitive(base);
            let descriptor = TypeDescriptor::new(id, Arc::from(base.keyword()), TypeKind::Primitive);
            table.types.insert(
                id,
                TypeEntry {
                    key: TypeKey::Primitive(base),
                    descriptor: Arc::new(descriptor),
                },
            );
            table.keys.insert(TypeKey::Primitive(base), id);
        }
        table
    }

    pub fn provider(&self) -> &Arc<dyn TypeProvider> {
        &self.provider
    }

    pub fn names(&self) -> &ShardedInterner {
        &self.names
    }

    /// Number of interned types, primitives included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn allocate_type(&self) -> TypeId {
        TypeId(self.next_type.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn allocate_method(&self) -> MethodId {
        MethodId(self.next_method.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn allocate_field(&self) -> FieldId {
        FieldId(self.next_field.fetch_add(1, Ordering::SeqCst))
    }

    /// Atomic insert-if-absent.
    ///
    /// `make` runs while the key's shard is write-locked: it may read
    /// descriptors but must not intern.
    fn intern(&self, key: TypeKey, make: impl FnOnce(TypeId) -> TypeDescriptor) -> TypeId {
        if let Some(id) = self.keys.get(&key) {
            return *id;
        }
        match self.keys.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.allocate_type();
                let descriptor = make(id);
                trace!(
                    instance_id = self.instance_id,
                    type_id = id.0,
                    name = %descriptor.qualified_name,
                    kind = ?descriptor.kind,
                    "SymbolTable::intern"
                );
                self.types.insert(
                    id,
                    TypeEntry {
                        key: entry.key().clone(),
                        descriptor: Arc::new(descriptor),
                    },
                );
                entry.insert(id);
                id
            }
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Intern a class, interface, enum or annotation type by qualified name
    /// without loading it.
    pub fn intern_declared(&self, qualified_name: &str) -> TypeId {
        let atom = self.names.intern(qualified_name);
        self.intern(TypeKey::Declared(atom), |id| {
            let mut descriptor =
                TypeDescriptor::new(id, Arc::from(qualified_name), TypeKind::Class);
            descriptor.state = TypeState::Unloaded;
            descriptor
        })
    }

    /// Intern and complete a declared type; unknown names are an error.
    pub fn lookup_type(&self, qualified_name: &str) -> Result<TypeId> {
        let id = self.intern_declared(qualified_name);
        self.complete(id)?;
        if self.state(id) == Some(TypeState::Missing) {
            return Err(SymbolError::unresolved(qualified_name));
        }
        Ok(id)
    }

    /// Id of an already-interned declared type, without interning.
    pub fn find_declared(&self, qualified_name: &str) -> Option<TypeId> {
        let atom = self.names.get(qualified_name)?;
        self.keys.get(&TypeKey::Declared(atom)).map(|id| *id)
    }

    pub fn type_key(&self, id: TypeId) -> Option<TypeKey> {
        self.types.get(&id).map(|e| e.key.clone())
    }

    /// Current snapshot without triggering completion.
    pub fn peek_descriptor(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.types.get(&id).map(|e| Arc::clone(&e.descriptor))
    }

    /// Snapshot of a type, completing declared types first.
    pub fn descriptor(&self, id: TypeId) -> Result<Arc<TypeDescriptor>> {
        self.complete(id)?;
        self.peek_descriptor(id)
            .ok_or_else(|| SymbolError::unresolved(id.to_string()))
    }

    pub fn qualified_name(&self, id: TypeId) -> Option<Arc<str>> {
        self.types
            .get(&id)
            .map(|e| Arc::clone(&e.descriptor.qualified_name))
    }

    pub(crate) fn state(&self, id: TypeId) -> Option<TypeState> {
        self.types.get(&id).map(|e| e.descriptor.state)
    }

    pub(crate) fn update_descriptor(&self, id: TypeId, f: impl FnOnce(&mut TypeDescriptor)) {
        if let Some(mut entry) = self.types.get_mut(&id) {
            f(Arc::make_mut(&mut entry.descriptor));
        }
    }

    pub fn method(&self, id: MethodId) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(&id).map(|m| Arc::clone(&m))
    }

    pub fn field(&self, id: FieldId) -> Option<Arc<FieldDescriptor>> {
        self.fields.get(&id).map(|f| Arc::clone(&f))
    }

    /// Methods declared by a type. Parameterized types report their generic
    /// type's methods.
    pub fn methods_of(&self, id: TypeId) -> Result<Vec<MethodId>> {
        let id = self.declaration_of(id);
        Ok(self.descriptor(id)?.methods.clone())
    }

    pub fn fields_of(&self, id: TypeId) -> Result<Vec<FieldId>> {
        let id = self.declaration_of(id);
        Ok(self.descriptor(id)?.fields.clone())
    }

    /// The declared type behind a parameterized type, or `id` itself.
    pub fn declaration_of(&self, id: TypeId) -> TypeId {
        match self.type_key(id) {
            Some(TypeKey::Parameterized { generic, .. }) => generic,
            _ => id,
        }
    }

    /// Superclass; for parameterized types with the type arguments
    /// substituted into the generic superclass.
    pub fn supertype(&self, id: TypeId) -> Result<Option<TypeId>> {
        match self.type_key(id) {
            Some(TypeKey::Parameterized { generic, .. }) => {
                let generic_super = self.descriptor(generic)?.supertype;
                let (params, args) = self.substitution_of(id)?;
                Ok(generic_super.map(|s| self.substitute(s, &params, &args)))
            }
            Some(_) => Ok(self.descriptor(id)?.supertype),
            None => Err(SymbolError::unresolved(id.to_string())),
        }
    }

    pub fn superinterfaces(&self, id: TypeId) -> Result<SmallVec<[TypeId; 2]>> {
        match self.type_key(id) {
            Some(TypeKey::Parameterized { generic, .. }) => {
                let generic_interfaces = self.descriptor(generic)?.superinterfaces.clone();
                let (params, args) = self.substitution_of(id)?;
                Ok(generic_interfaces
                    .iter()
                    .map(|&i| self.substitute(i, &params, &args))
                    .collect())
            }
            Some(_) => Ok(self.descriptor(id)?.superinterfaces.clone()),
            None => Err(SymbolError::unresolved(id.to_string())),
        }
    }

    // =========================================================================
    // Type construction
    // =========================================================================

    /// `dimensions` array levels around `component`; nested arrays flatten.
    pub fn array_of(&self, component: TypeId, dimensions: u32) -> TypeId {
        if dimensions == 0 {
            return component;
        }
        let (leaf, dimensions) = match self.type_key(component) {
            Some(TypeKey::Array {
                leaf,
                dimensions: inner,
            }) => (leaf, inner + dimensions),
            _ => (component, dimensions),
        };
        let element = if dimensions > 1 {
            self.array_of(leaf, dimensions - 1)
        } else {
            leaf
        };
        let object = self.intern_declared(names::UNIVERSAL_ROOT);
        let cloneable = self.intern_declared("java.lang.Cloneable");
        let serializable = self.intern_declared("java.io.Serializable");
        let leaf_name = self
            .qualified_name(leaf)
            .unwrap_or_else(|| Arc::from("?"));
        self.intern(TypeKey::Array { leaf, dimensions }, |id| {
            let mut name = String::with_capacity(leaf_name.len() + 2 * dimensions as usize);
            name.push_str(&leaf_name);
            for _ in 0..dimensions {
                name.push_str("[]");
            }
            let mut descriptor = TypeDescriptor::new(id, Arc::from(name), TypeKind::Array);
            descriptor.component_type = Some(element);
            descriptor.supertype = Some(object);
            descriptor.superinterfaces.push(cloneable);
            descriptor.superinterfaces.push(serializable);
            descriptor
        })
    }

    /// `generic<arguments>`, optionally as a member of a parameterized
    /// `enclosing` type. With no arguments and no enclosing type this is
    /// just `generic`.
    pub fn parameterized(
        &self,
        generic: TypeId,
        arguments: &[TypeId],
        enclosing: Option<TypeId>,
    ) -> TypeId {
        if arguments.is_empty() && enclosing.is_none() {
            return generic;
        }
        let name = self
            .qualified_name(generic)
            .unwrap_or_else(|| Arc::from("?"));
        let mut all_arguments: SmallVec<[TypeId; 2]> = SmallVec::new();
        if let Some(enclosing) = enclosing {
            if let Some(desc) = self.peek_descriptor(enclosing) {
                all_arguments.extend(desc.type_arguments.iter().copied());
            }
        }
        all_arguments.extend(arguments.iter().copied());
        let key = TypeKey::Parameterized {
            generic,
            arguments: arguments.iter().copied().collect(),
            enclosing,
        };
        self.intern(key, |id| {
            let mut descriptor = TypeDescriptor::new(id, name, TypeKind::Parameterized);
            descriptor.type_arguments = all_arguments;
            descriptor.generic_type = Some(generic);
            descriptor.enclosing_type = enclosing;
            descriptor
        })
    }

    /// The wildcard at position `rank` of `generic`'s argument list.
    pub fn wildcard(&self, generic: TypeId, rank: u32, bound: WildcardBound) -> TypeId {
        let name = match bound {
            WildcardBound::Unbounded => "?".to_string(),
            WildcardBound::Extends(b) => format!("? extends {}", self.display_name(b)),
            WildcardBound::Super(b) => format!("? super {}", self.display_name(b)),
        };
        let object = self.intern_declared(names::UNIVERSAL_ROOT);
        self.intern(
            TypeKey::Wildcard {
                generic,
                rank,
                bound,
            },
            |id| {
                let mut descriptor = TypeDescriptor::new(id, Arc::from(name), TypeKind::Wildcard);
                descriptor.generic_type = Some(generic);
                descriptor.supertype = Some(match bound {
                    WildcardBound::Extends(b) => b,
                    _ => object,
                });
                descriptor
            },
        )
    }

    /// Capture of `wildcard` by the expression at `position`.
    pub fn capture(&self, wildcard: TypeId, position: u32) -> TypeId {
        let wildcard_name = self
            .qualified_name(wildcard)
            .unwrap_or_else(|| Arc::from("?"));
        let (generic, supertype) = match self.peek_descriptor(wildcard) {
            Some(desc) => (desc.generic_type, desc.supertype),
            None => (None, None),
        };
        self.intern(TypeKey::Capture { wildcard, position }, |id| {
            let name = format!("capture#{position}-of {wildcard_name}");
            let mut descriptor = TypeDescriptor::new(id, Arc::from(name), TypeKind::Capture);
            descriptor.generic_type = generic;
            descriptor.supertype = supertype;
            descriptor
        })
    }

    /// The type variable `name` declared by `owner`. Bounds are attached
    /// once the owner's signature has been converted.
    pub fn type_variable(&self, owner: VarOwner, name: &str) -> TypeId {
        let atom = self.names.intern(name);
        self.intern(TypeKey::TypeVariable { owner, name: atom }, |id| {
            TypeDescriptor::new(id, Arc::from(name), TypeKind::TypeVariable)
        })
    }

    /// First bound becomes the supertype, the rest the superinterfaces.
    pub(crate) fn set_type_variable_bounds(&self, var: TypeId, bounds: &[TypeId]) {
        let object = self.intern_declared(names::UNIVERSAL_ROOT);
        self.update_descriptor(var, |desc| {
            desc.supertype = Some(bounds.first().copied().unwrap_or(object));
            desc.superinterfaces = bounds.iter().skip(1).copied().collect();
        });
    }

    /// Bounds of a type variable in declaration order.
    pub fn type_variable_bounds(&self, var: TypeId) -> SmallVec<[TypeId; 2]> {
        let Some(desc) = self.peek_descriptor(var) else {
            return SmallVec::new();
        };
        desc.supertype
            .iter()
            .chain(desc.superinterfaces.iter())
            .copied()
            .collect()
    }

    /// Readable name with type arguments (`java.util.List<java.lang.String>`).
    pub fn display_name(&self, id: TypeId) -> String {
        let Some(key) = self.type_key(id) else {
            return id.to_string();
        };
        let name = self
            .qualified_name(id)
            .map(|n| n.to_string())
            .unwrap_or_default();
        match key {
            TypeKey::Parameterized {
                arguments,
                enclosing,
                generic,
            } => {
                let mut out = match enclosing {
                    Some(enclosing) => {
                        let generic_name = self
                            .qualified_name(generic)
                            .map(|n| n.to_string())
                            .unwrap_or_default();
                        format!(
                            "{}.{}",
                            self.display_name(enclosing),
                            names::simple_name(&generic_name)
                        )
                    }
                    None => name,
                };
                if !arguments.is_empty() {
                    out.push('<');
                    for (i, arg) in arguments.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&self.display_name(*arg));
                    }
                    out.push('>');
                }
                out
            }
            TypeKey::Array { leaf, dimensions } => {
                let mut out = self.display_name(leaf);
                for _ in 0..dimensions {
                    out.push_str("[]");
                }
                out
            }
            _ => name,
        }
    }

    // =========================================================================
    // Signatures
    // =========================================================================

    /// Convert a parsed signature into an interned type, resolving type
    /// variable names against `scope`.
    pub fn intern_signature(&self, signature: &TypeSignature, scope: &TypeVarScope) -> Result<TypeId> {
        match signature {
            TypeSignature::Base(base) => Ok(TypeId::primitive(*base)),
            TypeSignature::TypeVariable(name) => scope
                .lookup(name)
                .ok_or_else(|| SymbolError::unresolved(format!("type variable {name}"))),
            TypeSignature::Array {
                dimensions,
                component,
            } => {
                let leaf = self.intern_signature(component, scope)?;
                Ok(self.array_of(leaf, *dimensions))
            }
            TypeSignature::Class(class) => self.intern_class_signature(class, scope),
        }
    }

    fn intern_class_signature(&self, class: &ClassTypeSignature, scope: &TypeVarScope) -> Result<TypeId> {
        let mut name = names::internal_to_qualified(&class.package);
        if !name.is_empty() {
            name.push('.');
        }
        let mut current: Option<TypeId> = None;
        let mut parameterized = false;
        for (i, segment) in class.segments.iter().enumerate() {
            if i > 0 {
                name.push('$');
            }
            name.push_str(&segment.name);
            let generic = self.intern_declared(&name);
            if segment.arguments.is_empty() && !parameterized {
                current = Some(generic);
                continue;
            }
            let mut arguments: SmallVec<[TypeId; 2]> = SmallVec::new();
            for (rank, argument) in segment.arguments.iter().enumerate() {
                arguments.push(self.intern_type_argument(generic, rank as u32, argument, scope)?);
            }
            let enclosing = if parameterized { current } else { None };
            current = Some(self.parameterized(generic, &arguments, enclosing));
            parameterized = true;
        }
        current.ok_or_else(|| SymbolError::unresolved(class.qualified_name()))
    }

    fn intern_type_argument(
        &self,
        generic: TypeId,
        rank: u32,
        argument: &TypeArgument,
        scope: &TypeVarScope,
    ) -> Result<TypeId> {
        Ok(match argument {
            TypeArgument::Exact(ty) => self.intern_signature(ty, scope)?,
            TypeArgument::Unbounded => self.wildcard(generic, rank, WildcardBound::Unbounded),
            TypeArgument::Extends(ty) => {
                let bound = self.intern_signature(ty, scope)?;
                self.wildcard(generic, rank, WildcardBound::Extends(bound))
            }
            TypeArgument::Super(ty) => {
                let bound = self.intern_signature(ty, scope)?;
                self.wildcard(generic, rank, WildcardBound::Super(bound))
            }
        })
    }

    /// Signature form of an interned type. Bare wildcards and captures have
    /// none.
    pub fn to_signature(&self, id: TypeId) -> Option<TypeSignature> {
        match self.type_key(id)? {
            TypeKey::Primitive(base) => Some(TypeSignature::Base(base)),
            TypeKey::Declared(_) => Some(TypeSignature::class(&self.qualified_name(id)?)),
            TypeKey::Array { leaf, dimensions } => {
                Some(TypeSignature::array(self.to_signature(leaf)?, dimensions))
            }
            TypeKey::TypeVariable { .. } => {
                Some(TypeSignature::TypeVariable(self.qualified_name(id)?.to_string()))
            }
            TypeKey::Parameterized { .. } => Some(TypeSignature::Class(self.class_signature(id)?)),
            TypeKey::Wildcard { .. } | TypeKey::Capture { .. } => None,
        }
    }

    fn class_signature(&self, id: TypeId) -> Option<ClassTypeSignature> {
        match self.type_key(id)? {
            TypeKey::Declared(_) => Some(ClassTypeSignature::from_qualified(
                &self.qualified_name(id)?,
            )),
            TypeKey::Parameterized {
                generic,
                arguments,
                enclosing,
            } => {
                let generic_name = self.qualified_name(generic)?;
                let mut class = match enclosing {
                    Some(enclosing) => {
                        let mut outer = self.class_signature(enclosing)?;
                        let outer_name = self.qualified_name(self.declaration_of(enclosing))?;
                        let member = generic_name
                            .strip_prefix(&*outer_name)
                            .and_then(|rest| rest.strip_prefix('$'))
                            .unwrap_or_else(|| names::simple_name(&generic_name));
                        outer
                            .segments
                            .push(jbind_signature::SimpleClassType::new(member));
                        outer
                    }
                    None => ClassTypeSignature::from_qualified(&generic_name),
                };
                let mut converted = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    converted.push(self.type_argument_signature(argument)?);
                }
                if let Some(last) = class.segments.last_mut() {
                    last.arguments = converted;
                }
                Some(class)
            }
            _ => None,
        }
    }

    fn type_argument_signature(&self, id: TypeId) -> Option<TypeArgument> {
        match self.type_key(id)? {
            TypeKey::Wildcard { bound, .. } => Some(match bound {
                WildcardBound::Unbounded => TypeArgument::Unbounded,
                WildcardBound::Extends(b) => TypeArgument::Extends(self.to_signature(b)?),
                WildcardBound::Super(b) => TypeArgument::Super(self.to_signature(b)?),
            }),
            _ => Some(TypeArgument::Exact(self.to_signature(id)?)),
        }
    }

    // =========================================================================
    // Erasure and polymorphic methods
    // =========================================================================

    pub fn erasure(&self, id: TypeId) -> TypeId {
        match self.type_key(id) {
            Some(TypeKey::Parameterized { generic, .. }) => generic,
            Some(TypeKey::Array { leaf, dimensions }) => {
                let leaf = self.erasure(leaf);
                self.array_of(leaf, dimensions)
            }
            Some(TypeKey::TypeVariable { .. }) => match self.type_variable_bounds(id).first() {
                Some(&bound) if bound != id => self.erasure(bound),
                _ => self.intern_declared(names::UNIVERSAL_ROOT),
            },
            Some(TypeKey::Wildcard { bound, .. }) => match bound {
                WildcardBound::Extends(b) => self.erasure(b),
                _ => self.intern_declared(names::UNIVERSAL_ROOT),
            },
            Some(TypeKey::Capture { wildcard, .. }) => self.erasure(wildcard),
            _ => id,
        }
    }

    /// Synthetic specialization of a signature-polymorphic method for one
    /// call-site signature. Repeated requests return the same id.
    pub fn specialize_polymorphic(
        &self,
        method: MethodId,
        parameter_types: &[TypeId],
        return_type: TypeId,
    ) -> Result<MethodId> {
        let original = self
            .method(method)
            .ok_or_else(|| SymbolError::unresolved(format!("method #{}", method.0)))?;
        let key: SpecializationKey = (method, parameter_types.iter().copied().collect(), return_type);
        if let Some(existing) = self.specializations.get(&key) {
            return Ok(*existing);
        }
        match self.specializations.entry(key) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let id = self.allocate_method();
                let mut specialized = (*original).clone();
                specialized.id = id;
                specialized.parameter_types = parameter_types.iter().copied().collect();
                specialized.return_type = return_type;
                specialized.parameter_names.clear();
                specialized.locals.clear();
                specialized.flags |= MethodFlags::SYNTHETIC;
                specialized.original = Some(method);
                trace!(
                    original = method.0,
                    specialized = id.0,
                    selector = %original.selector,
                    "SymbolTable::specialize_polymorphic"
                );
                self.methods.insert(id, Arc::new(specialized));
                entry.insert(id);
                Ok(id)
            }
        }
    }
}
