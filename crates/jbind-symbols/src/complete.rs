//! Completing declared types from the provider.
//!
//! Completion reads a `TypeDeclaration`, interns everything it references
//! and publishes the descriptor and its members in one step. Referenced
//! types are interned but not completed; the enclosing type is completed
//! first because its type variables are in scope.

use crate::annotation::{AnnotationBinding, ElementValue};
use crate::descriptors::{
    FieldDescriptor, LocalVariableDescriptor, MethodDescriptor, TypeDescriptor, TypeFlags,
    TypeState,
};
use crate::error::{Result, SymbolError};
use crate::ids::{FieldId, MethodId, TypeId, TypeKey, VarOwner};
use crate::provider::{AnnotationDeclaration, ElementValueDeclaration, TypeDeclaration};
use crate::scope::TypeVarScope;
use crate::table::SymbolTable;
use jbind_common::names;
use jbind_signature::{
    MalformedSignatureError, TypeParameter, TypeSignature, parse_class_signature,
    parse_method_signature, parse_type_signature,
};
use smallvec::SmallVec;
use std::sync::{Arc, PoisonError};
use tracing::{debug, trace};

fn signature_error(owner: &str, source: MalformedSignatureError) -> SymbolError {
    SymbolError::Signature {
        owner: owner.to_string(),
        source,
    }
}

impl SymbolTable {
    /// Complete a declared type from the provider. No-op for every other
    /// kind of type and for types already completed.
    pub fn complete(&self, id: TypeId) -> Result<()> {
        let Some(entry) = self.types.get(&id) else {
            return Err(SymbolError::unresolved(id.to_string()));
        };
        // `Loading` means another thread holds the lock; wait for it.
        let needs_load = matches!(entry.key, TypeKey::Declared(_))
            && matches!(
                entry.descriptor.state,
                TypeState::Unloaded | TypeState::Loading
            );
        drop(entry);
        if !needs_load {
            return Ok(());
        }
        let _guard = self
            .load_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.load(id)
    }

    /// Caller holds `load_lock`, so `Loading` here means this thread is
    /// already completing `id` further up the stack.
    fn load(&self, id: TypeId) -> Result<()> {
        if self.state(id) != Some(TypeState::Unloaded) {
            return Ok(());
        }
        let Some(name) = self.qualified_name(id) else {
            return Err(SymbolError::unresolved(id.to_string()));
        };
        self.update_descriptor(id, |d| d.state = TypeState::Loading);

        let decl = match self.provider.lookup_by_name(&name) {
            Ok(Some(decl)) => decl,
            Ok(None) => {
                debug!(name = %name, "type not found by provider");
                self.update_descriptor(id, |d| d.state = TypeState::Missing);
                return Ok(());
            }
            Err(err) => {
                debug!(name = %name, %err, "type lookup failed");
                self.update_descriptor(id, |d| d.state = TypeState::Unloaded);
                return Err(err.into());
            }
        };

        match self.populate(id, &name, &decl) {
            Ok(()) => {
                trace!(
                    name = %name,
                    methods = decl.methods.len(),
                    fields = decl.fields.len(),
                    "type completed"
                );
                Ok(())
            }
            Err(err) => {
                self.update_descriptor(id, |d| d.state = TypeState::Unloaded);
                Err(err)
            }
        }
    }

    fn populate(&self, id: TypeId, name: &str, decl: &TypeDeclaration) -> Result<()> {
        let enclosing = names::enclosing_of(name).map(|outer| self.intern_declared(outer));
        let mut scope = TypeVarScope::new();
        if let Some(outer) = enclosing {
            if let Err(err) = self.load(outer) {
                debug!(name, %err, "enclosing type could not be completed");
            }
            self.collect_scope(outer, &mut scope);
        }

        let class_signature = match &decl.signature {
            Some(signature) => {
                Some(parse_class_signature(signature).map_err(|e| signature_error(name, e))?)
            }
            None => None,
        };

        let type_parameters = match &class_signature {
            Some(class) => self.declare_type_variables(
                VarOwner::Type(id),
                &class.type_parameters,
                &mut scope,
            )?,
            None => SmallVec::new(),
        };

        let superclass_name = decl.superclass_name()?;
        let supertype = match (&class_signature, superclass_name) {
            (_, None) => None,
            (Some(class), Some(_)) => Some(
                self.intern_signature(&TypeSignature::Class(class.superclass.clone()), &scope)?,
            ),
            (None, Some(superclass)) => Some(self.intern_declared(&superclass)),
        };
        let superinterfaces: SmallVec<[TypeId; 2]> = match &class_signature {
            Some(class) => class
                .interfaces
                .iter()
                .map(|i| self.intern_signature(&TypeSignature::Class(i.clone()), &scope))
                .collect::<Result<_>>()?,
            None => decl
                .interfaces
                .iter()
                .map(|i| self.intern_declared(i))
                .collect(),
        };

        let annotations = decl
            .annotations
            .iter()
            .map(|a| self.annotation_binding(a, &scope))
            .collect::<Result<Vec<_>>>()?;

        let mut methods: Vec<MethodDescriptor> = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            let method_id = self.allocate_method();
            let owner = format!("{name}.{}", method.selector);
            let signature =
                parse_method_signature(&method.signature).map_err(|e| signature_error(&owner, e))?;
            let mut method_scope = scope.clone();
            let type_variables = self.declare_type_variables(
                VarOwner::Method(method_id),
                &signature.type_parameters,
                &mut method_scope,
            )?;
            let parameter_types = signature
                .parameters
                .iter()
                .map(|p| self.intern_signature(p, &method_scope))
                .collect::<Result<SmallVec<[TypeId; 4]>>>()?;
            let return_type = self.intern_signature(&signature.return_type, &method_scope)?;
            let thrown_types = signature
                .throws
                .iter()
                .map(|t| self.intern_signature(t, &method_scope))
                .collect::<Result<_>>()?;
            let mut locals = Vec::with_capacity(method.locals.len());
            for local in &method.locals {
                let ty = parse_type_signature(&local.signature)
                    .map_err(|e| signature_error(&owner, e))?;
                locals.push(LocalVariableDescriptor {
                    name: Arc::from(local.name.as_str()),
                    ty: self.intern_signature(&ty, &method_scope)?,
                });
            }
            let annotations = method
                .annotations
                .iter()
                .map(|a| self.annotation_binding(a, &method_scope))
                .collect::<Result<Vec<_>>>()?;
            methods.push(MethodDescriptor {
                id: method_id,
                selector: Arc::from(method.selector.as_str()),
                declaring_type: id,
                parameter_types,
                return_type,
                type_variables,
                thrown_types,
                is_constructor: method.selector == "<init>",
                flags: method.flags,
                parameter_names: method
                    .parameter_names
                    .iter()
                    .map(|n| Arc::from(n.as_str()))
                    .collect(),
                locals,
                tag_bits: method.tag_bits,
                annotations,
                original: None,
            });
        }

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let owner = format!("{name}.{}", field.name);
            let signature =
                parse_type_signature(&field.signature).map_err(|e| signature_error(&owner, e))?;
            let annotations = field
                .annotations
                .iter()
                .map(|a| self.annotation_binding(a, &scope))
                .collect::<Result<Vec<_>>>()?;
            fields.push(FieldDescriptor {
                id: self.allocate_field(),
                name: Arc::from(field.name.as_str()),
                ty: self.intern_signature(&signature, &scope)?,
                declaring_type: id,
                flags: field.flags,
                tag_bits: field.tag_bits,
                annotations,
            });
        }

        // Publish members before the type flips to `Loaded`.
        let method_ids: Vec<MethodId> = methods.iter().map(|m| m.id).collect();
        let field_ids: Vec<FieldId> = fields.iter().map(|f| f.id).collect();
        for method in methods {
            self.methods.insert(method.id, Arc::new(method));
        }
        for field in fields {
            self.fields.insert(field.id, Arc::new(field));
        }

        let mut flags = decl.flags;
        if names::is_anonymous_name(name) {
            flags |= TypeFlags::ANONYMOUS;
        } else if names::is_local_name(name) {
            flags |= TypeFlags::LOCAL;
        } else if enclosing.is_some() {
            flags |= TypeFlags::MEMBER;
        }

        self.update_descriptor(id, |d: &mut TypeDescriptor| {
            d.kind = decl.kind.type_kind();
            d.state = TypeState::Loaded;
            d.type_parameters = type_parameters;
            d.supertype = supertype;
            d.superinterfaces = superinterfaces;
            d.enclosing_type = enclosing;
            d.flags = flags;
            d.tag_bits = decl.tag_bits;
            d.annotations = annotations;
            d.methods = method_ids;
            d.fields = field_ids;
        });
        Ok(())
    }

    /// Intern the variables first so bounds can refer to any of them
    /// (`<T extends Comparable<T>>`), then attach the bounds.
    fn declare_type_variables(
        &self,
        owner: VarOwner,
        parameters: &[TypeParameter],
        scope: &mut TypeVarScope,
    ) -> Result<SmallVec<[TypeId; 2]>> {
        let vars: SmallVec<[TypeId; 2]> = parameters
            .iter()
            .map(|p| self.type_variable(owner, &p.name))
            .collect();
        for (param, &var) in parameters.iter().zip(&vars) {
            scope.push(Arc::from(param.name.as_str()), var);
        }
        for (param, &var) in parameters.iter().zip(&vars) {
            let bounds = param
                .bounds()
                .map(|b| self.intern_signature(b, scope))
                .collect::<Result<SmallVec<[TypeId; 2]>>>()?;
            self.set_type_variable_bounds(var, &bounds);
        }
        Ok(vars)
    }

    /// Push the type variables visible inside `id`, outermost type first.
    /// Reads completed descriptors only.
    fn collect_scope(&self, id: TypeId, scope: &mut TypeVarScope) {
        let Some(desc) = self.peek_descriptor(id) else {
            return;
        };
        if let Some(outer) = desc.enclosing_type {
            self.collect_scope(outer, scope);
        }
        for &var in &desc.type_parameters {
            if let Some(name) = self.qualified_name(var) {
                scope.push(name, var);
            }
        }
    }

    /// Type variables visible inside a type: its own and its enclosing types'.
    pub fn type_scope(&self, id: TypeId) -> Result<TypeVarScope> {
        let id = self.declaration_of(id);
        self.complete(id)?;
        let mut scope = TypeVarScope::new();
        self.collect_scope(id, &mut scope);
        Ok(scope)
    }

    /// Type variables visible inside a method: its own, then its declaring
    /// type's scope.
    pub fn method_scope(&self, method: MethodId) -> Result<TypeVarScope> {
        let desc = self
            .method(method)
            .ok_or_else(|| SymbolError::unresolved(format!("method #{}", method.0)))?;
        let mut scope = self.type_scope(desc.declaring_type)?;
        for &var in &desc.type_variables {
            if let Some(name) = self.qualified_name(var) {
                scope.push(name, var);
            }
        }
        Ok(scope)
    }

    pub(crate) fn annotation_binding(
        &self,
        decl: &AnnotationDeclaration,
        scope: &TypeVarScope,
    ) -> Result<AnnotationBinding> {
        let mut binding = AnnotationBinding::marker(self.intern_declared(&decl.type_name));
        for (name, value) in &decl.values {
            binding
                .pairs
                .insert(Arc::from(name.as_str()), self.element_value(value, scope)?);
        }
        Ok(binding)
    }

    fn element_value(&self, decl: &ElementValueDeclaration, scope: &TypeVarScope) -> Result<ElementValue> {
        Ok(match decl {
            ElementValueDeclaration::Constant { value } => ElementValue::Constant(value.clone()),
            ElementValueDeclaration::Enum { type_name, name } => {
                ElementValue::enum_constant(self.intern_declared(type_name), name)
            }
            ElementValueDeclaration::Class { signature } => {
                let ty = parse_type_signature(signature)
                    .map_err(|e| signature_error("class literal", e))?;
                ElementValue::TypeLiteral(self.intern_signature(&ty, scope)?)
            }
            ElementValueDeclaration::Annotation { annotation } => {
                ElementValue::Annotation(Box::new(self.annotation_binding(annotation, scope)?))
            }
            ElementValueDeclaration::Array { values } => ElementValue::Array(
                values
                    .iter()
                    .map(|v| self.element_value(v, scope))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}
