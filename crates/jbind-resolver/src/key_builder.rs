//! Binding → key.
//!
//! Keys written here resolve back to the same binding against the same
//! symbol table. Type variables are written short (`TT;`) where the
//! surrounding method or type declares them, and qualified by their owner
//! (`Lp/X;:TT;`) everywhere else.

use crate::binding::Binding;
use crate::error::{ResolutionError, Result};
use crate::key::BindingKey;
use jbind_common::names;
use jbind_signature::{TypeParameter, TypeSignature};
use jbind_symbols::{
    FieldDescriptor, FieldId, MethodDescriptor, MethodId, SymbolTable, TypeId, TypeKey, TypeVarScope,
    VarOwner, WildcardBound,
};
use std::sync::Arc;
use tracing::trace;

pub struct KeyBuilder<'t> {
    table: &'t SymbolTable,
}

impl<'t> KeyBuilder<'t> {
    pub fn new(table: &'t SymbolTable) -> Self {
        Self { table }
    }

    pub fn key_of(&self, binding: &Binding) -> Result<BindingKey> {
        let mut out = String::new();
        self.write_binding(&mut out, binding)?;
        trace!(key = %out, "KeyBuilder::key_of");
        Ok(BindingKey::new(out))
    }

    pub fn type_key(&self, id: TypeId) -> Result<BindingKey> {
        self.key_of(&Binding::Type(id))
    }

    pub fn method_key(&self, id: MethodId) -> Result<BindingKey> {
        self.key_of(&Binding::Method(id))
    }

    fn write_binding(&self, out: &mut String, binding: &Binding) -> Result<()> {
        match binding {
            Binding::Package(name) => out.push_str(&names::qualified_to_internal(name)),
            Binding::Type(id) => self.write_type(out, *id, &TypeVarScope::new())?,
            Binding::Method(id) => self.write_method(out, *id)?,
            Binding::Field(id) => {
                let field = self.field(*id)?;
                self.write_type(out, field.declaring_type, &TypeVarScope::new())?;
                out.push('.');
                out.push_str(&field.name);
                out.push(')');
                let scope = self.table.type_scope(field.declaring_type)?;
                self.write_type(out, field.ty, &scope)?;
            }
            Binding::LocalVariable(local) => {
                self.write_method(out, local.method)?;
                out.push('#');
                out.push_str(&local.name);
                out.push('#');
                out.push_str(&local.occurrence.to_string());
                if let Some(position) = local.position {
                    out.push('#');
                    out.push_str(&position.to_string());
                }
            }
            Binding::Annotation { owner, annotation } => {
                self.write_binding(out, owner)?;
                out.push('@');
                self.write_type(out, annotation.annotation_type, &TypeVarScope::new())?;
            }
        }
        Ok(())
    }

    fn write_type(&self, out: &mut String, id: TypeId, scope: &TypeVarScope) -> Result<()> {
        let key = self
            .table
            .type_key(id)
            .ok_or_else(|| ResolutionError::unresolved(id.to_string()))?;
        match key {
            TypeKey::Primitive(base) => out.push(base.code()),
            TypeKey::Declared(_) | TypeKey::Parameterized { .. } => {
                self.write_class(out, id, scope)?;
                out.push(';');
            }
            TypeKey::Array { leaf, dimensions } => {
                for _ in 0..dimensions {
                    out.push('[');
                }
                self.write_type(out, leaf, scope)?;
            }
            TypeKey::TypeVariable { owner, .. } => {
                let name = self.name(id)?;
                if scope.lookup(&name) != Some(id) {
                    match owner {
                        VarOwner::Type(ty) => self.write_type(out, ty, &TypeVarScope::new())?,
                        VarOwner::Method(method) => self.write_method(out, method)?,
                    }
                    out.push(':');
                }
                out.push('T');
                out.push_str(&name);
                out.push(';');
            }
            TypeKey::Wildcard {
                generic,
                rank,
                bound,
            } => {
                self.write_type(out, generic, &TypeVarScope::new())?;
                out.push('{');
                out.push_str(&rank.to_string());
                out.push('}');
                match bound {
                    WildcardBound::Unbounded => out.push('*'),
                    WildcardBound::Extends(bound) => {
                        out.push('+');
                        self.write_type(out, bound, scope)?;
                    }
                    WildcardBound::Super(bound) => {
                        out.push('-');
                        self.write_type(out, bound, scope)?;
                    }
                }
            }
            TypeKey::Capture { wildcard, position } => {
                out.push('!');
                self.write_type(out, wildcard, scope)?;
                out.push_str(&position.to_string());
                out.push(';');
            }
        }
        Ok(())
    }

    /// Class key without the closing `;`. Member types of parameterized
    /// types continue their enclosing type's key after a `.`.
    fn write_class(&self, out: &mut String, id: TypeId, scope: &TypeVarScope) -> Result<()> {
        match self.table.type_key(id) {
            Some(TypeKey::Parameterized {
                generic,
                arguments,
                enclosing,
            }) => {
                let generic_name = self.name(generic)?;
                match enclosing {
                    Some(enclosing) => {
                        self.write_class(out, enclosing, scope)?;
                        let outer = self.name(self.table.declaration_of(enclosing))?;
                        let member = generic_name
                            .strip_prefix(&*outer)
                            .and_then(|rest| rest.strip_prefix('$'))
                            .unwrap_or_else(|| names::simple_name(&generic_name));
                        out.push('.');
                        out.push_str(member);
                    }
                    None => {
                        out.push('L');
                        out.push_str(&names::qualified_to_internal(&generic_name));
                    }
                }
                if !arguments.is_empty() {
                    out.push('<');
                    for argument in arguments {
                        self.write_type(out, argument, scope)?;
                    }
                    out.push('>');
                }
            }
            Some(TypeKey::Declared(_)) => {
                out.push('L');
                out.push_str(&names::qualified_to_internal(&self.name(id)?));
            }
            _ => return Err(ResolutionError::unresolved(format!("class type {id}"))),
        }
        Ok(())
    }

    fn write_method(&self, out: &mut String, id: MethodId) -> Result<()> {
        let method = self.method(id)?;
        self.write_type(out, method.declaring_type, &TypeVarScope::new())?;
        out.push('.');
        if !method.is_constructor {
            out.push_str(&method.selector);
        }
        if !method.type_variables.is_empty() {
            out.push('<');
            for &var in &method.type_variables {
                out.push_str(&self.type_parameter(var)?.to_string());
            }
            out.push('>');
        }
        let scope = self.table.method_scope(id)?;
        out.push('(');
        for &parameter in &method.parameter_types {
            self.write_type(out, parameter, &scope)?;
        }
        out.push(')');
        self.write_type(out, method.return_type, &scope)?;
        for &thrown in &method.thrown_types {
            out.push('|');
            self.write_type(out, thrown, &scope)?;
        }
        Ok(())
    }

    /// A method type variable in declaration form, `T:Ljava/lang/Object;`.
    fn type_parameter(&self, var: TypeId) -> Result<TypeParameter> {
        let mut bounds = self
            .table
            .type_variable_bounds(var)
            .into_iter()
            .filter_map(|bound| self.table.to_signature(bound));
        let class_bound = bounds
            .next()
            .unwrap_or_else(|| TypeSignature::class(names::UNIVERSAL_ROOT));
        Ok(TypeParameter {
            name: self.name(var)?.to_string(),
            class_bound: Some(class_bound),
            interface_bounds: bounds.collect(),
        })
    }

    fn name(&self, id: TypeId) -> Result<Arc<str>> {
        self.table
            .qualified_name(id)
            .ok_or_else(|| ResolutionError::unresolved(id.to_string()))
    }

    fn method(&self, id: MethodId) -> Result<Arc<MethodDescriptor>> {
        self.table
            .method(id)
            .ok_or_else(|| ResolutionError::unresolved(format!("method #{}", id.0)))
    }

    fn field(&self, id: FieldId) -> Result<Arc<FieldDescriptor>> {
        self.table
            .field(id)
            .ok_or_else(|| ResolutionError::unresolved(format!("field #{}", id.0)))
    }
}
