//! Binding-key resolution.
//!
//! `BindingResolver` walks a parsed key against the symbol table. Each
//! resolver is one session: resolved keys are cached, and the warnings of
//! degraded resolutions (ambiguous overloads, synthesized locals,
//! polymorphic specializations) accumulate in `diagnostics()`.

use crate::binding::{Binding, LocalKind, LocalVariableBinding};
use crate::error::{ResolutionError, Result};
use crate::key::BindingKey;
use crate::key_parser::{
    BoundNode, ClassKeyNode, KeyRoot, MemberKey, MethodKeyNode, ParsedKey, TypeKeyNode,
    VariableOwnerNode, parse_key,
};
use jbind_annotations::add_standard_annotations;
use jbind_common::limits::KEY_CACHE_CAPACITY;
use jbind_common::{Diagnostic, diagnostic_codes, diagnostic_messages, format_message, names};
use jbind_symbols::{
    FieldId, MethodDescriptor, MethodId, SymbolTable, TypeId, TypeVarScope, WildcardBound,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Selector under which constructors are stored in the symbol table.
pub const CONSTRUCTOR_SELECTOR: &str = "<init>";

/// Knobs for the degraded resolution paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    /// Create synthetic bindings for locals the method does not declare.
    pub synthesize_missing_locals: bool,
    /// Specialize signature-polymorphic methods for unmatched call-site
    /// signatures.
    pub polymorphic_specialization: bool,
    /// Record a warning when several overloads match and the first is used.
    pub record_ambiguity_warnings: bool,
    /// Fail with `AmbiguousOverload` instead of using the first match.
    pub strict_overloads: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            synthesize_missing_locals: true,
            polymorphic_specialization: true,
            record_ambiguity_warnings: true,
            strict_overloads: false,
        }
    }
}

pub struct BindingResolver {
    table: Arc<SymbolTable>,
    options: ResolverOptions,
    cache: FxHashMap<Box<str>, Binding>,
    diagnostics: Vec<Diagnostic>,
}

impl BindingResolver {
    pub fn new(table: Arc<SymbolTable>) -> Self {
        Self::with_options(table, ResolverOptions::default())
    }

    pub fn with_options(table: Arc<SymbolTable>, options: ResolverOptions) -> Self {
        let mut cache = FxHashMap::default();
        cache.reserve(KEY_CACHE_CAPACITY);
        Self {
            table,
            options,
            cache,
            diagnostics: Vec::new(),
        }
    }

    pub fn table(&self) -> &Arc<SymbolTable> {
        &self.table
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Warnings and messages recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Number of keys in the resolution cache.
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn resolve_key(&mut self, key: &BindingKey) -> Result<Binding> {
        self.resolve(key.as_str())
    }

    /// Resolve `key` to a binding.
    ///
    /// Resolving the same key again returns the cached binding. Annotation
    /// bindings are rebuilt on every request and never cached.
    pub fn resolve(&mut self, key: &str) -> Result<Binding> {
        if let Some(binding) = self.cache.get(key) {
            trace!(key, "BindingResolver::resolve cache hit");
            return Ok(binding.clone());
        }
        debug!(key, "BindingResolver::resolve");
        let parsed = parse_key(key)?;
        let binding = self.resolve_parsed(key, &parsed)?;
        if !matches!(binding, Binding::Annotation { .. }) {
            self.cache.insert(key.into(), binding.clone());
        }
        Ok(binding)
    }

    fn resolve_parsed(&mut self, key: &str, parsed: &ParsedKey) -> Result<Binding> {
        let root = match &parsed.root {
            KeyRoot::Package(name) => return Ok(Binding::Package(Arc::from(name.as_str()))),
            KeyRoot::Type(root) => root,
        };
        let mut current = Binding::Type(self.resolve_type(key, root, &TypeVarScope::new())?);
        for member in &parsed.members {
            current = self.resolve_member(key, current, member)?;
        }
        Ok(current)
    }

    fn resolve_member(&mut self, key: &str, owner: Binding, member: &MemberKey) -> Result<Binding> {
        if let MemberKey::Annotation(annotation_type) = member {
            return self.resolve_annotation(owner, annotation_type);
        }
        match (member, &owner) {
            (MemberKey::Method(method), Binding::Type(ty)) => {
                Ok(Binding::Method(self.resolve_method(key, *ty, method)?))
            }
            (MemberKey::Field { name, ty: field_type }, Binding::Type(ty)) => {
                Ok(Binding::Field(self.resolve_field(key, *ty, name, field_type)?))
            }
            (MemberKey::TypeVariable(name), Binding::Type(ty)) => {
                Ok(Binding::Type(self.type_variable_of_type(*ty, name)?))
            }
            (MemberKey::TypeVariable(name), Binding::Method(method)) => {
                Ok(Binding::Type(self.type_variable_of_method(*method, name)?))
            }
            (MemberKey::Wildcard { rank, bound }, Binding::Type(ty)) => {
                let generic = self.table.declaration_of(*ty);
                let bound = self.resolve_bound(key, bound, &TypeVarScope::new())?;
                Ok(Binding::Type(self.table.wildcard(generic, *rank, bound)))
            }
            (
                MemberKey::LocalVariable {
                    name,
                    occurrence,
                    position,
                },
                Binding::Method(method),
            ) => Ok(Binding::LocalVariable(self.resolve_local(
                key,
                *method,
                name,
                *occurrence,
                *position,
            )?)),
            _ => Err(ResolutionError::unresolved(format!(
                "{member:?} of {owner:?}"
            ))),
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn resolve_type(&mut self, key: &str, node: &TypeKeyNode, scope: &TypeVarScope) -> Result<TypeId> {
        match node {
            TypeKeyNode::Base(base) => Ok(TypeId::primitive(*base)),
            TypeKeyNode::Array { dimensions, leaf } => {
                let leaf = self.resolve_type(key, leaf, scope)?;
                Ok(self.table.array_of(leaf, *dimensions))
            }
            TypeKeyNode::Class(class) => self.resolve_class(key, class, scope),
            TypeKeyNode::ScopedVariable(name) => scope
                .lookup(name)
                .ok_or_else(|| ResolutionError::unresolved(format!("type variable {name}"))),
            TypeKeyNode::Variable { owner, name } => match &**owner {
                VariableOwnerNode::Type(owner) => {
                    let owner = self.resolve_type(key, owner, scope)?;
                    self.type_variable_of_type(owner, name)
                }
                VariableOwnerNode::Method { owner, method } => {
                    let owner = self.resolve_type(key, owner, scope)?;
                    let method = self.resolve_method(key, owner, method)?;
                    self.type_variable_of_method(method, name)
                }
            },
            TypeKeyNode::Wildcard {
                generic,
                rank,
                bound,
            } => {
                let generic = self.resolve_type(key, generic, scope)?;
                let generic = self.table.declaration_of(generic);
                let bound = self.resolve_bound(key, bound, scope)?;
                Ok(self.table.wildcard(generic, *rank, bound))
            }
            TypeKeyNode::Capture { wildcard, position } => {
                let wildcard = self.resolve_type(key, wildcard, scope)?;
                Ok(self.table.capture(wildcard, *position))
            }
        }
    }

    /// Class keys resolve segment by segment, the same way the symbol table
    /// interns class signatures, so both produce the same ids.
    fn resolve_class(&mut self, key: &str, class: &ClassKeyNode, scope: &TypeVarScope) -> Result<TypeId> {
        let mut name = names::internal_to_qualified(&class.package);
        let mut current: Option<TypeId> = None;
        let mut parameterized = false;
        for (i, segment) in class.segments.iter().enumerate() {
            if i > 0 {
                name.push('$');
            } else if !name.is_empty() {
                name.push('.');
            }
            name.push_str(&segment.name);
            let generic = self.table.lookup_type(&name)?;
            if segment.arguments.is_empty() && !parameterized {
                current = Some(generic);
                continue;
            }
            let mut arguments: SmallVec<[TypeId; 2]> = SmallVec::new();
            for argument in &segment.arguments {
                arguments.push(self.resolve_type(key, argument, scope)?);
            }
            let enclosing = if parameterized { current } else { None };
            current = Some(self.table.parameterized(generic, &arguments, enclosing));
            parameterized = true;
        }
        current.ok_or_else(|| ResolutionError::unresolved(class.qualified_name()))
    }

    fn resolve_bound(&mut self, key: &str, bound: &BoundNode, scope: &TypeVarScope) -> Result<WildcardBound> {
        Ok(match bound {
            BoundNode::Unbounded => WildcardBound::Unbounded,
            BoundNode::Extends(ty) => WildcardBound::Extends(self.resolve_type(key, ty, scope)?),
            BoundNode::Super(ty) => WildcardBound::Super(self.resolve_type(key, ty, scope)?),
        })
    }

    fn type_variable_of_type(&self, owner: TypeId, name: &str) -> Result<TypeId> {
        let declaring = self.table.declaration_of(owner);
        let descriptor = self.table.descriptor(declaring)?;
        descriptor
            .type_parameters
            .iter()
            .copied()
            .find(|&var| self.table.qualified_name(var).as_deref() == Some(name))
            .ok_or_else(|| {
                ResolutionError::unresolved(format!("{}:{name}", descriptor.qualified_name))
            })
    }

    fn type_variable_of_method(&self, method: MethodId, name: &str) -> Result<TypeId> {
        let descriptor = self.method_descriptor(method)?;
        descriptor
            .type_variables
            .iter()
            .copied()
            .find(|&var| self.table.qualified_name(var).as_deref() == Some(name))
            .ok_or_else(|| ResolutionError::unresolved(format!("{}:{name}", descriptor.selector)))
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn method_descriptor(&self, method: MethodId) -> Result<Arc<MethodDescriptor>> {
        self.table
            .method(method)
            .ok_or_else(|| ResolutionError::unresolved(format!("method #{}", method.0)))
    }

    fn resolve_parameters(
        &mut self,
        key: &str,
        parameters: &[TypeKeyNode],
        scope: &TypeVarScope,
    ) -> Result<SmallVec<[TypeId; 4]>> {
        let mut resolved = SmallVec::new();
        for parameter in parameters {
            resolved.push(self.resolve_type(key, parameter, scope)?);
        }
        Ok(resolved)
    }

    /// Pick the method a key names.
    ///
    /// Parameters and return type must match exactly, resolved in each
    /// candidate's own type-variable scope. If several candidates match,
    /// the first declared wins. With no exact match a signature-polymorphic
    /// method of the same selector is specialized for the key's signature.
    fn resolve_method(&mut self, key: &str, owner: TypeId, node: &MethodKeyNode) -> Result<MethodId> {
        let declaring = self.table.declaration_of(owner);
        let selector = if node.selector.is_empty() {
            CONSTRUCTOR_SELECTOR
        } else {
            node.selector.as_str()
        };
        let candidates: Vec<Arc<MethodDescriptor>> = self
            .table
            .methods_of(declaring)?
            .into_iter()
            .filter_map(|id| self.table.method(id))
            .filter(|m| &*m.selector == selector)
            .collect();
        let qualified = format!(
            "{}.{selector}",
            self.table
                .qualified_name(declaring)
                .map(|n| n.to_string())
                .unwrap_or_default()
        );
        if candidates.is_empty() {
            return Err(ResolutionError::unresolved(qualified));
        }

        let mut exact = Vec::new();
        for candidate in &candidates {
            if !node.type_parameters.is_empty()
                && node.type_parameters.len() != candidate.type_variables.len()
            {
                continue;
            }
            let scope = self.table.method_scope(candidate.id)?;
            if self.signature_matches(key, node, candidate, &scope)? {
                exact.push(candidate.id);
            }
        }

        match exact.len() {
            0 => {}
            1 => return Ok(exact[0]),
            _ => return self.first_of_ambiguous(key, &qualified, &exact),
        }

        if self.options.polymorphic_specialization {
            if let Some(polymorphic) = candidates.iter().find(|m| m.is_polymorphic_signature()) {
                let scope = self.table.method_scope(polymorphic.id)?;
                let parameters = self.resolve_parameters(key, &node.parameters, &scope)?;
                let return_type = self.resolve_type(key, &node.return_type, &scope)?;
                let specialized =
                    self.table
                        .specialize_polymorphic(polymorphic.id, &parameters, return_type)?;
                debug!(key, original = polymorphic.id.0, specialized = specialized.0, "polymorphic specialization");
                self.diagnostics.push(Diagnostic::message(
                    key,
                    format_message(
                        diagnostic_messages::POLYMORPHIC_SPECIALIZATION,
                        &[&qualified, key],
                    ),
                    diagnostic_codes::POLYMORPHIC_SPECIALIZATION,
                ));
                return Ok(specialized);
            }
        }
        Err(ResolutionError::unresolved(qualified))
    }

    fn signature_matches(
        &mut self,
        key: &str,
        node: &MethodKeyNode,
        candidate: &MethodDescriptor,
        scope: &TypeVarScope,
    ) -> Result<bool> {
        let parameters = match self.resolve_parameters(key, &node.parameters, scope) {
            Ok(parameters) => parameters,
            Err(err) if err.is_unresolved() => {
                trace!(key, candidate = candidate.id.0, %err, "overload rejected");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        if parameters[..] != candidate.parameter_types[..] {
            return Ok(false);
        }
        match self.resolve_type(key, &node.return_type, scope) {
            Ok(return_type) => Ok(return_type == candidate.return_type),
            Err(err) if err.is_unresolved() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn first_of_ambiguous(&mut self, key: &str, qualified: &str, matching: &[MethodId]) -> Result<MethodId> {
        if self.options.strict_overloads {
            return Err(ResolutionError::AmbiguousOverload {
                selector: qualified.to_string(),
                candidates: matching.len(),
            });
        }
        warn!(key, candidates = matching.len(), "ambiguous overload, using the first match");
        if self.options.record_ambiguity_warnings {
            self.diagnostics.push(Diagnostic::warning(
                key,
                format_message(
                    diagnostic_messages::AMBIGUOUS_OVERLOAD,
                    &[&matching.len().to_string(), qualified],
                ),
                diagnostic_codes::AMBIGUOUS_OVERLOAD,
            ));
        }
        matching
            .first()
            .copied()
            .ok_or_else(|| ResolutionError::unresolved(qualified))
    }

    /// Fields match by name and by type, the type resolved in the declaring
    /// type's scope.
    fn resolve_field(&mut self, key: &str, owner: TypeId, name: &str, ty: &TypeKeyNode) -> Result<FieldId> {
        let declaring = self.table.declaration_of(owner);
        let scope = self.table.type_scope(declaring)?;
        let expected = self.resolve_type(key, ty, &scope)?;
        for id in self.table.fields_of(declaring)? {
            let Some(field) = self.table.field(id) else {
                continue;
            };
            if &*field.name == name && field.ty == expected {
                return Ok(id);
            }
        }
        let owner = self
            .table
            .qualified_name(declaring)
            .map(|n| n.to_string())
            .unwrap_or_default();
        Err(ResolutionError::unresolved(format!("{owner}.{name}")))
    }

    /// Parameters and declared locals resolve to real bindings; any other
    /// name becomes a synthetic binding keyed by method and position.
    fn resolve_local(
        &mut self,
        key: &str,
        method: MethodId,
        name: &str,
        occurrence: u32,
        position: Option<u32>,
    ) -> Result<LocalVariableBinding> {
        let descriptor = self.method_descriptor(method)?;
        if let Some(index) = descriptor.parameter_names.iter().position(|n| &**n == name) {
            return Ok(LocalVariableBinding {
                method,
                name: Arc::clone(&descriptor.parameter_names[index]),
                occurrence,
                position: Some(index as u32),
                ty: descriptor.parameter_types.get(index).copied(),
                kind: LocalKind::Parameter,
            });
        }
        if let Some(local) = descriptor
            .locals
            .iter()
            .filter(|l| &*l.name == name)
            .nth(occurrence as usize)
        {
            return Ok(LocalVariableBinding {
                method,
                name: Arc::clone(&local.name),
                occurrence,
                position,
                ty: Some(local.ty),
                kind: LocalKind::Declared,
            });
        }

        let method_name = format!(
            "{}.{}",
            self.table
                .qualified_name(descriptor.declaring_type)
                .map(|n| n.to_string())
                .unwrap_or_default(),
            descriptor.selector
        );
        if !self.options.synthesize_missing_locals {
            return Err(ResolutionError::unresolved(format!("{method_name}#{name}")));
        }
        let ty = position.and_then(|p| descriptor.parameter_types.get(p as usize).copied());
        debug!(key, local = name, ?position, "synthesizing local variable binding");
        self.diagnostics.push(Diagnostic::warning(
            key,
            format_message(diagnostic_messages::SYNTHESIZED_LOCAL, &[&method_name, name]),
            diagnostic_codes::SYNTHESIZED_LOCAL,
        ));
        Ok(LocalVariableBinding {
            method,
            name: Arc::from(name),
            occurrence,
            position,
            ty,
            kind: LocalKind::Synthetic,
        })
    }

    /// The annotation of a given type on an element, among its explicit
    /// annotations and the standard ones its tag bits imply.
    fn resolve_annotation(&mut self, owner: Binding, annotation_type: &ClassKeyNode) -> Result<Binding> {
        let type_name = annotation_type.qualified_name();
        let annotation_id = self.table.intern_declared(&type_name);
        let (explicit, tag_bits) = match &owner {
            Binding::Type(ty) => {
                let descriptor = self.table.descriptor(self.table.declaration_of(*ty))?;
                (descriptor.annotations.clone(), descriptor.tag_bits)
            }
            Binding::Method(method) => {
                let descriptor = self.method_descriptor(*method)?;
                (descriptor.annotations.clone(), descriptor.tag_bits)
            }
            Binding::Field(field) => {
                let descriptor = self
                    .table
                    .field(*field)
                    .ok_or_else(|| ResolutionError::unresolved(format!("field #{}", field.0)))?;
                (descriptor.annotations.clone(), descriptor.tag_bits)
            }
            other => {
                return Err(ResolutionError::unresolved(format!("@{type_name} on {other:?}")));
            }
        };
        add_standard_annotations(&explicit, tag_bits, &self.table)
            .into_iter()
            .find(|a| a.annotation_type == annotation_id)
            .map(|annotation| Binding::Annotation {
                owner: Box::new(owner),
                annotation,
            })
            .ok_or_else(|| ResolutionError::unresolved(format!("@{type_name}")))
    }
}
