//! Type provider interface.
//!
//! Whatever decodes class files or source files hands declarations to the
//! symbol table and the hierarchy builder through `TypeProvider`. Declarations
//! are plain serde data with names and signatures still unresolved; the
//! symbol table turns them into interned descriptors.

use crate::annotation::Constant;
use crate::descriptors::{FieldFlags, MethodFlags, TypeFlags, TypeKind};
use crate::error::ProviderError;
use crate::tag_bits::TagBits;
use indexmap::{IndexMap, IndexSet};
use jbind_common::names;
use jbind_signature::parse_class_signature;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::debug;

/// Source of type declarations.
///
/// Lookups are read-only and may be issued from several threads at once.
pub trait TypeProvider: Send + Sync {
    /// `Ok(None)` when the name is unknown to the provider.
    fn lookup_by_name(&self, qualified_name: &str) -> Result<Option<TypeDeclaration>, ProviderError>;

    /// Every name the provider can produce.
    fn known_type_names(&self) -> Vec<String>;

    /// Qualified names of the declared superclass and superinterfaces.
    fn declared_supertypes_of(&self, qualified_name: &str) -> Result<Vec<String>, ProviderError> {
        match self.lookup_by_name(qualified_name)? {
            Some(decl) => decl.supertype_names(),
            None => Ok(Vec::new()),
        }
    }

    /// Names of types that *may* declare a supertype with this simple name.
    ///
    /// Candidates are verified by the caller, so a provider backed by a
    /// name index can answer with false positives.
    fn reverse_lookup(&self, simple_name: &str) -> Result<Vec<String>, ProviderError> {
        let mut candidates = Vec::new();
        for name in self.known_type_names() {
            let Ok(supertypes) = self.declared_supertypes_of(&name) else {
                // Unreadable entries are still candidates; verification reports them.
                candidates.push(name);
                continue;
            };
            if supertypes
                .iter()
                .any(|s| names::simple_name(s) == simple_name)
            {
                candidates.push(name);
            }
        }
        Ok(candidates)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

impl DeclarationKind {
    pub fn type_kind(self) -> TypeKind {
        match self {
            DeclarationKind::Class => TypeKind::Class,
            DeclarationKind::Interface => TypeKind::Interface,
            DeclarationKind::Enum => TypeKind::Enum,
            DeclarationKind::Annotation => TypeKind::Annotation,
        }
    }

    /// Annotation types are interfaces too.
    pub fn is_interface(self) -> bool {
        matches!(self, DeclarationKind::Interface | DeclarationKind::Annotation)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDeclaration {
    /// Qualified binary name (`p.Outer$Inner`).
    pub name: String,
    #[serde(default)]
    pub kind: DeclarationKind,
    /// Generic class signature. Takes precedence over `superclass` and
    /// `interfaces` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub flags: TypeFlags,
    #[serde(default)]
    pub tag_bits: TagBits,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDeclaration>,
}

impl TypeDeclaration {
    pub fn new(name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            signature: None,
            superclass: None,
            interfaces: Vec::new(),
            flags: TypeFlags::empty(),
            tag_bits: TagBits::empty(),
            annotations: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, DeclarationKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, DeclarationKind::Interface)
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_tag_bits(mut self, tag_bits: TagBits) -> Self {
        self.tag_bits |= tag_bits;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationDeclaration) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_method(mut self, method: MethodDeclaration) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    /// Local or anonymous, from the flags or the binary name.
    pub fn is_local_or_anonymous(&self) -> bool {
        self.flags
            .intersects(TypeFlags::LOCAL | TypeFlags::ANONYMOUS)
            || names::is_local_name(&self.name)
            || names::is_anonymous_name(&self.name)
    }

    /// Declared superclass.
    ///
    /// Classes without one extend the universal root; interfaces never have
    /// a superclass even when their signature names `java.lang.Object`.
    pub fn superclass_name(&self) -> Result<Option<String>, ProviderError> {
        if self.kind.is_interface() || self.name == names::UNIVERSAL_ROOT {
            return Ok(None);
        }
        if let Some(signature) = &self.signature {
            let class = parse_class_signature(signature).map_err(|err| self.malformed(err))?;
            return Ok(Some(class.superclass.qualified_name()));
        }
        Ok(Some(
            self.superclass
                .clone()
                .unwrap_or_else(|| names::UNIVERSAL_ROOT.to_string()),
        ))
    }

    pub fn interface_names(&self) -> Result<Vec<String>, ProviderError> {
        if let Some(signature) = &self.signature {
            let class = parse_class_signature(signature).map_err(|err| self.malformed(err))?;
            return Ok(class
                .interfaces
                .iter()
                .map(|i| i.qualified_name())
                .collect());
        }
        Ok(self.interfaces.clone())
    }

    /// Superclass first, then superinterfaces in declaration order.
    pub fn supertype_names(&self) -> Result<Vec<String>, ProviderError> {
        let mut out = Vec::new();
        if let Some(superclass) = self.superclass_name()? {
            out.push(superclass);
        }
        out.extend(self.interface_names()?);
        Ok(out)
    }

    fn malformed(&self, err: impl std::fmt::Display) -> ProviderError {
        ProviderError::Malformed {
            name: self.name.clone(),
            reason: err.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDeclaration {
    /// `<init>` for constructors.
    pub selector: String,
    /// Method signature (`<T:..>(params)ret^throws`).
    pub signature: String,
    #[serde(default)]
    pub flags: MethodFlags,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locals: Vec<LocalDeclaration>,
    #[serde(default)]
    pub tag_bits: TagBits,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationDeclaration>,
}

impl MethodDeclaration {
    pub fn new(selector: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            signature: signature.into(),
            flags: MethodFlags::empty(),
            parameter_names: Vec::new(),
            locals: Vec::new(),
            tag_bits: TagBits::empty(),
            annotations: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_parameter_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_local(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        self.locals.push(LocalDeclaration {
            name: name.into(),
            signature: signature.into(),
        });
        self
    }

    pub fn with_tag_bits(mut self, tag_bits: TagBits) -> Self {
        self.tag_bits |= tag_bits;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationDeclaration) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalDeclaration {
    pub name: String,
    pub signature: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDeclaration {
    pub name: String,
    /// Field type signature.
    pub signature: String,
    #[serde(default)]
    pub flags: FieldFlags,
    #[serde(default)]
    pub tag_bits: TagBits,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationDeclaration>,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            flags: FieldFlags::empty(),
            tag_bits: TagBits::empty(),
            annotations: Vec::new(),
        }
    }

    pub fn with_tag_bits(mut self, tag_bits: TagBits) -> Self {
        self.tag_bits |= tag_bits;
        self
    }
}

/// An explicit annotation as written in the declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDeclaration {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub values: IndexMap<String, ElementValueDeclaration>,
}

impl AnnotationDeclaration {
    pub fn marker(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: IndexMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: ElementValueDeclaration) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementValueDeclaration {
    Constant { value: Constant },
    Enum { type_name: String, name: String },
    /// Class literal, as a type signature.
    Class { signature: String },
    Annotation { annotation: AnnotationDeclaration },
    Array { values: Vec<ElementValueDeclaration> },
}

// =============================================================================
// InMemoryTypeProvider
// =============================================================================

/// JSON corpus: `{ "types": [ TypeDeclaration, ... ] }`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TypeCorpus {
    pub types: Vec<TypeDeclaration>,
}

/// Provider over declarations held in memory.
///
/// Keeps a reverse index from supertype simple name to declaring types so
/// reverse lookups do not scan the corpus. Declarations whose supertypes
/// cannot be read are answered to every reverse lookup, so the caller's
/// verification reports them.
#[derive(Default)]
pub struct InMemoryTypeProvider {
    types: IndexMap<String, TypeDeclaration>,
    by_supertype: FxHashMap<String, Vec<String>>,
    unindexed: IndexSet<String>,
    unreadable: FxHashSet<String>,
}

impl InMemoryTypeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_declarations(declarations: impl IntoIterator<Item = TypeDeclaration>) -> Self {
        let mut provider = Self::new();
        for decl in declarations {
            provider.insert(decl);
        }
        provider
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let corpus: TypeCorpus = serde_json::from_str(json)?;
        debug!(types = corpus.types.len(), "loaded type corpus");
        Ok(Self::from_declarations(corpus.types))
    }

    pub fn from_reader(reader: impl Read) -> serde_json::Result<Self> {
        let corpus: TypeCorpus = serde_json::from_reader(reader)?;
        debug!(types = corpus.types.len(), "loaded type corpus");
        Ok(Self::from_declarations(corpus.types))
    }

    /// Add or replace a declaration.
    pub fn insert(&mut self, decl: TypeDeclaration) {
        if let Some(previous) = self.types.shift_remove(&decl.name) {
            for list in self.by_supertype.values_mut() {
                list.retain(|n| n != &previous.name);
            }
            self.unindexed.shift_remove(&previous.name);
        }
        match decl.supertype_names() {
            Ok(supertypes) => {
                for supertype in supertypes {
                    let simple = names::simple_name(&supertype).to_string();
                    let list = self.by_supertype.entry(simple).or_default();
                    if !list.contains(&decl.name) {
                        list.push(decl.name.clone());
                    }
                }
            }
            Err(err) => {
                debug!(name = %decl.name, %err, "declaration not reverse-indexed");
                self.unindexed.insert(decl.name.clone());
            }
        }
        self.types.insert(decl.name.clone(), decl);
    }

    /// Make every later lookup of `name` fail, as if its class file were corrupt.
    pub fn mark_unreadable(&mut self, name: impl Into<String>) {
        self.unreadable.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn to_corpus(&self) -> TypeCorpus {
        TypeCorpus {
            types: self.types.values().cloned().collect(),
        }
    }
}

impl TypeProvider for InMemoryTypeProvider {
    fn lookup_by_name(&self, qualified_name: &str) -> Result<Option<TypeDeclaration>, ProviderError> {
        if self.unreadable.contains(qualified_name) {
            return Err(ProviderError::Unreadable {
                name: qualified_name.to_string(),
                reason: "marked unreadable".to_string(),
            });
        }
        Ok(self.types.get(qualified_name).cloned())
    }

    fn known_type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    fn reverse_lookup(&self, simple_name: &str) -> Result<Vec<String>, ProviderError> {
        let mut candidates = self
            .by_supertype
            .get(simple_name)
            .cloned()
            .unwrap_or_default();
        candidates.extend(self.unindexed.iter().cloned());
        Ok(candidates)
    }
}
