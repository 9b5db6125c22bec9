use jbind_symbols::{AnnotationBinding, FieldId, MethodId, TypeId};
use std::sync::Arc;

/// Result of resolving a binding key.
///
/// Types, methods and fields are interned handles, so two bindings for the
/// same element compare equal. Annotations are built on demand and compare
/// structurally.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    /// Dotted package name.
    Package(Arc<str>),
    Type(TypeId),
    Method(MethodId),
    Field(FieldId),
    LocalVariable(LocalVariableBinding),
    Annotation {
        owner: Box<Binding>,
        annotation: AnnotationBinding,
    },
}

impl Binding {
    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Binding::Type(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<MethodId> {
        match self {
            Binding::Method(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<FieldId> {
        match self {
            Binding::Field(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_local_variable(&self) -> Option<&LocalVariableBinding> {
        match self {
            Binding::LocalVariable(local) => Some(local),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&AnnotationBinding> {
        match self {
            Binding::Annotation { annotation, .. } => Some(annotation),
            _ => None,
        }
    }
}

/// How a local variable binding was obtained.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LocalKind {
    /// A declared parameter of the method.
    Parameter,
    /// A local the method declares.
    Declared,
    /// Not declared anywhere the table knows of; created from the key alone.
    Synthetic,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalVariableBinding {
    pub method: MethodId,
    pub name: Arc<str>,
    pub occurrence: u32,
    /// Parameter index for parameters; the key's position otherwise.
    pub position: Option<u32>,
    /// `None` for synthetic locals whose position is not a parameter index.
    pub ty: Option<TypeId>,
    pub kind: LocalKind,
}

impl LocalVariableBinding {
    pub fn is_synthetic(&self) -> bool {
        self.kind == LocalKind::Synthetic
    }

    pub fn is_parameter(&self) -> bool {
        self.kind == LocalKind::Parameter
    }
}
