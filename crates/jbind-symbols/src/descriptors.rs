//! Descriptor snapshots handed out by the symbol table.

use crate::annotation::AnnotationBinding;
use crate::ids::{FieldId, MethodId, TypeId};
use crate::tag_bits::TagBits;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Array,
    Primitive,
    TypeVariable,
    Wildcard,
    Capture,
    Parameterized,
}

impl TypeKind {
    /// Kinds that name a declaration (as opposed to a type built from others).
    pub fn is_declared(self) -> bool {
        matches!(
            self,
            TypeKind::Class | TypeKind::Interface | TypeKind::Enum | TypeKind::Annotation
        )
    }
}

/// Completion state of a declared type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeState {
    /// Interned by name, not yet looked up.
    Unloaded,
    /// Being completed on this thread.
    Loading,
    Loaded,
    /// The provider does not know the name.
    Missing,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TypeFlags: u32 {
        const PUBLIC = 1 << 0;
        const ABSTRACT = 1 << 1;
        const FINAL = 1 << 2;
        const STATIC = 1 << 3;
        const MEMBER = 1 << 4;
        const LOCAL = 1 << 5;
        const ANONYMOUS = 1 << 6;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MethodFlags: u32 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
        const ABSTRACT = 1 << 2;
        const VARARGS = 1 << 3;
        /// Signature-polymorphic: each call site gets its own specialization.
        const POLYMORPHIC_SIGNATURE = 1 << 4;
        const SYNTHETIC = 1 << 5;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FieldFlags: u32 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
        const FINAL = 1 << 2;
        const ENUM_CONSTANT = 1 << 3;
    }
}

/// Snapshot of an interned type.
///
/// `Parameterized` descriptors always carry type arguments: for a member type
/// of a parameterized type the enclosing type's arguments come first.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    pub id: TypeId,
    /// Binary qualified name. Parameterized types report their generic
    /// type's name; arrays append `[]` per dimension.
    pub qualified_name: Arc<str>,
    pub kind: TypeKind,
    pub state: TypeState,
    pub type_arguments: SmallVec<[TypeId; 2]>,
    /// Type variables declared by a generic type.
    pub type_parameters: SmallVec<[TypeId; 2]>,
    pub supertype: Option<TypeId>,
    pub superinterfaces: SmallVec<[TypeId; 2]>,
    pub enclosing_type: Option<TypeId>,
    /// Element type of an array (one dimension less).
    pub component_type: Option<TypeId>,
    /// Generic type behind a parameterized type, wildcard or capture.
    pub generic_type: Option<TypeId>,
    pub flags: TypeFlags,
    pub tag_bits: TagBits,
    pub annotations: Vec<AnnotationBinding>,
    pub methods: Vec<MethodId>,
    pub fields: Vec<FieldId>,
}

impl TypeDescriptor {
    pub(crate) fn new(id: TypeId, qualified_name: Arc<str>, kind: TypeKind) -> Self {
        Self {
            id,
            qualified_name,
            kind,
            state: TypeState::Loaded,
            type_arguments: SmallVec::new(),
            type_parameters: SmallVec::new(),
            supertype: None,
            superinterfaces: SmallVec::new(),
            enclosing_type: None,
            component_type: None,
            generic_type: None,
            flags: TypeFlags::empty(),
            tag_bits: TagBits::empty(),
            annotations: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.flags.contains(TypeFlags::LOCAL)
    }

    pub fn is_anonymous(&self) -> bool {
        self.flags.contains(TypeFlags::ANONYMOUS)
    }

    pub fn is_missing(&self) -> bool {
        self.state == TypeState::Missing
    }
}

/// A local variable declared in a method body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalVariableDescriptor {
    pub name: Arc<str>,
    pub ty: TypeId,
}

#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    pub id: MethodId,
    /// `<init>` for constructors.
    pub selector: Arc<str>,
    pub declaring_type: TypeId,
    pub parameter_types: SmallVec<[TypeId; 4]>,
    pub return_type: TypeId,
    pub type_variables: SmallVec<[TypeId; 2]>,
    pub thrown_types: SmallVec<[TypeId; 1]>,
    pub is_constructor: bool,
    pub flags: MethodFlags,
    pub parameter_names: Vec<Arc<str>>,
    pub locals: Vec<LocalVariableDescriptor>,
    pub tag_bits: TagBits,
    pub annotations: Vec<AnnotationBinding>,
    /// The polymorphic-signature method this one specializes.
    pub original: Option<MethodId>,
}

impl MethodDescriptor {
    pub fn is_polymorphic_signature(&self) -> bool {
        self.flags.contains(MethodFlags::POLYMORPHIC_SIGNATURE)
    }

    pub fn is_varargs(&self) -> bool {
        self.flags.contains(MethodFlags::VARARGS)
    }
}

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub name: Arc<str>,
    pub ty: TypeId,
    pub declaring_type: TypeId,
    pub flags: FieldFlags,
    pub tag_bits: TagBits,
    pub annotations: Vec<AnnotationBinding>,
}
