//! Symbol table for the jbind binding resolver.
//!
//! - `SymbolTable`: interned types, methods and fields with lazy completion
//! - `TypeProvider`: the collaborator that supplies declarations
//! - Descriptor snapshots, annotation instances and tag bits

pub mod annotation;
mod complete;
pub mod descriptors;
pub mod error;
pub mod ids;
pub mod provider;
pub mod scope;
mod substitute;
pub mod table;
pub mod tag_bits;

pub use annotation::{AnnotationBinding, Constant, ElementValue};
pub use descriptors::{
    FieldDescriptor, FieldFlags, LocalVariableDescriptor, MethodDescriptor, MethodFlags,
    TypeDescriptor, TypeFlags, TypeKind, TypeState,
};
pub use error::{ProviderError, SymbolError};
pub use ids::{FieldId, MethodId, TypeId, TypeKey, VarOwner, WildcardBound};
pub use provider::{
    AnnotationDeclaration, DeclarationKind, ElementValueDeclaration, FieldDeclaration,
    InMemoryTypeProvider, LocalDeclaration, MethodDeclaration, TypeCorpus, TypeDeclaration,
    TypeProvider,
};
pub use scope::TypeVarScope;
pub use table::SymbolTable;
pub use tag_bits::TagBits;

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod table_tests;

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod provider_tests;
