//! Handles and structural keys.
//!
//! Every type the table knows about is identified by a `TypeId`. Two
//! references denote the same type exactly when their ids are equal: the
//! table hands out one id per structural `TypeKey`, so identity comparison is
//! the only "same type" check the rest of the crates need.

use jbind_common::Atom;
use jbind_signature::BaseType;
use smallvec::SmallVec;
use std::fmt;

// =============================================================================
// TypeId
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Sentinel for "no type".
    pub const INVALID: Self = Self(0);

    pub const BYTE: Self = Self(1);
    pub const CHAR: Self = Self(2);
    pub const DOUBLE: Self = Self(3);
    pub const FLOAT: Self = Self(4);
    pub const INT: Self = Self(5);
    pub const LONG: Self = Self(6);
    pub const SHORT: Self = Self(7);
    pub const BOOLEAN: Self = Self(8);
    pub const VOID: Self = Self(9);

    /// First id handed out for a non-primitive type.
    pub const FIRST_VALID: u32 = 10;

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// The pre-registered id of a primitive (or `void`).
    pub const fn primitive(base: BaseType) -> Self {
        match base {
            BaseType::Byte => Self::BYTE,
            BaseType::Char => Self::CHAR,
            BaseType::Double => Self::DOUBLE,
            BaseType::Float => Self::FLOAT,
            BaseType::Int => Self::INT,
            BaseType::Long => Self::LONG,
            BaseType::Short => Self::SHORT,
            BaseType::Boolean => Self::BOOLEAN,
            BaseType::Void => Self::VOID,
        }
    }

    pub const fn as_primitive(self) -> Option<BaseType> {
        Some(match self {
            Self::BYTE => BaseType::Byte,
            Self::CHAR => BaseType::Char,
            Self::DOUBLE => BaseType::Double,
            Self::FLOAT => BaseType::Float,
            Self::INT => BaseType::Int,
            Self::LONG => BaseType::Long,
            Self::SHORT => BaseType::Short,
            Self::BOOLEAN => BaseType::Boolean,
            Self::VOID => BaseType::Void,
            _ => return None,
        })
    }

    pub const fn is_primitive(self) -> bool {
        self.0 >= Self::BYTE.0 && self.0 <= Self::VOID.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

// =============================================================================
// TypeKey - structural identity
// =============================================================================

/// Declaration that introduces a type variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarOwner {
    Type(TypeId),
    Method(MethodId),
}

/// Bound of a wildcard, by id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(TypeId),
    Super(TypeId),
}

/// Structural key of an interned type.
///
/// Wildcards are identified by the generic type they parameterize and their
/// position among its arguments, captures by the wildcard they capture and
/// the position of the capturing expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Primitive(BaseType),
    /// Class, interface, enum or annotation type by qualified binary name.
    Declared(Atom),
    /// `leaf` is never itself an array.
    Array { leaf: TypeId, dimensions: u32 },
    Parameterized {
        generic: TypeId,
        arguments: SmallVec<[TypeId; 2]>,
        /// Parameterized enclosing type of a member type (`Outer<String>.Inner`).
        enclosing: Option<TypeId>,
    },
    TypeVariable { owner: VarOwner, name: Atom },
    Wildcard {
        generic: TypeId,
        rank: u32,
        bound: WildcardBound,
    },
    Capture { wildcard: TypeId, position: u32 },
}
