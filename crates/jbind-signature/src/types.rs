//! Signature trees.
//!
//! A signature is decoded into a tree of owned nodes. Names stay unresolved:
//! a `ClassTypeSignature` only records the package and simple names it spells,
//! mapping them to symbol-table entries is the symbol table's job.

use smallvec::SmallVec;

/// Primitive codes of the signature grammar, plus `V` for `void`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Void,
}

impl BaseType {
    pub const ALL: [BaseType; 9] = [
        BaseType::Byte,
        BaseType::Char,
        BaseType::Double,
        BaseType::Float,
        BaseType::Int,
        BaseType::Long,
        BaseType::Short,
        BaseType::Boolean,
        BaseType::Void,
    ];

    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'D' => BaseType::Double,
            'F' => BaseType::Float,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'S' => BaseType::Short,
            'Z' => BaseType::Boolean,
            'V' => BaseType::Void,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
            BaseType::Void => 'V',
        }
    }

    /// Source keyword (`int`, `void`, ...).
    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
            BaseType::Void => "void",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        BaseType::ALL.into_iter().find(|b| b.keyword() == keyword)
    }
}

/// One `Name<Args>` segment of a class type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SimpleClassType {
    pub name: String,
    pub arguments: Vec<TypeArgument>,
}

impl SimpleClassType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }
}

/// `Lpkg/Outer<..>.Inner<..>;`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassTypeSignature {
    /// Slash-separated package (`java/util`), empty for the default package.
    pub package: String,
    /// Outermost segment first. Never empty.
    pub segments: SmallVec<[SimpleClassType; 1]>,
}

impl ClassTypeSignature {
    /// Build a non-generic class type from a qualified name (`java.util.Map$Entry`).
    pub fn from_qualified(qualified: &str) -> Self {
        let package = jbind_common::names::package_of(qualified);
        let simple = jbind_common::names::binary_simple_name(qualified);
        let mut segments = SmallVec::new();
        segments.push(SimpleClassType::new(simple));
        Self {
            package: package.replace('.', "/"),
            segments,
        }
    }

    /// Dotted binary name; inner segments are joined with `$`.
    pub fn qualified_name(&self) -> String {
        let mut out = String::with_capacity(self.package.len() + 16);
        if !self.package.is_empty() {
            out.push_str(&self.package.replace('/', "."));
            out.push('.');
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('$');
            }
            out.push_str(&seg.name);
        }
        out
    }

    pub fn is_parameterized(&self) -> bool {
        self.segments.iter().any(|s| !s.arguments.is_empty())
    }

    /// Type arguments of the innermost segment.
    pub fn arguments(&self) -> &[TypeArgument] {
        self.segments
            .last()
            .map(|s| s.arguments.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    Base(BaseType),
    Class(ClassTypeSignature),
    TypeVariable(String),
    /// `dimensions` counts the leading `[`; `component` is never an array.
    Array {
        dimensions: u32,
        component: Box<TypeSignature>,
    },
}

impl TypeSignature {
    pub fn class(qualified: &str) -> Self {
        TypeSignature::Class(ClassTypeSignature::from_qualified(qualified))
    }

    /// Wrap `component` in `dimensions` array levels, flattening nested arrays.
    pub fn array(component: TypeSignature, dimensions: u32) -> Self {
        if dimensions == 0 {
            return component;
        }
        match component {
            TypeSignature::Array {
                dimensions: inner,
                component,
            } => TypeSignature::Array {
                dimensions: inner + dimensions,
                component,
            },
            other => TypeSignature::Array {
                dimensions,
                component: Box::new(other),
            },
        }
    }

    /// Qualified name of the type this signature names: the class name, the
    /// primitive keyword, the variable name, or the component name with `[]`.
    pub fn qualified_name(&self) -> String {
        match self {
            TypeSignature::Base(b) => b.keyword().to_string(),
            TypeSignature::Class(c) => c.qualified_name(),
            TypeSignature::TypeVariable(name) => name.clone(),
            TypeSignature::Array {
                dimensions,
                component,
            } => {
                let mut name = component.qualified_name();
                for _ in 0..*dimensions {
                    name.push_str("[]");
                }
                name
            }
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeSignature::Base(BaseType::Void))
    }

    /// Drop every type argument, recursively through arrays.
    pub fn erasure(&self) -> TypeSignature {
        match self {
            TypeSignature::Class(c) => {
                let segments = c
                    .segments
                    .iter()
                    .map(|s| SimpleClassType::new(s.name.clone()))
                    .collect();
                TypeSignature::Class(ClassTypeSignature {
                    package: c.package.clone(),
                    segments,
                })
            }
            TypeSignature::Array {
                dimensions,
                component,
            } => TypeSignature::Array {
                dimensions: *dimensions,
                component: Box::new(component.erasure()),
            },
            other => other.clone(),
        }
    }
}

/// A type argument inside `<...>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    /// `*`
    Unbounded,
    Exact(TypeSignature),
    /// `+Bound`
    Extends(TypeSignature),
    /// `-Bound`
    Super(TypeSignature),
}

/// `T:ClassBound:InterfaceBound...`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<TypeSignature>,
    pub interface_bounds: Vec<TypeSignature>,
}

impl TypeParameter {
    /// All bounds, class bound first.
    pub fn bounds(&self) -> impl Iterator<Item = &TypeSignature> {
        self.class_bound.iter().chain(self.interface_bounds.iter())
    }
}

/// `<T:..>(Params)Return^Throws`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    pub return_type: TypeSignature,
    pub throws: Vec<TypeSignature>,
}

/// `<T:..>Lsuper;Liface;...`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub superclass: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}
