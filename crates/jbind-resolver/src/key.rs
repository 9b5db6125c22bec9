use crate::error::Result;
use crate::key_parser::{
    BoundNode, ClassKeyNode, KeyRoot, MemberKey, MethodKeyNode, ParsedKey, SegmentNode,
    TypeKeyNode, parse_key,
};
use jbind_common::names;
use jbind_signature::BaseType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A textual binding key.
///
/// Keys are the stable wire form of a binding: they can be persisted and
/// resolved again later against an equivalent symbol table. The
/// constructors below build keys from parts without a symbol table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingKey(String);

/// What a key denotes, from its syntax alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Package,
    Type,
    ArrayType,
    TypeVariable,
    Wildcard,
    Capture,
    Method,
    Field,
    LocalVariable,
    Annotation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    Unbounded,
    Extends,
    Super,
}

impl BindingKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn parse(&self) -> Result<ParsedKey> {
        parse_key(&self.0)
    }

    /// Key of a type given by source name: `java.util.Map$Entry`, `int`,
    /// `java.lang.String[][]`.
    pub fn create_type_key(type_name: &str) -> Self {
        let mut base = type_name.trim();
        let mut dimensions = 0;
        while let Some(component) = base.strip_suffix("[]") {
            base = component;
            dimensions += 1;
        }
        let mut key = "[".repeat(dimensions);
        match BaseType::from_keyword(base) {
            Some(primitive) => key.push(primitive.code()),
            None => {
                key.push('L');
                key.push_str(&names::qualified_to_internal(base));
                key.push(';');
            }
        }
        Self(key)
    }

    pub fn create_array_key(element: &BindingKey, dimensions: u32) -> Self {
        Self(format!("{}{}", "[".repeat(dimensions as usize), element.0))
    }

    /// `generic<arguments>`; the generic's key must be a class key.
    pub fn create_parameterized_key(generic: &BindingKey, arguments: &[BindingKey]) -> Self {
        if arguments.is_empty() {
            return generic.clone();
        }
        let base = generic.0.strip_suffix(';').unwrap_or(&generic.0);
        let mut key = String::with_capacity(base.len() + arguments.iter().map(|a| a.0.len()).sum::<usize>() + 3);
        key.push_str(base);
        key.push('<');
        for argument in arguments {
            key.push_str(&argument.0);
        }
        key.push_str(">;");
        Self(key)
    }

    /// The wildcard at position `rank` of `generic`'s arguments. `bound` is
    /// ignored for unbounded wildcards.
    pub fn create_wildcard_key(
        generic: &BindingKey,
        rank: u32,
        kind: WildcardKind,
        bound: Option<&BindingKey>,
    ) -> Self {
        let mut key = format!("{}{{{rank}}}", generic.0);
        match (kind, bound) {
            (WildcardKind::Extends, Some(bound)) => {
                key.push('+');
                key.push_str(&bound.0);
            }
            (WildcardKind::Super, Some(bound)) => {
                key.push('-');
                key.push_str(&bound.0);
            }
            _ => key.push('*'),
        }
        Self(key)
    }

    /// Variable `name` declared by the type or method `declaring`.
    pub fn create_type_variable_key(name: &str, declaring: &BindingKey) -> Self {
        Self(format!("{}:T{name};", declaring.0))
    }

    pub fn kind(&self) -> Result<KeyKind> {
        let parsed = self.parse()?;
        Ok(match (parsed.members.last(), &parsed.root) {
            (None, KeyRoot::Package(_)) => KeyKind::Package,
            (None, KeyRoot::Type(TypeKeyNode::Array { .. })) => KeyKind::ArrayType,
            (None, KeyRoot::Type(TypeKeyNode::Capture { .. })) => KeyKind::Capture,
            (None, KeyRoot::Type(_)) => KeyKind::Type,
            (Some(MemberKey::Method(_)), _) => KeyKind::Method,
            (Some(MemberKey::Field { .. }), _) => KeyKind::Field,
            (Some(MemberKey::TypeVariable(_)), _) => KeyKind::TypeVariable,
            (Some(MemberKey::Wildcard { .. }), _) => KeyKind::Wildcard,
            (Some(MemberKey::Annotation(_)), _) => KeyKind::Annotation,
            (Some(MemberKey::LocalVariable { .. }), _) => KeyKind::LocalVariable,
        })
    }

    /// Whether the key's type, or the declaring type of its member, has
    /// type arguments.
    pub fn is_parameterized(&self) -> bool {
        match self.parse() {
            Ok(ParsedKey {
                root: KeyRoot::Type(TypeKeyNode::Class(class)),
                ..
            }) => class.is_parameterized(),
            _ => false,
        }
    }

    /// Key of the type declaring this member, or enclosing this member type.
    pub fn declaring_type_key(&self) -> Option<BindingKey> {
        let parsed = self.parse().ok()?;
        if !parsed.members.is_empty() {
            return Some(BindingKey(self.0[..parsed.root_end].to_string()));
        }
        let KeyRoot::Type(TypeKeyNode::Class(class)) = &parsed.root else {
            return None;
        };
        let erased = ClassKeyNode {
            package: class.package.clone(),
            segments: class
                .segments
                .iter()
                .map(|s| SegmentNode {
                    name: s.name.clone(),
                    arguments: Vec::new(),
                })
                .collect(),
        };
        names::enclosing_of(&erased.qualified_name()).map(BindingKey::create_type_key)
    }

    /// Signature form of a type, method or field key; `TT;` for type
    /// variables and `*`, `+X`, `-X` for wildcards.
    pub fn to_signature(&self) -> Option<String> {
        let parsed = self.parse().ok()?;
        let mut out = String::new();
        match (parsed.members.as_slice(), &parsed.root) {
            ([], KeyRoot::Type(root)) => write_type_signature(&mut out, root),
            ([MemberKey::Method(method)], _) => write_method_signature(&mut out, method),
            ([MemberKey::Field { ty, .. }], _) => write_type_signature(&mut out, ty),
            ([.., MemberKey::TypeVariable(name)], _) => {
                out.push('T');
                out.push_str(name);
                out.push(';');
            }
            ([MemberKey::Wildcard { bound, .. }], _) => write_bound_signature(&mut out, bound),
            _ => return None,
        }
        Some(out)
    }
}

fn write_type_signature(out: &mut String, node: &TypeKeyNode) {
    match node {
        TypeKeyNode::Base(base) => out.push(base.code()),
        TypeKeyNode::Array { dimensions, leaf } => {
            for _ in 0..*dimensions {
                out.push('[');
            }
            write_type_signature(out, leaf);
        }
        TypeKeyNode::Class(class) => {
            out.push('L');
            if !class.package.is_empty() {
                out.push_str(&class.package);
                out.push('/');
            }
            for (i, segment) in class.segments.iter().enumerate() {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(&segment.name);
                if !segment.arguments.is_empty() {
                    out.push('<');
                    for argument in &segment.arguments {
                        write_type_signature(out, argument);
                    }
                    out.push('>');
                }
            }
            out.push(';');
        }
        TypeKeyNode::ScopedVariable(name) | TypeKeyNode::Variable { name, .. } => {
            out.push('T');
            out.push_str(name);
            out.push(';');
        }
        TypeKeyNode::Wildcard { bound, .. } => write_bound_signature(out, bound),
        TypeKeyNode::Capture { wildcard, .. } => {
            out.push('!');
            write_type_signature(out, wildcard);
        }
    }
}

fn write_bound_signature(out: &mut String, bound: &BoundNode) {
    match bound {
        BoundNode::Unbounded => out.push('*'),
        BoundNode::Extends(ty) => {
            out.push('+');
            write_type_signature(out, ty);
        }
        BoundNode::Super(ty) => {
            out.push('-');
            write_type_signature(out, ty);
        }
    }
}

fn write_method_signature(out: &mut String, method: &MethodKeyNode) {
    if !method.type_parameters.is_empty() {
        out.push('<');
        for parameter in &method.type_parameters {
            out.push_str(&parameter.to_string());
        }
        out.push('>');
    }
    out.push('(');
    for parameter in &method.parameters {
        write_type_signature(out, parameter);
    }
    out.push(')');
    write_type_signature(out, &method.return_type);
    for thrown in &method.thrown {
        out.push('^');
        write_type_signature(out, thrown);
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BindingKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for BindingKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for BindingKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

