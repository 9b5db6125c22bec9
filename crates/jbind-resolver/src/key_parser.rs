//! Binding-key parser.
//!
//! A key is parsed into a `ParsedKey` before anything is looked up, so a
//! malformed key never touches the symbol table. The parser is an explicit
//! state machine over the key's delimiters: each member moves it from one
//! `KeyState` to the next and `KeyState::allows` rejects every transition
//! the grammar does not have. Type keys nested inside a key (arguments,
//! bounds, parameters) are parsed by recursive descent.

use crate::error::{ResolutionError, Result};
use jbind_common::limits::{MAX_ARRAY_DIMENSIONS, MAX_KEY_DEPTH};
use jbind_common::names;
use jbind_signature::{BaseType, MalformedSignatureError, SignatureParser, TypeParameter};
use tracing::trace;

/// Where the parser is within a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Initial state; also the final state of a package key.
    Package,
    TopLevelType,
    MemberType,
    Method,
    Field,
    LocalVariable,
    TypeVariable,
    Annotation,
    Array,
    Wildcard,
    Capture,
}

impl KeyState {
    /// Whether `next` may follow `self`.
    pub fn allows(self, next: KeyState) -> bool {
        match self {
            KeyState::Package => matches!(
                next,
                KeyState::TopLevelType | KeyState::MemberType | KeyState::Array | KeyState::Capture
            ),
            KeyState::TopLevelType | KeyState::MemberType => matches!(
                next,
                KeyState::Method
                    | KeyState::Field
                    | KeyState::TypeVariable
                    | KeyState::Wildcard
                    | KeyState::Annotation
            ),
            KeyState::Method => matches!(
                next,
                KeyState::TypeVariable | KeyState::LocalVariable | KeyState::Annotation
            ),
            KeyState::Field => next == KeyState::Annotation,
            KeyState::LocalVariable
            | KeyState::TypeVariable
            | KeyState::Annotation
            | KeyState::Array
            | KeyState::Wildcard
            | KeyState::Capture => false,
        }
    }
}

// =============================================================================
// Parsed form
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedKey {
    pub root: KeyRoot,
    /// Byte offset where the root type key ends and the members begin.
    pub root_end: usize,
    pub members: Vec<MemberKey>,
    /// State the parser finished in.
    pub state: KeyState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyRoot {
    /// Dotted package name.
    Package(String),
    Type(TypeKeyNode),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKeyNode {
    Base(BaseType),
    Array {
        dimensions: u32,
        leaf: Box<TypeKeyNode>,
    },
    Class(ClassKeyNode),
    /// `TT;`: a variable of the enclosing method or type.
    ScopedVariable(String),
    /// `Lp/X;:TT;` or `Lp/X;.m<T:..>()V:TT;`
    Variable {
        owner: Box<VariableOwnerNode>,
        name: String,
    },
    /// `Lp/G;{rank}bound`
    Wildcard {
        generic: Box<TypeKeyNode>,
        rank: u32,
        bound: BoundNode,
    },
    /// `!wildcard position;`
    Capture {
        wildcard: Box<TypeKeyNode>,
        position: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassKeyNode {
    /// Slash-separated package, empty for the default package.
    pub package: String,
    /// Outermost first; every segment after the first is a member type.
    pub segments: Vec<SegmentNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentNode {
    pub name: String,
    pub arguments: Vec<TypeKeyNode>,
}

impl ClassKeyNode {
    /// `p.Outer$Inner`
    pub fn qualified_name(&self) -> String {
        let mut name = names::internal_to_qualified(&self.package);
        for (i, segment) in self.segments.iter().enumerate() {
            if i == 0 {
                if !name.is_empty() {
                    name.push('.');
                }
            } else {
                name.push('$');
            }
            name.push_str(&segment.name);
        }
        name
    }

    pub fn is_parameterized(&self) -> bool {
        self.segments.iter().any(|s| !s.arguments.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VariableOwnerNode {
    Type(TypeKeyNode),
    Method {
        owner: TypeKeyNode,
        method: MethodKeyNode,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundNode {
    Unbounded,
    Extends(Box<TypeKeyNode>),
    Super(Box<TypeKeyNode>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodKeyNode {
    /// Empty for constructors.
    pub selector: String,
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeKeyNode>,
    pub return_type: TypeKeyNode,
    pub thrown: Vec<TypeKeyNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberKey {
    Method(MethodKeyNode),
    Field {
        name: String,
        ty: TypeKeyNode,
    },
    TypeVariable(String),
    Wildcard {
        rank: u32,
        bound: BoundNode,
    },
    Annotation(ClassKeyNode),
    LocalVariable {
        name: String,
        occurrence: u32,
        position: Option<u32>,
    },
}

// =============================================================================
// Parser
// =============================================================================

/// Characters that end or cannot appear in a class name inside a key.
const NAME_DELIMITERS: &[char] = &[
    ';', '<', '>', '.', '(', ')', '[', ']', '{', '}', ':', '@', '#', '|', '!', '*', '+', '-', '^',
];

pub fn parse_key(key: &str) -> Result<ParsedKey> {
    KeyParser::new(key).parse()
}

struct KeyParser<'a> {
    key: &'a str,
    pos: usize,
    depth: u32,
    state: KeyState,
}

impl<'a> KeyParser<'a> {
    fn new(key: &'a str) -> Self {
        Self {
            key,
            pos: 0,
            depth: 0,
            state: KeyState::Package,
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.key[self.pos..].chars().next()
    }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, reason: impl Into<String>) -> ResolutionError {
        self.error_at(self.pos, reason)
    }

    fn error_at(&self, offset: usize, reason: impl Into<String>) -> ResolutionError {
        let reason = reason.into();
        trace!(offset, key = self.key, %reason, "binding key rejected");
        ResolutionError::malformed(offset, reason)
    }

    fn signature_error(&self, err: MalformedSignatureError) -> ResolutionError {
        self.error_at(err.offset, err.kind.to_string())
    }

    fn expect(&mut self, c: char, what: &str) -> Result<()> {
        match self.peek() {
            Some(found) if found == c => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(self.error(format!("expected {what}, found {found:?}"))),
            None => Err(self.error(format!("missing {what}"))),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_KEY_DEPTH {
            return Err(self.error(format!("nesting exceeds {MAX_KEY_DEPTH} levels")));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn transition(&mut self, next: KeyState) -> Result<()> {
        if !self.state.allows(next) {
            return Err(self.error(format!("{next:?} cannot follow {:?}", self.state)));
        }
        trace!(from = ?self.state, to = ?next, offset = self.pos, "key state");
        self.state = next;
        Ok(())
    }

    fn parse(mut self) -> Result<ParsedKey> {
        if self.key.is_empty() {
            return Err(self.error("empty key"));
        }
        if !self.starts_type_key() {
            let package = self.parse_package()?;
            return Ok(ParsedKey {
                root: KeyRoot::Package(package),
                root_end: self.key.len(),
                members: Vec::new(),
                state: KeyState::Package,
            });
        }

        let root = self.parse_type_key()?;
        let root_state = match &root {
            TypeKeyNode::Array { .. } => KeyState::Array,
            TypeKeyNode::Capture { .. } => KeyState::Capture,
            TypeKeyNode::Class(class)
                if class.segments.len() > 1 || class.segments[0].name.contains('$') =>
            {
                KeyState::MemberType
            }
            _ => KeyState::TopLevelType,
        };
        self.transition(root_state)?;
        let root_end = self.pos;

        let mut members = Vec::new();
        while let Some(c) = self.peek() {
            let member = match c {
                '.' => self.parse_method_or_field()?,
                ':' => {
                    self.transition(KeyState::TypeVariable)?;
                    MemberKey::TypeVariable(self.parse_variable_suffix()?)
                }
                '{' => {
                    self.transition(KeyState::Wildcard)?;
                    let (rank, bound) = self.parse_wildcard_suffix()?;
                    MemberKey::Wildcard { rank, bound }
                }
                '@' => {
                    self.transition(KeyState::Annotation)?;
                    self.bump();
                    if self.peek() != Some('L') {
                        return Err(self.error("expected an annotation type key after '@'"));
                    }
                    MemberKey::Annotation(self.parse_class_key()?)
                }
                '#' => {
                    self.transition(KeyState::LocalVariable)?;
                    self.parse_local_variable()?
                }
                other => {
                    return Err(self.error(format!("unexpected {other:?} after {:?}", self.state)));
                }
            };
            members.push(member);
        }

        Ok(ParsedKey {
            root: KeyRoot::Type(root),
            root_end,
            members,
            state: self.state,
        })
    }

    /// `L`, `[` and `!` start type keys; a lone base-type code is a
    /// primitive. Everything else is a package.
    fn starts_type_key(&self) -> bool {
        match self.peek() {
            Some('L' | '[' | '!') => true,
            Some(c) => self.key.len() == 1 && BaseType::from_code(c).is_some(),
            None => false,
        }
    }

    fn parse_package(&mut self) -> Result<String> {
        let mut offset = 0;
        for segment in self.key.split('/') {
            if !names::is_identifier(segment) {
                return Err(self.error_at(offset, format!("invalid package segment {segment:?}")));
            }
            offset += segment.len() + 1;
        }
        self.pos = self.key.len();
        Ok(names::internal_to_qualified(self.key))
    }

    // =========================================================================
    // Type keys
    // =========================================================================

    /// A type key without a variable or wildcard suffix.
    fn parse_type_key(&mut self) -> Result<TypeKeyNode> {
        self.enter()?;
        let ty = match self.peek() {
            Some('L') => TypeKeyNode::Class(self.parse_class_key()?),
            Some('[') => self.parse_array()?,
            Some('!') => self.parse_capture()?,
            Some('T') => {
                self.bump();
                let name = self.parse_name_until(';', "type variable name")?;
                self.bump();
                TypeKeyNode::ScopedVariable(name)
            }
            Some(c) => match BaseType::from_code(c) {
                Some(base) => {
                    self.bump();
                    TypeKeyNode::Base(base)
                }
                None => return Err(self.error(format!("expected a type key, found {c:?}"))),
            },
            None => return Err(self.error("unexpected end of key, expected a type key")),
        };
        self.leave();
        Ok(ty)
    }

    /// A type key as it appears in argument and bound position, where a
    /// variable or wildcard suffix may follow.
    fn parse_type_ref(&mut self) -> Result<TypeKeyNode> {
        let ty = self.parse_type_key()?;
        match self.peek() {
            Some(':') => {
                let name = self.parse_variable_suffix()?;
                Ok(TypeKeyNode::Variable {
                    owner: Box::new(VariableOwnerNode::Type(ty)),
                    name,
                })
            }
            Some('{') => {
                let (rank, bound) = self.parse_wildcard_suffix()?;
                Ok(TypeKeyNode::Wildcard {
                    generic: Box::new(ty),
                    rank,
                    bound,
                })
            }
            Some('.') if matches!(ty, TypeKeyNode::Class(_)) => {
                let method = self.parse_method_member()?;
                if self.peek() != Some(':') {
                    return Err(self.error("expected ':T' after a method in argument position"));
                }
                let name = self.parse_variable_suffix()?;
                Ok(TypeKeyNode::Variable {
                    owner: Box::new(VariableOwnerNode::Method { owner: ty, method }),
                    name,
                })
            }
            _ => Ok(ty),
        }
    }

    fn parse_class_key(&mut self) -> Result<ClassKeyNode> {
        self.expect('L', "'L'")?;
        let start = self.pos;
        let internal = self.scan_class_name()?;
        if internal.is_empty() {
            return Err(self.error_at(start, "empty class name"));
        }
        let (package, first) = match internal.rfind('/') {
            Some(idx) => (&internal[..idx], &internal[idx + 1..]),
            None => ("", internal),
        };
        if first.is_empty() {
            return Err(self.error("empty class name"));
        }
        let mut segments = vec![SegmentNode {
            name: first.to_string(),
            arguments: Vec::new(),
        }];
        loop {
            if self.peek() == Some('<') {
                let arguments = self.parse_type_arguments()?;
                if let Some(last) = segments.last_mut() {
                    last.arguments = arguments;
                }
            }
            match self.peek() {
                Some(';') => {
                    self.bump();
                    break;
                }
                Some('.') => {
                    self.bump();
                    let name_start = self.pos;
                    let name = self.scan_class_name()?;
                    if !names::is_identifier(name) {
                        return Err(self.error_at(name_start, "invalid member type name"));
                    }
                    segments.push(SegmentNode {
                        name: name.to_string(),
                        arguments: Vec::new(),
                    });
                }
                None => return Err(self.error("missing ';' terminating class key")),
                Some(other) => {
                    return Err(self.error(format!("expected ';' after class key, found {other:?}")));
                }
            }
        }
        Ok(ClassKeyNode {
            package: package.to_string(),
            segments,
        })
    }

    /// Scan an internal class name up to `;`, `<` or `.`.
    fn scan_class_name(&mut self) -> Result<&'a str> {
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error("missing ';' terminating class key")),
                Some(';' | '<' | '.') => break,
                Some(c) if NAME_DELIMITERS.contains(&c) => {
                    return Err(self.error(format!("unexpected {c:?} in class name")));
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        Ok(&self.key[start..self.pos])
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeKeyNode>> {
        self.expect('<', "'<'")?;
        if self.peek() == Some('>') {
            return Err(self.error("empty type argument list"));
        }
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.parse_type_ref()?);
            match self.peek() {
                Some('>') => {
                    self.bump();
                    return Ok(arguments);
                }
                None => return Err(self.error("missing '>' closing type arguments")),
                Some(_) => {}
            }
        }
    }

    fn parse_array(&mut self) -> Result<TypeKeyNode> {
        let mut dimensions = 0u32;
        while self.peek() == Some('[') {
            self.bump();
            dimensions += 1;
            if dimensions > MAX_ARRAY_DIMENSIONS {
                return Err(self.error(format!("more than {MAX_ARRAY_DIMENSIONS} array dimensions")));
            }
        }
        let leaf = self.parse_type_key()?;
        Ok(TypeKeyNode::Array {
            dimensions,
            leaf: Box::new(leaf),
        })
    }

    fn parse_capture(&mut self) -> Result<TypeKeyNode> {
        self.expect('!', "'!'")?;
        let start = self.pos;
        let wildcard = self.parse_type_ref()?;
        if !matches!(wildcard, TypeKeyNode::Wildcard { .. }) {
            return Err(self.error_at(start, "a capture must wrap a wildcard"));
        }
        let position = self.parse_number("capture position")?;
        self.expect(';', "';' terminating capture key")?;
        Ok(TypeKeyNode::Capture {
            wildcard: Box::new(wildcard),
            position,
        })
    }

    /// `:Tname;`
    fn parse_variable_suffix(&mut self) -> Result<String> {
        self.expect(':', "':'")?;
        self.expect('T', "'T' after ':'")?;
        let name = self.parse_name_until(';', "type variable name")?;
        self.bump();
        Ok(name)
    }

    /// `{rank}` followed by `*`, `+bound` or `-bound`.
    fn parse_wildcard_suffix(&mut self) -> Result<(u32, BoundNode)> {
        self.expect('{', "'{'")?;
        let rank = self.parse_number("wildcard rank")?;
        self.expect('}', "'}' after wildcard rank")?;
        let bound = match self.peek() {
            Some('*') => {
                self.bump();
                BoundNode::Unbounded
            }
            Some('+') => {
                self.bump();
                BoundNode::Extends(Box::new(self.parse_type_ref()?))
            }
            Some('-') => {
                self.bump();
                BoundNode::Super(Box::new(self.parse_type_ref()?))
            }
            Some(c) => {
                return Err(self.error(format!("expected '*', '+' or '-' after wildcard rank, found {c:?}")));
            }
            None => return Err(self.error("missing wildcard bound")),
        };
        Ok((rank, bound))
    }

    fn parse_number(&mut self, what: &str) -> Result<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.bump();
        }
        if start == self.pos {
            return Err(self.error(format!("expected {what}")));
        }
        self.key[start..self.pos]
            .parse()
            .map_err(|_| self.error_at(start, format!("{what} out of range")))
    }

    /// An identifier terminated by `end`, which is left unconsumed.
    fn parse_name_until(&mut self, end: char, what: &str) -> Result<String> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(c) if c == end => break,
                None => return Err(self.error(format!("missing {end:?} after {what}"))),
                Some(_) => {
                    self.bump();
                }
            }
        }
        let name = &self.key[start..self.pos];
        if !names::is_identifier(name) {
            return Err(self.error_at(start, format!("invalid {what} {name:?}")));
        }
        Ok(name.to_string())
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// `.selector(...)` or `.name)type`, told apart by the first of `(`,
    /// `<` and `)` after the dot.
    fn parse_method_or_field(&mut self) -> Result<MemberKey> {
        let key = self.key;
        let dot = self.pos;
        let rest = &key[dot + 1..];
        let Some(idx) = rest.find(['(', '<', ')', ';', '.', ':', '{', '@', '#', '|']) else {
            return Err(self.error_at(self.key.len(), "expected '(' or ')' after member name"));
        };
        match rest.as_bytes()[idx] {
            b')' => {
                self.transition(KeyState::Field)?;
                let name = &rest[..idx];
                if !names::is_identifier(name) {
                    return Err(self.error_at(dot + 1, format!("invalid field name {name:?}")));
                }
                self.pos = dot + 1 + idx + 1;
                let ty = self.parse_type_key()?;
                Ok(MemberKey::Field {
                    name: name.to_string(),
                    ty,
                })
            }
            b'(' | b'<' => {
                self.transition(KeyState::Method)?;
                Ok(MemberKey::Method(self.parse_method_member()?))
            }
            _ => Err(self.error_at(dot + 1 + idx, "expected '(' or ')' after member name")),
        }
    }

    /// `.selector<T:..>(params)return|thrown`
    fn parse_method_member(&mut self) -> Result<MethodKeyNode> {
        self.expect('.', "'.'")?;
        let start = self.pos;
        let Some(idx) = self.key[start..].find(['(', '<']) else {
            return Err(self.error_at(self.key.len(), "missing '(' opening the parameter list"));
        };
        let selector = &self.key[start..start + idx];
        if !selector.is_empty() && !names::is_identifier(selector) {
            return Err(self.error_at(start, format!("invalid method selector {selector:?}")));
        }
        self.pos = start + idx;

        let type_parameters = if self.peek() == Some('<') {
            let mut parser = SignatureParser::at(self.key, self.pos);
            let parameters = parser
                .parse_type_parameters()
                .map_err(|err| self.signature_error(err))?;
            self.pos = parser.position();
            parameters
        } else {
            Vec::new()
        };

        self.expect('(', "'(' opening the parameter list")?;
        let mut parameters = Vec::new();
        loop {
            match self.peek() {
                Some(')') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("missing ')' closing the parameter list")),
                Some(_) => parameters.push(self.parse_type_key()?),
            }
        }
        let return_type = self.parse_type_key()?;
        let mut thrown = Vec::new();
        while self.peek() == Some('|') {
            self.bump();
            thrown.push(self.parse_type_key()?);
        }
        Ok(MethodKeyNode {
            selector: selector.to_string(),
            type_parameters,
            parameters,
            return_type,
            thrown,
        })
    }

    /// `#name`, `#name#occurrence` or `#name#occurrence#position`.
    fn parse_local_variable(&mut self) -> Result<MemberKey> {
        self.expect('#', "'#'")?;
        let start = self.pos;
        let end = self.key[start..]
            .find('#')
            .map_or(self.key.len(), |idx| start + idx);
        let name = &self.key[start..end];
        if !names::is_identifier(name) {
            return Err(self.error_at(start, format!("invalid local variable name {name:?}")));
        }
        self.pos = end;
        let mut occurrence = 0;
        let mut position = None;
        if self.peek() == Some('#') {
            self.bump();
            occurrence = self.parse_number("local variable occurrence")?;
            if self.peek() == Some('#') {
                self.bump();
                position = Some(self.parse_number("local variable position")?);
            }
        }
        Ok(MemberKey::LocalVariable {
            name: name.to_string(),
            occurrence,
            position,
        })
    }
}
