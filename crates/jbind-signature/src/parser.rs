//! Recursive-descent parser for the signature grammar.
//!
//! ```text
//! TypeSignature   := BaseType | 'V' | FieldType
//! FieldType       := ClassType | 'T' Ident ';' | '['+ (BaseType | FieldType)
//! ClassType       := 'L' (Pkg '/')* Segment ('.' Segment)* ';'
//! Segment         := Ident TypeArgs?
//! TypeArgs        := '<' ('*' | ('+' | '-')? FieldType)+ '>'
//! TypeParams      := '<' (Ident ':' FieldType? (':' FieldType)*)+ '>'
//! MethodSignature := TypeParams? '(' (BaseType | FieldType)* ')' TypeSignature ('^' FieldType)*
//! ClassSignature  := TypeParams? ClassType ClassType*
//! ```
//!
//! Parsing is pure. Offsets in errors are byte offsets into the input.

use crate::error::{MalformedSignatureError, SignatureErrorKind};
use crate::types::*;
use jbind_common::limits::{MAX_ARRAY_DIMENSIONS, MAX_SIGNATURE_DEPTH};
use smallvec::SmallVec;
use tracing::trace;

pub type Result<T> = std::result::Result<T, MalformedSignatureError>;

/// Parse a single type signature (`I`, `[Ljava/lang/String;`, `TT;`, `V`, ...).
pub fn parse_type_signature(source: &str) -> Result<TypeSignature> {
    let mut parser = SignatureParser::new(source);
    let ty = parser.parse_type(true)?;
    parser.finish()?;
    Ok(ty)
}

/// Parse a method signature (`<T:Ljava/lang/Object;>(TT;I)V^Ljava/io/IOException;`).
pub fn parse_method_signature(source: &str) -> Result<MethodSignature> {
    let mut parser = SignatureParser::new(source);
    let method = parser.parse_method()?;
    parser.finish()?;
    Ok(method)
}

/// Parse a class signature (`<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/List<TE;>;`).
pub fn parse_class_signature(source: &str) -> Result<ClassSignature> {
    let mut parser = SignatureParser::new(source);
    let class = parser.parse_class()?;
    parser.finish()?;
    Ok(class)
}

/// Cursor over a signature string.
///
/// The binding-key parser embeds signatures inside keys, so the cursor can
/// start at an arbitrary offset and stop before the end of input.
pub struct SignatureParser<'a> {
    source: &'a str,
    pos: usize,
    depth: u32,
}

impl<'a> SignatureParser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::at(source, 0)
    }

    pub fn at(source: &'a str, pos: usize) -> Self {
        Self {
            source,
            pos,
            depth: 0,
        }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: SignatureErrorKind) -> MalformedSignatureError {
        trace!(offset = self.pos, source = self.source, %kind, "signature rejected");
        MalformedSignatureError::at(self.source, self.pos, kind)
    }

    fn unexpected(&self, expected: &'static str) -> MalformedSignatureError {
        match self.peek() {
            None => self.error(SignatureErrorKind::UnexpectedEnd { expected }),
            Some('>') => self.error(SignatureErrorKind::UnbalancedTypeArguments),
            Some(found) => self.error(SignatureErrorKind::UnexpectedChar { found, expected }),
        }
    }

    fn expect(&mut self, c: char, expected: &'static str) -> Result<()> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_SIGNATURE_DEPTH {
            return Err(self.error(SignatureErrorKind::TooDeep {
                limit: MAX_SIGNATURE_DEPTH,
            }));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Fail unless the whole input was consumed.
    pub fn finish(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some('>') => Err(self.error(SignatureErrorKind::UnbalancedTypeArguments)),
            Some(_) => Err(self.error(SignatureErrorKind::TrailingInput)),
        }
    }

    /// Parse any type signature; `allow_void` admits a bare `V`.
    pub fn parse_type(&mut self, allow_void: bool) -> Result<TypeSignature> {
        if allow_void && self.peek() == Some('V') {
            self.bump();
            return Ok(TypeSignature::Base(BaseType::Void));
        }
        self.parse_field_type()
    }

    /// A non-void type: primitive, class, type variable or array.
    pub fn parse_field_type(&mut self) -> Result<TypeSignature> {
        match self.peek() {
            Some('L') => Ok(TypeSignature::Class(self.parse_class_type()?)),
            Some('T') => self.parse_type_variable(),
            Some('[') => self.parse_array(),
            Some('V') => Err(self.error(SignatureErrorKind::VoidNotAllowed)),
            Some(c) => match BaseType::from_code(c) {
                Some(base) => {
                    self.bump();
                    Ok(TypeSignature::Base(base))
                }
                None => Err(self.unexpected("a type signature")),
            },
            None => Err(self.unexpected("a type signature")),
        }
    }

    fn parse_array(&mut self) -> Result<TypeSignature> {
        let mut dimensions = 0u32;
        while self.peek() == Some('[') {
            self.bump();
            dimensions += 1;
            if dimensions > MAX_ARRAY_DIMENSIONS {
                return Err(self.error(SignatureErrorKind::TooManyDimensions {
                    limit: MAX_ARRAY_DIMENSIONS,
                }));
            }
        }
        self.enter()?;
        let component = self.parse_field_type()?;
        self.leave();
        Ok(TypeSignature::Array {
            dimensions,
            component: Box::new(component),
        })
    }

    fn parse_type_variable(&mut self) -> Result<TypeSignature> {
        self.expect('T', "'T'")?;
        let name = self.parse_name(&[';'])?;
        self.expect(';', "';' after type variable name")?;
        Ok(TypeSignature::TypeVariable(name))
    }

    /// Read a name up to (not including) one of `stops`.
    fn parse_name(&mut self, stops: &[char]) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            if matches!(c, ';' | '<' | '>' | '.' | '/' | '[' | ':' | '(' | ')') {
                return Err(self.unexpected("an identifier character"));
            }
            self.bump();
        }
        if self.pos == start {
            if self.is_at_end() {
                return Err(self.unexpected("a name"));
            }
            return Err(self.error(SignatureErrorKind::EmptyName));
        }
        Ok(self.source[start..self.pos].to_string())
    }

    /// `L...;`
    pub fn parse_class_type(&mut self) -> Result<ClassTypeSignature> {
        self.expect('L', "'L'")?;
        self.enter()?;

        // First segment carries the package: everything up to ';', '<' or '.'.
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ';' | '<' | '.') {
                break;
            }
            if matches!(c, '>' | '[' | ':' | '(' | ')') {
                return Err(self.unexpected("a class name character"));
            }
            self.bump();
        }
        if self.is_at_end() {
            return Err(self.error(SignatureErrorKind::UnterminatedClassType));
        }
        let path = &self.source[start..self.pos];
        let (package, name) = match path.rfind('/') {
            Some(idx) => (&path[..idx], &path[idx + 1..]),
            None => ("", path),
        };
        if name.is_empty() || path.starts_with('/') || path.contains("//") {
            return Err(MalformedSignatureError::at(
                self.source,
                start,
                SignatureErrorKind::EmptyName,
            ));
        }

        let mut segments: SmallVec<[SimpleClassType; 1]> = SmallVec::new();
        let mut segment = SimpleClassType::new(name);
        loop {
            if self.peek() == Some('<') {
                segment.arguments = self.parse_type_arguments()?;
            }
            segments.push(segment);
            match self.peek() {
                Some(';') => {
                    self.bump();
                    break;
                }
                Some('.') => {
                    self.bump();
                    segment = SimpleClassType::new(self.parse_name(&[';', '<', '.'])?);
                }
                None => return Err(self.error(SignatureErrorKind::UnterminatedClassType)),
                Some(_) => return Err(self.unexpected("';' or '.'")),
            }
        }

        self.leave();
        Ok(ClassTypeSignature {
            package: package.to_string(),
            segments,
        })
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeArgument>> {
        let open = self.pos;
        self.expect('<', "'<'")?;
        if self.peek() == Some('>') {
            return Err(self.error(SignatureErrorKind::EmptyTypeArguments));
        }
        self.enter()?;
        let mut arguments = Vec::new();
        loop {
            let argument = match self.peek() {
                Some('*') => {
                    self.bump();
                    TypeArgument::Unbounded
                }
                Some('+') => {
                    self.bump();
                    TypeArgument::Extends(self.parse_field_type()?)
                }
                Some('-') => {
                    self.bump();
                    TypeArgument::Super(self.parse_field_type()?)
                }
                None => {
                    return Err(MalformedSignatureError::at(
                        self.source,
                        open,
                        SignatureErrorKind::UnbalancedTypeArguments,
                    ));
                }
                Some(_) => TypeArgument::Exact(self.parse_field_type()?),
            };
            arguments.push(argument);
            match self.peek() {
                Some('>') => {
                    self.bump();
                    break;
                }
                None => {
                    return Err(MalformedSignatureError::at(
                        self.source,
                        open,
                        SignatureErrorKind::UnbalancedTypeArguments,
                    ));
                }
                Some(_) => {}
            }
        }
        self.leave();
        Ok(arguments)
    }

    /// `<T:Bound:IBound U::IBound>`
    pub fn parse_type_parameters(&mut self) -> Result<Vec<TypeParameter>> {
        self.expect('<', "'<'")?;
        if self.peek() == Some('>') {
            return Err(self.error(SignatureErrorKind::EmptyTypeArguments));
        }
        self.enter()?;
        let mut parameters = Vec::new();
        loop {
            let name = self.parse_name(&[':'])?;
            self.expect(':', "':' after type parameter name")?;
            let class_bound = match self.peek() {
                Some('L' | 'T' | '[') => Some(self.parse_field_type()?),
                _ => None,
            };
            let mut interface_bounds = Vec::new();
            while self.peek() == Some(':') {
                self.bump();
                interface_bounds.push(self.parse_field_type()?);
            }
            parameters.push(TypeParameter {
                name,
                class_bound,
                interface_bounds,
            });
            match self.peek() {
                Some('>') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error(SignatureErrorKind::UnbalancedTypeArguments)),
                Some(_) => {}
            }
        }
        self.leave();
        Ok(parameters)
    }

    pub fn parse_method(&mut self) -> Result<MethodSignature> {
        let type_parameters = if self.peek() == Some('<') {
            self.parse_type_parameters()?
        } else {
            Vec::new()
        };
        self.expect('(', "'(' to open the parameter list")?;
        let mut parameters = Vec::new();
        while self.peek() != Some(')') {
            if self.is_at_end() {
                return Err(self.unexpected("')' to close the parameter list"));
            }
            parameters.push(self.parse_field_type()?);
        }
        self.bump();
        let return_type = self.parse_type(true)?;
        let mut throws = Vec::new();
        while self.peek() == Some('^') {
            self.bump();
            match self.peek() {
                Some('L') => throws.push(TypeSignature::Class(self.parse_class_type()?)),
                Some('T') => throws.push(self.parse_type_variable()?),
                _ => return Err(self.unexpected("a class type or type variable after '^'")),
            }
        }
        Ok(MethodSignature {
            type_parameters,
            parameters,
            return_type,
            throws,
        })
    }

    pub fn parse_class(&mut self) -> Result<ClassSignature> {
        let type_parameters = if self.peek() == Some('<') {
            self.parse_type_parameters()?
        } else {
            Vec::new()
        };
        let superclass = self.parse_class_type()?;
        let mut interfaces = Vec::new();
        while self.peek() == Some('L') {
            interfaces.push(self.parse_class_type()?);
        }
        Ok(ClassSignature {
            type_parameters,
            superclass,
            interfaces,
        })
    }
}
