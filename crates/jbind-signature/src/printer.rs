//! Signature and source-form printing.
//!
//! `Display` writes canonical signature text, the inverse of the parser.
//! `to_source_string` writes the human-readable Java spelling used in
//! diagnostics.

use crate::types::*;
use std::fmt::{self, Write};

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.code())
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Base(b) => write!(f, "{b}"),
            TypeSignature::Class(c) => write!(f, "{c}"),
            TypeSignature::TypeVariable(name) => write!(f, "T{name};"),
            TypeSignature::Array {
                dimensions,
                component,
            } => {
                for _ in 0..*dimensions {
                    f.write_char('[')?;
                }
                write!(f, "{component}")
            }
        }
    }
}

impl fmt::Display for ClassTypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('L')?;
        if !self.package.is_empty() {
            write!(f, "{}/", self.package)?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_char('.')?;
            }
            f.write_str(&segment.name)?;
            write_arguments(f, &segment.arguments)?;
        }
        f.write_char(';')
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[TypeArgument]) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    f.write_char('<')?;
    for argument in arguments {
        write!(f, "{argument}")?;
    }
    f.write_char('>')
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgument::Unbounded => f.write_char('*'),
            TypeArgument::Exact(ty) => write!(f, "{ty}"),
            TypeArgument::Extends(ty) => write!(f, "+{ty}"),
            TypeArgument::Super(ty) => write!(f, "-{ty}"),
        }
    }
}

impl fmt::Display for TypeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        if let Some(bound) = &self.class_bound {
            write!(f, "{bound}")?;
        }
        for bound in &self.interface_bounds {
            write!(f, ":{bound}")?;
        }
        Ok(())
    }
}

/// `<T:..U:..>`, nothing for an empty list.
pub fn write_type_parameters(out: &mut impl Write, parameters: &[TypeParameter]) -> fmt::Result {
    if parameters.is_empty() {
        return Ok(());
    }
    out.write_char('<')?;
    for parameter in parameters {
        write!(out, "{parameter}")?;
    }
    out.write_char('>')
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_parameters(f, &self.type_parameters)?;
        f.write_char('(')?;
        for parameter in &self.parameters {
            write!(f, "{parameter}")?;
        }
        write!(f, "){}", self.return_type)?;
        for thrown in &self.throws {
            write!(f, "^{thrown}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_parameters(f, &self.type_parameters)?;
        write!(f, "{}", self.superclass)?;
        for interface in &self.interfaces {
            write!(f, "{interface}")?;
        }
        Ok(())
    }
}

impl TypeSignature {
    /// `java.util.List<? extends java.lang.Number>[]`
    pub fn to_source_string(&self) -> String {
        let mut out = String::new();
        write_source(&mut out, self);
        out
    }
}

fn write_source(out: &mut String, ty: &TypeSignature) {
    match ty {
        TypeSignature::Base(b) => out.push_str(b.keyword()),
        TypeSignature::TypeVariable(name) => out.push_str(name),
        TypeSignature::Array {
            dimensions,
            component,
        } => {
            write_source(out, component);
            for _ in 0..*dimensions {
                out.push_str("[]");
            }
        }
        TypeSignature::Class(c) => {
            if !c.package.is_empty() {
                out.push_str(&c.package.replace('/', "."));
                out.push('.');
            }
            for (i, segment) in c.segments.iter().enumerate() {
                if i > 0 {
                    out.push('.');
                }
                // Member types spelled with `$` in a single segment read as nested names.
                out.push_str(&segment.name.replace('$', "."));
                if !segment.arguments.is_empty() {
                    out.push('<');
                    for (j, argument) in segment.arguments.iter().enumerate() {
                        if j > 0 {
                            out.push_str(", ");
                        }
                        match argument {
                            TypeArgument::Unbounded => out.push('?'),
                            TypeArgument::Exact(t) => write_source(out, t),
                            TypeArgument::Extends(t) => {
                                out.push_str("? extends ");
                                write_source(out, t);
                            }
                            TypeArgument::Super(t) => {
                                out.push_str("? super ");
                                write_source(out, t);
                            }
                        }
                    }
                    out.push('>');
                }
            }
        }
    }
}
