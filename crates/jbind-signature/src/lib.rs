//! Compact signature parsing.
//!
//! Decodes the textual signature grammar (primitive codes, `L<name>;` class
//! types, `[` arrays, `<...>` type arguments, `+`/`-`/`*` wildcards and
//! `T<name>;` type variables) into [`TypeSignature`] trees and prints them back.
//! Name resolution is not performed here; see `jbind-symbols`.

mod error;
mod parser;
mod printer;
mod types;

pub use error::{MalformedSignatureError, SignatureErrorKind};
pub use parser::{
    Result, SignatureParser, parse_class_signature, parse_method_signature, parse_type_signature,
};
pub use printer::write_type_parameters;
pub use types::*;

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod types_tests;
