//! Binding keys and their resolution.
//!
//! - `parse_key`: key text to a `ParsedKey`, through an explicit state machine
//! - `BindingResolver`: parsed keys to `Binding`s against a `SymbolTable`
//! - `KeyBuilder`: `Binding`s back to keys
//! - `BindingKey`: the key newtype and its constructors

mod binding;
mod error;
mod key;
mod key_builder;
pub mod key_parser;
mod resolver;

pub use binding::{Binding, LocalKind, LocalVariableBinding};
pub use error::{ResolutionError, Result};
pub use key::{BindingKey, KeyKind, WildcardKind};
pub use key_builder::KeyBuilder;
pub use key_parser::{KeyState, ParsedKey, parse_key};
pub use resolver::{BindingResolver, CONSTRUCTOR_SELECTOR, ResolverOptions};

#[cfg(test)]
#[path = "tests/key_parser_tests.rs"]
mod key_parser_tests;

#[cfg(test)]
#[path = "tests/key_tests.rs"]
mod key_tests;

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod resolver_tests;

#[cfg(test)]
#[path = "tests/key_builder_tests.rs"]
mod key_builder_tests;
