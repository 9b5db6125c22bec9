//! jbind: binding-key resolution and type-hierarchy indexing for a
//! Java-like type system.
//!
//! The work is split across the workspace crates, re-exported here:
//!
//! - [`signature`]: compact signature parsing and printing
//! - [`symbols`]: the symbol table and the `TypeProvider` seam
//! - [`resolver`]: binding keys, their resolution and their construction
//! - [`hierarchy`]: the type hierarchy index and its builder
//! - [`annotations`]: standard annotations synthesized from tag bits
//!
//! [`Session`] wires them together over one provider.

pub use jbind_annotations as annotations;
pub use jbind_common as common;
pub use jbind_hierarchy as hierarchy;
pub use jbind_resolver as resolver;
pub use jbind_signature as signature;
pub use jbind_symbols as symbols;

pub mod config;
pub use config::{SessionOptions, load_options, parse_options};

mod session;
pub use session::Session;

pub mod tracing_config;

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;
