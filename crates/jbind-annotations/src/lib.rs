//! Annotation binding builder.
//!
//! Expands a declaration's tag bits into the standard annotations they stand
//! for (`@Target`, `@Retention`, `@Deprecated`, ...) and appends them to the
//! explicitly written ones.

mod builder;
pub mod standard;

pub use builder::{add_standard_annotations, standard_annotation, synthesize_standard_annotations};
pub use standard::{ElementKind, RetentionPolicy, StandardAnnotation, StandardTags};

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod builder_tests;
