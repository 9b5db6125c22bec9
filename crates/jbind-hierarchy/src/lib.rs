//! Type hierarchy index for the jbind binding resolver.
//!
//! - `HierarchyIndex`: bidirectional subtype/supertype edges with memoized closures
//! - `HierarchyBuilder`: populates an index from a `TypeProvider`, in parallel waves
//! - Snapshots: JSON persistence of a built index

pub mod builder;
pub mod error;
pub mod index;
mod persist;

pub use builder::{
    BuildOutcome, BuildStatus, CancellationToken, HierarchyBuilder, HierarchyOptions,
};
pub use error::{HierarchyError, PersistError};
pub use index::{EdgeKind, HierarchyEdge, HierarchyIndex, HierarchyNode};
pub use persist::{HierarchySnapshot, SNAPSHOT_VERSION, SnapshotType};

#[cfg(test)]
#[path = "tests/index_tests.rs"]
mod index_tests;

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod builder_tests;

#[cfg(test)]
#[path = "tests/persist_tests.rs"]
mod persist_tests;
