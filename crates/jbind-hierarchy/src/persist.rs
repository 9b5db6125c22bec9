//! JSON snapshots of a hierarchy index.

use crate::error::PersistError;
use crate::index::{HierarchyEdge, HierarchyIndex};
use jbind_symbols::{DeclarationKind, TypeFlags};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotType {
    pub name: String,
    pub kind: DeclarationKind,
    #[serde(default, skip_serializing_if = "TypeFlags::is_empty")]
    pub flags: TypeFlags,
}

/// Serialized form of a `HierarchyIndex`. Closures are not stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchySnapshot {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    pub types: Vec<SnapshotType>,
    pub edges: Vec<HierarchyEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl HierarchyIndex {
    pub fn to_snapshot(&self) -> HierarchySnapshot {
        let types = self
            .type_names()
            .filter_map(|name| {
                let node = self.node(name)?;
                Some(SnapshotType {
                    name: name.to_string(),
                    kind: node.kind?,
                    flags: node.flags,
                })
            })
            .collect();
        HierarchySnapshot {
            version: SNAPSHOT_VERSION,
            focus: self.focus().map(str::to_string),
            types,
            edges: self.edges(),
            missing: self.missing_types().iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn from_snapshot(snapshot: HierarchySnapshot) -> Result<Self, PersistError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let mut index = match &snapshot.focus {
            Some(focus) => Self::with_focus(focus),
            None => Self::new(),
        };
        for ty in &snapshot.types {
            index.insert_type(&ty.name, ty.kind, ty.flags);
        }
        for edge in &snapshot.edges {
            index.add_edge(&edge.subtype, &edge.supertype, edge.kind);
        }
        for name in &snapshot.missing {
            index.mark_missing(name);
        }
        debug!(
            types = index.len(),
            edges = snapshot.edges.len(),
            "hierarchy snapshot loaded"
        );
        Ok(index)
    }

    pub fn save(&self, writer: impl Write) -> Result<(), PersistError> {
        serde_json::to_writer_pretty(writer, &self.to_snapshot())?;
        Ok(())
    }

    pub fn load(reader: impl Read) -> Result<Self, PersistError> {
        let snapshot: HierarchySnapshot = serde_json::from_reader(reader)?;
        Self::from_snapshot(snapshot)
    }
}
