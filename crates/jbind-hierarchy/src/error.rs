use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// An edge whose reverse entry is missing, or the other way round.
    #[error("orphaned hierarchy edge '{subtype}' -> '{supertype}'")]
    OrphanedEdge { subtype: String, supertype: String },

    #[error("type '{name}' is not in the hierarchy")]
    UnknownType { name: String },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("hierarchy snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("hierarchy snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hierarchy snapshot version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}
