use jbind_signature::MalformedSignatureError;
use thiserror::Error;

/// Failure reported by a `TypeProvider`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("type '{name}' could not be read: {reason}")]
    Unreadable { name: String, reason: String },

    #[error("type '{name}' is malformed: {reason}")]
    Malformed { name: String, reason: String },
}

impl ProviderError {
    pub fn name(&self) -> &str {
        match self {
            ProviderError::Unreadable { name, .. } | ProviderError::Malformed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("unresolved symbol '{name}'")]
    Unresolved { name: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("signature of '{owner}' is malformed: {source}")]
    Signature {
        owner: String,
        #[source]
        source: MalformedSignatureError,
    },
}

impl SymbolError {
    pub fn unresolved(name: impl Into<String>) -> Self {
        SymbolError::Unresolved { name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, SymbolError>;
