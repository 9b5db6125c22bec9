use jbind_symbols::SymbolError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The key does not follow the key grammar. `offset` is the byte offset
    /// of the offending character, or of the end of the key when a
    /// delimiter is missing.
    #[error("malformed binding key at offset {offset}: {reason}")]
    MalformedKey { offset: usize, reason: String },

    #[error("unresolved symbol '{name}'")]
    UnresolvedSymbol { name: String },

    /// Only raised with `ResolverOptions::strict_overloads`; otherwise the
    /// first candidate wins and a warning is recorded.
    #[error("{candidates} overloads of '{selector}' match the key")]
    AmbiguousOverload { selector: String, candidates: usize },

    #[error(transparent)]
    Symbol(SymbolError),
}

impl ResolutionError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        ResolutionError::MalformedKey {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn unresolved(name: impl Into<String>) -> Self {
        ResolutionError::UnresolvedSymbol { name: name.into() }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ResolutionError::MalformedKey { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResolutionError::UnresolvedSymbol { .. })
    }
}

/// Unknown names surface as `UnresolvedSymbol`; provider and signature
/// failures keep their `SymbolError`.
impl From<SymbolError> for ResolutionError {
    fn from(err: SymbolError) -> Self {
        match err {
            SymbolError::Unresolved { name } => ResolutionError::UnresolvedSymbol { name },
            other => ResolutionError::Symbol(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolutionError>;
