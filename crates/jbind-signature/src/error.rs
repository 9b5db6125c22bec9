use thiserror::Error;

/// Why a signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureErrorKind {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unexpected character {found:?}, expected {expected}")]
    UnexpectedChar { found: char, expected: &'static str },

    #[error("empty name")]
    EmptyName,

    #[error("class type is missing its terminating ';'")]
    UnterminatedClassType,

    #[error("'<' without matching '>'")]
    UnbalancedTypeArguments,

    #[error("empty type argument list")]
    EmptyTypeArguments,

    #[error("'void' is only allowed as a return type")]
    VoidNotAllowed,

    #[error("trailing input after a complete signature")]
    TrailingInput,

    #[error("nesting exceeds {limit} levels")]
    TooDeep { limit: u32 },

    #[error("more than {limit} array dimensions")]
    TooManyDimensions { limit: u32 },
}

/// A signature that does not conform to the grammar.
///
/// `offset` is the byte offset of the offending character (or of the end of
/// input when something is missing); `fragment` is the input starting there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed signature at offset {offset} near {fragment:?}: {kind}")]
pub struct MalformedSignatureError {
    pub offset: usize,
    pub fragment: String,
    pub kind: SignatureErrorKind,
}

const FRAGMENT_LEN: usize = 24;

impl MalformedSignatureError {
    pub(crate) fn at(source: &str, offset: usize, kind: SignatureErrorKind) -> Self {
        let offset = offset.min(source.len());
        let fragment = source[offset..].chars().take(FRAGMENT_LEN).collect();
        Self {
            offset,
            fragment,
            kind,
        }
    }
}
