//! Qualified-name utilities.
//!
//! Two spellings of a type name circulate through the crates:
//!
//! - **qualified** (`java.util.Map$Entry`): dotted package, `$` between a
//!   member type and its enclosing type. This is the canonical form stored in
//!   the symbol table and the hierarchy index.
//! - **internal** (`java/util/Map$Entry`): slash-separated package, used in
//!   signatures and binding keys.

use memchr::{memchr, memrchr};

/// The universal root of the class hierarchy.
pub const UNIVERSAL_ROOT: &str = "java.lang.Object";

/// `java/util/List` -> `java.util.List`
pub fn internal_to_qualified(internal: &str) -> String {
    if memchr(b'/', internal.as_bytes()).is_none() {
        return internal.to_string();
    }
    internal.replace('/', ".")
}

/// `java.util.List` -> `java/util/List`
pub fn qualified_to_internal(qualified: &str) -> String {
    if memchr(b'.', qualified.as_bytes()).is_none() {
        return qualified.to_string();
    }
    qualified.replace('.', "/")
}

/// Package part of a qualified name (`""` for the default package).
pub fn package_of(qualified: &str) -> &str {
    match memrchr(b'.', qualified.as_bytes()) {
        Some(idx) => &qualified[..idx],
        None => "",
    }
}

/// Binary simple name: the part after the package (`Map$Entry`).
pub fn binary_simple_name(qualified: &str) -> &str {
    match memrchr(b'.', qualified.as_bytes()) {
        Some(idx) => &qualified[idx + 1..],
        None => qualified,
    }
}

/// Source simple name: the innermost member name (`Entry` for `Map$Entry`).
///
/// Local types keep their source name (`1Local` -> `Local`); anonymous types
/// have only their ordinal (`1`).
pub fn simple_name(qualified: &str) -> &str {
    let binary = binary_simple_name(qualified);
    let last = match memrchr(b'$', binary.as_bytes()) {
        Some(idx) if idx + 1 < binary.len() => &binary[idx + 1..],
        _ => binary,
    };
    let digits = last.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && digits < last.len() {
        &last[digits..]
    } else {
        last
    }
}

/// Enclosing type of a member, local or anonymous type (`Map` for `Map$Entry`).
pub fn enclosing_of(qualified: &str) -> Option<&str> {
    let binary_start = qualified.len() - binary_simple_name(qualified).len();
    let idx = memrchr(b'$', &qualified.as_bytes()[binary_start..])?;
    if idx == 0 {
        return None;
    }
    Some(&qualified[..binary_start + idx])
}

/// `true` for `p.X$1`: the innermost segment is purely numeric.
pub fn is_anonymous_name(qualified: &str) -> bool {
    let binary = binary_simple_name(qualified);
    match memrchr(b'$', binary.as_bytes()) {
        Some(idx) => {
            let tail = &binary[idx + 1..];
            !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// `true` for `p.X$1Local`: numeric prefix followed by a source name.
pub fn is_local_name(qualified: &str) -> bool {
    let binary = binary_simple_name(qualified);
    match memrchr(b'$', binary.as_bytes()) {
        Some(idx) => {
            let tail = &binary[idx + 1..];
            let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
            digits > 0 && digits < tail.len()
        }
        None => false,
    }
}

/// Java identifiers as accepted by the key and signature grammars.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
