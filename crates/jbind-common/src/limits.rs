//! Centralized limits and thresholds.
//!
//! Recursion depths bound the recursive-descent parsers, iteration counts bound
//! the hierarchy work queue. Callers that need a tighter bound pass their own
//! value through the session options; these are the defaults.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting of type arguments, array components and bounds in a
/// single signature.
///
/// `Ljava/util/List<Ljava/util/List<Ljava/util/List<...>;>;>;` nests one
/// level per `<`. Real signatures rarely exceed a dozen levels; anything past
/// this is rejected as malformed rather than risking a stack overflow.
pub const MAX_SIGNATURE_DEPTH: u32 = 128;

/// Maximum nesting of type keys inside a binding key (type arguments,
/// wildcard bounds, captures, qualified type variables).
pub const MAX_KEY_DEPTH: u32 = 128;

/// Maximum array dimensions accepted by the parsers (JVM limit).
pub const MAX_ARRAY_DIMENSIONS: u32 = 255;

// =============================================================================
// Operation Count Limits
// =============================================================================

/// Default bound on hierarchy work-queue iterations.
///
/// Each iteration is one provider read, by name or by reverse lookup. A focus
/// type with a very wide subtype tree (e.g. `java.io.Serializable`) can
/// otherwise walk the whole corpus.
pub const DEFAULT_MAX_HIERARCHY_ITERATIONS: usize = 100_000;

/// Default supertype chain length followed when walking upwards from a
/// focus type.
pub const MAX_SUPERTYPE_WALK: usize = 4_096;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Initial capacity for per-session key caches.
pub const KEY_CACHE_CAPACITY: usize = 256;

/// Frontier size below which a hierarchy wave is processed sequentially.
pub const PARALLEL_WAVE_THRESHOLD: usize = 8;
