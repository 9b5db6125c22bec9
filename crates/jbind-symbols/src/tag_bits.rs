use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Standard-annotation tag bits recorded on a declaration.
    ///
    /// This is the storage and wire form only. Consumers that synthesize
    /// annotations convert it into an explicit set first.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TagBits: u64 {
        /// An explicit `@Target` is present, possibly with no kinds (`@Target({})`).
        const ANNOTATION_TARGET = 1 << 0;
        const FOR_ANNOTATION_TYPE = 1 << 1;
        const FOR_CONSTRUCTOR = 1 << 2;
        const FOR_FIELD = 1 << 3;
        const FOR_LOCAL_VARIABLE = 1 << 4;
        const FOR_METHOD = 1 << 5;
        const FOR_PACKAGE = 1 << 6;
        const FOR_PARAMETER = 1 << 7;
        const FOR_TYPE = 1 << 8;
        const FOR_TYPE_USE = 1 << 9;
        const FOR_TYPE_PARAMETER = 1 << 10;
        const FOR_MODULE = 1 << 11;
        const FOR_RECORD_COMPONENT = 1 << 12;
        const TARGET_MASK = (1 << 13) - 1;

        const SOURCE_RETENTION = 1 << 16;
        const CLASS_RETENTION = 1 << 17;
        /// Runtime retention is encoded as both retention bits.
        const RUNTIME_RETENTION = Self::SOURCE_RETENTION.bits() | Self::CLASS_RETENTION.bits();
        const RETENTION_MASK = Self::RUNTIME_RETENTION.bits();

        const DEPRECATED = 1 << 20;
        const DOCUMENTED = 1 << 21;
        const INHERITED = 1 << 22;
        const OVERRIDE = 1 << 23;
        const SUPPRESS_WARNINGS = 1 << 24;
        const POLYMORPHIC_SIGNATURE = 1 << 25;
        const SAFE_VARARGS = 1 << 26;
    }
}

impl TagBits {
    /// Just the retention bits, `empty()` when no retention is recorded.
    pub fn retention(self) -> TagBits {
        self & TagBits::RETENTION_MASK
    }
}
