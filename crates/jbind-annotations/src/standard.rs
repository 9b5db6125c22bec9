//! The standard annotation vocabulary.
//!
//! `StandardTags` is the explicit form of `TagBits`: which standard
//! annotations apply, the retention policy and the target kinds, decoded
//! once so nothing downstream does mask arithmetic.

use jbind_symbols::TagBits;
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Standard annotation categories, declared in emission priority order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardAnnotation {
    Target,
    Retention,
    Deprecated,
    Documented,
    Inherited,
    Override,
    SuppressWarnings,
    PolymorphicSignature,
    SafeVarargs,
}

impl StandardAnnotation {
    /// Fixed order in which synthesized annotations are appended.
    pub const PRIORITY: [StandardAnnotation; 9] = [
        StandardAnnotation::Target,
        StandardAnnotation::Retention,
        StandardAnnotation::Deprecated,
        StandardAnnotation::Documented,
        StandardAnnotation::Inherited,
        StandardAnnotation::Override,
        StandardAnnotation::SuppressWarnings,
        StandardAnnotation::PolymorphicSignature,
        StandardAnnotation::SafeVarargs,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            StandardAnnotation::Target => "java.lang.annotation.Target",
            StandardAnnotation::Retention => "java.lang.annotation.Retention",
            StandardAnnotation::Deprecated => "java.lang.Deprecated",
            StandardAnnotation::Documented => "java.lang.annotation.Documented",
            StandardAnnotation::Inherited => "java.lang.annotation.Inherited",
            StandardAnnotation::Override => "java.lang.Override",
            StandardAnnotation::SuppressWarnings => "java.lang.SuppressWarnings",
            StandardAnnotation::PolymorphicSignature => {
                "java.lang.invoke.MethodHandle$PolymorphicSignature"
            }
            StandardAnnotation::SafeVarargs => "java.lang.SafeVarargs",
        }
    }

    /// Marker bit of the categories that have one. Target and Retention are
    /// decoded from their own bit groups.
    fn marker_bit(self) -> Option<TagBits> {
        Some(match self {
            StandardAnnotation::Deprecated => TagBits::DEPRECATED,
            StandardAnnotation::Documented => TagBits::DOCUMENTED,
            StandardAnnotation::Inherited => TagBits::INHERITED,
            StandardAnnotation::Override => TagBits::OVERRIDE,
            StandardAnnotation::SuppressWarnings => TagBits::SUPPRESS_WARNINGS,
            StandardAnnotation::PolymorphicSignature => TagBits::POLYMORPHIC_SIGNATURE,
            StandardAnnotation::SafeVarargs => TagBits::SAFE_VARARGS,
            StandardAnnotation::Target | StandardAnnotation::Retention => return None,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RetentionPolicy {
    Source,
    Class,
    Runtime,
}

impl RetentionPolicy {
    pub const TYPE_NAME: &'static str = "java.lang.annotation.RetentionPolicy";

    pub fn constant_name(self) -> &'static str {
        match self {
            RetentionPolicy::Source => "SOURCE",
            RetentionPolicy::Class => "CLASS",
            RetentionPolicy::Runtime => "RUNTIME",
        }
    }

    fn from_bits(bits: TagBits) -> Option<Self> {
        let retention = bits.retention();
        if retention == TagBits::RUNTIME_RETENTION {
            Some(RetentionPolicy::Runtime)
        } else if retention == TagBits::CLASS_RETENTION {
            Some(RetentionPolicy::Class)
        } else if retention == TagBits::SOURCE_RETENTION {
            Some(RetentionPolicy::Source)
        } else {
            None
        }
    }

    fn bits(self) -> TagBits {
        match self {
            RetentionPolicy::Source => TagBits::SOURCE_RETENTION,
            RetentionPolicy::Class => TagBits::CLASS_RETENTION,
            RetentionPolicy::Runtime => TagBits::RUNTIME_RETENTION,
        }
    }
}

/// `java.lang.annotation.ElementType` constants, in emission order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    AnnotationType,
    Constructor,
    Field,
    LocalVariable,
    Method,
    Package,
    Parameter,
    Type,
    TypeUse,
    TypeParameter,
    Module,
    RecordComponent,
}

impl ElementKind {
    pub const TYPE_NAME: &'static str = "java.lang.annotation.ElementType";

    pub const ALL: [ElementKind; 12] = [
        ElementKind::AnnotationType,
        ElementKind::Constructor,
        ElementKind::Field,
        ElementKind::LocalVariable,
        ElementKind::Method,
        ElementKind::Package,
        ElementKind::Parameter,
        ElementKind::Type,
        ElementKind::TypeUse,
        ElementKind::TypeParameter,
        ElementKind::Module,
        ElementKind::RecordComponent,
    ];

    pub fn constant_name(self) -> &'static str {
        match self {
            ElementKind::AnnotationType => "ANNOTATION_TYPE",
            ElementKind::Constructor => "CONSTRUCTOR",
            ElementKind::Field => "FIELD",
            ElementKind::LocalVariable => "LOCAL_VARIABLE",
            ElementKind::Method => "METHOD",
            ElementKind::Package => "PACKAGE",
            ElementKind::Parameter => "PARAMETER",
            ElementKind::Type => "TYPE",
            ElementKind::TypeUse => "TYPE_USE",
            ElementKind::TypeParameter => "TYPE_PARAMETER",
            ElementKind::Module => "MODULE",
            ElementKind::RecordComponent => "RECORD_COMPONENT",
        }
    }

    fn bit(self) -> TagBits {
        match self {
            ElementKind::AnnotationType => TagBits::FOR_ANNOTATION_TYPE,
            ElementKind::Constructor => TagBits::FOR_CONSTRUCTOR,
            ElementKind::Field => TagBits::FOR_FIELD,
            ElementKind::LocalVariable => TagBits::FOR_LOCAL_VARIABLE,
            ElementKind::Method => TagBits::FOR_METHOD,
            ElementKind::Package => TagBits::FOR_PACKAGE,
            ElementKind::Parameter => TagBits::FOR_PARAMETER,
            ElementKind::Type => TagBits::FOR_TYPE,
            ElementKind::TypeUse => TagBits::FOR_TYPE_USE,
            ElementKind::TypeParameter => TagBits::FOR_TYPE_PARAMETER,
            ElementKind::Module => TagBits::FOR_MODULE,
            ElementKind::RecordComponent => TagBits::FOR_RECORD_COMPONENT,
        }
    }
}

/// Explicit form of a declaration's standard-annotation tag bits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StandardTags {
    categories: BTreeSet<StandardAnnotation>,
    retention: Option<RetentionPolicy>,
    targets: SmallVec<[ElementKind; 4]>,
}

impl StandardTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tag_bits(bits: TagBits) -> Self {
        let mut tags = StandardTags::new();
        if bits.intersects(TagBits::TARGET_MASK) {
            tags.categories.insert(StandardAnnotation::Target);
            tags.targets = ElementKind::ALL
                .into_iter()
                .filter(|kind| bits.contains(kind.bit()))
                .collect();
        }
        if let Some(retention) = RetentionPolicy::from_bits(bits) {
            tags.categories.insert(StandardAnnotation::Retention);
            tags.retention = Some(retention);
        }
        for category in StandardAnnotation::PRIORITY {
            if let Some(bit) = category.marker_bit() {
                if bits.contains(bit) {
                    tags.categories.insert(category);
                }
            }
        }
        tags
    }

    /// Back to the storage form.
    pub fn to_tag_bits(&self) -> TagBits {
        let mut bits = TagBits::empty();
        for &category in &self.categories {
            match category {
                StandardAnnotation::Target => {
                    bits |= TagBits::ANNOTATION_TARGET;
                    for kind in &self.targets {
                        bits |= kind.bit();
                    }
                }
                StandardAnnotation::Retention => {
                    if let Some(retention) = self.retention {
                        bits |= retention.bits();
                    }
                }
                other => {
                    if let Some(bit) = other.marker_bit() {
                        bits |= bit;
                    }
                }
            }
        }
        bits
    }

    /// Add a marker category (`Deprecated`, `Override`, ...).
    pub fn with(mut self, category: StandardAnnotation) -> Self {
        self.categories.insert(category);
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.categories.insert(StandardAnnotation::Retention);
        self.retention = Some(retention);
        self
    }

    /// An explicit `@Target`; an empty slice is `@Target({})`.
    pub fn with_targets(mut self, targets: &[ElementKind]) -> Self {
        self.categories.insert(StandardAnnotation::Target);
        self.targets = ElementKind::ALL
            .into_iter()
            .filter(|kind| targets.contains(kind))
            .collect();
        self
    }

    pub fn contains(&self, category: StandardAnnotation) -> bool {
        self.categories.contains(&category)
    }

    pub fn retention(&self) -> Option<RetentionPolicy> {
        self.retention
    }

    /// Target kinds in `ElementType` order.
    pub fn targets(&self) -> &[ElementKind] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
