use crate::standard::{ElementKind, RetentionPolicy, StandardAnnotation, StandardTags};
use jbind_symbols::{AnnotationBinding, ElementValue, SymbolTable, TagBits};
use tracing::trace;

/// `explicit` followed by the standard annotations implied by `tag_bits`.
///
/// A category is skipped when an annotation of its type is already among
/// `explicit`. The appended sequence depends only on the tags and on which
/// types are explicit, in `StandardAnnotation::PRIORITY` order.
pub fn add_standard_annotations(
    explicit: &[AnnotationBinding],
    tag_bits: TagBits,
    table: &SymbolTable,
) -> Vec<AnnotationBinding> {
    synthesize_standard_annotations(explicit, &StandardTags::from_tag_bits(tag_bits), table)
}

pub fn synthesize_standard_annotations(
    explicit: &[AnnotationBinding],
    tags: &StandardTags,
    table: &SymbolTable,
) -> Vec<AnnotationBinding> {
    let mut result = explicit.to_vec();
    if tags.is_empty() {
        return result;
    }
    for category in StandardAnnotation::PRIORITY {
        if !tags.contains(category) {
            continue;
        }
        let annotation_type = table.intern_declared(category.type_name());
        if explicit
            .iter()
            .any(|a| a.annotation_type == annotation_type)
        {
            trace!(?category, "standard annotation already explicit");
            continue;
        }
        result.push(standard_annotation(category, tags, table));
    }
    result
}

/// A fully formed binding for one category.
pub fn standard_annotation(
    category: StandardAnnotation,
    tags: &StandardTags,
    table: &SymbolTable,
) -> AnnotationBinding {
    let binding = AnnotationBinding::marker(table.intern_declared(category.type_name()));
    match category {
        StandardAnnotation::Target => {
            let element_type = table.intern_declared(ElementKind::TYPE_NAME);
            let kinds = tags
                .targets()
                .iter()
                .map(|kind| ElementValue::enum_constant(element_type, kind.constant_name()))
                .collect();
            binding.with_pair("value", ElementValue::Array(kinds))
        }
        StandardAnnotation::Retention => {
            let policy_type = table.intern_declared(RetentionPolicy::TYPE_NAME);
            let policy = tags.retention().unwrap_or(RetentionPolicy::Class);
            binding.with_pair(
                "value",
                ElementValue::enum_constant(policy_type, policy.constant_name()),
            )
        }
        _ => binding,
    }
}
