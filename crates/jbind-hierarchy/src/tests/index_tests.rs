use crate::*;
use jbind_symbols::{DeclarationKind, InMemoryTypeProvider, SymbolTable, TypeDeclaration, TypeFlags};
use std::sync::Arc;

fn names(list: Vec<Arc<str>>) -> Vec<String> {
    list.iter().map(|n| n.to_string()).collect()
}

/// Object <- Base <- A <- B, B implements Runnable, Runnable <- Task (interface).
fn sample() -> HierarchyIndex {
    let mut index = HierarchyIndex::new();
    index.insert_type("java.lang.Object", DeclarationKind::Class, TypeFlags::empty());
    index.insert_type("p.Base", DeclarationKind::Class, TypeFlags::empty());
    index.insert_type("p.A", DeclarationKind::Class, TypeFlags::empty());
    index.insert_type("p.B", DeclarationKind::Class, TypeFlags::empty());
    index.insert_type("java.lang.Runnable", DeclarationKind::Interface, TypeFlags::empty());
    index.insert_type("p.Task", DeclarationKind::Interface, TypeFlags::empty());
    index.add_edge("p.Base", "java.lang.Object", EdgeKind::Superclass);
    index.add_edge("p.A", "p.Base", EdgeKind::Superclass);
    index.add_edge("p.B", "p.A", EdgeKind::Superclass);
    index.add_edge("p.B", "java.lang.Runnable", EdgeKind::Superinterface);
    index.add_edge("p.Task", "java.lang.Runnable", EdgeKind::Superinterface);
    index
}

#[test]
fn test_direct_and_transitive_subtypes() {
    let index = sample();
    assert_eq!(names(index.subtypes_of("p.Base", false)), vec!["p.A"]);
    assert_eq!(names(index.subtypes_of("p.Base", true)), vec!["p.A", "p.B"]);
    assert_eq!(
        names(index.subtypes_of("java.lang.Runnable", false)),
        vec!["p.B", "p.Task"]
    );
    assert!(index.subtypes_of("p.B", true).is_empty());
    assert!(index.subtypes_of("p.Unknown", true).is_empty());
}

#[test]
fn test_supertypes_superclass_first() {
    let index = sample();
    assert_eq!(
        names(index.supertypes_of("p.B", false)),
        vec!["p.A", "java.lang.Runnable"]
    );
    assert_eq!(
        names(index.supertypes_of("p.B", true)),
        vec!["p.A", "java.lang.Runnable", "p.Base", "java.lang.Object"]
    );
    assert_eq!(index.superclass_of("p.A").as_deref(), Some("p.Base"));
    assert_eq!(index.superclass_of("java.lang.Object"), None);
}

#[test]
fn test_every_edge_walks_both_ways() {
    let index = sample();
    for edge in index.edges() {
        assert!(
            index.subtypes_of(&edge.supertype, false).contains(&edge.subtype),
            "{} -> {}",
            edge.subtype,
            edge.supertype
        );
        assert!(index.supertypes_of(&edge.subtype, false).contains(&edge.supertype));
    }
    assert_eq!(index.check_consistency(), Ok(()));
}

#[test]
fn test_class_and_interface_queries() {
    let index = sample();
    assert_eq!(names(index.subclasses_of("p.A")), vec!["p.B"]);
    assert_eq!(names(index.implementing_classes("java.lang.Runnable")), vec!["p.B"]);
    assert_eq!(names(index.extending_interfaces("java.lang.Runnable")), vec!["p.Task"]);
    assert_eq!(names(index.root_classes()), vec!["java.lang.Object"]);
    assert_eq!(
        names(index.root_interfaces()),
        vec!["java.lang.Runnable"]
    );
    assert_eq!(index.all_classes().len(), 4);
    assert_eq!(index.all_interfaces().len(), 2);
}

#[test]
fn test_duplicate_edge_is_ignored() {
    let mut index = sample();
    assert!(!index.add_edge("p.A", "p.Base", EdgeKind::Superclass));
    assert_eq!(names(index.subtypes_of("p.Base", false)), vec!["p.A"]);
}

#[test]
fn test_new_superclass_replaces_the_old_one() {
    let mut index = sample();
    assert!(index.add_edge("p.B", "p.Base", EdgeKind::Superclass));
    assert_eq!(index.superclass_of("p.B").as_deref(), Some("p.Base"));
    assert!(index.subtypes_of("p.A", false).is_empty());
    assert_eq!(names(index.subtypes_of("p.Base", false)), vec!["p.A", "p.B"]);
    assert_eq!(index.check_consistency(), Ok(()));
}

#[test]
fn test_edits_invalidate_closures() {
    let mut index = sample();
    assert_eq!(index.subtypes_of("p.Base", true).len(), 2);

    index.insert_type("p.C", DeclarationKind::Class, TypeFlags::empty());
    index.add_edge("p.C", "p.B", EdgeKind::Superclass);
    assert_eq!(names(index.subtypes_of("p.Base", true)), vec!["p.A", "p.B", "p.C"]);

    assert!(index.remove_edge("p.B", "p.A"));
    assert_eq!(names(index.subtypes_of("p.Base", true)), vec!["p.A"]);
    assert_eq!(index.check_consistency(), Ok(()));
}

#[test]
fn test_remove_type_unlinks_both_directions() {
    let mut index = sample();
    assert!(index.remove_type("p.A"));
    assert!(!index.contains("p.A"));
    assert!(index.subtypes_of("p.Base", false).is_empty());
    assert_eq!(index.superclass_of("p.B"), None);
    assert_eq!(index.check_consistency(), Ok(()));
    assert!(!index.remove_type("p.A"));
}

#[test]
fn test_cyclic_edges_terminate() {
    let mut index = HierarchyIndex::new();
    index.insert_type("p.I", DeclarationKind::Interface, TypeFlags::empty());
    index.insert_type("p.J", DeclarationKind::Interface, TypeFlags::empty());
    index.add_edge("p.I", "p.J", EdgeKind::Superinterface);
    index.add_edge("p.J", "p.I", EdgeKind::Superinterface);
    assert_eq!(names(index.subtypes_of("p.I", true)), vec!["p.J"]);
    assert_eq!(names(index.supertypes_of("p.I", true)), vec!["p.J"]);
}

#[test]
fn test_missing_types_are_tracked() {
    let mut index = sample();
    index.mark_missing("p.Gone");
    index.mark_missing("p.Gone");
    assert!(index.is_missing("p.Gone"));
    assert_eq!(index.missing_types().len(), 1);

    index.insert_type("p.Gone", DeclarationKind::Class, TypeFlags::empty());
    assert!(!index.is_missing("p.Gone"));
}

#[test]
fn test_local_and_anonymous_flags() {
    let mut index = sample();
    index.insert_type("p.A$1", DeclarationKind::Class, TypeFlags::ANONYMOUS);
    index.add_edge("p.A$1", "p.A", EdgeKind::Superclass);
    let node = index.node("p.A$1").expect("inserted");
    assert!(node.is_local_or_anonymous());
    assert!(!index.node("p.A").expect("inserted").is_local_or_anonymous());
}

#[test]
fn test_symbol_table_adapters() {
    let provider = InMemoryTypeProvider::from_declarations([
        TypeDeclaration::class("java.lang.Object"),
        TypeDeclaration::class("p.Base"),
        TypeDeclaration::class("p.A").extends("p.Base"),
        TypeDeclaration::class("p.B").extends("p.A"),
    ]);
    let table = SymbolTable::new(Arc::new(provider));
    let index = sample();

    let base = table.intern_declared("p.Base");
    let subtypes = index.subtypes_of_type(&table, base, true).expect("known type");
    let display: Vec<String> = subtypes.iter().map(|&id| table.display_name(id)).collect();
    assert_eq!(display, vec!["p.A", "p.B"]);

    let b = table.intern_declared("p.B");
    let supertypes = index.supertypes_of_type(&table, b, false).expect("known type");
    assert_eq!(supertypes.len(), 2);
    assert_eq!(supertypes[0], table.intern_declared("p.A"));

    let unknown = table.intern_declared("p.Elsewhere");
    assert!(matches!(
        index.subtypes_of_type(&table, unknown, false),
        Err(HierarchyError::UnknownType { .. })
    ));
}
