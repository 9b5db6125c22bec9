use crate::*;

const CORPUS: &str = r#"{
  "types": [
    { "name": "java.lang.Object" },
    { "name": "com.example.Base", "flags": "PUBLIC | ABSTRACT" },
    { "name": "com.example.A", "superclass": "com.example.Base" },
    { "name": "com.example.B", "superclass": "com.example.A",
      "interfaces": ["java.io.Serializable"] },
    { "name": "com.example.Marker", "kind": "annotation",
      "tagBits": "ANNOTATION_TARGET | FOR_TYPE | FOR_METHOD | RUNTIME_RETENTION | DOCUMENTED" },
    { "name": "com.example.Repo", "kind": "interface",
      "signature": "<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Iterable<TT;>;",
      "methods": [
        { "selector": "find", "signature": "(Ljava/lang/String;)TT;",
          "parameterNames": ["id"],
          "annotations": [ { "typeName": "java.lang.Deprecated" } ] }
      ] }
  ]
}"#;

#[test]
fn test_corpus_loads_from_json() {
    let provider = InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus");
    assert_eq!(provider.len(), 6);

    let base = provider
        .lookup_by_name("com.example.Base")
        .expect("readable")
        .expect("present");
    assert!(base.flags.contains(TypeFlags::ABSTRACT));
    assert_eq!(base.kind, DeclarationKind::Class);

    let marker = provider
        .lookup_by_name("com.example.Marker")
        .expect("readable")
        .expect("present");
    assert_eq!(marker.kind, DeclarationKind::Annotation);
    assert_eq!(marker.tag_bits.retention(), TagBits::RUNTIME_RETENTION);
    assert!(marker.tag_bits.contains(TagBits::FOR_METHOD));

    assert_eq!(provider.lookup_by_name("com.example.Nope"), Ok(None));
}

#[test]
fn test_supertype_names() {
    let provider = InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus");
    let supers = |name: &str| provider.declared_supertypes_of(name).expect("readable");

    assert_eq!(supers("com.example.B"), vec!["com.example.A", "java.io.Serializable"]);
    // Classes without a declared superclass extend the root.
    assert_eq!(supers("com.example.Base"), vec!["java.lang.Object"]);
    assert!(supers("java.lang.Object").is_empty());
    // Interfaces have no superclass even though their signature names Object.
    assert_eq!(supers("com.example.Repo"), vec!["java.lang.Iterable"]);
    assert!(supers("com.example.Unknown").is_empty());
}

#[test]
fn test_reverse_lookup_uses_simple_names() {
    let provider = InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus");
    assert_eq!(
        provider.reverse_lookup("Base").expect("ok"),
        vec!["com.example.A".to_string()]
    );
    assert_eq!(
        provider.reverse_lookup("A").expect("ok"),
        vec!["com.example.B".to_string()]
    );
    assert!(provider.reverse_lookup("B").expect("ok").is_empty());
}

#[test]
fn test_insert_replaces_reverse_index_entries() {
    let mut provider = InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus");
    provider.insert(TypeDeclaration::class("com.example.A"));
    assert!(provider.reverse_lookup("Base").expect("ok").is_empty());
    assert_eq!(provider.len(), 6);
}

#[test]
fn test_unparsable_signatures_answer_every_reverse_lookup() {
    let mut provider = InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus");
    provider.insert(TypeDeclaration::class("com.example.C").with_signature("Lcom/example/Base"));
    assert_eq!(
        provider.reverse_lookup("Base").expect("ok"),
        vec!["com.example.A".to_string(), "com.example.C".to_string()]
    );
    assert_eq!(
        provider.reverse_lookup("Nothing").expect("ok"),
        vec!["com.example.C".to_string()]
    );

    provider.insert(TypeDeclaration::class("com.example.C").extends("com.example.A"));
    assert!(provider.reverse_lookup("Nothing").expect("ok").is_empty());
    assert_eq!(
        provider.reverse_lookup("A").expect("ok"),
        vec!["com.example.B".to_string(), "com.example.C".to_string()]
    );
}

struct ScanningProvider(InMemoryTypeProvider);

impl TypeProvider for ScanningProvider {
    fn lookup_by_name(&self, name: &str) -> Result<Option<TypeDeclaration>, ProviderError> {
        self.0.lookup_by_name(name)
    }

    fn known_type_names(&self) -> Vec<String> {
        self.0.known_type_names()
    }
}

#[test]
fn test_default_reverse_lookup_scans_known_names() {
    let provider = ScanningProvider(InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus"));
    assert_eq!(
        provider.reverse_lookup("A").expect("ok"),
        vec!["com.example.B".to_string()]
    );
    let serializable = provider.reverse_lookup("Serializable").expect("ok");
    assert_eq!(serializable, vec!["com.example.B".to_string()]);
}

#[test]
fn test_unreadable_entries_fail_lookup() {
    let mut provider = InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus");
    provider.mark_unreadable("com.example.A");
    let err = provider.lookup_by_name("com.example.A").unwrap_err();
    assert_eq!(err.name(), "com.example.A");
    // Still a reverse-lookup candidate so the caller can report it.
    assert_eq!(
        provider.reverse_lookup("Base").expect("ok"),
        vec!["com.example.A".to_string()]
    );
}

#[test]
fn test_corpus_round_trips_through_json() {
    let provider = InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus");
    let json = serde_json::to_string(&provider.to_corpus()).expect("serializes");
    let reloaded = InMemoryTypeProvider::from_json(&json).expect("reloads");
    for name in provider.known_type_names() {
        assert_eq!(
            provider.lookup_by_name(&name),
            reloaded.lookup_by_name(&name),
            "{name}"
        );
    }
}

#[test]
fn test_method_declarations_reach_the_table() {
    let provider = InMemoryTypeProvider::from_json(CORPUS).expect("valid corpus");
    let table = SymbolTable::new(std::sync::Arc::new(provider));
    let repo = table.lookup_type("com.example.Repo").expect("repo");
    let desc = table.descriptor(repo).expect("repo");
    assert_eq!(desc.kind, TypeKind::Interface);
    assert_eq!(desc.supertype, None);
    let find = table.method(desc.methods[0]).expect("find");
    assert_eq!(&*find.selector, "find");
    assert_eq!(find.parameter_names.len(), 1);
    assert_eq!(find.return_type, desc.type_parameters[0]);
    assert_eq!(find.annotations.len(), 1);
}
