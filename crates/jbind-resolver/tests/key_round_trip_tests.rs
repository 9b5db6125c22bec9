use jbind_resolver::*;
use jbind_symbols::{InMemoryTypeProvider, SymbolTable};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("jbind_resolver=trace")
        .try_init();
}

const CORPUS: &str = r#"{
  "types": [
    { "name": "java.lang.Object" },
    { "name": "java.lang.String" },
    { "name": "java.lang.Number" },
    { "name": "java.lang.Integer", "superclass": "java.lang.Number" },
    { "name": "java.util.List", "kind": "interface", "signature": "<E:Ljava/lang/Object;>Ljava/lang/Object;" },
    {
      "name": "java.util.Map",
      "kind": "interface",
      "signature": "<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;"
    },
    { "name": "java.util.Map$Entry", "kind": "interface", "signature": "<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;" },
    {
      "name": "p.Repo",
      "signature": "<T:Ljava/lang/Number;>Ljava/lang/Object;",
      "methods": [
        { "selector": "<init>", "signature": "()V" },
        { "selector": "find", "signature": "(Ljava/lang/String;)TT;", "parameterNames": ["id"], "locals": [{ "name": "hit", "signature": "TT;" }] },
        { "selector": "all", "signature": "()Ljava/util/List<TT;>;" },
        { "selector": "copy", "signature": "<S:TT;>(Ljava/util/List<+TS;>;)Ljava/util/List<-TT;>;" },
        { "selector": "index", "signature": "()Ljava/util/Map<Ljava/lang/String;[[I>;" }
      ],
      "fields": [
        { "name": "cache", "signature": "Ljava/util/Map<Ljava/lang/String;TT;>;" },
        { "name": "size", "signature": "I" }
      ]
    }
  ]
}"#;

fn table() -> Arc<SymbolTable> {
    let provider = InMemoryTypeProvider::from_json(CORPUS).expect("corpus");
    Arc::new(SymbolTable::new(Arc::new(provider)))
}

const KEYS: &[&str] = &[
    "p",
    "Lp/Repo;",
    "Ljava/util/Map$Entry;",
    "[Lp/Repo<Ljava/lang/Integer;>;",
    "Ljava/util/Map<Ljava/lang/String;Ljava/util/List<Ljava/lang/Integer;>;>;",
    "Lp/Repo;:TT;",
    "Ljava/util/List;{0}-Ljava/lang/Integer;",
    "!Ljava/util/List;{0}-Ljava/lang/Integer;0;",
    "Lp/Repo;.()V",
    "Lp/Repo;.find(Ljava/lang/String;)TT;",
    "Lp/Repo;.all()Ljava/util/List<TT;>;",
    "Lp/Repo;.copy<S:TT;>(Ljava/util/List<Ljava/util/List;{0}+TS;>;)Ljava/util/List<Ljava/util/List;{0}-TT;>;",
    "Lp/Repo;.copy<S:TT;>(Ljava/util/List<Ljava/util/List;{0}+TS;>;)Ljava/util/List<Ljava/util/List;{0}-TT;>;:TS;",
    "Lp/Repo;.index()Ljava/util/Map<Ljava/lang/String;[[I>;",
    "Lp/Repo;.cache)Ljava/util/Map<Ljava/lang/String;TT;>;",
    "Lp/Repo;.size)I",
    "Lp/Repo;.find(Ljava/lang/String;)TT;#id#0#0",
    "Lp/Repo;.find(Ljava/lang/String;)TT;#hit#0",
    "Lp/Repo;.find(Ljava/lang/String;)TT;#other#1#3",
];

#[test]
fn test_built_keys_resolve_to_the_same_binding() {
    init_tracing();
    let mut resolver = BindingResolver::new(table());
    for key in KEYS {
        let binding = resolver.resolve(key).unwrap_or_else(|err| panic!("{key}: {err}"));
        let written = KeyBuilder::new(resolver.table())
            .key_of(&binding)
            .unwrap_or_else(|err| panic!("{key}: {err}"));
        let again = resolver
            .resolve_key(&written)
            .unwrap_or_else(|err| panic!("{written}: {err}"));
        assert_eq!(again, binding, "{key} -> {written}");
    }
}

#[test]
fn test_canonical_keys_are_fixed_points() {
    init_tracing();
    let mut resolver = BindingResolver::new(table());
    for key in KEYS {
        let binding = resolver.resolve(key).expect(key);
        let written = KeyBuilder::new(resolver.table()).key_of(&binding).expect(key);
        assert_eq!(written.as_str(), *key);
    }
}

#[test]
fn test_persisted_keys_resolve_against_a_fresh_table() {
    init_tracing();
    let mut first = BindingResolver::new(table());
    let mut persisted = Vec::new();
    for key in KEYS {
        let binding = first.resolve(key).expect(key);
        persisted.push(KeyBuilder::new(first.table()).key_of(&binding).expect(key));
    }
    let json = serde_json::to_string(&persisted).expect("serialize keys");

    let restored: Vec<BindingKey> = serde_json::from_str(&json).expect("deserialize keys");
    let mut second = BindingResolver::new(table());
    for (key, original) in restored.iter().zip(KEYS) {
        let binding = second.resolve_key(key).expect(original);
        let written = KeyBuilder::new(second.table()).key_of(&binding).expect(original);
        assert_eq!(&written, key);
        if let Binding::Type(id) = binding {
            let before = first.resolve(original).expect(original);
            let before = before.as_type().expect("type");
            assert_eq!(
                second.table().display_name(id),
                first.table().display_name(before),
                "{original}"
            );
        }
    }
}

#[test]
fn test_derived_keys_resolve() {
    init_tracing();
    let mut resolver = BindingResolver::new(table());
    let repo = BindingKey::create_type_key("p.Repo");
    let integer = BindingKey::create_type_key("java.lang.Integer");
    let list = BindingKey::create_type_key("java.util.List");

    let derived = [
        BindingKey::create_parameterized_key(&repo, &[integer.clone()]),
        BindingKey::create_array_key(&repo, 3),
        BindingKey::create_wildcard_key(&list, 0, WildcardKind::Extends, Some(&integer)),
        BindingKey::create_type_variable_key("T", &repo),
        BindingKey::from("Lp/Repo;.size)I").declaring_type_key().expect("declaring"),
    ];
    for key in &derived {
        let binding = resolver.resolve_key(key).unwrap_or_else(|err| panic!("{key}: {err}"));
        assert!(binding.as_type().is_some(), "{key}");
    }
}
