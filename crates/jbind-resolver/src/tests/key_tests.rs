use crate::*;

#[test]
fn test_create_type_key() {
    assert_eq!(BindingKey::create_type_key("int").as_str(), "I");
    assert_eq!(BindingKey::create_type_key("java.lang.String").as_str(), "Ljava/lang/String;");
    assert_eq!(BindingKey::create_type_key("java.util.Map$Entry").as_str(), "Ljava/util/Map$Entry;");
    assert_eq!(BindingKey::create_type_key("java.lang.String[][]").as_str(), "[[Ljava/lang/String;");
    assert_eq!(BindingKey::create_type_key("boolean[]").as_str(), "[Z");
    assert_eq!(BindingKey::create_type_key("Foo").as_str(), "LFoo;");
}

#[test]
fn test_create_composite_keys() {
    let list = BindingKey::create_type_key("java.util.List");
    let string = BindingKey::create_type_key("java.lang.String");

    let parameterized = BindingKey::create_parameterized_key(&list, &[string.clone()]);
    assert_eq!(parameterized.as_str(), "Ljava/util/List<Ljava/lang/String;>;");
    assert_eq!(BindingKey::create_parameterized_key(&list, &[]), list);

    let array = BindingKey::create_array_key(&parameterized, 2);
    assert_eq!(array.as_str(), "[[Ljava/util/List<Ljava/lang/String;>;");

    let unbounded = BindingKey::create_wildcard_key(&list, 0, WildcardKind::Unbounded, None);
    assert_eq!(unbounded.as_str(), "Ljava/util/List;{0}*");
    let extends = BindingKey::create_wildcard_key(&list, 1, WildcardKind::Extends, Some(&string));
    assert_eq!(extends.as_str(), "Ljava/util/List;{1}+Ljava/lang/String;");
    let super_ = BindingKey::create_wildcard_key(&list, 0, WildcardKind::Super, Some(&string));
    assert_eq!(super_.as_str(), "Ljava/util/List;{0}-Ljava/lang/String;");

    let variable = BindingKey::create_type_variable_key("E", &list);
    assert_eq!(variable.as_str(), "Ljava/util/List;:TE;");
}

#[test]
fn test_created_keys_parse() {
    let list = BindingKey::create_type_key("java.util.List");
    let number = BindingKey::create_type_key("java.lang.Number");
    let keys = [
        BindingKey::create_type_key("java.util.Map$Entry[]"),
        BindingKey::create_parameterized_key(&list, &[number.clone()]),
        BindingKey::create_wildcard_key(&list, 0, WildcardKind::Super, Some(&number)),
        BindingKey::create_type_variable_key("E", &list),
    ];
    for key in &keys {
        assert!(key.parse().is_ok(), "{key}");
    }
}

#[test]
fn test_kind() {
    let cases = [
        ("java/util", KeyKind::Package),
        ("Ljava/lang/String;", KeyKind::Type),
        ("I", KeyKind::Type),
        ("[I", KeyKind::ArrayType),
        ("Lp/Box;:TT;", KeyKind::TypeVariable),
        ("Ljava/util/List;{0}*", KeyKind::Wildcard),
        ("!Ljava/util/List;{0}*1;", KeyKind::Capture),
        ("Lp/X;.foo(I)V", KeyKind::Method),
        ("Lp/X;.count)I", KeyKind::Field),
        ("Lp/X;.foo(I)V#n", KeyKind::LocalVariable),
        ("Lp/X;@Ljava/lang/Deprecated;", KeyKind::Annotation),
    ];
    for (key, kind) in cases {
        assert_eq!(BindingKey::from(key).kind().expect(key), kind, "{key}");
    }
    assert!(BindingKey::from("Lp/X").kind().unwrap_err().is_malformed());
}

#[test]
fn test_is_parameterized() {
    assert!(BindingKey::from("Ljava/util/List<Ljava/lang/String;>;").is_parameterized());
    assert!(BindingKey::from("Ljava/util/List<Ljava/lang/String;>;.size()I").is_parameterized());
    assert!(BindingKey::from("Lp/Outer<TT;>.Inner;").is_parameterized());
    assert!(!BindingKey::from("Ljava/util/List;").is_parameterized());
    assert!(!BindingKey::from("[Ljava/util/List<Ljava/lang/String;>;").is_parameterized());
    assert!(!BindingKey::from("not a key").is_parameterized());
}

#[test]
fn test_declaring_type_key() {
    let method = BindingKey::from("Lp/X;.foo(I)V");
    assert_eq!(method.declaring_type_key(), Some(BindingKey::from("Lp/X;")));

    let local = BindingKey::from("Lp/X;.foo(I)V#n");
    assert_eq!(local.declaring_type_key(), Some(BindingKey::from("Lp/X;")));

    let field_of_parameterized = BindingKey::from("Lp/Box<Ljava/lang/String;>;.value)TT;");
    assert_eq!(
        field_of_parameterized.declaring_type_key(),
        Some(BindingKey::from("Lp/Box<Ljava/lang/String;>;"))
    );

    let member = BindingKey::from("Lp/Outer$Inner;");
    assert_eq!(member.declaring_type_key(), Some(BindingKey::from("Lp/Outer;")));

    let parameterized_member = BindingKey::from("Lp/Outer<Ljava/lang/String;>.Inner;");
    assert_eq!(parameterized_member.declaring_type_key(), Some(BindingKey::from("Lp/Outer;")));

    assert_eq!(BindingKey::from("Lp/X;").declaring_type_key(), None);
    assert_eq!(BindingKey::from("java/util").declaring_type_key(), None);
}

#[test]
fn test_to_signature() {
    let cases = [
        ("Ljava/lang/String;", "Ljava/lang/String;"),
        ("[[I", "[[I"),
        ("Ljava/util/List<Ljava/lang/String;>;", "Ljava/util/List<Ljava/lang/String;>;"),
        ("Lp/Outer<TT;>.Inner<TU;>;", "Lp/Outer<TT;>.Inner<TU;>;"),
        ("Ljava/util/List<Ljava/util/List;{0}+Ljava/lang/Number;>;", "Ljava/util/List<+Ljava/lang/Number;>;"),
        ("Ljava/util/List<Lp/Box;:TT;>;", "Ljava/util/List<TT;>;"),
        ("Lp/X;.foo(I)V", "(I)V"),
        ("Lp/X;.read()I|Ljava/io/IOException;", "()I^Ljava/io/IOException;"),
        ("Lp/X;.id<T:Ljava/lang/Object;>(TT;)TT;", "<T:Ljava/lang/Object;>(TT;)TT;"),
        ("Lp/X;.count)J", "J"),
        ("Lp/Box;:TT;", "TT;"),
        ("Ljava/util/List;{0}*", "*"),
        ("Ljava/util/List;{0}-Ljava/lang/Integer;", "-Ljava/lang/Integer;"),
    ];
    for (key, signature) in cases {
        assert_eq!(BindingKey::from(key).to_signature().as_deref(), Some(signature), "{key}");
    }
    assert_eq!(BindingKey::from("java/util").to_signature(), None);
    assert_eq!(BindingKey::from("Lp/X;@Ljava/lang/Deprecated;").to_signature(), None);
}

#[test]
fn test_key_serializes_as_string() {
    let key = BindingKey::from("Lp/X;.foo(I)V");
    let json = serde_json::to_string(&key).expect("serialize");
    assert_eq!(json, "\"Lp/X;.foo(I)V\"");
    let back: BindingKey = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, key);
    assert_eq!(key.to_string(), key.as_str());
}
