use crate::key_parser::*;
use crate::*;
use jbind_signature::BaseType;

fn class(internal: &str) -> TypeKeyNode {
    let (package, name) = match internal.rfind('/') {
        Some(idx) => (&internal[..idx], &internal[idx + 1..]),
        None => ("", internal),
    };
    TypeKeyNode::Class(ClassKeyNode {
        package: package.to_string(),
        segments: vec![SegmentNode {
            name: name.to_string(),
            arguments: Vec::new(),
        }],
    })
}

fn malformed_offset(key: &str) -> usize {
    match parse_key(key) {
        Err(ResolutionError::MalformedKey { offset, .. }) => offset,
        other => panic!("expected MalformedKey for {key:?}, got {other:?}"),
    }
}

// =============================================================================
// Roots
// =============================================================================

#[test]
fn test_package_key() {
    let parsed = parse_key("java/util").expect("package");
    assert_eq!(parsed.root, KeyRoot::Package("java.util".to_string()));
    assert_eq!(parsed.state, KeyState::Package);
    assert!(parsed.members.is_empty());
}

#[test]
fn test_top_level_type_key() {
    let parsed = parse_key("Ljava/lang/String;").expect("type");
    assert_eq!(parsed.root, KeyRoot::Type(class("java/lang/String")));
    assert_eq!(parsed.state, KeyState::TopLevelType);
    assert_eq!(parsed.root_end, "Ljava/lang/String;".len());
}

#[test]
fn test_member_type_key_states() {
    let binary = parse_key("Lp/Outer$Inner;").expect("binary member name");
    assert_eq!(binary.state, KeyState::MemberType);

    let dotted = parse_key("Lp/Outer<Ljava/lang/String;>.Inner;").expect("parameterized outer");
    assert_eq!(dotted.state, KeyState::MemberType);
    let KeyRoot::Type(TypeKeyNode::Class(node)) = &dotted.root else {
        panic!("expected a class key");
    };
    assert_eq!(node.qualified_name(), "p.Outer$Inner");
    assert!(node.is_parameterized());
    assert_eq!(node.segments[0].arguments, vec![class("java/lang/String")]);
    assert!(node.segments[1].arguments.is_empty());
}

#[test]
fn test_primitive_and_array_keys() {
    let int = parse_key("I").expect("int");
    assert_eq!(int.root, KeyRoot::Type(TypeKeyNode::Base(BaseType::Int)));

    let array = parse_key("[[Ljava/lang/String;").expect("array");
    assert_eq!(array.state, KeyState::Array);
    assert_eq!(
        array.root,
        KeyRoot::Type(TypeKeyNode::Array {
            dimensions: 2,
            leaf: Box::new(class("java/lang/String")),
        })
    );
}

#[test]
fn test_parameterized_key_with_wildcard_argument() {
    let parsed = parse_key("Ljava/util/List<Ljava/util/List;{0}+Ljava/lang/Number;>;").expect("parses");
    let KeyRoot::Type(TypeKeyNode::Class(node)) = parsed.root else {
        panic!("expected a class key");
    };
    assert_eq!(
        node.segments[0].arguments,
        vec![TypeKeyNode::Wildcard {
            generic: Box::new(class("java/util/List")),
            rank: 0,
            bound: BoundNode::Extends(Box::new(class("java/lang/Number"))),
        }]
    );
}

#[test]
fn test_qualified_type_variable_argument() {
    let parsed = parse_key("Ljava/util/List<Lp/Box;:TT;>;").expect("parses");
    let KeyRoot::Type(TypeKeyNode::Class(node)) = parsed.root else {
        panic!("expected a class key");
    };
    assert_eq!(
        node.segments[0].arguments,
        vec![TypeKeyNode::Variable {
            owner: Box::new(VariableOwnerNode::Type(class("p/Box"))),
            name: "T".to_string(),
        }]
    );
}

#[test]
fn test_method_owned_type_variable_argument() {
    let parsed =
        parse_key("Ljava/util/List<Lp/X;.id<T:Ljava/lang/Object;>(TT;)TT;:TT;>;").expect("parses");
    let KeyRoot::Type(TypeKeyNode::Class(node)) = parsed.root else {
        panic!("expected a class key");
    };
    let TypeKeyNode::Variable { owner, name } = &node.segments[0].arguments[0] else {
        panic!("expected a variable argument");
    };
    assert_eq!(name, "T");
    let VariableOwnerNode::Method { owner, method } = &**owner else {
        panic!("expected a method owner");
    };
    assert_eq!(owner, &class("p/X"));
    assert_eq!(method.selector, "id");
    assert_eq!(method.type_parameters.len(), 1);
    assert_eq!(method.parameters, vec![TypeKeyNode::ScopedVariable("T".to_string())]);
}

#[test]
fn test_capture_key() {
    let parsed = parse_key("!Ljava/util/List;{0}*3;").expect("capture");
    assert_eq!(parsed.state, KeyState::Capture);
    let KeyRoot::Type(TypeKeyNode::Capture { wildcard, position }) = parsed.root else {
        panic!("expected a capture");
    };
    assert_eq!(position, 3);
    assert!(matches!(
        *wildcard,
        TypeKeyNode::Wildcard {
            rank: 0,
            bound: BoundNode::Unbounded,
            ..
        }
    ));
}

// =============================================================================
// Members
// =============================================================================

#[test]
fn test_method_key() {
    let parsed = parse_key("Lp/X;.foo(I)V").expect("method");
    assert_eq!(parsed.state, KeyState::Method);
    assert_eq!(parsed.root_end, 5);
    let [MemberKey::Method(method)] = parsed.members.as_slice() else {
        panic!("expected one method member");
    };
    assert_eq!(method.selector, "foo");
    assert_eq!(method.parameters, vec![TypeKeyNode::Base(BaseType::Int)]);
    assert_eq!(method.return_type, TypeKeyNode::Base(BaseType::Void));
    assert!(method.thrown.is_empty());
}

#[test]
fn test_constructor_key_has_empty_selector() {
    let parsed = parse_key("Lp/X;.(Ljava/lang/String;)V").expect("constructor");
    let [MemberKey::Method(method)] = parsed.members.as_slice() else {
        panic!("expected one method member");
    };
    assert!(method.selector.is_empty());
    assert_eq!(method.parameters, vec![class("java/lang/String")]);
}

#[test]
fn test_method_key_with_thrown_types() {
    let parsed = parse_key("Lp/X;.read()I|Ljava/io/IOException;|Lp/Oops;").expect("method");
    let [MemberKey::Method(method)] = parsed.members.as_slice() else {
        panic!("expected one method member");
    };
    assert_eq!(method.thrown, vec![class("java/io/IOException"), class("p/Oops")]);
}

#[test]
fn test_generic_method_key() {
    let parsed = parse_key("Lp/X;.max<T::Ljava/lang/Comparable<TT;>;>(TT;TT;)TT;").expect("method");
    let [MemberKey::Method(method)] = parsed.members.as_slice() else {
        panic!("expected one method member");
    };
    assert_eq!(method.type_parameters.len(), 1);
    assert_eq!(method.type_parameters[0].name, "T");
    assert!(method.type_parameters[0].class_bound.is_none());
    assert_eq!(method.type_parameters[0].interface_bounds.len(), 1);
    assert_eq!(method.parameters.len(), 2);
}

#[test]
fn test_field_key() {
    let parsed = parse_key("Lp/X;.count)I").expect("field");
    assert_eq!(parsed.state, KeyState::Field);
    assert_eq!(
        parsed.members,
        vec![MemberKey::Field {
            name: "count".to_string(),
            ty: TypeKeyNode::Base(BaseType::Int),
        }]
    );
}

#[test]
fn test_type_variable_members() {
    let on_type = parse_key("Lp/Box;:TT;").expect("type variable");
    assert_eq!(on_type.state, KeyState::TypeVariable);
    assert_eq!(on_type.members, vec![MemberKey::TypeVariable("T".to_string())]);

    let on_method = parse_key("Lp/X;.id<U:Ljava/lang/Object;>(TU;)TU;:TU;").expect("method variable");
    assert_eq!(on_method.members.len(), 2);
    assert_eq!(on_method.members[1], MemberKey::TypeVariable("U".to_string()));
}

#[test]
fn test_wildcard_member() {
    let parsed = parse_key("Ljava/util/List;{0}-Ljava/lang/Integer;").expect("wildcard");
    assert_eq!(parsed.state, KeyState::Wildcard);
    assert_eq!(
        parsed.members,
        vec![MemberKey::Wildcard {
            rank: 0,
            bound: BoundNode::Super(Box::new(class("java/lang/Integer"))),
        }]
    );
}

#[test]
fn test_local_variable_member_forms() {
    let cases = [
        ("Lp/X;.run()V#i", 0, None),
        ("Lp/X;.run()V#i#2", 2, None),
        ("Lp/X;.run()V#i#2#5", 2, Some(5)),
    ];
    for (key, occurrence, position) in cases {
        let parsed = parse_key(key).expect(key);
        assert_eq!(parsed.state, KeyState::LocalVariable, "{key}");
        assert_eq!(
            parsed.members[1],
            MemberKey::LocalVariable {
                name: "i".to_string(),
                occurrence,
                position,
            },
            "{key}"
        );
    }
}

#[test]
fn test_annotation_members() {
    let on_type = parse_key("Lp/X;@Ljava/lang/Deprecated;").expect("type annotation");
    assert_eq!(on_type.state, KeyState::Annotation);
    let on_field = parse_key("Lp/X;.f)I@Ljava/lang/Deprecated;").expect("field annotation");
    assert_eq!(on_field.members.len(), 2);
    assert!(matches!(on_field.members[1], MemberKey::Annotation(_)));
}

// =============================================================================
// State machine
// =============================================================================

#[test]
fn test_state_transitions() {
    assert!(KeyState::Package.allows(KeyState::TopLevelType));
    assert!(KeyState::Package.allows(KeyState::Capture));
    assert!(!KeyState::Package.allows(KeyState::Method));
    assert!(KeyState::TopLevelType.allows(KeyState::Method));
    assert!(KeyState::MemberType.allows(KeyState::Field));
    assert!(KeyState::Method.allows(KeyState::LocalVariable));
    assert!(!KeyState::Method.allows(KeyState::Field));
    assert!(KeyState::Field.allows(KeyState::Annotation));
    assert!(!KeyState::Field.allows(KeyState::LocalVariable));
    for terminal in [
        KeyState::LocalVariable,
        KeyState::TypeVariable,
        KeyState::Annotation,
        KeyState::Array,
        KeyState::Wildcard,
        KeyState::Capture,
    ] {
        assert!(!terminal.allows(KeyState::Annotation), "{terminal:?}");
    }
}

#[test]
fn test_rejected_transitions() {
    // Arrays and captures take no members.
    assert_eq!(malformed_offset("[I.foo()V"), 2);
    // A local variable needs a method.
    assert_eq!(malformed_offset("Lp/X;#i"), 5);
    // Nothing follows a local variable.
    assert_eq!(malformed_offset("Lp/X;.run()V#i#0@Lp/A;"), 16);
    // A field has no locals.
    let err = parse_key("Lp/X;.f)I#x").unwrap_err();
    assert!(err.to_string().contains("cannot follow Field"), "{err}");
}

// =============================================================================
// Malformed keys
// =============================================================================

#[test]
fn test_missing_class_terminator_reports_its_offset() {
    assert_eq!(malformed_offset("Lp/X"), 4);
    assert_eq!(malformed_offset("Ljava/util/List<Ljava/lang/String;>"), 35);
}

#[test]
fn test_malformed_keys() {
    assert_eq!(malformed_offset(""), 0);
    assert_eq!(malformed_offset("Lp/X;.foo(I"), 11);
    assert_eq!(malformed_offset("Lp/X;.foo"), 9);
    assert_eq!(malformed_offset("Ljava/util/List<>;"), 16);
    assert_eq!(malformed_offset("Lp/X;:T;"), 7);
    assert_eq!(malformed_offset("Lp/X;{x}*"), 6);
    assert_eq!(malformed_offset("!Lp/X;0;"), 1);
    assert_eq!(malformed_offset("java//util"), 5);
    assert_eq!(malformed_offset("Lp/X;?"), 5);
}

#[test]
fn test_array_dimension_limit() {
    let key = format!("{}I", "[".repeat(256));
    assert_eq!(malformed_offset(&key), 256);
    assert!(parse_key(&format!("{}I", "[".repeat(255))).is_ok());
}

#[test]
fn test_nesting_limit() {
    let mut key = String::from("Lp/A;");
    for _ in 0..200 {
        key = format!("Lp/A<{key}>;");
    }
    assert!(parse_key(&key).unwrap_err().is_malformed());
}
