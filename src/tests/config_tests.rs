use crate::config::*;
use std::io::Write;

#[test]
fn test_empty_object_gives_defaults() {
    let options: SessionOptions = serde_json::from_str("{}").expect("valid");
    assert_eq!(options, SessionOptions::default());
    assert!(options.resolver.synthesize_missing_locals);
    assert!(!options.resolver.strict_overloads);
    assert_eq!(options.hierarchy.universal_root, "java.lang.Object");
}

#[test]
fn test_nested_options_use_camel_case() {
    let options: SessionOptions = serde_json::from_str(
        r#"{
          "resolver": { "strictOverloads": true, "synthesizeMissingLocals": false },
          "hierarchy": { "maxIterations": 500, "parallel": false }
        }"#,
    )
    .expect("valid");
    assert!(options.resolver.strict_overloads);
    assert!(!options.resolver.synthesize_missing_locals);
    assert!(options.resolver.polymorphic_specialization);
    assert_eq!(options.hierarchy.max_iterations, 500);
    assert!(!options.hierarchy.parallel);
}

#[test]
fn test_override_sets_iteration_limit() {
    let mut options = SessionOptions::default();
    apply_overrides(&mut options, |name| {
        (name == MAX_HIERARCHY_ITERATIONS_ENV).then(|| " 42 ".to_string())
    })
    .expect("valid override");
    assert_eq!(options.hierarchy.max_iterations, 42);
}

#[test]
fn test_bad_override_is_rejected() {
    let mut options = SessionOptions::default();
    for bad in ["lots", "0", "-3"] {
        let err = apply_overrides(&mut options, |_| Some(bad.to_string())).expect_err(bad);
        assert!(err.to_string().contains(MAX_HIERARCHY_ITERATIONS_ENV), "{err}");
    }
}

#[test]
fn test_no_override_leaves_options_alone() {
    let mut options = SessionOptions::default();
    apply_overrides(&mut options, |_| None).expect("nothing to apply");
    assert_eq!(options, SessionOptions::default());
}

#[test]
fn test_load_options_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "resolver": {{ "recordAmbiguityWarnings": false }} }}"#).expect("write");
    let options = load_options(file.path()).expect("load");
    assert!(!options.resolver.record_ambiguity_warnings);
}

#[test]
fn test_load_errors_name_the_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{{ not json").expect("write");
    let err = load_options(file.path()).expect_err("malformed");
    let chain = format!("{err:#}");
    assert!(chain.contains(&file.path().display().to_string()), "{chain}");
    assert!(chain.contains("failed to parse session options"), "{chain}");

    let missing = load_options(std::path::Path::new("/nonexistent/jbind.json")).expect_err("missing");
    assert!(missing.to_string().contains("failed to read session options"));
}
