use crate::*;
use jbind_common::diagnostic_codes;
use jbind_symbols::{
    InMemoryTypeProvider, ProviderError, TypeDeclaration, TypeFlags, TypeProvider,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn names(list: Vec<Arc<str>>) -> Vec<String> {
    list.iter().map(|n| n.to_string()).collect()
}

fn corpus() -> InMemoryTypeProvider {
    InMemoryTypeProvider::from_declarations([
        TypeDeclaration::class("java.lang.Object"),
        TypeDeclaration::interface("java.lang.Runnable"),
        TypeDeclaration::class("p.Base"),
        TypeDeclaration::class("p.A").extends("p.Base"),
        TypeDeclaration::class("p.B").extends("p.A").implements("java.lang.Runnable"),
        // Same simple name as p.Base, different package.
        TypeDeclaration::class("q.Base"),
        TypeDeclaration::class("q.Other").extends("q.Base"),
        TypeDeclaration::class("p.A$1").extends("p.A"),
        TypeDeclaration::class("p.Below$1").extends("p.A$1"),
    ])
}

/// Counts reverse lookups on top of an in-memory corpus.
struct CountingProvider {
    inner: InMemoryTypeProvider,
    reverse_lookups: AtomicUsize,
}

impl TypeProvider for CountingProvider {
    fn lookup_by_name(&self, qualified_name: &str) -> Result<Option<TypeDeclaration>, ProviderError> {
        self.inner.lookup_by_name(qualified_name)
    }

    fn known_type_names(&self) -> Vec<String> {
        self.inner.known_type_names()
    }

    fn reverse_lookup(&self, simple_name: &str) -> Result<Vec<String>, ProviderError> {
        self.reverse_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.reverse_lookup(simple_name)
    }
}

fn sequential() -> HierarchyOptions {
    HierarchyOptions {
        parallel: false,
        ..HierarchyOptions::default()
    }
}

#[test]
fn test_focus_build_finds_supertypes_and_subtypes() {
    let builder = HierarchyBuilder::with_options(Arc::new(corpus()), sequential());
    let outcome = builder.build_for_focus("p.Base");
    assert!(outcome.is_complete());
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);

    let index = &outcome.index;
    assert_eq!(index.focus(), Some("p.Base"));
    assert_eq!(names(index.supertypes_of("p.Base", true)), vec!["java.lang.Object"]);
    assert_eq!(names(index.subtypes_of("p.Base", false)), vec!["p.A"]);
    // The anonymous class is recorded but not expanded.
    assert_eq!(
        names(index.subtypes_of("p.Base", true)),
        vec!["p.A", "p.B", "p.A$1"]
    );
    assert!(!index.contains("p.Below$1"));
    assert!(index.node("p.A$1").expect("recorded").is_local_or_anonymous());
    // Candidates sharing the simple name are rejected on verification.
    assert!(!index.contains("q.Other"));
    assert_eq!(index.check_consistency(), Ok(()));
}

#[test]
fn test_parallel_and_sequential_builds_agree() {
    let provider: Arc<dyn TypeProvider> = Arc::new(corpus());
    let parallel = HierarchyBuilder::new(Arc::clone(&provider)).build_for_focus("p.Base");
    let sequential = HierarchyBuilder::with_options(provider, sequential()).build_for_focus("p.Base");

    let mut left = parallel.index.edges();
    let mut right = sequential.index.edges();
    left.sort_by(|a, b| (&a.subtype, &a.supertype).cmp(&(&b.subtype, &b.supertype)));
    right.sort_by(|a, b| (&a.subtype, &a.supertype).cmp(&(&b.subtype, &b.supertype)));
    assert_eq!(left, right);
}

#[test]
fn test_universal_root_focus_skips_reverse_lookups() {
    let provider = Arc::new(CountingProvider {
        inner: corpus(),
        reverse_lookups: AtomicUsize::new(0),
    });
    let outcome = HierarchyBuilder::new(Arc::clone(&provider) as Arc<dyn TypeProvider>)
        .build_for_focus("java.lang.Object");
    assert!(outcome.is_complete());
    assert_eq!(provider.reverse_lookups.load(Ordering::SeqCst), 0);
    assert!(outcome.index.subtypes_of("java.lang.Object", false).is_empty());
}

#[test]
fn test_unknown_focus_yields_empty_index() {
    let outcome = HierarchyBuilder::new(Arc::new(corpus())).build_for_focus("p.Nowhere");
    assert!(outcome.is_complete());
    assert!(outcome.index.is_empty());
    assert!(outcome.index.is_missing("p.Nowhere"));
}

#[test]
fn test_provider_failure_is_reported_and_skipped() {
    let mut provider = corpus();
    provider.mark_unreadable("p.B");
    let outcome = HierarchyBuilder::with_options(Arc::new(provider), sequential())
        .build_for_focus("p.Base");

    assert!(outcome.is_complete());
    assert_eq!(outcome.diagnostics.len(), 1);
    let diagnostic = &outcome.diagnostics[0];
    assert_eq!(diagnostic.code, diagnostic_codes::PROVIDER_LOOKUP_FAILURE);
    assert_eq!(diagnostic.subject, "p.B");
    assert!(outcome.index.is_missing("p.B"));
    assert_eq!(names(outcome.index.subtypes_of("p.Base", true)), vec!["p.A", "p.A$1"]);
    assert_eq!(outcome.index.check_consistency(), Ok(()));
}

#[test]
fn test_missing_supertype_is_reported() {
    let provider = InMemoryTypeProvider::from_declarations([
        TypeDeclaration::class("java.lang.Object"),
        TypeDeclaration::class("p.A").extends("p.Gone"),
    ]);
    let outcome = HierarchyBuilder::new(Arc::new(provider)).build_index(["p.A"]);
    assert!(outcome.is_complete());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, diagnostic_codes::MISSING_SUPERTYPE);
    assert!(outcome.diagnostics[0].message_text.contains("'p.Gone' of 'p.A'"));
    assert!(outcome.index.is_missing("p.Gone"));
    // The edge is kept so the dangling supertype stays visible.
    assert_eq!(outcome.index.superclass_of("p.A").as_deref(), Some("p.Gone"));
}

#[test]
fn test_build_index_walks_up_from_candidates() {
    let outcome = HierarchyBuilder::new(Arc::new(corpus())).build_index(["p.B", "q.Other"]);
    assert!(outcome.is_complete());
    let index = &outcome.index;
    assert_eq!(
        names(index.supertypes_of("p.B", true)),
        vec!["p.A", "java.lang.Runnable", "p.Base", "java.lang.Object"]
    );
    assert_eq!(index.superclass_of("q.Other").as_deref(), Some("q.Base"));
    assert_eq!(index.kind_of("java.lang.Runnable"), Some(jbind_symbols::DeclarationKind::Interface));
    assert_eq!(index.focus(), None);
}

#[test]
fn test_cancelled_build_stops_with_partial_index() {
    let token = CancellationToken::new();
    token.cancel();
    let outcome = HierarchyBuilder::new(Arc::new(corpus()))
        .with_cancellation(token.clone())
        .build_for_focus("p.Base");
    assert_eq!(outcome.status, BuildStatus::Cancelled);
    assert!(outcome.index.is_empty());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, diagnostic_codes::BUILD_CANCELLED);
}

#[test]
fn test_iteration_limit_stops_build() {
    let options = HierarchyOptions {
        max_iterations: 2,
        ..sequential()
    };
    let outcome = HierarchyBuilder::with_options(Arc::new(corpus()), options).build_for_focus("p.Base");
    assert_eq!(outcome.status, BuildStatus::IterationLimit);
    assert!(outcome.iterations <= 2);
    assert_eq!(
        outcome.diagnostics.last().map(|d| d.code),
        Some(diagnostic_codes::ITERATION_LIMIT_REACHED)
    );
    assert_eq!(outcome.index.check_consistency(), Ok(()));
}

#[test]
fn test_iteration_limit_bounds_candidate_lookups() {
    let mut provider = corpus();
    for i in 0..30 {
        provider.insert(TypeDeclaration::class(format!("p.Wide{i}")).extends("p.Base"));
    }
    let provider: Arc<dyn TypeProvider> = Arc::new(provider);
    for max_iterations in 1..=12 {
        let options = HierarchyOptions {
            max_iterations,
            ..HierarchyOptions::default()
        };
        let outcome =
            HierarchyBuilder::with_options(Arc::clone(&provider), options).build_for_focus("p.Base");
        assert_eq!(outcome.status, BuildStatus::IterationLimit, "budget {max_iterations}");
        assert!(
            outcome.iterations <= max_iterations,
            "budget {max_iterations} spent {}",
            outcome.iterations
        );
        assert_eq!(outcome.index.check_consistency(), Ok(()));
    }
}

#[test]
fn test_supertype_depth_bound_is_reported() {
    let mut provider = InMemoryTypeProvider::new();
    provider.insert(TypeDeclaration::class("java.lang.Object"));
    provider.insert(TypeDeclaration::class("p.T0"));
    for i in 1..6 {
        provider.insert(TypeDeclaration::class(format!("p.T{i}")).extends(format!("p.T{}", i - 1)));
    }
    let options = HierarchyOptions {
        max_supertype_depth: 3,
        ..sequential()
    };
    let outcome = HierarchyBuilder::with_options(Arc::new(provider), options).build_index(["p.T5"]);

    assert_eq!(outcome.status, BuildStatus::IterationLimit);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, diagnostic_codes::SUPERTYPE_WALK_TOO_DEEP);
    assert_eq!(outcome.diagnostics[0].subject, "p.T2");
    assert_eq!(outcome.index.superclass_of("p.T3").as_deref(), Some("p.T2"));
    assert_eq!(outcome.index.kind_of("p.T2"), None);
    assert_eq!(outcome.index.check_consistency(), Ok(()));
}

#[test]
fn test_unparsable_subtype_is_reported_once() {
    let provider = InMemoryTypeProvider::from_declarations([
        TypeDeclaration::class("java.lang.Object"),
        TypeDeclaration::class("p.Base"),
        TypeDeclaration::class("p.A").extends("p.Base"),
        TypeDeclaration::class("p.C").with_signature("Lp/Base"),
    ]);
    let outcome = HierarchyBuilder::with_options(Arc::new(provider), sequential())
        .build_for_focus("p.Base");

    assert!(outcome.is_complete());
    assert_eq!(names(outcome.index.subtypes_of("p.Base", true)), vec!["p.A"]);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, diagnostic_codes::PROVIDER_LOOKUP_FAILURE);
    assert_eq!(outcome.diagnostics[0].subject, "p.C");
    assert!(outcome.index.is_missing("p.C"));
}

#[test]
fn test_cyclic_declarations_terminate() {
    let provider = InMemoryTypeProvider::from_declarations([
        TypeDeclaration::interface("p.I").implements("p.J"),
        TypeDeclaration::interface("p.J").implements("p.I"),
    ]);
    let outcome = HierarchyBuilder::new(Arc::new(provider)).build_for_focus("p.I");
    assert!(outcome.is_complete());
    assert_eq!(names(outcome.index.subtypes_of("p.I", false)), vec!["p.J"]);
    assert_eq!(names(outcome.index.supertypes_of("p.I", false)), vec!["p.J"]);
}

#[test]
fn test_local_flag_from_declaration() {
    let provider = InMemoryTypeProvider::from_declarations([
        TypeDeclaration::class("java.lang.Object"),
        TypeDeclaration::class("p.Base"),
        TypeDeclaration::class("p.Helper").extends("p.Base").with_flags(TypeFlags::LOCAL),
        TypeDeclaration::class("p.Deeper").extends("p.Helper"),
    ]);
    let outcome = HierarchyBuilder::new(Arc::new(provider)).build_for_focus("p.Base");
    assert!(outcome.index.contains("p.Helper"));
    assert!(!outcome.index.contains("p.Deeper"));
}

#[test]
fn test_options_deserialize_camel_case() {
    let options: HierarchyOptions =
        serde_json::from_str(r#"{ "maxIterations": 10, "parallel": false }"#).expect("valid");
    assert_eq!(options.max_iterations, 10);
    assert!(!options.parallel);
    assert_eq!(options.universal_root, "java.lang.Object");
}
