use jbind_signature::parse_type_signature;
use jbind_symbols::*;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("jbind_symbols=trace")
        .try_init();
}

/// Counts lookups so tests can check each type is completed once.
struct CountingProvider {
    inner: InMemoryTypeProvider,
    lookups: AtomicUsize,
}

impl TypeProvider for CountingProvider {
    fn lookup_by_name(&self, name: &str) -> Result<Option<TypeDeclaration>, ProviderError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup_by_name(name)
    }

    fn known_type_names(&self) -> Vec<String> {
        self.inner.known_type_names()
    }
}

fn corpus() -> InMemoryTypeProvider {
    let mut declarations = vec![TypeDeclaration::class("java.lang.Object")];
    for i in 0..64 {
        declarations.push(
            TypeDeclaration::class(format!("p.T{i}"))
                .with_method(MethodDeclaration::new("get", "()Ljava/lang/String;")),
        );
    }
    InMemoryTypeProvider::from_declarations(declarations)
}

#[test]
fn test_concurrent_interning_yields_one_id_per_name() {
    init_tracing();
    let table = SymbolTable::new(Arc::new(corpus()));
    let ids: Vec<(usize, TypeId)> = (0..4096)
        .into_par_iter()
        .map(|i| {
            let n = i % 64;
            (n, table.intern_declared(&format!("p.T{n}")))
        })
        .collect();
    for (n, id) in &ids {
        assert_eq!(*id, table.intern_declared(&format!("p.T{n}")));
    }
    let mut distinct: Vec<TypeId> = ids.iter().map(|(_, id)| *id).collect();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), 64);
}

#[test]
fn test_concurrent_structural_interning() {
    let table = SymbolTable::new(Arc::new(corpus()));
    let sig = parse_type_signature("[Ljava/util/Map<Ljava/lang/String;+Lp/T1;>;").expect("valid");
    let ids: Vec<TypeId> = (0..512)
        .into_par_iter()
        .map(|_| {
            table
                .intern_signature(&sig, &TypeVarScope::new())
                .expect("interns")
        })
        .collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_concurrent_completion_loads_each_type_once() {
    init_tracing();
    let provider = Arc::new(CountingProvider {
        inner: corpus(),
        lookups: AtomicUsize::new(0),
    });
    let table = SymbolTable::new(provider.clone());
    let methods: Vec<Vec<MethodId>> = (0..256)
        .into_par_iter()
        .map(|i| {
            let id = table
                .lookup_type(&format!("p.T{}", i % 8))
                .expect("known type");
            table.methods_of(id).expect("methods")
        })
        .collect();
    assert_eq!(provider.lookups.load(Ordering::SeqCst), 8);
    for (i, m) in methods.iter().enumerate() {
        assert_eq!(m.len(), 1);
        assert_eq!(m, &methods[i % 8]);
    }
}
