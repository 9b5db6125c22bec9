//! One resolution session: a symbol table, a resolver over it and the
//! hierarchy builder settings, all sharing one `TypeProvider`.

use crate::config::SessionOptions;
use jbind_common::Diagnostic;
use jbind_hierarchy::{BuildOutcome, CancellationToken, HierarchyBuilder};
use jbind_resolver::{Binding, BindingKey, BindingResolver, KeyBuilder};
use jbind_symbols::{
    AnnotationBinding, SymbolError, SymbolTable, TagBits, TypeId, TypeProvider, TypeVarScope,
};
use std::sync::Arc;
use tracing::debug;

pub struct Session {
    provider: Arc<dyn TypeProvider>,
    table: Arc<SymbolTable>,
    resolver: BindingResolver,
    options: SessionOptions,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(provider: Arc<dyn TypeProvider>) -> Self {
        Self::with_options(provider, SessionOptions::default())
    }

    pub fn with_options(provider: Arc<dyn TypeProvider>, options: SessionOptions) -> Self {
        let table = Arc::new(SymbolTable::new(Arc::clone(&provider)));
        let resolver = BindingResolver::with_options(Arc::clone(&table), options.resolver.clone());
        debug!(?options, "session created");
        Self {
            provider,
            table,
            resolver,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn table(&self) -> &Arc<SymbolTable> {
        &self.table
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    // =========================================================================
    // Keys
    // =========================================================================

    pub fn resolve(&mut self, key: &str) -> jbind_resolver::Result<Binding> {
        self.resolver.resolve(key)
    }

    pub fn resolve_key(&mut self, key: &BindingKey) -> jbind_resolver::Result<Binding> {
        self.resolver.resolve_key(key)
    }

    pub fn key_of(&self, binding: &Binding) -> jbind_resolver::Result<BindingKey> {
        KeyBuilder::new(&self.table).key_of(binding)
    }

    /// Resolver warnings recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.resolver.diagnostics()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.resolver.take_diagnostics()
    }

    // =========================================================================
    // Signatures and annotations
    // =========================================================================

    /// Intern the type a standalone type signature denotes. Type variables
    /// are not in scope here.
    pub fn type_signature(&self, signature: &str) -> Result<TypeId, SymbolError> {
        let parsed = jbind_signature::parse_type_signature(signature).map_err(|source| {
            SymbolError::Signature {
                owner: signature.to_string(),
                source,
            }
        })?;
        self.table.intern_signature(&parsed, &TypeVarScope::new())
    }

    /// `explicit` followed by the standard annotations `tag_bits` imply.
    pub fn standard_annotations(
        &self,
        explicit: &[AnnotationBinding],
        tag_bits: TagBits,
    ) -> Vec<AnnotationBinding> {
        jbind_annotations::add_standard_annotations(explicit, tag_bits, &self.table)
    }

    // =========================================================================
    // Hierarchies
    // =========================================================================

    /// Token that cancels hierarchy builds started by this session.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn hierarchy_builder(&self) -> HierarchyBuilder {
        HierarchyBuilder::with_options(Arc::clone(&self.provider), self.options.hierarchy.clone())
            .with_cancellation(self.cancel.clone())
    }

    pub fn build_hierarchy(&self, focus: &str) -> BuildOutcome {
        self.hierarchy_builder().build_for_focus(focus)
    }

    pub fn build_index<I, S>(&self, candidates: I) -> BuildOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.hierarchy_builder().build_index(candidates)
    }
}
