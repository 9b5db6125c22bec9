//! Hierarchy construction against a `TypeProvider`.
//!
//! A focused build first walks up from the focus type through its declared
//! supertypes, then breadth-first down: every name on the frontier is
//! reverse-looked-up, each candidate is verified against its declared
//! supertypes, and verified subtypes form the next frontier. The lookups of
//! one wave are independent reads and run on the rayon pool; their results
//! are merged into the index by this thread alone.
//!
//! Provider failures never abort a build. The failing name is recorded as
//! missing, a diagnostic is added and the walk continues.

use crate::index::{EdgeKind, HierarchyIndex};
use jbind_common::limits::{
    DEFAULT_MAX_HIERARCHY_ITERATIONS, MAX_SUPERTYPE_WALK, PARALLEL_WAVE_THRESHOLD,
};
use jbind_common::{Diagnostic, diagnostic_codes, diagnostic_messages, format_message, names};
use jbind_symbols::{ProviderError, TypeDeclaration, TypeFlags, TypeProvider};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, trace, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HierarchyOptions {
    /// Provider lookups allowed per build before it stops with a partial index.
    pub max_iterations: usize,
    /// Run the lookups of large waves on the rayon pool.
    pub parallel: bool,
    /// Longest supertype chain followed upwards.
    pub max_supertype_depth: usize,
    /// The type every class ends at. Never reverse-looked-up.
    pub universal_root: String,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_HIERARCHY_ITERATIONS,
            parallel: true,
            max_supertype_depth: MAX_SUPERTYPE_WALK,
            universal_root: names::UNIVERSAL_ROOT.to_string(),
        }
    }
}

/// Cooperative cancellation, checked between lookups.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildStatus {
    Complete,
    /// Stopped on request; the index holds what was merged so far.
    Cancelled,
    /// Stopped after `max_iterations` lookups or at `max_supertype_depth`.
    IterationLimit,
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub index: HierarchyIndex,
    pub diagnostics: Vec<Diagnostic>,
    pub status: BuildStatus,
    /// Provider lookups performed.
    pub iterations: usize,
}

impl BuildOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == BuildStatus::Complete
    }
}

/// Provider reads left to one build, shared by the threads of a wave.
struct Budget {
    spent: AtomicUsize,
    max: usize,
}

impl Budget {
    fn new(max: usize) -> Self {
        Self {
            spent: AtomicUsize::new(0),
            max,
        }
    }

    /// Claim one read. Fails once `max` reads were claimed.
    fn take(&self) -> bool {
        self.spent
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max).then_some(n + 1)
            })
            .is_ok()
    }

    fn spent(&self) -> usize {
        self.spent.load(Ordering::Acquire)
    }

    fn is_exhausted(&self) -> bool {
        self.spent() >= self.max
    }
}

/// Result of one provider read, produced on any thread.
enum Lookup {
    Found(TypeDeclaration),
    NotFound(String),
    Failed(String, ProviderError),
    Skipped,
    OverBudget,
}

/// Subtypes of one frontier name found by a reverse lookup.
struct WaveResult {
    supertype: String,
    verified: Vec<TypeDeclaration>,
    failures: Vec<(String, ProviderError)>,
    /// The budget ran out before every candidate was verified.
    exhausted: bool,
}

pub struct HierarchyBuilder {
    provider: Arc<dyn TypeProvider>,
    options: HierarchyOptions,
    cancel: CancellationToken,
}

impl HierarchyBuilder {
    pub fn new(provider: Arc<dyn TypeProvider>) -> Self {
        Self::with_options(provider, HierarchyOptions::default())
    }

    pub fn with_options(provider: Arc<dyn TypeProvider>, options: HierarchyOptions) -> Self {
        Self {
            provider,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Share `token` with whoever may cancel the build.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn options(&self) -> &HierarchyOptions {
        &self.options
    }

    /// Index the given types and all their supertypes.
    pub fn build_index<I, S>(&self, candidates: I) -> BuildOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut build = Build::new(self, HierarchyIndex::new());
        let frontier: Vec<String> = candidates
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        debug!(candidates = frontier.len(), "HierarchyBuilder::build_index");
        build.walk_up(frontier);
        build.finish()
    }

    /// Supertypes of `focus` and every subtype the provider can find.
    pub fn build_for_focus(&self, focus: &str) -> BuildOutcome {
        debug!(focus, "HierarchyBuilder::build_for_focus");
        let mut build = Build::new(self, HierarchyIndex::with_focus(focus));
        build.walk_up(vec![focus.to_string()]);
        if build.status.is_none() && build.index.kind_of(focus).is_some() {
            build.walk_down(focus);
        }
        build.finish()
    }

    fn lookup(&self, name: &str, budget: &Budget) -> Lookup {
        if self.cancel.is_cancelled() {
            return Lookup::Skipped;
        }
        if !budget.take() {
            return Lookup::OverBudget;
        }
        match self.provider.lookup_by_name(name) {
            Ok(Some(decl)) => Lookup::Found(decl),
            Ok(None) => Lookup::NotFound(name.to_string()),
            Err(err) => Lookup::Failed(name.to_string(), err),
        }
    }

    /// Reverse-lookup `supertype` and keep the candidates that really
    /// declare it.
    fn find_subtypes(&self, supertype: &str, budget: &Budget) -> WaveResult {
        let mut result = WaveResult {
            supertype: supertype.to_string(),
            verified: Vec::new(),
            failures: Vec::new(),
            exhausted: false,
        };
        if self.cancel.is_cancelled() {
            return result;
        }
        if !budget.take() {
            result.exhausted = true;
            return result;
        }
        let candidates = match self.provider.reverse_lookup(names::simple_name(supertype)) {
            Ok(candidates) => candidates,
            Err(err) => {
                result.failures.push((supertype.to_string(), err));
                return result;
            }
        };
        trace!(supertype, candidates = candidates.len(), "reverse lookup");
        for candidate in candidates {
            if candidate == supertype {
                continue;
            }
            match self.lookup(&candidate, budget) {
                Lookup::Found(decl) => match decl.supertype_names() {
                    Ok(supertypes) if supertypes.iter().any(|s| s == supertype) => {
                        result.verified.push(decl);
                    }
                    Ok(_) => trace!(candidate = %candidate, supertype, "candidate rejected"),
                    Err(err) => result.failures.push((candidate, err)),
                },
                Lookup::Failed(name, err) => result.failures.push((name, err)),
                Lookup::OverBudget => {
                    result.exhausted = true;
                    break;
                }
                Lookup::NotFound(_) | Lookup::Skipped => {}
            }
        }
        result
    }
}

/// State of one build.
struct Build<'b> {
    builder: &'b HierarchyBuilder,
    index: HierarchyIndex,
    diagnostics: Vec<Diagnostic>,
    status: Option<BuildStatus>,
    budget: Budget,
    /// Names already looked up by name.
    looked_up: FxHashSet<String>,
    /// Names already reverse-looked-up or queued for it.
    expanded: FxHashSet<String>,
}

impl<'b> Build<'b> {
    fn new(builder: &'b HierarchyBuilder, index: HierarchyIndex) -> Self {
        Self {
            builder,
            index,
            diagnostics: Vec::new(),
            status: None,
            budget: Budget::new(builder.options.max_iterations),
            looked_up: FxHashSet::default(),
            expanded: FxHashSet::default(),
        }
    }

    fn parallel(&self, wave: usize) -> bool {
        self.builder.options.parallel && wave >= PARALLEL_WAVE_THRESHOLD
    }

    /// Whether another wave may start. Stops the build when cancelled or
    /// out of budget.
    fn admit(&mut self) -> bool {
        if self.builder.cancel.is_cancelled() {
            self.stop(BuildStatus::Cancelled);
        } else if self.budget.is_exhausted() {
            self.stop(BuildStatus::IterationLimit);
        }
        self.status.is_none()
    }

    fn stop(&mut self, status: BuildStatus) {
        if self.status.is_some() {
            return;
        }
        match status {
            BuildStatus::Cancelled => {
                debug!(iterations = self.budget.spent(), "hierarchy build cancelled");
                self.diagnostics.push(Diagnostic::message(
                    self.index.focus().unwrap_or_default(),
                    diagnostic_messages::BUILD_CANCELLED,
                    diagnostic_codes::BUILD_CANCELLED,
                ));
            }
            BuildStatus::IterationLimit => {
                warn!(iterations = self.budget.spent(), "hierarchy build hit its iteration limit");
                self.diagnostics.push(Diagnostic::warning(
                    self.index.focus().unwrap_or_default(),
                    format_message(
                        diagnostic_messages::ITERATION_LIMIT_REACHED,
                        &[&self.builder.options.max_iterations.to_string()],
                    ),
                    diagnostic_codes::ITERATION_LIMIT_REACHED,
                ));
            }
            BuildStatus::Complete => {}
        }
        self.status = Some(status);
    }

    fn provider_failure(&mut self, name: &str, err: &ProviderError) {
        if self.index.is_missing(name) {
            // Unreadable names come back from every reverse lookup.
            trace!(name, "provider failure already reported");
            return;
        }
        warn!(name, %err, "type provider lookup failed");
        self.index.mark_missing(name);
        self.diagnostics.push(Diagnostic::error(
            name,
            format_message(
                diagnostic_messages::PROVIDER_LOOKUP_FAILURE,
                &[name, &err.to_string()],
            ),
            diagnostic_codes::PROVIDER_LOOKUP_FAILURE,
        ));
    }

    /// Add a declaration and its declared supertype edges. Returns the
    /// supertype names, or `None` when the declaration's supertypes could
    /// not be read.
    fn merge(&mut self, decl: &TypeDeclaration) -> Option<Vec<String>> {
        let mut flags = decl.flags;
        if names::is_anonymous_name(&decl.name) {
            flags |= TypeFlags::ANONYMOUS;
        } else if names::is_local_name(&decl.name) {
            flags |= TypeFlags::LOCAL;
        }
        let (superclass, interfaces) = match (decl.superclass_name(), decl.interface_names()) {
            (Ok(superclass), Ok(interfaces)) => (superclass, interfaces),
            (Err(err), _) | (_, Err(err)) => {
                self.provider_failure(&decl.name, &err);
                return None;
            }
        };
        self.index.insert_type(&decl.name, decl.kind, flags);
        let mut supertypes = Vec::with_capacity(interfaces.len() + 1);
        if let Some(superclass) = superclass {
            self.index.add_edge(&decl.name, &superclass, EdgeKind::Superclass);
            supertypes.push(superclass);
        }
        for interface in interfaces {
            self.index.add_edge(&decl.name, &interface, EdgeKind::Superinterface);
            supertypes.push(interface);
        }
        trace!(name = %decl.name, supertypes = supertypes.len(), "merged declaration");
        Some(supertypes)
    }

    /// Look up `frontier` and then every supertype reachable from it.
    fn walk_up(&mut self, frontier: Vec<String>) {
        let mut frontier: Vec<String> = frontier
            .into_iter()
            .filter(|n| self.looked_up.insert(n.clone()))
            .collect();
        let mut depth = 0;
        while !frontier.is_empty() && self.admit() {
            if depth == self.builder.options.max_supertype_depth {
                self.too_deep(depth, &frontier);
                break;
            }
            depth += 1;
            let builder = self.builder;
            let budget = &self.budget;
            let results: Vec<(String, Lookup)> = if self.parallel(frontier.len()) {
                frontier
                    .into_par_iter()
                    .map(|name| {
                        let lookup = builder.lookup(&name, budget);
                        (name, lookup)
                    })
                    .collect()
            } else {
                frontier
                    .into_iter()
                    .map(|name| {
                        let lookup = builder.lookup(&name, budget);
                        (name, lookup)
                    })
                    .collect()
            };

            let mut next = Vec::new();
            for (name, lookup) in results {
                match lookup {
                    Lookup::Found(decl) => {
                        let Some(supertypes) = self.merge(&decl) else {
                            continue;
                        };
                        for supertype in supertypes {
                            if self.looked_up.insert(supertype.clone()) {
                                next.push(supertype);
                            }
                        }
                    }
                    Lookup::NotFound(name) => self.missing_supertype(&name),
                    Lookup::Failed(name, err) => self.provider_failure(&name, &err),
                    Lookup::Skipped => {
                        trace!(name = %name, "lookup skipped after cancellation");
                        self.stop(BuildStatus::Cancelled);
                    }
                    Lookup::OverBudget => {
                        trace!(name = %name, "lookup skipped, budget spent");
                        self.stop(BuildStatus::IterationLimit);
                    }
                }
            }
            if self.status.is_some() {
                break;
            }
            frontier = next;
        }
    }

    /// The supertypes in `frontier` lie past the depth bound.
    fn too_deep(&mut self, depth: usize, frontier: &[String]) {
        let next = frontier.first().map(String::as_str).unwrap_or_default();
        warn!(depth, next, "supertype walk too deep, stopping");
        self.diagnostics.push(Diagnostic::warning(
            next,
            format_message(
                diagnostic_messages::SUPERTYPE_WALK_TOO_DEEP,
                &[&depth.to_string(), next],
            ),
            diagnostic_codes::SUPERTYPE_WALK_TOO_DEEP,
        ));
        self.status = Some(BuildStatus::IterationLimit);
    }

    fn missing_supertype(&mut self, name: &str) {
        let subtypes = self.index.subtypes_of(name, false);
        self.index.mark_missing(name);
        match subtypes.first() {
            Some(subtype) => {
                debug!(name, subtype = %subtype, "supertype not found");
                self.diagnostics.push(Diagnostic::warning(
                    name,
                    format_message(diagnostic_messages::MISSING_SUPERTYPE, &[name, &**subtype]),
                    diagnostic_codes::MISSING_SUPERTYPE,
                ));
            }
            None => debug!(name, "type not found"),
        }
    }

    /// Breadth-first subtype discovery below `focus`.
    fn walk_down(&mut self, focus: &str) {
        if focus == self.builder.options.universal_root {
            debug!(focus, "focus is the universal root, no reverse lookups");
            return;
        }
        self.expanded.insert(focus.to_string());
        let mut frontier = vec![focus.to_string()];
        while !frontier.is_empty() && self.admit() {
            let builder = self.builder;
            let budget = &self.budget;
            let results: Vec<WaveResult> = if self.parallel(frontier.len()) {
                frontier.par_iter().map(|n| builder.find_subtypes(n, budget)).collect()
            } else {
                frontier.iter().map(|n| builder.find_subtypes(n, budget)).collect()
            };
            trace!(wave = frontier.len(), "merging hierarchy wave");

            let mut next = Vec::new();
            let mut exhausted = false;
            for result in results {
                exhausted |= result.exhausted;
                for (name, err) in &result.failures {
                    self.provider_failure(name, err);
                }
                for decl in &result.verified {
                    if self.merge(decl).is_none() {
                        continue;
                    }
                    self.looked_up.insert(decl.name.clone());
                    if decl.is_local_or_anonymous() {
                        trace!(name = %decl.name, "local or anonymous type, not expanded");
                        continue;
                    }
                    if decl.name != self.builder.options.universal_root
                        && self.expanded.insert(decl.name.clone())
                    {
                        next.push(decl.name.clone());
                    }
                }
                trace!(supertype = %result.supertype, found = result.verified.len(), "wave item merged");
            }
            if self.builder.cancel.is_cancelled() {
                self.stop(BuildStatus::Cancelled);
            } else if exhausted {
                self.stop(BuildStatus::IterationLimit);
            }
            frontier = next;
        }
    }

    fn finish(mut self) -> BuildOutcome {
        let status = self.status.take().unwrap_or(BuildStatus::Complete);
        debug!(
            types = self.index.len(),
            iterations = self.budget.spent(),
            diagnostics = self.diagnostics.len(),
            ?status,
            "hierarchy build finished"
        );
        BuildOutcome {
            index: self.index,
            diagnostics: self.diagnostics,
            status,
            iterations: self.budget.spent(),
        }
    }
}
