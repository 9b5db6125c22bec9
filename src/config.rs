//! Session configuration.
//!
//! Options are camelCase JSON with every field defaulted, so `{}` is a valid
//! configuration:
//!
//! ```json
//! {
//!   "resolver": { "strictOverloads": true },
//!   "hierarchy": { "maxIterations": 5000, "parallel": false }
//! }
//! ```

use anyhow::{Context, Result};
use jbind_hierarchy::HierarchyOptions;
use jbind_resolver::ResolverOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Overrides `hierarchy.maxIterations`.
pub const MAX_HIERARCHY_ITERATIONS_ENV: &str = "JBIND_MAX_HIERARCHY_ITERATIONS";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionOptions {
    pub resolver: ResolverOptions,
    pub hierarchy: HierarchyOptions,
}

/// Parse options from JSON text, then apply environment overrides.
pub fn parse_options(text: &str) -> Result<SessionOptions> {
    let mut options: SessionOptions =
        serde_json::from_str(text).context("failed to parse session options")?;
    apply_overrides(&mut options, |name| std::env::var(name).ok())?;
    Ok(options)
}

pub fn load_options(path: &Path) -> Result<SessionOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session options from {}", path.display()))?;
    let options = parse_options(&text).with_context(|| format!("in {}", path.display()))?;
    debug!(path = %path.display(), "loaded session options");
    Ok(options)
}

/// Apply overrides read through `var`. Split out so tests need not touch the
/// process environment.
pub fn apply_overrides(
    options: &mut SessionOptions,
    var: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(value) = var(MAX_HIERARCHY_ITERATIONS_ENV) {
        let max_iterations: usize = value.trim().parse().with_context(|| {
            format!("{MAX_HIERARCHY_ITERATIONS_ENV} must be a positive integer, got '{value}'")
        })?;
        if max_iterations == 0 {
            anyhow::bail!("{MAX_HIERARCHY_ITERATIONS_ENV} must be a positive integer, got '{value}'");
        }
        debug!(max_iterations, "hierarchy iteration limit overridden");
        options.hierarchy.max_iterations = max_iterations;
    }
    Ok(())
}
