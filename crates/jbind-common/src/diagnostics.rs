use serde::Serialize;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

impl DiagnosticCategory {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Message => "message",
        }
    }
}

/// Stable numeric codes for non-fatal findings.
pub mod diagnostic_codes {
    /// A type provider failed to produce a type during a hierarchy build.
    pub const PROVIDER_LOOKUP_FAILURE: u32 = 1001;
    /// A supertype named by a declaration could not be found.
    pub const MISSING_SUPERTYPE: u32 = 1002;
    /// Hierarchy build stopped because the work-queue bound was reached.
    pub const ITERATION_LIMIT_REACHED: u32 = 1003;
    /// Hierarchy build stopped on a cancellation request.
    pub const BUILD_CANCELLED: u32 = 1004;
    /// Supertype walk stopped at its depth bound.
    pub const SUPERTYPE_WALK_TOO_DEEP: u32 = 1005;
    /// Several overloads matched a method key; the first one was used.
    pub const AMBIGUOUS_OVERLOAD: u32 = 2001;
    /// A local variable key named a variable the method does not declare.
    pub const SYNTHESIZED_LOCAL: u32 = 2002;
    /// A polymorphic-signature method was specialized for a call-site signature.
    pub const POLYMORPHIC_SPECIALIZATION: u32 = 2003;
}

/// Message templates; fill `{0}`, `{1}` with `format_message`.
pub mod diagnostic_messages {
    pub const PROVIDER_LOOKUP_FAILURE: &str = "Type provider failed to look up '{0}': {1}";
    pub const MISSING_SUPERTYPE: &str = "Supertype '{0}' of '{1}' could not be found.";
    pub const ITERATION_LIMIT_REACHED: &str =
        "Hierarchy build stopped after {0} iterations; the index is partial.";
    pub const BUILD_CANCELLED: &str = "Hierarchy build was cancelled; the index is partial.";
    pub const SUPERTYPE_WALK_TOO_DEEP: &str =
        "Supertype walk stopped at depth {0} before '{1}'; the index is partial.";
    pub const AMBIGUOUS_OVERLOAD: &str =
        "{0} overloads of '{1}' match the key; the first declared one was used.";
    pub const SYNTHESIZED_LOCAL: &str =
        "Method '{0}' declares no local '{1}'; a synthetic binding was created.";
    pub const POLYMORPHIC_SPECIALIZATION: &str =
        "Polymorphic-signature method '{0}' was specialized for '{1}'.";
}

/// A non-fatal finding attached to a subject (type name or binding key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub subject: String,
    pub message_text: String,
}

impl Diagnostic {
    pub fn warning(subject: impl Into<String>, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            code,
            subject: subject.into(),
            message_text: message.into(),
        }
    }

    pub fn error(subject: impl Into<String>, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            subject: subject.into(),
            message_text: message.into(),
        }
    }

    pub fn message(subject: impl Into<String>, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Message,
            code,
            subject: subject.into(),
            message_text: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} JB{}: {}: {}",
            self.category.name(),
            self.code,
            self.subject,
            self.message_text
        )
    }
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
