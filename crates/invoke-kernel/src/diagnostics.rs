//! Diagnostics
//!
//! Every user-facing problem the engine finds is reported as a [`Diagnostic`]:
//! a severity, a one-line summary, a detail paragraph and optionally the
//! source span it is about. Pipelines collect their own [`Diagnostics`] and
//! hand them to the shared [`DiagnosticsSink`] when done.
//!
//! # Usage
//!
//! ```rust
//! use invoke_kernel::diagnostics::{Diagnostic, Diagnostics};
//!
//! let mut diags = Diagnostics::new();
//! diags.push(Diagnostic::warning("Argument is deprecated", "Use url instead."));
//! assert!(!diags.has_errors());
//!
//! diags.push(Diagnostic::error("Invalid action", "Targeted action does not exist."));
//! assert_eq!(diags.error_count(), 1);
//! ```

use crate::configs::{Body, SourceRange};
use invoke_value::Path;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// How bad a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Prevents the operation from completing
    Error,
    /// Reported, but does not block
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("Error"),
            Self::Warning => f.write_str("Warning"),
        }
    }
}

/// One reported problem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Short summary
    pub summary: String,
    /// Full explanation
    pub detail: String,
    /// Source span the problem is about
    pub subject: Option<SourceRange>,
    /// Address of the object the problem is about
    pub address: Option<String>,
    /// Attribute within the object's configuration
    pub attribute_path: Option<Path>,
}

impl Diagnostic {
    fn new(severity: Severity, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
            subject: None,
            address: None,
            attribute_path: None,
        }
    }

    /// Error without a source anchor
    #[inline]
    #[must_use]
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Error, summary, detail)
    }

    /// Warning without a source anchor
    #[inline]
    #[must_use]
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Warning, summary, detail)
    }

    /// Anchor to a source span
    #[inline]
    #[must_use]
    pub fn with_subject(mut self, subject: SourceRange) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Name the object the problem is about
    #[inline]
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Point at an attribute within the configuration value
    #[inline]
    #[must_use]
    pub fn with_attribute_path(mut self, path: Path) -> Self {
        self.attribute_path = Some(path);
        self
    }

    /// Whether this is an error
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if let Some(subject) = &self.subject {
            write!(f, "\n  on {subject}")?;
        }
        if let Some(address) = &self.address {
            write!(f, "\n  in {address}")?;
        }
        if !self.detail.is_empty() {
            write!(f, "\n\n{}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one diagnostic
    #[inline]
    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    /// Move every diagnostic from `other` into this collection
    #[inline]
    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Whether any diagnostic is an error
    #[inline]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Number of errors
    #[inline]
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    /// Errors only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    /// All diagnostics
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Number of diagnostics
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are none
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Anchor diagnostics produced while handling a configuration body
    ///
    /// Each diagnostic without a subject is anchored to the attribute its
    /// attribute path starts at, or to the whole body when that attribute is
    /// not written in it. Diagnostics without an address get `address`.
    #[must_use]
    pub fn in_config_body(self, body: &Body, address: &str) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|mut diag| {
                    if diag.subject.is_none() {
                        let attr_range = diag
                            .attribute_path
                            .as_ref()
                            .and_then(Path::first_attr)
                            .and_then(|name| body.attribute(name))
                            .map(|attr| attr.range.clone());
                        diag.subject = Some(attr_range.unwrap_or_else(|| body.range.clone()));
                    }
                    if diag.address.is_none() {
                        diag.address = Some(address.to_string());
                    }
                    diag
                })
                .collect(),
        )
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Shared, append-only diagnostics collector
///
/// Concurrently running pipelines append their finished diagnostics here.
/// Each append is atomic, so one pipeline's diagnostics stay contiguous.
#[derive(Debug, Default)]
pub struct DiagnosticsSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticsSink {
    /// Empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch
    pub fn append(&self, diags: Diagnostics) {
        if diags.is_empty() {
            return;
        }
        self.entries.lock().extend(diags);
    }

    /// Copy of everything appended so far
    #[must_use]
    pub fn snapshot(&self) -> Diagnostics {
        Diagnostics(self.entries.lock().clone())
    }

    /// Number of diagnostics appended
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing was appended
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether any appended diagnostic is an error
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries.lock().iter().any(Diagnostic::is_error)
    }
}
