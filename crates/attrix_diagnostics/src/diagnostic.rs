//! Structured diagnostic messages.

use crate::code::DiagnosticCode;
use attrix_source::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// The construct was understood approximately; extraction continues.
    Warning,
    /// The construct was skipped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message pointing at a span of the parsed file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level.
    pub severity: Severity,
    /// The diagnostic code.
    pub code: DiagnosticCode,
    /// The message.
    pub message: String,
    /// Where the problem was detected.
    pub span: Span,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }

    /// Renders the diagnostic as a single line, e.g. `src/A.php:3: error[P001]: ...`.
    pub fn render(&self, file: &SourceFile) -> String {
        format!(
            "{}:{}: {}[{}]: {}",
            file.path.display(),
            file.line_of(self.span.start),
            self.severity,
            self.code,
            self.message
        )
    }
}
