//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The pipeline stage that produced a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Lexical errors, prefixed with `L`.
    Lexer,
    /// Syntax errors, prefixed with `P`.
    Parser,
    /// Constant-expression evaluation problems, prefixed with `V`.
    Value,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Lexer => 'L',
            Category::Parser => 'P',
            Category::Value => 'V',
        }
    }
}

/// A diagnostic code such as `L001` or `P010`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Unterminated string, comment or heredoc.
    pub const UNTERMINATED: DiagnosticCode = DiagnosticCode::new(Category::Lexer, 1);
    /// A byte that does not start any token.
    pub const UNEXPECTED_CHAR: DiagnosticCode = DiagnosticCode::new(Category::Lexer, 2);
    /// A token that does not fit the grammar.
    pub const UNEXPECTED_TOKEN: DiagnosticCode = DiagnosticCode::new(Category::Parser, 1);
    /// A block that is never closed.
    pub const UNCLOSED_BLOCK: DiagnosticCode = DiagnosticCode::new(Category::Parser, 2);
    /// A literal whose value cannot be represented.
    pub const BAD_LITERAL: DiagnosticCode = DiagnosticCode::new(Category::Value, 1);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
