//! Hand-rolled parser for the declaration level of PHP source files.
//!
//! This crate extracts what attribute discovery needs from PHP source text
//! without executing it: namespaces, `use` imports, type declarations, their
//! members, attribute groups and the constant expressions used as attribute
//! arguments. The main entry point is [`parse_source`].
//!
//! # Architecture
//!
//! - **Lexer** ([`lexer`]): converts source text to tokens, skipping inline
//!   HTML and comments while keeping `#[` attribute openers.
//! - **Parser** ([`parser`]): recursive descent over declarations with Pratt
//!   parsing for constant expressions; function bodies are skipped.
//! - **AST** ([`ast`]): node types with spans and serde support.
//! - **Evaluation** ([`eval`], [`names`], [`literal`]): name resolution and
//!   reduction of constant expressions to argument values.
//! - **Outline** ([`outline`]): a regex pass listing declared type names.

#![warn(missing_docs)]

/// AST node types for the declaration-level parser.
pub mod ast;
mod decl;
/// Static evaluation of constant expressions.
pub mod eval;
mod expr;
/// Lexical analyzer for PHP source text.
pub mod lexer;
/// Decoding of literal token text.
pub mod literal;
/// Namespace-aware class name resolution.
pub mod names;
/// Regex outline of declared type names.
pub mod outline;
/// Recursive descent parser with error recovery.
pub mod parser;
/// Token types for the PHP lexer.
pub mod token;

pub use ast::PhpFile;
pub use eval::{ConstEvaluator, NoSymbols, SymbolLookup};
pub use names::NameResolver;
pub use outline::declared_type_names;
pub use token::{PhpToken, Token};

use attrix_diagnostics::DiagnosticSink;
use attrix_source::SourceFile;

/// Parses a PHP source file into an AST.
///
/// Lexes the file content and parses its declarations. Errors are reported to
/// the diagnostic sink; type declarations that fail to parse are represented
/// as [`ast::Item::Error`] and the rest of the file is still returned.
pub fn parse_source(file: &SourceFile, sink: &DiagnosticSink) -> PhpFile {
    let tokens = lexer::lex(&file.content, sink);
    let mut parser = parser::PhpParser::new(tokens, &file.content, sink);
    parser.parse_file()
}

#[cfg(test)]
pub(crate) fn parse_text(source: &str) -> (PhpFile, Vec<attrix_diagnostics::Diagnostic>) {
    let file = SourceFile::from_text("test.php", source);
    let sink = DiagnosticSink::new();
    let ast = parse_source(&file, &sink);
    (ast, sink.take_all())
}
