//! Diagnostics emitted while lexing and parsing PHP source.
//!
//! Parse problems never abort discovery: the lexer and parser report them to a
//! [`DiagnosticSink`] and recover, and the discovery layer decides what to log.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Severity};
pub use sink::DiagnosticSink;
