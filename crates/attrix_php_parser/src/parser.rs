//! Core parser infrastructure and top-level PHP parsing rules.
//!
//! The [`PhpParser`] struct provides primitive operations (advance, expect, eat)
//! and error recovery, while top-level methods parse namespaces and `use`
//! imports and dispatch type declarations. Statements that cannot declare a
//! type are skipped without being parsed.

use crate::ast::*;
use crate::token::{PhpToken, Token};
use attrix_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use attrix_source::Span;

/// A recursive descent parser for the declaration level of PHP source text.
///
/// The parser consumes a token stream produced by the lexer and builds a
/// [`PhpFile`]. Errors are reported to the diagnostic sink; a type
/// declaration containing an error is represented as [`Item::Error`].
pub struct PhpParser<'src> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) source: &'src str,
    pub(crate) sink: &'src DiagnosticSink,
}

impl<'src> PhpParser<'src> {
    /// Creates a new parser from a token stream lexed from `source`.
    pub fn new(tokens: Vec<Token>, source: &'src str, sink: &'src DiagnosticSink) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            sink,
        }
    }

    // ========================================================================
    // Primitive operations
    // ========================================================================

    /// Returns the kind of the current token.
    pub(crate) fn current(&self) -> PhpToken {
        self.tokens[self.pos].kind
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    /// Returns the source text of the current token.
    pub(crate) fn current_text(&self) -> &'src str {
        self.current_span().text(self.source)
    }

    /// Returns `true` if the current token matches the given kind.
    pub(crate) fn at(&self, kind: PhpToken) -> bool {
        self.current() == kind
    }

    /// Returns `true` if the parser is at end of file.
    pub(crate) fn at_eof(&self) -> bool {
        self.current() == PhpToken::Eof
    }

    /// Returns `true` if the current token is an identifier with the given
    /// text, ignoring ASCII case.
    pub(crate) fn at_word(&self, word: &str) -> bool {
        self.at(PhpToken::Identifier) && self.current_text().eq_ignore_ascii_case(word)
    }

    /// Returns the span of the previous token.
    pub(crate) fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    /// Advances past the current token.
    pub(crate) fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    /// Consumes the current token if it matches the given kind.
    pub(crate) fn eat(&mut self, kind: PhpToken) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to match the given kind. Emits an error if not.
    pub(crate) fn expect(&mut self, kind: PhpToken) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.expected(&format!("{kind:?}"));
            false
        }
    }

    /// Returns the kind of the token at pos+offset.
    pub(crate) fn peek_kind(&self, offset: usize) -> PhpToken {
        self.tokens
            .get(self.pos + offset)
            .map_or(PhpToken::Eof, |t| t.kind)
    }

    /// Consumes a member name (identifier or reserved word) and returns its text.
    pub(crate) fn expect_member_name(&mut self) -> Option<String> {
        if self.current().is_member_name() {
            let text = self.current_text().to_string();
            self.advance();
            Some(text)
        } else {
            self.expected("name");
            None
        }
    }

    /// Consumes a name reference and returns it.
    ///
    /// Reserved words are accepted as unqualified names so that types such as
    /// `Readonly` or `static` can be referenced.
    pub(crate) fn parse_name(&mut self) -> Option<Name> {
        let kind = match self.current() {
            PhpToken::QualifiedName => NameKind::Qualified,
            PhpToken::FullyQualifiedName => NameKind::FullyQualified,
            PhpToken::RelativeName => NameKind::Relative,
            k if k.is_member_name() => NameKind::Unqualified,
            _ => return None,
        };
        let name = Name {
            text: self.current_text().to_string(),
            kind,
            span: self.current_span(),
        };
        self.advance();
        Some(name)
    }

    // ========================================================================
    // Error handling and recovery
    // ========================================================================

    /// Emits an error diagnostic at the current position.
    pub(crate) fn error(&self, msg: &str) {
        self.sink.emit(Diagnostic::error(
            DiagnosticCode::UNEXPECTED_TOKEN,
            msg,
            self.current_span(),
        ));
    }

    /// Emits an "expected X" error at the current position.
    pub(crate) fn expected(&self, what: &str) {
        let actual = format!("{:?}", self.current());
        self.sink.emit(Diagnostic::error(
            DiagnosticCode::UNEXPECTED_TOKEN,
            format!("expected {what}, found {actual}"),
            self.current_span(),
        ));
    }

    /// Emits an unclosed-block error at end of file.
    pub(crate) fn unclosed(&self, what: &str, open: Span) {
        self.sink.emit(Diagnostic::error(
            DiagnosticCode::UNCLOSED_BLOCK,
            format!("unclosed {what}"),
            open,
        ));
    }

    /// Skips a balanced `(...)`, `[...]` or `{...}` group starting at the
    /// current opening token.
    pub(crate) fn skip_balanced(&mut self) {
        let open = self.current_span();
        let mut depth = 0usize;
        loop {
            match self.current() {
                PhpToken::LeftParen
                | PhpToken::LeftBracket
                | PhpToken::LeftBrace
                | PhpToken::AttributeOpen => depth += 1,
                PhpToken::RightParen | PhpToken::RightBracket | PhpToken::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                PhpToken::Eof => {
                    self.unclosed("block", open);
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skips an expression whose value is not needed, stopping before the
    /// `,`, `;` or closing delimiter that ends it.
    pub(crate) fn skip_expression(&mut self) {
        loop {
            match self.current() {
                PhpToken::LeftParen
                | PhpToken::LeftBracket
                | PhpToken::LeftBrace
                | PhpToken::AttributeOpen => self.skip_balanced(),
                PhpToken::Comma
                | PhpToken::Semicolon
                | PhpToken::RightParen
                | PhpToken::RightBracket
                | PhpToken::RightBrace
                | PhpToken::CloseTag
                | PhpToken::Eof => return,
                _ => self.advance(),
            }
        }
    }

    /// Skips a statement: up to and including a `;` at nesting depth zero, or
    /// up to the end of a block that closes at depth zero.
    pub(crate) fn skip_statement(&mut self) {
        loop {
            match self.current() {
                PhpToken::Semicolon | PhpToken::CloseTag => {
                    self.advance();
                    return;
                }
                PhpToken::LeftBrace => {
                    self.skip_balanced();
                    return;
                }
                PhpToken::LeftParen | PhpToken::LeftBracket | PhpToken::AttributeOpen => {
                    self.skip_balanced()
                }
                PhpToken::RightBrace | PhpToken::Eof => return,
                _ => self.advance(),
            }
        }
    }

    // ========================================================================
    // Top-level parsing
    // ========================================================================

    /// Parses a complete PHP file.
    pub fn parse_file(&mut self) -> PhpFile {
        let start = self.current_span();
        let items = self.parse_items(None);
        let span = start.merge(self.current_span());
        PhpFile { items, span }
    }

    /// Parses items until end of file, or until the `}` closing a namespace
    /// block opened at `block`.
    fn parse_items(&mut self, block: Option<Span>) -> Vec<Item> {
        let mut items = Vec::new();
        loop {
            match self.current() {
                PhpToken::Eof => {
                    if let Some(open) = block {
                        self.unclosed("namespace block", open);
                    }
                    break;
                }
                PhpToken::RightBrace => {
                    if block.is_some() {
                        break;
                    }
                    self.error("unmatched '}'");
                    self.advance();
                }
                PhpToken::Semicolon | PhpToken::CloseTag => self.advance(),
                PhpToken::Namespace => {
                    if let Some(ns) = self.parse_namespace(block.is_some()) {
                        items.push(Item::Namespace(ns));
                    }
                }
                PhpToken::Use => items.push(self.parse_use()),
                PhpToken::AttributeOpen
                | PhpToken::Abstract
                | PhpToken::Final
                | PhpToken::Readonly
                | PhpToken::Class
                | PhpToken::Interface
                | PhpToken::Trait => {
                    if let Some(item) = self.parse_declaration() {
                        items.push(item);
                    }
                }
                PhpToken::Enum if self.peek_kind(1).is_member_name() => {
                    if let Some(item) = self.parse_declaration() {
                        items.push(item);
                    }
                }
                PhpToken::Function if self.peek_kind(1) != PhpToken::LeftParen => {
                    self.skip_function();
                }
                PhpToken::LeftBrace => self.skip_balanced(),
                _ => self.skip_statement(),
            }
        }
        items
    }

    /// Parses a declaration that may start with attributes and modifiers.
    ///
    /// Returns `None` for attributed functions and statements, which carry no
    /// records and are skipped.
    fn parse_declaration(&mut self) -> Option<Item> {
        let errors_before = self.sink.error_count();
        let attributes = self.parse_attribute_groups();
        let mut offset = 0;
        while matches!(
            self.peek_kind(offset),
            PhpToken::Abstract | PhpToken::Final | PhpToken::Readonly
        ) {
            offset += 1;
        }
        match self.peek_kind(offset) {
            PhpToken::Class | PhpToken::Interface | PhpToken::Trait | PhpToken::Enum => {
                Some(self.parse_type_decl(attributes, errors_before))
            }
            PhpToken::Function | PhpToken::Fn if offset == 0 => {
                if self.peek_kind(1) == PhpToken::LeftParen || self.at(PhpToken::Fn) {
                    self.skip_statement();
                } else {
                    self.skip_function();
                }
                None
            }
            _ => {
                if !attributes.is_empty() && offset == 0 && !self.current().is_name() {
                    self.expected("declaration after attributes");
                }
                self.skip_statement();
                None
            }
        }
    }

    /// Skips a named function declaration including its body.
    pub(crate) fn skip_function(&mut self) {
        loop {
            match self.current() {
                PhpToken::LeftParen => self.skip_balanced(),
                PhpToken::LeftBrace => {
                    self.skip_balanced();
                    return;
                }
                PhpToken::Semicolon => {
                    self.advance();
                    return;
                }
                PhpToken::RightBrace | PhpToken::Eof => return,
                _ => self.advance(),
            }
        }
    }

    /// Parses `namespace Name;`, `namespace Name { ... }` or `namespace { ... }`.
    fn parse_namespace(&mut self, nested: bool) -> Option<NamespaceDecl> {
        let start = self.current_span();
        self.advance();

        let name = match self.current() {
            PhpToken::LeftBrace => None,
            PhpToken::QualifiedName => Some(self.current_text().to_string()),
            k if k.is_member_name() => Some(self.current_text().to_string()),
            _ => {
                self.expected("namespace name");
                self.skip_statement();
                return None;
            }
        };
        if name.is_some() {
            self.advance();
        }
        if nested {
            self.error("namespace declarations cannot be nested");
        }

        if self.at(PhpToken::LeftBrace) {
            let open = self.current_span();
            self.advance();
            let body = self.parse_items(Some(open));
            self.expect(PhpToken::RightBrace);
            return Some(NamespaceDecl {
                name,
                body: Some(body),
                span: start.merge(self.prev_span()),
            });
        }

        if name.is_none() {
            self.expected("'{'");
        }
        if !self.eat(PhpToken::CloseTag) {
            self.expect(PhpToken::Semicolon);
        }
        Some(NamespaceDecl {
            name,
            body: None,
            span: start.merge(self.prev_span()),
        })
    }

    /// Parses a top-level `use` statement, including group imports.
    fn parse_use(&mut self) -> Item {
        let start = self.current_span();
        self.advance();

        let kind = self.parse_use_kind().unwrap_or(UseKind::Class);
        let mut clauses = Vec::new();
        loop {
            let Some(prefix) = self.parse_use_name() else {
                self.expected("imported name");
                self.skip_statement();
                return Item::Error(start.merge(self.prev_span()));
            };

            if self.eat(PhpToken::Backslash) {
                if !self.expect(PhpToken::LeftBrace) {
                    self.skip_statement();
                    return Item::Error(start.merge(self.prev_span()));
                }
                while !self.at(PhpToken::RightBrace) && !self.at_eof() {
                    let inner_kind = self.parse_use_kind().unwrap_or(kind);
                    let Some(suffix) = self.parse_use_name() else {
                        self.expected("imported name");
                        self.skip_statement();
                        return Item::Error(start.merge(self.prev_span()));
                    };
                    let alias = self.parse_use_alias();
                    clauses.push(UseClause {
                        kind: inner_kind,
                        name: format!("{prefix}\\{suffix}"),
                        alias,
                    });
                    if !self.eat(PhpToken::Comma) {
                        break;
                    }
                }
                self.expect(PhpToken::RightBrace);
            } else {
                let alias = self.parse_use_alias();
                clauses.push(UseClause {
                    kind,
                    name: prefix,
                    alias,
                });
            }

            if !self.eat(PhpToken::Comma) {
                break;
            }
        }
        if !self.eat(PhpToken::CloseTag) {
            self.expect(PhpToken::Semicolon);
        }
        Item::Use(UseDecl {
            clauses,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_use_kind(&mut self) -> Option<UseKind> {
        let kind = match self.current() {
            PhpToken::Function => UseKind::Function,
            PhpToken::Const => UseKind::Const,
            _ => return None,
        };
        self.advance();
        Some(kind)
    }

    /// Parses an imported name, dropping any leading backslash.
    fn parse_use_name(&mut self) -> Option<String> {
        let name = self.parse_name()?;
        Some(name.text.trim_start_matches('\\').to_string())
    }

    fn parse_use_alias(&mut self) -> Option<String> {
        if self.eat(PhpToken::As) {
            self.expect_member_name()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parse_text;

    fn parse_ok(source: &str) -> PhpFile {
        let (file, errors) = parse_text(source);
        assert!(
            errors.is_empty(),
            "unexpected errors: {:?}",
            errors.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
        file
    }

    fn uses(file: &PhpFile) -> Vec<UseClause> {
        file.items
            .iter()
            .filter_map(|i| match i {
                Item::Use(u) => Some(u.clauses.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn statement_namespace() {
        let file = parse_ok("<?php\nnamespace App\\Controller;\nclass A {}");
        assert_eq!(file.items.len(), 2);
        match &file.items[0] {
            Item::Namespace(ns) => {
                assert_eq!(ns.name.as_deref(), Some("App\\Controller"));
                assert!(ns.body.is_none());
            }
            other => panic!("expected namespace, got {other:?}"),
        }
        assert!(matches!(file.items[1], Item::Type(_)));
    }

    #[test]
    fn braced_namespaces() {
        let file = parse_ok("<?php namespace A { class X {} } namespace { class Y {} }");
        assert_eq!(file.items.len(), 2);
        match &file.items[1] {
            Item::Namespace(ns) => {
                assert!(ns.name.is_none());
                assert_eq!(ns.body.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("expected namespace, got {other:?}"),
        }
    }

    #[test]
    fn use_forms() {
        let file = parse_ok(
            "<?php use App\\Attribute\\Route; use \\Foo\\Bar as Baz, Qux; \
             use App\\Models\\{User, Post as P}; use function strlen; use const App\\X;",
        );
        let clauses = uses(&file);
        let names: Vec<(&str, &str, UseKind)> = clauses
            .iter()
            .map(|c| (c.name.as_str(), c.local_name(), c.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("App\\Attribute\\Route", "Route", UseKind::Class),
                ("Foo\\Bar", "Baz", UseKind::Class),
                ("Qux", "Qux", UseKind::Class),
                ("App\\Models\\User", "User", UseKind::Class),
                ("App\\Models\\Post", "P", UseKind::Class),
                ("strlen", "strlen", UseKind::Function),
                ("App\\X", "X", UseKind::Const),
            ]
        );
    }

    #[test]
    fn unrelated_statements_are_skipped() {
        let file = parse_ok(
            "<?php
            require __DIR__ . '/vendor/autoload.php';
            $x = ['a' => function () { return 1; }];
            if ($x) { echo 'y'; } else { echo 'n'; }
            function helper(int $a): int { return $a; }
            #[Pure] function attributed() {}
            final class Kept {}",
        );
        assert_eq!(file.items.len(), 1);
        match &file.items[0] {
            Item::Type(t) => assert_eq!(t.name, "Kept"),
            other => panic!("expected type, got {other:?}"),
        }
    }

    #[test]
    fn inline_html_between_blocks() {
        let file = parse_ok("<h1>x</h1><?php class A {} ?><p><?php class B {}");
        assert_eq!(file.items.len(), 2);
    }

    #[test]
    fn unclosed_namespace_block_reports_error() {
        let (_, errors) = parse_text("<?php namespace A { class X {}");
        assert!(!errors.is_empty());
    }
}
