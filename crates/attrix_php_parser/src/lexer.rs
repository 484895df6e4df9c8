//! Lexical analyzer for PHP source text.
//!
//! Converts source text into a sequence of [`Token`]s. Text outside `<?php` /
//! `?>` tags is skipped. Handles case-insensitive keywords, qualified names,
//! `#[` attribute openers (which are not `#` comments), all string forms
//! including heredoc/nowdoc, and numeric literals with `_` separators.
//! Errors are reported to the [`DiagnosticSink`] and produce
//! [`PhpToken::Error`] tokens.

use crate::token::{lookup_keyword, PhpToken, Token};
use attrix_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use attrix_source::Span;

/// Lexes the given PHP source text into a vector of tokens.
///
/// Whitespace, comments and inline HTML are skipped. The returned vector
/// always ends with a [`PhpToken::Eof`] token.
pub fn lex(source: &str, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        sink,
    };
    lexer.lex_all()
}

/// Multi-character punctuation, longest first.
const OPERATORS: &[(&str, PhpToken)] = &[
    ("<=>", PhpToken::Spaceship),
    ("===", PhpToken::Identical),
    ("!==", PhpToken::NotIdentical),
    ("...", PhpToken::Ellipsis),
    ("?->", PhpToken::NullsafeArrow),
    ("**=", PhpToken::Operator),
    ("<<=", PhpToken::Operator),
    (">>=", PhpToken::Operator),
    ("??=", PhpToken::Operator),
    ("::", PhpToken::DoubleColon),
    ("->", PhpToken::Arrow),
    ("=>", PhpToken::DoubleArrow),
    ("??", PhpToken::Coalesce),
    ("&&", PhpToken::DoubleAmpersand),
    ("||", PhpToken::DoublePipe),
    ("**", PhpToken::DoubleStar),
    ("<<", PhpToken::ShiftLeft),
    (">>", PhpToken::ShiftRight),
    ("<=", PhpToken::LessEquals),
    (">=", PhpToken::GreaterEquals),
    ("==", PhpToken::Equal),
    ("!=", PhpToken::NotEqual),
    ("<>", PhpToken::NotEqual),
    ("++", PhpToken::Operator),
    ("--", PhpToken::Operator),
    ("+=", PhpToken::Operator),
    ("-=", PhpToken::Operator),
    ("*=", PhpToken::Operator),
    ("/=", PhpToken::Operator),
    (".=", PhpToken::Operator),
    ("%=", PhpToken::Operator),
    ("&=", PhpToken::Operator),
    ("|=", PhpToken::Operator),
    ("^=", PhpToken::Operator),
    ("#[", PhpToken::AttributeOpen),
];

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    sink: &'a DiagnosticSink,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.skip_inline_html();
        loop {
            self.skip_whitespace_and_comments();
            if self.at_end() {
                tokens.push(Token {
                    kind: PhpToken::Eof,
                    span: Span::new(self.pos as u32, self.pos as u32),
                });
                break;
            }
            if self.starts_with(b"?>") {
                let start = self.pos;
                self.pos += 2;
                tokens.push(Token {
                    kind: PhpToken::CloseTag,
                    span: self.span_from(start),
                });
                self.skip_inline_html();
                continue;
            }
            tokens.push(self.next_token());
        }
        tokens
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn starts_with(&self, text: &[u8]) -> bool {
        self.source[self.pos..].starts_with(text)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn error(&self, code: DiagnosticCode, msg: &str, span: Span) {
        self.sink.emit(Diagnostic::error(code, msg, span));
    }

    fn token(&self, kind: PhpToken, start: usize) -> Token {
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    /// Skips text up to and including the next open tag.
    fn skip_inline_html(&mut self) {
        while !self.at_end() {
            if self.peek() == b'<' && self.peek_at(1) == b'?' {
                if self.source[self.pos + 2..]
                    .get(..3)
                    .is_some_and(|t| t.eq_ignore_ascii_case(b"php"))
                    && !is_ident_char(self.peek_at(5))
                {
                    self.pos += 5;
                    return;
                }
                if self.peek_at(2) == b'=' {
                    self.pos += 3;
                    return;
                }
            }
            self.pos += 1;
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while !self.at_end() && self.peek().is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.at_end() {
                return;
            }
            let line_comment = (self.peek() == b'#' && self.peek_at(1) != b'[')
                || (self.peek() == b'/' && self.peek_at(1) == b'/');
            if line_comment {
                // A line comment ends at the newline or at a closing tag.
                while !self.at_end() && self.peek() != b'\n' && !self.starts_with(b"?>") {
                    self.pos += 1;
                }
                continue;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.at_end() {
                        self.error(
                            DiagnosticCode::UNTERMINATED,
                            "unterminated block comment",
                            self.span_from(start),
                        );
                        break;
                    }
                    if self.starts_with(b"*/") {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        if is_ident_start(b) {
            return self.lex_name(start);
        }
        if b == b'\\' && is_ident_start(self.peek_at(1)) {
            self.eat_qualified_tail();
            return self.token(PhpToken::FullyQualifiedName, start);
        }
        if b == b'$' && is_ident_start(self.peek_at(1)) {
            self.pos += 1;
            while !self.at_end() && is_ident_char(self.peek()) {
                self.pos += 1;
            }
            return self.token(PhpToken::Variable, start);
        }
        if b.is_ascii_digit() || (b == b'.' && self.peek_at(1).is_ascii_digit()) {
            return self.lex_number(start);
        }
        match b {
            b'\'' => return self.lex_quoted(start, b'\'', PhpToken::SingleQuotedString),
            b'"' => return self.lex_quoted(start, b'"', PhpToken::DoubleQuotedString),
            b'`' => return self.lex_quoted(start, b'`', PhpToken::Backtick),
            _ => {}
        }
        if self.starts_with(b"<<<") {
            if let Some(tok) = self.lex_heredoc(start) {
                return tok;
            }
        }
        self.lex_operator(start)
    }

    fn lex_name(&mut self, start: usize) -> Token {
        while !self.at_end() && is_ident_char(self.peek()) {
            self.pos += 1;
        }
        let first_segment = &self.source[start..self.pos];
        if self.peek() == b'\\' && is_ident_start(self.peek_at(1)) {
            let relative = first_segment.eq_ignore_ascii_case(b"namespace");
            self.eat_qualified_tail();
            let kind = if relative {
                PhpToken::RelativeName
            } else {
                PhpToken::QualifiedName
            };
            return self.token(kind, start);
        }
        let text = std::str::from_utf8(first_segment).unwrap_or("");
        let kind = lookup_keyword(text).unwrap_or(PhpToken::Identifier);
        self.token(kind, start)
    }

    /// Consumes `\Segment` repetitions.
    fn eat_qualified_tail(&mut self) {
        while self.peek() == b'\\' && is_ident_start(self.peek_at(1)) {
            self.pos += 1;
            while !self.at_end() && is_ident_char(self.peek()) {
                self.pos += 1;
            }
        }
    }

    fn lex_number(&mut self, start: usize) -> Token {
        if self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X') {
            self.pos += 2;
            self.eat_digits(|c| c.is_ascii_hexdigit());
            return self.token(PhpToken::IntLiteral, start);
        }
        if self.peek() == b'0' && matches!(self.peek_at(1), b'b' | b'B') {
            self.pos += 2;
            self.eat_digits(|c| c == b'0' || c == b'1');
            return self.token(PhpToken::IntLiteral, start);
        }
        if self.peek() == b'0' && matches!(self.peek_at(1), b'o' | b'O') {
            self.pos += 2;
            self.eat_digits(|c| (b'0'..=b'7').contains(&c));
            return self.token(PhpToken::IntLiteral, start);
        }

        let mut is_float = false;
        self.eat_digits(|c| c.is_ascii_digit());
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            is_float = true;
            self.pos += 1;
            self.eat_digits(|c| c.is_ascii_digit());
        } else if self.peek() == b'.' && !matches!(self.peek_at(1), b'.' | b'=') && self.pos > start
        {
            // `1.` is a float; `1..2` and `1.=` are not.
            is_float = true;
            self.pos += 1;
        }
        if matches!(self.peek(), b'e' | b'E') {
            let sign = usize::from(matches!(self.peek_at(1), b'+' | b'-'));
            if self.peek_at(1 + sign).is_ascii_digit() {
                is_float = true;
                self.pos += 1 + sign;
                self.eat_digits(|c| c.is_ascii_digit());
            }
        }
        let kind = if is_float {
            PhpToken::FloatLiteral
        } else {
            PhpToken::IntLiteral
        };
        self.token(kind, start)
    }

    fn eat_digits(&mut self, valid: impl Fn(u8) -> bool) {
        while !self.at_end() {
            let c = self.peek();
            if valid(c) || (c == b'_' && valid(self.peek_at(1))) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn lex_quoted(&mut self, start: usize, quote: u8, kind: PhpToken) -> Token {
        self.pos += 1;
        if self.skip_quoted_body(quote) {
            self.token(kind, start)
        } else {
            let span = self.span_from(start);
            self.error(
                DiagnosticCode::UNTERMINATED,
                "unterminated string literal",
                span,
            );
            Token {
                kind: PhpToken::Error,
                span,
            }
        }
    }

    /// Skips to just past the closing `quote`. Returns `false` at end of input.
    ///
    /// Inside double-quoted strings, `{$...}` interpolations may contain
    /// nested quotes; those are skipped as a unit.
    fn skip_quoted_body(&mut self, quote: u8) -> bool {
        while !self.at_end() {
            let c = self.peek();
            if c == b'\\' {
                self.pos += 2;
                continue;
            }
            if c == quote {
                self.pos += 1;
                return true;
            }
            if quote != b'\'' && c == b'{' && self.peek_at(1) == b'$' {
                self.pos += 1;
                if !self.skip_interpolation() {
                    return false;
                }
                continue;
            }
            self.pos += 1;
        }
        self.pos = self.source.len();
        false
    }

    /// Skips a `{$...}` interpolation, starting after the `{`.
    fn skip_interpolation(&mut self) -> bool {
        let mut depth = 1usize;
        while !self.at_end() {
            match self.peek() {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return true;
                    }
                }
                q @ (b'\'' | b'"') => {
                    self.pos += 1;
                    if !self.skip_quoted_body(q) {
                        return false;
                    }
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
        }
        false
    }

    /// Lexes `<<<ID ... ID` / `<<<'ID' ... ID`. Returns `None` (without
    /// consuming input) if the opener is not a valid heredoc header.
    fn lex_heredoc(&mut self, start: usize) -> Option<Token> {
        let mut p = self.pos + 3;
        while matches!(self.source.get(p), Some(b' ' | b'\t')) {
            p += 1;
        }
        let quote = match self.source.get(p) {
            Some(q @ (b'\'' | b'"')) => {
                p += 1;
                Some(*q)
            }
            _ => None,
        };
        let label_start = p;
        if !is_ident_start(self.source.get(p).copied().unwrap_or(0)) {
            return None;
        }
        while is_ident_char(self.source.get(p).copied().unwrap_or(0)) {
            p += 1;
        }
        let label = &self.source[label_start..p];
        if let Some(q) = quote {
            if self.source.get(p) != Some(&q) {
                return None;
            }
            p += 1;
        }
        match self.source.get(p) {
            Some(b'\n') => p += 1,
            Some(b'\r') if self.source.get(p + 1) == Some(&b'\n') => p += 2,
            _ => return None,
        }

        let kind = if quote == Some(b'\'') {
            PhpToken::Nowdoc
        } else {
            PhpToken::Heredoc
        };

        // The closing label starts a line, optionally indented, and is not
        // followed by an identifier character.
        let mut line_start = p;
        while line_start <= self.source.len() {
            let mut q = line_start;
            while matches!(self.source.get(q), Some(b' ' | b'\t')) {
                q += 1;
            }
            if self.source[q..].starts_with(label)
                && !is_ident_char(self.source.get(q + label.len()).copied().unwrap_or(0))
            {
                self.pos = q + label.len();
                return Some(self.token(kind, start));
            }
            match self.source[line_start..].iter().position(|&b| b == b'\n') {
                Some(nl) => line_start += nl + 1,
                None => break,
            }
        }

        self.pos = self.source.len();
        let span = self.span_from(start);
        self.error(DiagnosticCode::UNTERMINATED, "unterminated heredoc", span);
        Some(Token {
            kind: PhpToken::Error,
            span,
        })
    }

    fn lex_operator(&mut self, start: usize) -> Token {
        for (text, kind) in OPERATORS {
            if self.starts_with(text.as_bytes()) {
                self.pos += text.len();
                return self.token(*kind, start);
            }
        }
        let b = self.peek();
        self.pos += 1;
        let kind = match b {
            b'(' => PhpToken::LeftParen,
            b')' => PhpToken::RightParen,
            b'[' => PhpToken::LeftBracket,
            b']' => PhpToken::RightBracket,
            b'{' => PhpToken::LeftBrace,
            b'}' => PhpToken::RightBrace,
            b';' => PhpToken::Semicolon,
            b',' => PhpToken::Comma,
            b':' => PhpToken::Colon,
            b'?' => PhpToken::Question,
            b'=' => PhpToken::Assign,
            b'&' => PhpToken::Ampersand,
            b'|' => PhpToken::Pipe,
            b'^' => PhpToken::Caret,
            b'~' => PhpToken::Tilde,
            b'!' => PhpToken::Bang,
            b'.' => PhpToken::Dot,
            b'+' => PhpToken::Plus,
            b'-' => PhpToken::Minus,
            b'*' => PhpToken::Star,
            b'/' => PhpToken::Slash,
            b'%' => PhpToken::Percent,
            b'<' => PhpToken::Less,
            b'>' => PhpToken::Greater,
            b'\\' => PhpToken::Backslash,
            b'@' | b'$' => PhpToken::Operator,
            _ => {
                let span = self.span_from(start);
                self.error(
                    DiagnosticCode::UNEXPECTED_CHAR,
                    &format!("unexpected character '{}'", b.escape_ascii()),
                    span,
                );
                PhpToken::Error
            }
        };
        self.token(kind, start)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}
