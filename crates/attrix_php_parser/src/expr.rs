//! Pratt expression parser for PHP constant expressions.
//!
//! Binding powers follow the PHP 8 precedence table:
//!
//! | BP (L,R) | Operators |
//! |----------|-----------|
//! | ternary  | `? :` `?:` (at min_bp <= 1) |
//! | (3,2)    | `??` (right-assoc) |
//! | (5,6)    | `||` |
//! | (7,8)    | `&&` |
//! | (9,10)   | `|` |
//! | (11,12)  | `^` |
//! | (13,14)  | `&` |
//! | (15,16)  | `==` `!=` `===` `!==` `<=>` |
//! | (17,18)  | `<` `<=` `>` `>=` |
//! | (19,20)  | `.` |
//! | (21,22)  | `<<` `>>` |
//! | (23,24)  | `+` `-` |
//! | (25,26)  | `*` `/` `%` |
//! | prefix 27 | `-` `+` `!` `~` |
//! | (30,29)  | `**` (right-assoc) |
//!
//! Variables, calls and member access are accepted and represented as
//! [`Expr::Dynamic`]; closures as [`Expr::Closure`].

use crate::ast::*;
use crate::parser::PhpParser;
use crate::token::PhpToken;
use attrix_source::Span;

fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Coalesce => (3, 2),
        BinaryOp::LogOr => (5, 6),
        BinaryOp::LogAnd => (7, 8),
        BinaryOp::BitOr => (9, 10),
        BinaryOp::BitXor => (11, 12),
        BinaryOp::BitAnd => (13, 14),
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Identical
        | BinaryOp::NotIdentical
        | BinaryOp::Spaceship => (15, 16),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => (17, 18),
        BinaryOp::Concat => (19, 20),
        BinaryOp::Shl | BinaryOp::Shr => (21, 22),
        BinaryOp::Add | BinaryOp::Sub => (23, 24),
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => (25, 26),
        BinaryOp::Pow => (30, 29),
    }
}

const PREFIX_BP: u8 = 27;

/// Cast keywords accepted in `(type) expr`.
const CASTS: &[&str] = &[
    "int", "integer", "bool", "boolean", "float", "double", "real", "string", "binary", "object",
    "unset",
];

impl PhpParser<'_> {
    /// Parses an expression.
    pub fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0)
    }

    /// Parses an expression with minimum binding power.
    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_prefix_expr();

        loop {
            if self.at_eof() {
                break;
            }

            if self.at(PhpToken::Question) && min_bp <= 1 {
                self.advance();
                let then_expr = if self.eat(PhpToken::Colon) {
                    None
                } else {
                    let e = self.parse_expr_bp(1);
                    self.expect(PhpToken::Colon);
                    Some(Box::new(e))
                };
                let else_expr = self.parse_expr_bp(1);
                let span = lhs.span().merge(else_expr.span());
                lhs = Expr::Ternary {
                    condition: Box::new(lhs),
                    then_expr,
                    else_expr: Box::new(else_expr),
                    span,
                };
                continue;
            }

            if let Some(dynamic) = self.parse_postfix(&lhs) {
                lhs = dynamic;
                continue;
            }

            let op = match self.current_as_binary_op() {
                Some(op) => op,
                None => break,
            };

            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }

            self.advance();

            let rhs = self.parse_expr_bp(r_bp);
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
                span,
            };
        }

        lhs
    }

    fn current_as_binary_op(&self) -> Option<BinaryOp> {
        let op = match self.current() {
            PhpToken::Coalesce => BinaryOp::Coalesce,
            PhpToken::DoublePipe => BinaryOp::LogOr,
            PhpToken::DoubleAmpersand => BinaryOp::LogAnd,
            PhpToken::Pipe => BinaryOp::BitOr,
            PhpToken::Caret => BinaryOp::BitXor,
            PhpToken::Ampersand => BinaryOp::BitAnd,
            PhpToken::Equal => BinaryOp::Eq,
            PhpToken::NotEqual => BinaryOp::NotEq,
            PhpToken::Identical => BinaryOp::Identical,
            PhpToken::NotIdentical => BinaryOp::NotIdentical,
            PhpToken::Spaceship => BinaryOp::Spaceship,
            PhpToken::Less => BinaryOp::Lt,
            PhpToken::LessEquals => BinaryOp::Le,
            PhpToken::Greater => BinaryOp::Gt,
            PhpToken::GreaterEquals => BinaryOp::Ge,
            PhpToken::Dot => BinaryOp::Concat,
            PhpToken::ShiftLeft => BinaryOp::Shl,
            PhpToken::ShiftRight => BinaryOp::Shr,
            PhpToken::Plus => BinaryOp::Add,
            PhpToken::Minus => BinaryOp::Sub,
            PhpToken::Star => BinaryOp::Mul,
            PhpToken::Slash => BinaryOp::Div,
            PhpToken::Percent => BinaryOp::Mod,
            PhpToken::DoubleStar => BinaryOp::Pow,
            _ => return None,
        };
        Some(op)
    }

    /// Parses index, member access, call and `instanceof` suffixes, all of
    /// which make the expression dynamic.
    fn parse_postfix(&mut self, lhs: &Expr) -> Option<Expr> {
        let start = lhs.span();
        match self.current() {
            PhpToken::LeftBracket => {
                self.skip_balanced();
            }
            PhpToken::Arrow | PhpToken::NullsafeArrow | PhpToken::DoubleColon => {
                self.advance();
                match self.current() {
                    PhpToken::LeftBrace => self.skip_balanced(),
                    PhpToken::Variable => self.advance(),
                    k if k.is_member_name() => self.advance(),
                    _ => self.expected("member name"),
                }
                if self.at(PhpToken::LeftParen) {
                    self.parse_arguments();
                }
            }
            PhpToken::LeftParen => {
                self.parse_arguments();
            }
            _ if self.at_word("instanceof") => {
                self.advance();
                if self.parse_name().is_none() {
                    self.parse_prefix_expr();
                }
            }
            _ => return None,
        }
        Some(Expr::Dynamic {
            span: start.merge(self.prev_span()),
        })
    }

    /// Parses a prefix expression (unary operators, literals, names, arrays).
    fn parse_prefix_expr(&mut self) -> Expr {
        let start = self.current_span();

        let unary = match self.current() {
            PhpToken::Minus => Some(UnaryOp::Neg),
            PhpToken::Plus => Some(UnaryOp::Plus),
            PhpToken::Bang => Some(UnaryOp::Not),
            PhpToken::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = unary {
            self.advance();
            let operand = self.parse_expr_bp(PREFIX_BP);
            let span = start.merge(operand.span());
            return Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            };
        }

        match self.current() {
            PhpToken::IntLiteral => self.literal(LiteralKind::Int),
            PhpToken::FloatLiteral => self.literal(LiteralKind::Float),
            PhpToken::SingleQuotedString => self.literal(LiteralKind::SingleQuoted),
            PhpToken::DoubleQuotedString => self.literal(LiteralKind::DoubleQuoted),
            PhpToken::Heredoc => self.literal(LiteralKind::Heredoc),
            PhpToken::Nowdoc => self.literal(LiteralKind::Nowdoc),
            PhpToken::Variable | PhpToken::Backtick => {
                self.advance();
                Expr::Dynamic { span: start }
            }
            PhpToken::Operator if matches!(self.current_text(), "@" | "$" | "++" | "--") => {
                self.advance();
                let operand = self.parse_expr_bp(PREFIX_BP);
                Expr::Dynamic {
                    span: start.merge(operand.span()),
                }
            }
            PhpToken::LeftParen => self.parse_paren_or_cast(),
            PhpToken::LeftBracket => {
                self.advance();
                let items = self.parse_array_items(PhpToken::RightBracket);
                Expr::Array {
                    items,
                    span: start.merge(self.prev_span()),
                }
            }
            PhpToken::Array if self.peek_kind(1) == PhpToken::LeftParen => {
                self.advance();
                self.advance();
                let items = self.parse_array_items(PhpToken::RightParen);
                Expr::Array {
                    items,
                    span: start.merge(self.prev_span()),
                }
            }
            PhpToken::New => self.parse_new(),
            PhpToken::Function | PhpToken::Fn => self.parse_closure(start),
            PhpToken::Static if matches!(self.peek_kind(1), PhpToken::Function | PhpToken::Fn) => {
                self.advance();
                self.parse_closure(start)
            }
            PhpToken::AttributeOpen => {
                // Attributes on a closure.
                self.parse_attribute_groups();
                self.parse_prefix_expr()
            }
            k if k.is_name() || k.is_keyword() => self.parse_name_expr(),
            _ => {
                let span = self.current_span();
                self.expected("expression");
                if !matches!(
                    self.current(),
                    PhpToken::RightParen
                        | PhpToken::RightBracket
                        | PhpToken::RightBrace
                        | PhpToken::Comma
                        | PhpToken::Semicolon
                ) {
                    self.advance();
                }
                Expr::Error(span)
            }
        }
    }

    fn literal(&mut self, kind: LiteralKind) -> Expr {
        let span = self.current_span();
        self.advance();
        Expr::Literal { kind, span }
    }

    /// Parses a constant, class constant, or function call starting at a name.
    fn parse_name_expr(&mut self) -> Expr {
        let start = self.current_span();
        let Some(name) = self.parse_name() else {
            self.expected("name");
            return Expr::Error(start);
        };

        if self.at(PhpToken::DoubleColon) {
            let next = self.peek_kind(1);
            if next.is_member_name() && self.peek_kind(2) != PhpToken::LeftParen {
                self.advance();
                let constant = self.current_text().to_string();
                self.advance();
                return Expr::ClassConstant {
                    class: name,
                    constant,
                    span: start.merge(self.prev_span()),
                };
            }
            // Static property or static call; handled as a postfix.
            return Expr::Dynamic { span: start };
        }

        if self.at(PhpToken::LeftParen) {
            self.parse_arguments();
            return Expr::Dynamic {
                span: start.merge(self.prev_span()),
            };
        }

        Expr::Constant { name, span: start }
    }

    fn parse_paren_or_cast(&mut self) -> Expr {
        let start = self.current_span();
        let is_cast = self.peek_kind(2) == PhpToken::RightParen
            && match self.peek_kind(1) {
                PhpToken::Array => true,
                PhpToken::Identifier => {
                    let text = self.tokens[self.pos + 1].span.text(self.source);
                    CASTS.iter().any(|c| c.eq_ignore_ascii_case(text))
                }
                _ => false,
            };
        if is_cast {
            self.advance();
            self.advance();
            self.advance();
            let operand = self.parse_expr_bp(PREFIX_BP);
            return Expr::Dynamic {
                span: start.merge(operand.span()),
            };
        }

        self.advance();
        let inner = self.parse_expr();
        self.expect(PhpToken::RightParen);
        Expr::Paren {
            inner: Box::new(inner),
            span: start.merge(self.prev_span()),
        }
    }

    /// Parses array elements up to and including the `close` token.
    fn parse_array_items(&mut self, close: PhpToken) -> Vec<ArrayItem> {
        let mut items = Vec::new();
        while !self.at(close) && !self.at_eof() {
            let start = self.current_span();
            if self.eat(PhpToken::Ellipsis) {
                let value = self.parse_expr();
                items.push(ArrayItem {
                    key: None,
                    value,
                    unpack: true,
                    span: start.merge(self.prev_span()),
                });
            } else {
                let first = self.parse_expr();
                let (key, value) = if self.eat(PhpToken::DoubleArrow) {
                    (Some(first), self.parse_expr())
                } else {
                    (None, first)
                };
                items.push(ArrayItem {
                    key,
                    value,
                    unpack: false,
                    span: start.merge(self.prev_span()),
                });
            }
            if !self.eat(PhpToken::Comma) {
                break;
            }
        }
        self.expect(close);
        items
    }

    /// Parses `new Class(args)`. Anonymous classes and dynamic class
    /// expressions are dynamic.
    fn parse_new(&mut self) -> Expr {
        let start = self.current_span();
        self.advance();

        if self.at(PhpToken::Class) {
            self.advance();
            if self.at(PhpToken::LeftParen) {
                self.parse_arguments();
            }
            while !matches!(self.current(), PhpToken::LeftBrace | PhpToken::Eof) {
                self.advance();
            }
            self.skip_balanced();
            return Expr::Dynamic {
                span: start.merge(self.prev_span()),
            };
        }

        let class = match self.current() {
            k if k.is_name() || k.is_member_name() => self.parse_name(),
            _ => None,
        };
        let Some(class) = class else {
            let operand = self.parse_prefix_expr();
            if self.at(PhpToken::LeftParen) {
                self.parse_arguments();
            }
            return Expr::Dynamic {
                span: start.merge(operand.span()).merge(self.prev_span()),
            };
        };
        let args = if self.at(PhpToken::LeftParen) {
            self.parse_arguments()
        } else {
            Vec::new()
        };
        Expr::New {
            class,
            args,
            span: start.merge(self.prev_span()),
        }
    }

    /// Skips a closure or arrow function. `start` covers a leading `static`.
    fn parse_closure(&mut self, start: Span) -> Expr {
        let arrow = self.at(PhpToken::Fn);
        self.advance();
        self.eat(PhpToken::Ampersand);
        if arrow {
            while !matches!(self.current(), PhpToken::DoubleArrow | PhpToken::Eof) {
                if self.at(PhpToken::LeftParen) {
                    self.skip_balanced();
                } else {
                    self.advance();
                }
            }
            self.expect(PhpToken::DoubleArrow);
            let body = self.parse_expr_bp(2);
            return Expr::Closure {
                span: start.merge(body.span()),
            };
        }
        loop {
            match self.current() {
                PhpToken::LeftParen => self.skip_balanced(),
                PhpToken::LeftBrace => {
                    self.skip_balanced();
                    break;
                }
                PhpToken::Eof => {
                    self.expected("closure body");
                    break;
                }
                _ => self.advance(),
            }
        }
        Expr::Closure {
            span: start.merge(self.prev_span()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::lexer::lex;
    use crate::parser::PhpParser;
    use attrix_diagnostics::DiagnosticSink;

    fn parse_expr_text(text: &str) -> (Expr, String, usize) {
        let source = format!("<?php {text}");
        let sink = DiagnosticSink::new();
        let tokens = lex(&source, &sink);
        let mut parser = PhpParser::new(tokens, &source, &sink);
        let expr = parser.parse_expr();
        (expr, source, sink.error_count())
    }

    fn parse_ok(text: &str) -> (Expr, String) {
        let (expr, source, errors) = parse_expr_text(text);
        assert_eq!(errors, 0, "unexpected errors parsing {text}");
        (expr, source)
    }

    #[test]
    fn precedence_mul_over_add() {
        let (expr, _) = parse_ok("1 + 2 * 3");
        match expr {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn unary_minus_binds_looser_than_pow() {
        let (expr, _) = parse_ok("-2 ** 2");
        match expr {
            Expr::Unary { op, operand, .. } => {
                assert_eq!(op, UnaryOp::Neg);
                assert!(matches!(*operand, Expr::Binary { op: BinaryOp::Pow, .. }));
            }
            other => panic!("expected unary, got {other:?}"),
        }
    }

    #[test]
    fn concat_binds_looser_than_add() {
        let (expr, _) = parse_ok("'a' . 1 + 2");
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Concat, .. }));
    }

    #[test]
    fn class_constants_and_class_names() {
        let (expr, source) = parse_ok("\\Attribute::TARGET_CLASS | Attribute::IS_REPEATABLE");
        match expr {
            Expr::Binary { left, op, .. } => {
                assert_eq!(op, BinaryOp::BitOr);
                match *left {
                    Expr::ClassConstant {
                        class,
                        constant,
                        span,
                    } => {
                        assert_eq!(class.kind, NameKind::FullyQualified);
                        assert_eq!(constant, "TARGET_CLASS");
                        assert_eq!(span.text(&source), "\\Attribute::TARGET_CLASS");
                    }
                    other => panic!("expected class constant, got {other:?}"),
                }
            }
            other => panic!("expected binary, got {other:?}"),
        }
        let (expr, _) = parse_ok("static::class");
        assert!(matches!(expr, Expr::ClassConstant { ref constant, .. } if constant == "class"));
    }

    #[test]
    fn arrays_short_and_long() {
        let (expr, _) = parse_ok("['a' => 1, 2, ...[3]]");
        match expr {
            Expr::Array { items, .. } => {
                assert_eq!(items.len(), 3);
                assert!(items[0].key.is_some());
                assert!(items[2].unpack);
            }
            other => panic!("expected array, got {other:?}"),
        }
        let (expr, _) = parse_ok("array(1, 2,)");
        assert!(matches!(expr, Expr::Array { ref items, .. } if items.len() == 2));
    }

    #[test]
    fn new_with_named_args() {
        let (expr, _) = parse_ok("new Assert\\Length(min: 3, max: 10)");
        match expr {
            Expr::New { class, args, .. } => {
                assert_eq!(class.text, "Assert\\Length");
                assert_eq!(args[1].name.as_deref(), Some("max"));
            }
            other => panic!("expected new, got {other:?}"),
        }
    }

    #[test]
    fn closures_and_dynamic_expressions() {
        let (expr, source) = parse_ok("static fn(int $x): int => $x * 2");
        match expr {
            Expr::Closure { span } => {
                assert_eq!(span.text(&source), "static fn(int $x): int => $x * 2")
            }
            other => panic!("expected closure, got {other:?}"),
        }
        let (expr, _) = parse_ok("function () use ($y) { return $y; }");
        assert!(matches!(expr, Expr::Closure { .. }));
        let (expr, _) = parse_ok("strtoupper('x')");
        assert!(matches!(expr, Expr::Dynamic { .. }));
        let (expr, _) = parse_ok("$this->name['k']");
        assert!(matches!(expr, Expr::Dynamic { .. }));
        let (expr, _) = parse_ok("Foo::bar()");
        assert!(matches!(expr, Expr::Dynamic { .. }));
        let (expr, _) = parse_ok("(int) '5'");
        assert!(matches!(expr, Expr::Dynamic { .. }));
    }

    #[test]
    fn ternary_and_short_ternary() {
        let (expr, _) = parse_ok("true ? 1 : 2");
        assert!(matches!(expr, Expr::Ternary { then_expr: Some(_), .. }));
        let (expr, _) = parse_ok("null ?: 'x'");
        assert!(matches!(expr, Expr::Ternary { then_expr: None, .. }));
        let (expr, _) = parse_ok("null ?? 'x'");
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Coalesce, .. }));
    }

    #[test]
    fn missing_operand_is_error() {
        let (expr, _, errors) = parse_expr_text("1 + )");
        assert!(errors > 0);
        assert!(matches!(expr, Expr::Binary { ref right, .. } if matches!(**right, Expr::Error(_))));
    }
}
