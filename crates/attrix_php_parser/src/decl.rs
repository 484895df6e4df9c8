//! Type declarations, members, parameter lists and attribute groups.

use crate::ast::*;
use crate::parser::PhpParser;
use crate::token::PhpToken;
use attrix_source::Span;

impl PhpParser<'_> {
    /// Parses a class, interface, trait or enum declaration whose attribute
    /// groups have already been consumed.
    ///
    /// Any error reported after `errors_before` was sampled, including errors
    /// in the attribute groups, turns the whole type into an [`Item::Error`]
    /// so that callers skip it.
    pub(crate) fn parse_type_decl(
        &mut self,
        attributes: Vec<AttributeGroup>,
        errors_before: usize,
    ) -> Item {
        let start = attributes
            .first()
            .map_or(self.current_span(), |group| group.span);

        while matches!(
            self.current(),
            PhpToken::Abstract | PhpToken::Final | PhpToken::Readonly
        ) {
            self.advance();
        }

        let keyword_span = self.current_span();
        let kind = match self.current() {
            PhpToken::Class => TypeKind::Class,
            PhpToken::Interface => TypeKind::Interface,
            PhpToken::Trait => TypeKind::Trait,
            PhpToken::Enum => TypeKind::Enum,
            _ => {
                self.expected("type declaration");
                self.skip_statement();
                return Item::Error(start.merge(self.prev_span()));
            }
        };
        self.advance();

        let Some(name) = self.expect_member_name() else {
            self.skip_statement();
            return Item::Error(start.merge(self.prev_span()));
        };

        let mut extends = None;
        if self.eat(PhpToken::Extends) {
            extends = self.parse_name();
            if extends.is_none() {
                self.expected("parent type name");
            }
            // Interfaces may extend several interfaces.
            while self.eat(PhpToken::Comma) {
                self.parse_name();
            }
        }
        if kind == TypeKind::Enum && self.eat(PhpToken::Colon) {
            self.parse_name();
        }
        if self.eat(PhpToken::Implements) {
            loop {
                if self.parse_name().is_none() {
                    self.expected("interface name");
                    break;
                }
                if !self.eat(PhpToken::Comma) {
                    break;
                }
            }
        }
        if kind != TypeKind::Class {
            extends = None;
        }

        let members = self.parse_type_body();
        let span = start.merge(self.prev_span());
        if self.sink.error_count() > errors_before {
            return Item::Error(span);
        }
        Item::Type(TypeDecl {
            kind,
            name,
            attributes,
            extends,
            members,
            keyword_span,
            span,
        })
    }

    fn parse_type_body(&mut self) -> Vec<Member> {
        let open = self.current_span();
        if !self.expect(PhpToken::LeftBrace) {
            self.skip_statement();
            return Vec::new();
        }
        let mut members = Vec::new();
        loop {
            match self.current() {
                PhpToken::RightBrace => {
                    self.advance();
                    break;
                }
                PhpToken::Eof => {
                    self.unclosed("type body", open);
                    break;
                }
                PhpToken::Semicolon => self.advance(),
                _ => members.push(self.parse_member()),
            }
        }
        members
    }

    fn parse_member(&mut self) -> Member {
        let start = self.current_span();

        if self.at(PhpToken::Use) {
            self.advance();
            while !matches!(
                self.current(),
                PhpToken::Semicolon | PhpToken::LeftBrace | PhpToken::RightBrace | PhpToken::Eof
            ) {
                self.advance();
            }
            if self.at(PhpToken::LeftBrace) {
                self.skip_balanced();
            } else {
                self.eat(PhpToken::Semicolon);
            }
            return Member::TraitUse(start.merge(self.prev_span()));
        }

        let attributes = self.parse_attribute_groups();
        while self.current().is_modifier() {
            self.advance();
            self.skip_set_visibility();
        }

        match self.current() {
            PhpToken::Case => self.parse_enum_case(attributes, start),
            PhpToken::Const => self.parse_constant(attributes, start),
            PhpToken::Function => self.parse_method(attributes, start),
            PhpToken::RightBrace | PhpToken::Eof => {
                self.expected("member declaration");
                Member::Error(start)
            }
            _ => self.parse_property(attributes, start),
        }
    }

    /// Skips the `(set)` of an asymmetric visibility modifier: `private(set)`.
    fn skip_set_visibility(&mut self) {
        if self.at(PhpToken::LeftParen)
            && self.peek_kind(1) == PhpToken::Identifier
            && self.peek_kind(2) == PhpToken::RightParen
        {
            self.advance();
            self.advance();
            self.advance();
        }
    }

    fn parse_enum_case(
        &mut self,
        attributes: Vec<AttributeGroup>,
        start: Span,
    ) -> Member {
        self.advance();
        let Some(name) = self.expect_member_name() else {
            self.skip_statement();
            return Member::Error(start.merge(self.prev_span()));
        };
        let value = self.eat(PhpToken::Assign).then(|| self.parse_initializer());
        self.expect(PhpToken::Semicolon);
        Member::EnumCase(EnumCaseDecl {
            name,
            value,
            attributes,
            span: start.merge(self.prev_span()),
        })
    }

    /// Parses `const [Type] A = 1, B = 2;`.
    fn parse_constant(
        &mut self,
        attributes: Vec<AttributeGroup>,
        start: Span,
    ) -> Member {
        self.advance();
        let mut entries = Vec::new();
        loop {
            // The name is the last word before `=`; anything earlier is a type.
            let mut name = None;
            while !matches!(
                self.current(),
                PhpToken::Assign | PhpToken::Semicolon | PhpToken::RightBrace | PhpToken::Eof
            ) {
                if self.current().is_member_name() {
                    name = Some(self.current_text().to_string());
                }
                self.advance();
            }
            if !self.expect(PhpToken::Assign) {
                self.skip_statement();
                return Member::Error(start.merge(self.prev_span()));
            }
            let value = self.parse_initializer();
            match name {
                Some(name) => entries.push(ConstantEntry { name, value }),
                None => self.error("expected constant name"),
            }
            if !self.eat(PhpToken::Comma) {
                break;
            }
        }
        self.expect(PhpToken::Semicolon);
        Member::Constant(ConstantDecl {
            entries,
            attributes,
            span: start.merge(self.prev_span()),
        })
    }

    /// Parses the value after `=` in a constant or enum case. Tokens the
    /// expression grammar leaves behind are skipped up to the next `,` or `;`.
    fn parse_initializer(&mut self) -> Expr {
        let value = self.parse_expr();
        self.skip_expression();
        value
    }

    fn parse_method(&mut self, attributes: Vec<AttributeGroup>, start: Span) -> Member {
        let keyword_span = self.current_span();
        self.advance();
        self.eat(PhpToken::Ampersand);
        let Some(name) = self.expect_member_name() else {
            self.skip_function();
            return Member::Error(start.merge(self.prev_span()));
        };
        let params = self.parse_params();

        // Return type, then either a body or `;` for abstract methods.
        loop {
            match self.current() {
                PhpToken::LeftParen => self.skip_balanced(),
                PhpToken::LeftBrace => {
                    self.skip_balanced();
                    break;
                }
                PhpToken::Semicolon => {
                    self.advance();
                    break;
                }
                PhpToken::RightBrace | PhpToken::Eof => {
                    self.expected("method body");
                    break;
                }
                _ => self.advance(),
            }
        }

        Member::Method(MethodDecl {
            name,
            attributes,
            params,
            keyword_span,
            span: start.merge(self.prev_span()),
        })
    }

    /// Parses `[Type] $a [= x], $b [= y];`, including property hooks.
    fn parse_property(
        &mut self,
        attributes: Vec<AttributeGroup>,
        start: Span,
    ) -> Member {
        while !matches!(
            self.current(),
            PhpToken::Variable | PhpToken::Semicolon | PhpToken::RightBrace | PhpToken::Eof
        ) {
            if self.at(PhpToken::LeftParen) {
                self.skip_balanced();
            } else {
                self.advance();
            }
        }

        let mut names = Vec::new();
        loop {
            if !self.at(PhpToken::Variable) {
                self.expected("property name");
                self.skip_statement();
                return Member::Error(start.merge(self.prev_span()));
            }
            names.push(self.current_text()[1..].to_string());
            self.advance();
            if self.eat(PhpToken::Assign) {
                self.skip_expression();
            }
            if self.at(PhpToken::LeftBrace) {
                self.skip_balanced();
                return Member::Property(PropertyDecl {
                    names,
                    attributes,
                    span: start.merge(self.prev_span()),
                });
            }
            if !self.eat(PhpToken::Comma) {
                break;
            }
        }
        self.expect(PhpToken::Semicolon);
        Member::Property(PropertyDecl {
            names,
            attributes,
            span: start.merge(self.prev_span()),
        })
    }

    /// Parses a parenthesized parameter list.
    pub(crate) fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if !self.expect(PhpToken::LeftParen) {
            return params;
        }
        while !self.at(PhpToken::RightParen) && !self.at_eof() {
            let start = self.current_span();
            let attributes = self.parse_attribute_groups();

            let mut promoted = false;
            while self.current().is_modifier() {
                if matches!(
                    self.current(),
                    PhpToken::Public | PhpToken::Protected | PhpToken::Private | PhpToken::Readonly
                ) {
                    promoted = true;
                }
                self.advance();
                self.skip_set_visibility();
            }

            let mut variadic = false;
            loop {
                match self.current() {
                    PhpToken::Variable => break,
                    PhpToken::Ellipsis => {
                        variadic = true;
                        self.advance();
                    }
                    PhpToken::LeftParen => self.skip_balanced(),
                    PhpToken::RightParen | PhpToken::Comma | PhpToken::LeftBrace | PhpToken::Eof => {
                        break
                    }
                    _ => self.advance(),
                }
            }
            if !self.at(PhpToken::Variable) {
                self.expected("parameter name");
                self.skip_expression();
                if !self.eat(PhpToken::Comma) {
                    break;
                }
                continue;
            }
            let name = self.current_text()[1..].to_string();
            self.advance();
            if self.eat(PhpToken::Assign) {
                self.skip_expression();
            }
            if self.at(PhpToken::LeftBrace) {
                self.skip_balanced();
            }
            params.push(Param {
                name,
                attributes,
                promoted,
                variadic,
                span: start.merge(self.prev_span()),
            });
            if !self.eat(PhpToken::Comma) {
                break;
            }
        }
        self.expect(PhpToken::RightParen);
        params
    }

    /// Parses zero or more attribute groups: `#[A] #[B, C(1)]`.
    pub(crate) fn parse_attribute_groups(&mut self) -> Vec<AttributeGroup> {
        let mut groups = Vec::new();
        while self.at(PhpToken::AttributeOpen) {
            let start = self.current_span();
            self.advance();
            let mut attributes = Vec::new();
            while !self.at(PhpToken::RightBracket) && !self.at_eof() {
                let attr_start = self.current_span();
                let Some(name) = self.parse_name() else {
                    self.expected("attribute name");
                    while !matches!(self.current(), PhpToken::RightBracket | PhpToken::Eof) {
                        self.advance();
                    }
                    break;
                };
                let args = if self.at(PhpToken::LeftParen) {
                    self.parse_arguments()
                } else {
                    Vec::new()
                };
                attributes.push(Attribute {
                    name,
                    args,
                    span: attr_start.merge(self.prev_span()),
                });
                if !self.eat(PhpToken::Comma) {
                    break;
                }
            }
            self.expect(PhpToken::RightBracket);
            groups.push(AttributeGroup {
                attributes,
                span: start.merge(self.prev_span()),
            });
        }
        groups
    }

    /// Parses a parenthesized argument list with named and spread arguments.
    pub(crate) fn parse_arguments(&mut self) -> Vec<Argument> {
        let mut args = Vec::new();
        self.expect(PhpToken::LeftParen);
        while !self.at(PhpToken::RightParen) && !self.at_eof() {
            let start = self.current_span();
            let mut name = None;
            let mut unpack = false;
            if self.current().is_member_name() && self.peek_kind(1) == PhpToken::Colon {
                name = Some(self.current_text().to_string());
                self.advance();
                self.advance();
            } else if self.eat(PhpToken::Ellipsis) {
                // `f(...)` is first-class callable syntax, not a spread.
                if self.at(PhpToken::RightParen) {
                    break;
                }
                unpack = true;
            }
            let value = self.parse_expr();
            args.push(Argument {
                name,
                unpack,
                value,
                span: start.merge(self.prev_span()),
            });
            if !self.eat(PhpToken::Comma) {
                break;
            }
        }
        self.expect(PhpToken::RightParen);
        args
    }
}
