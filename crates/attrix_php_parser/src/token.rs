//! Token types for the PHP lexer.
//!
//! Defines the [`PhpToken`] enum covering the keywords, names, literals and
//! punctuation needed to parse declarations and constant expressions, plus the
//! [`Token`] struct pairing a token kind with its source [`Span`]. Literal
//! values are not stored in the token; they are decoded from the source text.

use attrix_source::Span;
use serde::{Deserialize, Serialize};

/// A PHP token kind.
///
/// Keywords are case-insensitive in PHP. Operators that never appear in
/// declarations or constant expressions are lexed as [`PhpToken::Operator`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PhpToken {
    // === Keywords ===
    /// `abstract`
    Abstract,
    /// `array`
    Array,
    /// `as`
    As,
    /// `case`
    Case,
    /// `class`
    Class,
    /// `const`
    Const,
    /// `enum`
    Enum,
    /// `extends`
    Extends,
    /// `final`
    Final,
    /// `fn`
    Fn,
    /// `function`
    Function,
    /// `implements`
    Implements,
    /// `interface`
    Interface,
    /// `namespace`
    Namespace,
    /// `new`
    New,
    /// `private`
    Private,
    /// `protected`
    Protected,
    /// `public`
    Public,
    /// `readonly`
    Readonly,
    /// `static`
    Static,
    /// `trait`
    Trait,
    /// `use`
    Use,
    /// `var`
    Var,

    // === Names and variables ===
    /// An unqualified name: `Route`.
    Identifier,
    /// A qualified name: `Attribute\Route`.
    QualifiedName,
    /// A fully-qualified name: `\App\Attribute\Route`.
    FullyQualifiedName,
    /// A namespace-relative name: `namespace\Route`.
    RelativeName,
    /// A variable: `$name`.
    Variable,

    // === Literals ===
    /// An integer literal in any base.
    IntLiteral,
    /// A float literal.
    FloatLiteral,
    /// A single-quoted string.
    SingleQuotedString,
    /// A double-quoted string (may interpolate).
    DoubleQuotedString,
    /// A heredoc (may interpolate).
    Heredoc,
    /// A nowdoc.
    Nowdoc,
    /// A backtick shell command.
    Backtick,

    // === Punctuation ===
    /// `#[`
    AttributeOpen,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `::`
    DoubleColon,
    /// A lone `\` namespace separator, as in group imports `use App\{A, B}`.
    Backslash,
    /// `->`
    Arrow,
    /// `?->`
    NullsafeArrow,
    /// `=>`
    DoubleArrow,
    /// `...`
    Ellipsis,
    /// `?`
    Question,
    /// `??`
    Coalesce,
    /// `=`
    Assign,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `&&`
    DoubleAmpersand,
    /// `||`
    DoublePipe,
    /// `.`
    Dot,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `<`
    Less,
    /// `<=`
    LessEquals,
    /// `>`
    Greater,
    /// `>=`
    GreaterEquals,
    /// `==`
    Equal,
    /// `!=` or `<>`
    NotEqual,
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
    /// `<=>`
    Spaceship,
    /// Any other operator (`+=`, `++`, `@`, `$`, ...).
    Operator,

    // === Special ===
    /// `?>` closing tag. Inline HTML after it is skipped by the lexer.
    CloseTag,
    /// A lexer error.
    Error,
    /// End of file.
    Eof,
}

impl PhpToken {
    /// Returns `true` if this token is a keyword.
    pub fn is_keyword(self) -> bool {
        (self as u8) <= (PhpToken::Var as u8)
    }

    /// Returns `true` if this token names something: an identifier or any
    /// qualified name form.
    pub fn is_name(self) -> bool {
        matches!(
            self,
            PhpToken::Identifier
                | PhpToken::QualifiedName
                | PhpToken::FullyQualifiedName
                | PhpToken::RelativeName
        )
    }

    /// Returns `true` if this token can be used as a member name.
    ///
    /// PHP allows reserved words after `::`, `->` and `function`, and as
    /// class constant or enum case names.
    pub fn is_member_name(self) -> bool {
        self == PhpToken::Identifier || self.is_keyword()
    }

    /// Returns `true` for member modifiers.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            PhpToken::Public
                | PhpToken::Protected
                | PhpToken::Private
                | PhpToken::Static
                | PhpToken::Abstract
                | PhpToken::Final
                | PhpToken::Readonly
                | PhpToken::Var
        )
    }
}

/// A token with its kind and source location.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    /// The token kind.
    pub kind: PhpToken,
    /// The source span of the token.
    pub span: Span,
}

/// Looks up a keyword by its text, ignoring ASCII case.
pub fn lookup_keyword(s: &str) -> Option<PhpToken> {
    if s.len() > 10 {
        return None;
    }
    let lower = s.to_ascii_lowercase();
    let kw = match lower.as_str() {
        "abstract" => PhpToken::Abstract,
        "array" => PhpToken::Array,
        "as" => PhpToken::As,
        "case" => PhpToken::Case,
        "class" => PhpToken::Class,
        "const" => PhpToken::Const,
        "enum" => PhpToken::Enum,
        "extends" => PhpToken::Extends,
        "final" => PhpToken::Final,
        "fn" => PhpToken::Fn,
        "function" => PhpToken::Function,
        "implements" => PhpToken::Implements,
        "interface" => PhpToken::Interface,
        "namespace" => PhpToken::Namespace,
        "new" => PhpToken::New,
        "private" => PhpToken::Private,
        "protected" => PhpToken::Protected,
        "public" => PhpToken::Public,
        "readonly" => PhpToken::Readonly,
        "static" => PhpToken::Static,
        "trait" => PhpToken::Trait,
        "use" => PhpToken::Use,
        "var" => PhpToken::Var,
        _ => return None,
    };
    Some(kw)
}
