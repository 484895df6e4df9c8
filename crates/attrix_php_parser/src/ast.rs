//! AST node types for the declaration-level PHP parser.
//!
//! Only the parts of a file that can carry attributes are modelled: namespaces,
//! `use` imports, type declarations and their members. Function bodies and
//! unrelated statements are skipped by the parser. Every node carries a
//! [`Span`]; error recovery is represented by `Error(Span)` variants.

use attrix_source::Span;
use serde::{Deserialize, Serialize};

// ============================================================================
// Top-level
// ============================================================================

/// A parsed PHP file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhpFile {
    /// Top-level items in source order.
    pub items: Vec<Item>,
    /// The span covering the entire file.
    pub span: Span,
}

/// A top-level item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Item {
    /// A namespace declaration.
    Namespace(NamespaceDecl),
    /// A `use` import statement.
    Use(UseDecl),
    /// A class, interface, trait or enum declaration.
    Type(TypeDecl),
    /// An error node produced during error recovery.
    Error(Span),
}

/// A `namespace` declaration.
///
/// The statement form (`namespace App;`) has no body and applies to the
/// items that follow it. The braced form carries its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceDecl {
    /// The namespace name, without a leading backslash. `None` for the global
    /// namespace block `namespace { ... }`.
    pub name: Option<String>,
    /// Items of the braced form.
    pub body: Option<Vec<Item>>,
    /// Source span.
    pub span: Span,
}

/// What a `use` import brings into scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UseKind {
    /// Class-like names (the default).
    Class,
    /// `use function`.
    Function,
    /// `use const`.
    Const,
}

/// A `use` statement, possibly a group import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseDecl {
    /// One clause per imported name; group imports are flattened.
    pub clauses: Vec<UseClause>,
    /// Source span.
    pub span: Span,
}

/// A single imported name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseClause {
    /// What is imported.
    pub kind: UseKind,
    /// The fully-qualified imported name, without a leading backslash.
    pub name: String,
    /// The explicit `as` alias, if any.
    pub alias: Option<String>,
}

impl UseClause {
    /// Returns the name this clause introduces: the alias or the last segment.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.name.rsplit('\\').next().unwrap_or(&self.name),
        }
    }
}

// ============================================================================
// Names
// ============================================================================

/// The syntactic form of a name reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameKind {
    /// `Route`
    Unqualified,
    /// `Attribute\Route`
    Qualified,
    /// `\App\Attribute\Route`
    FullyQualified,
    /// `namespace\Route`
    Relative,
}

/// A name as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    /// The source text of the name.
    pub text: String,
    /// How the name is qualified.
    pub kind: NameKind,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Types
// ============================================================================

/// The kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// `class`
    Class,
    /// `interface`
    Interface,
    /// `trait`
    Trait,
    /// `enum`
    Enum,
}

/// A class, interface, trait or enum declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    /// The declaration kind.
    pub kind: TypeKind,
    /// The short type name.
    pub name: String,
    /// Attribute groups attached to the declaration.
    pub attributes: Vec<AttributeGroup>,
    /// The parent class of a class declaration.
    pub extends: Option<Name>,
    /// Members in source order.
    pub members: Vec<Member>,
    /// Span of the `class`/`interface`/`trait`/`enum` keyword.
    pub keyword_span: Span,
    /// Source span.
    pub span: Span,
}

impl TypeDecl {
    /// Returns the constructor method, if declared in this type.
    pub fn constructor(&self) -> Option<&MethodDecl> {
        self.members.iter().find_map(|m| match m {
            Member::Method(method) if method.name.eq_ignore_ascii_case("__construct") => {
                Some(method)
            }
            _ => None,
        })
    }
}

/// A member of a type declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Member {
    /// A method.
    Method(MethodDecl),
    /// A property declaration, possibly declaring several properties.
    Property(PropertyDecl),
    /// A class constant declaration, possibly declaring several constants.
    Constant(ConstantDecl),
    /// An enum case.
    EnumCase(EnumCaseDecl),
    /// A `use Trait;` clause.
    TraitUse(Span),
    /// An error node produced during error recovery.
    Error(Span),
}

/// A method declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    /// The method name.
    pub name: String,
    /// Attribute groups attached to the method.
    pub attributes: Vec<AttributeGroup>,
    /// The parameter list.
    pub params: Vec<Param>,
    /// Span of the `function` keyword.
    pub keyword_span: Span,
    /// Source span.
    pub span: Span,
}

/// A function or method parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    /// The parameter name without the `$`.
    pub name: String,
    /// Attribute groups attached to the parameter.
    pub attributes: Vec<AttributeGroup>,
    /// `true` if a visibility or `readonly` modifier promotes the parameter
    /// to a property.
    pub promoted: bool,
    /// `true` for `...$rest`.
    pub variadic: bool,
    /// Source span.
    pub span: Span,
}

/// A property declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// Property names without the `$`.
    pub names: Vec<String>,
    /// Attribute groups attached to the declaration.
    pub attributes: Vec<AttributeGroup>,
    /// Source span.
    pub span: Span,
}

/// A class constant declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantDecl {
    /// The declared constants in source order.
    pub entries: Vec<ConstantEntry>,
    /// Attribute groups attached to the declaration.
    pub attributes: Vec<AttributeGroup>,
    /// Source span.
    pub span: Span,
}

/// One `NAME = value` pair of a constant declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantEntry {
    /// The constant name.
    pub name: String,
    /// The initializer.
    pub value: Expr,
}

/// An enum case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumCaseDecl {
    /// The case name.
    pub name: String,
    /// The backing value of a backed enum case.
    pub value: Option<Expr>,
    /// Attribute groups attached to the case.
    pub attributes: Vec<AttributeGroup>,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Attributes
// ============================================================================

/// An attribute group: `#[A, B(1)]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeGroup {
    /// The attributes in the group.
    pub attributes: Vec<Attribute>,
    /// Source span.
    pub span: Span,
}

/// A single attribute within a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute class name as written.
    pub name: Name,
    /// The argument list; empty when no parentheses are present.
    pub args: Vec<Argument>,
    /// Source span.
    pub span: Span,
}

/// An argument of an attribute or a `new` expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argument {
    /// The parameter name of a named argument.
    pub name: Option<String>,
    /// `true` for `...$spread`.
    pub unpack: bool,
    /// The argument expression.
    pub value: Expr,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

/// The kind of a literal expression. The value is decoded from source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    /// Integer literal.
    Int,
    /// Float literal.
    Float,
    /// Single-quoted string.
    SingleQuoted,
    /// Double-quoted string.
    DoubleQuoted,
    /// Heredoc.
    Heredoc,
    /// Nowdoc.
    Nowdoc,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `||`
    LogOr,
    /// `&&`
    LogAnd,
    /// `??`
    Coalesce,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
    /// `<=>`
    Spaceship,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `.`
    Concat,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Pow,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `~`
    BitNot,
}

/// An array element: `value`, `key => value` or `...spread`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayItem {
    /// The explicit key.
    pub key: Option<Expr>,
    /// The element value.
    pub value: Expr,
    /// `true` for `...spread`.
    pub unpack: bool,
    /// Source span.
    pub span: Span,
}

/// A constant expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// A scalar literal.
    Literal {
        /// The literal kind.
        kind: LiteralKind,
        /// Source span.
        span: Span,
    },
    /// A constant reference: `true`, `PHP_EOL`, `\App\VERSION`.
    Constant {
        /// The constant name.
        name: Name,
        /// Source span.
        span: Span,
    },
    /// A class constant or `::class` reference: `Method::GET`, `Foo::class`.
    ClassConstant {
        /// The class name (may be `self`, `static` or `parent`).
        class: Name,
        /// The constant name.
        constant: String,
        /// Source span.
        span: Span,
    },
    /// An array literal, `[...]` or `array(...)`.
    Array {
        /// The elements.
        items: Vec<ArrayItem>,
        /// Source span.
        span: Span,
    },
    /// A `new Class(...)` expression.
    New {
        /// The class name.
        class: Name,
        /// Constructor arguments.
        args: Vec<Argument>,
        /// Source span.
        span: Span,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// A binary operation.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// The operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `cond ? a : b`, or `cond ?: b` when `then_expr` is `None`.
    Ternary {
        /// The condition.
        condition: Box<Expr>,
        /// The value when true.
        then_expr: Option<Box<Expr>>,
        /// The value when false.
        else_expr: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// A parenthesized expression.
    Paren {
        /// The inner expression.
        inner: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// A closure or arrow function.
    Closure {
        /// Source span.
        span: Span,
    },
    /// A syntactically valid expression that is not a constant expression:
    /// variables, calls, member access.
    Dynamic {
        /// Source span.
        span: Span,
    },
    /// An error node produced during error recovery.
    Error(Span),
}

impl Expr {
    /// Returns the source span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Constant { span, .. }
            | Expr::ClassConstant { span, .. }
            | Expr::Array { span, .. }
            | Expr::New { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Closure { span }
            | Expr::Dynamic { span } => *span,
            Expr::Error(span) => *span,
        }
    }
}
