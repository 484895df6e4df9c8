//! Static evaluation of constant expressions into [`ArgumentValue`]s.
//!
//! Follows PHP semantics for the operators allowed in constant expressions.
//! Anything that cannot be reduced without running code (calls, variables,
//! global constants defined by user code) evaluates to
//! [`ArgumentValue::Opaque`] carrying the expression's source text. Class
//! constants are resolved through a [`SymbolLookup`].

use crate::ast::*;
use crate::literal::decode_literal;
use crate::names::NameResolver;
use attrix_common::{ArgumentValue, Arguments};
use attrix_source::Span;
use indexmap::IndexMap;
use std::cmp::Ordering;

/// Flag constants of the built-in `\Attribute` class.
const ATTRIBUTE_CONSTANTS: &[(&str, i64)] = &[
    ("TARGET_CLASS", 1),
    ("TARGET_FUNCTION", 2),
    ("TARGET_METHOD", 4),
    ("TARGET_PROPERTY", 8),
    ("TARGET_CLASS_CONSTANT", 16),
    ("TARGET_PARAMETER", 32),
    ("TARGET_ALL", 63),
    ("IS_REPEATABLE", 64),
];

/// Looks up declarations the evaluator cannot see in the expression itself.
pub trait SymbolLookup {
    /// Returns the constructor parameter names of `class` (a fully-qualified
    /// name without leading backslash), or `None` when the signature cannot
    /// be determined.
    fn constructor_params(&self, class: &str) -> Option<Vec<String>>;

    /// Returns the value of `class::name`: the evaluated initializer of a
    /// class constant, or an [`ArgumentValue::EnumCase`] for an enum case.
    /// `None` when the declaration cannot be found.
    fn class_constant(&self, _class: &str, _name: &str) -> Option<ArgumentValue> {
        None
    }
}

/// A [`SymbolLookup`] that knows no declarations.
pub struct NoSymbols;

impl SymbolLookup for NoSymbols {
    fn constructor_params(&self, _class: &str) -> Option<Vec<String>> {
        None
    }
}

/// Evaluates constant expressions of one file.
pub struct ConstEvaluator<'a> {
    source: &'a str,
    names: &'a NameResolver,
    symbols: &'a dyn SymbolLookup,
}

impl<'a> ConstEvaluator<'a> {
    /// Creates an evaluator over `source`, resolving names with `names`.
    pub fn new(source: &'a str, names: &'a NameResolver, symbols: &'a dyn SymbolLookup) -> Self {
        Self {
            source,
            names,
            symbols,
        }
    }

    /// Builds the argument map of a call to the constructor of `class`.
    ///
    /// Named arguments keep their names. Positional arguments are keyed by the
    /// constructor's parameter names when known, by their index otherwise.
    pub fn arguments(&self, class: &str, args: &[Argument]) -> Arguments {
        let params = self.symbols.constructor_params(class);
        let key = |position: usize| -> String {
            params
                .as_ref()
                .and_then(|p| p.get(position).cloned())
                .unwrap_or_else(|| position.to_string())
        };

        let mut out = Arguments::new();
        let mut position = 0usize;
        for arg in args {
            let value = self.evaluate(&arg.value);
            if let Some(name) = &arg.name {
                out.insert(name.clone(), value);
                continue;
            }
            if arg.unpack {
                match value {
                    ArgumentValue::List(items) => {
                        for item in items {
                            out.insert(key(position), item);
                            position += 1;
                        }
                    }
                    ArgumentValue::Map(entries) => {
                        for (name, item) in entries {
                            out.insert(name, item);
                        }
                    }
                    _ => {
                        out.insert(key(position), self.opaque(arg.span));
                        position += 1;
                    }
                }
                continue;
            }
            out.insert(key(position), value);
            position += 1;
        }
        out
    }

    /// Evaluates an expression.
    pub fn evaluate(&self, expr: &Expr) -> ArgumentValue {
        match expr {
            Expr::Literal { kind, span } => decode_literal(*kind, span.text(self.source))
                .unwrap_or_else(|| self.opaque(*span)),
            Expr::Constant { name, span } => self.constant(name).unwrap_or_else(|| self.opaque(*span)),
            Expr::ClassConstant {
                class, constant, ..
            } => self.class_constant(class, constant),
            Expr::Array { items, span } => self.array(items).unwrap_or_else(|| self.opaque(*span)),
            Expr::New { class, args, .. } => {
                let class = self.names.resolve_class(class);
                let arguments = self.arguments(&class, args);
                ArgumentValue::Object { class, arguments }
            }
            Expr::Unary { op, operand, span } => {
                let value = self.evaluate(operand);
                unary(*op, &value).unwrap_or_else(|| self.opaque(*span))
            }
            Expr::Binary {
                left,
                op,
                right,
                span,
            } => {
                let l = self.evaluate(left);
                let r = self.evaluate(right);
                binary(*op, l, r).unwrap_or_else(|| self.opaque(*span))
            }
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                span,
            } => {
                let cond = self.evaluate(condition);
                match truthy(&cond) {
                    Some(true) => match then_expr {
                        Some(e) => self.evaluate(e),
                        None => cond,
                    },
                    Some(false) => self.evaluate(else_expr),
                    None => self.opaque(*span),
                }
            }
            Expr::Paren { inner, .. } => self.evaluate(inner),
            Expr::Closure { span } => ArgumentValue::Closure {
                source: span.text(self.source).to_string(),
            },
            Expr::Dynamic { span } | Expr::Error(span) => self.opaque(*span),
        }
    }

    fn opaque(&self, span: Span) -> ArgumentValue {
        ArgumentValue::Opaque {
            expression: span.text(self.source).to_string(),
        }
    }

    /// Resolves global constants PHP defines in every build.
    fn constant(&self, name: &Name) -> Option<ArgumentValue> {
        let text = match name.kind {
            NameKind::Unqualified => name.text.as_str(),
            NameKind::FullyQualified if !name.text[1..].contains('\\') => &name.text[1..],
            _ => return None,
        };
        let value = match text.to_ascii_lowercase().as_str() {
            "true" => return Some(ArgumentValue::Bool(true)),
            "false" => return Some(ArgumentValue::Bool(false)),
            "null" => return Some(ArgumentValue::Null),
            _ => match text {
                "PHP_INT_MAX" => ArgumentValue::Int(i64::MAX),
                "PHP_INT_MIN" => ArgumentValue::Int(i64::MIN),
                "PHP_INT_SIZE" => ArgumentValue::Int(8),
                "PHP_FLOAT_EPSILON" => ArgumentValue::Float(f64::EPSILON),
                "PHP_FLOAT_MAX" => ArgumentValue::Float(f64::MAX),
                "PHP_FLOAT_MIN" => ArgumentValue::Float(f64::MIN_POSITIVE),
                "PHP_FLOAT_DIG" => ArgumentValue::Int(15),
                "PHP_EOL" => ArgumentValue::String("\n".into()),
                "NAN" => ArgumentValue::Float(f64::NAN),
                "INF" => ArgumentValue::Float(f64::INFINITY),
                "M_PI" => ArgumentValue::Float(std::f64::consts::PI),
                "M_E" => ArgumentValue::Float(std::f64::consts::E),
                "__CLASS__" => ArgumentValue::String(self.names.current_class()?.to_string()),
                "__NAMESPACE__" => ArgumentValue::String(self.names.namespace().to_string()),
                _ => return None,
            },
        };
        Some(value)
    }

    fn class_constant(&self, class: &Name, constant: &str) -> ArgumentValue {
        let resolved = self.names.resolve_class(class);
        if constant.eq_ignore_ascii_case("class") {
            return ArgumentValue::String(resolved);
        }
        if resolved.eq_ignore_ascii_case("Attribute") {
            if let Some((_, flag)) = ATTRIBUTE_CONSTANTS.iter().find(|(n, _)| *n == constant) {
                return ArgumentValue::Int(*flag);
            }
        }
        if let Some(value) = self.symbols.class_constant(&resolved, constant) {
            return value;
        }
        // The declaring type is out of reach; keep a symbolic reference.
        ArgumentValue::EnumCase {
            enum_type: resolved,
            case: constant.to_string(),
        }
    }

    /// Builds an array with PHP key semantics. Returns `None` if a key or a
    /// spread cannot be evaluated.
    fn array(&self, items: &[ArrayItem]) -> Option<ArgumentValue> {
        let mut entries: IndexMap<ArrayKey, ArgumentValue> = IndexMap::new();
        let mut next_index: i64 = 0;
        let mut push = |entries: &mut IndexMap<ArrayKey, ArgumentValue>,
                        key: Option<ArrayKey>,
                        value: ArgumentValue| {
            let key = key.unwrap_or(ArrayKey::Int(next_index));
            if let ArrayKey::Int(i) = key {
                if i >= next_index {
                    next_index = i.saturating_add(1);
                }
            }
            entries.insert(key, value);
        };

        for item in items {
            let value = self.evaluate(&item.value);
            if item.unpack {
                match value {
                    ArgumentValue::List(values) => {
                        for v in values {
                            push(&mut entries, None, v);
                        }
                    }
                    ArgumentValue::Map(map) => {
                        for (k, v) in map {
                            match ArrayKey::from_string(k) {
                                ArrayKey::Int(_) => push(&mut entries, None, v),
                                key => push(&mut entries, Some(key), v),
                            }
                        }
                    }
                    _ => return None,
                }
                continue;
            }
            let key = match &item.key {
                Some(k) => Some(ArrayKey::from_value(&self.evaluate(k))?),
                None => None,
            };
            push(&mut entries, key, value);
        }

        let is_list = entries
            .keys()
            .enumerate()
            .all(|(i, k)| *k == ArrayKey::Int(i as i64));
        if is_list {
            return Some(ArgumentValue::List(entries.into_values().collect()));
        }
        Some(ArgumentValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into_string(), v))
                .collect(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ArrayKey {
    Int(i64),
    Str(String),
}

impl ArrayKey {
    /// Decimal integer strings become integer keys, as in PHP.
    fn from_string(s: String) -> ArrayKey {
        let digits = s.strip_prefix('-').unwrap_or(&s);
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && if digits == "0" {
                !s.starts_with('-')
            } else {
                !digits.starts_with('0')
            };
        if canonical {
            if let Ok(i) = s.parse::<i64>() {
                return ArrayKey::Int(i);
            }
        }
        ArrayKey::Str(s)
    }

    fn from_value(value: &ArgumentValue) -> Option<ArrayKey> {
        match value {
            ArgumentValue::Int(i) => Some(ArrayKey::Int(*i)),
            ArgumentValue::String(s) => Some(ArrayKey::from_string(s.clone())),
            ArgumentValue::Bool(b) => Some(ArrayKey::Int(i64::from(*b))),
            ArgumentValue::Float(f) if f.is_finite() => Some(ArrayKey::Int(f.trunc() as i64)),
            ArgumentValue::Null => Some(ArrayKey::Str(String::new())),
            _ => None,
        }
    }

    fn into_string(self) -> String {
        match self {
            ArrayKey::Int(i) => i.to_string(),
            ArrayKey::Str(s) => s,
        }
    }
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &ArgumentValue) -> Option<Num> {
        match value {
            ArgumentValue::Int(i) => Some(Num::Int(*i)),
            ArgumentValue::Float(f) => Some(Num::Float(*f)),
            ArgumentValue::Bool(b) => Some(Num::Int(i64::from(*b))),
            ArgumentValue::Null => Some(Num::Int(0)),
            ArgumentValue::String(s) => {
                let t = s.trim();
                t.parse::<i64>()
                    .map(Num::Int)
                    .or_else(|_| t.parse::<f64>().map(Num::Float))
                    .ok()
            }
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn as_int(self) -> Option<i64> {
        match self {
            Num::Int(i) => Some(i),
            Num::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Num::Float(_) => None,
        }
    }

    fn into_value(self) -> ArgumentValue {
        match self {
            Num::Int(i) => ArgumentValue::Int(i),
            Num::Float(f) => ArgumentValue::Float(f),
        }
    }
}

/// PHP truthiness. `None` for values whose truthiness is unknown statically.
fn truthy(value: &ArgumentValue) -> Option<bool> {
    Some(match value {
        ArgumentValue::Null => false,
        ArgumentValue::Bool(b) => *b,
        ArgumentValue::Int(i) => *i != 0,
        ArgumentValue::Float(f) => *f != 0.0,
        ArgumentValue::String(s) => !(s.is_empty() || s == "0"),
        ArgumentValue::List(items) => !items.is_empty(),
        ArgumentValue::Map(entries) => !entries.is_empty(),
        ArgumentValue::EnumCase { .. } | ArgumentValue::Object { .. } => true,
        ArgumentValue::Closure { .. } => true,
        ArgumentValue::Opaque { .. } => return None,
    })
}

/// String conversion used by `.`.
fn php_string(value: &ArgumentValue) -> Option<String> {
    Some(match value {
        ArgumentValue::Null | ArgumentValue::Bool(false) => String::new(),
        ArgumentValue::Bool(true) => "1".into(),
        ArgumentValue::Int(i) => i.to_string(),
        ArgumentValue::Float(f) if f.is_nan() => "NAN".into(),
        ArgumentValue::Float(f) if f.is_infinite() => {
            if *f > 0.0 { "INF" } else { "-INF" }.into()
        }
        ArgumentValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        ArgumentValue::Float(f) => f.to_string(),
        ArgumentValue::String(s) => s.clone(),
        _ => return None,
    })
}

fn unary(op: UnaryOp, value: &ArgumentValue) -> Option<ArgumentValue> {
    match op {
        UnaryOp::Not => truthy(value).map(|b| ArgumentValue::Bool(!b)),
        UnaryOp::Plus => Num::of(value).map(Num::into_value),
        UnaryOp::Neg => Some(match Num::of(value)? {
            Num::Int(i) => match i.checked_neg() {
                Some(n) => ArgumentValue::Int(n),
                None => ArgumentValue::Float(-(i as f64)),
            },
            Num::Float(f) => ArgumentValue::Float(-f),
        }),
        UnaryOp::BitNot => match value {
            ArgumentValue::Int(i) => Some(ArgumentValue::Int(!i)),
            ArgumentValue::Float(f) if f.is_finite() => Some(ArgumentValue::Int(!(f.trunc() as i64))),
            _ => None,
        },
    }
}

fn binary(op: BinaryOp, l: ArgumentValue, r: ArgumentValue) -> Option<ArgumentValue> {
    use ArgumentValue as V;
    match op {
        BinaryOp::Coalesce => match l {
            V::Opaque { .. } => None,
            V::Null => Some(r),
            other => Some(other),
        },
        BinaryOp::LogAnd => Some(V::Bool(truthy(&l)? && truthy(&r)?)),
        BinaryOp::LogOr => Some(V::Bool(truthy(&l)? || truthy(&r)?)),
        BinaryOp::Concat => Some(V::String(php_string(&l)? + &php_string(&r)?)),
        BinaryOp::Identical => strict_eq(&l, &r).map(V::Bool),
        BinaryOp::NotIdentical => strict_eq(&l, &r).map(|eq| V::Bool(!eq)),
        BinaryOp::Eq => loose_cmp(&l, &r).map(|o| V::Bool(o == Ordering::Equal)),
        BinaryOp::NotEq => loose_cmp(&l, &r).map(|o| V::Bool(o != Ordering::Equal)),
        BinaryOp::Lt => loose_cmp(&l, &r).map(|o| V::Bool(o == Ordering::Less)),
        BinaryOp::Le => loose_cmp(&l, &r).map(|o| V::Bool(o != Ordering::Greater)),
        BinaryOp::Gt => loose_cmp(&l, &r).map(|o| V::Bool(o == Ordering::Greater)),
        BinaryOp::Ge => loose_cmp(&l, &r).map(|o| V::Bool(o != Ordering::Less)),
        BinaryOp::Spaceship => loose_cmp(&l, &r).map(|o| V::Int(o as i64)),
        BinaryOp::BitOr | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
            let a = Num::of(&l)?.as_int()?;
            let b = Num::of(&r)?.as_int()?;
            Some(V::Int(match op {
                BinaryOp::BitOr => a | b,
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitXor => a ^ b,
                BinaryOp::Shl if b < 0 => return None,
                BinaryOp::Shl => u32::try_from(b)
                    .ok()
                    .and_then(|s| a.checked_shl(s))
                    .unwrap_or(0),
                BinaryOp::Shr if b < 0 => return None,
                _ => {
                    let shift = u32::try_from(b).unwrap_or(63).min(63);
                    a >> shift
                }
            }))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            let (a, b) = (Num::of(&l)?, Num::of(&r)?);
            if let (Num::Int(x), Num::Int(y)) = (a, b) {
                let exact = match op {
                    BinaryOp::Add => x.checked_add(y),
                    BinaryOp::Sub => x.checked_sub(y),
                    _ => x.checked_mul(y),
                };
                if let Some(v) = exact {
                    return Some(V::Int(v));
                }
            }
            let (x, y) = (a.as_f64(), b.as_f64());
            Some(V::Float(match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                _ => x * y,
            }))
        }
        BinaryOp::Div => {
            let (a, b) = (Num::of(&l)?, Num::of(&r)?);
            if b.as_f64() == 0.0 {
                return None;
            }
            if let (Num::Int(x), Num::Int(y)) = (a, b) {
                if x.checked_rem(y) == Some(0) {
                    return x.checked_div(y).map(V::Int);
                }
            }
            Some(V::Float(a.as_f64() / b.as_f64()))
        }
        BinaryOp::Mod => {
            let a = Num::of(&l)?.as_int()?;
            let b = Num::of(&r)?.as_int()?;
            a.checked_rem(b).map(V::Int)
        }
        BinaryOp::Pow => {
            let (a, b) = (Num::of(&l)?, Num::of(&r)?);
            if let (Num::Int(x), Num::Int(y)) = (a, b) {
                if let Some(v) = u32::try_from(y).ok().and_then(|e| x.checked_pow(e)) {
                    return Some(V::Int(v));
                }
            }
            Some(V::Float(a.as_f64().powf(b.as_f64())))
        }
    }
}

fn strict_eq(l: &ArgumentValue, r: &ArgumentValue) -> Option<bool> {
    if matches!(l, ArgumentValue::Opaque { .. }) || matches!(r, ArgumentValue::Opaque { .. }) {
        return None;
    }
    if let (ArgumentValue::Float(a), ArgumentValue::Float(b)) = (l, r) {
        return Some(a == b);
    }
    Some(l == r)
}

/// Loose comparison for scalars. `None` for combinations not decided statically.
fn loose_cmp(l: &ArgumentValue, r: &ArgumentValue) -> Option<Ordering> {
    use ArgumentValue as V;
    match (l, r) {
        (V::String(a), V::String(b)) => match (Num::of(l), Num::of(r)) {
            (Some(x), Some(y)) => x.as_f64().partial_cmp(&y.as_f64()),
            _ => Some(a.cmp(b)),
        },
        (V::Bool(_), _) | (_, V::Bool(_)) | (V::Null, _) | (_, V::Null) => {
            Some(truthy(l)?.cmp(&truthy(r)?))
        }
        _ => {
            let (a, b) = (Num::of(l)?, Num::of(r)?);
            match (a, b) {
                (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
                _ => a.as_f64().partial_cmp(&b.as_f64()),
            }
        }
    }
}
