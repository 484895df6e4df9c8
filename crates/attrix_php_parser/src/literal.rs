//! Decoding of literal token text into values.
//!
//! String decoding returns `None` when a double-quoted string or heredoc
//! interpolates variables, or when escapes produce bytes that are not valid
//! UTF-8; such literals are not constant.

use crate::ast::LiteralKind;
use attrix_common::ArgumentValue;

/// Decodes the source text of a literal token.
pub fn decode_literal(kind: LiteralKind, text: &str) -> Option<ArgumentValue> {
    match kind {
        LiteralKind::Int => Some(decode_int(text)),
        LiteralKind::Float => decode_float(text).map(ArgumentValue::Float),
        LiteralKind::SingleQuoted => Some(ArgumentValue::String(decode_single_quoted(text))),
        LiteralKind::DoubleQuoted => {
            let body = text.get(1..text.len().saturating_sub(1))?;
            unescape(body, Some(b'"')).map(ArgumentValue::String)
        }
        LiteralKind::Heredoc => {
            let body = heredoc_body(text)?;
            unescape(&body, None).map(ArgumentValue::String)
        }
        LiteralKind::Nowdoc => heredoc_body(text).map(ArgumentValue::String),
    }
}

/// Decodes an integer literal. Values that do not fit an `i64` become floats.
pub fn decode_int(text: &str) -> ArgumentValue {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    match i64::from_str_radix(body, radix) {
        Ok(v) => ArgumentValue::Int(v),
        Err(_) if radix == 10 => ArgumentValue::Float(body.parse().unwrap_or(f64::INFINITY)),
        Err(_) => {
            let value = body
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0f64, |acc, d| acc * f64::from(radix) + f64::from(d));
            ArgumentValue::Float(value)
        }
    }
}

/// Decodes a float literal.
pub fn decode_float(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    digits.parse().ok()
}

/// Decodes a single-quoted string: only `\'` and `\\` are escapes.
pub fn decode_single_quoted(text: &str) -> String {
    let body = text.get(1..text.len().saturating_sub(1)).unwrap_or("");
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\'' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Extracts the body of a heredoc or nowdoc token, with the closing marker's
/// indentation removed from every line.
fn heredoc_body(text: &str) -> Option<String> {
    let header_end = text.find('\n')? + 1;
    let last_nl = text.rfind('\n')?;
    let closing = &text[last_nl + 1..];
    let indent_len = closing.len() - closing.trim_start_matches([' ', '\t']).len();
    let indent = &closing[..indent_len];

    if last_nl < header_end {
        return Some(String::new());
    }
    let raw = text[header_end..last_nl].trim_end_matches('\r');
    let lines: Vec<&str> = raw
        .split('\n')
        .map(|line| line.strip_prefix(indent).unwrap_or(line.trim_start_matches([' ', '\t'])))
        .collect();
    Some(lines.join("\n"))
}

/// Applies double-quoted escape sequences. `quote` is the delimiter that
/// `\` may escape (`"` for strings, none for heredocs).
fn unescape(body: &str, quote: Option<u8>) -> Option<String> {
    let bytes = body.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'$' {
            let next = bytes.get(i + 1).copied().unwrap_or(0);
            if next == b'{' || next == b'_' || next.is_ascii_alphabetic() || next >= 0x80 {
                return None;
            }
        }
        if b == b'{' && bytes.get(i + 1) == Some(&b'$') {
            return None;
        }
        if b != b'\\' || i + 1 >= bytes.len() {
            out.push(b);
            i += 1;
            continue;
        }

        let esc = bytes[i + 1];
        i += 2;
        match esc {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'v' => out.push(0x0b),
            b'e' => out.push(0x1b),
            b'f' => out.push(0x0c),
            b'\\' => out.push(b'\\'),
            b'$' => out.push(b'$'),
            b'0'..=b'7' => {
                let mut value = u32::from(esc - b'0');
                let mut len = 1;
                while len < 3 && matches!(bytes.get(i), Some(b'0'..=b'7')) {
                    value = value * 8 + u32::from(bytes[i] - b'0');
                    i += 1;
                    len += 1;
                }
                out.push((value & 0xff) as u8);
            }
            b'x' if bytes.get(i).is_some_and(u8::is_ascii_hexdigit) => {
                let mut value = 0u8;
                let mut len = 0;
                while len < 2 {
                    match bytes.get(i).and_then(|&c| (c as char).to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d as u8;
                            i += 1;
                            len += 1;
                        }
                        None => break,
                    }
                }
                out.push(value);
            }
            b'u' if bytes.get(i) == Some(&b'{') => {
                let close = bytes[i..].iter().position(|&c| c == b'}')? + i;
                let hex = std::str::from_utf8(&bytes[i + 1..close]).ok()?;
                let ch = char::from_u32(u32::from_str_radix(hex, 16).ok()?)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                i = close + 1;
            }
            c if Some(c) == quote => out.push(c),
            c => {
                out.push(b'\\');
                out.push(c);
            }
        }
    }
    String::from_utf8(out).ok()
}
