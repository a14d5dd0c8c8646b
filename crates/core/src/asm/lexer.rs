//! Statement lexer.
//!
//! Splits one preprocessed source line into its labels, its head (a directive
//! or mnemonic) and its raw operand tokens, then classifies operand tokens into
//! registers, integers, label references and memory operands. Operands may be
//! separated by commas, whitespace or both; quoted strings and character
//! literals are single tokens.

use crate::common::error::AssembleErrorKind;
use crate::isa::abi::{parse_fpr, parse_gpr};

/// One lexed source line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statement {
    /// Labels defined on the line, in order.
    pub labels: Vec<String>,
    /// Directive (with its dot) or mnemonic, if any.
    pub head: Option<String>,
    /// Raw operand tokens.
    pub args: Vec<String>,
}

/// A classified operand token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Integer register.
    Gpr(usize),
    /// Float register.
    Fpr(usize),
    /// Integer or character literal.
    Int(i64),
    /// `label`, `label+N` or `label-N`.
    Label {
        /// Referenced label.
        name: String,
        /// Constant displacement.
        offset: i64,
    },
    /// `offset(base)`, `label(base)`, `label+N(base)` or `(base)`.
    Mem {
        /// Label part of the displacement, if any.
        label: Option<String>,
        /// Constant part of the displacement.
        offset: i64,
        /// Base register.
        base: usize,
    },
}

/// True if `name` can be a label: a letter or `_`, then letters, digits, `_` or `.`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Removes a trailing `#` comment, ignoring `#` inside string and character literals.
pub fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '#' => return &line[..i],
            None => {}
        }
    }
    line
}

/// Splits a leading `name:` off `text`.
pub(crate) fn strip_label(text: &str) -> Option<(&str, &str)> {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(text.len());
    if end == 0 || !text[end..].starts_with(':') {
        return None;
    }
    Some((&text[..end], &text[end + 1..]))
}

fn tokenize(text: &str) -> Result<Vec<String>, AssembleErrorKind> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                cur.push(c);
                loop {
                    match chars.next() {
                        None => return Err(AssembleErrorKind::MalformedString),
                        Some('\\') => {
                            cur.push('\\');
                            cur.push(chars.next().ok_or(AssembleErrorKind::MalformedString)?);
                        }
                        Some(q) if q == c => {
                            cur.push(q);
                            break;
                        }
                        Some(other) => cur.push(other),
                    }
                }
            }
            ',' => flush(&mut tokens, &mut cur),
            c if c.is_whitespace() => flush(&mut tokens, &mut cur),
            _ => cur.push(c),
        }
    }
    flush(&mut tokens, &mut cur);
    Ok(tokens)
}

fn flush(tokens: &mut Vec<String>, cur: &mut String) {
    if !cur.is_empty() {
        tokens.push(std::mem::take(cur));
    }
}

/// Lexes one preprocessed line.
///
/// # Arguments
///
/// * `text` - The line without its provenance tag.
///
/// # Returns
///
/// The statement, or [`AssembleErrorKind::BadLabel`] for a label that is not an
/// identifier and [`AssembleErrorKind::MalformedString`] for an unterminated literal.
pub fn lex(text: &str) -> Result<Statement, AssembleErrorKind> {
    let mut rest = strip_comment(text).trim();
    let mut labels = Vec::new();
    while let Some((label, after)) = strip_label(rest) {
        if !is_identifier(label) {
            return Err(AssembleErrorKind::BadLabel(label.to_string()));
        }
        labels.push(label.to_string());
        rest = after.trim_start();
    }
    let mut tokens = tokenize(rest)?.into_iter();
    let head = tokens.next();
    Ok(Statement {
        labels,
        head,
        args: tokens.collect(),
    })
}

fn unescape(c: char) -> Option<char> {
    Some(match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        _ => return None,
    })
}

/// Decodes a double-quoted string literal, including its escapes.
pub fn parse_string(token: &str) -> Result<String, AssembleErrorKind> {
    let body = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|_| token.len() >= 2)
        .ok_or(AssembleErrorKind::MalformedString)?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars
                    .next()
                    .and_then(unescape)
                    .ok_or(AssembleErrorKind::MalformedString)?;
                out.push(escaped);
            }
            '"' => return Err(AssembleErrorKind::MalformedString),
            other => out.push(other),
        }
    }
    Ok(out)
}

fn parse_char(token: &str) -> Option<i64> {
    let body = token.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = body.chars();
    let c = match chars.next()? {
        '\\' => unescape(chars.next()?)?,
        c => c,
    };
    chars.next().is_none().then_some(i64::from(u32::from(c)))
}

/// Parses an integer literal: decimal, `0x` hex, or a character literal, with an
/// optional sign.
pub fn parse_int(token: &str) -> Result<i64, AssembleErrorKind> {
    let malformed = || AssembleErrorKind::MalformedImmediate(token.to_string());
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let magnitude = if body.starts_with('\'') {
        parse_char(body).ok_or_else(malformed)?
    } else if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(malformed());
        }
        i64::from_str_radix(hex, 16).map_err(|_| malformed())?
    } else if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        body.parse::<i64>().map_err(|_| malformed())?
    } else {
        return Err(malformed());
    };
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parses a float literal; integer literals are accepted too.
pub fn parse_float(token: &str) -> Result<f64, AssembleErrorKind> {
    if let Ok(v) = parse_int(token) {
        return Ok(v as f64);
    }
    token
        .parse::<f64>()
        .map_err(|_| AssembleErrorKind::MalformedImmediate(token.to_string()))
}

/// Parses `label`, `label+N` or `label-N`.
fn parse_label_expr(text: &str) -> Option<(String, i64)> {
    let split = text
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '+' || c == '-')
        .map(|(i, _)| i);
    let (name, offset) = match split {
        Some(i) => (&text[..i], parse_int(&text[i..]).ok()?),
        None => (text, 0),
    };
    is_identifier(name).then(|| (name.to_string(), offset))
}

/// Classifies an operand token.
///
/// # Examples
///
/// ```
/// use mipsim_core::asm::lexer::{operand, Operand};
///
/// assert_eq!(operand("$t0"), Ok(Operand::Gpr(8)));
/// assert_eq!(operand("-4($sp)"), Ok(Operand::Mem { label: None, offset: -4, base: 29 }));
/// assert_eq!(operand("arr+8"), Ok(Operand::Label { name: "arr".into(), offset: 8 }));
/// ```
pub fn operand(token: &str) -> Result<Operand, AssembleErrorKind> {
    if token.starts_with('$') {
        return parse_fpr(token)
            .map(Operand::Fpr)
            .or_else(|| parse_gpr(token).map(Operand::Gpr))
            .ok_or_else(|| AssembleErrorKind::BadRegister(token.to_string()));
    }
    if let Some((disp, inner)) = token.split_once('(') {
        let reg = inner
            .strip_suffix(')')
            .ok_or_else(|| AssembleErrorKind::MalformedImmediate(token.to_string()))?;
        let base =
            parse_gpr(reg).ok_or_else(|| AssembleErrorKind::BadRegister(reg.to_string()))?;
        let (label, offset) = if disp.is_empty() {
            (None, 0)
        } else if let Ok(v) = parse_int(disp) {
            (None, v)
        } else {
            let (name, off) = parse_label_expr(disp)
                .ok_or_else(|| AssembleErrorKind::MalformedImmediate(disp.to_string()))?;
            (Some(name), off)
        };
        return Ok(Operand::Mem { label, offset, base });
    }
    if let Ok(v) = parse_int(token) {
        return Ok(Operand::Int(v));
    }
    parse_label_expr(token)
        .map(|(name, offset)| Operand::Label { name, offset })
        .ok_or_else(|| AssembleErrorKind::MalformedImmediate(token.to_string()))
}
