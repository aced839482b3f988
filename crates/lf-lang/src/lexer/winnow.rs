use winnow::combinator::{alt, cut_err};
use winnow::error::{ContextError, ErrMode};
use winnow::token::{literal, take_till, take_until, take_while};
use winnow::{ModalResult, Parser};

/// Multi-character operators, longest first. Nothing starting with `>` is
/// listed: closing angle brackets stay single so nested generics close, and
/// the expression parser reassembles shifts and `>=` from adjacent tokens.
pub(crate) const MULTI_PUNCT: &[&str] = &[
    "<<=", "...", "->", "::", "==", "!=", "<=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "<<",
];
pub(crate) const SINGLE_PUNCT: &str = "=+-*/%&|^!~@?:;,.()[]{}<>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trivia<'a> {
    Space,
    Comment(&'a str),
}

pub(crate) fn trivia<'a>(input: &mut &'a str) -> ModalResult<Trivia<'a>> {
    alt((
        whitespace.value(Trivia::Space),
        line_comment.map(Trivia::Comment),
        block_comment.map(Trivia::Comment),
    ))
    .parse_next(input)
}

pub(crate) fn whitespace(input: &mut &str) -> ModalResult<()> {
    take_while(1.., char::is_whitespace)
        .map(|_| ())
        .parse_next(input)
}

/// `// ...` up to, not including, the newline.
pub(crate) fn line_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (literal("//"), take_till(0.., |c: char| c == '\n'))
        .take()
        .parse_next(input)
}

pub(crate) fn block_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (literal("/*"), cut_err(take_until(0.., "*/")), literal("*/"))
        .take()
        .parse_next(input)
}

pub(crate) fn string_literal<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    if input.starts_with("\"\"\"") || !input.starts_with('"') {
        return Err(backtrack_err());
    }
    let slice = *input;
    let end = scan_quoted(slice, b'"').ok_or_else(cut_err_mode)?;
    *input = &slice[end..];
    Ok(&slice[..end])
}

pub(crate) fn char_literal<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    if !input.starts_with('\'') {
        return Err(backtrack_err());
    }
    let slice = *input;
    let end = scan_quoted(slice, b'\'').ok_or_else(cut_err_mode)?;
    *input = &slice[end..];
    Ok(&slice[..end])
}

pub(crate) fn text_block<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let slice = *input;
    let Some(body) = slice.strip_prefix("\"\"\"") else {
        return Err(backtrack_err());
    };
    let bytes = body.as_bytes();
    let mut idx = 0;
    while idx + 3 <= bytes.len() {
        match bytes[idx] {
            b'\\' => idx += 2,
            b'"' if &bytes[idx..idx + 3] == b"\"\"\"" => {
                let end = 3 + idx + 3;
                *input = &slice[end..];
                return Ok(&slice[..end]);
            }
            _ => idx += 1,
        }
    }
    Err(cut_err_mode())
}

/// End offset (exclusive) of a quoted literal starting at byte 0.
fn scan_quoted(slice: &str, quote: u8) -> Option<usize> {
    let bytes = slice.as_bytes();
    let mut idx = 1;
    let mut escape = false;
    while idx < bytes.len() {
        let b = bytes[idx];
        idx += 1;
        if b == b'\n' {
            return None;
        }
        if b == b'\\' && !escape {
            escape = true;
            continue;
        }
        if b == quote && !escape {
            return Some(idx);
        }
        escape = false;
    }
    None
}

/// Integer and floating literals: hex, binary, octal-looking decimals,
/// fractions, exponents, `_` separators and `lLfFdD` suffixes.
pub(crate) fn number_literal<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let slice = *input;
    let bytes = slice.as_bytes();
    let starts_fraction = bytes.first() == Some(&b'.') && bytes.get(1).map_or(false, u8::is_ascii_digit);
    if !starts_fraction && !bytes.first().map_or(false, u8::is_ascii_digit) {
        return Err(backtrack_err());
    }
    let digits = |idx: &mut usize, pred: fn(&u8) -> bool| {
        while *idx < bytes.len() && (pred(&bytes[*idx]) || bytes[*idx] == b'_') {
            *idx += 1;
        }
    };
    let mut idx = 0;
    let radix_prefix = bytes.len() > 1 && bytes[0] == b'0' && matches!(bytes[1], b'x' | b'X' | b'b' | b'B');
    if radix_prefix {
        idx = 2;
        if matches!(bytes[1], b'x' | b'X') {
            digits(&mut idx, u8::is_ascii_hexdigit);
        } else {
            digits(&mut idx, |b: &u8| matches!(*b, b'0' | b'1'));
        }
        if idx < bytes.len() && matches!(bytes[idx], b'l' | b'L') {
            idx += 1;
        }
    } else {
        digits(&mut idx, u8::is_ascii_digit);
        if idx < bytes.len() && bytes[idx] == b'.' && bytes.get(idx + 1).map_or(false, u8::is_ascii_digit) {
            idx += 1;
            digits(&mut idx, u8::is_ascii_digit);
        }
        if idx < bytes.len() && matches!(bytes[idx], b'e' | b'E') {
            let mut exp = idx + 1;
            if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
                exp += 1;
            }
            if bytes.get(exp).map_or(false, u8::is_ascii_digit) {
                idx = exp;
                digits(&mut idx, u8::is_ascii_digit);
            }
        }
        if idx < bytes.len() && matches!(bytes[idx], b'l' | b'L' | b'f' | b'F' | b'd' | b'D') {
            idx += 1;
        }
    }
    *input = &slice[idx..];
    Ok(&slice[..idx])
}

pub(crate) fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (take_while(1, is_ident_start), take_while(0.., is_ident_continue))
        .take()
        .parse_next(input)
}

pub(crate) fn symbol<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let slice = *input;
    for sym in MULTI_PUNCT {
        if slice.starts_with(sym) {
            *input = &slice[sym.len()..];
            return Ok(&slice[..sym.len()]);
        }
    }
    match slice.chars().next() {
        Some(ch) if SINGLE_PUNCT.contains(ch) => {
            *input = &slice[1..];
            Ok(&slice[..1])
        }
        _ => Err(backtrack_err()),
    }
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphanumeric()
}

pub(crate) fn backtrack_err() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}

fn cut_err_mode() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}
