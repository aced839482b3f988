use lf_core::ast::{BoundKind, TypeBound, TypeRef};
use winnow::ModalResult;

use super::items::parse_annotation;
use super::winnow::{
    advance, cut_err, ident_parser, is_ident, match_keyword, match_symbol, matching_close,
    peek_symbol,
};
use crate::lexer::winnow::backtrack_err;
use crate::lexer::{Keyword, Token, TokenKind};
use winnow::Parser;

/// Type with trailing `[]` pairs. Fails with a backtrack so callers can
/// lookahead for declarations and casts.
pub(crate) fn parse_type(input: &mut &[Token]) -> ModalResult<TypeRef> {
    let mut ty = parse_type_no_dims(input)?;
    ty.dims += parse_dims(input);
    Ok(ty)
}

pub(crate) fn parse_dims(input: &mut &[Token]) -> usize {
    let mut dims = 0;
    while peek_symbol(input, "[") && matches!(input.get(1), Some(t) if t.lexeme == "]") {
        *input = &input[2..];
        dims += 1;
    }
    dims
}

pub(crate) fn parse_type_no_dims(input: &mut &[Token]) -> ModalResult<TypeRef> {
    while peek_symbol(input, "@") && is_ident(input.get(1)) {
        parse_annotation(input)?;
    }
    let Some(token) = input.first() else {
        return Err(backtrack_err());
    };
    match &token.kind {
        TokenKind::Keyword(k) if k.is_primitive_type() || *k == Keyword::Void => {
            let name = token.lexeme.clone();
            advance(input);
            Ok(TypeRef::named(name))
        }
        TokenKind::Symbol if token.lexeme == "?" => {
            advance(input);
            let mut ty = TypeRef::named("?");
            let kind = if match_keyword(input, Keyword::Extends) {
                Some(BoundKind::Extends)
            } else if match_keyword(input, Keyword::Super) {
                Some(BoundKind::Super)
            } else {
                None
            };
            if let Some(kind) = kind {
                let bound = parse_type(input)?;
                ty.bound = Some(TypeBound {
                    kind,
                    ty: Box::new(bound),
                });
            }
            Ok(ty)
        }
        TokenKind::Ident => {
            let mut name = ident_parser().parse_next(input)?.to_string();
            let mut args = None;
            loop {
                if peek_symbol(input, "<") {
                    args = Some(parse_type_args(input)?);
                }
                if peek_symbol(input, ".") && is_ident(input.get(1)) {
                    advance(input);
                    name.push('.');
                    name.push_str(ident_parser().parse_next(input)?.as_str());
                    continue;
                }
                break;
            }
            Ok(TypeRef {
                args,
                ..TypeRef::named(name)
            })
        }
        _ => Err(backtrack_err()),
    }
}

/// `<A, B>` or the diamond `<>`.
pub(crate) fn parse_type_args(input: &mut &[Token]) -> ModalResult<Vec<TypeRef>> {
    if !match_symbol(input, "<") {
        return Err(backtrack_err());
    }
    let mut args = Vec::new();
    if match_symbol(input, ">") {
        return Ok(args);
    }
    loop {
        args.push(parse_type(input)?);
        if match_symbol(input, ",") {
            continue;
        }
        if match_symbol(input, ">") {
            return Ok(args);
        }
        return Err(backtrack_err());
    }
}

/// Declared type parameters kept as written, e.g. `<T extends Comparable<T>>`.
pub(crate) fn parse_type_params_text(input: &mut &[Token]) -> ModalResult<String> {
    let close = matching_close(input, "<", ">").ok_or_else(cut_err)?;
    let word = |t: &Token| matches!(t.kind, TokenKind::Ident | TokenKind::Keyword(_));
    let mut text = String::new();
    let mut prev: Option<&Token> = None;
    for token in &input[..=close] {
        match prev {
            Some(prev) if word(prev) && word(token) => text.push(' '),
            Some(prev) if prev.lexeme == "," || prev.lexeme == "&" => text.push(' '),
            Some(_) if token.lexeme == "&" => text.push(' '),
            _ => {}
        }
        text.push_str(&token.lexeme);
        prev = Some(token);
    }
    *input = &input[close + 1..];
    Ok(text)
}
