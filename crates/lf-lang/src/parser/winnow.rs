use lf_core::ast::Ident;
use lf_core::span::Span;
use winnow::error::{ContextError, ErrMode};
use winnow::{ModalResult, Parser};

use crate::lexer::winnow::backtrack_err;
use crate::lexer::{Keyword, Token, TokenKind};

pub(crate) fn cut_err() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

pub(crate) fn match_keyword(input: &mut &[Token], keyword: Keyword) -> bool {
    keyword_parser(keyword).parse_next(input).is_ok()
}

pub(crate) fn peek_keyword(input: &[Token], keyword: Keyword) -> bool {
    matches!(
        input.first(),
        Some(Token {
            kind: TokenKind::Keyword(k),
            ..
        }) if *k == keyword
    )
}

pub(crate) fn expect_keyword(input: &mut &[Token], keyword: Keyword) -> ModalResult<()> {
    keyword_parser(keyword)
        .parse_next(input)
        .map_err(|_| cut_err())
}

pub(crate) fn match_symbol<'a>(input: &mut &'a [Token], symbol: &'a str) -> bool {
    symbol_parser(symbol).parse_next(input).is_ok()
}

pub(crate) fn matches_symbol(token: Option<&Token>, symbol: &str) -> bool {
    matches!(
        token,
        Some(Token {
            kind: TokenKind::Symbol,
            lexeme,
            ..
        }) if lexeme == symbol
    )
}

pub(crate) fn peek_symbol(input: &[Token], symbol: &str) -> bool {
    matches_symbol(input.first(), symbol)
}

pub(crate) fn expect_symbol<'a>(input: &mut &'a [Token], symbol: &'a str) -> ModalResult<()> {
    symbol_parser(symbol)
        .parse_next(input)
        .map_err(|_| cut_err())
}

pub(crate) fn symbol_parser<'a>(
    symbol: &'a str,
) -> impl Parser<&'a [Token], (), ErrMode<ContextError>> {
    let sym = symbol.to_string();
    move |input: &mut &[Token]| {
        if matches_symbol(input.first(), &sym) {
            *input = &input[1..];
            Ok(())
        } else {
            Err(backtrack_err())
        }
    }
}

pub(crate) fn keyword_parser<'a>(
    keyword: Keyword,
) -> impl Parser<&'a [Token], (), ErrMode<ContextError>> {
    move |input: &mut &[Token]| match input.first() {
        Some(Token {
            kind: TokenKind::Keyword(k),
            ..
        }) if *k == keyword => {
            *input = &input[1..];
            Ok(())
        }
        _ => Err(backtrack_err()),
    }
}

pub(crate) fn ident_parser<'a>() -> impl Parser<&'a [Token], Ident, ErrMode<ContextError>> {
    move |input: &mut &[Token]| match input.first() {
        Some(Token {
            kind: TokenKind::Ident,
            lexeme,
            ..
        }) => {
            let ident = Ident::new(lexeme.clone());
            *input = &input[1..];
            Ok(ident)
        }
        _ => Err(backtrack_err()),
    }
}

pub(crate) fn expect_ident(input: &mut &[Token]) -> ModalResult<Ident> {
    ident_parser().parse_next(input).map_err(|_| cut_err())
}

pub(crate) fn is_ident(token: Option<&Token>) -> bool {
    matches!(
        token,
        Some(Token {
            kind: TokenKind::Ident,
            ..
        })
    )
}

/// Identifier with a contextual meaning, such as `record` or `permits`.
pub(crate) fn is_contextual(token: Option<&Token>, word: &str) -> bool {
    matches!(
        token,
        Some(Token {
            kind: TokenKind::Ident,
            lexeme,
            ..
        }) if lexeme == word
    )
}

pub(crate) fn advance(input: &mut &[Token]) -> Option<Token> {
    let token = input.first().cloned()?;
    *input = &input[1..];
    Some(token)
}

/// Index of the token closing the group opened by `input[0]`.
pub(crate) fn matching_close(input: &[Token], open: &str, close: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in input.iter().enumerate() {
        if token.kind != TokenKind::Symbol {
            continue;
        }
        if token.lexeme == open {
            depth += 1;
        } else if token.lexeme == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Span covering the tokens consumed between `before` and `after`.
pub(crate) fn consumed_span(before: &[Token], after: &[Token]) -> Span {
    let consumed = before.len() - after.len();
    match (before.first(), consumed) {
        (Some(first), 0) => Span::new(0, first.span.start as u32, first.span.start as u32),
        (Some(first), n) => Span::new(0, first.span.start as u32, before[n - 1].span.end as u32),
        (None, _) => Span::null(),
    }
}
