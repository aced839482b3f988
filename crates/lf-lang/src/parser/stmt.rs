use lf_core::ast::{
    Block, CatchClause, Expr, Ident, Stmt, StmtAssert, StmtDoWhile, StmtFor, StmtForEach, StmtIf,
    StmtKind, StmtLabeled, StmtLocalVar, StmtSwitch, StmtSynchronized, StmtTry, StmtWhile,
    SwitchCase, VarDeclarator,
};
use winnow::ModalResult;

use super::expr::{parse_expr, parse_expr_prec, parse_var_init};
use super::items::{parse_modifiers, parse_type_decl, starts_type_decl};
use super::types::{parse_dims, parse_type};
use super::winnow::{
    advance, consumed_span, cut_err, expect_ident, expect_keyword, expect_symbol, is_ident,
    match_keyword, match_symbol, matches_symbol, peek_keyword, peek_symbol,
};
use crate::lexer::{Keyword, Token, TokenKind};

pub(crate) fn parse_block(input: &mut &[Token]) -> ModalResult<Block> {
    let before = *input;
    expect_symbol(input, "{")?;
    let mut stmts = Vec::new();
    while !match_symbol(input, "}") {
        if input.is_empty() {
            return Err(cut_err());
        }
        stmts.push(parse_statement(input)?);
    }
    Ok(Block {
        stmts,
        span: consumed_span(before, input),
        dangling: Vec::new(),
    })
}

pub(crate) fn parse_statement(input: &mut &[Token]) -> ModalResult<Stmt> {
    let before = *input;
    let kind = parse_statement_kind(input)?;
    Ok(Stmt::new(kind, consumed_span(before, input)))
}

fn parse_statement_kind(input: &mut &[Token]) -> ModalResult<StmtKind> {
    let Some(token) = input.first() else {
        return Err(cut_err());
    };
    match &token.kind {
        TokenKind::Symbol if token.lexeme == "{" => return Ok(StmtKind::Block(parse_block(input)?)),
        TokenKind::Symbol if token.lexeme == ";" => {
            advance(input);
            return Ok(StmtKind::Empty);
        }
        TokenKind::Keyword(Keyword::If) => return parse_if(input),
        TokenKind::Keyword(Keyword::For) => return parse_for(input),
        TokenKind::Keyword(Keyword::While) => {
            advance(input);
            let cond = parse_paren_expr(input)?;
            let body = Box::new(parse_statement(input)?);
            return Ok(StmtKind::While(StmtWhile { cond, body }));
        }
        TokenKind::Keyword(Keyword::Do) => {
            advance(input);
            let body = Box::new(parse_statement(input)?);
            expect_keyword(input, Keyword::While)?;
            let cond = parse_paren_expr(input)?;
            expect_symbol(input, ";")?;
            return Ok(StmtKind::DoWhile(StmtDoWhile { body, cond }));
        }
        TokenKind::Keyword(Keyword::Try) => return parse_try(input),
        TokenKind::Keyword(Keyword::Switch) => return parse_switch(input),
        TokenKind::Keyword(Keyword::Return) => {
            advance(input);
            let value = if peek_symbol(input, ";") {
                None
            } else {
                Some(parse_expr(input)?)
            };
            expect_symbol(input, ";")?;
            return Ok(StmtKind::Return(value));
        }
        TokenKind::Keyword(Keyword::Break) | TokenKind::Keyword(Keyword::Continue) => {
            let is_break = token.kind == TokenKind::Keyword(Keyword::Break);
            advance(input);
            let label = if is_ident(input.first()) {
                Some(expect_ident(input)?)
            } else {
                None
            };
            expect_symbol(input, ";")?;
            return Ok(if is_break {
                StmtKind::Break(label)
            } else {
                StmtKind::Continue(label)
            });
        }
        TokenKind::Keyword(Keyword::Throw) => {
            advance(input);
            let expr = parse_expr(input)?;
            expect_symbol(input, ";")?;
            return Ok(StmtKind::Throw(expr));
        }
        TokenKind::Keyword(Keyword::Assert) => {
            advance(input);
            let cond = parse_expr(input)?;
            let message = if match_symbol(input, ":") {
                Some(parse_expr(input)?)
            } else {
                None
            };
            expect_symbol(input, ";")?;
            return Ok(StmtKind::Assert(StmtAssert { cond, message }));
        }
        TokenKind::Keyword(Keyword::Synchronized) if matches_symbol(input.get(1), "(") => {
            advance(input);
            let lock = parse_paren_expr(input)?;
            let body = parse_block(input)?;
            return Ok(StmtKind::Synchronized(StmtSynchronized { lock, body }));
        }
        TokenKind::Ident if matches_symbol(input.get(1), ":") => {
            let label = expect_ident(input)?;
            advance(input);
            let body = Box::new(parse_statement(input)?);
            return Ok(StmtKind::Labeled(StmtLabeled { label, body }));
        }
        _ => {}
    }
    if starts_type_decl(input) {
        return Ok(StmtKind::LocalClass(parse_type_decl(input)?));
    }
    if starts_local_var(input) {
        let local = parse_local_var(input)?;
        expect_symbol(input, ";")?;
        return Ok(StmtKind::LocalVar(local));
    }
    let expr = parse_expr(input)?;
    expect_symbol(input, ";")?;
    Ok(StmtKind::Expr(expr))
}

fn parse_paren_expr(input: &mut &[Token]) -> ModalResult<Expr> {
    expect_symbol(input, "(")?;
    let expr = parse_expr(input)?;
    expect_symbol(input, ")")?;
    Ok(expr)
}

/// A local declaration starts with a modifier, or with a type followed by
/// a name and one of `= ; , [ :`.
pub(crate) fn starts_local_var(input: &[Token]) -> bool {
    if peek_keyword(input, Keyword::Final) || peek_symbol(input, "@") {
        return true;
    }
    let mut lookahead = input;
    if parse_type(&mut lookahead).is_err() || !is_ident(lookahead.first()) {
        return false;
    }
    ["=", ";", ",", "[", ":"]
        .iter()
        .any(|sym| matches_symbol(lookahead.get(1), sym))
}

pub(crate) fn parse_local_var(input: &mut &[Token]) -> ModalResult<StmtLocalVar> {
    let modifiers = parse_modifiers(input)?;
    let ty = parse_type(input).map_err(|_| cut_err())?;
    let first = expect_ident(input)?;
    let declarators = parse_declarators_from(input, first)?;
    Ok(StmtLocalVar {
        modifiers,
        ty,
        declarators,
    })
}

/// Declarators after the first name has been read: `a[] = x, b, c = y`.
pub(crate) fn parse_declarators_from(
    input: &mut &[Token],
    first: Ident,
) -> ModalResult<Vec<VarDeclarator>> {
    let mut declarators = Vec::new();
    let mut name = first;
    loop {
        let dims = parse_dims(input);
        let init = if match_symbol(input, "=") {
            Some(parse_var_init(input)?)
        } else {
            None
        };
        declarators.push(VarDeclarator { name, dims, init });
        if !match_symbol(input, ",") {
            return Ok(declarators);
        }
        name = expect_ident(input)?;
    }
}

fn parse_if(input: &mut &[Token]) -> ModalResult<StmtKind> {
    expect_keyword(input, Keyword::If)?;
    let cond = parse_paren_expr(input)?;
    let then = Box::new(parse_statement(input)?);
    let otherwise = if match_keyword(input, Keyword::Else) {
        Some(Box::new(parse_statement(input)?))
    } else {
        None
    };
    Ok(StmtKind::If(StmtIf {
        cond,
        then,
        otherwise,
    }))
}

fn parse_for(input: &mut &[Token]) -> ModalResult<StmtKind> {
    expect_keyword(input, Keyword::For)?;
    expect_symbol(input, "(")?;
    let mut init = Vec::new();
    if starts_local_var(input) {
        let before = *input;
        let modifiers = parse_modifiers(input)?;
        let ty = parse_type(input).map_err(|_| cut_err())?;
        let name = expect_ident(input)?;
        if match_symbol(input, ":") {
            let iterable = parse_expr(input)?;
            expect_symbol(input, ")")?;
            let body = Box::new(parse_statement(input)?);
            return Ok(StmtKind::ForEach(StmtForEach {
                modifiers,
                ty,
                name,
                iterable,
                body,
            }));
        }
        let declarators = parse_declarators_from(input, name)?;
        let local = StmtKind::LocalVar(StmtLocalVar {
            modifiers,
            ty,
            declarators,
        });
        init.push(Stmt::new(local, consumed_span(before, input)));
    } else if !peek_symbol(input, ";") {
        loop {
            let before = *input;
            let expr = parse_expr(input)?;
            init.push(Stmt::new(StmtKind::Expr(expr), consumed_span(before, input)));
            if !match_symbol(input, ",") {
                break;
            }
        }
    }
    expect_symbol(input, ";")?;
    let cond = if peek_symbol(input, ";") {
        None
    } else {
        Some(parse_expr(input)?)
    };
    expect_symbol(input, ";")?;
    let mut update = Vec::new();
    if !peek_symbol(input, ")") {
        loop {
            update.push(parse_expr(input)?);
            if !match_symbol(input, ",") {
                break;
            }
        }
    }
    expect_symbol(input, ")")?;
    let body = Box::new(parse_statement(input)?);
    Ok(StmtKind::For(StmtFor {
        init,
        cond,
        update,
        body,
    }))
}

fn parse_try(input: &mut &[Token]) -> ModalResult<StmtKind> {
    expect_keyword(input, Keyword::Try)?;
    let mut resources = Vec::new();
    if match_symbol(input, "(") {
        while !match_symbol(input, ")") {
            let before = *input;
            let kind = if starts_local_var(input) {
                StmtKind::LocalVar(parse_local_var(input)?)
            } else {
                StmtKind::Expr(parse_expr(input)?)
            };
            resources.push(Stmt::new(kind, consumed_span(before, input)));
            if !match_symbol(input, ";") {
                expect_symbol(input, ")")?;
                break;
            }
        }
    }
    let body = parse_block(input)?;
    let mut catches = Vec::new();
    while match_keyword(input, Keyword::Catch) {
        expect_symbol(input, "(")?;
        let modifiers = parse_modifiers(input)?;
        let mut types = vec![parse_type(input).map_err(|_| cut_err())?];
        while match_symbol(input, "|") {
            types.push(parse_type(input).map_err(|_| cut_err())?);
        }
        let name = expect_ident(input)?;
        expect_symbol(input, ")")?;
        let body = parse_block(input)?;
        catches.push(CatchClause {
            modifiers,
            types,
            name,
            body,
        });
    }
    let finally = if match_keyword(input, Keyword::Finally) {
        Some(parse_block(input)?)
    } else {
        None
    };
    if catches.is_empty() && finally.is_none() && resources.is_empty() {
        return Err(cut_err());
    }
    Ok(StmtKind::Try(StmtTry {
        resources,
        body,
        catches,
        finally,
    }))
}

fn parse_switch(input: &mut &[Token]) -> ModalResult<StmtKind> {
    expect_keyword(input, Keyword::Switch)?;
    let selector = parse_paren_expr(input)?;
    expect_symbol(input, "{")?;
    let mut cases = Vec::new();
    while !match_symbol(input, "}") {
        let labels = if match_keyword(input, Keyword::Default) {
            Vec::new()
        } else {
            expect_keyword(input, Keyword::Case)?;
            parse_case_labels(input)?
        };
        let arrow = if match_symbol(input, "->") {
            true
        } else {
            expect_symbol(input, ":")?;
            false
        };
        let mut body = Vec::new();
        if arrow {
            body.push(parse_statement(input)?);
        } else {
            while !peek_keyword(input, Keyword::Case)
                && !peek_keyword(input, Keyword::Default)
                && !peek_symbol(input, "}")
            {
                if input.is_empty() {
                    return Err(cut_err());
                }
                body.push(parse_statement(input)?);
            }
        }
        cases.push(SwitchCase {
            labels,
            arrow,
            body,
        });
    }
    Ok(StmtKind::Switch(StmtSwitch { selector, cases }))
}

/// Case labels stop before `->`, which must not start a lambda.
fn parse_case_labels(input: &mut &[Token]) -> ModalResult<Vec<Expr>> {
    let mut labels = Vec::new();
    loop {
        let bare_name = is_ident(input.first())
            && ["->", ",", ":"]
                .iter()
                .any(|sym| matches_symbol(input.get(1), sym));
        if bare_name {
            labels.push(Expr::name(expect_ident(input)?));
        } else {
            labels.push(parse_expr_prec(input, 3)?);
        }
        if !match_symbol(input, ",") {
            return Ok(labels);
        }
    }
}
