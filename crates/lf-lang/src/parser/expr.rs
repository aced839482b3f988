use lf_core::ast::{
    Expr, ExprCall, ExprConditional, ExprIndex, ExprInstanceOf, ExprKind, ExprLambda, ExprNew,
    ExprNewArray, Ident, LambdaBody, LambdaParam, LitKind, PrimitiveKind, TypeRef,
};
use lf_core::ops::{AssignOp, BinOpKind, UnOpKind};
use winnow::ModalResult;

use super::items::{parse_class_body, parse_modifiers};
use super::stmt::parse_block;
use super::types::{parse_dims, parse_type, parse_type_args, parse_type_no_dims};
use super::winnow::{
    advance, cut_err, expect_ident, expect_symbol, is_ident, match_keyword, match_symbol,
    matches_symbol, matching_close, peek_keyword, peek_symbol,
};
use crate::lexer::winnow::backtrack_err;
use crate::lexer::{Keyword, Token, TokenKind};

#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Assign(AssignOp),
    Bin(BinOpKind),
}

const CONDITIONAL_PREC: u8 = 2;
const RELATIONAL_PREC: u8 = 9;

pub(crate) fn parse_expr(input: &mut &[Token]) -> ModalResult<Expr> {
    parse_expr_prec(input, 0)
}

pub(crate) fn parse_expr_prec(input: &mut &[Token], min_prec: u8) -> ModalResult<Expr> {
    let mut left = parse_unary(input)?;
    loop {
        if peek_symbol(input, "?") {
            if CONDITIONAL_PREC < min_prec {
                break;
            }
            advance(input);
            let then = parse_expr(input)?;
            expect_symbol(input, ":")?;
            let otherwise = parse_expr_prec(input, CONDITIONAL_PREC)?;
            left = ExprKind::Conditional(ExprConditional {
                cond: left,
                then,
                otherwise,
            })
            .into();
            continue;
        }
        if peek_keyword(input, Keyword::InstanceOf) {
            if RELATIONAL_PREC < min_prec {
                break;
            }
            advance(input);
            match_keyword(input, Keyword::Final);
            let ty = parse_type(input).map_err(|_| cut_err())?;
            let binding = if is_ident(input.first()) {
                Some(expect_ident(input)?)
            } else {
                None
            };
            left = ExprKind::InstanceOf(ExprInstanceOf {
                expr: left,
                ty,
                binding,
            })
            .into();
            continue;
        }
        let Some((prec, op, width)) = peek_binop(input) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        *input = &input[width..];
        left = match op {
            BinaryOp::Assign(op) => {
                let value = parse_expr_prec(input, prec)?;
                Expr::assign(op, left, value)
            }
            BinaryOp::Bin(kind) => {
                let rhs = parse_expr_prec(input, prec + 1)?;
                Expr::binary(kind, left, rhs)
            }
        };
    }
    Ok(left)
}

fn peek_binop(input: &[Token]) -> Option<(u8, BinaryOp, usize)> {
    let token = input.first()?;
    if token.kind != TokenKind::Symbol {
        return None;
    }
    let (op, width) = if token.lexeme == ">" {
        let (text, width) = gt_run(input);
        let op = match text.as_str() {
            ">" => BinaryOp::Bin(BinOpKind::Gt),
            ">=" => BinaryOp::Bin(BinOpKind::Ge),
            ">>" => BinaryOp::Bin(BinOpKind::Shr),
            ">>>" => BinaryOp::Bin(BinOpKind::UShr),
            other => BinaryOp::Assign(AssignOp::from_symbol(other)?),
        };
        (op, width)
    } else if let Some(op) = AssignOp::from_symbol(&token.lexeme) {
        (BinaryOp::Assign(op), 1)
    } else {
        let kind = match token.lexeme.as_str() {
            "||" => BinOpKind::Or,
            "&&" => BinOpKind::And,
            "|" => BinOpKind::BitOr,
            "^" => BinOpKind::BitXor,
            "&" => BinOpKind::BitAnd,
            "==" => BinOpKind::Eq,
            "!=" => BinOpKind::Ne,
            "<" => BinOpKind::Lt,
            "<=" => BinOpKind::Le,
            "<<" => BinOpKind::Shl,
            "+" => BinOpKind::Add,
            "-" => BinOpKind::Sub,
            "*" => BinOpKind::Mul,
            "/" => BinOpKind::Div,
            "%" => BinOpKind::Rem,
            _ => return None,
        };
        (BinaryOp::Bin(kind), 1)
    };
    let prec = match op {
        BinaryOp::Assign(_) => 1,
        BinaryOp::Bin(kind) => kind.precedence(),
    };
    Some((prec, op, width))
}

/// Reassemble `>=`, `>>`, `>>>`, `>>=` and `>>>=` from adjacent tokens.
fn gt_run(input: &[Token]) -> (String, usize) {
    let mut text = String::new();
    let mut width = 0;
    let mut end = input.first().map_or(0, |t| t.span.start);
    for token in input {
        if token.kind != TokenKind::Symbol || token.span.start != end {
            break;
        }
        let fits = match token.lexeme.as_str() {
            ">" => text.len() < 3 && !text.ends_with('='),
            "=" => !text.is_empty() && !text.ends_with('='),
            _ => false,
        };
        if !fits {
            break;
        }
        text.push_str(&token.lexeme);
        width += 1;
        end = token.span.end;
    }
    (text, width)
}

fn prefix_op(token: Option<&Token>) -> Option<UnOpKind> {
    let token = token?;
    if token.kind != TokenKind::Symbol {
        return None;
    }
    Some(match token.lexeme.as_str() {
        "++" => UnOpKind::PreInc,
        "--" => UnOpKind::PreDec,
        "+" => UnOpKind::Plus,
        "-" => UnOpKind::Neg,
        "!" => UnOpKind::Not,
        "~" => UnOpKind::BitNot,
        _ => return None,
    })
}

fn parse_unary(input: &mut &[Token]) -> ModalResult<Expr> {
    if let Some(op) = prefix_op(input.first()) {
        advance(input);
        let operand = parse_unary(input)?;
        return Ok(Expr::unary(op, operand));
    }
    if is_lambda_start(input) {
        return parse_lambda(input);
    }
    if peek_symbol(input, "(") {
        if let Some(cast) = try_parse_cast(input)? {
            return Ok(cast);
        }
    }
    let primary = parse_primary(input)?;
    parse_postfix(input, primary)
}

fn is_lambda_start(input: &[Token]) -> bool {
    if is_ident(input.first()) {
        return matches_symbol(input.get(1), "->");
    }
    if peek_symbol(input, "(") {
        return matching_close(input, "(", ")")
            .map_or(false, |close| matches_symbol(input.get(close + 1), "->"));
    }
    false
}

fn parse_lambda(input: &mut &[Token]) -> ModalResult<Expr> {
    let mut params = Vec::new();
    if is_ident(input.first()) {
        params.push(LambdaParam {
            name: expect_ident(input)?,
            ty: None,
        });
    } else {
        expect_symbol(input, "(")?;
        if !match_symbol(input, ")") {
            loop {
                params.push(parse_lambda_param(input)?);
                if match_symbol(input, ",") {
                    continue;
                }
                expect_symbol(input, ")")?;
                break;
            }
        }
    }
    expect_symbol(input, "->")?;
    let body = if peek_symbol(input, "{") {
        LambdaBody::Block(parse_block(input)?)
    } else {
        LambdaBody::Expr(parse_expr(input)?)
    };
    Ok(ExprKind::Lambda(ExprLambda { params, body }).into())
}

fn parse_lambda_param(input: &mut &[Token]) -> ModalResult<LambdaParam> {
    if is_ident(input.first())
        && (matches_symbol(input.get(1), ",") || matches_symbol(input.get(1), ")"))
    {
        return Ok(LambdaParam {
            name: expect_ident(input)?,
            ty: None,
        });
    }
    parse_modifiers(input)?;
    let mut ty = parse_type(input).map_err(|_| cut_err())?;
    if match_symbol(input, "...") {
        ty.dims += 1;
    }
    let name = expect_ident(input)?;
    ty.dims += parse_dims(input);
    Ok(LambdaParam { name, ty: Some(ty) })
}

/// `(Type) operand`. Reference-type casts need an operand that cannot
/// continue a parenthesized expression, so `(a) - b` stays a subtraction.
fn try_parse_cast(input: &mut &[Token]) -> ModalResult<Option<Expr>> {
    let mut lookahead = *input;
    advance(&mut lookahead);
    let Ok(ty) = parse_type(&mut lookahead) else {
        return Ok(None);
    };
    while match_symbol(&mut lookahead, "&") {
        if parse_type(&mut lookahead).is_err() {
            return Ok(None);
        }
    }
    if !match_symbol(&mut lookahead, ")") {
        return Ok(None);
    }
    let primitive = PrimitiveKind::from_keyword(&ty.name).is_some();
    if !primitive && !starts_cast_operand(lookahead.first()) {
        return Ok(None);
    }
    let operand = parse_unary(&mut lookahead)?;
    *input = lookahead;
    Ok(Some(Expr::cast(ty, operand)))
}

fn starts_cast_operand(token: Option<&Token>) -> bool {
    let Some(token) = token else {
        return false;
    };
    match &token.kind {
        TokenKind::Ident
        | TokenKind::Number
        | TokenKind::StringLiteral
        | TokenKind::TextBlock
        | TokenKind::CharLiteral => true,
        TokenKind::Keyword(k) => matches!(
            k,
            Keyword::This
                | Keyword::Super
                | Keyword::New
                | Keyword::True
                | Keyword::False
                | Keyword::Null
        ),
        TokenKind::Symbol => matches!(token.lexeme.as_str(), "(" | "!" | "~"),
    }
}

fn parse_primary(input: &mut &[Token]) -> ModalResult<Expr> {
    let Some(token) = input.first().cloned() else {
        return Err(backtrack_err());
    };
    match &token.kind {
        TokenKind::Number => {
            advance(input);
            Ok(Expr::literal(number_kind(&token.lexeme), token.lexeme))
        }
        TokenKind::StringLiteral => {
            advance(input);
            Ok(Expr::literal(LitKind::String, token.lexeme))
        }
        TokenKind::TextBlock => {
            advance(input);
            Ok(Expr::literal(LitKind::TextBlock, token.lexeme))
        }
        TokenKind::CharLiteral => {
            advance(input);
            Ok(Expr::literal(LitKind::Char, token.lexeme))
        }
        TokenKind::Keyword(Keyword::True) | TokenKind::Keyword(Keyword::False) => {
            advance(input);
            Ok(Expr::literal(LitKind::Bool, token.lexeme))
        }
        TokenKind::Keyword(Keyword::Null) => {
            advance(input);
            Ok(Expr::null())
        }
        TokenKind::Keyword(Keyword::This) | TokenKind::Keyword(Keyword::Super) => {
            advance(input);
            if peek_symbol(input, "(") {
                let args = parse_arguments(input)?;
                return Ok(Expr::call(None, token.lexeme.as_str(), args));
            }
            Ok(if token.kind == TokenKind::Keyword(Keyword::This) {
                ExprKind::This.into()
            } else {
                ExprKind::Super.into()
            })
        }
        TokenKind::Keyword(Keyword::New) => {
            advance(input);
            parse_new(input)
        }
        TokenKind::Keyword(k) if k.is_primitive_type() || *k == Keyword::Void => {
            let ty = parse_type(input)?;
            if match_symbol(input, ".") {
                if match_keyword(input, Keyword::Class) {
                    return Ok(ExprKind::ClassLit(ty).into());
                }
                return Err(cut_err());
            }
            if peek_symbol(input, "::") {
                return Ok(ExprKind::Type(ty).into());
            }
            Err(cut_err())
        }
        TokenKind::Symbol if token.lexeme == "(" => {
            advance(input);
            let inner = parse_expr(input)?;
            expect_symbol(input, ")")?;
            Ok(Expr::paren(inner))
        }
        TokenKind::Ident => {
            if matches_symbol(input.get(1), "<") {
                let mut lookahead = *input;
                if let Ok(ty) = parse_type(&mut lookahead) {
                    if peek_symbol(lookahead, "::") {
                        *input = lookahead;
                        return Ok(ExprKind::Type(ty).into());
                    }
                }
            }
            advance(input);
            if peek_symbol(input, "(") {
                let args = parse_arguments(input)?;
                return Ok(Expr::call(None, token.lexeme.as_str(), args));
            }
            Ok(Expr::name(token.lexeme.as_str()))
        }
        _ => Err(backtrack_err()),
    }
}

fn parse_postfix(input: &mut &[Token], mut expr: Expr) -> ModalResult<Expr> {
    loop {
        if match_symbol(input, ".") {
            if peek_symbol(input, "<") {
                let type_args = parse_type_args(input).map_err(|_| cut_err())?;
                let name = expect_ident(input)?;
                let args = parse_arguments(input)?;
                expr = ExprKind::MethodCall(ExprCall {
                    target: Some(expr),
                    type_args,
                    name,
                    args,
                })
                .into();
            } else if match_keyword(input, Keyword::Class) {
                let ty = expr_to_type(&expr).ok_or_else(cut_err)?;
                expr = ExprKind::ClassLit(ty).into();
            } else if match_keyword(input, Keyword::This) {
                expr = Expr::field(expr, "this");
            } else if match_keyword(input, Keyword::Super) {
                expr = Expr::field(expr, "super");
            } else {
                let name = expect_ident(input)?;
                expr = if peek_symbol(input, "(") {
                    let args = parse_arguments(input)?;
                    Expr::method(expr, name, args)
                } else {
                    Expr::field(expr, name)
                };
            }
        } else if peek_symbol(input, "[") {
            if matches_symbol(input.get(1), "]") {
                let mut ty = expr_to_type(&expr).ok_or_else(cut_err)?;
                ty.dims += parse_dims(input);
                if !peek_symbol(input, "::") && !peek_symbol(input, ".") {
                    return Err(cut_err());
                }
                expr = ExprKind::Type(ty).into();
                continue;
            }
            advance(input);
            let index = parse_expr(input)?;
            expect_symbol(input, "]")?;
            expr = ExprKind::Index(ExprIndex {
                target: expr,
                index,
            })
            .into();
        } else if match_symbol(input, "::") {
            let name = if match_keyword(input, Keyword::New) {
                Ident::new("new")
            } else {
                expect_ident(input)?
            };
            expr = Expr::method_ref(expr, name);
        } else if match_symbol(input, "++") {
            expr = Expr::unary(UnOpKind::PostInc, expr);
        } else if match_symbol(input, "--") {
            expr = Expr::unary(UnOpKind::PostDec, expr);
        } else {
            break;
        }
    }
    Ok(expr)
}

/// Read a dotted name expression back as a type, for `Foo.class` and
/// `Foo[]::new`.
fn expr_to_type(expr: &Expr) -> Option<TypeRef> {
    match expr.kind() {
        ExprKind::Name(name) => Some(TypeRef::named(name.as_str())),
        ExprKind::FieldAccess(field) => {
            let outer = expr_to_type(&field.target)?;
            Some(TypeRef::named(format!("{}.{}", outer.name, field.field)))
        }
        ExprKind::Type(ty) => Some(ty.clone()),
        _ => None,
    }
}

pub(crate) fn parse_arguments(input: &mut &[Token]) -> ModalResult<Vec<Expr>> {
    expect_symbol(input, "(")?;
    let mut args = Vec::new();
    if match_symbol(input, ")") {
        return Ok(args);
    }
    loop {
        args.push(parse_expr(input)?);
        if match_symbol(input, ",") {
            continue;
        }
        expect_symbol(input, ")")?;
        return Ok(args);
    }
}

/// Everything after `new`.
fn parse_new(input: &mut &[Token]) -> ModalResult<Expr> {
    let ty = parse_type_no_dims(input).map_err(|_| cut_err())?;
    if peek_symbol(input, "[") {
        let mut dims = Vec::new();
        while match_symbol(input, "[") {
            if match_symbol(input, "]") {
                dims.push(None);
            } else {
                dims.push(Some(parse_expr(input)?));
                expect_symbol(input, "]")?;
            }
        }
        let init = if peek_symbol(input, "{") {
            Some(parse_array_init(input)?)
        } else {
            None
        };
        return Ok(ExprKind::NewArray(ExprNewArray { ty, dims, init }).into());
    }
    let args = parse_arguments(input)?;
    let body = if peek_symbol(input, "{") {
        Some(parse_class_body(input)?)
    } else {
        None
    };
    Ok(ExprKind::New(ExprNew { ty, args, body }).into())
}

/// `{a, b, {c}}` with an optional trailing comma.
pub(crate) fn parse_array_init(input: &mut &[Token]) -> ModalResult<Vec<Expr>> {
    expect_symbol(input, "{")?;
    let mut items = Vec::new();
    loop {
        if match_symbol(input, "}") {
            return Ok(items);
        }
        items.push(parse_var_init(input)?);
        if !match_symbol(input, ",") {
            expect_symbol(input, "}")?;
            return Ok(items);
        }
    }
}

/// Initializer of a variable: an expression or a bare array initializer.
pub(crate) fn parse_var_init(input: &mut &[Token]) -> ModalResult<Expr> {
    if peek_symbol(input, "{") {
        return Ok(ExprKind::ArrayInit(parse_array_init(input)?).into());
    }
    parse_expr(input)
}

fn number_kind(text: &str) -> LitKind {
    let lower = text.to_ascii_lowercase();
    if lower.ends_with('l') {
        return LitKind::Long;
    }
    if lower.starts_with("0x") || lower.starts_with("0b") {
        return LitKind::Int;
    }
    if lower.ends_with('f') {
        LitKind::Float
    } else if lower.ends_with('d') || lower.contains('.') || lower.contains('e') {
        LitKind::Double
    } else {
        LitKind::Int
    }
}
