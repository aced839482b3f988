use lf_core::ast::{
    Annotation, CompilationUnit, EnumConstant, Expr, FieldDecl, Import, Initializer, Member,
    MethodDecl, Modifiers, Param, TypeDecl, TypeDeclKind, TypeRef,
};
use lf_core::ops::AssignOp;
use winnow::ModalResult;

use super::expr::{parse_arguments, parse_var_init};
use super::stmt::{parse_block, parse_declarators_from};
use super::types::{parse_dims, parse_type, parse_type_params_text};
use super::winnow::{
    advance, consumed_span, cut_err, expect_ident, expect_keyword, expect_symbol, is_contextual,
    is_ident, match_keyword, match_symbol, matches_symbol, peek_keyword, peek_symbol,
};
use crate::lexer::{Keyword, Token, TokenKind};

pub(crate) fn parse_compilation_unit(input: &mut &[Token]) -> ModalResult<CompilationUnit> {
    let mut unit = CompilationUnit::default();

    let mut lookahead = *input;
    parse_modifiers(&mut lookahead)?;
    if peek_keyword(lookahead, Keyword::Package) {
        *input = lookahead;
        let before = *input;
        advance(input);
        unit.package = Some(parse_qualified_name(input)?);
        expect_symbol(input, ";")?;
        unit.package_span = Some(consumed_span(before, input));
    }

    while peek_keyword(input, Keyword::Import) {
        let before = *input;
        advance(input);
        let is_static = match_keyword(input, Keyword::Static);
        let path = parse_qualified_name(input)?;
        expect_symbol(input, ";")?;
        unit.imports.push(Import {
            path,
            is_static,
            span: consumed_span(before, input),
        });
    }

    while !input.is_empty() {
        if match_symbol(input, ";") {
            continue;
        }
        unit.types.push(parse_type_decl(input)?);
    }
    Ok(unit)
}

/// `a.b.C`, also accepting a trailing `.*` for imports.
fn parse_qualified_name(input: &mut &[Token]) -> ModalResult<String> {
    let mut name = expect_ident(input)?.to_string();
    while match_symbol(input, ".") {
        name.push('.');
        if match_symbol(input, "*") {
            name.push('*');
            break;
        }
        name.push_str(expect_ident(input)?.as_str());
    }
    Ok(name)
}

pub(crate) fn parse_modifiers(input: &mut &[Token]) -> ModalResult<Modifiers> {
    let mut modifiers = Modifiers::default();
    loop {
        if peek_symbol(input, "@") && !matches!(input.get(1), Some(t) if t.kind == TokenKind::Keyword(Keyword::Interface))
        {
            modifiers.annotations.push(parse_annotation(input)?);
            continue;
        }
        let Some(token) = input.first() else {
            break;
        };
        match &token.kind {
            TokenKind::Keyword(k) if k.is_modifier() => {
                // `default:` and `default ->` belong to a switch.
                if *k == Keyword::Default
                    && (matches_symbol(input.get(1), ":") || matches_symbol(input.get(1), "->"))
                {
                    break;
                }
                modifiers.keywords.push(token.lexeme.clone());
                advance(input);
            }
            TokenKind::Ident if token.lexeme == "sealed" && starts_after_modifier(&input[1..]) => {
                modifiers.keywords.push("sealed".to_string());
                advance(input);
            }
            TokenKind::Ident
                if token.lexeme == "non"
                    && matches_symbol(input.get(1), "-")
                    && is_contextual(input.get(2), "sealed") =>
            {
                modifiers.keywords.push("non-sealed".to_string());
                *input = &input[3..];
            }
            _ => break,
        }
    }
    Ok(modifiers)
}

fn starts_after_modifier(input: &[Token]) -> bool {
    match input.first().map(|t| &t.kind) {
        Some(TokenKind::Keyword(k)) => {
            k.is_modifier() || matches!(k, Keyword::Class | Keyword::Interface)
        }
        Some(TokenKind::Ident) => true,
        _ => peek_symbol(input, "@"),
    }
}

pub(crate) fn parse_annotation(input: &mut &[Token]) -> ModalResult<Annotation> {
    expect_symbol(input, "@")?;
    let name = parse_qualified_name(input)?;
    let mut args = Vec::new();
    if match_symbol(input, "(") {
        while !match_symbol(input, ")") {
            if is_ident(input.first()) && matches_symbol(input.get(1), "=") {
                let key = expect_ident(input)?;
                advance(input);
                let value = parse_element_value(input)?;
                args.push(Expr::assign(AssignOp::Assign, Expr::name(key), value));
            } else {
                args.push(parse_element_value(input)?);
            }
            if !match_symbol(input, ",") {
                expect_symbol(input, ")")?;
                break;
            }
        }
    }
    Ok(Annotation { name, args })
}

fn parse_element_value(input: &mut &[Token]) -> ModalResult<Expr> {
    if peek_symbol(input, "@") {
        let nested = parse_annotation(input)?;
        return Ok(Expr::name(format!("@{}", nested.name)));
    }
    parse_var_init(input)
}

/// Whether a type declaration, possibly behind modifiers, starts here.
pub(crate) fn starts_type_decl(input: &[Token]) -> bool {
    let mut lookahead = input;
    if parse_modifiers(&mut lookahead).is_err() {
        return false;
    }
    match lookahead.first().map(|t| &t.kind) {
        Some(TokenKind::Keyword(Keyword::Class))
        | Some(TokenKind::Keyword(Keyword::Interface))
        | Some(TokenKind::Keyword(Keyword::Enum)) => true,
        Some(TokenKind::Symbol) => {
            peek_symbol(lookahead, "@")
                && matches!(lookahead.get(1), Some(t) if t.kind == TokenKind::Keyword(Keyword::Interface))
        }
        Some(TokenKind::Ident) => {
            is_contextual(lookahead.first(), "record")
                && is_ident(lookahead.get(1))
                && (matches_symbol(lookahead.get(2), "(") || matches_symbol(lookahead.get(2), "<"))
        }
        _ => false,
    }
}

pub(crate) fn parse_type_decl(input: &mut &[Token]) -> ModalResult<TypeDecl> {
    let before = *input;
    let modifiers = parse_modifiers(input)?;
    let kind = if match_keyword(input, Keyword::Class) {
        TypeDeclKind::Class
    } else if match_keyword(input, Keyword::Interface) {
        TypeDeclKind::Interface
    } else if match_keyword(input, Keyword::Enum) {
        TypeDeclKind::Enum
    } else if match_symbol(input, "@") {
        expect_keyword(input, Keyword::Interface)?;
        TypeDeclKind::Annotation
    } else if is_contextual(input.first(), "record") {
        advance(input);
        TypeDeclKind::Record
    } else {
        return Err(cut_err());
    };
    let name = expect_ident(input)?;
    let type_params = if peek_symbol(input, "<") {
        Some(parse_type_params_text(input)?)
    } else {
        None
    };
    let record_components = if kind == TypeDeclKind::Record {
        parse_params(input)?
    } else {
        Vec::new()
    };
    let extends = if match_keyword(input, Keyword::Extends) {
        parse_type_list(input)?
    } else {
        Vec::new()
    };
    let implements = if match_keyword(input, Keyword::Implements) {
        parse_type_list(input)?
    } else {
        Vec::new()
    };
    if is_contextual(input.first(), "permits") {
        advance(input);
        parse_type_list(input)?;
    }

    expect_symbol(input, "{")?;
    let enum_constants = if kind == TypeDeclKind::Enum {
        parse_enum_constants(input)?
    } else {
        Vec::new()
    };
    let members = parse_members(input, name.as_str())?;
    Ok(TypeDecl {
        kind,
        modifiers,
        name,
        type_params,
        extends,
        implements,
        record_components,
        enum_constants,
        members,
        span: consumed_span(before, input),
    })
}

fn parse_type_list(input: &mut &[Token]) -> ModalResult<Vec<TypeRef>> {
    let mut types = vec![parse_type(input).map_err(|_| cut_err())?];
    while match_symbol(input, ",") {
        types.push(parse_type(input).map_err(|_| cut_err())?);
    }
    Ok(types)
}

fn parse_enum_constants(input: &mut &[Token]) -> ModalResult<Vec<EnumConstant>> {
    let mut constants = Vec::new();
    loop {
        if match_symbol(input, ";") || peek_symbol(input, "}") {
            return Ok(constants);
        }
        parse_modifiers(input)?;
        let name = expect_ident(input)?;
        let args = if peek_symbol(input, "(") {
            Some(parse_arguments(input)?)
        } else {
            None
        };
        let body = if peek_symbol(input, "{") {
            Some(parse_class_body(input)?)
        } else {
            None
        };
        constants.push(EnumConstant { name, args, body });
        if match_symbol(input, ",") {
            continue;
        }
        if match_symbol(input, ";") || peek_symbol(input, "}") {
            return Ok(constants);
        }
        return Err(cut_err());
    }
}

/// `{ members }` of an anonymous class or enum constant.
pub(crate) fn parse_class_body(input: &mut &[Token]) -> ModalResult<Vec<Member>> {
    expect_symbol(input, "{")?;
    parse_members(input, "")
}

/// Members up to and including the closing brace.
fn parse_members(input: &mut &[Token], class_name: &str) -> ModalResult<Vec<Member>> {
    let mut members = Vec::new();
    while !match_symbol(input, "}") {
        if input.is_empty() {
            return Err(cut_err());
        }
        if let Some(member) = parse_member(input, class_name)? {
            members.push(member);
        }
    }
    Ok(members)
}

fn parse_member(input: &mut &[Token], class_name: &str) -> ModalResult<Option<Member>> {
    if match_symbol(input, ";") {
        return Ok(None);
    }
    if peek_symbol(input, "{") {
        let body = parse_block(input)?;
        return Ok(Some(Member::Initializer(Initializer {
            is_static: false,
            body,
        })));
    }
    if peek_keyword(input, Keyword::Static) && matches_symbol(input.get(1), "{") {
        advance(input);
        let body = parse_block(input)?;
        return Ok(Some(Member::Initializer(Initializer {
            is_static: true,
            body,
        })));
    }
    if starts_type_decl(input) {
        return Ok(Some(Member::Type(parse_type_decl(input)?)));
    }

    let before = *input;
    let modifiers = parse_modifiers(input)?;
    let type_params = if peek_symbol(input, "<") {
        Some(parse_type_params_text(input)?)
    } else {
        None
    };

    let is_constructor = is_contextual(input.first(), class_name)
        && (matches_symbol(input.get(1), "(") || matches_symbol(input.get(1), "{"));
    if is_constructor {
        let name = expect_ident(input)?;
        // Compact canonical constructors of records have no parameter list.
        let params = if peek_symbol(input, "(") {
            parse_params(input)?
        } else {
            Vec::new()
        };
        let throws = parse_throws(input)?;
        let body = Some(parse_block(input)?);
        return Ok(Some(Member::Constructor(MethodDecl {
            modifiers,
            type_params,
            ret: None,
            name,
            params,
            throws,
            body,
            span: consumed_span(before, input),
        })));
    }

    let ty = parse_type(input).map_err(|_| cut_err())?;
    let name = expect_ident(input)?;
    if peek_symbol(input, "(") {
        let params = parse_params(input)?;
        let mut ret = ty;
        ret.dims += parse_dims(input);
        let throws = parse_throws(input)?;
        let body = if peek_symbol(input, "{") {
            Some(parse_block(input)?)
        } else {
            if match_keyword(input, Keyword::Default) {
                parse_element_value(input)?;
            }
            expect_symbol(input, ";")?;
            None
        };
        return Ok(Some(Member::Method(MethodDecl {
            modifiers,
            type_params,
            ret: Some(ret),
            name,
            params,
            throws,
            body,
            span: consumed_span(before, input),
        })));
    }

    let declarators = parse_declarators_from(input, name)?;
    expect_symbol(input, ";")?;
    Ok(Some(Member::Field(FieldDecl {
        modifiers,
        ty,
        declarators,
        span: consumed_span(before, input),
    })))
}

fn parse_throws(input: &mut &[Token]) -> ModalResult<Vec<TypeRef>> {
    if match_keyword(input, Keyword::Throws) {
        parse_type_list(input)
    } else {
        Ok(Vec::new())
    }
}

pub(crate) fn parse_params(input: &mut &[Token]) -> ModalResult<Vec<Param>> {
    expect_symbol(input, "(")?;
    let mut params = Vec::new();
    if match_symbol(input, ")") {
        return Ok(params);
    }
    loop {
        let modifiers = parse_modifiers(input)?;
        let mut ty = parse_type(input).map_err(|_| cut_err())?;
        let varargs = match_symbol(input, "...");
        // Receiver parameters, `Foo this`, carry no binding.
        if match_keyword(input, Keyword::This) {
            if !match_symbol(input, ",") {
                expect_symbol(input, ")")?;
                return Ok(params);
            }
            continue;
        }
        let name = expect_ident(input)?;
        ty.dims += parse_dims(input);
        params.push(Param {
            modifiers,
            ty,
            name,
            varargs,
        });
        if !match_symbol(input, ",") {
            expect_symbol(input, ")")?;
            return Ok(params);
        }
    }
}
