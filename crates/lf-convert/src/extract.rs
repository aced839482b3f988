//! Loop extractor: classify one loop statement into a [`LoopModel`].

use lf_core::ast::{
    Expr, ExprKind, Ident, PrimitiveKind, Stmt, StmtFor, StmtKind, StmtLocalVar, TypeRef,
};
use lf_core::ops::{AssignOp, BinOpKind};
use lf_core::scope::TypeResolver;

use crate::model::{ElementBinding, IndexedTarget, LoopKind, LoopModel, LoopSite, SourceKind};
use crate::preconditions::{Rejection, RejectionReason};
use crate::queries::{find_mutation, references_in_stmts, usage_in_stmts};

type Extracted<'s> = Result<LoopModel<'s>, Rejection>;

fn unsupported(detail: impl Into<String>) -> Rejection {
    Rejection::new(RejectionReason::UnsupportedLoopShape, detail)
}

pub fn extract_loop<'s>(
    stmt: &Stmt,
    site: &'s LoopSite,
    resolver: &dyn TypeResolver,
) -> Extracted<'s> {
    match &stmt.kind {
        StmtKind::ForEach(_) => extract_for_each(stmt, site, resolver),
        StmtKind::For(stmt_for) => {
            if stmt_for.cond.as_ref().map_or(false, |cond| has_next_target(cond).is_some()) {
                extract_iterator_for(stmt, stmt_for, site, resolver)
            } else {
                extract_indexed(stmt, stmt_for, site, resolver)
            }
        }
        StmtKind::While(_) => extract_iterator_while(stmt, site, resolver),
        StmtKind::DoWhile(_) => Err(unsupported("do/while loop")),
        StmtKind::Labeled(_) => Err(unsupported("labeled loop")),
        _ => Err(unsupported("not a loop")),
    }
}

fn body_of(stmt: &Stmt) -> (Vec<Stmt>, Vec<lf_core::ast::Comment>) {
    match &stmt.kind {
        StmtKind::Block(block) => (block.stmts.clone(), block.dangling.clone()),
        StmtKind::Empty => (Vec::new(), Vec::new()),
        _ => (vec![stmt.clone()], Vec::new()),
    }
}

/// Arrays only have stream adapters for `int`, `long`, `double` and
/// reference elements.
fn check_array_element(element: Option<&TypeRef>) -> Result<(), Rejection> {
    match element.and_then(TypeRef::as_primitive) {
        None | Some(PrimitiveKind::Int | PrimitiveKind::Long | PrimitiveKind::Double) => Ok(()),
        Some(kind) => Err(unsupported(format!("no stream adapter for {}[]", kind.keyword()))),
    }
}

fn extract_for_each<'s>(stmt: &Stmt, site: &'s LoopSite, resolver: &dyn TypeResolver) -> Extracted<'s> {
    let StmtKind::ForEach(for_each) = &stmt.kind else {
        return Err(unsupported("not an enhanced for"));
    };
    let source_type = resolver.type_of(&for_each.iterable);
    let source_kind = SourceKind::of_type(source_type.as_ref());
    let declared = (!for_each.ty.is_inferred()).then(|| for_each.ty.clone());
    let element_type = declared.or_else(|| source_type.as_ref().and_then(TypeRef::element_type));
    if source_kind == SourceKind::Array {
        let array_element = source_type.as_ref().and_then(TypeRef::element_type);
        check_array_element(array_element.as_ref())?;
    }
    let (body, body_comments) = body_of(&for_each.body);
    Ok(LoopModel {
        kind: LoopKind::ElementForEach,
        binding: ElementBinding {
            name: for_each.name.clone(),
            ty: element_type,
        },
        source: for_each.iterable.clone(),
        source_kind,
        source_type,
        body,
        body_comments,
        indexed: None,
        iterator: None,
        consumed_before: 0,
        site,
        span: stmt.span,
    })
}

/// `t.length` or `t.size()`, giving `t` and whether it is an array.
fn size_query(bound: &Expr) -> Option<(&Expr, bool)> {
    match bound.strip_parens().kind() {
        ExprKind::FieldAccess(field) if field.field == "length" => Some((&field.target, true)),
        ExprKind::MethodCall(call) if call.name == "size" && call.args.is_empty() => {
            call.target.as_ref().map(|target| (target, false))
        }
        _ => None,
    }
}

fn is_zero(expr: &Expr) -> bool {
    expr.strip_parens()
        .as_literal()
        .map_or(false, |lit| lit.text == "0")
}

/// `i++`, `++i` or `i += 1`.
fn is_unit_increment(update: &Expr, counter: &Ident) -> bool {
    match update.kind() {
        ExprKind::Unary(unary) => {
            unary.op.is_increment() && unary.expr.strip_parens().is_name(counter.as_str())
        }
        ExprKind::Assign(assign) => {
            assign.op == AssignOp::Add
                && assign.target.strip_parens().is_name(counter.as_str())
                && assign.value.as_literal().map_or(false, |lit| lit.text == "1")
        }
        _ => false,
    }
}

fn extract_indexed<'s>(
    stmt: &Stmt,
    stmt_for: &StmtFor,
    site: &'s LoopSite,
    resolver: &dyn TypeResolver,
) -> Extracted<'s> {
    let [init] = stmt_for.init.as_slice() else {
        return Err(unsupported("counting loop without a single counter"));
    };
    let StmtKind::LocalVar(local) = &init.kind else {
        return Err(unsupported("counter is not declared in the loop header"));
    };
    let Some(counter) = local.single() else {
        return Err(unsupported("counting loop declares several variables"));
    };
    if local.ty.as_primitive() != Some(PrimitiveKind::Int) || !counter.init.as_ref().map_or(false, is_zero) {
        return Err(unsupported("counter does not start at int 0"));
    }
    let [update] = stmt_for.update.as_slice() else {
        return Err(unsupported("counting loop without a single update"));
    };
    if !is_unit_increment(update, &counter.name) {
        return Err(unsupported("counter update is not an increment by one"));
    }
    let Some(ExprKind::Binary(cond)) = stmt_for.cond.as_ref().map(|cond| cond.strip_parens().kind())
    else {
        return Err(unsupported("counting loop without a comparison"));
    };
    if cond.op != BinOpKind::Lt || !cond.lhs.strip_parens().is_name(counter.name.as_str()) {
        return Err(unsupported("loop condition is not `i < bound`"));
    }
    let Some((target, is_array)) = size_query(&cond.rhs) else {
        return Err(unsupported("bound is not the indexed target's size or length"));
    };
    let (body, body_comments) = body_of(&stmt_for.body);
    Ok(LoopModel {
        kind: LoopKind::IndexedCounter,
        binding: ElementBinding {
            name: counter.name.clone(),
            ty: Some(TypeRef::primitive(PrimitiveKind::Int)),
        },
        source: cond.rhs.clone(),
        source_kind: SourceKind::Range,
        source_type: resolver.type_of(target),
        body,
        body_comments,
        indexed: Some(IndexedTarget {
            target: target.clone(),
            is_array,
        }),
        iterator: None,
        consumed_before: 0,
        site,
        span: stmt.span,
    })
}

/// `it` in `it.hasNext()`.
fn has_next_target(cond: &Expr) -> Option<&Ident> {
    let call = cond.strip_parens().as_call()?;
    if call.name != "hasNext" || !call.args.is_empty() {
        return None;
    }
    call.target.as_ref()?.strip_parens().as_name()
}

/// `Iterator<T> it = c.iterator();` declaring `iterator`, giving `c` and `T`.
fn iterator_declaration<'a>(
    local: &'a StmtLocalVar,
    iterator: &Ident,
) -> Option<(&'a Expr, Option<TypeRef>)> {
    let declarator = local.single()?;
    if declarator.name != *iterator {
        return None;
    }
    let call = declarator.init.as_ref()?.strip_parens().as_call()?;
    if call.name != "iterator" || !call.args.is_empty() {
        return None;
    }
    let source = call.target.as_ref()?;
    let element = match local.ty.type_args() {
        [item] => Some(item.upper_bound()),
        _ => None,
    };
    Some((source, element))
}

fn extract_iterator_while<'s>(
    stmt: &Stmt,
    site: &'s LoopSite,
    resolver: &dyn TypeResolver,
) -> Extracted<'s> {
    let StmtKind::While(stmt_while) = &stmt.kind else {
        return Err(unsupported("not a while loop"));
    };
    let Some(iterator) = has_next_target(&stmt_while.cond) else {
        return Err(unsupported("while loop without the iterator idiom"));
    };
    let Some(StmtKind::LocalVar(local)) = site.preceding.last().map(|prev| &prev.kind) else {
        return Err(unsupported("iterator is not declared right before the loop"));
    };
    let Some((source, declared)) = iterator_declaration(local, iterator) else {
        return Err(unsupported("iterator is not declared right before the loop"));
    };
    iterator_model(stmt, &stmt_while.body, iterator, source, declared, 1, site, resolver)
}

fn extract_iterator_for<'s>(
    stmt: &Stmt,
    stmt_for: &StmtFor,
    site: &'s LoopSite,
    resolver: &dyn TypeResolver,
) -> Extracted<'s> {
    let iterator = stmt_for
        .cond
        .as_ref()
        .and_then(has_next_target)
        .ok_or_else(|| unsupported("loop condition is not `hasNext()`"))?;
    if !stmt_for.update.is_empty() {
        return Err(unsupported("iterator loop with an update expression"));
    }
    let declaration = match stmt_for.init.as_slice() {
        [init] => match &init.kind {
            StmtKind::LocalVar(local) => iterator_declaration(local, iterator),
            _ => None,
        },
        _ => None,
    };
    let Some((source, declared)) = declaration else {
        return Err(unsupported("iterator is not declared in the loop header"));
    };
    iterator_model(stmt, &stmt_for.body, iterator, source, declared, 0, site, resolver)
}

#[allow(clippy::too_many_arguments)]
fn iterator_model<'s>(
    stmt: &Stmt,
    loop_body: &Stmt,
    iterator: &Ident,
    source: &Expr,
    declared_element: Option<TypeRef>,
    consumed_before: usize,
    site: &'s LoopSite,
    resolver: &dyn TypeResolver,
) -> Extracted<'s> {
    let (mut body, body_comments) = body_of(loop_body);
    if body.is_empty() {
        return Err(unsupported("iterator loop with an empty body"));
    }
    let first = body.remove(0);
    let next = match &first.kind {
        StmtKind::LocalVar(local) => local.single().and_then(|declarator| {
            let call = declarator.init.as_ref()?.strip_parens().as_call()?;
            let target = call.target.as_ref()?;
            (call.name == "next" && call.args.is_empty() && target.is_name(iterator.as_str()))
                .then(|| (declarator.name.clone(), local.ty.clone()))
        }),
        _ => None,
    };
    let Some((name, ty)) = next else {
        return Err(unsupported("iterator body does not start with `T x = it.next();`"));
    };

    let usage = usage_in_stmts(&body, iterator.as_str());
    if !usage.is_unused() {
        let reason = if find_mutation(&body, iterator.as_str()).is_some() {
            RejectionReason::IteratedCollectionMutated
        } else {
            RejectionReason::UnsupportedLoopShape
        };
        return Err(Rejection::new(
            reason,
            format!("iterator `{}` is used beyond the leading next()", iterator),
        ));
    }
    if references_in_stmts(&site.following, iterator.as_str()) {
        return Err(unsupported(format!(
            "iterator `{}` is used after the loop",
            iterator
        )));
    }

    let source_type = resolver.type_of(source);
    let source_kind = match SourceKind::of_type(source_type.as_ref()) {
        SourceKind::Array => SourceKind::Iterable,
        kind => kind,
    };
    let element_type = (!ty.is_inferred())
        .then_some(ty)
        .or(declared_element)
        .or_else(|| source_type.as_ref().and_then(TypeRef::element_type));
    Ok(LoopModel {
        kind: LoopKind::IteratorWhile,
        binding: ElementBinding {
            name,
            ty: element_type,
        },
        source: source.clone(),
        source_kind,
        source_type,
        body,
        body_comments: first
            .comments
            .iter()
            .cloned()
            .chain(body_comments)
            .collect(),
        indexed: None,
        iterator: Some(iterator.clone()),
        consumed_before,
        site,
        span: stmt.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::scope::{Declaration, EnclosingScope, ScopeTypeResolver};
    use lf_lang::parse_statement;

    fn site() -> LoopSite {
        LoopSite::new(
            EnclosingScope::new()
                .with(Declaration::local(
                    "names",
                    TypeRef::generic("List", vec![TypeRef::string()]),
                ))
                .with(Declaration::local(
                    "chars",
                    TypeRef::array_of(TypeRef::primitive(PrimitiveKind::Char)),
                )),
        )
    }

    fn extract<'s>(src: &str, site: &'s LoopSite) -> Extracted<'s> {
        let stmt = parse_statement(src).unwrap_or_else(|e| panic!("{src}: {e}"));
        let resolver = ScopeTypeResolver::new(&site.scope);
        extract_loop(&stmt, site, &resolver)
    }

    #[test]
    fn for_each_over_list() {
        let site = site();
        let model = extract("for (var name : names) { print(name); }", &site).unwrap();
        assert_eq!(model.kind, LoopKind::ElementForEach);
        assert_eq!(model.source_kind, SourceKind::Collection);
        assert_eq!(model.binding.ty, Some(TypeRef::string()));
        assert_eq!(model.body.len(), 1);
    }

    #[test]
    fn indexed_needs_size_bound() {
        let site = site();
        let model = extract("for (int i = 0; i < names.size(); i++) print(names.get(i));", &site).unwrap();
        assert_eq!(model.kind, LoopKind::IndexedCounter);
        assert_eq!(model.source_kind, SourceKind::Range);
        assert!(model.indexed.as_ref().map_or(false, |t| !t.is_array));

        let err = extract("for (int i = 0; i < n; i++) print(i);", &site).unwrap_err();
        assert_eq!(err.reason, RejectionReason::UnsupportedLoopShape);
        let err = extract("for (int i = 0; i < names.size(); i += 2) print(i);", &site).unwrap_err();
        assert_eq!(err.reason, RejectionReason::UnsupportedLoopShape);
    }

    #[test]
    fn iterator_while_consumes_declaration() {
        let decl = parse_statement("Iterator<String> it = names.iterator();").unwrap();
        let site = site().with_preceding(vec![decl]);
        let model = extract(
            "while (it.hasNext()) { String name = it.next(); print(name); }",
            &site,
        )
        .unwrap();
        assert_eq!(model.kind, LoopKind::IteratorWhile);
        assert_eq!(model.consumed_before, 1);
        assert_eq!(model.binding.name.as_str(), "name");
        assert_eq!(model.body.len(), 1);

        let err = extract(
            "while (it.hasNext()) { String name = it.next(); if (name.isEmpty()) it.remove(); }",
            &site,
        )
        .unwrap_err();
        assert_eq!(err.reason, RejectionReason::IteratedCollectionMutated);
    }

    #[test]
    fn char_arrays_have_no_adapter() {
        let site = site();
        let err = extract("for (char c : chars) print(c);", &site).unwrap_err();
        assert_eq!(err.reason, RejectionReason::UnsupportedLoopShape);
    }

    #[test]
    fn do_while_is_unsupported() {
        let site = site();
        let err = extract("do { x++; } while (x < 3);", &site).unwrap_err();
        assert_eq!(err.reason, RejectionReason::UnsupportedLoopShape);
    }
}
