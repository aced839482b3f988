// Parser tests: expressions, statements, declarations and comment attachment

use lf_core::ast::*;
use lf_core::config::CommentPolicy;
use lf_core::ops::{AssignOp, BinOpKind, UnOpKind};
use lf_core::printer::JavaPrinter;
use lf_core::source_map::SourceFile;
use lf_lang::{parse_block, parse_expression, parse_statement, JavaParser};
use pretty_assertions::assert_eq;

fn parse_expr(src: &str) -> Expr {
    parse_expression(src).unwrap_or_else(|e| panic!("parse failed for `{src}`: {e}"))
}

fn parse_stmt(src: &str) -> Stmt {
    parse_statement(src).unwrap_or_else(|e| panic!("parse failed for `{src}`: {e}"))
}

fn reprint_stmt(src: &str) -> String {
    JavaPrinter::default().print_stmt(&parse_stmt(src))
}

#[test]
fn binary_precedence() {
    let expr = parse_expr("a + b * c");
    let ExprKind::Binary(add) = expr.kind() else {
        panic!("expected binary, got {expr:?}");
    };
    assert_eq!(add.op, BinOpKind::Add);
    let ExprKind::Binary(mul) = add.rhs.kind() else {
        panic!("expected nested multiply");
    };
    assert_eq!(mul.op, BinOpKind::Mul);
}

#[test]
fn shifts_and_comparisons_from_split_angles() {
    let ExprKind::Binary(shift) = parse_expr("x >>> 2").into_kind() else {
        panic!("expected binary");
    };
    assert_eq!(shift.op, BinOpKind::UShr);

    let ExprKind::Binary(ge) = parse_expr("a >= b").into_kind() else {
        panic!("expected binary");
    };
    assert_eq!(ge.op, BinOpKind::Ge);

    let ExprKind::Assign(assign) = parse_expr("x >>= 1").into_kind() else {
        panic!("expected assignment");
    };
    assert_eq!(assign.op, AssignOp::Shr);
}

#[test]
fn lambdas_and_method_refs() {
    let ExprKind::Lambda(lambda) = parse_expr("x -> x > 0").into_kind() else {
        panic!("expected lambda");
    };
    assert_eq!(lambda.params.len(), 1);

    let ExprKind::Lambda(lambda) = parse_expr("(a, b) -> a + b").into_kind() else {
        panic!("expected lambda");
    };
    assert_eq!(lambda.params.len(), 2);

    let ExprKind::Lambda(lambda) = parse_expr("() -> { run(); }").into_kind() else {
        panic!("expected lambda");
    };
    assert!(matches!(lambda.body, LambdaBody::Block(_)));

    let ExprKind::MethodRef(method_ref) = parse_expr("System.out::println").into_kind() else {
        panic!("expected method reference");
    };
    assert_eq!(method_ref.name.as_str(), "println");

    let ExprKind::MethodRef(ctor) = parse_expr("int[]::new").into_kind() else {
        panic!("expected constructor reference");
    };
    assert!(matches!(ctor.target.kind(), ExprKind::Type(ty) if ty.dims == 1));
}

#[test]
fn casts_versus_parenthesized() {
    let ExprKind::Cast(cast) = parse_expr("(int) x").into_kind() else {
        panic!("expected cast");
    };
    assert_eq!(cast.ty.name, "int");

    let ExprKind::Cast(cast) = parse_expr("(String) obj").into_kind() else {
        panic!("expected cast");
    };
    assert_eq!(cast.ty.name, "String");

    let ExprKind::Binary(sub) = parse_expr("(a) - b").into_kind() else {
        panic!("expected subtraction");
    };
    assert!(matches!(sub.lhs.kind(), ExprKind::Paren(_)));
}

#[test]
fn generic_creation_and_instanceof() {
    let ExprKind::New(new) = parse_expr("new HashMap<String, List<Integer>>()").into_kind() else {
        panic!("expected new");
    };
    assert_eq!(new.ty.to_string(), "HashMap<String, List<Integer>>");

    let ExprKind::New(diamond) = parse_expr("new ArrayList<>()").into_kind() else {
        panic!("expected new");
    };
    assert_eq!(diamond.ty.args, Some(vec![]));

    let ExprKind::InstanceOf(check) = parse_expr("o instanceof String s").into_kind() else {
        panic!("expected instanceof");
    };
    assert_eq!(check.binding.map(|b| b.to_string()), Some("s".to_string()));
}

#[test]
fn ternary_and_postfix() {
    let ExprKind::Conditional(cond) = parse_expr("a > b ? a : b").into_kind() else {
        panic!("expected conditional");
    };
    assert!(cond.then.is_name("a"));

    let ExprKind::Unary(unary) = parse_expr("i++").into_kind() else {
        panic!("expected postfix");
    };
    assert_eq!(unary.op, UnOpKind::PostInc);
}

#[test]
fn local_declarations() {
    let stmt = parse_stmt("List<String> names = new ArrayList<>();");
    let StmtKind::LocalVar(local) = &stmt.kind else {
        panic!("expected declaration, got {stmt:?}");
    };
    assert_eq!(local.ty.to_string(), "List<String>");
    assert_eq!(local.declarators[0].name.as_str(), "names");

    let stmt = parse_stmt("int a = 1, b[] = {2};");
    let StmtKind::LocalVar(local) = &stmt.kind else {
        panic!("expected declaration");
    };
    assert_eq!(local.declarators.len(), 2);
    assert_eq!(local.declarators[1].dims, 1);

    assert!(matches!(parse_stmt("x = y;").kind, StmtKind::Expr(_)));
}

#[test]
fn loops() {
    let stmt = parse_stmt("for (String s : names) { print(s); }");
    let StmtKind::ForEach(for_each) = &stmt.kind else {
        panic!("expected enhanced for");
    };
    assert_eq!(for_each.name.as_str(), "s");
    assert!(for_each.iterable.is_name("names"));

    let stmt = parse_stmt("for (int i = 0, n = a.length; i < n; i++) sum += a[i];");
    let StmtKind::For(stmt_for) = &stmt.kind else {
        panic!("expected for");
    };
    assert_eq!(stmt_for.init.len(), 1);
    assert_eq!(stmt_for.update.len(), 1);
    assert!(stmt_for.cond.is_some());

    let stmt = parse_stmt("outer: while (it.hasNext()) { if (done) break outer; }");
    assert!(matches!(stmt.kind, StmtKind::Labeled(_)));
}

#[test]
fn try_switch_and_sync() {
    let stmt = parse_stmt(
        "try (Reader r = open()) { read(r); } catch (IOException | RuntimeException e) { log(e); } finally { close(); }",
    );
    let StmtKind::Try(stmt_try) = &stmt.kind else {
        panic!("expected try");
    };
    assert_eq!(stmt_try.resources.len(), 1);
    assert_eq!(stmt_try.catches[0].types.len(), 2);
    assert!(stmt_try.finally.is_some());

    let stmt = parse_stmt("switch (k) { case A, B -> run(); default -> { stop(); } }");
    let StmtKind::Switch(switch) = &stmt.kind else {
        panic!("expected switch");
    };
    assert_eq!(switch.cases.len(), 2);
    assert!(switch.cases[0].arrow);
    assert_eq!(switch.cases[0].labels.len(), 2);

    let stmt = parse_stmt("switch (n) { case 1: a(); break; default: b(); }");
    let StmtKind::Switch(switch) = &stmt.kind else {
        panic!("expected switch");
    };
    assert_eq!(switch.cases[0].body.len(), 2);

    assert!(matches!(
        parse_stmt("synchronized (lock) { x++; }").kind,
        StmtKind::Synchronized(_)
    ));
}

#[test]
fn reprints_statements() {
    assert_eq!(
        reprint_stmt("for(int x:xs){if(x>0)continue;total+=x;}"),
        "for (int x : xs) {\n    if (x > 0)\n        continue;\n    total += x;\n}"
    );
    assert_eq!(
        reprint_stmt("result = items.stream().map(i -> i * 2).collect(Collectors.toList());"),
        "result = items.stream().map(i -> i * 2).collect(Collectors.toList());"
    );
}

#[test]
fn compilation_unit() {
    let src = r#"package com.example;

import java.util.*;
import java.util.function.Function;

@SuppressWarnings("unchecked")
public class Sample<T extends Comparable<T>> extends Base implements Runnable {
    private final List<T> items = new ArrayList<>();
    static int COUNT;

    public Sample(List<T> items) {
        this.items.addAll(items);
    }

    @Override
    public void run() {
        for (T item : items) {
            System.out.println(item);
        }
    }

    enum Mode { FAST, SLOW; }

    record Pair(int a, int b) {}
}
"#;
    let file = SourceFile::anonymous(src);
    let unit = JavaParser::default()
        .parse_compilation_unit(&file)
        .unwrap_or_else(|e| panic!("parse failed: {e}"));
    assert_eq!(unit.package.as_deref(), Some("com.example"));
    assert_eq!(unit.imports.len(), 2);
    assert!(unit.imports[0].covers("java.util.List"));

    let class = &unit.types[0];
    assert_eq!(class.name.as_str(), "Sample");
    assert_eq!(class.type_params.as_deref(), Some("<T extends Comparable<T>>"));
    assert!(class.modifiers.has_annotation("SuppressWarnings"));
    assert_eq!(class.members.len(), 6);
    assert!(matches!(class.members[2], Member::Constructor(_)));
    let Member::Method(run) = &class.members[3] else {
        panic!("expected method");
    };
    assert!(run.modifiers.has_annotation("Override"));
    assert_eq!(run.body.as_ref().map(|b| b.stmts.len()), Some(1));
    let Member::Type(record) = &class.members[5] else {
        panic!("expected nested record");
    };
    assert_eq!(record.kind, TypeDeclKind::Record);
    assert_eq!(record.record_components.len(), 2);
}

#[test]
fn comments_attach_by_line() {
    let block = parse_block(
        "{\n    // leading\n    a(); // trailing\n\n    /* far */\n\n    b();\n}",
    )
    .unwrap_or_else(|e| panic!("parse failed: {e}"));
    let a = &block.stmts[0];
    assert_eq!(a.comments.leading[0].text, "// leading");
    assert_eq!(a.comments.trailing[0].text, "// trailing");
    assert!(a.comments.trailing[0].same_line);
    // Two lines away from `b();`, so it stays with `a();`.
    assert_eq!(a.comments.trailing[1].text, "/* far */");
    assert!(block.stmts[1].comments.is_empty());
}

#[test]
fn comments_go_to_innermost_block() {
    let stmt = parse_stmt("for (int x : xs) {\n    // keep positives\n    if (x > 0) out.add(x);\n}");
    let StmtKind::ForEach(for_each) = &stmt.kind else {
        panic!("expected enhanced for");
    };
    assert!(stmt.comments.is_empty());
    let body = for_each.body.as_stmt_list();
    assert_eq!(body[0].comments.leading[0].text, "// keep positives");
}

#[test]
fn comments_dropped_when_not_preserved() {
    let parser = JavaParser::new(CommentPolicy {
        preserve: false,
        ..Default::default()
    });
    let stmt = parser.parse_statement("{ // gone\n a(); }").unwrap();
    assert!(stmt.as_stmt_list()[0].comments.is_empty());
}

#[test]
fn reports_error_offset() {
    let err = parse_statement("int x = ;").unwrap_err();
    assert!((6..=8).contains(&err.offset), "{err}");
    let err = parse_expression("a b").unwrap_err();
    assert!(err.message.contains("trailing"));
}
