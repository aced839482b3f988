// Printer tests over hand-built trees

use lf_core::ast::*;
use lf_core::ops::{AssignOp, BinOpKind};
use lf_core::printer::{JavaPrinter, PrettyOptions};
use pretty_assertions::assert_eq;

fn printer() -> JavaPrinter {
    JavaPrinter::new(PrettyOptions::default())
}

#[test]
fn prints_stream_chain() {
    let gt = Expr::binary(BinOpKind::Gt, Expr::name("x"), Expr::int(0));
    let filter = Expr::lambda(vec![Ident::new("x")], LambdaBody::Expr(gt));
    let chain = Expr::method(
        Expr::method(Expr::name("items"), "stream", vec![]),
        "filter",
        vec![filter],
    );
    let chain = Expr::method(
        chain,
        "forEach",
        vec![Expr::method_ref(
            Expr::field(Expr::name("System"), "out"),
            "println",
        )],
    );
    assert_eq!(
        printer().print_expr(&chain),
        "items.stream().filter(x -> x > 0).forEach(System.out::println)"
    );
}

#[test]
fn prints_binary_lambda_and_compound_assign() {
    let add = Expr::binary(BinOpKind::Add, Expr::name("a"), Expr::name("b"));
    let lambda = Expr::lambda(
        vec![Ident::new("a"), Ident::new("b")],
        LambdaBody::Expr(add),
    );
    let reduce = Expr::method(Expr::name("s"), "reduce", vec![Expr::name("total"), lambda]);
    let assign = Expr::assign(AssignOp::Assign, Expr::name("total"), reduce);
    assert_eq!(
        printer().print_stmt(&Stmt::expr(assign)),
        "total = s.reduce(total, (a, b) -> a + b);"
    );
}

#[test]
fn nests_block_lambda_inside_if() {
    let body = Block::new(vec![Stmt::expr(Expr::call(
        None,
        "log",
        vec![Expr::name("x")],
    ))]);
    let for_each = Expr::method(
        Expr::name("items"),
        "forEach",
        vec![Expr::lambda(vec![Ident::new("x")], LambdaBody::Block(body))],
    );
    let stmt = Stmt::synthetic(StmtKind::If(StmtIf {
        cond: Expr::name("ready"),
        then: Box::new(Stmt::synthetic(StmtKind::Block(Block::new(vec![Stmt::expr(
            for_each,
        )])))),
        otherwise: None,
    }));
    assert_eq!(
        printer().print_stmt(&stmt),
        "if (ready) {\n    items.forEach(x -> {\n        log(x);\n    });\n}"
    );
}

#[test]
fn negation_wraps_compound_operand() {
    let cond = Expr::binary(BinOpKind::Eq, Expr::name("x"), Expr::null());
    assert_eq!(printer().print_expr(&Expr::negate(cond)), "!(x == null)");
    assert_eq!(printer().print_expr(&Expr::negate(Expr::name("ok"))), "!ok");
}

#[test]
fn casts_and_ternaries() {
    let cast = Expr::cast(
        TypeRef::primitive(PrimitiveKind::Int),
        Expr::binary(BinOpKind::Mul, Expr::name("x"), Expr::int(2)),
    );
    assert_eq!(printer().print_expr(&cast), "(int) (x * 2)");

    let ternary: Expr = ExprKind::Conditional(ExprConditional {
        cond: Expr::binary(BinOpKind::Gt, Expr::name("a"), Expr::name("b")),
        then: Expr::name("a"),
        otherwise: Expr::name("b"),
    })
    .into();
    let sum = Expr::binary(BinOpKind::Add, Expr::int(1), ternary);
    assert_eq!(printer().print_expr(&sum), "1 + (a > b ? a : b)");
}
