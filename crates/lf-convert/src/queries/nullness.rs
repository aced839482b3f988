// Nullness queries: what a predicate's outcome proves about a variable

use lf_core::ast::{Expr, ExprBinOp, ExprKind};
use lf_core::ops::{BinOpKind, UnOpKind};

/// Whether every completed evaluation of `expr` has dereferenced `name`,
/// so a null `name` would have thrown.
pub fn dereferences(expr: &Expr, name: &str) -> bool {
    let expr = expr.strip_parens();
    let through = |target: &Expr| target.strip_parens().is_name(name) || dereferences(target, name);
    match expr.kind() {
        ExprKind::MethodCall(call) => {
            call.target.as_ref().map_or(false, |target| through(target))
                || call.args.iter().any(|arg| dereferences(arg, name))
        }
        ExprKind::FieldAccess(field) => through(&field.target),
        ExprKind::Index(index) => through(&index.target) || dereferences(&index.index, name),
        ExprKind::Binary(bin) => match bin.op {
            BinOpKind::And | BinOpKind::Or => dereferences(&bin.lhs, name),
            _ => dereferences(&bin.lhs, name) || dereferences(&bin.rhs, name),
        },
        ExprKind::Unary(unary) => dereferences(&unary.expr, name),
        ExprKind::Cast(cast) => dereferences(&cast.expr, name),
        ExprKind::InstanceOf(test) => dereferences(&test.expr, name),
        ExprKind::Conditional(cond) => dereferences(&cond.cond, name),
        _ => false,
    }
}

fn compares_to_null(bin: &ExprBinOp, name: &str) -> bool {
    let (lhs, rhs) = (bin.lhs.strip_parens(), bin.rhs.strip_parens());
    (lhs.is_name(name) && rhs.is_null()) || (lhs.is_null() && rhs.is_name(name))
}

/// Whether `expr` evaluating to `true` implies `name` is not null.
pub fn true_implies_non_null(expr: &Expr, name: &str) -> bool {
    if dereferences(expr, name) {
        return true;
    }
    match expr.strip_parens().kind() {
        ExprKind::Binary(bin) => match bin.op {
            BinOpKind::Ne => compares_to_null(bin, name),
            BinOpKind::And => {
                true_implies_non_null(&bin.lhs, name) || true_implies_non_null(&bin.rhs, name)
            }
            BinOpKind::Or => {
                true_implies_non_null(&bin.lhs, name) && true_implies_non_null(&bin.rhs, name)
            }
            _ => false,
        },
        ExprKind::InstanceOf(test) => test.expr.strip_parens().is_name(name),
        ExprKind::Unary(unary) if unary.op == UnOpKind::Not => false_implies_non_null(&unary.expr, name),
        _ => false,
    }
}

/// Whether `expr` evaluating to `false` implies `name` is not null.
pub fn false_implies_non_null(expr: &Expr, name: &str) -> bool {
    if dereferences(expr, name) {
        return true;
    }
    match expr.strip_parens().kind() {
        ExprKind::Binary(bin) => match bin.op {
            BinOpKind::Eq => compares_to_null(bin, name),
            BinOpKind::Or => {
                false_implies_non_null(&bin.lhs, name) || false_implies_non_null(&bin.rhs, name)
            }
            BinOpKind::And => {
                false_implies_non_null(&bin.lhs, name) && false_implies_non_null(&bin.rhs, name)
            }
            _ => false,
        },
        ExprKind::Unary(unary) if unary.op == UnOpKind::Not => true_implies_non_null(&unary.expr, name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_lang::parse_expression;

    fn expr(src: &str) -> Expr {
        parse_expression(src).unwrap_or_else(|e| panic!("{src}: {e}"))
    }

    #[test]
    fn dereference_in_evaluated_position() {
        assert!(dereferences(&expr("s.isEmpty()"), "s"));
        assert!(dereferences(&expr("s.trim().length() > 3"), "s"));
        assert!(dereferences(&expr("s.length() > 0 || flag"), "s"));
        assert!(!dereferences(&expr("flag || s.isEmpty()"), "s"));
        assert!(!dereferences(&expr("s == null || s.isEmpty()"), "s"));
        assert!(!dereferences(&expr("Objects.equals(s, t)"), "s"));
    }

    #[test]
    fn true_outcome() {
        assert!(true_implies_non_null(&expr("s != null && s.isEmpty()"), "s"));
        assert!(true_implies_non_null(&expr("s instanceof String"), "s"));
        assert!(true_implies_non_null(&expr("!(s == null)"), "s"));
        assert!(!true_implies_non_null(&expr("s == null || s.isEmpty()"), "s"));
        assert!(!true_implies_non_null(&expr("flag || s.isEmpty()"), "s"));
    }

    #[test]
    fn false_outcome() {
        assert!(false_implies_non_null(&expr("s == null"), "s"));
        assert!(false_implies_non_null(&expr("s == null || s.isBlank()"), "s"));
        assert!(!false_implies_non_null(&expr("s != null"), "s"));
        assert!(!false_implies_non_null(&expr("flag && s == null"), "s"));
    }
}
