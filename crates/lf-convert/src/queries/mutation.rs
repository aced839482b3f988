// Mutation queries: does a loop body structurally modify a collection

use lf_core::ast::visit::{walk_expr, Visit};
use lf_core::ast::{Expr, ExprKind, Stmt};
use lf_core::printer::JavaPrinter;

pub const COLLECTION_MUTATORS: &[&str] = &[
    "add",
    "addAll",
    "remove",
    "removeAll",
    "retainAll",
    "removeIf",
    "replaceAll",
    "clear",
    "sort",
    "set",
];

pub const MAP_MUTATORS: &[&str] = &[
    "put",
    "putAll",
    "putIfAbsent",
    "remove",
    "compute",
    "computeIfAbsent",
    "computeIfPresent",
    "merge",
    "replace",
    "clear",
];

const VIEW_METHODS: &[&str] = &["keySet", "values", "entrySet"];

pub fn is_mutator(name: &str) -> bool {
    COLLECTION_MUTATORS.contains(&name) || MAP_MUTATORS.contains(&name)
}

/// Identity key of a collection expression. `this.items` and `items` are the
/// same collection, and a `keySet()`/`values()`/`entrySet()` view is its map.
pub fn collection_identity(expr: &Expr) -> String {
    let expr = expr.strip_parens();
    match expr.kind() {
        ExprKind::Name(name) => name.to_string(),
        ExprKind::FieldAccess(field) if matches!(field.target.kind(), ExprKind::This) => {
            field.field.to_string()
        }
        ExprKind::MethodCall(call)
            if call.args.is_empty() && VIEW_METHODS.contains(&call.name.as_str()) =>
        {
            match &call.target {
                Some(target) => collection_identity(target),
                None => call.name.to_string(),
            }
        }
        _ => JavaPrinter::default().print_expr(expr),
    }
}

struct MutationFinder<'a> {
    identity: &'a str,
    found: Option<String>,
}

impl Visit for MutationFinder<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        if self.found.is_some() {
            return;
        }
        match expr.kind() {
            ExprKind::MethodCall(call) if is_mutator(call.name.as_str()) => {
                if let Some(target) = &call.target {
                    if collection_identity(target) == self.identity {
                        self.found = Some(call.name.to_string());
                        return;
                    }
                }
            }
            ExprKind::Assign(assign) => {
                if let ExprKind::Index(index) = assign.target.strip_parens().kind() {
                    if collection_identity(&index.target) == self.identity {
                        self.found = Some("element assignment".to_string());
                        return;
                    }
                }
            }
            _ => {}
        }
        walk_expr(self, expr)
    }
}

/// The first mutating operation applied to the collection identified by
/// `identity`, lambdas included.
pub fn find_mutation(stmts: &[Stmt], identity: &str) -> Option<String> {
    let mut finder = MutationFinder {
        identity,
        found: None,
    };
    for stmt in stmts {
        finder.visit_stmt(stmt);
        if finder.found.is_some() {
            break;
        }
    }
    finder.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_lang::{parse_block, parse_expression};

    #[test]
    fn views_share_identity() {
        let this_field = parse_expression("this.items").unwrap();
        let keys = parse_expression("items.keySet()").unwrap();
        assert_eq!(collection_identity(&this_field), "items");
        assert_eq!(collection_identity(&keys), "items");
    }

    #[test]
    fn finds_guarded_mutation() {
        let block = parse_block("{ if (x > 0) { other.add(x); } else { this.list.remove(x); } }")
            .unwrap();
        assert_eq!(find_mutation(&block.stmts, "list"), Some("remove".to_string()));
        assert_eq!(find_mutation(&block.stmts, "items"), None);
    }
}
