// Name usage queries: how often a variable is read or written

use lf_core::ast::visit::{walk_expr, walk_stmt, Visit};
use lf_core::ast::{Expr, ExprKind, Ident, Member, Stmt, StmtKind};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameUsage {
    pub reads: usize,
    pub writes: usize,
}

impl NameUsage {
    pub fn is_unused(&self) -> bool {
        self.reads == 0 && self.writes == 0
    }

    pub fn total(&self) -> usize {
        self.reads + self.writes
    }
}

struct UsageCounter<'a> {
    name: &'a str,
    usage: NameUsage,
}

impl Visit for UsageCounter<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr.kind() {
            ExprKind::Name(name) if name == self.name => self.usage.reads += 1,
            ExprKind::Assign(assign) if assign.target.strip_parens().is_name(self.name) => {
                self.usage.writes += 1;
                if assign.op.bin_op().is_some() {
                    self.usage.reads += 1;
                }
                self.visit_expr(&assign.value);
            }
            ExprKind::Unary(unary)
                if unary.op.is_update() && unary.expr.strip_parens().is_name(self.name) =>
            {
                self.usage.writes += 1;
                self.usage.reads += 1;
            }
            _ => walk_expr(self, expr),
        }
    }
}

pub fn usage_in_expr(expr: &Expr, name: &str) -> NameUsage {
    let mut counter = UsageCounter {
        name,
        usage: NameUsage::default(),
    };
    counter.visit_expr(expr);
    counter.usage
}

pub fn usage_in_stmts(stmts: &[Stmt], name: &str) -> NameUsage {
    let mut counter = UsageCounter {
        name,
        usage: NameUsage::default(),
    };
    for stmt in stmts {
        counter.visit_stmt(stmt);
    }
    counter.usage
}

pub fn references_in_expr(expr: &Expr, name: &str) -> bool {
    !usage_in_expr(expr, name).is_unused()
}

pub fn references_in_stmts(stmts: &[Stmt], name: &str) -> bool {
    !usage_in_stmts(stmts, name).is_unused()
}

/// Every simple name read anywhere in `expr`, lambdas included.
pub fn names_in_expr(expr: &Expr) -> BTreeSet<Ident> {
    lf_core::ast::visit::expr_names(expr).into_iter().collect()
}

struct Names(BTreeSet<Ident>);

impl Visit for Names {
    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::Name(name) = expr.kind() {
            self.0.insert(name.clone());
        }
        walk_expr(self, expr)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::LocalVar(local) => {
                for declarator in &local.declarators {
                    self.0.insert(declarator.name.clone());
                }
            }
            StmtKind::ForEach(for_each) => {
                self.0.insert(for_each.name.clone());
            }
            _ => {}
        }
        walk_stmt(self, stmt)
    }
}

/// Names read or declared in `stmts`, for picking fresh lambda parameters.
pub fn names_in_stmts(stmts: &[Stmt]) -> BTreeSet<Ident> {
    let mut names = Names(BTreeSet::new());
    for stmt in stmts {
        names.visit_stmt(stmt);
    }
    names.0
}

/// Names declared by the top-level statements of `stmts`.
pub fn declared_names(stmts: &[Stmt]) -> Vec<Ident> {
    stmts
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::LocalVar(local) => Some(local.declarators.iter().map(|d| d.name.clone())),
            _ => None,
        })
        .flatten()
        .collect()
}

struct AssignedVariables {
    names: Vec<Ident>,
    this_fields: Vec<Ident>,
}

impl Visit for AssignedVariables {
    fn visit_expr(&mut self, expr: &Expr) {
        let target = match expr.kind() {
            ExprKind::Assign(assign) => Some(&assign.target),
            ExprKind::Unary(unary) if unary.op.is_update() => Some(&unary.expr),
            _ => None,
        };
        if let Some(target) = target {
            match target.strip_parens().kind() {
                ExprKind::Name(name) => self.names.push(name.clone()),
                ExprKind::FieldAccess(field) if matches!(field.target.kind(), ExprKind::This) => {
                    self.this_fields.push(field.field.clone())
                }
                _ => {}
            }
        }
        walk_expr(self, expr)
    }

    fn visit_class_body(&mut self, _members: &[Member]) {}
}

/// Variables assigned in `stmts`: simple names, and fields written through
/// `this.` as a second list. One entry per write.
pub fn assigned_variables(stmts: &[Stmt]) -> (Vec<Ident>, Vec<Ident>) {
    let mut visitor = AssignedVariables {
        names: Vec::new(),
        this_fields: Vec::new(),
    };
    for stmt in stmts {
        visitor.visit_stmt(stmt);
    }
    (visitor.names, visitor.this_fields)
}

/// Pick `base`, or `base` with the smallest numeric suffix, avoiding `taken`.
pub fn fresh_name(base: &str, taken: impl Fn(&str) -> bool) -> Ident {
    if !taken(base) {
        return Ident::new(base);
    }
    (1..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken(candidate))
        .map(Ident::new)
        .unwrap_or_else(|| Ident::new(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_lang::{parse_block, parse_expression};

    #[test]
    fn counts_reads_and_writes() {
        let block = parse_block("{ sum += x; y = sum; sum++; f(() -> sum); }").unwrap();
        let usage = usage_in_stmts(&block.stmts, "sum");
        assert_eq!(usage, NameUsage { reads: 4, writes: 2 });
    }

    #[test]
    fn names_include_lambdas() {
        let expr = parse_expression("a.map(x -> x + b)").unwrap();
        let names = names_in_expr(&expr);
        assert!(names.contains(&Ident::new("b")));
        assert!(names.contains(&Ident::new("a")));
    }

    #[test]
    fn fresh_names_skip_taken() {
        let taken = ["a", "a1"];
        assert_eq!(fresh_name("a", |n| taken.contains(&n)).as_str(), "a2");
        assert_eq!(fresh_name("b", |n| taken.contains(&n)).as_str(), "b");
    }
}
