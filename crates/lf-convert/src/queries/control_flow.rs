// Control-flow queries over a loop body. Lambda bodies and class bodies are
// separate scopes and are not entered.

use lf_core::ast::visit::{walk_stmt, Visit};
use lf_core::ast::{Expr, ExprLambda, Member, Stmt, StmtKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlFlowSummary {
    pub breaks: usize,
    pub plain_continues: usize,
    pub labeled_continues: usize,
    /// Value of each `return`, `None` for a bare `return;`.
    pub returns: Vec<Option<Expr>>,
    pub throws: usize,
    pub try_blocks: usize,
    pub switches: usize,
    pub synchronized_blocks: usize,
    pub nested_loops: usize,
}

impl ControlFlowSummary {
    /// First construct that makes the body unsafe to move into a lambda,
    /// returns aside.
    pub fn unsafe_construct(&self) -> Option<&'static str> {
        if self.nested_loops > 0 {
            Some("nested loop")
        } else if self.breaks > 0 {
            Some("break")
        } else if self.labeled_continues > 0 {
            Some("labeled continue")
        } else if self.try_blocks > 0 {
            Some("try/catch")
        } else if self.switches > 0 {
            Some("switch")
        } else if self.synchronized_blocks > 0 {
            Some("synchronized")
        } else if self.throws > 0 {
            Some("throw")
        } else {
            None
        }
    }
}

impl Visit for ControlFlowSummary {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Break(_) => self.breaks += 1,
            StmtKind::Continue(None) => self.plain_continues += 1,
            StmtKind::Continue(Some(_)) => self.labeled_continues += 1,
            StmtKind::Return(value) => self.returns.push(value.clone()),
            StmtKind::Throw(_) => self.throws += 1,
            StmtKind::Try(_) => self.try_blocks += 1,
            StmtKind::Switch(_) => self.switches += 1,
            StmtKind::Synchronized(_) => self.synchronized_blocks += 1,
            StmtKind::For(_) | StmtKind::ForEach(_) | StmtKind::While(_) | StmtKind::DoWhile(_) => {
                self.nested_loops += 1
            }
            _ => {}
        }
        walk_stmt(self, stmt)
    }

    fn visit_lambda(&mut self, _lambda: &ExprLambda) {}

    fn visit_class_body(&mut self, _members: &[Member]) {}
}

pub fn summarize_control_flow(stmts: &[Stmt]) -> ControlFlowSummary {
    let mut summary = ControlFlowSummary::default();
    for stmt in stmts {
        summary.visit_stmt(stmt);
    }
    summary
}

/// Whether `stmts` hold a `return` or an unlabeled `continue` outside
/// nested lambdas.
pub fn has_jumps(stmts: &[Stmt]) -> bool {
    let summary = summarize_control_flow(stmts);
    !summary.returns.is_empty() || summary.plain_continues > 0
}

/// Rewrite unlabeled `continue` into `return;`, for bodies moved into a
/// `forEach` lambda.
pub fn continue_to_return(stmt: &Stmt) -> Stmt {
    let mut stmt = stmt.clone();
    rewrite_continue(&mut stmt);
    stmt
}

fn rewrite_continue(stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Continue(None) => stmt.kind = StmtKind::Return(None),
        StmtKind::Block(block) => block.stmts.iter_mut().for_each(rewrite_continue),
        StmtKind::If(stmt_if) => {
            rewrite_continue(&mut stmt_if.then);
            if let Some(otherwise) = &mut stmt_if.otherwise {
                rewrite_continue(otherwise);
            }
        }
        StmtKind::Labeled(labeled) => rewrite_continue(&mut labeled.body),
        _ => {}
    }
}
