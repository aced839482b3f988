//! Read-only and mutable tree walkers.
//!
//! Override a `visit_*` hook and call the matching `walk_*` function to keep
//! descending. Lambda bodies and anonymous class bodies have their own hooks
//! so analyses can treat them as separate control-flow scopes.

use super::*;

pub trait Visit {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr)
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block)
    }

    fn visit_lambda(&mut self, lambda: &ExprLambda) {
        walk_lambda(self, lambda)
    }

    /// Anonymous class bodies and local class declarations.
    fn visit_class_body(&mut self, members: &[Member]) {
        walk_members(self, members)
    }
}

pub fn walk_block<V: Visit + ?Sized>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Empty | StmtKind::Break(_) | StmtKind::Continue(_) => {}
        StmtKind::Block(block) => v.visit_block(block),
        StmtKind::LocalVar(local) => {
            for declarator in &local.declarators {
                if let Some(init) = &declarator.init {
                    v.visit_expr(init);
                }
            }
        }
        StmtKind::Expr(expr) | StmtKind::Throw(expr) => v.visit_expr(expr),
        StmtKind::If(stmt_if) => {
            v.visit_expr(&stmt_if.cond);
            v.visit_stmt(&stmt_if.then);
            if let Some(otherwise) = &stmt_if.otherwise {
                v.visit_stmt(otherwise);
            }
        }
        StmtKind::For(stmt_for) => {
            for init in &stmt_for.init {
                v.visit_stmt(init);
            }
            if let Some(cond) = &stmt_for.cond {
                v.visit_expr(cond);
            }
            for update in &stmt_for.update {
                v.visit_expr(update);
            }
            v.visit_stmt(&stmt_for.body);
        }
        StmtKind::ForEach(for_each) => {
            v.visit_expr(&for_each.iterable);
            v.visit_stmt(&for_each.body);
        }
        StmtKind::While(stmt_while) => {
            v.visit_expr(&stmt_while.cond);
            v.visit_stmt(&stmt_while.body);
        }
        StmtKind::DoWhile(do_while) => {
            v.visit_stmt(&do_while.body);
            v.visit_expr(&do_while.cond);
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        StmtKind::Try(stmt_try) => {
            for resource in &stmt_try.resources {
                v.visit_stmt(resource);
            }
            v.visit_block(&stmt_try.body);
            for catch in &stmt_try.catches {
                v.visit_block(&catch.body);
            }
            if let Some(finally) = &stmt_try.finally {
                v.visit_block(finally);
            }
        }
        StmtKind::Switch(switch) => {
            v.visit_expr(&switch.selector);
            for case in &switch.cases {
                for label in &case.labels {
                    v.visit_expr(label);
                }
                for stmt in &case.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        StmtKind::Synchronized(sync) => {
            v.visit_expr(&sync.lock);
            v.visit_block(&sync.body);
        }
        StmtKind::Labeled(labeled) => v.visit_stmt(&labeled.body),
        StmtKind::Assert(assert) => {
            v.visit_expr(&assert.cond);
            if let Some(message) = &assert.message {
                v.visit_expr(message);
            }
        }
        StmtKind::LocalClass(decl) => v.visit_class_body(&decl.members),
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Expr) {
    match expr.kind() {
        ExprKind::Literal(_)
        | ExprKind::Name(_)
        | ExprKind::This
        | ExprKind::Super
        | ExprKind::ClassLit(_)
        | ExprKind::Type(_) => {}
        ExprKind::FieldAccess(field) => v.visit_expr(&field.target),
        ExprKind::MethodCall(call) => {
            if let Some(target) = &call.target {
                v.visit_expr(target);
            }
            for arg in &call.args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Index(index) => {
            v.visit_expr(&index.target);
            v.visit_expr(&index.index);
        }
        ExprKind::Unary(unary) => v.visit_expr(&unary.expr),
        ExprKind::Binary(bin) => {
            v.visit_expr(&bin.lhs);
            v.visit_expr(&bin.rhs);
        }
        ExprKind::Assign(assign) => {
            v.visit_expr(&assign.target);
            v.visit_expr(&assign.value);
        }
        ExprKind::Conditional(cond) => {
            v.visit_expr(&cond.cond);
            v.visit_expr(&cond.then);
            v.visit_expr(&cond.otherwise);
        }
        ExprKind::Cast(cast) => v.visit_expr(&cast.expr),
        ExprKind::InstanceOf(instance_of) => v.visit_expr(&instance_of.expr),
        ExprKind::New(new) => {
            for arg in &new.args {
                v.visit_expr(arg);
            }
            if let Some(body) = &new.body {
                v.visit_class_body(body);
            }
        }
        ExprKind::NewArray(array) => {
            for dim in array.dims.iter().flatten() {
                v.visit_expr(dim);
            }
            if let Some(init) = &array.init {
                for item in init {
                    v.visit_expr(item);
                }
            }
        }
        ExprKind::ArrayInit(items) => {
            for item in items {
                v.visit_expr(item);
            }
        }
        ExprKind::Lambda(lambda) => v.visit_lambda(lambda),
        ExprKind::MethodRef(method_ref) => v.visit_expr(&method_ref.target),
        ExprKind::Paren(inner) => v.visit_expr(inner),
    }
}

pub fn walk_lambda<V: Visit + ?Sized>(v: &mut V, lambda: &ExprLambda) {
    match &lambda.body {
        LambdaBody::Expr(expr) => v.visit_expr(expr),
        LambdaBody::Block(block) => v.visit_block(block),
    }
}

pub fn walk_members<V: Visit + ?Sized>(v: &mut V, members: &[Member]) {
    for member in members {
        match member {
            Member::Field(field) => {
                for declarator in &field.declarators {
                    if let Some(init) = &declarator.init {
                        v.visit_expr(init);
                    }
                }
            }
            Member::Method(method) | Member::Constructor(method) => {
                if let Some(body) = &method.body {
                    v.visit_block(body);
                }
            }
            Member::Initializer(init) => v.visit_block(&init.body),
            Member::Type(decl) => v.visit_class_body(&decl.members),
        }
    }
}

pub trait VisitMut {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt)
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr)
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block)
    }

    fn visit_lambda_mut(&mut self, lambda: &mut ExprLambda) {
        walk_lambda_mut(self, lambda)
    }

    fn visit_class_body_mut(&mut self, members: &mut [Member]) {
        walk_members_mut(self, members)
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Empty | StmtKind::Break(_) | StmtKind::Continue(_) => {}
        StmtKind::Block(block) => v.visit_block_mut(block),
        StmtKind::LocalVar(local) => {
            for declarator in &mut local.declarators {
                if let Some(init) = &mut declarator.init {
                    v.visit_expr_mut(init);
                }
            }
        }
        StmtKind::Expr(expr) | StmtKind::Throw(expr) => v.visit_expr_mut(expr),
        StmtKind::If(stmt_if) => {
            v.visit_expr_mut(&mut stmt_if.cond);
            v.visit_stmt_mut(&mut stmt_if.then);
            if let Some(otherwise) = &mut stmt_if.otherwise {
                v.visit_stmt_mut(otherwise);
            }
        }
        StmtKind::For(stmt_for) => {
            for init in &mut stmt_for.init {
                v.visit_stmt_mut(init);
            }
            if let Some(cond) = &mut stmt_for.cond {
                v.visit_expr_mut(cond);
            }
            for update in &mut stmt_for.update {
                v.visit_expr_mut(update);
            }
            v.visit_stmt_mut(&mut stmt_for.body);
        }
        StmtKind::ForEach(for_each) => {
            v.visit_expr_mut(&mut for_each.iterable);
            v.visit_stmt_mut(&mut for_each.body);
        }
        StmtKind::While(stmt_while) => {
            v.visit_expr_mut(&mut stmt_while.cond);
            v.visit_stmt_mut(&mut stmt_while.body);
        }
        StmtKind::DoWhile(do_while) => {
            v.visit_stmt_mut(&mut do_while.body);
            v.visit_expr_mut(&mut do_while.cond);
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
        }
        StmtKind::Try(stmt_try) => {
            for resource in &mut stmt_try.resources {
                v.visit_stmt_mut(resource);
            }
            v.visit_block_mut(&mut stmt_try.body);
            for catch in &mut stmt_try.catches {
                v.visit_block_mut(&mut catch.body);
            }
            if let Some(finally) = &mut stmt_try.finally {
                v.visit_block_mut(finally);
            }
        }
        StmtKind::Switch(switch) => {
            v.visit_expr_mut(&mut switch.selector);
            for case in &mut switch.cases {
                for label in &mut case.labels {
                    v.visit_expr_mut(label);
                }
                for stmt in &mut case.body {
                    v.visit_stmt_mut(stmt);
                }
            }
        }
        StmtKind::Synchronized(sync) => {
            v.visit_expr_mut(&mut sync.lock);
            v.visit_block_mut(&mut sync.body);
        }
        StmtKind::Labeled(labeled) => v.visit_stmt_mut(&mut labeled.body),
        StmtKind::Assert(assert) => {
            v.visit_expr_mut(&mut assert.cond);
            if let Some(message) = &mut assert.message {
                v.visit_expr_mut(message);
            }
        }
        StmtKind::LocalClass(decl) => v.visit_class_body_mut(&mut decl.members),
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr.kind_mut() {
        ExprKind::Literal(_)
        | ExprKind::Name(_)
        | ExprKind::This
        | ExprKind::Super
        | ExprKind::ClassLit(_)
        | ExprKind::Type(_) => {}
        ExprKind::FieldAccess(field) => v.visit_expr_mut(&mut field.target),
        ExprKind::MethodCall(call) => {
            if let Some(target) = &mut call.target {
                v.visit_expr_mut(target);
            }
            for arg in &mut call.args {
                v.visit_expr_mut(arg);
            }
        }
        ExprKind::Index(index) => {
            v.visit_expr_mut(&mut index.target);
            v.visit_expr_mut(&mut index.index);
        }
        ExprKind::Unary(unary) => v.visit_expr_mut(&mut unary.expr),
        ExprKind::Binary(bin) => {
            v.visit_expr_mut(&mut bin.lhs);
            v.visit_expr_mut(&mut bin.rhs);
        }
        ExprKind::Assign(assign) => {
            v.visit_expr_mut(&mut assign.target);
            v.visit_expr_mut(&mut assign.value);
        }
        ExprKind::Conditional(cond) => {
            v.visit_expr_mut(&mut cond.cond);
            v.visit_expr_mut(&mut cond.then);
            v.visit_expr_mut(&mut cond.otherwise);
        }
        ExprKind::Cast(cast) => v.visit_expr_mut(&mut cast.expr),
        ExprKind::InstanceOf(instance_of) => v.visit_expr_mut(&mut instance_of.expr),
        ExprKind::New(new) => {
            for arg in &mut new.args {
                v.visit_expr_mut(arg);
            }
            if let Some(body) = &mut new.body {
                v.visit_class_body_mut(body);
            }
        }
        ExprKind::NewArray(array) => {
            for dim in array.dims.iter_mut().flatten() {
                v.visit_expr_mut(dim);
            }
            if let Some(init) = &mut array.init {
                for item in init {
                    v.visit_expr_mut(item);
                }
            }
        }
        ExprKind::ArrayInit(items) => {
            for item in items {
                v.visit_expr_mut(item);
            }
        }
        ExprKind::Lambda(lambda) => v.visit_lambda_mut(lambda),
        ExprKind::MethodRef(method_ref) => v.visit_expr_mut(&mut method_ref.target),
        ExprKind::Paren(inner) => v.visit_expr_mut(inner),
    }
}

pub fn walk_lambda_mut<V: VisitMut + ?Sized>(v: &mut V, lambda: &mut ExprLambda) {
    match &mut lambda.body {
        LambdaBody::Expr(expr) => v.visit_expr_mut(expr),
        LambdaBody::Block(block) => v.visit_block_mut(block),
    }
}

pub fn walk_members_mut<V: VisitMut + ?Sized>(v: &mut V, members: &mut [Member]) {
    for member in members {
        match member {
            Member::Field(field) => {
                for declarator in &mut field.declarators {
                    if let Some(init) = &mut declarator.init {
                        v.visit_expr_mut(init);
                    }
                }
            }
            Member::Method(method) | Member::Constructor(method) => {
                if let Some(body) = &mut method.body {
                    v.visit_block_mut(body);
                }
            }
            Member::Initializer(init) => v.visit_block_mut(&mut init.body),
            Member::Type(decl) => v.visit_class_body_mut(&mut decl.members),
        }
    }
}

/// Collect every name read or written in an expression, including names
/// inside nested lambdas.
pub fn expr_names(expr: &Expr) -> Vec<Ident> {
    struct Names(Vec<Ident>);
    impl Visit for Names {
        fn visit_expr(&mut self, expr: &Expr) {
            if let ExprKind::Name(name) = expr.kind() {
                self.0.push(name.clone());
            }
            walk_expr(self, expr)
        }
    }
    let mut names = Names(Vec::new());
    names.visit_expr(expr);
    names.0
}
