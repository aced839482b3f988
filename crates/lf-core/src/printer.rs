//! Java source printer.
//!
//! Prints the syntax tree back to source with minimal parentheses. Block
//! lambdas are laid out over several lines at the indentation of the
//! statement that contains them.

use crate::ast::*;
use crate::ops::UnOpKind;
use itertools::Itertools;

/// Configuration for printing.
#[derive(Debug, Clone)]
pub struct PrettyOptions {
    /// Number of spaces to indent per nesting level.
    pub indent_size: usize,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self { indent_size: 4 }
    }
}

/// Formatting context shared by the statement and expression printers.
struct PrettyCtx<'a> {
    options: &'a PrettyOptions,
    indent: usize,
    out: String,
}

impl<'a> PrettyCtx<'a> {
    fn new(options: &'a PrettyOptions) -> Self {
        Self {
            options,
            indent: 0,
            out: String::new(),
        }
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.write_indent();
    }

    fn with_indent(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += self.options.indent_size;
        f(self);
        self.indent = self.indent.saturating_sub(self.options.indent_size);
    }
}

#[derive(Debug, Clone, Default)]
pub struct JavaPrinter {
    options: PrettyOptions,
}

impl JavaPrinter {
    pub fn new(options: PrettyOptions) -> Self {
        Self { options }
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        let mut ctx = PrettyCtx::new(&self.options);
        write_expr(&mut ctx, expr, 0);
        ctx.out
    }

    /// Print one statement. The first line carries no indentation; nested
    /// lines are indented relative to it.
    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        let mut ctx = PrettyCtx::new(&self.options);
        write_stmt(&mut ctx, stmt);
        ctx.out
    }

    /// Print statements one per line, relative to an unindented first line.
    pub fn print_stmts(&self, stmts: &[Stmt]) -> String {
        let mut ctx = PrettyCtx::new(&self.options);
        for (idx, stmt) in stmts.iter().enumerate() {
            if idx > 0 {
                ctx.newline();
            }
            write_stmt(&mut ctx, stmt);
        }
        ctx.out
    }

    pub fn print_type_decl(&self, decl: &TypeDecl) -> String {
        let mut ctx = PrettyCtx::new(&self.options);
        write_type_decl(&mut ctx, decl);
        ctx.out
    }
}

fn write_comment_lines(ctx: &mut PrettyCtx<'_>, comment: &Comment) {
    for (idx, line) in comment.text.lines().enumerate() {
        if idx > 0 {
            ctx.newline();
        }
        ctx.write(line.trim_end());
    }
}

fn write_stmt(ctx: &mut PrettyCtx<'_>, stmt: &Stmt) {
    for comment in &stmt.comments.leading {
        write_comment_lines(ctx, comment);
        ctx.newline();
    }
    write_stmt_kind(ctx, &stmt.kind);
    for comment in &stmt.comments.trailing {
        if comment.same_line {
            ctx.write(" ");
        } else {
            ctx.newline();
        }
        write_comment_lines(ctx, comment);
    }
}

fn write_block(ctx: &mut PrettyCtx<'_>, block: &Block) {
    ctx.write("{");
    ctx.with_indent(|ctx| {
        for stmt in &block.stmts {
            ctx.newline();
            write_stmt(ctx, stmt);
        }
        for comment in &block.dangling {
            ctx.newline();
            write_comment_lines(ctx, comment);
        }
    });
    ctx.newline();
    ctx.write("}");
}

/// Body of a compound statement: blocks stay on the header line, anything
/// else moves to an indented line of its own.
fn write_body(ctx: &mut PrettyCtx<'_>, body: &Stmt) {
    match &body.kind {
        StmtKind::Block(block) if body.comments.is_empty() => {
            ctx.write(" ");
            write_block(ctx, block);
        }
        _ => ctx.with_indent(|ctx| {
            ctx.newline();
            write_stmt(ctx, body);
        }),
    }
}

fn write_modifiers(ctx: &mut PrettyCtx<'_>, modifiers: &Modifiers) {
    for annotation in &modifiers.annotations {
        write_annotation(ctx, annotation);
        ctx.write(" ");
    }
    for keyword in &modifiers.keywords {
        ctx.write(keyword);
        ctx.write(" ");
    }
}

fn write_annotation(ctx: &mut PrettyCtx<'_>, annotation: &Annotation) {
    ctx.write("@");
    ctx.write(&annotation.name);
    if !annotation.args.is_empty() {
        ctx.write("(");
        write_expr_list(ctx, &annotation.args);
        ctx.write(")");
    }
}

fn write_local_var(ctx: &mut PrettyCtx<'_>, local: &StmtLocalVar) {
    write_modifiers(ctx, &local.modifiers);
    ctx.write(&local.ty.to_string());
    ctx.write(" ");
    write_declarators(ctx, &local.declarators);
}

fn write_declarators(ctx: &mut PrettyCtx<'_>, declarators: &[VarDeclarator]) {
    for (idx, declarator) in declarators.iter().enumerate() {
        if idx > 0 {
            ctx.write(", ");
        }
        ctx.write(declarator.name.as_str());
        for _ in 0..declarator.dims {
            ctx.write("[]");
        }
        if let Some(init) = &declarator.init {
            ctx.write(" = ");
            write_expr(ctx, init, 0);
        }
    }
}

fn write_stmt_kind(ctx: &mut PrettyCtx<'_>, kind: &StmtKind) {
    match kind {
        StmtKind::Empty => ctx.write(";"),
        StmtKind::Block(block) => write_block(ctx, block),
        StmtKind::LocalVar(local) => {
            write_local_var(ctx, local);
            ctx.write(";");
        }
        StmtKind::Expr(expr) => {
            write_expr(ctx, expr, 0);
            ctx.write(";");
        }
        StmtKind::If(stmt_if) => {
            ctx.write("if (");
            write_expr(ctx, &stmt_if.cond, 0);
            ctx.write(")");
            write_body(ctx, &stmt_if.then);
            if let Some(otherwise) = &stmt_if.otherwise {
                if matches!(stmt_if.then.kind, StmtKind::Block(_)) && stmt_if.then.comments.is_empty()
                {
                    ctx.write(" ");
                } else {
                    ctx.newline();
                }
                ctx.write("else");
                match &otherwise.kind {
                    StmtKind::If(_) if otherwise.comments.is_empty() => {
                        ctx.write(" ");
                        write_stmt(ctx, otherwise);
                    }
                    _ => write_body(ctx, otherwise),
                }
            }
        }
        StmtKind::For(stmt_for) => {
            ctx.write("for (");
            for (idx, init) in stmt_for.init.iter().enumerate() {
                if idx > 0 {
                    ctx.write(", ");
                }
                match &init.kind {
                    StmtKind::LocalVar(local) => write_local_var(ctx, local),
                    StmtKind::Expr(expr) => write_expr(ctx, expr, 0),
                    other => write_stmt_kind(ctx, other),
                }
            }
            ctx.write(";");
            if let Some(cond) = &stmt_for.cond {
                ctx.write(" ");
                write_expr(ctx, cond, 0);
            }
            ctx.write(";");
            if !stmt_for.update.is_empty() {
                ctx.write(" ");
                write_expr_list(ctx, &stmt_for.update);
            }
            ctx.write(")");
            write_body(ctx, &stmt_for.body);
        }
        StmtKind::ForEach(for_each) => {
            ctx.write("for (");
            write_modifiers(ctx, &for_each.modifiers);
            ctx.write(&for_each.ty.to_string());
            ctx.write(" ");
            ctx.write(for_each.name.as_str());
            ctx.write(" : ");
            write_expr(ctx, &for_each.iterable, 0);
            ctx.write(")");
            write_body(ctx, &for_each.body);
        }
        StmtKind::While(stmt_while) => {
            ctx.write("while (");
            write_expr(ctx, &stmt_while.cond, 0);
            ctx.write(")");
            write_body(ctx, &stmt_while.body);
        }
        StmtKind::DoWhile(do_while) => {
            ctx.write("do");
            write_body(ctx, &do_while.body);
            if matches!(do_while.body.kind, StmtKind::Block(_)) {
                ctx.write(" ");
            } else {
                ctx.newline();
            }
            ctx.write("while (");
            write_expr(ctx, &do_while.cond, 0);
            ctx.write(");");
        }
        StmtKind::Return(value) => {
            ctx.write("return");
            if let Some(value) = value {
                ctx.write(" ");
                write_expr(ctx, value, 0);
            }
            ctx.write(";");
        }
        StmtKind::Break(label) => {
            ctx.write("break");
            if let Some(label) = label {
                ctx.write(" ");
                ctx.write(label.as_str());
            }
            ctx.write(";");
        }
        StmtKind::Continue(label) => {
            ctx.write("continue");
            if let Some(label) = label {
                ctx.write(" ");
                ctx.write(label.as_str());
            }
            ctx.write(";");
        }
        StmtKind::Throw(expr) => {
            ctx.write("throw ");
            write_expr(ctx, expr, 0);
            ctx.write(";");
        }
        StmtKind::Try(stmt_try) => {
            ctx.write("try ");
            if !stmt_try.resources.is_empty() {
                ctx.write("(");
                for (idx, resource) in stmt_try.resources.iter().enumerate() {
                    if idx > 0 {
                        ctx.write("; ");
                    }
                    match &resource.kind {
                        StmtKind::LocalVar(local) => write_local_var(ctx, local),
                        StmtKind::Expr(expr) => write_expr(ctx, expr, 0),
                        other => write_stmt_kind(ctx, other),
                    }
                }
                ctx.write(") ");
            }
            write_block(ctx, &stmt_try.body);
            for catch in &stmt_try.catches {
                ctx.write(" catch (");
                write_modifiers(ctx, &catch.modifiers);
                let types = catch.types.iter().map(|ty| ty.to_string()).join(" | ");
                ctx.write(&types);
                ctx.write(" ");
                ctx.write(catch.name.as_str());
                ctx.write(") ");
                write_block(ctx, &catch.body);
            }
            if let Some(finally) = &stmt_try.finally {
                ctx.write(" finally ");
                write_block(ctx, finally);
            }
        }
        StmtKind::Switch(switch) => {
            ctx.write("switch (");
            write_expr(ctx, &switch.selector, 0);
            ctx.write(") {");
            ctx.with_indent(|ctx| {
                for case in &switch.cases {
                    ctx.newline();
                    if case.labels.is_empty() {
                        ctx.write("default");
                    } else {
                        ctx.write("case ");
                        write_expr_list(ctx, &case.labels);
                    }
                    if case.arrow {
                        ctx.write(" -> ");
                        for stmt in &case.body {
                            write_stmt(ctx, stmt);
                        }
                    } else {
                        ctx.write(":");
                        ctx.with_indent(|ctx| {
                            for stmt in &case.body {
                                ctx.newline();
                                write_stmt(ctx, stmt);
                            }
                        });
                    }
                }
            });
            ctx.newline();
            ctx.write("}");
        }
        StmtKind::Synchronized(sync) => {
            ctx.write("synchronized (");
            write_expr(ctx, &sync.lock, 0);
            ctx.write(") ");
            write_block(ctx, &sync.body);
        }
        StmtKind::Labeled(labeled) => {
            ctx.write(labeled.label.as_str());
            ctx.write(": ");
            write_stmt(ctx, &labeled.body);
        }
        StmtKind::Assert(assert) => {
            ctx.write("assert ");
            write_expr(ctx, &assert.cond, 0);
            if let Some(message) = &assert.message {
                ctx.write(" : ");
                write_expr(ctx, message, 0);
            }
            ctx.write(";");
        }
        StmtKind::LocalClass(decl) => write_type_decl(ctx, decl),
    }
}

fn write_expr_list(ctx: &mut PrettyCtx<'_>, exprs: &[Expr]) {
    for (idx, expr) in exprs.iter().enumerate() {
        if idx > 0 {
            ctx.write(", ");
        }
        write_expr(ctx, expr, 0);
    }
}

fn write_type_args(ctx: &mut PrettyCtx<'_>, args: &[TypeRef]) {
    if !args.is_empty() {
        ctx.write("<");
        ctx.write(&args.iter().map(|ty| ty.to_string()).join(", "));
        ctx.write(">");
    }
}

/// Print `expr`, parenthesized when it binds looser than `min_prec`.
fn write_expr(ctx: &mut PrettyCtx<'_>, expr: &Expr, min_prec: u8) {
    if expr.precedence() < min_prec {
        ctx.write("(");
        write_expr_kind(ctx, expr.kind());
        ctx.write(")");
    } else {
        write_expr_kind(ctx, expr.kind());
    }
}

fn write_expr_kind(ctx: &mut PrettyCtx<'_>, kind: &ExprKind) {
    match kind {
        ExprKind::Literal(lit) => ctx.write(&lit.text),
        ExprKind::Name(name) => ctx.write(name.as_str()),
        ExprKind::This => ctx.write("this"),
        ExprKind::Super => ctx.write("super"),
        ExprKind::FieldAccess(field) => {
            write_expr(ctx, &field.target, 16);
            ctx.write(".");
            ctx.write(field.field.as_str());
        }
        ExprKind::MethodCall(call) => {
            if let Some(target) = &call.target {
                write_expr(ctx, target, 16);
                ctx.write(".");
            }
            write_type_args(ctx, &call.type_args);
            ctx.write(call.name.as_str());
            ctx.write("(");
            write_expr_list(ctx, &call.args);
            ctx.write(")");
        }
        ExprKind::Index(index) => {
            write_expr(ctx, &index.target, 16);
            ctx.write("[");
            write_expr(ctx, &index.index, 0);
            ctx.write("]");
        }
        ExprKind::Unary(unary) => {
            if unary.op.is_postfix() {
                write_expr(ctx, &unary.expr, 15);
                ctx.write(unary.op.symbol());
            } else {
                ctx.write(unary.op.symbol());
                // `- -x` and `+ +x` must not fuse into `--x`/`++x`.
                if let ExprKind::Unary(inner) = unary.expr.kind() {
                    if matches!(unary.op, UnOpKind::Neg | UnOpKind::Plus)
                        && !inner.op.is_postfix()
                        && inner.op.symbol().starts_with(unary.op.symbol())
                    {
                        ctx.write(" ");
                    }
                }
                write_expr(ctx, &unary.expr, 14);
            }
        }
        ExprKind::Binary(bin) => {
            let prec = bin.op.precedence();
            write_expr(ctx, &bin.lhs, prec);
            ctx.write(" ");
            ctx.write(bin.op.symbol());
            ctx.write(" ");
            write_expr(ctx, &bin.rhs, prec + 1);
        }
        ExprKind::Assign(assign) => {
            write_expr(ctx, &assign.target, 2);
            ctx.write(" ");
            ctx.write(assign.op.symbol());
            ctx.write(" ");
            write_expr(ctx, &assign.value, 0);
        }
        ExprKind::Conditional(cond) => {
            write_expr(ctx, &cond.cond, 3);
            ctx.write(" ? ");
            write_expr(ctx, &cond.then, 0);
            ctx.write(" : ");
            write_expr(ctx, &cond.otherwise, 2);
        }
        ExprKind::Cast(cast) => {
            ctx.write("(");
            ctx.write(&cast.ty.to_string());
            ctx.write(") ");
            write_expr(ctx, &cast.expr, 14);
        }
        ExprKind::InstanceOf(instance_of) => {
            write_expr(ctx, &instance_of.expr, 9);
            ctx.write(" instanceof ");
            ctx.write(&instance_of.ty.to_string());
            if let Some(binding) = &instance_of.binding {
                ctx.write(" ");
                ctx.write(binding.as_str());
            }
        }
        ExprKind::New(new) => {
            ctx.write("new ");
            ctx.write(&new.ty.to_string());
            ctx.write("(");
            write_expr_list(ctx, &new.args);
            ctx.write(")");
            if let Some(body) = &new.body {
                ctx.write(" ");
                write_class_body(ctx, body);
            }
        }
        ExprKind::NewArray(array) => {
            ctx.write("new ");
            ctx.write(&array.ty.to_string());
            for dim in &array.dims {
                ctx.write("[");
                if let Some(dim) = dim {
                    write_expr(ctx, dim, 0);
                }
                ctx.write("]");
            }
            if let Some(init) = &array.init {
                ctx.write(" {");
                write_expr_list(ctx, init);
                ctx.write("}");
            }
        }
        ExprKind::ArrayInit(items) => {
            ctx.write("{");
            write_expr_list(ctx, items);
            ctx.write("}");
        }
        ExprKind::Lambda(lambda) => write_lambda(ctx, lambda),
        ExprKind::MethodRef(method_ref) => {
            write_expr(ctx, &method_ref.target, 16);
            ctx.write("::");
            ctx.write(method_ref.name.as_str());
        }
        ExprKind::ClassLit(ty) => {
            ctx.write(&ty.to_string());
            ctx.write(".class");
        }
        ExprKind::Type(ty) => ctx.write(&ty.to_string()),
        ExprKind::Paren(inner) => {
            ctx.write("(");
            write_expr(ctx, inner, 0);
            ctx.write(")");
        }
    }
}

fn write_lambda(ctx: &mut PrettyCtx<'_>, lambda: &ExprLambda) {
    match lambda.params.as_slice() {
        [LambdaParam { name, ty: None }] => ctx.write(name.as_str()),
        params => {
            ctx.write("(");
            for (idx, param) in params.iter().enumerate() {
                if idx > 0 {
                    ctx.write(", ");
                }
                if let Some(ty) = &param.ty {
                    ctx.write(&ty.to_string());
                    ctx.write(" ");
                }
                ctx.write(param.name.as_str());
            }
            ctx.write(")");
        }
    }
    ctx.write(" -> ");
    match &lambda.body {
        LambdaBody::Expr(expr) => write_expr(ctx, expr, 0),
        LambdaBody::Block(block) => write_block(ctx, block),
    }
}

fn write_class_body(ctx: &mut PrettyCtx<'_>, members: &[Member]) {
    ctx.write("{");
    ctx.with_indent(|ctx| {
        for member in members {
            ctx.newline();
            write_member(ctx, member);
        }
    });
    ctx.newline();
    ctx.write("}");
}

fn write_params(ctx: &mut PrettyCtx<'_>, params: &[Param]) {
    ctx.write("(");
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            ctx.write(", ");
        }
        write_modifiers(ctx, &param.modifiers);
        ctx.write(&param.ty.to_string());
        ctx.write(if param.varargs { "... " } else { " " });
        ctx.write(param.name.as_str());
    }
    ctx.write(")");
}

fn write_member(ctx: &mut PrettyCtx<'_>, member: &Member) {
    match member {
        Member::Field(field) => {
            write_modifiers(ctx, &field.modifiers);
            ctx.write(&field.ty.to_string());
            ctx.write(" ");
            write_declarators(ctx, &field.declarators);
            ctx.write(";");
        }
        Member::Method(method) | Member::Constructor(method) => {
            write_modifiers(ctx, &method.modifiers);
            if let Some(type_params) = &method.type_params {
                ctx.write(type_params);
                ctx.write(" ");
            }
            if let Some(ret) = &method.ret {
                ctx.write(&ret.to_string());
                ctx.write(" ");
            }
            ctx.write(method.name.as_str());
            write_params(ctx, &method.params);
            if !method.throws.is_empty() {
                ctx.write(" throws ");
                ctx.write(&method.throws.iter().map(|ty| ty.to_string()).join(", "));
            }
            match &method.body {
                Some(body) => {
                    ctx.write(" ");
                    write_block(ctx, body);
                }
                None => ctx.write(";"),
            }
        }
        Member::Initializer(init) => {
            if init.is_static {
                ctx.write("static ");
            }
            write_block(ctx, &init.body);
        }
        Member::Type(decl) => write_type_decl(ctx, decl),
    }
}

fn write_type_decl(ctx: &mut PrettyCtx<'_>, decl: &TypeDecl) {
    write_modifiers(ctx, &decl.modifiers);
    ctx.write(decl.kind.keyword());
    ctx.write(" ");
    ctx.write(decl.name.as_str());
    if let Some(type_params) = &decl.type_params {
        ctx.write(type_params);
    }
    if decl.kind == TypeDeclKind::Record {
        write_params(ctx, &decl.record_components);
    }
    if !decl.extends.is_empty() {
        ctx.write(" extends ");
        ctx.write(&decl.extends.iter().map(|ty| ty.to_string()).join(", "));
    }
    if !decl.implements.is_empty() {
        ctx.write(" implements ");
        ctx.write(&decl.implements.iter().map(|ty| ty.to_string()).join(", "));
    }
    ctx.write(" {");
    ctx.with_indent(|ctx| {
        if !decl.enum_constants.is_empty() {
            ctx.newline();
            for (idx, constant) in decl.enum_constants.iter().enumerate() {
                if idx > 0 {
                    ctx.write(", ");
                }
                ctx.write(constant.name.as_str());
                if let Some(args) = &constant.args {
                    ctx.write("(");
                    write_expr_list(ctx, args);
                    ctx.write(")");
                }
                if let Some(body) = &constant.body {
                    ctx.write(" ");
                    write_class_body(ctx, body);
                }
            }
            ctx.write(";");
        }
        for member in &decl.members {
            ctx.newline();
            write_member(ctx, member);
        }
    });
    ctx.newline();
    ctx.write("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::BinOpKind;

    #[test]
    fn parenthesizes_by_precedence() {
        let printer = JavaPrinter::default();
        let sum = Expr::binary(BinOpKind::Add, Expr::name("a"), Expr::name("b"));
        let product = Expr::binary(BinOpKind::Mul, sum.clone(), Expr::name("c"));
        assert_eq!(printer.print_expr(&product), "(a + b) * c");
        let right = Expr::binary(BinOpKind::Sub, Expr::name("a"), sum);
        assert_eq!(printer.print_expr(&right), "a - (a + b)");
        let negated = Expr::unary(UnOpKind::Neg, Expr::unary(UnOpKind::Neg, Expr::name("x")));
        assert_eq!(printer.print_expr(&negated), "- -x");
    }

    #[test]
    fn block_lambda_spans_lines() {
        let printer = JavaPrinter::default();
        let body = Block::new(vec![
            Stmt::expr(Expr::call(None, "foo", vec![Expr::name("x")])),
            Stmt::ret(Some(Expr::name("x"))),
        ]);
        let lambda = Expr::lambda(vec![Ident::new("x")], LambdaBody::Block(body));
        let call = Expr::method(Expr::name("s"), "map", vec![lambda]);
        assert_eq!(
            printer.print_stmt(&Stmt::expr(call)),
            "s.map(x -> {\n    foo(x);\n    return x;\n});"
        );
    }

    #[test]
    fn comments_lead_and_trail() {
        let printer = JavaPrinter::default();
        let stmt = Stmt::expr(Expr::call(None, "run", vec![])).with_comments(Comments {
            leading: vec![Comment::line("first")],
            trailing: vec![Comment {
                text: "// after".into(),
                same_line: true,
            }],
        });
        assert_eq!(printer.print_stmt(&stmt), "// first\nrun(); // after");
    }
}
