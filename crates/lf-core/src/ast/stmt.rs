use super::{Expr, Ident, Modifiers, TypeDecl, TypeRef};
use crate::span::Span;

common_struct! {
    /// A source comment with its delimiters, e.g. `// note` or `/* note */`.
    pub struct Comment {
        pub text: String,
        /// Printed on the same line as the statement it trails.
        pub same_line: bool,
    }
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            same_line: false,
        }
    }

    /// `// text` for a plain comment body.
    pub fn line(body: &str) -> Self {
        Self::new(format!("// {}", body.trim()))
    }

    pub fn is_line_comment(&self) -> bool {
        self.text.starts_with("//")
    }

    /// Comment text without delimiters, one entry per non-empty line.
    pub fn body_lines(&self) -> Vec<String> {
        let text = self.text.as_str();
        if let Some(rest) = text.strip_prefix("//") {
            return vec![rest.trim().to_string()];
        }
        let inner = text
            .strip_prefix("/**")
            .or_else(|| text.strip_prefix("/*"))
            .unwrap_or(text);
        let inner = inner.strip_suffix("*/").unwrap_or(inner);
        inner
            .lines()
            .map(|line| line.trim().trim_start_matches('*').trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

common_struct! {
    #[derive(Default)]
    pub struct Comments {
        pub leading: Vec<Comment>,
        pub trailing: Vec<Comment>,
    }
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.leading.iter().chain(self.trailing.iter())
    }
}

common_struct! {
    pub struct Stmt {
        pub kind: StmtKind,
        pub span: Span,
        pub comments: Comments,
    }
}

common_struct! {
    #[derive(Default)]
    pub struct Block {
        pub stmts: Vec<Stmt>,
        pub span: Span,
        /// Comments before the closing brace that follow no statement.
        pub dangling: Vec<Comment>,
    }
}

common_enum! {
    pub enum StmtKind {
        Empty,
        Block(Block),
        LocalVar(StmtLocalVar),
        Expr(Expr),
        If(StmtIf),
        For(StmtFor),
        ForEach(StmtForEach),
        While(StmtWhile),
        DoWhile(StmtDoWhile),
        Return(Option<Expr>),
        Break(Option<Ident>),
        Continue(Option<Ident>),
        Throw(Expr),
        Try(StmtTry),
        Switch(StmtSwitch),
        Synchronized(StmtSynchronized),
        Labeled(StmtLabeled),
        Assert(StmtAssert),
        LocalClass(TypeDecl),
    }
}

common_struct! {
    pub struct VarDeclarator {
        pub name: Ident,
        /// Dimensions written after the name, `int a[]`.
        pub dims: usize,
        pub init: Option<Expr>,
    }
}

common_struct! {
    pub struct StmtLocalVar {
        pub modifiers: Modifiers,
        pub ty: TypeRef,
        pub declarators: Vec<VarDeclarator>,
    }
}

impl StmtLocalVar {
    /// Declared type of one declarator, including trailing dimensions.
    pub fn declarator_type(&self, declarator: &VarDeclarator) -> TypeRef {
        let mut ty = self.ty.clone();
        ty.dims += declarator.dims;
        ty
    }

    pub fn single(&self) -> Option<&VarDeclarator> {
        match self.declarators.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }
}

common_struct! {
    pub struct StmtIf {
        pub cond: Expr,
        pub then: Box<Stmt>,
        pub otherwise: Option<Box<Stmt>>,
    }
}

common_struct! {
    pub struct StmtFor {
        pub init: Vec<Stmt>,
        pub cond: Option<Expr>,
        pub update: Vec<Expr>,
        pub body: Box<Stmt>,
    }
}

common_struct! {
    pub struct StmtForEach {
        pub modifiers: Modifiers,
        pub ty: TypeRef,
        pub name: Ident,
        pub iterable: Expr,
        pub body: Box<Stmt>,
    }
}

common_struct! {
    pub struct StmtWhile {
        pub cond: Expr,
        pub body: Box<Stmt>,
    }
}

common_struct! {
    pub struct StmtDoWhile {
        pub body: Box<Stmt>,
        pub cond: Expr,
    }
}

common_struct! {
    pub struct CatchClause {
        pub modifiers: Modifiers,
        pub types: Vec<TypeRef>,
        pub name: Ident,
        pub body: Block,
    }
}

common_struct! {
    pub struct StmtTry {
        pub resources: Vec<Stmt>,
        pub body: Block,
        pub catches: Vec<CatchClause>,
        pub finally: Option<Block>,
    }
}

common_struct! {
    pub struct SwitchCase {
        /// Empty for `default`.
        pub labels: Vec<Expr>,
        pub arrow: bool,
        pub body: Vec<Stmt>,
    }
}

common_struct! {
    pub struct StmtSwitch {
        pub selector: Expr,
        pub cases: Vec<SwitchCase>,
    }
}

common_struct! {
    pub struct StmtSynchronized {
        pub lock: Expr,
        pub body: Block,
    }
}

common_struct! {
    pub struct StmtLabeled {
        pub label: Ident,
        pub body: Box<Stmt>,
    }
}

common_struct! {
    pub struct StmtAssert {
        pub cond: Expr,
        pub message: Option<Expr>,
    }
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self {
            kind,
            span,
            comments: Comments::default(),
        }
    }

    /// A statement with no source position.
    pub fn synthetic(kind: StmtKind) -> Self {
        Self::new(kind, Span::null())
    }

    pub fn expr(expr: Expr) -> Self {
        Self::synthetic(StmtKind::Expr(expr))
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::synthetic(StmtKind::Return(value))
    }

    pub fn with_comments(mut self, comments: Comments) -> Self {
        self.comments = comments;
        self
    }

    /// Statements of a block, or the statement itself.
    pub fn as_stmt_list(&self) -> &[Stmt] {
        match &self.kind {
            StmtKind::Block(block) => &block.stmts,
            _ => std::slice::from_ref(self),
        }
    }

    pub fn as_expr(&self) -> Option<&Expr> {
        match &self.kind {
            StmtKind::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::For(_) | StmtKind::ForEach(_) | StmtKind::While(_) | StmtKind::DoWhile(_)
        )
    }

    /// `continue;` on its own or as the only statement of a block.
    pub fn is_plain_continue(&self) -> bool {
        match self.as_stmt_list() {
            [single] => matches!(single.kind, StmtKind::Continue(None)),
            _ => false,
        }
    }
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self {
            stmts,
            span: Span::null(),
            dangling: Vec::new(),
        }
    }
}
