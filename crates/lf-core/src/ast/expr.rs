use super::{Block, Ident, Member, TypeRef};
use crate::ops::{AssignOp, BinOpKind, UnOpKind};

common_enum! {
    #[derive(Copy)]
    pub enum LitKind {
        Int,
        Long,
        Float,
        Double,
        Char,
        String,
        TextBlock,
        Bool,
        Null,
    }
}

common_struct! {
    /// A literal keeps its source spelling so printing is lossless.
    pub struct Literal {
        pub kind: LitKind,
        pub text: String,
    }
}

common_struct! {
    pub struct Expr {
        kind: Box<ExprKind>,
    }
}

common_enum! {
    pub enum ExprKind {
        Literal(Literal),
        Name(Ident),
        This,
        Super,
        FieldAccess(ExprField),
        MethodCall(ExprCall),
        Index(ExprIndex),
        Unary(ExprUnOp),
        Binary(ExprBinOp),
        Assign(ExprAssign),
        Conditional(ExprConditional),
        Cast(ExprCast),
        InstanceOf(ExprInstanceOf),
        New(ExprNew),
        NewArray(ExprNewArray),
        ArrayInit(Vec<Expr>),
        Lambda(ExprLambda),
        MethodRef(ExprMethodRef),
        ClassLit(TypeRef),
        /// A type in expression position, e.g. the target of `int[]::new`.
        Type(TypeRef),
        Paren(Expr),
    }
}

common_struct! {
    pub struct ExprField {
        pub target: Expr,
        pub field: Ident,
    }
}

common_struct! {
    pub struct ExprCall {
        pub target: Option<Expr>,
        pub type_args: Vec<TypeRef>,
        pub name: Ident,
        pub args: Vec<Expr>,
    }
}

common_struct! {
    pub struct ExprIndex {
        pub target: Expr,
        pub index: Expr,
    }
}

common_struct! {
    pub struct ExprUnOp {
        pub op: UnOpKind,
        pub expr: Expr,
    }
}

common_struct! {
    pub struct ExprBinOp {
        pub op: BinOpKind,
        pub lhs: Expr,
        pub rhs: Expr,
    }
}

common_struct! {
    pub struct ExprAssign {
        pub op: AssignOp,
        pub target: Expr,
        pub value: Expr,
    }
}

common_struct! {
    pub struct ExprConditional {
        pub cond: Expr,
        pub then: Expr,
        pub otherwise: Expr,
    }
}

common_struct! {
    pub struct ExprCast {
        pub ty: TypeRef,
        pub expr: Expr,
    }
}

common_struct! {
    pub struct ExprInstanceOf {
        pub expr: Expr,
        pub ty: TypeRef,
        pub binding: Option<Ident>,
    }
}

common_struct! {
    pub struct ExprNew {
        pub ty: TypeRef,
        pub args: Vec<Expr>,
        /// Anonymous class body.
        pub body: Option<Vec<Member>>,
    }
}

common_struct! {
    pub struct ExprNewArray {
        /// Element type without the dimensions written after it.
        pub ty: TypeRef,
        /// One entry per `[]`, `None` for an empty pair.
        pub dims: Vec<Option<Expr>>,
        pub init: Option<Vec<Expr>>,
    }
}

common_struct! {
    pub struct LambdaParam {
        pub name: Ident,
        pub ty: Option<TypeRef>,
    }
}

common_enum! {
    pub enum LambdaBody {
        Expr(Expr),
        Block(Block),
    }
}

common_struct! {
    pub struct ExprLambda {
        pub params: Vec<LambdaParam>,
        pub body: LambdaBody,
    }
}

common_struct! {
    pub struct ExprMethodRef {
        pub target: Expr,
        pub name: Ident,
    }
}

impl From<ExprKind> for Expr {
    fn from(kind: ExprKind) -> Self {
        Expr {
            kind: Box::new(kind),
        }
    }
}

impl Expr {
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ExprKind {
        &mut self.kind
    }

    pub fn into_kind(self) -> ExprKind {
        *self.kind
    }

    pub fn name(name: impl Into<Ident>) -> Self {
        ExprKind::Name(name.into()).into()
    }

    pub fn literal(kind: LitKind, text: impl Into<String>) -> Self {
        ExprKind::Literal(Literal {
            kind,
            text: text.into(),
        })
        .into()
    }

    pub fn int(value: i64) -> Self {
        Self::literal(LitKind::Int, value.to_string())
    }

    pub fn bool(value: bool) -> Self {
        Self::literal(LitKind::Bool, value.to_string())
    }

    pub fn null() -> Self {
        Self::literal(LitKind::Null, "null")
    }

    pub fn paren(inner: Expr) -> Self {
        ExprKind::Paren(inner).into()
    }

    pub fn field(target: Expr, field: impl Into<Ident>) -> Self {
        ExprKind::FieldAccess(ExprField {
            target,
            field: field.into(),
        })
        .into()
    }

    pub fn call(target: Option<Expr>, name: impl Into<Ident>, args: Vec<Expr>) -> Self {
        ExprKind::MethodCall(ExprCall {
            target,
            type_args: Vec::new(),
            name: name.into(),
            args,
        })
        .into()
    }

    /// `receiver.name(args)`.
    pub fn method(receiver: Expr, name: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Self::call(Some(receiver), name, args)
    }

    /// `Type.name(args)` for a simple class name.
    pub fn static_call(class: &str, name: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Self::call(Some(Expr::name(class)), name, args)
    }

    pub fn method_ref(target: Expr, name: impl Into<Ident>) -> Self {
        ExprKind::MethodRef(ExprMethodRef {
            target,
            name: name.into(),
        })
        .into()
    }

    pub fn unary(op: UnOpKind, expr: Expr) -> Self {
        ExprKind::Unary(ExprUnOp { op, expr }).into()
    }

    pub fn binary(op: BinOpKind, lhs: Expr, rhs: Expr) -> Self {
        ExprKind::Binary(ExprBinOp { op, lhs, rhs }).into()
    }

    pub fn assign(op: AssignOp, target: Expr, value: Expr) -> Self {
        ExprKind::Assign(ExprAssign { op, target, value }).into()
    }

    pub fn cast(ty: TypeRef, expr: Expr) -> Self {
        ExprKind::Cast(ExprCast { ty, expr }).into()
    }

    pub fn new_object(ty: TypeRef, args: Vec<Expr>) -> Self {
        ExprKind::New(ExprNew {
            ty,
            args,
            body: None,
        })
        .into()
    }

    /// Lambda with untyped parameters.
    pub fn lambda(params: Vec<Ident>, body: LambdaBody) -> Self {
        ExprKind::Lambda(ExprLambda {
            params: params
                .into_iter()
                .map(|name| LambdaParam { name, ty: None })
                .collect(),
            body,
        })
        .into()
    }

    /// `!(expr)`. Always parenthesized unless the operand is atomic.
    pub fn negate(expr: Expr) -> Self {
        let operand = if expr.is_atomic() {
            expr
        } else {
            Expr::paren(expr)
        };
        Expr::unary(UnOpKind::Not, operand)
    }

    /// Strip every layer of parentheses.
    pub fn strip_parens(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = expr.kind() {
            expr = inner;
        }
        expr
    }

    pub fn as_name(&self) -> Option<&Ident> {
        match self.kind() {
            ExprKind::Name(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.as_name().map_or(false, |ident| ident == name)
    }

    pub fn as_call(&self) -> Option<&ExprCall> {
        match self.kind() {
            ExprKind::MethodCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self.kind() {
            ExprKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.strip_parens().as_literal() {
            Some(Literal {
                kind: LitKind::Bool,
                text,
            }) => Some(text == "true"),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self.strip_parens().as_literal(),
            Some(Literal {
                kind: LitKind::Null,
                ..
            })
        )
    }

    /// Atoms never need parentheses in operand position.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self.kind(),
            ExprKind::Literal(_)
                | ExprKind::Name(_)
                | ExprKind::This
                | ExprKind::Super
                | ExprKind::FieldAccess(_)
                | ExprKind::MethodCall(_)
                | ExprKind::Index(_)
                | ExprKind::Paren(_)
                | ExprKind::ClassLit(_)
                | ExprKind::New(_)
                | ExprKind::NewArray(_)
                | ExprKind::MethodRef(_)
                | ExprKind::Type(_)
        )
    }

    /// Precedence used by the printer; atoms bind tightest.
    pub fn precedence(&self) -> u8 {
        match self.kind() {
            ExprKind::Lambda(_) => 0,
            ExprKind::Assign(_) => 1,
            ExprKind::Conditional(_) => 2,
            ExprKind::Binary(bin) => bin.op.precedence(),
            ExprKind::InstanceOf(_) => BinOpKind::Lt.precedence(),
            ExprKind::Cast(_) => 13,
            ExprKind::Unary(unary) if unary.op.is_postfix() => 15,
            ExprKind::Unary(_) => 14,
            _ => 16,
        }
    }
}
