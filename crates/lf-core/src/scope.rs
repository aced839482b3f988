//! Declarations visible at a loop, and the type oracle built over them.

use crate::ast::{Expr, ExprKind, Ident, LitKind, PrimitiveKind, TypeRef};
use crate::ops::UnOpKind;
use serde::{Deserialize, Serialize};

/// Weakly-consistent collection types whose iterators tolerate concurrent
/// modification instead of failing fast.
pub const CONCURRENT_COLLECTION_TYPES: &[&str] = &[
    "CopyOnWriteArrayList",
    "CopyOnWriteArraySet",
    "ConcurrentLinkedQueue",
    "ConcurrentLinkedDeque",
    "ConcurrentSkipListSet",
    "ConcurrentSkipListMap",
    "ConcurrentHashMap",
    "LinkedBlockingQueue",
    "LinkedBlockingDeque",
    "ArrayBlockingQueue",
    "PriorityBlockingQueue",
];

pub fn is_concurrent_collection_type(ty: &TypeRef) -> bool {
    !ty.is_array() && CONCURRENT_COLLECTION_TYPES.contains(&ty.simple_name())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    Local,
    Parameter,
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: Ident,
    pub ty: Option<TypeRef>,
    pub kind: DeclKind,
    /// Simple annotation names, e.g. `NonNull`.
    pub annotations: Vec<String>,
    /// Never assigned after its declaration.
    pub effectively_final: bool,
}

impl Declaration {
    pub fn new(name: impl Into<Ident>, ty: Option<TypeRef>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            ty,
            kind,
            annotations: Vec::new(),
            effectively_final: true,
        }
    }

    pub fn local(name: impl Into<Ident>, ty: TypeRef) -> Self {
        Self::new(name, Some(ty), DeclKind::Local)
    }

    pub fn field(name: impl Into<Ident>, ty: TypeRef) -> Self {
        Self::new(name, Some(ty), DeclKind::Field)
    }

    pub fn with_annotations(mut self, annotations: Vec<String>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn reassigned(mut self) -> Self {
        self.effectively_final = false;
        self
    }

    pub fn is_field(&self) -> bool {
        self.kind == DeclKind::Field
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }
}

/// Ordered declarations visible before a loop. Later entries shadow earlier
/// ones, so fields are pushed first and locals last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnclosingScope {
    decls: Vec<Declaration>,
}

impl EnclosingScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: Declaration) {
        self.decls.push(decl);
    }

    pub fn with(mut self, decl: Declaration) -> Self {
        self.push(decl);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Declaration> {
        self.decls.iter().rev().find(|decl| decl.name == name)
    }

    /// The field called `name`, ignoring shadowing locals.
    pub fn lookup_field(&self, name: &str) -> Option<&Declaration> {
        self.decls
            .iter()
            .rev()
            .find(|decl| decl.is_field() && decl.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// Static type oracle supplied by the host.
pub trait TypeResolver {
    /// Declared type of a simple name.
    fn type_of_name(&self, name: &str) -> Option<TypeRef>;

    /// Declared type of a field reached through `this.name`.
    fn type_of_field(&self, name: &str) -> Option<TypeRef> {
        self.type_of_name(name)
    }

    fn type_of(&self, expr: &Expr) -> Option<TypeRef> {
        infer_expr_type(self, expr)
    }

    fn is_concurrent_collection(&self, ty: &TypeRef) -> bool {
        is_concurrent_collection_type(ty)
    }
}

/// Resolver answering from an [`EnclosingScope`].
#[derive(Debug, Clone, Copy)]
pub struct ScopeTypeResolver<'a> {
    scope: &'a EnclosingScope,
}

impl<'a> ScopeTypeResolver<'a> {
    pub fn new(scope: &'a EnclosingScope) -> Self {
        Self { scope }
    }
}

impl TypeResolver for ScopeTypeResolver<'_> {
    fn type_of_name(&self, name: &str) -> Option<TypeRef> {
        self.scope.lookup(name).and_then(|decl| decl.ty.clone())
    }

    fn type_of_field(&self, name: &str) -> Option<TypeRef> {
        self.scope.lookup_field(name).and_then(|decl| decl.ty.clone())
    }
}

/// Resolver that knows a few extra names on top of another one, e.g. loop
/// bindings introduced inside the body.
pub struct LayeredResolver<'a> {
    base: &'a dyn TypeResolver,
    names: Vec<(Ident, Option<TypeRef>)>,
}

impl<'a> LayeredResolver<'a> {
    pub fn new(base: &'a dyn TypeResolver) -> Self {
        Self {
            base,
            names: Vec::new(),
        }
    }

    pub fn bind(&mut self, name: Ident, ty: Option<TypeRef>) {
        self.names.push((name, ty));
    }
}

impl TypeResolver for LayeredResolver<'_> {
    fn type_of_name(&self, name: &str) -> Option<TypeRef> {
        match self.names.iter().rev().find(|(ident, _)| ident == name) {
            Some((_, ty)) => ty.clone(),
            None => self.base.type_of_name(name),
        }
    }

    fn type_of_field(&self, name: &str) -> Option<TypeRef> {
        self.base.type_of_field(name)
    }

    fn is_concurrent_collection(&self, ty: &TypeRef) -> bool {
        self.base.is_concurrent_collection(ty)
    }
}

fn primitive(kind: PrimitiveKind) -> Option<TypeRef> {
    Some(TypeRef::primitive(kind))
}

/// Best-effort static type of an expression. Unknown is `None`; callers
/// must treat that as "could be anything".
pub fn infer_expr_type<R: TypeResolver + ?Sized>(resolver: &R, expr: &Expr) -> Option<TypeRef> {
    match expr.kind() {
        ExprKind::Literal(lit) => match lit.kind {
            LitKind::Int => primitive(PrimitiveKind::Int),
            LitKind::Long => primitive(PrimitiveKind::Long),
            LitKind::Float => primitive(PrimitiveKind::Float),
            LitKind::Double => primitive(PrimitiveKind::Double),
            LitKind::Char => primitive(PrimitiveKind::Char),
            LitKind::Bool => primitive(PrimitiveKind::Boolean),
            LitKind::String | LitKind::TextBlock => Some(TypeRef::string()),
            LitKind::Null => None,
        },
        ExprKind::Name(name) => resolver.type_of_name(name.as_str()),
        ExprKind::FieldAccess(field) => {
            if matches!(field.target.kind(), ExprKind::This) {
                return resolver.type_of_field(field.field.as_str());
            }
            let target = resolver.type_of(&field.target)?;
            if target.is_array() && field.field == "length" {
                return primitive(PrimitiveKind::Int);
            }
            None
        }
        ExprKind::MethodCall(call) => infer_call_type(resolver, call),
        ExprKind::Index(index) => {
            let target = resolver.type_of(&index.target)?;
            if target.is_array() {
                target.element_type()
            } else {
                None
            }
        }
        ExprKind::Unary(unary) => match unary.op {
            UnOpKind::Not => primitive(PrimitiveKind::Boolean),
            op if op.is_update() => resolver.type_of(&unary.expr),
            _ => {
                let kind = resolver.type_of(&unary.expr)?.numeric_kind()?;
                primitive(kind.promote(PrimitiveKind::Int))
            }
        },
        ExprKind::Binary(bin) => {
            if bin.op.is_ret_bool() {
                return primitive(PrimitiveKind::Boolean);
            }
            let lhs = resolver.type_of(&bin.lhs);
            let rhs = resolver.type_of(&bin.rhs);
            if bin.op == crate::ops::BinOpKind::Add
                && (lhs.as_ref().map_or(false, TypeRef::is_string)
                    || rhs.as_ref().map_or(false, TypeRef::is_string))
            {
                return Some(TypeRef::string());
            }
            let lhs = lhs?.numeric_kind()?;
            if bin.op.is_shift() {
                return primitive(lhs.promote(PrimitiveKind::Int));
            }
            let rhs = rhs?.numeric_kind()?;
            if lhs == PrimitiveKind::Boolean && rhs == PrimitiveKind::Boolean {
                return primitive(PrimitiveKind::Boolean);
            }
            primitive(lhs.promote(rhs))
        }
        ExprKind::Assign(assign) => resolver.type_of(&assign.target),
        ExprKind::Conditional(cond) => resolver
            .type_of(&cond.then)
            .or_else(|| resolver.type_of(&cond.otherwise)),
        ExprKind::Cast(cast) => Some(cast.ty.clone()),
        ExprKind::InstanceOf(_) => primitive(PrimitiveKind::Boolean),
        ExprKind::New(new) => Some(new.ty.clone()),
        ExprKind::NewArray(array) => {
            let mut ty = array.ty.clone();
            ty.dims += array.dims.len();
            Some(ty)
        }
        ExprKind::Paren(inner) => resolver.type_of(inner),
        ExprKind::ClassLit(ty) => Some(TypeRef::generic("Class", vec![ty.boxed()])),
        ExprKind::This
        | ExprKind::Super
        | ExprKind::ArrayInit(_)
        | ExprKind::Lambda(_)
        | ExprKind::MethodRef(_)
        | ExprKind::Type(_) => None,
    }
}

fn infer_call_type<R: TypeResolver + ?Sized>(
    resolver: &R,
    call: &crate::ast::ExprCall,
) -> Option<TypeRef> {
    let name = call.name.as_str();
    let Some(target) = &call.target else {
        return None;
    };
    if let Some(class) = target.as_name() {
        if resolver.type_of_name(class.as_str()).is_none() {
            if let Some(ty) = infer_static_call(resolver, class.as_str(), name, &call.args) {
                return Some(ty);
            }
        }
    }
    let receiver = resolver.type_of(target);
    match name {
        "size" | "length" | "indexOf" | "lastIndexOf" | "hashCode" | "compareTo" => {
            primitive(PrimitiveKind::Int)
        }
        "isEmpty" | "contains" | "containsKey" | "containsValue" | "equals" | "startsWith"
        | "endsWith" | "hasNext" | "isBlank" | "matches" | "equalsIgnoreCase" => {
            primitive(PrimitiveKind::Boolean)
        }
        "toString" | "trim" | "strip" | "toUpperCase" | "toLowerCase" | "substring" | "concat"
        | "repeat" | "name" => Some(TypeRef::string()),
        "charAt" => primitive(PrimitiveKind::Char),
        _ => {
            let receiver = receiver?;
            let args = receiver.type_args();
            match (name, args) {
                ("get" | "remove" | "next" | "getFirst" | "getLast" | "peek" | "poll", [item])
                    if !receiver.is_array() =>
                {
                    Some(item.upper_bound())
                }
                ("get" | "getOrDefault" | "remove", [_, value]) => Some(value.upper_bound()),
                ("keySet", [key, _]) => Some(TypeRef::generic("Set", vec![key.clone()])),
                ("values", [_, value]) => {
                    Some(TypeRef::generic("Collection", vec![value.clone()]))
                }
                ("entrySet", [key, value]) => Some(TypeRef::generic(
                    "Set",
                    vec![TypeRef::generic(
                        "Map.Entry",
                        vec![key.clone(), value.clone()],
                    )],
                )),
                ("getKey", [key, _]) => Some(key.upper_bound()),
                ("getValue", [_, value]) => Some(value.upper_bound()),
                ("iterator", [item]) => Some(TypeRef::generic("Iterator", vec![item.clone()])),
                ("stream", [item]) => Some(TypeRef::generic("Stream", vec![item.clone()])),
                _ => None,
            }
        }
    }
}

fn infer_static_call<R: TypeResolver + ?Sized>(
    resolver: &R,
    class: &str,
    name: &str,
    args: &[Expr],
) -> Option<TypeRef> {
    match (class, name) {
        ("Math", "max" | "min") => {
            let [lhs, rhs] = args else {
                return None;
            };
            let lhs = resolver.type_of(lhs)?.numeric_kind()?;
            let rhs = resolver.type_of(rhs)?.numeric_kind()?;
            primitive(lhs.promote(rhs))
        }
        ("Math", "abs") => {
            let [arg] = args else {
                return None;
            };
            let kind = resolver.type_of(arg)?.numeric_kind()?;
            primitive(kind.promote(PrimitiveKind::Int))
        }
        ("Math", "sqrt" | "pow" | "floor" | "ceil" | "random") => primitive(PrimitiveKind::Double),
        ("Math", "round") => primitive(PrimitiveKind::Long),
        ("String", "valueOf" | "format" | "join") => Some(TypeRef::string()),
        ("Integer", "parseInt") => primitive(PrimitiveKind::Int),
        ("Long", "parseLong") => primitive(PrimitiveKind::Long),
        ("Double", "parseDouble") => primitive(PrimitiveKind::Double),
        ("Integer" | "Long" | "Double" | "Float" | "Short" | "Byte", "valueOf") => {
            Some(TypeRef::named(class))
        }
        ("List", "of" | "copyOf") | ("Arrays", "asList") => {
            let item = args.first().and_then(|arg| resolver.type_of(arg));
            Some(TypeRef::generic(
                "List",
                item.map(|ty| vec![ty.boxed()]).unwrap_or_default(),
            ))
        }
        ("Set", "of" | "copyOf") => Some(TypeRef::named("Set")),
        ("Collections", "emptyList" | "unmodifiableList" | "synchronizedList") => {
            Some(TypeRef::named("List"))
        }
        ("Collections", "emptySet" | "unmodifiableSet" | "synchronizedSet") => {
            Some(TypeRef::named("Set"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::BinOpKind;

    fn scope() -> EnclosingScope {
        EnclosingScope::new()
            .with(Declaration::field("count", TypeRef::primitive(PrimitiveKind::Long)))
            .with(Declaration::local(
                "names",
                TypeRef::generic("List", vec![TypeRef::string()]),
            ))
            .with(Declaration::local("count", TypeRef::primitive(PrimitiveKind::Int)))
    }

    #[test]
    fn locals_shadow_fields() {
        let scope = scope();
        let resolver = ScopeTypeResolver::new(&scope);
        assert_eq!(
            resolver.type_of(&Expr::name("count")),
            Some(TypeRef::primitive(PrimitiveKind::Int))
        );
        assert_eq!(
            resolver.type_of(&Expr::field(Expr::from(ExprKind::This), "count")),
            Some(TypeRef::primitive(PrimitiveKind::Long))
        );
    }

    #[test]
    fn infers_through_calls_and_promotion() {
        let scope = scope();
        let resolver = ScopeTypeResolver::new(&scope);
        let get = Expr::method(Expr::name("names"), "get", vec![Expr::int(0)]);
        assert_eq!(resolver.type_of(&get), Some(TypeRef::string()));
        let sum = Expr::binary(
            BinOpKind::Add,
            Expr::name("count"),
            Expr::literal(LitKind::Long, "1L"),
        );
        assert_eq!(resolver.type_of(&sum), Some(TypeRef::primitive(PrimitiveKind::Long)));
        let concat = Expr::binary(BinOpKind::Add, get, Expr::int(1));
        assert_eq!(resolver.type_of(&concat), Some(TypeRef::string()));
    }

    #[test]
    fn concurrent_types_match_by_simple_name() {
        assert!(is_concurrent_collection_type(&TypeRef::named(
            "java.util.concurrent.CopyOnWriteArrayList"
        )));
        assert!(!is_concurrent_collection_type(&TypeRef::named("ArrayList")));
    }
}
