//! Normalized snapshot of one loop construct.

use lf_core::ast::{Comment, Expr, ExprKind, Ident, Stmt, StmtKind, TypeRef};
use lf_core::scope::EnclosingScope;
use lf_core::span::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "kebab-case")]
pub enum LoopKind {
    /// `for (T x : source)`
    #[display("element-for-each")]
    ElementForEach,
    /// `for (int i = 0; i < t.length; i++)`
    #[display("indexed-counter")]
    IndexedCounter,
    /// `while (it.hasNext()) { T x = it.next(); .. }`
    #[display("iterator-while")]
    IteratorWhile,
}

impl LoopKind {
    /// Syntactic guess used for reporting; `None` for loops no extractor
    /// handles, such as `do`/`while`.
    pub fn of_stmt(stmt: &Stmt) -> Option<LoopKind> {
        match &stmt.kind {
            StmtKind::ForEach(_) => Some(LoopKind::ElementForEach),
            StmtKind::For(stmt_for) => {
                let header_is_iterator = stmt_for.cond.as_ref().map_or(false, is_has_next_call);
                Some(if header_is_iterator {
                    LoopKind::IteratorWhile
                } else {
                    LoopKind::IndexedCounter
                })
            }
            StmtKind::While(stmt_while) if is_has_next_call(&stmt_while.cond) => {
                Some(LoopKind::IteratorWhile)
            }
            StmtKind::Labeled(labeled) => LoopKind::of_stmt(&labeled.body),
            _ => None,
        }
    }
}

fn is_has_next_call(expr: &Expr) -> bool {
    matches!(
        expr.strip_parens().as_call(),
        Some(call) if call.name == "hasNext" && call.args.is_empty() && call.target.is_some()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum SourceKind {
    #[display("collection")]
    Collection,
    #[display("array")]
    Array,
    #[display("iterable")]
    Iterable,
    #[display("range")]
    Range,
}

/// Collection types with a native `stream()` accessor.
const COLLECTION_TYPES: &[&str] = &[
    "Collection",
    "List",
    "ArrayList",
    "LinkedList",
    "Vector",
    "Stack",
    "Set",
    "HashSet",
    "LinkedHashSet",
    "TreeSet",
    "SortedSet",
    "NavigableSet",
    "EnumSet",
    "Queue",
    "Deque",
    "ArrayDeque",
    "PriorityQueue",
    "CopyOnWriteArrayList",
    "CopyOnWriteArraySet",
    "ConcurrentLinkedQueue",
    "ConcurrentLinkedDeque",
    "ConcurrentSkipListSet",
    "LinkedBlockingQueue",
    "LinkedBlockingDeque",
    "ArrayBlockingQueue",
    "PriorityBlockingQueue",
    "BlockingQueue",
];

/// `Iterable` or one of the known collection types.
pub fn is_collection_type(ty: &TypeRef) -> bool {
    !ty.is_array() && (ty.simple_name() == "Iterable" || COLLECTION_TYPES.contains(&ty.simple_name()))
}

impl SourceKind {
    /// Classify an iterated value from its static type. An unknown type is
    /// assumed to be a collection.
    pub fn of_type(ty: Option<&TypeRef>) -> SourceKind {
        match ty {
            Some(ty) if ty.is_array() => SourceKind::Array,
            Some(ty) if !COLLECTION_TYPES.contains(&ty.simple_name()) => SourceKind::Iterable,
            _ => SourceKind::Collection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementBinding {
    pub name: Ident,
    /// `None` for `var` bindings and unresolvable element types.
    pub ty: Option<TypeRef>,
}

/// The collection read by an indexed loop, `t` in `t[i]` or `t.get(i)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTarget {
    pub target: Expr,
    /// Bounded by `t.length` rather than `t.size()`.
    pub is_array: bool,
}

/// Where a loop sits: what is declared before it and which statements
/// surround it in its block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSite {
    pub scope: EnclosingScope,
    pub preceding: Vec<Stmt>,
    pub following: Vec<Stmt>,
}

impl LoopSite {
    pub fn new(scope: EnclosingScope) -> Self {
        Self {
            scope,
            preceding: Vec::new(),
            following: Vec::new(),
        }
    }

    pub fn with_preceding(mut self, stmts: Vec<Stmt>) -> Self {
        self.preceding = stmts;
        self
    }

    pub fn with_following(mut self, stmts: Vec<Stmt>) -> Self {
        self.following = stmts;
        self
    }
}

#[derive(Debug, Clone)]
pub struct LoopModel<'s> {
    pub kind: LoopKind,
    pub binding: ElementBinding,
    pub source: Expr,
    pub source_kind: SourceKind,
    /// Static type of `source` when known. For ranges, the indexed target's.
    pub source_type: Option<TypeRef>,
    pub body: Vec<Stmt>,
    /// Comments of the body block that follow no statement.
    pub body_comments: Vec<Comment>,
    pub indexed: Option<IndexedTarget>,
    pub iterator: Option<Ident>,
    /// Statements before the loop that belong to it, the iterator
    /// declaration of a `while` iterator loop.
    pub consumed_before: usize,
    pub site: &'s LoopSite,
    pub span: Span,
}

impl<'s> LoopModel<'s> {
    pub fn scope(&self) -> &'s EnclosingScope {
        &self.site.scope
    }

    /// Preceding statements not consumed by the loop itself.
    pub fn preceding(&self) -> &'s [Stmt] {
        let site = self.site;
        let keep = site.preceding.len().saturating_sub(self.consumed_before);
        &site.preceding[..keep]
    }

    pub fn following(&self) -> &'s [Stmt] {
        &self.site.following
    }

    /// The expression whose identity the body must not mutate.
    pub fn iterated(&self) -> &Expr {
        match &self.indexed {
            Some(indexed) => &indexed.target,
            None => &self.source,
        }
    }

    pub fn is_name_in_scope(&self, name: &str) -> bool {
        self.scope().contains(name)
    }
}

/// `this.name` or `name`, the shapes accepted as a simple variable target.
pub fn simple_variable(expr: &Expr) -> Option<&Ident> {
    match expr.strip_parens().kind() {
        ExprKind::Name(name) => Some(name),
        ExprKind::FieldAccess(field) if matches!(field.target.kind(), ExprKind::This) => {
            Some(&field.field)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_types_are_collections() {
        assert_eq!(SourceKind::of_type(None), SourceKind::Collection);
        assert_eq!(
            SourceKind::of_type(Some(&TypeRef::named("ArrayList"))),
            SourceKind::Collection
        );
        assert_eq!(
            SourceKind::of_type(Some(&TypeRef::named("Iterable"))),
            SourceKind::Iterable
        );
        assert_eq!(
            SourceKind::of_type(Some(&TypeRef::array_of(TypeRef::string()))),
            SourceKind::Array
        );
    }
}
