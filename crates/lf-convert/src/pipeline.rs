//! Abstract stream pipeline: a source adapter, a linear chain of
//! intermediate operations and exactly one terminal operation.

use lf_core::ast::{Comment, Expr, Ident, PrimitiveKind, Stmt, StmtLocalVar, TypeRef};
use lf_core::config::TerminalFamily;
use serde::{Deserialize, Serialize};

use crate::model::SourceKind;
use crate::queries::{references_in_expr, references_in_stmts};

/// Element representation of a stream: boxed objects or one of the three
/// primitive specializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamShape {
    Object,
    Int,
    Long,
    Double,
}

impl StreamShape {
    /// Shape that holds values of `ty`. Only `int`, `long` and `double` have
    /// primitive streams; everything else is boxed.
    pub fn of_type(ty: Option<&TypeRef>) -> StreamShape {
        match ty.and_then(TypeRef::as_primitive) {
            Some(PrimitiveKind::Int) => StreamShape::Int,
            Some(PrimitiveKind::Long) => StreamShape::Long,
            Some(PrimitiveKind::Double) => StreamShape::Double,
            _ => StreamShape::Object,
        }
    }

    pub fn is_primitive(&self) -> bool {
        *self != StreamShape::Object
    }

    /// The `map` flavor converting from `self` to `target`.
    pub fn map_method(&self, target: StreamShape) -> &'static str {
        if *self == target {
            return "map";
        }
        match target {
            StreamShape::Object => "mapToObj",
            StreamShape::Int => "mapToInt",
            StreamShape::Long => "mapToLong",
            StreamShape::Double => "mapToDouble",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAdapter {
    pub kind: SourceKind,
    /// The iterated expression, or the upper bound of a range.
    pub expr: Expr,
    pub element_type: Option<TypeRef>,
}

impl SourceAdapter {
    pub fn shape(&self) -> StreamShape {
        match self.kind {
            SourceKind::Range => StreamShape::Int,
            SourceKind::Array => StreamShape::of_type(self.element_type.as_ref()),
            SourceKind::Collection | SourceKind::Iterable => StreamShape::Object,
        }
    }

    /// `forEach` exists on the source itself.
    pub fn has_native_for_each(&self) -> bool {
        matches!(self.kind, SourceKind::Collection | SourceKind::Iterable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapBody {
    Expr(Expr),
    /// Statements followed by the returned value.
    Block { stmts: Vec<Stmt>, result: Expr },
}

/// Intermediate stage. `FlatMap`, `Distinct`, `Sorted`, `Limit` and `Skip`
/// exist for the data model and the renderer only; no loop shape folds into
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Filter {
        predicate: Expr,
        negate: bool,
    },
    Map {
        binding: Ident,
        body: MapBody,
        result_type: Option<TypeRef>,
    },
    FlatMap {
        binding: Ident,
        sub_stream: Expr,
    },
    Peek {
        stmts: Vec<Stmt>,
    },
    Distinct,
    Sorted {
        comparator: Option<Expr>,
    },
    Limit(Expr),
    Skip(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    /// Lambda parameter of this stage.
    pub param: Ident,
    pub comments: Vec<Comment>,
    /// The binding this stage introduces is read by a later stage.
    pub live: bool,
}

impl Operation {
    pub fn new(kind: OperationKind, param: Ident) -> Self {
        Self {
            kind,
            param,
            comments: Vec::new(),
            live: true,
        }
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    /// Name of the element after this stage.
    pub fn output_binding(&self) -> &Ident {
        match &self.kind {
            OperationKind::Map { binding, .. } | OperationKind::FlatMap { binding, .. } => binding,
            _ => &self.param,
        }
    }

    /// Whether this stage's own body reads `name`.
    pub fn references(&self, name: &str) -> bool {
        match &self.kind {
            OperationKind::Filter { predicate, .. } => references_in_expr(predicate, name),
            OperationKind::Map { body, .. } => match body {
                MapBody::Expr(expr) => references_in_expr(expr, name),
                MapBody::Block { stmts, result } => {
                    references_in_stmts(stmts, name) || references_in_expr(result, name)
                }
            },
            OperationKind::FlatMap { sub_stream, .. } => references_in_expr(sub_stream, name),
            OperationKind::Peek { stmts } => references_in_stmts(stmts, name),
            OperationKind::Sorted { comparator } => comparator
                .as_ref()
                .map_or(false, |cmp| references_in_expr(cmp, name)),
            OperationKind::Limit(n) | OperationKind::Skip(n) => references_in_expr(n, name),
            OperationKind::Distinct => false,
        }
    }

    pub fn is_trivial(&self) -> bool {
        matches!(
            self.kind,
            OperationKind::Distinct
                | OperationKind::Sorted { .. }
                | OperationKind::Limit(_)
                | OperationKind::Skip(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectKind {
    ToList,
    ToSet,
    /// `Collectors.toCollection(Type::new)`
    ToCollection(TypeRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    Any,
    All,
    None,
}

impl MatchKind {
    pub fn method(&self) -> &'static str {
        match self {
            MatchKind::Any => "anyMatch",
            MatchKind::All => "allMatch",
            MatchKind::None => "noneMatch",
        }
    }
}

/// Binary operator passed to `reduce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combiner {
    /// `Integer::sum`, `Long::max`, `String::concat`.
    MethodRef { class: String, method: String },
    Lambda { params: [Ident; 2], body: Expr },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalKind {
    ForEach {
        ordered: bool,
        body: Vec<Stmt>,
        /// Comments of the loop body that followed no statement.
        dangling: Vec<Comment>,
    },
    Collect {
        kind: CollectKind,
        target: Ident,
        target_type: TypeRef,
        /// Fresh `new X<>()` declaration right before the loop that the
        /// pipeline replaces.
        replaces_decl: Option<StmtLocalVar>,
    },
    Reduce {
        accumulator: Ident,
        identity: Option<Expr>,
        combiner: Combiner,
        accumulator_type: TypeRef,
        element_type: Option<TypeRef>,
    },
    /// Printable `count()`. No loop shape folds into it; counters become
    /// [`TerminalKind::Reduce`].
    Count,
    Find {
        first: bool,
        fallback: Expr,
    },
    Match {
        kind: MatchKind,
        predicate: Expr,
        /// Literal returned from the loop.
        value: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalOperation {
    pub kind: TerminalKind,
    pub param: Ident,
    /// `param` is read by the terminal's own body.
    pub param_live: bool,
    /// Comments of the statements folded into the terminal.
    pub comments: Vec<Comment>,
}

impl TerminalOperation {
    pub fn new(kind: TerminalKind, param: Ident, param_live: bool) -> Self {
        Self {
            kind,
            param,
            param_live,
            comments: Vec::new(),
        }
    }

    /// Whether the terminal's own payload reads `name`.
    pub fn references(&self, name: &str) -> bool {
        match &self.kind {
            TerminalKind::ForEach { body, .. } => references_in_stmts(body, name),
            TerminalKind::Match { predicate, .. } => references_in_expr(predicate, name),
            TerminalKind::Find { fallback, .. } => references_in_expr(fallback, name),
            TerminalKind::Collect { .. } | TerminalKind::Reduce { .. } | TerminalKind::Count => {
                false
            }
        }
    }

    pub fn family(&self) -> TerminalFamily {
        match self.kind {
            TerminalKind::ForEach { .. } => TerminalFamily::ForEach,
            TerminalKind::Collect { .. } => TerminalFamily::Collect,
            TerminalKind::Reduce { .. } | TerminalKind::Count => TerminalFamily::Reduce,
            TerminalKind::Find { .. } | TerminalKind::Match { .. } => TerminalFamily::Match,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub source: SourceAdapter,
    pub operations: Vec<Operation>,
    pub terminal: TerminalOperation,
}

impl Pipeline {
    /// Stream shape after all intermediate operations.
    pub fn final_shape(&self) -> StreamShape {
        self.operations
            .iter()
            .fold(self.source.shape(), |shape, op| match &op.kind {
                OperationKind::Map { result_type, .. } => StreamShape::of_type(result_type.as_ref()),
                OperationKind::FlatMap { .. } => StreamShape::Object,
                _ => shape,
            })
    }

    /// Element type after all intermediate operations, when known.
    pub fn element_type(&self) -> Option<TypeRef> {
        let start = match self.source.kind {
            SourceKind::Range => Some(TypeRef::primitive(PrimitiveKind::Int)),
            _ => self.source.element_type.clone(),
        };
        self.operations.iter().fold(start, |ty, op| match &op.kind {
            OperationKind::Map { result_type, .. } => result_type.clone(),
            OperationKind::FlatMap { .. } => None,
            _ => ty,
        })
    }

    /// Statements consumed after the loop, the trailing `return` of a find.
    pub fn consumed_after(&self) -> usize {
        match self.terminal.kind {
            TerminalKind::Find { .. } => 1,
            _ => 0,
        }
    }

    /// Statements consumed before the loop, the replaced declaration of a
    /// collect.
    pub fn replaces_declaration(&self) -> bool {
        matches!(
            self.terminal.kind,
            TerminalKind::Collect {
                replaces_decl: Some(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_methods_follow_shapes() {
        assert_eq!(StreamShape::Object.map_method(StreamShape::Object), "map");
        assert_eq!(StreamShape::Object.map_method(StreamShape::Int), "mapToInt");
        assert_eq!(StreamShape::Int.map_method(StreamShape::Object), "mapToObj");
        assert_eq!(StreamShape::Int.map_method(StreamShape::Int), "map");
        assert_eq!(StreamShape::Long.map_method(StreamShape::Double), "mapToDouble");
    }

    #[test]
    fn char_values_stay_boxed() {
        let ty = TypeRef::primitive(PrimitiveKind::Char);
        assert_eq!(StreamShape::of_type(Some(&ty)), StreamShape::Object);
        assert_eq!(StreamShape::of_type(None), StreamShape::Object);
    }
}
