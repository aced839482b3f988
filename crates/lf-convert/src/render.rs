//! Renderer: print a [`Pipeline`] back as replacement statements.

use std::collections::BTreeSet;

use lf_core::ast::{
    Block, Comment, Comments, Expr, ExprCall, ExprKind, Ident, LambdaBody, Stmt, StmtIf,
    StmtKind, StmtLocalVar, TypeRef, VarDeclarator,
};
use lf_core::config::{ConversionConfig, UnusedParamPolicy};
use lf_core::ops::{AssignOp, UnOpKind};
use lf_core::scope::EnclosingScope;
use lf_core::Result;

use crate::model::SourceKind;
use crate::pipeline::{
    CollectKind, Combiner, MapBody, MatchKind, Operation, OperationKind, Pipeline, SourceAdapter,
    StreamShape, TerminalKind, TerminalOperation,
};
use crate::queries::{fresh_name, names_in_expr, names_in_stmts};
use crate::{convert_bail, convert_ensure};

const ARRAYS: &str = "java.util.Arrays";
const COLLECTORS: &str = "java.util.stream.Collectors";
const INT_STREAM: &str = "java.util.stream.IntStream";
const STREAM: &str = "java.util.stream.Stream";
const STREAM_SUPPORT: &str = "java.util.stream.StreamSupport";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub stmts: Vec<Stmt>,
    /// Fully qualified imports the statements need.
    pub imports: BTreeSet<String>,
}

pub struct Renderer<'a> {
    config: &'a ConversionConfig,
    scope: &'a EnclosingScope,
}

/// `// line` comments, one per line of each comment body.
fn comment_lines(comments: &[Comment]) -> Vec<Comment> {
    comments
        .iter()
        .flat_map(Comment::body_lines)
        .map(|line| Comment::line(&line))
        .collect()
}

fn with_leading(stmt: Stmt, comments: Vec<Comment>) -> Stmt {
    if comments.is_empty() {
        return stmt;
    }
    let mut leading = comments;
    leading.extend(stmt.comments.leading.iter().cloned());
    let trailing = stmt.comments.trailing.clone();
    stmt.with_comments(Comments { leading, trailing })
}

/// Block lambda body: `stmts` with `comments` in front of the first one.
fn block_body(mut stmts: Vec<Stmt>, comments: &[Comment], dangling: &[Comment]) -> LambdaBody {
    let lines = comment_lines(comments);
    if let Some(first) = stmts.first_mut() {
        *first = with_leading(first.clone(), lines);
    }
    let mut block = Block::new(stmts);
    block.dangling = dangling.to_vec();
    LambdaBody::Block(block)
}

/// Body returning `value`, as an expression unless comments force a block.
fn value_body(value: Expr, comments: &[Comment]) -> LambdaBody {
    if comments.is_empty() {
        LambdaBody::Expr(value)
    } else {
        block_body(vec![Stmt::ret(Some(value))], comments, &[])
    }
}

/// Statement body: a lone expression statement stays an expression lambda.
fn stmts_body(stmts: &[Stmt], comments: &[Comment], dangling: &[Comment]) -> LambdaBody {
    match stmts {
        [single] if comments.is_empty() && dangling.is_empty() && single.comments.is_empty() => {
            match single.as_expr() {
                Some(expr) => LambdaBody::Expr(expr.clone()),
                None => block_body(stmts.to_vec(), comments, dangling),
            }
        }
        _ => block_body(stmts.to_vec(), comments, dangling),
    }
}

fn lambda_names(body: &LambdaBody) -> BTreeSet<Ident> {
    match body {
        LambdaBody::Expr(expr) => names_in_expr(expr),
        LambdaBody::Block(block) => names_in_stmts(&block.stmts),
    }
}

/// `!cond`, dropping a double negation.
fn negated(predicate: &Expr) -> Expr {
    match predicate.strip_parens().kind() {
        ExprKind::Unary(unary) if unary.op == UnOpKind::Not => unary.expr.clone(),
        _ => Expr::negate(predicate.clone()),
    }
}

/// `Stream.concat(lhs, rhs)`, with explicit type arguments when given.
fn concat_call(lhs: Expr, rhs: Expr, type_args: &[TypeRef]) -> Expr {
    ExprKind::MethodCall(ExprCall {
        target: Some(Expr::name("Stream")),
        type_args: type_args.to_vec(),
        name: Ident::new("concat"),
        args: vec![lhs, rhs],
    })
    .into()
}

fn combiner_expr(combiner: &Combiner) -> Expr {
    match combiner {
        Combiner::MethodRef { class, method } => {
            Expr::method_ref(Expr::name(class.as_str()), method.as_str())
        }
        Combiner::Lambda { params, body } => {
            Expr::lambda(params.to_vec(), LambdaBody::Expr(body.clone()))
        }
    }
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a ConversionConfig, scope: &'a EnclosingScope) -> Self {
        Self { config, scope }
    }

    pub fn render(&self, pipeline: &Pipeline) -> Result<Rendered> {
        let mut imports = BTreeSet::new();
        let terminal = &pipeline.terminal;

        if let TerminalKind::ForEach { body, dangling, .. } = &terminal.kind {
            if pipeline.operations.is_empty() && pipeline.source.has_native_for_each() {
                let lambda_body = stmts_body(body, &terminal.comments, dangling);
                let param = self.param_name(&terminal.param, terminal.param_live, &lambda_body);
                let call = Expr::method(
                    pipeline.source.expr.clone(),
                    "forEach",
                    vec![Expr::lambda(vec![param], lambda_body)],
                );
                return Ok(Rendered {
                    stmts: vec![Stmt::expr(call)],
                    imports,
                });
            }
        }

        let mut chain = self.source_expr(&pipeline.source, &mut imports);
        let mut shape = pipeline.source.shape();
        for op in &pipeline.operations {
            chain = self.render_operation(chain, op, &mut shape)?;
        }
        let stmt = self.render_terminal(chain, terminal, shape, &mut imports)?;
        Ok(Rendered {
            stmts: vec![stmt],
            imports,
        })
    }

    /// Consecutive collects into one target, as nested `Stream.concat` calls
    /// under the first pipeline's collector.
    pub fn render_concat(&self, pipelines: &[Pipeline]) -> Result<Rendered> {
        let Some(first) = pipelines.first() else {
            convert_bail!("concat of no pipelines");
        };
        let TerminalKind::Collect { target_type, .. } = &first.terminal.kind else {
            convert_bail!("concat of a pipeline that does not collect");
        };
        let mut imports = BTreeSet::new();
        let mut streams = Vec::with_capacity(pipelines.len());
        let mut terminal = first.terminal.clone();
        for (idx, pipeline) in pipelines.iter().enumerate() {
            let mut chain = self.source_expr(&pipeline.source, &mut imports);
            let mut shape = pipeline.source.shape();
            for op in &pipeline.operations {
                chain = self.render_operation(chain, op, &mut shape)?;
            }
            if shape.is_primitive() {
                chain = Expr::method(chain, "boxed", vec![]);
            }
            streams.push(chain);
            if idx > 0 {
                terminal.comments.extend(pipeline.terminal.comments.iter().cloned());
            }
        }

        // Without a common element type `concat` infers the wrong bound.
        let type_args = match target_type.element_type() {
            Some(element)
                if !pipelines
                    .iter()
                    .all(|p| p.element_type().map(|ty| ty.boxed()).as_ref() == Some(&element)) =>
            {
                vec![element]
            }
            _ => Vec::new(),
        };
        let mut streams = streams.into_iter();
        let (Some(lhs), Some(rhs)) = (streams.next(), streams.next()) else {
            convert_bail!("concat needs at least two pipelines");
        };
        let chain = streams.fold(concat_call(lhs, rhs, &type_args), |chain, next| {
            concat_call(chain, next, &type_args)
        });
        imports.insert(STREAM.to_string());
        let stmt = self.render_terminal(chain, &terminal, StreamShape::Object, &mut imports)?;
        Ok(Rendered {
            stmts: vec![stmt],
            imports,
        })
    }

    fn source_expr(&self, source: &SourceAdapter, imports: &mut BTreeSet<String>) -> Expr {
        let expr = source.expr.clone();
        match source.kind {
            SourceKind::Collection => Expr::method(expr, "stream", vec![]),
            SourceKind::Array => {
                imports.insert(ARRAYS.to_string());
                Expr::static_call("Arrays", "stream", vec![expr])
            }
            SourceKind::Iterable => {
                imports.insert(STREAM_SUPPORT.to_string());
                Expr::static_call(
                    "StreamSupport",
                    "stream",
                    vec![Expr::method(expr, "spliterator", vec![]), Expr::bool(false)],
                )
            }
            SourceKind::Range => {
                imports.insert(INT_STREAM.to_string());
                Expr::static_call("IntStream", "range", vec![Expr::int(0), expr])
            }
        }
    }

    /// The stage parameter, or the configured placeholder when `live` is
    /// false and the policy asks for one.
    fn param_name(&self, param: &Ident, live: bool, body: &LambdaBody) -> Ident {
        match &self.config.policies.unused_param {
            UnusedParamPolicy::Placeholder(placeholder) if !live => {
                let names = lambda_names(body);
                fresh_name(placeholder, |name| {
                    self.scope.contains(name) || names.iter().any(|n| n == name)
                })
            }
            _ => param.clone(),
        }
    }

    fn lambda(&self, op_param: &Ident, body: LambdaBody) -> Expr {
        let used = lambda_names(&body).contains(op_param);
        let param = self.param_name(op_param, used, &body);
        Expr::lambda(vec![param], body)
    }

    fn render_operation(&self, chain: Expr, op: &Operation, shape: &mut StreamShape) -> Result<Expr> {
        let expr = match &op.kind {
            OperationKind::Filter { predicate, negate } => {
                let predicate = if *negate {
                    negated(predicate)
                } else {
                    predicate.clone()
                };
                let lambda = self.lambda(&op.param, value_body(predicate, &op.comments));
                Expr::method(chain, "filter", vec![lambda])
            }
            OperationKind::Map {
                binding,
                body,
                result_type,
            } => {
                convert_ensure!(!binding.as_str().is_empty(), "map stage without a binding");
                let target = match result_type {
                    Some(ty) => StreamShape::of_type(Some(ty)),
                    None if shape.is_primitive() => *shape,
                    None => StreamShape::Object,
                };
                let lambda_body = match body {
                    MapBody::Expr(expr) => value_body(expr.clone(), &op.comments),
                    MapBody::Block { stmts, result } => {
                        let mut stmts = stmts.clone();
                        stmts.push(Stmt::ret(Some(result.clone())));
                        block_body(stmts, &op.comments, &[])
                    }
                };
                let method = shape.map_method(target);
                *shape = target;
                Expr::method(chain, method, vec![self.lambda(&op.param, lambda_body)])
            }
            OperationKind::FlatMap { binding, sub_stream } => {
                convert_ensure!(!binding.as_str().is_empty(), "flatMap stage without a binding");
                if shape.is_primitive() {
                    convert_bail!("flatMap on a primitive stream");
                }
                let lambda = self.lambda(&op.param, value_body(sub_stream.clone(), &op.comments));
                Expr::method(chain, "flatMap", vec![lambda])
            }
            OperationKind::Peek { stmts } => {
                let lambda = self.lambda(&op.param, stmts_body(stmts, &op.comments, &[]));
                Expr::method(chain, "peek", vec![lambda])
            }
            OperationKind::Distinct => Expr::method(chain, "distinct", vec![]),
            OperationKind::Sorted { comparator } => {
                Expr::method(chain, "sorted", comparator.iter().cloned().collect())
            }
            OperationKind::Limit(n) => Expr::method(chain, "limit", vec![n.clone()]),
            OperationKind::Skip(n) => Expr::method(chain, "skip", vec![n.clone()]),
        };
        Ok(expr)
    }

    fn terminal_lambda(&self, terminal: &TerminalOperation, body: LambdaBody) -> Expr {
        let param = self.param_name(&terminal.param, terminal.param_live, &body);
        Expr::lambda(vec![param], body)
    }

    fn render_terminal(
        &self,
        chain: Expr,
        terminal: &TerminalOperation,
        shape: StreamShape,
        imports: &mut BTreeSet<String>,
    ) -> Result<Stmt> {
        let stmt = match &terminal.kind {
            TerminalKind::ForEach {
                ordered,
                body,
                dangling,
            } => {
                let method = if *ordered { "forEachOrdered" } else { "forEach" };
                let lambda = self.terminal_lambda(terminal, stmts_body(body, &[], dangling));
                Stmt::expr(Expr::method(chain, method, vec![lambda]))
            }
            TerminalKind::Collect {
                kind,
                target,
                target_type,
                replaces_decl,
            } => {
                imports.insert(COLLECTORS.to_string());
                let chain = if shape.is_primitive() {
                    Expr::method(chain, "boxed", vec![])
                } else {
                    chain
                };
                let collector = match kind {
                    CollectKind::ToList => Expr::static_call("Collectors", "toList", vec![]),
                    CollectKind::ToSet => Expr::static_call("Collectors", "toSet", vec![]),
                    CollectKind::ToCollection(ty) => Expr::static_call(
                        "Collectors",
                        "toCollection",
                        vec![Expr::method_ref(Expr::name(ty.simple_name()), "new")],
                    ),
                };
                let collected = Expr::method(chain, "collect", vec![collector]);
                match replaces_decl {
                    Some(decl) => {
                        let Some(declarator) = decl.single() else {
                            convert_bail!(format!("replaced declaration of `{target}` is not single"));
                        };
                        Stmt::synthetic(StmtKind::LocalVar(StmtLocalVar {
                            modifiers: decl.modifiers.clone(),
                            ty: decl.ty.clone(),
                            declarators: vec![VarDeclarator {
                                name: declarator.name.clone(),
                                dims: declarator.dims,
                                init: Some(collected),
                            }],
                        }))
                    }
                    None => {
                        lf_core::trace!("appending into existing {} `{}`", target_type, target);
                        Stmt::expr(Expr::method(Expr::name(target.clone()), "addAll", vec![collected]))
                    }
                }
            }
            TerminalKind::Reduce {
                accumulator,
                identity,
                combiner,
                ..
            } => {
                let reduced = match identity {
                    Some(identity) => {
                        Expr::method(chain, "reduce", vec![identity.clone(), combiner_expr(combiner)])
                    }
                    None => Expr::method(
                        Expr::method(chain, "reduce", vec![combiner_expr(combiner)]),
                        "orElse",
                        vec![Expr::name(accumulator.clone())],
                    ),
                };
                Stmt::expr(Expr::assign(
                    AssignOp::Assign,
                    Expr::name(accumulator.clone()),
                    reduced,
                ))
            }
            TerminalKind::Count => Stmt::expr(Expr::method(chain, "count", vec![])),
            TerminalKind::Find { first, fallback } => {
                let method = if *first { "findFirst" } else { "findAny" };
                let found = Expr::method(chain, method, vec![]);
                Stmt::ret(Some(Expr::method(found, "orElse", vec![fallback.clone()])))
            }
            TerminalKind::Match {
                kind,
                predicate,
                value,
            } => {
                let lambda = self.terminal_lambda(terminal, LambdaBody::Expr(predicate.clone()));
                let matched = Expr::method(chain, kind.method(), vec![lambda]);
                let cond = match kind {
                    MatchKind::Any => matched,
                    MatchKind::All | MatchKind::None => Expr::negate(matched),
                };
                let then = Stmt::synthetic(StmtKind::Block(Block::new(vec![Stmt::ret(Some(
                    Expr::bool(*value),
                ))])));
                Stmt::synthetic(StmtKind::If(StmtIf {
                    cond,
                    then: Box::new(then),
                    otherwise: None,
                }))
            }
        };
        Ok(with_leading(stmt, terminal.comments.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::ast::{PrimitiveKind, TypeRef};
    use lf_core::printer::JavaPrinter;
    use lf_core::scope::Declaration;
    use lf_lang::parse_expression;
    use pretty_assertions::assert_eq;

    fn expr(src: &str) -> Expr {
        parse_expression(src).unwrap_or_else(|e| panic!("{src}: {e}"))
    }

    fn source(kind: SourceKind, src: &str) -> SourceAdapter {
        SourceAdapter {
            kind,
            expr: expr(src),
            element_type: None,
        }
    }

    fn print(pipeline: &Pipeline, config: &ConversionConfig) -> String {
        let scope = EnclosingScope::new().with(Declaration::local("ls", TypeRef::named("List")));
        let rendered = Renderer::new(config, &scope).render(pipeline).unwrap();
        JavaPrinter::default().print_stmts(&rendered.stmts)
    }

    fn for_each(param: &str, body: &str, live: bool) -> TerminalOperation {
        TerminalOperation::new(
            TerminalKind::ForEach {
                ordered: false,
                body: vec![Stmt::expr(expr(body))],
                dangling: vec![],
            },
            Ident::new(param),
            live,
        )
    }

    #[test]
    fn empty_chain_calls_for_each_directly() {
        let pipeline = Pipeline {
            source: source(SourceKind::Collection, "ls"),
            operations: vec![],
            terminal: for_each("x", "stmt(x)", true),
        };
        assert_eq!(print(&pipeline, &ConversionConfig::default()), "ls.forEach(x -> stmt(x));");
    }

    #[test]
    fn unused_parameter_gets_placeholder() {
        let pipeline = Pipeline {
            source: source(SourceKind::Array, "values"),
            operations: vec![],
            terminal: for_each("v", "tick()", false),
        };
        assert_eq!(
            print(&pipeline, &ConversionConfig::default()),
            "Arrays.stream(values).forEach(_item -> tick());"
        );
        let mut config = ConversionConfig::default();
        config.policies.unused_param = UnusedParamPolicy::KeepName;
        assert_eq!(print(&pipeline, &config), "Arrays.stream(values).forEach(v -> tick());");
    }

    #[test]
    fn collect_boxes_primitive_streams() {
        let pipeline = Pipeline {
            source: source(SourceKind::Range, "n"),
            operations: vec![],
            terminal: TerminalOperation::new(
                TerminalKind::Collect {
                    kind: CollectKind::ToSet,
                    target: Ident::new("seen"),
                    target_type: TypeRef::generic("Set", vec![TypeRef::named("Integer")]),
                    replaces_decl: None,
                },
                Ident::new("i"),
                false,
            ),
        };
        let scope = EnclosingScope::new();
        let rendered = Renderer::new(&ConversionConfig::default(), &scope)
            .render(&pipeline)
            .unwrap();
        assert_eq!(
            JavaPrinter::default().print_stmts(&rendered.stmts),
            "seen.addAll(IntStream.range(0, n).boxed().collect(Collectors.toSet()));"
        );
        assert!(rendered.imports.contains(COLLECTORS));
        assert!(rendered.imports.contains(INT_STREAM));
    }

    #[test]
    fn map_picks_stream_flavor() {
        let pipeline = Pipeline {
            source: source(SourceKind::Collection, "words"),
            operations: vec![Operation::new(
                OperationKind::Map {
                    binding: Ident::new("w"),
                    body: MapBody::Expr(expr("w.length()")),
                    result_type: Some(TypeRef::primitive(PrimitiveKind::Int)),
                },
                Ident::new("w"),
            )],
            terminal: TerminalOperation::new(TerminalKind::Count, Ident::new("w"), false),
        };
        assert_eq!(
            print(&pipeline, &ConversionConfig::default()),
            "words.stream().mapToInt(w -> w.length()).count();"
        );
    }

    #[test]
    fn trivial_stages() {
        let pipeline = Pipeline {
            source: source(SourceKind::Collection, "words"),
            operations: vec![
                Operation::new(OperationKind::Distinct, Ident::new("w")),
                Operation::new(OperationKind::Sorted { comparator: None }, Ident::new("w")),
                Operation::new(OperationKind::Skip(Expr::int(1)), Ident::new("w")),
                Operation::new(OperationKind::Limit(Expr::int(3)), Ident::new("w")),
            ],
            terminal: for_each("w", "print(w)", true),
        };
        assert_eq!(
            print(&pipeline, &ConversionConfig::default()),
            "words.stream().distinct().sorted().skip(1).limit(3).forEach(w -> print(w));"
        );
    }

    #[test]
    fn match_all_negates_the_pipeline() {
        let pipeline = Pipeline {
            source: source(SourceKind::Collection, "ls"),
            operations: vec![],
            terminal: TerminalOperation::new(
                TerminalKind::Match {
                    kind: MatchKind::All,
                    predicate: expr("x > 0"),
                    value: false,
                },
                Ident::new("x"),
                true,
            ),
        };
        assert_eq!(
            print(&pipeline, &ConversionConfig::default()),
            "if (!ls.stream().allMatch(x -> x > 0)) {\n    return false;\n}"
        );
    }

    #[test]
    fn empty_map_binding_is_an_internal_error() {
        let pipeline = Pipeline {
            source: source(SourceKind::Collection, "ls"),
            operations: vec![Operation::new(
                OperationKind::Map {
                    binding: Ident::new(""),
                    body: MapBody::Expr(expr("x")),
                    result_type: None,
                },
                Ident::new("x"),
            )],
            terminal: for_each("x", "print(x)", true),
        };
        let scope = EnclosingScope::new();
        let err = Renderer::new(&ConversionConfig::default(), &scope)
            .render(&pipeline)
            .unwrap_err();
        assert!(matches!(err, lf_core::Error::InvalidModel(_)));
    }
}
