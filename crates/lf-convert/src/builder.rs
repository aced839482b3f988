//! Operation sequence builder: fold a loop body into pipeline stages and one
//! terminal operation.
//!
//! Statements are consumed front to back. Guards and local transforms become
//! `filter`/`map` stages; whatever remains must match a terminal. The most
//! specific terminal wins (match/find, then reduce, then collect) and
//! `forEach` is the fallback.

use std::collections::BTreeSet;

use lf_core::ast::{Comment, Expr, ExprKind, Ident, Stmt, StmtIf, StmtKind, StmtLocalVar, TypeRef};
use lf_core::config::{ConversionConfig, SideEffectStage, TerminalFamily, UnusedParamPolicy};
use lf_core::ops::{AssignOp, UnOpKind};
use lf_core::scope::{infer_expr_type, DeclKind, LayeredResolver, TypeResolver};

use crate::model::{is_collection_type, LoopModel, SourceKind};
use crate::pipeline::{
    CollectKind, MapBody, MatchKind, Operation, OperationKind, Pipeline, SourceAdapter,
    StreamShape, TerminalKind, TerminalOperation,
};
use crate::preconditions::{following_return, Rejection, RejectionReason};
use crate::queries::{
    assigned_variables, collection_identity, continue_to_return, declared_names,
    false_implies_non_null, find_mutation, fresh_name, has_jumps, names_in_expr, names_in_stmts,
    references_in_expr, references_in_stmts, summarize_control_flow, true_implies_non_null,
    usage_in_stmts,
};
use crate::reduce::{detect_update, plan_reduce, ReduceContext};

/// Result of folding one loop body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fold {
    Pipeline(Pipeline),
    Rejected(Rejection),
    /// The only terminal that fits belongs to a switched-off family.
    Disabled(TerminalFamily),
}

/// Outcome of one terminal matcher. `NoMatch` lets the next, less specific
/// matcher try.
enum TerminalMatch {
    Matched(TerminalOperation),
    NoMatch,
    Disabled(TerminalFamily),
}

pub struct OperationSequenceBuilder<'a> {
    config: &'a ConversionConfig,
    resolver: &'a dyn TypeResolver,
}

/// Mutable state of one fold: the current element binding and the stages
/// committed so far.
struct FoldState<'r> {
    binding: Ident,
    binding_type: Option<TypeRef>,
    operations: Vec<Operation>,
    resolver: LayeredResolver<'r>,
    /// Names a generated lambda parameter must avoid.
    taken: BTreeSet<String>,
}

impl FoldState<'_> {
    fn push(&mut self, op: Operation) {
        lf_core::trace!("fold stage {:?} on `{}`", op.kind, op.param);
        self.operations.push(op);
    }

    fn rebind(&mut self, name: Ident, ty: Option<TypeRef>) {
        self.resolver.bind(name.clone(), ty.clone());
        self.taken.insert(name.to_string());
        self.binding = name;
        self.binding_type = ty;
    }

    /// Whether an element passing `predicate` and every filter on the
    /// current binding is never null.
    fn selects_non_null(&self, source: &SourceAdapter, predicate: &Expr) -> bool {
        let name = self.binding.as_str();
        if self.shape(source).is_primitive()
            || self.binding_type.as_ref().map_or(false, TypeRef::is_primitive)
            || true_implies_non_null(predicate, name)
        {
            return true;
        }
        self.operations
            .iter()
            .rev()
            .take_while(|op| matches!(op.kind, OperationKind::Filter { .. } | OperationKind::Peek { .. }))
            .any(|op| match &op.kind {
                OperationKind::Filter { predicate, negate } if op.param.as_str() == name => {
                    if *negate {
                        false_implies_non_null(predicate, name)
                    } else {
                        true_implies_non_null(predicate, name)
                    }
                }
                _ => false,
            })
    }

    fn shape(&self, source: &SourceAdapter) -> StreamShape {
        self.operations
            .iter()
            .fold(source.shape(), |shape, op| match &op.kind {
                OperationKind::Map { result_type, .. } => StreamShape::of_type(result_type.as_ref()),
                OperationKind::FlatMap { .. } => StreamShape::Object,
                _ => shape,
            })
    }

    fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

fn comments_of(stmt: &Stmt) -> Vec<Comment> {
    stmt.comments.iter().cloned().collect()
}

/// `if (cond) continue;`
fn as_if_continue(stmt: &Stmt) -> Option<&StmtIf> {
    match &stmt.kind {
        StmtKind::If(stmt_if) if stmt_if.otherwise.is_none() && stmt_if.then.is_plain_continue() => {
            Some(stmt_if)
        }
        _ => None,
    }
}

fn as_guard(stmt: &Stmt) -> Option<&StmtIf> {
    match &stmt.kind {
        StmtKind::If(stmt_if) if stmt_if.otherwise.is_none() => Some(stmt_if),
        _ => None,
    }
}

/// `target.add(value);`
fn as_collection_add(stmt: &Stmt) -> Option<(&Ident, &Expr)> {
    let call = stmt.as_expr()?.as_call()?;
    if call.name != "add" {
        return None;
    }
    let [value] = call.args.as_slice() else {
        return None;
    };
    let target = call.target.as_ref()?.strip_parens().as_name()?;
    Some((target, value))
}

/// Names starting with an uppercase letter are taken as class names.
fn is_type_like(name: &Ident) -> bool {
    name.as_str().chars().next().map_or(false, char::is_uppercase)
}

fn is_empty_creation(init: &Expr) -> Option<&TypeRef> {
    match init.strip_parens().kind() {
        ExprKind::New(new) if new.args.is_empty() && new.body.is_none() => Some(&new.ty),
        _ => None,
    }
}

impl<'a> OperationSequenceBuilder<'a> {
    pub fn new(config: &'a ConversionConfig, resolver: &'a dyn TypeResolver) -> Self {
        Self { config, resolver }
    }

    pub fn build(&self, model: &LoopModel<'_>) -> Fold {
        let source = SourceAdapter {
            kind: model.source_kind,
            expr: model.source.clone(),
            element_type: match model.source_kind {
                SourceKind::Range => model.binding.ty.clone(),
                _ => model
                    .source_type
                    .as_ref()
                    .and_then(TypeRef::element_type)
                    .or_else(|| model.binding.ty.clone()),
            },
        };
        let mut taken: BTreeSet<String> = model.scope().iter().map(|d| d.name.to_string()).collect();
        taken.extend(names_in_stmts(&model.body).into_iter().map(|n| n.to_string()));
        let mut state = FoldState {
            binding: model.binding.name.clone(),
            binding_type: model.binding.ty.clone(),
            operations: Vec::new(),
            resolver: LayeredResolver::new(self.resolver),
            taken,
        };
        state.rebind(model.binding.name.clone(), model.binding.ty.clone());

        let terminal = match self.fold(model, &source, &mut state, model.body.clone()) {
            Ok(terminal) => terminal,
            Err(fold) => return fold,
        };
        let mut operations = state.operations;
        mark_liveness(&mut operations, &terminal);
        Fold::Pipeline(Pipeline {
            source,
            operations,
            terminal,
        })
    }

    fn fold(
        &self,
        model: &LoopModel<'_>,
        source: &SourceAdapter,
        state: &mut FoldState<'_>,
        mut rest: Vec<Stmt>,
    ) -> Result<TerminalOperation, Fold> {
        loop {
            let Some(first) = rest.first() else {
                break;
            };
            if let Some(stmt_if) = as_if_continue(first) {
                let op = Operation::new(
                    OperationKind::Filter {
                        predicate: stmt_if.cond.clone(),
                        negate: true,
                    },
                    state.binding.clone(),
                )
                .with_comments(comments_of(first));
                state.push(op);
                rest.remove(0);
                continue;
            }
            if rest.len() == 1 {
                if let Some(stmt_if) = as_guard(first) {
                    match self.early_return(model, source, state, first, stmt_if) {
                        TerminalMatch::Matched(terminal) => return Ok(terminal),
                        TerminalMatch::Disabled(family) => return Err(Fold::Disabled(family)),
                        TerminalMatch::NoMatch => {}
                    }
                    let op = Operation::new(
                        OperationKind::Filter {
                            predicate: stmt_if.cond.clone(),
                            negate: false,
                        },
                        state.binding.clone(),
                    )
                    .with_comments(comments_of(first));
                    let then = stmt_if.then.as_stmt_list().to_vec();
                    state.push(op);
                    rest = then;
                    continue;
                }
            }
            if rest.len() > 1 {
                if let Some(op) = self.map_stage(model, state, &rest) {
                    state.push(op);
                    rest.remove(0);
                    continue;
                }
            }
            break;
        }
        self.terminal(model, state, rest)
    }

    /// `T y = f(x);` or `x = f(x);` leading a non-empty remainder.
    fn map_stage(&self, model: &LoopModel<'_>, state: &mut FoldState<'_>, rest: &[Stmt]) -> Option<Operation> {
        let (first, later) = rest.split_first()?;
        let binding = state.binding.clone();
        match &first.kind {
            StmtKind::LocalVar(local) => {
                let declarator = local.single()?;
                let init = declarator.init.as_ref()?;
                if !self.is_pure_transform(model, state, init) || references_in_stmts(later, binding.as_str()) {
                    return None;
                }
                let declared = local.declarator_type(declarator);
                let result_type = if declared.is_inferred() {
                    infer_expr_type(&state.resolver, init)
                } else {
                    Some(declared)
                };
                let op = Operation::new(
                    OperationKind::Map {
                        binding: declarator.name.clone(),
                        body: MapBody::Expr(init.clone()),
                        result_type: result_type.clone(),
                    },
                    binding,
                )
                .with_comments(comments_of(first));
                state.rebind(declarator.name.clone(), result_type);
                Some(op)
            }
            StmtKind::Expr(expr) => {
                let ExprKind::Assign(assign) = expr.kind() else {
                    return None;
                };
                if assign.op != AssignOp::Assign
                    || !assign.target.strip_parens().is_name(binding.as_str())
                    || !self.is_pure_transform(model, state, &assign.value)
                {
                    return None;
                }
                Some(
                    Operation::new(
                        OperationKind::Map {
                            binding: binding.clone(),
                            body: MapBody::Expr(assign.value.clone()),
                            result_type: state.binding_type.clone(),
                        },
                        binding,
                    )
                    .with_comments(comments_of(first)),
                )
            }
            _ => None,
        }
    }

    /// Reads the current binding and otherwise only names visible before the
    /// loop or class names; writes nothing.
    fn is_pure_transform(&self, model: &LoopModel<'_>, state: &FoldState<'_>, expr: &Expr) -> bool {
        if !references_in_expr(expr, state.binding.as_str()) {
            return false;
        }
        let writes = assigned_variables(&[Stmt::expr(expr.clone())]);
        if !writes.0.is_empty() || !writes.1.is_empty() {
            return false;
        }
        names_in_expr(expr)
            .iter()
            .all(|name| *name == state.binding || model.is_name_in_scope(name.as_str()) || is_type_like(name))
    }

    /// `if (cond) return V;` before `return !V;`, or
    /// `if (cond) return x;` before `return fallback;`.
    fn early_return(
        &self,
        model: &LoopModel<'_>,
        source: &SourceAdapter,
        state: &mut FoldState<'_>,
        stmt: &Stmt,
        stmt_if: &StmtIf,
    ) -> TerminalMatch {
        let [ret] = stmt_if.then.as_stmt_list() else {
            return TerminalMatch::NoMatch;
        };
        let StmtKind::Return(Some(value)) = &ret.kind else {
            return TerminalMatch::NoMatch;
        };
        let Some(after) = following_return(model) else {
            return TerminalMatch::NoMatch;
        };
        let value = value.strip_parens();
        let binding = state.binding.clone();

        let kind = if let Some(returned) = value.as_bool() {
            if after.strip_parens().as_bool() != Some(!returned) {
                return TerminalMatch::NoMatch;
            }
            let (kind, predicate) = match (returned, stmt_if.cond.strip_parens().kind()) {
                (true, _) => (MatchKind::Any, stmt_if.cond.clone()),
                (false, ExprKind::Unary(unary)) if unary.op == UnOpKind::Not => {
                    (MatchKind::All, unary.expr.clone())
                }
                (false, _) => (MatchKind::None, stmt_if.cond.clone()),
            };
            TerminalKind::Match {
                kind,
                predicate,
                value: returned,
            }
        } else if value.is_name(binding.as_str()) {
            let fallback = after.strip_parens();
            let is_local_read = fallback
                .as_name()
                .and_then(|name| model.scope().lookup(name.as_str()))
                .map_or(false, |decl| decl.kind != DeclKind::Field);
            let is_constant = fallback.as_literal().is_some();
            if !is_constant && !is_local_read {
                return TerminalMatch::NoMatch;
            }
            if fallback.is_null() && state.shape(source).is_primitive() {
                return TerminalMatch::NoMatch;
            }
            if !state.selects_non_null(source, &stmt_if.cond) {
                lf_core::trace!("`{}` may be null, findFirst would throw", binding);
                return TerminalMatch::NoMatch;
            }
            TerminalKind::Find {
                first: true,
                fallback: fallback.clone(),
            }
        } else {
            return TerminalMatch::NoMatch;
        };

        if !self.config.terminal_enabled(TerminalFamily::Match) {
            return TerminalMatch::Disabled(TerminalFamily::Match);
        }
        if matches!(kind, TerminalKind::Find { .. }) {
            state.push(
                Operation::new(
                    OperationKind::Filter {
                        predicate: stmt_if.cond.clone(),
                        negate: false,
                    },
                    binding.clone(),
                )
                .with_comments(comments_of(stmt)),
            );
            return TerminalMatch::Matched(TerminalOperation::new(kind, binding, false));
        }
        let param_live = matches!(&kind, TerminalKind::Match { predicate, .. } if references_in_expr(predicate, binding.as_str()));
        let mut terminal = TerminalOperation::new(kind, binding, param_live);
        terminal.comments = comments_of(stmt);
        TerminalMatch::Matched(terminal)
    }

    fn terminal(
        &self,
        model: &LoopModel<'_>,
        state: &mut FoldState<'_>,
        rest: Vec<Stmt>,
    ) -> Result<TerminalOperation, Fold> {
        match self.reduce_terminal(model, state, &rest) {
            TerminalMatch::Matched(terminal) => return Ok(terminal),
            TerminalMatch::Disabled(family) => return Err(Fold::Disabled(family)),
            TerminalMatch::NoMatch => {}
        }
        match self.collect_terminal(model, state, &rest) {
            TerminalMatch::Matched(terminal) => return Ok(terminal),
            TerminalMatch::Disabled(family) => {
                lf_core::trace!("{} disabled, falling back to forEach", family.as_str());
            }
            TerminalMatch::NoMatch => {}
        }
        lf_core::trace!("{}", RejectionReason::NoTerminalPatternMatched);
        self.for_each_terminal(model, state, rest)
    }

    /// Statements before an accumulator update or collection add, kept as a
    /// side-effect stage that passes the element through unchanged.
    fn side_effect_stage(
        &self,
        model: &LoopModel<'_>,
        state: &FoldState<'_>,
        prefix: &[Stmt],
        last: &Stmt,
    ) -> Option<Operation> {
        if has_jumps(prefix) {
            return None;
        }
        let (writes, _) = assigned_variables(prefix);
        let declared: BTreeSet<Ident> = declared_names(prefix).into_iter().collect();
        let writes_outer = writes.iter().any(|name| {
            *name == state.binding
                || (!declared.contains(name)
                    && model
                        .scope()
                        .lookup(name.as_str())
                        .map_or(false, |decl| decl.kind != DeclKind::Field))
        });
        if writes_outer || declared.iter().any(|name| references_in_stmts(std::slice::from_ref(last), name.as_str())) {
            return None;
        }
        let binding = state.binding.clone();
        let kind = match self.config.policies.side_effect_stage {
            SideEffectStage::Map => OperationKind::Map {
                binding: binding.clone(),
                body: MapBody::Block {
                    stmts: prefix.to_vec(),
                    result: Expr::name(binding.clone()),
                },
                result_type: state.binding_type.clone(),
            },
            SideEffectStage::Peek => OperationKind::Peek {
                stmts: prefix.to_vec(),
            },
        };
        Some(Operation::new(kind, binding))
    }

    fn unused_param(&self, state: &FoldState<'_>) -> Ident {
        match &self.config.policies.unused_param {
            UnusedParamPolicy::Placeholder(name) => fresh_name(name, |n| state.is_taken(n)),
            UnusedParamPolicy::KeepName => state.binding.clone(),
        }
    }

    fn reduce_terminal(&self, model: &LoopModel<'_>, state: &mut FoldState<'_>, rest: &[Stmt]) -> TerminalMatch {
        let Some((last, prefix)) = rest.split_last() else {
            return TerminalMatch::NoMatch;
        };
        let Some(update) = detect_update(last) else {
            return TerminalMatch::NoMatch;
        };
        let accumulator = update.accumulator.as_str();
        if update.accumulator == state.binding || declared_names(prefix).contains(&update.accumulator) {
            return TerminalMatch::NoMatch;
        }
        let Some(decl) = model.scope().lookup(accumulator) else {
            return TerminalMatch::NoMatch;
        };
        // The accumulator may appear nowhere else in the loop.
        if usage_in_stmts(&model.body, accumulator) != usage_in_stmts(std::slice::from_ref(last), accumulator) {
            return TerminalMatch::NoMatch;
        }
        let operand_type = update
            .operand
            .as_ref()
            .and_then(|operand| infer_expr_type(&state.resolver, operand));
        let unused = self.unused_param(state);
        let ctx = ReduceContext {
            accumulator: decl,
            binding: &state.binding,
            operand_type,
            unused_param: unused,
            taken: &|name: &str| state.is_taken(name),
        };
        let Some(plan) = plan_reduce(&update, &ctx) else {
            lf_core::trace!("accumulator `{}` cannot be folded", accumulator);
            return TerminalMatch::NoMatch;
        };
        if !self.config.terminal_enabled(TerminalFamily::Reduce) {
            return TerminalMatch::Disabled(TerminalFamily::Reduce);
        }
        if !prefix.is_empty() {
            let Some(stage) = self.side_effect_stage(model, state, prefix, last) else {
                return TerminalMatch::NoMatch;
            };
            state.push(stage);
        }
        let element_type = match plan.mapped {
            Some(mapped) => {
                let op = Operation::new(
                    OperationKind::Map {
                        binding: state.binding.clone(),
                        body: MapBody::Expr(mapped),
                        result_type: Some(plan.mapped_type.clone()),
                    },
                    state.binding.clone(),
                );
                state.push(op);
                Some(plan.mapped_type)
            }
            None => state.binding_type.clone(),
        };
        let mut terminal = TerminalOperation::new(
            TerminalKind::Reduce {
                accumulator: update.accumulator.clone(),
                identity: Some(Expr::name(update.accumulator.clone())),
                combiner: plan.combiner,
                accumulator_type: plan.accumulator_type,
                element_type,
            },
            state.binding.clone(),
            false,
        );
        terminal.comments = comments_of(last);
        TerminalMatch::Matched(terminal)
    }

    /// The fresh `X<..> target = new X<>();` declaration right before the loop.
    fn fresh_declaration<'m>(&self, model: &LoopModel<'m>, target: &Ident) -> Option<(&'m StmtLocalVar, &'m TypeRef)> {
        let StmtKind::LocalVar(local) = &model.preceding().last()?.kind else {
            return None;
        };
        let declarator = local.single()?;
        if declarator.name != *target {
            return None;
        }
        let created = is_empty_creation(declarator.init.as_ref()?)?;
        Some((local, created))
    }

    fn collect_terminal(&self, model: &LoopModel<'_>, state: &mut FoldState<'_>, rest: &[Stmt]) -> TerminalMatch {
        let Some((last, prefix)) = rest.split_last() else {
            return TerminalMatch::NoMatch;
        };
        let Some((target, value)) = as_collection_add(last) else {
            return TerminalMatch::NoMatch;
        };
        let Some(decl) = model.scope().lookup(target.as_str()) else {
            return TerminalMatch::NoMatch;
        };
        let Some(target_type) = decl.ty.clone() else {
            return TerminalMatch::NoMatch;
        };
        if decl.kind != DeclKind::Local
            || !is_collection_type(&target_type)
            || collection_identity(model.iterated()) == target.as_str()
            || usage_in_stmts(&model.body, target.as_str()).total() != 1
            || references_in_expr(value, target.as_str())
        {
            return TerminalMatch::NoMatch;
        }

        let fresh = self.fresh_declaration(model, target);
        let created = fresh.map(|(_, created)| created.simple_name());
        let kind = match (target_type.simple_name(), created) {
            ("List" | "Collection" | "Iterable", None | Some("ArrayList")) => CollectKind::ToList,
            ("Set", None | Some("HashSet")) => CollectKind::ToSet,
            (_, Some(created)) => CollectKind::ToCollection(TypeRef::named(created)),
            (declared, None) if is_interface(declared) => CollectKind::ToList,
            (declared, None) => CollectKind::ToCollection(TypeRef::named(declared)),
        };
        // toList() and toSet() promise no mutability, so a target that is
        // mutated again later keeps its own collection type.
        let kind = match (kind, created) {
            (CollectKind::ToList | CollectKind::ToSet, Some(created))
                if find_mutation(model.following(), target.as_str()).is_some() =>
            {
                CollectKind::ToCollection(TypeRef::named(created))
            }
            (kind, _) => kind,
        };
        if !self.config.terminal_enabled(TerminalFamily::Collect) {
            return TerminalMatch::Disabled(TerminalFamily::Collect);
        }

        if !prefix.is_empty() {
            let Some(stage) = self.side_effect_stage(model, state, prefix, last) else {
                return TerminalMatch::NoMatch;
            };
            state.push(stage);
        }
        if !value.strip_parens().is_name(state.binding.as_str()) {
            let result_type = infer_expr_type(&state.resolver, value).map(|ty| ty.boxed());
            let op = Operation::new(
                OperationKind::Map {
                    binding: state.binding.clone(),
                    body: MapBody::Expr(value.clone()),
                    result_type: result_type.clone(),
                },
                state.binding.clone(),
            );
            state.push(op);
            let binding = state.binding.clone();
            state.rebind(binding, result_type);
        }

        let mut terminal = TerminalOperation::new(
            TerminalKind::Collect {
                kind,
                target: target.clone(),
                target_type,
                replaces_decl: fresh.map(|(local, _)| local.clone()),
            },
            state.binding.clone(),
            false,
        );
        terminal.comments = comments_of(last);
        TerminalMatch::Matched(terminal)
    }

    fn for_each_terminal(
        &self,
        model: &LoopModel<'_>,
        state: &mut FoldState<'_>,
        rest: Vec<Stmt>,
    ) -> Result<TerminalOperation, Fold> {
        if !summarize_control_flow(&rest).returns.is_empty() {
            return Err(Fold::Rejected(Rejection::new(
                RejectionReason::UnsafeControlFlow,
                "return inside a forEach body",
            )));
        }
        let declared: BTreeSet<Ident> = declared_names(&rest).into_iter().collect();
        let (writes, _) = assigned_variables(&rest);
        if let Some(name) = writes.iter().find(|name| {
            !declared.contains(*name)
                && model
                    .scope()
                    .lookup(name.as_str())
                    .map_or(false, |decl| decl.kind != DeclKind::Field)
        }) {
            return Err(Fold::Rejected(Rejection::new(
                RejectionReason::UnsafeExternalMutation,
                format!("`{name}` cannot be assigned inside a lambda"),
            )));
        }
        if !self.config.terminal_enabled(TerminalFamily::ForEach) {
            return Err(Fold::Disabled(TerminalFamily::ForEach));
        }
        let body: Vec<Stmt> = rest.iter().map(continue_to_return).collect();
        let param_live = references_in_stmts(&body, state.binding.as_str());
        Ok(TerminalOperation::new(
            TerminalKind::ForEach {
                ordered: !state.operations.is_empty(),
                body,
                dangling: model.body_comments.clone(),
            },
            state.binding.clone(),
            param_live,
        ))
    }
}

/// Collection interfaces other than the ones with a dedicated collector.
fn is_interface(name: &str) -> bool {
    matches!(
        name,
        "Queue" | "Deque" | "SortedSet" | "NavigableSet" | "BlockingQueue" | "BlockingDeque"
    )
}

/// A stage is live when a later stage or the terminal reads its output.
fn mark_liveness(operations: &mut [Operation], terminal: &TerminalOperation) {
    for idx in 0..operations.len() {
        let output = operations[idx].output_binding().clone();
        let mut live = false;
        let mut shadowed = false;
        for later in &operations[idx + 1..] {
            if later.references(output.as_str()) {
                live = true;
            }
            if matches!(later.kind, OperationKind::Map { .. } | OperationKind::FlatMap { .. })
                && later.output_binding() == &output
            {
                shadowed = true;
                break;
            }
        }
        operations[idx].live = live || (!shadowed && terminal.references(output.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_loop;
    use crate::model::LoopSite;
    use crate::pipeline::Combiner;
    use lf_core::ast::PrimitiveKind;
    use lf_core::scope::{Declaration, EnclosingScope, ScopeTypeResolver};
    use lf_lang::parse_statement;

    fn scope() -> EnclosingScope {
        EnclosingScope::new()
            .with(Declaration::local(
                "ls",
                TypeRef::generic("List", vec![TypeRef::named("Integer")]),
            ))
            .with(Declaration::local(
                "names",
                TypeRef::generic("List", vec![TypeRef::string()]),
            ))
            .with(Declaration::local(
                "out",
                TypeRef::generic("List", vec![TypeRef::string()]),
            ))
            .with(Declaration::local("sum", TypeRef::primitive(PrimitiveKind::Int)).reassigned())
    }

    fn fold_with(src: &str, site: &LoopSite, config: &ConversionConfig) -> Fold {
        let stmt = parse_statement(src).unwrap_or_else(|e| panic!("{src}: {e}"));
        let resolver = ScopeTypeResolver::new(&site.scope);
        let model = extract_loop(&stmt, site, &resolver).unwrap();
        OperationSequenceBuilder::new(config, &resolver).build(&model)
    }

    fn pipeline(src: &str) -> Pipeline {
        match fold_with(src, &LoopSite::new(scope()), &ConversionConfig::default()) {
            Fold::Pipeline(pipeline) => pipeline,
            other => panic!("{src}: {other:?}"),
        }
    }

    #[test]
    fn continue_becomes_negated_filter() {
        let pipeline = pipeline("for (Integer l : ls) { if (l == null) continue; System.out.println(l); }");
        assert!(matches!(
            pipeline.operations.as_slice(),
            [Operation { kind: OperationKind::Filter { negate: true, .. }, .. }]
        ));
        assert!(matches!(
            pipeline.terminal.kind,
            TerminalKind::ForEach { ordered: true, .. }
        ));
    }

    #[test]
    fn local_declaration_becomes_map() {
        let pipeline = pipeline("for (String n : names) { String t = n.trim(); if (!t.isEmpty()) print(t); }");
        let [map, filter] = pipeline.operations.as_slice() else {
            panic!("{:?}", pipeline.operations);
        };
        assert_eq!(map.output_binding().as_str(), "t");
        assert!(map.live);
        assert!(matches!(filter.kind, OperationKind::Filter { negate: false, .. }));
        assert_eq!(pipeline.terminal.param.as_str(), "t");
    }

    #[test]
    fn sum_folds_to_reduce() {
        let pipeline = pipeline("for (Integer l : ls) { sum += l; }");
        let TerminalKind::Reduce { combiner, .. } = &pipeline.terminal.kind else {
            panic!("{:?}", pipeline.terminal);
        };
        assert_eq!(
            combiner,
            &Combiner::MethodRef {
                class: "Integer".into(),
                method: "sum".into()
            }
        );
        assert!(pipeline.operations.is_empty());
    }

    #[test]
    fn side_effects_before_update_keep_their_order() {
        let pipeline = pipeline("for (Integer l : ls) { log(l); sum += l; }");
        assert!(matches!(
            pipeline.operations.as_slice(),
            [Operation { kind: OperationKind::Map { body: MapBody::Block { .. }, .. }, .. }]
        ));

        let mut config = ConversionConfig::default();
        config.policies.side_effect_stage = SideEffectStage::Peek;
        let Fold::Pipeline(peeked) = fold_with(
            "for (Integer l : ls) { log(l); sum += l; }",
            &LoopSite::new(scope()),
            &config,
        ) else {
            panic!("not folded");
        };
        assert!(matches!(
            peeked.operations.as_slice(),
            [Operation { kind: OperationKind::Peek { .. }, .. }]
        ));
    }

    #[test]
    fn add_to_other_collection_collects() {
        let decl = parse_statement("List<String> out = new ArrayList<>();").unwrap();
        let site = LoopSite::new(scope()).with_preceding(vec![decl]);
        let Fold::Pipeline(pipeline) = fold_with(
            "for (String n : names) { out.add(n.trim()); }",
            &site,
            &ConversionConfig::default(),
        ) else {
            panic!("not folded");
        };
        assert!(pipeline.replaces_declaration());
        assert!(matches!(
            pipeline.terminal.kind,
            TerminalKind::Collect { kind: CollectKind::ToList, .. }
        ));
    }

    #[test]
    fn early_boolean_return_is_a_match() {
        let site = LoopSite::new(scope())
            .with_following(vec![parse_statement("return true;").unwrap()]);
        let Fold::Pipeline(pipeline) = fold_with(
            "for (String n : names) { if (!n.isEmpty()) return false; }",
            &site,
            &ConversionConfig::default(),
        ) else {
            panic!("not folded");
        };
        let TerminalKind::Match { kind, predicate, value } = &pipeline.terminal.kind else {
            panic!("{:?}", pipeline.terminal);
        };
        assert_eq!(*kind, MatchKind::All);
        assert!(!value);
        assert!(matches!(predicate.kind(), ExprKind::MethodCall(_)));
    }

    #[test]
    fn disabled_family_is_reported() {
        let mut config = ConversionConfig::default();
        config.features.reduce = false;
        let fold = fold_with("for (Integer l : ls) { sum += l; }", &LoopSite::new(scope()), &config);
        assert_eq!(fold, Fold::Disabled(TerminalFamily::Reduce));
    }

    #[test]
    fn local_write_in_for_each_is_rejected() {
        let fold = fold_with(
            "for (Integer l : ls) { if (l > 0) { sum = l; } }",
            &LoopSite::new(scope()),
            &ConversionConfig::default(),
        );
        assert!(matches!(
            fold,
            Fold::Rejected(Rejection { reason: RejectionReason::UnsafeExternalMutation, .. })
        ));
    }
}
