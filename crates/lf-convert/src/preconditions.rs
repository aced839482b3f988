//! Safety rules. Each one rejects a loop whose rewrite could change what the
//! program does; the first rule that fires decides the reported reason.

use std::collections::BTreeSet;

use lf_core::ast::visit::{walk_expr, walk_stmt, Visit};
use lf_core::ast::{Expr, ExprKind, Ident, Member, Stmt, StmtKind, TypeRef};
use lf_core::scope::{DeclKind, TypeResolver};
use serde::{Deserialize, Serialize};

use crate::model::{LoopKind, LoopModel};
use crate::queries::{
    assigned_variables, collection_identity, find_mutation, names_in_stmts, summarize_control_flow,
    usage_in_stmts,
};
use crate::reduce::detect_update;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum RejectionReason {
    #[display("UnsupportedLoopShape")]
    UnsupportedLoopShape,
    #[display("UnsafeControlFlow")]
    UnsafeControlFlow,
    #[display("IteratedCollectionMutated")]
    IteratedCollectionMutated,
    #[display("UnsafeIndexUsage")]
    UnsafeIndexUsage,
    #[display("UnsafeExternalMutation")]
    UnsafeExternalMutation,
    #[display("ConcurrentCollectionMutationConflict")]
    ConcurrentCollectionMutationConflict,
    /// Builder-internal; resolves to a `forEach` fallback and is never
    /// reported on its own.
    #[display("NoTerminalPatternMatched")]
    NoTerminalPatternMatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display("{reason}: {detail}")]
pub struct Rejection {
    pub reason: RejectionReason,
    pub detail: String,
}

impl Rejection {
    pub fn new(reason: RejectionReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreconditionReport {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl PreconditionReport {
    pub fn eligible() -> Self {
        Self {
            eligible: true,
            rejection: None,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            eligible: false,
            rejection: Some(rejection),
        }
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        self.rejection.as_ref().map(|rejection| rejection.reason)
    }
}

impl From<Rejection> for PreconditionReport {
    fn from(rejection: Rejection) -> Self {
        PreconditionReport::rejected(rejection)
    }
}

type Rule = Result<(), Rejection>;

pub struct PreconditionChecker<'a> {
    resolver: &'a dyn TypeResolver,
}

impl<'a> PreconditionChecker<'a> {
    pub fn new(resolver: &'a dyn TypeResolver) -> Self {
        Self { resolver }
    }

    pub fn check(&self, model: &LoopModel<'_>) -> PreconditionReport {
        match self.run_rules(model) {
            Ok(()) => PreconditionReport::eligible(),
            Err(rejection) => PreconditionReport::rejected(rejection),
        }
    }

    fn run_rules(&self, model: &LoopModel<'_>) -> Rule {
        check_control_flow(model)?;
        check_returns(model)?;
        self.check_concurrent_mutation(model)?;
        check_iterated_mutation(model)?;
        check_index_usage(model)?;
        check_external_mutation(model)?;
        Ok(())
    }

    /// Type of the collection behind `expr`, looking through map views.
    fn collection_type(&self, expr: &Expr) -> Option<TypeRef> {
        match expr.strip_parens().as_call() {
            Some(call)
                if call.args.is_empty()
                    && matches!(call.name.as_str(), "keySet" | "values" | "entrySet") =>
            {
                call.target.as_ref().and_then(|target| self.collection_type(target))
            }
            _ => self.resolver.type_of(expr),
        }
    }

    fn check_concurrent_mutation(&self, model: &LoopModel<'_>) -> Rule {
        let iterated = model.iterated();
        let Some(ty) = self.collection_type(iterated) else {
            return Ok(());
        };
        if !self.resolver.is_concurrent_collection(&ty) {
            return Ok(());
        }
        match find_mutation(&model.body, &collection_identity(iterated)) {
            Some(op) => Err(Rejection::new(
                RejectionReason::ConcurrentCollectionMutationConflict,
                format!("`{op}` on a {} while iterating it", ty.simple_name()),
            )),
            None => Ok(()),
        }
    }
}

fn check_control_flow(model: &LoopModel<'_>) -> Rule {
    let summary = summarize_control_flow(&model.body);
    match summary.unsafe_construct() {
        Some(construct) => Err(Rejection::new(
            RejectionReason::UnsafeControlFlow,
            format!("loop body contains {construct}"),
        )),
        None => Ok(()),
    }
}

/// Value of the first statement after the loop when it is `return <value>;`.
pub fn following_return<'s>(model: &LoopModel<'s>) -> Option<&'s Expr> {
    match model.following().first().map(|stmt| &stmt.kind) {
        Some(StmtKind::Return(Some(value))) => Some(value),
        _ => None,
    }
}

/// Early exits are limited to a single `return true|false` paired with the
/// opposite return after the loop, or a single `return <element>` followed
/// by a fallback return.
fn check_returns(model: &LoopModel<'_>) -> Rule {
    let summary = summarize_control_flow(&model.body);
    let reject = |detail: &str| Err(Rejection::new(RejectionReason::UnsafeControlFlow, detail));
    match summary.returns.as_slice() {
        [] => Ok(()),
        [Some(value)] => {
            let Some(after) = following_return(model) else {
                return reject("early return without a return after the loop");
            };
            match value.strip_parens().as_bool() {
                Some(value) if after.strip_parens().as_bool() == Some(!value) => Ok(()),
                Some(_) => reject("early boolean return is not paired with its negation"),
                None if value.strip_parens().as_name().is_some() => Ok(()),
                None => reject("early return of a computed value"),
            }
        }
        [None] => reject("bare return inside the loop"),
        _ => reject("several early returns"),
    }
}

fn check_iterated_mutation(model: &LoopModel<'_>) -> Rule {
    let identity = collection_identity(model.iterated());
    match find_mutation(&model.body, &identity) {
        Some(op) => Err(Rejection::new(
            RejectionReason::IteratedCollectionMutated,
            format!("`{identity}.{op}` inside the loop"),
        )),
        None => Ok(()),
    }
}

/// Counts `t[i]` and `t.get(i)` for the indexed target `t`.
struct ElementAccesses<'a> {
    counter: &'a str,
    target: String,
    count: usize,
}

impl ElementAccesses<'_> {
    fn is_counter(&self, expr: &Expr) -> bool {
        expr.strip_parens().is_name(self.counter)
    }

    fn is_target(&self, expr: &Expr) -> bool {
        collection_identity(expr) == self.target
    }
}

impl Visit for ElementAccesses<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr.kind() {
            ExprKind::Index(index) if self.is_counter(&index.index) && self.is_target(&index.target) => {
                self.count += 1;
            }
            ExprKind::MethodCall(call)
                if call.name == "get"
                    && matches!(call.args.as_slice(), [arg] if self.is_counter(arg))
                    && call.target.as_ref().map_or(false, |t| self.is_target(t)) =>
            {
                self.count += 1;
            }
            _ => {}
        }
        walk_expr(self, expr)
    }
}

fn check_index_usage(model: &LoopModel<'_>) -> Rule {
    let (LoopKind::IndexedCounter, Some(indexed)) = (model.kind, &model.indexed) else {
        return Ok(());
    };
    let counter = model.binding.name.as_str();
    let usage = usage_in_stmts(&model.body, counter);
    let reject = |detail: String| Err(Rejection::new(RejectionReason::UnsafeIndexUsage, detail));
    if usage.writes > 0 {
        return reject(format!("counter `{counter}` is assigned in the body"));
    }
    if usage.reads == 0 {
        return Ok(());
    }
    if usage.reads > 1 {
        return reject(format!("counter `{counter}` is used {} times", usage.reads));
    }
    let mut accesses = ElementAccesses {
        counter,
        target: collection_identity(&indexed.target),
        count: 0,
    };
    for stmt in &model.body {
        accesses.visit_stmt(stmt);
    }
    if accesses.count == 1 {
        Ok(())
    } else {
        reject(format!("counter `{counter}` is used beyond element access"))
    }
}

/// Locals declared anywhere in the body, at any depth.
struct BodyLocals(BTreeSet<Ident>);

impl Visit for BodyLocals {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let StmtKind::LocalVar(local) = &stmt.kind {
            self.0.extend(local.declarators.iter().map(|d| d.name.clone()));
        }
        walk_stmt(self, stmt)
    }

    fn visit_class_body(&mut self, _members: &[Member]) {}
}

fn body_locals(stmts: &[Stmt]) -> BTreeSet<Ident> {
    let mut locals = BodyLocals(BTreeSet::new());
    for stmt in stmts {
        locals.visit_stmt(stmt);
    }
    locals.0
}

/// Whether an accumulator update on `name` appears in `stmts`, looking into
/// blocks and `if` branches.
fn has_accumulator_update(stmts: &[Stmt], name: &str) -> bool {
    stmts.iter().any(|stmt| {
        if detect_update(stmt).map_or(false, |update| update.accumulator == name) {
            return true;
        }
        match &stmt.kind {
            StmtKind::Block(block) => has_accumulator_update(&block.stmts, name),
            StmtKind::If(stmt_if) => {
                has_accumulator_update(stmt_if.then.as_stmt_list(), name)
                    || stmt_if
                        .otherwise
                        .as_ref()
                        .map_or(false, |otherwise| has_accumulator_update(otherwise.as_stmt_list(), name))
            }
            _ => false,
        }
    })
}

fn check_external_mutation(model: &LoopModel<'_>) -> Rule {
    let scope = model.scope();
    let locals = body_locals(&model.body);
    let (names, this_fields) = assigned_variables(&model.body);
    let reject = |detail: String| Err(Rejection::new(RejectionReason::UnsafeExternalMutation, detail));

    let mut accumulators = BTreeSet::new();
    let distinct: BTreeSet<&Ident> = names.iter().collect();
    for name in distinct {
        if locals.contains(name) || *name == model.binding.name {
            continue;
        }
        let Some(decl) = scope.lookup(name.as_str()) else {
            continue;
        };
        let writes = names.iter().filter(|n| *n == name).count()
            + this_fields.iter().filter(|n| *n == name).count();
        let is_accumulator = writes == 1 && has_accumulator_update(&model.body, name.as_str());
        match decl.kind {
            DeclKind::Field if writes <= 1 => {}
            _ if is_accumulator => {
                accumulators.insert(name.clone());
            }
            DeclKind::Field => {
                return reject(format!("field `{name}` is written {writes} times"));
            }
            DeclKind::Local | DeclKind::Parameter => {
                return reject(format!("`{name}` is reassigned inside the loop"));
            }
        }
    }

    let distinct_fields: BTreeSet<&Ident> = this_fields.iter().collect();
    for field in distinct_fields {
        let writes = this_fields.iter().filter(|n| *n == field).count();
        if writes > 1 && !has_accumulator_update(&model.body, field.as_str()) {
            return reject(format!("field `this.{field}` is written {writes} times"));
        }
    }

    for name in names_in_stmts(&model.body) {
        if locals.contains(&name) || accumulators.contains(&name) {
            continue;
        }
        let Some(decl) = scope.lookup(name.as_str()) else {
            continue;
        };
        if decl.kind != DeclKind::Field && !decl.effectively_final {
            return reject(format!("`{name}` is not effectively final"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_loop;
    use crate::model::LoopSite;
    use lf_core::ast::PrimitiveKind;
    use lf_core::scope::{Declaration, EnclosingScope, ScopeTypeResolver};
    use lf_lang::parse_statement;

    fn scope() -> EnclosingScope {
        let list = TypeRef::generic("List", vec![TypeRef::named("Integer")]);
        EnclosingScope::new()
            .with(Declaration::field("hits", TypeRef::primitive(PrimitiveKind::Int)))
            .with(Declaration::new(
                "shared",
                Some(TypeRef::generic("CopyOnWriteArrayList", vec![TypeRef::named("Integer")])),
                DeclKind::Field,
            ))
            .with(Declaration::local("list", list.clone()))
            .with(Declaration::local("other", list))
            .with(Declaration::local("sum", TypeRef::primitive(PrimitiveKind::Int)).reassigned())
            .with(Declaration::local("label", TypeRef::string()).reassigned())
            .with(Declaration::local(
                "values",
                TypeRef::array_of(TypeRef::primitive(PrimitiveKind::Int)),
            ))
    }

    fn check_with(src: &str, site: &LoopSite) -> PreconditionReport {
        let stmt = parse_statement(src).unwrap_or_else(|e| panic!("{src}: {e}"));
        let resolver = ScopeTypeResolver::new(&site.scope);
        match extract_loop(&stmt, site, &resolver) {
            Ok(model) => PreconditionChecker::new(&resolver).check(&model),
            Err(rejection) => rejection.into(),
        }
    }

    fn reason(src: &str) -> Option<RejectionReason> {
        check_with(src, &LoopSite::new(scope())).reason()
    }

    #[test]
    fn plain_loops_are_eligible() {
        assert_eq!(reason("for (Integer x : list) { print(x); }"), None);
        assert_eq!(reason("for (Integer x : list) { if (x == null) continue; other.add(x); }"), None);
        assert_eq!(reason("for (Integer x : list) { sum += x; }"), None);
        assert_eq!(reason("for (Integer x : list) { hits++; }"), None);
    }

    #[test]
    fn control_flow_rejects() {
        for src in [
            "for (Integer x : list) { if (x > 3) break; }",
            "for (Integer x : list) { try { f(x); } catch (Exception e) { } }",
            "for (Integer x : list) { switch (x) { default: f(x); } }",
            "for (Integer x : list) { synchronized (this) { f(x); } }",
            "for (Integer x : list) { throw new IllegalStateException(); }",
            "for (Integer x : list) { for (Integer y : other) { f(x, y); } }",
            "for (Integer x : list) { if (x > 3) return; }",
        ] {
            assert_eq!(reason(src), Some(RejectionReason::UnsafeControlFlow), "{src}");
        }
    }

    #[test]
    fn lambda_jumps_belong_to_the_lambda() {
        let src = "for (Integer x : list) { run(() -> { return; }); }";
        assert_eq!(reason(src), None);
    }

    #[test]
    fn boolean_return_needs_its_negation_after_the_loop() {
        let src = "for (Integer x : list) { if (x > 3) return true; }";
        let paired = LoopSite::new(scope())
            .with_following(vec![parse_statement("return false;").unwrap()]);
        let same = LoopSite::new(scope())
            .with_following(vec![parse_statement("return true;").unwrap()]);
        assert!(check_with(src, &paired).eligible);
        assert_eq!(
            check_with(src, &same).reason(),
            Some(RejectionReason::UnsafeControlFlow)
        );
    }

    #[test]
    fn iterated_collection_mutation() {
        assert_eq!(
            reason("for (Integer x : list) { if (x == 0) { list.remove(x); } }"),
            Some(RejectionReason::IteratedCollectionMutated)
        );
        assert_eq!(
            reason("for (Integer x : this.list) { list.add(x); }"),
            Some(RejectionReason::IteratedCollectionMutated)
        );
    }

    #[test]
    fn concurrent_sources_report_the_specific_reason() {
        assert_eq!(
            reason("for (Integer x : shared) { shared.add(x); }"),
            Some(RejectionReason::ConcurrentCollectionMutationConflict)
        );
        assert_eq!(reason("for (Integer x : shared) { print(x); }"), None);
    }

    #[test]
    fn index_used_once_for_element_access() {
        assert_eq!(reason("for (int i = 0; i < values.length; i++) { print(values[i]); }"), None);
        assert_eq!(reason("for (int i = 0; i < list.size(); i++) { print(list.get(i)); }"), None);
        for src in [
            "for (int i = 0; i < values.length; i++) { print(values[i + 1]); }",
            "for (int i = 0; i < values.length; i++) { if (i % 2 == 0) print(values[i]); }",
            "for (int i = 0; i < values.length; i++) { print(i); }",
            "for (int i = 0; i < values.length; i++) { i++; }",
        ] {
            assert_eq!(reason(src), Some(RejectionReason::UnsafeIndexUsage), "{src}");
        }
    }

    #[test]
    fn external_mutation() {
        assert_eq!(
            reason("for (Integer x : list) { label = label + x; label = label.trim(); }"),
            Some(RejectionReason::UnsafeExternalMutation)
        );
        assert_eq!(
            reason("for (Integer x : list) { if (x > 0) { sum = x; } }"),
            Some(RejectionReason::UnsafeExternalMutation)
        );
        assert_eq!(
            reason("for (Integer x : list) { print(label); }"),
            Some(RejectionReason::UnsafeExternalMutation)
        );
        assert_eq!(reason("for (Integer x : list) { this.hits = x; }"), None);
    }
}
