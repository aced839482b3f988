//! Host driver: walk every body of a compilation unit, convert loops
//! inner-first and turn the replacements into text edits.

use std::collections::BTreeSet;
use std::fmt;

use lf_core::ast::{
    Block, Comment, CompilationUnit, Ident, Member, Param, Stmt, StmtKind, TypeDecl,
};
use lf_core::config::{ConversionConfig, TerminalFamily};
use lf_core::edit::{apply_edits, insert_imports, TextEdit};
use lf_core::printer::JavaPrinter;
use lf_core::scope::{infer_expr_type, DeclKind, Declaration, EnclosingScope, ScopeTypeResolver, TypeResolver};
use lf_core::source_map::SourceFile;
use lf_core::span::Span;
use lf_core::Result;
use lf_lang::JavaParser;
use serde::{Deserialize, Serialize};

use crate::engine::{Conversion, LoopConverter, Rewrite};
use crate::model::{LoopKind, LoopSite};
use crate::preconditions::RejectionReason;
use crate::queries::assigned_variables;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum LoopVerdict {
    Converted { family: TerminalFamily },
    Rejected { reason: RejectionReason, detail: String },
    Disabled { family: TerminalFamily },
}

impl fmt::Display for LoopVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopVerdict::Converted { family } => write!(f, "converted ({})", family.as_str()),
            LoopVerdict::Rejected { reason, detail } => write!(f, "rejected: {reason}: {detail}"),
            LoopVerdict::Disabled { family } => write!(f, "{} terminal disabled", family.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopOutcome {
    pub span: Span,
    /// 1-based line of the loop keyword.
    pub line: usize,
    pub kind: Option<LoopKind>,
    #[serde(flatten)]
    pub verdict: LoopVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl LoopOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self.verdict, LoopVerdict::Converted { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub outcomes: Vec<LoopOutcome>,
    pub edits: Vec<TextEdit>,
    pub imports: BTreeSet<String>,
}

impl UnitReport {
    pub fn converted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_converted()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedSource {
    pub text: String,
    pub report: UnitReport,
}

impl ConvertedSource {
    pub fn changed(&self) -> bool {
        !self.report.edits.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversionDriver {
    converter: LoopConverter,
}

impl ConversionDriver {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            converter: LoopConverter::new(config),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        self.converter.config()
    }

    pub fn convert_unit(&self, unit: &CompilationUnit, file: &SourceFile) -> Result<UnitReport> {
        let mut walker = UnitWalker {
            converter: &self.converter,
            file,
            writes: BTreeSet::new(),
            outcomes: Vec::new(),
            edits: Vec::new(),
            imports: BTreeSet::new(),
        };
        for ty in &unit.types {
            walker.walk_type(ty, &EnclosingScope::new())?;
        }
        let edits = walker
            .edits
            .into_iter()
            .map(|(span, text)| TextEdit::replace(span.range(), text))
            .collect();
        Ok(UnitReport {
            outcomes: walker.outcomes,
            edits,
            imports: walker.imports,
        })
    }

    /// Parse `file`, convert it and apply the edits, imports included.
    pub fn convert_file(&self, file: &SourceFile) -> Result<ConvertedSource> {
        let parser = JavaParser::new(self.config().policies.comments.clone());
        let unit = parser.parse_compilation_unit(file)?;
        let report = self.convert_unit(&unit, file)?;
        let source: &str = &file.source;
        if report.edits.is_empty() {
            return Ok(ConvertedSource {
                text: source.to_string(),
                report,
            });
        }
        let imports: Vec<String> = report.imports.iter().cloned().collect();
        let mut edits = report.edits.clone();
        edits.extend(insert_imports(source, &unit, &imports));
        let text = apply_edits(source, &edits)?;
        lf_core::debug!(
            "{}: {} of {} loop(s) converted",
            file.path.display(),
            report.converted_count(),
            report.outcomes.len()
        );
        Ok(ConvertedSource { text, report })
    }
}

/// Convert every loop in `source`. Text outside converted loops is kept
/// byte for byte.
pub fn convert_source(source: &str, config: &ConversionConfig) -> Result<ConvertedSource> {
    ConversionDriver::new(config.clone()).convert_file(&SourceFile::anonymous(source))
}

fn is_loop_candidate(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Labeled(labeled) => labeled.body.is_loop(),
        _ => stmt.is_loop(),
    }
}

/// Number of leading for-each loops in `stmts` whose bodies end in an
/// `add` on the same collection.
fn concat_run(stmts: &[Stmt]) -> usize {
    let Some(target) = stmts.first().and_then(added_target) else {
        return 0;
    };
    stmts
        .iter()
        .take_while(|stmt| added_target(stmt) == Some(target))
        .count()
}

/// `target` of a for-each loop ending in `target.add(x)`, looking through
/// guarding `if`s.
fn added_target(stmt: &Stmt) -> Option<&Ident> {
    let StmtKind::ForEach(for_each) = &stmt.kind else {
        return None;
    };
    let mut last = for_each.body.as_stmt_list().last()?;
    loop {
        match &last.kind {
            StmtKind::If(stmt_if) if stmt_if.otherwise.is_none() => {
                last = stmt_if.then.as_stmt_list().last()?;
            }
            StmtKind::Expr(expr) => {
                let call = expr.as_call()?;
                if call.name.as_str() != "add" || call.args.len() != 1 {
                    return None;
                }
                return call.target.as_ref()?.as_name();
            }
            _ => return None,
        }
    }
}

struct UnitWalker<'a> {
    converter: &'a LoopConverter,
    file: &'a SourceFile,
    /// Names assigned anywhere in the current body.
    writes: BTreeSet<Ident>,
    outcomes: Vec<LoopOutcome>,
    edits: Vec<(Span, String)>,
    imports: BTreeSet<String>,
}

impl UnitWalker<'_> {
    fn walk_type(&mut self, ty: &TypeDecl, outer: &EnclosingScope) -> Result<()> {
        let mut scope = outer.clone();
        for component in &ty.record_components {
            scope.push(
                Declaration::new(
                    component.name.clone(),
                    Some(component.effective_type()),
                    DeclKind::Field,
                )
                .with_annotations(component.modifiers.annotation_names()),
            );
        }
        for field in ty.fields() {
            for declarator in &field.declarators {
                let mut field_type = field.ty.clone();
                field_type.dims += declarator.dims;
                let decl = Declaration::new(declarator.name.clone(), Some(field_type), DeclKind::Field)
                    .with_annotations(field.modifiers.annotation_names());
                scope.push(if field.modifiers.is_final() {
                    decl
                } else {
                    decl.reassigned()
                });
            }
        }
        for member in &ty.members {
            match member {
                Member::Method(method) | Member::Constructor(method) => {
                    if let Some(body) = &method.body {
                        self.walk_body(&body.stmts, &scope, &method.params)?;
                    }
                }
                Member::Initializer(init) => self.walk_body(&init.body.stmts, &scope, &[])?,
                Member::Type(nested) => self.walk_type(nested, &scope)?,
                Member::Field(_) => {}
            }
        }
        Ok(())
    }

    fn walk_body(&mut self, stmts: &[Stmt], scope: &EnclosingScope, params: &[Param]) -> Result<()> {
        self.writes = assigned_variables(stmts).0.into_iter().collect();
        let mut scope = scope.clone();
        for param in params {
            let decl = Declaration::new(
                param.name.clone(),
                Some(param.effective_type()),
                DeclKind::Parameter,
            )
            .with_annotations(param.modifiers.annotation_names());
            scope.push(self.finality(decl));
        }
        self.process_stmts(stmts, &scope)?;
        Ok(())
    }

    fn finality(&self, decl: Declaration) -> Declaration {
        if self.writes.contains(&decl.name) {
            decl.reassigned()
        } else {
            decl
        }
    }

    fn declare_locals(&self, scope: &mut EnclosingScope, stmt: &Stmt) {
        let StmtKind::LocalVar(local) = &stmt.kind else {
            return;
        };
        for declarator in &local.declarators {
            let ty = if local.ty.is_inferred() {
                declarator
                    .init
                    .as_ref()
                    .and_then(|init| infer_expr_type(&ScopeTypeResolver::new(scope), init))
            } else {
                Some(local.declarator_type(declarator))
            };
            let decl = Declaration::new(declarator.name.clone(), ty, DeclKind::Local)
                .with_annotations(local.modifiers.annotation_names());
            scope.push(self.finality(decl));
        }
    }

    /// Convert nested bodies first, then the loops of `stmts` itself.
    fn process_stmts(&mut self, stmts: &[Stmt], scope: &EnclosingScope) -> Result<Vec<Stmt>> {
        let mut nested_scope = scope.clone();
        let mut processed = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            processed.push(self.process_nested(stmt, &nested_scope)?);
            self.declare_locals(&mut nested_scope, stmt);
        }

        let mut scope = scope.clone();
        let mut done: Vec<Stmt> = Vec::with_capacity(processed.len());
        let mut idx = 0;
        while idx < processed.len() {
            let stmt = &processed[idx];
            if !is_loop_candidate(stmt) {
                self.declare_locals(&mut scope, stmt);
                done.push(stmt.clone());
                idx += 1;
                continue;
            }

            let run = concat_run(&processed[idx..]);
            if run >= 2 {
                let following = processed[idx + run..].to_vec();
                let loops: Vec<(&Stmt, LoopSite)> = processed[idx..idx + run]
                    .iter()
                    .enumerate()
                    .map(|(offset, stmt)| {
                        let mut preceding = done.clone();
                        preceding.extend_from_slice(&processed[idx..idx + offset]);
                        let site = LoopSite::new(scope.clone())
                            .with_preceding(preceding)
                            .with_following(following.clone());
                        (stmt, site)
                    })
                    .collect();
                if let Some(rewrite) = self.converter.convert_concat(&loops)? {
                    let before = rewrite.consumed_before.min(done.len());
                    let consumed = done.split_off(done.len() - before);
                    let group: Vec<&Stmt> = consumed.iter().chain(&processed[idx..idx + run]).collect();
                    let family = rewrite.family;
                    let (range, text) = self.splice(&group, rewrite, &mut scope, &mut done);
                    for (offset, stmt) in processed[idx..idx + run].iter().enumerate() {
                        self.outcomes.push(LoopOutcome {
                            span: range,
                            line: self.file.line_of(stmt.span.lo),
                            kind: LoopKind::of_stmt(stmt),
                            verdict: LoopVerdict::Converted { family },
                            replacement: (offset == 0).then(|| text.clone()),
                        });
                    }
                    idx += run;
                    continue;
                }
            }

            let site = LoopSite::new(scope.clone())
                .with_preceding(done.clone())
                .with_following(processed[idx + 1..].to_vec());
            let kind = LoopKind::of_stmt(stmt);
            let line = self.file.line_of(stmt.span.lo);
            let conversion = self.converter.convert(stmt, &site)?;
            let verdict = match conversion {
                Conversion::Converted(rewrite) => {
                    let before = rewrite.consumed_before.min(done.len());
                    let after = rewrite.consumed_after.min(processed.len() - idx - 1);
                    let consumed = done.split_off(done.len() - before);
                    let group: Vec<&Stmt> = consumed.iter().chain(&processed[idx..=idx + after]).collect();
                    let family = rewrite.family;
                    let (range, text) = self.splice(&group, rewrite, &mut scope, &mut done);
                    self.outcomes.push(LoopOutcome {
                        span: range,
                        line,
                        kind,
                        verdict: LoopVerdict::Converted { family },
                        replacement: Some(text),
                    });
                    idx += 1 + after;
                    continue;
                }
                Conversion::Rejected(report) => match report.rejection {
                    Some(rejection) => LoopVerdict::Rejected {
                        reason: rejection.reason,
                        detail: rejection.detail,
                    },
                    None => LoopVerdict::Rejected {
                        reason: RejectionReason::UnsupportedLoopShape,
                        detail: String::new(),
                    },
                },
                Conversion::Disabled(family) => LoopVerdict::Disabled { family },
            };
            self.outcomes.push(LoopOutcome {
                span: stmt.span,
                line,
                kind,
                verdict,
                replacement: None,
            });
            done.push(stmt.clone());
            idx += 1;
        }
        Ok(done)
    }

    /// Body of a compound statement. A lone statement is processed as a
    /// one-element list.
    fn process_body(&mut self, body: &Stmt, scope: &EnclosingScope) -> Result<Stmt> {
        if matches!(body.kind, StmtKind::Block(_)) {
            return self.process_nested(body, scope);
        }
        let mut stmts = self.process_stmts(std::slice::from_ref(body), scope)?;
        if stmts.len() == 1 {
            return Ok(stmts.remove(0));
        }
        Ok(Stmt::new(StmtKind::Block(Block::new(stmts)), body.span))
    }

    /// Copy of `stmt` with the loops nested in it converted.
    fn process_nested(&mut self, stmt: &Stmt, scope: &EnclosingScope) -> Result<Stmt> {
        let mut out = stmt.clone();
        match &mut out.kind {
            StmtKind::Block(block) => block.stmts = self.process_stmts(&block.stmts, scope)?,
            StmtKind::If(stmt_if) => {
                *stmt_if.then = self.process_body(&stmt_if.then, scope)?;
                if let Some(otherwise) = &mut stmt_if.otherwise {
                    **otherwise = self.process_body(otherwise, scope)?;
                }
            }
            StmtKind::For(stmt_for) => {
                let mut inner = scope.clone();
                for init in &stmt_for.init {
                    self.declare_locals(&mut inner, init);
                }
                *stmt_for.body = self.process_body(&stmt_for.body, &inner)?;
            }
            StmtKind::ForEach(for_each) => {
                let mut inner = scope.clone();
                let ty = if for_each.ty.is_inferred() {
                    ScopeTypeResolver::new(scope)
                        .type_of(&for_each.iterable)
                        .and_then(|ty| ty.element_type())
                } else {
                    Some(for_each.ty.clone())
                };
                inner.push(self.finality(Declaration::new(for_each.name.clone(), ty, DeclKind::Local)));
                *for_each.body = self.process_body(&for_each.body, &inner)?;
            }
            StmtKind::While(stmt_while) => {
                *stmt_while.body = self.process_body(&stmt_while.body, scope)?;
            }
            StmtKind::DoWhile(stmt_do) => {
                *stmt_do.body = self.process_body(&stmt_do.body, scope)?;
            }
            StmtKind::Labeled(labeled) => {
                *labeled.body = self.process_nested(&labeled.body, scope)?;
            }
            StmtKind::Try(stmt_try) => {
                let mut inner = scope.clone();
                for resource in &stmt_try.resources {
                    self.declare_locals(&mut inner, resource);
                }
                stmt_try.body.stmts = self.process_stmts(&stmt_try.body.stmts, &inner)?;
                for catch in &mut stmt_try.catches {
                    let mut catch_scope = scope.clone();
                    let ty = match catch.types.as_slice() {
                        [single] => Some(single.clone()),
                        _ => None,
                    };
                    catch_scope.push(Declaration::new(catch.name.clone(), ty, DeclKind::Local));
                    catch.body.stmts = self.process_stmts(&catch.body.stmts, &catch_scope)?;
                }
                if let Some(finally) = &mut stmt_try.finally {
                    finally.stmts = self.process_stmts(&finally.stmts, scope)?;
                }
            }
            StmtKind::Switch(switch) => {
                for case in &mut switch.cases {
                    case.body = self.process_stmts(&case.body, scope)?;
                }
            }
            StmtKind::Synchronized(sync) => {
                sync.body.stmts = self.process_stmts(&sync.body.stmts, scope)?;
            }
            _ => {}
        }
        Ok(out)
    }

    /// Replace `group` with the rewrite's statements and record the edit.
    fn splice(
        &mut self,
        group: &[&Stmt],
        rewrite: Rewrite,
        scope: &mut EnclosingScope,
        done: &mut Vec<Stmt>,
    ) -> (Span, String) {
        let (range, replacement) = replace_group(group, rewrite.stmts);
        let text = self.edit_text(range, &replacement);
        self.edits.retain(|(span, _)| !range.contains(span));
        self.edits.push((range, text.clone()));
        self.imports.extend(rewrite.imports);
        for stmt in &replacement {
            self.declare_locals(scope, stmt);
        }
        done.extend(replacement);
        (range, text)
    }

    /// Replacement text at the indentation of the line the range starts on.
    fn edit_text(&self, range: Span, stmts: &[Stmt]) -> String {
        let indent = self.file.indentation_at(range.lo);
        let printed = JavaPrinter::default().print_stmts(stmts);
        printed.replace('\n', &format!("\n{indent}"))
    }
}

/// Span covering `group`, and `stmts` moved onto it. Comments that sat
/// between the grouped statements lead the replacement.
fn replace_group(group: &[&Stmt], mut stmts: Vec<Stmt>) -> (Span, Vec<Stmt>) {
    let (Some(first), Some(last)) = (group.first(), group.last()) else {
        return (Span::null(), stmts);
    };
    let range = first.span.union(last.span);
    let mut carried: Vec<Comment> = Vec::new();
    for (idx, stmt) in group.iter().enumerate() {
        if idx > 0 {
            carried.extend(stmt.comments.leading.iter().cloned());
        }
        if idx + 1 < group.len() {
            carried.extend(stmt.comments.trailing.iter().cloned().map(|mut comment| {
                comment.same_line = false;
                comment
            }));
        }
    }
    for stmt in &mut stmts {
        stmt.span = range;
    }
    if let Some(first) = stmts.first_mut() {
        carried.append(&mut first.comments.leading);
        first.comments.leading = carried;
    }
    (range, stmts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn untouched_source_is_identical() {
        let src = "class A {\n    int f(int[] xs) {\n        int i = 0;\n        while (i < 3) { i++; }\n        return i;\n    }\n}\n";
        let converted = convert_source(src, &ConversionConfig::default()).unwrap();
        assert_eq!(converted.text, src);
        assert!(!converted.changed());
        assert_eq!(converted.report.outcomes.len(), 1);
    }

    #[test]
    fn verdicts_serialize_with_a_tag() {
        let verdict = LoopVerdict::Rejected {
            reason: RejectionReason::UnsafeControlFlow,
            detail: "loop body contains break".into(),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["verdict"], "rejected");
        assert_eq!(json["reason"], "UnsafeControlFlow");
    }
}
