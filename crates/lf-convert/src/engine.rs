//! One conversion attempt: extract, check, fold and render a single loop.

use std::collections::BTreeSet;

use lf_core::ast::{Ident, Stmt};
use lf_core::config::{ConversionConfig, TerminalFamily};
use lf_core::scope::ScopeTypeResolver;
use lf_core::Result;
use serde::{Deserialize, Serialize};

use crate::builder::{Fold, OperationSequenceBuilder};
use crate::extract::extract_loop;
use crate::model::{LoopKind, LoopSite};
use crate::pipeline::{Pipeline, TerminalKind};
use crate::preconditions::{PreconditionChecker, PreconditionReport, Rejection, RejectionReason};
use crate::render::Renderer;

/// Replacement for a converted loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    pub stmts: Vec<Stmt>,
    /// Statements right before the loop that the replacement absorbs.
    pub consumed_before: usize,
    /// Statements right after the loop that the replacement absorbs.
    pub consumed_after: usize,
    pub imports: BTreeSet<String>,
    pub family: TerminalFamily,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conversion {
    Converted(Rewrite),
    Rejected(PreconditionReport),
    Disabled(TerminalFamily),
}

impl Conversion {
    pub fn is_converted(&self) -> bool {
        matches!(self, Conversion::Converted(_))
    }

    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            Conversion::Rejected(report) => report.reason(),
            _ => None,
        }
    }
}

/// Loop-to-pipeline converter. Holds nothing but its configuration, so one
/// instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct LoopConverter {
    config: ConversionConfig,
}

impl LoopConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn kind_enabled(&self, kind: LoopKind) -> bool {
        match kind {
            LoopKind::ElementForEach => true,
            LoopKind::IndexedCounter => self.config.features.indexed_loops,
            LoopKind::IteratorWhile => self.config.features.iterator_loops,
        }
    }

    /// Convert `stmt`, a loop sitting at `site`. `Err` is reserved for
    /// internal invariant violations; unsupported loops come back as
    /// [`Conversion::Rejected`].
    pub fn convert(&self, stmt: &Stmt, site: &LoopSite) -> Result<Conversion> {
        let (pipeline, consumed_before) = match self.plan(stmt, site) {
            Ok(planned) => planned,
            Err(settled) => return Ok(settled),
        };
        let rendered = Renderer::new(&self.config, &site.scope).render(&pipeline)?;
        Ok(Conversion::Converted(Rewrite {
            stmts: rendered.stmts,
            consumed_before: consumed_before + usize::from(pipeline.replaces_declaration()),
            consumed_after: pipeline.consumed_after(),
            imports: rendered.imports,
            family: pipeline.terminal.family(),
        }))
    }

    /// Convert consecutive loops that each add to the same fresh collection
    /// into one `Stream.concat` collected into it. `None` unless every loop
    /// folds into a collect on that target and the first one replaces its
    /// declaration.
    pub fn convert_concat(&self, loops: &[(&Stmt, LoopSite)]) -> Result<Option<Rewrite>> {
        let Some((_, first_site)) = loops.first() else {
            return Ok(None);
        };
        if loops.len() < 2 {
            return Ok(None);
        }
        let mut pipelines: Vec<Pipeline> = Vec::with_capacity(loops.len());
        for (idx, (stmt, site)) in loops.iter().enumerate() {
            let Ok((pipeline, 0)) = self.plan(stmt, site) else {
                return Ok(None);
            };
            let TerminalKind::Collect {
                target,
                replaces_decl,
                ..
            } = &pipeline.terminal.kind
            else {
                return Ok(None);
            };
            if (idx == 0) != replaces_decl.is_some() {
                return Ok(None);
            }
            if let Some(first) = pipelines.first() {
                if collect_target(first) != Some(target) {
                    return Ok(None);
                }
            }
            pipelines.push(pipeline);
        }
        lf_core::debug!("{} consecutive loops concatenated", pipelines.len());
        let rendered = Renderer::new(&self.config, &first_site.scope).render_concat(&pipelines)?;
        Ok(Some(Rewrite {
            stmts: rendered.stmts,
            consumed_before: 1,
            consumed_after: 0,
            imports: rendered.imports,
            family: TerminalFamily::Collect,
        }))
    }

    /// Fold `stmt` into a pipeline, with the number of statements before the
    /// loop that belong to it. `Err` carries the settled non-conversion.
    fn plan(&self, stmt: &Stmt, site: &LoopSite) -> std::result::Result<(Pipeline, usize), Conversion> {
        let resolver = ScopeTypeResolver::new(&site.scope);
        let model = extract_loop(stmt, site, &resolver).map_err(reject)?;
        if !self.kind_enabled(model.kind) {
            lf_core::debug!("{} loops are switched off", model.kind);
            return Err(reject(Rejection::new(
                RejectionReason::UnsupportedLoopShape,
                format!("{} loops are disabled", model.kind),
            )));
        }

        let report = PreconditionChecker::new(&resolver).check(&model);
        if !report.eligible {
            return Err(rejected(report));
        }

        match OperationSequenceBuilder::new(&self.config, &resolver).build(&model) {
            Fold::Pipeline(pipeline) => Ok((pipeline, model.consumed_before)),
            Fold::Rejected(rejection) => Err(reject(rejection)),
            Fold::Disabled(family) => {
                lf_core::debug!("{} terminal is disabled", family.as_str());
                Err(Conversion::Disabled(family))
            }
        }
    }
}

fn collect_target(pipeline: &Pipeline) -> Option<&Ident> {
    match &pipeline.terminal.kind {
        TerminalKind::Collect { target, .. } => Some(target),
        _ => None,
    }
}

fn reject(rejection: Rejection) -> Conversion {
    rejected(PreconditionReport::rejected(rejection))
}

fn rejected(report: PreconditionReport) -> Conversion {
    if let Some(rejection) = &report.rejection {
        lf_core::debug!(reason = %rejection.reason, "loop left unchanged: {}", rejection.detail);
    }
    Conversion::Rejected(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn converter_is_shareable() {
        assert_send_sync::<LoopConverter>();
    }
}
