//! Attach comment trivia to statements by line proximity.
//!
//! Blocks are visited innermost first, so each comment lands in the
//! smallest block containing it. Within a block a comment becomes:
//! - leading of the statement whose span contains it;
//! - trailing of the previous statement when it starts on that statement's
//!   last line;
//! - leading of the next statement when the gap is within the policy's
//!   line distance;
//! - otherwise trailing of the previous statement, leading of the next, or
//!   a dangling comment of the block.

use lf_core::ast::visit::{walk_block_mut, VisitMut};
use lf_core::ast::{Block, Comment, CompilationUnit, Stmt, TypeDecl};
use lf_core::config::CommentPolicy;
use lf_core::source_map::SourceFile;

use crate::lexer;

pub(crate) struct CommentAttacher<'a> {
    pending: Vec<Option<lexer::Comment>>,
    file: &'a SourceFile,
    max_line_distance: usize,
}

impl<'a> CommentAttacher<'a> {
    pub(crate) fn new(
        comments: Vec<lexer::Comment>,
        file: &'a SourceFile,
        policy: &CommentPolicy,
    ) -> Self {
        Self {
            pending: comments.into_iter().map(Some).collect(),
            file,
            max_line_distance: policy.max_line_distance as usize,
        }
    }

    pub(crate) fn attach_unit(&mut self, unit: &mut CompilationUnit) {
        for decl in &mut unit.types {
            self.attach_type(decl);
        }
    }

    fn attach_type(&mut self, decl: &mut TypeDecl) {
        self.visit_class_body_mut(&mut decl.members);
        for constant in &mut decl.enum_constants {
            if let Some(body) = &mut constant.body {
                self.visit_class_body_mut(body);
            }
        }
    }

    /// Comments not yet claimed whose text lies within `lo..hi`.
    fn take_within(&mut self, lo: usize, hi: usize) -> Vec<lexer::Comment> {
        self.pending
            .iter_mut()
            .filter(|slot| {
                slot.as_ref()
                    .map_or(false, |c| c.span.start >= lo && c.span.end <= hi)
            })
            .filter_map(Option::take)
            .collect()
    }

    fn distribute(&mut self, block: &mut Block) {
        let comments = self.take_within(block.span.lo as usize, block.span.hi as usize);
        for comment in comments {
            self.place(block, comment);
        }
    }

    fn place(&self, block: &mut Block, raw: lexer::Comment) {
        let start = raw.span.start as u32;
        let end = raw.span.end as u32;
        let stmts = &mut block.stmts;

        if let Some(owner) = stmts
            .iter_mut()
            .find(|stmt| stmt.span.lo <= start && end <= stmt.span.hi)
        {
            owner.comments.leading.push(Comment::new(raw.text));
            return;
        }

        let prev = stmts.iter().rposition(|stmt| stmt.span.hi <= start);
        let next = stmts.iter().position(|stmt| stmt.span.lo >= end);

        if let Some(prev) = prev {
            if self.last_line(&stmts[prev]) == raw.line {
                stmts[prev].comments.trailing.push(Comment {
                    text: raw.text,
                    same_line: true,
                });
                return;
            }
        }
        if let Some(next) = next {
            let gap = self.file.line_of(stmts[next].span.lo).saturating_sub(raw.end_line);
            if gap <= self.max_line_distance {
                stmts[next].comments.leading.push(Comment::new(raw.text));
                return;
            }
        }
        match (prev, next) {
            (Some(prev), _) => stmts[prev].comments.trailing.push(Comment::new(raw.text)),
            (None, Some(next)) => stmts[next].comments.leading.push(Comment::new(raw.text)),
            (None, None) => block.dangling.push(Comment::new(raw.text)),
        }
    }

    fn last_line(&self, stmt: &Stmt) -> usize {
        self.file.line_of(stmt.span.hi.saturating_sub(1))
    }
}

impl VisitMut for CommentAttacher<'_> {
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
        self.distribute(block);
    }
}
