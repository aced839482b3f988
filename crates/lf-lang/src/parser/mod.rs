//! Recursive-descent Java parser over the token slice.

mod comments;
mod expr;
mod items;
mod stmt;
mod types;
mod winnow;

use lf_core::ast::visit::VisitMut;
use lf_core::ast::{Block, CompilationUnit, Expr, Stmt};
use lf_core::config::CommentPolicy;
use lf_core::source_map::SourceFile;
use lf_core::span::Span;
use thiserror::Error;
use ::winnow::ModalResult;

use crate::lexer::{lex, lex_with_trivia, LexerError, Token};
use comments::CommentAttacher;

#[derive(Debug, Error)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    fn unexpected(token: Option<&Token>, source_len: usize) -> Self {
        match token {
            Some(token) => ParseError {
                message: format!("unexpected token '{}'", token.lexeme),
                offset: token.span.start,
            },
            None => ParseError {
                message: "unexpected end of input".to_string(),
                offset: source_len,
            },
        }
    }
}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        ParseError {
            offset: err.offset(),
            message: err.to_string(),
        }
    }
}

impl From<ParseError> for lf_core::Error {
    fn from(err: ParseError) -> Self {
        let offset = err.offset as u32;
        lf_core::Error::syntax(Span::new(0, offset, offset), err.message)
    }
}

/// Run `parser` over all of `tokens`; leftover tokens are an error.
fn parse_all<T>(
    tokens: &[Token],
    source_len: usize,
    parser: impl FnOnce(&mut &[Token]) -> ModalResult<T>,
) -> Result<T, ParseError> {
    let mut input = tokens;
    match parser(&mut input) {
        Ok(value) if input.is_empty() => Ok(value),
        Ok(_) => Err(ParseError {
            message: format!("unexpected trailing token '{}'", input[0].lexeme),
            offset: input[0].span.start,
        }),
        Err(_) => Err(ParseError::unexpected(input.first(), source_len)),
    }
}

/// Parser entry point carrying the comment attachment policy.
#[derive(Debug, Clone, Default)]
pub struct JavaParser {
    policy: CommentPolicy,
}

impl JavaParser {
    pub fn new(policy: CommentPolicy) -> Self {
        Self { policy }
    }

    pub fn parse_compilation_unit(&self, file: &SourceFile) -> lf_core::Result<CompilationUnit> {
        let source: &str = &file.source;
        let (tokens, comments) = lex_with_trivia(source).map_err(ParseError::from)?;
        let mut unit = parse_all(&tokens, source.len(), items::parse_compilation_unit)?;
        if self.policy.preserve {
            CommentAttacher::new(comments, file, &self.policy).attach_unit(&mut unit);
        }
        lf_core::debug!(
            "parsed {} with {} tokens, {} type(s)",
            file.path.display(),
            tokens.len(),
            unit.types.len()
        );
        Ok(unit)
    }

    pub fn parse_statement(&self, source: &str) -> Result<Stmt, ParseError> {
        let (tokens, comments) = lex_with_trivia(source)?;
        let stmt = parse_all(&tokens, source.len(), stmt::parse_statement)?;
        let mut holder = Block {
            stmts: vec![stmt],
            span: Span::new(0, 0, source.len() as u32),
            dangling: Vec::new(),
        };
        self.attach(source, comments, &mut holder);
        Ok(holder.stmts.remove(0))
    }

    pub fn parse_block(&self, source: &str) -> Result<Block, ParseError> {
        let (tokens, comments) = lex_with_trivia(source)?;
        let mut block = parse_all(&tokens, source.len(), stmt::parse_block)?;
        self.attach(source, comments, &mut block);
        Ok(block)
    }

    fn attach(&self, source: &str, comments: Vec<crate::lexer::Comment>, block: &mut Block) {
        if self.policy.preserve {
            let file = SourceFile::anonymous(source);
            CommentAttacher::new(comments, &file, &self.policy).visit_block_mut(block);
        }
    }
}

pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let tokens = lex(source)?;
    parse_all(&tokens, source.len(), expr::parse_expr)
}

pub fn parse_statement(source: &str) -> Result<Stmt, ParseError> {
    JavaParser::default().parse_statement(source)
}

pub fn parse_block(source: &str) -> Result<Block, ParseError> {
    JavaParser::default().parse_block(source)
}
