//! Lexer utilities and tokenization for Java sources.

pub mod tokenizer;
pub mod winnow;

pub use tokenizer::{lex, lex_with_trivia, Comment, Keyword, LexerError, Span, Token, TokenKind};
