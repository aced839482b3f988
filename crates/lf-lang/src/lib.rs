//! Java front end: a winnow lexer and a recursive-descent parser producing
//! `lf_core::ast` trees with comments attached to statements.

pub mod lexer;
pub mod parser;

pub use parser::{parse_block, parse_expression, parse_statement, JavaParser, ParseError};
