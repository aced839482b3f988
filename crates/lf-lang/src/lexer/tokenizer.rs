use super::winnow::{
    char_literal, identifier, number_literal, string_literal, symbol, text_block,
    trivia, Trivia,
};
use lf_core::source_map::SourceFile;
use thiserror::Error;
use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Abstract,
    Assert,
    Boolean,
    Break,
    Byte,
    Case,
    Catch,
    Char,
    Class,
    Const,
    Continue,
    Default,
    Do,
    Double,
    Else,
    Enum,
    Extends,
    Final,
    Finally,
    Float,
    For,
    Goto,
    If,
    Implements,
    Import,
    InstanceOf,
    Int,
    Interface,
    Long,
    Native,
    New,
    Package,
    Private,
    Protected,
    Public,
    Return,
    Short,
    Static,
    Strictfp,
    Super,
    Switch,
    Synchronized,
    This,
    Throw,
    Throws,
    Transient,
    Try,
    Void,
    Volatile,
    While,
    True,
    False,
    Null,
}

impl Keyword {
    fn from_lexeme(lexeme: &str) -> Option<Self> {
        match lexeme {
            "abstract" => Some(Self::Abstract),
            "assert" => Some(Self::Assert),
            "boolean" => Some(Self::Boolean),
            "break" => Some(Self::Break),
            "byte" => Some(Self::Byte),
            "case" => Some(Self::Case),
            "catch" => Some(Self::Catch),
            "char" => Some(Self::Char),
            "class" => Some(Self::Class),
            "const" => Some(Self::Const),
            "continue" => Some(Self::Continue),
            "default" => Some(Self::Default),
            "do" => Some(Self::Do),
            "double" => Some(Self::Double),
            "else" => Some(Self::Else),
            "enum" => Some(Self::Enum),
            "extends" => Some(Self::Extends),
            "final" => Some(Self::Final),
            "finally" => Some(Self::Finally),
            "float" => Some(Self::Float),
            "for" => Some(Self::For),
            "goto" => Some(Self::Goto),
            "if" => Some(Self::If),
            "implements" => Some(Self::Implements),
            "import" => Some(Self::Import),
            "instanceof" => Some(Self::InstanceOf),
            "int" => Some(Self::Int),
            "interface" => Some(Self::Interface),
            "long" => Some(Self::Long),
            "native" => Some(Self::Native),
            "new" => Some(Self::New),
            "package" => Some(Self::Package),
            "private" => Some(Self::Private),
            "protected" => Some(Self::Protected),
            "public" => Some(Self::Public),
            "return" => Some(Self::Return),
            "short" => Some(Self::Short),
            "static" => Some(Self::Static),
            "strictfp" => Some(Self::Strictfp),
            "super" => Some(Self::Super),
            "switch" => Some(Self::Switch),
            "synchronized" => Some(Self::Synchronized),
            "this" => Some(Self::This),
            "throw" => Some(Self::Throw),
            "throws" => Some(Self::Throws),
            "transient" => Some(Self::Transient),
            "try" => Some(Self::Try),
            "void" => Some(Self::Void),
            "volatile" => Some(Self::Volatile),
            "while" => Some(Self::While),
            "true" => Some(Self::True),
            "false" => Some(Self::False),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    pub fn is_primitive_type(&self) -> bool {
        matches!(
            self,
            Self::Boolean
                | Self::Byte
                | Self::Short
                | Self::Char
                | Self::Int
                | Self::Long
                | Self::Float
                | Self::Double
        )
    }

    /// Keywords that may appear in a modifier list.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Public
                | Self::Protected
                | Self::Private
                | Self::Static
                | Self::Final
                | Self::Abstract
                | Self::Native
                | Self::Synchronized
                | Self::Transient
                | Self::Volatile
                | Self::Strictfp
                | Self::Default
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    StringLiteral,
    TextBlock,
    CharLiteral,
    Symbol,
    Keyword(Keyword),
}

/// A comment kept as trivia, with 1-based lines of its first and last
/// character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub line: usize,
    pub end_line: usize,
    pub span: Span,
}

#[derive(Debug, Error)]
pub enum LexerError {
    #[error("unexpected character '{ch}' at byte {offset}")]
    Unexpected { ch: char, offset: usize },
    #[error("unterminated literal or comment at byte {offset}")]
    Unterminated { offset: usize },
}

impl LexerError {
    pub fn offset(&self) -> usize {
        match self {
            LexerError::Unexpected { offset, .. } | LexerError::Unterminated { offset } => *offset,
        }
    }

    fn at(source: &str, offset: usize, err: ErrMode<ContextError>) -> Self {
        match err {
            ErrMode::Cut(_) | ErrMode::Incomplete(_) => LexerError::Unterminated { offset },
            ErrMode::Backtrack(_) => LexerError::Unexpected {
                ch: source[offset..].chars().next().unwrap_or('\0'),
                offset,
            },
        }
    }
}

pub fn lex(source: &str) -> Result<Vec<Token>, LexerError> {
    lex_with_trivia(source).map(|(tokens, _)| tokens)
}

/// Tokens plus the comments between them, both in source order.
pub fn lex_with_trivia(source: &str) -> Result<(Vec<Token>, Vec<Comment>), LexerError> {
    let lines = SourceFile::anonymous(source);
    let mut input = source;
    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    loop {
        let start = source.len() - input.len();
        match opt(trivia).parse_next(&mut input) {
            Ok(Some(Trivia::Space)) => continue,
            Ok(Some(Trivia::Comment(text))) => {
                let end = start + text.len();
                comments.push(Comment {
                    text: text.to_string(),
                    line: lines.line_of(start as u32),
                    end_line: lines.line_of(end.saturating_sub(1) as u32),
                    span: Span { start, end },
                });
                continue;
            }
            Ok(None) => {}
            Err(err) => return Err(LexerError::at(source, start, err)),
        }
        if input.is_empty() {
            break;
        }
        let (kind, lexeme) = token_parser()
            .parse_next(&mut input)
            .map_err(|err| LexerError::at(source, start, err))?;
        let kind = match kind {
            TokenKind::Ident => Keyword::from_lexeme(lexeme)
                .map(TokenKind::Keyword)
                .unwrap_or(TokenKind::Ident),
            other => other,
        };
        tokens.push(Token {
            kind,
            lexeme: lexeme.to_string(),
            span: Span {
                start,
                end: start + lexeme.len(),
            },
        });
    }
    Ok((tokens, comments))
}

fn token_parser<'a>() -> impl Parser<&'a str, (TokenKind, &'a str), ErrMode<ContextError>> {
    alt((
        text_block.map(|text| (TokenKind::TextBlock, text)),
        string_literal.map(|text| (TokenKind::StringLiteral, text)),
        char_literal.map(|text| (TokenKind::CharLiteral, text)),
        number_literal.map(|text| (TokenKind::Number, text)),
        identifier.map(|text| (TokenKind::Ident, text)),
        symbol.map(|text| (TokenKind::Symbol, text)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(src: &str) -> Vec<String> {
        lex(src)
            .unwrap_or_else(|e| panic!("lex failed for `{src}`: {e}"))
            .into_iter()
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn closing_generics_stay_single() {
        assert_eq!(
            lexemes("Map<String, List<Integer>> m;"),
            vec!["Map", "<", "String", ",", "List", "<", "Integer", ">", ">", "m", ";"]
        );
    }

    #[test]
    fn literals_and_keywords() {
        let tokens = lex("long x = 0x1FL + 1.5e3 + 'a' + \"s\\\"\";").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Long));
        assert_eq!(tokens[3].lexeme, "0x1FL");
        assert_eq!(tokens[5].lexeme, "1.5e3");
        assert_eq!(tokens[7].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[9].lexeme, "\"s\\\"\"");
    }

    #[test]
    fn comments_are_trivia_with_lines() {
        let (tokens, comments) = lex_with_trivia("a(); // one\n/* two\n three */ b();").unwrap();
        assert_eq!(tokens.len(), 8);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "// one");
        assert_eq!((comments[0].line, comments[0].end_line), (1, 1));
        assert_eq!((comments[1].line, comments[1].end_line), (2, 3));
    }

    #[test]
    fn unterminated_string_reports_offset() {
        let err = lex("x = \"abc").unwrap_err();
        assert_eq!(err.offset(), 4);
    }
}
