use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use num_bigint::BigInt;

use crate::{Error, parse::SyntaxError, value::Number};

#[derive(Error, Debug, Diagnostic)]
pub enum LexError {
    #[error("Unexpected character '{token}' at line {line}, column {column}")]
    #[diagnostic(
        code(lex::unexpected_character),
        help("remove or correct the character: `{token}`")
    )]
    UnexpectedCharacter {
        #[source_code]
        src: NamedSource<String>,
        #[label("this character")]
        bad_bit: SourceSpan,
        token: char,
        line: usize,
        column: usize,
    },

    #[error("Invalid number literal `{literal}` at line {line}, column {column}: {reason}")]
    #[diagnostic(code(lex::invalid_number))]
    InvalidNumber {
        #[source_code]
        src: NamedSource<String>,
        #[label("this numeric literal")]
        bad_bit: SourceSpan,
        literal: String,
        reason: String,
        line: usize,
        column: usize,
    },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { line, .. } | LexError::InvalidNumber { line, .. } => {
                *line
            }
        }
    }

    pub fn column(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { column, .. }
            | LexError::InvalidNumber { column, .. } => *column,
        }
    }
}

/// Where a token starts: byte offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Position {
    pub fn span(self, len: usize) -> SourceSpan {
        SourceSpan::from(self.offset..self.offset + len)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(Number),
    Ident,
    Let,
    Print,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    LeftParen,
    RightParen,
    Semicolon,
    Eof,
}

/// The literal value a token carries, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue<'de> {
    Number(Number),
    Text(&'de str),
}

impl Display for TokenValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenValue::Number(n) => write!(f, "{n}"),
            TokenValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl<'de> Token<'de> {
    fn new(kind: TokenKind, literal: &'de str, at: Position) -> Self {
        Token {
            kind,
            literal,
            line: at.line,
            column: at.column,
            offset: at.offset,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    pub fn value(&self) -> Option<TokenValue<'de>> {
        match &self.kind {
            TokenKind::Number(n) => Some(TokenValue::Number(n.clone())),
            TokenKind::Ident | TokenKind::Let | TokenKind::Print => {
                Some(TokenValue::Text(self.literal))
            }
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Number(_) => "NUMBER",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::Let => "LET",
            TokenKind::Print => "PRINT",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Assign => "ASSIGN",
            TokenKind::LeftParen => "LPAREN",
            TokenKind::RightParen => "RPAREN",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Eof => "END_OF_INPUT",
        };
        f.write_str(name)
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = &self.kind;
        let lit = self.literal;
        match self.value() {
            Some(value) => write!(f, "{kind} {lit} {value}"),
            None => write!(f, "{kind} {lit} null"),
        }
    }
}

pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    rest: &'de str,
    byte: usize,
    line: usize,
    column: usize,
    peeked: Option<Token<'de>>,
    finished: bool,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            rest: input,
            byte: 0,
            line: 1,
            column: 1,
            peeked: None,
            finished: false,
        }
    }

    /// Rewinds to the start of the input.
    pub fn restart(&mut self) {
        *self = Lexer::new(self.filename, self.whole);
    }

    pub(crate) fn source(&self) -> NamedSource<String> {
        NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string())
    }

    fn here(&self) -> Position {
        Position {
            offset: self.byte,
            line: self.line,
            column: self.column,
        }
    }

    /// Skips `len` bytes that are known not to contain a newline.
    fn consume(&mut self, len: usize) {
        let (skipped, rest) = self.rest.split_at(len);
        self.column += skipped.chars().count();
        self.byte += len;
        self.rest = rest;
    }

    pub fn expect(&mut self, expected: TokenKind) -> Result<Token<'de>, Error> {
        let token = self.next_token()?;
        if token.kind == expected {
            Ok(token)
        } else {
            Err(SyntaxError::mismatch(self, &token, expected).into())
        }
    }

    pub fn peek(&mut self) -> Result<Token<'de>, LexError> {
        if let Some(token) = &self.peeked {
            return Ok(token.clone());
        }
        let token = self.next_token()?;
        self.peeked = Some(token.clone());
        Ok(token)
    }

    /// Returns the next token. Once the input is exhausted every call
    /// returns an END_OF_INPUT token.
    pub fn next_token(&mut self) -> Result<Token<'de>, LexError> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        loop {
            let start = self.here();
            let cur = self.rest;
            let mut chars = cur.chars();
            let Some(c) = chars.next() else {
                return Ok(Token::new(TokenKind::Eof, "", start));
            };
            self.rest = chars.as_str();
            self.byte += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }

            let literal = &cur[..c.len_utf8()];

            enum Start {
                Slash,
                Ident,
                Number,
            }

            let process = |kind: TokenKind| Ok(Token::new(kind, literal, start));

            let started = match c {
                '(' => return process(TokenKind::LeftParen),
                ')' => return process(TokenKind::RightParen),
                '-' => return process(TokenKind::Minus),
                '+' => return process(TokenKind::Plus),
                ';' => return process(TokenKind::Semicolon),
                '*' => return process(TokenKind::Star),
                '=' => return process(TokenKind::Assign),
                '/' => Start::Slash,
                'a'..='z' | 'A'..='Z' | '_' => Start::Ident,
                '0'..='9' => Start::Number,
                ' ' | '\r' | '\t' | '\n' => continue,
                c => {
                    return Err(LexError::UnexpectedCharacter {
                        src: self.source(),
                        bad_bit: start.span(c.len_utf8()),
                        token: c,
                        line: start.line,
                        column: start.column,
                    });
                }
            };

            match started {
                Start::Slash => {
                    if self.rest.starts_with('/') {
                        let new_line = self.rest.find('\n').unwrap_or(self.rest.len());
                        self.consume(new_line);
                        continue;
                    }
                    return process(TokenKind::Slash);
                }
                Start::Ident => {
                    let first_non_ident = cur
                        .find(|c| !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_'))
                        .unwrap_or(cur.len());

                    let literal = &cur[..first_non_ident];
                    self.consume(literal.len() - c.len_utf8());

                    let kind = match literal {
                        "let" => TokenKind::Let,
                        "print" => TokenKind::Print,
                        _ => TokenKind::Ident,
                    };

                    return Ok(Token::new(kind, literal, start));
                }
                Start::Number => {
                    let digits =
                        |s: &str| s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());

                    // one optional fractional part; a second `.` is left for the next call
                    let mut end = digits(cur);
                    let dotted = cur[end..].starts_with('.');
                    if dotted {
                        end += 1 + digits(&cur[end + 1..]);
                    }

                    let literal = &cur[..end];
                    self.consume(literal.len() - c.len_utf8());

                    let n = if dotted {
                        literal.parse().map(Number::Float).map_err(|e| e.to_string())
                    } else {
                        literal
                            .parse::<BigInt>()
                            .map(Number::Int)
                            .map_err(|e| e.to_string())
                    };

                    return match n {
                        Ok(n) => Ok(Token::new(TokenKind::Number(n), literal, start)),
                        Err(reason) => Err(LexError::InvalidNumber {
                            src: self.source(),
                            bad_bit: start.span(literal.len()),
                            literal: literal.to_string(),
                            reason,
                            line: start.line,
                            column: start.column,
                        }),
                    };
                }
            }
        }
    }
}

/// Yields every token up to and including a single END_OF_INPUT.
impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if matches!(token, Ok(Token { kind: TokenKind::Eof, .. })) {
            self.finished = true;
        }
        Some(token)
    }
}
