use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;
use tracing::debug;

use crate::{
    Error, Lexer,
    lex::{Position, Token, TokenKind},
    value::Number,
};

/// Deepest expression tree, and deepest parenthesis nesting, the parser
/// accepts.
pub const MAX_DEPTH: usize = 256;

#[derive(Error, Debug, Diagnostic)]
pub enum SyntaxError {
    #[error("Expected {expected}, found {found} at line {line}, column {column}")]
    #[diagnostic(code(parse::mismatch), help("use `{expected}` here instead"))]
    Mismatch {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        bad_bit: SourceSpan,
        expected: String,
        found: TokenKind,
        line: usize,
        column: usize,
    },

    #[error("Unexpected token {found} at line {line}, column {column}")]
    #[diagnostic(code(parse::unexpected_token), help("expected {expected}"))]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("this token")]
        bad_bit: SourceSpan,
        expected: String,
        found: TokenKind,
        line: usize,
        column: usize,
    },

    #[error("Unexpected end of input at line {line}, column {column}: expected {expected}")]
    #[diagnostic(
        code(parse::unexpected_eof),
        help("The input ended unexpectedly, possibly due to a missing `;` or `)`.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("input ends here")]
        bad_bit: SourceSpan,
        expected: String,
        line: usize,
        column: usize,
    },

    #[error("Expression nested too deeply at line {line}, column {column}: the limit is {limit} levels")]
    #[diagnostic(
        code(parse::too_deep),
        help("split the expression across several `let` statements")
    )]
    TooDeep {
        #[source_code]
        src: NamedSource<String>,
        #[label("the limit is exceeded here")]
        bad_bit: SourceSpan,
        limit: usize,
        line: usize,
        column: usize,
    },
}

impl SyntaxError {
    pub(crate) fn mismatch(lexer: &Lexer<'_>, found: &Token<'_>, expected: TokenKind) -> Self {
        if found.kind == TokenKind::Eof {
            return Self::eof(lexer, found, expected.to_string());
        }
        SyntaxError::Mismatch {
            src: lexer.source(),
            bad_bit: found.position().span(found.literal.len()),
            expected: expected.to_string(),
            found: found.kind.clone(),
            line: found.line,
            column: found.column,
        }
    }

    fn unexpected(lexer: &Lexer<'_>, found: &Token<'_>, expected: &str) -> Self {
        if found.kind == TokenKind::Eof {
            return Self::eof(lexer, found, expected.to_string());
        }
        SyntaxError::UnexpectedToken {
            src: lexer.source(),
            bad_bit: found.position().span(found.literal.len()),
            expected: expected.to_string(),
            found: found.kind.clone(),
            line: found.line,
            column: found.column,
        }
    }

    fn eof(lexer: &Lexer<'_>, found: &Token<'_>, expected: String) -> Self {
        SyntaxError::UnexpectedEof {
            src: lexer.source(),
            bad_bit: SourceSpan::from(found.offset.saturating_sub(1)..found.offset),
            expected,
            line: found.line,
            column: found.column,
        }
    }

    fn too_deep(lexer: &Lexer<'_>, at: &Token<'_>) -> Self {
        SyntaxError::TooDeep {
            src: lexer.source(),
            bad_bit: at.position().span(at.literal.len()),
            limit: MAX_DEPTH,
            line: at.line,
            column: at.column,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            SyntaxError::Mismatch { line, .. }
            | SyntaxError::UnexpectedToken { line, .. }
            | SyntaxError::UnexpectedEof { line, .. }
            | SyntaxError::TooDeep { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            SyntaxError::Mismatch { column, .. }
            | SyntaxError::UnexpectedToken { column, .. }
            | SyntaxError::UnexpectedEof { column, .. }
            | SyntaxError::TooDeep { column, .. } => *column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
        })
    }
}

/// Expression nodes. Source positions are kept so runtime errors can point
/// back at the variable or operator involved.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'de> {
    Number(Number),
    Variable {
        name: &'de str,
        at: Position,
    },
    BinaryOp {
        lhs: Box<Expr<'de>>,
        op: Op,
        rhs: Box<Expr<'de>>,
        at: Position,
    },
}

impl Expr<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Expr::Number(_) => "Number",
            Expr::Variable { .. } => "Variable",
            Expr::BinaryOp { .. } => "BinaryOp",
        }
    }

    /// Height of the tree; a number or a variable alone has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Variable { .. } => 1,
            Expr::BinaryOp { lhs, rhs, .. } => 1 + lhs.depth().max(rhs.depth()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'de> {
    Assign { name: &'de str, value: Expr<'de> },
    Print(Expr<'de>),
}

impl Statement<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Statement::Assign { .. } => "Assign",
            Statement::Print(_) => "Print",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program<'de> {
    pub statements: Vec<Statement<'de>>,
}

impl Display for Expr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Variable { name, .. } => write!(f, "{name}"),
            Expr::BinaryOp { lhs, op, rhs, .. } => write!(f, "({lhs} {op} {rhs})"),
        }
    }
}

impl Display for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Assign { name, value } => write!(f, "let {name} = {value};"),
            Statement::Print(expr) => write!(f, "print({expr});"),
        }
    }
}

impl Display for Program<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }
        Ok(())
    }
}

/// Recursive-descent parser, one method per production:
///
/// ```text
/// program    := statement* END_OF_INPUT
/// statement  := assignment | print_stmt
/// assignment := LET IDENTIFIER ASSIGN expr SEMICOLON
/// print_stmt := PRINT LPAREN expr RPAREN SEMICOLON
/// expr       := term ((PLUS | MINUS) term)*
/// term       := factor ((STAR | SLASH) factor)*
/// factor     := NUMBER | IDENTIFIER | LPAREN expr RPAREN
/// ```
///
/// Expression trees deeper than [`MAX_DEPTH`], and parentheses nested deeper
/// than that, are rejected with [`SyntaxError::TooDeep`].
pub struct Parser<'de> {
    lexer: Lexer<'de>,
    nesting: usize,
    failed: bool,
}

impl<'de> Parser<'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str) -> Self {
        Parser {
            lexer: Lexer::new(filename, whole),
            nesting: 0,
            failed: false,
        }
    }

    pub fn parse(mut self) -> Result<Program<'de>, Error> {
        let mut statements = Vec::new();
        while self.lexer.peek()?.kind != TokenKind::Eof {
            statements.push(self.parse_statement()?);
        }
        self.lexer.expect(TokenKind::Eof)?;
        debug!(statements = statements.len(), "parsed program");
        Ok(Program { statements })
    }

    pub fn parse_statement(&mut self) -> Result<Statement<'de>, Error> {
        let token = self.lexer.peek()?;
        match token.kind {
            TokenKind::Let => self.parse_assignment(),
            TokenKind::Print => self.parse_print(),
            _ => Err(SyntaxError::unexpected(&self.lexer, &token, "`let` or `print`").into()),
        }
    }

    fn parse_assignment(&mut self) -> Result<Statement<'de>, Error> {
        self.lexer.expect(TokenKind::Let)?;
        let name = self.lexer.expect(TokenKind::Ident)?.literal;
        self.lexer.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.lexer.expect(TokenKind::Semicolon)?;
        Ok(Statement::Assign { name, value })
    }

    fn parse_print(&mut self) -> Result<Statement<'de>, Error> {
        self.lexer.expect(TokenKind::Print)?;
        self.lexer.expect(TokenKind::LeftParen)?;
        let expr = self.parse_expr()?;
        self.lexer.expect(TokenKind::RightParen)?;
        self.lexer.expect(TokenKind::Semicolon)?;
        Ok(Statement::Print(expr))
    }

    pub fn parse_expr(&mut self) -> Result<Expr<'de>, Error> {
        let mut lhs = self.parse_term()?;
        loop {
            let token = self.lexer.peek()?;
            let op = match token.kind {
                TokenKind::Plus => Op::Plus,
                TokenKind::Minus => Op::Minus,
                _ => return Ok(lhs),
            };
            self.lexer.next_token()?;
            let rhs = self.parse_term()?;
            lhs = self.binary(lhs, op, rhs, &token)?;
        }
    }

    fn parse_term(&mut self) -> Result<Expr<'de>, Error> {
        let mut lhs = self.parse_factor()?;
        loop {
            let token = self.lexer.peek()?;
            let op = match token.kind {
                TokenKind::Star => Op::Star,
                TokenKind::Slash => Op::Slash,
                _ => return Ok(lhs),
            };
            self.lexer.next_token()?;
            let rhs = self.parse_factor()?;
            lhs = self.binary(lhs, op, rhs, &token)?;
        }
    }

    fn parse_factor(&mut self) -> Result<Expr<'de>, Error> {
        let token = self.lexer.next_token()?;
        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n.clone())),
            TokenKind::Ident => Ok(Expr::Variable {
                name: token.literal,
                at: token.position(),
            }),
            TokenKind::LeftParen => {
                if self.nesting == MAX_DEPTH {
                    return Err(SyntaxError::too_deep(&self.lexer, &token).into());
                }
                self.nesting += 1;
                let expr = self.parse_expr();
                self.nesting -= 1;
                let expr = expr?;
                self.lexer.expect(TokenKind::RightParen)?;
                Ok(expr)
            }
            _ => Err(SyntaxError::unexpected(
                &self.lexer,
                &token,
                "a number, an identifier or `(`",
            )
            .into()),
        }
    }

    fn binary(
        &self,
        lhs: Expr<'de>,
        op: Op,
        rhs: Expr<'de>,
        at: &Token<'de>,
    ) -> Result<Expr<'de>, Error> {
        if 1 + lhs.depth().max(rhs.depth()) > MAX_DEPTH {
            return Err(SyntaxError::too_deep(&self.lexer, at).into());
        }
        Ok(Expr::BinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
            at: at.position(),
        })
    }
}

/// Streams statements one at a time; stops after END_OF_INPUT or the first
/// error.
impl<'de> Iterator for Parser<'de> {
    type Item = Result<Statement<'de>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let statement = match self.lexer.peek() {
            Ok(token) if token.kind == TokenKind::Eof => return None,
            Ok(_) => self.parse_statement(),
            Err(e) => Err(e.into()),
        };
        self.failed = statement.is_err();
        Some(statement)
    }
}
