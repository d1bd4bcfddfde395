pub mod error;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod timeline;
pub mod value;

pub use error::{Error, ErrorKind};
pub use eval::{Interpreter, Outcome, RuntimeError, Store};
pub use lex::{Lexer, Token, TokenKind};
pub use parse::{Expr, Op, Parser, Program, Statement};
pub use value::Number;

/// Lexes the whole input. The last token is always END_OF_INPUT.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, Error> {
    Ok(Lexer::new(None, input).collect::<Result<_, _>>()?)
}

pub fn parse(input: &str) -> Result<Program<'_>, Error> {
    Parser::new(None, input).parse()
}

/// Parses and runs `input` on a fresh interpreter.
pub fn run(input: &str) -> Result<Outcome, Error> {
    run_with(&mut Interpreter::new(), input)
}

/// Parses all of `input` before executing any of it, so a syntax error
/// leaves `interpreter` untouched.
pub fn run_with(interpreter: &mut Interpreter, input: &str) -> Result<Outcome, Error> {
    let program = parse(input)?;
    Ok(interpreter.run(&program)?)
}
