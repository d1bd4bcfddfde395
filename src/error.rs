use std::fmt::Display;

use miette::Diagnostic;

use crate::{eval::RuntimeError, lex::LexError, parse::SyntaxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Runtime,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::Lexical => "Lexical",
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Runtime => "Runtime",
        })
    }
}

/// Any failure of the pipeline. Each stage stops at its first error.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lexical(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Lexical(_) => ErrorKind::Lexical,
            Error::Syntax(_) => ErrorKind::Syntax,
            Error::Runtime(_) => ErrorKind::Runtime,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Error::Lexical(e) => e.line(),
            Error::Syntax(e) => e.line(),
            Error::Runtime(e) => e.line(),
        }
    }

    pub fn column(&self) -> usize {
        match self {
            Error::Lexical(e) => e.column(),
            Error::Syntax(e) => e.column(),
            Error::Runtime(e) => e.column(),
        }
    }
}
