use std::collections::HashMap;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    lex::Position,
    parse::{Expr, Op, Program, Statement},
    value::Number,
};

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}' at line {line}, column {column}")]
    #[diagnostic(
        code(eval::undefined_variable),
        help("assign `{name}` with `let {name} = ...;` before using it")
    )]
    UndefinedVariable {
        name: String,
        #[label("not defined")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },

    #[error("Division by zero at line {line}, column {column}")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero {
        #[label("the right-hand side is zero")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },
}

impl RuntimeError {
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::DivisionByZero { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            RuntimeError::UndefinedVariable { column, .. }
            | RuntimeError::DivisionByZero { column, .. } => *column,
        }
    }
}

/// Flat variable namespace. Lookups go through the map, iteration follows
/// the order in which names were first assigned.
#[derive(Debug, Clone, Default)]
pub struct Store {
    values: HashMap<String, Number>,
    order: Vec<String>,
}

impl Store {
    pub fn get(&self, name: &str) -> Option<Number> {
        self.values.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn define(&mut self, name: &str, value: Number) {
        if self.values.insert(name.to_string(), value).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Number)> {
        self.order
            .iter()
            .filter_map(|name| Some((name.as_str(), self.get(name)?)))
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

/// What a successful run leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub output: Vec<String>,
    pub variables: Store,
}

#[derive(Debug, Default)]
pub struct Interpreter {
    store: Store,
    output: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes every statement in order and stops at the first failure.
    /// Output and assignments made before a failure stay on the interpreter.
    pub fn run(&mut self, program: &Program<'_>) -> Result<Outcome, RuntimeError> {
        let first_line = self.output.len();
        for statement in &program.statements {
            if let Err(e) = self.execute(statement) {
                warn!(error = %e, "execution aborted");
                return Err(e);
            }
        }
        Ok(Outcome {
            output: self.output[first_line..].to_vec(),
            variables: self.snapshot(),
        })
    }

    /// Executes a single statement and returns the store as it stands
    /// afterwards.
    pub fn step(&mut self, statement: &Statement<'_>) -> Result<Store, RuntimeError> {
        self.execute(statement)?;
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> Store {
        self.store.clone()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Drains the printed lines accumulated so far.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    fn execute(&mut self, statement: &Statement<'_>) -> Result<(), RuntimeError> {
        trace!(%statement, "executing");
        match statement {
            Statement::Assign { name, value } => {
                let value = self.evaluate(value)?;
                debug!(name, %value, "assigned");
                self.store.define(name, value);
            }
            Statement::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.output.push(value.to_string());
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, expr: &Expr<'_>) -> Result<Number, RuntimeError> {
        match expr {
            Expr::Number(n) => Ok(n.clone()),
            Expr::Variable { name, at } => {
                self.store
                    .get(name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable {
                        name: name.to_string(),
                        span: at.span(name.len()),
                        line: at.line,
                        column: at.column,
                    })
            }
            Expr::BinaryOp { lhs, op, rhs, at } => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                apply(*op, &lhs, &rhs, *at)
            }
        }
    }
}

fn apply(op: Op, lhs: &Number, rhs: &Number, at: Position) -> Result<Number, RuntimeError> {
    Ok(match op {
        Op::Plus => lhs + rhs,
        Op::Minus => lhs - rhs,
        Op::Star => lhs * rhs,
        Op::Slash => {
            if rhs.is_zero() {
                return Err(RuntimeError::DivisionByZero {
                    span: at.span(1),
                    line: at.line,
                    column: at.column,
                });
            }
            lhs / rhs
        }
    })
}
