use std::fmt::Display;

use tracing::{info, warn};

use crate::{
    eval::{Interpreter, RuntimeError, Store},
    parse::{Program, Statement},
    value::Number,
};

/// One variable that differs between two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added { name: String, value: Number },
    Updated { name: String, from: Number, to: Number },
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Added { name, value } => write!(f, "{name} = {value} (new)"),
            Change::Updated { name, from, to } => write!(f, "{name}: {from} → {to}"),
        }
    }
}

/// Lists new and modified variables, in the order `after` first saw them.
/// Reassigning an equal value is not a change.
pub fn changes(before: &Store, after: &Store) -> Vec<Change> {
    after
        .iter()
        .filter_map(|(name, value)| match before.get(name) {
            None => Some(Change::Added {
                name: name.to_string(),
                value,
            }),
            Some(previous) if previous != value || previous.is_float() != value.is_float() => {
                Some(Change::Updated {
                    name: name.to_string(),
                    from: previous,
                    to: value,
                })
            }
            Some(_) => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub index: usize,
    /// `Execute Assign`, `Execute Print`.
    pub action: String,
    pub description: String,
    pub printed: Option<String>,
    pub variables: Store,
    pub changes: Vec<Change>,
}

#[derive(Debug, Default)]
pub struct Timeline {
    pub steps: Vec<Step>,
    /// Set when a statement failed; `steps` holds everything before it.
    pub failure: Option<RuntimeError>,
}

impl Timeline {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

pub fn describe(statement: &Statement<'_>) -> String {
    match statement {
        Statement::Assign { name, value } => format!("Assign '{name}' = {value}"),
        Statement::Print(expr) => format!("Print {expr}"),
    }
}

/// Executes `program` one statement at a time, recording the store after
/// every step.
pub fn trace(interpreter: &mut Interpreter, program: &Program<'_>) -> Timeline {
    let mut timeline = Timeline::default();
    for (index, statement) in program.statements.iter().enumerate() {
        let before = interpreter.snapshot();
        let printed_before = interpreter.output().len();

        let after = match interpreter.step(statement) {
            Ok(after) => after,
            Err(e) => {
                warn!(step = index, error = %e, "timeline stopped");
                timeline.failure = Some(e);
                return timeline;
            }
        };

        timeline.steps.push(Step {
            index,
            action: format!("Execute {}", statement.name()),
            description: describe(statement),
            printed: interpreter.output().get(printed_before).cloned(),
            changes: changes(&before, &after),
            variables: after,
        });
    }
    info!(steps = timeline.steps.len(), "timeline recorded");
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    fn record(input: &str) -> Timeline {
        let program = Parser::new(None, input).parse().unwrap();
        trace(&mut Interpreter::new(), &program)
    }

    #[test]
    fn records_every_statement() {
        let timeline = record("let x = 10 + 5; let y = x * 2; print(y);");
        assert!(timeline.is_complete());
        assert_eq!(timeline.steps.len(), 3);

        let first = &timeline.steps[0];
        assert_eq!(first.action, "Execute Assign");
        assert_eq!(first.description, "Assign 'x' = (10 + 5)");
        assert_eq!(first.printed, None);
        assert_eq!(first.changes, [Change::Added { name: "x".into(), value: Number::from(15) }]);

        let last = &timeline.steps[2];
        assert_eq!(last.action, "Execute Print");
        assert_eq!(last.description, "Print y");
        assert_eq!(last.printed.as_deref(), Some("30"));
        assert!(last.changes.is_empty());
        assert_eq!(last.variables.len(), 2);
    }

    #[test]
    fn updates_are_reported() {
        let timeline = record("let x = 1; let x = x + 1; let x = 2;");
        let changes: Vec<_> = timeline.steps.iter().map(|s| s.changes.clone()).collect();
        assert_eq!(changes[1][0].to_string(), "x: 1 → 2");
        assert!(changes[2].is_empty());
    }

    #[test]
    fn int_to_float_is_an_update() {
        let timeline = record("let x = 2; let x = 4 / 2;");
        assert_eq!(timeline.steps[1].changes[0].to_string(), "x: 2 → 2.0");
    }

    #[test]
    fn failure_keeps_earlier_steps() {
        let timeline = record("let a = 1; print(a / 0); print(a);");
        assert!(!timeline.is_complete());
        assert_eq!(timeline.steps.len(), 1);
        assert!(matches!(timeline.failure, Some(RuntimeError::DivisionByZero { .. })));
    }

    #[test]
    fn added_change_display() {
        let change = Change::Added {
            name: "total".into(),
            value: Number::Float(2.5),
        };
        assert_eq!(change.to_string(), "total = 2.5 (new)");
    }
}
