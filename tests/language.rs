use std::fs;

use calc_interpreter::{
    ErrorKind, Interpreter, Number, Outcome, Parser, TokenKind, parse, run, run_with, timeline,
    tokenize,
};

fn assert_success(src: &str) -> Outcome {
    match run(src) {
        Ok(outcome) => outcome,
        Err(e) => panic!("Script failed: {e}"),
    }
}

fn assert_failure(src: &str, kind: ErrorKind) -> String {
    match run(src) {
        Ok(_) => panic!("Script succeeded but was expected to fail"),
        Err(e) => {
            assert_eq!(e.kind(), kind, "unexpected error kind for {src:?}: {e}");
            e.to_string()
        }
    }
}

fn output_of(path: &str) -> Vec<String> {
    let source =
        fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
    assert_success(&source).output
}

#[test]
fn demo_programs() {
    assert_eq!(output_of("demos/basic_arithmetic.calc"), ["15", "30"]);
    assert_eq!(output_of("demos/complex_expressions.calc"), ["5", "10", "30", "10.0"]);
    assert_eq!(output_of("demos/operator_precedence.calc"), ["14", "20"]);
    assert_eq!(output_of("demos/variable_references.calc"), ["150", "50", "5000", "2.0"]);

    let nested = output_of("demos/nested_expressions.calc");
    let value: f64 = nested[0].parse().unwrap();
    assert!((value - (900.0 - 200.0 / 30.0)).abs() < 1e-9);
}

#[test]
fn precedence() {
    let outcome = assert_success("let x = 2 + 3 * 4;");
    assert_eq!(outcome.variables.get("x"), Some(Number::from(14)));
    let outcome = assert_success("let x = (2 + 3) * 4;");
    assert_eq!(outcome.variables.get("x"), Some(Number::from(20)));
}

#[test]
fn left_associative_subtraction() {
    let outcome = assert_success("let x = 10 - 5 - 2;");
    assert_eq!(outcome.variables.get("x"), Some(Number::from(3)));
}

#[test]
fn division() {
    let outcome = assert_success("let x = 10 / 5;");
    let x = outcome.variables.get("x").unwrap();
    assert_eq!(x, Number::from(2));
    assert_eq!(x, Number::Float(2.0));

    let message = assert_failure("let x = 10 / 0;", ErrorKind::Runtime);
    assert!(message.contains("Division by zero"));
}

#[test]
fn undefined_variable() {
    let message = assert_failure("let x = y + 5;", ErrorKind::Runtime);
    assert!(message.contains("Undefined variable 'y'"));
}

#[test]
fn sequential_state() {
    let outcome = assert_success("let x = 10; let y = x + 5; print(y);");
    assert_eq!(outcome.output, ["15"]);
    let variables: Vec<_> = outcome.variables.iter().collect();
    assert_eq!(variables, [("x", Number::from(10)), ("y", Number::from(15))]);
}

#[test]
fn comments_are_inert() {
    let with_comment = "let x = 5; // comment\nprint(x);";
    let without = "let x = 5; \nprint(x);";
    let kinds = |src| -> Vec<TokenKind> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    };
    assert_eq!(kinds(with_comment), kinds(without));
    assert_eq!(assert_success(with_comment).output, ["5"]);
}

#[test]
fn lexing_is_deterministic() {
    let src = "let total = (a1 + 2.75) * _b / 4; print(total);";
    assert_eq!(tokenize(src).unwrap(), tokenize(src).unwrap());
    assert_eq!(tokenize(src).unwrap().last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
}

#[test]
fn error_categories() {
    assert_failure("let x = 5 @ 2;", ErrorKind::Lexical);
    assert_failure("let x = 5", ErrorKind::Syntax);
    assert_failure("print(1;", ErrorKind::Syntax);
    assert_failure("let 5 = x;", ErrorKind::Syntax);
    assert_failure("5;", ErrorKind::Syntax);
    assert_failure("let x = ();", ErrorKind::Syntax);
    let nested = format!("let x = {}1{};", "(".repeat(1_000), ")".repeat(1_000));
    assert_failure(&nested, ErrorKind::Syntax);
}

#[test]
fn big_integers_stay_exact() {
    let outcome =
        assert_success("let big = 99999999999 * 99999999999; print(big); print(big / 1);");
    assert_eq!(outcome.output, ["9999999999800000000001", "9.9999999998e+21"]);
    assert!(!outcome.variables.get("big").unwrap().is_float());
    let literal = "123456789012345678901234567890";
    assert_eq!(assert_success(&format!("print({literal});")).output, [literal]);
}

#[test]
fn oversized_expressions_fail_cleanly() {
    let chain = format!("let x = 1{};", " + 1".repeat(200_000));
    assert_failure(&chain, ErrorKind::Syntax);

    let nested = format!("let x = {}1{};", "(".repeat(100_000), ")".repeat(100_000));
    let message = assert_failure(&nested, ErrorKind::Syntax);
    assert!(message.contains("nested too deeply"));
}

#[test]
fn a_line_that_fails_to_parse_runs_nothing() {
    let mut interpreter = Interpreter::new();
    let err = run_with(&mut interpreter, "let a = 1; print(a); let = 2;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(interpreter.output().is_empty());
    assert!(interpreter.store().is_empty());

    let outcome = run_with(&mut interpreter, "let a = 1; print(a);").unwrap();
    assert_eq!(outcome.output, ["1"]);
    let err = run_with(&mut interpreter, "let b = a + 1; print(b / 0);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(interpreter.store().get("b"), Some(Number::from(2)));
}

#[test]
fn errors_carry_positions() {
    let err = run("let a = 1;\nlet b = a +\n  c;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!((err.line(), err.column()), (3, 3));

    let err = parse("let a = 1;\nprint(a));").unwrap_err();
    assert_eq!((err.line(), err.column()), (2, 9));
}

#[test]
fn effects_before_a_failure_are_retained() {
    let program = parse("let a = 4; print(a); print(a / 0); let b = 1;").unwrap();
    let mut interpreter = Interpreter::new();
    assert!(interpreter.run(&program).is_err());
    assert_eq!(interpreter.output(), ["4"]);
    assert_eq!(interpreter.snapshot().len(), 1);
}

#[test]
fn interpreter_persists_across_programs() {
    let mut interpreter = Interpreter::new();
    for line in ["let x = 3;", "let y = x * x;", "print(x + y);"] {
        for statement in Parser::new(None, line) {
            interpreter.step(&statement.unwrap()).unwrap();
        }
    }
    assert_eq!(interpreter.take_output(), ["12"]);
    assert_eq!(interpreter.snapshot(), interpreter.snapshot());
}

#[test]
fn timeline_of_a_program() {
    let program = parse("let x = 10; let x = x / 4; print(x);").unwrap();
    let timeline = timeline::trace(&mut Interpreter::new(), &program);
    assert!(timeline.is_complete());
    let described: Vec<_> = timeline.steps.iter().map(|s| s.description.as_str()).collect();
    assert_eq!(described, ["Assign 'x' = 10", "Assign 'x' = (x / 4)", "Print x"]);
    assert_eq!(timeline.steps[1].changes[0].to_string(), "x: 10 → 2.5");
    assert_eq!(timeline.steps[2].printed.as_deref(), Some("2.5"));
}
