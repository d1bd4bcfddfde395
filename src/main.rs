use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use calc_interpreter::{Error, ErrorKind, Interpreter, Lexer, Parser, run_with, timeline};
use clap::Parser as _;
use clap::Subcommand;
use miette::{IntoDiagnostic, Report, WrapErr};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Lexer, parser and tree-walking interpreter for a small calculator language")]
struct Args {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every token, one per line.
    Tokenize { filename: PathBuf },
    /// Print the parsed program.
    Parse { filename: PathBuf },
    /// Run a program and print its output.
    Run { filename: PathBuf },
    /// Run a program statement by statement and print the timeline.
    Trace { filename: PathBuf },
    /// Interactive session sharing one variable store.
    Repl,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_source(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading `{}` failed", filename.display()))
}

/// Reports a pipeline error and exits with 65 (lexical/syntax) or 70
/// (runtime).
fn fail(e: Error, source: &str) -> ! {
    let code = match e.kind() {
        ErrorKind::Lexical | ErrorKind::Syntax => 65,
        ErrorKind::Runtime => 70,
    };
    eprintln!("[line {}] {} error: {e}", e.line(), e.kind());
    eprintln!("{:?}", Report::new(e).with_source_code(source.to_string()));
    std::process::exit(code);
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Tokenize { filename } => {
            let file_contents = read_source(&filename)?;
            for token in Lexer::new(filename.to_str(), &file_contents) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(e) => fail(e.into(), &file_contents),
                }
            }
        }
        Commands::Parse { filename } => {
            let file_contents = read_source(&filename)?;
            for statement in Parser::new(filename.to_str(), &file_contents) {
                match statement {
                    Ok(statement) => println!("{statement}"),
                    Err(e) => fail(e, &file_contents),
                }
            }
        }
        Commands::Run { filename } => {
            let file_contents = read_source(&filename)?;
            info!(file = %filename.display(), "running");
            let program = Parser::new(filename.to_str(), &file_contents)
                .parse()
                .unwrap_or_else(|e| fail(e, &file_contents));

            let mut interpreter = Interpreter::new();
            let result = interpreter.run(&program);
            for line in interpreter.output() {
                println!("{line}");
            }
            if let Err(e) = result {
                fail(e.into(), &file_contents);
            }
            debug!(variables = interpreter.store().len(), "finished");
        }
        Commands::Trace { filename } => {
            let file_contents = read_source(&filename)?;
            let program = Parser::new(filename.to_str(), &file_contents)
                .parse()
                .unwrap_or_else(|e| fail(e, &file_contents));

            let timeline = timeline::trace(&mut Interpreter::new(), &program);
            for step in &timeline.steps {
                println!("[{}] {}: {}", step.index + 1, step.action, step.description);
                if let Some(printed) = &step.printed {
                    println!("    output: {printed}");
                }
                for change in &step.changes {
                    println!("    {change}");
                }
            }
            if let Some(e) = timeline.failure {
                fail(e.into(), &file_contents);
            }
        }
        Commands::Repl => repl().into_diagnostic()?,
    }
    Ok(())
}

fn repl() -> io::Result<()> {
    println!("Calculator REPL. Type `vars` to list variables, `exit` or `quit` to leave.");
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!(">>> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;

        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            "vars" => {
                for (name, value) in interpreter.store().iter() {
                    println!("  {name} = {value}");
                }
                continue;
            }
            _ => {}
        }

        // nothing runs unless the whole line parses; a runtime error keeps
        // the statements executed before it
        let result = run_with(&mut interpreter, &line);
        for output in interpreter.take_output() {
            println!("{output}");
        }
        if let Err(e) = result {
            eprintln!("{:?}", Report::new(e).with_source_code(line));
        }
    }
    println!("Goodbye!");
    Ok(())
}
