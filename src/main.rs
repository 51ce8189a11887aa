use clap::{Parser, Subcommand};
use kite_lang::{
    diagnostics,
    language::{ast::Statement, parser::parse_source},
    runtime::{interpreter::DEFAULT_MAX_CALL_DEPTH, Interpreter, InterpreterOptions, Value},
};
use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

const LOG_ENV: &str = "KITE_LOG";
const EXIT_RUNTIME: u8 = 1;
const EXIT_SYNTAX: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "kite", version, about = "Run Kite programs", long_about = None)]
struct Cli {
    /// Nested function calls allowed before evaluation aborts.
    #[arg(
        long,
        global = true,
        env = "KITE_MAX_CALL_DEPTH",
        default_value_t = DEFAULT_MAX_CALL_DEPTH
    )]
    max_call_depth: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a `.kite` file.
    Run { path: PathBuf },
    /// Evaluate a snippet and print its result.
    Eval { source: String },
    /// Start an interactive session.
    Repl,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let options = InterpreterOptions {
        max_call_depth: cli.max_call_depth,
    };

    match cli.command.unwrap_or(Command::Repl) {
        Command::Run { path } => run_file(&path, options),
        Command::Eval { source } => run_source("<eval>", &source, options, true),
        Command::Repl => repl(options),
    }
}

fn run_file(path: &Path, options: InterpreterOptions) -> ExitCode {
    if path.extension().and_then(|ext| ext.to_str()) != Some("kite") {
        eprintln!("Invalid file extension. Only .kite files are allowed.");
        return ExitCode::from(EXIT_RUNTIME);
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            diagnostics::report_io_error(path, &err);
            return ExitCode::from(EXIT_RUNTIME);
        }
    };
    run_source(&path.display().to_string(), &content, options, false)
}

fn run_source(name: &str, source: &str, options: InterpreterOptions, print_result: bool) -> ExitCode {
    let program = match parse_source(source) {
        Ok(program) => program,
        Err(errors) => {
            diagnostics::emit_syntax_errors(name, source, &errors);
            return ExitCode::from(EXIT_SYNTAX);
        }
    };

    let mut interpreter = Interpreter::new().with_options(options);
    match interpreter.run(&program) {
        Ok(value) => {
            if print_result && value != Value::Null {
                println!("{value}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            diagnostics::report_runtime_error(&err);
            ExitCode::from(EXIT_RUNTIME)
        }
    }
}

fn repl(options: InterpreterOptions) -> ExitCode {
    println!("Kite {} (type `exit` to quit)", env!("CARGO_PKG_VERSION"));
    let mut interpreter = Interpreter::new().with_options(options);
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!(">> ");
        if let Err(err) = io::stdout().flush() {
            eprintln!("Failed to write prompt: {err}");
            return ExitCode::from(EXIT_RUNTIME);
        }

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("Failed to read input: {err}");
                return ExitCode::from(EXIT_RUNTIME);
            }
        }

        let input = line.trim();
        match input {
            "" => continue,
            "exit" => break,
            _ => {}
        }

        let program = match parse_source(input) {
            Ok(program) => program,
            Err(errors) => {
                diagnostics::emit_syntax_errors("<repl>", input, &errors);
                continue;
            }
        };
        match interpreter.run(&program) {
            Ok(value) => {
                if !matches!(program.statements.last(), Some(Statement::Let { .. })) {
                    println!("{value}");
                }
            }
            Err(err) => diagnostics::report_runtime_error(&err),
        }
    }
    ExitCode::SUCCESS
}
