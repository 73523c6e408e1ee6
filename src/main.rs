use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::expr::ExprIds;
use rox::interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::{RunError, Session};

/// Static (scan/parse/resolve) errors.
const EXIT_STATIC: i32 = 65;
/// Uncaught runtime error.
const EXIT_RUNTIME: i32 = 70;
/// Input file could not be read.
const EXIT_IO: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum nested call depth before reporting a stack overflow
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a program and prints its syntax tree
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,
}

/// Reads a whole source file as UTF-8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn read_source(filename: &Path) -> String {
    match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(EXIT_IO);
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Writes to app.log with module and source line; RUST_LOG overrides the level.
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report_static(errors: &[LoxError]) {
    for e in errors {
        eprintln!("{}", e);
    }
}

/// Prints the diagnostics of a failed run and returns its exit status.
fn report(result: std::result::Result<(), RunError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(RunError::Static(errors)) => {
            debug!("Run rejected with {} static error(s)", errors.len());
            report_static(&errors);
            EXIT_STATIC
        }
        Err(RunError::Runtime(e)) => {
            debug!("Runtime debug: {:?}", e);
            eprintln!("{}", e);
            EXIT_RUNTIME
        }
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source = read_source(filename);
    let (tokens, errors) = Scanner::new(&source).scan_all();

    report_static(&errors);

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    Ok(if errors.is_empty() { 0 } else { EXIT_STATIC })
}

fn parse(filename: &Path) -> i32 {
    let source = read_source(filename);
    let (tokens, mut errors) = Scanner::new(&source).scan_all();
    let mut ids = ExprIds::new();

    match Parser::new(tokens, &mut ids).parse() {
        Ok(statements) if errors.is_empty() => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
            0
        }
        Ok(_) => {
            report_static(&errors);
            EXIT_STATIC
        }
        Err(parse_errors) => {
            errors.extend(parse_errors);
            report_static(&errors);
            EXIT_STATIC
        }
    }
}

fn run_file(filename: &Path, max_depth: usize) -> i32 {
    let source = read_source(filename);
    info!("Provided input:\n {}", source);

    let mut session = Session::with_interpreter(Interpreter::new().with_max_depth(max_depth));
    report(session.run(&source))
}

fn repl(max_depth: usize) -> Result<i32> {
    let mut session = Session::with_interpreter(Interpreter::new().with_max_depth(max_depth));
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        // Each line is independent: errors are reported and the session goes on.
        report(session.run(&line));
    }

    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let code: i32 = match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => tokenize(&filename, json)?,
        Commands::Parse { filename } => parse(&filename),
        Commands::Run { filename } => run_file(&filename, args.max_depth),
        Commands::Repl => repl(args.max_depth)?,
    };

    debug!("Exiting with status {}", code);

    if code != 0 {
        process::exit(code);
    }

    Ok(())
}
